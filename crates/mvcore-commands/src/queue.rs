//! Per-issuer confirmation queue
//!
//! Destructive commands are not run on first invocation. Instead the action is
//! parked here until the same issuer confirms it. Each issuer has at most one
//! pending action: queueing another one silently replaces (and drops) the
//! previous one, so a confirmation always refers to the most recent
//! confirmable command.
//!
//! Expiry is evaluated lazily whenever an entry is looked at. A background
//! sweeper can additionally be spawned to bound memory for issuers that never
//! come back.

use chrono::{DateTime, Utc};
use mvcore_permissions::IssuerId;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::{Arc, Weak};
use std::time::{Duration, Instant};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::debug;
use uuid::Uuid;

use crate::error::Result;
use crate::types::CommandOutput;

/// How long a pending confirmation stays valid
pub const DEFAULT_EXPIRY: Duration = Duration::from_secs(30);

/// Deferred command execution awaiting confirmation
pub type DeferredAction = Box<dyn FnOnce() -> Result<CommandOutput> + Send>;

/// One outstanding action awaiting confirmation
struct PendingConfirmation<A> {
    id: Uuid,
    action: A,
    coalesce_key: Option<String>,
    created: Instant,
    queued_at: DateTime<Utc>,
}

impl<A> PendingConfirmation<A> {
    fn age(&self) -> Duration {
        self.created.elapsed()
    }

    fn is_expired(&self, expiry: Duration) -> bool {
        self.age() >= expiry
    }

    fn summary(&self, expiry: Duration) -> PendingSummary {
        PendingSummary {
            id: self.id,
            coalesce_key: self.coalesce_key.clone(),
            queued_at: self.queued_at,
            expires_in: expiry.saturating_sub(self.age()),
        }
    }
}

/// Read-only view of a pending confirmation, for prompts
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingSummary {
    pub id: Uuid,
    pub coalesce_key: Option<String>,
    pub queued_at: DateTime<Utc>,
    /// Time left before the entry expires
    pub expires_in: Duration,
}

/// Queue holding at most one pending confirmation per issuer
pub struct ConfirmationQueue<A = DeferredAction> {
    entries: Mutex<HashMap<IssuerId, PendingConfirmation<A>>>,
    expiry: Duration,
}

impl<A> ConfirmationQueue<A> {
    /// Create a queue using [`DEFAULT_EXPIRY`]
    pub fn new() -> Self {
        Self::with_expiry(DEFAULT_EXPIRY)
    }

    /// Create a queue with a custom expiry
    pub fn with_expiry(expiry: Duration) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            expiry,
        }
    }

    pub fn expiry(&self) -> Duration {
        self.expiry
    }

    /// Queue an action for `issuer`, replacing any pending one
    ///
    /// The replaced action is dropped without running and the issuer is not
    /// told about it. Returns the id of the new entry.
    pub fn enqueue(&self, issuer: &IssuerId, action: A, coalesce_key: Option<String>) -> Uuid {
        let id = Uuid::new_v4();
        let entry = PendingConfirmation {
            id,
            action,
            coalesce_key,
            created: Instant::now(),
            queued_at: Utc::now(),
        };
        debug!(
            issuer = %issuer,
            entry = %id,
            key = entry.coalesce_key.as_deref().unwrap_or(""),
            "Queued command for confirmation"
        );

        let replaced = self.entries.lock().insert(issuer.clone(), entry);
        if let Some(replaced) = replaced {
            debug!(
                issuer = %issuer,
                entry = %replaced.id,
                key = replaced.coalesce_key.as_deref().unwrap_or(""),
                "Discarded superseded pending command"
            );
        }
        id
    }

    /// Take the pending action for `issuer` if it has not expired
    pub fn try_confirm(&self, issuer: &IssuerId) -> Option<A> {
        let entry = self.entries.lock().remove(issuer)?;
        self.accept(issuer, entry)
    }

    /// Take the pending action only if it was queued under `coalesce_key`
    ///
    /// A pending entry for a different key is left untouched.
    pub fn take_matching(&self, issuer: &IssuerId, coalesce_key: &str) -> Option<A> {
        let entry = {
            let mut entries = self.entries.lock();
            let matches = entries
                .get(issuer)
                .is_some_and(|e| e.coalesce_key.as_deref() == Some(coalesce_key));
            if !matches {
                return None;
            }
            entries.remove(issuer)?
        };
        self.accept(issuer, entry)
    }

    fn accept(&self, issuer: &IssuerId, entry: PendingConfirmation<A>) -> Option<A> {
        if entry.is_expired(self.expiry) {
            debug!(issuer = %issuer, entry = %entry.id, "Pending command expired");
            return None;
        }
        debug!(issuer = %issuer, entry = %entry.id, "Pending command confirmed");
        Some(entry.action)
    }

    /// Check whether `issuer` has a live pending confirmation
    pub fn is_pending(&self, issuer: &IssuerId) -> bool {
        self.entries
            .lock()
            .get(issuer)
            .is_some_and(|e| !e.is_expired(self.expiry))
    }

    /// Describe the live pending confirmation for `issuer`
    pub fn pending(&self, issuer: &IssuerId) -> Option<PendingSummary> {
        self.entries
            .lock()
            .get(issuer)
            .filter(|e| !e.is_expired(self.expiry))
            .map(|e| e.summary(self.expiry))
    }

    /// Remove entries older than twice the expiry; returns how many were removed
    pub fn sweep_expired(&self) -> usize {
        let cutoff = self.expiry.saturating_mul(2);
        let removed: Vec<PendingConfirmation<A>> = {
            let mut entries = self.entries.lock();
            let stale: Vec<IssuerId> = entries
                .iter()
                .filter(|(_, e)| e.age() >= cutoff)
                .map(|(issuer, _)| issuer.clone())
                .collect();
            stale.iter().filter_map(|issuer| entries.remove(issuer)).collect()
        };
        if !removed.is_empty() {
            debug!(count = removed.len(), "Swept stale pending commands");
        }
        removed.len()
    }

    /// Number of stored entries, including expired ones not yet swept
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<A: Send + 'static> ConfirmationQueue<A> {
    /// Spawn a task on the current tokio runtime that sweeps the queue periodically
    ///
    /// The task holds a weak reference and stops once the queue is dropped.
    /// Ticks missed while the runtime was busy are skipped, not replayed.
    ///
    /// # Panics
    ///
    /// Panics when called outside a tokio runtime.
    pub fn spawn_sweeper(queue: &Arc<Self>, every: Duration) -> JoinHandle<()> {
        let weak: Weak<Self> = Arc::downgrade(queue);
        let every = every.max(Duration::from_millis(1));
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                ticker.tick().await;
                match weak.upgrade() {
                    Some(queue) => {
                        queue.sweep_expired();
                    }
                    None => break,
                }
            }
        })
    }
}

impl<A> Default for ConfirmationQueue<A> {
    fn default() -> Self {
        Self::new()
    }
}

impl<A> std::fmt::Debug for ConfirmationQueue<A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConfirmationQueue")
            .field("expiry", &self.expiry)
            .field("entries", &self.len())
            .finish()
    }
}
