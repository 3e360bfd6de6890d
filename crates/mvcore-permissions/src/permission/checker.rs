//! Capability checks against the host authorization system

use std::sync::Arc;

use tracing::debug;

use crate::issuer::Issuer;
use crate::permission::expression::PermissionExpression;

/// Host-supplied check answering whether an issuer holds a permission token
pub trait CapabilityCheck: Send + Sync {
    fn has_capability(&self, issuer: &Issuer, token: &str) -> bool;
}

impl<F> CapabilityCheck for F
where
    F: Fn(&Issuer, &str) -> bool + Send + Sync,
{
    fn has_capability(&self, issuer: &Issuer, token: &str) -> bool {
        self(issuer, token)
    }
}

/// Evaluates permission expressions against an injected capability check
#[derive(Clone)]
pub struct PermissionChecker {
    capabilities: Arc<dyn CapabilityCheck>,
}

impl PermissionChecker {
    /// Create a checker backed by the given capability source
    pub fn new(capabilities: Arc<dyn CapabilityCheck>) -> Self {
        Self { capabilities }
    }

    /// Check whether `issuer` satisfies `expression`
    pub fn check(&self, issuer: &Issuer, expression: &PermissionExpression) -> bool {
        let allowed = expression.evaluate(issuer, self.capabilities.as_ref());
        if !allowed {
            debug!(issuer = %issuer.id, permission = %expression, "Permission check failed");
        }
        allowed
    }

    /// Check a single raw token, bypassing expression parsing
    pub fn has_capability(&self, issuer: &Issuer, token: &str) -> bool {
        self.capabilities.has_capability(issuer, token)
    }
}

impl std::fmt::Debug for PermissionChecker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PermissionChecker").finish_non_exhaustive()
    }
}
