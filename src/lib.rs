//! Shared fixtures for the workspace integration tests

use std::sync::Arc;

use mvcore_commands::{CommandDefinition, CommandOutput, Invocation};
use parking_lot::Mutex;
use tracing_subscriber::filter::LevelFilter;

/// Install a test-writer subscriber so dispatcher logs show up in failing tests
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(LevelFilter::DEBUG)
        .with_test_writer()
        .try_init();
}

/// Records every invocation it runs as its coalesce key
#[derive(Debug, Clone, Default)]
pub struct RunLog {
    runs: Arc<Mutex<Vec<String>>>,
}

impl RunLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// A command that appends to this log and replies with `reply`
    pub fn command(&self, name: &str, reply: &'static str) -> CommandDefinition {
        let runs = Arc::clone(&self.runs);
        CommandDefinition::new(name, move |inv: &Invocation| {
            runs.lock().push(inv.coalesce_key());
            Ok(CommandOutput::message(reply))
        })
    }

    pub fn runs(&self) -> Vec<String> {
        self.runs.lock().clone()
    }
}
