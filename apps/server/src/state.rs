use std::sync::Arc;

use pagewatch_service::Orchestrator;

/// Shared application state handed to every worker
pub struct AppState {
    pub orchestrator: Arc<Orchestrator>,
    /// Shared secret for the trigger endpoint; `None` rejects every call
    pub trigger_secret: Option<String>,
}

impl AppState {
    pub fn new(orchestrator: Arc<Orchestrator>, trigger_secret: Option<String>) -> Self {
        Self { orchestrator, trigger_secret }
    }

    /// Compare a presented secret without short-circuiting on the first mismatch
    pub fn authorize(&self, presented: Option<&str>) -> bool {
        match (self.trigger_secret.as_deref(), presented) {
            (Some(expected), Some(presented)) => constant_time_eq(expected.as_bytes(), presented.as_bytes()),
            _ => false,
        }
    }
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}
