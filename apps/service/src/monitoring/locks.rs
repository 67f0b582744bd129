use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tokio::sync::OwnedMutexGuard;
use uuid::Uuid;

/// Per-site mutual exclusion so two check cycles for the same site never overlap
#[derive(Default)]
pub struct SiteLocks {
    locks: Mutex<HashMap<Uuid, Arc<tokio::sync::Mutex<()>>>>,
}

impl SiteLocks {
    pub fn new() -> Self {
        Self::default()
    }

    fn entry(&self, site_id: Uuid) -> Arc<tokio::sync::Mutex<()>> {
        // A poisoned map still holds valid mutex handles
        let mut locks = self.locks.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        locks.entry(site_id).or_default().clone()
    }

    /// Wait until no other cycle holds `site_id`, then hold it until the guard drops
    pub async fn acquire(&self, site_id: Uuid) -> OwnedMutexGuard<()> {
        self.entry(site_id).lock_owned().await
    }
}
