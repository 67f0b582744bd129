use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;

use super::checker::Checker;
use super::diff::{diff, exceeds_threshold};
use super::locks::SiteLocks;
use super::normalizer::{hash, normalize};
use super::types::CheckOutcome;
use crate::database::Store;
use crate::database::models::{Check, SNAPSHOT_RETENTION, Site, Snapshot};
use crate::error::{MonitorError, Result};
use crate::incidents::{IncidentHandler, IncidentReport};

/// Monitoring executor - runs one full check cycle for a site
pub struct MonitoringExecutor {
    store: Arc<dyn Store>,
    checker: Arc<dyn Checker>,
    incidents: Arc<IncidentHandler>,
    locks: SiteLocks,
}

impl MonitoringExecutor {
    /// Create a new monitoring executor
    pub fn new(store: Arc<dyn Store>, checker: Arc<dyn Checker>, incidents: Arc<IncidentHandler>) -> Self {
        Self { store, checker, incidents, locks: SiteLocks::new() }
    }

    /// Execute a monitoring check.
    ///
    /// Probe failures become a recorded check with status 0. Persistence
    /// failures abort the cycle and are returned.
    pub async fn execute_check(&self, site: &Site) -> Result<CheckOutcome> {
        let _guard = self.locks.acquire(site.id).await;

        let start = Instant::now();
        let probe = self.checker.fetch(&site.url).await;
        let elapsed = start.elapsed().as_millis() as u64;
        let timestamp = Utc::now();

        let check = match probe {
            Ok(probe) => {
                let canonical = normalize(&probe.body);
                let content_hash = hash(&canonical);
                let previous = self.store.latest_snapshot(site.id).await?;

                let change_percent = previous.as_ref().map(|snapshot| {
                    if snapshot.html_hash == content_hash {
                        0.0
                    } else {
                        diff(&snapshot.html_content, &canonical).change_percent
                    }
                });
                let has_change = change_percent.is_some_and(|pct| exceeds_threshold(pct, site.change_threshold));

                let check = Check::responded(
                    site.id,
                    probe.status_code,
                    elapsed,
                    content_hash.clone(),
                    change_percent,
                    has_change,
                    timestamp,
                );
                self.store.insert_check(&check).await?;

                if previous.is_none() || has_change {
                    let snapshot = Snapshot::new(site.id, canonical, content_hash, timestamp);
                    self.store.insert_snapshot(&snapshot, SNAPSHOT_RETENTION).await?;
                }

                tracing::debug!(
                    "Checked {} ({}): status {} in {}ms, change {:?}",
                    site.name,
                    site.url,
                    check.status_code,
                    elapsed,
                    change_percent
                );
                check
            }
            Err(MonitorError::Transport(message)) => {
                tracing::warn!("Probe of {} failed after {}ms: {}", site.url, elapsed, message);
                let check = Check::transport_failure(site.id, elapsed, message, timestamp);
                self.store.insert_check(&check).await?;
                check
            }
            Err(other) => return Err(other),
        };

        match self.incidents.handle(site, &check).await? {
            IncidentReport::Unchanged => {}
            IncidentReport::Opened { incident, superseded } => tracing::debug!(
                "Cycle for {} opened {} incident {} (superseded: {:?})",
                site.url,
                incident.kind,
                incident.id,
                superseded.map(|previous| previous.id)
            ),
            IncidentReport::Resolved(incident) => {
                tracing::debug!("Cycle for {} resolved incident {}", site.url, incident.id)
            }
        }

        Ok(CheckOutcome::from_check(&check))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::{CheckStore, SiteStore, SnapshotStore};
    use crate::testing::{FakeChecker, build_engine};

    #[tokio::test]
    async fn test_first_check_stores_baseline_without_change_signal() -> Result<()> {
        let checker = FakeChecker::new();
        checker.push_response(200, "<p>hello</p>");
        let engine = build_engine(checker.clone(), vec![]).await?;
        let site = Site::new("Example", "https://example.com");
        engine.store.insert_site(&site).await?;

        let outcome = engine.executor.execute_check(&site).await?;

        assert!(matches!(outcome, CheckOutcome::Up { status_code: 200, change_percent: None, has_change: false, .. }));
        assert_eq!(engine.store.list_snapshots(site.id).await?.len(), 1);
        let check = engine.store.latest_check(site.id).await?.expect("check stored");
        assert_eq!(check.html_hash.as_deref(), Some(hash("<p>hello</p>").as_str()));
        Ok(())
    }

    #[tokio::test]
    async fn test_unchanged_content_keeps_single_snapshot() -> Result<()> {
        let checker = FakeChecker::new();
        checker.push_response(200, "<p>hello</p><script>1</script>");
        checker.push_response(200, "<p>hello</p><script>2</script>");
        let engine = build_engine(checker.clone(), vec![]).await?;
        let site = Site::new("Example", "https://example.com");
        engine.store.insert_site(&site).await?;

        engine.executor.execute_check(&site).await?;
        let outcome = engine.executor.execute_check(&site).await?;

        assert!(matches!(outcome, CheckOutcome::Up { change_percent: Some(pct), has_change: false, .. } if pct == 0.0));
        assert_eq!(engine.store.list_snapshots(site.id).await?.len(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_change_above_threshold_stores_new_snapshot() -> Result<()> {
        let checker = FakeChecker::new();
        checker.push_response(200, "<p>old</p>");
        checker.push_response(200, "<p>new</p>");
        let engine = build_engine(checker.clone(), vec![]).await?;
        let site = Site::new("Example", "https://example.com");
        engine.store.insert_site(&site).await?;

        engine.executor.execute_check(&site).await?;
        let outcome = engine.executor.execute_check(&site).await?;

        assert!(matches!(outcome, CheckOutcome::Up { has_change: true, .. }));
        let snapshots = engine.store.list_snapshots(site.id).await?;
        assert_eq!(snapshots.len(), 2);
        assert_eq!(snapshots[0].html_content, "<p>new</p>");
        Ok(())
    }

    #[tokio::test]
    async fn test_non_200_is_down_and_transport_failure_recorded() -> Result<()> {
        let checker = FakeChecker::new();
        checker.push_response(204, "");
        checker.push_transport_error("Request timed out");
        let engine = build_engine(checker.clone(), vec![]).await?;
        let site = Site::new("Example", "https://example.com");
        engine.store.insert_site(&site).await?;

        let first = engine.executor.execute_check(&site).await?;
        assert!(matches!(first, CheckOutcome::Down { status_code: 204, .. }));

        let second = engine.executor.execute_check(&site).await?;
        assert!(matches!(second, CheckOutcome::TransportError { ref error_message, .. } if error_message == "Request timed out"));

        let check = engine.store.latest_check(site.id).await?.expect("check stored");
        assert_eq!(check.status_code, 0);
        assert!(!check.is_up);
        assert!(check.html_hash.is_none());
        Ok(())
    }
}
