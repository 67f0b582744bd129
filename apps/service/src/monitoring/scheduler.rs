use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt};
use tokio::time::{MissedTickBehavior, interval};

use super::executor::MonitoringExecutor;
use super::types::{PassSummary, SiteReport};
use crate::database::Store;
use crate::database::models::Site;
use crate::error::Result;

/// Whether a site last checked at `last_check` is due at `now`
pub fn is_due(last_check: Option<DateTime<Utc>>, check_frequency: u32, now: DateTime<Utc>) -> bool {
    match last_check {
        None => true,
        Some(last) => (now - last).num_seconds() >= i64::from(check_frequency),
    }
}

/// Monitoring scheduler - decides which sites are due and drives the executor
pub struct MonitoringScheduler {
    store: Arc<dyn Store>,
    executor: Arc<MonitoringExecutor>,
    max_concurrent: usize,
}

impl MonitoringScheduler {
    /// Create a new monitoring scheduler
    pub fn new(store: Arc<dyn Store>, executor: Arc<MonitoringExecutor>, max_concurrent: usize) -> Self {
        Self { store, executor, max_concurrent: max_concurrent.max(1) }
    }

    /// Check every active site that is due
    pub async fn run_due_checks(&self) -> Result<PassSummary> {
        self.run_pass(false).await
    }

    /// Check every active site regardless of dueness
    pub async fn run_all_checks(&self) -> Result<PassSummary> {
        self.run_pass(true).await
    }

    async fn run_pass(&self, force: bool) -> Result<PassSummary> {
        let sites = self.store.list_sites(true).await?;
        let now = Utc::now();
        tracing::debug!("Scheduler pass over {} active site(s), force={}", sites.len(), force);

        let reports: Vec<SiteReport> = stream::iter(sites)
            .map(|site| self.run_site(site, force, now))
            .buffered(self.max_concurrent)
            .filter_map(|report| async move { report })
            .collect()
            .await;

        let summary = PassSummary::from_reports(reports);
        if summary.checks_performed > 0 {
            tracing::info!(
                "Scheduler pass complete: {} check(s), {} incident-worthy",
                summary.checks_performed,
                summary.incidents_created
            );
        }
        Ok(summary)
    }

    /// One site's slot in a pass; `None` when the site is not due
    async fn run_site(&self, site: Site, force: bool, now: DateTime<Utc>) -> Option<SiteReport> {
        if !force {
            match self.store.latest_check(site.id).await {
                Ok(last) => {
                    if !is_due(last.map(|check| check.timestamp), site.check_frequency, now) {
                        return None;
                    }
                }
                Err(e) => {
                    tracing::error!("Failed to read last check for site {}: {}", site.id, e);
                    return Some(SiteReport::failed(&site, e.to_string()));
                }
            }
        }

        match self.executor.execute_check(&site).await {
            Ok(outcome) => Some(SiteReport::completed(&site, outcome)),
            Err(e) => {
                tracing::error!("Check cycle for {} ({}) failed: {}", site.name, site.url, e);
                Some(SiteReport::failed(&site, e.to_string()))
            }
        }
    }

    /// Run due checks every `tick` until the task is aborted
    pub fn spawn(self: Arc<Self>, tick: Duration) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            let mut timer = interval(tick);
            timer.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                timer.tick().await;

                if let Err(e) = self.run_due_checks().await {
                    tracing::error!("Scheduler pass failed: {}", e);
                }
            }
        })
    }
}
