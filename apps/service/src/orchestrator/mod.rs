//! Orchestrator module - coordinates all components
//!
//! The orchestrator is the core coordinator that:
//! - Opens the database and runs migrations
//! - Wires the checker, incident handler, alert dispatcher and scheduler
//! - Exposes the engine's public operations to the binaries


use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use tracing::{info, warn};

use crate::alerts::{AlertChannel, AlertDispatcher, AlertSettings, EmailChannel, TelegramChannel};
use crate::config::Config;
use crate::database::{DatabaseImpl, Store, initialize_database};
use crate::history::History;
use crate::incidents::IncidentHandler;
use crate::monitoring::{Checker, HttpChecker, MonitoringExecutor, MonitoringScheduler, PassSummary};
use crate::pool::open_pool;
use crate::reports::{ReportScope, SlaReport, SlaReporter};
use crate::sites::SiteRegistry;

/// Main orchestrator for the monitoring service
pub struct Orchestrator {
    config: Arc<Config>,
    scheduler: Arc<MonitoringScheduler>,
    sites: SiteRegistry,
    history: History,
    alert_settings: AlertSettings,
    reporter: SlaReporter,
    task_handles: Vec<tokio::task::JoinHandle<()>>,
}

impl Orchestrator {
    /// Open the configured database and build the production engine
    pub async fn open(config: Config) -> Result<Self> {
        info!("Opening database at {}", config.database.path);
        let pool = open_pool(&config.database.path, config.database.max_connections)
            .await
            .context("failed to open database")?;

        {
            let conn = pool.get().await.context("failed to get a database connection")?;
            info!("Initializing database schema...");
            initialize_database(&conn).await.context("failed to run migrations")?;
        }

        let store: Arc<dyn Store> = Arc::new(DatabaseImpl::new_from_pool(pool));
        let checker: Arc<dyn Checker> =
            Arc::new(HttpChecker::new(&config.probe.settings()).context("failed to build HTTP checker")?);

        let channel_settings = config.alerts.channel_settings();
        let email: Arc<dyn AlertChannel> =
            Arc::new(EmailChannel::new(&channel_settings).context("failed to build email channel")?);
        let telegram: Arc<dyn AlertChannel> =
            Arc::new(TelegramChannel::new(&channel_settings).context("failed to build Telegram channel")?);

        Ok(Self::with_parts(config, store, checker, email, telegram))
    }

    /// Build an engine from explicit parts
    pub fn with_parts(
        config: Config,
        store: Arc<dyn Store>,
        checker: Arc<dyn Checker>,
        email: Arc<dyn AlertChannel>,
        chat: Arc<dyn AlertChannel>,
    ) -> Self {
        let config = Arc::new(config);

        let dispatcher = Arc::new(AlertDispatcher::new(
            store.clone(),
            vec![email.clone(), chat],
            config.alerts.dashboard_url.clone(),
            config.alerts.sender_name.clone(),
        ));
        let incidents = Arc::new(IncidentHandler::new(store.clone(), dispatcher));
        let executor = Arc::new(MonitoringExecutor::new(store.clone(), checker, incidents));
        let scheduler = Arc::new(MonitoringScheduler::new(
            store.clone(),
            executor,
            config.scheduler.max_concurrent_checks,
        ));

        Self {
            sites: SiteRegistry::new(store.clone()),
            history: History::new(store.clone()),
            alert_settings: AlertSettings::new(store.clone(), email, config.alerts.sender_name.clone()),
            reporter: SlaReporter::new(store),
            scheduler,
            config,
            task_handles: Vec::new(),
        }
    }

    /// Run the scheduler loop until Ctrl+C
    pub async fn run(&mut self) -> Result<()> {
        let tick = Duration::from_secs(self.config.scheduler.tick_seconds.max(1));
        info!("Starting scheduler, checking for due sites every {}s", tick.as_secs());
        self.task_handles.push(self.scheduler.clone().spawn(tick));

        tokio::signal::ctrl_c().await.context("failed to listen for shutdown signal")?;
        warn!("Shutdown requested, stopping scheduler");
        self.shutdown();
        Ok(())
    }

    /// Abort background tasks
    pub fn shutdown(&mut self) {
        for handle in self.task_handles.drain(..) {
            handle.abort();
        }
    }

    /// One pass over due sites
    pub async fn run_due_checks(&self) -> crate::error::Result<PassSummary> {
        self.scheduler.run_due_checks().await
    }

    /// One pass over every active site, ignoring dueness
    pub async fn run_all_checks(&self) -> crate::error::Result<PassSummary> {
        self.scheduler.run_all_checks().await
    }

    pub async fn sla_report(
        &self,
        scope: ReportScope,
        start: Option<DateTime<Utc>>,
        end: Option<DateTime<Utc>>,
    ) -> crate::error::Result<SlaReport> {
        self.reporter.report(scope, start, end).await
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn sites(&self) -> &SiteRegistry {
        &self.sites
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn alert_settings(&self) -> &AlertSettings {
        &self.alert_settings
    }
}

impl Drop for Orchestrator {
    fn drop(&mut self) {
        self.shutdown();
    }
}
