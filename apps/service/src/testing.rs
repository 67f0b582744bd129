//! Shared fixtures for unit and scenario tests.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tempfile::TempDir;

use crate::alerts::{AlertChannel, AlertDispatcher, AlertMessage, ChannelError};
use crate::database::models::AlertConfig;
use crate::database::{DatabaseImpl, initialize_database};
use crate::error::{MonitorError, Result};
use crate::incidents::IncidentHandler;
use crate::monitoring::{Checker, MonitoringExecutor, MonitoringScheduler, Probe};
use crate::pool::{LibsqlPool, open_pool};

/// Create a migrated database in a temporary directory.
///
/// The returned `TempDir` must outlive the pool.
pub async fn create_test_database() -> Result<(LibsqlPool, TempDir)> {
    let dir = tempfile::tempdir().map_err(|e| MonitorError::Persistence(e.to_string()))?;
    let path = dir.path().join("test.db");
    let pool = open_pool(&path.to_string_lossy(), 4).await?;
    {
        let conn = pool.get().await?;
        initialize_database(&conn).await?;
    }
    Ok((pool, dir))
}

pub async fn create_test_store() -> Result<(Arc<DatabaseImpl>, TempDir)> {
    let (pool, dir) = create_test_database().await?;
    Ok((Arc::new(DatabaseImpl::new_from_pool(pool)), dir))
}

/// Checker that replays scripted probe results
#[derive(Default)]
pub struct FakeChecker {
    queue: Mutex<VecDeque<Result<Probe>>>,
    fixed: Mutex<HashMap<String, Probe>>,
    calls: AtomicUsize,
}

impl FakeChecker {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Queue a response for the next fetch of any URL
    pub fn push_response(&self, status_code: u16, body: &str) {
        self.queue.lock().unwrap().push_back(Ok(Probe { status_code, body: body.to_string() }));
    }

    /// Queue a transport failure for the next fetch of any URL
    pub fn push_transport_error(&self, message: &str) {
        self.queue.lock().unwrap().push_back(Err(MonitorError::Transport(message.to_string())));
    }

    /// Always answer `url` with this response
    pub fn set_response_for(&self, url: &str, status_code: u16, body: &str) {
        self.fixed.lock().unwrap().insert(url.to_string(), Probe { status_code, body: body.to_string() });
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Checker for FakeChecker {
    async fn fetch(&self, target: &str) -> Result<Probe> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(probe) = self.fixed.lock().unwrap().get(target) {
            return Ok(probe.clone());
        }
        self.queue
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(MonitorError::Transport(format!("no scripted response for {target}"))))
    }
}

/// Alert channel that records what it was asked to send
pub struct RecordingChannel {
    name: &'static str,
    enabled: bool,
    fail: bool,
    sent: Mutex<Vec<AlertMessage>>,
}

impl RecordingChannel {
    fn build(name: &'static str, enabled: bool, fail: bool) -> Arc<Self> {
        Arc::new(Self { name, enabled, fail, sent: Mutex::new(Vec::new()) })
    }

    pub fn new(name: &'static str) -> Arc<Self> {
        Self::build(name, true, false)
    }

    /// Enabled, but every send fails
    pub fn failing(name: &'static str) -> Arc<Self> {
        Self::build(name, true, true)
    }

    pub fn disabled(name: &'static str) -> Arc<Self> {
        Self::build(name, false, false)
    }

    /// Number of successful sends
    pub fn sent_count(&self) -> usize {
        self.sent.lock().unwrap().len()
    }

    pub fn last_subject(&self) -> Option<String> {
        self.sent.lock().unwrap().last().map(|message| message.subject.clone())
    }
}

#[async_trait]
impl AlertChannel for RecordingChannel {
    fn name(&self) -> &'static str {
        self.name
    }

    fn is_enabled(&self, _config: &AlertConfig) -> bool {
        self.enabled
    }

    async fn send(&self, _config: &AlertConfig, message: &AlertMessage) -> std::result::Result<(), ChannelError> {
        if self.fail {
            return Err(ChannelError::Rejected { status: 500, body: "scripted failure".into() });
        }
        self.sent.lock().unwrap().push(message.clone());
        Ok(())
    }
}

/// Engine components wired over a temporary database
pub struct TestEngine {
    pub store: Arc<DatabaseImpl>,
    pub executor: Arc<MonitoringExecutor>,
    pub scheduler: MonitoringScheduler,
    _dir: TempDir,
}

pub async fn build_engine(checker: Arc<FakeChecker>, channels: Vec<Arc<dyn AlertChannel>>) -> Result<TestEngine> {
    let (store, dir) = create_test_store().await?;
    let dispatcher = Arc::new(AlertDispatcher::new(
        store.clone(),
        channels,
        "http://localhost:3000/dashboard",
        "Pagewatch",
    ));
    let incidents = Arc::new(IncidentHandler::new(store.clone(), dispatcher));
    let executor = Arc::new(MonitoringExecutor::new(store.clone(), checker, incidents));
    let scheduler = MonitoringScheduler::new(store.clone(), executor.clone(), 4);
    Ok(TestEngine { store, executor, scheduler, _dir: dir })
}
