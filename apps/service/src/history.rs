use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::database::Store;
use crate::database::models::{Check, CheckQuery, Incident, IncidentQuery, Page, Snapshot};
use crate::error::{MonitorError, Result};
use crate::monitoring::diff::{DiffStats, diff};

/// Largest page a caller may request
pub const MAX_PAGE_LIMIT: u32 = 500;

/// Snapshot identity without its content
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotHeader {
    pub id: Uuid,
    pub captured_at: DateTime<Utc>,
    pub html_hash: String,
}

impl From<&Snapshot> for SnapshotHeader {
    fn from(snapshot: &Snapshot) -> Self {
        Self { id: snapshot.id, captured_at: snapshot.captured_at, html_hash: snapshot.html_hash.clone() }
    }
}

/// Result of comparing two stored snapshots
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotComparison {
    pub old_snapshot: SnapshotHeader,
    pub new_snapshot: SnapshotHeader,
    pub stats: DiffStats,
}

/// Read-only access to check, incident and snapshot history
pub struct History {
    store: Arc<dyn Store>,
}

fn clamp_limit(limit: u32) -> u32 {
    limit.clamp(1, MAX_PAGE_LIMIT)
}

fn check_range(start: Option<DateTime<Utc>>, end: Option<DateTime<Utc>>) -> Result<()> {
    match (start, end) {
        (Some(start), Some(end)) if start > end => Err(MonitorError::validation("start must not be after end")),
        _ => Ok(()),
    }
}

impl History {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    pub async fn checks(&self, mut query: CheckQuery) -> Result<Page<Check>> {
        check_range(query.start, query.end)?;
        query.limit = clamp_limit(query.limit);
        self.store.query_checks(&query).await
    }

    pub async fn incidents(&self, mut query: IncidentQuery) -> Result<Page<Incident>> {
        check_range(query.start, query.end)?;
        query.limit = clamp_limit(query.limit);
        self.store.query_incidents(&query).await
    }

    pub async fn incident(&self, id: Uuid) -> Result<Incident> {
        self.store.get_incident(id).await?.ok_or_else(|| MonitorError::not_found("Incident", id))
    }

    /// A site's retained snapshots, newest first
    pub async fn snapshots(&self, site_id: Uuid) -> Result<Vec<Snapshot>> {
        if self.store.get_site(site_id).await?.is_none() {
            return Err(MonitorError::not_found("Site", site_id));
        }
        self.store.list_snapshots(site_id).await
    }

    pub async fn snapshot(&self, id: Uuid) -> Result<Snapshot> {
        self.store.get_snapshot(id).await?.ok_or_else(|| MonitorError::not_found("Snapshot", id))
    }

    /// Diff two stored snapshots
    pub async fn compare_snapshots(&self, old_id: Uuid, new_id: Uuid) -> Result<SnapshotComparison> {
        let old = self.snapshot(old_id).await?;
        let new = self.snapshot(new_id).await?;

        Ok(SnapshotComparison {
            old_snapshot: SnapshotHeader::from(&old),
            new_snapshot: SnapshotHeader::from(&new),
            stats: diff(&old.html_content, &new.html_content),
        })
    }
}
