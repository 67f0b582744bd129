use async_trait::async_trait;
use chrono::{DateTime, Utc};
use libsql::{Row, Value, params};
use uuid::Uuid;

use super::models::{
    AlertConfig, Check, CheckQuery, Incident, IncidentQuery, Page, Site, Snapshot, i64_to_timestamp,
    timestamp_to_i64,
};
use crate::error::{MonitorError, Result};
use crate::pool::{LibsqlManager, LibsqlPool};

/// Site storage. Sites are soft-deleted through `is_active`, never removed.
#[async_trait]
pub trait SiteStore: Send + Sync {
    async fn insert_site(&self, site: &Site) -> Result<()>;

    /// Update the mutable fields of an existing site
    async fn update_site(&self, site: &Site) -> Result<()>;

    async fn get_site(&self, id: Uuid) -> Result<Option<Site>>;

    async fn find_site_by_url(&self, url: &str) -> Result<Option<Site>>;

    async fn list_sites(&self, active_only: bool) -> Result<Vec<Site>>;
}

/// Append-only check storage
#[async_trait]
pub trait CheckStore: Send + Sync {
    async fn insert_check(&self, check: &Check) -> Result<()>;

    async fn latest_check(&self, site_id: Uuid) -> Result<Option<Check>>;

    /// Newest first, paginated, with total count
    async fn query_checks(&self, query: &CheckQuery) -> Result<Page<Check>>;

    /// All checks of a site in `[start, end]`, oldest first
    async fn checks_in_range(&self, site_id: Uuid, start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Vec<Check>>;
}

/// Snapshot storage with bounded per-site retention
#[async_trait]
pub trait SnapshotStore: Send + Sync {
    /// Insert a snapshot, then evict the oldest beyond `retain` for its site
    async fn insert_snapshot(&self, snapshot: &Snapshot, retain: usize) -> Result<()>;

    async fn latest_snapshot(&self, site_id: Uuid) -> Result<Option<Snapshot>>;

    async fn get_snapshot(&self, id: Uuid) -> Result<Option<Snapshot>>;

    /// Newest first
    async fn list_snapshots(&self, site_id: Uuid) -> Result<Vec<Snapshot>>;
}

#[async_trait]
pub trait IncidentStore: Send + Sync {
    async fn insert_incident(&self, incident: &Incident) -> Result<()>;

    /// The unresolved incident of a site, if any
    async fn active_incident(&self, site_id: Uuid) -> Result<Option<Incident>>;

    /// Close an incident and return it in its resolved state
    async fn resolve_incident(&self, id: Uuid, end_time: DateTime<Utc>) -> Result<Incident>;

    async fn mark_alert_sent(&self, id: Uuid, at: DateTime<Utc>) -> Result<()>;

    async fn mark_resolution_alert_sent(&self, id: Uuid) -> Result<()>;

    async fn get_incident(&self, id: Uuid) -> Result<Option<Incident>>;

    /// Newest first, paginated, with total count
    async fn query_incidents(&self, query: &IncidentQuery) -> Result<Page<Incident>>;

    /// Incidents of a site that started in `[start, end]`
    async fn incidents_in_range(&self, site_id: Uuid, start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Vec<Incident>>;
}

#[async_trait]
pub trait AlertConfigStore: Send + Sync {
    /// The stored configuration, without creating one
    async fn find_alert_config(&self) -> Result<Option<AlertConfig>>;

    /// The stored configuration, created with defaults on first read
    async fn get_or_create_alert_config(&self) -> Result<AlertConfig>;

    async fn save_alert_config(&self, config: &AlertConfig) -> Result<()>;
}

/// Every store the engine needs, behind one object
pub trait Store: SiteStore + CheckStore + SnapshotStore + IncidentStore + AlertConfigStore {}

impl<T> Store for T where T: SiteStore + CheckStore + SnapshotStore + IncidentStore + AlertConfigStore {}

/// LibSQL database implementation
pub struct DatabaseImpl {
    pool: LibsqlPool,
}

const SITE_COLUMNS: &str =
    "uuid, name, url, check_frequency, change_threshold, is_active, created_at, updated_at";
const CHECK_COLUMNS: &str = "uuid, site_uuid, status_code, response_time_ms, is_up, html_hash, \
                             change_percent, has_change, timestamp, error_message";
const SNAPSHOT_COLUMNS: &str = "uuid, site_uuid, html_content, html_hash, captured_at";
const INCIDENT_COLUMNS: &str = "uuid, site_uuid, type, start_time, end_time, is_resolved, status_code, \
                                change_percent, description, alert_sent, alert_sent_at, resolution_alert_sent";
const ALERT_CONFIG_COLUMNS: &str = "email_enabled, email_to, email_from, brevo_api_key, telegram_enabled, \
                                    telegram_bot_token, telegram_chat_id, alert_on_down, alert_on_change, \
                                    alert_on_recovery, updated_at";

impl DatabaseImpl {
    /// Create a new database instance from a pool
    pub fn new_from_pool(pool: LibsqlPool) -> Self {
        Self { pool }
    }

    /// Get a connection from the pool
    async fn get_conn(&self) -> Result<deadpool::managed::Object<LibsqlManager>> {
        Ok(self.pool.get().await?)
    }

    async fn count(&self, sql: &str, values: Vec<Value>) -> Result<u64> {
        let conn = self.get_conn().await?;
        let mut rows = conn.query(sql, libsql::params::Params::Positional(values)).await?;
        match rows.next().await? {
            Some(row) => Ok(row.get::<i64>(0)? as u64),
            None => Ok(0),
        }
    }
}

fn flag(value: bool) -> i64 {
    if value { 1 } else { 0 }
}

fn parse_uuid(row: &Row, idx: i32) -> Result<Uuid> {
    let raw: String = row.get(idx)?;
    Ok(Uuid::parse_str(&raw)?)
}

fn optional_timestamp(row: &Row, idx: i32) -> Result<Option<DateTime<Utc>>> {
    row.get::<Option<i64>>(idx)?.map(i64_to_timestamp).transpose()
}

fn site_from_row(row: &Row) -> Result<Site> {
    Ok(Site {
        id: parse_uuid(row, 0)?,
        name: row.get(1)?,
        url: row.get(2)?,
        check_frequency: row.get::<i64>(3)? as u32,
        change_threshold: row.get(4)?,
        is_active: row.get::<i64>(5)? != 0,
        created_at: i64_to_timestamp(row.get(6)?)?,
        updated_at: i64_to_timestamp(row.get(7)?)?,
    })
}

fn check_from_row(row: &Row) -> Result<Check> {
    Ok(Check {
        id: parse_uuid(row, 0)?,
        site_id: parse_uuid(row, 1)?,
        status_code: row.get::<i64>(2)? as u16,
        response_time_ms: row.get::<i64>(3)? as u64,
        is_up: row.get::<i64>(4)? != 0,
        html_hash: row.get(5)?,
        change_percent: row.get(6)?,
        has_change: row.get::<i64>(7)? != 0,
        timestamp: i64_to_timestamp(row.get(8)?)?,
        error_message: row.get(9)?,
    })
}

fn snapshot_from_row(row: &Row) -> Result<Snapshot> {
    Ok(Snapshot {
        id: parse_uuid(row, 0)?,
        site_id: parse_uuid(row, 1)?,
        html_content: row.get(2)?,
        html_hash: row.get(3)?,
        captured_at: i64_to_timestamp(row.get(4)?)?,
    })
}

fn incident_from_row(row: &Row) -> Result<Incident> {
    let kind: String = row.get(2)?;
    Ok(Incident {
        id: parse_uuid(row, 0)?,
        site_id: parse_uuid(row, 1)?,
        kind: kind.parse().map_err(|_| MonitorError::Persistence(format!("unknown incident type {kind}")))?,
        start_time: i64_to_timestamp(row.get(3)?)?,
        end_time: optional_timestamp(row, 4)?,
        is_resolved: row.get::<i64>(5)? != 0,
        status_code: row.get::<Option<i64>>(6)?.map(|v| v as u16),
        change_percent: row.get(7)?,
        description: row.get(8)?,
        alert_sent: row.get::<i64>(9)? != 0,
        alert_sent_at: optional_timestamp(row, 10)?,
        resolution_alert_sent: row.get::<i64>(11)? != 0,
    })
}

fn alert_config_from_row(row: &Row) -> Result<AlertConfig> {
    let email_to: String = row.get(1)?;
    Ok(AlertConfig {
        email_enabled: row.get::<i64>(0)? != 0,
        email_to: serde_json::from_str(&email_to)?,
        email_from: row.get(2)?,
        brevo_api_key: row.get(3)?,
        telegram_enabled: row.get::<i64>(4)? != 0,
        telegram_bot_token: row.get(5)?,
        telegram_chat_id: row.get(6)?,
        alert_on_down: row.get::<i64>(7)? != 0,
        alert_on_change: row.get::<i64>(8)? != 0,
        alert_on_recovery: row.get::<i64>(9)? != 0,
        updated_at: i64_to_timestamp(row.get(10)?)?,
    })
}

/// Builds a `WHERE` clause from optional filters
#[derive(Default)]
struct Filters {
    clauses: Vec<&'static str>,
    values: Vec<Value>,
}

impl Filters {
    fn push(&mut self, clause: &'static str, value: Value) {
        self.clauses.push(clause);
        self.values.push(value);
    }

    fn where_clause(&self) -> String {
        if self.clauses.is_empty() {
            String::new()
        } else {
            format!(" WHERE {}", self.clauses.join(" AND "))
        }
    }
}

#[async_trait]
impl SiteStore for DatabaseImpl {
    async fn insert_site(&self, site: &Site) -> Result<()> {
        let conn = self.get_conn().await?;
        conn.execute(
            "INSERT INTO sites (uuid, name, url, check_frequency, change_threshold, is_active, created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
            params![
                site.id.to_string(),
                site.name.clone(),
                site.url.clone(),
                i64::from(site.check_frequency),
                site.change_threshold,
                flag(site.is_active),
                timestamp_to_i64(site.created_at),
                timestamp_to_i64(site.updated_at)
            ],
        )
        .await?;
        Ok(())
    }

    async fn update_site(&self, site: &Site) -> Result<()> {
        let conn = self.get_conn().await?;
        let changed = conn
            .execute(
                "UPDATE sites SET name = ?, url = ?, check_frequency = ?, change_threshold = ?, is_active = ?, updated_at = ? WHERE uuid = ?",
                params![
                    site.name.clone(),
                    site.url.clone(),
                    i64::from(site.check_frequency),
                    site.change_threshold,
                    flag(site.is_active),
                    timestamp_to_i64(site.updated_at),
                    site.id.to_string()
                ],
            )
            .await?;
        if changed == 0 {
            return Err(MonitorError::not_found("Site", site.id));
        }
        Ok(())
    }

    async fn get_site(&self, id: Uuid) -> Result<Option<Site>> {
        let conn = self.get_conn().await?;
        let mut rows = conn
            .query(&format!("SELECT {SITE_COLUMNS} FROM sites WHERE uuid = ?"), params![id.to_string()])
            .await?;
        rows.next().await?.map(|row| site_from_row(&row)).transpose()
    }

    async fn find_site_by_url(&self, url: &str) -> Result<Option<Site>> {
        let conn = self.get_conn().await?;
        let mut rows = conn
            .query(&format!("SELECT {SITE_COLUMNS} FROM sites WHERE url = ?"), params![url])
            .await?;
        rows.next().await?.map(|row| site_from_row(&row)).transpose()
    }

    async fn list_sites(&self, active_only: bool) -> Result<Vec<Site>> {
        let conn = self.get_conn().await?;
        let sql = if active_only {
            format!("SELECT {SITE_COLUMNS} FROM sites WHERE is_active = 1 ORDER BY created_at DESC")
        } else {
            format!("SELECT {SITE_COLUMNS} FROM sites ORDER BY created_at DESC")
        };
        let mut rows = conn.query(&sql, ()).await?;
        let mut sites = Vec::new();
        while let Some(row) = rows.next().await? {
            sites.push(site_from_row(&row)?);
        }
        Ok(sites)
    }
}

#[async_trait]
impl CheckStore for DatabaseImpl {
    async fn insert_check(&self, check: &Check) -> Result<()> {
        let conn = self.get_conn().await?;
        conn.execute(
            &format!("INSERT INTO checks ({CHECK_COLUMNS}) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"),
            params![
                check.id.to_string(),
                check.site_id.to_string(),
                i64::from(check.status_code),
                check.response_time_ms as i64,
                flag(check.is_up),
                check.html_hash.clone(),
                check.change_percent,
                flag(check.has_change),
                timestamp_to_i64(check.timestamp),
                check.error_message.clone()
            ],
        )
        .await?;
        Ok(())
    }

    async fn latest_check(&self, site_id: Uuid) -> Result<Option<Check>> {
        let conn = self.get_conn().await?;
        let mut rows = conn
            .query(
                &format!(
                    "SELECT {CHECK_COLUMNS} FROM checks WHERE site_uuid = ? ORDER BY timestamp DESC, id DESC LIMIT 1"
                ),
                params![site_id.to_string()],
            )
            .await?;
        rows.next().await?.map(|row| check_from_row(&row)).transpose()
    }

    async fn query_checks(&self, query: &CheckQuery) -> Result<Page<Check>> {
        let mut filters = Filters::default();
        if let Some(site_id) = query.site_id {
            filters.push("site_uuid = ?", Value::Text(site_id.to_string()));
        }
        if let Some(start) = query.start {
            filters.push("timestamp >= ?", Value::Integer(timestamp_to_i64(start)));
        }
        if let Some(end) = query.end {
            filters.push("timestamp <= ?", Value::Integer(timestamp_to_i64(end)));
        }
        let where_clause = filters.where_clause();

        let total = self
            .count(&format!("SELECT COUNT(*) FROM checks{where_clause}"), filters.values.clone())
            .await?;

        let mut values = filters.values;
        values.push(Value::Integer(i64::from(query.limit)));
        values.push(Value::Integer(i64::from(query.offset)));

        let conn = self.get_conn().await?;
        let mut rows = conn
            .query(
                &format!(
                    "SELECT {CHECK_COLUMNS} FROM checks{where_clause} ORDER BY timestamp DESC, id DESC LIMIT ? OFFSET ?"
                ),
                libsql::params::Params::Positional(values),
            )
            .await?;
        let mut checks = Vec::new();
        while let Some(row) = rows.next().await? {
            checks.push(check_from_row(&row)?);
        }

        Ok(Page::new(checks, total, query.limit, query.offset))
    }

    async fn checks_in_range(&self, site_id: Uuid, start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Vec<Check>> {
        let conn = self.get_conn().await?;
        let mut rows = conn
            .query(
                &format!(
                    "SELECT {CHECK_COLUMNS} FROM checks WHERE site_uuid = ? AND timestamp >= ? AND timestamp <= ? ORDER BY timestamp ASC, id ASC"
                ),
                params![site_id.to_string(), timestamp_to_i64(start), timestamp_to_i64(end)],
            )
            .await?;
        let mut checks = Vec::new();
        while let Some(row) = rows.next().await? {
            checks.push(check_from_row(&row)?);
        }
        Ok(checks)
    }
}

#[async_trait]
impl SnapshotStore for DatabaseImpl {
    async fn insert_snapshot(&self, snapshot: &Snapshot, retain: usize) -> Result<()> {
        let conn = self.get_conn().await?;
        let tx = conn.transaction().await?;

        tx.execute(
            &format!("INSERT INTO snapshots ({SNAPSHOT_COLUMNS}) VALUES (?, ?, ?, ?, ?)"),
            params![
                snapshot.id.to_string(),
                snapshot.site_id.to_string(),
                snapshot.html_content.clone(),
                snapshot.html_hash.clone(),
                timestamp_to_i64(snapshot.captured_at)
            ],
        )
        .await?;

        let evicted = tx
            .execute(
                "DELETE FROM snapshots WHERE site_uuid = ? AND id NOT IN (
                    SELECT id FROM snapshots WHERE site_uuid = ? ORDER BY captured_at DESC, id DESC LIMIT ?
                )",
                params![snapshot.site_id.to_string(), snapshot.site_id.to_string(), retain as i64],
            )
            .await?;

        tx.commit().await?;

        if evicted > 0 {
            tracing::debug!("Evicted {} snapshot(s) for site {}", evicted, snapshot.site_id);
        }
        Ok(())
    }

    async fn latest_snapshot(&self, site_id: Uuid) -> Result<Option<Snapshot>> {
        let conn = self.get_conn().await?;
        let mut rows = conn
            .query(
                &format!(
                    "SELECT {SNAPSHOT_COLUMNS} FROM snapshots WHERE site_uuid = ? ORDER BY captured_at DESC, id DESC LIMIT 1"
                ),
                params![site_id.to_string()],
            )
            .await?;
        rows.next().await?.map(|row| snapshot_from_row(&row)).transpose()
    }

    async fn get_snapshot(&self, id: Uuid) -> Result<Option<Snapshot>> {
        let conn = self.get_conn().await?;
        let mut rows = conn
            .query(&format!("SELECT {SNAPSHOT_COLUMNS} FROM snapshots WHERE uuid = ?"), params![id.to_string()])
            .await?;
        rows.next().await?.map(|row| snapshot_from_row(&row)).transpose()
    }

    async fn list_snapshots(&self, site_id: Uuid) -> Result<Vec<Snapshot>> {
        let conn = self.get_conn().await?;
        let mut rows = conn
            .query(
                &format!(
                    "SELECT {SNAPSHOT_COLUMNS} FROM snapshots WHERE site_uuid = ? ORDER BY captured_at DESC, id DESC"
                ),
                params![site_id.to_string()],
            )
            .await?;
        let mut snapshots = Vec::new();
        while let Some(row) = rows.next().await? {
            snapshots.push(snapshot_from_row(&row)?);
        }
        Ok(snapshots)
    }
}

#[async_trait]
impl IncidentStore for DatabaseImpl {
    async fn insert_incident(&self, incident: &Incident) -> Result<()> {
        let conn = self.get_conn().await?;
        conn.execute(
            &format!("INSERT INTO incidents ({INCIDENT_COLUMNS}) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"),
            params![
                incident.id.to_string(),
                incident.site_id.to_string(),
                incident.kind.as_str(),
                timestamp_to_i64(incident.start_time),
                incident.end_time.map(timestamp_to_i64),
                flag(incident.is_resolved),
                incident.status_code.map(i64::from),
                incident.change_percent,
                incident.description.clone(),
                flag(incident.alert_sent),
                incident.alert_sent_at.map(timestamp_to_i64),
                flag(incident.resolution_alert_sent)
            ],
        )
        .await?;
        Ok(())
    }

    async fn active_incident(&self, site_id: Uuid) -> Result<Option<Incident>> {
        let conn = self.get_conn().await?;
        let mut rows = conn
            .query(
                &format!(
                    "SELECT {INCIDENT_COLUMNS} FROM incidents WHERE site_uuid = ? AND is_resolved = 0 ORDER BY start_time DESC LIMIT 1"
                ),
                params![site_id.to_string()],
            )
            .await?;
        rows.next().await?.map(|row| incident_from_row(&row)).transpose()
    }

    async fn resolve_incident(&self, id: Uuid, end_time: DateTime<Utc>) -> Result<Incident> {
        let conn = self.get_conn().await?;
        let changed = conn
            .execute(
                "UPDATE incidents SET is_resolved = 1, end_time = ? WHERE uuid = ? AND is_resolved = 0",
                params![timestamp_to_i64(end_time), id.to_string()],
            )
            .await?;
        drop(conn);

        let incident = self.get_incident(id).await?.ok_or_else(|| MonitorError::not_found("Incident", id))?;
        if changed == 0 {
            tracing::warn!("Incident {} was already resolved", id);
        }
        Ok(incident)
    }

    async fn mark_alert_sent(&self, id: Uuid, at: DateTime<Utc>) -> Result<()> {
        let conn = self.get_conn().await?;
        conn.execute(
            "UPDATE incidents SET alert_sent = 1, alert_sent_at = ? WHERE uuid = ?",
            params![timestamp_to_i64(at), id.to_string()],
        )
        .await?;
        Ok(())
    }

    async fn mark_resolution_alert_sent(&self, id: Uuid) -> Result<()> {
        let conn = self.get_conn().await?;
        conn.execute("UPDATE incidents SET resolution_alert_sent = 1 WHERE uuid = ?", params![id.to_string()])
            .await?;
        Ok(())
    }

    async fn get_incident(&self, id: Uuid) -> Result<Option<Incident>> {
        let conn = self.get_conn().await?;
        let mut rows = conn
            .query(&format!("SELECT {INCIDENT_COLUMNS} FROM incidents WHERE uuid = ?"), params![id.to_string()])
            .await?;
        rows.next().await?.map(|row| incident_from_row(&row)).transpose()
    }

    async fn query_incidents(&self, query: &IncidentQuery) -> Result<Page<Incident>> {
        let mut filters = Filters::default();
        if let Some(site_id) = query.site_id {
            filters.push("site_uuid = ?", Value::Text(site_id.to_string()));
        }
        if let Some(kind) = query.kind {
            filters.push("type = ?", Value::Text(kind.as_str().to_string()));
        }
        if let Some(resolved) = query.resolved {
            filters.push("is_resolved = ?", Value::Integer(flag(resolved)));
        }
        if let Some(start) = query.start {
            filters.push("start_time >= ?", Value::Integer(timestamp_to_i64(start)));
        }
        if let Some(end) = query.end {
            filters.push("start_time <= ?", Value::Integer(timestamp_to_i64(end)));
        }
        let where_clause = filters.where_clause();

        let total = self
            .count(&format!("SELECT COUNT(*) FROM incidents{where_clause}"), filters.values.clone())
            .await?;

        let mut values = filters.values;
        values.push(Value::Integer(i64::from(query.limit)));
        values.push(Value::Integer(i64::from(query.offset)));

        let conn = self.get_conn().await?;
        let mut rows = conn
            .query(
                &format!(
                    "SELECT {INCIDENT_COLUMNS} FROM incidents{where_clause} ORDER BY start_time DESC, id DESC LIMIT ? OFFSET ?"
                ),
                libsql::params::Params::Positional(values),
            )
            .await?;
        let mut incidents = Vec::new();
        while let Some(row) = rows.next().await? {
            incidents.push(incident_from_row(&row)?);
        }

        Ok(Page::new(incidents, total, query.limit, query.offset))
    }

    async fn incidents_in_range(&self, site_id: Uuid, start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Vec<Incident>> {
        let conn = self.get_conn().await?;
        let mut rows = conn
            .query(
                &format!(
                    "SELECT {INCIDENT_COLUMNS} FROM incidents WHERE site_uuid = ? AND start_time >= ? AND start_time <= ? ORDER BY start_time ASC"
                ),
                params![site_id.to_string(), timestamp_to_i64(start), timestamp_to_i64(end)],
            )
            .await?;
        let mut incidents = Vec::new();
        while let Some(row) = rows.next().await? {
            incidents.push(incident_from_row(&row)?);
        }
        Ok(incidents)
    }
}

#[async_trait]
impl AlertConfigStore for DatabaseImpl {
    async fn find_alert_config(&self) -> Result<Option<AlertConfig>> {
        let conn = self.get_conn().await?;
        let mut rows = conn
            .query(&format!("SELECT {ALERT_CONFIG_COLUMNS} FROM alert_config WHERE id = 1"), ())
            .await?;
        rows.next().await?.map(|row| alert_config_from_row(&row)).transpose()
    }

    async fn get_or_create_alert_config(&self) -> Result<AlertConfig> {
        if let Some(config) = self.find_alert_config().await? {
            return Ok(config);
        }

        let defaults = AlertConfig::default();
        let conn = self.get_conn().await?;
        // A concurrent reader may have created the row first; keep theirs
        conn.execute(
            "INSERT OR IGNORE INTO alert_config (id, updated_at) VALUES (1, ?)",
            params![timestamp_to_i64(defaults.updated_at)],
        )
        .await?;
        drop(conn);
        tracing::info!("Created default alert configuration");

        self.find_alert_config()
            .await?
            .ok_or_else(|| MonitorError::Persistence("alert configuration vanished after creation".into()))
    }

    async fn save_alert_config(&self, config: &AlertConfig) -> Result<()> {
        let conn = self.get_conn().await?;
        conn.execute(
            &format!(
                "INSERT INTO alert_config (id, {ALERT_CONFIG_COLUMNS}) VALUES (1, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
                 ON CONFLICT(id) DO UPDATE SET
                    email_enabled = excluded.email_enabled,
                    email_to = excluded.email_to,
                    email_from = excluded.email_from,
                    brevo_api_key = excluded.brevo_api_key,
                    telegram_enabled = excluded.telegram_enabled,
                    telegram_bot_token = excluded.telegram_bot_token,
                    telegram_chat_id = excluded.telegram_chat_id,
                    alert_on_down = excluded.alert_on_down,
                    alert_on_change = excluded.alert_on_change,
                    alert_on_recovery = excluded.alert_on_recovery,
                    updated_at = excluded.updated_at"
            ),
            params![
                flag(config.email_enabled),
                serde_json::to_string(&config.email_to)?,
                config.email_from.clone(),
                config.brevo_api_key.clone(),
                flag(config.telegram_enabled),
                config.telegram_bot_token.clone(),
                config.telegram_chat_id.clone(),
                flag(config.alert_on_down),
                flag(config.alert_on_change),
                flag(config.alert_on_recovery),
                timestamp_to_i64(config.updated_at)
            ],
        )
        .await?;
        Ok(())
    }
}
