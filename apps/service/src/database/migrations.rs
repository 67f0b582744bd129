use chrono::Utc;
use libsql::Connection;

use crate::error::Result;

/// Schema version - increment when making schema changes
const SCHEMA_VERSION: i32 = 2;

/// Run database migrations
///
/// This is the single source of truth for the database schema.
pub async fn run_migrations(conn: &Connection) -> Result<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS schema_migrations (
            version INTEGER PRIMARY KEY,
            applied_at INTEGER NOT NULL,
            description TEXT
        )",
        (),
    )
    .await?;

    let current_version = get_current_version(conn).await?;

    if current_version >= SCHEMA_VERSION {
        tracing::info!("Database schema is up to date (version {})", current_version);
        return Ok(());
    }

    tracing::info!("Running migrations from version {} to {}", current_version, SCHEMA_VERSION);

    if current_version < 1 {
        run_migration_v1(conn).await?;
        record_migration(conn, 1, "Sites, checks, snapshots and incidents").await?;
    }

    if current_version < 2 {
        run_migration_v2(conn).await?;
        record_migration(conn, 2, "Alert configuration singleton").await?;
    }

    tracing::info!("Database migrations completed successfully (now at version {})", SCHEMA_VERSION);
    Ok(())
}

/// Get current schema version from database
async fn get_current_version(conn: &Connection) -> Result<i32> {
    let mut rows = conn.query("SELECT MAX(version) FROM schema_migrations", ()).await?;

    if let Some(row) = rows.next().await? {
        let version: Option<i64> = row.get(0)?;
        Ok(version.unwrap_or(0) as i32)
    } else {
        Ok(0)
    }
}

/// Record that a migration was applied
async fn record_migration(conn: &Connection, version: i32, description: &str) -> Result<()> {
    conn.execute(
        "INSERT INTO schema_migrations (version, applied_at, description) VALUES (?, ?, ?)",
        libsql::params![version, Utc::now().timestamp(), description],
    )
    .await?;

    tracing::info!("Applied migration v{}: {}", version, description);
    Ok(())
}

/// Migration v1: monitoring tables
async fn run_migration_v1(conn: &Connection) -> Result<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS sites (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            uuid TEXT NOT NULL UNIQUE,
            name TEXT NOT NULL,
            url TEXT NOT NULL UNIQUE,
            check_frequency INTEGER NOT NULL DEFAULT 300,
            change_threshold REAL NOT NULL DEFAULT 10.0,
            is_active INTEGER NOT NULL DEFAULT 1,
            created_at INTEGER NOT NULL,
            updated_at INTEGER NOT NULL
        )",
        (),
    )
    .await?;

    // Append-only; rows are never updated
    conn.execute(
        "CREATE TABLE IF NOT EXISTS checks (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            uuid TEXT NOT NULL UNIQUE,
            site_uuid TEXT NOT NULL,
            status_code INTEGER NOT NULL,
            response_time_ms INTEGER NOT NULL,
            is_up INTEGER NOT NULL,
            html_hash TEXT,
            change_percent REAL,
            has_change INTEGER NOT NULL DEFAULT 0,
            timestamp INTEGER NOT NULL,
            error_message TEXT,
            FOREIGN KEY (site_uuid) REFERENCES sites(uuid)
        )",
        (),
    )
    .await?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS snapshots (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            uuid TEXT NOT NULL UNIQUE,
            site_uuid TEXT NOT NULL,
            html_content TEXT NOT NULL,
            html_hash TEXT NOT NULL,
            captured_at INTEGER NOT NULL,
            FOREIGN KEY (site_uuid) REFERENCES sites(uuid)
        )",
        (),
    )
    .await?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS incidents (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            uuid TEXT NOT NULL UNIQUE,
            site_uuid TEXT NOT NULL,
            type TEXT NOT NULL,
            start_time INTEGER NOT NULL,
            end_time INTEGER,
            is_resolved INTEGER NOT NULL DEFAULT 0,
            status_code INTEGER,
            change_percent REAL,
            description TEXT NOT NULL DEFAULT '',
            alert_sent INTEGER NOT NULL DEFAULT 0,
            alert_sent_at INTEGER,
            resolution_alert_sent INTEGER NOT NULL DEFAULT 0,
            FOREIGN KEY (site_uuid) REFERENCES sites(uuid)
        )",
        (),
    )
    .await?;

    conn.execute("CREATE INDEX IF NOT EXISTS idx_sites_active ON sites(is_active)", ()).await?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_checks_site_timestamp ON checks(site_uuid, timestamp DESC)",
        (),
    )
    .await?;
    conn.execute("CREATE INDEX IF NOT EXISTS idx_checks_timestamp ON checks(timestamp DESC)", ()).await?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_snapshots_site_captured ON snapshots(site_uuid, captured_at DESC)",
        (),
    )
    .await?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_incidents_site_start ON incidents(site_uuid, start_time DESC)",
        (),
    )
    .await?;
    // At most one unresolved incident per site
    conn.execute(
        "CREATE UNIQUE INDEX IF NOT EXISTS idx_incidents_one_open_per_site
            ON incidents(site_uuid) WHERE is_resolved = 0",
        (),
    )
    .await?;

    Ok(())
}

/// Migration v2: alert configuration, a single addressable row
async fn run_migration_v2(conn: &Connection) -> Result<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS alert_config (
            id INTEGER PRIMARY KEY CHECK (id = 1),
            email_enabled INTEGER NOT NULL DEFAULT 0,
            email_to TEXT NOT NULL DEFAULT '[]',
            email_from TEXT NOT NULL DEFAULT '',
            brevo_api_key TEXT,
            telegram_enabled INTEGER NOT NULL DEFAULT 0,
            telegram_bot_token TEXT,
            telegram_chat_id TEXT,
            alert_on_down INTEGER NOT NULL DEFAULT 1,
            alert_on_change INTEGER NOT NULL DEFAULT 1,
            alert_on_recovery INTEGER NOT NULL DEFAULT 1,
            updated_at INTEGER NOT NULL
        )",
        (),
    )
    .await?;

    tracing::info!("Added alert configuration table");
    Ok(())
}
