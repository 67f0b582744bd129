//! Database abstraction layer
//!
//! Store traits live in `repository`; `DatabaseImpl` backs all of them with a
//! pooled local LibSQL file.
pub mod migrations;
pub mod models;
pub mod repository;

pub use repository::{
    AlertConfigStore, CheckStore, DatabaseImpl, IncidentStore, SiteStore, SnapshotStore, Store,
};

use crate::error::Result;

/// Initialize database with schema
pub async fn initialize_database(conn: &libsql::Connection) -> Result<()> {
    migrations::run_migrations(conn).await
}
