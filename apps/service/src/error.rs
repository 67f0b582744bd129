use thiserror::Error;

/// Errors surfaced by the monitoring engine's public operations.
///
/// Transport failures during a probe are normally captured as data (a `Check`
/// row with `status_code = 0`); the `Transport` variant only leaves the
/// checker so the executor can record it.
#[derive(Debug, Error)]
pub enum MonitorError {
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: String },

    #[error("Transport failure: {0}")]
    Transport(String),

    #[error("Persistence failure: {0}")]
    Persistence(String),

    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl MonitorError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn not_found(kind: &'static str, id: impl ToString) -> Self {
        Self::NotFound { kind, id: id.to_string() }
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }
}

impl From<libsql::Error> for MonitorError {
    fn from(error: libsql::Error) -> Self {
        Self::Persistence(error.to_string())
    }
}

impl From<deadpool::managed::PoolError<libsql::Error>> for MonitorError {
    fn from(error: deadpool::managed::PoolError<libsql::Error>) -> Self {
        Self::Persistence(format!("connection pool: {error}"))
    }
}

impl From<uuid::Error> for MonitorError {
    fn from(error: uuid::Error) -> Self {
        Self::Persistence(format!("corrupt identifier in row: {error}"))
    }
}

impl From<serde_json::Error> for MonitorError {
    fn from(error: serde_json::Error) -> Self {
        Self::Persistence(format!("corrupt JSON column: {error}"))
    }
}

pub type Result<T, E = MonitorError> = std::result::Result<T, E>;
