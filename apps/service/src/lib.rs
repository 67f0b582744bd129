//! Pagewatch monitoring engine
//!
//! Periodically probes registered sites, records checks and content
//! snapshots, tracks incidents and notifies configured alert channels.

pub mod alerts;
pub mod config;
pub mod database;
pub mod error;
pub mod history;
pub mod incidents;
pub mod monitoring;
pub mod orchestrator;
pub mod pool;
pub mod reports;
pub mod sites;
pub mod validation;

#[cfg(test)]
mod testing;

pub use error::{MonitorError, Result};
pub use orchestrator::Orchestrator;
