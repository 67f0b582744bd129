/// Monitoring engine module - handles execution of monitoring checks
///
/// This module is responsible for:
/// - Fetching sites and classifying the response
/// - Canonicalizing and diffing page content
/// - Scheduling due checks
pub mod checker;
pub mod diff;
pub mod executor;
pub mod locks;
pub mod normalizer;
pub mod scheduler;
pub mod types;

pub use checker::{Checker, HttpChecker, Probe, ProbeSettings};
pub use executor::MonitoringExecutor;
pub use scheduler::MonitoringScheduler;
pub use types::{CheckOutcome, PassSummary, SiteFailure, SiteReport};
