//! SLA metrics derived from raw check and incident rows.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::database::Store;
use crate::database::models::{Check, Incident, IncidentType, Site};
use crate::error::{MonitorError, Result};

/// Default reporting window
pub const DEFAULT_REPORT_DAYS: i64 = 30;

/// Which sites a report covers
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ReportScope {
    AllActive,
    Site(Uuid),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SlaMetrics {
    pub uptime_percent: f64,
    pub total_checks: usize,
    pub failed_checks: usize,
    pub avg_response_time: u64,
    pub p95_response_time: u64,
    pub total_incidents: usize,
    pub incidents_by_type: BTreeMap<IncidentType, usize>,
    /// Seconds; open incidents count up to the report end
    pub total_downtime: i64,
    /// Mean seconds to recovery over resolved incidents
    pub mttr: i64,
    pub longest_incident: i64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SiteSla {
    pub site_id: Uuid,
    pub name: String,
    pub url: String,
    pub metrics: SlaMetrics,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SlaReport {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub sites: Vec<SiteSla>,
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

fn millis_to_seconds(millis: f64) -> i64 {
    (millis / 1000.0).round() as i64
}

/// Compute metrics for one site's checks and incidents.
///
/// Unresolved incidents are measured up to `now`.
pub fn compute_metrics(checks: &[Check], incidents: &[Incident], now: DateTime<Utc>) -> SlaMetrics {
    let total_checks = checks.len();
    let failed_checks = checks.iter().filter(|check| !check.is_up).count();
    let uptime_percent = if total_checks == 0 {
        0.0
    } else {
        round2((total_checks - failed_checks) as f64 / total_checks as f64 * 100.0)
    };

    let mut response_times: Vec<u64> = checks.iter().map(|check| check.response_time_ms).collect();
    response_times.sort_unstable();
    let avg_response_time = if response_times.is_empty() {
        0
    } else {
        (response_times.iter().sum::<u64>() as f64 / response_times.len() as f64).round() as u64
    };
    let p95_index = (response_times.len() as f64 * 0.95).floor() as usize;
    let p95_response_time = response_times.get(p95_index).or(response_times.last()).copied().unwrap_or(0);

    let mut incidents_by_type = BTreeMap::new();
    for incident in incidents {
        *incidents_by_type.entry(incident.kind).or_insert(0) += 1;
    }

    // Sum raw milliseconds and round once so sub-second parts are not lost
    let durations: Vec<i64> = incidents.iter().map(|incident| incident.duration_millis(now)).collect();
    let total_downtime = millis_to_seconds(durations.iter().sum::<i64>() as f64);
    let longest_incident = millis_to_seconds(durations.iter().copied().max().unwrap_or(0) as f64);

    let resolved: Vec<i64> = incidents
        .iter()
        .filter(|incident| incident.is_resolved)
        .map(|incident| incident.duration_millis(now))
        .collect();
    let mttr = if resolved.is_empty() {
        0
    } else {
        millis_to_seconds(resolved.iter().sum::<i64>() as f64 / resolved.len() as f64)
    };

    SlaMetrics {
        uptime_percent,
        total_checks,
        failed_checks,
        avg_response_time,
        p95_response_time,
        total_incidents: incidents.len(),
        incidents_by_type,
        total_downtime,
        mttr,
        longest_incident,
    }
}

/// Derives SLA reports from stored history
pub struct SlaReporter {
    store: Arc<dyn Store>,
}

impl SlaReporter {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Build a report; `start`/`end` default to the last 30 days
    pub async fn report(
        &self,
        scope: ReportScope,
        start: Option<DateTime<Utc>>,
        end: Option<DateTime<Utc>>,
    ) -> Result<SlaReport> {
        let now = Utc::now();
        let end = end.unwrap_or(now);
        let start = start.unwrap_or(end - Duration::days(DEFAULT_REPORT_DAYS));
        if start > end {
            return Err(MonitorError::validation("start must not be after end"));
        }

        let sites: Vec<Site> = match scope {
            ReportScope::AllActive => self.store.list_sites(true).await?,
            ReportScope::Site(id) => {
                vec![self.store.get_site(id).await?.ok_or_else(|| MonitorError::not_found("Site", id))?]
            }
        };

        let mut reports = Vec::with_capacity(sites.len());
        for site in sites {
            let checks = self.store.checks_in_range(site.id, start, end).await?;
            let incidents = self.store.incidents_in_range(site.id, start, end).await?;
            reports.push(SiteSla {
                site_id: site.id,
                name: site.name,
                url: site.url,
                metrics: compute_metrics(&checks, &incidents, now.min(end).max(start)),
            });
        }

        Ok(SlaReport { start, end, sites: reports })
    }
}
