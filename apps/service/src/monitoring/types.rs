use serde::Serialize;
use uuid::Uuid;

use crate::database::models::{Check, Site};

/// Classified result of one check cycle
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase", rename_all_fields = "camelCase")]
pub enum CheckOutcome {
    /// Endpoint answered 200
    Up { status_code: u16, response_time: u64, change_percent: Option<f64>, has_change: bool },

    /// Endpoint answered with anything other than 200
    Down { status_code: u16, response_time: u64 },

    /// No response was obtained
    #[serde(rename = "error")]
    TransportError { response_time: u64, error_message: String },
}

impl CheckOutcome {
    /// Classify a persisted check
    pub fn from_check(check: &Check) -> Self {
        if let Some(message) = &check.error_message {
            CheckOutcome::TransportError { response_time: check.response_time_ms, error_message: message.clone() }
        } else if check.is_up {
            CheckOutcome::Up {
                status_code: check.status_code,
                response_time: check.response_time_ms,
                change_percent: check.change_percent,
                has_change: check.has_change,
            }
        } else {
            CheckOutcome::Down { status_code: check.status_code, response_time: check.response_time_ms }
        }
    }

    /// Whether this outcome is expected to raise an incident
    pub fn is_incident_worthy(&self) -> bool {
        match self {
            CheckOutcome::Up { has_change, .. } => *has_change,
            CheckOutcome::Down { .. } | CheckOutcome::TransportError { .. } => true,
        }
    }
}

/// Per-site entry of a scheduler pass
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SiteReport {
    pub site_id: Uuid,
    pub name: String,
    pub url: String,
    #[serde(flatten)]
    pub outcome: Option<CheckOutcome>,
    /// Set when the cycle aborted before producing an outcome
    #[serde(flatten)]
    pub failure: Option<SiteFailure>,
}

/// An aborted cycle, reported as `{"status": "failed", "error": ...}`
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename = "failed")]
pub struct SiteFailure {
    pub error: String,
}

impl SiteReport {
    pub fn completed(site: &Site, outcome: CheckOutcome) -> Self {
        Self { site_id: site.id, name: site.name.clone(), url: site.url.clone(), outcome: Some(outcome), failure: None }
    }

    pub fn failed(site: &Site, reason: String) -> Self {
        Self {
            site_id: site.id,
            name: site.name.clone(),
            url: site.url.clone(),
            outcome: None,
            failure: Some(SiteFailure { error: reason }),
        }
    }
}

/// Aggregate of one scheduler pass
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PassSummary {
    pub checks_performed: usize,
    pub incidents_created: usize,
    pub results: Vec<SiteReport>,
}

impl PassSummary {
    pub fn from_reports(results: Vec<SiteReport>) -> Self {
        let incidents_created = results
            .iter()
            .filter(|report| report.outcome.as_ref().is_some_and(CheckOutcome::is_incident_worthy))
            .count();
        Self { checks_performed: results.len(), incidents_created, results }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn test_outcome_serializes_with_status_tag() {
        let up = CheckOutcome::Up { status_code: 200, response_time: 120, change_percent: Some(4.5), has_change: false };
        let json = serde_json::to_value(&up).unwrap();
        assert_eq!(json["status"], "up");
        assert_eq!(json["statusCode"], 200);
        assert_eq!(json["responseTime"], 120);
        assert_eq!(json["hasChange"], false);

        let err = CheckOutcome::TransportError { response_time: 30_000, error_message: "Request timed out".into() };
        let json = serde_json::to_value(&err).unwrap();
        assert_eq!(json["status"], "error");
        assert_eq!(json["errorMessage"], "Request timed out");
    }

    #[test]
    fn test_from_check_classification() {
        let site = Uuid::new_v4();
        let now = Utc::now();

        let down = Check::responded(site, 503, 80, "h".into(), None, false, now);
        assert_eq!(CheckOutcome::from_check(&down), CheckOutcome::Down { status_code: 503, response_time: 80 });

        let failed = Check::transport_failure(site, 10, "Connection failed".into(), now);
        assert!(matches!(CheckOutcome::from_check(&failed), CheckOutcome::TransportError { .. }));
    }

    #[test]
    fn test_summary_counts_incident_worthy_outcomes() {
        let report = |outcome: Option<CheckOutcome>| SiteReport {
            site_id: Uuid::new_v4(),
            name: "s".into(),
            url: "https://s.example".into(),
            outcome,
            failure: None,
        };
        let summary = PassSummary::from_reports(vec![
            report(Some(CheckOutcome::Up { status_code: 200, response_time: 1, change_percent: None, has_change: false })),
            report(Some(CheckOutcome::Up { status_code: 200, response_time: 1, change_percent: Some(50.0), has_change: true })),
            report(Some(CheckOutcome::Down { status_code: 500, response_time: 1 })),
            report(Some(CheckOutcome::TransportError { response_time: 1, error_message: "x".into() })),
            report(None),
        ]);
        assert_eq!(summary.checks_performed, 5);
        assert_eq!(summary.incidents_created, 3);
    }

    #[test]
    fn test_failed_report_carries_failed_status() {
        let report = SiteReport {
            site_id: Uuid::new_v4(),
            name: "s".into(),
            url: "https://s.example".into(),
            outcome: None,
            failure: Some(SiteFailure { error: "Persistence failure: disk full".into() }),
        };
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["status"], "failed");
        assert_eq!(json["error"], "Persistence failure: disk full");
        assert!(json.get("failure").is_none());
    }
}
