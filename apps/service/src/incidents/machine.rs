//! Pure incident transition rules.
//!
//! A site is either clear (no unresolved incident) or open with exactly one
//! incident. Each check moves it through [`plan`]; persistence happens in the
//! handler.

use crate::database::models::{Check, Incident, IncidentType};

/// What a check does to a site's incident state
#[derive(Debug, Clone, PartialEq)]
pub enum Transition {
    /// Nothing to do
    Stay,

    /// Open a new incident, closing `supersedes` first when set
    Open { kind: IncidentType, supersedes: Option<Incident> },

    /// Close the active incident after recovery
    Resolve(Incident),
}

/// The anomaly a check signals, if any
pub fn anomaly(check: &Check) -> Option<IncidentType> {
    if !check.is_up {
        Some(IncidentType::Downtime)
    } else if check.has_change {
        Some(IncidentType::ContentChange)
    } else {
        None
    }
}

/// Decide the transition for `check` given the site's active incident
pub fn plan(active: Option<&Incident>, check: &Check) -> Transition {
    match (anomaly(check), active) {
        (Some(kind), Some(current)) if current.kind == kind => Transition::Stay,
        (Some(kind), current) => Transition::Open { kind, supersedes: current.cloned() },
        (None, Some(current)) => Transition::Resolve(current.clone()),
        (None, None) => Transition::Stay,
    }
}

/// Human-readable description for a newly opened incident
pub fn describe(kind: IncidentType, check: &Check) -> String {
    match kind {
        IncidentType::ContentChange => {
            format!("Content changed by {}%", check.change_percent.unwrap_or_default())
        }
        IncidentType::Downtime | IncidentType::Timeout | IncidentType::Error => match &check.error_message {
            Some(message) => message.clone(),
            None => format!("HTTP {}", check.status_code),
        },
    }
}

/// Build the incident a check opens
pub fn open_incident(kind: IncidentType, check: &Check) -> Incident {
    let status_code = (check.status_code != 0).then_some(check.status_code);
    let change_percent = match kind {
        IncidentType::ContentChange => check.change_percent,
        _ => None,
    };
    Incident::open(check.site_id, kind, check.timestamp, status_code, change_percent, describe(kind, check))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    fn up(site: Uuid, change: Option<f64>, has_change: bool) -> Check {
        Check::responded(site, 200, 100, "h".into(), change, has_change, Utc::now())
    }

    fn down(site: Uuid, status: u16) -> Check {
        Check::responded(site, status, 100, "h".into(), None, false, Utc::now())
    }

    #[test]
    fn test_clear_site_opens_downtime() {
        let site = Uuid::new_v4();
        let transition = plan(None, &down(site, 500));
        assert_eq!(transition, Transition::Open { kind: IncidentType::Downtime, supersedes: None });
    }

    #[test]
    fn test_repeated_downtime_is_noop() {
        let site = Uuid::new_v4();
        let check = down(site, 500);
        let active = open_incident(IncidentType::Downtime, &check);
        assert_eq!(plan(Some(&active), &down(site, 502)), Transition::Stay);
    }

    #[test]
    fn test_change_supersedes_downtime() {
        let site = Uuid::new_v4();
        let active = open_incident(IncidentType::Downtime, &down(site, 500));
        match plan(Some(&active), &up(site, Some(40.0), true)) {
            Transition::Open { kind, supersedes } => {
                assert_eq!(kind, IncidentType::ContentChange);
                assert_eq!(supersedes.map(|i| i.id), Some(active.id));
            }
            other => panic!("unexpected transition {other:?}"),
        }
    }

    #[test]
    fn test_downtime_supersedes_content_change() {
        let site = Uuid::new_v4();
        let active = open_incident(IncidentType::ContentChange, &up(site, Some(40.0), true));
        assert!(matches!(
            plan(Some(&active), &down(site, 503)),
            Transition::Open { kind: IncidentType::Downtime, supersedes: Some(_) }
        ));
    }

    #[test]
    fn test_recovery_resolves_any_open_incident() {
        let site = Uuid::new_v4();
        for kind in IncidentType::ALL {
            let mut active = open_incident(IncidentType::Downtime, &down(site, 500));
            active.kind = kind;
            assert_eq!(plan(Some(&active), &up(site, Some(1.0), false)), Transition::Resolve(active.clone()));
        }
        assert_eq!(plan(None, &up(site, None, false)), Transition::Stay);
    }

    #[test]
    fn test_descriptions() {
        let site = Uuid::new_v4();
        assert_eq!(describe(IncidentType::Downtime, &down(site, 503)), "HTTP 503");
        assert_eq!(describe(IncidentType::ContentChange, &up(site, Some(42.5), true)), "Content changed by 42.5%");

        let failed = Check::transport_failure(site, 30_000, "Request timed out".into(), Utc::now());
        assert_eq!(describe(IncidentType::Downtime, &failed), "Request timed out");
        let incident = open_incident(IncidentType::Downtime, &failed);
        assert_eq!(incident.status_code, None);
        assert_eq!(incident.start_time, failed.timestamp);
    }
}
