use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{MonitorError, Result};

/// Number of snapshots retained per site; the oldest is evicted on insert.
pub const SNAPSHOT_RETENTION: usize = 10;

/// Default page size for history queries
pub const DEFAULT_PAGE_LIMIT: u32 = 50;

/// Convert a timestamp to the Unix milliseconds stored in the database
pub fn timestamp_to_i64(time: DateTime<Utc>) -> i64 {
    time.timestamp_millis()
}

/// Convert stored Unix milliseconds back to a timestamp
pub fn i64_to_timestamp(millis: i64) -> Result<DateTime<Utc>> {
    DateTime::from_timestamp_millis(millis)
        .ok_or_else(|| MonitorError::Persistence(format!("timestamp out of range: {millis}")))
}

/// Site model - a monitored URL with its cadence and drift sensitivity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Site {
    pub id: Uuid,
    pub name: String,
    pub url: String,
    /// Seconds between checks, bounded to [300, 3600]
    pub check_frequency: u32,
    /// Change percentage above which content drift is flagged
    pub change_threshold: f64,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Site {
    pub const DEFAULT_CHECK_FREQUENCY: u32 = 300;
    pub const DEFAULT_CHANGE_THRESHOLD: f64 = 10.0;

    /// Create a new active site with default cadence and threshold
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            url: url.into(),
            check_frequency: Self::DEFAULT_CHECK_FREQUENCY,
            change_threshold: Self::DEFAULT_CHANGE_THRESHOLD,
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Check model - one immutable probe result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Check {
    pub id: Uuid,
    pub site_id: Uuid,
    /// 0 when no response was obtained
    pub status_code: u16,
    pub response_time_ms: u64,
    pub is_up: bool,
    pub html_hash: Option<String>,
    pub change_percent: Option<f64>,
    pub has_change: bool,
    pub timestamp: DateTime<Utc>,
    /// Set only on network/transport failure
    pub error_message: Option<String>,
}

impl Check {
    /// A check for which the endpoint answered
    pub fn responded(
        site_id: Uuid,
        status_code: u16,
        response_time_ms: u64,
        html_hash: String,
        change_percent: Option<f64>,
        has_change: bool,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            site_id,
            status_code,
            response_time_ms,
            is_up: status_code == 200,
            html_hash: Some(html_hash),
            change_percent,
            has_change,
            timestamp,
            error_message: None,
        }
    }

    /// A check that failed before any response was obtained
    pub fn transport_failure(
        site_id: Uuid,
        response_time_ms: u64,
        error_message: String,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            site_id,
            status_code: 0,
            response_time_ms,
            is_up: false,
            html_hash: None,
            change_percent: None,
            has_change: false,
            timestamp,
            error_message: Some(error_message),
        }
    }
}

/// Snapshot model - canonicalized content kept as the next diff baseline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub id: Uuid,
    pub site_id: Uuid,
    pub html_content: String,
    pub html_hash: String,
    pub captured_at: DateTime<Utc>,
}

impl Snapshot {
    pub fn new(site_id: Uuid, html_content: String, html_hash: String, captured_at: DateTime<Utc>) -> Self {
        Self { id: Uuid::new_v4(), site_id, html_content, html_hash, captured_at }
    }
}

/// Kind of anomaly an incident tracks
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IncidentType {
    Downtime,
    ContentChange,
    Timeout,
    Error,
}

impl IncidentType {
    pub const ALL: [IncidentType; 4] =
        [IncidentType::Downtime, IncidentType::ContentChange, IncidentType::Timeout, IncidentType::Error];

    pub fn as_str(&self) -> &'static str {
        match self {
            IncidentType::Downtime => "DOWNTIME",
            IncidentType::ContentChange => "CONTENT_CHANGE",
            IncidentType::Timeout => "TIMEOUT",
            IncidentType::Error => "ERROR",
        }
    }
}

impl fmt::Display for IncidentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for IncidentType {
    type Err = MonitorError;

    fn from_str(value: &str) -> Result<Self> {
        match value {
            "DOWNTIME" => Ok(IncidentType::Downtime),
            "CONTENT_CHANGE" => Ok(IncidentType::ContentChange),
            "TIMEOUT" => Ok(IncidentType::Timeout),
            "ERROR" => Ok(IncidentType::Error),
            other => Err(MonitorError::validation(format!("Unknown incident type: {other}"))),
        }
    }
}

/// Incident model - an open/close tracked anomaly period
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Incident {
    pub id: Uuid,
    pub site_id: Uuid,
    #[serde(rename = "type")]
    pub kind: IncidentType,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    pub is_resolved: bool,
    pub status_code: Option<u16>,
    pub change_percent: Option<f64>,
    pub description: String,
    pub alert_sent: bool,
    pub alert_sent_at: Option<DateTime<Utc>>,
    pub resolution_alert_sent: bool,
}

impl Incident {
    /// Open a new incident starting at `start_time`
    pub fn open(
        site_id: Uuid,
        kind: IncidentType,
        start_time: DateTime<Utc>,
        status_code: Option<u16>,
        change_percent: Option<f64>,
        description: String,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            site_id,
            kind,
            start_time,
            end_time: None,
            is_resolved: false,
            status_code,
            change_percent,
            description,
            alert_sent: false,
            alert_sent_at: None,
            resolution_alert_sent: false,
        }
    }

    /// Milliseconds between start and end (or `now` while still open)
    pub fn duration_millis(&self, now: DateTime<Utc>) -> i64 {
        (self.end_time.unwrap_or(now) - self.start_time).num_milliseconds()
    }

    /// Whole seconds between start and end (or `now` while still open)
    pub fn duration_seconds(&self, now: DateTime<Utc>) -> i64 {
        (self.duration_millis(now) as f64 / 1000.0).round() as i64
    }
}

/// Process-wide alert configuration
///
/// `Debug` is implemented by hand so credentials never end up in logs.
#[derive(Clone, PartialEq)]
pub struct AlertConfig {
    pub email_enabled: bool,
    pub email_to: Vec<String>,
    pub email_from: String,
    pub brevo_api_key: Option<String>,
    pub telegram_enabled: bool,
    pub telegram_bot_token: Option<String>,
    pub telegram_chat_id: Option<String>,
    pub alert_on_down: bool,
    pub alert_on_change: bool,
    pub alert_on_recovery: bool,
    pub updated_at: DateTime<Utc>,
}

impl Default for AlertConfig {
    fn default() -> Self {
        Self {
            email_enabled: false,
            email_to: Vec::new(),
            email_from: String::new(),
            brevo_api_key: None,
            telegram_enabled: false,
            telegram_bot_token: None,
            telegram_chat_id: None,
            alert_on_down: true,
            alert_on_change: true,
            alert_on_recovery: true,
            updated_at: Utc::now(),
        }
    }
}

impl AlertConfig {
    /// Whether opening an incident of this kind should notify.
    /// Timeout and error incidents follow the downtime toggle.
    pub fn alerts_on_open(&self, kind: IncidentType) -> bool {
        match kind {
            IncidentType::ContentChange => self.alert_on_change,
            IncidentType::Downtime | IncidentType::Timeout | IncidentType::Error => self.alert_on_down,
        }
    }

    /// Outward view with credentials reduced to a presence indicator
    pub fn masked(&self) -> MaskedAlertConfig {
        let mask = |secret: &Option<String>| secret.as_ref().map(|_| MASKED_SECRET.to_string());
        MaskedAlertConfig {
            email_enabled: self.email_enabled,
            email_to: self.email_to.clone(),
            email_from: self.email_from.clone(),
            brevo_api_key: mask(&self.brevo_api_key),
            telegram_enabled: self.telegram_enabled,
            telegram_bot_token: mask(&self.telegram_bot_token),
            telegram_chat_id: self.telegram_chat_id.clone(),
            alert_on_down: self.alert_on_down,
            alert_on_change: self.alert_on_change,
            alert_on_recovery: self.alert_on_recovery,
            updated_at: self.updated_at,
        }
    }
}

impl fmt::Debug for AlertConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AlertConfig")
            .field("email_enabled", &self.email_enabled)
            .field("email_to", &self.email_to)
            .field("email_from", &self.email_from)
            .field("brevo_api_key", &self.brevo_api_key.as_ref().map(|_| MASKED_SECRET))
            .field("telegram_enabled", &self.telegram_enabled)
            .field("telegram_bot_token", &self.telegram_bot_token.as_ref().map(|_| MASKED_SECRET))
            .field("telegram_chat_id", &self.telegram_chat_id)
            .field("alert_on_down", &self.alert_on_down)
            .field("alert_on_change", &self.alert_on_change)
            .field("alert_on_recovery", &self.alert_on_recovery)
            .finish()
    }
}

pub const MASKED_SECRET: &str = "***";

/// Alert configuration as surfaced to callers
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MaskedAlertConfig {
    pub email_enabled: bool,
    pub email_to: Vec<String>,
    pub email_from: String,
    pub brevo_api_key: Option<String>,
    pub telegram_enabled: bool,
    pub telegram_bot_token: Option<String>,
    pub telegram_chat_id: Option<String>,
    pub alert_on_down: bool,
    pub alert_on_change: bool,
    pub alert_on_recovery: bool,
    pub updated_at: DateTime<Utc>,
}

/// Partial update of the alert configuration; `None` leaves a field untouched
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlertConfigPatch {
    pub email_enabled: Option<bool>,
    pub email_to: Option<Vec<String>>,
    pub email_from: Option<String>,
    pub brevo_api_key: Option<String>,
    pub telegram_enabled: Option<bool>,
    pub telegram_bot_token: Option<String>,
    pub telegram_chat_id: Option<String>,
    pub alert_on_down: Option<bool>,
    pub alert_on_change: Option<bool>,
    pub alert_on_recovery: Option<bool>,
}

/// One page of a paginated history query
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub limit: u32,
    pub offset: u32,
    pub has_more: bool,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, total: u64, limit: u32, offset: u32) -> Self {
        Self { items, total, limit, offset, has_more: u64::from(offset) + u64::from(limit) < total }
    }
}

/// Filters for check history
#[derive(Debug, Clone)]
pub struct CheckQuery {
    pub site_id: Option<Uuid>,
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
    pub limit: u32,
    pub offset: u32,
}

impl Default for CheckQuery {
    fn default() -> Self {
        Self { site_id: None, start: None, end: None, limit: DEFAULT_PAGE_LIMIT, offset: 0 }
    }
}

/// Filters for incident history; the time range applies to `start_time`
#[derive(Debug, Clone)]
pub struct IncidentQuery {
    pub site_id: Option<Uuid>,
    pub kind: Option<IncidentType>,
    pub resolved: Option<bool>,
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
    pub limit: u32,
    pub offset: u32,
}

impl Default for IncidentQuery {
    fn default() -> Self {
        Self {
            site_id: None,
            kind: None,
            resolved: None,
            start: None,
            end: None,
            limit: DEFAULT_PAGE_LIMIT,
            offset: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_exact_200_counts_as_up() {
        let site = Uuid::new_v4();
        let now = Utc::now();
        let ok = Check::responded(site, 200, 10, "h".into(), None, false, now);
        let created = Check::responded(site, 201, 10, "h".into(), None, false, now);
        let redirect = Check::responded(site, 301, 10, "h".into(), None, false, now);

        assert!(ok.is_up);
        assert!(!created.is_up);
        assert!(!redirect.is_up);
    }

    #[test]
    fn test_transport_failure_check_shape() {
        let check = Check::transport_failure(Uuid::new_v4(), 30_000, "timed out".into(), Utc::now());
        assert_eq!(check.status_code, 0);
        assert!(!check.is_up);
        assert!(check.html_hash.is_none());
        assert!(check.change_percent.is_none());
        assert!(!check.has_change);
        assert_eq!(check.error_message.as_deref(), Some("timed out"));
    }

    #[test]
    fn test_incident_type_round_trips_through_str() {
        for kind in IncidentType::ALL {
            assert_eq!(kind.as_str().parse::<IncidentType>().unwrap(), kind);
        }
        assert!("OUTAGE".parse::<IncidentType>().is_err());
    }

    #[test]
    fn test_masked_config_hides_credentials() {
        let config = AlertConfig {
            brevo_api_key: Some("xkeysib-secret".into()),
            telegram_bot_token: None,
            ..AlertConfig::default()
        };
        let masked = config.masked();
        assert_eq!(masked.brevo_api_key.as_deref(), Some(MASKED_SECRET));
        assert_eq!(masked.telegram_bot_token, None);

        let json = serde_json::to_string(&masked).unwrap();
        assert!(!json.contains("xkeysib-secret"));
        assert!(!format!("{config:?}").contains("xkeysib-secret"));
    }

    #[test]
    fn test_timeout_and_error_follow_downtime_toggle() {
        let config = AlertConfig { alert_on_down: false, ..AlertConfig::default() };
        assert!(!config.alerts_on_open(IncidentType::Downtime));
        assert!(!config.alerts_on_open(IncidentType::Timeout));
        assert!(!config.alerts_on_open(IncidentType::Error));
        assert!(config.alerts_on_open(IncidentType::ContentChange));
    }

    #[test]
    fn test_page_has_more() {
        let page: Page<u8> = Page::new(vec![1, 2], 5, 2, 2);
        assert!(page.has_more);
        let last: Page<u8> = Page::new(vec![5], 5, 2, 4);
        assert!(!last.has_more);
    }

    #[test]
    fn test_incident_duration_uses_now_while_open() {
        let start = Utc::now() - chrono::Duration::seconds(90);
        let incident = Incident::open(Uuid::new_v4(), IncidentType::Downtime, start, Some(503), None, "HTTP 503".into());
        assert_eq!(incident.duration_seconds(start + chrono::Duration::seconds(90)), 90);
    }
}
