//! Message rendering for alert channels.

use chrono::{DateTime, Utc};

use crate::database::models::{AlertConfig, Incident, IncidentType, Site};

/// Fixed UTC rendering used in every message
const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S UTC";

/// A rendered alert, ready for any channel
#[derive(Debug, Clone, PartialEq)]
pub struct AlertMessage {
    /// Email subject line
    pub subject: String,
    /// Full HTML email document
    pub email_html: String,
    /// Telegram text using its HTML subset
    pub chat_text: String,
    /// Target of the "View Dashboard" link, when the message should carry one
    pub dashboard_url: Option<String>,
}

pub fn format_time(time: DateTime<Utc>) -> String {
    time.format(TIME_FORMAT).to_string()
}

/// Render a duration as `Xh Ym Zs`, omitting zero units but never empty
pub fn format_duration(seconds: i64) -> String {
    let seconds = seconds.max(0);
    let hours = seconds / 3600;
    let minutes = (seconds % 3600) / 60;
    let secs = seconds % 60;

    let mut parts = Vec::new();
    if hours > 0 {
        parts.push(format!("{hours}h"));
    }
    if minutes > 0 {
        parts.push(format!("{minutes}m"));
    }
    if secs > 0 || parts.is_empty() {
        parts.push(format!("{secs}s"));
    }
    parts.join(" ")
}

/// Escape text for HTML bodies and Telegram's HTML parse mode
pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// Email subject for a newly opened incident
pub fn subject(kind: IncidentType, site_name: &str) -> String {
    match kind {
        IncidentType::Downtime => format!("🔴 {site_name} is DOWN"),
        IncidentType::ContentChange => format!("⚠️ {site_name} content changed"),
        IncidentType::Timeout => format!("⏱️ {site_name} timeout"),
        IncidentType::Error => format!("🟠 {site_name} error detected"),
    }
}

fn chat_title(kind: IncidentType) -> &'static str {
    match kind {
        IncidentType::Downtime => "🔴 DOWNTIME ALERT",
        IncidentType::ContentChange => "⚠️ CONTENT CHANGE ALERT",
        IncidentType::Timeout => "⏱️ TIMEOUT ALERT",
        IncidentType::Error => "🟠 ERROR ALERT",
    }
}

fn header_color(kind: IncidentType) -> &'static str {
    match kind {
        IncidentType::Downtime => "#EF4444",
        IncidentType::ContentChange => "#F59E0B",
        IncidentType::Timeout => "#8B5CF6",
        IncidentType::Error => "#F97316",
    }
}

/// Type-specific `(label, value)` rows
fn detail_rows(incident: &Incident) -> Vec<(&'static str, String)> {
    let mut rows = Vec::new();
    match incident.kind {
        IncidentType::Downtime | IncidentType::Error | IncidentType::Timeout => {
            if let Some(code) = incident.status_code.filter(|code| *code != 0) {
                rows.push(("Status Code", code.to_string()));
            }
        }
        IncidentType::ContentChange => {
            if let Some(percent) = incident.change_percent {
                rows.push(("Change", format!("{percent}%")));
            }
        }
    }
    if !incident.description.is_empty() {
        rows.push(("Details", incident.description.clone()));
    }
    rows
}

fn email_document(title: &str, color: &str, rows: &[(&str, String)], footer: &str, dashboard_url: Option<&str>) -> String {
    let mut details = String::new();
    for (label, value) in rows {
        details.push_str(&format!(
            "<div style=\"margin:12px 0;padding:10px;background:#fff;border-left:4px solid #3B82F6\"><strong>{}:</strong> {}</div>",
            label, value
        ));
    }
    let button = dashboard_url
        .map(|url| {
            format!(
                "<a href=\"{}\" style=\"display:inline-block;padding:12px 24px;background:#3B82F6;color:#fff;text-decoration:none;border-radius:6px\">View Dashboard</a>",
                escape_html(url)
            )
        })
        .unwrap_or_default();

    format!(
        "<!DOCTYPE html><html><body style=\"font-family:Arial,sans-serif;color:#333\">\
         <div style=\"max-width:600px;margin:0 auto\">\
         <div style=\"background:{color};color:#fff;padding:20px;border-radius:8px 8px 0 0\"><h2 style=\"margin:0\">{}</h2></div>\
         <div style=\"padding:30px;background:#F9FAFB\">{details}{button}</div>\
         <div style=\"text-align:center;padding:20px;color:#6B7280;font-size:12px\">{}</div>\
         </div></body></html>",
        escape_html(title),
        escape_html(footer)
    )
}

/// Render the notification for a newly opened incident
pub fn opened(site: &Site, incident: &Incident, dashboard_url: &str, sender_name: &str) -> AlertMessage {
    let subject = subject(incident.kind, &site.name);
    let name = escape_html(&site.name);
    let url = escape_html(&site.url);
    let time = format_time(incident.start_time);
    let extra = detail_rows(incident);

    let mut rows = vec![
        ("Website", name.clone()),
        ("URL", format!("<a href=\"{url}\">{url}</a>")),
        ("Time", time.clone()),
    ];
    rows.extend(extra.iter().map(|(label, value)| (*label, escape_html(value))));

    let mut chat = format!("<b>{}</b>\n\n<b>Site:</b> {name}\n<b>URL:</b> {url}\n<b>Time:</b> {time}\n", chat_title(incident.kind));
    for (label, value) in &extra {
        chat.push_str(&format!("<b>{label}:</b> {}\n", escape_html(value)));
    }

    AlertMessage {
        email_html: email_document(
            &subject,
            header_color(incident.kind),
            &rows,
            &format!("{sender_name} - Website Monitoring"),
            Some(dashboard_url),
        ),
        subject,
        chat_text: chat.trim_end().to_string(),
        dashboard_url: Some(dashboard_url.to_string()),
    }
}

/// Render the recovery notification for a resolved incident
pub fn resolved(site: &Site, incident: &Incident, sender_name: &str) -> AlertMessage {
    let name = escape_html(&site.name);
    let url = escape_html(&site.url);
    let end = incident.end_time.unwrap_or(incident.start_time);
    let duration = format_duration(incident.duration_seconds(end));
    let resolved_at = format_time(end);
    let title = format!("✅ RECOVERY: {} is back up", site.name);

    let rows = vec![
        ("Website", name.clone()),
        ("URL", format!("<a href=\"{url}\">{url}</a>")),
        ("Incident", incident.kind.to_string()),
        ("Duration", duration.clone()),
        ("Resolved at", resolved_at.clone()),
    ];

    AlertMessage {
        subject: format!("✅ {} is back up", site.name),
        email_html: email_document(&title, "#10B981", &rows, &format!("{sender_name} - Website Monitoring"), None),
        chat_text: format!(
            "✅ <b>RECOVERY: {name} is back up</b>\n\n<b>Site:</b> {name}\n<b>URL:</b> {url}\n<b>Duration:</b> {duration}\n<b>Resolved at:</b> {resolved_at}"
        ),
        dashboard_url: None,
    }
}

/// Render the test email describing the current configuration
pub fn test_email(config: &AlertConfig, sender_name: &str, now: DateTime<Utc>) -> AlertMessage {
    let enabled: Vec<&str> = [
        (config.alert_on_down, "downtime"),
        (config.alert_on_change, "content changes"),
        (config.alert_on_recovery, "recoveries"),
    ]
    .into_iter()
    .filter_map(|(on, label)| on.then_some(label))
    .collect();
    let enabled = if enabled.is_empty() { "none".to_string() } else { enabled.join(", ") };

    let rows = vec![
        ("Recipients", escape_html(&config.email_to.join(", "))),
        ("Alerts enabled for", enabled.clone()),
        ("Sent at", format_time(now)),
    ];
    let subject = format!("✅ {sender_name} test email");

    AlertMessage {
        email_html: email_document(&subject, "#10B981", &rows, &format!("{sender_name} - Website Monitoring"), None),
        chat_text: format!("✅ <b>{}</b>\n\nAlerts enabled for: {enabled}", escape_html(&subject)),
        subject,
        dashboard_url: None,
    }
}
