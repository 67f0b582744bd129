use std::sync::Arc;

use chrono::Utc;
use futures::future::join_all;

use super::channels::AlertChannel;
use super::render::{self, AlertMessage};
use crate::database::Store;
use crate::database::models::{AlertConfig, Incident, Site};
use crate::error::Result;

/// What happened to a notification request
#[derive(Debug, Clone, PartialEq)]
pub enum Dispatch {
    /// Nothing was sent; the reason is for logs
    Skipped(&'static str),

    /// Channels were attempted; named by outcome
    Attempted { delivered: Vec<&'static str>, failed: Vec<&'static str> },
}

impl Dispatch {
    pub fn delivered_any(&self) -> bool {
        matches!(self, Dispatch::Attempted { delivered, .. } if !delivered.is_empty())
    }
}

/// Renders incident notifications and fans them out over enabled channels.
///
/// Delivery is recorded on the incident so a repeated transition never
/// notifies twice. Channel failures are logged and never roll back incident
/// state.
pub struct AlertDispatcher {
    store: Arc<dyn Store>,
    channels: Vec<Arc<dyn AlertChannel>>,
    dashboard_url: String,
    sender_name: String,
}

impl AlertDispatcher {
    pub fn new(
        store: Arc<dyn Store>,
        channels: Vec<Arc<dyn AlertChannel>>,
        dashboard_url: impl Into<String>,
        sender_name: impl Into<String>,
    ) -> Self {
        Self { store, channels, dashboard_url: dashboard_url.into(), sender_name: sender_name.into() }
    }

    /// Notify that `incident` was just opened for `site`
    pub async fn notify_opened(&self, site: &Site, incident: &Incident) -> Result<Dispatch> {
        if incident.alert_sent {
            return Ok(Dispatch::Skipped("alert already sent"));
        }
        let Some(config) = self.store.find_alert_config().await? else {
            tracing::debug!("No alert configuration; skipping alert for incident {}", incident.id);
            return Ok(Dispatch::Skipped("alert configuration missing"));
        };
        if !config.alerts_on_open(incident.kind) {
            tracing::info!("Alerts for {} incidents are switched off", incident.kind);
            return Ok(Dispatch::Skipped("alert type disabled"));
        }

        let message = render::opened(site, incident, &self.dashboard_url, &self.sender_name);
        let dispatch = self.fan_out(&config, &message, incident).await;

        if dispatch.delivered_any() {
            if let Err(e) = self.store.mark_alert_sent(incident.id, Utc::now()).await {
                tracing::error!("Failed to record alert delivery for incident {}: {}", incident.id, e);
            }
        }
        Ok(dispatch)
    }

    /// Notify that `incident` recovered; `incident` must carry its end time
    pub async fn notify_resolved(&self, site: &Site, incident: &Incident) -> Result<Dispatch> {
        if incident.resolution_alert_sent {
            return Ok(Dispatch::Skipped("recovery alert already sent"));
        }
        let Some(config) = self.store.find_alert_config().await? else {
            return Ok(Dispatch::Skipped("alert configuration missing"));
        };
        if !config.alert_on_recovery {
            tracing::info!("Recovery alerts are switched off");
            return Ok(Dispatch::Skipped("recovery alerts disabled"));
        }

        let message = render::resolved(site, incident, &self.sender_name);
        let dispatch = self.fan_out(&config, &message, incident).await;

        if dispatch.delivered_any() {
            if let Err(e) = self.store.mark_resolution_alert_sent(incident.id).await {
                tracing::error!("Failed to record recovery delivery for incident {}: {}", incident.id, e);
            }
        }
        Ok(dispatch)
    }

    /// Send to every enabled channel concurrently and wait for all of them
    async fn fan_out(&self, config: &AlertConfig, message: &AlertMessage, incident: &Incident) -> Dispatch {
        let enabled: Vec<&Arc<dyn AlertChannel>> =
            self.channels.iter().filter(|channel| channel.is_enabled(config)).collect();
        if enabled.is_empty() {
            return Dispatch::Skipped("no channel enabled");
        }

        let results = join_all(enabled.iter().map(|channel| channel.send(config, message))).await;

        let mut delivered = Vec::new();
        let mut failed = Vec::new();
        for (channel, result) in enabled.iter().zip(results) {
            match result {
                Ok(()) => {
                    tracing::info!("Sent {} alert for incident {}", channel.name(), incident.id);
                    delivered.push(channel.name());
                }
                Err(e) => {
                    tracing::warn!("Failed to send {} alert for incident {}: {}", channel.name(), incident.id, e);
                    failed.push(channel.name());
                }
            }
        }
        Dispatch::Attempted { delivered, failed }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::models::IncidentType;
    use crate::database::{AlertConfigStore, IncidentStore, SiteStore};
    use crate::testing::{RecordingChannel, create_test_store};

    async fn setup(
        channels: Vec<Arc<dyn AlertChannel>>,
    ) -> Result<(Arc<crate::database::DatabaseImpl>, AlertDispatcher, Site, Incident, tempfile::TempDir)> {
        let (store, dir) = create_test_store().await?;
        let site = Site::new("Shop", "https://shop.example.com");
        store.insert_site(&site).await?;
        let incident = Incident::open(site.id, IncidentType::Downtime, Utc::now(), Some(500), None, "HTTP 500".into());
        store.insert_incident(&incident).await?;
        let dispatcher = AlertDispatcher::new(store.clone(), channels, "http://localhost:3000/dashboard", "Pagewatch");
        Ok((store, dispatcher, site, incident, dir))
    }

    #[tokio::test]
    async fn test_missing_config_is_noop() -> Result<()> {
        let channel = RecordingChannel::new("email");
        let (store, dispatcher, site, incident, _dir) = setup(vec![channel.clone()]).await?;

        let dispatch = dispatcher.notify_opened(&site, &incident).await?;

        assert_eq!(dispatch, Dispatch::Skipped("alert configuration missing"));
        assert_eq!(channel.sent_count(), 0);
        // The dispatcher must not create the singleton on its own
        assert!(store.find_alert_config().await?.is_none());
        Ok(())
    }

    #[tokio::test]
    async fn test_one_failing_channel_does_not_block_the_other() -> Result<()> {
        let email = RecordingChannel::failing("email");
        let chat = RecordingChannel::new("telegram");
        let (store, dispatcher, site, incident, _dir) = setup(vec![email.clone(), chat.clone()]).await?;
        store.save_alert_config(&AlertConfig::default()).await?;

        let dispatch = dispatcher.notify_opened(&site, &incident).await?;

        assert_eq!(dispatch, Dispatch::Attempted { delivered: vec!["telegram"], failed: vec!["email"] });
        assert_eq!(chat.sent_count(), 1);
        let stored = store.get_incident(incident.id).await?.expect("incident exists");
        assert!(stored.alert_sent);
        assert!(stored.alert_sent_at.is_some());
        Ok(())
    }

    #[tokio::test]
    async fn test_all_channels_failing_leaves_flag_unset() -> Result<()> {
        let email = RecordingChannel::failing("email");
        let (store, dispatcher, site, incident, _dir) = setup(vec![email.clone()]).await?;
        store.save_alert_config(&AlertConfig::default()).await?;

        dispatcher.notify_opened(&site, &incident).await?;

        let stored = store.get_incident(incident.id).await?.expect("incident exists");
        assert!(!stored.alert_sent);
        Ok(())
    }

    #[tokio::test]
    async fn test_disabled_channels_are_not_attempted() -> Result<()> {
        let chat = RecordingChannel::disabled("telegram");
        let (store, dispatcher, site, incident, _dir) = setup(vec![chat.clone()]).await?;
        store.save_alert_config(&AlertConfig::default()).await?;

        let dispatch = dispatcher.notify_opened(&site, &incident).await?;

        assert_eq!(dispatch, Dispatch::Skipped("no channel enabled"));
        assert_eq!(chat.sent_count(), 0);
        Ok(())
    }

    #[tokio::test]
    async fn test_recovery_respects_toggle_and_marks_flag() -> Result<()> {
        let chat = RecordingChannel::new("telegram");
        let (store, dispatcher, site, incident, _dir) = setup(vec![chat.clone()]).await?;
        store.save_alert_config(&AlertConfig { alert_on_recovery: false, ..AlertConfig::default() }).await?;

        let resolved = store.resolve_incident(incident.id, Utc::now()).await?;
        assert_eq!(dispatcher.notify_resolved(&site, &resolved).await?, Dispatch::Skipped("recovery alerts disabled"));

        store.save_alert_config(&AlertConfig::default()).await?;
        assert!(dispatcher.notify_resolved(&site, &resolved).await?.delivered_any());
        assert!(chat.last_subject().is_some_and(|s| s.contains("is back up")));

        let stored = store.get_incident(incident.id).await?.expect("incident exists");
        assert!(stored.resolution_alert_sent);

        let again = dispatcher.notify_resolved(&site, &stored).await?;
        assert_eq!(again, Dispatch::Skipped("recovery alert already sent"));
        assert_eq!(chat.sent_count(), 1);
        Ok(())
    }
}
