use std::sync::Arc;

use chrono::Utc;

use super::channels::{AlertChannel, ChannelError};
use super::render;
use crate::database::Store;
use crate::database::models::{AlertConfigPatch, MASKED_SECRET, MaskedAlertConfig};
use crate::error::{MonitorError, Result};
use crate::validation::validate_email;

/// Read and update the process-wide alert configuration
pub struct AlertSettings {
    store: Arc<dyn Store>,
    email: Arc<dyn AlertChannel>,
    sender_name: String,
}

/// Treat an echoed mask or an empty string as "unchanged" / "cleared"
fn merge_secret(current: &mut Option<String>, incoming: Option<String>) {
    match incoming {
        None => {}
        Some(value) if value == MASKED_SECRET => {}
        Some(value) if value.trim().is_empty() => *current = None,
        Some(value) => *current = Some(value),
    }
}

impl AlertSettings {
    pub fn new(store: Arc<dyn Store>, email: Arc<dyn AlertChannel>, sender_name: impl Into<String>) -> Self {
        Self { store, email, sender_name: sender_name.into() }
    }

    /// Current configuration with credentials masked, created on first read
    pub async fn get(&self) -> Result<MaskedAlertConfig> {
        Ok(self.store.get_or_create_alert_config().await?.masked())
    }

    /// Apply a partial update
    pub async fn update(&self, patch: AlertConfigPatch) -> Result<MaskedAlertConfig> {
        let mut config = self.store.get_or_create_alert_config().await?;

        if let Some(recipients) = patch.email_to {
            let recipients: Vec<String> =
                recipients.into_iter().map(|r| r.trim().to_string()).filter(|r| !r.is_empty()).collect();
            for recipient in &recipients {
                validate_email(recipient).to_result()?;
            }
            config.email_to = recipients;
        }
        if let Some(from) = patch.email_from {
            let from = from.trim().to_string();
            if !from.is_empty() {
                validate_email(&from).to_result()?;
            }
            config.email_from = from;
        }
        if let Some(enabled) = patch.email_enabled {
            config.email_enabled = enabled;
        }
        if let Some(enabled) = patch.telegram_enabled {
            config.telegram_enabled = enabled;
        }
        if let Some(chat_id) = patch.telegram_chat_id {
            let chat_id = chat_id.trim().to_string();
            config.telegram_chat_id = (!chat_id.is_empty()).then_some(chat_id);
        }
        merge_secret(&mut config.brevo_api_key, patch.brevo_api_key);
        merge_secret(&mut config.telegram_bot_token, patch.telegram_bot_token);
        if let Some(on) = patch.alert_on_down {
            config.alert_on_down = on;
        }
        if let Some(on) = patch.alert_on_change {
            config.alert_on_change = on;
        }
        if let Some(on) = patch.alert_on_recovery {
            config.alert_on_recovery = on;
        }
        config.updated_at = Utc::now();

        self.store.save_alert_config(&config).await?;
        tracing::info!("Alert configuration updated");
        Ok(config.masked())
    }

    /// Send a test email with the stored configuration
    pub async fn send_test_email(&self) -> Result<()> {
        let config = self.store.get_or_create_alert_config().await?;
        if !config.email_enabled {
            return Err(MonitorError::configuration("Email alerts are disabled"));
        }
        if config.brevo_api_key.as_deref().is_none_or(str::is_empty) {
            return Err(MonitorError::configuration("Brevo API key is not set"));
        }
        if config.email_to.is_empty() {
            return Err(MonitorError::configuration("No email recipients configured"));
        }

        let message = render::test_email(&config, &self.sender_name, Utc::now());
        self.email.send(&config, &message).await.map_err(|e| match e {
            ChannelError::Configuration(reason) => MonitorError::Configuration(reason),
            other => MonitorError::Transport(other.to_string()),
        })?;

        tracing::info!("Test email sent to {} recipient(s)", config.email_to.len());
        Ok(())
    }
}
