use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use thiserror::Error;

use super::render::AlertMessage;
use crate::database::models::AlertConfig;

#[derive(Error, Debug)]
pub enum ChannelError {
    #[error("Channel is not configured: {0}")]
    Configuration(String),
    #[error("Network error: {0}")]
    Request(#[from] reqwest::Error),
    #[error("Provider rejected the message with status {status}: {body}")]
    Rejected { status: u16, body: String },
}

/// A notification channel (email, chat bot, ...)
#[async_trait]
pub trait AlertChannel: Send + Sync {
    /// Short name used in logs
    fn name(&self) -> &'static str;

    /// Whether the operator switched this channel on
    fn is_enabled(&self, config: &AlertConfig) -> bool;

    async fn send(&self, config: &AlertConfig, message: &AlertMessage) -> Result<(), ChannelError>;
}

/// Outbound HTTP settings shared by the built-in channels
#[derive(Debug, Clone)]
pub struct ChannelSettings {
    pub timeout_seconds: u64,
    pub sender_name: String,
    pub brevo_endpoint: String,
    pub telegram_api: String,
}

impl Default for ChannelSettings {
    fn default() -> Self {
        Self {
            timeout_seconds: 10,
            sender_name: "Pagewatch".to_string(),
            brevo_endpoint: "https://api.brevo.com/v3/smtp/email".to_string(),
            telegram_api: "https://api.telegram.org".to_string(),
        }
    }
}

fn build_client(settings: &ChannelSettings) -> Result<Client, ChannelError> {
    Ok(Client::builder().timeout(Duration::from_secs(settings.timeout_seconds)).build()?)
}

async fn ensure_success(response: reqwest::Response) -> Result<(), ChannelError> {
    let status = response.status();
    if status.is_success() {
        return Ok(());
    }
    let body = response.text().await.unwrap_or_else(|_| "Failed to read error body".to_string());
    Err(ChannelError::Rejected { status: status.as_u16(), body })
}

/// Email through the Brevo transactional API
pub struct EmailChannel {
    client: Client,
    endpoint: String,
    sender_name: String,
}

#[derive(Serialize)]
struct Contact<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<&'a str>,
    email: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct BrevoEmail<'a> {
    sender: Contact<'a>,
    to: Vec<Contact<'a>>,
    subject: &'a str,
    html_content: &'a str,
}

impl EmailChannel {
    pub fn new(settings: &ChannelSettings) -> Result<Self, ChannelError> {
        Ok(Self {
            client: build_client(settings)?,
            endpoint: settings.brevo_endpoint.clone(),
            sender_name: settings.sender_name.clone(),
        })
    }
}

#[async_trait]
impl AlertChannel for EmailChannel {
    fn name(&self) -> &'static str {
        "email"
    }

    fn is_enabled(&self, config: &AlertConfig) -> bool {
        config.email_enabled
    }

    async fn send(&self, config: &AlertConfig, message: &AlertMessage) -> Result<(), ChannelError> {
        let api_key = config
            .brevo_api_key
            .as_deref()
            .filter(|key| !key.is_empty())
            .ok_or_else(|| ChannelError::Configuration("Brevo API key is not set".into()))?;
        if config.email_to.is_empty() {
            return Err(ChannelError::Configuration("No email recipients configured".into()));
        }
        if config.email_from.is_empty() {
            return Err(ChannelError::Configuration("Sender address is not set".into()));
        }

        let payload = BrevoEmail {
            sender: Contact { name: Some(self.sender_name.as_str()), email: &config.email_from },
            to: config.email_to.iter().map(|email| Contact { name: None, email }).collect(),
            subject: &message.subject,
            html_content: &message.email_html,
        };

        let response = self
            .client
            .post(&self.endpoint)
            .header("api-key", api_key)
            .header("accept", "application/json")
            .json(&payload)
            .send()
            .await?;
        ensure_success(response).await
    }
}

/// Chat messages through the Telegram Bot API
pub struct TelegramChannel {
    client: Client,
    api_base: String,
}

#[derive(Serialize)]
struct InlineButton<'a> {
    text: &'a str,
    url: &'a str,
}

#[derive(Serialize)]
struct InlineKeyboard<'a> {
    inline_keyboard: Vec<Vec<InlineButton<'a>>>,
}

#[derive(Serialize)]
struct TelegramMessage<'a> {
    chat_id: &'a str,
    text: &'a str,
    parse_mode: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    reply_markup: Option<InlineKeyboard<'a>>,
}

impl TelegramChannel {
    pub fn new(settings: &ChannelSettings) -> Result<Self, ChannelError> {
        Ok(Self { client: build_client(settings)?, api_base: settings.telegram_api.trim_end_matches('/').to_string() })
    }
}

#[async_trait]
impl AlertChannel for TelegramChannel {
    fn name(&self) -> &'static str {
        "telegram"
    }

    fn is_enabled(&self, config: &AlertConfig) -> bool {
        config.telegram_enabled
    }

    async fn send(&self, config: &AlertConfig, message: &AlertMessage) -> Result<(), ChannelError> {
        let (Some(bot_token), Some(chat_id)) = (
            config.telegram_bot_token.as_deref().filter(|t| !t.is_empty()),
            config.telegram_chat_id.as_deref().filter(|c| !c.is_empty()),
        ) else {
            return Err(ChannelError::Configuration("Telegram bot token or chat id is not set".into()));
        };

        let api_url = format!("{}/bot{bot_token}/sendMessage", self.api_base);
        let payload = TelegramMessage {
            chat_id,
            text: &message.chat_text,
            parse_mode: "HTML",
            reply_markup: message.dashboard_url.as_deref().map(|url| InlineKeyboard {
                inline_keyboard: vec![vec![InlineButton { text: "📊 View Dashboard", url }]],
            }),
        };

        let response = self.client.post(&api_url).json(&payload).send().await?;
        ensure_success(response).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn message() -> AlertMessage {
        AlertMessage {
            subject: "🔴 Shop is DOWN".into(),
            email_html: "<p>down</p>".into(),
            chat_text: "<b>down</b>".into(),
            dashboard_url: Some("http://localhost:3000/dashboard".into()),
        }
    }

    #[tokio::test]
    async fn test_email_requires_api_key_and_recipients() {
        let channel = EmailChannel::new(&ChannelSettings::default()).unwrap();
        let config = AlertConfig { email_enabled: true, ..AlertConfig::default() };
        assert!(channel.is_enabled(&config));
        assert!(matches!(channel.send(&config, &message()).await, Err(ChannelError::Configuration(_))));

        let config = AlertConfig { brevo_api_key: Some("key".into()), ..config };
        assert!(matches!(channel.send(&config, &message()).await, Err(ChannelError::Configuration(_))));
    }

    #[tokio::test]
    async fn test_telegram_requires_token_and_chat() {
        let channel = TelegramChannel::new(&ChannelSettings::default()).unwrap();
        let config = AlertConfig { telegram_enabled: true, telegram_bot_token: Some("t".into()), ..AlertConfig::default() };
        assert!(matches!(channel.send(&config, &message()).await, Err(ChannelError::Configuration(_))));
    }

    #[tokio::test]
    async fn test_unreachable_provider_is_request_error() {
        let settings = ChannelSettings {
            timeout_seconds: 2,
            telegram_api: "http://127.0.0.1:9".into(),
            ..ChannelSettings::default()
        };
        let channel = TelegramChannel::new(&settings).unwrap();
        let config = AlertConfig {
            telegram_enabled: true,
            telegram_bot_token: Some("t".into()),
            telegram_chat_id: Some("42".into()),
            ..AlertConfig::default()
        };
        assert!(matches!(channel.send(&config, &message()).await, Err(ChannelError::Request(_))));
    }

    #[test]
    fn test_telegram_payload_shape() {
        let msg = message();
        let payload = TelegramMessage {
            chat_id: "42",
            text: &msg.chat_text,
            parse_mode: "HTML",
            reply_markup: Some(InlineKeyboard {
                inline_keyboard: vec![vec![InlineButton { text: "📊 View Dashboard", url: "http://x/dashboard" }]],
            }),
        };
        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["parse_mode"], "HTML");
        assert_eq!(json["reply_markup"]["inline_keyboard"][0][0]["url"], "http://x/dashboard");
    }

    #[test]
    fn test_brevo_payload_shape() {
        let payload = BrevoEmail {
            sender: Contact { name: Some("Pagewatch"), email: "alerts@example.com" },
            to: vec![Contact { name: None, email: "ops@example.com" }],
            subject: "s",
            html_content: "<p>x</p>",
        };
        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["htmlContent"], "<p>x</p>");
        assert_eq!(json["to"][0]["email"], "ops@example.com");
        assert!(json["to"][0].get("name").is_none());
    }
}
