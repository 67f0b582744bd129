use std::time::Duration;

use reqwest::redirect;

use crate::error::{MonitorError, Result};

/// What the remote endpoint answered
#[derive(Debug, Clone, PartialEq)]
pub struct Probe {
    pub status_code: u16,
    pub body: String,
}

/// Checker trait - fetches a target and reports status and body.
///
/// Any HTTP response, including 4xx and 5xx, is a successful probe. Only
/// failures to obtain a response (DNS, connect, TLS, timeout, redirect limit)
/// return `MonitorError::Transport`.
#[async_trait::async_trait]
pub trait Checker: Send + Sync {
    async fn fetch(&self, target: &str) -> Result<Probe>;
}

/// Settings for the HTTP checker
#[derive(Debug, Clone)]
pub struct ProbeSettings {
    pub timeout_seconds: u64,
    pub max_redirects: usize,
    pub user_agent: String,
}

impl Default for ProbeSettings {
    fn default() -> Self {
        Self {
            timeout_seconds: 30,
            max_redirects: 5,
            user_agent: concat!("pagewatch/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

/// HTTP/HTTPS checker
pub struct HttpChecker {
    client: reqwest::Client,
}

impl HttpChecker {
    pub fn new(settings: &ProbeSettings) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.timeout_seconds))
            .redirect(redirect::Policy::limited(settings.max_redirects))
            .user_agent(settings.user_agent.clone())
            .build()
            .map_err(|e| MonitorError::configuration(format!("failed to build HTTP client: {e}")))?;

        Ok(Self { client })
    }
}

fn describe(error: &reqwest::Error) -> String {
    if error.is_timeout() {
        "Request timed out".to_string()
    } else if error.is_redirect() {
        format!("Too many redirects: {error}")
    } else if error.is_connect() {
        format!("Connection failed: {error}")
    } else {
        format!("HTTP request failed: {error}")
    }
}

#[async_trait::async_trait]
impl Checker for HttpChecker {
    async fn fetch(&self, target: &str) -> Result<Probe> {
        let response = self
            .client
            .get(target)
            .send()
            .await
            .map_err(|e| MonitorError::Transport(describe(&e)))?;

        let status_code = response.status().as_u16();

        // Error pages still carry a body worth fingerprinting
        let bytes = response.bytes().await.map_err(|e| MonitorError::Transport(describe(&e)))?;
        let body = String::from_utf8_lossy(&bytes).into_owned();

        Ok(Probe { status_code, body })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings() {
        let settings = ProbeSettings::default();
        assert_eq!(settings.timeout_seconds, 30);
        assert_eq!(settings.max_redirects, 5);
        assert!(settings.user_agent.starts_with("pagewatch/"));
        assert!(HttpChecker::new(&settings).is_ok());
    }

    #[tokio::test]
    async fn test_unreachable_target_is_transport_error() {
        let checker = HttpChecker::new(&ProbeSettings { timeout_seconds: 2, ..ProbeSettings::default() }).unwrap();

        // Port 9 (discard) on loopback is closed in test environments
        let result = checker.fetch("http://127.0.0.1:9/").await;

        assert!(matches!(result, Err(MonitorError::Transport(_))));
    }

    #[tokio::test]
    async fn test_invalid_url_is_transport_error() {
        let checker = HttpChecker::new(&ProbeSettings::default()).unwrap();
        let result = checker.fetch("not a url").await;
        assert!(matches!(result, Err(MonitorError::Transport(_))));
    }
}
