use std::{env, fmt, fs, path};

use serde::{Deserialize, Serialize};

use crate::alerts::ChannelSettings;
use crate::monitoring::ProbeSettings;

/// Environment variable holding the trigger shared secret
pub const TRIGGER_SECRET_VAR: &str = "CRON_SECRET";

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("failed to read config file {0}")]
    ReadFailed(String),
    #[error("failed to write config file {0}")]
    WriteFailed(String),
    #[error("failed to parse config: {0}")]
    ParseFailed(String),
    #[error("no config directory available (set XDG_CONFIG_HOME or HOME)")]
    ConfigPathUnavailable,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub database: DatabaseConfig,
    pub scheduler: SchedulerConfig,
    pub probe: ProbeConfig,
    pub alerts: AlertsConfig,
    pub server: ServerConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub path: String,
    pub max_connections: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Seconds between due-check passes in `run` mode
    pub tick_seconds: u64,
    pub max_concurrent_checks: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProbeConfig {
    pub timeout_seconds: u64,
    pub max_redirects: usize,
    pub user_agent: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AlertsConfig {
    pub dashboard_url: String,
    pub sender_name: String,
    pub brevo_endpoint: String,
    pub telegram_api: String,
    pub timeout_seconds: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind: String,
    pub port: u16,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self { path: "pagewatch.db".into(), max_connections: 8 }
    }
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self { tick_seconds: 60, max_concurrent_checks: 8 }
    }
}

impl Default for ProbeConfig {
    fn default() -> Self {
        let defaults = ProbeSettings::default();
        Self {
            timeout_seconds: defaults.timeout_seconds,
            max_redirects: defaults.max_redirects,
            user_agent: defaults.user_agent,
        }
    }
}

impl Default for AlertsConfig {
    fn default() -> Self {
        let defaults = ChannelSettings::default();
        Self {
            dashboard_url: "http://localhost:3000/dashboard".into(),
            sender_name: defaults.sender_name,
            brevo_endpoint: defaults.brevo_endpoint,
            telegram_api: defaults.telegram_api,
            timeout_seconds: defaults.timeout_seconds,
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { bind: "127.0.0.1".into(), port: 8080 }
    }
}

impl ProbeConfig {
    pub fn settings(&self) -> ProbeSettings {
        ProbeSettings {
            timeout_seconds: self.timeout_seconds,
            max_redirects: self.max_redirects,
            user_agent: self.user_agent.clone(),
        }
    }
}

impl AlertsConfig {
    pub fn channel_settings(&self) -> ChannelSettings {
        ChannelSettings {
            timeout_seconds: self.timeout_seconds,
            sender_name: self.sender_name.clone(),
            brevo_endpoint: self.brevo_endpoint.clone(),
            telegram_api: self.telegram_api.clone(),
        }
    }
}

/// Used to ensure we are actually reading a toml file
fn normalize_toml_path(path: &path::Path) -> path::PathBuf {
    let mut path = path.to_path_buf();
    if path.extension().map(|ext| ext != "toml").unwrap_or(true) {
        path.set_extension("toml");
    }
    path
}

/// Get default config path ($XDG_CONFIG_HOME/pagewatch/config.toml or
/// $HOME/.config/...)
fn default_config_path() -> Result<path::PathBuf, Error> {
    let path = if let Ok(config_home) = env::var("XDG_CONFIG_HOME") {
        path::PathBuf::from(config_home)
    } else if let Some(home_dir) = env::home_dir() {
        home_dir.join(".config")
    } else {
        return Err(Error::ConfigPathUnavailable);
    };

    Ok(path.join("pagewatch/config.toml"))
}

impl fmt::Display for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let write_indented = |level: usize| {
            move |f: &mut fmt::Formatter<'_>, label: &str, value: &dyn fmt::Display| {
                writeln!(f, "  {:indent$}{}: {}", "", label, value, indent = level * 2)
            }
        };
        let write_title_indented = |level: usize| {
            move |f: &mut fmt::Formatter<'_>, label: &str| writeln!(f, "{:indent$}{}", "", label, indent = level * 2)
        };

        let write_title_1 = write_title_indented(1);
        let write_1 = write_indented(1);

        writeln!(f, "Current Configuration:")?;
        write_title_1(f, "Database")?;
        write_1(f, "Path", &self.database.path)?;
        write_1(f, "Max Connections", &self.database.max_connections)?;
        write_title_1(f, "Scheduler")?;
        write_1(f, "Tick (s)", &self.scheduler.tick_seconds)?;
        write_1(f, "Max Concurrent Checks", &self.scheduler.max_concurrent_checks)?;
        write_title_1(f, "Probe")?;
        write_1(f, "Timeout (s)", &self.probe.timeout_seconds)?;
        write_1(f, "Max Redirects", &self.probe.max_redirects)?;
        write_1(f, "User Agent", &self.probe.user_agent)?;
        write_title_1(f, "Alerts")?;
        write_1(f, "Dashboard URL", &self.alerts.dashboard_url)?;
        write_1(f, "Sender Name", &self.alerts.sender_name)?;
        write_1(f, "Brevo Endpoint", &self.alerts.brevo_endpoint)?;
        write_1(f, "Telegram API", &self.alerts.telegram_api)?;
        write_1(f, "Timeout (s)", &self.alerts.timeout_seconds)?;
        write_title_1(f, "Server")?;
        write_1(f, "Bind Address", &self.server.bind)?;
        write_1(f, "Port", &self.server.port)?;

        Ok(())
    }
}

impl Config {
    /// Generate Config structure from file
    ///
    /// Creates a default config in ~/.config/pagewatch/config.toml
    ///  or the specified path, with the name config.toml if one does not exist
    pub fn from_config(optional_path: Option<impl AsRef<path::Path>>) -> Result<Self, Error> {
        let config_path: path::PathBuf = if let Some(path) = optional_path {
            normalize_toml_path(path.as_ref())
        } else {
            default_config_path()?
        };

        if config_path.exists() {
            let raw_string = fs::read_to_string(&config_path)
                .map_err(|_err| Error::ReadFailed(config_path.display().to_string()))?;
            toml::from_str(raw_string.as_str()).map_err(|err| Error::ParseFailed(err.to_string()))
        } else {
            let config = Self::default();
            config.write_config(&config_path)?;
            tracing::info!("Wrote default configuration to {}", config_path.display());
            Ok(config)
        }
    }

    /// Serialize and write a config to a file
    pub fn write_config(&self, path: &path::Path) -> Result<(), Error> {
        let config_str: String = toml::to_string_pretty(self).map_err(|err| Error::ParseFailed(err.to_string()))?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|_err| Error::WriteFailed(path.display().to_string()))?;
        }

        fs::write(path, config_str).map_err(|_err| Error::WriteFailed(path.display().to_string()))
    }
}

/// The trigger shared secret, if set and non-empty
pub fn trigger_secret() -> Option<String> {
    env::var(TRIGGER_SECRET_VAR).ok().filter(|secret| !secret.is_empty())
}
