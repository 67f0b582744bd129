use std::env::var;

use tracing::{level_filters::LevelFilter, warn};
use tracing_subscriber::{Layer, filter::EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Output format, selected through `RUST_LOG_FORMAT`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    Json,
    #[default]
    Compact,
}

impl LogFormat {
    pub fn parse(value: &str) -> Self {
        if value.eq_ignore_ascii_case("json") { Self::Json } else { Self::Compact }
    }

    fn from_env() -> Self {
        var("RUST_LOG_FORMAT").map(|value| Self::parse(&value)).unwrap_or_default()
    }
}

/// Install the global subscriber at INFO, overridable through `RUST_LOG`.
pub fn init_tracing() {
    init_with_level(LevelFilter::INFO);
}

pub fn init_with_level(level: LevelFilter) {
    if let Err(error) = try_init(level, LogFormat::from_env()) {
        warn!("Tracing subscriber already installed: {error}");
    }
}

/// Install the global subscriber, failing if one is already set
pub fn try_init(level: LevelFilter, format: LogFormat) -> Result<(), tracing_subscriber::util::TryInitError> {
    let env_filter = EnvFilter::builder().with_default_directive(level.into()).from_env_lossy();

    let log_layer = match format {
        LogFormat::Json => tracing_subscriber::fmt::layer().json().with_filter(env_filter).boxed(),
        LogFormat::Compact => tracing_subscriber::fmt::layer()
            .compact()
            .without_time()
            .with_filter(env_filter)
            .boxed(),
    };

    tracing_subscriber::registry().with(log_layer).try_init()
}
