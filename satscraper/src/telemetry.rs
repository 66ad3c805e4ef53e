//! Tracing subscriber setup.
//!
//! The library only emits `tracing` events. Applications that want them on
//! stderr can call [`init_tracing`] once at startup.

use serde::{Deserialize, Serialize};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

fn default_filter() -> String {
    "satscraper=info".to_string()
}

/// Log output configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TelemetryConfig {
    /// Filter directives, used when `RUST_LOG` is not set.
    #[serde(default = "default_filter")]
    pub filter: String,
    /// Emit JSON lines instead of human readable output.
    #[serde(default)]
    pub json: bool,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            filter: default_filter(),
            json: false,
        }
    }
}

impl TelemetryConfig {
    /// Sets the filter directives.
    #[must_use]
    pub fn with_filter(mut self, filter: impl Into<String>) -> Self {
        self.filter = filter.into();
        self
    }

    /// Switches to JSON output.
    #[must_use]
    pub fn json(mut self) -> Self {
        self.json = true;
        self
    }

    fn env_filter(&self) -> EnvFilter {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&self.filter))
    }
}

/// Installs the global subscriber.
///
/// Returns `false` when a subscriber was already installed; the existing
/// one is kept.
pub fn init_tracing(config: &TelemetryConfig) -> bool {
    let registry = tracing_subscriber::registry().with(config.env_filter());
    let result = if config.json {
        registry.with(tracing_subscriber::fmt::layer().json()).try_init()
    } else {
        registry.with(tracing_subscriber::fmt::layer()).try_init()
    };
    result.is_ok()
}
