//! Configuration for the HTTP gateway.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

use crate::errors::InputError;

/// Configuration for [`ReqwestGateway`](super::ReqwestGateway).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GatewayConfig {
    /// Request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_seconds: f64,
    /// Connect timeout in seconds.
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_seconds: f64,
    /// Maximum number of redirects to follow.
    #[serde(default = "default_max_redirects")]
    pub max_redirects: usize,
    /// User agent string.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    /// Whether to verify SSL certificates.
    #[serde(default = "default_verify_ssl")]
    pub verify_ssl: bool,
    /// Additional headers sent on every request.
    #[serde(default)]
    pub headers: HashMap<String, String>,
}

fn default_timeout() -> f64 {
    30.0
}

fn default_connect_timeout() -> f64 {
    10.0
}

fn default_max_redirects() -> usize {
    10
}

// The portal serves different markup to clients it does not recognise.
fn default_user_agent() -> String {
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) \
     Chrome/120.0 Safari/537.36"
        .to_string()
}

fn default_verify_ssl() -> bool {
    true
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: default_timeout(),
            connect_timeout_seconds: default_connect_timeout(),
            max_redirects: default_max_redirects(),
            user_agent: default_user_agent(),
            verify_ssl: default_verify_ssl(),
            headers: HashMap::new(),
        }
    }
}

impl GatewayConfig {
    /// Creates a new gateway configuration with defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the request timeout.
    #[must_use]
    pub fn with_timeout(mut self, seconds: f64) -> Self {
        self.timeout_seconds = seconds;
        self
    }

    /// Sets the connect timeout.
    #[must_use]
    pub fn with_connect_timeout(mut self, seconds: f64) -> Self {
        self.connect_timeout_seconds = seconds;
        self
    }

    /// Sets the user agent.
    #[must_use]
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Disables certificate verification.
    #[must_use]
    pub fn without_ssl_verification(mut self) -> Self {
        self.verify_ssl = false;
        self
    }

    /// Adds a header sent on every request.
    #[must_use]
    pub fn with_header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key.into(), value.into());
        self
    }

    /// Gets timeout as Duration.
    ///
    /// Fails when the configured value is negative, NaN or too large.
    pub fn timeout(&self) -> Result<Duration, InputError> {
        seconds_to_duration("timeout_seconds", self.timeout_seconds)
    }

    /// Gets connect timeout as Duration.
    pub fn connect_timeout(&self) -> Result<Duration, InputError> {
        seconds_to_duration("connect_timeout_seconds", self.connect_timeout_seconds)
    }
}

fn seconds_to_duration(field: &str, seconds: f64) -> Result<Duration, InputError> {
    Duration::try_from_secs_f64(seconds)
        .map_err(|e| InputError::new(field, format!("{seconds} is not a valid duration: {e}")))
}
