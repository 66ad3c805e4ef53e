//! HTTP gateway used to talk to the portal.
//!
//! The gateway is the only place that performs network I/O. It owns the
//! cookie store shared by every request of one session, so a gateway must
//! never be reused across unrelated identities.

mod config;
mod reqwest_gateway;

pub use config::GatewayConfig;
pub use reqwest_gateway::ReqwestGateway;

use async_trait::async_trait;
use std::collections::BTreeMap;

use crate::errors::TransportError;

/// Form fields sent in a POST body, keyed by field name.
pub type FormFields = BTreeMap<String, String>;

/// Extra request headers, keyed by header name.
pub type Headers = BTreeMap<String, String>;

/// Protocol for the HTTP transport.
///
/// Implementations keep a cookie store bound to every request and report
/// network failures and non-success statuses as [`TransportError`]. Errors
/// returned here carry no step tag; callers add it.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait HttpGateway: Send + Sync {
    /// Performs a GET request and returns the response body.
    async fn get(&self, url: &str, headers: &Headers) -> Result<String, TransportError>;

    /// Performs a form-encoded POST request and returns the response body.
    async fn post(
        &self,
        url: &str,
        form: &FormFields,
        headers: &Headers,
    ) -> Result<String, TransportError>;

    /// Whether the cookie store holds no cookies for the portal hosts.
    fn is_cookie_jar_empty(&self) -> bool;
}
