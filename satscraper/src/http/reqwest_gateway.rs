//! `reqwest` implementation of [`HttpGateway`].

use async_trait::async_trait;
use reqwest::cookie::{CookieStore, Jar};
use reqwest::redirect::Policy;
use reqwest::{Client, RequestBuilder, Response, Url};
use std::sync::Arc;
use tracing::debug;

use super::{FormFields, GatewayConfig, Headers, HttpGateway};
use crate::errors::{InputError, TransportError};
use crate::portal::urls;

const STEP_BUILD_CLIENT: &str = "build http client";

/// HTTP gateway backed by a `reqwest` client and an in-memory cookie jar.
///
/// Cloning shares the client and the cookie jar.
#[derive(Debug, Clone)]
pub struct ReqwestGateway {
    client: Client,
    jar: Arc<Jar>,
    config: GatewayConfig,
}

impl ReqwestGateway {
    /// Creates a gateway with an empty cookie jar.
    pub fn new(config: GatewayConfig) -> Result<Self, TransportError> {
        Self::with_jar(config, Arc::new(Jar::default()))
    }

    /// Creates a gateway bound to an existing cookie jar.
    pub fn with_jar(config: GatewayConfig, jar: Arc<Jar>) -> Result<Self, TransportError> {
        let invalid_config = |e: InputError| TransportError::new("", e.to_string()).at_step(STEP_BUILD_CLIENT);
        let timeout = config.timeout().map_err(invalid_config)?;
        let connect_timeout = config.connect_timeout().map_err(invalid_config)?;

        let client = Client::builder()
            .cookie_provider(Arc::clone(&jar))
            .user_agent(config.user_agent.clone())
            .timeout(timeout)
            .connect_timeout(connect_timeout)
            .redirect(Policy::limited(config.max_redirects))
            .danger_accept_invalid_certs(!config.verify_ssl)
            .build()
            .map_err(|e| TransportError::from_reqwest("", e).at_step(STEP_BUILD_CLIENT))?;

        Ok(Self { client, jar, config })
    }

    /// Gets the configuration.
    #[must_use]
    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    /// Gets the cookie jar.
    #[must_use]
    pub fn cookie_jar(&self) -> Arc<Jar> {
        Arc::clone(&self.jar)
    }

    fn apply_headers(&self, mut request: RequestBuilder, headers: &Headers) -> RequestBuilder {
        for (name, value) in self.config.headers.iter().chain(headers.iter()) {
            request = request.header(name.as_str(), value.as_str());
        }
        request
    }

    async fn read_body(url: &str, response: Response) -> Result<String, TransportError> {
        let status = response.status();
        if !status.is_success() {
            return Err(TransportError::status(url, status.as_u16()));
        }
        response
            .text()
            .await
            .map_err(|e| TransportError::from_reqwest(url, e))
    }
}

#[async_trait]
impl HttpGateway for ReqwestGateway {
    async fn get(&self, url: &str, headers: &Headers) -> Result<String, TransportError> {
        debug!(url, "GET");
        let request = self.apply_headers(self.client.get(url), headers);
        let response = request
            .send()
            .await
            .map_err(|e| TransportError::from_reqwest(url, e))?;
        Self::read_body(url, response).await
    }

    async fn post(
        &self,
        url: &str,
        form: &FormFields,
        headers: &Headers,
    ) -> Result<String, TransportError> {
        debug!(url, fields = form.len(), "POST");
        let request = self.apply_headers(self.client.post(url).form(form), headers);
        let response = request
            .send()
            .await
            .map_err(|e| TransportError::from_reqwest(url, e))?;
        Self::read_body(url, response).await
    }

    fn is_cookie_jar_empty(&self) -> bool {
        urls::COOKIE_HOSTS
            .iter()
            .filter_map(|host| Url::parse(host).ok())
            .all(|url| self.jar.cookies(&url).is_none())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_gateway_has_empty_cookie_jar() {
        let gateway = ReqwestGateway::new(GatewayConfig::default()).unwrap();
        assert!(gateway.is_cookie_jar_empty());
    }

    #[test]
    fn test_cookie_jar_with_portal_cookie_is_not_empty() {
        let jar = Arc::new(Jar::default());
        let url = Url::parse(urls::SAT_URL_PORTAL_CFDI).unwrap();
        jar.add_cookie_str("ASP.NET_SessionId=abc; Path=/", &url);

        let gateway = ReqwestGateway::with_jar(GatewayConfig::default(), jar).unwrap();
        assert!(!gateway.is_cookie_jar_empty());
    }

    #[test]
    fn test_cookie_for_unrelated_host_is_ignored() {
        let jar = Arc::new(Jar::default());
        let url = Url::parse("https://example.com/").unwrap();
        jar.add_cookie_str("session=abc; Path=/", &url);

        let gateway = ReqwestGateway::with_jar(GatewayConfig::default(), jar).unwrap();
        assert!(gateway.is_cookie_jar_empty());
    }

    #[test]
    fn test_negative_timeout_fails_to_build() {
        let config = GatewayConfig::new().with_timeout(-1.0);

        let err = ReqwestGateway::new(config).unwrap_err();

        assert_eq!(err.step, "build http client");
        assert!(err.message.contains("timeout_seconds"));
    }
}
