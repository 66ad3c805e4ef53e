//! Portal endpoints, header sets and the request helpers built on them.
//!
//! [`PortalGateway`] wraps an [`HttpGateway`] with one method per kind of
//! request the login and search workflows make, so the right headers and
//! step tags travel with every request.

pub mod headers;
pub mod urls;

use std::fmt;
use std::sync::Arc;

use crate::errors::TransportError;
use crate::http::{FormFields, Headers, HttpGateway};

/// Step tag for the portal home page request.
pub const STEP_GET_PORTAL_MAIN_PAGE: &str = "get portal main page";
/// Step tag for the final handshake submission.
pub const STEP_POST_PORTAL_MAIN_PAGE: &str = "post portal main page";
/// Step tag for a login form submission.
pub const STEP_POST_LOGIN_DATA: &str = "post login data";
/// Step tag for the certificate challenge page.
pub const STEP_GET_AUTH_LOGIN_PAGE: &str = "get auth login page";
/// Step tag for the signed challenge submission.
pub const STEP_POST_FIEL_LOGIN_DATA: &str = "post fiel login data";
/// Step tag for the search form page.
pub const STEP_GET_SEARCH_PAGE: &str = "get search page";

/// Portal-aware wrapper around a shared [`HttpGateway`].
///
/// Cloning is cheap and shares the gateway (and its cookie store).
#[derive(Clone)]
pub struct PortalGateway {
    inner: Arc<dyn HttpGateway>,
}

impl fmt::Debug for PortalGateway {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PortalGateway")
            .field("cookie_jar_empty", &self.inner.is_cookie_jar_empty())
            .finish()
    }
}

impl PortalGateway {
    /// Creates a portal gateway over a shared transport.
    #[must_use]
    pub fn new(inner: Arc<dyn HttpGateway>) -> Self {
        Self { inner }
    }

    /// Creates a portal gateway that owns its transport.
    #[must_use]
    pub fn from_gateway(gateway: impl HttpGateway + 'static) -> Self {
        Self::new(Arc::new(gateway))
    }

    /// Gets the underlying transport.
    #[must_use]
    pub fn inner(&self) -> &Arc<dyn HttpGateway> {
        &self.inner
    }

    /// Whether the cookie store is empty.
    #[must_use]
    pub fn is_cookie_jar_empty(&self) -> bool {
        self.inner.is_cookie_jar_empty()
    }

    async fn get(&self, step: &str, url: &str, headers: &Headers) -> Result<String, TransportError> {
        self.inner.get(url, headers).await.map_err(|e| e.at_step(step))
    }

    async fn post(
        &self,
        step: &str,
        url: &str,
        form: &FormFields,
        headers: &Headers,
    ) -> Result<String, TransportError> {
        self.inner
            .post(url, form, headers)
            .await
            .map_err(|e| e.at_step(step))
    }

    /// Fetches the portal home page.
    pub async fn get_portal_main_page(&self) -> Result<String, TransportError> {
        self.get(STEP_GET_PORTAL_MAIN_PAGE, urls::SAT_URL_PORTAL_CFDI, &headers::get())
            .await
    }

    /// Submits the auto-submit form that completes a login handshake.
    pub async fn post_portal_main_page(&self, form: &FormFields) -> Result<String, TransportError> {
        let referer = format!("{}/", urls::SAT_HOST_CFDI_AUTH);
        self.post(
            STEP_POST_PORTAL_MAIN_PAGE,
            urls::SAT_URL_PORTAL_CFDI,
            form,
            &headers::post(urls::SAT_HOST_CFDI_AUTH, &referer),
        )
        .await
    }

    /// Submits a login form to an authentication endpoint.
    pub async fn post_login_data(&self, url: &str, form: &FormFields) -> Result<String, TransportError> {
        self.post(
            STEP_POST_LOGIN_DATA,
            url,
            form,
            &headers::post(urls::SAT_HOST_CFDI_AUTH, url),
        )
        .await
    }

    /// Fetches an authentication page, announcing `referer` as the previous page.
    pub async fn get_auth_login_page(&self, url: &str, referer: &str) -> Result<String, TransportError> {
        self.get(STEP_GET_AUTH_LOGIN_PAGE, url, &headers::get_with_referer(referer))
            .await
    }

    /// Submits the signed certificate challenge.
    pub async fn post_fiel_login_data(&self, url: &str, form: &FormFields) -> Result<String, TransportError> {
        self.post(
            STEP_POST_FIEL_LOGIN_DATA,
            url,
            form,
            &headers::post(urls::SAT_HOST_CFDI_AUTH, url),
        )
        .await
    }

    /// Fetches a search form page.
    pub async fn get_search_page(&self, url: &str) -> Result<String, TransportError> {
        self.get(STEP_GET_SEARCH_PAGE, url, &headers::get()).await
    }

    /// Submits a search form as a partial postback of the search page.
    pub async fn post_ajax_search(
        &self,
        step: &str,
        url: &str,
        form: &FormFields,
    ) -> Result<String, TransportError> {
        self.post(
            step,
            url,
            form,
            &headers::post_ajax(urls::SAT_HOST_PORTAL_CFDI, url),
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::MockHttpGateway;

    #[tokio::test]
    async fn test_transport_errors_are_step_tagged() {
        let mut mock = MockHttpGateway::new();
        mock.expect_get()
            .withf(|url, _| url == urls::SAT_URL_PORTAL_CFDI)
            .times(1)
            .returning(|url, _| Err(TransportError::new(url, "connection failed")));

        let gateway = PortalGateway::from_gateway(mock);
        let err = gateway.get_portal_main_page().await.unwrap_err();

        assert_eq!(err.step, STEP_GET_PORTAL_MAIN_PAGE);
        assert_eq!(err.url, urls::SAT_URL_PORTAL_CFDI);
    }

    #[tokio::test]
    async fn test_ajax_search_sends_portal_origin() {
        let mut mock = MockHttpGateway::new();
        mock.expect_post()
            .withf(|url, _form, headers| {
                url == urls::SAT_URL_PORTAL_CFDI_CONSULTA_RECEPTOR
                    && headers.get("Origin").map(String::as_str) == Some(urls::SAT_HOST_PORTAL_CFDI)
                    && headers.get("Referer").map(String::as_str)
                        == Some(urls::SAT_URL_PORTAL_CFDI_CONSULTA_RECEPTOR)
            })
            .times(1)
            .returning(|_, _, _| Ok("ok".to_string()));

        let gateway = PortalGateway::from_gateway(mock);
        let body = gateway
            .post_ajax_search("search", urls::SAT_URL_PORTAL_CFDI_CONSULTA_RECEPTOR, &FormFields::new())
            .await
            .unwrap();

        assert_eq!(body, "ok");
    }
}
