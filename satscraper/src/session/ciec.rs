//! Password (CIEC) login.

use async_trait::async_trait;
use std::fmt;

use super::{
    authenticated_marker, step_failed, submit_autosubmit_form, SessionCore, SessionManager,
    SessionState,
};
use crate::errors::{InputError, LoginError, Result};
use crate::html::HtmlForm;
use crate::http::FormFields;
use crate::portal::{urls, PortalGateway};

const STEP_GET_HOME: &str = "get portal main page";
const STEP_SUBMIT_CREDENTIALS: &str = "submit password credentials";

/// User and password for the password login.
#[derive(Clone, PartialEq, Eq)]
pub struct CiecSessionData {
    rfc: String,
    password: String,
}

impl fmt::Debug for CiecSessionData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CiecSessionData")
            .field("rfc", &self.rfc)
            .field("password", &"********")
            .finish()
    }
}

impl CiecSessionData {
    /// Creates session data, rejecting an empty RFC or password.
    pub fn new(rfc: impl Into<String>, password: impl Into<String>) -> std::result::Result<Self, InputError> {
        let rfc = rfc.into();
        let password = password.into();
        if rfc.is_empty() {
            return Err(InputError::empty("RFC"));
        }
        if password.is_empty() {
            return Err(InputError::empty("password"));
        }
        Ok(Self { rfc, password })
    }

    /// Subject id (RFC).
    #[must_use]
    pub fn rfc(&self) -> &str {
        &self.rfc
    }

    fn login_form(&self) -> FormFields {
        [
            ("Ecom_User_ID", self.rfc.as_str()),
            ("Ecom_Password", self.password.as_str()),
            ("option", "credential"),
            ("submit", "Enviar"),
        ]
        .into_iter()
        .map(|(name, value)| (name.to_string(), value.to_string()))
        .collect()
    }
}

/// Session manager for the password login.
#[derive(Debug)]
pub struct CiecSessionManager {
    core: SessionCore,
    session_data: CiecSessionData,
    extractor: HtmlForm,
}

impl CiecSessionManager {
    /// Creates a manager for the given session data. A gateway must be
    /// bound before use.
    #[must_use]
    pub fn new(session_data: CiecSessionData) -> Self {
        Self {
            core: SessionCore::new(session_data.rfc()),
            session_data,
            extractor: HtmlForm::new(),
        }
    }

    /// Binds the gateway, returning the manager.
    #[must_use]
    pub fn with_http_gateway(mut self, gateway: PortalGateway) -> Self {
        self.core.set_gateway(gateway);
        self
    }

    /// Gets the session data.
    #[must_use]
    pub fn session_data(&self) -> &CiecSessionData {
        &self.session_data
    }

    fn marker(&self) -> String {
        authenticated_marker(self.session_data.rfc())
    }

    async fn handshake(&self, gateway: &PortalGateway) -> std::result::Result<String, LoginError> {
        let rfc = self.session_data.rfc();

        gateway
            .get_portal_main_page()
            .await
            .map_err(step_failed(rfc, STEP_GET_HOME))?;

        let html = gateway
            .post_login_data(urls::SAT_URL_CIEC_LOGIN, &self.session_data.login_form())
            .await
            .map_err(step_failed(rfc, STEP_SUBMIT_CREDENTIALS))?;

        submit_autosubmit_form(gateway, &self.extractor, rfc, &html).await
    }
}

#[async_trait]
impl SessionManager for CiecSessionManager {
    fn identity(&self) -> &str {
        self.core.identity()
    }

    fn state(&self) -> &SessionState {
        self.core.state()
    }

    fn http_gateway(&self) -> Result<&PortalGateway> {
        self.core.gateway()
    }

    fn set_http_gateway(&mut self, gateway: PortalGateway) {
        self.core.set_gateway(gateway);
    }

    async fn has_active_session(&self) -> Result<bool> {
        self.core.probe(&self.marker()).await
    }

    async fn login(&mut self) -> Result<()> {
        let gateway = self.core.gateway()?.clone();
        let marker = self.marker();

        self.core.begin_login();
        let outcome = self.handshake(&gateway).await;
        self.core.finish_login(outcome, &marker)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ScraperError;
    use crate::testing::{RecordedRequest, ScriptedGateway};
    use std::sync::Arc;

    const RFC: &str = "AAA010101AAA";

    fn manager(gateway: &Arc<ScriptedGateway>) -> CiecSessionManager {
        let data = CiecSessionData::new(RFC, "secret").unwrap();
        CiecSessionManager::new(data).with_http_gateway(PortalGateway::new(gateway.clone()))
    }

    #[test]
    fn test_session_data_validation() {
        assert_eq!(CiecSessionData::new("", "x").unwrap_err(), InputError::empty("RFC"));
        assert_eq!(CiecSessionData::new(RFC, "").unwrap_err(), InputError::empty("password"));
        let debug = format!("{:?}", CiecSessionData::new(RFC, "secret").unwrap());
        assert!(!debug.contains("secret"));
    }

    #[tokio::test]
    async fn test_login_posts_credentials_then_autosubmit_form() {
        let gateway = Arc::new(
            ScriptedGateway::new()
                .with_response("<html>home</html>")
                .with_response(
                    r#"<form method="post"><input type="hidden" name="wresult" value="r" /></form>"#,
                )
                .with_response(format!("RFC Autenticado: {RFC}")),
        );
        let mut manager = manager(&gateway);

        manager.login().await.unwrap();

        assert_eq!(manager.state(), &SessionState::Authenticated);
        let requests = gateway.requests();
        assert_eq!(requests.len(), 3);
        let RecordedRequest::Post { url, form, .. } = &requests[1] else {
            panic!("expected credentials POST");
        };
        assert_eq!(url, urls::SAT_URL_CIEC_LOGIN);
        assert_eq!(form.get("Ecom_User_ID").unwrap(), RFC);
        assert_eq!(form.get("Ecom_Password").unwrap(), "secret");
        assert_eq!(requests[2].url(), urls::SAT_URL_PORTAL_CFDI);
    }

    #[tokio::test]
    async fn test_missing_autosubmit_form_fails_login() {
        let gateway = Arc::new(
            ScriptedGateway::new()
                .with_response("<html>home</html>")
                .with_response("<html><p>Captcha requerido</p></html>"),
        );
        let mut manager = manager(&gateway);

        let err = manager.login().await.unwrap_err();

        assert!(matches!(err, ScraperError::Login(_)));
        assert_eq!(err.step(), Some("read auto-submit form"));
        assert!(matches!(manager.state(), SessionState::Failed(_)));
    }
}
