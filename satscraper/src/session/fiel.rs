//! Certificate (FIEL) login.
//!
//! The handshake mirrors the browser flow:
//!
//! 1. GET the portal home page, which redirects towards the password login.
//! 2. POST an empty form to the password login, only for its cookies.
//! 3. GET the certificate login page, which carries a one-time challenge.
//! 4. Sign the challenge and POST it back; the answer is an auto-submit form.
//! 5. POST that form to the portal to land on an authenticated home page.

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine};
use std::sync::Arc;
use tracing::{debug, warn};

use super::{
    authenticated_marker, step_failed, submit_autosubmit_form, SessionCore, SessionManager,
    SessionState,
};
use crate::credential::{Credential, FielSessionData, SignatureAlgorithm};
use crate::errors::{CredentialError, LoginError, Result};
use crate::html::{FormExtractor, HtmlForm};
use crate::http::FormFields;
use crate::portal::{urls, PortalGateway};

const CHALLENGE_FORM_SELECTOR: &str = "#certform";

const STEP_GET_HOME: &str = "get portal main page";
const STEP_PASSWORD_REDIRECT: &str = "follow redirect to password login";
const STEP_GET_CHALLENGE: &str = "get certificate challenge";
const STEP_SIGN_CHALLENGE: &str = "sign certificate challenge";
const STEP_SUBMIT_CHALLENGE: &str = "submit signed challenge";

/// Session manager for the certificate challenge login.
#[derive(Debug)]
pub struct FielSessionManager {
    core: SessionCore,
    session_data: FielSessionData,
    extractor: HtmlForm,
}

impl FielSessionManager {
    /// Creates a manager for the given session data. A gateway must be
    /// bound before use.
    #[must_use]
    pub fn new(session_data: FielSessionData) -> Self {
        Self {
            core: SessionCore::new(session_data.rfc()),
            session_data,
            extractor: HtmlForm::new(),
        }
    }

    /// Creates a manager for a credential.
    #[must_use]
    pub fn create(credential: Arc<dyn Credential>) -> Self {
        Self::new(FielSessionData::new(credential))
    }

    /// Binds the gateway, returning the manager.
    #[must_use]
    pub fn with_http_gateway(mut self, gateway: PortalGateway) -> Self {
        self.core.set_gateway(gateway);
        self
    }

    /// Gets the session data.
    #[must_use]
    pub fn session_data(&self) -> &FielSessionData {
        &self.session_data
    }

    fn marker(&self) -> String {
        authenticated_marker(self.session_data.rfc())
    }

    /// Reads the challenge page and builds the signed login form.
    fn resolve_challenge(&self, html: &str) -> Result<FormFields> {
        let inputs = self.extractor.extract_fields(html, CHALLENGE_FORM_SELECTOR)?;
        let token_uuid = challenge_token(&inputs);
        if token_uuid.is_empty() {
            warn!(identity = self.session_data.rfc(), "challenge token not found, signing an empty token");
        }

        let token = create_signed_token(&self.session_data, &token_uuid)?;
        let form = [
            ("token", token),
            ("credentialsRequired", "CERT".to_string()),
            ("guid", token_uuid),
            ("ks", "null".to_string()),
            ("seeder", String::new()),
            ("arc", String::new()),
            ("tan", String::new()),
            ("placer", String::new()),
            ("secuence", String::new()),
            ("urlApplet", urls::SAT_URL_FIEL_APPLET.to_string()),
            ("fert", self.session_data.valid_to_timestamp()),
        ]
        .into_iter()
        .map(|(name, value)| (name.to_string(), value))
        .collect();

        Ok(form)
    }

    async fn handshake(&self, gateway: &PortalGateway) -> std::result::Result<String, LoginError> {
        let rfc = self.session_data.rfc();

        gateway
            .get_portal_main_page()
            .await
            .map_err(step_failed(rfc, STEP_GET_HOME))?;

        // Only here to walk the same redirect chain as a browser.
        gateway
            .post_login_data(urls::SAT_URL_CIEC_LOGIN, &FormFields::new())
            .await
            .map_err(step_failed(rfc, STEP_PASSWORD_REDIRECT))?;

        let html = gateway
            .get_auth_login_page(urls::SAT_URL_FIEL_LOGIN, urls::SAT_URL_CIEC_LOGIN)
            .await
            .map_err(step_failed(rfc, STEP_GET_CHALLENGE))?;

        let inputs = self
            .resolve_challenge(&html)
            .map_err(step_failed(rfc, STEP_SIGN_CHALLENGE))?;
        debug!(identity = rfc, "submitting signed challenge");

        let html = gateway
            .post_fiel_login_data(urls::SAT_URL_FIEL_LOGIN, &inputs)
            .await
            .map_err(step_failed(rfc, STEP_SUBMIT_CHALLENGE))?;

        submit_autosubmit_form(gateway, &self.extractor, rfc, &html).await
    }
}

#[async_trait]
impl SessionManager for FielSessionManager {
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

/// Picks the challenge token out of the challenge form.
///
/// Depending on the markup the token sits under an unnamed input or under
/// `guid`. Neither being present yields an empty token.
#[must_use]
pub fn challenge_token(inputs: &FormFields) -> String {
    inputs
        .get("")
        .or_else(|| inputs.get("guid"))
        .cloned()
        .unwrap_or_default()
}

/// Builds the signed challenge token.
///
/// The portal expects
/// `base64(base64(source) + "#" + base64(base64(signature)))` where
/// `source` is `token|rfc|serial` and the signature is SHA-1 with RSA.
pub fn create_signed_token(
    session_data: &FielSessionData,
    token_uuid: &str,
) -> std::result::Result<String, CredentialError> {
    let source = format!(
        "{token_uuid}|{}|{}",
        session_data.rfc(),
        session_data.serial_number()
    );
    let signature = session_data.sign(source.as_bytes(), SignatureAlgorithm::Sha1)?;
    let signature = STANDARD.encode(STANDARD.encode(signature));
    Ok(STANDARD.encode(format!("{}#{signature}", STANDARD.encode(&source))))
}
