//! Authenticated portal sessions.
//!
//! A [`SessionManager`] owns the login state machine for one identity and
//! the [`PortalGateway`] (and therefore the cookie store) that the session
//! lives in. Two strategies exist:
//!
//! - [`FielSessionManager`]: certificate challenge signed with a private key
//! - [`CiecSessionManager`]: user and password
//!
//! Both share [`SessionCore`], which holds the gateway, the identity and the
//! [`SessionState`].

mod ciec;
mod fiel;

pub use ciec::{CiecSessionData, CiecSessionManager};
pub use fiel::{challenge_token, create_signed_token, FielSessionManager};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, info, warn};

use crate::errors::{LoginError, ParseError, Result, ScraperError};
use crate::html::FormExtractor;
use crate::portal::PortalGateway;

const STEP_READ_AUTOSUBMIT_FORM: &str = "read auto-submit form";
const STEP_SUBMIT_AUTOSUBMIT_FORM: &str = "submit auto-submit form";

/// Login state of a session manager.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "state", content = "reason")]
pub enum SessionState {
    /// No login attempted since the gateway was bound.
    Unauthenticated,
    /// A login handshake is in progress.
    Authenticating,
    /// The last login succeeded.
    Authenticated,
    /// The last login failed.
    Failed(String),
}

impl Default for SessionState {
    fn default() -> Self {
        Self::Unauthenticated
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unauthenticated => write!(f, "unauthenticated"),
            Self::Authenticating => write!(f, "authenticating"),
            Self::Authenticated => write!(f, "authenticated"),
            Self::Failed(reason) => write!(f, "failed: {reason}"),
        }
    }
}

/// Produces and maintains an authenticated portal session.
///
/// A manager is used by one caller at a time: every round trip mutates the
/// cookie store in place.
#[async_trait]
pub trait SessionManager: Send + Sync {
    /// Subject id (RFC) of the identity.
    fn identity(&self) -> &str;

    /// Current login state.
    fn state(&self) -> &SessionState;

    /// Gets the bound gateway.
    ///
    /// Fails with [`ScraperError::Logic`] when none was bound.
    fn http_gateway(&self) -> Result<&PortalGateway>;

    /// Binds the gateway (and cookie store) the session lives in.
    fn set_http_gateway(&mut self, gateway: PortalGateway);

    /// Checks whether the cookie store holds a live session for the identity.
    ///
    /// Returns `false` without a request when the cookie store is empty.
    /// Transport errors during the probe also yield `false`, so this is
    /// safe to call speculatively. Only a missing gateway is an error.
    async fn has_active_session(&self) -> Result<bool>;

    /// Runs the login handshake.
    async fn login(&mut self) -> Result<()>;

    /// Makes sure the portal is reachable with a live session, logging in
    /// when needed.
    async fn access_portal_main_page(&mut self) -> Result<()> {
        if self.has_active_session().await? {
            debug!(identity = self.identity(), "reusing active session");
            return Ok(());
        }
        self.login().await
    }
}

/// Text the portal shows on its home page for a logged-in identity.
#[must_use]
pub fn authenticated_marker(rfc: &str) -> String {
    format!("RFC Autenticado: {rfc}")
}

/// State shared by both login strategies.
#[derive(Debug)]
pub struct SessionCore {
    identity: String,
    gateway: Option<PortalGateway>,
    state: SessionState,
}

impl SessionCore {
    /// Creates an unauthenticated core without a gateway.
    #[must_use]
    pub fn new(identity: impl Into<String>) -> Self {
        Self {
            identity: identity.into(),
            gateway: None,
            state: SessionState::Unauthenticated,
        }
    }

    /// Subject id (RFC).
    #[must_use]
    pub fn identity(&self) -> &str {
        &self.identity
    }

    /// Current login state.
    #[must_use]
    pub fn state(&self) -> &SessionState {
        &self.state
    }

    /// Gets the bound gateway.
    pub fn gateway(&self) -> Result<&PortalGateway> {
        self.gateway
            .as_ref()
            .ok_or_else(|| ScraperError::logic("must set http gateway before use"))
    }

    /// Binds a gateway. A new gateway means a new cookie store, so the
    /// state goes back to unauthenticated.
    pub fn set_gateway(&mut self, gateway: PortalGateway) {
        self.gateway = Some(gateway);
        self.state = SessionState::Unauthenticated;
    }

    /// Probes the portal home page for `marker`.
    pub async fn probe(&self, marker: &str) -> Result<bool> {
        let gateway = self.gateway()?;
        if gateway.is_cookie_jar_empty() {
            debug!(identity = %self.identity, "cookie store is empty, no session to probe");
            return Ok(false);
        }

        match gateway.get_portal_main_page().await {
            Ok(html) => Ok(html.contains(marker)),
            Err(err) => {
                warn!(identity = %self.identity, error = %err, "session probe failed, treating as unauthenticated");
                Ok(false)
            }
        }
    }

    /// Marks the start of a login handshake.
    pub fn begin_login(&mut self) {
        debug!(identity = %self.identity, "starting login");
        self.state = SessionState::Authenticating;
    }

    /// Settles the state from the handshake outcome.
    ///
    /// `outcome` holds the page returned by the last handshake step; the
    /// login only counts when it shows `marker`.
    pub fn finish_login(
        &mut self,
        outcome: std::result::Result<String, LoginError>,
        marker: &str,
    ) -> Result<()> {
        let error = match outcome {
            Ok(html) if html.contains(marker) => {
                info!(identity = %self.identity, "login succeeded");
                self.state = SessionState::Authenticated;
                return Ok(());
            }
            Ok(html) => LoginError::not_registered_after_login(self.identity.clone(), html),
            Err(error) => error,
        };

        warn!(identity = %self.identity, error = %error, "login failed");
        self.state = SessionState::Failed(error.kind.to_string());
        Err(error.into())
    }
}

/// Returns a mapper that wraps a step failure into a [`LoginError`].
pub(crate) fn step_failed<'a, E: Into<ScraperError>>(
    identity: &'a str,
    step: &'static str,
) -> impl FnOnce(E) -> LoginError + 'a {
    move |cause| LoginError::step_failed(identity, step, cause)
}

/// Reads the auto-submit form the authentication service answers with and
/// posts it to the portal, returning the portal's response.
pub(crate) async fn submit_autosubmit_form(
    gateway: &PortalGateway,
    extractor: &dyn FormExtractor,
    identity: &str,
    html: &str,
) -> std::result::Result<String, LoginError> {
    let inputs = extractor
        .extract_fields(html, "form")
        .map_err(step_failed(identity, STEP_READ_AUTOSUBMIT_FORM))?;
    if inputs.is_empty() {
        return Err(LoginError::step_failed(
            identity,
            STEP_READ_AUTOSUBMIT_FORM,
            ParseError::new(STEP_READ_AUTOSUBMIT_FORM, "auto-submit form not found"),
        ));
    }

    debug!(identity, fields = inputs.len(), "submitting auto-submit form");
    gateway
        .post_portal_main_page(&inputs)
        .await
        .map_err(step_failed(identity, STEP_SUBMIT_AUTOSUBMIT_FORM))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ScriptedGateway;
    use std::sync::Arc;

    fn core_with(gateway: &Arc<ScriptedGateway>) -> SessionCore {
        let mut core = SessionCore::new("AAA010101AAA");
        core.set_gateway(PortalGateway::new(gateway.clone()));
        core
    }

    #[test]
    fn test_session_state_display() {
        assert_eq!(SessionState::default().to_string(), "unauthenticated");
        assert_eq!(SessionState::Failed("boom".into()).to_string(), "failed: boom");
    }

    #[tokio::test]
    async fn test_probe_without_gateway_is_logic_error() {
        let core = SessionCore::new("AAA010101AAA");
        let err = core.probe("marker").await.unwrap_err();
        assert!(matches!(err, ScraperError::Logic(_)));
    }

    #[tokio::test]
    async fn test_probe_skips_request_when_cookie_store_is_empty() {
        let gateway = Arc::new(ScriptedGateway::new().with_response("RFC Autenticado: AAA010101AAA"));
        let core = core_with(&gateway);

        assert!(!core.probe("RFC Autenticado: AAA010101AAA").await.unwrap());
        assert_eq!(gateway.request_count(), 0);
    }

    #[tokio::test]
    async fn test_probe_swallows_transport_errors() {
        let gateway = Arc::new(ScriptedGateway::new().with_cookies().with_error("connection reset"));
        let core = core_with(&gateway);

        assert!(!core.probe("RFC Autenticado: AAA010101AAA").await.unwrap());
        assert_eq!(gateway.request_count(), 1);
    }

    #[tokio::test]
    async fn test_probe_finds_marker() {
        let gateway = Arc::new(
            ScriptedGateway::new()
                .with_cookies()
                .with_response("<p>RFC Autenticado: AAA010101AAA</p>")
                .with_response("<p>RFC Autenticado: BBB010101BBB</p>"),
        );
        let core = core_with(&gateway);

        assert!(core.probe(&authenticated_marker("AAA010101AAA")).await.unwrap());
        assert!(!core.probe(&authenticated_marker("AAA010101AAA")).await.unwrap());
    }

    #[test]
    fn test_finish_login_transitions() {
        let gateway = Arc::new(ScriptedGateway::new());
        let mut core = core_with(&gateway);
        let marker = authenticated_marker("AAA010101AAA");

        core.begin_login();
        assert_eq!(core.state(), &SessionState::Authenticating);
        core.finish_login(Ok(format!("<p>{marker}</p>")), &marker).unwrap();
        assert_eq!(core.state(), &SessionState::Authenticated);

        core.begin_login();
        let err = core.finish_login(Ok("<p>login</p>".into()), &marker).unwrap_err();
        assert!(matches!(err, ScraperError::Login(_)));
        assert_eq!(core.state(), &SessionState::Failed("not registered after login".into()));

        core.set_gateway(PortalGateway::new(gateway));
        assert_eq!(core.state(), &SessionState::Unauthenticated);
    }
}
