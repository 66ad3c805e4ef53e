//! Error types for the portal client.
//!
//! Every failure the client can report falls in one of a few kinds:
//! transport failures, login handshake failures, parse failures on portal
//! pages, rejected inputs and credential problems. Each kind has its own
//! struct so callers can match on it, and they all fold into
//! [`ScraperError`].

use chrono::{DateTime, Utc};
use serde_json::json;
use std::collections::HashMap;
use thiserror::Error;

/// Result alias used across the crate.
pub type Result<T> = std::result::Result<T, ScraperError>;

/// The main error type for portal operations.
#[derive(Debug, Error)]
pub enum ScraperError {
    /// A network or HTTP failure.
    #[error("{0}")]
    Transport(#[from] TransportError),

    /// The login handshake failed.
    #[error("{0}")]
    Login(#[from] LoginError),

    /// An expected form or table could not be read.
    #[error("{0}")]
    Parse(#[from] ParseError),

    /// A value was rejected at construction time.
    #[error("{0}")]
    Input(#[from] InputError),

    /// The signing credential could not be used.
    #[error("{0}")]
    Credential(#[from] CredentialError),

    /// The client was used incorrectly (e.g. no gateway bound).
    #[error("Logic error: {0}")]
    Logic(String),
}

impl ScraperError {
    /// Creates a logic error.
    #[must_use]
    pub fn logic(message: impl Into<String>) -> Self {
        Self::Logic(message.into())
    }

    /// Returns the step tag of the error, when it has one.
    #[must_use]
    pub fn step(&self) -> Option<&str> {
        match self {
            Self::Transport(err) => Some(err.step.as_str()),
            Self::Login(err) => err.step(),
            Self::Parse(err) => Some(err.step.as_str()),
            _ => None,
        }
    }

    /// Returns true for network or HTTP failures.
    #[must_use]
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport(_))
    }
}

/// A network or HTTP failure on one request.
#[derive(Debug, Error)]
#[error("Transport error during '{step}' ({url}): {message}")]
pub struct TransportError {
    /// Protocol step that issued the request.
    pub step: String,
    /// Requested URL.
    pub url: String,
    /// HTTP status, when the server answered.
    pub status: Option<u16>,
    /// Human readable description.
    pub message: String,
    /// Underlying cause.
    #[source]
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl TransportError {
    /// Creates a new transport error without a step tag.
    #[must_use]
    pub fn new(url: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            step: String::new(),
            url: url.into(),
            status: None,
            message: message.into(),
            source: None,
        }
    }

    /// Creates an error for a non-success HTTP status.
    #[must_use]
    pub fn status(url: impl Into<String>, status: u16) -> Self {
        Self {
            status: Some(status),
            ..Self::new(url, format!("unexpected HTTP status {status}"))
        }
    }

    /// Wraps a `reqwest` failure.
    #[must_use]
    pub fn from_reqwest(url: impl Into<String>, err: reqwest::Error) -> Self {
        let message = if err.is_timeout() {
            "request timed out".to_string()
        } else if err.is_connect() {
            "connection failed".to_string()
        } else {
            err.to_string()
        };
        Self {
            status: err.status().map(|s| s.as_u16()),
            source: Some(Box::new(err)),
            ..Self::new(url, message)
        }
    }

    /// Tags the error with the protocol step that produced it.
    #[must_use]
    pub fn at_step(mut self, step: impl Into<String>) -> Self {
        self.step = step.into();
        self
    }
}

/// What went wrong during a login attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginErrorKind {
    /// A handshake step failed.
    StepFailed {
        /// The failing step.
        step: String,
    },
    /// The handshake finished but the portal does not show the identity.
    NotRegisteredAfterLogin,
}

impl std::fmt::Display for LoginErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::StepFailed { step } => write!(f, "error when try to {step}"),
            Self::NotRegisteredAfterLogin => write!(f, "not registered after login"),
        }
    }
}

/// Error raised when the authentication handshake fails.
#[derive(Debug, Error)]
#[error("Login failed for {identity}: {kind}")]
pub struct LoginError {
    /// Subject id (RFC) of the identity trying to log in.
    pub identity: String,
    /// Failure kind.
    pub kind: LoginErrorKind,
    /// Page contents received when the identity marker was missing.
    pub contents: Option<String>,
    /// Triggering cause.
    #[source]
    pub cause: Option<Box<ScraperError>>,
}

impl LoginError {
    /// Creates an error for a failed handshake step.
    #[must_use]
    pub fn step_failed(
        identity: impl Into<String>,
        step: impl Into<String>,
        cause: impl Into<ScraperError>,
    ) -> Self {
        Self {
            identity: identity.into(),
            kind: LoginErrorKind::StepFailed { step: step.into() },
            contents: None,
            cause: Some(Box::new(cause.into())),
        }
    }

    /// Creates an error for a handshake that did not register the identity.
    #[must_use]
    pub fn not_registered_after_login(identity: impl Into<String>, contents: impl Into<String>) -> Self {
        Self {
            identity: identity.into(),
            kind: LoginErrorKind::NotRegisteredAfterLogin,
            contents: Some(contents.into()),
            cause: None,
        }
    }

    /// Returns the failing step, if the handshake broke mid-way.
    #[must_use]
    pub fn step(&self) -> Option<&str> {
        match &self.kind {
            LoginErrorKind::StepFailed { step } => Some(step.as_str()),
            LoginErrorKind::NotRegisteredAfterLogin => None,
        }
    }

    /// Returns the transport error that aborted the handshake, if any.
    #[must_use]
    pub fn transport_cause(&self) -> Option<&TransportError> {
        match self.cause.as_deref() {
            Some(ScraperError::Transport(err)) => Some(err),
            _ => None,
        }
    }

    /// Converts to a dictionary representation.
    #[must_use]
    pub fn to_dict(&self) -> HashMap<String, serde_json::Value> {
        let mut map = HashMap::new();
        map.insert("identity".to_string(), json!(self.identity));
        match &self.kind {
            LoginErrorKind::StepFailed { step } => {
                map.insert("type".to_string(), json!("StepFailed"));
                map.insert("step".to_string(), json!(step));
            }
            LoginErrorKind::NotRegisteredAfterLogin => {
                map.insert("type".to_string(), json!("NotRegisteredAfterLogin"));
            }
        }
        if let Some(ref cause) = self.cause {
            map.insert("cause".to_string(), json!(cause.to_string()));
        }
        map.insert("message".to_string(), json!(self.to_string()));
        map
    }
}

/// Error raised when an expected form, field or table is not found.
#[derive(Debug, Clone, Error)]
#[error("Parse error during '{step}': {message}")]
pub struct ParseError {
    /// Protocol step that read the page.
    pub step: String,
    /// What was missing or malformed.
    pub message: String,
}

impl ParseError {
    /// Creates a new parse error.
    #[must_use]
    pub fn new(step: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            step: step.into(),
            message: message.into(),
        }
    }
}

/// Error raised when a value object rejects its input.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("Invalid {field}: {message}")]
pub struct InputError {
    /// The rejected field.
    pub field: String,
    /// Why it was rejected.
    pub message: String,
}

impl InputError {
    /// Creates a new input error.
    #[must_use]
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Creates an error for a required value that was empty.
    #[must_use]
    pub fn empty(field: impl Into<String>) -> Self {
        Self::new(field, "value must not be empty")
    }
}

/// Errors from the signing credential.
#[derive(Debug, Error)]
pub enum CredentialError {
    /// The certificate validity window has ended.
    #[error("Credential expired at {valid_to}")]
    Expired {
        /// End of the validity window.
        valid_to: DateTime<Utc>,
    },

    /// The certificate validity window has not started yet.
    #[error("Credential not valid before {valid_from}")]
    NotYetValid {
        /// Start of the validity window.
        valid_from: DateTime<Utc>,
    },

    /// The private key failed to produce a signature.
    #[error(transparent)]
    Signer(#[from] anyhow::Error),
}
