//! Signing credential used by the certificate login.
//!
//! Loading and parsing certificates and private keys is left to the caller:
//! anything that can expose the certificate attributes and sign bytes can
//! implement [`Credential`].

use chrono::{DateTime, Utc};
use std::fmt;
use std::sync::Arc;

use crate::errors::CredentialError;

/// Digest used when signing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SignatureAlgorithm {
    /// SHA-1 with RSA, required by the certificate challenge.
    Sha1,
    /// SHA-256 with RSA.
    Sha256,
}

impl fmt::Display for SignatureAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sha1 => write!(f, "sha1"),
            Self::Sha256 => write!(f, "sha256"),
        }
    }
}

/// A certificate plus the private key that signs for it.
pub trait Credential: Send + Sync {
    /// Subject id (RFC) of the certificate owner.
    fn rfc(&self) -> &str;

    /// Certificate serial number, as the portal expects it.
    fn serial_number(&self) -> &str;

    /// Start of the certificate validity window.
    fn valid_from(&self) -> DateTime<Utc>;

    /// End of the certificate validity window.
    fn valid_to(&self) -> DateTime<Utc>;

    /// Signs `data` with the private key.
    fn sign(&self, data: &[u8], algorithm: SignatureAlgorithm) -> anyhow::Result<Vec<u8>>;
}

/// Identity data for a certificate session.
///
/// Guards the credential so it is never used to sign outside its validity
/// window.
#[derive(Clone)]
pub struct FielSessionData {
    credential: Arc<dyn Credential>,
}

impl fmt::Debug for FielSessionData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FielSessionData")
            .field("rfc", &self.rfc())
            .field("serial_number", &self.serial_number())
            .field("valid_to", &self.credential.valid_to())
            .finish()
    }
}

impl FielSessionData {
    /// Wraps a credential.
    #[must_use]
    pub fn new(credential: Arc<dyn Credential>) -> Self {
        Self { credential }
    }

    /// Subject id (RFC).
    #[must_use]
    pub fn rfc(&self) -> &str {
        self.credential.rfc()
    }

    /// Certificate serial number.
    #[must_use]
    pub fn serial_number(&self) -> &str {
        self.credential.serial_number()
    }

    /// End of the validity window in ASN.1 `UTCTime` form (`yymmddHHMMSSZ`).
    #[must_use]
    pub fn valid_to_timestamp(&self) -> String {
        self.credential.valid_to().format("%y%m%d%H%M%SZ").to_string()
    }

    /// Whether the certificate is valid at `at`.
    #[must_use]
    pub fn is_valid_at(&self, at: DateTime<Utc>) -> bool {
        self.credential.valid_from() <= at && at <= self.credential.valid_to()
    }

    /// Signs `data` now.
    pub fn sign(&self, data: &[u8], algorithm: SignatureAlgorithm) -> Result<Vec<u8>, CredentialError> {
        self.sign_at(data, algorithm, Utc::now())
    }

    /// Signs `data` as of `at`, refusing outside the validity window.
    pub fn sign_at(
        &self,
        data: &[u8],
        algorithm: SignatureAlgorithm,
        at: DateTime<Utc>,
    ) -> Result<Vec<u8>, CredentialError> {
        if at > self.credential.valid_to() {
            return Err(CredentialError::Expired {
                valid_to: self.credential.valid_to(),
            });
        }
        if at < self.credential.valid_from() {
            return Err(CredentialError::NotYetValid {
                valid_from: self.credential.valid_from(),
            });
        }
        Ok(self.credential.sign(data, algorithm)?)
    }
}
