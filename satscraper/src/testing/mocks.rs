//! Test doubles for the gateway and the credential.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::credential::{Credential, SignatureAlgorithm};
use crate::errors::TransportError;
use crate::http::{FormFields, Headers, HttpGateway};

/// A request seen by [`ScriptedGateway`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordedRequest {
    /// A GET request.
    Get {
        /// Requested URL.
        url: String,
        /// Request headers.
        headers: Headers,
    },
    /// A POST request.
    Post {
        /// Requested URL.
        url: String,
        /// Submitted form.
        form: FormFields,
        /// Request headers.
        headers: Headers,
    },
}

impl RecordedRequest {
    /// HTTP method name.
    #[must_use]
    pub fn method(&self) -> &'static str {
        match self {
            Self::Get { .. } => "GET",
            Self::Post { .. } => "POST",
        }
    }

    /// Requested URL.
    #[must_use]
    pub fn url(&self) -> &str {
        match self {
            Self::Get { url, .. } | Self::Post { url, .. } => url,
        }
    }

    /// A request header value.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        match self {
            Self::Get { headers, .. } | Self::Post { headers, .. } => {
                headers.get(name).map(String::as_str)
            }
        }
    }

    /// Submitted form, for POST requests.
    #[must_use]
    pub fn form(&self) -> Option<&FormFields> {
        match self {
            Self::Get { .. } => None,
            Self::Post { form, .. } => Some(form),
        }
    }
}

/// A gateway that replays canned responses in order and records every
/// request it receives.
///
/// Running out of responses is reported as a transport error.
#[derive(Debug)]
pub struct ScriptedGateway {
    responses: Mutex<VecDeque<Result<String, String>>>,
    requests: Mutex<Vec<RecordedRequest>>,
    cookie_jar_empty: AtomicBool,
}

impl Default for ScriptedGateway {
    fn default() -> Self {
        Self::new()
    }
}

impl ScriptedGateway {
    /// Creates a gateway with no responses and an empty cookie store.
    #[must_use]
    pub fn new() -> Self {
        Self {
            responses: Mutex::new(VecDeque::new()),
            requests: Mutex::new(Vec::new()),
            cookie_jar_empty: AtomicBool::new(true),
        }
    }

    /// Queues a response body.
    #[must_use]
    pub fn with_response(self, body: impl Into<String>) -> Self {
        self.push_response(body);
        self
    }

    /// Queues a transport failure.
    #[must_use]
    pub fn with_error(self, message: impl Into<String>) -> Self {
        self.responses.lock().push_back(Err(message.into()));
        self
    }

    /// Pretends the cookie store holds a session.
    #[must_use]
    pub fn with_cookies(self) -> Self {
        self.cookie_jar_empty.store(false, Ordering::SeqCst);
        self
    }

    /// Queues a response body on a shared gateway.
    pub fn push_response(&self, body: impl Into<String>) {
        self.responses.lock().push_back(Ok(body.into()));
    }

    /// Returns every request received so far.
    #[must_use]
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().clone()
    }

    /// Returns the number of requests received.
    #[must_use]
    pub fn request_count(&self) -> usize {
        self.requests.lock().len()
    }

    /// Returns the number of responses not consumed yet.
    #[must_use]
    pub fn remaining_responses(&self) -> usize {
        self.responses.lock().len()
    }

    fn respond(&self, request: RecordedRequest) -> Result<String, TransportError> {
        let url = request.url().to_string();
        self.requests.lock().push(request);
        match self.responses.lock().pop_front() {
            Some(Ok(body)) => Ok(body),
            Some(Err(message)) => Err(TransportError::new(url, message)),
            None => Err(TransportError::new(url, "no scripted response left")),
        }
    }
}

#[async_trait]
impl HttpGateway for ScriptedGateway {
    async fn get(&self, url: &str, headers: &Headers) -> Result<String, TransportError> {
        self.respond(RecordedRequest::Get {
            url: url.to_string(),
            headers: headers.clone(),
        })
    }

    async fn post(
        &self,
        url: &str,
        form: &FormFields,
        headers: &Headers,
    ) -> Result<String, TransportError> {
        self.respond(RecordedRequest::Post {
            url: url.to_string(),
            form: form.clone(),
            headers: headers.clone(),
        })
    }

    fn is_cookie_jar_empty(&self) -> bool {
        self.cookie_jar_empty.load(Ordering::SeqCst)
    }
}

/// A credential with fixed attributes that "signs" by returning a fixed
/// byte string and remembers what it was asked to sign.
#[derive(Debug)]
pub struct StaticCredential {
    rfc: String,
    serial_number: String,
    valid_from: DateTime<Utc>,
    valid_to: DateTime<Utc>,
    signature: Vec<u8>,
    failure: Option<String>,
    signed: Mutex<Vec<(Vec<u8>, SignatureAlgorithm)>>,
}

impl StaticCredential {
    /// Creates a credential valid from a year ago until a year from now.
    #[must_use]
    pub fn new(rfc: impl Into<String>, serial_number: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            rfc: rfc.into(),
            serial_number: serial_number.into(),
            valid_from: now - Duration::days(365),
            valid_to: now + Duration::days(365),
            signature: b"static-signature".to_vec(),
            failure: None,
            signed: Mutex::new(Vec::new()),
        }
    }

    /// Sets the start of the validity window.
    #[must_use]
    pub fn with_valid_from(mut self, valid_from: DateTime<Utc>) -> Self {
        self.valid_from = valid_from;
        self
    }

    /// Sets the end of the validity window.
    #[must_use]
    pub fn with_valid_to(mut self, valid_to: DateTime<Utc>) -> Self {
        self.valid_to = valid_to;
        self
    }

    /// Sets the signature returned by [`Credential::sign`].
    #[must_use]
    pub fn with_signature(mut self, signature: impl Into<Vec<u8>>) -> Self {
        self.signature = signature.into();
        self
    }

    /// Makes every signing attempt fail with `message`.
    #[must_use]
    pub fn failing(mut self, message: impl Into<String>) -> Self {
        self.failure = Some(message.into());
        self
    }

    /// The signature returned on success.
    #[must_use]
    pub fn signature(&self) -> &[u8] {
        &self.signature
    }

    /// Payloads passed to [`Credential::sign`], as text.
    #[must_use]
    pub fn signed_payloads(&self) -> Vec<String> {
        self.signed
            .lock()
            .iter()
            .map(|(data, _)| String::from_utf8_lossy(data).into_owned())
            .collect()
    }

    /// Algorithms passed to [`Credential::sign`].
    #[must_use]
    pub fn signed_algorithms(&self) -> Vec<SignatureAlgorithm> {
        self.signed.lock().iter().map(|(_, algorithm)| *algorithm).collect()
    }
}

impl Credential for StaticCredential {
    fn rfc(&self) -> &str {
        &self.rfc
    }

    fn serial_number(&self) -> &str {
        &self.serial_number
    }

    fn valid_from(&self) -> DateTime<Utc> {
        self.valid_from
    }

    fn valid_to(&self) -> DateTime<Utc> {
        self.valid_to
    }

    fn sign(&self, data: &[u8], algorithm: SignatureAlgorithm) -> anyhow::Result<Vec<u8>> {
        self.signed.lock().push((data.to_vec(), algorithm));
        if let Some(ref message) = self.failure {
            anyhow::bail!("{message}");
        }
        Ok(self.signature.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_scripted_gateway_replays_in_order() {
        let gateway = ScriptedGateway::new().with_response("one").with_error("down");

        assert_eq!(gateway.get("https://a", &Headers::new()).await.unwrap(), "one");
        let err = gateway
            .post("https://b", &FormFields::new(), &Headers::new())
            .await
            .unwrap_err();
        assert_eq!(err.url, "https://b");
        assert!(gateway.get("https://c", &Headers::new()).await.is_err());

        let methods: Vec<_> = gateway.requests().iter().map(RecordedRequest::method).collect();
        assert_eq!(methods, vec!["GET", "POST", "GET"]);
        assert_eq!(gateway.remaining_responses(), 0);
    }

    #[test]
    fn test_shared_gateway_accepts_late_responses() {
        let gateway = ScriptedGateway::new();
        assert!(gateway.is_cookie_jar_empty());

        gateway.push_response("late");
        let body = tokio_test::block_on(gateway.get("https://a", &Headers::new())).unwrap();

        assert_eq!(body, "late");
        assert_eq!(gateway.request_count(), 1);
        assert!(!ScriptedGateway::new().with_cookies().is_cookie_jar_empty());
    }

    #[test]
    fn test_static_credential_records_signing() {
        let credential = StaticCredential::new("AAA010101AAA", "1").with_signature(b"sig".to_vec());

        assert_eq!(credential.sign(b"data", SignatureAlgorithm::Sha1).unwrap(), b"sig");
        assert_eq!(credential.signed_payloads(), vec!["data".to_string()]);
        assert_eq!(credential.signed_algorithms(), vec![SignatureAlgorithm::Sha1]);
    }
}
