//! Signed request assembly

use crate::ProtocolError;
use crate::auth::Credential;
use crate::protocol::command::{Method, Operation};
use bytes::Bytes;
use chrono::{DateTime, Utc};
use itoa::Buffer;

/// Default `User-Agent` header value
pub const USER_AGENT: &str = concat!("CloudCache Rust Client ", env!("CARGO_PKG_VERSION"));

pub const SIGNATURE_HEADER: &str = "signature";
pub const TIMESTAMP_HEADER: &str = "timestamp";
pub const ACCESS_KEY_HEADER: &str = "akey";
pub const TTL_HEADER: &str = "ttl";
pub const KEYS_HEADER: &str = "keys";
pub const SET_IF_NOT_FOUND_HEADER: &str = "x-cc-set-if-not-found";

/// Form field carrying the counter delta
pub const VAL_FIELD: &str = "val";

/// A fully signed outbound request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedRequest {
    pub method: Method,
    /// Unencoded path segments; the transport percent-encodes each one
    pub path: Vec<String>,
    /// Operation label the signature was computed over
    pub label: &'static str,
    /// Ordered, unique header names
    pub headers: Vec<(String, String)>,
    pub body: Option<Bytes>,
    pub form_fields: Option<Vec<(String, String)>>,
}

impl SignedRequest {
    /// Look up a header (names compare case-insensitively)
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Insert a header, replacing any existing value under the same name
    pub fn set_header(&mut self, name: &str, value: impl Into<String>) {
        let value = value.into();
        match self
            .headers
            .iter_mut()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
        {
            Some(slot) => slot.1 = value,
            None => self.headers.push((name.to_string(), value)),
        }
    }

    /// Path as it reads before percent-encoding, e.g. `hits/incr`
    pub fn path(&self) -> String {
        self.path.join("/")
    }

    /// Number of payload bytes this request carries
    pub fn body_len(&self) -> usize {
        self.body.as_ref().map_or(0, Bytes::len)
    }
}

/// Builds [`SignedRequest`]s for one credential
pub struct RequestBuilder<'a> {
    credential: &'a Credential,
    user_agent: &'a str,
}

impl<'a> RequestBuilder<'a> {
    pub fn new(credential: &'a Credential, user_agent: &'a str) -> Self {
        Self {
            credential,
            user_agent,
        }
    }

    /// Sign `operation` at instant `now`
    pub fn build(&self, operation: Operation<'_>, now: DateTime<Utc>) -> Result<SignedRequest, ProtocolError> {
        operation.validate()?;

        let label = operation.label();
        let (timestamp, signature) = self.credential.sign(label, now);

        let mut request = SignedRequest {
            method: operation.method(),
            path: operation
                .path_segments()
                .into_iter()
                .map(str::to_string)
                .collect(),
            label,
            headers: Vec::with_capacity(6),
            body: None,
            form_fields: None,
        };

        request.set_header("User-Agent", self.user_agent);
        request.set_header(SIGNATURE_HEADER, signature);
        request.set_header(TIMESTAMP_HEADER, timestamp);
        request.set_header(ACCESS_KEY_HEADER, self.credential.access_key.as_str());

        let mut num = Buffer::new();
        match operation {
            Operation::Put { data, ttl, .. } => {
                if ttl > 0 {
                    request.set_header(TTL_HEADER, num.format(ttl));
                }
                request.body = Some(data);
            }
            Operation::GetMulti { keys } => {
                let json = serde_json::to_string(&keys)
                    .map_err(|_| ProtocolError::InvalidHeader(KEYS_HEADER.to_string()))?;
                request.set_header(KEYS_HEADER, json);
            }
            Operation::Counter {
                delta,
                set_if_not_found,
                ..
            } => {
                request.form_fields = Some(vec![(VAL_FIELD.to_string(), num.format(delta).to_string())]);
                if let Some(initial) = set_if_not_found {
                    request.set_header(SET_IF_NOT_FOUND_HEADER, num.format(initial));
                }
            }
            Operation::Auth
            | Operation::Get { .. }
            | Operation::Delete { .. }
            | Operation::ListKeys
            | Operation::Usage
            | Operation::Flush => {}
        }

        Ok(request)
    }
}
