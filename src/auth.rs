//! Request authentication
//!
//! Every request carries a `timestamp` header (`YYYY-MM-DDTHH:MM:SSZ`, UTC) and a
//! `signature` header:
//!
//! ```text
//! signature = base64(HMAC-SHA1(key = secret, message = service || operation || timestamp))
//! ```
//!
//! The signature never covers the path or body. A fresh pair is computed for
//! every request; the service rejects timestamps outside its clock-skew window.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use sha1::Sha1;
use std::fmt;

/// Service name mixed into every signature
pub const SERVICE_NAME: &str = "CloudCache";

/// strftime pattern for the `timestamp` header
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

type HmacSha1 = Hmac<Sha1>;

/// Format a UTC instant for the `timestamp` header
pub fn timestamp(now: DateTime<Utc>) -> String {
    now.format(TIMESTAMP_FORMAT).to_string()
}

/// Compute the request signature
pub fn signature(service: &str, operation: &str, timestamp: &str, secret: &str) -> String {
    let mut mac =
        HmacSha1::new_from_slice(secret.as_bytes()).expect("HMAC can take key of any size");
    mac.update(service.as_bytes());
    mac.update(operation.as_bytes());
    mac.update(timestamp.as_bytes());
    let digest = mac.finalize().into_bytes();

    // STANDARD never line-wraps, trim only guards the trailing-whitespace contract
    STANDARD.encode(digest).trim_end().to_string()
}

/// Access key / secret key pair
#[derive(Clone, PartialEq, Eq)]
pub struct Credential {
    pub access_key: String,
    pub secret_key: String,
}

impl Credential {
    pub fn new(access_key: impl Into<String>, secret_key: impl Into<String>) -> Self {
        Self {
            access_key: access_key.into(),
            secret_key: secret_key.into(),
        }
    }

    /// Produce `(timestamp, signature)` for one request
    pub fn sign(&self, operation: &str, now: DateTime<Utc>) -> (String, String) {
        let ts = timestamp(now);
        let sig = signature(SERVICE_NAME, operation, &ts, &self.secret_key);
        (ts, sig)
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("access_key", &self.access_key)
            .field("secret_key", &"<redacted>")
            .finish()
    }
}
