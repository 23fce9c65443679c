//! Error types for the CloudCache client

use thiserror::Error;

/// Main error type for the CloudCache client
#[derive(Error, Debug)]
pub enum CloudCacheError {
    /// Bad signature or a timestamp outside the service's clock-skew window
    #[error("Authentication failed ({status}): {body}")]
    Authentication { status: u16, body: String },

    #[error("Key not found")]
    NotFound,

    #[error("Server error ({status}): {body}")]
    Server { status: u16, body: String },

    /// A 2xx response whose body could not be decoded where content was expected
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    #[error("Codec error: {0}")]
    Codec(#[from] CodecError),

    #[error("Unsupported operation: {0}")]
    Unsupported(String),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Transport already closed")]
    TransportClosed,

    #[error("Configuration error: {0}")]
    Config(String),
}

impl CloudCacheError {
    /// HTTP status carried by the error, if the service answered at all
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Authentication { status, .. } | Self::Server { status, .. } => Some(*status),
            Self::NotFound => Some(404),
            _ => None,
        }
    }

    /// True for the server-error family: non-2xx statuses and undecodable bodies
    pub fn is_server_error(&self) -> bool {
        matches!(self, Self::Server { .. } | Self::InvalidResponse(_))
    }
}

impl From<reqwest::Error> for CloudCacheError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_connect() {
            Self::Transport(format!("connection failed: {error}"))
        } else if error.is_timeout() {
            Self::Transport(format!("request timed out: {error}"))
        } else {
            Self::Transport(error.to_string())
        }
    }
}

/// Wire-level errors: request shape and bulk-fetch framing
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    #[error("Invalid key: {0:?}")]
    InvalidKey(String),

    #[error("Invalid header value for {0}")]
    InvalidHeader(String),

    #[error("Malformed VALUE line: {0:?}")]
    MalformedValueLine(String),

    #[error("Invalid declared length in VALUE line: {0:?}")]
    InvalidDeclaredLength(String),

    /// Payload bytes seen before any `VALUE` marker opened a block
    #[error("Payload line outside of any VALUE block: {0:?}")]
    OrphanPayload(String),
}

/// Value encoding/decoding errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    #[error("Structured encoding failed: {0}")]
    Encode(String),

    #[error("Structured decoding failed: {0}")]
    Decode(String),

    #[error("Raw mode only supports scalar values, got {0}")]
    NotScalar(&'static str),

    #[error("Raw value is not valid UTF-8")]
    NotUtf8,

    #[error("Raw value is not a valid {0}: {1:?}")]
    InvalidScalar(&'static str, String),

    #[error("{0}")]
    Custom(String),
}

impl serde::ser::Error for CodecError {
    fn custom<T: std::fmt::Display>(msg: T) -> Self {
        Self::Custom(msg.to_string())
    }
}

impl serde::de::Error for CodecError {
    fn custom<T: std::fmt::Display>(msg: T) -> Self {
        Self::Custom(msg.to_string())
    }
}

pub type Result<T> = std::result::Result<T, CloudCacheError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status() {
        let err = CloudCacheError::Server {
            status: 500,
            body: "boom".to_string(),
        };
        assert_eq!(err.status(), Some(500));
        assert!(err.is_server_error());

        assert_eq!(CloudCacheError::NotFound.status(), Some(404));
        assert!(!CloudCacheError::NotFound.is_server_error());
        assert!(CloudCacheError::InvalidResponse("empty".into()).is_server_error());
        assert_eq!(CloudCacheError::TransportClosed.status(), None);
    }

    #[test]
    fn test_protocol_error_converts() {
        let err: CloudCacheError = ProtocolError::OrphanPayload("x".into()).into();
        assert!(matches!(err, CloudCacheError::Protocol(_)));
    }
}
