//! CloudCache operation descriptors
//!
//! Each [`Operation`] knows its HTTP method, its path, and the label that goes
//! into the request signature.

use crate::ProtocolError;
use bytes::Bytes;

/// HTTP methods used by the protocol
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Put,
    Post,
    Delete,
}

impl Method {
    pub fn as_str(self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Put => "PUT",
            Method::Post => "POST",
            Method::Delete => "DELETE",
        }
    }
}

/// Which way a counter moves
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CounterOp {
    Incr,
    Decr,
}

impl CounterOp {
    pub fn as_str(self) -> &'static str {
        match self {
            CounterOp::Incr => "incr",
            CounterOp::Decr => "decr",
        }
    }
}

/// One CloudCache operation, before signing
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operation<'a> {
    /// GET auth
    Auth,

    /// PUT <key> [ttl]
    Put { key: &'a str, data: Bytes, ttl: u64 },

    /// GET <key>
    Get { key: &'a str },

    /// GET getmulti, keys=<json>
    GetMulti { keys: Vec<&'a str> },

    /// DELETE <key>
    Delete { key: &'a str },

    /// POST <key>/incr or <key>/decr
    Counter {
        op: CounterOp,
        key: &'a str,
        delta: i64,
        set_if_not_found: Option<i64>,
    },

    /// GET listkeys
    ListKeys,

    /// GET myusage
    Usage,

    /// GET flush
    Flush,
}

impl Operation<'_> {
    pub fn method(&self) -> Method {
        match self {
            Operation::Put { .. } => Method::Put,
            Operation::Delete { .. } => Method::Delete,
            Operation::Counter { .. } => Method::Post,
            Operation::Auth
            | Operation::Get { .. }
            | Operation::GetMulti { .. }
            | Operation::ListKeys
            | Operation::Usage
            | Operation::Flush => Method::Get,
        }
    }

    /// Operation label covered by the signature
    pub fn label(&self) -> &'static str {
        match self {
            Operation::Auth => "auth",
            Operation::ListKeys => "listkeys",
            Operation::Usage => "myusage",
            Operation::Flush => "flush",
            _ => self.method().as_str(),
        }
    }

    /// Unencoded path segments below the service root
    pub fn path_segments(&self) -> Vec<&str> {
        match self {
            Operation::Auth => vec!["auth"],
            Operation::GetMulti { .. } => vec!["getmulti"],
            Operation::ListKeys => vec!["listkeys"],
            Operation::Usage => vec!["myusage"],
            Operation::Flush => vec!["flush"],
            Operation::Put { key, .. } | Operation::Get { key } | Operation::Delete { key } => {
                vec![*key]
            }
            Operation::Counter { op, key, .. } => vec![*key, op.as_str()],
        }
    }

    /// The single key this operation addresses, if any
    pub fn key(&self) -> Option<&str> {
        match self {
            Operation::Put { key, .. }
            | Operation::Get { key }
            | Operation::Delete { key }
            | Operation::Counter { key, .. } => Some(*key),
            _ => None,
        }
    }

    /// Check every key the operation carries
    pub fn validate(&self) -> Result<(), ProtocolError> {
        if let Operation::GetMulti { keys } = self {
            return keys.iter().try_for_each(|k| validate_key(k));
        }
        match self.key() {
            Some(key) => validate_key(key),
            None => Ok(()),
        }
    }
}

/// Check if a key is valid
///
/// Keys travel as a single URL path segment: `/` would split it and the dot
/// segments `.` and `..` are collapsed by URL normalisation.
pub fn is_valid_key(key: &str) -> bool {
    !key.is_empty()
        && key != "."
        && key != ".."
        && !key.contains('/')
        && !key.chars().any(char::is_control)
}

pub fn validate_key(key: &str) -> Result<(), ProtocolError> {
    if is_valid_key(key) {
        Ok(())
    } else {
        Err(ProtocolError::InvalidKey(key.to_string()))
    }
}
