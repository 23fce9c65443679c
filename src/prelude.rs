//! Prelude module for common imports.
//!
//! This module re-exports commonly used types and traits for convenience.
//!
//! # Usage
//!
//! ```ignore
//! use cloudcache::prelude::*;
//! ```

// Error types
pub use crate::error::{CloudCacheError, CodecError, ProtocolError, Result};

// Configuration
pub use crate::config::{Config, CredentialConfig, EndpointConfig};

// Client
pub use crate::auth::Credential;
pub use crate::client::{CacheClient, FetchOptions};
pub use crate::codec::{Encoding, ValueCodec};

// Protocol
pub use crate::protocol::{Operation, SignedRequest, WireBlock};

// Metrics
pub use crate::metrics::ClientMetrics;

// Common external crates
pub use std::sync::Arc;
pub use tracing::{debug, error, info, trace, warn};
