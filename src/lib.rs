//! # CloudCache
//!
//! Client for the CloudCache hosted key/value cache service.
//!
//! ## Features
//!
//! - Signed requests (timestamp + HMAC-SHA1 signature over service, operation and timestamp)
//! - get / put / delete / exists with optional ttl
//! - Bulk fetch over the marker-delimited `VALUE ... END` wire format
//! - Raw or structured (DAG-CBOR) value encoding, chosen per call
//! - Counters with optional create-if-absent semantics
//! - Key listing, usage counter and flush
//! - Prometheus metrics for every request
//!
//! ## Example
//!
//! ```ignore
//! use cloudcache::{CacheClient, Encoding};
//!
//! let client = CacheClient::new("ACCESS_KEY", "SECRET_KEY")?;
//! client.put("greeting", "hello", 0, Encoding::Structured).await?;
//! let value: Option<String> = client.get("greeting", Encoding::Structured).await?;
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐   ┌──────────────────┐   ┌───────────────┐   ┌────────────────┐
//! │ CacheClient  │──▶│ RequestBuilder   │──▶│ HttpTransport │──▶│ CloudCache     │
//! │ (get/put/..) │   │  + signature     │   │ (reqwest)     │   │ service (HTTP) │
//! └──────┬───────┘   └──────────────────┘   └───────┬───────┘   └────────────────┘
//!        │                                          │
//!        ▼                                          ▼
//! ┌──────────────┐                          ┌───────────────┐
//! │ ValueCodec   │◀─────────────────────────│ ResponseParser│
//! │ raw / cbor   │                          │ VALUE..END    │
//! └──────────────┘                          └───────────────┘
//! ```

// Modules
pub mod auth;
pub mod client;
pub mod codec;
pub mod config;
pub mod error;
pub mod metrics;
pub mod prelude;
pub mod protocol;
pub mod transport;

// Re-exports for convenience
pub use client::{CacheClient, FetchOptions};
pub use codec::{Encoding, ValueCodec};
pub use error::{CloudCacheError, CodecError, ProtocolError, Result};
