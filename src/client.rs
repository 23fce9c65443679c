//! CloudCache client
//!
//! [`CacheClient`] turns each call into exactly one signed HTTP exchange. The
//! timestamp and signature are computed fresh for every request; nothing is
//! cached or retried.
//!
//! Status handling:
//! - 404 on `get`, `get_multi` and `exists` becomes an absent result
//! - 404 on `delete` becomes `false`
//! - 404 on `increment`/`decrement` without `set_if_not_found` is [`CloudCacheError::NotFound`]
//! - 401/403 is [`CloudCacheError::Authentication`], every other non-2xx is
//!   [`CloudCacheError::Server`]

use crate::auth::Credential;
use crate::codec::{Encoding, ValueCodec};
use crate::config::{Config, EndpointConfig};
use crate::metrics::ClientMetrics;
use crate::protocol::{
    CounterOp, Operation, RequestBuilder, into_map, parse_bulk, parse_flush_ack, parse_integer,
    parse_key_list,
};
use crate::transport::{HttpTransport, RawResponse};
use crate::{CloudCacheError, Result};
use bytes::Bytes;
use chrono::Utc;
use parking_lot::RwLock;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, trace, warn};

/// Options accepted by [`CacheClient::fetch`]
///
/// Only the default value is supported; anything else is rejected.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FetchOptions {
    /// Ignore any cached value
    pub force: bool,
    /// Expiry to apply when populating on a miss
    pub expires_in: Option<u64>,
}

/// Client for one credential against one CloudCache endpoint
///
/// Calls may run concurrently from many tasks; each builds and signs its own
/// request. The secret key can be swapped at runtime with
/// [`set_secret_key`](Self::set_secret_key). The transport handle is released
/// by [`shutdown`](Self::shutdown), which needs exclusive access: callers that
/// share a client must finish their in-flight calls first.
pub struct CacheClient {
    credential: RwLock<Credential>,
    user_agent: String,
    transport: HttpTransport,
    metrics: Arc<ClientMetrics>,
}

impl CacheClient {
    /// Client against the default endpoint
    pub fn new(access_key: impl Into<String>, secret_key: impl Into<String>) -> Result<Self> {
        Self::with_endpoint(
            Credential::new(access_key, secret_key),
            &EndpointConfig::default(),
        )
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        Self::with_endpoint(config.credentials.to_credential(), &config.endpoint)
    }

    pub fn with_endpoint(credential: Credential, endpoint: &EndpointConfig) -> Result<Self> {
        let transport = HttpTransport::new(endpoint)?;
        info!(
            endpoint = %transport.base_url(),
            access_key = %credential.access_key,
            "Creating CloudCache client"
        );

        Ok(Self {
            credential: RwLock::new(credential),
            user_agent: endpoint.user_agent.clone(),
            transport,
            metrics: Arc::new(ClientMetrics::new()),
        })
    }

    pub fn access_key(&self) -> String {
        self.credential.read().access_key.clone()
    }

    /// Replace the secret used for signing subsequent requests
    pub fn set_secret_key(&self, secret_key: impl Into<String>) {
        self.credential.write().secret_key = secret_key.into();
    }

    pub fn metrics(&self) -> &Arc<ClientMetrics> {
        &self.metrics
    }

    pub fn is_closed(&self) -> bool {
        self.transport.is_closed()
    }

    /// Release the transport; later calls fail with [`CloudCacheError::TransportClosed`]
    pub fn shutdown(&mut self) {
        if self.transport.close() {
            info!("CloudCache client shut down");
        }
    }

    /// Check the credential against the service
    pub async fn auth(&self) -> Result<()> {
        self.execute(Operation::Auth).await.map(|_| ())
    }

    /// Store a value; `ttl` is in seconds and 0 means no expiration
    pub async fn put<T: Serialize + ?Sized>(
        &self,
        key: &str,
        value: &T,
        ttl: u64,
        encoding: Encoding,
    ) -> Result<()> {
        let data = ValueCodec::encode(value, encoding)?;
        self.execute(Operation::Put { key, data, ttl }).await?;
        Ok(())
    }

    /// Read and decode a value, `None` if the key does not exist
    pub async fn get<T: DeserializeOwned>(&self, key: &str, encoding: Encoding) -> Result<Option<T>> {
        match self.get_bytes(key).await? {
            Some(bytes) => Ok(Some(ValueCodec::decode(&bytes, encoding)?)),
            None => Ok(None),
        }
    }

    /// Read the stored bytes without decoding
    pub async fn get_bytes(&self, key: &str) -> Result<Option<Bytes>> {
        match self.execute(Operation::Get { key }).await {
            Ok(body) => {
                self.metrics.get_hits.inc();
                Ok(Some(body))
            }
            Err(CloudCacheError::NotFound) => {
                self.metrics.get_misses.inc();
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    /// Read a raw value as an integer
    pub async fn get_i(&self, key: &str) -> Result<Option<i64>> {
        match self.get_bytes(key).await? {
            Some(bytes) => Ok(Some(ValueCodec::decode(&bytes, Encoding::Raw)?)),
            None => Ok(None),
        }
    }

    /// Fetch several keys in one request; missing keys are omitted
    pub async fn get_multi<K, T>(&self, keys: &[K], encoding: Encoding) -> Result<HashMap<String, T>>
    where
        K: AsRef<str>,
        T: DeserializeOwned,
    {
        if keys.is_empty() {
            return Ok(HashMap::new());
        }

        let keys: Vec<&str> = keys.iter().map(|k| k.as_ref()).collect();
        let requested = keys.len();

        let body = match self.execute(Operation::GetMulti { keys }).await {
            Ok(body) => body,
            Err(CloudCacheError::NotFound) => {
                self.metrics.get_misses.inc_by(requested as u64);
                return Ok(HashMap::new());
            }
            Err(e) => return Err(e),
        };

        let blocks = parse_bulk(&body).inspect_err(|e| {
            self.metrics.record_error("protocol");
            warn!("Malformed getmulti response: {}", e);
        })?;
        trace!(requested, returned = blocks.len(), "getmulti decoded");

        let mut values = HashMap::with_capacity(blocks.len());
        for (key, payload) in into_map(blocks) {
            values.insert(key, ValueCodec::decode(&payload, encoding)?);
        }

        self.metrics.get_hits.inc_by(values.len() as u64);
        self.metrics
            .get_misses
            .inc_by(requested.saturating_sub(values.len()) as u64);

        Ok(values)
    }

    /// Simplified read; any non-default option is rejected
    pub async fn fetch<T: DeserializeOwned>(&self, key: &str, options: &FetchOptions) -> Result<Option<T>> {
        if *options != FetchOptions::default() {
            return Err(CloudCacheError::Unsupported(
                "options on fetch() are not supported".to_string(),
            ));
        }
        self.get(key, Encoding::Structured).await
    }

    /// Remove a key; `false` if it was already absent
    pub async fn delete(&self, key: &str) -> Result<bool> {
        match self.execute(Operation::Delete { key }).await {
            Ok(_) => Ok(true),
            Err(CloudCacheError::NotFound) => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// Pattern deletes are not offered by the service
    pub async fn delete_matched(&self, pattern: &str) -> Result<usize> {
        Err(CloudCacheError::Unsupported(format!(
            "delete_matched({pattern:?}) is not supported"
        )))
    }

    pub async fn exists(&self, key: &str) -> Result<bool> {
        Ok(self.get_bytes(key).await?.is_some())
    }

    /// Add `delta` to a counter
    ///
    /// With `set_if_not_found`, an absent counter is created at that value
    /// (and the value is returned); without it, an absent counter is
    /// [`CloudCacheError::NotFound`].
    pub async fn increment(&self, key: &str, delta: i64, set_if_not_found: Option<i64>) -> Result<i64> {
        self.counter(CounterOp::Incr, key, delta, set_if_not_found)
            .await
    }

    /// Subtract `delta` from a counter; never reports a value below zero
    pub async fn decrement(&self, key: &str, delta: i64, set_if_not_found: Option<i64>) -> Result<i64> {
        let value = self
            .counter(CounterOp::Decr, key, delta, set_if_not_found)
            .await?;
        // Floor at zero is observed service behaviour, not a documented contract
        if value < 0 {
            warn!(key, value, "Service returned a negative counter, clamping to 0");
        }
        Ok(value.max(0))
    }

    async fn counter(
        &self,
        op: CounterOp,
        key: &str,
        delta: i64,
        set_if_not_found: Option<i64>,
    ) -> Result<i64> {
        let body = self
            .execute(Operation::Counter {
                op,
                key,
                delta,
                set_if_not_found,
            })
            .await?;
        parse_integer(&body)
    }

    pub async fn list_keys(&self) -> Result<Vec<String>> {
        let body = self.execute(Operation::ListKeys).await?;
        parse_key_list(&body)
    }

    /// Resource-usage counter for this credential's namespace
    pub async fn stats(&self) -> Result<i64> {
        let body = self.execute(Operation::Usage).await?;
        parse_integer(&body)
    }

    pub async fn usage(&self) -> Result<i64> {
        self.stats().await
    }

    /// Remove every key owned by this credential; returns the service acknowledgment (`[]`)
    pub async fn flush(&self) -> Result<String> {
        let body = self.execute(Operation::Flush).await?;
        parse_flush_ack(&body)
    }

    pub async fn clear(&self) -> Result<String> {
        self.flush().await
    }

    /// Sign, send and classify one request
    async fn execute(&self, operation: Operation<'_>) -> Result<Bytes> {
        let request = {
            let credential = self.credential.read();
            RequestBuilder::new(&credential, &self.user_agent).build(operation, Utc::now())?
        };

        self.metrics.record_request(request.label);
        self.metrics.bytes_sent.inc_by(request.body_len() as u64);

        let start = Instant::now();
        let result = self.transport.send(&request).await;
        let elapsed = start.elapsed();
        self.metrics.request_latency.observe(elapsed.as_secs_f64());

        let response = result.inspect_err(|e| {
            self.metrics.record_error("transport");
            warn!(operation = request.label, path = %request.path(), "Transport failure: {}", e);
        })?;
        self.metrics.bytes_received.inc_by(response.body.len() as u64);

        debug!(
            method = request.method.as_str(),
            path = %request.path(),
            operation = request.label,
            status = response.status,
            elapsed_ms = elapsed.as_millis() as u64,
            "CloudCache request"
        );

        let outcome = check_status(response);
        match &outcome {
            Ok(_) => {}
            Err(CloudCacheError::NotFound) => self.metrics.record_error("not_found"),
            Err(e @ CloudCacheError::Authentication { .. }) => {
                self.metrics.record_error("auth");
                warn!(operation = request.label, "{}", e);
            }
            Err(e) => {
                self.metrics.record_error("server");
                warn!(operation = request.label, path = %request.path(), "{}", e);
            }
        }
        outcome
    }
}

/// Map a response status onto the error taxonomy
fn check_status(response: RawResponse) -> Result<Bytes> {
    if response.is_success() {
        return Ok(response.body);
    }
    match response.status {
        404 => Err(CloudCacheError::NotFound),
        status @ (401 | 403) => Err(CloudCacheError::Authentication {
            status,
            body: response.body_text(),
        }),
        status => Err(CloudCacheError::Server {
            status,
            body: response.body_text(),
        }),
    }
}
