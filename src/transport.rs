//! HTTP transport
//!
//! Owns the long-lived `reqwest` client for one [`CacheClient`](crate::CacheClient).
//! The handle is acquired on construction and released exactly once by
//! [`HttpTransport::close`]. No retries and no timeout beyond the configured one.

use crate::config::EndpointConfig;
use crate::protocol::{Method, SignedRequest};
use crate::{CloudCacheError, Result};
use bytes::Bytes;
use reqwest::header::CONTENT_TYPE;
use std::time::Duration;
use tracing::debug;
use url::Url;

const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// Status and body of one exchange
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    pub status: u16,
    pub body: Bytes,
}

impl RawResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Body as text for error messages
    pub fn body_text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// HTTP transport bound to one service endpoint
pub struct HttpTransport {
    base_url: Url,
    client: Option<reqwest::Client>,
}

impl HttpTransport {
    /// Build the underlying HTTP client for an endpoint
    pub fn new(endpoint: &EndpointConfig) -> Result<Self> {
        let base_url = endpoint.base_url()?;

        let mut builder = reqwest::Client::builder();
        if endpoint.timeout_secs > 0 {
            builder = builder.timeout(Duration::from_secs(endpoint.timeout_secs));
        }

        let client = builder
            .build()
            .map_err(|e| CloudCacheError::Transport(format!("Failed to build HTTP client: {e}")))?;

        debug!(base_url = %base_url, "HTTP transport ready");

        Ok(Self {
            base_url,
            client: Some(client),
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn is_closed(&self) -> bool {
        self.client.is_none()
    }

    /// Full URL for a request; every path segment is percent-encoded
    pub fn url_for(&self, request: &SignedRequest) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| CloudCacheError::Config(format!("{} cannot carry a path", self.base_url)))?
            .pop_if_empty()
            .extend(&request.path);
        Ok(url)
    }

    /// Perform one request/response exchange
    pub async fn send(&self, request: &SignedRequest) -> Result<RawResponse> {
        let client = self.client.as_ref().ok_or(CloudCacheError::TransportClosed)?;
        let url = self.url_for(request)?;

        let method = match request.method {
            Method::Get => reqwest::Method::GET,
            Method::Put => reqwest::Method::PUT,
            Method::Post => reqwest::Method::POST,
            Method::Delete => reqwest::Method::DELETE,
        };

        let mut builder = client.request(method, url);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        if let Some(body) = &request.body {
            builder = builder.body(body.clone());
        }

        if let Some(fields) = &request.form_fields {
            let encoded = url::form_urlencoded::Serializer::new(String::new())
                .extend_pairs(fields.iter())
                .finish();
            builder = builder.header(CONTENT_TYPE, FORM_CONTENT_TYPE).body(encoded);
        }

        let response = builder.send().await?;
        let status = response.status().as_u16();
        let body = response.bytes().await?;

        Ok(RawResponse { status, body })
    }

    /// Release the HTTP client; returns false if it was already released
    pub fn close(&mut self) -> bool {
        self.client.take().is_some()
    }
}
