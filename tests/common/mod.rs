//! In-process CloudCache emulator for integration tests
//!
//! Serves the CloudCache HTTP surface on `127.0.0.1:0` from an in-memory map.
//! Every request has its signature checked against the single account the
//! emulator knows about; a mismatch is answered with 403.

#![allow(dead_code)]

use axum::{
    Form, Router,
    body::Bytes,
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use cloudcache::CacheClient;
use cloudcache::auth::{Credential, SERVICE_NAME, signature};
use cloudcache::config::EndpointConfig;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};
use tokio::net::TcpListener;

pub const ACCESS_KEY: &str = "AKEY";
pub const SECRET_KEY: &str = "secret";

struct Entry {
    data: Bytes,
    expires_at: Option<Instant>,
}

impl Entry {
    fn is_live(&self, now: Instant) -> bool {
        self.expires_at.is_none_or(|at| at > now)
    }
}

#[derive(Default)]
struct Inner {
    entries: Mutex<HashMap<String, Entry>>,
    requests: AtomicUsize,
    fail_with: Mutex<Option<u16>>,
    get_multi_reply: Mutex<Option<(u16, Bytes)>>,
}

/// Handle to a running emulator
#[derive(Clone, Default)]
pub struct Emulator {
    inner: Arc<Inner>,
    port: u16,
}

impl Emulator {
    /// Bind on an ephemeral port and start serving
    pub async fn start() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();

        let emulator = Emulator {
            inner: Arc::new(Inner::default()),
            port,
        };

        let app = Router::new()
            .route("/auth", get(handle_auth))
            .route("/getmulti", get(handle_get_multi))
            .route("/listkeys", get(handle_list_keys))
            .route("/myusage", get(handle_usage))
            .route("/flush", get(handle_flush))
            .route(
                "/:key",
                get(handle_get).put(handle_put).delete(handle_delete),
            )
            .route("/:key/:op", post(handle_counter))
            .with_state(emulator.clone());

        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        emulator
    }

    pub fn endpoint(&self) -> EndpointConfig {
        EndpointConfig {
            host: "127.0.0.1".to_string(),
            port: self.port,
            ..EndpointConfig::default()
        }
    }

    /// Client holding the emulator's credential
    pub fn client(&self) -> CacheClient {
        CacheClient::with_endpoint(Credential::new(ACCESS_KEY, SECRET_KEY), &self.endpoint())
            .unwrap()
    }

    /// Number of requests that reached a handler
    pub fn requests(&self) -> usize {
        self.inner.requests.load(Ordering::SeqCst)
    }

    /// Answer every following request with `status`
    pub fn fail_with(&self, status: u16) {
        *self.inner.fail_with.lock() = Some(status);
    }

    /// Answer `getmulti` with a canned status and body
    pub fn reply_to_get_multi(&self, status: u16, body: &'static [u8]) {
        *self.inner.get_multi_reply.lock() = Some((status, Bytes::from_static(body)));
    }

    /// Stored bytes for a key, ignoring expiry
    pub fn raw_entry(&self, key: &str) -> Option<Bytes> {
        self.inner.entries.lock().get(key).map(|e| e.data.clone())
    }

    /// Count the request, apply injected failures and check the signature
    fn admit(&self, headers: &HeaderMap, label: &str) -> Result<(), Response> {
        self.inner.requests.fetch_add(1, Ordering::SeqCst);

        if let Some(status) = *self.inner.fail_with.lock() {
            let status = StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
            return Err((status, "emulated failure").into_response());
        }

        let header = |name: &str| {
            headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .unwrap_or("")
                .to_string()
        };

        if header("akey") != ACCESS_KEY {
            return Err((StatusCode::FORBIDDEN, "unknown access key").into_response());
        }

        let expected = signature(SERVICE_NAME, label, &header("timestamp"), SECRET_KEY);
        if header("signature") != expected {
            return Err((StatusCode::FORBIDDEN, "signature mismatch").into_response());
        }

        Ok(())
    }

    fn live(&self, key: &str) -> Option<Bytes> {
        let now = Instant::now();
        let mut entries = self.inner.entries.lock();
        match entries.get(key) {
            Some(entry) if entry.is_live(now) => Some(entry.data.clone()),
            Some(_) => {
                entries.remove(key);
                None
            }
            None => None,
        }
    }
}

async fn handle_auth(State(emu): State<Emulator>, headers: HeaderMap) -> Response {
    if let Err(rejection) = emu.admit(&headers, "auth") {
        return rejection;
    }
    StatusCode::OK.into_response()
}

async fn handle_get(
    State(emu): State<Emulator>,
    Path(key): Path<String>,
    headers: HeaderMap,
) -> Response {
    if let Err(rejection) = emu.admit(&headers, "GET") {
        return rejection;
    }
    match emu.live(&key) {
        Some(data) => (StatusCode::OK, data).into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

async fn handle_put(
    State(emu): State<Emulator>,
    Path(key): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    if let Err(rejection) = emu.admit(&headers, "PUT") {
        return rejection;
    }

    let ttl: u64 = headers
        .get("ttl")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse().ok())
        .unwrap_or(0);
    let expires_at = (ttl > 0).then(|| Instant::now() + Duration::from_secs(ttl));

    emu.inner.entries.lock().insert(
        key,
        Entry {
            data: body,
            expires_at,
        },
    );
    StatusCode::OK.into_response()
}

async fn handle_delete(
    State(emu): State<Emulator>,
    Path(key): Path<String>,
    headers: HeaderMap,
) -> Response {
    if let Err(rejection) = emu.admit(&headers, "DELETE") {
        return rejection;
    }
    if emu.live(&key).is_none() {
        return StatusCode::NOT_FOUND.into_response();
    }
    emu.inner.entries.lock().remove(&key);
    StatusCode::OK.into_response()
}

async fn handle_get_multi(State(emu): State<Emulator>, headers: HeaderMap) -> Response {
    if let Err(rejection) = emu.admit(&headers, "GET") {
        return rejection;
    }

    if let Some((status, body)) = emu.inner.get_multi_reply.lock().clone() {
        let status = StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        return (status, body).into_response();
    }

    let keys: Vec<String> = match headers
        .get("keys")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| serde_json::from_str(v).ok())
    {
        Some(keys) => keys,
        None => return (StatusCode::BAD_REQUEST, "keys header required").into_response(),
    };

    let mut body = Vec::new();
    for key in &keys {
        if let Some(data) = emu.live(key) {
            body.extend_from_slice(format!("VALUE {} {}\r\n", key, data.len()).as_bytes());
            body.extend_from_slice(&data);
            body.extend_from_slice(b"\r\n");
        }
    }
    body.extend_from_slice(b"END\r\n");

    (StatusCode::OK, body).into_response()
}

async fn handle_counter(
    State(emu): State<Emulator>,
    Path((key, op)): Path<(String, String)>,
    headers: HeaderMap,
    Form(form): Form<HashMap<String, String>>,
) -> Response {
    if let Err(rejection) = emu.admit(&headers, "POST") {
        return rejection;
    }

    let Some(delta) = form.get("val").and_then(|v| v.parse::<i64>().ok()) else {
        return (StatusCode::BAD_REQUEST, "val required").into_response();
    };
    let initial = headers
        .get("x-cc-set-if-not-found")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<i64>().ok());

    let current = emu.live(&key);
    let mut entries = emu.inner.entries.lock();

    let value = match (current, initial) {
        (None, Some(initial)) => {
            entries.insert(
                key,
                Entry {
                    data: Bytes::from(initial.to_string()),
                    expires_at: None,
                },
            );
            return (StatusCode::OK, initial.to_string()).into_response();
        }
        (None, None) => return StatusCode::NOT_FOUND.into_response(),
        (Some(data), _) => match std::str::from_utf8(&data).ok().and_then(|s| s.parse::<i64>().ok()) {
            Some(value) => value,
            None => return (StatusCode::BAD_REQUEST, "not a number").into_response(),
        },
    };

    let next = match op.as_str() {
        "incr" => value + delta,
        "decr" => (value - delta).max(0),
        _ => return StatusCode::NOT_FOUND.into_response(),
    };

    if let Some(entry) = entries.get_mut(&key) {
        entry.data = Bytes::from(next.to_string());
    }
    (StatusCode::OK, next.to_string()).into_response()
}

async fn handle_list_keys(State(emu): State<Emulator>, headers: HeaderMap) -> Response {
    if let Err(rejection) = emu.admit(&headers, "listkeys") {
        return rejection;
    }
    let now = Instant::now();
    let mut keys: Vec<String> = emu
        .inner
        .entries
        .lock()
        .iter()
        .filter(|(_, e)| e.is_live(now))
        .map(|(k, _)| k.clone())
        .collect();
    keys.sort();
    (StatusCode::OK, serde_json::to_string(&keys).unwrap()).into_response()
}

async fn handle_usage(State(emu): State<Emulator>, headers: HeaderMap) -> Response {
    if let Err(rejection) = emu.admit(&headers, "myusage") {
        return rejection;
    }
    let used: usize = emu.inner.entries.lock().values().map(|e| e.data.len()).sum();
    (StatusCode::OK, used.to_string()).into_response()
}

async fn handle_flush(State(emu): State<Emulator>, headers: HeaderMap) -> Response {
    if let Err(rejection) = emu.admit(&headers, "flush") {
        return rejection;
    }
    emu.inner.entries.lock().clear();
    (StatusCode::OK, "[]").into_response()
}
