//! Prometheus metrics for CloudCache client requests

use prometheus::{Histogram, HistogramOpts, IntCounter, IntCounterVec, Opts, Registry};

/// Per-client request metrics
pub struct ClientMetrics {
    pub registry: Registry,

    // Requests by operation label (GET, PUT, auth, ...)
    pub requests: IntCounterVec,

    // Hit/miss counters for get, get_multi and exists
    pub get_hits: IntCounter,
    pub get_misses: IntCounter,

    // Errors by kind (auth, not_found, server, protocol, transport, ...)
    pub errors: IntCounterVec,

    // Bytes counters
    pub bytes_sent: IntCounter,
    pub bytes_received: IntCounter,

    // Latency histogram
    pub request_latency: Histogram,
}

impl ClientMetrics {
    /// Create a new metrics instance
    pub fn new() -> Self {
        let registry = Registry::new();

        let requests = IntCounterVec::new(
            Opts::new("cloudcache_requests_total", "Total requests sent"),
            &["operation"],
        )
        .unwrap();

        let get_hits = IntCounter::new("cloudcache_get_hits_total", "Total GET hits").unwrap();
        let get_misses =
            IntCounter::new("cloudcache_get_misses_total", "Total GET misses").unwrap();

        let errors = IntCounterVec::new(
            Opts::new("cloudcache_errors_total", "Total failed requests"),
            &["kind"],
        )
        .unwrap();

        let bytes_sent =
            IntCounter::new("cloudcache_bytes_sent_total", "Total body bytes sent").unwrap();
        let bytes_received = IntCounter::new(
            "cloudcache_bytes_received_total",
            "Total body bytes received",
        )
        .unwrap();

        let request_latency = Histogram::with_opts(
            HistogramOpts::new(
                "cloudcache_request_latency_seconds",
                "Request round-trip latency in seconds",
            )
            .buckets(vec![
                0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0,
            ]),
        )
        .unwrap();

        // Register all metrics
        registry.register(Box::new(requests.clone())).unwrap();
        registry.register(Box::new(get_hits.clone())).unwrap();
        registry.register(Box::new(get_misses.clone())).unwrap();
        registry.register(Box::new(errors.clone())).unwrap();
        registry.register(Box::new(bytes_sent.clone())).unwrap();
        registry.register(Box::new(bytes_received.clone())).unwrap();
        registry
            .register(Box::new(request_latency.clone()))
            .unwrap();

        Self {
            registry,
            requests,
            get_hits,
            get_misses,
            errors,
            bytes_sent,
            bytes_received,
            request_latency,
        }
    }

    /// Count one request for an operation label
    pub fn record_request(&self, label: &str) {
        self.requests.with_label_values(&[label]).inc();
    }

    /// Count one failure of the given kind
    pub fn record_error(&self, kind: &str) {
        self.errors.with_label_values(&[kind]).inc();
    }

    /// Get Prometheus formatted metrics
    pub fn gather(&self) -> String {
        use prometheus::Encoder;
        let encoder = prometheus::TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer).unwrap();
        String::from_utf8(buffer).unwrap()
    }
}

impl Default for ClientMetrics {
    fn default() -> Self {
        Self::new()
    }
}
