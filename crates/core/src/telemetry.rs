//! Telemetry for the Citegate gateway.
//!
//! An explicitly constructed [`Telemetry`] handle owns a private Prometheus
//! registry and every metric the pipeline records. The handle is created once
//! at process start and shared via `Arc`; there is no process-global registry.
//!
//! Recording is a side channel: once the handle exists, nothing here can fail
//! a request. Latency is captured with a drop-guard timer so partial
//! pipelines still report the latency they incurred.

use prometheus::{
    Encoder, Gauge, Histogram, HistogramOpts, IntCounterVec, Opts, Registry, TextEncoder,
};
use std::time::Instant;

use crate::error::AppResult;

/// Buckets for end-to-end and generation latency in seconds.
const WIDE_LATENCY_BUCKETS: &[f64] = &[0.05, 0.1, 0.25, 0.5, 1.0, 2.0, 3.0, 5.0, 8.0, 13.0];

/// Buckets for retrieval latency in seconds. Retrieval is expected to be an
/// order of magnitude faster than generation.
const RETRIEVAL_LATENCY_BUCKETS: &[f64] = &[0.01, 0.02, 0.05, 0.1, 0.2, 0.4, 0.8, 1.5, 3.0];

/// Gateway metrics handle.
#[derive(Clone)]
pub struct Telemetry {
    registry: Registry,

    /// Inbound requests by route, counted before any stage runs
    requests_total: IntCounterVec,

    /// Pipeline failures by stage ("retriever" or "generation")
    errors_total: IntCounterVec,

    /// End-to-end /chat latency
    e2e_latency: Histogram,

    /// Retrieval call latency (success or failure)
    retrieval_latency: Histogram,

    /// Generation call latency (success or failure)
    generation_latency: Histogram,

    /// Token counts for the most recently completed request
    prompt_tokens: Gauge,
    completion_tokens: Gauge,
    total_tokens: Gauge,
}

impl Telemetry {
    /// Create the metrics handle and register every metric with a fresh
    /// registry. Fails only at startup; never during a request.
    pub fn new() -> AppResult<Self> {
        let registry = Registry::new();

        let requests_total = IntCounterVec::new(
            Opts::new("chat_requests_total", "Total gateway requests by route"),
            &["route"],
        )?;
        registry.register(Box::new(requests_total.clone()))?;

        let errors_total = IntCounterVec::new(
            Opts::new("chat_errors_total", "Total pipeline errors by stage"),
            &["stage"],
        )?;
        registry.register(Box::new(errors_total.clone()))?;
        // Pre-create the stage series so scrapes show zeros instead of no data.
        for stage in ["retriever", "generation"] {
            let _ = errors_total.with_label_values(&[stage]);
        }

        let e2e_latency = Histogram::with_opts(
            HistogramOpts::new(
                "chat_end_to_end_latency_seconds",
                "End-to-end /chat latency in seconds",
            )
            .buckets(WIDE_LATENCY_BUCKETS.to_vec()),
        )?;
        registry.register(Box::new(e2e_latency.clone()))?;

        let retrieval_latency = Histogram::with_opts(
            HistogramOpts::new(
                "retrieval_latency_seconds",
                "Retrieval service call latency in seconds",
            )
            .buckets(RETRIEVAL_LATENCY_BUCKETS.to_vec()),
        )?;
        registry.register(Box::new(retrieval_latency.clone()))?;

        let generation_latency = Histogram::with_opts(
            HistogramOpts::new(
                "generation_latency_seconds",
                "Generation backend call latency in seconds",
            )
            .buckets(WIDE_LATENCY_BUCKETS.to_vec()),
        )?;
        registry.register(Box::new(generation_latency.clone()))?;

        let prompt_tokens = Gauge::with_opts(Opts::new(
            "chat_prompt_tokens",
            "Prompt tokens for the last completed /chat request",
        ))?;
        registry.register(Box::new(prompt_tokens.clone()))?;

        let completion_tokens = Gauge::with_opts(Opts::new(
            "chat_completion_tokens",
            "Completion tokens for the last completed /chat request",
        ))?;
        registry.register(Box::new(completion_tokens.clone()))?;

        let total_tokens = Gauge::with_opts(Opts::new(
            "chat_total_tokens",
            "Total tokens for the last completed /chat request",
        ))?;
        registry.register(Box::new(total_tokens.clone()))?;

        Ok(Self {
            registry,
            requests_total,
            errors_total,
            e2e_latency,
            retrieval_latency,
            generation_latency,
            prompt_tokens,
            completion_tokens,
            total_tokens,
        })
    }

    /// Count an inbound request on a route.
    pub fn inc_request(&self, route: &str) {
        self.requests_total.with_label_values(&[route]).inc();
    }

    /// Count a pipeline failure for a stage.
    pub fn inc_error(&self, stage: &str) {
        self.errors_total.with_label_values(&[stage]).inc();
    }

    /// Start a timer over the retrieval call. Observes on drop.
    pub fn retrieval_timer(&self) -> LatencyTimer {
        LatencyTimer::start(self.retrieval_latency.clone())
    }

    /// Start a timer over the generation call. Observes on drop.
    pub fn generation_timer(&self) -> LatencyTimer {
        LatencyTimer::start(self.generation_latency.clone())
    }

    /// Start a timer over the whole /chat pipeline. Observes on drop.
    pub fn e2e_timer(&self) -> LatencyTimer {
        LatencyTimer::start(self.e2e_latency.clone())
    }

    /// Set the last-request token gauges.
    ///
    /// Observe-only: this can never fail the request, whatever the backend
    /// reported for usage.
    pub fn record_token_usage(&self, prompt: u64, completion: u64, total: u64) {
        self.prompt_tokens.set(prompt as f64);
        self.completion_tokens.set(completion as f64);
        self.total_tokens.set(total as f64);
    }

    /// Render the registry in the Prometheus text exposition format.
    pub fn render(&self) -> String {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();

        if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
            tracing::error!("Failed to encode metrics: {}", e);
            return String::from("# Error encoding metrics");
        }

        String::from_utf8(buffer)
            .unwrap_or_else(|_| String::from("# Error converting metrics to UTF-8"))
    }
}

/// Scoped latency timer that records into a histogram when dropped.
///
/// Holding the timer across a fallible call guarantees the latency is
/// observed on every exit path, success or error.
pub struct LatencyTimer {
    histogram: Histogram,
    start: Instant,
}

impl LatencyTimer {
    fn start(histogram: Histogram) -> Self {
        Self {
            histogram,
            start: Instant::now(),
        }
    }

    /// Seconds elapsed since the timer started, without stopping it.
    pub fn elapsed_seconds(&self) -> f64 {
        self.start.elapsed().as_secs_f64()
    }
}

impl Drop for LatencyTimer {
    fn drop(&mut self) {
        self.histogram.observe(self.start.elapsed().as_secs_f64());
    }
}
