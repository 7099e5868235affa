/*!
 * Tracing Setup
 * Structured logging for the primitives' cold paths using the tracing crate
 *
 * Primitives emit:
 * - `trace!` when a thread parks or a monitor grant/signal happens
 * - `debug!` on timeout expiry and backend selection
 */

use crate::core::limits::ENV_TRACE_JSON;
use std::time::{Duration, Instant};
use tracing::{info, span, warn, Level};
use tracing_subscriber::{
    fmt::format::FmtSpan, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter,
};

/// Initialize structured tracing
///
/// Environment variables:
/// - RUST_LOG: Set log level (default: info)
/// - YARN_TRACE_JSON: Enable JSON output (default: false)
///
/// Calling this more than once keeps the first subscriber.
pub fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let use_json = std::env::var(ENV_TRACE_JSON)
        .map(|v| v == "1" || v == "true")
        .unwrap_or(false);

    let registry = tracing_subscriber::registry().with(env_filter);

    let installed = if use_json {
        // JSON output for log collection
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_target(true)
                    .with_thread_ids(true)
                    .with_thread_names(true)
                    .with_current_span(true)
                    .with_span_events(FmtSpan::CLOSE),
            )
            .try_init()
    } else {
        // Human-readable output for development
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(true)
                    .with_thread_ids(true)
                    .with_thread_names(true)
                    .with_span_events(FmtSpan::CLOSE)
                    .compact(),
            )
            .try_init()
    };

    if installed.is_ok() {
        info!(json = use_json, "tracing initialized");
    }
}

/// Span around one contention scenario; logs elapsed time and throughput on drop
pub struct ScenarioSpan {
    span: tracing::Span,
    start: Instant,
    name: &'static str,
    operations: u64,
}

impl ScenarioSpan {
    pub fn new(name: &'static str, threads: usize) -> Self {
        let span = span!(Level::INFO, "scenario", scenario = name, threads = threads);
        Self {
            span,
            start: Instant::now(),
            name,
            operations: 0,
        }
    }

    /// Record how many operations the scenario completed
    pub fn record_operations(&mut self, operations: u64) {
        self.operations = operations;
    }

    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    pub fn enter(&self) -> tracing::span::Entered<'_> {
        self.span.enter()
    }
}

impl Drop for ScenarioSpan {
    fn drop(&mut self) {
        let elapsed = self.start.elapsed();
        let _entered = self.span.enter();
        let per_sec = if elapsed.is_zero() {
            0.0
        } else {
            self.operations as f64 / elapsed.as_secs_f64()
        };

        if self.operations == 0 {
            warn!(scenario = self.name, "scenario completed no operations");
        } else {
            info!(
                scenario = self.name,
                operations = self.operations,
                elapsed_ms = elapsed.as_millis() as u64,
                ops_per_sec = per_sec as u64,
                "scenario completed"
            );
        }
    }
}
