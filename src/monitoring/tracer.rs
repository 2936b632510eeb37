/*!
 * Structured Tracing
 * Subscriber bootstrap and batch spans using the tracing crate
 *
 * Features:
 * - Env-filtered output (RUST_LOG, default info)
 * - JSON-formatted logs for structured parsing
 * - Per-batch spans with duration and outcome fields
 */

use crate::core::limits::SLOW_BATCH_THRESHOLD;
use std::time::Instant;
use tracing::{debug, span, warn, Level};
use tracing_subscriber::{
    fmt::format::FmtSpan, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter,
};

/// Initialize structured tracing
///
/// Environment variables:
/// - RUST_LOG: Set log level (default: info)
/// - CREW_TRACE_JSON: Enable JSON output (default: false)
///
/// Safe to call more than once; only the first call installs a subscriber.
pub fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let use_json = std::env::var("CREW_TRACE_JSON")
        .map(|v| v == "1" || v == "true")
        .unwrap_or(false);

    let registry = tracing_subscriber::registry().with(env_filter);

    let installed = if use_json {
        // JSON output for parsing
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
        // Human-readable output, on stderr so stdout carries only the result
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_target(false)
                    .with_thread_names(true)
                    .compact(),
            )
            .try_init()
    };

    if installed.is_ok() {
        debug!(json = use_json, "Structured tracing initialized");
    }
}

/// Span covering one batch from enqueue to drain
pub struct BatchSpan {
    span: tracing::Span,
    start: Instant,
    batch: u64,
    items: usize,
}

impl BatchSpan {
    pub fn new(batch: u64, items: usize) -> Self {
        let span = span!(
            Level::DEBUG,
            "batch",
            batch = batch,
            items = items,
            duration_us = tracing::field::Empty,
            result = tracing::field::Empty,
            error = tracing::field::Empty,
        );

        let _entered = span.enter();
        debug!(batch, items, "batch started");
        drop(_entered);

        Self {
            span,
            start: Instant::now(),
            batch,
            items,
        }
    }

    /// Enter the span context
    pub fn enter(&self) -> tracing::span::Entered<'_> {
        self.span.enter()
    }

    /// Record the aggregated batch result
    pub fn record_result(&self, total: f64) {
        self.span.record("result", total);
    }

    /// Record an error
    pub fn record_error(&self, error: &str) {
        self.span.record("error", error);
    }
}

impl Drop for BatchSpan {
    fn drop(&mut self) {
        let duration = self.start.elapsed();
        let _entered = self.span.enter();
        self.span.record("duration_us", duration.as_micros() as u64);

        if duration > SLOW_BATCH_THRESHOLD {
            warn!(
                batch = self.batch,
                items = self.items,
                duration_ms = duration.as_millis() as u64,
                slow = true,
                "slow batch detected"
            );
        } else {
            debug!(
                batch = self.batch,
                items = self.items,
                duration_us = duration.as_micros() as u64,
                "batch completed"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_tracing_is_idempotent() {
        init_tracing();
        init_tracing();
    }

    #[test]
    fn test_batch_span_records() {
        let span = BatchSpan::new(1, 4);
        {
            let _entered = span.enter();
            span.record_result(40.0);
        }
        span.record_error("timed out");
    }
}
