//! Metrics and observability utilities
//!
//! Prometheus metrics for orchestration runs and the external calls they make,
//! with standardized naming conventions.

use metrics::{counter, describe_counter, describe_histogram, histogram, Unit};
use std::time::Instant;

/// Metrics prefix for all ReasonForge metrics
pub const METRICS_PREFIX: &str = "reasonforge";

/// Histogram buckets for orchestration latency (in seconds).
/// Orchestrations chain several model calls, so the tail is long.
pub const ORCHESTRATION_BUCKETS: &[f64] = &[
    0.100,  // 100ms
    0.250,  // 250ms
    0.500,  // 500ms
    1.000,  // 1s
    2.500,  // 2.5s
    5.000,  // 5s
    10.00,  // 10s
    30.00,  // 30s
    60.00,  // 60s
    120.0,  // 2m
];

/// Register all metric descriptions
pub fn register_metrics() {
    describe_counter!(
        format!("{}_orchestrations_total", METRICS_PREFIX),
        Unit::Count,
        "Total orchestration runs by pattern and outcome"
    );

    describe_histogram!(
        format!("{}_orchestration_duration_seconds", METRICS_PREFIX),
        Unit::Seconds,
        "Orchestration latency in seconds"
    );

    describe_counter!(
        format!("{}_llm_calls_total", METRICS_PREFIX),
        Unit::Count,
        "Total language model invocations"
    );

    describe_counter!(
        format!("{}_tool_calls_total", METRICS_PREFIX),
        Unit::Count,
        "Total tool executions by tool and outcome"
    );

    describe_counter!(
        format!("{}_retrievals_total", METRICS_PREFIX),
        Unit::Count,
        "Total retriever queries"
    );

    tracing::info!("Metrics registered");
}

/// Helper to record one orchestration run
pub struct OrchestrationMetrics {
    start: Instant,
    pattern: &'static str,
}

impl OrchestrationMetrics {
    /// Start tracking a run
    pub fn start(pattern: &'static str) -> Self {
        Self {
            start: Instant::now(),
            pattern,
        }
    }

    /// Record run completion
    pub fn finish(self, outcome: &'static str) {
        let duration = self.start.elapsed().as_secs_f64();

        counter!(
            format!("{}_orchestrations_total", METRICS_PREFIX),
            "pattern" => self.pattern,
            "outcome" => outcome
        )
        .increment(1);

        histogram!(
            format!("{}_orchestration_duration_seconds", METRICS_PREFIX),
            "pattern" => self.pattern
        )
        .record(duration);
    }
}

/// Helper to record a language model call
pub fn record_llm_call(model: &str, signature: &str, success: bool) {
    let status = if success { "success" } else { "error" };

    counter!(
        format!("{}_llm_calls_total", METRICS_PREFIX),
        "model" => model.to_string(),
        "signature" => signature.to_string(),
        "status" => status
    )
    .increment(1);
}

/// Helper to record a tool execution
pub fn record_tool_call(tool: &str, outcome: &'static str) {
    counter!(
        format!("{}_tool_calls_total", METRICS_PREFIX),
        "tool" => tool.to_string(),
        "outcome" => outcome
    )
    .increment(1);
}

/// Helper to record a retriever query
pub fn record_retrieval(passages: usize) {
    let bucket = if passages == 0 { "empty" } else { "hit" };

    counter!(
        format!("{}_retrievals_total", METRICS_PREFIX),
        "result" => bucket
    )
    .increment(1);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_orchestration_buckets_sorted() {
        let mut prev = 0.0;
        for &bucket in ORCHESTRATION_BUCKETS {
            assert!(bucket > prev);
            prev = bucket;
        }
    }

    #[test]
    fn test_orchestration_metrics() {
        let metrics = OrchestrationMetrics::start("react");
        metrics.finish("finished");
        record_llm_call("openai/gpt-4o-mini", "react_step", true);
        record_tool_call("calculator", "ok");
        record_retrieval(0);
        // Without an installed recorder these are no-ops; just verify they run
    }
}
