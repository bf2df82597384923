//! Metrics-based observability hooks for client, tool runtime, and adapter phases.
//!
//! ```rust
//! use kobserve::MetricsObservabilityHooks;
//! use kclient::ClientOperationHooks;
//!
//! fn accepts_client_hooks(_hooks: &dyn ClientOperationHooks) {}
//!
//! let hooks = MetricsObservabilityHooks;
//! accepts_client_hooks(&hooks);
//! ```

use std::time::Duration;

use kclient::{ClientError, ClientOperationHooks};
use knows::KnowsHooks;
use ktooling::{ToolCall, ToolError, ToolExecutionContext, ToolExecutionResult, ToolRuntimeHooks};

#[derive(Debug, Clone, Copy, Default)]
pub struct MetricsObservabilityHooks;

impl ClientOperationHooks for MetricsObservabilityHooks {
    fn on_attempt_start(&self, operation: &str, _attempt: u32) {
        metrics::counter!(
            "knows_client_attempt_start_total",
            "operation" => operation.to_string()
        )
        .increment(1);
    }

    fn on_retry_scheduled(
        &self,
        operation: &str,
        _attempt: u32,
        delay: Duration,
        error: &ClientError,
    ) {
        metrics::counter!(
            "knows_client_retry_scheduled_total",
            "operation" => operation.to_string(),
            "error_kind" => format!("{:?}", error.kind)
        )
        .increment(1);
        metrics::histogram!(
            "knows_client_retry_delay_seconds",
            "operation" => operation.to_string()
        )
        .record(delay.as_secs_f64());
    }

    fn on_success(&self, operation: &str, attempts: u32) {
        metrics::counter!(
            "knows_client_success_total",
            "operation" => operation.to_string()
        )
        .increment(1);
        metrics::histogram!(
            "knows_client_attempts_per_success",
            "operation" => operation.to_string()
        )
        .record(attempts as f64);
    }

    fn on_failure(&self, operation: &str, attempts: u32, error: &ClientError) {
        metrics::counter!(
            "knows_client_failure_total",
            "operation" => operation.to_string(),
            "error_kind" => format!("{:?}", error.kind)
        )
        .increment(1);
        metrics::histogram!(
            "knows_client_attempts_per_failure",
            "operation" => operation.to_string()
        )
        .record(attempts as f64);
    }
}

impl ToolRuntimeHooks for MetricsObservabilityHooks {
    fn on_execution_start(&self, tool_call: &ToolCall, _context: &ToolExecutionContext) {
        metrics::counter!(
            "knows_tool_execution_start_total",
            "tool_name" => tool_call.name.clone()
        )
        .increment(1);
    }

    fn on_execution_success(
        &self,
        tool_call: &ToolCall,
        _context: &ToolExecutionContext,
        _result: &ToolExecutionResult,
        elapsed: Duration,
    ) {
        metrics::counter!(
            "knows_tool_execution_success_total",
            "tool_name" => tool_call.name.clone()
        )
        .increment(1);
        metrics::histogram!(
            "knows_tool_execution_duration_seconds",
            "tool_name" => tool_call.name.clone(),
            "status" => "success"
        )
        .record(elapsed.as_secs_f64());
    }

    fn on_execution_failure(
        &self,
        tool_call: &ToolCall,
        _context: &ToolExecutionContext,
        error: &ToolError,
        elapsed: Duration,
    ) {
        metrics::counter!(
            "knows_tool_execution_failure_total",
            "tool_name" => tool_call.name.clone(),
            "error_kind" => format!("{:?}", error.kind)
        )
        .increment(1);
        metrics::histogram!(
            "knows_tool_execution_duration_seconds",
            "tool_name" => tool_call.name.clone(),
            "status" => "failure"
        )
        .record(elapsed.as_secs_f64());
    }
}

/// Cache keys are high-cardinality, so only the evidence kind prefix is used as a label.
fn cache_kind(key: &str) -> String {
    key.split(':').next().unwrap_or_default().to_string()
}

impl KnowsHooks for MetricsObservabilityHooks {
    fn on_cache_hit(&self, key: &str) {
        metrics::counter!("knows_cache_hit_total", "kind" => cache_kind(key)).increment(1);
    }

    fn on_cache_miss(&self, key: &str) {
        metrics::counter!("knows_cache_miss_total", "kind" => cache_kind(key)).increment(1);
    }

    fn on_batch_start(&self, operation: &str, items: usize, _concurrency: usize) {
        metrics::counter!(
            "knows_batch_start_total",
            "operation" => operation.to_string()
        )
        .increment(1);
        metrics::histogram!(
            "knows_batch_items",
            "operation" => operation.to_string()
        )
        .record(items as f64);
    }

    fn on_batch_complete(
        &self,
        operation: &str,
        succeeded: usize,
        failed: usize,
        elapsed: Duration,
    ) {
        metrics::counter!(
            "knows_batch_item_total",
            "operation" => operation.to_string(),
            "status" => "success"
        )
        .increment(succeeded as u64);
        metrics::counter!(
            "knows_batch_item_total",
            "operation" => operation.to_string(),
            "status" => "error"
        )
        .increment(failed as u64);
        metrics::histogram!(
            "knows_batch_duration_seconds",
            "operation" => operation.to_string()
        )
        .record(elapsed.as_secs_f64());
    }
}
