//! Tracing-based observability hooks for client, tool runtime, and adapter phases.
//!
//! ```rust
//! use kobserve::TracingObservabilityHooks;
//! use knows::KnowsHooks;
//!
//! fn accepts_knows_hooks(_hooks: &dyn KnowsHooks) {}
//!
//! let hooks = TracingObservabilityHooks;
//! accepts_knows_hooks(&hooks);
//! ```

use std::time::Duration;

use kclient::{ClientError, ClientOperationHooks};
use knows::KnowsHooks;
use ktooling::{ToolCall, ToolError, ToolExecutionContext, ToolExecutionResult, ToolRuntimeHooks};

#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObservabilityHooks;

impl ClientOperationHooks for TracingObservabilityHooks {
    fn on_attempt_start(&self, operation: &str, attempt: u32) {
        tracing::info!(phase = "client", event = "attempt_start", operation, attempt);
    }

    fn on_retry_scheduled(
        &self,
        operation: &str,
        attempt: u32,
        delay: Duration,
        error: &ClientError,
    ) {
        tracing::warn!(
            phase = "client",
            event = "retry_scheduled",
            operation,
            attempt,
            delay_ms = delay.as_millis() as u64,
            error_kind = ?error.kind,
            status = error.status,
            retryable = error.retryable,
            error = %error
        );
    }

    fn on_success(&self, operation: &str, attempts: u32) {
        tracing::info!(phase = "client", event = "success", operation, attempts);
    }

    fn on_failure(&self, operation: &str, attempts: u32, error: &ClientError) {
        tracing::error!(
            phase = "client",
            event = "failure",
            operation,
            attempts,
            error_kind = ?error.kind,
            status = error.status,
            retryable = error.retryable,
            error = %error
        );
    }
}

impl ToolRuntimeHooks for TracingObservabilityHooks {
    fn on_execution_start(&self, tool_call: &ToolCall, context: &ToolExecutionContext) {
        tracing::info!(
            phase = "tool",
            event = "execution_start",
            tool_name = tool_call.name,
            tool_call_id = tool_call.id,
            session_id = %context.session_id,
            trace_id = context.trace_id.as_ref().map(|id| id.as_str())
        );
    }

    fn on_execution_success(
        &self,
        tool_call: &ToolCall,
        context: &ToolExecutionContext,
        result: &ToolExecutionResult,
        elapsed: Duration,
    ) {
        tracing::info!(
            phase = "tool",
            event = "execution_success",
            tool_name = tool_call.name,
            tool_call_id = tool_call.id,
            session_id = %context.session_id,
            trace_id = context.trace_id.as_ref().map(|id| id.as_str()),
            output_bytes = result.output.len() as u64,
            elapsed_ms = elapsed.as_millis() as u64
        );
    }

    fn on_execution_failure(
        &self,
        tool_call: &ToolCall,
        context: &ToolExecutionContext,
        error: &ToolError,
        elapsed: Duration,
    ) {
        tracing::error!(
            phase = "tool",
            event = "execution_failure",
            tool_name = tool_call.name,
            tool_call_id = tool_call.id,
            session_id = %context.session_id,
            trace_id = context.trace_id.as_ref().map(|id| id.as_str()),
            error_kind = ?error.kind,
            retryable = error.retryable,
            error = %error,
            elapsed_ms = elapsed.as_millis() as u64
        );
    }
}

impl KnowsHooks for TracingObservabilityHooks {
    fn on_cache_hit(&self, key: &str) {
        tracing::debug!(phase = "cache", event = "hit", key);
    }

    fn on_cache_miss(&self, key: &str) {
        tracing::debug!(phase = "cache", event = "miss", key);
    }

    fn on_batch_start(&self, operation: &str, items: usize, concurrency: usize) {
        tracing::info!(
            phase = "batch",
            event = "start",
            operation,
            items = items as u64,
            concurrency = concurrency as u64
        );
    }

    fn on_batch_complete(
        &self,
        operation: &str,
        succeeded: usize,
        failed: usize,
        elapsed: Duration,
    ) {
        if failed > 0 {
            tracing::warn!(
                phase = "batch",
                event = "complete",
                operation,
                succeeded = succeeded as u64,
                failed = failed as u64,
                elapsed_ms = elapsed.as_millis() as u64
            );
        } else {
            tracing::info!(
                phase = "batch",
                event = "complete",
                operation,
                succeeded = succeeded as u64,
                failed = 0_u64,
                elapsed_ms = elapsed.as_millis() as u64
            );
        }
    }
}
