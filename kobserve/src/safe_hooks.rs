use std::panic::{AssertUnwindSafe, catch_unwind};
use std::time::Duration;

use kclient::{ClientError, ClientOperationHooks};
use knows::KnowsHooks;
use ktooling::{ToolCall, ToolError, ToolExecutionContext, ToolExecutionResult, ToolRuntimeHooks};

/// Wraps client hooks so a panicking observer never aborts a request.
pub struct SafeClientHooks<H> {
    inner: H,
}

impl<H> SafeClientHooks<H> {
    pub fn new(inner: H) -> Self {
        Self { inner }
    }
}

impl<H> ClientOperationHooks for SafeClientHooks<H>
where
    H: ClientOperationHooks,
{
    fn on_attempt_start(&self, operation: &str, attempt: u32) {
        let _ = catch_unwind(AssertUnwindSafe(|| {
            self.inner.on_attempt_start(operation, attempt)
        }));
    }

    fn on_retry_scheduled(
        &self,
        operation: &str,
        attempt: u32,
        delay: Duration,
        error: &ClientError,
    ) {
        let _ = catch_unwind(AssertUnwindSafe(|| {
            self.inner
                .on_retry_scheduled(operation, attempt, delay, error)
        }));
    }

    fn on_success(&self, operation: &str, attempts: u32) {
        let _ = catch_unwind(AssertUnwindSafe(|| {
            self.inner.on_success(operation, attempts)
        }));
    }

    fn on_failure(&self, operation: &str, attempts: u32, error: &ClientError) {
        let _ = catch_unwind(AssertUnwindSafe(|| {
            self.inner.on_failure(operation, attempts, error)
        }));
    }
}

pub struct SafeToolHooks<H> {
    inner: H,
}

impl<H> SafeToolHooks<H> {
    pub fn new(inner: H) -> Self {
        Self { inner }
    }
}

impl<H> ToolRuntimeHooks for SafeToolHooks<H>
where
    H: ToolRuntimeHooks,
{
    fn on_execution_start(&self, tool_call: &ToolCall, context: &ToolExecutionContext) {
        let _ = catch_unwind(AssertUnwindSafe(|| {
            self.inner.on_execution_start(tool_call, context)
        }));
    }

    fn on_execution_success(
        &self,
        tool_call: &ToolCall,
        context: &ToolExecutionContext,
        result: &ToolExecutionResult,
        elapsed: Duration,
    ) {
        let _ = catch_unwind(AssertUnwindSafe(|| {
            self.inner
                .on_execution_success(tool_call, context, result, elapsed)
        }));
    }

    fn on_execution_failure(
        &self,
        tool_call: &ToolCall,
        context: &ToolExecutionContext,
        error: &ToolError,
        elapsed: Duration,
    ) {
        let _ = catch_unwind(AssertUnwindSafe(|| {
            self.inner
                .on_execution_failure(tool_call, context, error, elapsed)
        }));
    }
}

pub struct SafeKnowsHooks<H> {
    inner: H,
}

impl<H> SafeKnowsHooks<H> {
    pub fn new(inner: H) -> Self {
        Self { inner }
    }
}

impl<H> KnowsHooks for SafeKnowsHooks<H>
where
    H: KnowsHooks,
{
    fn on_cache_hit(&self, key: &str) {
        let _ = catch_unwind(AssertUnwindSafe(|| self.inner.on_cache_hit(key)));
    }

    fn on_cache_miss(&self, key: &str) {
        let _ = catch_unwind(AssertUnwindSafe(|| self.inner.on_cache_miss(key)));
    }

    fn on_batch_start(&self, operation: &str, items: usize, concurrency: usize) {
        let _ = catch_unwind(AssertUnwindSafe(|| {
            self.inner.on_batch_start(operation, items, concurrency)
        }));
    }

    fn on_batch_complete(
        &self,
        operation: &str,
        succeeded: usize,
        failed: usize,
        elapsed: Duration,
    ) {
        let _ = catch_unwind(AssertUnwindSafe(|| {
            self.inner
                .on_batch_complete(operation, succeeded, failed, elapsed)
        }));
    }
}
