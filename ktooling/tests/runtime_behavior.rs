use std::sync::Arc;
use std::time::Duration;

use kcommon::{CancelSignal, Interruption};
use ktooling::{
    DefaultToolRuntime, ToolCall, ToolDefinition, ToolError, ToolErrorKind, ToolExecutionContext,
    ToolRegistry, ToolRuntime, optional_i64, required_string,
};
use serde_json::json;

fn lookup_definition() -> ToolDefinition {
    ToolDefinition::new(
        "lookup",
        "Looks up a record by id",
        json!({
            "type": "object",
            "properties": {
                "id": {"type": "string"},
                "delay_ms": {"type": "integer"}
            },
            "required": ["id"]
        }),
    )
}

fn interruption_error(interruption: Interruption) -> ToolError {
    match interruption {
        Interruption::Cancelled => ToolError::cancelled("lookup cancelled"),
        Interruption::DeadlineExceeded => ToolError::timeout("lookup timed out"),
    }
}

fn runtime() -> DefaultToolRuntime {
    let mut registry = ToolRegistry::new();
    registry.register_fn(lookup_definition(), |args, context| async move {
        let id = required_string(&args, "id")?;
        let delay = optional_i64(&args, "delay_ms")?.unwrap_or(0).max(0) as u64;
        context
            .signal
            .sleep(Duration::from_millis(delay))
            .await
            .map_err(interruption_error)?;
        Ok(format!("record:{id}"))
    });
    DefaultToolRuntime::new(Arc::new(registry))
}

fn call(id: &str, raw: &str) -> ToolCall {
    ToolCall::from_json(id, "lookup", raw).expect("call should build")
}

#[tokio::test]
async fn function_tool_round_trips_through_the_runtime() {
    let result = runtime()
        .execute(call("call-1", r#"{"id":" r-1 "}"#), ToolExecutionContext::new("s-1"))
        .await
        .expect("lookup should succeed");

    assert_eq!(result.output, "record:r-1");
    assert_eq!(result.tool_call_id, "call-1");
}

#[tokio::test]
async fn validation_failures_name_the_missing_field() {
    let error = runtime()
        .execute(call("call-2", "{}"), ToolExecutionContext::new("s-1"))
        .await
        .expect_err("id is required");

    assert_eq!(error.kind, ToolErrorKind::InvalidArguments);
    assert_eq!(error.message, "id is required");
    assert!(error.is_user_error());
}

#[tokio::test]
async fn cancelled_context_interrupts_a_slow_tool() {
    let signal = CancelSignal::new();
    let context = ToolExecutionContext::new("s-2").with_signal(signal.clone());
    let runtime = runtime();

    let task = tokio::spawn(async move {
        runtime
            .execute(call("call-3", r#"{"id":"r-3","delay_ms":5000}"#), context)
            .await
    });
    tokio::time::sleep(Duration::from_millis(20)).await;
    signal.cancel();

    let error = tokio::time::timeout(Duration::from_secs(2), task)
        .await
        .expect("cancellation should stop the tool promptly")
        .expect("task should not panic")
        .expect_err("cancelled lookup should fail");
    assert_eq!(error.kind, ToolErrorKind::Cancelled);
    assert_eq!(error.tool_call_id.as_deref(), Some("call-3"));
}

#[tokio::test]
async fn context_timeout_surfaces_as_timeout_result() {
    let context = ToolExecutionContext::new("s-3").with_timeout(Duration::from_millis(20));

    let result = runtime()
        .dispatch(call("call-4", r#"{"id":"r-4","delay_ms":5000}"#), context)
        .await;

    assert!(result.is_error);
    assert!(result.output.starts_with("Timeout"));
    assert!(result.output.contains("lookup timed out"));
}
