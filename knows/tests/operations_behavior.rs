use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use http::StatusCode;
use kclient::{ClientError, ClientFuture, HttpRequest, HttpResponse, HttpTransport};
use knows::{
    CancelSignal, KnowsOperation, KnowsOptions, KnowsToolkit, ToolCall, ToolErrorKind,
    ToolExecutionContext, ToolRegistry, ToolRuntime, knows_runtime_with,
};
use ktooling::{NoopToolRuntimeHooks, ToolArgs};
use serde_json::{Value, json};

const BASE_URL: &str = "https://knows.example.com";

/// Echoes every request back as `{"data": {"path": ..., "body": ...}}`.
#[derive(Debug, Default)]
struct FakeKnowsService {
    calls: Mutex<Vec<(String, Value)>>,
    statuses: Mutex<HashMap<String, u16>>,
}

impl FakeKnowsService {
    fn fail_path(&self, path: &str, status: u16) {
        self.statuses
            .lock()
            .expect("statuses lock")
            .insert(path.to_string(), status);
    }

    fn calls(&self) -> Vec<(String, Value)> {
        self.calls.lock().expect("calls lock").clone()
    }
}

impl HttpTransport for FakeKnowsService {
    fn post<'a>(&'a self, request: HttpRequest) -> ClientFuture<'a, Result<HttpResponse, ClientError>> {
        Box::pin(async move {
            let path = request
                .url
                .strip_prefix(BASE_URL)
                .unwrap_or(&request.url)
                .to_string();
            let body: Value = serde_json::from_slice(&request.body).expect("request body is json");
            self.calls
                .lock()
                .expect("calls lock")
                .push((path.clone(), body.clone()));

            if let Some(status) = self.statuses.lock().expect("statuses lock").get(&path) {
                let status = StatusCode::from_u16(*status).expect("valid status");
                return Ok(HttpResponse::new(status, "{\"msg\":\"rejected\"}"));
            }

            let envelope = json!({"code": 0, "data": {"path": path, "body": body}});
            Ok(HttpResponse::new(StatusCode::OK, envelope.to_string()))
        })
    }
}

fn options() -> KnowsOptions {
    KnowsOptions::new("test-key", BASE_URL)
        .with_retry_backoff(Duration::from_millis(1))
        .with_max_retries(2)
}

fn registry(service: &Arc<FakeKnowsService>, options: KnowsOptions) -> ToolRegistry {
    KnowsToolkit::new(options)
        .with_transport(service.clone())
        .build()
        .expect("toolkit should build")
}

fn args(value: Value) -> ToolArgs {
    match value {
        Value::Object(map) => map,
        other => panic!("test args must be an object, got {other}"),
    }
}

async fn invoke(
    registry: &ToolRegistry,
    name: &str,
    arguments: Value,
) -> Result<Value, knows::ToolError> {
    let tool = registry.get(name).expect("tool should be registered");
    let context = ToolExecutionContext::new("session-1");
    let output = tool.invoke(&args(arguments), &context).await?;
    Ok(serde_json::from_str(&output).expect("tool output is json"))
}

#[tokio::test]
async fn search_without_scope_uses_configured_default() {
    let service = Arc::new(FakeKnowsService::default());
    let registry = registry(
        &service,
        options().with_default_data_scope(["meeting", "GUIDE"]),
    );

    let result = invoke(&registry, "knows_ai_search", json!({"question": "statin dosing"}))
        .await
        .expect("search should succeed");

    assert_eq!(result["path"], "/knows/ai_search");
    assert_eq!(
        result["body"],
        json!({"query": "statin dosing", "data_scope": ["MEETING", "GUIDE"]})
    );
}

#[tokio::test]
async fn search_with_explicit_scope_sends_exactly_those_values() {
    let service = Arc::new(FakeKnowsService::default());
    let registry = registry(&service, options().with_default_data_scope(["MEETING"]));

    invoke(
        &registry,
        "knows_ai_search",
        json!({"question": "q", "data_scope": ["GUIDE", "PAPER"]}),
    )
    .await
    .expect("search should succeed");

    let calls = service.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].1["data_scope"], json!(["GUIDE", "PAPER"]));
}

#[tokio::test]
async fn unsupported_kind_fails_without_network_call() {
    let service = Arc::new(FakeKnowsService::default());
    let registry = registry(&service, options());

    let error = invoke(
        &registry,
        "knows_get_evidence_detail",
        json!({"evidence_id": "ev-1", "type": "AUDIO"}),
    )
    .await
    .expect_err("AUDIO is not an evidence type");

    assert_eq!(error.kind, ToolErrorKind::InvalidArguments);
    assert!(error.message.contains("PAPER, PAPER_CN, GUIDE, MEETING"));
    assert!(service.calls().is_empty());
}

#[tokio::test]
async fn repeated_detail_lookup_is_served_from_cache() {
    let service = Arc::new(FakeKnowsService::default());
    let registry = registry(&service, options());
    let request = json!({"evidence_id": "ev-7", "translate_to_chinese": true});

    let first = invoke(&registry, "knows_get_paper_en", request.clone())
        .await
        .expect("first lookup should succeed");
    let second = invoke(&registry, "knows_get_paper_en", request)
        .await
        .expect("second lookup should succeed");

    assert_eq!(first, second);
    assert_eq!(service.calls().len(), 1);

    invoke(
        &registry,
        "knows_get_evidence_detail",
        json!({"evidence_id": "ev-7", "type": "paper", "translate_to_chinese": "true"}),
    )
    .await
    .expect("dispatch lookup should succeed");
    assert_eq!(service.calls().len(), 1);

    invoke(&registry, "knows_get_paper_en", json!({"evidence_id": "ev-7"}))
        .await
        .expect("untranslated lookup should succeed");
    let calls = service.calls();
    assert_eq!(calls.len(), 2);
    assert_eq!(calls[1].1, json!({"evidence_id": "ev-7"}));
}

#[tokio::test]
async fn unbounded_cache_ttl_still_serves_repeats() {
    let service = Arc::new(FakeKnowsService::default());
    let registry = registry(&service, options().with_cache_ttl(Duration::MAX));
    let request = json!({"evidence_id": "m-1"});

    for _ in 0..2 {
        invoke(&registry, "knows_get_meeting", request.clone())
            .await
            .expect("meeting lookup should succeed");
    }
    assert_eq!(service.calls().len(), 1);
}

#[tokio::test]
async fn missing_required_fields_are_named_in_the_error() {
    let service = Arc::new(FakeKnowsService::default());
    let registry = registry(&service, options());

    for operation in KnowsOperation::ALL {
        let definition = operation.definition();
        let required = definition.required_fields();
        let Some(first) = required.first() else {
            continue;
        };

        let error = invoke(&registry, operation.name(), json!({}))
            .await
            .expect_err("empty arguments should fail");
        assert_eq!(error.kind, ToolErrorKind::InvalidArguments, "{}", operation.name());
        assert_eq!(error.message, format!("{first} is required"), "{}", operation.name());
    }

    assert!(service.calls().is_empty());
}

#[tokio::test]
async fn bodies_follow_endpoint_contracts() {
    let service = Arc::new(FakeKnowsService::default());
    let registry = registry(&service, options());

    invoke(&registry, "knows_answer", json!({"question_id": "q-1", "answer_type": " research "}))
        .await
        .expect("answer should succeed");
    invoke(&registry, "knows_get_paper_cn", json!({"evidence_id": "cn-1"}))
        .await
        .expect("paper cn should succeed");
    invoke(
        &registry,
        "knows_auto_tagging",
        json!({"tagging_type": "PICO", "content": "aspirin trial", "evidence_id": " "}),
    )
    .await
    .expect("tagging should succeed");
    invoke(&registry, "knows_list_interpretation", json!({"page": 2.0, "page_size": "10"}))
        .await
        .expect("listing should succeed");
    invoke(&registry, "knows_list_question", json!({}))
        .await
        .expect("listing should succeed");

    let calls = service.calls();
    assert_eq!(
        calls,
        vec![
            (
                "/knows/answer".to_string(),
                json!({"question_id": "q-1", "answer_type": "RESEARCH"})
            ),
            ("/knows/evidence/get_paper_cn".to_string(), json!({"evidence_id": "cn-1"})),
            (
                "/knows/auto_tagging".to_string(),
                json!({"tagging_type": "PICO", "content": "aspirin trial"})
            ),
            ("/knows/list_interpretion".to_string(), json!({"page": 2, "page_size": 10})),
            ("/knows/list_question".to_string(), json!({})),
        ]
    );
}

#[tokio::test]
async fn server_errors_retry_to_the_configured_bound() {
    let service = Arc::new(FakeKnowsService::default());
    service.fail_path("/knows/evidence/summary", 503);
    let registry = registry(&service, options());

    let error = invoke(&registry, "knows_evidence_summary", json!({"evidence_id": "ev-1"}))
        .await
        .expect_err("summary should fail");

    assert_eq!(error.kind, ToolErrorKind::Execution);
    assert!(error.retryable);
    assert!(error.message.contains("status 503"));
    assert_eq!(service.calls().len(), 3);
}

#[tokio::test]
async fn client_errors_fail_fast_and_are_not_cached() {
    let service = Arc::new(FakeKnowsService::default());
    service.fail_path("/knows/evidence/get_guide", 404);
    service.fail_path("/knows/evidence/highlight", 401);
    let registry = registry(&service, options());

    for _ in 0..2 {
        let error = invoke(&registry, "knows_get_guide", json!({"evidence_id": "g-1"}))
            .await
            .expect_err("guide should fail");
        assert_eq!(error.kind, ToolErrorKind::Execution);
        assert!(!error.retryable);
        assert!(error.message.contains("rejected"));
    }
    assert_eq!(service.calls().len(), 2);

    let error = invoke(&registry, "knows_evidence_highlight", json!({"evidence_id": "ev-1"}))
        .await
        .expect_err("highlight should fail");
    assert_eq!(error.kind, ToolErrorKind::Unauthorized);
}

#[tokio::test]
async fn cancelled_context_skips_the_service() {
    let service = Arc::new(FakeKnowsService::default());
    let registry = registry(&service, options());
    let signal = CancelSignal::new();
    signal.cancel();

    let tool = registry.get("knows_answer").expect("tool should be registered");
    let context = ToolExecutionContext::new("session-1").with_signal(signal);
    let error = tool
        .invoke(
            &args(json!({"question_id": "q-1", "answer_type": "CLINICAL"})),
            &context,
        )
        .await
        .expect_err("cancelled call should fail");

    assert_eq!(error.kind, ToolErrorKind::Cancelled);
    assert!(service.calls().is_empty());
}

#[tokio::test]
async fn runtime_dispatch_wraps_failures_as_error_results() {
    let service = Arc::new(FakeKnowsService::default());
    let toolkit = KnowsToolkit::new(options()).with_transport(service.clone());
    let runtime =
        knows_runtime_with(toolkit, Arc::new(NoopToolRuntimeHooks)).expect("runtime should build");
    let context = ToolExecutionContext::new("session-1");

    let ok = runtime
        .dispatch(
            ToolCall::new("call-1", "knows_evidence_summary", args(json!({"evidence_id": "ev-1"}))),
            context.clone(),
        )
        .await;
    assert!(!ok.is_error);
    assert_eq!(ok.tool_call_id, "call-1");
    let output: Value = serde_json::from_str(&ok.output).expect("output is json");
    assert_eq!(output["path"], "/knows/evidence/summary");

    let failed = runtime
        .dispatch(
            ToolCall::new("call-2", "knows_answer", args(json!({"question_id": "q-1"}))),
            context.clone(),
        )
        .await;
    assert!(failed.is_error);
    assert!(failed.output.contains("answer_type is required"));

    let missing = runtime
        .dispatch(ToolCall::new("call-3", "knows_unknown", ToolArgs::new()), context)
        .await;
    assert!(missing.is_error);
    assert!(missing.output.contains("not registered"));
}
