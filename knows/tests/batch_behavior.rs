use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use http::StatusCode;
use kclient::{ClientError, ClientFuture, HttpRequest, HttpResponse, HttpTransport};
use knows::{KnowsHooks, KnowsOptions, KnowsToolkit, ToolErrorKind, ToolExecutionContext, ToolRegistry};
use ktooling::ToolArgs;
use serde_json::{Value, json};

const BASE_URL: &str = "https://knows.example.com";

/// Slow fake that records when each call starts and ends.
#[derive(Debug, Default)]
struct TimedService {
    delays: HashMap<String, Duration>,
    failing_ids: Vec<String>,
    in_flight: AtomicUsize,
    peak: AtomicUsize,
    spans: Mutex<Vec<(Instant, Instant)>>,
    calls: Mutex<Vec<(String, Value)>>,
}

impl TimedService {
    fn with_delay(mut self, id: &str, delay: Duration) -> Self {
        self.delays.insert(id.to_string(), delay);
        self
    }

    fn with_failure(mut self, id: &str) -> Self {
        self.failing_ids.push(id.to_string());
        self
    }

    fn calls(&self) -> Vec<(String, Value)> {
        self.calls.lock().expect("calls lock").clone()
    }
}

fn item_id(body: &Value) -> String {
    body.get("question_id")
        .or_else(|| body.get("evidence_id"))
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

impl HttpTransport for TimedService {
    fn post<'a>(&'a self, request: HttpRequest) -> ClientFuture<'a, Result<HttpResponse, ClientError>> {
        Box::pin(async move {
            let path = request.url.trim_start_matches(BASE_URL).to_string();
            let body: Value = serde_json::from_slice(&request.body).expect("request body is json");
            let id = item_id(&body);
            self.calls
                .lock()
                .expect("calls lock")
                .push((path.clone(), body.clone()));

            let started = Instant::now();
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);

            let delay = self
                .delays
                .get(&id)
                .copied()
                .unwrap_or(Duration::from_millis(25));
            tokio::time::sleep(delay).await;

            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            self.spans
                .lock()
                .expect("spans lock")
                .push((started, Instant::now()));

            if self.failing_ids.contains(&id) {
                return Ok(HttpResponse::new(StatusCode::BAD_REQUEST, "unknown id"));
            }
            let envelope = json!({"data": {"id": id, "path": path}});
            Ok(HttpResponse::new(StatusCode::OK, envelope.to_string()))
        })
    }
}

#[derive(Default)]
struct RecordingHooks {
    events: Mutex<Vec<String>>,
}

impl KnowsHooks for RecordingHooks {
    fn on_cache_hit(&self, key: &str) {
        self.events.lock().expect("events lock").push(format!("hit:{key}"));
    }

    fn on_batch_start(&self, operation: &str, items: usize, concurrency: usize) {
        self.events
            .lock()
            .expect("events lock")
            .push(format!("start:{operation}:{items}:{concurrency}"));
    }

    fn on_batch_complete(&self, operation: &str, succeeded: usize, failed: usize, _elapsed: Duration) {
        self.events
            .lock()
            .expect("events lock")
            .push(format!("complete:{operation}:{succeeded}:{failed}"));
    }
}

fn registry(service: &Arc<TimedService>, concurrency: i64, hooks: Arc<RecordingHooks>) -> ToolRegistry {
    KnowsToolkit::new(
        KnowsOptions::new("test-key", BASE_URL)
            .with_batch_concurrency(concurrency)
            .with_max_retries(0),
    )
    .with_transport(service.clone())
    .with_hooks(hooks)
    .build()
    .expect("toolkit should build")
}

async fn invoke(registry: &ToolRegistry, name: &str, arguments: Value) -> Result<Value, knows::ToolError> {
    let Value::Object(arguments) = arguments else {
        panic!("test args must be an object");
    };
    let arguments: ToolArgs = arguments;
    let tool = registry.get(name).expect("tool should be registered");
    let output = tool
        .invoke(&arguments, &ToolExecutionContext::new("session-1"))
        .await?;
    Ok(serde_json::from_str(&output).expect("tool output is json"))
}

fn answer_requests(ids: &[&str]) -> Value {
    json!({
        "requests": ids
            .iter()
            .map(|id| json!({"question_id": id, "answer_type": "CLINICAL"}))
            .collect::<Vec<_>>()
    })
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn batch_never_exceeds_concurrency_limit() {
    let service = Arc::new(TimedService::default());
    let hooks = Arc::new(RecordingHooks::default());
    let registry = registry(&service, 2, hooks.clone());

    let rows = invoke(
        &registry,
        "knows_batch_answer",
        answer_requests(&["q-0", "q-1", "q-2", "q-3", "q-4"]),
    )
    .await
    .expect("batch should succeed");

    assert_eq!(rows.as_array().map(Vec::len), Some(5));
    assert_eq!(service.calls().len(), 5);
    assert!(service.peak.load(Ordering::SeqCst) <= 2);

    let spans = service.spans.lock().expect("spans lock").clone();
    for (start, _) in &spans {
        let overlapping = spans
            .iter()
            .filter(|(other_start, other_end)| other_start <= start && start < other_end)
            .count();
        assert!(overlapping <= 2, "{overlapping} calls in flight at once");
    }

    let events = hooks.events.lock().expect("events lock").clone();
    assert_eq!(
        events,
        vec!["start:knows_batch_answer:5:2", "complete:knows_batch_answer:5:0"]
    );
}

#[tokio::test]
async fn rows_follow_input_order_regardless_of_completion() {
    let service = Arc::new(
        TimedService::default()
            .with_delay("q-slow", Duration::from_millis(80))
            .with_delay("q-fast", Duration::from_millis(1)),
    );
    let registry = registry(&service, 3, Arc::new(RecordingHooks::default()));

    let rows = invoke(
        &registry,
        "knows_batch_answer",
        answer_requests(&["q-slow", "q-mid", "q-fast"]),
    )
    .await
    .expect("batch should succeed");

    let rows = rows.as_array().expect("rows are an array");
    for (index, expected) in ["q-slow", "q-mid", "q-fast"].iter().enumerate() {
        assert_eq!(rows[index]["index"], json!(index));
        assert_eq!(rows[index]["question_id"], json!(expected));
        assert_eq!(rows[index]["status"], "success");
        assert_eq!(rows[index]["data"]["id"], json!(expected));
    }
}

#[tokio::test]
async fn one_failing_item_does_not_affect_siblings() {
    let service = Arc::new(TimedService::default().with_failure("q-bad"));
    let hooks = Arc::new(RecordingHooks::default());
    let registry = registry(&service, 2, hooks.clone());

    let rows = invoke(
        &registry,
        "knows_batch_answer",
        answer_requests(&["q-1", "q-bad", "q-3"]),
    )
    .await
    .expect("batch call itself succeeds");

    let rows = rows.as_array().expect("rows are an array");
    assert_eq!(rows[0]["status"], "success");
    assert_eq!(rows[2]["status"], "success");
    assert_eq!(rows[1]["status"], "error");
    assert!(rows[1].get("data").is_none());
    let message = rows[1]["error"].as_str().expect("error is a string");
    assert!(message.contains("status 400"));
    assert!(message.contains("unknown id"));

    let events = hooks.events.lock().expect("events lock").clone();
    assert!(events.contains(&"complete:knows_batch_answer:2:1".to_string()));
}

#[tokio::test]
async fn evidence_batch_dispatches_by_kind_and_fills_the_cache() {
    let service = Arc::new(TimedService::default());
    let hooks = Arc::new(RecordingHooks::default());
    let registry = registry(&service, 4, hooks.clone());

    let rows = invoke(
        &registry,
        "knows_batch_get_evidence_details",
        json!({
            "evidences": [
                {"evidence_id": "p-1", "type": "PAPER"},
                {"evidence_id": "c-1", "type": "paper_cn"},
                {"evidence_id": "g-1", "type": "Guide"},
                {"evidence_id": "m-1", "type": "MEETING"}
            ],
            "translate_to_chinese": true
        }),
    )
    .await
    .expect("batch should succeed");

    let rows = rows.as_array().expect("rows are an array");
    let kinds = rows.iter().map(|row| row["type"].clone()).collect::<Vec<_>>();
    assert_eq!(kinds, vec![json!("PAPER"), json!("PAPER_CN"), json!("GUIDE"), json!("MEETING")]);
    assert_eq!(rows[1]["evidence_id"], "c-1");
    assert_eq!(rows[3]["data"]["path"], "/knows/evidence/get_meeting");

    let mut calls = service.calls();
    calls.sort_by(|left, right| left.0.cmp(&right.0));
    assert_eq!(
        calls,
        vec![
            ("/knows/evidence/get_guide".to_string(), json!({"evidence_id": "g-1", "translate_to_chinese": true})),
            ("/knows/evidence/get_meeting".to_string(), json!({"evidence_id": "m-1", "translate_to_chinese": true})),
            ("/knows/evidence/get_paper_cn".to_string(), json!({"evidence_id": "c-1"})),
            ("/knows/evidence/get_paper_en".to_string(), json!({"evidence_id": "p-1", "translate_to_chinese": true})),
        ]
    );

    invoke(
        &registry,
        "knows_get_guide",
        json!({"evidence_id": "g-1", "translate_to_chinese": true}),
    )
    .await
    .expect("guide should come from cache");
    assert_eq!(service.calls().len(), 4);

    let events = hooks.events.lock().expect("events lock").clone();
    assert!(events.contains(&"hit:GUIDE:g-1:true".to_string()));
}

#[tokio::test]
async fn invalid_item_rejects_the_whole_batch_before_any_call() {
    let service = Arc::new(TimedService::default());
    let registry = registry(&service, 2, Arc::new(RecordingHooks::default()));

    let error = invoke(
        &registry,
        "knows_batch_get_evidence_details",
        json!({
            "evidences": [
                {"evidence_id": "p-1", "type": "PAPER"},
                {"evidence_id": "a-1", "type": "AUDIO"}
            ]
        }),
    )
    .await
    .expect_err("AUDIO is not an evidence type");

    assert_eq!(error.kind, ToolErrorKind::InvalidArguments);
    assert_eq!(
        error.message,
        "evidences[1]: unsupported evidence type \"AUDIO\"; allowed: PAPER, PAPER_CN, GUIDE, MEETING"
    );
    assert!(service.calls().is_empty());

    let error = invoke(&registry, "knows_batch_answer", json!({"requests": []}))
        .await
        .expect_err("empty batch should fail");
    assert_eq!(error.message, "requests must not be empty");
}
