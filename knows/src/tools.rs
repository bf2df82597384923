//! The evidence operation catalog exposed as registry tools.
//!
//! ```rust
//! use knows::{KnowsOperation, KnowsOptions, KnowsToolkit};
//!
//! let registry = KnowsToolkit::new(KnowsOptions::new("key", "https://api.example.com"))
//!     .build()
//!     .expect("toolkit should build");
//!
//! assert_eq!(registry.len(), KnowsOperation::ALL.len());
//! assert!(registry.contains("knows_ai_search"));
//! ```

use std::sync::Arc;
use std::time::Instant;

use kclient::{
    ApiClient, ApiClientConfig, ClientError, ClientErrorKind, ClientOperationHooks, HttpTransport,
    NoopClientHooks,
};
use kcommon::CancelSignal;
use ktooling::{Tool, ToolArgs, ToolDefinition, ToolError, ToolExecutionContext, ToolFuture, ToolRegistry};
use serde::Serialize;
use serde_json::{Value, json};

use crate::{
    AnswerRequest, AnswerType, BatchAnswerRequest, BatchEvidenceRequest, BatchExecutor,
    BatchOutcome, BatchRow, ConfigError, DataScope, DetailCache, DetailRequest,
    EvidenceDetailRequest, EvidenceKind, EvidenceRequest, KnowsClient, KnowsHooks, KnowsOptions,
    KnowsSettings, ListRequest, NoopKnowsHooks, SearchRequest, TaggingRequest,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KnowsOperation {
    AiSearch,
    Answer,
    BatchAnswer,
    EvidenceSummary,
    EvidenceHighlight,
    GetPaperEn,
    GetPaperCn,
    GetGuide,
    GetMeeting,
    GetEvidenceDetail,
    AutoTagging,
    ListQuestion,
    ListInterpretation,
    BatchGetEvidenceDetails,
}

impl KnowsOperation {
    pub const ALL: [KnowsOperation; 14] = [
        Self::AiSearch,
        Self::Answer,
        Self::BatchAnswer,
        Self::EvidenceSummary,
        Self::EvidenceHighlight,
        Self::GetPaperEn,
        Self::GetPaperCn,
        Self::GetGuide,
        Self::GetMeeting,
        Self::GetEvidenceDetail,
        Self::AutoTagging,
        Self::ListQuestion,
        Self::ListInterpretation,
        Self::BatchGetEvidenceDetails,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Self::AiSearch => "knows_ai_search",
            Self::Answer => "knows_answer",
            Self::BatchAnswer => "knows_batch_answer",
            Self::EvidenceSummary => "knows_evidence_summary",
            Self::EvidenceHighlight => "knows_evidence_highlight",
            Self::GetPaperEn => "knows_get_paper_en",
            Self::GetPaperCn => "knows_get_paper_cn",
            Self::GetGuide => "knows_get_guide",
            Self::GetMeeting => "knows_get_meeting",
            Self::GetEvidenceDetail => "knows_get_evidence_detail",
            Self::AutoTagging => "knows_auto_tagging",
            Self::ListQuestion => "knows_list_question",
            Self::ListInterpretation => "knows_list_interpretation",
            Self::BatchGetEvidenceDetails => "knows_batch_get_evidence_details",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|operation| operation.name() == name)
    }

    pub fn description(&self) -> &'static str {
        match self {
            Self::AiSearch => {
                "Search clinical evidence for a question. Returns a question_id and the matching evidence list; run this before requesting answers."
            }
            Self::Answer => {
                "Generate one answer in the requested style for a question_id returned by knows_ai_search."
            }
            Self::BatchAnswer => {
                "Generate answers for several question_id values concurrently. Each item reports its own status."
            }
            Self::EvidenceSummary => "Get the AI-generated summary of one evidence item.",
            Self::EvidenceHighlight => {
                "Get highlighted source snippets of one evidence item for citation and traceability."
            }
            Self::GetPaperEn => "Get structured details of an English-language paper.",
            Self::GetPaperCn => "Get structured details of a Chinese-language paper.",
            Self::GetGuide => "Get the detailed content of a clinical guideline.",
            Self::GetMeeting => "Get the detailed content of a medical meeting abstract.",
            Self::GetEvidenceDetail => {
                "Get details of one evidence item by type: PAPER, PAPER_CN, GUIDE or MEETING."
            }
            Self::AutoTagging => {
                "Extract tags and structured elements from free text or from an evidence item."
            }
            Self::ListQuestion => "List previously asked questions.",
            Self::ListInterpretation => "List previous evidence interpretation records.",
            Self::BatchGetEvidenceDetails => {
                "Get details for several PAPER, PAPER_CN, GUIDE or MEETING evidence items concurrently."
            }
        }
    }

    pub fn input_schema(&self) -> Value {
        match self {
            Self::AiSearch => json!({
                "type": "object",
                "properties": {
                    "question": {
                        "type": "string",
                        "description": "Question text to search evidence for."
                    },
                    "data_scope": {
                        "type": "array",
                        "description": "Evidence types to search. Defaults to the configured scope.",
                        "items": {"type": "string", "enum": DataScope::NAMES}
                    }
                },
                "required": ["question"]
            }),
            Self::Answer => json!({
                "type": "object",
                "properties": {
                    "question_id": {
                        "type": "string",
                        "description": "question_id returned by knows_ai_search."
                    },
                    "answer_type": {
                        "type": "string",
                        "description": "Answer style.",
                        "enum": AnswerType::NAMES
                    }
                },
                "required": ["question_id", "answer_type"]
            }),
            Self::BatchAnswer => json!({
                "type": "object",
                "properties": {
                    "requests": {
                        "type": "array",
                        "items": {
                            "type": "object",
                            "properties": {
                                "question_id": {"type": "string"},
                                "answer_type": {"type": "string", "enum": AnswerType::NAMES}
                            },
                            "required": ["question_id", "answer_type"]
                        }
                    }
                },
                "required": ["requests"]
            }),
            Self::EvidenceSummary | Self::EvidenceHighlight | Self::GetPaperCn => json!({
                "type": "object",
                "properties": {
                    "evidence_id": {"type": "string"}
                },
                "required": ["evidence_id"]
            }),
            Self::GetPaperEn | Self::GetGuide | Self::GetMeeting => json!({
                "type": "object",
                "properties": {
                    "evidence_id": {"type": "string"},
                    "translate_to_chinese": {
                        "type": "boolean",
                        "description": "Translate title and abstract to Chinese."
                    }
                },
                "required": ["evidence_id"]
            }),
            Self::GetEvidenceDetail => json!({
                "type": "object",
                "properties": {
                    "evidence_id": {"type": "string"},
                    "type": {"type": "string", "enum": DataScope::NAMES},
                    "translate_to_chinese": {"type": "boolean"}
                },
                "required": ["evidence_id", "type"]
            }),
            Self::AutoTagging => json!({
                "type": "object",
                "properties": {
                    "content": {"type": "string"},
                    "evidence_id": {"type": "string"},
                    "tagging_type": {"type": "string"}
                },
                "required": ["tagging_type"]
            }),
            Self::ListQuestion | Self::ListInterpretation => json!({
                "type": "object",
                "properties": {
                    "from_time": {"type": "integer"},
                    "to_time": {"type": "integer"},
                    "page": {"type": "integer"},
                    "page_size": {"type": "integer"}
                }
            }),
            Self::BatchGetEvidenceDetails => json!({
                "type": "object",
                "properties": {
                    "evidences": {
                        "type": "array",
                        "items": {
                            "type": "object",
                            "properties": {
                                "evidence_id": {"type": "string"},
                                "type": {"type": "string", "enum": DataScope::NAMES}
                            },
                            "required": ["evidence_id", "type"]
                        }
                    },
                    "translate_to_chinese": {"type": "boolean"}
                },
                "required": ["evidences"]
            }),
        }
    }

    pub fn definition(&self) -> ToolDefinition {
        ToolDefinition::new(self.name(), self.description(), self.input_schema())
    }
}

/// Converts a client failure into the error reported by a tool.
pub fn tool_error(error: ClientError) -> ToolError {
    match error.kind {
        ClientErrorKind::Cancelled => ToolError::cancelled(error.message),
        ClientErrorKind::DeadlineExceeded => ToolError::timeout(error.message),
        ClientErrorKind::ClientStatus if matches!(error.status, Some(401 | 403)) => {
            ToolError::unauthorized(error.message)
        }
        _ => ToolError::execution(error.message).with_retryable(error.retryable),
    }
}

/// Builds the operation registry from adapter options.
pub struct KnowsToolkit {
    options: KnowsOptions,
    transport: Option<Arc<dyn HttpTransport>>,
    client_hooks: Arc<dyn ClientOperationHooks>,
    hooks: Arc<dyn KnowsHooks>,
}

impl KnowsToolkit {
    pub fn new(options: KnowsOptions) -> Self {
        Self {
            options,
            transport: None,
            client_hooks: Arc::new(NoopClientHooks),
            hooks: Arc::new(NoopKnowsHooks),
        }
    }

    pub fn with_transport(mut self, transport: Arc<dyn HttpTransport>) -> Self {
        self.transport = Some(transport);
        self
    }

    pub fn with_client_hooks(mut self, hooks: Arc<dyn ClientOperationHooks>) -> Self {
        self.client_hooks = hooks;
        self
    }

    pub fn with_hooks(mut self, hooks: Arc<dyn KnowsHooks>) -> Self {
        self.hooks = hooks;
        self
    }

    /// Resolves the options and wires the shared client behind every operation.
    pub fn build_client(&self) -> Result<(KnowsSettings, KnowsClient), ConfigError> {
        let settings = self.options.resolve()?;
        let transport = match &self.transport {
            Some(transport) => Arc::clone(transport),
            None => default_transport(&settings)?,
        };

        let config = ApiClientConfig::new(settings.api_base_url.clone(), settings.api_key.clone())
            .with_retry(settings.retry.clone());
        let api = ApiClient::new(config, transport)?.with_hooks(Arc::clone(&self.client_hooks));
        let cache = DetailCache::new(settings.cache_max_entries, settings.cache_ttl);
        let client = KnowsClient::new(api, cache).with_hooks(Arc::clone(&self.hooks));

        Ok((settings, client))
    }

    pub fn build(self) -> Result<ToolRegistry, ConfigError> {
        let (settings, client) = self.build_client()?;
        let state = Arc::new(OperationState {
            client,
            default_scope: settings.default_data_scope,
            batch: BatchExecutor::new(settings.batch_concurrency),
            hooks: self.hooks,
        });

        let mut registry = ToolRegistry::new();
        for operation in KnowsOperation::ALL {
            registry.register(KnowsTool {
                operation,
                state: Arc::clone(&state),
            });
        }
        Ok(registry)
    }
}

#[cfg(feature = "http-reqwest")]
fn default_transport(settings: &KnowsSettings) -> Result<Arc<dyn HttpTransport>, ConfigError> {
    let transport = kclient::ReqwestTransport::with_timeout(settings.request_timeout)?;
    Ok(Arc::new(transport))
}

#[cfg(not(feature = "http-reqwest"))]
fn default_transport(_settings: &KnowsSettings) -> Result<Arc<dyn HttpTransport>, ConfigError> {
    Err(ConfigError::invalid_value(
        "no HTTP transport supplied and the http-reqwest feature is disabled",
    ))
}

struct OperationState {
    client: KnowsClient,
    default_scope: Vec<DataScope>,
    batch: BatchExecutor,
    hooks: Arc<dyn KnowsHooks>,
}

#[derive(Serialize)]
struct AnswerKey {
    question_id: String,
}

#[derive(Serialize)]
struct EvidenceKey {
    evidence_id: String,
    #[serde(rename = "type")]
    kind: EvidenceKind,
}

impl OperationState {
    async fn execute(
        self: &Arc<Self>,
        operation: KnowsOperation,
        args: &ToolArgs,
        signal: &CancelSignal,
    ) -> Result<Value, ToolError> {
        let client = &self.client;
        let result = match operation {
            KnowsOperation::AiSearch => {
                let request = SearchRequest::from_args(args, &self.default_scope)?;
                client.ai_search(&request, signal).await
            }
            KnowsOperation::Answer => {
                let request = AnswerRequest::from_args(args)?;
                client.answer(&request, signal).await
            }
            KnowsOperation::EvidenceSummary => {
                let request = EvidenceRequest::from_args(args)?;
                client.evidence_summary(&request, signal).await
            }
            KnowsOperation::EvidenceHighlight => {
                let request = EvidenceRequest::from_args(args)?;
                client.evidence_highlight(&request, signal).await
            }
            KnowsOperation::GetPaperEn => {
                let request = DetailRequest::from_args(args)?;
                client.get_paper_en(&request, signal).await
            }
            KnowsOperation::GetPaperCn => {
                let request = EvidenceRequest::from_args(args)?;
                client.get_paper_cn(&request.evidence_id, signal).await
            }
            KnowsOperation::GetGuide => {
                let request = DetailRequest::from_args(args)?;
                client.get_guide(&request, signal).await
            }
            KnowsOperation::GetMeeting => {
                let request = DetailRequest::from_args(args)?;
                client.get_meeting(&request, signal).await
            }
            KnowsOperation::GetEvidenceDetail => {
                let request = EvidenceDetailRequest::from_args(args)?;
                client
                    .fetch_evidence_detail(request.kind, &request.detail, signal)
                    .await
            }
            KnowsOperation::AutoTagging => {
                let request = TaggingRequest::from_args(args)?;
                client.auto_tagging(&request, signal).await
            }
            KnowsOperation::ListQuestion => {
                let request = ListRequest::from_args(args)?;
                client.list_question(&request, signal).await
            }
            KnowsOperation::ListInterpretation => {
                let request = ListRequest::from_args(args)?;
                client.list_interpretation(&request, signal).await
            }
            KnowsOperation::BatchAnswer => {
                let request = BatchAnswerRequest::from_args(args)?;
                return self.batch_answer(operation, request, signal).await;
            }
            KnowsOperation::BatchGetEvidenceDetails => {
                let request = BatchEvidenceRequest::from_args(args)?;
                return self.batch_evidence(operation, request, signal).await;
            }
        };

        result.map_err(tool_error)
    }

    async fn batch_answer(
        self: &Arc<Self>,
        operation: KnowsOperation,
        request: BatchAnswerRequest,
        signal: &CancelSignal,
    ) -> Result<Value, ToolError> {
        let keys = request
            .items
            .iter()
            .map(|item| AnswerKey {
                question_id: item.question_id.clone(),
            })
            .collect::<Vec<_>>();

        let state = Arc::clone(self);
        let signal = signal.clone();
        let outcomes = self
            .run_batch(operation, request.items, move |item: AnswerRequest| {
                let state = Arc::clone(&state);
                let signal = signal.clone();
                async move {
                    state
                        .client
                        .answer(&item, &signal)
                        .await
                        .map_err(|err| err.message)
                }
            })
            .await;

        rows_to_value(keys, outcomes)
    }

    async fn batch_evidence(
        self: &Arc<Self>,
        operation: KnowsOperation,
        request: BatchEvidenceRequest,
        signal: &CancelSignal,
    ) -> Result<Value, ToolError> {
        let keys = request
            .items
            .iter()
            .map(|item| EvidenceKey {
                evidence_id: item.evidence_id.clone(),
                kind: item.kind,
            })
            .collect::<Vec<_>>();

        let state = Arc::clone(self);
        let signal = signal.clone();
        let translate = request.translate_to_chinese;
        let outcomes = self
            .run_batch(operation, request.items, move |item| {
                let state = Arc::clone(&state);
                let signal = signal.clone();
                async move {
                    let detail = DetailRequest::new(item.evidence_id, translate);
                    state
                        .client
                        .fetch_evidence_detail(item.kind, &detail, &signal)
                        .await
                        .map_err(|err| err.message)
                }
            })
            .await;

        rows_to_value(keys, outcomes)
    }

    async fn run_batch<T, F, Fut>(
        &self,
        operation: KnowsOperation,
        items: Vec<T>,
        task: F,
    ) -> Vec<BatchOutcome>
    where
        T: Send + 'static,
        F: Fn(T) -> Fut + Send + Sync + 'static,
        Fut: std::future::Future<Output = Result<Value, String>> + Send + 'static,
    {
        let started = Instant::now();
        self.hooks
            .on_batch_start(operation.name(), items.len(), self.batch.concurrency());

        let outcomes = self.batch.run(items, task).await;

        let succeeded = outcomes.iter().filter(|outcome| outcome.is_success()).count();
        self.hooks.on_batch_complete(
            operation.name(),
            succeeded,
            outcomes.len() - succeeded,
            started.elapsed(),
        );
        outcomes
    }
}

fn rows_to_value<K: Serialize>(keys: Vec<K>, outcomes: Vec<BatchOutcome>) -> Result<Value, ToolError> {
    let rows = keys
        .into_iter()
        .zip(outcomes)
        .enumerate()
        .map(|(index, (key, outcome))| BatchRow::new(index, key, outcome))
        .collect::<Vec<_>>();

    serde_json::to_value(rows)
        .map_err(|err| ToolError::execution(format!("failed to serialize batch results: {err}")))
}

struct KnowsTool {
    operation: KnowsOperation,
    state: Arc<OperationState>,
}

impl Tool for KnowsTool {
    fn definition(&self) -> ToolDefinition {
        self.operation.definition()
    }

    fn invoke<'a>(
        &'a self,
        args: &'a ToolArgs,
        context: &'a ToolExecutionContext,
    ) -> ToolFuture<'a, Result<String, ToolError>> {
        Box::pin(async move {
            let value = self
                .state
                .execute(self.operation, args, &context.signal)
                .await?;

            serde_json::to_string(&value).map_err(|err| {
                ToolError::execution(format!("failed to serialize knows response: {err}"))
            })
        })
    }
}
