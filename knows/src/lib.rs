//! Tool adapter for the KnowS clinical evidence service.
//!
//! Named operations validate their arguments into typed requests, call the
//! service through a retrying client, cache idempotent detail lookups and fan
//! batch requests out with bounded concurrency. This crate also re-exports the
//! workspace crates it is built on so most callers need a single dependency.
//!
//! ```rust
//! use knows::prelude::*;
//!
//! let runtime = knows_runtime(KnowsOptions::new("key", "https://api.example.com"))
//!     .expect("runtime should build");
//! assert!(runtime.registry().contains("knows_get_paper_en"));
//! ```

mod batch;
mod cache;
mod client;
mod config;
mod hooks;
mod requests;
mod runtime;
mod scope;
mod tools;

pub mod prelude;

pub use kclient;
pub use kcommon;
pub use ktooling;

pub use kclient::{ClientError, ClientErrorKind, HttpTransport, RetryPolicy, SecretString};
pub use kcommon::{BoxFuture, CancelSignal, MetadataMap, SessionId, TraceId};
pub use ktooling::{
    DefaultToolRuntime, Tool, ToolCall, ToolDefinition, ToolError, ToolErrorKind,
    ToolExecutionContext, ToolExecutionResult, ToolRegistry, ToolRuntime, ToolRuntimeHooks,
};

pub use batch::{BatchExecutor, BatchOutcome, BatchRow};
pub use cache::DetailCache;
pub use client::{KnowsClient, cache_key, detail_path, paths};
pub use config::{
    ConfigError, ConfigErrorKind, DEFAULT_BATCH_CONCURRENCY, DEFAULT_CACHE_MAX_ENTRIES,
    DEFAULT_CACHE_TTL, DEFAULT_REQUEST_TIMEOUT, KnowsOptions, KnowsSettings,
};
pub use hooks::{KnowsHooks, NoopKnowsHooks};
pub use requests::{
    AnswerRequest, BatchAnswerRequest, BatchEvidenceRequest, DetailRequest,
    EvidenceDetailRequest, EvidenceItem, EvidenceRequest, ListRequest, SearchRequest,
    TaggingRequest,
};
pub use runtime::{knows_registry, knows_runtime, knows_runtime_with};
pub use scope::{AnswerType, DataScope, EvidenceKind, normalize_data_scopes};
pub use tools::{KnowsOperation, KnowsToolkit, tool_error};
