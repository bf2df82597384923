//! Common imports for applications embedding the evidence tools.

pub use crate::{knows_registry, knows_runtime, knows_runtime_with};
pub use crate::{
    AnswerType, CancelSignal, ConfigError, DataScope, DefaultToolRuntime, KnowsHooks,
    KnowsOperation, KnowsOptions, KnowsToolkit, Tool, ToolCall, ToolDefinition, ToolError,
    ToolErrorKind, ToolExecutionContext, ToolExecutionResult, ToolRegistry, ToolRuntime,
};
