//! Capability layer for declaring, validating and executing tools.

mod args;
mod error;
mod hooks;
mod registry;
mod runtime;
mod tool;
mod types;

pub mod prelude {
    pub use crate::{
        DefaultToolRuntime, Tool, ToolArgs, ToolCall, ToolDefinition, ToolError, ToolErrorKind,
        ToolExecutionContext, ToolExecutionResult, ToolFuture, ToolRegistry, ToolRuntime,
    };
}

pub use args::{
    ToolArgs, indexed, normalize_choice, optional_bool, optional_i64, optional_string,
    optional_string_array, parse_json_object, parse_json_value, required_array,
    required_object_array, required_string,
};
pub use error::{ToolError, ToolErrorKind};
pub use hooks::{NoopToolRuntimeHooks, ToolRuntimeHooks};
pub use registry::ToolRegistry;
pub use runtime::{DefaultToolRuntime, ToolRuntime};
pub use tool::{FunctionTool, Tool, ToolFuture};
pub use types::{ToolCall, ToolDefinition, ToolExecutionContext, ToolExecutionResult};
