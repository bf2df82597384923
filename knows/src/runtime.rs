//! Wiring helpers that turn adapter options into a ready tool runtime.

use std::sync::Arc;

use ktooling::{DefaultToolRuntime, ToolRegistry, ToolRuntimeHooks};

use crate::{ConfigError, KnowsOptions, KnowsToolkit};

pub fn knows_registry(options: KnowsOptions) -> Result<ToolRegistry, ConfigError> {
    KnowsToolkit::new(options).build()
}

pub fn knows_runtime(options: KnowsOptions) -> Result<DefaultToolRuntime, ConfigError> {
    Ok(DefaultToolRuntime::new(Arc::new(knows_registry(options)?)))
}

pub fn knows_runtime_with(
    toolkit: KnowsToolkit,
    hooks: Arc<dyn ToolRuntimeHooks>,
) -> Result<DefaultToolRuntime, ConfigError> {
    Ok(DefaultToolRuntime::new(Arc::new(toolkit.build()?)).with_hooks(hooks))
}
