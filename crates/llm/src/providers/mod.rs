pub mod gemini_tool_provider;

use std::sync::Arc;

use finder_core::config::LlmConfig;
use finder_core::ConfigError;
use finder_tool_runtime::ToolAwareLlmProvider;

use self::gemini_tool_provider::GeminiToolProvider;

/// Create the tool-aware provider described by config.
pub fn create_tool_provider(
    llm_config: &LlmConfig,
) -> Result<Arc<dyn ToolAwareLlmProvider>, ConfigError> {
    let provider = GeminiToolProvider::from_config(llm_config)?;
    tracing::info!(model = %provider.model(), "Gemini provider ready");
    Ok(Arc::new(provider))
}
