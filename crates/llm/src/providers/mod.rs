pub mod gemini;
mod sse;

use std::str::FromStr;
use std::sync::Arc;

use docqa_core::config::LlmConfig;

use crate::provider::{LlmError, LlmProvider};

/// How the upstream answer is fetched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResponseMode {
    /// One request, one complete answer.
    #[default]
    Buffered,
    /// Server-sent events, one fragment per event.
    Streamed,
}

impl FromStr for ResponseMode {
    type Err = LlmError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "buffered" => Ok(Self::Buffered),
            "stream" | "streamed" => Ok(Self::Streamed),
            other => Err(LlmError::NotConfigured(format!(
                "unknown response mode: '{}'",
                other
            ))),
        }
    }
}

/// Create the configured provider.
pub fn create_provider(llm_config: &LlmConfig) -> Result<Arc<dyn LlmProvider>, LlmError> {
    let mode: ResponseMode = llm_config.response_mode.parse()?;
    match llm_config.provider.as_str() {
        "gemini" => {
            let api_key = llm_config
                .gemini_api_key
                .as_ref()
                .ok_or_else(|| LlmError::NotConfigured("GEMINI_API_KEY not set".into()))?;
            let provider = gemini::GeminiProvider::new(
                api_key.clone(),
                llm_config.gemini_model.clone(),
                llm_config.gemini_base_url.clone(),
                mode,
            )
            .with_generation_config(llm_config.temperature, llm_config.max_tokens);
            Ok(Arc::new(provider))
        }
        other => Err(LlmError::NotConfigured(format!(
            "unknown LLM provider: '{}'",
            other
        ))),
    }
}
