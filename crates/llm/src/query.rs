use std::sync::Arc;
use std::time::Duration;

use docqa_core::Config;
use docqa_ingest::Chunk;
use tracing::{debug, info};

use crate::prompt;
use crate::provider::{GenerationRequest, LlmError, LlmProvider};
use crate::retrieval;

/// Retrieve → assemble → generate for one question.
pub struct RagPipeline {
    provider: Arc<dyn LlmProvider>,
    model: Option<String>,
    top_k: usize,
    timeout: Duration,
}

impl RagPipeline {
    pub fn new(provider: Arc<dyn LlmProvider>, top_k: usize, timeout: Duration) -> Self {
        Self {
            provider,
            model: None,
            top_k,
            timeout,
        }
    }

    /// Pin a model id for every request instead of the provider default.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Build from config, creating the configured provider.
    pub fn from_config(config: &Config) -> Result<Self, LlmError> {
        let provider = crate::providers::create_provider(&config.llm)?;
        Ok(Self::new(
            provider,
            config.retrieval.top_k,
            Duration::from_secs(config.llm.timeout_secs),
        )
        .with_model(config.llm.gemini_model.clone()))
    }

    pub fn provider_name(&self) -> &str {
        self.provider.provider_name()
    }

    /// The prompt that would be sent for `query`.
    pub fn build_prompt(&self, query: &str, chunks: &[Chunk]) -> String {
        let retrieved = retrieval::retrieve(query, chunks, self.top_k);
        debug!(
            "Retrieved {} of {} chunks ({} contain the query)",
            retrieved.len(),
            chunks.len(),
            retrieval::match_count(query, chunks)
        );
        prompt::assemble(query, &retrieved)
    }

    /// Answer `query` from `chunks`. A single upstream failure is returned
    /// as-is; there are no retries.
    pub async fn answer(&self, query: &str, chunks: &[Chunk]) -> Result<String, LlmError> {
        let prompt = self.build_prompt(query, chunks);

        let mut request = GenerationRequest::new(prompt);
        if let Some(model) = &self.model {
            request = request.with_model(model.clone());
        }

        info!("Generating answer via {}", self.provider.provider_name());
        let answer = tokio::time::timeout(self.timeout, self.provider.generate(request))
            .await
            .map_err(|_| LlmError::Timeout(self.timeout.as_secs()))??;

        debug!("Answer: {} chars", answer.len());
        Ok(answer)
    }
}
