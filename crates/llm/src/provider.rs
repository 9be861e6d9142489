use std::pin::Pin;

use async_trait::async_trait;
use futures::{Stream, StreamExt};

/// Finite, non-restartable sequence of answer fragments in arrival order.
pub type FragmentStream = Pin<Box<dyn Stream<Item = Result<String, LlmError>> + Send>>;

/// One generation call.
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    pub prompt: String,
    /// Overrides the provider's default model when set.
    pub model: Option<String>,
}

impl GenerationRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            model: None,
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }
}

/// Trait for generation backends. Buffered backends return a
/// single-fragment stream.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Start generating and return the fragment stream.
    async fn stream(&self, request: GenerationRequest) -> Result<FragmentStream, LlmError>;

    /// Drain the stream into the final, trimmed answer.
    async fn generate(&self, request: GenerationRequest) -> Result<String, LlmError> {
        let fragments = self.stream(request).await?;
        collect_answer(fragments).await
    }

    /// Provider name for logging (e.g. "gemini").
    fn provider_name(&self) -> &str;
}

/// Concatenate fragments in arrival order and trim the result.
///
/// The first failing fragment aborts collection. An answer that is empty
/// after trimming is an error.
pub async fn collect_answer(mut fragments: FragmentStream) -> Result<String, LlmError> {
    let mut answer = String::new();
    while let Some(fragment) = fragments.next().await {
        answer.push_str(&fragment?);
    }
    let answer = answer.trim();
    if answer.is_empty() {
        return Err(LlmError::EmptyResponse);
    }
    Ok(answer.to_string())
}

#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("network error: {0}")]
    NetworkError(String),
    #[error("API error: {status}: {body}")]
    ApiError { status: u16, body: String },
    #[error("authentication failed: {0}")]
    AuthError(String),
    #[error("response blocked: {0}")]
    Blocked(String),
    #[error("model returned an empty response")]
    EmptyResponse,
    #[error("failed to parse response: {0}")]
    ParseError(String),
    #[error("generation timed out after {0}s")]
    Timeout(u64),
    #[error("provider not configured: {0}")]
    NotConfigured(String),
}

impl From<reqwest::Error> for LlmError {
    fn from(e: reqwest::Error) -> Self {
        LlmError::NetworkError(e.to_string())
    }
}

/// Scripted provider for tests.
#[cfg(any(test, feature = "test-utils"))]
pub mod mock {
    use super::*;
    use futures::stream;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// Replays a fixed list of fragments and counts invocations.
    pub struct MockLlmProvider {
        fragments: Vec<String>,
        failure: Option<fn() -> LlmError>,
        calls: AtomicUsize,
        prompts: Mutex<Vec<String>>,
    }

    impl MockLlmProvider {
        pub fn with_fragments(fragments: &[&str]) -> Self {
            Self {
                fragments: fragments.iter().map(|f| f.to_string()).collect(),
                failure: None,
                calls: AtomicUsize::new(0),
                prompts: Mutex::new(Vec::new()),
            }
        }

        /// A provider whose every call fails with `make_error()`.
        pub fn failing(make_error: fn() -> LlmError) -> Self {
            Self {
                failure: Some(make_error),
                ..Self::with_fragments(&[])
            }
        }

        pub fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }

        /// Prompts received so far, oldest first.
        pub fn prompts(&self) -> Vec<String> {
            self.prompts.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl LlmProvider for MockLlmProvider {
        async fn stream(&self, request: GenerationRequest) -> Result<FragmentStream, LlmError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.prompts.lock().unwrap().push(request.prompt);
            if let Some(make_error) = self.failure {
                return Err(make_error());
            }
            let fragments: Vec<Result<String, LlmError>> =
                self.fragments.iter().cloned().map(Ok).collect();
            Ok(Box::pin(stream::iter(fragments)))
        }

        fn provider_name(&self) -> &str {
            "mock"
        }
    }
}
