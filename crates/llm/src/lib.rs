pub mod prompt;
pub mod provider;
pub mod providers;
pub mod query;
pub mod retrieval;

pub use provider::{FragmentStream, GenerationRequest, LlmError, LlmProvider};
pub use providers::{create_provider, ResponseMode};
pub use query::RagPipeline;
