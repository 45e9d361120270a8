//! Completion (LLM text generation) trait — the counterpart of
//! [`super::embedding::EmbeddingProvider`] used for summarization and Q&A
//! enrichment during ingestion (§4.5.1, §4.5.3).

use crate::error::Result;
use crate::traits::embedding::RegisteredModel;
use async_trait::async_trait;

/// Trait for providers that support text completion.
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    /// Unique identifier for this provider instance.
    fn name(&self) -> &str;

    /// The full set of model names this provider has registered.
    fn registered_models(&self) -> Vec<RegisteredModel>;

    /// Execute a completion request.
    ///
    /// # Errors
    ///
    /// Returns [`crate::error::HieragError::TransientProviderError`] on
    /// timeouts/5xx, or other variants for non-retryable failures.
    async fn complete(
        &self,
        system_prompt: &str,
        user_prompt: &str,
        model: Option<&str>,
        max_tokens: Option<usize>,
    ) -> Result<String>;

    /// Count tokens in `text` for the given opaque model tier.
    fn token_count(&self, text: &str, model_tier: &str) -> usize;
}
