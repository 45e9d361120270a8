//! Embedding generation trait, generalized from a single-provider interface
//! to the provider-pool dispatch surface of spec §4.2.

use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Semantic operation tag for an embedding batch (§4.2).
///
/// Providers that cannot distinguish operations treat all of these as
/// `Default`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EmbeddingOperation {
    Query,
    Document,
    Clustering,
    Classification,
    SemanticSimilarity,
    FactCheck,
    CodeRetrieval,
    #[default]
    Default,
}

/// Trait for providers that support embedding generation.
///
/// One concrete provider wraps one remote (or local) embedding backend; the
/// Provider Pool (`hierag-providers`) holds an ordered set of these and
/// routes each call according to the configured strategy.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Unique identifier for this provider instance (e.g. `"openai"`, `"ollama"`).
    fn name(&self) -> &str;

    /// The full set of model names this provider has registered, including
    /// aliases — not just the models currently loaded. Feeds the Model
    /// Registry Cache (§4.1).
    fn registered_models(&self) -> Vec<RegisteredModel>;

    /// Generate embeddings for a batch of texts tagged with a semantic
    /// operation (§4.2).
    ///
    /// # Errors
    ///
    /// Returns [`crate::error::HieragError::TransientProviderError`] on
    /// timeouts/5xx (retryable by the caller's pool policy), or other
    /// variants for non-retryable failures (model not found, auth).
    async fn embed(
        &self,
        operation: EmbeddingOperation,
        texts: &[String],
        model: Option<&str>,
    ) -> Result<Vec<Vec<f32>>>;

    /// Fixed dimensionality of embeddings produced by this provider for the
    /// given model (or its default model if `None`).
    fn dimension(&self, model: Option<&str>) -> usize;

    /// Declared maximum input length (in tokens) for the given model.
    fn context_length(&self, model: Option<&str>) -> usize;

    /// Count tokens in `text` for the given opaque model tier (e.g. `"fast"`).
    fn token_count(&self, text: &str, model_tier: &str) -> usize;
}

/// A single model registered by a provider, with its declared aliases
/// (§4.1: "Build a mapping `normalized_name → provider`, and for each model
/// also index its declared aliases").
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisteredModel {
    pub canonical_name: String,
    pub aliases: Vec<String>,
}

impl RegisteredModel {
    #[must_use]
    pub fn new(canonical_name: impl Into<String>, aliases: Vec<String>) -> Self {
        Self {
            canonical_name: canonical_name.into(),
            aliases,
        }
    }
}
