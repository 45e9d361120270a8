//! ABOUTME: LLMContext / EmbeddingContext (spec §4.5.1)
//! ABOUTME: Bundles a resolved provider + model for one document's processing lifetime

use crate::cache::EmbeddingCache;
use crate::pool::ProviderPool;
use hierag_core::error::Result;
use hierag_core::traits::{EmbeddingOperation, EmbeddingProvider};
use std::sync::Arc;

/// Resolve a model name: explicit caller override, then library default,
/// then process-wide default (§4.5.1: "Both are resolved via: explicit
/// caller override → library default → process-wide default").
fn resolve_model(
    explicit: Option<&str>,
    library_default: Option<&str>,
    process_default: Option<&str>,
) -> Option<String> {
    explicit
        .or(library_default)
        .or(process_default)
        .map(str::to_string)
}

/// Encapsulates the provider/model for embedding operations during one
/// document's ingestion (§4.5.1). Created **before** splitting, because
/// token-counting and oversize handling (§4.5.3) depend on `context_length`.
pub struct EmbeddingContext {
    provider: Arc<dyn EmbeddingProvider>,
    model: Option<String>,
    cache: Option<Arc<EmbeddingCache>>,
}

impl EmbeddingContext {
    /// Resolve an `EmbeddingContext` for one document.
    ///
    /// # Errors
    ///
    /// Returns [`hierag_core::error::HieragError::NoProviderForModel`] if the
    /// resolved model name has no registered provider (§7 fail-fast at
    /// context creation).
    pub fn resolve(
        pool: &ProviderPool,
        explicit_model: Option<&str>,
        library_default_model: Option<&str>,
        process_default_model: Option<&str>,
    ) -> Result<Self> {
        let model = resolve_model(explicit_model, library_default_model, process_default_model);
        let provider = pool.select_embedding_provider(model.as_deref())?;
        Ok(Self { provider, model, cache: None })
    }

    /// Build directly from an already-selected provider (used by tests and
    /// by callers that bypass pool routing).
    #[must_use]
    pub fn from_provider(provider: Arc<dyn EmbeddingProvider>, model: Option<String>) -> Self {
        Self { provider, model, cache: None }
    }

    /// Attach a shared [`EmbeddingCache`] so repeated identical chunk text
    /// (across documents, within this process's lifetime) skips the remote
    /// call (SPEC_FULL §3).
    #[must_use]
    pub fn with_cache(mut self, cache: Arc<EmbeddingCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    /// The model's declared input cap, in tokens (§4.5.3 `cap`).
    #[must_use]
    pub fn context_length(&self) -> usize {
        self.provider.context_length(self.model.as_deref())
    }

    /// Fixed embedding dimensionality for this context's model.
    #[must_use]
    pub fn dimension(&self) -> usize {
        self.provider.dimension(self.model.as_deref())
    }

    /// Batch-dispatch embeddings for a semantic operation (§4.2, §4.5.3
    /// "a single remote call per batch").
    ///
    /// # Errors
    ///
    /// Propagates the provider's error; the caller (the Ingestion
    /// Orchestrator) is responsible for per-batch fault isolation (§4.5.4).
    pub async fn embeddings(
        &self,
        operation: EmbeddingOperation,
        texts: &[String],
    ) -> Result<Vec<Vec<f32>>> {
        let Some(cache) = &self.cache else {
            return self
                .provider
                .embed(operation, texts, self.model.as_deref())
                .await;
        };

        let mut results: Vec<Option<Vec<f32>>> = Vec::with_capacity(texts.len());
        let mut misses: Vec<(usize, String)> = Vec::new();
        for (i, text) in texts.iter().enumerate() {
            match cache.get(self.model.as_deref(), text) {
                Some(vector) => results.push(Some(vector)),
                None => {
                    results.push(None);
                    misses.push((i, text.clone()));
                }
            }
        }

        if !misses.is_empty() {
            let miss_texts: Vec<String> = misses.iter().map(|(_, t)| t.clone()).collect();
            let fresh = self
                .provider
                .embed(operation, &miss_texts, self.model.as_deref())
                .await?;
            for ((i, text), vector) in misses.into_iter().zip(fresh) {
                cache.put(self.model.as_deref(), &text, vector.clone());
                results[i] = Some(vector);
            }
        }

        Ok(results.into_iter().map(|v| v.expect("every index filled by cache hit or miss")).collect())
    }

    /// Count tokens in `text` for the given opaque tier (e.g. `"fast"`).
    #[must_use]
    pub fn token_count(&self, text: &str, model_tier: &str) -> usize {
        self.provider.token_count(text, model_tier)
    }

    /// A cloned handle to the underlying provider, for callers (the
    /// ingestion orchestrator's splitter wiring) that need a `'static`
    /// token-counting closure outliving this context's borrow scope.
    #[must_use]
    pub fn provider_handle(&self) -> Arc<dyn EmbeddingProvider> {
        self.provider.clone()
    }

    #[must_use]
    pub fn model_name(&self) -> Option<&str> {
        self.model.as_deref()
    }
}

/// Encapsulates the provider/model for completion operations used during
/// ingestion enrichment (summaries, Q&A) (§4.5.1).
pub struct LLMContext {
    provider: Arc<dyn hierag_core::traits::CompletionProvider>,
    model: Option<String>,
}

impl LLMContext {
    /// Resolve an `LLMContext` for one document.
    ///
    /// # Errors
    ///
    /// Returns [`hierag_core::error::HieragError::NoProviderForModel`] if the
    /// resolved model name has no registered provider.
    pub fn resolve(
        pool: &ProviderPool,
        explicit_model: Option<&str>,
        library_default_model: Option<&str>,
        process_default_model: Option<&str>,
    ) -> Result<Self> {
        let model = resolve_model(explicit_model, library_default_model, process_default_model);
        let provider = pool.select_completion_provider(model.as_deref())?;
        Ok(Self { provider, model })
    }

    #[must_use]
    pub fn from_provider(
        provider: Arc<dyn hierag_core::traits::CompletionProvider>,
        model: Option<String>,
    ) -> Self {
        Self { provider, model }
    }

    /// Generate a completion (§4.5.2/4.5.3: chapter summaries, oversize-text
    /// condensation).
    ///
    /// # Errors
    ///
    /// Propagates the provider's error.
    pub async fn completion(&self, system_prompt: &str, user_prompt: &str) -> Result<String> {
        self.provider
            .complete(system_prompt, user_prompt, self.model.as_deref(), None)
            .await
    }

    #[must_use]
    pub fn token_count(&self, text: &str, model_tier: &str) -> usize {
        self.provider.token_count(text, model_tier)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_override_wins() {
        let resolved = resolve_model(Some("explicit"), Some("library"), Some("process"));
        assert_eq!(resolved.as_deref(), Some("explicit"));
    }

    #[test]
    fn falls_back_to_library_default() {
        let resolved = resolve_model(None, Some("library"), Some("process"));
        assert_eq!(resolved.as_deref(), Some("library"));
    }

    #[test]
    fn falls_back_to_process_default() {
        let resolved = resolve_model(None, None, Some("process"));
        assert_eq!(resolved.as_deref(), Some("process"));
    }

    #[test]
    fn none_when_nothing_configured() {
        assert_eq!(resolve_model(None, None, None), None);
    }

    struct CountingProvider {
        calls: std::sync::atomic::AtomicUsize,
    }

    #[async_trait::async_trait]
    impl EmbeddingProvider for CountingProvider {
        fn name(&self) -> &str {
            "counting"
        }

        fn registered_models(&self) -> Vec<hierag_core::traits::embedding::RegisteredModel> {
            vec![]
        }

        async fn embed(
            &self,
            _operation: EmbeddingOperation,
            texts: &[String],
            _model: Option<&str>,
        ) -> Result<Vec<Vec<f32>>> {
            self.calls.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
            Ok(texts.iter().map(|t| vec![t.len() as f32]).collect())
        }

        fn dimension(&self, _model: Option<&str>) -> usize {
            1
        }

        fn context_length(&self, _model: Option<&str>) -> usize {
            4096
        }

        fn token_count(&self, text: &str, _model_tier: &str) -> usize {
            text.len()
        }
    }

    #[tokio::test]
    async fn cache_hit_avoids_second_provider_call() {
        let provider = Arc::new(CountingProvider {
            calls: std::sync::atomic::AtomicUsize::new(0),
        });
        let cache = Arc::new(crate::cache::EmbeddingCache::new(crate::cache::EmbeddingCacheConfig::default()));
        let context = EmbeddingContext::from_provider(provider.clone(), None).with_cache(cache);

        let first = context
            .embeddings(EmbeddingOperation::Document, &["hello".to_string()])
            .await
            .unwrap();
        let second = context
            .embeddings(EmbeddingOperation::Document, &["hello".to_string()])
            .await
            .unwrap();

        assert_eq!(first, second);
        assert_eq!(provider.calls.load(std::sync::atomic::Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn cache_only_calls_provider_for_misses_in_mixed_batch() {
        let provider = Arc::new(CountingProvider {
            calls: std::sync::atomic::AtomicUsize::new(0),
        });
        let cache = Arc::new(crate::cache::EmbeddingCache::new(crate::cache::EmbeddingCacheConfig::default()));
        let context = EmbeddingContext::from_provider(provider.clone(), None).with_cache(cache);

        context
            .embeddings(EmbeddingOperation::Document, &["a".to_string()])
            .await
            .unwrap();
        let batch = context
            .embeddings(EmbeddingOperation::Document, &["a".to_string(), "bb".to_string()])
            .await
            .unwrap();

        assert_eq!(batch, vec![vec![1.0], vec![2.0]]);
        assert_eq!(provider.calls.load(std::sync::atomic::Ordering::SeqCst), 2);
    }
}
