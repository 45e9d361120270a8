//! ABOUTME: Provider Pool (spec §4.2) — ordered providers, routing strategies, retry policy

use crate::registry::{ModelRegistryCache, ProviderModelEntry, SharedModelRegistry};
use hierag_config::{ProviderEntryConfig, ProviderPoolConfig, RoutingStrategy};
use hierag_core::error::{HieragError, Result};
use hierag_core::traits::{CompletionProvider, EmbeddingOperation, EmbeddingProvider};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, warn};

/// A single routable backend paired with its pool configuration entry.
struct Entry<P: ?Sized> {
    config: ProviderEntryConfig,
    provider: Arc<P>,
}

/// Generic routing core shared by the embedding and completion pools
/// (§4.2's seven routing strategies apply identically to both operation
/// kinds; only the underlying trait object differs).
struct RoutedPool<P: ?Sized + Send + Sync> {
    entries: Vec<Entry<P>>,
    strategy: RoutingStrategy,
    round_robin: AtomicUsize,
}

impl<P: ?Sized + Send + Sync> RoutedPool<P> {
    fn new(strategy: RoutingStrategy) -> Self {
        Self {
            entries: Vec::new(),
            strategy,
            round_robin: AtomicUsize::new(0),
        }
    }

    fn push(&mut self, config: ProviderEntryConfig, provider: Arc<P>) {
        self.entries.push(Entry { config, provider });
    }

    fn primary(&self) -> Option<Arc<P>> {
        self.entries.first().map(|e| Arc::clone(&e.provider))
    }

    fn by_name(&self, name: &str) -> Option<Arc<P>> {
        self.entries
            .iter()
            .find(|e| e.config.name == name)
            .map(|e| Arc::clone(&e.provider))
    }

    /// Ordered providers to try: primary-first for most strategies, the
    /// full rotation for `FAILOVER` (§4.2: "Try providers in order; on
    /// transient failure, try next").
    fn failover_order(&self) -> Vec<Arc<P>> {
        self.entries.iter().map(|e| Arc::clone(&e.provider)).collect()
    }

    fn round_robin_next(&self) -> Option<Arc<P>> {
        if self.entries.is_empty() {
            return None;
        }
        let idx = self.round_robin.fetch_add(1, Ordering::Relaxed) % self.entries.len();
        Some(Arc::clone(&self.entries[idx].provider))
    }

    fn for_operation_tag(&self, tag: &str) -> Option<Arc<P>> {
        self.entries
            .iter()
            .find(|e| e.config.operations.iter().any(|o| o == tag))
            .map(|e| Arc::clone(&e.provider))
    }

    /// Select a provider for one call, given an optional explicit model
    /// name and an operation tag (used by `SPECIALIZED`).
    ///
    /// `size_hint` is the request's approximate text volume, consulted only
    /// by `SMART_ROUTING` (§9 Open Questions: "implementation-defined but
    /// must be deterministic for equal inputs" — here, batches above
    /// [`SMART_ROUTING_SIZE_THRESHOLD`] route round-robin to spread load,
    /// smaller ones go to primary to avoid round-robin overhead).
    fn select(
        &self,
        model: Option<&str>,
        operation_tag: &str,
        size_hint: usize,
        registry: &ModelRegistryCache,
    ) -> Result<Arc<P>> {
        if self.entries.is_empty() {
            return Err(HieragError::NoProviderForModel {
                model: model.unwrap_or("<none>").to_string(),
            });
        }

        match self.strategy {
            RoutingStrategy::PrimaryOnly | RoutingStrategy::Failover => {
                Ok(self.primary().expect("checked non-empty above"))
            }
            RoutingStrategy::RoundRobin => {
                Ok(self.round_robin_next().expect("checked non-empty above"))
            }
            RoutingStrategy::ModelBased => {
                if let Some(model) = model {
                    match registry.resolve(model) {
                        Ok((provider_name, _)) => {
                            if let Some(provider) = self.by_name(&provider_name) {
                                return Ok(provider);
                            }
                        }
                        Err(_) => {}
                    }
                }
                warn!(model, "MODEL_BASED routing falling back to primary provider");
                Ok(self.primary().expect("checked non-empty above"))
            }
            RoutingStrategy::Specialized => Ok(self
                .for_operation_tag(operation_tag)
                .unwrap_or_else(|| self.primary().expect("checked non-empty above"))),
            RoutingStrategy::SmartRouting => {
                if size_hint > SMART_ROUTING_SIZE_THRESHOLD {
                    Ok(self.round_robin_next().expect("checked non-empty above"))
                } else {
                    Ok(self.primary().expect("checked non-empty above"))
                }
            }
            RoutingStrategy::DualVerification => Ok(self.primary().expect("checked non-empty above")),
        }
    }

    /// Second provider for `DUAL_VERIFICATION` (§4.2), if one is configured.
    fn secondary(&self) -> Option<Arc<P>> {
        self.entries.get(1).map(|e| Arc::clone(&e.provider))
    }
}

/// Batches above this combined character count route round-robin under
/// `SMART_ROUTING`; below it, primary is cheaper (no rotation bookkeeping).
const SMART_ROUTING_SIZE_THRESHOLD: usize = 20_000;

/// Tolerance for `DUAL_VERIFICATION` disagreement: cosine distance between
/// the two providers' vectors for the same text above this is surfaced as a
/// discrepancy (§9 Open Questions leaves the exact tolerance to the
/// implementer).
const DUAL_VERIFICATION_COSINE_TOLERANCE: f32 = 0.15;

/// Holds the ordered provider sets and dispatches embedding/completion
/// calls per the configured [`RoutingStrategy`] (spec §4.2).
pub struct ProviderPool {
    embedding: RoutedPool<dyn EmbeddingProvider>,
    completion: RoutedPool<dyn CompletionProvider>,
    embedding_registry: SharedModelRegistry,
    completion_registry: SharedModelRegistry,
    max_retries: u32,
    retry_base_delay: Duration,
    default_embedding_model: Option<String>,
    default_completion_model: Option<String>,
}

impl ProviderPool {
    /// Process-wide embedding dispatch (§4.2 `embeddings`).
    ///
    /// Retries transient failures up to `max_retries` times with
    /// exponential backoff; under `FAILOVER`, exhausting one provider's
    /// retries advances to the next provider before giving up
    /// (`AllProvidersFailed`).
    ///
    /// # Errors
    ///
    /// Returns [`HieragError::NoProviderForModel`] if the pool is empty,
    /// or [`HieragError::AllProvidersFailed`] once every candidate provider
    /// has exhausted its retries.
    pub async fn embeddings(
        &self,
        operation: EmbeddingOperation,
        texts: &[String],
        model: Option<&str>,
    ) -> Result<Vec<Vec<f32>>> {
        let model = model.or(self.default_embedding_model.as_deref());
        let size_hint: usize = texts.iter().map(String::len).sum();
        let operation_tag = "embedding";

        if matches!(self.embedding.strategy, RoutingStrategy::Failover) {
            return self.embeddings_with_failover(operation, texts, model).await;
        }

        let provider = self.embedding.select(
            model,
            operation_tag,
            size_hint,
            &self.embedding_registry,
        )?;
        let result = self
            .call_with_retry("embeddings", provider.name(), || {
                provider.embed(operation, texts, model)
            })
            .await?;

        if matches!(self.embedding.strategy, RoutingStrategy::DualVerification) {
            if let Some(secondary) = self.embedding.secondary() {
                let verification = secondary.embed(operation, texts, model).await?;
                check_dual_verification(&result, &verification);
            }
        }

        Ok(result)
    }

    async fn embeddings_with_failover(
        &self,
        operation: EmbeddingOperation,
        texts: &[String],
        model: Option<&str>,
    ) -> Result<Vec<Vec<f32>>> {
        let mut last_error = String::new();
        for provider in self.embedding.failover_order() {
            match self
                .call_with_retry("embeddings", provider.name(), || {
                    provider.embed(operation, texts, model)
                })
                .await
            {
                Ok(result) => return Ok(result),
                Err(err) => {
                    last_error = err.to_string();
                    warn!(provider = provider.name(), error = %last_error, "failover: provider exhausted, trying next");
                }
            }
        }
        Err(HieragError::AllProvidersFailed {
            operation: "embeddings".to_string(),
            last_error,
        })
    }

    /// Process-wide completion dispatch (§4.2 `completion`).
    ///
    /// # Errors
    ///
    /// See [`Self::embeddings`].
    pub async fn completion(
        &self,
        system_prompt: &str,
        user_prompt: &str,
        model: Option<&str>,
    ) -> Result<String> {
        let model = model.or(self.default_completion_model.as_deref());
        let size_hint = system_prompt.len() + user_prompt.len();

        if matches!(self.completion.strategy, RoutingStrategy::Failover) {
            let mut last_error = String::new();
            for provider in self.completion.failover_order() {
                match self
                    .call_with_retry("completion", provider.name(), || {
                        provider.complete(system_prompt, user_prompt, model, None)
                    })
                    .await
                {
                    Ok(result) => return Ok(result),
                    Err(err) => {
                        last_error = err.to_string();
                        warn!(provider = provider.name(), error = %last_error, "failover: provider exhausted, trying next");
                    }
                }
            }
            return Err(HieragError::AllProvidersFailed {
                operation: "completion".to_string(),
                last_error,
            });
        }

        let provider = self.completion.select(
            model,
            "completion",
            size_hint,
            &self.completion_registry,
        )?;
        self.call_with_retry("completion", provider.name(), || {
            provider.complete(system_prompt, user_prompt, model, None)
        })
        .await
    }

    /// Count tokens for the opaque `model_tier` (e.g. `"fast"`), via the
    /// primary embedding provider (§4.2 `tokenCount`).
    #[must_use]
    pub fn token_count(&self, text: &str, model_tier: &str) -> usize {
        self.embedding
            .primary()
            .map(|p| p.token_count(text, model_tier))
            .unwrap_or_else(|| text.len() / 4)
    }

    /// Resolve the provider serving `model` via the Model Registry Cache
    /// (§4.2 `getProviderForModel`).
    ///
    /// # Errors
    ///
    /// Returns [`HieragError::NoProviderForModel`] when unresolved.
    pub fn embedding_provider_for_model(&self, model: &str) -> Result<Arc<dyn EmbeddingProvider>> {
        let (provider_name, _) = self.embedding_registry.resolve(model)?;
        self.embedding
            .by_name(&provider_name)
            .ok_or_else(|| HieragError::NoProviderForModel {
                model: model.to_string(),
            })
    }

    /// Select an embedding provider for an `EmbeddingContext` (§4.5.1):
    /// resolves by name when a model is configured, otherwise falls back to
    /// the pool's routing strategy (effectively primary) with no model
    /// pinned.
    ///
    /// # Errors
    ///
    /// Returns [`HieragError::NoProviderForModel`] if the pool has no
    /// embedding providers configured at all.
    pub fn select_embedding_provider(&self, model: Option<&str>) -> Result<Arc<dyn EmbeddingProvider>> {
        match model {
            Some(name) => self.embedding_provider_for_model(name),
            None => self.embedding.select(None, "embedding", 0, &self.embedding_registry),
        }
    }

    /// Select a completion provider for an `LLMContext` (§4.5.1), same
    /// fallback rule as [`Self::select_embedding_provider`].
    ///
    /// # Errors
    ///
    /// Returns [`HieragError::NoProviderForModel`] if the pool has no
    /// completion providers configured at all.
    pub fn select_completion_provider(&self, model: Option<&str>) -> Result<Arc<dyn CompletionProvider>> {
        match model {
            Some(name) => self.completion_provider_for_model(name),
            None => self.completion.select(None, "completion", 0, &self.completion_registry),
        }
    }

    /// Resolve the provider serving `model` for completions.
    ///
    /// # Errors
    ///
    /// Returns [`HieragError::NoProviderForModel`] when unresolved.
    pub fn completion_provider_for_model(&self, model: &str) -> Result<Arc<dyn CompletionProvider>> {
        let (provider_name, _) = self.completion_registry.resolve(model)?;
        self.completion
            .by_name(&provider_name)
            .ok_or_else(|| HieragError::NoProviderForModel {
                model: model.to_string(),
            })
    }

    #[must_use]
    pub fn embedding_registry(&self) -> SharedModelRegistry {
        Arc::clone(&self.embedding_registry)
    }

    #[must_use]
    pub fn completion_registry(&self) -> SharedModelRegistry {
        Arc::clone(&self.completion_registry)
    }

    /// Retry a fallible call up to `max_retries` times with exponential
    /// backoff, but only for [`HieragError::is_recoverable`] errors (§4.2:
    /// "Non-retryable errors... fail fast").
    async fn call_with_retry<T, F, Fut>(&self, op_name: &str, provider_name: &str, mut call: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: std::future::Future<Output = Result<T>>,
    {
        let mut attempt = 0;
        loop {
            match call().await {
                Ok(value) => return Ok(value),
                Err(err) if err.is_recoverable() && attempt < self.max_retries => {
                    attempt += 1;
                    let delay = self.retry_base_delay * 2u32.pow(attempt - 1);
                    warn!(
                        provider = provider_name,
                        op = op_name,
                        attempt,
                        max_retries = self.max_retries,
                        delay_ms = delay.as_millis() as u64,
                        "transient provider error, retrying"
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(err) => {
                    error!(provider = provider_name, op = op_name, error = %err, "provider call failed");
                    return Err(err);
                }
            }
        }
    }
}

/// Flags a `DUAL_VERIFICATION` discrepancy when the two providers'
/// embeddings for the same text diverge beyond [`DUAL_VERIFICATION_COSINE_TOLERANCE`].
fn check_dual_verification(primary: &[Vec<f32>], secondary: &[Vec<f32>]) {
    for (i, (a, b)) in primary.iter().zip(secondary.iter()).enumerate() {
        let sim = cosine_similarity(a, b);
        if 1.0 - sim > DUAL_VERIFICATION_COSINE_TOLERANCE {
            warn!(
                index = i,
                cosine_similarity = sim,
                "DUAL_VERIFICATION discrepancy between primary and secondary embeddings"
            );
        }
    }
}

fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

/// Builder for [`ProviderPool`], pairing each already-constructed provider
/// instance with its pool configuration entry.
pub struct ProviderPoolBuilder {
    config: ProviderPoolConfig,
    embedding_providers: Vec<(ProviderEntryConfig, Arc<dyn EmbeddingProvider>)>,
    completion_providers: Vec<(ProviderEntryConfig, Arc<dyn CompletionProvider>)>,
}

impl ProviderPoolBuilder {
    #[must_use]
    pub fn new(config: ProviderPoolConfig) -> Self {
        Self {
            config,
            embedding_providers: Vec::new(),
            completion_providers: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_embedding_provider(
        mut self,
        config: ProviderEntryConfig,
        provider: Arc<dyn EmbeddingProvider>,
    ) -> Self {
        self.embedding_providers.push((config, provider));
        self
    }

    #[must_use]
    pub fn with_completion_provider(
        mut self,
        config: ProviderEntryConfig,
        provider: Arc<dyn CompletionProvider>,
    ) -> Self {
        self.completion_providers.push((config, provider));
        self
    }

    /// Build the pool, performing the initial Model Registry Cache
    /// population (§4.1: "On provider-pool initialization... enumerate
    /// each provider's registered models").
    #[must_use]
    pub fn build(self) -> ProviderPool {
        let mut embedding = RoutedPool::new(self.config.strategy);
        let mut embedding_entries = Vec::new();
        for (config, provider) in self.embedding_providers {
            for model in provider.registered_models() {
                embedding_entries.push(ProviderModelEntry {
                    provider_name: config.name.clone(),
                    canonical_name: model.canonical_name,
                    aliases: model.aliases,
                });
            }
            embedding.push(config, provider);
        }

        let mut completion = RoutedPool::new(self.config.strategy);
        let mut completion_entries = Vec::new();
        for (config, provider) in self.completion_providers {
            for model in provider.registered_models() {
                completion_entries.push(ProviderModelEntry {
                    provider_name: config.name.clone(),
                    canonical_name: model.canonical_name,
                    aliases: model.aliases,
                });
            }
            completion.push(config, provider);
        }

        // §4.1: "Fails with NoProviderForModel when the lookup fails and no
        // default provider is configured" — the registry's fallback is only
        // populated from an explicit `registry_default_provider`, never
        // auto-injected from the pool's primary. MODEL_BASED's own
        // "fall back to primary" is handled separately by `RoutedPool::select`.
        let registry_default = self.config.registry_default_provider.clone();
        let embedding_registry = Arc::new(ModelRegistryCache::build(
            &embedding_entries,
            registry_default.clone(),
        ));
        let completion_registry = Arc::new(ModelRegistryCache::build(
            &completion_entries,
            registry_default,
        ));

        ProviderPool {
            embedding,
            completion,
            embedding_registry,
            completion_registry,
            max_retries: self.config.max_retries,
            retry_base_delay: Duration::from_millis(200),
            default_embedding_model: self.config.default_embedding_model,
            default_completion_model: self.config.default_completion_model,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use hierag_core::traits::embedding::RegisteredModel;

    struct StubEmbedding {
        name: String,
    }

    #[async_trait]
    impl EmbeddingProvider for StubEmbedding {
        fn name(&self) -> &str {
            &self.name
        }

        fn registered_models(&self) -> Vec<RegisteredModel> {
            vec![RegisteredModel::new(format!("{}-model", self.name), vec![])]
        }

        async fn embed(
            &self,
            _operation: EmbeddingOperation,
            texts: &[String],
            _model: Option<&str>,
        ) -> Result<Vec<Vec<f32>>> {
            Ok(texts.iter().map(|_| vec![1.0, 0.0]).collect())
        }

        fn dimension(&self, _model: Option<&str>) -> usize {
            2
        }

        fn context_length(&self, _model: Option<&str>) -> usize {
            4096
        }

        fn token_count(&self, text: &str, _model_tier: &str) -> usize {
            text.len()
        }
    }

    fn entry(name: &str, operations: Vec<&str>) -> ProviderEntryConfig {
        ProviderEntryConfig {
            name: name.to_string(),
            provider_type: "stub".to_string(),
            operations: operations.into_iter().map(str::to_string).collect(),
            ..ProviderEntryConfig::new(name, "stub")
        }
    }

    fn pool_with(strategy: RoutingStrategy, names: &[&str]) -> ProviderPool {
        let mut config = ProviderPoolConfig {
            strategy,
            ..ProviderPoolConfig::default()
        };
        let mut builder = ProviderPoolBuilder::new(config.clone());
        for name in names {
            let e = entry(name, vec![]);
            config.providers.push(e.clone());
            builder = builder.with_embedding_provider(
                e,
                Arc::new(StubEmbedding {
                    name: (*name).to_string(),
                }),
            );
        }
        builder.build()
    }

    #[tokio::test]
    async fn primary_only_always_selects_first_provider() {
        let pool = pool_with(RoutingStrategy::PrimaryOnly, &["a", "b"]);
        let result = pool
            .embeddings(EmbeddingOperation::Document, &["x".to_string()], None)
            .await
            .unwrap();
        assert_eq!(result.len(), 1);
    }

    #[tokio::test]
    async fn round_robin_cycles_through_providers() {
        let pool = pool_with(RoutingStrategy::RoundRobin, &["a", "b"]);
        let first = pool.embedding.round_robin_next().unwrap();
        let second = pool.embedding.round_robin_next().unwrap();
        assert_ne!(first.name(), second.name());
        let third = pool.embedding.round_robin_next().unwrap();
        assert_eq!(first.name(), third.name());
    }

    #[tokio::test]
    async fn model_based_falls_back_to_primary_when_unresolved() {
        let pool = pool_with(RoutingStrategy::ModelBased, &["a", "b"]);
        let provider = pool.embedding.select(
            Some("unknown-model"),
            "embedding",
            0,
            &pool.embedding_registry,
        );
        assert_eq!(provider.unwrap().name(), "a");
    }

    #[tokio::test]
    async fn empty_pool_fails_with_no_provider_for_model() {
        let pool = pool_with(RoutingStrategy::PrimaryOnly, &[]);
        let err = pool
            .embeddings(EmbeddingOperation::Document, &["x".to_string()], None)
            .await
            .unwrap_err();
        assert!(matches!(err, HieragError::NoProviderForModel { .. }));
    }
}
