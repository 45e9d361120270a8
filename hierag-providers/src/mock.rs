//! ABOUTME: Hand-written mock providers for tests (feature `test-util`)
//! ABOUTME: Deterministic embeddings/completions so ingestion/retrieval tests don't need network access

use async_trait::async_trait;
use hierag_core::error::{HieragError, Result};
use hierag_core::traits::completion::CompletionProvider;
use hierag_core::traits::embedding::RegisteredModel;
use hierag_core::traits::{EmbeddingOperation, EmbeddingProvider};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Deterministic embedding provider: hashes each text into a fixed-dimension
/// vector so repeated calls with the same text produce the same vector
/// (useful for asserting on hybrid-ranking order without real embeddings).
pub struct MockEmbeddingProvider {
    name: String,
    dimension: usize,
    context_length: usize,
    pub fail_next_n: Mutex<usize>,
    pub call_count: AtomicUsize,
}

impl MockEmbeddingProvider {
    #[must_use]
    pub fn new(name: impl Into<String>, dimension: usize, context_length: usize) -> Self {
        Self {
            name: name.into(),
            dimension,
            context_length,
            fail_next_n: Mutex::new(0),
            call_count: AtomicUsize::new(0),
        }
    }

    /// Arrange for the next `n` calls to `embed` to return a transient
    /// error (§4.5.4 fault-tolerance tests).
    pub fn fail_next(&self, n: usize) {
        *self.fail_next_n.lock() = n;
    }

    fn deterministic_vector(&self, text: &str) -> Vec<f32> {
        let mut seed: u64 = 1469598103934665603;
        for byte in text.bytes() {
            seed ^= u64::from(byte);
            seed = seed.wrapping_mul(1099511628211);
        }
        (0..self.dimension)
            .map(|i| {
                let x = seed.wrapping_add(i as u64);
                #[allow(clippy::cast_precision_loss)]
                let frac = (x % 10_000) as f32 / 10_000.0;
                frac
            })
            .collect()
    }
}

#[async_trait]
impl EmbeddingProvider for MockEmbeddingProvider {
    fn name(&self) -> &str {
        &self.name
    }

    fn registered_models(&self) -> Vec<RegisteredModel> {
        vec![RegisteredModel::new("mock-embed", vec!["mock".to_string()])]
    }

    async fn embed(
        &self,
        _operation: EmbeddingOperation,
        texts: &[String],
        _model: Option<&str>,
    ) -> Result<Vec<Vec<f32>>> {
        self.call_count.fetch_add(1, Ordering::SeqCst);
        {
            let mut remaining = self.fail_next_n.lock();
            if *remaining > 0 {
                *remaining -= 1;
                return Err(HieragError::TransientProviderError {
                    provider: self.name.clone(),
                    message: "mock induced failure".to_string(),
                });
            }
        }
        Ok(texts.iter().map(|t| self.deterministic_vector(t)).collect())
    }

    fn dimension(&self, _model: Option<&str>) -> usize {
        self.dimension
    }

    fn context_length(&self, _model: Option<&str>) -> usize {
        self.context_length
    }

    fn token_count(&self, text: &str, _model_tier: &str) -> usize {
        text.split_whitespace().count()
    }
}

/// Completion provider that returns a fixed or templated string, useful for
/// testing the summary/oversize-condensation code paths deterministically.
pub struct MockCompletionProvider {
    name: String,
    pub fail_next_n: Mutex<usize>,
}

impl MockCompletionProvider {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fail_next_n: Mutex::new(0),
        }
    }

    pub fn fail_next(&self, n: usize) {
        *self.fail_next_n.lock() = n;
    }
}

#[async_trait]
impl CompletionProvider for MockCompletionProvider {
    fn name(&self) -> &str {
        &self.name
    }

    fn registered_models(&self) -> Vec<RegisteredModel> {
        vec![RegisteredModel::new("mock-complete", vec![])]
    }

    async fn complete(
        &self,
        _system_prompt: &str,
        user_prompt: &str,
        _model: Option<&str>,
        max_tokens: Option<usize>,
    ) -> Result<String> {
        {
            let mut remaining = self.fail_next_n.lock();
            if *remaining > 0 {
                *remaining -= 1;
                return Err(HieragError::TransientProviderError {
                    provider: self.name.clone(),
                    message: "mock induced failure".to_string(),
                });
            }
        }
        let summary = format!("summary of: {}", &user_prompt[..user_prompt.len().min(200)]);
        match max_tokens {
            Some(limit) => Ok(summary.chars().take(limit * 4).collect()),
            None => Ok(summary),
        }
    }

    fn token_count(&self, text: &str, _model_tier: &str) -> usize {
        text.split_whitespace().count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn deterministic_vectors_are_stable() {
        let provider = MockEmbeddingProvider::new("mock", 8, 2048);
        let a = provider
            .embed(EmbeddingOperation::Document, &["hello".to_string()], None)
            .await
            .unwrap();
        let b = provider
            .embed(EmbeddingOperation::Document, &["hello".to_string()], None)
            .await
            .unwrap();
        assert_eq!(a, b);
    }

    #[tokio::test]
    async fn fail_next_induces_transient_error_then_recovers() {
        let provider = MockEmbeddingProvider::new("mock", 4, 2048);
        provider.fail_next(1);
        let err = provider
            .embed(EmbeddingOperation::Document, &["x".to_string()], None)
            .await
            .unwrap_err();
        assert!(matches!(err, HieragError::TransientProviderError { .. }));
        assert!(provider
            .embed(EmbeddingOperation::Document, &["x".to_string()], None)
            .await
            .is_ok());
    }
}
