//! ABOUTME: OpenAI-compatible embedding provider
//! ABOUTME: Implements EmbeddingProvider over the /v1/embeddings HTTP endpoint

use async_trait::async_trait;
use hierag_core::error::{HieragError, Result};
use hierag_core::traits::embedding::RegisteredModel;
use hierag_core::traits::{EmbeddingOperation, EmbeddingProvider};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tiktoken_rs::CoreBPE;

/// Known model -> (dimension, context_length) table. Unknown models fall
/// back to the ada-002-era defaults.
fn model_specs(model: &str) -> (usize, usize) {
    match model {
        "text-embedding-3-large" => (3072, 8191),
        "text-embedding-3-small" => (1536, 8191),
        "text-embedding-ada-002" => (1536, 8191),
        _ => (1536, 8191),
    }
}

/// An OpenAI-compatible embedding endpoint: OpenAI itself, or any
/// `/v1/embeddings`-shaped service (LM Studio, vLLM's OpenAI shim, …).
pub struct OpenAiEmbeddingProvider {
    name: String,
    default_model: String,
    api_key: String,
    base_url: String,
    client: Client,
    tokenizer: CoreBPE,
}

impl OpenAiEmbeddingProvider {
    /// # Errors
    ///
    /// Returns [`HieragError::Internal`] if the bundled tokenizer fails to
    /// load (should not happen with a valid `tiktoken-rs` install).
    pub fn new(
        name: impl Into<String>,
        default_model: impl Into<String>,
        api_key: impl Into<String>,
        base_url: Option<String>,
    ) -> Result<Self> {
        let tokenizer = tiktoken_rs::cl100k_base().map_err(|e| HieragError::Internal {
            message: format!("failed to load tokenizer: {e}"),
        })?;
        Ok(Self {
            name: name.into(),
            default_model: default_model.into(),
            api_key: api_key.into(),
            base_url: base_url.unwrap_or_else(|| "https://api.openai.com/v1".to_string()),
            client: Client::new(),
            tokenizer,
        })
    }

    fn resolve_model<'a>(&'a self, model: Option<&'a str>) -> &'a str {
        model.unwrap_or(&self.default_model)
    }
}

#[derive(Debug, Serialize)]
struct EmbeddingRequest<'a> {
    input: &'a [String],
    model: &'a str,
    encoding_format: &'static str,
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
    index: usize,
}

#[async_trait]
impl EmbeddingProvider for OpenAiEmbeddingProvider {
    fn name(&self) -> &str {
        &self.name
    }

    fn registered_models(&self) -> Vec<RegisteredModel> {
        vec![
            RegisteredModel::new(
                "text-embedding-3-small",
                vec!["openai/text-embedding-3-small".to_string(), "te3s".to_string()],
            ),
            RegisteredModel::new(
                "text-embedding-3-large",
                vec!["openai/text-embedding-3-large".to_string(), "te3l".to_string()],
            ),
            RegisteredModel::new(
                "text-embedding-ada-002",
                vec!["openai/text-embedding-ada-002".to_string(), "ada".to_string()],
            ),
        ]
    }

    async fn embed(
        &self,
        _operation: EmbeddingOperation,
        texts: &[String],
        model: Option<&str>,
    ) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let model = self.resolve_model(model);
        let request = EmbeddingRequest {
            input: texts,
            model,
            encoding_format: "float",
        };

        let url = format!("{}/embeddings", self.base_url);
        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| HieragError::TransientProviderError {
                provider: self.name.clone(),
                message: e.to_string(),
            })?;

        let status = response.status();
        if status.is_server_error() || status.as_u16() == 429 {
            return Err(HieragError::TransientProviderError {
                provider: self.name.clone(),
                message: format!("HTTP {status}"),
            });
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(HieragError::NoProviderForModel {
                model: format!("{model} ({status}: {body})"),
            });
        }

        let parsed: EmbeddingResponse = response.json().await.map_err(|e| HieragError::PersistenceError {
            message: format!("malformed embedding response: {e}"),
        })?;

        let mut sorted = parsed.data;
        sorted.sort_by_key(|d| d.index);
        Ok(sorted.into_iter().map(|d| d.embedding).collect())
    }

    fn dimension(&self, model: Option<&str>) -> usize {
        model_specs(self.resolve_model(model)).0
    }

    fn context_length(&self, model: Option<&str>) -> usize {
        model_specs(self.resolve_model(model)).1
    }

    fn token_count(&self, text: &str, _model_tier: &str) -> usize {
        self.tokenizer.encode_with_special_tokens(text).len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_model_dimension_matches_table() {
        let provider =
            OpenAiEmbeddingProvider::new("openai", "text-embedding-3-small", "sk-test", None).unwrap();
        assert_eq!(provider.dimension(None), 1536);
        assert_eq!(provider.dimension(Some("text-embedding-3-large")), 3072);
    }

    #[test]
    fn token_count_is_nonzero_for_nonempty_text() {
        let provider =
            OpenAiEmbeddingProvider::new("openai", "text-embedding-3-small", "sk-test", None).unwrap();
        assert!(provider.token_count("hello world", "fast") > 0);
        assert_eq!(provider.token_count("", "fast"), 0);
    }

    #[test]
    fn registered_models_include_canonical_and_aliases() {
        let provider =
            OpenAiEmbeddingProvider::new("openai", "text-embedding-3-small", "sk-test", None).unwrap();
        let models = provider.registered_models();
        assert!(models.iter().any(|m| m.canonical_name == "text-embedding-3-small"));
        assert!(models
            .iter()
            .any(|m| m.aliases.iter().any(|a| a == "openai/text-embedding-3-small")));
    }
}
