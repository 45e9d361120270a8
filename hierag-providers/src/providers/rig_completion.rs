//! ABOUTME: Completion provider wrapping rig-core (OpenAI/Anthropic/Cohere backends)
//! ABOUTME: Per-vendor dispatch generalized over the CompletionProvider trait

use async_trait::async_trait;
use hierag_core::error::{HieragError, Result};
use hierag_core::traits::completion::CompletionProvider;
use hierag_core::traits::embedding::RegisteredModel;
use rig::completion::CompletionModel;
use rig::providers;

enum RigModel {
    OpenAi(providers::openai::CompletionModel),
    Anthropic(providers::anthropic::completion::CompletionModel),
    Cohere(providers::cohere::CompletionModel),
}

/// Completion provider dispatching to one of OpenAI/Anthropic/Cohere via
/// `rig-core`.
pub struct RigCompletionProvider {
    name: String,
    default_model: String,
    model: RigModel,
}

impl RigCompletionProvider {
    /// # Errors
    ///
    /// Returns [`HieragError::Validation`] for an unrecognized `vendor`.
    pub fn new(
        vendor: &str,
        default_model: impl Into<String>,
        api_key: &str,
        base_url: Option<&str>,
    ) -> Result<Self> {
        let default_model = default_model.into();
        let model = match vendor {
            "openai" => {
                let client = providers::openai::Client::new(api_key);
                RigModel::OpenAi(client.completion_model(&default_model))
            }
            "anthropic" => {
                let base_url = base_url.unwrap_or("https://api.anthropic.com");
                let client = providers::anthropic::Client::new(api_key, base_url, None, "2023-06-01");
                RigModel::Anthropic(client.completion_model(&default_model))
            }
            "cohere" => {
                let client = providers::cohere::Client::new(api_key);
                RigModel::Cohere(client.completion_model(&default_model))
            }
            other => {
                return Err(HieragError::Validation {
                    message: format!("unsupported completion vendor: {other}"),
                })
            }
        };

        Ok(Self {
            name: vendor.to_string(),
            default_model,
            model,
        })
    }

    async fn execute(&self, system_prompt: &str, user_prompt: &str) -> Result<String> {
        let prompt = if system_prompt.is_empty() {
            user_prompt.to_string()
        } else {
            format!("{system_prompt}\n\n{user_prompt}")
        };

        let transient = |e: &dyn std::fmt::Display| HieragError::TransientProviderError {
            provider: self.name.clone(),
            message: e.to_string(),
        };
        let unexpected_tool_call = |name: &str| HieragError::NoProviderForModel {
            model: format!("unexpected tool call response: {name}"),
        };

        let choice = match &self.model {
            RigModel::OpenAi(model) => model
                .completion_request(&prompt)
                .send()
                .await
                .map_err(|e| transient(&e))?
                .choice,
            RigModel::Anthropic(model) => model
                .completion_request(&prompt)
                .send()
                .await
                .map_err(|e| transient(&e))?
                .choice,
            RigModel::Cohere(model) => model
                .completion_request(&prompt)
                .send()
                .await
                .map_err(|e| transient(&e))?
                .choice,
        };

        match choice {
            rig::completion::ModelChoice::Message(text) => Ok(text),
            rig::completion::ModelChoice::ToolCall(name, _params) => Err(unexpected_tool_call(&name)),
        }
    }
}

#[async_trait]
impl CompletionProvider for RigCompletionProvider {
    fn name(&self) -> &str {
        &self.name
    }

    fn registered_models(&self) -> Vec<RegisteredModel> {
        vec![RegisteredModel::new(self.default_model.clone(), vec![])]
    }

    async fn complete(
        &self,
        system_prompt: &str,
        user_prompt: &str,
        _model: Option<&str>,
        _max_tokens: Option<usize>,
    ) -> Result<String> {
        self.execute(system_prompt, user_prompt).await
    }

    fn token_count(&self, text: &str, _model_tier: &str) -> usize {
        // rig-core's completion models don't expose a tokenizer; approximate
        // at ~4 chars/token, the same heuristic §4.5.3 uses for truncation.
        text.len() / 4
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unsupported_vendor_is_a_validation_error() {
        let err = RigCompletionProvider::new("unsupported", "model", "key", None).unwrap_err();
        assert!(matches!(err, HieragError::Validation { .. }));
    }

    #[test]
    fn openai_vendor_constructs_successfully() {
        let provider = RigCompletionProvider::new("openai", "gpt-4o-mini", "sk-test", None).unwrap();
        assert_eq!(provider.name(), "openai");
    }
}
