//! ABOUTME: Configuration management for the hierag RAG engine
//! ABOUTME: An explicit configuration struct tree — no reflection/annotation magic (§9)

pub mod chunking;
pub mod env;
pub mod ingestion;
pub mod providers;
pub mod retrieval;
pub mod validation;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use chunking::{ChapterConfig, ChunkConfig};
pub use ingestion::IngestionConfig;
pub use providers::{ProviderEntryConfig, ProviderPoolConfig, RoutingStrategy};
pub use retrieval::RetrievalConfig;

/// Configuration errors: malformed TOML/JSON, or a value that violates a
/// documented constraint (e.g. `chunk.min_tokens > chunk.ideal_tokens`).
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid configuration for '{field}': {message}")]
    Validation { field: String, message: String },

    #[error("failed to parse configuration: {0}")]
    Parse(String),
}

/// Top-level configuration for one hierag process, covering every option
/// named in spec §6.3.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct HieragConfig {
    pub providers: ProviderPoolConfig,
    pub ingestion: IngestionConfig,
    pub chapter: ChapterConfig,
    pub chunk: ChunkConfig,
    pub retrieval: RetrievalConfig,
}

impl HieragConfig {
    /// Create a new builder.
    #[must_use]
    pub fn builder() -> HieragConfigBuilder {
        HieragConfigBuilder::new()
    }

    /// Parse configuration from a TOML document.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] on malformed TOML.
    pub fn from_toml(toml_str: &str) -> Result<Self, ConfigError> {
        toml::from_str(toml_str).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Validate the whole configuration tree.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Validation`] on the first constraint violated.
    pub fn validate(&self) -> Result<(), ConfigError> {
        validation::validate_config(self)
    }
}

/// Builder for [`HieragConfig`].
#[derive(Debug, Clone, Default)]
pub struct HieragConfigBuilder {
    config: HieragConfig,
}

impl HieragConfigBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self {
            config: HieragConfig::default(),
        }
    }

    #[must_use]
    pub fn providers(mut self, providers: ProviderPoolConfig) -> Self {
        self.config.providers = providers;
        self
    }

    #[must_use]
    pub fn ingestion(mut self, ingestion: IngestionConfig) -> Self {
        self.config.ingestion = ingestion;
        self
    }

    #[must_use]
    pub fn chapter(mut self, chapter: ChapterConfig) -> Self {
        self.config.chapter = chapter;
        self
    }

    #[must_use]
    pub fn chunk(mut self, chunk: ChunkConfig) -> Self {
        self.config.chunk = chunk;
        self
    }

    #[must_use]
    pub fn retrieval(mut self, retrieval: RetrievalConfig) -> Self {
        self.config.retrieval = retrieval;
        self
    }

    #[must_use]
    pub fn build(self) -> HieragConfig {
        self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_internally_consistent() {
        let config = HieragConfig::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn toml_round_trip() {
        let config = HieragConfig::builder()
            .ingestion(IngestionConfig {
                batch_size: 20,
                ..IngestionConfig::default()
            })
            .build();
        let toml_str = toml::to_string(&config).unwrap();
        let parsed = HieragConfig::from_toml(&toml_str).unwrap();
        assert_eq!(parsed.ingestion.batch_size, 20);
    }
}
