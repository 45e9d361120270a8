//! ABOUTME: Configuration validation: checks the constraints §6.3 documents

use crate::{ConfigError, HieragConfig};
use tracing::debug;

/// Validate the whole configuration tree against the constraints spec §6.3
/// documents for each section.
///
/// # Errors
///
/// Returns [`ConfigError::Validation`] describing the first constraint
/// violated.
pub fn validate_config(config: &HieragConfig) -> Result<(), ConfigError> {
    debug!("validating hierag configuration");

    validate_chapter_config(config)?;
    validate_chunk_config(config)?;
    validate_ingestion_config(config)?;
    validate_retrieval_config(config)?;
    validate_provider_pool(config)?;

    Ok(())
}

fn invalid(field: &str, message: impl Into<String>) -> ConfigError {
    ConfigError::Validation {
        field: field.to_string(),
        message: message.into(),
    }
}

fn validate_chapter_config(config: &HieragConfig) -> Result<(), ConfigError> {
    let chapter = &config.chapter;
    if chapter.min_tokens == 0 {
        return Err(invalid("chapter.min_tokens", "must be greater than zero"));
    }
    if !(chapter.min_tokens < chapter.ideal_tokens && chapter.ideal_tokens < chapter.max_tokens) {
        return Err(invalid(
            "chapter",
            format!(
                "must satisfy min_tokens < ideal_tokens < max_tokens, got {} < {} < {}",
                chapter.min_tokens, chapter.ideal_tokens, chapter.max_tokens
            ),
        ));
    }
    Ok(())
}

fn validate_chunk_config(config: &HieragConfig) -> Result<(), ConfigError> {
    let chunk = &config.chunk;
    if chunk.min_tokens == 0 {
        return Err(invalid("chunk.min_tokens", "must be greater than zero"));
    }
    if !(chunk.min_tokens < chunk.ideal_tokens && chunk.ideal_tokens < chunk.max_tokens) {
        return Err(invalid(
            "chunk",
            format!(
                "must satisfy min_tokens < ideal_tokens < max_tokens, got {} < {} < {}",
                chunk.min_tokens, chunk.ideal_tokens, chunk.max_tokens
            ),
        ));
    }
    Ok(())
}

fn validate_ingestion_config(config: &HieragConfig) -> Result<(), ConfigError> {
    let ingestion = &config.ingestion;
    if ingestion.workers == 0 {
        return Err(invalid("ingestion.workers", "must be at least 1"));
    }
    if ingestion.batch_size == 0 {
        return Err(invalid("ingestion.batch_size", "must be at least 1"));
    }
    if ingestion.oversize_threshold_percent < 0.0 {
        return Err(invalid(
            "ingestion.oversize_threshold_percent",
            "must not be negative",
        ));
    }
    if ingestion.summary_max_tokens == 0 {
        return Err(invalid(
            "ingestion.summary_max_tokens",
            "must be greater than zero",
        ));
    }
    Ok(())
}

fn validate_retrieval_config(config: &HieragConfig) -> Result<(), ConfigError> {
    let retrieval = &config.retrieval;
    if retrieval.fusion_k <= 0.0 {
        return Err(invalid("retrieval.fusion_k", "must be greater than zero"));
    }
    if retrieval.text_search_language.is_empty() {
        return Err(invalid(
            "retrieval.text_search_language",
            "must not be empty",
        ));
    }
    if retrieval.default_limit == 0 {
        return Err(invalid("retrieval.default_limit", "must be at least 1"));
    }
    Ok(())
}

fn validate_provider_pool(config: &HieragConfig) -> Result<(), ConfigError> {
    for provider in &config.providers.providers {
        if provider.name.is_empty() {
            return Err(invalid("providers.providers[].name", "must not be empty"));
        }
        if provider.provider_type.is_empty() {
            return Err(invalid(
                "providers.providers[].provider_type",
                "must not be empty",
            ));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ChapterConfig, ChunkConfig, ProviderEntryConfig, ProviderPoolConfig};

    #[test]
    fn default_config_is_valid() {
        assert!(validate_config(&HieragConfig::default()).is_ok());
    }

    #[test]
    fn rejects_inverted_chunk_bounds() {
        let config = HieragConfig {
            chunk: ChunkConfig {
                min_tokens: 1000,
                ideal_tokens: 500,
                max_tokens: 2000,
            },
            ..Default::default()
        };
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn rejects_inverted_chapter_bounds() {
        let config = HieragConfig {
            chapter: ChapterConfig {
                min_tokens: 8192,
                ideal_tokens: 4096,
                max_tokens: 16384,
            },
            ..Default::default()
        };
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn rejects_zero_batch_size() {
        let mut config = HieragConfig::default();
        config.ingestion.batch_size = 0;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn rejects_unnamed_provider() {
        let config = HieragConfig {
            providers: ProviderPoolConfig {
                providers: vec![ProviderEntryConfig::new("", "openai")],
                ..Default::default()
            },
            ..Default::default()
        };
        assert!(validate_config(&config).is_err());
    }
}
