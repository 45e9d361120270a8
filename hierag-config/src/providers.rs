//! ABOUTME: Provider pool configuration (§4.2, §6.3)
//! ABOUTME: Ordered provider list plus the process-wide routing strategy

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

fn default_true() -> bool {
    true
}

/// Routing strategy for the Provider Pool (§4.2).
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum RoutingStrategy {
    #[default]
    PrimaryOnly,
    Failover,
    RoundRobin,
    ModelBased,
    Specialized,
    SmartRouting,
    DualVerification,
}

/// Process-wide provider pool configuration: an *ordered* list of provider
/// entries (order matters for `PrimaryOnly`/`Failover`/`RoundRobin`) plus the
/// routing strategy and retry policy.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ProviderPoolConfig {
    pub strategy: RoutingStrategy,
    /// Retries for transient errors before a provider is considered failed
    /// for this call (§4.2 default N=3).
    pub max_retries: u32,
    pub timeout_seconds: u64,
    /// Ordered provider entries; index 0 is primary.
    pub providers: Vec<ProviderEntryConfig>,
    /// Fallback model name used when the library has no default configured.
    pub default_embedding_model: Option<String>,
    pub default_completion_model: Option<String>,
    /// Explicit default provider for the Model Registry Cache (§4.1) to fall
    /// back to when a model name matches nothing — exact, alias, or
    /// substring. Unset by default: an unresolvable model then fails fast
    /// with `NoProviderForModel` (§4.1, §7) rather than silently routing to
    /// the primary provider. This is deliberately *not* defaulted to the
    /// pool's primary provider; `RoutingStrategy::ModelBased`'s own
    /// "fall back to primary" behavior already lives in the dispatch path
    /// (`RoutedPool::select`), not in registry resolution.
    pub registry_default_provider: Option<String>,
}

impl Default for ProviderPoolConfig {
    fn default() -> Self {
        Self {
            strategy: RoutingStrategy::default(),
            max_retries: 3,
            timeout_seconds: 30,
            providers: Vec::new(),
            default_embedding_model: None,
            default_completion_model: None,
            registry_default_provider: None,
        }
    }
}

impl ProviderPoolConfig {
    /// The primary provider — first in the ordered list.
    #[must_use]
    pub fn primary(&self) -> Option<&ProviderEntryConfig> {
        self.providers.first()
    }

    /// Look up a provider entry by name.
    #[must_use]
    pub fn find(&self, name: &str) -> Option<&ProviderEntryConfig> {
        self.providers.iter().find(|p| p.name == name)
    }

    /// Providers tagged for the given operation, in pool order (§4.2
    /// `Specialized` routing).
    #[must_use]
    pub fn for_operation(&self, operation: &str) -> Vec<&ProviderEntryConfig> {
        self.providers
            .iter()
            .filter(|p| p.operations.iter().any(|o| o == operation))
            .collect()
    }
}

/// A single configured provider in the pool.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ProviderEntryConfig {
    pub name: String,
    pub provider_type: String,
    #[serde(default = "default_true")]
    pub enabled: bool,
    pub base_url: Option<String>,
    pub api_key_env: Option<String>,
    pub api_key: Option<String>,
    #[serde(alias = "model")]
    pub default_model: Option<String>,
    pub timeout_seconds: Option<u64>,
    pub max_retries: Option<u32>,
    /// Operation tags this provider serves, for `RoutingStrategy::Specialized`
    /// (e.g. `"embedding"`, `"completion"`, `"summarization"`).
    pub operations: Vec<String>,
    #[serde(flatten)]
    pub options: HashMap<String, serde_json::Value>,
}

impl Default for ProviderEntryConfig {
    fn default() -> Self {
        Self {
            name: String::new(),
            provider_type: String::new(),
            enabled: true,
            base_url: None,
            api_key_env: None,
            api_key: None,
            default_model: None,
            timeout_seconds: None,
            max_retries: None,
            operations: Vec::new(),
            options: HashMap::new(),
        }
    }
}

impl ProviderEntryConfig {
    #[must_use]
    pub fn new(name: impl Into<String>, provider_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            provider_type: provider_type.into(),
            ..Self::default()
        }
    }

    /// Resolve the API key: direct value first, then the named environment
    /// variable.
    #[must_use]
    pub fn resolve_api_key(&self) -> Option<String> {
        crate::env::resolve_secret(self.api_key.as_deref(), self.api_key_env.as_deref())
    }

    #[must_use]
    pub fn has_credentials(&self) -> bool {
        self.resolve_api_key().is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn primary_is_first_in_list() {
        let config = ProviderPoolConfig {
            providers: vec![
                ProviderEntryConfig::new("openai", "openai"),
                ProviderEntryConfig::new("ollama", "ollama"),
            ],
            ..Default::default()
        };
        assert_eq!(config.primary().unwrap().name, "openai");
    }

    #[test]
    fn find_by_name() {
        let config = ProviderPoolConfig {
            providers: vec![ProviderEntryConfig::new("openai", "openai")],
            ..Default::default()
        };
        assert!(config.find("openai").is_some());
        assert!(config.find("missing").is_none());
    }

    #[test]
    fn credentials_from_direct_key() {
        let mut entry = ProviderEntryConfig::new("openai", "openai");
        entry.api_key = Some("sk-test".to_string());
        assert!(entry.has_credentials());
        assert_eq!(entry.resolve_api_key(), Some("sk-test".to_string()));
    }

    #[test]
    fn for_operation_preserves_pool_order() {
        let mut embed_primary = ProviderEntryConfig::new("openai", "openai");
        embed_primary.operations = vec!["embedding".to_string()];
        let mut embed_secondary = ProviderEntryConfig::new("cohere", "cohere");
        embed_secondary.operations = vec!["embedding".to_string()];
        let completion_only = ProviderEntryConfig::new("anthropic", "anthropic");

        let config = ProviderPoolConfig {
            providers: vec![embed_primary, completion_only, embed_secondary],
            ..Default::default()
        };
        let names: Vec<_> = config
            .for_operation("embedding")
            .iter()
            .map(|p| p.name.as_str())
            .collect();
        assert_eq!(names, vec!["openai", "cohere"]);
    }
}
