//! ABOUTME: Model Registry Cache (spec §4.1)
//! ABOUTME: In-process `normalized model name -> provider` mapping, refreshed only on request

use hierag_core::error::{HieragError, Result};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, warn};

/// One provider's declared model, with its aliases, as fed into the cache
/// during a refresh (§4.1: "enumerate each provider's registered models").
#[derive(Debug, Clone)]
pub struct ProviderModelEntry {
    pub provider_name: String,
    pub canonical_name: String,
    pub aliases: Vec<String>,
}

/// How a model name resolved to a provider, for logging (§4.1 "substring
/// match... logged as weak match").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchKind {
    Exact,
    Alias,
    SubstringWeak,
}

/// Recognized provider-name prefixes stripped before alias matching
/// (§4.1: "strip provider prefixes... only when matching aliases").
const KNOWN_PREFIXES: &[&str] = &["openai/", "lm-studio/", "anthropic/", "cohere/", "ollama/"];

/// Normalize a model name: lower-case, trim, collapse internal whitespace.
///
/// Provider-prefix stripping is *not* applied here — §4.1 only strips
/// prefixes "when matching aliases", so the exact-match index keeps the
/// prefixed form and stripping happens in [`strip_known_prefix`] at lookup
/// time for the alias pass.
#[must_use]
pub fn normalize_name(name: &str) -> String {
    name.trim()
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

fn strip_known_prefix(name: &str) -> &str {
    for prefix in KNOWN_PREFIXES {
        if let Some(stripped) = name.strip_prefix(prefix) {
            return stripped;
        }
    }
    name
}

/// In-process `normalized model name -> provider` mapping.
///
/// Built once at provider-pool initialization (or rebuilt via [`Self::refresh`]);
/// never refreshed in the background (§4.1: "There is no background
/// refresh"), so model -> provider lookups on the ingestion hot path cost
/// zero network calls.
#[derive(Debug, Default)]
pub struct ModelRegistryCache {
    inner: RwLock<RegistryInner>,
}

#[derive(Debug, Default)]
struct RegistryInner {
    /// Exact normalized name -> provider.
    exact: HashMap<String, String>,
    /// Alias (normalized, prefix-stripped) -> provider.
    aliases: HashMap<String, String>,
    default_provider: Option<String>,
}

impl ModelRegistryCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a registry immediately from a snapshot of provider model
    /// declarations, optionally with a default provider to fall back to.
    #[must_use]
    pub fn build(entries: &[ProviderModelEntry], default_provider: Option<String>) -> Self {
        let cache = Self::new();
        cache.refresh(entries, default_provider);
        cache
    }

    /// Rebuild the entire mapping from scratch (§4.1 `refresh()`).
    ///
    /// This is the *only* way the cache changes after construction — there
    /// is no background refresh task.
    pub fn refresh(&self, entries: &[ProviderModelEntry], default_provider: Option<String>) {
        let mut exact = HashMap::new();
        let mut aliases = HashMap::new();

        for entry in entries {
            let normalized = normalize_name(&entry.canonical_name);
            exact.insert(normalized, entry.provider_name.clone());

            for alias in &entry.aliases {
                let normalized_alias = normalize_name(strip_known_prefix(alias));
                aliases.insert(normalized_alias, entry.provider_name.clone());
            }
        }

        debug!(
            models = exact.len(),
            aliases = aliases.len(),
            "model registry cache refreshed"
        );

        let mut inner = self.inner.write();
        inner.exact = exact;
        inner.aliases = aliases;
        inner.default_provider = default_provider;
    }

    /// Resolve a model name to the provider that serves it (§4.1 matching
    /// order: exact, then alias, then substring-both-directions).
    ///
    /// # Errors
    ///
    /// Returns [`HieragError::NoProviderForModel`] when no match is found
    /// and no default provider is configured.
    pub fn resolve(&self, model_name: &str) -> Result<(String, MatchKind)> {
        let normalized = normalize_name(model_name);
        let inner = self.inner.read();

        if let Some(provider) = inner.exact.get(&normalized) {
            return Ok((provider.clone(), MatchKind::Exact));
        }

        let stripped = normalize_name(strip_known_prefix(&normalized));
        if let Some(provider) = inner.aliases.get(&stripped) {
            return Ok((provider.clone(), MatchKind::Alias));
        }

        for (known, provider) in inner.exact.iter().chain(inner.aliases.iter()) {
            if known.contains(&stripped) || stripped.contains(known.as_str()) {
                warn!(
                    model = model_name,
                    matched_against = known,
                    provider,
                    "model registry weak substring match"
                );
                return Ok((provider.clone(), MatchKind::SubstringWeak));
            }
        }

        if let Some(default_provider) = &inner.default_provider {
            debug!(
                model = model_name,
                default_provider, "model registry falling back to default provider"
            );
            return Ok((default_provider.clone(), MatchKind::SubstringWeak));
        }

        Err(HieragError::NoProviderForModel {
            model: model_name.to_string(),
        })
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        let inner = self.inner.read();
        inner.exact.is_empty() && inner.aliases.is_empty()
    }
}

/// Shared handle, held by the [`crate::pool::ProviderPool`] and cloned into
/// every [`crate::context::EmbeddingContext`]/[`crate::context::LLMContext`].
pub type SharedModelRegistry = Arc<ModelRegistryCache>;

#[cfg(test)]
mod tests {
    use super::*;

    fn entries() -> Vec<ProviderModelEntry> {
        vec![
            ProviderModelEntry {
                provider_name: "openai".to_string(),
                canonical_name: "text-embedding-3-small".to_string(),
                aliases: vec!["openai/text-embedding-3-small".to_string(), "te3s".to_string()],
            },
            ProviderModelEntry {
                provider_name: "ollama".to_string(),
                canonical_name: "nomic-embed-text".to_string(),
                aliases: vec!["nomic".to_string()],
            },
        ]
    }

    #[test]
    fn exact_match_wins() {
        let cache = ModelRegistryCache::build(&entries(), None);
        let (provider, kind) = cache.resolve("text-embedding-3-small").unwrap();
        assert_eq!(provider, "openai");
        assert_eq!(kind, MatchKind::Exact);
    }

    #[test]
    fn exact_match_is_case_and_whitespace_insensitive() {
        let cache = ModelRegistryCache::build(&entries(), None);
        let (provider, kind) = cache.resolve("  Text-Embedding-3-Small  ").unwrap();
        assert_eq!(provider, "openai");
        assert_eq!(kind, MatchKind::Exact);
    }

    #[test]
    fn alias_match_strips_provider_prefix() {
        let cache = ModelRegistryCache::build(&entries(), None);
        let (provider, kind) = cache.resolve("openai/text-embedding-3-small").unwrap();
        assert_eq!(provider, "openai");
        assert_eq!(kind, MatchKind::Alias);
    }

    #[test]
    fn short_alias_resolves() {
        let cache = ModelRegistryCache::build(&entries(), None);
        let (provider, kind) = cache.resolve("nomic").unwrap();
        assert_eq!(provider, "ollama");
        assert_eq!(kind, MatchKind::Alias);
    }

    #[test]
    fn substring_match_is_weak_fallback() {
        let cache = ModelRegistryCache::build(&entries(), None);
        let (provider, kind) = cache.resolve("nomic-embed-text-v1.5").unwrap();
        assert_eq!(provider, "ollama");
        assert_eq!(kind, MatchKind::SubstringWeak);
    }

    #[test]
    fn unknown_model_without_default_fails() {
        let cache = ModelRegistryCache::build(&entries(), None);
        let err = cache.resolve("gpt-99").unwrap_err();
        assert!(matches!(err, HieragError::NoProviderForModel { .. }));
    }

    #[test]
    fn unknown_model_falls_back_to_default() {
        let cache = ModelRegistryCache::build(&entries(), Some("openai".to_string()));
        let (provider, _) = cache.resolve("gpt-99").unwrap();
        assert_eq!(provider, "openai");
    }

    #[test]
    fn refresh_replaces_prior_mapping() {
        let cache = ModelRegistryCache::new();
        assert!(cache.is_empty());
        cache.refresh(&entries(), None);
        assert!(!cache.is_empty());
        cache.refresh(&[], None);
        assert!(cache.resolve("text-embedding-3-small").is_err());
    }
}
