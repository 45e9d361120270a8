//! ABOUTME: Hybrid retrieval engine configuration (§4.6)

use serde::{Deserialize, Serialize};

/// Configuration for the Hybrid Retrieval Engine's ranking and query
/// preprocessing.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct RetrievalConfig {
    /// Reciprocal-rank-fusion constant `k` (§4.6.4). Spec leaves this
    /// configurable while favoring RRF over raw weighted-sum fusion.
    pub fusion_k: f64,
    /// `to_tsquery`/`plainto_tsquery` language configuration (§4.6.1).
    pub text_search_language: String,
    /// Default result limit when the caller doesn't specify one.
    pub default_limit: usize,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            fusion_k: 60.0,
            text_search_language: "portuguese".to_string(),
            default_limit: 10,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_fusion_constant_is_sixty() {
        assert!((RetrievalConfig::default().fusion_k - 60.0).abs() < f64::EPSILON);
    }
}
