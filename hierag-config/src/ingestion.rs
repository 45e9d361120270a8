//! ABOUTME: Ingestion orchestrator configuration (§4.5, §6.3)

use serde::{Deserialize, Serialize};

/// Configuration for the Ingestion Orchestrator's batched embedding phase
/// and its fault-tolerance/worker-pool knobs.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct IngestionConfig {
    /// Concurrent document-ingestion workers (§5: default 4-8).
    pub workers: usize,
    /// Max texts per embedding batch call (§4.5.3).
    pub batch_size: usize,
    /// Oversize threshold: above this percent over `contextLength`, summarize
    /// instead of truncate (§4.5.3).
    pub oversize_threshold_percent: f64,
    /// Chapters above this token count get a `RESUMO` embedding (§4.5.2).
    pub summary_threshold_tokens: u32,
    /// Max tokens for an LLM-generated chapter summary (§4.5.2).
    pub summary_max_tokens: u32,
    /// Chapters at or below this token count are not chunked — they yield
    /// exactly one whole-chapter `TRECHO` embedding (§4.4.3).
    pub ideal_chunk_size_tokens: u32,
    /// Per-LLM-call deadline (§5).
    pub llm_call_timeout_seconds: u64,
}

impl Default for IngestionConfig {
    fn default() -> Self {
        Self {
            workers: 4,
            batch_size: 10,
            oversize_threshold_percent: 2.0,
            summary_threshold_tokens: 2500,
            summary_max_tokens: 1024,
            ideal_chunk_size_tokens: 2000,
            llm_call_timeout_seconds: 30,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_spec_constants() {
        let config = IngestionConfig::default();
        assert_eq!(config.batch_size, 10);
        assert!((config.oversize_threshold_percent - 2.0).abs() < f64::EPSILON);
        assert_eq!(config.summary_threshold_tokens, 2500);
        assert_eq!(config.summary_max_tokens, 1024);
        assert_eq!(config.ideal_chunk_size_tokens, 2000);
    }
}
