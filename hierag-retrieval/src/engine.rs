//! ABOUTME: Search entry points (§4.6.2/§4.6.3) — semantic, textual, hybrid search
//! ABOUTME: Thin orchestration over query preprocessing + `hierag_storage::search`'s SQL

use crate::query::preprocess_query;
use hierag_core::error::{HieragError, Result};
use hierag_core::traits::EmbeddingOperation;
use hierag_core::types::Library;
use hierag_providers::context::EmbeddingContext;
use hierag_storage::pool::PgPool;
use hierag_storage::search::{self, SearchResult};

/// One caller-facing search request, scoped to one or more Libraries.
pub struct SearchRequest<'a> {
    pub query_text: &'a str,
    pub library_ids: &'a [i64],
    pub limit: i64,
}

/// Wires query preprocessing and query-vector generation to the three
/// search operations (§4.6.3). Holds no state of its own beyond what it
/// needs to reach the database and the embedding provider.
pub struct SearchEngine<'a> {
    pool: &'a PgPool,
    embedding_context: &'a EmbeddingContext,
    fusion_k: f64,
    text_search_language: String,
}

impl<'a> SearchEngine<'a> {
    #[must_use]
    pub fn new(
        pool: &'a PgPool,
        embedding_context: &'a EmbeddingContext,
        config: &hierag_config::RetrievalConfig,
    ) -> Self {
        Self {
            pool,
            embedding_context,
            fusion_k: config.fusion_k,
            text_search_language: config.text_search_language.clone(),
        }
    }

    /// Embed the query text once; the result is never persisted (§4.6.2).
    async fn query_vector(&self, query_text: &str) -> Result<Vec<f32>> {
        let mut vectors = self
            .embedding_context
            .embeddings(EmbeddingOperation::Query, &[query_text.to_string()])
            .await?;
        vectors.pop().ok_or_else(|| HieragError::Internal {
            message: "embedding provider returned no vector for the query text".to_string(),
        })
    }

    /// Rank by vector distance alone (§4.6.3 `semanticSearch`).
    ///
    /// # Errors
    ///
    /// Returns [`HieragError`] if the embedding provider or the database call
    /// fails.
    pub async fn semantic_search(&self, request: &SearchRequest<'_>) -> Result<Vec<SearchResult>> {
        let vector = self.query_vector(request.query_text).await?;
        search::semantic_search(self.pool, &vector, request.library_ids, request.limit).await
    }

    /// Rank by full-text relevance alone (§4.6.3 `textualSearch`), running
    /// the query through the full preprocessing pipeline (§4.6.1) first.
    ///
    /// # Errors
    ///
    /// Returns [`HieragError`] if preprocessing or the database call fails.
    pub async fn textual_search(&self, request: &SearchRequest<'_>) -> Result<Vec<SearchResult>> {
        let tsquery = preprocess_query(self.pool, &self.text_search_language, request.query_text).await?;
        search::textual_search(self.pool, &tsquery, request.library_ids, request.limit).await
    }

    /// Fuse semantic and textual ranking via reciprocal-rank fusion (§4.6.3
    /// `hybridSearch`, §4.6.4), weighted by `library`'s
    /// `peso_semantico`/`peso_textual` unless `weight_override` is given.
    ///
    /// # Errors
    ///
    /// Returns [`HieragError::Validation`] if `weight_override` doesn't sum
    /// to `1.0`, or propagates a provider/database failure.
    pub async fn hybrid_search(
        &self,
        request: &SearchRequest<'_>,
        library: &Library,
        weight_override: Option<(f32, f32)>,
    ) -> Result<Vec<SearchResult>> {
        let (semantic_weight, textual_weight) = match weight_override {
            Some((semantic, textual)) => {
                Library::validate_weights(semantic, textual)?;
                (semantic, textual)
            }
            None => (library.peso_semantico, library.peso_textual),
        };

        let vector = self.query_vector(request.query_text).await?;
        let tsquery = preprocess_query(self.pool, &self.text_search_language, request.query_text).await?;

        search::hybrid_search(
            self.pool,
            &vector,
            &tsquery,
            request.library_ids,
            request.limit,
            semantic_weight,
            textual_weight,
            self.fusion_k,
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hierag_providers::mock::MockEmbeddingProvider;
    use std::sync::Arc;

    fn context() -> EmbeddingContext {
        EmbeddingContext::from_provider(Arc::new(MockEmbeddingProvider::new("mock", 8, 2048)), None)
    }

    #[tokio::test]
    async fn query_vector_returns_a_single_vector_of_the_providers_dimension() {
        let ctx = context();
        let vectors = ctx
            .embeddings(EmbeddingOperation::Query, &["cafe com leite".to_string()])
            .await
            .unwrap();
        assert_eq!(vectors.len(), 1);
        assert_eq!(vectors[0].len(), 8);
    }

    #[test]
    fn weight_override_must_sum_to_one() {
        let err = Library::validate_weights(0.5, 0.6).unwrap_err();
        assert!(matches!(err, HieragError::Validation { .. }));
    }
}
