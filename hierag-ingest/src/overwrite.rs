//! ABOUTME: Overwrite Controller (§4.5.6, Phase 2.0) — decides resume vs no-op vs destructive reingest

use hierag_core::error::Result;
use hierag_storage::pool::PgPool;
use hierag_storage::repo::chapter as chapter_repo;
use hierag_storage::repo::doc_embedding as doc_embedding_repo;

/// Outcome of the Overwrite Controller's decision for one document (§4.5.6).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverwriteDecision {
    /// No Chapters exist yet: run the normal ingestion pipeline.
    ProceedNormalIngestion,
    /// Chapters exist and some vectors are NULL: skip splitting, only
    /// recompute the missing vectors (idempotent resume).
    ResumeMissingVectors,
    /// Chapters exist and all vectors are present, `overwrite=false`: no
    /// work to do.
    AlreadyProcessed { chapters_count: i64, embeddings_count: i64 },
    /// `overwrite=true` and Chapters exist (regardless of vector
    /// completeness): delete all Chapters (cascading to DocEmbeddings) and
    /// reingest from scratch.
    DeleteThenReingest,
}

/// Implements the Phase 2.0 decision table (§4.5.6).
pub struct OverwriteController<'a> {
    pool: &'a PgPool,
}

impl<'a> OverwriteController<'a> {
    #[must_use]
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Decide what to do for `documento_id` given the requested `overwrite`
    /// flag, per the table in §4.5.6.
    ///
    /// # Errors
    ///
    /// Returns [`hierag_core::error::HieragError::PersistenceError`] on any
    /// database failure.
    pub async fn decide(&self, documento_id: i64, overwrite: bool) -> Result<OverwriteDecision> {
        let chapters_count = chapter_repo::count_for_documento(self.pool, documento_id).await?;

        if chapters_count == 0 {
            return Ok(OverwriteDecision::ProceedNormalIngestion);
        }

        if overwrite {
            return Ok(OverwriteDecision::DeleteThenReingest);
        }

        let (total, with_vector) = doc_embedding_repo::vector_counts(self.pool, documento_id).await?;
        if total > 0 && total == with_vector {
            return Ok(OverwriteDecision::AlreadyProcessed {
                chapters_count,
                embeddings_count: total,
            });
        }

        Ok(OverwriteDecision::ResumeMissingVectors)
    }

    /// Execute the destructive half of [`OverwriteDecision::DeleteThenReingest`]:
    /// delete all Chapters for `documento_id` (DocEmbeddings cascade), keeping
    /// the Documento row itself (§4.5.6).
    ///
    /// # Errors
    ///
    /// Returns [`hierag_core::error::HieragError::PersistenceError`] on any
    /// database failure.
    pub async fn delete_for_reingest(&self, documento_id: i64) -> Result<()> {
        chapter_repo::delete_by_documento(self.pool, documento_id).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decision_variants_are_distinguishable() {
        assert_eq!(
            OverwriteDecision::ProceedNormalIngestion,
            OverwriteDecision::ProceedNormalIngestion
        );
        assert_ne!(
            OverwriteDecision::ProceedNormalIngestion,
            OverwriteDecision::ResumeMissingVectors
        );
        assert_ne!(
            OverwriteDecision::AlreadyProcessed { chapters_count: 1, embeddings_count: 1 },
            OverwriteDecision::AlreadyProcessed { chapters_count: 2, embeddings_count: 1 }
        );
    }
}
