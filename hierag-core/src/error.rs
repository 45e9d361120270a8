//! ABOUTME: Error taxonomy for the hierag ingestion and retrieval engine
//! ABOUTME: Provides HieragError enum and Result type alias

use thiserror::Error;

/// Errors raised across ingestion, provider routing, storage, and retrieval.
///
/// Variants map directly onto the taxonomy in the component spec (§7): each
/// one either surfaces to the caller immediately (`ValidationError`,
/// `DuplicateDocument`, `UnsupportedFormat`, `NoProviderForModel`,
/// `PersistenceError`, `OverwriteRequired`) or is recovered locally and only
/// ever logged (`TransientProviderError`, `EmbeddingBatchFailed`) — the
/// orchestrator never lets the latter two abort a document.
#[derive(Debug, Error)]
pub enum HieragError {
    #[error("validation error: {message}")]
    Validation { message: String },

    #[error("duplicate document: library {library_id} already has checksum {checksum:016x} (existing id {existing_id})")]
    DuplicateDocument {
        library_id: i64,
        checksum: u64,
        existing_id: i64,
    },

    #[error("unsupported format: {detail}")]
    UnsupportedFormat { detail: String },

    #[error("no provider registered for model '{model}'")]
    NoProviderForModel { model: String },

    #[error("transient provider error from '{provider}': {message}")]
    TransientProviderError { provider: String, message: String },

    #[error("all providers failed for operation '{operation}': {last_error}")]
    AllProvidersFailed {
        operation: String,
        last_error: String,
    },

    #[error("embedding batch failed for {count} embedding(s): {message}")]
    EmbeddingBatchFailed { count: usize, message: String },

    #[error("persistence error: {message}")]
    PersistenceError { message: String },

    #[error("overwrite required: document {document_id} is already PROCESSED ({chapters_count} chapters, {embeddings_count} embeddings); use overwrite=true to reprocess")]
    OverwriteRequired {
        document_id: i64,
        chapters_count: usize,
        embeddings_count: usize,
    },

    #[error("internal error: {message}")]
    Internal { message: String },
}

impl HieragError {
    /// Whether the error is the kind the orchestrator recovers from locally
    /// (single-batch or single-row failures) rather than surfacing.
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::TransientProviderError { .. } | Self::EmbeddingBatchFailed { .. }
        )
    }
}

/// Convenience Result type alias
pub type Result<T> = std::result::Result<T, HieragError>;
