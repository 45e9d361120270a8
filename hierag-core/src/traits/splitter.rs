//! Splitter family trait seams (§4.4, §9 redesign flag: sum-type-style
//! dispatch through a factory rather than deep inheritance).

use crate::error::Result;
use crate::types::{Chapter, Documento};
use async_trait::async_trait;

/// Document-to-chapter splitter contract (§4.4.1).
///
/// Each content-type variant (`NormativeSplitter`, `WikiSplitter`,
/// `GenericSplitter`) implements this same trait; the `SplitterFactory`
/// picks the concrete implementation by content-type tag.
#[async_trait]
pub trait DocumentSplitter: Send + Sync {
    /// Split a Documento into Chapters targeting
    /// `[CHAPTER_MIN_TOKENS, CHAPTER_IDEAL_TOKENS, CHAPTER_MAX_TOKENS]`.
    ///
    /// # Errors
    ///
    /// Returns an error if the document cannot be split at all (transitions
    /// the document to `ProcessingState::Failed`, §4.5.5).
    async fn split(&self, documento: &Documento) -> Result<Vec<Chapter>>;

    /// Name of this splitter variant, for logging.
    fn name(&self) -> &str;
}

/// A chunk produced by the chapter-to-chunk splitter (§4.4.2): its text,
/// ordinal within the parent chapter, and a token-count estimate.
#[derive(Debug, Clone)]
pub struct Chunk {
    pub chapter_id: i64,
    pub ordinal: i32,
    pub text: String,
    pub tokens: i64,
}

/// Chapter-to-chunk splitter contract (§4.4.2).
#[async_trait]
pub trait ChunkSplitter: Send + Sync {
    /// Split a Chapter's markdown into chunks targeting
    /// `[CHUNK_MIN_TOKENS, CHUNK_IDEAL_TOKENS, CHUNK_MAX_TOKENS]`.
    ///
    /// # Errors
    ///
    /// Returns an error if token counting fails.
    async fn split_chapter_into_chunks(&self, chapter: &Chapter) -> Result<Vec<Chunk>>;
}
