use crate::error::{HieragError, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

/// DocEmbedding kind (§3, GLOSSARY): a text chunk, a whole-chapter embedding,
/// a chapter summary, or a Q&A-pair embedding.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EmbeddingKind {
    Trecho,
    Capitulo,
    Resumo,
    PerguntasRespostas,
}

/// An indexed retrieval unit: a text fragment plus its embedding vector (§3).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocEmbedding {
    pub id: i64,
    pub library_id: i64,
    pub documento_id: i64,
    pub chapter_id: Option<i64>,
    pub tipo_embedding: EmbeddingKind,
    pub texto: String,
    /// `None` until the orchestrator's batched vector computation phase
    /// (§4.5.3) fills it in.
    pub embedding_vector: Option<Vec<f32>>,
    /// `-1` for summaries, `0..N` for trecho ordering within a chapter.
    pub order_chapter: i32,
    pub metadata: HashMap<String, Value>,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

impl DocEmbedding {
    /// Construct a DocEmbedding, enforcing the tipo/chapter/order invariants
    /// from §3 and §8.1 (invariants #2 and #3):
    ///
    /// - `TRECHO`/`CAPITULO` require a non-null `chapter_id`.
    /// - `RESUMO` requires `order_chapter == -1`.
    ///
    /// # Errors
    ///
    /// Returns [`HieragError::Validation`] if either invariant is violated.
    pub fn new(
        library_id: i64,
        documento_id: i64,
        chapter_id: Option<i64>,
        tipo_embedding: EmbeddingKind,
        texto: impl Into<String>,
        order_chapter: i32,
    ) -> Result<Self> {
        match tipo_embedding {
            EmbeddingKind::Trecho | EmbeddingKind::Capitulo if chapter_id.is_none() => {
                return Err(HieragError::Validation {
                    message: format!(
                        "{tipo_embedding:?} embeddings require a non-null chapter_id"
                    ),
                });
            }
            EmbeddingKind::Resumo if order_chapter != -1 => {
                return Err(HieragError::Validation {
                    message: format!(
                        "RESUMO embeddings must have order_chapter = -1, got {order_chapter}"
                    ),
                });
            }
            _ => {}
        }

        let now = chrono::Utc::now();
        Ok(Self {
            id: 0,
            library_id,
            documento_id,
            chapter_id,
            tipo_embedding,
            texto: texto.into(),
            embedding_vector: None,
            order_chapter,
            metadata: HashMap::new(),
            created_at: now,
            updated_at: now,
        })
    }

    #[must_use]
    pub const fn has_vector(&self) -> bool {
        self.embedding_vector.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trecho_requires_chapter_id() {
        let err =
            DocEmbedding::new(1, 1, None, EmbeddingKind::Trecho, "text", 0).unwrap_err();
        assert!(matches!(err, HieragError::Validation { .. }));
    }

    #[test]
    fn capitulo_requires_chapter_id() {
        let err =
            DocEmbedding::new(1, 1, None, EmbeddingKind::Capitulo, "text", 0).unwrap_err();
        assert!(matches!(err, HieragError::Validation { .. }));
    }

    #[test]
    fn resumo_requires_order_minus_one() {
        let err =
            DocEmbedding::new(1, 1, Some(1), EmbeddingKind::Resumo, "summary", 0).unwrap_err();
        assert!(matches!(err, HieragError::Validation { .. }));

        let ok = DocEmbedding::new(1, 1, Some(1), EmbeddingKind::Resumo, "summary", -1);
        assert!(ok.is_ok());
    }

    #[test]
    fn trecho_with_chapter_id_succeeds() {
        let emb =
            DocEmbedding::new(1, 1, Some(7), EmbeddingKind::Trecho, "chunk text", 3).unwrap();
        assert!(!emb.has_vector());
        assert_eq!(emb.chapter_id, Some(7));
    }
}
