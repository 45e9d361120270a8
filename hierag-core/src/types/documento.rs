use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

/// Content-type tag for a Documento (§3).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ContentType {
    Lei,
    Decreto,
    InstrucaoNormativa,
    Wiki,
    Livro,
    Artigo,
    Manual,
    Outros,
}

impl Default for ContentType {
    fn default() -> Self {
        Self::Outros
    }
}

/// Derived processing state of a Documento (§4.5.5).
///
/// Never stored as a column — always computed from the current Chapter and
/// DocEmbedding rows, so it can't drift out of sync with reality.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum ProcessingState {
    /// Documento row exists; no Chapters yet.
    Uploaded,
    /// Chapters present; at least one DocEmbedding has a NULL vector.
    Processing,
    /// All DocEmbeddings have vectors.
    Processed,
    /// Best-effort ingestion completed but some vectors remain NULL.
    Partial,
    /// Splitting itself failed; no Chapters or DocEmbeddings exist.
    Failed,
}

/// A complete source document in normalized Markdown form (§3).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Documento {
    pub id: i64,
    pub library_id: i64,
    pub title: String,
    pub markdown: String,
    pub content_type: ContentType,
    pub publication_date: Option<chrono::NaiveDate>,
    /// Whether this is the active version of the document.
    pub flag_vigente: bool,
    pub tokens_total: Option<i64>,
    /// CRC64 of `markdown`, computed once at persist time.
    pub checksum: u64,
    pub metadata: HashMap<String, Value>,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
    pub deleted_at: Option<chrono::DateTime<chrono::Utc>>,
}

impl Documento {
    /// Build a new Documento from converted markdown, computing its checksum.
    ///
    /// `tokens_total` starts `None`; the orchestrator fills it in once
    /// ingestion completes successfully (§3 invariant).
    #[must_use]
    pub fn new(
        library_id: i64,
        title: impl Into<String>,
        markdown: impl Into<String>,
        content_type: ContentType,
    ) -> Self {
        let markdown = markdown.into();
        let checksum = crate::checksum::crc64(&markdown);
        let now = chrono::Utc::now();
        Self {
            id: 0,
            library_id,
            title: title.into(),
            markdown,
            content_type,
            publication_date: None,
            flag_vigente: true,
            tokens_total: None,
            checksum,
            metadata: HashMap::new(),
            created_at: now,
            updated_at: now,
            deleted_at: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn checksum_is_derived_from_markdown() {
        let doc = Documento::new(1, "Title", "# Body", ContentType::Wiki);
        assert_eq!(doc.checksum, crate::checksum::crc64("# Body"));
    }

    #[test]
    fn tokens_total_starts_unset() {
        let doc = Documento::new(1, "Title", "body", ContentType::Outros);
        assert!(doc.tokens_total.is_none());
    }

    #[test]
    fn content_type_round_trips_through_json() {
        let json = serde_json::to_string(&ContentType::InstrucaoNormativa).unwrap();
        assert_eq!(json, "\"INSTRUCAO_NORMATIVA\"");
        let back: ContentType = serde_json::from_str(&json).unwrap();
        assert_eq!(back, ContentType::InstrucaoNormativa);
    }
}
