use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

/// A coherent section of a Documento, target size `[4096, 8192, 16384]` tokens (§3, §4.4.1).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chapter {
    pub id: i64,
    pub documento_id: i64,
    pub title: String,
    pub markdown: String,
    /// Position within the parent Documento; dense and unique per document.
    pub ordinal: i32,
    pub tokens_total: i64,
    pub metadata: HashMap<String, Value>,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

impl Chapter {
    #[must_use]
    pub fn new(
        documento_id: i64,
        title: impl Into<String>,
        markdown: impl Into<String>,
        ordinal: i32,
        tokens_total: i64,
    ) -> Self {
        let now = chrono::Utc::now();
        Self {
            id: 0,
            documento_id,
            title: title.into(),
            markdown: markdown.into(),
            ordinal,
            tokens_total,
            metadata: HashMap::new(),
            created_at: now,
            updated_at: now,
        }
    }
}

/// Verify a set of chapter ordinals is dense and unique starting at 0
/// (§3 invariant #3). Used by splitter tests and orchestrator assertions.
#[must_use]
pub fn ordinals_are_dense(chapters: &[Chapter]) -> bool {
    let mut ordinals: Vec<i32> = chapters.iter().map(|c| c.ordinal).collect();
    ordinals.sort_unstable();
    ordinals.iter().enumerate().all(|(i, &o)| i as i32 == o)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dense_ordinals_detected() {
        let chapters = vec![
            Chapter::new(1, "a", "x", 0, 10),
            Chapter::new(1, "b", "y", 1, 10),
            Chapter::new(1, "c", "z", 2, 10),
        ];
        assert!(ordinals_are_dense(&chapters));
    }

    #[test]
    fn gap_in_ordinals_detected() {
        let chapters = vec![Chapter::new(1, "a", "x", 0, 10), Chapter::new(1, "b", "y", 2, 10)];
        assert!(!ordinals_are_dense(&chapters));
    }
}
