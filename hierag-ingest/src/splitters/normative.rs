//! ABOUTME: NormativeSplitter (§4.4.1) — splits at legal-structural markers

use super::budget::{merge_segments_by_budget, split_by_heading_lines, TokenBudget, TokenCounterFn};
use async_trait::async_trait;
use hierag_core::error::{HieragError, Result};
use hierag_core::traits::DocumentSplitter;
use hierag_core::types::{Chapter, Documento};

/// Structural markers recognized as legal-section boundaries: article,
/// chapter, section and title headers, in the common Portuguese
/// normative-document conventions (`Art.`, `Capítulo`, `Seção`, `Título`).
fn is_normative_marker(line: &str) -> bool {
    let trimmed = line.trim_start();
    let lower = trimmed.to_ascii_lowercase();
    lower.starts_with("art.")
        || lower.starts_with("artigo ")
        || lower.starts_with("capítulo ")
        || lower.starts_with("capitulo ")
        || lower.starts_with("seção ")
        || lower.starts_with("secao ")
        || lower.starts_with("título ")
        || lower.starts_with("titulo ")
        || (trimmed.starts_with('#') && trimmed.trim_start_matches('#').starts_with(' '))
}

/// Splits normative (legal/regulatory) documents at article/section/chapter
/// markers (§4.4.1).
pub struct NormativeSplitter {
    budget: TokenBudget,
    count_tokens: TokenCounterFn,
}

impl NormativeSplitter {
    #[must_use]
    pub fn new(budget: TokenBudget, count_tokens: TokenCounterFn) -> Self {
        Self { budget, count_tokens }
    }
}

#[async_trait]
impl DocumentSplitter for NormativeSplitter {
    async fn split(&self, documento: &Documento) -> Result<Vec<Chapter>> {
        let segments = split_by_heading_lines(&documento.markdown, is_normative_marker);
        if segments.is_empty() {
            return Err(HieragError::Internal {
                message: "normative splitter found no content to split".to_string(),
            });
        }

        let units = merge_segments_by_budget(&segments, self.budget, &self.count_tokens);
        let chapters = units
            .into_iter()
            .enumerate()
            .map(|(ordinal, unit)| {
                let title = if unit.title.is_empty() {
                    format!("{} — parte {}", documento.title, ordinal + 1)
                } else {
                    unit.title.trim_start_matches('#').trim().to_string()
                };
                Chapter::new(documento.id, title, unit.text, ordinal as i32, unit.tokens)
            })
            .collect();

        Ok(chapters)
    }

    fn name(&self) -> &str {
        "NormativeSplitter"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hierag_core::types::ContentType;
    use std::sync::Arc;

    fn word_counter() -> TokenCounterFn {
        Arc::new(|text: &str| text.split_whitespace().count() as i64)
    }

    fn budget() -> TokenBudget {
        TokenBudget { min_tokens: 1, ideal_tokens: 1, max_tokens: 200 }
    }

    #[tokio::test]
    async fn splits_at_article_markers() {
        let markdown = "Art. 1º Disposição preliminar texto um.\nArt. 2º Segunda disposição texto dois.\n";
        let documento = Documento::new(1, "Lei Teste", markdown, ContentType::Lei);
        let splitter = NormativeSplitter::new(budget(), word_counter());
        let chapters = splitter.split(&documento).await.unwrap();
        assert_eq!(chapters.len(), 2);
        assert!(chapters[0].title.to_lowercase().contains("art"));
    }

    #[tokio::test]
    async fn empty_document_errors() {
        let documento = Documento::new(1, "Vazio", "", ContentType::Lei);
        let splitter = NormativeSplitter::new(budget(), word_counter());
        assert!(splitter.split(&documento).await.is_err());
    }
}
