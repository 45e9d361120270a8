//! ABOUTME: GenericSplitter (§4.4.1) — heading-based split with a size-based fallback

use super::budget::{merge_segments_by_budget, split_by_heading_lines, split_by_size, TokenBudget, TokenCounterFn};
use async_trait::async_trait;
use hierag_core::error::{HieragError, Result};
use hierag_core::traits::DocumentSplitter;
use hierag_core::types::{Chapter, Documento};

fn is_markdown_heading(line: &str) -> bool {
    let trimmed = line.trim_start();
    trimmed.starts_with('#') && trimmed.trim_start_matches('#').starts_with(' ')
}

/// Below this many heading matches, headings are considered "sparse" and
/// the splitter falls back to size-based splitting (§4.4.1: "attempt
/// heading-based split; fall back to size-based split when headings are
/// sparse"). A single heading over a long document leaves one oversized
/// segment with no real structure to exploit, so the bar is 2.
const MIN_HEADINGS_FOR_STRUCTURAL_SPLIT: usize = 2;

/// Splits generic documents on Markdown headings when present, otherwise
/// falls back to pure size-based splitting (§4.4.1).
pub struct GenericSplitter {
    budget: TokenBudget,
    count_tokens: TokenCounterFn,
}

impl GenericSplitter {
    #[must_use]
    pub fn new(budget: TokenBudget, count_tokens: TokenCounterFn) -> Self {
        Self { budget, count_tokens }
    }
}

#[async_trait]
impl DocumentSplitter for GenericSplitter {
    async fn split(&self, documento: &Documento) -> Result<Vec<Chapter>> {
        if documento.markdown.trim().is_empty() {
            return Err(HieragError::Internal {
                message: "generic splitter received an empty document".to_string(),
            });
        }

        let heading_count = documento
            .markdown
            .lines()
            .filter(|line| is_markdown_heading(line))
            .count();

        let units = if heading_count >= MIN_HEADINGS_FOR_STRUCTURAL_SPLIT {
            let segments = split_by_heading_lines(&documento.markdown, is_markdown_heading);
            merge_segments_by_budget(&segments, self.budget, &self.count_tokens)
        } else {
            split_by_size(&documento.markdown, self.budget, &self.count_tokens)
        };

        if units.is_empty() {
            return Err(HieragError::Internal {
                message: "generic splitter produced no chapters".to_string(),
            });
        }

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
        "GenericSplitter"
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
    async fn uses_headings_when_present() {
        let markdown = "# One\nbody one.\n# Two\nbody two.\n# Three\nbody three.\n";
        let documento = Documento::new(1, "Doc", markdown, ContentType::Outros);
        let splitter = GenericSplitter::new(budget(), word_counter());
        let chapters = splitter.split(&documento).await.unwrap();
        assert_eq!(chapters.len(), 3);
    }

    #[tokio::test]
    async fn falls_back_to_size_split_when_headings_sparse() {
        let markdown = "para one has some words here\n\npara two has some words here too\n\npara three continues on";
        let documento = Documento::new(1, "Doc", markdown, ContentType::Outros);
        let budget = TokenBudget { min_tokens: 1, ideal_tokens: 6, max_tokens: 12 };
        let splitter = GenericSplitter::new(budget, word_counter());
        let chapters = splitter.split(&documento).await.unwrap();
        assert!(!chapters.is_empty());
    }

    #[tokio::test]
    async fn empty_document_errors() {
        let documento = Documento::new(1, "Vazio", "   ", ContentType::Outros);
        let splitter = GenericSplitter::new(budget(), word_counter());
        assert!(splitter.split(&documento).await.is_err());
    }
}
