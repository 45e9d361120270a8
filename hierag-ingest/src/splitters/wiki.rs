//! ABOUTME: WikiSplitter (§4.4.1) — splits at Markdown `#` and `##` headings

use super::budget::{merge_segments_by_budget, split_by_heading_lines, TokenBudget, TokenCounterFn};
use async_trait::async_trait;
use hierag_core::error::{HieragError, Result};
use hierag_core::traits::DocumentSplitter;
use hierag_core::types::{Chapter, Documento};

fn is_level_one_or_two_heading(line: &str) -> bool {
    let trimmed = line.trim_start();
    (trimmed.starts_with("# ") || trimmed.starts_with("## ")) && !trimmed.starts_with("### ")
}

/// Splits wiki-style documents at level 1/2 Markdown headings (§4.4.1).
pub struct WikiSplitter {
    budget: TokenBudget,
    count_tokens: TokenCounterFn,
}

impl WikiSplitter {
    #[must_use]
    pub fn new(budget: TokenBudget, count_tokens: TokenCounterFn) -> Self {
        Self { budget, count_tokens }
    }
}

#[async_trait]
impl DocumentSplitter for WikiSplitter {
    async fn split(&self, documento: &Documento) -> Result<Vec<Chapter>> {
        let segments = split_by_heading_lines(&documento.markdown, is_level_one_or_two_heading);
        if segments.is_empty() {
            return Err(HieragError::Internal {
                message: "wiki splitter found no content to split".to_string(),
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
        "WikiSplitter"
    }
}
