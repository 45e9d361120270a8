//! ABOUTME: GenericChunkSplitter (§4.4.2) — chapter-to-chunk split, heading-first with size fallback

use super::budget::{merge_segments_by_budget, split_by_heading_lines, split_by_size, TokenBudget, TokenCounterFn};
use async_trait::async_trait;
use hierag_core::error::Result;
use hierag_core::traits::{Chunk, ChunkSplitter};
use hierag_core::types::Chapter;

fn is_level_two_or_three_heading(line: &str) -> bool {
    let trimmed = line.trim_start();
    (trimmed.starts_with("## ") || trimmed.starts_with("### ")) && !trimmed.starts_with("#### ")
}

/// Splits a Chapter's markdown into chunks, preferring `##`/`###` headings
/// and falling back to size-based splitting when they're absent (§4.4.2).
pub struct GenericChunkSplitter {
    budget: TokenBudget,
    count_tokens: TokenCounterFn,
}

impl GenericChunkSplitter {
    #[must_use]
    pub fn new(budget: TokenBudget, count_tokens: TokenCounterFn) -> Self {
        Self { budget, count_tokens }
    }
}

#[async_trait]
impl ChunkSplitter for GenericChunkSplitter {
    async fn split_chapter_into_chunks(&self, chapter: &Chapter) -> Result<Vec<Chunk>> {
        let segments = split_by_heading_lines(&chapter.markdown, is_level_two_or_three_heading);
        let has_structure = segments.iter().filter(|s| !s.heading.is_empty()).count() >= 1;

        let units = if has_structure {
            merge_segments_by_budget(&segments, self.budget, &self.count_tokens)
        } else {
            split_by_size(&chapter.markdown, self.budget, &self.count_tokens)
        };

        let chunks = units
            .into_iter()
            .enumerate()
            .map(|(ordinal, unit)| Chunk {
                chapter_id: chapter.id,
                ordinal: ordinal as i32,
                text: unit.text,
                tokens: unit.tokens,
            })
            .collect();

        Ok(chunks)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn word_counter() -> TokenCounterFn {
        Arc::new(|text: &str| text.split_whitespace().count() as i64)
    }

    fn make_chapter(markdown: &str) -> Chapter {
        let mut chapter = Chapter::new(1, "Chapter", markdown, 0, 0);
        chapter.id = 42;
        chapter
    }

    #[tokio::test]
    async fn splits_on_sub_headings() {
        let markdown = "## Part A\nbody a.\n## Part B\nbody b.\n";
        let chapter = make_chapter(markdown);
        let budget = TokenBudget { min_tokens: 1, ideal_tokens: 1, max_tokens: 200 };
        let splitter = GenericChunkSplitter::new(budget, word_counter());
        let chunks = splitter.split_chapter_into_chunks(&chapter).await.unwrap();
        assert_eq!(chunks.len(), 2);
        assert!(chunks.iter().all(|c| c.chapter_id == 42));
        assert_eq!(chunks[0].ordinal, 0);
        assert_eq!(chunks[1].ordinal, 1);
    }

    #[tokio::test]
    async fn falls_back_to_size_split_without_sub_headings() {
        let markdown = "para one has words\n\npara two has words\n\npara three has words";
        let chapter = make_chapter(markdown);
        let budget = TokenBudget { min_tokens: 1, ideal_tokens: 5, max_tokens: 10 };
        let splitter = GenericChunkSplitter::new(budget, word_counter());
        let chunks = splitter.split_chapter_into_chunks(&chapter).await.unwrap();
        assert!(!chunks.is_empty());
        assert!(chunks.iter().all(|c| c.chapter_id == 42));
    }
}
