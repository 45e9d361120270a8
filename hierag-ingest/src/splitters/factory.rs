//! ABOUTME: SplitterFactory (§4.4.1, §9 redesign flag) — routes by content-type tag

use super::budget::{TokenBudget, TokenCounterFn};
use super::{GenericSplitter, NormativeSplitter, WikiSplitter};
use hierag_core::traits::DocumentSplitter;
use hierag_core::types::ContentType;
use std::sync::Arc;

/// Picks the `DocumentSplitter` variant for a Documento's content type (§9:
/// "sum-type-style dispatch through a factory rather than deep
/// inheritance" — no trait-object hierarchy beyond `DocumentSplitter`
/// itself).
pub struct SplitterFactory {
    budget: TokenBudget,
    count_tokens: TokenCounterFn,
}

impl SplitterFactory {
    #[must_use]
    pub fn new(budget: TokenBudget, count_tokens: TokenCounterFn) -> Self {
        Self { budget, count_tokens }
    }

    #[must_use]
    pub fn for_content_type(&self, content_type: ContentType) -> Arc<dyn DocumentSplitter> {
        match content_type {
            ContentType::Lei | ContentType::Decreto | ContentType::InstrucaoNormativa => {
                Arc::new(NormativeSplitter::new(self.budget, self.count_tokens.clone()))
            }
            ContentType::Wiki => Arc::new(WikiSplitter::new(self.budget, self.count_tokens.clone())),
            ContentType::Livro | ContentType::Artigo | ContentType::Manual | ContentType::Outros => {
                Arc::new(GenericSplitter::new(self.budget, self.count_tokens.clone()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn factory() -> SplitterFactory {
        SplitterFactory::new(
            TokenBudget { min_tokens: 1, ideal_tokens: 100, max_tokens: 1000 },
            Arc::new(|text: &str| text.split_whitespace().count() as i64),
        )
    }

    #[test]
    fn routes_normative_content_types() {
        let factory = factory();
        for content_type in [ContentType::Lei, ContentType::Decreto, ContentType::InstrucaoNormativa] {
            assert_eq!(factory.for_content_type(content_type).name(), "NormativeSplitter");
        }
    }

    #[test]
    fn routes_wiki_content_type() {
        assert_eq!(factory().for_content_type(ContentType::Wiki).name(), "WikiSplitter");
    }

    #[test]
    fn routes_remaining_types_to_generic() {
        let factory = factory();
        for content_type in [ContentType::Livro, ContentType::Artigo, ContentType::Manual, ContentType::Outros] {
            assert_eq!(factory.for_content_type(content_type).name(), "GenericSplitter");
        }
    }
}
