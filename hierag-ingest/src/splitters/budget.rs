//! ABOUTME: Shared token-budget merge-accumulate algorithm backing every splitter (§4.4)
//! ABOUTME: One heading-aware pass plus a size-based fallback, reused by chapter and chunk splitters

use std::sync::Arc;

/// Token counter injected by the orchestrator once the `EmbeddingContext` is
/// resolved (§4.5.1: "token-counting... depend on them"). The splitter
/// trait signatures in `hierag-core` take no such parameter, so concrete
/// splitters hold one at construction time instead.
pub type TokenCounterFn = Arc<dyn Fn(&str) -> i64 + Send + Sync>;

/// Token-size targets shared by both the chapter splitters and the chunk
/// splitter (§4.4.1, §4.4.2): `[min, ideal, max]`.
#[derive(Debug, Clone, Copy)]
pub struct TokenBudget {
    pub min_tokens: i64,
    pub ideal_tokens: i64,
    pub max_tokens: i64,
}

/// One heading-delimited section of a document: its heading line (empty for
/// a leading preamble with no heading above it) and body text.
#[derive(Debug, Clone)]
pub(crate) struct Segment {
    pub heading: String,
    pub body: String,
}

/// Split `markdown` into [`Segment`]s at lines recognized by `is_heading`.
/// The heading line itself is kept as the segment's title and excluded from
/// its body. Content before the first recognized heading becomes a segment
/// with an empty heading.
pub(crate) fn split_by_heading_lines(markdown: &str, is_heading: impl Fn(&str) -> bool) -> Vec<Segment> {
    let mut segments = Vec::new();
    let mut current_heading = String::new();
    let mut current_body = String::new();

    for line in markdown.lines() {
        if is_heading(line) {
            if !current_heading.is_empty() || !current_body.trim().is_empty() {
                segments.push(Segment {
                    heading: current_heading.clone(),
                    body: current_body.trim().to_string(),
                });
            }
            current_heading = line.trim().to_string();
            current_body.clear();
        } else {
            current_body.push_str(line);
            current_body.push('\n');
        }
    }
    if !current_heading.is_empty() || !current_body.trim().is_empty() {
        segments.push(Segment {
            heading: current_heading,
            body: current_body.trim().to_string(),
        });
    }

    segments
}

/// Full text of a segment, heading line followed by its body.
pub(crate) fn segment_text(segment: &Segment) -> String {
    if segment.heading.is_empty() {
        segment.body.clone()
    } else if segment.body.is_empty() {
        segment.heading.clone()
    } else {
        format!("{}\n\n{}", segment.heading, segment.body)
    }
}

/// One merged unit produced by [`merge_segments_by_budget`]: combined title
/// (first heading in the group, or empty), combined text, and token count.
#[derive(Debug, Clone)]
pub(crate) struct MergedUnit {
    pub title: String,
    pub text: String,
    pub tokens: i64,
}

/// Greedily merge adjacent segments to approach `budget.ideal_tokens`
/// without exceeding `budget.max_tokens`, flushing once a unit reaches at
/// least `budget.min_tokens` and the next segment would push it over the
/// max. A segment that alone exceeds `max_tokens` is emitted as its own
/// (oversized) unit — heading boundaries are authoritative and are not
/// torn apart by the merge pass.
pub(crate) fn merge_segments_by_budget(segments: &[Segment], budget: TokenBudget, count_tokens: &TokenCounterFn) -> Vec<MergedUnit> {
    let mut units = Vec::new();
    let mut current_title = String::new();
    let mut current_text = String::new();
    let mut current_tokens: i64 = 0;

    let flush = |title: &mut String, text: &mut String, tokens: &mut i64, units: &mut Vec<MergedUnit>| {
        if !text.trim().is_empty() {
            units.push(MergedUnit {
                title: title.clone(),
                text: text.trim().to_string(),
                tokens: *tokens,
            });
        }
        title.clear();
        text.clear();
        *tokens = 0;
    };

    for segment in segments {
        let text = segment_text(segment);
        let tokens = count_tokens(&text);

        if current_tokens > 0 && current_tokens >= budget.min_tokens && current_tokens + tokens > budget.max_tokens {
            flush(&mut current_title, &mut current_text, &mut current_tokens, &mut units);
        }

        if current_title.is_empty() && !segment.heading.is_empty() {
            current_title = segment.heading.clone();
        }
        if !current_text.is_empty() {
            current_text.push_str("\n\n");
        }
        current_text.push_str(&text);
        current_tokens += tokens;

        if current_tokens >= budget.ideal_tokens && current_tokens >= budget.min_tokens {
            flush(&mut current_title, &mut current_text, &mut current_tokens, &mut units);
        }
    }
    flush(&mut current_title, &mut current_text, &mut current_tokens, &mut units);

    units
}

/// Approximate characters-per-token used for the hard size-based fallback
/// (§4.5.3 uses the same `~4 chars/token` heuristic for truncation).
const CHARS_PER_TOKEN_ESTIMATE: usize = 4;

/// Size-based split for content with no usable heading structure: group
/// paragraphs (blank-line-delimited) up to `budget.ideal_tokens`, flushing
/// at `budget.max_tokens`; a single paragraph larger than `max_tokens` is
/// hard-split on character boundaries.
pub(crate) fn split_by_size(text: &str, budget: TokenBudget, count_tokens: &TokenCounterFn) -> Vec<MergedUnit> {
    let paragraphs: Vec<&str> = text.split("\n\n").filter(|p| !p.trim().is_empty()).collect();
    if paragraphs.is_empty() {
        return Vec::new();
    }

    let mut units = Vec::new();
    let mut current_text = String::new();
    let mut current_tokens: i64 = 0;

    let flush = |text: &mut String, tokens: &mut i64, units: &mut Vec<MergedUnit>| {
        if !text.trim().is_empty() {
            units.push(MergedUnit {
                title: String::new(),
                text: text.trim().to_string(),
                tokens: *tokens,
            });
        }
        text.clear();
        *tokens = 0;
    };

    for paragraph in paragraphs {
        let paragraph_tokens = count_tokens(paragraph);

        if paragraph_tokens > budget.max_tokens {
            flush(&mut current_text, &mut current_tokens, &mut units);
            units.extend(hard_split_oversized(paragraph, budget, count_tokens));
            continue;
        }

        if current_tokens > 0 && current_tokens + paragraph_tokens > budget.max_tokens {
            flush(&mut current_text, &mut current_tokens, &mut units);
        }

        if !current_text.is_empty() {
            current_text.push_str("\n\n");
        }
        current_text.push_str(paragraph);
        current_tokens += paragraph_tokens;

        if current_tokens >= budget.ideal_tokens {
            flush(&mut current_text, &mut current_tokens, &mut units);
        }
    }
    flush(&mut current_text, &mut current_tokens, &mut units);

    units
}

/// Hard character-window split for a single paragraph larger than
/// `budget.max_tokens`, using the `~4 chars/token` heuristic.
fn hard_split_oversized(paragraph: &str, budget: TokenBudget, count_tokens: &TokenCounterFn) -> Vec<MergedUnit> {
    let window_chars = (budget.ideal_tokens as usize).saturating_mul(CHARS_PER_TOKEN_ESTIMATE).max(1);
    let chars: Vec<char> = paragraph.chars().collect();
    let mut units = Vec::new();
    let mut start = 0;
    while start < chars.len() {
        let end = (start + window_chars).min(chars.len());
        let slice: String = chars[start..end].iter().collect();
        let tokens = count_tokens(&slice);
        units.push(MergedUnit {
            title: String::new(),
            text: slice,
            tokens,
        });
        start = end;
    }
    units
}

#[cfg(test)]
mod tests {
    use super::*;

    fn word_counter() -> TokenCounterFn {
        Arc::new(|text: &str| text.split_whitespace().count() as i64)
    }

    #[test]
    fn heading_split_groups_preamble_separately() {
        let markdown = "intro text\n# Heading One\nbody one\n# Heading Two\nbody two\n";
        let segments = split_by_heading_lines(markdown, |line| line.starts_with('#'));
        assert_eq!(segments.len(), 3);
        assert!(segments[0].heading.is_empty());
        assert_eq!(segments[1].heading, "# Heading One");
        assert_eq!(segments[2].heading, "# Heading Two");
    }

    #[test]
    fn merge_respects_max_budget() {
        let counter = word_counter();
        let segments = vec![
            Segment { heading: "# A".into(), body: "one two three four five".into() },
            Segment { heading: "# B".into(), body: "six seven eight nine ten".into() },
        ];
        let budget = TokenBudget { min_tokens: 1, ideal_tokens: 100, max_tokens: 8 };
        let units = merge_segments_by_budget(&segments, budget, &counter);
        assert_eq!(units.len(), 2);
        for unit in &units {
            assert!(unit.tokens <= 8 + 2);
        }
    }

    #[test]
    fn merge_combines_small_segments_toward_ideal() {
        let counter = word_counter();
        let segments = vec![
            Segment { heading: "# A".into(), body: "one two".into() },
            Segment { heading: "# B".into(), body: "three four".into() },
            Segment { heading: "# C".into(), body: "five six".into() },
        ];
        let budget = TokenBudget { min_tokens: 4, ideal_tokens: 10, max_tokens: 20 };
        let units = merge_segments_by_budget(&segments, budget, &counter);
        assert_eq!(units.len(), 1);
        assert_eq!(units[0].title, "# A");
    }

    #[test]
    fn size_split_falls_back_on_paragraphs() {
        let counter = word_counter();
        let text = "para one has five words\n\npara two has five words\n\npara three has five words";
        let budget = TokenBudget { min_tokens: 1, ideal_tokens: 6, max_tokens: 12 };
        let units = split_by_size(text, budget, &counter);
        assert!(!units.is_empty());
        assert!(units.iter().all(|u| u.tokens <= 12));
    }

    #[test]
    fn oversized_single_paragraph_is_hard_split() {
        let counter: TokenCounterFn = Arc::new(|text: &str| text.len() as i64);
        let long_paragraph = "x".repeat(1000);
        let budget = TokenBudget { min_tokens: 10, ideal_tokens: 100, max_tokens: 200 };
        let units = split_by_size(&long_paragraph, budget, &counter);
        assert!(units.len() > 1);
    }
}
