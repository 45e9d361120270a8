//! ABOUTME: Token-budget configuration for the chapter and chunk splitters (§4.4)

use serde::{Deserialize, Serialize};

/// Target token sizes for the document-to-chapter splitters (§4.4.1).
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ChapterConfig {
    pub min_tokens: u32,
    pub ideal_tokens: u32,
    pub max_tokens: u32,
}

impl Default for ChapterConfig {
    fn default() -> Self {
        Self {
            min_tokens: 4096,
            ideal_tokens: 8192,
            max_tokens: 16384,
        }
    }
}

/// Target token sizes for the chapter-to-chunk splitter (§4.4.2).
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ChunkConfig {
    pub min_tokens: u32,
    pub ideal_tokens: u32,
    pub max_tokens: u32,
}

impl Default for ChunkConfig {
    fn default() -> Self {
        Self {
            min_tokens: 300,
            ideal_tokens: 512,
            max_tokens: 2048,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_spec_constants() {
        let chapter = ChapterConfig::default();
        assert_eq!((chapter.min_tokens, chapter.ideal_tokens, chapter.max_tokens), (4096, 8192, 16384));

        let chunk = ChunkConfig::default();
        assert_eq!((chunk.min_tokens, chunk.ideal_tokens, chunk.max_tokens), (300, 512, 2048));
    }
}
