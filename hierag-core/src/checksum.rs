//! ABOUTME: CRC64 checksum computation for duplicate detection
//! ABOUTME: Spec §3/§4.8 — checksum is CRC64 of the final markdown representation

use crc::{Crc, CRC_64_XZ};

const CRC64: Crc<u64> = Crc::<u64>::new(&CRC_64_XZ);

/// Compute the CRC64 checksum of a document's markdown content.
///
/// Deterministic across runs (§8.2): the same bytes always produce the same
/// checksum, which is what makes `(library_id, checksum)` a reliable
/// duplicate-detection key.
#[must_use]
pub fn crc64(markdown: &str) -> u64 {
    CRC64.checksum(markdown.as_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stable_across_calls() {
        let text = "# Title\n\nSome body text.";
        assert_eq!(crc64(text), crc64(text));
    }

    #[test]
    fn differs_for_different_content() {
        assert_ne!(crc64("a"), crc64("b"));
    }

    #[test]
    fn empty_string_is_defined() {
        // Should not panic; CRC of empty input is a well-defined constant.
        let _ = crc64("");
    }
}
