//! ABOUTME: Duplicate Detector (§4.8) — CRC64 checksum and (library_id, checksum) lookup

use hierag_core::error::Result;
use hierag_storage::pool::PgPool;
use hierag_storage::repo::documento as documento_repo;

/// Computes a Documento's checksum and checks it against existing rows in a
/// library before the expensive split/embed pipeline runs (§4.8). The
/// `insert` call itself re-checks and enforces uniqueness at the database
/// level (`hierag_storage::repo::documento::insert`); this detector exists
/// so callers can fail fast and report the existing document id without
/// running the converter or splitter first.
pub struct DuplicateDetector<'a> {
    pool: &'a PgPool,
}

impl<'a> DuplicateDetector<'a> {
    #[must_use]
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Checksum `markdown` with CRC64 (§4.8).
    #[must_use]
    pub fn checksum(&self, markdown: &str) -> u64 {
        hierag_core::checksum::crc64(markdown)
    }

    /// Returns the existing Documento id if `(library_id, checksum)` already
    /// exists, `None` otherwise.
    ///
    /// # Errors
    ///
    /// Returns [`hierag_core::error::HieragError::PersistenceError`] on any
    /// database failure.
    pub async fn existing_id(&self, library_id: i64, checksum: u64) -> Result<Option<i64>> {
        let existing = documento_repo::find_by_checksum(self.pool, library_id, checksum).await?;
        Ok(existing.map(|documento| documento.id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn checksum_is_deterministic() {
        let markdown = "# Title\n\nBody text.";
        let checksum_a = hierag_core::checksum::crc64(markdown);
        let checksum_b = hierag_core::checksum::crc64(markdown);
        assert_eq!(checksum_a, checksum_b);
    }

    #[test]
    fn checksum_differs_for_different_content() {
        let a = hierag_core::checksum::crc64("content a");
        let b = hierag_core::checksum::crc64("content b");
        assert_ne!(a, b);
    }
}
