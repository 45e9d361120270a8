use hierag_core::checksum::crc64;
use hierag_core::types::Library;
use proptest::prelude::*;

proptest! {
    /// §8.1 invariant #1: any Library constructed with a weight pair that
    /// sums to 1.0 (within tolerance) must be accepted.
    #[test]
    fn library_accepts_any_valid_weight_split(semantic in 0.0f32..=1.0f32) {
        let textual = 1.0 - semantic;
        prop_assert!(Library::new("lib", "area", semantic, textual).is_ok());
    }

    /// §8.2 round-trip law: CRC64 of the same markdown is stable across runs.
    #[test]
    fn crc64_is_deterministic(s in ".*") {
        prop_assert_eq!(crc64(&s), crc64(&s));
    }

    /// Distinct inputs essentially never collide for the small sample space
    /// proptest explores here — a sanity check, not a collision-resistance proof.
    #[test]
    fn crc64_distinguishes_prefix_extension(s in "[a-z]{1,20}") {
        let extended = format!("{s}x");
        prop_assert_ne!(crc64(&s), crc64(&extended));
    }
}
