use hierag_core::types::{ContentType, DocEmbedding, EmbeddingKind, Library};
use hierag_core::{Chapter, Documento, HieragError};

#[test]
fn library_weight_invariant_rejects_bad_split() {
    assert!(Library::new("lib", "area", 0.9, 0.05).is_err());
}

#[test]
fn documento_checksum_matches_crc64_of_markdown() {
    let doc = Documento::new(1, "t", "hello world", ContentType::Livro);
    assert_eq!(doc.checksum, hierag_core::checksum::crc64("hello world"));
}

#[test]
fn chapter_ordinals_dense_check() {
    let chapters = vec![
        Chapter::new(1, "a", "x", 0, 100),
        Chapter::new(1, "b", "y", 1, 100),
    ];
    assert!(hierag_core::types::chapter_ordinals_are_dense(&chapters));
}

#[test]
fn doc_embedding_tipo_order_consistency() {
    // TRECHO without chapter_id is rejected.
    let err = DocEmbedding::new(1, 1, None, EmbeddingKind::Trecho, "x", 0);
    assert!(matches!(err, Err(HieragError::Validation { .. })));

    // RESUMO with order != -1 is rejected.
    let err = DocEmbedding::new(1, 1, Some(9), EmbeddingKind::Resumo, "x", 2);
    assert!(matches!(err, Err(HieragError::Validation { .. })));

    // Valid construction succeeds and starts with no vector.
    let emb = DocEmbedding::new(1, 1, Some(9), EmbeddingKind::Resumo, "x", -1).unwrap();
    assert!(!emb.has_vector());
}
