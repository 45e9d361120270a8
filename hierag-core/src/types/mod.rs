//! Domain entities: Library, Documento, Chapter, DocEmbedding.
//!
//! These mirror the three-level hierarchy of §3: a Library owns Documentos,
//! a Documento owns Chapters, a Chapter owns DocEmbeddings. Ownership is
//! expressed elsewhere (the persistence layer's CASCADE foreign keys); these
//! types only carry the parent id, not a live reference.

mod chapter;
mod doc_embedding;
mod documento;
mod library;

pub use chapter::{ordinals_are_dense as chapter_ordinals_are_dense, Chapter};
pub use doc_embedding::{DocEmbedding, EmbeddingKind};
pub use documento::{ContentType, Documento, ProcessingState};
pub use library::Library;
