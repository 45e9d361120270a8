//! ABOUTME: Core domain types, error taxonomy, and trait seams for hierag
//! ABOUTME: Foundation layer shared by the config, providers, storage, ingest and retrieval crates

pub mod checksum;
pub mod error;
pub mod logging;
pub mod traits;
pub mod types;

pub use error::{HieragError, Result};
pub use types::{
    Chapter, ContentType, DocEmbedding, Documento, EmbeddingKind, Library, ProcessingState,
};