//! Trait seams shared across the provider, storage, ingest, and retrieval crates.

pub mod completion;
pub mod embedding;
pub mod splitter;

pub use completion::CompletionProvider;
pub use embedding::{EmbeddingOperation, EmbeddingProvider};
pub use splitter::{Chunk, ChunkSplitter, DocumentSplitter};
