//! ABOUTME: Repository layer — one module per table, thin over tokio-postgres

pub mod chapter;
pub mod doc_embedding;
pub mod documento;
pub mod library;
