//! ABOUTME: PostgreSQL + pgvector persistence layer for the hierag RAG engine
//! ABOUTME: Schema, repositories, and hybrid-search SQL for §3/§4.7/§4.6

pub mod migrations;
pub mod pool;
pub mod repo;
pub mod search;

pub use pool::{PgPool, PgStorageConfig, PoolStatus};
pub use search::SearchResult;
