//! ABOUTME: Hybrid retrieval engine (§4.6) — query preprocessing + semantic/textual/hybrid search
//! ABOUTME: Thin orchestration crate: the ranking SQL itself lives in `hierag_storage::search`

pub mod engine;
pub mod query;

pub use engine::{SearchEngine, SearchRequest};
pub use hierag_storage::search::SearchResult;
pub use query::{normalize_query, or_expand, preprocess_query, to_tsquery_string};
