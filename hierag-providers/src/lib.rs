//! ABOUTME: Model Registry Cache and Provider Pool for the hierag RAG engine
//! ABOUTME: Routes embedding/completion calls to configured providers (spec §4.1, §4.2)

pub mod cache;
pub mod context;
#[cfg(feature = "test-util")]
pub mod mock;
pub mod pool;
pub mod providers;
pub mod registry;

pub use cache::{EmbeddingCache, EmbeddingCacheConfig};
pub use context::{EmbeddingContext, LLMContext};
pub use pool::{ProviderPool, ProviderPoolBuilder};
pub use providers::{OpenAiEmbeddingProvider, RigCompletionProvider};
pub use registry::ModelRegistryCache;
