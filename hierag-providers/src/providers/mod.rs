//! Concrete provider implementations. Providers themselves are external
//! services (spec §1 OUT OF SCOPE) — these are thin HTTP/SDK wrappers that
//! satisfy [`hierag_core::traits::EmbeddingProvider`] and
//! [`hierag_core::traits::CompletionProvider`].

mod openai_embedding;
mod rig_completion;

pub use openai_embedding::OpenAiEmbeddingProvider;
pub use rig_completion::RigCompletionProvider;
