//! ABOUTME: Document conversion, splitter family, and the ingestion orchestrator (§4.3-4.5, §4.8-4.9)
//! ABOUTME: Ties hierag-providers contexts and hierag-storage repositories into `DocumentProcessingService`

pub mod converter;
pub mod duplicate;
pub mod orchestrator;
pub mod overwrite;
pub mod splitters;
pub mod status;

pub use converter::{DetectedFormat, DocumentConverter};
pub use duplicate::DuplicateDetector;
pub use orchestrator::{DocumentProcessingService, ProcessOptions, ProcessingOutcome, ProcessingResult};
pub use overwrite::{OverwriteController, OverwriteDecision};
pub use splitters::{Chunk, SplitterFactory, TokenBudget, TokenCounterFn};
pub use status::{ProcessingPhase, ProgressRecord, StatusTracker};
