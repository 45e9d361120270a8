//! ABOUTME: Ingestion Orchestrator (§4.5) — context creation, split+persist, batched vector computation
//! ABOUTME: Ties the splitter family, provider contexts, and storage repositories into one pipeline

use crate::overwrite::{OverwriteController, OverwriteDecision};
use crate::splitters::{SplitterFactory, TokenBudget};
use crate::status::{ProcessingPhase, StatusTracker};
use hierag_config::{ChapterConfig, ChunkConfig, IngestionConfig};
use hierag_core::error::Result;
use hierag_core::traits::{ChunkSplitter, EmbeddingOperation};
use hierag_core::types::{Chapter, DocEmbedding, Documento, EmbeddingKind};
use hierag_providers::cache::EmbeddingCache;
use hierag_providers::context::{EmbeddingContext, LLMContext};
use hierag_providers::pool::ProviderPool;
use hierag_storage::pool::PgPool;
use hierag_storage::repo::{chapter as chapter_repo, doc_embedding as doc_embedding_repo, documento as documento_repo};
use std::sync::Arc;
use tracing::{info, warn};

use crate::splitters::GenericChunkSplitter;

/// Explicit caller overrides for one document's processing run (§4.5.1).
#[derive(Debug, Clone, Default)]
pub struct ProcessOptions {
    pub overwrite: bool,
    pub embedding_model: Option<String>,
    pub completion_model: Option<String>,
    pub library_embedding_model: Option<String>,
    pub library_completion_model: Option<String>,
    pub process_embedding_model: Option<String>,
    pub process_completion_model: Option<String>,
    /// Also generate `PERGUNTAS_RESPOSTAS` embeddings for each chapter (§6.1).
    pub include_qa: bool,
    /// Also generate `RESUMO` embeddings regardless of the chapter's token
    /// count crossing `summary_threshold_tokens` (§6.1).
    pub include_summary: bool,
}

/// Terminal shape of one document's processing run (§4.5.4: "surfaces a
/// `ProcessingResult` with counts of successful and failed embeddings, and
/// `success = true` even with partial failures").
#[derive(Debug, Clone)]
pub struct ProcessingResult {
    pub documento_id: i64,
    pub outcome: ProcessingOutcome,
    pub chapters_count: usize,
    pub embeddings_total: usize,
    pub embeddings_succeeded: usize,
    pub embeddings_failed: usize,
}

/// What happened to a document during this call (§4.5.5, §4.5.6).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessingOutcome {
    Processed,
    Partial,
    Failed,
    AlreadyProcessed,
}

/// Orchestrates the three-phase ingestion pipeline for one document at a
/// time (§4.5). Concurrency across documents is the caller's
/// responsibility — §5 sizes a bounded worker pool of these calls, not a
/// pool internal to this type.
pub struct DocumentProcessingService {
    pool: PgPool,
    providers: Arc<ProviderPool>,
    ingestion_config: IngestionConfig,
    chapter_config: ChapterConfig,
    chunk_config: ChunkConfig,
    status: Arc<StatusTracker>,
    embedding_cache: Option<Arc<EmbeddingCache>>,
}

impl DocumentProcessingService {
    #[must_use]
    pub fn new(
        pool: PgPool,
        providers: Arc<ProviderPool>,
        ingestion_config: IngestionConfig,
        chapter_config: ChapterConfig,
        chunk_config: ChunkConfig,
        status: Arc<StatusTracker>,
    ) -> Self {
        Self {
            pool,
            providers,
            ingestion_config,
            chapter_config,
            chunk_config,
            status,
            embedding_cache: None,
        }
    }

    /// Share an [`EmbeddingCache`] across every document this service
    /// processes, so identical chunk text embedded in one document is not
    /// re-embedded when it recurs in another (SPEC_FULL §3).
    #[must_use]
    pub fn with_embedding_cache(mut self, cache: Arc<EmbeddingCache>) -> Self {
        self.embedding_cache = Some(cache);
        self
    }

    #[must_use]
    pub fn status_tracker(&self) -> &Arc<StatusTracker> {
        &self.status
    }

    /// Run the full pipeline for `documento` (already persisted with a
    /// generated id), honoring the Overwrite Controller's decision (§4.5.6).
    ///
    /// # Errors
    ///
    /// Returns an error only when context resolution fails fast (§7: no
    /// provider registered for the resolved model) or a database operation
    /// fails outright; per-batch/per-row embedding failures are captured in
    /// the returned [`ProcessingResult`] instead (§4.5.4).
    pub async fn process(&self, documento: &Documento, options: &ProcessOptions) -> Result<ProcessingResult> {
        let now = chrono::Utc::now();
        self.status.start(documento.id, now);

        let overwrite_controller = OverwriteController::new(&self.pool);
        match overwrite_controller.decide(documento.id, options.overwrite).await? {
            OverwriteDecision::AlreadyProcessed {
                chapters_count,
                embeddings_count,
            } => {
                self.status
                    .complete(documento.id, ProcessingPhase::Completed, chrono::Utc::now(), None);
                return Ok(ProcessingResult {
                    documento_id: documento.id,
                    outcome: ProcessingOutcome::AlreadyProcessed,
                    chapters_count: chapters_count as usize,
                    embeddings_total: embeddings_count as usize,
                    embeddings_succeeded: embeddings_count as usize,
                    embeddings_failed: 0,
                });
            }
            OverwriteDecision::DeleteThenReingest => {
                overwrite_controller.delete_for_reingest(documento.id).await?;
                self.run_full_pipeline(documento, options).await
            }
            OverwriteDecision::ProceedNormalIngestion => self.run_full_pipeline(documento, options).await,
            OverwriteDecision::ResumeMissingVectors => self.resume_pending_vectors(documento, options).await,
        }
    }

    /// Phase 2.1 (context creation) + Phase 2.2 (split+persist) + Phase 2.3
    /// (vector computation), for a document with no Chapters yet.
    async fn run_full_pipeline(&self, documento: &Documento, options: &ProcessOptions) -> Result<ProcessingResult> {
        let (embedding_context, llm_context) = match self.resolve_contexts(options) {
            Ok(contexts) => contexts,
            Err(error) => {
                self.status.complete(
                    documento.id,
                    ProcessingPhase::Failed,
                    chrono::Utc::now(),
                    Some(error.to_string()),
                );
                return Err(error);
            }
        };

        self.status.update(documento.id, |record| {
            record.phase = ProcessingPhase::Splitting;
        });

        let chapters = match self.split_and_persist(documento, &embedding_context, &llm_context, options).await {
            Ok(chapters) => chapters,
            Err(error) => {
                warn!(documento_id = documento.id, %error, "splitting failed, document marked FAILED");
                self.status.complete(
                    documento.id,
                    ProcessingPhase::Failed,
                    chrono::Utc::now(),
                    Some(error.to_string()),
                );
                return Ok(ProcessingResult {
                    documento_id: documento.id,
                    outcome: ProcessingOutcome::Failed,
                    chapters_count: 0,
                    embeddings_total: 0,
                    embeddings_succeeded: 0,
                    embeddings_failed: 0,
                });
            }
        };

        self.status.update(documento.id, |record| {
            record.chapters_count = chapters.len();
            record.phase = ProcessingPhase::VectorComputation;
        });

        self.compute_pending_vectors(documento.id, &embedding_context, &llm_context).await
    }

    /// Idempotent "resume" path (§4.5.4): Chapters already exist, only
    /// recompute NULL-vector rows.
    async fn resume_pending_vectors(&self, documento: &Documento, options: &ProcessOptions) -> Result<ProcessingResult> {
        let (embedding_context, llm_context) = self.resolve_contexts(options)?;
        self.status.update(documento.id, |record| {
            record.phase = ProcessingPhase::VectorComputation;
        });
        self.compute_pending_vectors(documento.id, &embedding_context, &llm_context).await
    }

    fn resolve_contexts(&self, options: &ProcessOptions) -> Result<(EmbeddingContext, LLMContext)> {
        let mut embedding_context = EmbeddingContext::resolve(
            &self.providers,
            options.embedding_model.as_deref(),
            options.library_embedding_model.as_deref(),
            options.process_embedding_model.as_deref(),
        )?;
        if let Some(cache) = &self.embedding_cache {
            embedding_context = embedding_context.with_cache(Arc::clone(cache));
        }
        let llm_context = LLMContext::resolve(
            &self.providers,
            options.completion_model.as_deref(),
            options.library_completion_model.as_deref(),
            options.process_completion_model.as_deref(),
        )?;
        Ok((embedding_context, llm_context))
    }

    /// Phase 2.2 (§4.5.2): detect content type, split into Chapters, build
    /// NULL-vector DocEmbeddings, batch-persist both.
    async fn split_and_persist(
        &self,
        documento: &Documento,
        embedding_context: &EmbeddingContext,
        llm_context: &LLMContext,
        options: &ProcessOptions,
    ) -> Result<Vec<Chapter>> {
        let chapter_budget = TokenBudget {
            min_tokens: i64::from(self.chapter_config.min_tokens),
            ideal_tokens: i64::from(self.chapter_config.ideal_tokens),
            max_tokens: i64::from(self.chapter_config.max_tokens),
        };
        let chunk_budget = TokenBudget {
            min_tokens: i64::from(self.chunk_config.min_tokens),
            ideal_tokens: i64::from(self.chunk_config.ideal_tokens),
            max_tokens: i64::from(self.chunk_config.max_tokens),
        };

        let provider = embedding_context.provider_handle();
        let count_tokens: crate::splitters::TokenCounterFn =
            Arc::new(move |text: &str| provider.token_count(text, "fast") as i64);

        let factory = SplitterFactory::new(chapter_budget, count_tokens.clone());
        let splitter = factory.for_content_type(documento.content_type);
        let chapters = splitter.split(documento).await?;

        let chapters = chapter_repo::insert_batch(&self.pool, &chapters).await?;

        let chunk_splitter = GenericChunkSplitter::new(chunk_budget, count_tokens.clone());
        let mut embeddings = Vec::new();

        for chapter in &chapters {
            embeddings.extend(
                self.build_embeddings_for_chapter(documento.library_id, chapter, &chunk_splitter, llm_context, options)
                    .await?,
            );
        }

        doc_embedding_repo::insert_batch(&self.pool, &embeddings).await?;

        Ok(chapters)
    }

    /// Build the `embeddingVector = null` DocEmbedding rows for one Chapter
    /// (§4.5.2 step 3): a single whole-chapter `TRECHO` when the chapter is
    /// small, otherwise an optional `RESUMO` plus N chunk `TRECHO`s.
    async fn build_embeddings_for_chapter(
        &self,
        library_id: i64,
        chapter: &Chapter,
        chunk_splitter: &GenericChunkSplitter,
        llm_context: &LLMContext,
        options: &ProcessOptions,
    ) -> Result<Vec<DocEmbedding>> {
        let ideal_chunk_size = i64::from(self.ingestion_config.ideal_chunk_size_tokens);

        if chapter.tokens_total <= ideal_chunk_size && !options.include_summary {
            return Ok(vec![DocEmbedding::new(
                library_id,
                chapter.documento_id,
                Some(chapter.id),
                EmbeddingKind::Trecho,
                chapter.markdown.clone(),
                0,
            )?]);
        }

        let mut embeddings = Vec::new();

        let summary_threshold = i64::from(self.ingestion_config.summary_threshold_tokens);
        if chapter.tokens_total > summary_threshold || options.include_summary {
            let summary_prompt = format!(
                "Summarize the following chapter in at most {} tokens:\n\n{}",
                self.ingestion_config.summary_max_tokens, chapter.markdown
            );
            match llm_context.completion("You produce concise chapter summaries.", &summary_prompt).await {
                Ok(summary) => embeddings.push(DocEmbedding::new(
                    library_id,
                    chapter.documento_id,
                    Some(chapter.id),
                    EmbeddingKind::Resumo,
                    summary,
                    -1,
                )?),
                Err(error) => {
                    warn!(chapter_id = chapter.id, %error, "chapter summary generation failed, continuing without RESUMO");
                }
            }
        }

        let chunks = chunk_splitter.split_chapter_into_chunks(chapter).await?;
        for chunk in chunks {
            embeddings.push(DocEmbedding::new(
                library_id,
                chapter.documento_id,
                Some(chapter.id),
                EmbeddingKind::Trecho,
                chunk.text,
                chunk.ordinal,
            )?);
        }

        Ok(embeddings)
    }

    /// Phase 2.3 (§4.5.3): load NULL-vector DocEmbeddings, batch them,
    /// handle oversize texts, dispatch embeddings, write vectors back with
    /// per-batch/per-row fault isolation (§4.5.4).
    async fn compute_pending_vectors(
        &self,
        documento_id: i64,
        embedding_context: &EmbeddingContext,
        llm_context: &LLMContext,
    ) -> Result<ProcessingResult> {
        let pending = doc_embedding_repo::load_pending(&self.pool, documento_id).await?;
        let chapters = chapter_repo::list_by_documento(&self.pool, documento_id).await?;
        let chapters_count = chapters.len();
        let tokens_total: i64 = chapters.iter().map(|c| c.tokens_total).sum();

        let total = pending.len();
        self.status.update(documento_id, |record| {
            record.embeddings_total = total;
        });

        let mut succeeded = 0usize;
        let mut failed = 0usize;

        for batch in pending.chunks(self.ingestion_config.batch_size) {
            match self.process_batch(batch, embedding_context, llm_context).await {
                Ok((batch_succeeded, batch_failed)) => {
                    succeeded += batch_succeeded;
                    failed += batch_failed;
                }
                Err(error) => {
                    warn!(documento_id, %error, batch_len = batch.len(), "embedding batch failed outright, skipping");
                    failed += batch.len();
                }
            }
            self.status.update(documento_id, |record| {
                record.embeddings_processed = succeeded;
                record.embeddings_failed = failed;
            });
        }

        let outcome = if total == 0 || failed == 0 {
            ProcessingOutcome::Processed
        } else {
            ProcessingOutcome::Partial
        };

        info!(documento_id, succeeded, failed, ?outcome, "document vector computation finished");

        if outcome == ProcessingOutcome::Processed {
            documento_repo::set_tokens_total(&self.pool, documento_id, tokens_total, chrono::Utc::now()).await?;
        }

        self.status
            .complete(documento_id, ProcessingPhase::Completed, chrono::Utc::now(), None);

        Ok(ProcessingResult {
            documento_id,
            outcome,
            chapters_count,
            embeddings_total: total,
            embeddings_succeeded: succeeded,
            embeddings_failed: failed,
        })
    }

    /// One embedding batch: oversize handling per text (§4.5.3 step 1),
    /// single batched `embeddings()` call (step 2), per-row vector writes
    /// (step 3). A batch-level failure (the remote call itself erroring) is
    /// propagated to the caller, which counts every row in the batch as
    /// failed and moves on (§4.5.4) — it is never retried here.
    async fn process_batch(
        &self,
        batch: &[DocEmbedding],
        embedding_context: &EmbeddingContext,
        llm_context: &LLMContext,
    ) -> Result<(usize, usize)> {
        let cap = embedding_context.context_length() as i64;
        let mut processed_texts = Vec::with_capacity(batch.len());
        let mut resumos: Vec<Option<String>> = Vec::with_capacity(batch.len());

        for embedding in batch {
            let (text, resumo) = self.handle_oversize_text(&embedding.texto, cap, llm_context, embedding_context).await;
            processed_texts.push(text);
            resumos.push(resumo);
        }

        let vectors = embedding_context
            .embeddings(EmbeddingOperation::Document, &processed_texts)
            .await?;

        let mut succeeded = 0usize;
        let mut failed = 0usize;
        let now = chrono::Utc::now();

        for ((embedding, vector), resumo) in batch.iter().zip(vectors).zip(resumos) {
            let write_result = match resumo {
                Some(resumo) => doc_embedding_repo::update_vector_with_resumo(&self.pool, embedding.id, &vector, &resumo, now).await,
                None => doc_embedding_repo::update_vector(&self.pool, embedding.id, &vector, now).await,
            };
            match write_result {
                Ok(()) => succeeded += 1,
                Err(error) => {
                    warn!(doc_embedding_id = embedding.id, %error, "vector write failed for row, continuing");
                    failed += 1;
                }
            }
        }

        Ok((succeeded, failed))
    }

    /// §4.5.3 step 1: truncate or LLM-summarize text that exceeds the
    /// embedding model's context length, depending on how far over it is.
    async fn handle_oversize_text(
        &self,
        text: &str,
        cap: i64,
        llm_context: &LLMContext,
        embedding_context: &EmbeddingContext,
    ) -> (String, Option<String>) {
        let text_tokens = embedding_context.token_count(text, "fast") as i64;
        if text_tokens <= cap || cap <= 0 {
            return (text.to_string(), None);
        }

        #[allow(clippy::cast_precision_loss)]
        let excess_percent = ((text_tokens - cap) as f64) * 100.0 / (text_tokens as f64);

        if excess_percent > self.ingestion_config.oversize_threshold_percent {
            let prompt = format!("Condense the following text to fit within {cap} tokens:\n\n{text}");
            match llm_context.completion("You condense text to fit a token budget.", &prompt).await {
                Ok(summary) => return (summary.clone(), Some(summary)),
                Err(error) => {
                    warn!(%error, "oversize condensation failed, falling back to truncation");
                }
            }
        }

        let max_chars = (cap as usize).saturating_mul(4);
        let truncated: String = text.chars().take(max_chars).collect();
        (truncated, None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn doc_embedding_constructor_defaults_vector_to_none() {
        let chapter = Chapter::new(1, "Title", "body", 0, 10);
        let embedding = DocEmbedding::new(1, chapter.documento_id, Some(chapter.id), EmbeddingKind::Trecho, "text", 0).unwrap();
        assert!(embedding.embedding_vector.is_none());
        assert_eq!(embedding.order_chapter, 0);
        assert_eq!(embedding.documento_id, chapter.documento_id);
    }

    #[test]
    fn default_process_options_have_no_overrides() {
        let options = ProcessOptions::default();
        assert!(!options.overwrite);
        assert!(!options.include_qa);
        assert!(!options.include_summary);
        assert!(options.embedding_model.is_none());
    }
}
