use async_trait::async_trait;
use hierag_core::error::Result;
use hierag_core::traits::{Chunk, ChunkSplitter, DocumentSplitter, EmbeddingOperation, EmbeddingProvider};
use hierag_core::types::ContentType;
use hierag_core::{Chapter, Documento};

struct FakeEmbeddingProvider;

#[async_trait]
impl EmbeddingProvider for FakeEmbeddingProvider {
    fn name(&self) -> &str {
        "fake"
    }

    fn registered_models(&self) -> Vec<hierag_core::traits::embedding::RegisteredModel> {
        vec![]
    }

    async fn embed(
        &self,
        _operation: EmbeddingOperation,
        texts: &[String],
        _model: Option<&str>,
    ) -> Result<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|_| vec![0.0_f32; 8]).collect())
    }

    fn dimension(&self, _model: Option<&str>) -> usize {
        8
    }

    fn context_length(&self, _model: Option<&str>) -> usize {
        8192
    }

    fn token_count(&self, text: &str, _model_tier: &str) -> usize {
        text.split_whitespace().count()
    }
}

struct WholeDocumentSplitter;

#[async_trait]
impl DocumentSplitter for WholeDocumentSplitter {
    async fn split(&self, documento: &Documento) -> Result<Vec<Chapter>> {
        Ok(vec![Chapter::new(
            documento.id,
            documento.title.clone(),
            documento.markdown.clone(),
            0,
            documento.markdown.split_whitespace().count() as i64,
        )])
    }

    fn name(&self) -> &str {
        "whole-document"
    }
}

struct NoopChunkSplitter;

#[async_trait]
impl ChunkSplitter for NoopChunkSplitter {
    async fn split_chapter_into_chunks(&self, chapter: &Chapter) -> Result<Vec<Chunk>> {
        Ok(vec![Chunk {
            chapter_id: chapter.id,
            ordinal: 0,
            text: chapter.markdown.clone(),
            tokens: chapter.tokens_total,
        }])
    }
}

#[tokio::test]
async fn embedding_provider_trait_object_is_dyn_safe() {
    let provider: Box<dyn EmbeddingProvider> = Box::new(FakeEmbeddingProvider);
    let vectors = provider
        .embed(EmbeddingOperation::Document, &["a".into(), "b".into()], None)
        .await
        .unwrap();
    assert_eq!(vectors.len(), 2);
    assert_eq!(vectors[0].len(), provider.dimension(None));
}

#[tokio::test]
async fn document_splitter_and_chunk_splitter_compose() {
    let doc = Documento::new(1, "Doc", "one two three four", ContentType::Outros);
    let splitter = WholeDocumentSplitter;
    let chapters = splitter.split(&doc).await.unwrap();
    assert_eq!(chapters.len(), 1);

    let chunker = NoopChunkSplitter;
    let chunks = chunker
        .split_chapter_into_chunks(&chapters[0])
        .await
        .unwrap();
    assert_eq!(chunks.len(), 1);
    assert_eq!(chunks[0].text, "one two three four");
}
