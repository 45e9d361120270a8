//! ABOUTME: DocEmbedding repository — NULL-vector batch insert, per-row vector updates (§4.7)

use crate::pool::PgPool;
use hierag_core::error::{HieragError, Result};
use hierag_core::{DocEmbedding, EmbeddingKind};
use pgvector::Vector;

fn embedding_kind_to_sql(kind: EmbeddingKind) -> &'static str {
    match kind {
        EmbeddingKind::Trecho => "TRECHO",
        EmbeddingKind::Capitulo => "CAPITULO",
        EmbeddingKind::Resumo => "RESUMO",
        EmbeddingKind::PerguntasRespostas => "PERGUNTAS_RESPOSTAS",
    }
}

fn embedding_kind_from_sql(value: &str) -> EmbeddingKind {
    match value {
        "CAPITULO" => EmbeddingKind::Capitulo,
        "RESUMO" => EmbeddingKind::Resumo,
        "PERGUNTAS_RESPOSTAS" => EmbeddingKind::PerguntasRespostas,
        _ => EmbeddingKind::Trecho,
    }
}

fn row_to_doc_embedding(row: &tokio_postgres::Row) -> DocEmbedding {
    let tipo: String = row.get("tipo_embedding");
    let vector: Option<Vector> = row.get("embedding_vector");
    DocEmbedding {
        id: row.get("id"),
        library_id: row.get("library_id"),
        documento_id: row.get("documento_id"),
        chapter_id: row.get("chapter_id"),
        tipo_embedding: embedding_kind_from_sql(&tipo),
        texto: row.get("texto"),
        embedding_vector: vector.map(Vector::to_vec),
        order_chapter: row.get("order_chapter"),
        metadata: serde_json::from_value(row.get("metadata")).unwrap_or_default(),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

/// Batch-insert DocEmbeddings with `embedding_vector = NULL` (§4.5.2 step
/// 4), in one round trip, returning each with its generated id filled in.
///
/// # Errors
///
/// Returns [`HieragError::PersistenceError`] on any database failure.
pub async fn insert_batch(pool: &PgPool, embeddings: &[DocEmbedding]) -> Result<Vec<DocEmbedding>> {
    if embeddings.is_empty() {
        return Ok(Vec::new());
    }

    let mut client = pool.get().await?;
    let transaction = client
        .transaction()
        .await
        .map_err(|e| HieragError::PersistenceError {
            message: format!("failed to start doc_embedding batch transaction: {e}"),
        })?;

    let statement = transaction
        .prepare(
            "INSERT INTO doc_embedding (library_id, documento_id, chapter_id, tipo_embedding, texto,
                                         embedding_vector, order_chapter, metadata, created_at, updated_at)
             VALUES ($1, $2, $3, $4, $5, NULL, $6, $7, $8, $9)
             RETURNING id",
        )
        .await
        .map_err(|e| HieragError::PersistenceError {
            message: format!("failed to prepare doc_embedding insert: {e}"),
        })?;

    let mut saved = Vec::with_capacity(embeddings.len());
    for embedding in embeddings {
        let metadata = serde_json::to_value(&embedding.metadata).unwrap_or(serde_json::Value::Null);
        let row = transaction
            .query_one(
                &statement,
                &[
                    &embedding.library_id,
                    &embedding.documento_id,
                    &embedding.chapter_id,
                    &embedding_kind_to_sql(embedding.tipo_embedding),
                    &embedding.texto,
                    &embedding.order_chapter,
                    &metadata,
                    &embedding.created_at,
                    &embedding.updated_at,
                ],
            )
            .await
            .map_err(|e| HieragError::PersistenceError {
                message: format!(
                    "failed to insert doc_embedding for chapter {:?}: {e}",
                    embedding.chapter_id
                ),
            })?;

        let mut with_id = embedding.clone();
        with_id.id = row.get("id");
        saved.push(with_id);
    }

    transaction
        .commit()
        .await
        .map_err(|e| HieragError::PersistenceError {
            message: format!("failed to commit doc_embedding batch: {e}"),
        })?;

    Ok(saved)
}

/// Load DocEmbeddings with `embedding_vector IS NULL` for a document (§4.5.3
/// phase start, and the "resume" idempotent re-invocation of §4.5.4).
///
/// # Errors
///
/// Returns [`HieragError::PersistenceError`] on any database failure.
pub async fn load_pending(pool: &PgPool, documento_id: i64) -> Result<Vec<DocEmbedding>> {
    let client = pool.get().await?;
    let rows = client
        .query(
            "SELECT id, library_id, documento_id, chapter_id, tipo_embedding, texto,
                    embedding_vector, order_chapter, metadata, created_at, updated_at
             FROM doc_embedding WHERE documento_id = $1 AND embedding_vector IS NULL
             ORDER BY chapter_id, order_chapter",
            &[&documento_id],
        )
        .await
        .map_err(|e| HieragError::PersistenceError {
            message: format!("failed to load pending doc_embeddings for documento {documento_id}: {e}"),
        })?;

    Ok(rows.iter().map(row_to_doc_embedding).collect())
}

/// Per-row vector write (§4.5.3 step 3, §4.7: "isolate failures" — a
/// failure here must not affect sibling rows, hence no shared transaction).
///
/// # Errors
///
/// Returns [`HieragError::PersistenceError`] on any database failure.
pub async fn update_vector(
    pool: &PgPool,
    id: i64,
    vector: &[f32],
    updated_at: chrono::DateTime<chrono::Utc>,
) -> Result<()> {
    let client = pool.get().await?;
    client
        .execute(
            "UPDATE doc_embedding SET embedding_vector = $2, updated_at = $3 WHERE id = $1",
            &[&id, &Vector::from(vector.to_vec()), &updated_at],
        )
        .await
        .map_err(|e| HieragError::PersistenceError {
            message: format!("failed to update vector for doc_embedding {id}: {e}"),
        })?;
    Ok(())
}

/// Same as [`update_vector`] but also merges a `"resumo"` key into metadata
/// (§4.5.3: oversize condensation via LLM summary records the generated
/// text there).
///
/// # Errors
///
/// Returns [`HieragError::PersistenceError`] on any database failure.
pub async fn update_vector_with_resumo(
    pool: &PgPool,
    id: i64,
    vector: &[f32],
    resumo: &str,
    updated_at: chrono::DateTime<chrono::Utc>,
) -> Result<()> {
    let client = pool.get().await?;
    client
        .execute(
            "UPDATE doc_embedding
             SET embedding_vector = $2,
                 metadata = metadata || jsonb_build_object('resumo', $3::text),
                 updated_at = $4
             WHERE id = $1",
            &[&id, &Vector::from(vector.to_vec()), &resumo, &updated_at],
        )
        .await
        .map_err(|e| HieragError::PersistenceError {
            message: format!("failed to update vector+resumo for doc_embedding {id}: {e}"),
        })?;
    Ok(())
}

/// `(total, with_vector)` counts for a document, feeding both the derived
/// state machine (§4.5.5) and the Processing-Status Tracker (§4.9).
///
/// # Errors
///
/// Returns [`HieragError::PersistenceError`] on any database failure.
pub async fn vector_counts(pool: &PgPool, documento_id: i64) -> Result<(i64, i64)> {
    let client = pool.get().await?;
    let row = client
        .query_one(
            "SELECT count(*) AS total, count(embedding_vector) AS with_vector
             FROM doc_embedding WHERE documento_id = $1",
            &[&documento_id],
        )
        .await
        .map_err(|e| HieragError::PersistenceError {
            message: format!("failed to count doc_embeddings for documento {documento_id}: {e}"),
        })?;

    Ok((row.get("total"), row.get("with_vector")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn embedding_kind_round_trips_through_sql_strings() {
        for kind in [
            EmbeddingKind::Trecho,
            EmbeddingKind::Capitulo,
            EmbeddingKind::Resumo,
            EmbeddingKind::PerguntasRespostas,
        ] {
            let sql = embedding_kind_to_sql(kind);
            assert_eq!(embedding_kind_from_sql(sql), kind);
        }
    }
}
