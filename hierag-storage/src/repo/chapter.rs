//! ABOUTME: Chapter repository — batch insert with RETURNING id (§4.7), cascade delete (§4.5.6)

use crate::pool::PgPool;
use hierag_core::error::{HieragError, Result};
use hierag_core::Chapter;

fn row_to_chapter(row: &tokio_postgres::Row) -> Chapter {
    Chapter {
        id: row.get("id"),
        documento_id: row.get("documento_id"),
        title: row.get("title"),
        markdown: row.get("markdown"),
        ordinal: row.get("ordinal"),
        tokens_total: row.get("tokens_total"),
        metadata: serde_json::from_value(row.get("metadata")).unwrap_or_default(),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

/// Batch-insert Chapters in one round trip, returning each with its
/// generated id filled in, in the same order as `chapters` (§4.5.2 step 4,
/// §4.7 "single prepared statement with `addBatch()`-style accumulation").
///
/// # Errors
///
/// Returns [`HieragError::PersistenceError`] on any database failure.
pub async fn insert_batch(pool: &PgPool, chapters: &[Chapter]) -> Result<Vec<Chapter>> {
    if chapters.is_empty() {
        return Ok(Vec::new());
    }

    let mut client = pool.get().await?;
    let transaction = client
        .transaction()
        .await
        .map_err(|e| HieragError::PersistenceError {
            message: format!("failed to start chapter batch transaction: {e}"),
        })?;

    let statement = transaction
        .prepare(
            "INSERT INTO chapter (documento_id, title, markdown, ordinal, tokens_total, metadata, created_at, updated_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
             RETURNING id",
        )
        .await
        .map_err(|e| HieragError::PersistenceError {
            message: format!("failed to prepare chapter insert: {e}"),
        })?;

    let mut saved = Vec::with_capacity(chapters.len());
    for chapter in chapters {
        let metadata = serde_json::to_value(&chapter.metadata).unwrap_or(serde_json::Value::Null);
        let row = transaction
            .query_one(
                &statement,
                &[
                    &chapter.documento_id,
                    &chapter.title,
                    &chapter.markdown,
                    &chapter.ordinal,
                    &chapter.tokens_total,
                    &metadata,
                    &chapter.created_at,
                    &chapter.updated_at,
                ],
            )
            .await
            .map_err(|e| HieragError::PersistenceError {
                message: format!("failed to insert chapter ordinal {}: {e}", chapter.ordinal),
            })?;

        let mut with_id = chapter.clone();
        with_id.id = row.get("id");
        saved.push(with_id);
    }

    transaction
        .commit()
        .await
        .map_err(|e| HieragError::PersistenceError {
            message: format!("failed to commit chapter batch: {e}"),
        })?;

    Ok(saved)
}

/// # Errors
///
/// Returns [`HieragError::PersistenceError`] on any database failure.
pub async fn list_by_documento(pool: &PgPool, documento_id: i64) -> Result<Vec<Chapter>> {
    let client = pool.get().await?;
    let rows = client
        .query(
            "SELECT id, documento_id, title, markdown, ordinal, tokens_total, metadata, created_at, updated_at
             FROM chapter WHERE documento_id = $1 ORDER BY ordinal",
            &[&documento_id],
        )
        .await
        .map_err(|e| HieragError::PersistenceError {
            message: format!("failed to list chapters for documento {documento_id}: {e}"),
        })?;

    Ok(rows.iter().map(row_to_chapter).collect())
}

/// Count of Chapters for a document, feeding the Overwrite Controller's
/// Phase 2.0 decision (§4.5.6: "No Chapters exist" vs "Chapters exist").
///
/// # Errors
///
/// Returns [`HieragError::PersistenceError`] on any database failure.
pub async fn count_for_documento(pool: &PgPool, documento_id: i64) -> Result<i64> {
    let client = pool.get().await?;
    let row = client
        .query_one("SELECT count(*) AS total FROM chapter WHERE documento_id = $1", &[&documento_id])
        .await
        .map_err(|e| HieragError::PersistenceError {
            message: format!("failed to count chapters for documento {documento_id}: {e}"),
        })?;
    Ok(row.get("total"))
}

/// Overwrite Controller's deletion step (§4.5.6): a single `DELETE` whose
/// CASCADE removes every DocEmbedding belonging to this Documento's
/// Chapters. The Documento row itself is left untouched.
///
/// # Errors
///
/// Returns [`HieragError::PersistenceError`] on any database failure.
pub async fn delete_by_documento(pool: &PgPool, documento_id: i64) -> Result<u64> {
    let client = pool.get().await?;
    client
        .execute("DELETE FROM chapter WHERE documento_id = $1", &[&documento_id])
        .await
        .map_err(|e| HieragError::PersistenceError {
            message: format!("failed to delete chapters for documento {documento_id}: {e}"),
        })
}
