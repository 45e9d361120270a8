//! ABOUTME: Documento repository — checksum-uniqueness duplicate detection (§4.8), persistence (§4.7)

use crate::pool::PgPool;
use hierag_core::error::{HieragError, Result};
use hierag_core::{ContentType, Documento, ProcessingState};

/// Postgres has no native unsigned 64-bit type; CRC64 values are stored
/// bit-identically as signed `BIGINT` and only ever compared for equality,
/// never ordered or added, so the reinterpretation is lossless.
const fn checksum_to_sql(checksum: u64) -> i64 {
    checksum as i64
}

const fn checksum_from_sql(value: i64) -> u64 {
    value as u64
}

fn content_type_to_sql(content_type: ContentType) -> &'static str {
    match content_type {
        ContentType::Lei => "LEI",
        ContentType::Decreto => "DECRETO",
        ContentType::InstrucaoNormativa => "INSTRUCAO_NORMATIVA",
        ContentType::Wiki => "WIKI",
        ContentType::Livro => "LIVRO",
        ContentType::Artigo => "ARTIGO",
        ContentType::Manual => "MANUAL",
        ContentType::Outros => "OUTROS",
    }
}

fn content_type_from_sql(value: &str) -> ContentType {
    match value {
        "LEI" => ContentType::Lei,
        "DECRETO" => ContentType::Decreto,
        "INSTRUCAO_NORMATIVA" => ContentType::InstrucaoNormativa,
        "WIKI" => ContentType::Wiki,
        "LIVRO" => ContentType::Livro,
        "ARTIGO" => ContentType::Artigo,
        "MANUAL" => ContentType::Manual,
        _ => ContentType::Outros,
    }
}

fn row_to_documento(row: &tokio_postgres::Row) -> Documento {
    let checksum: i64 = row.get("checksum");
    let content_type: String = row.get("content_type");
    Documento {
        id: row.get("id"),
        library_id: row.get("library_id"),
        title: row.get("title"),
        markdown: row.get("markdown"),
        content_type: content_type_from_sql(&content_type),
        publication_date: row.get("publication_date"),
        flag_vigente: row.get("flag_vigente"),
        tokens_total: row.get("tokens_total"),
        checksum: checksum_from_sql(checksum),
        metadata: serde_json::from_value(row.get("metadata")).unwrap_or_default(),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
        deleted_at: row.get("deleted_at"),
    }
}

/// Postgres unique-violation SQLSTATE.
const UNIQUE_VIOLATION: &str = "23505";

/// Insert a Documento, enforcing `(library_id, checksum)` uniqueness
/// (§4.8). The existing row is looked up first for a cheap, readable error;
/// the database's unique constraint is the source of truth against races
/// between concurrent uploads of the same content.
///
/// # Errors
///
/// Returns [`HieragError::DuplicateDocument`] if the checksum already
/// exists for this library, or [`HieragError::PersistenceError`] otherwise.
pub async fn insert(pool: &PgPool, documento: &Documento) -> Result<Documento> {
    if let Some(existing) = find_by_checksum(pool, documento.library_id, documento.checksum).await? {
        return Err(HieragError::DuplicateDocument {
            library_id: documento.library_id,
            checksum: documento.checksum,
            existing_id: existing.id,
        });
    }

    let client = pool.get().await?;
    let metadata = serde_json::to_value(&documento.metadata).unwrap_or(serde_json::Value::Null);
    let row = client
        .query_one(
            "INSERT INTO documento (library_id, title, markdown, content_type, publication_date,
                                     flag_vigente, tokens_total, checksum, metadata,
                                     created_at, updated_at, deleted_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
             RETURNING id",
            &[
                &documento.library_id,
                &documento.title,
                &documento.markdown,
                &content_type_to_sql(documento.content_type),
                &documento.publication_date,
                &documento.flag_vigente,
                &documento.tokens_total,
                &checksum_to_sql(documento.checksum),
                &metadata,
                &documento.created_at,
                &documento.updated_at,
                &documento.deleted_at,
            ],
        )
        .await
        .map_err(|e| {
            if e.code().map(|c| c.code()) == Some(UNIQUE_VIOLATION) {
                HieragError::DuplicateDocument {
                    library_id: documento.library_id,
                    checksum: documento.checksum,
                    existing_id: 0,
                }
            } else {
                HieragError::PersistenceError {
                    message: format!("failed to insert documento: {e}"),
                }
            }
        })?;

    let mut saved = documento.clone();
    saved.id = row.get("id");
    Ok(saved)
}

/// # Errors
///
/// Returns [`HieragError::PersistenceError`] on any database failure.
pub async fn find_by_checksum(pool: &PgPool, library_id: i64, checksum: u64) -> Result<Option<Documento>> {
    let client = pool.get().await?;
    let row = client
        .query_opt(
            "SELECT id, library_id, title, markdown, content_type, publication_date, flag_vigente,
                    tokens_total, checksum, metadata, created_at, updated_at, deleted_at
             FROM documento WHERE library_id = $1 AND checksum = $2",
            &[&library_id, &checksum_to_sql(checksum)],
        )
        .await
        .map_err(|e| HieragError::PersistenceError {
            message: format!("failed to look up documento by checksum: {e}"),
        })?;

    Ok(row.map(|row| row_to_documento(&row)))
}

/// # Errors
///
/// Returns [`HieragError::PersistenceError`] on any database failure.
pub async fn get(pool: &PgPool, id: i64) -> Result<Option<Documento>> {
    let client = pool.get().await?;
    let row = client
        .query_opt(
            "SELECT id, library_id, title, markdown, content_type, publication_date, flag_vigente,
                    tokens_total, checksum, metadata, created_at, updated_at, deleted_at
             FROM documento WHERE id = $1",
            &[&id],
        )
        .await
        .map_err(|e| HieragError::PersistenceError {
            message: format!("failed to load documento {id}: {e}"),
        })?;

    Ok(row.map(|row| row_to_documento(&row)))
}

/// Fills in `tokens_total` once ingestion completes successfully (§3 invariant).
///
/// # Errors
///
/// Returns [`HieragError::PersistenceError`] on any database failure.
pub async fn set_tokens_total(
    pool: &PgPool,
    id: i64,
    tokens_total: i64,
    updated_at: chrono::DateTime<chrono::Utc>,
) -> Result<()> {
    let client = pool.get().await?;
    client
        .execute(
            "UPDATE documento SET tokens_total = $2, updated_at = $3 WHERE id = $1",
            &[&id, &tokens_total, &updated_at],
        )
        .await
        .map_err(|e| HieragError::PersistenceError {
            message: format!("failed to update tokens_total for documento {id}: {e}"),
        })?;
    Ok(())
}

/// Derive the processing state of a Documento from its Chapter/DocEmbedding
/// rows (§4.5.5) — never stored as a column.
///
/// The database alone cannot distinguish `PROCESSING` (orchestrator
/// currently running) from `PARTIAL` (a run finished with some vectors
/// still NULL) — both look identical here as "chapters exist, some vectors
/// pending". This function reports the pending case as `Processing`; the
/// ingestion orchestrator's in-memory tracker (§4.9) overrides it with
/// `Partial` once it knows no worker is still active on the document.
///
/// # Errors
///
/// Returns [`HieragError::PersistenceError`] on any database failure.
pub async fn processing_state(pool: &PgPool, documento_id: i64) -> Result<ProcessingState> {
    let client = pool.get().await?;
    let row = client
        .query_one(
            "SELECT
                 (SELECT count(*) FROM chapter WHERE documento_id = $1) AS chapter_count,
                 (SELECT count(*) FROM doc_embedding WHERE documento_id = $1) AS embedding_count,
                 (SELECT count(*) FROM doc_embedding WHERE documento_id = $1 AND embedding_vector IS NULL)
                     AS pending_count",
            &[&documento_id],
        )
        .await
        .map_err(|e| HieragError::PersistenceError {
            message: format!("failed to derive processing state for documento {documento_id}: {e}"),
        })?;

    let chapter_count: i64 = row.get("chapter_count");
    let embedding_count: i64 = row.get("embedding_count");
    let pending_count: i64 = row.get("pending_count");

    Ok(if chapter_count == 0 {
        ProcessingState::Uploaded
    } else if pending_count == 0 && embedding_count > 0 {
        ProcessingState::Processed
    } else {
        // Chapters exist but vectors are incomplete (or not yet inserted) —
        // see the caveat above about PROCESSING vs. PARTIAL.
        ProcessingState::Processing
    })
}

/// # Errors
///
/// Returns [`HieragError::PersistenceError`] on any database failure.
pub async fn soft_delete(pool: &PgPool, id: i64, deleted_at: chrono::DateTime<chrono::Utc>) -> Result<()> {
    let client = pool.get().await?;
    client
        .execute(
            "UPDATE documento SET deleted_at = $2, updated_at = $2 WHERE id = $1",
            &[&id, &deleted_at],
        )
        .await
        .map_err(|e| HieragError::PersistenceError {
            message: format!("failed to soft-delete documento {id}: {e}"),
        })?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn checksum_round_trips_through_bit_cast() {
        let checksum: u64 = u64::MAX - 5;
        let sql = checksum_to_sql(checksum);
        assert_eq!(checksum_from_sql(sql), checksum);
    }

    #[test]
    fn content_type_round_trips_through_sql_strings() {
        for ct in [
            ContentType::Lei,
            ContentType::Decreto,
            ContentType::InstrucaoNormativa,
            ContentType::Wiki,
            ContentType::Livro,
            ContentType::Artigo,
            ContentType::Manual,
            ContentType::Outros,
        ] {
            let sql = content_type_to_sql(ct);
            assert_eq!(content_type_from_sql(sql), ct);
        }
    }
}
