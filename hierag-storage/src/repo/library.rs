//! ABOUTME: Library repository — the retrieval-scoping and ranking-policy unit (§3)

use crate::pool::PgPool;
use hierag_core::error::{HieragError, Result};
use hierag_core::Library;

/// Persist a new Library. The weight-sum invariant is already checked by
/// [`Library::new`]; the schema's `library_weight_sum` check constraint is a
/// second line of defense against rows built outside that constructor.
///
/// # Errors
///
/// Returns [`HieragError::PersistenceError`] on any database failure.
pub async fn insert(pool: &PgPool, library: &Library) -> Result<Library> {
    let client = pool.get().await?;
    let row = client
        .query_one(
            "INSERT INTO library (uuid, name, knowledge_area, peso_semantico, peso_textual,
                                   default_embedding_model, default_completion_model, deleted_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
             RETURNING id",
            &[
                &library.uuid,
                &library.name,
                &library.knowledge_area,
                &library.peso_semantico,
                &library.peso_textual,
                &library.default_embedding_model,
                &library.default_completion_model,
                &library.deleted_at,
            ],
        )
        .await
        .map_err(|e| HieragError::PersistenceError {
            message: format!("failed to insert library: {e}"),
        })?;

    let mut saved = library.clone();
    saved.id = row.get("id");
    Ok(saved)
}

/// # Errors
///
/// Returns [`HieragError::PersistenceError`] on any database failure.
pub async fn get(pool: &PgPool, id: i64) -> Result<Option<Library>> {
    let client = pool.get().await?;
    let row = client
        .query_opt(
            "SELECT id, uuid, name, knowledge_area, peso_semantico, peso_textual,
                    default_embedding_model, default_completion_model, deleted_at
             FROM library WHERE id = $1",
            &[&id],
        )
        .await
        .map_err(|e| HieragError::PersistenceError {
            message: format!("failed to load library {id}: {e}"),
        })?;

    Ok(row.map(|row| Library {
        id: row.get("id"),
        uuid: row.get("uuid"),
        name: row.get("name"),
        knowledge_area: row.get("knowledge_area"),
        peso_semantico: row.get("peso_semantico"),
        peso_textual: row.get("peso_textual"),
        default_embedding_model: row.get("default_embedding_model"),
        default_completion_model: row.get("default_completion_model"),
        deleted_at: row.get("deleted_at"),
    }))
}

/// # Errors
///
/// Returns [`HieragError::PersistenceError`] on any database failure.
pub async fn get_by_name(pool: &PgPool, name: &str) -> Result<Option<Library>> {
    let client = pool.get().await?;
    let row = client
        .query_opt(
            "SELECT id, uuid, name, knowledge_area, peso_semantico, peso_textual,
                    default_embedding_model, default_completion_model, deleted_at
             FROM library WHERE name = $1 AND deleted_at IS NULL",
            &[&name],
        )
        .await
        .map_err(|e| HieragError::PersistenceError {
            message: format!("failed to load library '{name}': {e}"),
        })?;

    Ok(row.map(|row| Library {
        id: row.get("id"),
        uuid: row.get("uuid"),
        name: row.get("name"),
        knowledge_area: row.get("knowledge_area"),
        peso_semantico: row.get("peso_semantico"),
        peso_textual: row.get("peso_textual"),
        default_embedding_model: row.get("default_embedding_model"),
        default_completion_model: row.get("default_completion_model"),
        deleted_at: row.get("deleted_at"),
    }))
}

/// Soft-delete: sets `deleted_at`, does not cascade to Documentos.
///
/// # Errors
///
/// Returns [`HieragError::PersistenceError`] on any database failure.
pub async fn soft_delete(pool: &PgPool, id: i64, deleted_at: chrono::DateTime<chrono::Utc>) -> Result<()> {
    let client = pool.get().await?;
    client
        .execute(
            "UPDATE library SET deleted_at = $2 WHERE id = $1",
            &[&id, &deleted_at],
        )
        .await
        .map_err(|e| HieragError::PersistenceError {
            message: format!("failed to soft-delete library {id}: {e}"),
        })?;
    Ok(())
}
