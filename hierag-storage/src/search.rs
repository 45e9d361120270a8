//! ABOUTME: Hybrid retrieval SQL (§4.6) — semantic, textual, and RRF-fused search over doc_embedding

use crate::pool::PgPool;
use hierag_core::error::{HieragError, Result};
use pgvector::Vector;
use serde::{Deserialize, Serialize};

/// One ranked hit, enriched with its parent Chapter/Documento titles
/// (§4.6.5).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResult {
    pub doc_embedding_id: i64,
    pub documento_id: i64,
    pub chapter_id: Option<i64>,
    pub texto: String,
    pub documento_title: String,
    pub chapter_title: Option<String>,
    pub semantic_score: f32,
    pub textual_score: f32,
    pub score: f32,
}

fn row_to_result(row: &tokio_postgres::Row) -> SearchResult {
    SearchResult {
        doc_embedding_id: row.get("id"),
        documento_id: row.get("documento_id"),
        chapter_id: row.get("chapter_id"),
        texto: row.get("texto"),
        documento_title: row.get("documento_title"),
        chapter_title: row.get("chapter_title"),
        semantic_score: row.get("semantic_score"),
        textual_score: row.get("textual_score"),
        score: row.get("score"),
    }
}

/// Rank by cosine vector distance alone (§4.6.3 `semanticSearch`).
///
/// # Errors
///
/// Returns [`HieragError::PersistenceError`] on any database failure.
pub async fn semantic_search(
    pool: &PgPool,
    query_vector: &[f32],
    library_ids: &[i64],
    limit: i64,
) -> Result<Vec<SearchResult>> {
    let client = pool.get().await?;
    let rows = client
        .query(
            "SELECT e.id, e.documento_id, e.chapter_id, e.texto,
                    d.title AS documento_title, c.title AS chapter_title,
                    (1 - (e.embedding_vector <=> $1))::real AS semantic_score,
                    0.0::real AS textual_score,
                    (1 - (e.embedding_vector <=> $1))::real AS score
             FROM doc_embedding e
             JOIN documento d ON d.id = e.documento_id
             LEFT JOIN chapter c ON c.id = e.chapter_id
             WHERE e.library_id = ANY($2) AND e.embedding_vector IS NOT NULL
             ORDER BY e.embedding_vector <=> $1
             LIMIT $3",
            &[&Vector::from(query_vector.to_vec()), &library_ids, &limit],
        )
        .await
        .map_err(|e| HieragError::PersistenceError {
            message: format!("semantic search failed: {e}"),
        })?;

    Ok(rows.iter().map(row_to_result).collect())
}

/// Rank by `ts_rank_cd` alone (§4.6.3 `textualSearch`). `tsquery` is bound
/// as a pre-built string and cast with `$1::tsquery` — it must already be
/// the OR-expanded, preprocessed form (§4.6.1); re-parsing it here with
/// `to_tsquery` would silently discard the OR-expansion.
///
/// # Errors
///
/// Returns [`HieragError::PersistenceError`] on any database failure.
pub async fn textual_search(
    pool: &PgPool,
    tsquery: &str,
    library_ids: &[i64],
    limit: i64,
) -> Result<Vec<SearchResult>> {
    let client = pool.get().await?;
    let rows = client
        .query(
            "SELECT e.id, e.documento_id, e.chapter_id, e.texto,
                    d.title AS documento_title, c.title AS chapter_title,
                    0.0::real AS semantic_score,
                    ts_rank_cd(e.text_search_tsv, $1::tsquery) AS textual_score,
                    ts_rank_cd(e.text_search_tsv, $1::tsquery) AS score
             FROM doc_embedding e
             JOIN documento d ON d.id = e.documento_id
             LEFT JOIN chapter c ON c.id = e.chapter_id
             WHERE e.library_id = ANY($2) AND e.text_search_tsv @@ $1::tsquery
             ORDER BY score DESC
             LIMIT $3",
            &[&tsquery, &library_ids, &limit],
        )
        .await
        .map_err(|e| HieragError::PersistenceError {
            message: format!("textual search failed: {e}"),
        })?;

    Ok(rows.iter().map(row_to_result).collect())
}

/// Reciprocal-rank fusion of the semantic and textual sides (§4.6.3
/// `hybridSearch`, §4.6.4). `semantic_weight + textual_weight` should sum
/// to `1.0`; callers validate this before calling (usually the owning
/// Library's `peso_semantico`/`peso_textual`).
///
/// # Errors
///
/// Returns [`HieragError::PersistenceError`] on any database failure.
#[allow(clippy::too_many_arguments)]
pub async fn hybrid_search(
    pool: &PgPool,
    query_vector: &[f32],
    tsquery: &str,
    library_ids: &[i64],
    limit: i64,
    semantic_weight: f32,
    textual_weight: f32,
    fusion_k: f64,
) -> Result<Vec<SearchResult>> {
    let client = pool.get().await?;
    let rows = client
        .query(
            "WITH semantic_ranked AS (
                 SELECT id, row_number() OVER (ORDER BY embedding_vector <=> $1) AS rank_s,
                        (1 - (embedding_vector <=> $1))::real AS semantic_score
                 FROM doc_embedding
                 WHERE library_id = ANY($3) AND embedding_vector IS NOT NULL
                 ORDER BY embedding_vector <=> $1
                 LIMIT $4 * 4
             ),
             text_ranked AS (
                 SELECT id, row_number() OVER (ORDER BY ts_rank_cd(text_search_tsv, $2::tsquery) DESC) AS rank_t,
                        ts_rank_cd(text_search_tsv, $2::tsquery) AS textual_score
                 FROM doc_embedding
                 WHERE library_id = ANY($3) AND text_search_tsv @@ $2::tsquery
                 ORDER BY ts_rank_cd(text_search_tsv, $2::tsquery) DESC
                 LIMIT $4 * 4
             ),
             combined AS (
                 SELECT
                     coalesce(s.id, t.id) AS id,
                     coalesce(s.semantic_score, 0.0::real) AS semantic_score,
                     coalesce(t.textual_score, 0.0::real) AS textual_score,
                     ($5 * coalesce(1.0 / ($7 + s.rank_s), 0.0) +
                      $6 * coalesce(1.0 / ($7 + t.rank_t), 0.0))::real AS score
                 FROM semantic_ranked s
                 FULL OUTER JOIN text_ranked t ON s.id = t.id
             )
             SELECT e.id, e.documento_id, e.chapter_id, e.texto,
                    d.title AS documento_title, c.title AS chapter_title,
                    combined.semantic_score, combined.textual_score, combined.score
             FROM combined
             JOIN doc_embedding e ON e.id = combined.id
             JOIN documento d ON d.id = e.documento_id
             LEFT JOIN chapter c ON c.id = e.chapter_id
             ORDER BY combined.score DESC, e.id
             LIMIT $4",
            &[
                &Vector::from(query_vector.to_vec()),
                &tsquery,
                &library_ids,
                &limit,
                &f64::from(semantic_weight),
                &f64::from(textual_weight),
                &fusion_k,
            ],
        )
        .await
        .map_err(|e| HieragError::PersistenceError {
            message: format!("hybrid search failed: {e}"),
        })?;

    Ok(rows.iter().map(row_to_result).collect())
}
