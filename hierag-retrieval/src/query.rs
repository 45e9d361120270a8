//! ABOUTME: Query preprocessing (§4.6.1) — normalization and tsquery OR-expansion
//! ABOUTME: The `to_tsquery`/`plainto_tsquery` call itself is the database's job; this owns the surrounding text transforms

use hierag_core::error::{HieragError, Result};
use hierag_storage::pool::PgPool;

/// Strip unsupported punctuation and map user-visible boolean operators to
/// what Postgres's `to_tsquery` family expects: `AND` → space (implicit
/// conjunction), `NOT` → `-` (exclusion prefix). Phrase quotes and existing
/// exclusion prefixes (`-word`) are preserved (§4.6.1 step 1).
#[must_use]
pub fn normalize_query(query: &str) -> String {
    let mut normalized = String::with_capacity(query.len());
    let mut in_phrase = false;

    for word in query.split_whitespace() {
        let upper = word.to_ascii_uppercase();
        if upper == "AND" {
            continue;
        }
        if upper == "NOT" {
            normalized.push_str("- ");
            continue;
        }

        if word.starts_with('"') {
            in_phrase = true;
        }
        if word.ends_with('"') && in_phrase {
            in_phrase = false;
        }

        let cleaned: String = word
            .chars()
            .filter(|c| c.is_alphanumeric() || *c == '"' || *c == '-' || c.is_whitespace())
            .collect();

        if !cleaned.is_empty() {
            normalized.push_str(&cleaned);
            normalized.push(' ');
        }
    }

    normalized.trim().to_string()
}

/// Globally replace ` & ` with ` | ` in a tsquery string, except when the
/// conjunction introduces an exclusion (` & !`). The phrase operator `<->`
/// is a distinct token and is never touched (§4.6.1 step 3).
///
/// This must run on the tsquery string the database already produced from
/// [`normalize_query`]'s output (via `plainto_tsquery`/`to_tsquery`) — it is
/// a post-processing pass on that output, not a substitute for it.
#[must_use]
pub fn or_expand(tsquery: &str) -> String {
    let mut result = String::with_capacity(tsquery.len());
    let mut rest = tsquery;

    while let Some(idx) = rest.find(" & ") {
        result.push_str(&rest[..idx]);
        let after = idx + " & ".len();
        if rest[after..].starts_with('!') {
            result.push_str(" & ");
        } else {
            result.push_str(" | ");
        }
        rest = &rest[after..];
    }
    result.push_str(rest);

    result
}

/// Run the database's natural-language-to-tsquery function and return the
/// resulting tsquery as a string (§4.6.1 step 2). The returned string is an
/// opaque tsquery literal — callers bind it with `::tsquery`, never
/// `to_tsquery` again (§4.6.1 step 4).
///
/// # Errors
///
/// Returns [`HieragError::PersistenceError`] on any database failure.
pub async fn to_tsquery_string(pool: &PgPool, language: &str, normalized_query: &str) -> Result<String> {
    let client = pool.get().await?;
    let row = client
        .query_one(
            "SELECT plainto_tsquery($1::regconfig, $2)::text AS tsquery",
            &[&language, &normalized_query],
        )
        .await
        .map_err(|e| HieragError::PersistenceError {
            message: format!("failed to build tsquery: {e}"),
        })?;

    let tsquery: String = row.get("tsquery");
    if tsquery.trim().is_empty() {
        return Err(HieragError::Validation {
            message: "query produced an empty tsquery".to_string(),
        });
    }
    Ok(tsquery)
}

/// Full preprocessing pipeline: normalize, build the tsquery via the
/// database, then OR-expand it (§4.6.1).
///
/// # Errors
///
/// Returns [`HieragError::PersistenceError`] on any database failure, or
/// [`HieragError::Validation`] if the query normalizes to nothing.
pub async fn preprocess_query(pool: &PgPool, language: &str, query: &str) -> Result<String> {
    let normalized = normalize_query(query);
    if normalized.is_empty() {
        return Err(HieragError::Validation {
            message: "query is empty after normalization".to_string(),
        });
    }
    let tsquery = to_tsquery_string(pool, language, &normalized).await?;
    Ok(or_expand(&tsquery))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_maps_and_to_space() {
        assert_eq!(normalize_query("cafe AND leite"), "cafe leite");
    }

    #[test]
    fn normalize_maps_not_to_minus_prefix() {
        assert_eq!(normalize_query("cafe NOT chocolate"), "cafe - chocolate");
    }

    #[test]
    fn normalize_strips_unsupported_punctuation() {
        assert_eq!(normalize_query("cafe!!! com, leite??"), "cafe com leite");
    }

    #[test]
    fn normalize_preserves_phrase_quotes() {
        let normalized = normalize_query("\"cafe com leite\"");
        assert!(normalized.contains('"'));
    }

    #[test]
    fn or_expand_converts_conjunction_to_disjunction() {
        assert_eq!(or_expand("'cafe' & 'leit'"), "'cafe' | 'leit'");
    }

    #[test]
    fn or_expand_preserves_exclusion_conjunction() {
        assert_eq!(or_expand("'cafe' & !'chocolate'"), "'cafe' & !'chocolate'");
    }

    #[test]
    fn or_expand_preserves_phrase_operator() {
        assert_eq!(or_expand("'cafe' <-> 'leite'"), "'cafe' <-> 'leite'");
    }

    #[test]
    fn or_expand_handles_mixed_conjunctions() {
        let input = "'cafe' & 'leite' & !'chocolate'";
        assert_eq!(or_expand(input), "'cafe' | 'leite' & !'chocolate'");
    }
}
