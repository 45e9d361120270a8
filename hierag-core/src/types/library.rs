use crate::error::{HieragError, Result};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A Library is the unit of retrieval scoping and ranking policy (§3).
///
/// `peso_semantico + peso_textual` must equal `1.0` (invariant #1, §8.1);
/// `new`/`with_weights` enforce this at construction time rather than
/// leaving it to be caught on save.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Library {
    pub id: i64,
    pub uuid: Uuid,
    pub name: String,
    pub knowledge_area: String,
    /// Weight given to semantic (vector) score in hybrid ranking.
    pub peso_semantico: f32,
    /// Weight given to textual (full-text) score in hybrid ranking.
    pub peso_textual: f32,
    pub default_embedding_model: Option<String>,
    pub default_completion_model: Option<String>,
    pub deleted_at: Option<chrono::DateTime<chrono::Utc>>,
}

/// Tolerance for the weight-sum invariant, matching §8.1's `1e-6`.
const WEIGHT_SUM_EPSILON: f32 = 1e-6;

impl Library {
    /// Create a new Library, validating the weight-sum invariant.
    ///
    /// # Errors
    ///
    /// Returns [`HieragError::Validation`] if `peso_semantico + peso_textual`
    /// is not within `1e-6` of `1.0`.
    pub fn new(
        name: impl Into<String>,
        knowledge_area: impl Into<String>,
        peso_semantico: f32,
        peso_textual: f32,
    ) -> Result<Self> {
        Self::validate_weights(peso_semantico, peso_textual)?;
        Ok(Self {
            id: 0,
            uuid: Uuid::new_v4(),
            name: name.into(),
            knowledge_area: knowledge_area.into(),
            peso_semantico,
            peso_textual,
            default_embedding_model: None,
            default_completion_model: None,
            deleted_at: None,
        })
    }

    /// Validate that the two weights sum to `1.0` within tolerance.
    ///
    /// # Errors
    ///
    /// Returns [`HieragError::Validation`] when the sum drifts by more than
    /// `1e-6`.
    pub fn validate_weights(peso_semantico: f32, peso_textual: f32) -> Result<()> {
        let sum = peso_semantico + peso_textual;
        if (sum - 1.0).abs() >= WEIGHT_SUM_EPSILON {
            return Err(HieragError::Validation {
                message: format!(
                    "pesoSemantico + pesoTextual must equal 1.0, got {peso_semantico} + {peso_textual} = {sum}"
                ),
            });
        }
        Ok(())
    }

    #[must_use]
    pub const fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_valid_weight_split() {
        assert!(Library::new("Civil Code", "LEGAL", 0.7, 0.3).is_ok());
    }

    #[test]
    fn rejects_weights_that_dont_sum_to_one() {
        let err = Library::new("Civil Code", "LEGAL", 0.5, 0.6).unwrap_err();
        assert!(matches!(err, HieragError::Validation { .. }));
    }

    #[test]
    fn tolerates_float_rounding_within_epsilon() {
        // 0.3 + 0.7 in f32 arithmetic is not bit-exact 1.0 but is within tolerance.
        assert!(Library::new("x", "y", 0.3, 0.7).is_ok());
    }
}
