//! # Annotations Module
//!
//! Annotation texts are reusable comment templates; a text may carry a
//! deduction amount tied to one criterion, in which case every annotation
//! created from it lowers that criterion's mark. An [`Annotation`] is one
//! application of a text to one result.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{MarkError, MarkResult};

/// A reusable comment template, optionally deductive.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AnnotationText {
    pub id: i64,
    pub content: String,
    pub criterion_id: Option<i64>,
    pub deduction: Option<f64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl AnnotationText {
    /// Create an annotation text.
    ///
    /// A deduction must be a finite, non-negative number and must reference a
    /// criterion; a text with neither is purely commentary.
    pub fn new(
        id: i64,
        content: &str,
        criterion_id: Option<i64>,
        deduction: Option<f64>,
    ) -> MarkResult<Self> {
        if let Some(amount) = deduction {
            if !amount.is_finite() || amount < 0.0 {
                return Err(MarkError::InvalidDeduction(amount));
            }
            if criterion_id.is_none() {
                return Err(MarkError::DeductionWithoutCriterion(id));
            }
        }
        let now = Utc::now();
        Ok(Self {
            id,
            content: content.to_string(),
            criterion_id,
            deduction,
            created_at: now,
            updated_at: now,
        })
    }

    /// Whether annotations of this text carry a deduction.
    pub fn is_deductive(&self) -> bool {
        self.deduction.is_some()
    }
}

/// One application of an annotation text to a submission result.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Annotation {
    pub id: i64,
    pub annotation_text_id: i64,
    pub result_id: i64,
    pub created_at: DateTime<Utc>,
}

impl Annotation {
    pub fn new(id: i64, annotation_text_id: i64, result_id: i64) -> Self {
        Self {
            id,
            annotation_text_id,
            result_id,
            created_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_commentary_text_has_no_deduction() {
        let text = AnnotationText::new(1, "well structured", None, None).unwrap();
        assert!(!text.is_deductive());
        assert_eq!(text.criterion_id, None);
    }

    #[test]
    fn test_zero_deduction_is_still_deductive() {
        let text = AnnotationText::new(1, "style nit", Some(4), Some(0.0)).unwrap();
        assert!(text.is_deductive());
    }

    #[test]
    fn test_rejects_negative_deduction() {
        let result = AnnotationText::new(1, "late", Some(4), Some(-1.0));
        assert!(matches!(result, Err(MarkError::InvalidDeduction(_))));
    }

    #[test]
    fn test_rejects_deduction_without_criterion() {
        let result = AnnotationText::new(1, "late", None, Some(1.0));
        assert!(matches!(
            result,
            Err(MarkError::DeductionWithoutCriterion(1))
        ));
    }
}
