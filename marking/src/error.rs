//! Marking Error Types
//!
//! This module defines the [`MarkError`] enum covering every failure scenario in the
//! marking core. Variants fall into two families: validation failures (a write that
//! must be rejected before it touches any state) and lookup failures (a referenced
//! record does not exist). The [`MarkError::is_validation`] and
//! [`MarkError::is_not_found`] helpers expose that split to callers.

/// Result type for marking core operations.
pub type MarkResult<T> = Result<T, MarkError>;

/// Represents all error types that can occur in the marking core.
#[derive(Debug, thiserror::Error)]
pub enum MarkError {
    /// A referenced criterion does not exist.
    #[error("Criterion {0} not found")]
    CriterionNotFound(i64),

    /// A referenced annotation text does not exist.
    #[error("Annotation text {0} not found")]
    AnnotationTextNotFound(i64),

    /// A referenced annotation does not exist.
    #[error("Annotation {0} not found")]
    AnnotationNotFound(i64),

    /// A referenced result does not exist.
    #[error("Result {0} not found")]
    ResultNotFound(i64),

    /// No mark is recorded for the given (result, criterion) pair.
    #[error("No mark for result {result_id} against criterion {criterion_id}")]
    MarkNotFound { result_id: i64, criterion_id: i64 },

    /// A mark value falls outside the criterion's `[0, max_mark]` range.
    #[error("Mark value {value} is outside the range 0..={max_mark}")]
    ValueOutOfRange { value: f64, max_mark: f64 },

    /// A deduction amount is negative or not a finite number.
    #[error("Deduction must be a non-negative number, got {0}")]
    InvalidDeduction(f64),

    /// A criterion's maximum mark is non-positive or not a finite number.
    #[error("Max mark must be a positive number, got {0}")]
    InvalidMaxMark(f64),

    /// An annotation text carries a deduction without referencing a criterion.
    #[error("Annotation text {0} carries a deduction without a criterion")]
    DeductionWithoutCriterion(i64),

    /// An id is already taken by an existing record of the same kind.
    #[error("{entity} {id} already exists")]
    DuplicateId { entity: &'static str, id: i64 },
}

impl MarkError {
    /// Whether this error rejects an invalid write.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            MarkError::ValueOutOfRange { .. }
                | MarkError::InvalidDeduction(_)
                | MarkError::InvalidMaxMark(_)
                | MarkError::DeductionWithoutCriterion(_)
                | MarkError::DuplicateId { .. }
        )
    }

    /// Whether this error reports a missing record.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            MarkError::CriterionNotFound(_)
                | MarkError::AnnotationTextNotFound(_)
                | MarkError::AnnotationNotFound(_)
                | MarkError::ResultNotFound(_)
                | MarkError::MarkNotFound { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_and_not_found_partition() {
        let errors = vec![
            MarkError::CriterionNotFound(1),
            MarkError::AnnotationTextNotFound(1),
            MarkError::AnnotationNotFound(1),
            MarkError::ResultNotFound(1),
            MarkError::MarkNotFound {
                result_id: 1,
                criterion_id: 2,
            },
            MarkError::ValueOutOfRange {
                value: 5.0,
                max_mark: 2.0,
            },
            MarkError::InvalidDeduction(-1.0),
            MarkError::InvalidMaxMark(0.0),
            MarkError::DeductionWithoutCriterion(1),
            MarkError::DuplicateId {
                entity: "criterion",
                id: 1,
            },
        ];

        for error in &errors {
            assert_ne!(
                error.is_validation(),
                error.is_not_found(),
                "error must be exactly one of validation/not-found: {error}"
            );
        }
    }

    #[test]
    fn test_display_messages() {
        let error = MarkError::ValueOutOfRange {
            value: 3.0,
            max_mark: 2.0,
        };
        assert_eq!(error.to_string(), "Mark value 3 is outside the range 0..=2");

        let error = MarkError::MarkNotFound {
            result_id: 7,
            criterion_id: 9,
        };
        assert_eq!(error.to_string(), "No mark for result 7 against criterion 9");
    }
}
