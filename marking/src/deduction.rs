//! # Deduction Module
//!
//! Pure aggregation of annotation deductions for one criterion within one
//! result. The total is re-derived from scratch on every call rather than
//! kept as an incremental counter, so out-of-order edits and deletes cannot
//! cause drift.

use crate::annotations::{Annotation, AnnotationText};

/// An annotation joined with the text it was created from.
pub type DeductionEntry<'a> = (&'a Annotation, &'a AnnotationText);

/// Sum the deductions attached to `criterion_id` across `entries`.
///
/// Annotations tied to other criteria, or to non-deductive texts, are ignored.
/// Returns `0.0` when no matching annotations exist.
///
/// # Example
///
/// ```
/// use marking::annotations::{Annotation, AnnotationText};
/// use marking::deduction::calculate_deduction;
///
/// let text = AnnotationText::new(1, "missing edge case", Some(7), Some(1.5)).unwrap();
/// let first = Annotation::new(10, 1, 100);
/// let second = Annotation::new(11, 1, 100);
///
/// let entries = vec![(&first, &text), (&second, &text)];
/// assert_eq!(calculate_deduction(&entries, 7), 3.0);
/// assert_eq!(calculate_deduction(&entries, 8), 0.0);
/// ```
pub fn calculate_deduction(entries: &[DeductionEntry<'_>], criterion_id: i64) -> f64 {
    entries
        .iter()
        .filter(|(_, text)| text.criterion_id == Some(criterion_id))
        .filter_map(|(_, text)| text.deduction)
        .sum()
}

/// Whether any deductive annotation for `criterion_id` remains in `entries`.
pub fn has_deductive_annotations(entries: &[DeductionEntry<'_>], criterion_id: i64) -> bool {
    entries
        .iter()
        .any(|(_, text)| text.criterion_id == Some(criterion_id) && text.deduction.is_some())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::MarkResult;

    fn deductive_text(id: i64, criterion_id: i64, deduction: f64) -> MarkResult<AnnotationText> {
        AnnotationText::new(id, "mock text", Some(criterion_id), Some(deduction))
    }

    #[test]
    fn test_no_annotations_is_zero() {
        assert_eq!(calculate_deduction(&[], 7), 0.0);
        assert!(!has_deductive_annotations(&[], 7));
    }

    #[test]
    fn test_sums_matching_deductions() {
        let text_a = deductive_text(1, 7, 1.0).unwrap();
        let text_b = deductive_text(2, 7, 1.5).unwrap();
        let a = Annotation::new(10, 1, 100);
        let b = Annotation::new(11, 2, 100);

        let entries = vec![(&a, &text_a), (&b, &text_b)];
        assert_eq!(calculate_deduction(&entries, 7), 2.5);
        assert!(has_deductive_annotations(&entries, 7));
    }

    #[test]
    fn test_ignores_other_criteria() {
        let text_a = deductive_text(1, 7, 1.0).unwrap();
        let text_b = deductive_text(2, 8, 5.0).unwrap();
        let a = Annotation::new(10, 1, 100);
        let b = Annotation::new(11, 2, 100);

        let entries = vec![(&a, &text_a), (&b, &text_b)];
        assert_eq!(calculate_deduction(&entries, 7), 1.0);
        assert_eq!(calculate_deduction(&entries, 8), 5.0);
    }

    #[test]
    fn test_ignores_commentary_texts() {
        let commentary = AnnotationText::new(1, "nice work", None, None).unwrap();
        let a = Annotation::new(10, 1, 100);

        let entries = vec![(&a, &commentary)];
        assert_eq!(calculate_deduction(&entries, 7), 0.0);
        assert!(!has_deductive_annotations(&entries, 7));
    }

    #[test]
    fn test_zero_value_deductions_count_as_deductive() {
        let text = deductive_text(1, 7, 0.0).unwrap();
        let a = Annotation::new(10, 1, 100);

        let entries = vec![(&a, &text)];
        assert_eq!(calculate_deduction(&entries, 7), 0.0);
        assert!(has_deductive_annotations(&entries, 7));
    }

    #[test]
    fn test_same_text_applied_repeatedly() {
        let text = deductive_text(1, 7, 1.0).unwrap();
        let a = Annotation::new(10, 1, 100);
        let b = Annotation::new(11, 1, 100);
        let c = Annotation::new(12, 1, 100);

        let entries = vec![(&a, &text), (&b, &text), (&c, &text)];
        assert_eq!(calculate_deduction(&entries, 7), 3.0);
    }
}
