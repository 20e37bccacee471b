//! # Store Module
//!
//! In-memory registry of criteria, annotation texts, annotations, results and
//! marks. Lookups that miss return `NotFound` errors and writes that would
//! break an invariant are rejected before any mutation, so the store never
//! holds a partially-applied change.

use std::collections::{HashMap, HashSet};

use chrono::Utc;

use crate::annotations::{Annotation, AnnotationText};
use crate::criteria::Criterion;
use crate::deduction::DeductionEntry;
use crate::error::{MarkError, MarkResult};
use crate::mark::Mark;

/// Registry backing the mark lifecycle engine.
///
/// Marks are keyed by (result, criterion); exactly one mark exists per pair,
/// seeded when either side of the pair appears.
#[derive(Debug)]
pub struct GradeStore {
    criteria: HashMap<i64, Criterion>,
    annotation_texts: HashMap<i64, AnnotationText>,
    annotations: HashMap<i64, Annotation>,
    results: HashSet<i64>,
    marks: HashMap<(i64, i64), Mark>,
    next_mark_id: i64,
}

impl Default for GradeStore {
    fn default() -> Self {
        Self::new()
    }
}

impl GradeStore {
    pub fn new() -> Self {
        Self {
            criteria: HashMap::new(),
            annotation_texts: HashMap::new(),
            annotations: HashMap::new(),
            results: HashSet::new(),
            marks: HashMap::new(),
            next_mark_id: 1,
        }
    }

    fn seed_mark(&mut self, result_id: i64, criterion_id: i64) {
        let id = self.next_mark_id;
        self.next_mark_id += 1;
        self.marks
            .insert((result_id, criterion_id), Mark::seeded(id, result_id, criterion_id));
    }

    /// Register a criterion, seeding an unset mark into every existing result.
    pub fn insert_criterion(&mut self, criterion: Criterion) -> MarkResult<()> {
        if self.criteria.contains_key(&criterion.id) {
            return Err(MarkError::DuplicateId {
                entity: "Criterion",
                id: criterion.id,
            });
        }
        let result_ids: Vec<i64> = self.results.iter().copied().collect();
        for result_id in result_ids {
            self.seed_mark(result_id, criterion.id);
        }
        self.criteria.insert(criterion.id, criterion);
        Ok(())
    }

    pub fn criterion(&self, id: i64) -> MarkResult<&Criterion> {
        self.criteria.get(&id).ok_or(MarkError::CriterionNotFound(id))
    }

    pub(crate) fn set_criterion_max_mark(&mut self, id: i64, max_mark: f64) -> MarkResult<()> {
        let criterion = self
            .criteria
            .get_mut(&id)
            .ok_or(MarkError::CriterionNotFound(id))?;
        criterion.max_mark = max_mark;
        criterion.updated_at = Utc::now();
        Ok(())
    }

    /// Register an annotation text; a referenced criterion must already exist.
    pub fn insert_annotation_text(&mut self, text: AnnotationText) -> MarkResult<()> {
        if self.annotation_texts.contains_key(&text.id) {
            return Err(MarkError::DuplicateId {
                entity: "AnnotationText",
                id: text.id,
            });
        }
        if let Some(criterion_id) = text.criterion_id {
            self.criterion(criterion_id)?;
        }
        self.annotation_texts.insert(text.id, text);
        Ok(())
    }

    pub fn annotation_text(&self, id: i64) -> MarkResult<&AnnotationText> {
        self.annotation_texts
            .get(&id)
            .ok_or(MarkError::AnnotationTextNotFound(id))
    }

    /// Replace a text's deduction amount, validating before any mutation.
    pub(crate) fn set_text_deduction(
        &mut self,
        id: i64,
        deduction: Option<f64>,
    ) -> MarkResult<()> {
        if let Some(amount) = deduction {
            if !amount.is_finite() || amount < 0.0 {
                return Err(MarkError::InvalidDeduction(amount));
            }
        }
        let text = self
            .annotation_texts
            .get_mut(&id)
            .ok_or(MarkError::AnnotationTextNotFound(id))?;
        if deduction.is_some() && text.criterion_id.is_none() {
            return Err(MarkError::DeductionWithoutCriterion(id));
        }
        text.deduction = deduction;
        text.updated_at = Utc::now();
        Ok(())
    }

    /// Create a result, seeding one unset mark per registered criterion.
    pub fn create_result(&mut self, result_id: i64) -> MarkResult<()> {
        if !self.results.insert(result_id) {
            return Err(MarkError::DuplicateId {
                entity: "Result",
                id: result_id,
            });
        }
        let criterion_ids: Vec<i64> = self.criteria.keys().copied().collect();
        for criterion_id in criterion_ids {
            self.seed_mark(result_id, criterion_id);
        }
        Ok(())
    }

    pub fn has_result(&self, result_id: i64) -> bool {
        self.results.contains(&result_id)
    }

    pub(crate) fn insert_annotation(&mut self, annotation: Annotation) -> MarkResult<()> {
        if self.annotations.contains_key(&annotation.id) {
            return Err(MarkError::DuplicateId {
                entity: "Annotation",
                id: annotation.id,
            });
        }
        self.annotation_text(annotation.annotation_text_id)?;
        if !self.has_result(annotation.result_id) {
            return Err(MarkError::ResultNotFound(annotation.result_id));
        }
        self.annotations.insert(annotation.id, annotation);
        Ok(())
    }

    /// Re-point an annotation at a different text.
    ///
    /// Returns the annotation's result id and the text id it previously
    /// pointed at, so the caller can recompute both affected marks.
    pub(crate) fn repoint_annotation(
        &mut self,
        annotation_id: i64,
        annotation_text_id: i64,
    ) -> MarkResult<(i64, i64)> {
        self.annotation_text(annotation_text_id)?;
        let annotation = self
            .annotations
            .get_mut(&annotation_id)
            .ok_or(MarkError::AnnotationNotFound(annotation_id))?;
        let previous_text_id = annotation.annotation_text_id;
        annotation.annotation_text_id = annotation_text_id;
        Ok((annotation.result_id, previous_text_id))
    }

    pub(crate) fn remove_annotation(&mut self, annotation_id: i64) -> MarkResult<Annotation> {
        self.annotations
            .remove(&annotation_id)
            .ok_or(MarkError::AnnotationNotFound(annotation_id))
    }

    pub fn annotation(&self, id: i64) -> MarkResult<&Annotation> {
        self.annotations.get(&id).ok_or(MarkError::AnnotationNotFound(id))
    }

    /// Join a result's annotations with their texts for deduction aggregation.
    pub fn deduction_entries(&self, result_id: i64) -> Vec<DeductionEntry<'_>> {
        self.annotations
            .values()
            .filter(|annotation| annotation.result_id == result_id)
            .filter_map(|annotation| {
                self.annotation_texts
                    .get(&annotation.annotation_text_id)
                    .map(|text| (annotation, text))
            })
            .collect()
    }

    /// The distinct results carrying an annotation of the given text.
    pub(crate) fn results_with_text(&self, annotation_text_id: i64) -> Vec<i64> {
        let mut result_ids: Vec<i64> = self
            .annotations
            .values()
            .filter(|annotation| annotation.annotation_text_id == annotation_text_id)
            .map(|annotation| annotation.result_id)
            .collect();
        result_ids.sort_unstable();
        result_ids.dedup();
        result_ids
    }

    pub fn mark(&self, result_id: i64, criterion_id: i64) -> MarkResult<&Mark> {
        self.marks
            .get(&(result_id, criterion_id))
            .ok_or(MarkError::MarkNotFound {
                result_id,
                criterion_id,
            })
    }

    pub(crate) fn mark_mut(&mut self, result_id: i64, criterion_id: i64) -> MarkResult<&mut Mark> {
        self.marks
            .get_mut(&(result_id, criterion_id))
            .ok_or(MarkError::MarkNotFound {
                result_id,
                criterion_id,
            })
    }

    /// All marks of a result, ordered by criterion for deterministic output.
    pub fn marks_for_result(&self, result_id: i64) -> Vec<&Mark> {
        let mut marks: Vec<&Mark> = self
            .marks
            .values()
            .filter(|mark| mark.result_id == result_id)
            .collect();
        marks.sort_by_key(|mark| mark.criterion_id);
        marks
    }

    /// Rescale every set mark of a criterion onto a new maximum.
    ///
    /// Returns the number of marks rescaled. Override flags are preserved;
    /// unset marks are untouched.
    pub(crate) fn rescale_criterion_marks(
        &mut self,
        criterion: &Criterion,
        target_max_mark: f64,
    ) -> usize {
        let mut rescaled = 0;
        for mark in self
            .marks
            .values_mut()
            .filter(|mark| mark.criterion_id == criterion.id)
        {
            if let Some(value) = mark.value {
                mark.value = Some(criterion.scale_mark(value, target_max_mark));
                mark.updated_at = Utc::now();
                rescaled += 1;
            }
        }
        rescaled
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::criteria::CriterionKind;

    fn store_with_criterion() -> GradeStore {
        let mut store = GradeStore::new();
        store
            .insert_criterion(Criterion::new(1, CriterionKind::Flexible, 3.0).unwrap())
            .unwrap();
        store
    }

    #[test]
    fn test_create_result_seeds_one_mark_per_criterion() {
        let mut store = store_with_criterion();
        store
            .insert_criterion(Criterion::new(2, CriterionKind::Rubric, 4.0).unwrap())
            .unwrap();
        store.create_result(100).unwrap();

        let marks = store.marks_for_result(100);
        assert_eq!(marks.len(), 2);
        assert!(marks.iter().all(|mark| mark.value.is_none() && !mark.is_override));
    }

    #[test]
    fn test_late_criterion_seeds_marks_into_existing_results() {
        let mut store = store_with_criterion();
        store.create_result(100).unwrap();
        store
            .insert_criterion(Criterion::new(2, CriterionKind::Checkbox, 1.0).unwrap())
            .unwrap();

        assert!(store.mark(100, 2).is_ok());
    }

    #[test]
    fn test_duplicate_ids_rejected() {
        let mut store = store_with_criterion();
        let duplicate = Criterion::new(1, CriterionKind::Rubric, 5.0).unwrap();
        assert!(matches!(
            store.insert_criterion(duplicate),
            Err(MarkError::DuplicateId { entity: "Criterion", .. })
        ));

        store.create_result(100).unwrap();
        assert!(matches!(
            store.create_result(100),
            Err(MarkError::DuplicateId { entity: "Result", .. })
        ));
    }

    #[test]
    fn test_text_requires_existing_criterion() {
        let mut store = store_with_criterion();
        let dangling = AnnotationText::new(10, "text", Some(99), Some(1.0)).unwrap();
        assert!(matches!(
            store.insert_annotation_text(dangling),
            Err(MarkError::CriterionNotFound(99))
        ));
    }

    #[test]
    fn test_annotation_requires_text_and_result() {
        let mut store = store_with_criterion();
        store
            .insert_annotation_text(AnnotationText::new(10, "text", Some(1), Some(1.0)).unwrap())
            .unwrap();

        assert!(matches!(
            store.insert_annotation(Annotation::new(1000, 99, 100)),
            Err(MarkError::AnnotationTextNotFound(99))
        ));
        assert!(matches!(
            store.insert_annotation(Annotation::new(1000, 10, 100)),
            Err(MarkError::ResultNotFound(100))
        ));
    }

    #[test]
    fn test_deduction_entries_joins_texts() {
        let mut store = store_with_criterion();
        store
            .insert_annotation_text(AnnotationText::new(10, "text", Some(1), Some(1.0)).unwrap())
            .unwrap();
        store.create_result(100).unwrap();
        store.create_result(200).unwrap();
        store.insert_annotation(Annotation::new(1000, 10, 100)).unwrap();
        store.insert_annotation(Annotation::new(1001, 10, 200)).unwrap();

        let entries = store.deduction_entries(100);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].0.id, 1000);
        assert_eq!(entries[0].1.id, 10);

        assert_eq!(store.results_with_text(10), vec![100, 200]);
    }

    #[test]
    fn test_set_text_deduction_validates_before_mutating() {
        let mut store = store_with_criterion();
        store
            .insert_annotation_text(AnnotationText::new(10, "text", Some(1), Some(1.0)).unwrap())
            .unwrap();

        assert!(matches!(
            store.set_text_deduction(10, Some(-2.0)),
            Err(MarkError::InvalidDeduction(_))
        ));
        assert_eq!(store.annotation_text(10).unwrap().deduction, Some(1.0));

        store.set_text_deduction(10, Some(2.5)).unwrap();
        assert_eq!(store.annotation_text(10).unwrap().deduction, Some(2.5));
    }
}
