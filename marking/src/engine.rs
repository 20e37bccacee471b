/// Mark Lifecycle Engine
///
/// This module provides the event-driven engine that keeps every mark in sync
/// with the deductive annotations currently applied to its result. Annotation
/// changes arrive as [`AnnotationEvent`]s; the engine applies the change and
/// performs the read-compute-write for each affected (result, criterion) pair
/// under a single write guard, so recomputations never race.
///
/// Override semantics: a grader-supplied override suppresses recomputation
/// until it is explicitly cleared. The one exception is a stale override (a
/// null overridden value whose last deductive annotation is destroyed), which
/// is reset to the derived state.
use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::annotations::{Annotation, AnnotationText};
use crate::criteria::Criterion;
use crate::deduction;
use crate::error::{MarkError, MarkResult};
use crate::events::AnnotationEvent;
use crate::mark::MarkView;
use crate::store::GradeStore;

/// Configuration for the mark engine
#[derive(Debug, Clone)]
pub struct MarkEngineConfig {
    /// Whether to log debug information about each recomputation
    pub debug_logging: bool,
}

impl Default for MarkEngineConfig {
    fn default() -> Self {
        Self {
            debug_logging: false,
        }
    }
}

impl MarkEngineConfig {
    /// Build the engine configuration from the environment-backed config.
    pub fn from_env() -> Self {
        let config = common::Config::init(".env");
        Self {
            debug_logging: config.debug_logging,
        }
    }
}

/// Result of processing an annotation event
#[derive(Debug, Clone, Default)]
pub struct EventOutcome {
    /// (result, criterion) pairs whose marks were recomputed
    pub recomputed: Vec<(i64, i64)>,
    /// (result, criterion) pairs whose stale overrides were reset
    pub overrides_cleared: Vec<(i64, i64)>,
}

/// Event-driven mark lifecycle engine
///
/// The engine owns the grade store and serialises every lifecycle transition
/// behind a write lock, treating each read-compute-write as one atomic unit.
/// Deduction totals are re-derived from scratch on every transition, so calls
/// are idempotent and safe to repeat.
pub struct MarkEngine {
    store: Arc<RwLock<GradeStore>>,
    config: MarkEngineConfig,
}

impl MarkEngine {
    /// Create a new mark engine
    pub fn new(config: MarkEngineConfig) -> Self {
        Self {
            store: Arc::new(RwLock::new(GradeStore::new())),
            config,
        }
    }

    /// Create a new mark engine with default configuration
    pub fn new_default() -> Self {
        Self::new(MarkEngineConfig::default())
    }

    /// Register a criterion
    pub async fn add_criterion(&self, criterion: Criterion) -> MarkResult<()> {
        let mut store = self.store.write().await;
        store.insert_criterion(criterion)
    }

    /// Register an annotation text
    pub async fn add_annotation_text(&self, text: AnnotationText) -> MarkResult<()> {
        let mut store = self.store.write().await;
        store.insert_annotation_text(text)
    }

    /// Create a result, seeding one unset mark per registered criterion
    pub async fn create_result(&self, result_id: i64) -> MarkResult<()> {
        let mut store = self.store.write().await;
        store.create_result(result_id)?;
        info!("Seeded marks for result {}", result_id);
        Ok(())
    }

    /// Get the current mark for a (result, criterion) pair
    pub async fn get_mark(&self, result_id: i64, criterion_id: i64) -> MarkResult<MarkView> {
        let store = self.store.read().await;
        Ok(MarkView::from(store.mark(result_id, criterion_id)?))
    }

    /// Process an annotation event and resync every affected mark
    pub async fn handle_event(&self, event: AnnotationEvent) -> MarkResult<EventOutcome> {
        if self.config.debug_logging {
            debug!("Processing '{}' event", event.event_type());
        }

        let mut store = self.store.write().await;
        let mut outcome = EventOutcome::default();

        match event {
            AnnotationEvent::AnnotationCreated {
                annotation_id,
                result_id,
                annotation_text_id,
                ..
            } => {
                let criterion_id = store.annotation_text(annotation_text_id)?.criterion_id;
                store.insert_annotation(Annotation::new(
                    annotation_id,
                    annotation_text_id,
                    result_id,
                ))?;
                if let Some(criterion_id) = criterion_id {
                    if Self::recompute_locked(&mut store, result_id, criterion_id)? {
                        outcome.recomputed.push((result_id, criterion_id));
                    }
                }
            }

            AnnotationEvent::AnnotationUpdated {
                annotation_id,
                annotation_text_id,
                ..
            } => {
                let (result_id, previous_text_id) =
                    store.repoint_annotation(annotation_id, annotation_text_id)?;
                let previous_criterion = store.annotation_text(previous_text_id)?.criterion_id;
                let current_criterion = store.annotation_text(annotation_text_id)?.criterion_id;

                let mut criterion_ids: Vec<i64> = [previous_criterion, current_criterion]
                    .into_iter()
                    .flatten()
                    .collect();
                criterion_ids.sort_unstable();
                criterion_ids.dedup();

                for criterion_id in criterion_ids {
                    if Self::recompute_locked(&mut store, result_id, criterion_id)? {
                        outcome.recomputed.push((result_id, criterion_id));
                    }
                }
            }

            AnnotationEvent::AnnotationDestroyed { annotation_id, .. } => {
                let annotation = store.annotation(annotation_id)?.clone();
                let criterion_id = store
                    .annotation_text(annotation.annotation_text_id)?
                    .criterion_id;
                store.remove_annotation(annotation_id)?;

                if let Some(criterion_id) = criterion_id {
                    let result_id = annotation.result_id;

                    // A null override left behind by the last deductive
                    // annotation is stale, not intentional: reset it.
                    let stale_override = {
                        let entries = store.deduction_entries(result_id);
                        let none_left =
                            !deduction::has_deductive_annotations(&entries, criterion_id);
                        let mark = store.mark(result_id, criterion_id)?;
                        mark.is_override && mark.value.is_none() && none_left
                    };
                    if stale_override {
                        let mark = store.mark_mut(result_id, criterion_id)?;
                        mark.is_override = false;
                        mark.updated_at = chrono::Utc::now();
                        outcome.overrides_cleared.push((result_id, criterion_id));
                        warn!(
                            "Reset stale null override for result {} criterion {}",
                            result_id, criterion_id
                        );
                    }

                    if Self::recompute_locked(&mut store, result_id, criterion_id)? {
                        outcome.recomputed.push((result_id, criterion_id));
                    }
                }
            }

            AnnotationEvent::DeductionChanged {
                annotation_text_id,
                deduction,
                ..
            } => {
                let affected_results = store.results_with_text(annotation_text_id);
                store.set_text_deduction(annotation_text_id, deduction)?;
                let criterion_id = store.annotation_text(annotation_text_id)?.criterion_id;

                if let Some(criterion_id) = criterion_id {
                    for result_id in affected_results {
                        if Self::recompute_locked(&mut store, result_id, criterion_id)? {
                            outcome.recomputed.push((result_id, criterion_id));
                        }
                    }
                }
            }
        }

        if self.config.debug_logging {
            debug!(
                "Recomputed {} marks, cleared {} overrides",
                outcome.recomputed.len(),
                outcome.overrides_cleared.len()
            );
        }
        Ok(outcome)
    }

    /// Write or clear a grader override.
    ///
    /// With `override_flag` set, the supplied value (which may be `None`)
    /// becomes the mark and recomputation is suppressed; out-of-range values
    /// are rejected before anything is written. With `override_flag` cleared,
    /// the value is ignored and the mark immediately resyncs to the current
    /// deduction-derived state.
    pub async fn set_override(
        &self,
        result_id: i64,
        criterion_id: i64,
        value: Option<f64>,
        override_flag: bool,
    ) -> MarkResult<MarkView> {
        let mut store = self.store.write().await;
        let max_mark = store.criterion(criterion_id)?.max_mark;
        store.mark(result_id, criterion_id)?;

        if override_flag {
            if let Some(supplied) = value {
                if !supplied.is_finite() || supplied < 0.0 || supplied > max_mark {
                    return Err(MarkError::ValueOutOfRange {
                        value: supplied,
                        max_mark,
                    });
                }
            }
            let mark = store.mark_mut(result_id, criterion_id)?;
            mark.value = value;
            mark.is_override = true;
            mark.updated_at = chrono::Utc::now();
            if self.config.debug_logging {
                debug!(
                    "Override set for result {} criterion {}: {:?}",
                    result_id, criterion_id, value
                );
            }
        } else {
            let mark = store.mark_mut(result_id, criterion_id)?;
            mark.is_override = false;
            mark.updated_at = chrono::Utc::now();
            Self::recompute_locked(&mut store, result_id, criterion_id)?;
        }

        Ok(MarkView::from(store.mark(result_id, criterion_id)?))
    }

    /// Recompute one mark on demand. Idempotent; overridden marks are left
    /// untouched.
    pub async fn recompute(&self, result_id: i64, criterion_id: i64) -> MarkResult<MarkView> {
        let mut store = self.store.write().await;
        Self::recompute_locked(&mut store, result_id, criterion_id)?;
        Ok(MarkView::from(store.mark(result_id, criterion_id)?))
    }

    /// Recompute every mark of a result (bulk re-sync)
    pub async fn recompute_result(&self, result_id: i64) -> MarkResult<EventOutcome> {
        let mut store = self.store.write().await;
        if !store.has_result(result_id) {
            return Err(MarkError::ResultNotFound(result_id));
        }
        let pairs: Vec<(i64, i64)> = store
            .marks_for_result(result_id)
            .iter()
            .map(|mark| (mark.result_id, mark.criterion_id))
            .collect();

        let mut outcome = EventOutcome::default();
        for (result_id, criterion_id) in pairs {
            if Self::recompute_locked(&mut store, result_id, criterion_id)? {
                outcome.recomputed.push((result_id, criterion_id));
            }
        }
        Ok(outcome)
    }

    /// Re-weight a criterion, rescaling every set mark proportionally.
    ///
    /// Returns the number of marks rescaled.
    pub async fn rescale_criterion(
        &self,
        criterion_id: i64,
        new_max_mark: f64,
    ) -> MarkResult<usize> {
        if !new_max_mark.is_finite() || new_max_mark <= 0.0 {
            return Err(MarkError::InvalidMaxMark(new_max_mark));
        }
        let mut store = self.store.write().await;
        let criterion = store.criterion(criterion_id)?.clone();
        let rescaled = store.rescale_criterion_marks(&criterion, new_max_mark);
        store.set_criterion_max_mark(criterion_id, new_max_mark)?;
        info!(
            "Rescaled {} marks for criterion {} onto max {}",
            rescaled, criterion_id, new_max_mark
        );
        Ok(rescaled)
    }

    /// Sum of the set mark values of a result
    pub async fn result_subtotal(&self, result_id: i64) -> MarkResult<f64> {
        let store = self.store.read().await;
        if !store.has_result(result_id) {
            return Err(MarkError::ResultNotFound(result_id));
        }
        Ok(store
            .marks_for_result(result_id)
            .iter()
            .filter_map(|mark| mark.value)
            .sum())
    }

    /// The atomic read-compute-write for one mark.
    ///
    /// Returns `false` when the mark is overridden (override wins, nothing
    /// touched). Otherwise the deduction total is re-derived; a zero total
    /// unsets the value, anything else lands on the clamped award.
    fn recompute_locked(
        store: &mut GradeStore,
        result_id: i64,
        criterion_id: i64,
    ) -> MarkResult<bool> {
        let criterion = store.criterion(criterion_id)?.clone();
        if store.mark(result_id, criterion_id)?.is_override {
            return Ok(false);
        }

        let total = {
            let entries = store.deduction_entries(result_id);
            deduction::calculate_deduction(&entries, criterion_id)
        };
        let value = if total == 0.0 {
            None
        } else {
            Some(criterion.award_from_deduction(total))
        };

        let mark = store.mark_mut(result_id, criterion_id)?;
        if mark.value != value {
            mark.value = value;
            mark.updated_at = chrono::Utc::now();
        }
        Ok(true)
    }
}
