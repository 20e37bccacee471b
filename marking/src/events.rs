/// Event system for the mark lifecycle engine
///
/// This module defines the annotation-change events that trigger mark
/// recomputation. Events are emitted by grading collaborators (the annotation
/// editing surface) and consumed by the engine to keep marks in sync with the
/// deductions currently applied to each result.
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// All annotation changes that can trigger a mark recomputation
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum AnnotationEvent {
    /// An annotation was applied to a result
    AnnotationCreated {
        annotation_id: i64,
        result_id: i64,
        annotation_text_id: i64,
        created_at: DateTime<Utc>,
    },

    /// An annotation was re-pointed at a different annotation text
    AnnotationUpdated {
        annotation_id: i64,
        annotation_text_id: i64,
        updated_at: DateTime<Utc>,
    },

    /// An annotation was removed from a result
    AnnotationDestroyed {
        annotation_id: i64,
        destroyed_at: DateTime<Utc>,
    },

    /// An annotation text's deduction amount was changed
    DeductionChanged {
        annotation_text_id: i64,
        deduction: Option<f64>,
        changed_at: DateTime<Utc>,
    },
}

impl AnnotationEvent {
    /// Get the event type string for logging and dispatch
    pub fn event_type(&self) -> &'static str {
        match self {
            AnnotationEvent::AnnotationCreated { .. } => "annotation_created",
            AnnotationEvent::AnnotationUpdated { .. } => "annotation_updated",
            AnnotationEvent::AnnotationDestroyed { .. } => "annotation_destroyed",
            AnnotationEvent::DeductionChanged { .. } => "deduction_changed",
        }
    }

    /// Get the annotation ID for this event (if applicable)
    pub fn annotation_id(&self) -> Option<i64> {
        match self {
            AnnotationEvent::AnnotationCreated { annotation_id, .. } => Some(*annotation_id),
            AnnotationEvent::AnnotationUpdated { annotation_id, .. } => Some(*annotation_id),
            AnnotationEvent::AnnotationDestroyed { annotation_id, .. } => Some(*annotation_id),
            AnnotationEvent::DeductionChanged { .. } => None,
        }
    }

    /// Convert event to JSON Value for structured logging
    pub fn to_json(&self) -> Result<serde_json::Value, serde_json::Error> {
        serde_json::to_value(self)
    }
}

/// Event builder helpers for common event creation patterns
impl AnnotationEvent {
    /// Create an annotation-created event
    pub fn created(annotation_id: i64, result_id: i64, annotation_text_id: i64) -> Self {
        AnnotationEvent::AnnotationCreated {
            annotation_id,
            result_id,
            annotation_text_id,
            created_at: Utc::now(),
        }
    }

    /// Create an annotation-updated event
    pub fn updated(annotation_id: i64, annotation_text_id: i64) -> Self {
        AnnotationEvent::AnnotationUpdated {
            annotation_id,
            annotation_text_id,
            updated_at: Utc::now(),
        }
    }

    /// Create an annotation-destroyed event
    pub fn destroyed(annotation_id: i64) -> Self {
        AnnotationEvent::AnnotationDestroyed {
            annotation_id,
            destroyed_at: Utc::now(),
        }
    }

    /// Create a deduction-changed event
    pub fn deduction_changed(annotation_text_id: i64, deduction: Option<f64>) -> Self {
        AnnotationEvent::DeductionChanged {
            annotation_text_id,
            deduction,
            changed_at: Utc::now(),
        }
    }
}
