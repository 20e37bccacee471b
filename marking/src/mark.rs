//! # Mark Module
//!
//! The computed (or overridden) numeric grade for one (result, criterion)
//! pair. [`Mark`] is the internal record mutated by the engine; [`MarkView`]
//! is the serializable read-model handed to callers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle state of a mark, derived from its value and override flag.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MarkState {
    /// No deduction applies and no override is in place; the value is unset.
    Unset,
    /// The value was derived from the current annotation deductions.
    Computed,
    /// The value was supplied by a grader and is immune to recomputation.
    Overridden,
}

/// The mark for one (result, criterion) pair.
///
/// Exactly one mark exists per pair; it is seeded with the result and never
/// deleted independently of it. Whenever `value` is `Some`, it lies within
/// `[0, max_mark]` of the criterion it points at.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Mark {
    pub id: i64,
    pub result_id: i64,
    pub criterion_id: i64,
    pub value: Option<f64>,
    #[serde(rename = "override")]
    pub is_override: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Mark {
    /// The initial mark seeded when a result is created.
    pub(crate) fn seeded(id: i64, result_id: i64, criterion_id: i64) -> Self {
        let now = Utc::now();
        Self {
            id,
            result_id,
            criterion_id,
            value: None,
            is_override: false,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn state(&self) -> MarkState {
        if self.is_override {
            MarkState::Overridden
        } else if self.value.is_some() {
            MarkState::Computed
        } else {
            MarkState::Unset
        }
    }
}

/// The read-model returned to grading clients.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct MarkView {
    pub value: Option<f64>,
    #[serde(rename = "override")]
    pub is_override: bool,
    pub state: MarkState,
}

impl From<&Mark> for MarkView {
    fn from(mark: &Mark) -> Self {
        Self {
            value: mark.value,
            is_override: mark.is_override,
            state: mark.state(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_derivation() {
        let mut mark = Mark::seeded(1, 100, 7);
        assert_eq!(mark.state(), MarkState::Unset);

        mark.value = Some(1.5);
        assert_eq!(mark.state(), MarkState::Computed);

        mark.is_override = true;
        assert_eq!(mark.state(), MarkState::Overridden);

        // A null override is still an override.
        mark.value = None;
        assert_eq!(mark.state(), MarkState::Overridden);
    }

    #[test]
    fn test_view_serializes_override_field() {
        let mut mark = Mark::seeded(1, 100, 7);
        mark.value = Some(2.0);
        let view = MarkView::from(&mark);

        let json = serde_json::to_value(view).unwrap();
        assert_eq!(json["value"], 2.0);
        assert_eq!(json["override"], false);
        assert_eq!(json["state"], "computed");
    }
}
