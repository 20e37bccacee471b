//! # Criteria Module
//!
//! Defines the gradable criterion a mark is computed against. A criterion is
//! polymorphic over its kind (rubric, flexible, checkbox); all kinds share the
//! same maximum-mark bound and the same clamped deduction mapping, so dispatch
//! happens on the [`CriterionKind`] tag rather than separate types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

use crate::error::{MarkError, MarkResult};

/// Round a float to two decimal places in an efficient manner.
///
/// Uses the common multiply / round / divide trick. Kept local to this module
/// so it's cheap to inline and obvious where rounding is happening.
#[inline]
pub(crate) fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}

/// The kind of a criterion, mirroring the markable types a mark can point at.
///
/// The string forms (`RubricCriterion`, ...) match the markable type labels
/// used by grading clients.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Display, EnumIter, EnumString, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CriterionKind {
    #[strum(serialize = "RubricCriterion")]
    Rubric,
    #[strum(serialize = "FlexibleCriterion")]
    Flexible,
    #[strum(serialize = "CheckboxCriterion")]
    Checkbox,
}

impl Default for CriterionKind {
    fn default() -> Self {
        CriterionKind::Flexible
    }
}

/// A gradable criterion with a maximum achievable mark.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Criterion {
    pub id: i64,
    pub kind: CriterionKind,
    pub max_mark: f64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Criterion {
    /// Create a criterion. `max_mark` must be a finite, positive number.
    pub fn new(id: i64, kind: CriterionKind, max_mark: f64) -> MarkResult<Self> {
        if !max_mark.is_finite() || max_mark <= 0.0 {
            return Err(MarkError::InvalidMaxMark(max_mark));
        }
        let now = Utc::now();
        Ok(Self {
            id,
            kind,
            max_mark,
            created_at: now,
            updated_at: now,
        })
    }

    /// Map a raw deduction total to the awarded mark.
    ///
    /// Every kind uses the same clamp rule; checkbox texts are expected to carry
    /// either zero or the full weight as their configured deduction, which the
    /// engine trusts rather than special-casing.
    pub fn award_from_deduction(&self, total_deduction: f64) -> f64 {
        (self.max_mark - total_deduction).clamp(0.0, self.max_mark)
    }

    /// Rescale a raw awarded value proportionally onto a new maximum mark.
    ///
    /// Used when a criterion is re-weighted; not part of the deduction path.
    pub fn scale_mark(&self, raw_value: f64, target_max_mark: f64) -> f64 {
        round2(raw_value * target_max_mark / self.max_mark)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn test_rejects_non_positive_max_mark() {
        assert!(matches!(
            Criterion::new(1, CriterionKind::Rubric, 0.0),
            Err(MarkError::InvalidMaxMark(_))
        ));
        assert!(matches!(
            Criterion::new(1, CriterionKind::Flexible, -2.5),
            Err(MarkError::InvalidMaxMark(_))
        ));
        assert!(matches!(
            Criterion::new(1, CriterionKind::Checkbox, f64::NAN),
            Err(MarkError::InvalidMaxMark(_))
        ));
    }

    #[test]
    fn test_award_clamps_to_range() {
        let criterion = Criterion::new(1, CriterionKind::Flexible, 2.0).unwrap();
        assert_eq!(criterion.award_from_deduction(0.0), 2.0);
        assert_eq!(criterion.award_from_deduction(1.0), 1.0);
        // Deductions past the maximum never push the award below zero.
        assert_eq!(criterion.award_from_deduction(2.5), 0.0);
        assert_eq!(criterion.award_from_deduction(100.0), 0.0);
    }

    #[test]
    fn test_clamp_rule_shared_across_kinds() {
        for kind in CriterionKind::iter() {
            let criterion = Criterion::new(1, kind, 3.0).unwrap();
            assert_eq!(criterion.award_from_deduction(1.5), 1.5);
            assert_eq!(criterion.award_from_deduction(4.0), 0.0);
        }
    }

    #[test]
    fn test_scale_mark_is_proportional() {
        let criterion = Criterion::new(1, CriterionKind::Flexible, 10.0).unwrap();
        assert_eq!(criterion.scale_mark(3.0, 5.0), 1.5);
        assert_eq!(criterion.scale_mark(10.0, 5.0), 5.0);
        assert_eq!(criterion.scale_mark(0.0, 5.0), 0.0);
    }

    #[test]
    fn test_scale_mark_rounds_to_two_decimals() {
        let criterion = Criterion::new(1, CriterionKind::Rubric, 3.0).unwrap();
        // 1.0 * 10 / 3 = 3.333... -> 3.33
        assert_eq!(criterion.scale_mark(1.0, 10.0), 3.33);
    }

    #[test]
    fn test_kind_string_forms() {
        assert_eq!(CriterionKind::Rubric.to_string(), "RubricCriterion");
        assert_eq!(
            "FlexibleCriterion".parse::<CriterionKind>().unwrap(),
            CriterionKind::Flexible
        );
        assert!("".parse::<CriterionKind>().is_err());
    }
}
