//! # Marking Library
//!
//! This crate provides the core logic for deduction-based marking of a single
//! gradable criterion within a submission result. Marks are derived from the
//! deductive annotations currently applied to a result, clamped to the
//! criterion's range, and may be overridden by a grader.
//!
//! ## Key Concepts
//! - **Criterion**: defines the maximum achievable mark and how raw values map
//!   to awarded values ([`criteria::Criterion`]).
//! - **Deductive annotation**: an annotation whose text carries a deduction
//!   amount tied to one criterion ([`annotations`]).
//! - **Mark**: the computed or overridden grade for one (result, criterion)
//!   pair ([`mark::Mark`]).
//! - **MarkEngine**: the event-driven lifecycle controller that keeps marks in
//!   sync with annotation changes and enforces override semantics
//!   ([`engine::MarkEngine`]).

pub mod annotations;
pub mod criteria;
pub mod deduction;
pub mod engine;
pub mod error;
pub mod events;
pub mod mark;
pub mod store;

pub use annotations::{Annotation, AnnotationText};
pub use criteria::{Criterion, CriterionKind};
pub use engine::{EventOutcome, MarkEngine, MarkEngineConfig};
pub use error::{MarkError, MarkResult};
pub use events::AnnotationEvent;
pub use mark::{Mark, MarkState, MarkView};
pub use store::GradeStore;
