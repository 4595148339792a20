//! Rename planning and application
//!
//! `service` turns one entity into a [`RenamePlan`] through the model;
//! `applicator` writes accepted suggestions back into a [`ProgramHost`].
//!
//! [`ProgramHost`]: crate::model::ProgramHost

pub mod applicator;
pub mod service;

pub use applicator::{
    apply_batch, apply_single, apply_suggestions, apply_targeted, lookup_for, AppliedChange,
    BatchOutcome, SkipReason, SkippedSuggestion,
};
pub use service::{
    apply_plan, ChangeType, ParameterInfo, PlannedChange, RefactoringService, RenamePlan,
    RenameRequest,
};
