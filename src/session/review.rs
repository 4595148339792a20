//! User confirmation of proposed renames

use crate::ai::AnalysisResult;
use crate::refactor::RenamePlan;

/// Outcome of reviewing one rename plan
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    /// Apply the plan with this primary name (possibly edited)
    Accept(String),
    Reject,
}

/// Asks whoever drives the session to confirm renames
///
/// Called from the session loop, which owns the program model; a reviewer
/// never touches the model itself.
pub trait Reviewer {
    fn review_rename(&mut self, plan: &RenamePlan) -> Decision;

    /// Indices into `analysis.suggestions` to apply
    fn review_batch(&mut self, analysis: &AnalysisResult) -> Vec<usize>;
}

/// Accepts every plan unchanged and every actionable batch suggestion
#[derive(Debug, Clone, Copy, Default)]
pub struct AcceptAll;

impl Reviewer for AcceptAll {
    fn review_rename(&mut self, plan: &RenamePlan) -> Decision {
        Decision::Accept(plan.new_name.clone())
    }

    fn review_batch(&mut self, analysis: &AnalysisResult) -> Vec<usize> {
        analysis
            .suggestions
            .iter()
            .enumerate()
            .filter(|(_, s)| s.is_actionable())
            .map(|(i, _)| i)
            .collect()
    }
}

/// Rejects everything; used for dry runs
#[derive(Debug, Clone, Copy, Default)]
pub struct RejectAll;

impl Reviewer for RejectAll {
    fn review_rename(&mut self, _plan: &RenamePlan) -> Decision {
        Decision::Reject
    }

    fn review_batch(&mut self, _analysis: &AnalysisResult) -> Vec<usize> {
        Vec::new()
    }
}
