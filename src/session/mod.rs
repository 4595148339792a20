//! Interactive rename session
//!
//! Workers run model requests on the tokio runtime and post [`SessionEvent`]s.
//! [`run_session`] is the only consumer: it owns the program model, asks a
//! [`Reviewer`] about each result and applies what was accepted.

pub mod event;
pub mod review;
pub mod worker;

pub use event::{EventHandler, SessionEvent};
pub use review::{AcceptAll, Decision, RejectAll, Reviewer};
pub use worker::Worker;

use tracing::{debug, info, warn};

use crate::ai::ClientError;
use crate::model::ProgramHost;
use crate::refactor::{apply_plan, apply_suggestions, BatchOutcome};

/// What a session did to the model
#[derive(Debug, Default)]
pub struct SessionReport {
    pub outcome: BatchOutcome,
    /// One line per request, in completion order
    pub messages: Vec<String>,
    pub rejected: usize,
}

impl SessionReport {
    pub fn has_changes(&self) -> bool {
        !self.outcome.applied.is_empty()
    }

    fn merge(&mut self, outcome: BatchOutcome) {
        self.outcome.applied.extend(outcome.applied);
        self.outcome.skipped.extend(outcome.skipped);
    }
}

/// Drain `outstanding` events, review each and apply accepted changes
pub async fn run_session<H, R>(
    host: &mut H,
    events: &mut EventHandler,
    outstanding: usize,
    reviewer: &mut R,
) -> SessionReport
where
    H: ProgramHost + ?Sized,
    R: Reviewer + ?Sized,
{
    let mut report = SessionReport::default();

    for _ in 0..outstanding {
        let Some(event) = events.next().await else {
            warn!("Event channel closed with requests outstanding");
            break;
        };
        debug!("Handling result of request {}", event.request_id());

        match event {
            SessionEvent::RenamePlanned { request_id, result } => match result {
                Ok(plan) => match reviewer.review_rename(&plan) {
                    Decision::Accept(new_name) => {
                        let plan = plan.with_new_name(new_name);
                        let outcome = apply_plan(host, &plan);
                        if outcome.applied.iter().any(|c| c.entity == plan.entity) {
                            report.messages.push(format!(
                                "Successfully renamed {} '{}' to '{}'",
                                plan.kind, plan.original_name, plan.new_name
                            ));
                        } else {
                            report.messages.push(format!(
                                "Rename of {} '{}' was not applied",
                                plan.kind, plan.original_name
                            ));
                        }
                        report.merge(outcome);
                    }
                    Decision::Reject => {
                        info!("Rename {} rejected", request_id);
                        report.rejected += 1;
                        report.messages.push(format!(
                            "Kept {} '{}'",
                            plan.kind, plan.original_name
                        ));
                    }
                },
                Err(e) => report.messages.push(failure_message(&e)),
            },
            SessionEvent::AnalysisReady { request_id, result } => match result {
                Ok(analysis) => {
                    let selected = reviewer.review_batch(&analysis);
                    info!(
                        "Analysis {}: {} of {} suggestions selected",
                        request_id,
                        selected.len(),
                        analysis.suggestions.len()
                    );
                    report.rejected += analysis.suggestions.len().saturating_sub(selected.len());
                    let outcome = apply_suggestions(
                        host,
                        selected
                            .iter()
                            .filter_map(|&i| analysis.suggestions.get(i)),
                    );
                    report.messages.push(outcome.summary());
                    report.merge(outcome);
                }
                Err(e) => report.messages.push(failure_message(&e)),
            },
        }
    }

    report
}

fn failure_message(error: &ClientError) -> String {
    if error.is_no_change() {
        "No change suggested".to_string()
    } else {
        warn!("Suggestion request failed: {}", error);
        format!("Error getting suggestion: {}", error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::{AnalysisResult, EntityKind, Suggestion};
    use crate::model::assembly::tests::sample_assembly;
    use crate::model::EntityRef;
    use crate::refactor::service::tests::ScriptedOracle;
    use crate::refactor::{RefactoringService, RenamePlan, RenameRequest};
    use std::sync::Arc;

    /// Accepts with an edited name, then rejects everything after
    struct EditOnce {
        name: Option<String>,
    }

    impl Reviewer for EditOnce {
        fn review_rename(&mut self, _plan: &RenamePlan) -> Decision {
            match self.name.take() {
                Some(name) => Decision::Accept(name),
                None => Decision::Reject,
            }
        }

        fn review_batch(&mut self, _analysis: &AnalysisResult) -> Vec<usize> {
            vec![1]
        }
    }

    fn worker(oracle: ScriptedOracle, events: &EventHandler) -> Worker {
        Worker::new(RefactoringService::new(Arc::new(oracle)), events.sender())
    }

    #[tokio::test]
    async fn test_event_carries_spawned_request_id() {
        let asm = sample_assembly();
        let mut events = EventHandler::new();
        let worker = worker(ScriptedOracle::default(), &events);

        let request_id = worker.spawn_analysis(asm.decompile_module());
        let event = events.next().await.unwrap();
        assert_eq!(event.request_id(), request_id);
        assert!(matches!(event, SessionEvent::AnalysisReady { .. }));
    }

    #[tokio::test]
    async fn test_accepted_plan_is_applied() {
        let mut asm = sample_assembly();
        let mut events = EventHandler::new();
        let worker = worker(ScriptedOracle::with_names(&[("f0", "counter")]), &events);

        let field = EntityRef::Field { ty: 0, field: 0 };
        worker.spawn_plan(RenameRequest::build(&asm, field).unwrap());

        let report = run_session(&mut asm, &mut events, 1, &mut AcceptAll).await;
        assert_eq!(asm.name(field), Some("counter"));
        assert!(report.has_changes());
        assert_eq!(report.messages, vec!["Successfully renamed field 'f0' to 'counter'"]);
    }

    #[tokio::test]
    async fn test_edited_then_rejected() {
        let mut asm = sample_assembly();
        let mut events = EventHandler::new();
        let worker = worker(
            ScriptedOracle::with_names(&[("f0", "counter"), ("p0", "Label")]),
            &events,
        );

        let field = EntityRef::Field { ty: 0, field: 0 };
        let property = EntityRef::Property { ty: 0, property: 0 };
        worker.spawn_plan(RenameRequest::build(&asm, field).unwrap());
        worker.spawn_plan(RenameRequest::build(&asm, property).unwrap());

        let mut reviewer = EditOnce {
            name: Some("edited".to_string()),
        };
        let report = run_session(&mut asm, &mut events, 2, &mut reviewer).await;

        assert_eq!(report.outcome.applied_count(), 1);
        assert_eq!(report.rejected, 1);
        assert_eq!(report.outcome.applied[0].new_name, "edited");
        // Exactly one of the two entities was renamed, the other kept its name
        let renamed = [asm.name(field), asm.name(property)]
            .iter()
            .filter(|n| **n == Some("edited"))
            .count();
        assert_eq!(renamed, 1);
    }

    #[tokio::test]
    async fn test_no_change_is_reported() {
        let mut asm = sample_assembly();
        let mut events = EventHandler::new();
        let worker = worker(ScriptedOracle::default(), &events);

        worker.spawn_plan(RenameRequest::build(&asm, EntityRef::Type { ty: 0 }).unwrap());

        let report = run_session(&mut asm, &mut events, 1, &mut AcceptAll).await;
        assert!(!report.has_changes());
        assert_eq!(report.messages, vec!["No change suggested"]);
        assert_eq!(asm.name(EntityRef::Type { ty: 0 }), Some("c0"));
    }

    #[tokio::test]
    async fn test_batch_applies_selected_only() {
        let mut asm = sample_assembly();
        let mut events = EventHandler::new();
        let oracle = ScriptedOracle {
            analysis: AnalysisResult {
                suggestions: vec![
                    Suggestion::new("c0", "Calculator", EntityKind::Class),
                    Suggestion::new("b", "Reset", EntityKind::Method),
                ],
                ..AnalysisResult::default()
            },
            ..ScriptedOracle::default()
        };
        let worker = worker(oracle, &events);
        worker.spawn_analysis(asm.decompile_module());

        let mut reviewer = EditOnce { name: None };
        let report = run_session(&mut asm, &mut events, 1, &mut reviewer).await;

        assert_eq!(report.outcome.applied_count(), 1);
        assert_eq!(report.rejected, 1);
        assert_eq!(asm.name(EntityRef::Method { ty: 1, method: 1 }), Some("Reset"));
        assert_eq!(asm.name(EntityRef::Type { ty: 0 }), Some("c0"));
        assert!(report.messages[0].starts_with("Applied 1 changes:"));
    }
}
