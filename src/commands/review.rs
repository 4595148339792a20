//! Terminal reviewers

use dialoguer::{Input, MultiSelect, Select};
use tokio::task;
use tracing::warn;

use crate::ai::AnalysisResult;
use crate::refactor::RenamePlan;
use crate::session::{Decision, Reviewer};

/// Asks on the terminal for every plan and batch
///
/// Prompts block, so they run under `block_in_place`; this needs the
/// multi-threaded runtime.
#[derive(Debug, Default)]
pub struct PromptReviewer;

impl Reviewer for PromptReviewer {
    fn review_rename(&mut self, plan: &RenamePlan) -> Decision {
        task::block_in_place(|| prompt_rename(plan)).unwrap_or_else(|e| {
            warn!("Prompt failed, keeping {}: {}", plan.original_name, e);
            Decision::Reject
        })
    }

    fn review_batch(&mut self, analysis: &AnalysisResult) -> Vec<usize> {
        task::block_in_place(|| prompt_batch(analysis)).unwrap_or_else(|e| {
            warn!("Prompt failed, applying nothing: {}", e);
            Vec::new()
        })
    }
}

fn prompt_rename(plan: &RenamePlan) -> dialoguer::Result<Decision> {
    let choices = ["Accept", "Edit name", "Reject"];
    let selection = Select::new()
        .with_prompt(format!(
            "Rename {} '{}' to '{}'?",
            plan.kind, plan.original_name, plan.new_name
        ))
        .items(&choices[..])
        .default(0)
        .interact()?;

    Ok(match selection {
        0 => Decision::Accept(plan.new_name.clone()),
        1 => {
            let name: String = Input::new()
                .with_prompt("New name")
                .with_initial_text(plan.new_name.clone())
                .interact_text()?;
            Decision::Accept(name.trim().to_string())
        }
        _ => Decision::Reject,
    })
}

fn prompt_batch(analysis: &AnalysisResult) -> dialoguer::Result<Vec<usize>> {
    if analysis.suggestions.is_empty() {
        return Ok(Vec::new());
    }

    let items: Vec<String> = analysis
        .suggestions
        .iter()
        .map(|s| {
            if s.reason.is_empty() {
                format!("{} ({:.0}%)", s.describe(), s.confidence * 100.0)
            } else {
                format!("{} ({:.0}%): {}", s.describe(), s.confidence * 100.0, s.reason)
            }
        })
        .collect();
    let defaults: Vec<bool> = analysis
        .suggestions
        .iter()
        .map(|s| s.is_actionable())
        .collect();

    MultiSelect::new()
        .with_prompt("Select renames to apply")
        .items(&items[..])
        .defaults(&defaults)
        .interact()
}

/// Prints what the model proposed before delegating the decision
pub struct Announce<R> {
    inner: R,
}

impl<R: Reviewer> Announce<R> {
    pub fn new(inner: R) -> Self {
        Self { inner }
    }
}

impl<R: Reviewer> Reviewer for Announce<R> {
    fn review_rename(&mut self, plan: &RenamePlan) -> Decision {
        println!(
            "\n{} '{}' → '{}'",
            plan.kind, plan.original_name, plan.new_name
        );
        for change in plan.parameter_changes() {
            println!("  parameter {}", change.suggestion.describe());
        }
        self.inner.review_rename(plan)
    }

    fn review_batch(&mut self, analysis: &AnalysisResult) -> Vec<usize> {
        print_analysis(analysis);
        self.inner.review_batch(analysis)
    }
}

fn print_analysis(analysis: &AnalysisResult) {
    if !analysis.analysis.is_empty() {
        println!("\n{}", analysis.analysis);
    }
    println!("Naming score: {:.1}/10", analysis.overall_score);
    if !analysis.key_issues.is_empty() {
        println!("Key issues:");
        for issue in &analysis.key_issues {
            println!("  - {}", issue);
        }
    }
    println!("{} suggestion(s)", analysis.suggestions.len());
}
