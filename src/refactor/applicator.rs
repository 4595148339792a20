//! Applying accepted suggestions to the program model
//!
//! Renames only overwrite the entity's name. There is no check that the new
//! name is a legal identifier and no collision detection within a scope.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ai::{AnalysisResult, EntityKind, Suggestion};
use crate::model::{EntityRef, ModelError, ProgramHost};

/// A rename that was written to the model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppliedChange {
    pub entity: EntityRef,
    pub kind: EntityKind,
    pub old_name: String,
    pub new_name: String,
    pub applied_at: DateTime<Utc>,
}

impl AppliedChange {
    /// `"method a → Compute"`
    pub fn describe(&self) -> String {
        format!("{} {} → {}", self.kind, self.old_name, self.new_name)
    }
}

/// Why a suggestion was not applied
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "reason", content = "details")]
pub enum SkipReason {
    /// Empty new name, or identical to the old one
    NotActionable,
    /// The kind cannot be looked up by name (parameters, locals)
    UnsupportedKind,
    /// No entity of that kind carries the old name
    NotFound,
    /// The model refused the write
    Rejected(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SkippedSuggestion {
    pub suggestion: Suggestion,
    pub reason: SkipReason,
}

/// Per-suggestion results of one batch
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchOutcome {
    pub applied: Vec<AppliedChange>,
    pub skipped: Vec<SkippedSuggestion>,
}

impl BatchOutcome {
    pub fn applied_count(&self) -> usize {
        self.applied.len()
    }

    /// `"Applied 2 changes:\n..."`, one description per line
    pub fn summary(&self) -> String {
        let mut out = format!("Applied {} changes:", self.applied.len());
        for change in &self.applied {
            out.push('\n');
            out.push_str(&change.describe());
        }
        out
    }

    fn skip(&mut self, suggestion: &Suggestion, reason: SkipReason) {
        tracing::debug!("Skipping {}: {:?}", suggestion.describe(), reason);
        self.skipped.push(SkippedSuggestion {
            suggestion: suggestion.clone(),
            reason,
        });
    }
}

/// Typed name lookup for one entity kind
pub type LookupFn<H> = fn(&H, &str) -> Option<EntityRef>;

/// Lookup table keyed by entity kind
///
/// Only kinds with a module-wide name scope are supported; parameters and
/// locals repeat the same names across methods and are never matched by name.
pub fn lookup_for<H: ProgramHost + ?Sized>(kind: EntityKind) -> Option<LookupFn<H>> {
    match kind {
        EntityKind::Class => Some(find_type::<H> as LookupFn<H>),
        EntityKind::Method => Some(find_method::<H> as LookupFn<H>),
        EntityKind::Property => Some(find_property::<H> as LookupFn<H>),
        EntityKind::Field => Some(find_field::<H> as LookupFn<H>),
        EntityKind::Parameter | EntityKind::Variable => None,
    }
}

fn find_type<H: ProgramHost + ?Sized>(host: &H, name: &str) -> Option<EntityRef> {
    first_named(host, EntityKind::Class, name)
}

fn find_method<H: ProgramHost + ?Sized>(host: &H, name: &str) -> Option<EntityRef> {
    first_named(host, EntityKind::Method, name)
}

fn find_property<H: ProgramHost + ?Sized>(host: &H, name: &str) -> Option<EntityRef> {
    first_named(host, EntityKind::Property, name)
}

fn find_field<H: ProgramHost + ?Sized>(host: &H, name: &str) -> Option<EntityRef> {
    first_named(host, EntityKind::Field, name)
}

/// First entity of `kind` in enumeration order whose name is exactly `name`
///
/// Overloads and shadowed members share names; which of them is meant cannot
/// be known from the name alone, so the first declared one wins.
fn first_named<H: ProgramHost + ?Sized>(host: &H, kind: EntityKind, name: &str) -> Option<EntityRef> {
    host.entities(kind)
        .into_iter()
        .find(|entity| host.name(*entity) == Some(name))
}

/// Overwrite the name of `entity` with `suggestion.new_name`
pub fn apply_single<H: ProgramHost + ?Sized>(
    host: &mut H,
    entity: EntityRef,
    suggestion: &Suggestion,
) -> Result<AppliedChange, ModelError> {
    if !suggestion.is_actionable() {
        return Err(ModelError::NotActionable {
            old_name: suggestion.old_name.clone(),
            new_name: suggestion.new_name.clone(),
        });
    }

    let old_name = host
        .name(entity)
        .ok_or(ModelError::EntityNotFound(entity))?
        .to_string();
    let new_name = suggestion.new_name.trim();

    host.set_name(entity, new_name)?;
    tracing::info!("Renamed {} {} → {}", entity.kind(), old_name, new_name);

    Ok(AppliedChange {
        entity,
        kind: entity.kind(),
        old_name,
        new_name: new_name.to_string(),
        applied_at: Utc::now(),
    })
}

/// Apply every suggestion of an analysis by name lookup
pub fn apply_batch<H: ProgramHost + ?Sized>(host: &mut H, analysis: &AnalysisResult) -> BatchOutcome {
    apply_suggestions(host, &analysis.suggestions)
}

/// Apply suggestions in order; failures are recorded, never fatal
pub fn apply_suggestions<'a, H, I>(host: &mut H, suggestions: I) -> BatchOutcome
where
    H: ProgramHost + ?Sized,
    I: IntoIterator<Item = &'a Suggestion>,
{
    let mut outcome = BatchOutcome::default();

    for suggestion in suggestions {
        if !suggestion.is_actionable() {
            outcome.skip(suggestion, SkipReason::NotActionable);
            continue;
        }

        let Some(lookup) = lookup_for::<H>(suggestion.entity_kind) else {
            outcome.skip(suggestion, SkipReason::UnsupportedKind);
            continue;
        };

        let Some(entity) = lookup(host, &suggestion.old_name) else {
            outcome.skip(suggestion, SkipReason::NotFound);
            continue;
        };

        match apply_single(host, entity, suggestion) {
            Ok(change) => outcome.applied.push(change),
            Err(e) => outcome.skip(suggestion, SkipReason::Rejected(e.to_string())),
        }
    }

    outcome
}

/// Apply entity-addressed changes (a reviewed rename plan)
pub fn apply_targeted<'a, H, I>(host: &mut H, changes: I) -> BatchOutcome
where
    H: ProgramHost + ?Sized,
    I: IntoIterator<Item = (EntityRef, &'a Suggestion)>,
{
    let mut outcome = BatchOutcome::default();

    for (entity, suggestion) in changes {
        match apply_single(host, entity, suggestion) {
            Ok(change) => outcome.applied.push(change),
            Err(ModelError::NotActionable { .. }) => {
                outcome.skip(suggestion, SkipReason::NotActionable)
            }
            Err(ModelError::EntityNotFound(_)) => outcome.skip(suggestion, SkipReason::NotFound),
            Err(e) => outcome.skip(suggestion, SkipReason::Rejected(e.to_string())),
        }
    }

    outcome
}
