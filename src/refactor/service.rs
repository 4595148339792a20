//! Per-entity rename planning
//!
//! Work is split in two so the program model never leaves the thread that
//! owns it:
//! - [`RenameRequest::build`] reads everything the prompt needs from the host
//!   (excerpt, kind-specific context, parameters of a method);
//! - [`RefactoringService::plan`] talks to the model using only that request.

use futures::future::join_all;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::applicator::{apply_targeted, BatchOutcome};
use crate::ai::prompts::MAX_EXCERPT_CHARS;
use crate::ai::{AnalysisResult, ClientError, EntityKind, NameOracle, Suggestion};
use crate::model::{EntityRef, ModelError, ProgramHost};
use crate::utils::{char_window, truncate_chars};

/// Characters kept on each side of a variable's first use
const VARIABLE_WINDOW: usize = 500;

/// One parameter of a method being renamed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParameterInfo {
    pub entity: EntityRef,
    pub name: String,
    pub param_type: String,
}

/// Everything needed to ask for a rename, detached from the host
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenameRequest {
    pub entity: EntityRef,
    pub kind: EntityKind,
    pub current_name: String,
    pub excerpt: String,
    pub context: String,
    /// Declaring method name, for parameter prompts
    pub method_name: Option<String>,
    /// Parameters to rename along with a method
    pub parameters: Vec<ParameterInfo>,
}

impl RenameRequest {
    pub fn build<H: ProgramHost + ?Sized>(host: &H, entity: EntityRef) -> Result<Self, ModelError> {
        let current_name = host
            .name(entity)
            .ok_or(ModelError::EntityNotFound(entity))?
            .to_string();
        let signature = host.signature(entity).unwrap_or_default();
        let code = host.decompile(entity).unwrap_or_default();
        let kind = entity.kind();

        let method_name = entity
            .declaring_method()
            .and_then(|m| host.name(m))
            .map(str::to_string);

        let mut parameters = Vec::new();
        let (excerpt, context) = match entity {
            EntityRef::Type { ty } => {
                let methods = count_in_type(host, EntityKind::Method, ty);
                let properties = count_in_type(host, EntityKind::Property, ty);
                (
                    code,
                    format!(
                        "Base type: {}, Methods: {}, Properties: {}",
                        signature, methods, properties
                    ),
                )
            }
            EntityRef::Method { ty, method } => {
                parameters = host
                    .entities(EntityKind::Parameter)
                    .into_iter()
                    .filter(|p| matches!(*p, EntityRef::Parameter { ty: t, method: m, .. } if t == ty && m == method))
                    .filter_map(|p| {
                        Some(ParameterInfo {
                            entity: p,
                            name: host.name(p)?.to_string(),
                            param_type: host.signature(p).unwrap_or_default(),
                        })
                    })
                    .collect();
                (
                    code,
                    format!("Return type: {}, Parameters: {}", signature, parameters.len()),
                )
            }
            EntityRef::Property { .. } | EntityRef::Field { .. } => {
                (code, format!("Type: {}", signature))
            }
            EntityRef::Local { .. } => (
                surrounding_code(&code, &current_name),
                format!("Type: {}", signature),
            ),
            EntityRef::Parameter { .. } => (
                code,
                parameter_context(method_name.as_deref().unwrap_or_default(), &signature),
            ),
        };

        Ok(Self {
            entity,
            kind,
            current_name,
            excerpt: truncate_chars(&excerpt, MAX_EXCERPT_CHARS).to_string(),
            context,
            method_name,
            parameters,
        })
    }
}

/// How a planned change relates to the entity being refactored
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeType {
    Rename,
    ParameterRename,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlannedChange {
    pub entity: EntityRef,
    pub change_type: ChangeType,
    pub suggestion: Suggestion,
}

/// Renames proposed for one entity; the first change is the primary rename
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenamePlan {
    pub entity: EntityRef,
    pub kind: EntityKind,
    pub original_name: String,
    pub new_name: String,
    pub changes: Vec<PlannedChange>,
}

impl RenamePlan {
    /// Replace the primary name (e.g. after the user edited it)
    pub fn with_new_name(mut self, new_name: impl Into<String>) -> Self {
        let new_name = new_name.into();
        if let Some(primary) = self
            .changes
            .iter_mut()
            .find(|c| c.change_type == ChangeType::Rename)
        {
            primary.suggestion.new_name = new_name.clone();
        }
        self.new_name = new_name;
        self
    }

    /// Keep only the primary rename
    pub fn without_parameters(mut self) -> Self {
        self.changes.retain(|c| c.change_type == ChangeType::Rename);
        self
    }

    pub fn parameter_changes(&self) -> impl Iterator<Item = &PlannedChange> {
        self.changes
            .iter()
            .filter(|c| c.change_type == ChangeType::ParameterRename)
    }

    /// `(entity, suggestion)` pairs ready for the applicator
    pub fn targets(&self) -> impl Iterator<Item = (EntityRef, &Suggestion)> {
        self.changes.iter().map(|c| (c.entity, &c.suggestion))
    }
}

/// Rename planning on top of a [`NameOracle`]
#[derive(Clone)]
pub struct RefactoringService {
    oracle: Arc<dyn NameOracle>,
}

impl RefactoringService {
    pub fn new(oracle: Arc<dyn NameOracle>) -> Self {
        Self { oracle }
    }

    /// Ask for a new name for the requested entity
    ///
    /// Methods also get a suggestion per parameter; a parameter that gets no
    /// usable suggestion is left out of the plan rather than failing it.
    pub async fn plan(&self, request: &RenameRequest) -> Result<RenamePlan, ClientError> {
        let new_name = self
            .oracle
            .suggest_rename(
                &request.excerpt,
                &request.current_name,
                request.kind,
                &request.context,
            )
            .await?;

        let mut changes = vec![PlannedChange {
            entity: request.entity,
            change_type: ChangeType::Rename,
            suggestion: Suggestion::new(&request.current_name, &new_name, request.kind),
        }];

        if request.kind == EntityKind::Method {
            changes.extend(self.plan_parameters(request).await);
        }

        Ok(RenamePlan {
            entity: request.entity,
            kind: request.kind,
            original_name: request.current_name.clone(),
            new_name,
            changes,
        })
    }

    async fn plan_parameters(&self, request: &RenameRequest) -> Vec<PlannedChange> {
        let lookups = request.parameters.iter().map(|param| async move {
            let context = parameter_context(&request.current_name, &param.param_type);
            let result = self
                .oracle
                .suggest_rename("", &param.name, EntityKind::Parameter, &context)
                .await;
            (param, result)
        });

        join_all(lookups)
            .await
            .into_iter()
            .filter_map(|(param, result)| match result {
                Ok(new_name) => Some(PlannedChange {
                    entity: param.entity,
                    change_type: ChangeType::ParameterRename,
                    suggestion: Suggestion::new(&param.name, new_name, EntityKind::Parameter),
                }),
                Err(ClientError::EmptySuggestion) => None,
                Err(e) => {
                    tracing::warn!("No suggestion for parameter {}: {}", param.name, e);
                    None
                }
            })
            .collect()
    }

    /// Naming review of a whole decompiled module
    pub async fn analyze_module(&self, source: &str) -> Result<AnalysisResult, ClientError> {
        self.oracle.analyze_module(source).await
    }
}

/// Write an accepted plan to the model, primary rename first
pub fn apply_plan<H: ProgramHost + ?Sized>(host: &mut H, plan: &RenamePlan) -> BatchOutcome {
    apply_targeted(host, plan.targets())
}

fn parameter_context(method_name: &str, param_type: &str) -> String {
    format!("Parameter in method {}, Type: {}", method_name, param_type)
}

fn count_in_type<H: ProgramHost + ?Sized>(host: &H, kind: EntityKind, ty: usize) -> usize {
    host.entities(kind)
        .into_iter()
        .filter(|e| match *e {
            EntityRef::Method { ty: t, .. } | EntityRef::Property { ty: t, .. } => t == ty,
            _ => false,
        })
        .count()
}

/// Code around the first whole-word use of `name`, or all of it
fn surrounding_code(code: &str, name: &str) -> String {
    let pattern = format!(r"\b{}\b", regex::escape(name));
    let at = Regex::new(&pattern)
        .ok()
        .and_then(|re| re.find(code))
        .map(|m| m.start());

    match at {
        Some(at) => char_window(code, at, VARIABLE_WINDOW).to_string(),
        None => code.to_string(),
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::model::assembly::tests::sample_assembly;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// Answers from a fixed table keyed by current name; unknown names echo
    /// back (no change). Records every rename call.
    #[derive(Default)]
    pub(crate) struct ScriptedOracle {
        pub names: HashMap<String, String>,
        pub failing: Vec<String>,
        pub analysis: AnalysisResult,
        pub calls: Mutex<Vec<(String, EntityKind, String)>>,
    }

    impl ScriptedOracle {
        pub(crate) fn with_names(pairs: &[(&str, &str)]) -> Self {
            Self {
                names: pairs
                    .iter()
                    .map(|(a, b)| (a.to_string(), b.to_string()))
                    .collect(),
                ..Self::default()
            }
        }
    }

    #[async_trait]
    impl NameOracle for ScriptedOracle {
        async fn suggest_rename(
            &self,
            _code_excerpt: &str,
            current_name: &str,
            kind: EntityKind,
            extra_context: &str,
        ) -> Result<String, ClientError> {
            self.calls.lock().unwrap().push((
                current_name.to_string(),
                kind,
                extra_context.to_string(),
            ));
            if self.failing.iter().any(|n| n == current_name) {
                return Err(ClientError::Http {
                    status: reqwest::StatusCode::INTERNAL_SERVER_ERROR,
                    body: "boom".to_string(),
                });
            }
            match self.names.get(current_name) {
                Some(name) if name != current_name => Ok(name.clone()),
                _ => Err(ClientError::EmptySuggestion),
            }
        }

        async fn analyze_module(&self, _source: &str) -> Result<AnalysisResult, ClientError> {
            Ok(self.analysis.clone())
        }
    }

    #[test]
    fn test_request_for_method() {
        let asm = sample_assembly();
        let request = RenameRequest::build(&asm, EntityRef::Method { ty: 0, method: 0 }).unwrap();
        assert_eq!(request.kind, EntityKind::Method);
        assert_eq!(request.current_name, "a");
        assert_eq!(request.context, "Return type: int, Parameters: 1");
        assert_eq!(request.parameters.len(), 1);
        assert_eq!(request.parameters[0].name, "x");
        assert!(request.excerpt.contains("public int a(int x)"));
    }

    #[test]
    fn test_request_for_class() {
        let asm = sample_assembly();
        let request = RenameRequest::build(&asm, EntityRef::Type { ty: 1 }).unwrap();
        assert_eq!(request.kind, EntityKind::Class);
        assert_eq!(request.context, "Base type: object, Methods: 2, Properties: 0");
        assert!(request.parameters.is_empty());
    }

    #[test]
    fn test_request_for_local_and_parameter() {
        let asm = sample_assembly();
        let local = RenameRequest::build(&asm, EntityRef::Local { ty: 0, method: 0, local: 0 }).unwrap();
        assert_eq!(local.kind, EntityKind::Variable);
        assert_eq!(local.context, "Type: int");
        assert!(local.excerpt.contains("int tmp = x * 2;"));
        assert_eq!(local.method_name.as_deref(), Some("a"));

        let param =
            RenameRequest::build(&asm, EntityRef::Parameter { ty: 0, method: 0, param: 0 }).unwrap();
        assert_eq!(param.context, "Parameter in method a, Type: int");
    }

    #[test]
    fn test_request_for_missing_entity() {
        let asm = sample_assembly();
        let err = RenameRequest::build(&asm, EntityRef::Field { ty: 1, field: 0 }).unwrap_err();
        assert!(matches!(err, ModelError::EntityNotFound(_)));
    }

    #[test]
    fn test_surrounding_code_windows_first_whole_word_use() {
        let code = format!("{}int tmpValue = 1; int tmp = 2;{}", "a".repeat(800), "b".repeat(800));
        let excerpt = surrounding_code(&code, "tmp");
        assert!(excerpt.contains("int tmp = 2;"));
        assert!(excerpt.chars().count() <= VARIABLE_WINDOW * 2);
        assert!(excerpt.len() < code.len());

        assert_eq!(surrounding_code("no match here", "tmp"), "no match here");
    }

    #[tokio::test]
    async fn test_plan_method_with_parameters() {
        let oracle = Arc::new(ScriptedOracle::with_names(&[("a", "Double"), ("x", "value")]));
        let service = RefactoringService::new(oracle.clone());
        let asm = sample_assembly();
        let request = RenameRequest::build(&asm, EntityRef::Method { ty: 0, method: 0 }).unwrap();

        let plan = service.plan(&request).await.unwrap();
        assert_eq!(plan.original_name, "a");
        assert_eq!(plan.new_name, "Double");
        assert_eq!(plan.changes.len(), 2);
        assert_eq!(plan.changes[0].change_type, ChangeType::Rename);
        assert_eq!(plan.changes[1].change_type, ChangeType::ParameterRename);
        assert_eq!(plan.changes[1].suggestion.new_name, "value");

        let calls = oracle.calls.lock().unwrap();
        assert!(calls
            .iter()
            .any(|(name, kind, ctx)| name == "x"
                && *kind == EntityKind::Parameter
                && ctx == "Parameter in method a, Type: int"));
    }

    #[tokio::test]
    async fn test_plan_drops_failing_parameters() {
        let mut oracle = ScriptedOracle::with_names(&[("a", "Double"), ("x", "value")]);
        oracle.failing.push("x".to_string());
        let service = RefactoringService::new(Arc::new(oracle));
        let asm = sample_assembly();
        let request = RenameRequest::build(&asm, EntityRef::Method { ty: 0, method: 0 }).unwrap();

        let plan = service.plan(&request).await.unwrap();
        assert_eq!(plan.changes.len(), 1);
        assert_eq!(plan.parameter_changes().count(), 0);
    }

    #[tokio::test]
    async fn test_plan_no_change_for_echoed_name() {
        let service = RefactoringService::new(Arc::new(ScriptedOracle::default()));
        let asm = sample_assembly();
        let request = RenameRequest::build(&asm, EntityRef::Field { ty: 0, field: 0 }).unwrap();

        let err = service.plan(&request).await.unwrap_err();
        assert!(err.is_no_change());
    }

    #[test]
    fn test_plan_editing() {
        let plan = RenamePlan {
            entity: EntityRef::Method { ty: 0, method: 0 },
            kind: EntityKind::Method,
            original_name: "a".to_string(),
            new_name: "Double".to_string(),
            changes: vec![
                PlannedChange {
                    entity: EntityRef::Method { ty: 0, method: 0 },
                    change_type: ChangeType::Rename,
                    suggestion: Suggestion::new("a", "Double", EntityKind::Method),
                },
                PlannedChange {
                    entity: EntityRef::Parameter { ty: 0, method: 0, param: 0 },
                    change_type: ChangeType::ParameterRename,
                    suggestion: Suggestion::new("x", "value", EntityKind::Parameter),
                },
            ],
        };

        let edited = plan.clone().with_new_name("Twice");
        assert_eq!(edited.new_name, "Twice");
        assert_eq!(edited.changes[0].suggestion.new_name, "Twice");
        assert_eq!(edited.changes[1].suggestion.new_name, "value");

        let primary_only = plan.without_parameters();
        assert_eq!(primary_only.targets().count(), 1);
    }

    #[tokio::test]
    async fn test_apply_plan_renames_method_and_parameter() {
        let oracle = Arc::new(ScriptedOracle::with_names(&[("a", "Double"), ("x", "value")]));
        let service = RefactoringService::new(oracle);
        let mut asm = sample_assembly();
        let method = EntityRef::Method { ty: 0, method: 0 };
        let request = RenameRequest::build(&asm, method).unwrap();
        let plan = service.plan(&request).await.unwrap();

        let outcome = apply_plan(&mut asm, &plan);
        assert_eq!(outcome.applied_count(), 2);
        assert_eq!(asm.name(method), Some("Double"));
        assert_eq!(
            asm.name(EntityRef::Parameter { ty: 0, method: 0, param: 0 }),
            Some("value")
        );
        // The other method named `a` is untouched
        assert_eq!(asm.name(EntityRef::Method { ty: 1, method: 0 }), Some("a"));
    }
}
