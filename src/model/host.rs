//! The interface the rename logic consumes from a decompiler host

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::ai::EntityKind;

/// Errors raised by a program model
#[derive(Debug, Error)]
pub enum ModelError {
    /// The handle does not point at an entity of this model
    #[error("Entity not found: {0}")]
    EntityNotFound(EntityRef),

    /// The suggestion has an empty new name or repeats the old one
    #[error("Suggestion {old_name} -> '{new_name}' would not change anything")]
    NotActionable { old_name: String, new_name: String },

    #[error("Failed to access model file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid model file: {0}")]
    Json(#[from] serde_json::Error),
}

/// Opaque handle to an entity inside a host program model
///
/// Indices follow declaration order: types in module order, members in the
/// order they are declared within their type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "entity")]
pub enum EntityRef {
    Type { ty: usize },
    Method { ty: usize, method: usize },
    Property { ty: usize, property: usize },
    Field { ty: usize, field: usize },
    Parameter { ty: usize, method: usize, param: usize },
    Local { ty: usize, method: usize, local: usize },
}

impl EntityRef {
    pub fn kind(&self) -> EntityKind {
        match self {
            Self::Type { .. } => EntityKind::Class,
            Self::Method { .. } => EntityKind::Method,
            Self::Property { .. } => EntityKind::Property,
            Self::Field { .. } => EntityKind::Field,
            Self::Parameter { .. } => EntityKind::Parameter,
            Self::Local { .. } => EntityKind::Variable,
        }
    }

    /// The method that declares a parameter or local
    pub fn declaring_method(&self) -> Option<EntityRef> {
        match *self {
            Self::Parameter { ty, method, .. } | Self::Local { ty, method, .. } => {
                Some(Self::Method { ty, method })
            }
            _ => None,
        }
    }
}

impl std::fmt::Display for EntityRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Type { ty } => write!(f, "type#{}", ty),
            Self::Method { ty, method } => write!(f, "method#{}.{}", ty, method),
            Self::Property { ty, property } => write!(f, "property#{}.{}", ty, property),
            Self::Field { ty, field } => write!(f, "field#{}.{}", ty, field),
            Self::Parameter { ty, method, param } => {
                write!(f, "parameter#{}.{}.{}", ty, method, param)
            }
            Self::Local { ty, method, local } => write!(f, "local#{}.{}.{}", ty, method, local),
        }
    }
}

/// Program model owned by the decompiler host
///
/// Only names are ever written. `entities` must enumerate in a stable order
/// so name-based lookup is deterministic.
pub trait ProgramHost {
    /// All entities of `kind`, in enumeration order
    fn entities(&self, kind: EntityKind) -> Vec<EntityRef>;

    fn name(&self, entity: EntityRef) -> Option<&str>;

    /// Type signature text (return type, field type, base type, ...)
    fn signature(&self, entity: EntityRef) -> Option<String>;

    fn set_name(&mut self, entity: EntityRef, name: &str) -> Result<(), ModelError>;

    /// Decompiled text of one entity (its declaring method for params/locals)
    fn decompile(&self, entity: EntityRef) -> Option<String>;

    /// Decompiled text of the whole unit
    fn decompile_module(&self) -> String;
}
