//! In-memory program model
//!
//! A JSON description of a decompiled assembly: types with their fields,
//! properties and methods (including parameters, locals and the decompiled
//! body text). It plays the role of the decompiler's metadata model.

use serde::{Deserialize, Serialize};
use std::path::Path;

use super::host::{EntityRef, ModelError, ProgramHost};
use super::render;
use crate::ai::EntityKind;
use crate::utils::{atomic_write, backup_once};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Assembly {
    pub name: String,
    #[serde(default)]
    pub types: Vec<TypeDef>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TypeDef {
    pub namespace: String,
    pub name: String,
    pub base_type: Option<String>,
    pub fields: Vec<FieldDef>,
    pub properties: Vec<PropertyDef>,
    pub methods: Vec<MethodDef>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldDef {
    pub name: String,
    pub field_type: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertyDef {
    pub name: String,
    pub property_type: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MethodDef {
    pub name: String,
    pub return_type: String,
    pub parameters: Vec<ParamDef>,
    pub locals: Vec<LocalDef>,
    /// Decompiled statements, one per line
    pub body: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParamDef {
    pub name: String,
    pub param_type: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocalDef {
    pub name: String,
    pub local_type: String,
}

impl Assembly {
    pub fn from_json(json: &str) -> Result<Self, ModelError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn load(path: &Path) -> Result<Self, ModelError> {
        let raw = std::fs::read_to_string(path)?;
        let assembly = Self::from_json(&raw)?;
        tracing::debug!(
            "Loaded {} ({} types) from {}",
            assembly.name,
            assembly.types.len(),
            path.display()
        );
        Ok(assembly)
    }

    /// Write the model back to `path`
    ///
    /// With `backup`, the file as it was before the first save is kept at
    /// `<path>.bak`.
    pub fn save(&self, path: &Path, backup: bool) -> Result<(), ModelError> {
        if backup && backup_once(path)? {
            tracing::info!("Backup written next to {}", path.display());
        }
        let json = serde_json::to_vec_pretty(self)?;
        atomic_write(path, &json)?;
        Ok(())
    }

    fn method(&self, ty: usize, method: usize) -> Option<&MethodDef> {
        self.types.get(ty)?.methods.get(method)
    }

    fn method_mut(&mut self, ty: usize, method: usize) -> Option<&mut MethodDef> {
        self.types.get_mut(ty)?.methods.get_mut(method)
    }

    /// Slot holding the name of `entity`
    fn name_slot(&mut self, entity: EntityRef) -> Option<&mut String> {
        match entity {
            EntityRef::Type { ty } => Some(&mut self.types.get_mut(ty)?.name),
            EntityRef::Method { ty, method } => Some(&mut self.method_mut(ty, method)?.name),
            EntityRef::Property { ty, property } => {
                Some(&mut self.types.get_mut(ty)?.properties.get_mut(property)?.name)
            }
            EntityRef::Field { ty, field } => {
                Some(&mut self.types.get_mut(ty)?.fields.get_mut(field)?.name)
            }
            EntityRef::Parameter { ty, method, param } => {
                Some(&mut self.method_mut(ty, method)?.parameters.get_mut(param)?.name)
            }
            EntityRef::Local { ty, method, local } => {
                Some(&mut self.method_mut(ty, method)?.locals.get_mut(local)?.name)
            }
        }
    }
}

impl ProgramHost for Assembly {
    fn entities(&self, kind: EntityKind) -> Vec<EntityRef> {
        let mut out = Vec::new();
        for (ty, def) in self.types.iter().enumerate() {
            match kind {
                EntityKind::Class => out.push(EntityRef::Type { ty }),
                EntityKind::Method => {
                    out.extend((0..def.methods.len()).map(|method| EntityRef::Method { ty, method }))
                }
                EntityKind::Property => out.extend(
                    (0..def.properties.len()).map(|property| EntityRef::Property { ty, property }),
                ),
                EntityKind::Field => {
                    out.extend((0..def.fields.len()).map(|field| EntityRef::Field { ty, field }))
                }
                EntityKind::Parameter => {
                    for (method, m) in def.methods.iter().enumerate() {
                        out.extend(
                            (0..m.parameters.len())
                                .map(|param| EntityRef::Parameter { ty, method, param }),
                        );
                    }
                }
                EntityKind::Variable => {
                    for (method, m) in def.methods.iter().enumerate() {
                        out.extend(
                            (0..m.locals.len()).map(|local| EntityRef::Local { ty, method, local }),
                        );
                    }
                }
            }
        }
        out
    }

    fn name(&self, entity: EntityRef) -> Option<&str> {
        let name = match entity {
            EntityRef::Type { ty } => &self.types.get(ty)?.name,
            EntityRef::Method { ty, method } => &self.method(ty, method)?.name,
            EntityRef::Property { ty, property } => {
                &self.types.get(ty)?.properties.get(property)?.name
            }
            EntityRef::Field { ty, field } => &self.types.get(ty)?.fields.get(field)?.name,
            EntityRef::Parameter { ty, method, param } => {
                &self.method(ty, method)?.parameters.get(param)?.name
            }
            EntityRef::Local { ty, method, local } => {
                &self.method(ty, method)?.locals.get(local)?.name
            }
        };
        Some(name.as_str())
    }

    fn signature(&self, entity: EntityRef) -> Option<String> {
        match entity {
            EntityRef::Type { ty } => {
                let def = self.types.get(ty)?;
                Some(def.base_type.clone().unwrap_or_else(|| "object".to_string()))
            }
            EntityRef::Method { ty, method } => Some(self.method(ty, method)?.return_type.clone()),
            EntityRef::Property { ty, property } => Some(
                self.types
                    .get(ty)?
                    .properties
                    .get(property)?
                    .property_type
                    .clone(),
            ),
            EntityRef::Field { ty, field } => {
                Some(self.types.get(ty)?.fields.get(field)?.field_type.clone())
            }
            EntityRef::Parameter { ty, method, param } => Some(
                self.method(ty, method)?
                    .parameters
                    .get(param)?
                    .param_type
                    .clone(),
            ),
            EntityRef::Local { ty, method, local } => {
                Some(self.method(ty, method)?.locals.get(local)?.local_type.clone())
            }
        }
    }

    fn set_name(&mut self, entity: EntityRef, name: &str) -> Result<(), ModelError> {
        let slot = self
            .name_slot(entity)
            .ok_or(ModelError::EntityNotFound(entity))?;
        *slot = name.to_string();
        Ok(())
    }

    fn decompile(&self, entity: EntityRef) -> Option<String> {
        match entity {
            EntityRef::Type { ty } => Some(render::render_type(self.types.get(ty)?)),
            EntityRef::Method { ty, method }
            | EntityRef::Parameter { ty, method, .. }
            | EntityRef::Local { ty, method, .. } => {
                Some(render::render_method(self.method(ty, method)?, ""))
            }
            EntityRef::Property { ty, property } => Some(render::render_property(
                self.types.get(ty)?.properties.get(property)?,
                "",
            )),
            EntityRef::Field { ty, field } => {
                Some(render::render_field(self.types.get(ty)?.fields.get(field)?, ""))
            }
        }
    }

    fn decompile_module(&self) -> String {
        render::render_assembly(self)
    }
}
