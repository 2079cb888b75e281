//! Configuration-management class records.

use crate::item::{require_string, Item, ItemBase, ParentRef};
use bootforge_core::util::data::{coerce_bool, parse_option_map, parse_string_list};
use bootforge_types::{ForgeError, ItemKind, Result};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A management class groups packages, files, and parameters consumed by
/// an external configuration-management system. Attached to profiles and
/// systems by name.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct MgmtClass {
    /// Common fields
    #[serde(flatten)]
    pub base: ItemBase,

    /// Class name handed to the CM system; defaults to the item name
    pub class_name: String,

    /// Parameters exposed to the CM system
    pub params: IndexMap<String, Value>,

    /// Package resources attached by name
    pub packages: Vec<String>,

    /// File resources attached by name
    pub files: Vec<String>,

    /// Definition classes are emitted even when nothing includes them
    pub is_definition: bool,
}

impl MgmtClass {
    /// Create an empty, not-yet-valid management class shell.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            base: ItemBase::new(name),
            ..Self::default()
        }
    }

    /// The effective class name (explicit or the item name).
    pub fn effective_class_name(&self) -> &str {
        if self.class_name.is_empty() {
            &self.base.name
        } else {
            &self.class_name
        }
    }
}

impl Item for MgmtClass {
    const KIND: ItemKind = ItemKind::MgmtClass;

    fn base(&self) -> &ItemBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut ItemBase {
        &mut self.base
    }

    fn parent_ref(&self) -> Option<ParentRef> {
        None
    }

    fn validate(&self) -> Result<()> {
        if self.base.name.is_empty() {
            return Err(ForgeError::Validation(
                "Management class requires a name".to_string(),
            ));
        }
        Ok(())
    }

    fn set_kind_field(&mut self, field: &str, value: &Value) -> Result<bool> {
        match field {
            "class_name" => self.class_name = require_string(field, value)?,
            "params" => self.params = parse_option_map(value)?,
            "packages" => self.packages = parse_string_list(value)?,
            "files" => self.files = parse_string_list(value)?,
            "is_definition" => self.is_definition = coerce_bool(value)?,
            _ => return Ok(false),
        }
        Ok(true)
    }
}
