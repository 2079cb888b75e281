//! Managed file resource records.

use crate::item::{require_string, Item, ItemBase, ParentRef};
use crate::package::ResourceAction;
use bootforge_core::util::data::coerce_bool;
use bootforge_types::{ForgeError, ItemKind, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A file resource referenced from management classes: a destination
/// path plus ownership/mode and the template that produces its content.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct FileResource {
    /// Common fields
    #[serde(flatten)]
    pub base: ItemBase,

    /// Destination path on the managed machine
    pub path: String,

    /// Owning user
    pub owner: String,

    /// Owning group
    pub group: String,

    /// Octal mode string (`0644`)
    pub mode: String,

    /// Manage a directory instead of a file
    pub is_dir: bool,

    /// Create or remove
    pub action: ResourceAction,

    /// Source template rendered to produce the content
    pub template: String,
}

impl FileResource {
    /// Create an empty, not-yet-valid file resource shell.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            base: ItemBase::new(name),
            ..Self::default()
        }
    }
}

impl Item for FileResource {
    const KIND: ItemKind = ItemKind::File;

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
            return Err(ForgeError::Validation("File requires a name".to_string()));
        }
        if self.path.is_empty() {
            return Err(ForgeError::Validation(format!(
                "File '{}' requires a path",
                self.base.name
            )));
        }
        if self.action == ResourceAction::Create {
            for (field, value) in [
                ("owner", &self.owner),
                ("group", &self.group),
                ("mode", &self.mode),
            ] {
                if value.is_empty() {
                    return Err(ForgeError::Validation(format!(
                        "File '{}' requires {}",
                        self.base.name, field
                    )));
                }
            }
            if !self.is_dir && self.template.is_empty() {
                return Err(ForgeError::Validation(format!(
                    "File '{}' requires a template",
                    self.base.name
                )));
            }
        }
        Ok(())
    }

    fn set_kind_field(&mut self, field: &str, value: &Value) -> Result<bool> {
        match field {
            "path" => self.path = require_string(field, value)?,
            "owner" => self.owner = require_string(field, value)?,
            "group" => self.group = require_string(field, value)?,
            "mode" => self.mode = require_string(field, value)?,
            "is_dir" => self.is_dir = coerce_bool(value)?,
            "action" => self.action = require_string(field, value)?.parse()?,
            "template" => self.template = require_string(field, value)?,
            _ => return Ok(false),
        }
        Ok(true)
    }
}
