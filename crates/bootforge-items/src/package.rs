//! Managed package resource records.

use crate::item::{require_string, Item, ItemBase, ParentRef};
use bootforge_types::{ForgeError, ItemKind, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// What the CM system should do with a resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ResourceAction {
    /// Ensure the resource exists
    #[default]
    Create,
    /// Ensure the resource is absent
    Remove,
}

impl std::str::FromStr for ResourceAction {
    type Err = ForgeError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "create" | "install" => Ok(ResourceAction::Create),
            "remove" | "uninstall" => Ok(ResourceAction::Remove),
            other => Err(ForgeError::Validation(format!(
                "Invalid resource action: {}",
                other
            ))),
        }
    }
}

/// A package resource referenced from management classes.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Package {
    /// Common fields
    #[serde(flatten)]
    pub base: ItemBase,

    /// Package manager expected to handle it (`yum`, `apt`, ...)
    pub installer: String,

    /// Version pin; empty means latest
    pub version: String,

    /// Install or remove
    pub action: ResourceAction,
}

impl Package {
    /// Create an empty, not-yet-valid package shell.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            base: ItemBase::new(name),
            ..Self::default()
        }
    }
}

impl Item for Package {
    const KIND: ItemKind = ItemKind::Package;

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
            return Err(ForgeError::Validation("Package requires a name".to_string()));
        }
        Ok(())
    }

    fn set_kind_field(&mut self, field: &str, value: &Value) -> Result<bool> {
        match field {
            "installer" => self.installer = require_string(field, value)?,
            "version" => self.version = require_string(field, value)?,
            "action" => self.action = require_string(field, value)?.parse()?,
            _ => return Ok(false),
        }
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_action_aliases() {
        let mut package = Package::new("httpd");
        package.set_kind_field("action", &json!("uninstall")).unwrap();
        assert_eq!(package.action, ResourceAction::Remove);
    }
}
