//! Package repository records.

use crate::item::{require_string, Item, ItemBase, ParentRef};
use bootforge_core::util::data::{coerce_bool, parse_option_map};
use bootforge_types::{ForgeError, ItemKind, Result};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A repo: an upstream package source attached to profiles/systems by
/// name. Flat: repos never participate in the inheritance tree.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Repo {
    /// Common fields
    #[serde(flatten)]
    pub base: ItemBase,

    /// Upstream mirror URL or rsync path
    pub mirror: String,

    /// Whether sync keeps a local copy served to installers
    pub mirror_locally: bool,

    /// Whether periodic repo syncs refresh this repo
    pub keep_updated: bool,

    /// Resolution priority; lower sorts first in generated stanzas
    pub priority: i64,

    /// Extra yum/dnf options emitted into generated repo configs
    pub yumopts: IndexMap<String, Value>,
}

impl Default for Repo {
    fn default() -> Self {
        Self {
            base: ItemBase::default(),
            mirror: String::new(),
            mirror_locally: true,
            keep_updated: true,
            priority: 99,
            yumopts: IndexMap::new(),
        }
    }
}

impl Repo {
    /// Create an empty, not-yet-valid repo shell.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            base: ItemBase::new(name),
            ..Self::default()
        }
    }
}

impl Item for Repo {
    const KIND: ItemKind = ItemKind::Repo;

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
            return Err(ForgeError::Validation("Repo requires a name".to_string()));
        }
        if self.mirror.is_empty() {
            return Err(ForgeError::Validation(format!(
                "Repo '{}' requires a mirror",
                self.base.name
            )));
        }
        Ok(())
    }

    fn set_kind_field(&mut self, field: &str, value: &Value) -> Result<bool> {
        match field {
            "mirror" => self.mirror = require_string(field, value)?,
            "mirror_locally" => self.mirror_locally = coerce_bool(value)?,
            "keep_updated" => self.keep_updated = coerce_bool(value)?,
            "priority" => {
                self.priority = value.as_i64().or_else(|| value.as_str()?.parse().ok()).ok_or_else(
                    || ForgeError::Validation(format!("Invalid priority: {}", value)),
                )?;
            }
            "yumopts" => self.yumopts = parse_option_map(value)?,
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
    fn test_repo_requires_mirror() {
        let mut repo = Repo::new("updates");
        assert!(repo.validate().is_err());
        repo.mirror = "http://mirror.example.com/updates".to_string();
        assert!(repo.validate().is_ok());
    }

    #[test]
    fn test_priority_accepts_strings() {
        let mut repo = Repo::new("updates");
        repo.set_kind_field("priority", &json!("40")).unwrap();
        assert_eq!(repo.priority, 40);
        assert!(repo.set_kind_field("priority", &json!("high")).is_err());
    }
}
