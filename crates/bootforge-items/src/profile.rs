//! Installation profile records.

use crate::item::{
    parse_inheritable_bool, parse_inheritable_list, parse_inheritable_string, require_string,
    Item, ItemBase, ParentRef,
};
use bootforge_types::{ForgeError, Inheritable, ItemKind, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A profile layers installation choices on a distro.
///
/// A profile with `parent` set is a sub-profile: it inherits through the
/// named profile instead of naming a distro itself.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Profile {
    /// Common fields
    #[serde(flatten)]
    pub base: ItemBase,

    /// Distro this profile installs; empty on sub-profiles
    pub distro: String,

    /// Parent profile for sub-profiles
    pub parent: Option<String>,

    /// Answer-file template; defers to the settings default when inherited
    pub autoinstall: Inheritable<String>,

    /// Repos attached by name
    pub repos: Inheritable<Vec<String>>,

    /// Whether this profile appears in the generated boot menu
    pub enable_menu: Inheritable<bool>,
}

impl Profile {
    /// Create an empty, not-yet-valid profile shell.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            base: ItemBase::new(name),
            ..Self::default()
        }
    }

    /// True when this profile inherits through another profile.
    pub fn is_sub_profile(&self) -> bool {
        self.parent.as_deref().map_or(false, |p| !p.is_empty())
    }
}

impl Item for Profile {
    const KIND: ItemKind = ItemKind::Profile;

    fn base(&self) -> &ItemBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut ItemBase {
        &mut self.base
    }

    fn parent_ref(&self) -> Option<ParentRef> {
        if let Some(parent) = self.parent.as_deref().filter(|p| !p.is_empty()) {
            return Some(ParentRef::new(ItemKind::Profile, parent));
        }
        if self.distro.is_empty() {
            None
        } else {
            Some(ParentRef::new(ItemKind::Distro, self.distro.clone()))
        }
    }

    fn validate(&self) -> Result<()> {
        if self.base.name.is_empty() {
            return Err(ForgeError::Validation("Profile requires a name".to_string()));
        }
        if self.distro.is_empty() && !self.is_sub_profile() {
            return Err(ForgeError::Validation(format!(
                "Profile '{}' requires a distro or a parent profile",
                self.base.name
            )));
        }
        if !self.distro.is_empty() && self.is_sub_profile() {
            return Err(ForgeError::Validation(format!(
                "Profile '{}' cannot name both a distro and a parent profile",
                self.base.name
            )));
        }
        Ok(())
    }

    fn set_kind_field(&mut self, field: &str, value: &Value) -> Result<bool> {
        match field {
            "distro" => self.distro = require_string(field, value)?,
            "parent" => {
                let parent = require_string(field, value)?;
                self.parent = if parent.is_empty() { None } else { Some(parent) };
            }
            "autoinstall" => self.autoinstall = parse_inheritable_string(field, value)?,
            "repos" => self.repos = parse_inheritable_list(value)?,
            "enable_menu" => self.enable_menu = parse_inheritable_bool(value)?,
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
    fn test_profile_requires_distro_or_parent() {
        let mut profile = Profile::new("web");
        assert!(profile.validate().is_err());

        profile.distro = "fedora".to_string();
        assert!(profile.validate().is_ok());

        profile.parent = Some("base".to_string());
        assert!(profile.validate().is_err()); // both set is ambiguous
    }

    #[test]
    fn test_parent_ref_prefers_parent_profile() {
        let mut profile = Profile::new("sub");
        profile.parent = Some("base".to_string());
        assert_eq!(
            profile.parent_ref(),
            Some(ParentRef::new(ItemKind::Profile, "base"))
        );

        let mut top = Profile::new("base");
        top.distro = "fedora".to_string();
        assert_eq!(
            top.parent_ref(),
            Some(ParentRef::new(ItemKind::Distro, "fedora"))
        );
    }

    #[test]
    fn test_inheritable_fields() {
        let mut profile = Profile::new("web");
        assert!(profile.autoinstall.is_inherit());

        profile
            .set_kind_field("autoinstall", &json!("web.ks"))
            .unwrap();
        assert_eq!(profile.autoinstall.as_value().unwrap(), "web.ks");

        profile
            .set_kind_field("autoinstall", &json!("<<inherit>>"))
            .unwrap();
        assert!(profile.autoinstall.is_inherit());

        profile.set_kind_field("enable_menu", &json!("no")).unwrap();
        assert_eq!(profile.enable_menu.as_value(), Some(&false));
    }
}
