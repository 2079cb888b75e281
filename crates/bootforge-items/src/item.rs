//! The common item surface shared by every kind.

use bootforge_core::util::data::{parse_option_map, parse_string_list};
use bootforge_types::{ForgeError, Inheritable, ItemKind, ObjectName, Result};
use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A reference to an item's logical parent, possibly in another
/// collection (a profile's distro, a system's profile or image).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ParentRef {
    /// Collection the parent lives in
    pub kind: ItemKind,
    /// Parent name
    pub name: String,
}

impl ParentRef {
    /// Convenience constructor.
    pub fn new(kind: ItemKind, name: impl Into<String>) -> Self {
        Self {
            kind,
            name: name.into(),
        }
    }
}

/// Fields every item kind carries.
///
/// Flattened into each concrete kind's record so the on-disk shape stays
/// one flat mapping per item.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ItemBase {
    /// Unique key within the item's collection
    pub name: String,

    /// Stable identifier for API linkage; names remain the primary key
    pub uid: String,

    /// Free-form operator comment
    pub comment: String,

    /// Derived distance from the chain root; load-ordering bookkeeping only
    pub depth: u32,

    /// Creation timestamp
    pub ctime: DateTime<Utc>,

    /// Last modification timestamp
    pub mtime: DateTime<Utc>,

    /// Owning users/groups; defers to the settings default when inherited
    pub owners: Inheritable<Vec<String>>,

    /// Kernel command-line options, merged additively down the chain
    pub kernel_options: IndexMap<String, Value>,

    /// Post-install kernel options, merged additively down the chain
    pub kernel_options_post: IndexMap<String, Value>,

    /// Answer-file template variables, merged additively down the chain
    pub autoinstall_meta: IndexMap<String, Value>,

    /// Extra templates rendered next to the answer file, merged additively
    pub template_files: IndexMap<String, Value>,

    /// Management classes attached by name, concatenated down the chain
    pub mgmt_classes: Inheritable<Vec<String>>,
}

impl Default for ItemBase {
    fn default() -> Self {
        let now = Utc::now();
        Self {
            name: String::new(),
            uid: String::new(),
            comment: String::new(),
            depth: 0,
            ctime: now,
            mtime: now,
            owners: Inheritable::Inherit,
            kernel_options: IndexMap::new(),
            kernel_options_post: IndexMap::new(),
            autoinstall_meta: IndexMap::new(),
            template_files: IndexMap::new(),
            mgmt_classes: Inheritable::Inherit,
        }
    }
}

impl ItemBase {
    /// A fresh base for a new item shell.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            uid: uuid::Uuid::new_v4().to_string(),
            ..Self::default()
        }
    }

    /// Bump the modification timestamp.
    pub fn touch(&mut self) {
        self.mtime = Utc::now();
    }
}

/// The capability set every item kind implements.
///
/// One concrete type per kind; shared behavior (`to_map`, `set_field`
/// for common fields, timestamps) is provided here so kinds only supply
/// their own fields and validation.
pub trait Item: Clone + Send + Sync + Serialize + DeserializeOwned + 'static {
    /// The collection this kind lives in.
    const KIND: ItemKind;

    /// Shared fields, read-only.
    fn base(&self) -> &ItemBase;

    /// Shared fields, mutable.
    fn base_mut(&mut self) -> &mut ItemBase;

    /// This item's logical parent, if the kind participates in the tree.
    fn parent_ref(&self) -> Option<ParentRef>;

    /// Kind-specific required-field validation.
    ///
    /// Referential checks (does the parent exist?) belong to the manager,
    /// which can see sibling collections.
    fn validate(&self) -> Result<()>;

    /// Set a kind-specific field, returning `Ok(false)` when the field
    /// name is not recognized by this kind.
    fn set_kind_field(&mut self, field: &str, value: &Value) -> Result<bool>;

    /// Item name.
    fn name(&self) -> &str {
        &self.base().name
    }

    /// Derived chain depth.
    fn depth(&self) -> u32 {
        self.base().depth
    }

    /// Record the derived chain depth.
    fn set_depth(&mut self, depth: u32) {
        self.base_mut().depth = depth;
    }

    /// Export the raw (uncollapsed) attribute map.
    fn to_map(&self) -> Result<Value> {
        serde_json::to_value(self).map_err(Into::into)
    }

    /// Rebuild an item from a raw record.
    fn from_map(record: &Value) -> Result<Self> {
        serde_json::from_value(record.clone()).map_err(Into::into)
    }

    /// Validate and set one field by name, common fields first.
    ///
    /// The value is parsed and normalized completely before anything is
    /// assigned, so a rejected value never leaves the item half-updated.
    fn set_field(&mut self, field: &str, value: &Value) -> Result<()> {
        match field {
            "name" => {
                let name = require_string(field, value)?;
                ObjectName::new(&name)?;
                self.base_mut().name = name;
            }
            "comment" => {
                self.base_mut().comment = require_string(field, value)?;
            }
            "owners" => {
                self.base_mut().owners = parse_inheritable_list(value)?;
            }
            "mgmt_classes" => {
                self.base_mut().mgmt_classes = parse_inheritable_list(value)?;
            }
            "kernel_options" => {
                self.base_mut().kernel_options = parse_option_map(value)?;
            }
            "kernel_options_post" => {
                self.base_mut().kernel_options_post = parse_option_map(value)?;
            }
            "autoinstall_meta" => {
                self.base_mut().autoinstall_meta = parse_option_map(value)?;
            }
            "template_files" => {
                self.base_mut().template_files = parse_option_map(value)?;
            }
            other => {
                if !self.set_kind_field(other, value)? {
                    return Err(ForgeError::Validation(format!(
                        "Unknown field '{}' for {}",
                        other,
                        Self::KIND
                    )));
                }
            }
        }
        self.base_mut().touch();
        Ok(())
    }
}

/// Require a plain string value for a field.
pub(crate) fn require_string(field: &str, value: &Value) -> Result<String> {
    match value {
        Value::String(s) => Ok(s.clone()),
        other => Err(ForgeError::Validation(format!(
            "Field '{}' expects a string, got {}",
            field, other
        ))),
    }
}

/// Parse an inheritable list field: the sentinel stays inherited,
/// anything else goes through the list coercion.
pub(crate) fn parse_inheritable_list(value: &Value) -> Result<Inheritable<Vec<String>>> {
    if value.as_str() == Some(bootforge_types::INHERIT_SENTINEL) {
        return Ok(Inheritable::Inherit);
    }
    Ok(Inheritable::Value(parse_string_list(value)?))
}

/// Parse an inheritable scalar string field.
pub(crate) fn parse_inheritable_string(field: &str, value: &Value) -> Result<Inheritable<String>> {
    if value.as_str() == Some(bootforge_types::INHERIT_SENTINEL) {
        return Ok(Inheritable::Inherit);
    }
    Ok(Inheritable::Value(require_string(field, value)?))
}

/// Parse an inheritable boolean field.
pub(crate) fn parse_inheritable_bool(value: &Value) -> Result<Inheritable<bool>> {
    if value.as_str() == Some(bootforge_types::INHERIT_SENTINEL) {
        return Ok(Inheritable::Inherit);
    }
    Ok(Inheritable::Value(bootforge_core::util::data::coerce_bool(
        value,
    )?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::distro::Distro;
    use serde_json::json;

    #[test]
    fn test_set_common_field_coercion() {
        let mut distro = Distro::new("fedora");
        distro
            .set_field("kernel_options", &json!("console=ttyS0 noapic"))
            .unwrap();
        assert_eq!(
            distro.base().kernel_options.get("console"),
            Some(&json!("ttyS0"))
        );

        distro.set_field("owners", &json!("alice, bob")).unwrap();
        assert_eq!(
            distro.base().owners.as_value().unwrap(),
            &vec!["alice".to_string(), "bob".to_string()]
        );
    }

    #[test]
    fn test_rejected_value_leaves_item_untouched() {
        let mut distro = Distro::new("fedora");
        distro.set_field("comment", &json!("first")).unwrap();

        let err = distro.set_field("comment", &json!(42));
        assert!(err.is_err());
        assert_eq!(distro.base().comment, "first");
    }

    #[test]
    fn test_unknown_field_rejected() {
        let mut distro = Distro::new("fedora");
        assert!(distro.set_field("no_such_field", &json!("x")).is_err());
    }

    #[test]
    fn test_rename_validates() {
        let mut distro = Distro::new("fedora");
        assert!(distro.set_field("name", &json!("has space")).is_err());
        assert_eq!(distro.name(), "fedora");
    }

    #[test]
    fn test_map_round_trip() {
        let mut distro = Distro::new("fedora");
        distro
            .set_field("kernel_options", &json!("a=1 b"))
            .unwrap();
        let map = distro.to_map().unwrap();
        let back = Distro::from_map(&map).unwrap();
        assert_eq!(back.to_map().unwrap(), map);
    }
}
