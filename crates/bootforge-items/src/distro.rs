//! Bootable operating-system image records.

use crate::item::{require_string, Item, ItemBase, ParentRef};
use bootforge_types::{Arch, Breed, ForgeError, ItemKind, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::Path;

/// A distro: the root of every installable chain, pairing a kernel and
/// initrd with architecture/breed metadata.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Distro {
    /// Common fields
    #[serde(flatten)]
    pub base: ItemBase,

    /// Path to the bootable kernel; must exist at save time
    pub kernel: String,

    /// Path to the matching initrd; must exist at save time
    pub initrd: String,

    /// Target architecture
    pub arch: Arch,

    /// Operating-system family
    pub breed: Breed,

    /// Free-form OS version tag (e.g. `fedora40`)
    pub os_version: String,
}

impl Distro {
    /// Create an empty, not-yet-valid distro shell.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            base: ItemBase::new(name),
            ..Self::default()
        }
    }
}

impl Item for Distro {
    const KIND: ItemKind = ItemKind::Distro;

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
            return Err(ForgeError::Validation("Distro requires a name".to_string()));
        }
        if self.kernel.is_empty() {
            return Err(ForgeError::Validation(format!(
                "Distro '{}' requires a kernel path",
                self.base.name
            )));
        }
        if !Path::new(&self.kernel).exists() {
            return Err(ForgeError::Validation(format!(
                "Kernel '{}' for distro '{}' does not exist",
                self.kernel, self.base.name
            )));
        }
        if self.initrd.is_empty() {
            return Err(ForgeError::Validation(format!(
                "Distro '{}' requires an initrd path",
                self.base.name
            )));
        }
        if !Path::new(&self.initrd).exists() {
            return Err(ForgeError::Validation(format!(
                "Initrd '{}' for distro '{}' does not exist",
                self.initrd, self.base.name
            )));
        }
        Ok(())
    }

    fn set_kind_field(&mut self, field: &str, value: &Value) -> Result<bool> {
        match field {
            "kernel" => self.kernel = require_string(field, value)?,
            "initrd" => self.initrd = require_string(field, value)?,
            "arch" => self.arch = require_string(field, value)?.parse()?,
            "breed" => self.breed = require_string(field, value)?.parse()?,
            "os_version" => self.os_version = require_string(field, value)?,
            _ => return Ok(false),
        }
        Ok(true)
    }
}
