//! Pre-built deployable image records.

use crate::item::{require_string, Item, ItemBase, ParentRef};
use bootforge_types::{Arch, Breed, ForgeError, ItemKind, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// How an image file is consumed at deploy time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ImageType {
    /// Bootable ISO
    #[default]
    Iso,
    /// Raw disk image written directly
    Direct,
    /// Virtual machine image
    Virt,
}

/// An image: an alternative chain root for systems deployed from a
/// pre-built artifact instead of a kernel/initrd install.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Image {
    /// Common fields
    #[serde(flatten)]
    pub base: ItemBase,

    /// Path or URL of the image artifact
    pub file: String,

    /// Consumption flavor
    pub image_type: ImageType,

    /// Target architecture
    pub arch: Arch,

    /// Operating-system family
    pub breed: Breed,

    /// Free-form OS version tag
    pub os_version: String,
}

impl Image {
    /// Create an empty, not-yet-valid image shell.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            base: ItemBase::new(name),
            ..Self::default()
        }
    }
}

impl Item for Image {
    const KIND: ItemKind = ItemKind::Image;

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
            return Err(ForgeError::Validation("Image requires a name".to_string()));
        }
        if self.file.is_empty() {
            return Err(ForgeError::Validation(format!(
                "Image '{}' requires a file",
                self.base.name
            )));
        }
        Ok(())
    }

    fn set_kind_field(&mut self, field: &str, value: &Value) -> Result<bool> {
        match field {
            "file" => self.file = require_string(field, value)?,
            "image_type" => {
                let raw = require_string(field, value)?;
                self.image_type = match raw.to_lowercase().as_str() {
                    "iso" => ImageType::Iso,
                    "direct" => ImageType::Direct,
                    "virt" => ImageType::Virt,
                    other => {
                        return Err(ForgeError::Validation(format!(
                            "Invalid image type: {}",
                            other
                        )))
                    }
                };
            }
            "arch" => self.arch = require_string(field, value)?.parse()?,
            "breed" => self.breed = require_string(field, value)?.parse()?,
            "os_version" => self.os_version = require_string(field, value)?,
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
    fn test_image_requires_file() {
        let mut image = Image::new("appliance");
        assert!(image.validate().is_err());
        image.file = "/srv/images/appliance.iso".to_string();
        assert!(image.validate().is_ok());
    }

    #[test]
    fn test_image_type_parsing() {
        let mut image = Image::new("appliance");
        image.set_kind_field("image_type", &json!("direct")).unwrap();
        assert_eq!(image.image_type, ImageType::Direct);
        assert!(image.set_kind_field("image_type", &json!("floppy")).is_err());
    }
}
