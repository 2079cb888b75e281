//! Target machine records.

use crate::item::{parse_inheritable_string, require_string, Item, ItemBase, ParentRef};
use bootforge_core::util::data::{coerce_bool, parse_string_list};
use bootforge_types::{ForgeError, Inheritable, ItemKind, MacAddress, Result};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One network interface on a system.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct NetworkInterface {
    /// Hardware address; the canonical PXE/DHCP key when present
    pub mac_address: Option<MacAddress>,

    /// IPv4 address handed out for this interface
    pub ip_address: String,

    /// Netmask for static configurations
    pub netmask: String,

    /// Fully qualified DNS name placed into a managed forward zone
    pub dns_name: String,

    /// DHCP stanza group; empty means the default group
    pub dhcp_tag: String,

    /// Statically configured rather than DHCP-assigned
    #[serde(rename = "static")]
    pub is_static: bool,
}

/// Power-management coordinates for a system.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct PowerSettings {
    /// Fence agent flavor (`ipmilan`, `drac`, ...); empty disables power ops
    pub power_type: String,

    /// Management controller address
    pub power_address: String,

    /// Management controller user
    pub power_user: String,

    /// Management controller password
    pub power_pass: String,

    /// Plug/port identifier on shared switches
    pub power_id: String,
}

/// A system: one provisioned machine, bound to exactly one profile or
/// image, with one or more network interfaces.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct System {
    /// Common fields
    #[serde(flatten)]
    pub base: ItemBase,

    /// Profile this system installs
    pub profile: Option<String>,

    /// Image this system deploys (mutually exclusive with `profile`)
    pub image: Option<String>,

    /// Interfaces by name (`eth0`, ...)
    pub interfaces: IndexMap<String, NetworkInterface>,

    /// Whether PXE config files are generated for this system
    pub netboot_enabled: bool,

    /// Host name pushed into rendered configs
    pub hostname: String,

    /// Default gateway
    pub gateway: String,

    /// Name servers for static interface configs
    pub name_servers: Vec<String>,

    /// Answer-file template override
    pub autoinstall: Inheritable<String>,

    /// Power management coordinates
    pub power: PowerSettings,
}

impl Default for System {
    fn default() -> Self {
        Self {
            base: ItemBase::default(),
            profile: None,
            image: None,
            interfaces: IndexMap::new(),
            netboot_enabled: true,
            hostname: String::new(),
            gateway: String::new(),
            name_servers: Vec::new(),
            autoinstall: Inheritable::Inherit,
            power: PowerSettings::default(),
        }
    }
}

impl System {
    /// Create an empty, not-yet-valid system shell.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            base: ItemBase::new(name),
            ..Self::default()
        }
    }

    /// Insert or replace one interface.
    pub fn set_interface(&mut self, name: impl Into<String>, interface: NetworkInterface) {
        self.interfaces.insert(name.into(), interface);
        self.base.touch();
    }

    /// The PXE config file key for one interface.
    ///
    /// The MAC is the canonical key (`01-aa-bb-...`); an interface
    /// without one falls back to the zero-padded uppercase hex IP the
    /// pxelinux search path expects, and finally to the system name
    /// (which is unsuitable for PXE but still keys the record).
    pub fn config_filename(&self, interface: &str) -> Option<String> {
        let iface = self.interfaces.get(interface)?;
        if let Some(mac) = &iface.mac_address {
            return Some(mac.pxe_file_name());
        }
        if let Some(hex) = ip_to_hex(&iface.ip_address) {
            return Some(hex);
        }
        Some(self.base.name.clone())
    }
}

/// Render a dotted IPv4 address as the uppercase hex form used by the
/// pxelinux config search path (`10.0.0.5` → `0A000005`).
pub fn ip_to_hex(ip: &str) -> Option<String> {
    let octets: Vec<u8> = ip
        .split('.')
        .map(|part| part.parse::<u8>().ok())
        .collect::<Option<Vec<u8>>>()?;
    if octets.len() != 4 {
        return None;
    }
    Some(
        octets
            .iter()
            .map(|o| format!("{:02X}", o))
            .collect::<String>(),
    )
}

impl Item for System {
    const KIND: ItemKind = ItemKind::System;

    fn base(&self) -> &ItemBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut ItemBase {
        &mut self.base
    }

    fn parent_ref(&self) -> Option<ParentRef> {
        if let Some(profile) = self.profile.as_deref().filter(|p| !p.is_empty()) {
            return Some(ParentRef::new(ItemKind::Profile, profile));
        }
        self.image
            .as_deref()
            .filter(|i| !i.is_empty())
            .map(|image| ParentRef::new(ItemKind::Image, image))
    }

    fn validate(&self) -> Result<()> {
        if self.base.name.is_empty() {
            return Err(ForgeError::Validation("System requires a name".to_string()));
        }
        let has_profile = self.profile.as_deref().map_or(false, |p| !p.is_empty());
        let has_image = self.image.as_deref().map_or(false, |i| !i.is_empty());
        match (has_profile, has_image) {
            (false, false) => Err(ForgeError::Validation(format!(
                "System '{}' requires a profile or an image",
                self.base.name
            ))),
            (true, true) => Err(ForgeError::Validation(format!(
                "System '{}' cannot reference both a profile and an image",
                self.base.name
            ))),
            _ => Ok(()),
        }
    }

    fn set_kind_field(&mut self, field: &str, value: &Value) -> Result<bool> {
        match field {
            "profile" => {
                let profile = require_string(field, value)?;
                self.profile = if profile.is_empty() { None } else { Some(profile) };
            }
            "image" => {
                let image = require_string(field, value)?;
                self.image = if image.is_empty() { None } else { Some(image) };
            }
            "netboot_enabled" => self.netboot_enabled = coerce_bool(value)?,
            "hostname" => self.hostname = require_string(field, value)?,
            "gateway" => self.gateway = require_string(field, value)?,
            "name_servers" => self.name_servers = parse_string_list(value)?,
            "autoinstall" => self.autoinstall = parse_inheritable_string(field, value)?,
            "power_type" => self.power.power_type = require_string(field, value)?,
            "power_address" => self.power.power_address = require_string(field, value)?,
            "power_user" => self.power.power_user = require_string(field, value)?,
            "power_pass" => self.power.power_pass = require_string(field, value)?,
            "power_id" => self.power.power_id = require_string(field, value)?,
            _ => return Ok(false),
        }
        Ok(true)
    }
}
