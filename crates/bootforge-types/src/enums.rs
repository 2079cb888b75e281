//! Common enumerations used throughout bootforge.

use crate::errors::{ForgeError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The kind of a configuration object, one per collection.
///
/// `Settings` is not a true collection; persistence backends short-circuit
/// it to a single document, and it never appears inside an item record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemKind {
    /// The global settings document
    Settings,
    /// A bootable operating-system image (kernel + initrd)
    Distro,
    /// An installation profile layered on a distro or another profile
    Profile,
    /// A target machine with one or more network interfaces
    System,
    /// A package repository referenced by name from profiles/systems
    Repo,
    /// A pre-built deployable image
    Image,
    /// A configuration-management class
    MgmtClass,
    /// A managed package resource
    Package,
    /// A managed file resource
    File,
}

impl ItemKind {
    /// Collections in the order they must be persisted and reloaded:
    /// parents strictly before anything that can reference them.
    pub const SERIALIZE_ORDER: [ItemKind; 9] = [
        ItemKind::Settings,
        ItemKind::Distro,
        ItemKind::Repo,
        ItemKind::Profile,
        ItemKind::Image,
        ItemKind::System,
        ItemKind::MgmtClass,
        ItemKind::Package,
        ItemKind::File,
    ];

    /// The item kinds that live in real collections (everything but settings).
    pub const COLLECTIONS: [ItemKind; 8] = [
        ItemKind::Distro,
        ItemKind::Repo,
        ItemKind::Profile,
        ItemKind::Image,
        ItemKind::System,
        ItemKind::MgmtClass,
        ItemKind::Package,
        ItemKind::File,
    ];

    /// Directory name used by the file-catalog backend for this kind.
    pub fn collection_dir(&self) -> &'static str {
        match self {
            ItemKind::Settings => "settings",
            ItemKind::Distro => "distros",
            ItemKind::Profile => "profiles",
            ItemKind::System => "systems",
            ItemKind::Repo => "repos",
            ItemKind::Image => "images",
            ItemKind::MgmtClass => "mgmtclasses",
            ItemKind::Package => "packages",
            ItemKind::File => "files",
        }
    }

    /// Whether this kind participates in the parent/child tree walked by
    /// the resolver (the flat kinds are referenced by name lists only).
    pub fn is_tree_kind(&self) -> bool {
        matches!(
            self,
            ItemKind::Distro | ItemKind::Profile | ItemKind::System | ItemKind::Image
        )
    }
}

impl fmt::Display for ItemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ItemKind::Settings => "settings",
            ItemKind::Distro => "distro",
            ItemKind::Profile => "profile",
            ItemKind::System => "system",
            ItemKind::Repo => "repo",
            ItemKind::Image => "image",
            ItemKind::MgmtClass => "mgmtclass",
            ItemKind::Package => "package",
            ItemKind::File => "file",
        };
        write!(f, "{}", name)
    }
}

impl FromStr for ItemKind {
    type Err = ForgeError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "settings" => Ok(ItemKind::Settings),
            "distro" => Ok(ItemKind::Distro),
            "profile" => Ok(ItemKind::Profile),
            "system" => Ok(ItemKind::System),
            "repo" => Ok(ItemKind::Repo),
            "image" => Ok(ItemKind::Image),
            "mgmtclass" => Ok(ItemKind::MgmtClass),
            "package" => Ok(ItemKind::Package),
            "file" => Ok(ItemKind::File),
            _ => Err(ForgeError::Validation(format!("Invalid item kind: {}", s))),
        }
    }
}

/// Machine architectures a distro or image can target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Arch {
    /// 32-bit x86
    I386,
    /// 64-bit x86
    #[default]
    #[serde(rename = "x86_64")]
    X86_64,
    /// 64-bit ARM
    Arm64,
    /// Little-endian 64-bit POWER
    Ppc64le,
    /// Itanium; PXE configs for this arch use the legacy flat-file layout
    Ia64,
}

impl Arch {
    /// Legacy arches cannot read `pxelinux.cfg/`-style per-MAC files and
    /// get a flat config file in the TFTP root instead.
    pub fn uses_flat_boot_files(&self) -> bool {
        matches!(self, Arch::Ia64)
    }
}

impl fmt::Display for Arch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Arch::I386 => "i386",
            Arch::X86_64 => "x86_64",
            Arch::Arm64 => "arm64",
            Arch::Ppc64le => "ppc64le",
            Arch::Ia64 => "ia64",
        };
        write!(f, "{}", name)
    }
}

impl FromStr for Arch {
    type Err = ForgeError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "i386" | "x86" => Ok(Arch::I386),
            "x86_64" | "amd64" => Ok(Arch::X86_64),
            "arm64" | "aarch64" => Ok(Arch::Arm64),
            "ppc64le" => Ok(Arch::Ppc64le),
            "ia64" => Ok(Arch::Ia64),
            _ => Err(ForgeError::Validation(format!("Invalid architecture: {}", s))),
        }
    }
}

/// Operating-system families with distinct installer conventions.
///
/// The breed decides the answer-file flavor (kickstart, preseed, AutoYaST)
/// and which post-processing the generated output needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Breed {
    /// Fedora/RHEL/CentOS family (kickstart)
    #[default]
    Redhat,
    /// Debian (preseed)
    Debian,
    /// Ubuntu (preseed/autoinstall)
    Ubuntu,
    /// SUSE family; answer files are AutoYaST XML documents
    Suse,
    /// FreeBSD installer
    Freebsd,
    /// No installer conventions assumed
    Generic,
}

impl Breed {
    /// Whether the rendered answer file must be post-processed as XML.
    pub fn uses_xml_answer_file(&self) -> bool {
        matches!(self, Breed::Suse)
    }
}

impl fmt::Display for Breed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Breed::Redhat => "redhat",
            Breed::Debian => "debian",
            Breed::Ubuntu => "ubuntu",
            Breed::Suse => "suse",
            Breed::Freebsd => "freebsd",
            Breed::Generic => "generic",
        };
        write!(f, "{}", name)
    }
}

impl FromStr for Breed {
    type Err = ForgeError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "redhat" => Ok(Breed::Redhat),
            "debian" => Ok(Breed::Debian),
            "ubuntu" => Ok(Breed::Ubuntu),
            "suse" => Ok(Breed::Suse),
            "freebsd" => Ok(Breed::Freebsd),
            "generic" => Ok(Breed::Generic),
            _ => Err(ForgeError::Validation(format!("Invalid breed: {}", s))),
        }
    }
}

/// Mutation families triggers can hook into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TriggerEvent {
    /// An object was added or updated
    Add,
    /// An object was removed
    Delete,
    /// A full artifact sync ran
    Sync,
    /// Install-time callbacks from provisioned machines
    Install,
}

impl fmt::Display for TriggerEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TriggerEvent::Add => "add",
            TriggerEvent::Delete => "delete",
            TriggerEvent::Sync => "sync",
            TriggerEvent::Install => "install",
        };
        write!(f, "{}", name)
    }
}

/// Whether a trigger runs before or after its event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TriggerPhase {
    /// Before artifact generation
    Pre,
    /// After artifact generation
    Post,
}

impl fmt::Display for TriggerPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TriggerPhase::Pre => write!(f, "pre"),
            TriggerPhase::Post => write!(f, "post"),
        }
    }
}

/// Build the filesystem event path a trigger set is discovered under,
/// e.g. `delete/system/pre` or `sync/post`.
pub fn trigger_path(event: TriggerEvent, kind: Option<ItemKind>, phase: TriggerPhase) -> String {
    match kind {
        Some(kind) => format!("{}/{}/{}", event, kind, phase),
        None => format!("{}/{}", event, phase),
    }
}

/// Power-management operations on a system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PowerAction {
    /// Power the machine on
    On,
    /// Power the machine off
    Off,
    /// Query power state
    Status,
    /// Power-cycle (off, wait, on)
    Reboot,
}

impl fmt::Display for PowerAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PowerAction::On => "on",
            PowerAction::Off => "off",
            PowerAction::Status => "status",
            PowerAction::Reboot => "reboot",
        };
        write!(f, "{}", name)
    }
}

impl FromStr for PowerAction {
    type Err = ForgeError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "on" => Ok(PowerAction::On),
            "off" => Ok(PowerAction::Off),
            "status" => Ok(PowerAction::Status),
            "reboot" => Ok(PowerAction::Reboot),
            _ => Err(ForgeError::Validation(format!("Invalid power action: {}", s))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serialize_order_starts_with_settings() {
        assert_eq!(ItemKind::SERIALIZE_ORDER[0], ItemKind::Settings);
        // distros and repos come before profiles, profiles before systems
        let pos = |k: ItemKind| {
            ItemKind::SERIALIZE_ORDER
                .iter()
                .position(|x| *x == k)
                .unwrap()
        };
        assert!(pos(ItemKind::Distro) < pos(ItemKind::Profile));
        assert!(pos(ItemKind::Repo) < pos(ItemKind::Profile));
        assert!(pos(ItemKind::Profile) < pos(ItemKind::System));
        assert!(pos(ItemKind::Image) < pos(ItemKind::System));
    }

    #[test]
    fn test_kind_round_trip() {
        for kind in ItemKind::COLLECTIONS {
            assert_eq!(kind.to_string().parse::<ItemKind>().unwrap(), kind);
        }
    }

    #[test]
    fn test_arch_aliases() {
        assert_eq!("amd64".parse::<Arch>().unwrap(), Arch::X86_64);
        assert_eq!("aarch64".parse::<Arch>().unwrap(), Arch::Arm64);
    }

    #[test]
    fn test_trigger_path() {
        assert_eq!(
            trigger_path(TriggerEvent::Delete, Some(ItemKind::System), TriggerPhase::Pre),
            "delete/system/pre"
        );
        assert_eq!(trigger_path(TriggerEvent::Sync, None, TriggerPhase::Post), "sync/post");
    }
}
