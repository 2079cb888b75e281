//! Type-safe identifiers.

use crate::errors::{ForgeError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A validated object name, the primary key within a collection.
///
/// Object names must:
/// - Be non-empty
/// - Contain only letters, digits, hyphens, underscores, dots, and colons
/// - Not contain whitespace or path separators
///
/// # Example
///
/// ```
/// use bootforge_types::ObjectName;
///
/// let name = ObjectName::new("fedora-40-x86_64").unwrap();
/// assert_eq!(name.as_str(), "fedora-40-x86_64");
///
/// // Invalid names are rejected
/// assert!(ObjectName::new("has space").is_err());
/// assert!(ObjectName::new("has/slash").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ObjectName(String);

impl ObjectName {
    /// Create a new validated object name.
    ///
    /// # Errors
    ///
    /// Returns an error if the name doesn't meet validation requirements.
    pub fn new(name: impl AsRef<str>) -> Result<Self> {
        let name = name.as_ref();
        if !Self::is_valid(name) {
            return Err(ForgeError::Validation(format!(
                "Invalid object name '{}': must be non-empty and contain only letters, digits, \
                hyphens, underscores, dots, and colons",
                name
            )));
        }
        Ok(Self(name.to_string()))
    }

    /// Check if a name is valid without allocating.
    pub fn is_valid(name: &str) -> bool {
        !name.is_empty()
            && name
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.' | ':'))
    }

    /// Get the name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ObjectName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ObjectName {
    type Err = ForgeError;

    fn from_str(s: &str) -> Result<Self> {
        Self::new(s)
    }
}

/// A validated, normalized MAC address.
///
/// Accepts `:`-, `-`- or bare-hex notation and normalizes to lowercase
/// colon-separated form, which is the canonical key for PXE config files
/// and DHCP stanzas.
///
/// # Example
///
/// ```
/// use bootforge_types::MacAddress;
///
/// let mac = MacAddress::new("AA-BB-CC-DD-EE-FF").unwrap();
/// assert_eq!(mac.as_str(), "aa:bb:cc:dd:ee:ff");
/// assert_eq!(mac.pxe_file_name(), "01-aa-bb-cc-dd-ee-ff");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MacAddress(String);

impl MacAddress {
    /// Parse and normalize a MAC address.
    ///
    /// # Errors
    ///
    /// Returns an error unless the input contains exactly six hex octets.
    pub fn new(raw: impl AsRef<str>) -> Result<Self> {
        let raw = raw.as_ref();
        let hex: String = raw
            .chars()
            .filter(|c| *c != ':' && *c != '-')
            .collect::<String>()
            .to_lowercase();

        if hex.len() != 12 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(ForgeError::Validation(format!(
                "Invalid MAC address '{}': expected six hex octets",
                raw
            )));
        }

        let octets: Vec<&str> = (0..6).map(|i| &hex[i * 2..i * 2 + 2]).collect();
        Ok(Self(octets.join(":")))
    }

    /// Get the normalized address as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The pxelinux-style config file name for this address
    /// (`01-` prefix, dash-separated, lowercase).
    pub fn pxe_file_name(&self) -> String {
        format!("01-{}", self.0.replace(':', "-"))
    }
}

impl fmt::Display for MacAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for MacAddress {
    type Err = ForgeError;

    fn from_str(s: &str) -> Result<Self> {
        Self::new(s)
    }
}
