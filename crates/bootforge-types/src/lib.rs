//! # Bootforge Types
//!
//! Core types, traits, and enums shared across all bootforge crates.
//!
//! This crate provides the fundamental building blocks for the bootforge
//! provisioning manager, including:
//!
//! - Type-safe wrappers for object names and MAC addresses
//! - The `Inheritable<T>` sentinel used by the attribute resolver
//! - Common enums for item kinds, architectures, breeds, and trigger events
//! - Core traits for storage backends, trigger dispatch, and templating
//! - Error types and result aliases
//!
//! ## Example
//!
//! ```
//! use bootforge_types::{ObjectName, MacAddress, ItemKind};
//!
//! // Create a validated object name
//! let name = ObjectName::new("fedora-40-x86_64").unwrap();
//! assert_eq!(name.as_str(), "fedora-40-x86_64");
//!
//! // MAC addresses normalize to lowercase colon form
//! let mac = MacAddress::new("AA-BB-CC-DD-EE-FF").unwrap();
//! assert_eq!(mac.as_str(), "aa:bb:cc:dd:ee:ff");
//!
//! assert_eq!(ItemKind::Distro.collection_dir(), "distros");
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod errors;
pub mod identifiers;
pub mod enums;
pub mod inherit;
pub mod traits;

// Re-export common types for convenience
pub use errors::{ForgeError, Result};
pub use identifiers::{MacAddress, ObjectName};
pub use enums::{trigger_path, Arch, Breed, ItemKind, PowerAction, TriggerEvent, TriggerPhase};
pub use inherit::{Inheritable, INHERIT_SENTINEL};
pub use traits::{LiteSync, Storage, TemplateEngine, TemplateVars, TriggerDispatch};
