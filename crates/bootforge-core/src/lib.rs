//! # Bootforge Core
//!
//! Settings, logging, and common functionality for the bootforge
//! provisioning manager.
//!
//! This crate provides:
//!
//! - **Settings**: the single global settings document with serde defaults
//! - **Logging**: tracing-based logging initialization
//! - **Process Execution**: synchronous command execution with bounded retries
//! - **File Operations**: YAML handling, path utilities
//! - **Data Structures**: value coercion and option-string formatting
//!
//! ## Example
//!
//! ```rust,no_run
//! use bootforge_core::config::Settings;
//!
//! bootforge_core::log::init_default().unwrap();
//! let settings = Settings::load("/etc/bootforge/settings.yaml").unwrap();
//! assert_eq!(settings.http_port, 80);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod log;
pub mod util;

// Re-export commonly used items
pub use bootforge_types::{ForgeError, Result};
pub use config::Settings;

/// Bootforge application version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Bootforge application name
pub const APP_NAME: &str = "bootforge";
