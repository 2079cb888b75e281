//! Error types for bootforge operations.

use crate::enums::ItemKind;
use thiserror::Error;

/// The main error type for bootforge operations.
///
/// Each variant maps to one failure family a caller may want to react to
/// differently: missing objects, rejected values, referential-integrity
/// violations, broken inheritance chains, and the I/O families underneath
/// the persistence and sync layers.
#[derive(Error, Debug)]
pub enum ForgeError {
    /// An object was looked up by name and does not exist
    #[error("{kind} '{name}' not found")]
    NotFound {
        /// Collection kind that was searched
        kind: ItemKind,
        /// Name that was requested
        name: String,
    },

    /// A field value or whole object failed validation
    #[error("Validation error: {0}")]
    Validation(String),

    /// A removal would leave another object pointing at a missing parent
    #[error("removing '{name}' would orphan '{dependent}' (use recursive removal to delete children first)")]
    WouldOrphan {
        /// Object whose removal was requested
        name: String,
        /// Object still referencing it
        dependent: String,
    },

    /// An inheritance chain references an object that no longer exists
    #[error("'{item}' references missing {kind} '{missing}'")]
    OrphanReference {
        /// Object whose chain was being walked
        item: String,
        /// Kind of the missing link
        kind: ItemKind,
        /// Name of the missing link
        missing: String,
    },

    /// Settings / configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Persistence backend error
    #[error("Storage error: {0}")]
    Store(String),

    /// Template rendering error
    #[error("Render error: {0}")]
    Render(String),

    /// Artifact generation error
    #[error("Sync error: {0}")]
    Sync(String),

    /// Trigger discovery/execution error
    #[error("Trigger error: {0}")]
    Trigger(String),

    /// Power management command error
    #[error("Power error: {0}")]
    Power(String),

    /// I/O error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML parsing error
    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// JSON parsing error
    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    /// Internal bug - should never happen in production
    #[error("Bug detected: {0}\n\nThis is an internal error. Please report this issue at:\nhttps://github.com/bootforge/bootforge-rs/issues")]
    Bug(String),

    /// Generic error with context
    #[error("{0}")]
    Other(String),
}

/// A specialized Result type for bootforge operations.
pub type Result<T> = std::result::Result<T, ForgeError>;

/// Helper macro to create and return a ForgeError::Bug
///
/// This should be used for conditions that should never occur
/// in normal operation and indicate a bug in bootforge itself.
///
/// # Example
///
/// ```ignore
/// if some_impossible_condition {
///     bug!("This should never happen: {:?}", condition);
/// }
/// ```
#[macro_export]
macro_rules! bug {
    ($msg:expr) => {
        return Err($crate::ForgeError::Bug($msg.to_string()))
    };
    ($fmt:expr, $($arg:tt)*) => {
        return Err($crate::ForgeError::Bug(format!($fmt, $($arg)*)))
    };
}

/// Helper macro to bail out with a ForgeError
///
/// This is used for expected error conditions.
///
/// # Example
///
/// ```ignore
/// if !valid {
///     bail!(Validation, "invalid value for {}: {}", field, value);
/// }
/// ```
#[macro_export]
macro_rules! bail {
    ($variant:ident, $msg:expr) => {
        return Err($crate::ForgeError::$variant($msg.to_string()))
    };
    ($variant:ident, $fmt:expr, $($arg:tt)*) => {
        return Err($crate::ForgeError::$variant(format!($fmt, $($arg)*)))
    };
    ($msg:expr) => {
        return Err($crate::ForgeError::Other($msg.to_string()))
    };
    ($fmt:expr, $($arg:tt)*) => {
        return Err($crate::ForgeError::Other(format!($fmt, $($arg)*)))
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_display() {
        let err = ForgeError::NotFound {
            kind: ItemKind::Distro,
            name: "fedora".to_string(),
        };
        assert_eq!(err.to_string(), "distro 'fedora' not found");
    }

    #[test]
    fn test_would_orphan_display() {
        let err = ForgeError::WouldOrphan {
            name: "fedora".to_string(),
            dependent: "webserver".to_string(),
        };
        assert!(err.to_string().contains("would orphan 'webserver'"));
    }
}
