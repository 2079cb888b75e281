//! # Bootforge Store
//!
//! Persistence backends for bootforge collections.
//!
//! Two interchangeable backends implement the
//! [`Storage`](bootforge_types::Storage) contract:
//!
//! - [`FileCatalog`]: one human-diffable YAML record per item under a
//!   per-kind directory
//! - [`SqliteStore`]: one embedded SQLite database with a single items
//!   table
//!
//! Both honor the same four-operation contract and the same
//! depth-ordering guarantee on topological load, so everything above
//! this crate is backend-agnostic. The backend is resolved once at
//! startup from the settings document via [`open_storage`].

#![warn(missing_docs)]
#![warn(clippy::all)]

mod file;
mod sqlite;

pub use file::FileCatalog;
pub use sqlite::SqliteStore;

use bootforge_core::config::Settings;
use bootforge_types::{ForgeError, Result, Storage};
use serde_json::Value;

/// Resolve the configured backend into a trait object, once, at startup.
pub fn open_storage(settings: &Settings) -> Result<Box<dyn Storage>> {
    match settings.storage_backend.as_str() {
        "file" => Ok(Box::new(FileCatalog::open(&settings.storage_dir)?)),
        "sqlite" => Ok(Box::new(SqliteStore::open(&settings.database_path)?)),
        other => Err(ForgeError::Config(format!(
            "Unknown storage backend '{}': expected 'file' or 'sqlite'",
            other
        ))),
    }
}

/// Read the integer `depth` out of a raw record, defaulting to zero.
///
/// Depth is derived bookkeeping used purely to order deserialization;
/// a record without one is treated as a root.
pub(crate) fn record_depth(record: &Value) -> u64 {
    record.get("depth").and_then(Value::as_u64).unwrap_or(0)
}

/// Sort raw records by stored depth ascending, name as tiebreaker, so a
/// child is never handed out before its parent.
pub(crate) fn sort_topological(records: &mut [Value]) {
    records.sort_by(|a, b| {
        record_depth(a).cmp(&record_depth(b)).then_with(|| {
            let name_of = |v: &Value| {
                v.get("name")
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string()
            };
            name_of(a).cmp(&name_of(b))
        })
    });
}
