//! Core trait definitions for bootforge abstractions.

use crate::enums::ItemKind;
use crate::errors::Result;
use indexmap::IndexMap;
use serde_json::Value;

/// Variable map handed to the template engine.
///
/// Insertion order is preserved so rendered option strings stay stable
/// across runs.
pub type TemplateVars = IndexMap<String, Value>;

/// Trait for persistence backends (file catalog, embedded SQL, ...).
///
/// Records are raw JSON objects carrying at least `name` and `depth`;
/// callers above this layer stay backend-agnostic. `ItemKind::Settings`
/// is a single document, not a collection: `serialize_collection` and
/// `deserialize` short-circuit to one write/read for it.
pub trait Storage: Send + Sync {
    /// The backend name as spelled in the settings document.
    fn name(&self) -> &'static str;

    /// Persist one item record.
    fn serialize_item(&self, kind: ItemKind, name: &str, record: &Value) -> Result<()>;

    /// Remove one item record.
    fn serialize_delete(&self, kind: ItemKind, name: &str) -> Result<()>;

    /// Bulk-export every record of a collection, replacing existing state.
    fn serialize_collection(&self, kind: ItemKind, records: &[Value]) -> Result<()>;

    /// Load every raw record of a collection.
    ///
    /// With `topological` set, records come back sorted by their stored
    /// `depth` ascending so a child is never handed to the caller before
    /// its parent.
    fn deserialize(&self, kind: ItemKind, topological: bool) -> Result<Vec<Value>>;
}

/// Trait for running pre/post hooks around mutations.
///
/// Implementations discover matches for an event path such as
/// `delete/system/pre` and execute them in order. A failing trigger is
/// logged by the implementation and never escalated to the caller.
pub trait TriggerDispatch: Send + Sync {
    /// Run every trigger registered under `event` with positional args.
    fn run(&self, event: &str, args: &[String]) -> Result<()>;
}

/// Incremental artifact regeneration hooks, invoked by the mutation
/// state machine after a successful persist.
///
/// The flat kinds (repo, mgmtclass, package, file) have no boot artifacts
/// of their own and need no hooks.
pub trait LiteSync: Send + Sync {
    /// Regenerate artifacts for a new/changed distro and its descendants.
    fn add_single_distro(&self, name: &str) -> Result<()>;

    /// Regenerate artifacts for a new/changed profile and its descendants.
    fn add_single_profile(&self, name: &str) -> Result<()>;

    /// Regenerate artifacts for a new/changed system.
    fn add_single_system(&self, name: &str) -> Result<()>;

    /// Regenerate artifacts for a new/changed image and its descendants.
    fn add_single_image(&self, name: &str) -> Result<()>;

    /// Drop artifacts belonging to a removed distro.
    fn remove_single_distro(&self, name: &str) -> Result<()>;

    /// Drop artifacts belonging to a removed profile.
    fn remove_single_profile(&self, name: &str) -> Result<()>;

    /// Drop artifacts belonging to a removed system.
    ///
    /// Takes the removed item's raw record: artifact file names are
    /// keyed by interface MACs, which are no longer reachable through
    /// the collection once the removal has been persisted.
    fn remove_single_system(&self, record: &Value) -> Result<()>;

    /// Drop artifacts belonging to a removed image.
    fn remove_single_image(&self, name: &str) -> Result<()>;
}

/// Contract for the templating collaborator.
///
/// The engine is deliberately minimal: text plus a variable map in,
/// rendered text out, with the last render's diagnostics queryable.
/// A richer templating language can be swapped in behind this trait
/// without touching the generation code.
pub trait TemplateEngine: Send + Sync {
    /// Render `text`, substituting variables from `vars`.
    fn render(&self, text: &str, vars: &TemplateVars) -> Result<String>;

    /// Diagnostics recorded during the most recent render
    /// (typically unresolved variable names).
    fn last_errors(&self) -> Vec<String>;
}
