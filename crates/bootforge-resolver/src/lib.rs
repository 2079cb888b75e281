//! # Bootforge Resolver
//!
//! Collapses an item's ancestor chain plus the global settings into one
//! effective, flattened configuration map (the "blend").
//!
//! The chain is walked root to leaf. Per field:
//!
//! - scalars: the nearest descendant's explicitly set value wins; the
//!   inherit sentinel falls through to the next ancestor and finally to
//!   the settings default
//! - mappings (kernel options, metadata): merged key by key; a child
//!   key overrides the same ancestor key, everything else is retained
//! - lists (owners, management classes): concatenated ancestor-then-child
//!   with duplicates removed, first occurrence wins the position
//!
//! A `!key` entry inside an option map cancels `key` inherited from any
//! ancestor and is itself dropped from the result.
//!
//! Blending is pure: the same inputs produce the same output and no item
//! is ever mutated.

#![warn(missing_docs)]
#![warn(clippy::all)]

use bootforge_core::util::data::options_to_string;
use bootforge_items::CollectionManager;
use bootforge_types::{ForgeError, ItemKind, Result, INHERIT_SENTINEL};
use indexmap::IndexMap;
use serde_json::{Map, Value};
use std::collections::HashSet;
use tracing::trace;

/// Option-map fields subject to key-wise merging and `!key` removals.
const OPTION_MAP_FIELDS: [&str; 4] = [
    "kernel_options",
    "kernel_options_post",
    "autoinstall_meta",
    "template_files",
];

/// The effective configuration of one item.
pub type Blended = IndexMap<String, Value>;

/// Blend an item's chain into one effective configuration map.
///
/// With `flatten` set, option maps are additionally collapsed into
/// `key=value key2=value2` strings and the repo list into one
/// space-joined string, a formatting step for kernel command lines and
/// legacy consumers, applied after merging.
///
/// Fails with [`ForgeError::OrphanReference`] when any ancestor link
/// points at a missing object; the item itself stays stored and
/// editable, it just cannot be synced or templated until repaired.
pub fn blend(
    manager: &CollectionManager,
    flatten: bool,
    kind: ItemKind,
    name: &str,
) -> Result<Blended> {
    let chain = grab_chain(manager, kind, name)?;

    // Root to leaf: start from the settings defaults, let each node
    // override on the way down. Keys still carrying their settings
    // default are tracked so the first node that sets a list replaces
    // the default instead of accumulating onto it; map defaults stay
    // additive (a removal marker can still cancel them).
    let mut results: Blended = manager.settings().blend_map();
    let mut at_default: HashSet<String> = results.keys().cloned().collect();
    for node in chain.iter().rev() {
        consolidate(&mut results, node, &mut at_default);
    }

    expand_interfaces(&mut results);
    attach_repo_data(manager, kind, &mut results)?;
    compute_http_server(&mut results);
    add_name_aliases(&mut results);

    if flatten {
        flatten_results(&mut results);
    }

    Ok(results)
}

/// Collect the raw record of every node from the item up to its root.
fn grab_chain(manager: &CollectionManager, kind: ItemKind, name: &str) -> Result<Vec<Map<String, Value>>> {
    let first = match manager.item_record(kind, name)? {
        Value::Object(map) => map,
        other => {
            return Err(ForgeError::Validation(format!(
                "Record of {} '{}' is not a mapping: {}",
                kind, name, other
            )))
        }
    };

    let mut chain = vec![first];
    let mut cursor = (kind, name.to_string());
    let mut visited: HashSet<(ItemKind, String)> = HashSet::new();
    visited.insert(cursor.clone());

    while let Some(parent) = manager.parent_of(cursor.0, &cursor.1)? {
        trace!("chain: {} '{}' -> {} '{}'", cursor.0, cursor.1, parent.kind, parent.name);
        if !visited.insert((parent.kind, parent.name.clone())) {
            return Err(ForgeError::Validation(format!(
                "Inheritance cycle detected at {} '{}'",
                parent.kind, parent.name
            )));
        }
        let record = manager.item_record(parent.kind, &parent.name).map_err(|_| {
            ForgeError::OrphanReference {
                item: name.to_string(),
                kind: parent.kind,
                missing: parent.name.clone(),
            }
        })?;
        match record {
            Value::Object(map) => chain.push(map),
            other => {
                return Err(ForgeError::Validation(format!(
                    "Record of {} '{}' is not a mapping: {}",
                    parent.kind, parent.name, other
                )))
            }
        }
        cursor = (parent.kind, parent.name);
    }

    Ok(chain)
}

/// Merge one node's data over the aggregate, the node winning.
fn consolidate(results: &mut Blended, node: &Map<String, Value>, at_default: &mut HashSet<String>) {
    for (field, value) in node {
        // The inherit sentinel never overrides a supernode.
        if value.as_str() == Some(INHERIT_SENTINEL) {
            continue;
        }
        // `distro` binds at the topmost profile that sets it; sub-profiles
        // carry an empty field that must not clobber it.
        if field == "distro" && results.contains_key("distro") {
            continue;
        }

        let merged = match (results.get(field), value) {
            // interweave mappings: the node's keys win, everything else
            // is retained
            (Some(Value::Object(existing)), Value::Object(incoming)) => {
                let mut combined = existing.clone();
                for (key, val) in incoming {
                    combined.insert(key.clone(), val.clone());
                }
                Value::Object(combined)
            }
            // lists concatenate ancestor-then-node, deduplicated; a list
            // still at its settings default is replaced, not extended
            (Some(Value::Array(existing)), Value::Array(incoming))
                if !at_default.contains(field) =>
            {
                let mut combined = existing.clone();
                combined.extend(incoming.iter().cloned());
                Value::Array(uniquify(combined))
            }
            // scalars (and type changes) overwrite
            _ => value.clone(),
        };
        results.insert(field.clone(), merged);
        at_default.remove(field);
    }

    for field in OPTION_MAP_FIELDS {
        apply_removals(results, field);
    }
}

/// Remove duplicates, keeping the first occurrence of each element.
fn uniquify(values: Vec<Value>) -> Vec<Value> {
    let mut seen: Vec<Value> = Vec::new();
    for value in values {
        if !seen.contains(&value) {
            seen.push(value);
        }
    }
    seen
}

/// A `!foo` key deletes `foo` and itself, letting a child cancel an
/// option set higher in the chain.
fn apply_removals(results: &mut Blended, field: &str) {
    let Some(Value::Object(map)) = results.get_mut(field) else {
        return;
    };
    let markers: Vec<String> = map
        .keys()
        .filter(|k| k.starts_with('!') && k.len() > 1)
        .cloned()
        .collect();
    for marker in markers {
        map.remove(&marker[1..]);
        map.remove(&marker);
    }
}

/// Make interface fields reachable as plain `<field>_<ifname>` template
/// variables.
fn expand_interfaces(results: &mut Blended) {
    let interfaces = match results.get("interfaces") {
        Some(Value::Object(map)) => map.clone(),
        _ => return,
    };
    for (if_name, interface) in &interfaces {
        if let Value::Object(fields) = interface {
            for (field, value) in fields {
                results.insert(format!("{}_{}", field, if_name), value.clone());
            }
        }
    }
}

/// Expand attached repo names into their full records, lowest priority
/// first, under `repo_data`.
fn attach_repo_data(manager: &CollectionManager, kind: ItemKind, results: &mut Blended) -> Result<()> {
    if !matches!(kind, ItemKind::Profile | ItemKind::System) {
        return Ok(());
    }
    let names: Vec<String> = match results.get("repos") {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(Value::as_str)
            .map(str::to_string)
            .collect(),
        _ => Vec::new(),
    };

    let mut records: Vec<Value> = Vec::new();
    for name in names {
        // a dangling repo name is skipped, not fatal: repos are flat
        // references, never part of the chain
        if let Ok(record) = manager.item_record(ItemKind::Repo, &name) {
            records.push(record);
        }
    }
    records.sort_by_key(|r| r.get("priority").and_then(Value::as_i64).unwrap_or(99));
    results.insert("repo_data".to_string(), Value::Array(records));
    Ok(())
}

/// Derive `http_server` from the blended `server`/`http_port` pair.
fn compute_http_server(results: &mut Blended) {
    let server = results
        .get("server")
        .and_then(Value::as_str)
        .unwrap_or("127.0.0.1")
        .to_string();
    let port = results.get("http_port").and_then(Value::as_u64).unwrap_or(80);
    let http_server = if port == 80 {
        server
    } else {
        format!("{}:{}", server, port)
    };
    results.insert("http_server".to_string(), Value::String(http_server));
}

/// Add the `distro_name`/`profile_name`/`system_name`/`image_name`
/// aliases templates use regardless of which object they render for.
fn add_name_aliases(results: &mut Blended) {
    let name = results
        .get("name")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();

    if results.contains_key("interfaces") {
        // a system
        results.insert("system_name".to_string(), Value::String(name));
        if let Some(profile) = results.get("profile").cloned() {
            results.insert("profile_name".to_string(), profile);
        }
        if let Some(distro) = results.get("distro").cloned() {
            results.insert("distro_name".to_string(), distro);
        } else if let Some(image) = results.get("image").cloned() {
            results.insert("distro_name".to_string(), Value::String("N/A".to_string()));
            results.insert("image_name".to_string(), image);
        }
    } else if results.contains_key("distro") {
        // a profile
        results.insert("profile_name".to_string(), Value::String(name));
        if let Some(distro) = results.get("distro").cloned() {
            results.insert("distro_name".to_string(), distro);
        }
    } else if results.contains_key("kernel") {
        // a distro
        results.insert("distro_name".to_string(), Value::String(name));
    } else if results.contains_key("file") {
        // an image
        results.insert("distro_name".to_string(), Value::String("N/A".to_string()));
        results.insert("image_name".to_string(), Value::String(name));
    }
}

/// Collapse option maps into delimited strings and the repo list into
/// one space-joined string.
fn flatten_results(results: &mut Blended) {
    for field in OPTION_MAP_FIELDS {
        if let Some(Value::Object(map)) = results.get(field).cloned() {
            let ordered: IndexMap<String, Value> = map.into_iter().collect();
            results.insert(field.to_string(), Value::String(options_to_string(&ordered)));
        }
    }
    if let Some(Value::Array(repos)) = results.get("repos").cloned() {
        let joined = repos
            .iter()
            .filter_map(Value::as_str)
            .collect::<Vec<_>>()
            .join(" ");
        results.insert("repos".to_string(), Value::String(joined));
    }
}
