//! A name-keyed registry of items of one kind.

use crate::item::Item;
use bootforge_types::{ForgeError, ItemKind, ObjectName, Result};
use serde_json::Value;
use std::collections::BTreeMap;

/// The in-memory registry of every item of one kind.
///
/// Lookup is by exact name; listing iterates in name order. Structural
/// checks (name validity, duplicates) happen here; semantic validation
/// and referential integrity are the manager's job since they need to
/// see sibling collections.
#[derive(Debug, Clone)]
pub struct Collection<T: Item> {
    listing: BTreeMap<String, T>,
}

impl<T: Item> Default for Collection<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Item> Collection<T> {
    /// An empty collection.
    pub fn new() -> Self {
        Self {
            listing: BTreeMap::new(),
        }
    }

    /// The kind this collection holds.
    pub fn kind(&self) -> ItemKind {
        T::KIND
    }

    /// Look up an item by name.
    pub fn get(&self, name: &str) -> Option<&T> {
        self.listing.get(name)
    }

    /// Whether an item with this name exists.
    pub fn contains(&self, name: &str) -> bool {
        self.listing.contains_key(name)
    }

    /// Number of items.
    pub fn len(&self) -> usize {
        self.listing.len()
    }

    /// Whether the collection is empty.
    pub fn is_empty(&self) -> bool {
        self.listing.is_empty()
    }

    /// Iterate items in name order.
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.listing.values()
    }

    /// Item names in sorted order.
    pub fn names(&self) -> Vec<String> {
        self.listing.keys().cloned().collect()
    }

    /// Insert an item, enforcing name validity and uniqueness.
    ///
    /// `overwrite` is the explicit opt-in to replace an existing item of
    /// the same name.
    pub fn add(&mut self, item: T, overwrite: bool) -> Result<()> {
        if !ObjectName::is_valid(item.name()) {
            return Err(ForgeError::Validation(format!(
                "Invalid {} name '{}'",
                T::KIND,
                item.name()
            )));
        }
        if !overwrite && self.listing.contains_key(item.name()) {
            return Err(ForgeError::Validation(format!(
                "{} '{}' already exists",
                T::KIND,
                item.name()
            )));
        }
        self.listing.insert(item.name().to_string(), item);
        Ok(())
    }

    /// Remove and return an item.
    pub fn take(&mut self, name: &str) -> Result<T> {
        self.listing.remove(name).ok_or_else(|| ForgeError::NotFound {
            kind: T::KIND,
            name: name.to_string(),
        })
    }

    /// Export every item as a raw record, depth ascending so the export
    /// itself is replayable in order.
    pub fn to_records(&self) -> Result<Vec<Value>> {
        let mut items: Vec<&T> = self.listing.values().collect();
        items.sort_by_key(|item| (item.depth(), item.name().to_string()));
        items.iter().map(|item| item.to_map()).collect()
    }

    /// Find items matching all `field == value` pairs against the raw
    /// attribute map.
    pub fn find(&self, criteria: &[(&str, &Value)]) -> Result<Vec<&T>> {
        if criteria.is_empty() {
            return Err(ForgeError::Validation(
                "find requires at least one criterion".to_string(),
            ));
        }
        let mut matches = Vec::new();
        for item in self.listing.values() {
            let map = item.to_map()?;
            if criteria
                .iter()
                .all(|(field, want)| map.get(*field) == Some(*want))
            {
                matches.push(item);
            }
        }
        Ok(matches)
    }
}
