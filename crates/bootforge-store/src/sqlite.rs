//! Embedded SQLite backend.
//!
//! One `items` table keyed by `(kind, name)` with the raw JSON record in
//! a text column; `depth` is duplicated into its own column so the
//! topological load order is a plain `ORDER BY`. The settings document
//! is just another row under the `settings` kind.

use crate::{record_depth, sort_topological};
use bootforge_types::{ForgeError, ItemKind, Result, Storage};
use parking_lot::Mutex;
use rusqlite::{params, Connection};
use serde_json::Value;
use std::path::Path;
use tracing::debug;

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS items (
    kind  TEXT NOT NULL,
    name  TEXT NOT NULL,
    depth INTEGER NOT NULL DEFAULT 0,
    data  TEXT NOT NULL,
    PRIMARY KEY (kind, name)
);
";

/// SQLite persistence backend.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open (creating if needed) the database at `path`.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| ForgeError::Store(format!("Failed to create {:?}: {}", parent, e)))?;
        }

        let conn = Connection::open(path)
            .map_err(|e| ForgeError::Store(format!("Failed to open {:?}: {}", path, e)))?;
        conn.execute_batch(SCHEMA)
            .map_err(|e| ForgeError::Store(format!("Failed to create schema: {}", e)))?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// An in-memory database, for tests and ephemeral tooling.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()
            .map_err(|e| ForgeError::Store(format!("Failed to open in-memory db: {}", e)))?;
        conn.execute_batch(SCHEMA)
            .map_err(|e| ForgeError::Store(format!("Failed to create schema: {}", e)))?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn upsert(conn: &Connection, kind: ItemKind, name: &str, record: &Value) -> Result<()> {
        let data = serde_json::to_string(record)
            .map_err(|e| ForgeError::Store(format!("Failed to serialize record: {}", e)))?;
        conn.execute(
            "INSERT INTO items (kind, name, depth, data) VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT (kind, name) DO UPDATE SET depth = ?3, data = ?4",
            params![kind.to_string(), name, record_depth(record) as i64, data],
        )
        .map_err(|e| ForgeError::Store(format!("Failed to upsert record: {}", e)))?;
        Ok(())
    }
}

impl Storage for SqliteStore {
    fn name(&self) -> &'static str {
        "sqlite"
    }

    fn serialize_item(&self, kind: ItemKind, name: &str, record: &Value) -> Result<()> {
        let conn = self.conn.lock();
        debug!("upserting {} record '{}'", kind, name);
        Self::upsert(&conn, kind, name, record)
    }

    fn serialize_delete(&self, kind: ItemKind, name: &str) -> Result<()> {
        if kind == ItemKind::Settings {
            return Err(ForgeError::Store(
                "The settings document cannot be deleted".to_string(),
            ));
        }
        let conn = self.conn.lock();
        conn.execute(
            "DELETE FROM items WHERE kind = ?1 AND name = ?2",
            params![kind.to_string(), name],
        )
        .map_err(|e| ForgeError::Store(format!("Failed to delete record: {}", e)))?;
        Ok(())
    }

    fn serialize_collection(&self, kind: ItemKind, records: &[Value]) -> Result<()> {
        let mut conn = self.conn.lock();
        let tx = conn
            .transaction()
            .map_err(|e| ForgeError::Store(format!("Failed to start transaction: {}", e)))?;

        tx.execute("DELETE FROM items WHERE kind = ?1", params![kind.to_string()])
            .map_err(|e| ForgeError::Store(format!("Failed to clear collection: {}", e)))?;

        if kind == ItemKind::Settings {
            // Single document; ignore anything past the first record.
            if let Some(record) = records.first() {
                Self::upsert(&tx, kind, "settings", record)?;
            }
        } else {
            for record in records {
                let name = record
                    .get("name")
                    .and_then(Value::as_str)
                    .ok_or_else(|| ForgeError::Store("Record has no name".to_string()))?;
                Self::upsert(&tx, kind, name, record)?;
            }
        }

        tx.commit()
            .map_err(|e| ForgeError::Store(format!("Failed to commit: {}", e)))
    }

    fn deserialize(&self, kind: ItemKind, topological: bool) -> Result<Vec<Value>> {
        let conn = self.conn.lock();
        let mut stmt = conn
            .prepare("SELECT data FROM items WHERE kind = ?1 ORDER BY depth, name")
            .map_err(|e| ForgeError::Store(format!("Failed to prepare query: {}", e)))?;

        let rows = stmt
            .query_map(params![kind.to_string()], |row| row.get::<_, String>(0))
            .map_err(|e| ForgeError::Store(format!("Failed to query records: {}", e)))?;

        let mut records = Vec::new();
        for row in rows {
            let data = row.map_err(|e| ForgeError::Store(e.to_string()))?;
            let record: Value = serde_json::from_str(&data)
                .map_err(|e| ForgeError::Store(format!("Corrupt record: {}", e)))?;
            records.push(record);
        }

        if topological {
            // Rows already come back depth-ordered; re-sorting keeps the
            // guarantee independent of the SQL above.
            sort_topological(&mut records);
        }

        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_item_round_trip() {
        let store = SqliteStore::open_in_memory().unwrap();
        let record = json!({"name": "fedora", "depth": 0, "kernel": "/boot/vmlinuz"});

        store
            .serialize_item(ItemKind::Distro, "fedora", &record)
            .unwrap();
        let records = store.deserialize(ItemKind::Distro, true).unwrap();
        assert_eq!(records, vec![record]);
    }

    #[test]
    fn test_upsert_replaces() {
        let store = SqliteStore::open_in_memory().unwrap();
        store
            .serialize_item(ItemKind::Repo, "base", &json!({"name": "base", "priority": 99}))
            .unwrap();
        store
            .serialize_item(ItemKind::Repo, "base", &json!({"name": "base", "priority": 50}))
            .unwrap();

        let records = store.deserialize(ItemKind::Repo, false).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0]["priority"], 50);
    }

    #[test]
    fn test_topological_order() {
        let store = SqliteStore::open_in_memory().unwrap();
        store
            .serialize_item(
                ItemKind::Profile,
                "sub",
                &json!({"name": "sub", "depth": 2, "parent": "base"}),
            )
            .unwrap();
        store
            .serialize_item(ItemKind::Profile, "base", &json!({"name": "base", "depth": 1}))
            .unwrap();

        let records = store.deserialize(ItemKind::Profile, true).unwrap();
        assert_eq!(records[0]["name"], "base");
    }

    #[test]
    fn test_settings_short_circuit() {
        let store = SqliteStore::open_in_memory().unwrap();
        let doc = json!({"server": "10.0.0.1"});
        store
            .serialize_collection(ItemKind::Settings, std::slice::from_ref(&doc))
            .unwrap();

        let records = store.deserialize(ItemKind::Settings, true).unwrap();
        assert_eq!(records, vec![doc]);
    }

    #[test]
    fn test_bulk_export_replaces_collection() {
        let store = SqliteStore::open_in_memory().unwrap();
        store
            .serialize_item(ItemKind::Repo, "old", &json!({"name": "old"}))
            .unwrap();
        store
            .serialize_collection(ItemKind::Repo, &[json!({"name": "new"})])
            .unwrap();

        let records = store.deserialize(ItemKind::Repo, false).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0]["name"], "new");
    }
}
