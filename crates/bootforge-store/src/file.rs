//! One-record-per-file catalog backend.
//!
//! Layout: `<root>/<kind-plural>/<name>.yaml`, plus `<root>/settings.yaml`
//! as the single settings document. Records are YAML so an operator can
//! diff and hand-edit them. Every operation takes an exclusive flock on
//! `<root>/.lock` so concurrent daemons cannot interleave writes, and
//! every write goes through a same-directory tempfile rename with an
//! fsync first, so a read-back after a write always sees the new record.

use crate::sort_topological;
use bootforge_types::{ForgeError, ItemKind, Result, Storage};
use fs2::FileExt;
use serde_json::Value;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::debug;

/// File-catalog persistence backend.
pub struct FileCatalog {
    root: PathBuf,
    lock_path: PathBuf,
}

/// Held flock on the catalog; unlocks on drop.
struct CatalogLock(File);

impl Drop for CatalogLock {
    fn drop(&mut self) {
        let _ = fs2::FileExt::unlock(&self.0);
    }
}

impl FileCatalog {
    /// Open (creating if needed) a catalog rooted at `root`.
    pub fn open(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(&root)
            .map_err(|e| ForgeError::Store(format!("Failed to create {:?}: {}", root, e)))?;

        let lock_path = root.join(".lock");
        if !lock_path.exists() {
            File::create(&lock_path)
                .map_err(|e| ForgeError::Store(format!("Failed to create lock file: {}", e)))?;
        }

        Ok(Self { root, lock_path })
    }

    fn grab_lock(&self) -> Result<CatalogLock> {
        let handle = File::open(&self.lock_path)
            .map_err(|e| ForgeError::Store(format!("Failed to open lock file: {}", e)))?;
        handle
            .lock_exclusive()
            .map_err(|e| ForgeError::Store(format!("Failed to lock catalog: {}", e)))?;
        Ok(CatalogLock(handle))
    }

    fn kind_dir(&self, kind: ItemKind) -> PathBuf {
        self.root.join(kind.collection_dir())
    }

    fn record_path(&self, kind: ItemKind, name: &str) -> PathBuf {
        self.kind_dir(kind).join(format!("{}.yaml", name))
    }

    fn settings_path(&self) -> PathBuf {
        self.root.join("settings.yaml")
    }

    /// Serialize + fsync + rename so no partial record is ever visible.
    fn write_record(&self, path: &Path, record: &Value) -> Result<()> {
        let dir = path
            .parent()
            .ok_or_else(|| ForgeError::Store(format!("Record path {:?} has no parent", path)))?;
        fs::create_dir_all(dir)
            .map_err(|e| ForgeError::Store(format!("Failed to create {:?}: {}", dir, e)))?;

        let text = serde_yaml::to_string(record)
            .map_err(|e| ForgeError::Store(format!("Failed to serialize record: {}", e)))?;

        let mut temp = tempfile::NamedTempFile::new_in(dir)
            .map_err(|e| ForgeError::Store(format!("Failed to create temp file: {}", e)))?;
        temp.write_all(text.as_bytes())
            .map_err(|e| ForgeError::Store(format!("Failed to write record: {}", e)))?;
        temp.as_file()
            .sync_all()
            .map_err(|e| ForgeError::Store(format!("Failed to flush record: {}", e)))?;
        temp.persist(path)
            .map_err(|e| ForgeError::Store(format!("Failed to publish {:?}: {}", path, e)))?;

        Ok(())
    }

    fn read_record(&self, path: &Path) -> Result<Value> {
        let text = fs::read_to_string(path)
            .map_err(|e| ForgeError::Store(format!("Failed to read {:?}: {}", path, e)))?;
        serde_yaml::from_str(&text)
            .map_err(|e| ForgeError::Store(format!("Failed to parse {:?}: {}", path, e)))
    }
}

impl Storage for FileCatalog {
    fn name(&self) -> &'static str {
        "file"
    }

    fn serialize_item(&self, kind: ItemKind, name: &str, record: &Value) -> Result<()> {
        let _lock = self.grab_lock()?;
        let path = if kind == ItemKind::Settings {
            self.settings_path()
        } else {
            self.record_path(kind, name)
        };
        debug!("writing {} record {:?}", kind, path);
        self.write_record(&path, record)
    }

    fn serialize_delete(&self, kind: ItemKind, name: &str) -> Result<()> {
        let _lock = self.grab_lock()?;
        if kind == ItemKind::Settings {
            return Err(ForgeError::Store(
                "The settings document cannot be deleted".to_string(),
            ));
        }
        let path = self.record_path(kind, name);
        debug!("deleting {} record {:?}", kind, path);
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(ForgeError::Store(format!(
                "Failed to delete {:?}: {}",
                path, e
            ))),
        }
    }

    fn serialize_collection(&self, kind: ItemKind, records: &[Value]) -> Result<()> {
        let _lock = self.grab_lock()?;

        // Settings short-circuit to the single document.
        if kind == ItemKind::Settings {
            let record = records.first().cloned().unwrap_or(Value::Null);
            return self.write_record(&self.settings_path(), &record);
        }

        let dir = self.kind_dir(kind);
        fs::create_dir_all(&dir)
            .map_err(|e| ForgeError::Store(format!("Failed to create {:?}: {}", dir, e)))?;

        let mut keep: Vec<String> = Vec::new();
        for record in records {
            let name = record
                .get("name")
                .and_then(Value::as_str)
                .ok_or_else(|| ForgeError::Store("Record has no name".to_string()))?;
            self.write_record(&self.record_path(kind, name), record)?;
            keep.push(format!("{}.yaml", name));
        }

        // A bulk export replaces the collection: drop stale records.
        for entry in fs::read_dir(&dir)
            .map_err(|e| ForgeError::Store(format!("Failed to list {:?}: {}", dir, e)))?
        {
            let entry = entry.map_err(|e| ForgeError::Store(e.to_string()))?;
            let file_name = entry.file_name().to_string_lossy().to_string();
            if file_name.ends_with(".yaml") && !keep.contains(&file_name) {
                fs::remove_file(entry.path())
                    .map_err(|e| ForgeError::Store(format!("Failed to prune: {}", e)))?;
            }
        }

        Ok(())
    }

    fn deserialize(&self, kind: ItemKind, topological: bool) -> Result<Vec<Value>> {
        let _lock = self.grab_lock()?;

        if kind == ItemKind::Settings {
            let path = self.settings_path();
            if !path.exists() {
                return Ok(Vec::new());
            }
            return Ok(vec![self.read_record(&path)?]);
        }

        let dir = self.kind_dir(kind);
        if !dir.exists() {
            return Ok(Vec::new());
        }

        let mut records = Vec::new();
        for entry in fs::read_dir(&dir)
            .map_err(|e| ForgeError::Store(format!("Failed to list {:?}: {}", dir, e)))?
        {
            let entry = entry.map_err(|e| ForgeError::Store(e.to_string()))?;
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) == Some("yaml") {
                records.push(self.read_record(&path)?);
            }
        }

        if topological {
            sort_topological(&mut records);
        } else {
            records.sort_by_key(|r| {
                r.get("name")
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string()
            });
        }

        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn catalog() -> (TempDir, FileCatalog) {
        let temp = TempDir::new().unwrap();
        let catalog = FileCatalog::open(temp.path().join("collections")).unwrap();
        (temp, catalog)
    }

    #[test]
    fn test_item_round_trip() {
        let (_temp, catalog) = catalog();
        let record = json!({"name": "fedora", "depth": 0, "kernel": "/boot/vmlinuz"});

        catalog
            .serialize_item(ItemKind::Distro, "fedora", &record)
            .unwrap();
        let records = catalog.deserialize(ItemKind::Distro, true).unwrap();
        assert_eq!(records, vec![record]);
    }

    #[test]
    fn test_records_are_yaml_files() {
        let (temp, catalog) = catalog();
        catalog
            .serialize_item(ItemKind::Profile, "web", &json!({"name": "web", "depth": 1}))
            .unwrap();

        let path = temp
            .path()
            .join("collections")
            .join("profiles")
            .join("web.yaml");
        let text = fs::read_to_string(path).unwrap();
        assert!(text.contains("name: web"));
    }

    #[test]
    fn test_delete_then_idempotent() {
        let (_temp, catalog) = catalog();
        catalog
            .serialize_item(ItemKind::System, "box1", &json!({"name": "box1", "depth": 2}))
            .unwrap();
        catalog.serialize_delete(ItemKind::System, "box1").unwrap();
        // deleting again is fine
        catalog.serialize_delete(ItemKind::System, "box1").unwrap();
        assert!(catalog.deserialize(ItemKind::System, true).unwrap().is_empty());
    }

    #[test]
    fn test_topological_load_reorders_children() {
        let (_temp, catalog) = catalog();
        // child written first
        catalog
            .serialize_item(
                ItemKind::Profile,
                "sub",
                &json!({"name": "sub", "depth": 2, "parent": "base"}),
            )
            .unwrap();
        catalog
            .serialize_item(ItemKind::Profile, "base", &json!({"name": "base", "depth": 1}))
            .unwrap();

        let records = catalog.deserialize(ItemKind::Profile, true).unwrap();
        assert_eq!(records[0]["name"], "base");
        assert_eq!(records[1]["name"], "sub");
    }

    #[test]
    fn test_settings_single_document() {
        let (_temp, catalog) = catalog();
        let doc = json!({"server": "10.0.0.1", "http_port": 80});
        catalog
            .serialize_collection(ItemKind::Settings, std::slice::from_ref(&doc))
            .unwrap();

        let records = catalog.deserialize(ItemKind::Settings, true).unwrap();
        assert_eq!(records, vec![doc]);
    }

    #[test]
    fn test_bulk_export_prunes_stale_records() {
        let (_temp, catalog) = catalog();
        catalog
            .serialize_item(ItemKind::Repo, "old", &json!({"name": "old", "depth": 0}))
            .unwrap();

        catalog
            .serialize_collection(ItemKind::Repo, &[json!({"name": "new", "depth": 0})])
            .unwrap();

        let records = catalog.deserialize(ItemKind::Repo, true).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0]["name"], "new");
    }
}
