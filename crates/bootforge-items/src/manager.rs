//! The collection manager: single source of truth for every collection
//! plus the global settings.
//!
//! Every mutation runs the same state machine:
//!
//! `Idle -> Validate -> Persist -> TriggerPre -> GenerateArtifacts ->
//! TriggerPost -> Idle`
//!
//! A failure at Validate or Persist aborts before any trigger or
//! artifact work and leaves nothing committed, in memory or on disk. A
//! failure during artifact generation leaves the persisted data
//! committed and surfaces the error; a full sync is the recovery path.
//! Trigger failures are logged and never escalated.

use crate::collection::Collection;
use crate::distro::Distro;
use crate::file::FileResource;
use crate::image::Image;
use crate::item::{Item, ParentRef};
use crate::mgmtclass::MgmtClass;
use crate::package::Package;
use crate::profile::Profile;
use crate::repo::Repo;
use crate::system::System;
use bootforge_core::config::Settings;
use bootforge_types::{
    trigger_path, ForgeError, ItemKind, LiteSync, ObjectName, Result, Storage, TriggerDispatch,
    TriggerEvent, TriggerPhase,
};
use parking_lot::{Mutex, RwLock, RwLockReadGuard};
use serde_json::Value;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, warn};

/// Options controlling one add/save mutation.
#[derive(Debug, Clone)]
pub struct SaveOptions {
    /// Persist to the backend (false = in-memory only)
    pub save: bool,
    /// Replace an existing item of the same name
    pub overwrite: bool,
    /// Run add pre/post triggers
    pub with_triggers: bool,
    /// Run incremental artifact generation
    pub with_sync: bool,
}

impl Default for SaveOptions {
    fn default() -> Self {
        Self {
            save: true,
            overwrite: false,
            with_triggers: true,
            with_sync: true,
        }
    }
}

/// Options controlling one remove mutation.
#[derive(Debug, Clone)]
pub struct RemoveOptions {
    /// Remove referencing children depth-first instead of failing
    pub recursive: bool,
    /// Remove the backend record (false = in-memory only)
    pub with_delete: bool,
    /// Run delete pre/post triggers
    pub with_triggers: bool,
    /// Run incremental artifact removal
    pub with_sync: bool,
}

impl Default for RemoveOptions {
    fn default() -> Self {
        Self {
            recursive: false,
            with_delete: true,
            with_triggers: true,
            with_sync: true,
        }
    }
}

/// Owns all collections, the settings document, the active persistence
/// backend, and the trigger/lite-sync collaborators.
///
/// Construct once, share via `Arc`; `load()` is guarded so repeated
/// calls are no-ops. One manager-wide mutex serializes every mutation
/// and bulk serialization so concurrent writers cannot corrupt the
/// backend or violate depth ordering.
pub struct CollectionManager {
    settings: RwLock<Settings>,
    storage: Box<dyn Storage>,

    distros: RwLock<Collection<Distro>>,
    profiles: RwLock<Collection<Profile>>,
    systems: RwLock<Collection<System>>,
    repos: RwLock<Collection<Repo>>,
    images: RwLock<Collection<Image>>,
    mgmtclasses: RwLock<Collection<MgmtClass>>,
    packages: RwLock<Collection<Package>>,
    files: RwLock<Collection<FileResource>>,

    triggers: RwLock<Option<Arc<dyn TriggerDispatch>>>,
    lite_sync: RwLock<Option<Arc<dyn LiteSync>>>,

    loaded: AtomicBool,
    write_lock: Mutex<()>,
}

impl CollectionManager {
    /// Create a manager over the given settings and backend.
    ///
    /// Nothing is loaded yet; call [`CollectionManager::load`].
    pub fn new(settings: Settings, storage: Box<dyn Storage>) -> Self {
        Self {
            settings: RwLock::new(settings),
            storage,
            distros: RwLock::new(Collection::new()),
            profiles: RwLock::new(Collection::new()),
            systems: RwLock::new(Collection::new()),
            repos: RwLock::new(Collection::new()),
            images: RwLock::new(Collection::new()),
            mgmtclasses: RwLock::new(Collection::new()),
            packages: RwLock::new(Collection::new()),
            files: RwLock::new(Collection::new()),
            triggers: RwLock::new(None),
            lite_sync: RwLock::new(None),
            loaded: AtomicBool::new(false),
            write_lock: Mutex::new(()),
        }
    }

    /// Attach the trigger runner.
    pub fn set_triggers(&self, triggers: Arc<dyn TriggerDispatch>) {
        *self.triggers.write() = Some(triggers);
    }

    /// Attach the incremental sync observer.
    pub fn set_lite_sync(&self, lite_sync: Arc<dyn LiteSync>) {
        *self.lite_sync.write() = Some(lite_sync);
    }

    /// Load every collection from the backend, parents before children.
    ///
    /// Init-once: repeated calls return immediately.
    pub fn load(&self) -> Result<()> {
        let _guard = self.write_lock.lock();
        if self.loaded.load(Ordering::SeqCst) {
            return Ok(());
        }

        if let Some(doc) = self.storage.deserialize(ItemKind::Settings, false)?.first() {
            *self.settings.write() = Settings::from_record(doc)?;
        }

        for kind in ItemKind::COLLECTIONS {
            let records = self.storage.deserialize(kind, true)?;
            debug!("loading {} {} records", records.len(), kind);
            for record in &records {
                self.insert_loaded(kind, record)?;
            }
        }

        self.loaded.store(true, Ordering::SeqCst);
        Ok(())
    }

    /// Persist the settings document and every collection in the fixed
    /// parents-first order.
    pub fn serialize(&self) -> Result<()> {
        let _guard = self.write_lock.lock();
        let settings_doc = self.settings.read().to_record()?;
        self.storage
            .serialize_collection(ItemKind::Settings, std::slice::from_ref(&settings_doc))?;

        for kind in ItemKind::COLLECTIONS {
            let records = self.records_of(kind)?;
            self.storage.serialize_collection(kind, &records)?;
        }
        Ok(())
    }

    /// A snapshot of the current settings.
    pub fn settings(&self) -> Settings {
        self.settings.read().clone()
    }

    /// Replace and persist the settings document.
    pub fn update_settings(&self, settings: Settings) -> Result<()> {
        let _guard = self.write_lock.lock();
        let doc = settings.to_record()?;
        self.storage
            .serialize_collection(ItemKind::Settings, std::slice::from_ref(&doc))?;
        *self.settings.write() = settings;
        Ok(())
    }

    // ------------------------------------------------------------------
    // Typed collection access

    /// The distros collection.
    pub fn distros(&self) -> RwLockReadGuard<'_, Collection<Distro>> {
        self.distros.read()
    }

    /// The profiles collection.
    pub fn profiles(&self) -> RwLockReadGuard<'_, Collection<Profile>> {
        self.profiles.read()
    }

    /// The systems collection.
    pub fn systems(&self) -> RwLockReadGuard<'_, Collection<System>> {
        self.systems.read()
    }

    /// The repos collection.
    pub fn repos(&self) -> RwLockReadGuard<'_, Collection<Repo>> {
        self.repos.read()
    }

    /// The images collection.
    pub fn images(&self) -> RwLockReadGuard<'_, Collection<Image>> {
        self.images.read()
    }

    /// The management class collection.
    pub fn mgmtclasses(&self) -> RwLockReadGuard<'_, Collection<MgmtClass>> {
        self.mgmtclasses.read()
    }

    /// The package resource collection.
    pub fn packages(&self) -> RwLockReadGuard<'_, Collection<Package>> {
        self.packages.read()
    }

    /// The file resource collection.
    pub fn files(&self) -> RwLockReadGuard<'_, Collection<FileResource>> {
        self.files.read()
    }

    // ------------------------------------------------------------------
    // Record-level access (kind-erased, used by the resolver and CLI)

    /// Whether an item exists.
    pub fn contains(&self, kind: ItemKind, name: &str) -> bool {
        match kind {
            ItemKind::Distro => self.distros.read().contains(name),
            ItemKind::Profile => self.profiles.read().contains(name),
            ItemKind::System => self.systems.read().contains(name),
            ItemKind::Repo => self.repos.read().contains(name),
            ItemKind::Image => self.images.read().contains(name),
            ItemKind::MgmtClass => self.mgmtclasses.read().contains(name),
            ItemKind::Package => self.packages.read().contains(name),
            ItemKind::File => self.files.read().contains(name),
            ItemKind::Settings => false,
        }
    }

    /// The raw attribute map of one item.
    pub fn item_record(&self, kind: ItemKind, name: &str) -> Result<Value> {
        let not_found = || ForgeError::NotFound {
            kind,
            name: name.to_string(),
        };
        match kind {
            ItemKind::Distro => self.distros.read().get(name).ok_or_else(not_found)?.to_map(),
            ItemKind::Profile => self.profiles.read().get(name).ok_or_else(not_found)?.to_map(),
            ItemKind::System => self.systems.read().get(name).ok_or_else(not_found)?.to_map(),
            ItemKind::Repo => self.repos.read().get(name).ok_or_else(not_found)?.to_map(),
            ItemKind::Image => self.images.read().get(name).ok_or_else(not_found)?.to_map(),
            ItemKind::MgmtClass => {
                self.mgmtclasses.read().get(name).ok_or_else(not_found)?.to_map()
            }
            ItemKind::Package => self.packages.read().get(name).ok_or_else(not_found)?.to_map(),
            ItemKind::File => self.files.read().get(name).ok_or_else(not_found)?.to_map(),
            ItemKind::Settings => Err(not_found()),
        }
    }

    /// The logical parent of an item, if any.
    pub fn parent_of(&self, kind: ItemKind, name: &str) -> Result<Option<ParentRef>> {
        let not_found = || ForgeError::NotFound {
            kind,
            name: name.to_string(),
        };
        match kind {
            ItemKind::Distro => {
                self.distros.read().get(name).ok_or_else(not_found)?;
                Ok(None)
            }
            ItemKind::Profile => Ok(self
                .profiles
                .read()
                .get(name)
                .ok_or_else(not_found)?
                .parent_ref()),
            ItemKind::System => Ok(self
                .systems
                .read()
                .get(name)
                .ok_or_else(not_found)?
                .parent_ref()),
            ItemKind::Image => {
                self.images.read().get(name).ok_or_else(not_found)?;
                Ok(None)
            }
            _ => Ok(None),
        }
    }

    /// Items whose logical parent is `(kind, name)`.
    pub fn children_of(&self, kind: ItemKind, name: &str) -> Vec<(ItemKind, String)> {
        let target = ParentRef::new(kind, name);
        let mut children = Vec::new();
        for profile in self.profiles.read().iter() {
            if profile.parent_ref().as_ref() == Some(&target) {
                children.push((ItemKind::Profile, profile.name().to_string()));
            }
        }
        for system in self.systems.read().iter() {
            if system.parent_ref().as_ref() == Some(&target) {
                children.push((ItemKind::System, system.name().to_string()));
            }
        }
        children
    }

    fn depth_of(&self, kind: ItemKind, name: &str) -> Option<u32> {
        match kind {
            ItemKind::Distro => self.distros.read().get(name).map(|i| i.depth()),
            ItemKind::Profile => self.profiles.read().get(name).map(|i| i.depth()),
            ItemKind::System => self.systems.read().get(name).map(|i| i.depth()),
            ItemKind::Image => self.images.read().get(name).map(|i| i.depth()),
            _ => None,
        }
    }

    fn records_of(&self, kind: ItemKind) -> Result<Vec<Value>> {
        match kind {
            ItemKind::Distro => self.distros.read().to_records(),
            ItemKind::Profile => self.profiles.read().to_records(),
            ItemKind::System => self.systems.read().to_records(),
            ItemKind::Repo => self.repos.read().to_records(),
            ItemKind::Image => self.images.read().to_records(),
            ItemKind::MgmtClass => self.mgmtclasses.read().to_records(),
            ItemKind::Package => self.packages.read().to_records(),
            ItemKind::File => self.files.read().to_records(),
            ItemKind::Settings => Ok(Vec::new()),
        }
    }

    // ------------------------------------------------------------------
    // Mutations

    /// Add (or overwrite) a distro.
    pub fn add_distro(&self, distro: Distro, opts: &SaveOptions) -> Result<()> {
        let _guard = self.write_lock.lock();
        self.add_typed(&self.distros, distro, opts)
    }

    /// Add (or overwrite) a profile.
    pub fn add_profile(&self, profile: Profile, opts: &SaveOptions) -> Result<()> {
        let _guard = self.write_lock.lock();
        self.add_typed(&self.profiles, profile, opts)
    }

    /// Add (or overwrite) a system.
    pub fn add_system(&self, system: System, opts: &SaveOptions) -> Result<()> {
        let _guard = self.write_lock.lock();
        self.add_typed(&self.systems, system, opts)
    }

    /// Add (or overwrite) a repo.
    pub fn add_repo(&self, repo: Repo, opts: &SaveOptions) -> Result<()> {
        let _guard = self.write_lock.lock();
        self.add_typed(&self.repos, repo, opts)
    }

    /// Add (or overwrite) an image.
    pub fn add_image(&self, image: Image, opts: &SaveOptions) -> Result<()> {
        let _guard = self.write_lock.lock();
        self.add_typed(&self.images, image, opts)
    }

    /// Add (or overwrite) a management class.
    pub fn add_mgmtclass(&self, mgmtclass: MgmtClass, opts: &SaveOptions) -> Result<()> {
        let _guard = self.write_lock.lock();
        self.add_typed(&self.mgmtclasses, mgmtclass, opts)
    }

    /// Add (or overwrite) a package resource.
    pub fn add_package(&self, package: Package, opts: &SaveOptions) -> Result<()> {
        let _guard = self.write_lock.lock();
        self.add_typed(&self.packages, package, opts)
    }

    /// Add (or overwrite) a file resource.
    pub fn add_file(&self, file: FileResource, opts: &SaveOptions) -> Result<()> {
        let _guard = self.write_lock.lock();
        self.add_typed(&self.files, file, opts)
    }

    /// Remove an item of any kind.
    pub fn remove(&self, kind: ItemKind, name: &str, opts: &RemoveOptions) -> Result<()> {
        let _guard = self.write_lock.lock();
        self.remove_inner(kind, name, opts)
    }

    fn add_typed<T: Item>(
        &self,
        cell: &RwLock<Collection<T>>,
        mut item: T,
        opts: &SaveOptions,
    ) -> Result<()> {
        // Validate
        ObjectName::new(item.name())?;
        item.validate()?;
        if let Some(parent) = item.parent_ref() {
            if parent.kind == T::KIND && parent.name == item.name() {
                return Err(ForgeError::Validation(format!(
                    "{} '{}' cannot be its own parent",
                    T::KIND,
                    item.name()
                )));
            }
            if !self.contains(parent.kind, &parent.name) {
                return Err(ForgeError::OrphanReference {
                    item: item.name().to_string(),
                    kind: parent.kind,
                    missing: parent.name,
                });
            }
            let parent_depth = self.depth_of(parent.kind, &parent.name).unwrap_or(0);
            item.set_depth(parent_depth + 1);
        } else {
            item.set_depth(0);
        }
        if !opts.overwrite && cell.read().contains(item.name()) {
            return Err(ForgeError::Validation(format!(
                "{} '{}' already exists",
                T::KIND,
                item.name()
            )));
        }
        item.base_mut().touch();

        // Persist; the in-memory commit only happens once the backend
        // write succeeded, so no partial commit is observable.
        let name = item.name().to_string();
        if opts.save {
            self.storage
                .serialize_item(T::KIND, &name, &item.to_map()?)?;
        }
        cell.write().add(item, true)?;

        // TriggerPre
        if opts.with_triggers {
            self.fire_trigger(TriggerEvent::Add, T::KIND, TriggerPhase::Pre, &name);
        }

        // GenerateArtifacts
        let generated = if opts.with_sync {
            self.lite_add(T::KIND, &name)
        } else {
            Ok(())
        };

        // TriggerPost
        if opts.with_triggers {
            self.fire_trigger(TriggerEvent::Add, T::KIND, TriggerPhase::Post, &name);
        }

        generated
    }

    fn remove_inner(&self, kind: ItemKind, name: &str, opts: &RemoveOptions) -> Result<()> {
        match kind {
            ItemKind::Distro => self.remove_typed(&self.distros, name, opts),
            ItemKind::Profile => self.remove_typed(&self.profiles, name, opts),
            ItemKind::System => self.remove_typed(&self.systems, name, opts),
            ItemKind::Repo => self.remove_typed(&self.repos, name, opts),
            ItemKind::Image => self.remove_typed(&self.images, name, opts),
            ItemKind::MgmtClass => self.remove_typed(&self.mgmtclasses, name, opts),
            ItemKind::Package => self.remove_typed(&self.packages, name, opts),
            ItemKind::File => self.remove_typed(&self.files, name, opts),
            ItemKind::Settings => Err(ForgeError::Validation(
                "The settings document cannot be removed".to_string(),
            )),
        }
    }

    fn remove_typed<T: Item>(
        &self,
        cell: &RwLock<Collection<T>>,
        name: &str,
        opts: &RemoveOptions,
    ) -> Result<()> {
        // Validate: the item must exist and must not silently orphan
        // anything that references it.
        if !cell.read().contains(name) {
            return Err(ForgeError::NotFound {
                kind: T::KIND,
                name: name.to_string(),
            });
        }
        let children = self.children_of(T::KIND, name);
        if !children.is_empty() {
            if !opts.recursive {
                return Err(ForgeError::WouldOrphan {
                    name: name.to_string(),
                    dependent: children[0].1.clone(),
                });
            }
            // Depth-first: each child re-runs the full machine.
            for (child_kind, child_name) in children {
                self.remove_inner(child_kind, &child_name, opts)?;
            }
        }

        // Persist
        if opts.with_delete {
            self.storage.serialize_delete(T::KIND, name)?;
        }
        let removed = cell.write().take(name)?;

        // TriggerPre
        if opts.with_triggers {
            self.fire_trigger(TriggerEvent::Delete, T::KIND, TriggerPhase::Pre, name);
        }

        // GenerateArtifacts (incremental desync)
        let generated = if opts.with_sync {
            self.lite_remove(T::KIND, name, &removed.to_map()?)
        } else {
            Ok(())
        };

        // TriggerPost
        if opts.with_triggers {
            self.fire_trigger(TriggerEvent::Delete, T::KIND, TriggerPhase::Post, name);
        }

        generated
    }

    fn insert_loaded(&self, kind: ItemKind, record: &Value) -> Result<()> {
        match kind {
            ItemKind::Distro => self.insert_loaded_typed(&self.distros, record),
            ItemKind::Profile => self.insert_loaded_typed(&self.profiles, record),
            ItemKind::System => self.insert_loaded_typed(&self.systems, record),
            ItemKind::Repo => self.insert_loaded_typed(&self.repos, record),
            ItemKind::Image => self.insert_loaded_typed(&self.images, record),
            ItemKind::MgmtClass => self.insert_loaded_typed(&self.mgmtclasses, record),
            ItemKind::Package => self.insert_loaded_typed(&self.packages, record),
            ItemKind::File => self.insert_loaded_typed(&self.files, record),
            ItemKind::Settings => Ok(()),
        }
    }

    fn insert_loaded_typed<T: Item>(
        &self,
        cell: &RwLock<Collection<T>>,
        record: &Value,
    ) -> Result<()> {
        let mut item = T::from_map(record)?;
        // Stored depth ordered the load; the live value is re-derived
        // from the already registered parent.
        match item.parent_ref() {
            Some(parent) => match self.depth_of(parent.kind, &parent.name) {
                Some(parent_depth) => item.set_depth(parent_depth + 1),
                None => warn!(
                    "{} '{}' references missing {} '{}'; keeping stored depth",
                    T::KIND,
                    item.name(),
                    parent.kind,
                    parent.name
                ),
            },
            None => item.set_depth(0),
        }
        cell.write().add(item, true)
    }

    fn fire_trigger(&self, event: TriggerEvent, kind: ItemKind, phase: TriggerPhase, name: &str) {
        let triggers = self.triggers.read().clone();
        if let Some(triggers) = triggers {
            let path = trigger_path(event, Some(kind), phase);
            if let Err(e) = triggers.run(&path, &[name.to_string()]) {
                warn!("trigger '{}' for '{}' failed: {}", path, name, e);
            }
        }
    }

    fn lite_add(&self, kind: ItemKind, name: &str) -> Result<()> {
        let lite = self.lite_sync.read().clone();
        let Some(lite) = lite else { return Ok(()) };
        match kind {
            ItemKind::Distro => lite.add_single_distro(name),
            ItemKind::Profile => lite.add_single_profile(name),
            ItemKind::System => lite.add_single_system(name),
            ItemKind::Image => lite.add_single_image(name),
            _ => Ok(()),
        }
    }

    fn lite_remove(&self, kind: ItemKind, name: &str, record: &Value) -> Result<()> {
        let lite = self.lite_sync.read().clone();
        let Some(lite) = lite else { return Ok(()) };
        match kind {
            ItemKind::Distro => lite.remove_single_distro(name),
            ItemKind::Profile => lite.remove_single_profile(name),
            ItemKind::System => lite.remove_single_system(record),
            ItemKind::Image => lite.remove_single_image(name),
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex as PMutex;
    use std::collections::HashMap;

    /// Backend stub honoring the depth-ordering contract.
    #[derive(Default)]
    struct MemoryStorage {
        records: PMutex<HashMap<(ItemKind, String), Value>>,
        fail_writes: AtomicBool,
    }

    impl Storage for MemoryStorage {
        fn name(&self) -> &'static str {
            "memory"
        }

        fn serialize_item(&self, kind: ItemKind, name: &str, record: &Value) -> Result<()> {
            if self.fail_writes.load(Ordering::SeqCst) {
                return Err(ForgeError::Store("injected write failure".to_string()));
            }
            self.records
                .lock()
                .insert((kind, name.to_string()), record.clone());
            Ok(())
        }

        fn serialize_delete(&self, kind: ItemKind, name: &str) -> Result<()> {
            self.records.lock().remove(&(kind, name.to_string()));
            Ok(())
        }

        fn serialize_collection(&self, kind: ItemKind, records: &[Value]) -> Result<()> {
            let mut map = self.records.lock();
            map.retain(|(k, _), _| *k != kind);
            for record in records {
                let name = record["name"].as_str().unwrap_or("settings").to_string();
                map.insert((kind, name), record.clone());
            }
            Ok(())
        }

        fn deserialize(&self, kind: ItemKind, topological: bool) -> Result<Vec<Value>> {
            let mut records: Vec<Value> = self
                .records
                .lock()
                .iter()
                .filter(|((k, _), _)| *k == kind)
                .map(|(_, v)| v.clone())
                .collect();
            if topological {
                records.sort_by_key(|r| r["depth"].as_u64().unwrap_or(0));
            }
            Ok(records)
        }
    }

    fn manager() -> CollectionManager {
        CollectionManager::new(Settings::default(), Box::<MemoryStorage>::default())
    }

    fn quiet() -> SaveOptions {
        SaveOptions::default()
    }

    fn valid_distro(name: &str, temp: &tempfile::TempDir) -> Distro {
        let kernel = temp.path().join(format!("{}-vmlinuz", name));
        let initrd = temp.path().join(format!("{}-initrd", name));
        std::fs::write(&kernel, "k").unwrap();
        std::fs::write(&initrd, "i").unwrap();
        let mut distro = Distro::new(name);
        distro.kernel = kernel.to_string_lossy().to_string();
        distro.initrd = initrd.to_string_lossy().to_string();
        distro
    }

    fn profile_for(name: &str, distro: &str) -> Profile {
        let mut profile = Profile::new(name);
        profile.distro = distro.to_string();
        profile
    }

    fn system_for(name: &str, profile: &str) -> System {
        let mut system = System::new(name);
        system.profile = Some(profile.to_string());
        system
    }

    #[test]
    fn test_depth_assignment_down_the_chain() {
        let temp = tempfile::TempDir::new().unwrap();
        let mgr = manager();
        mgr.add_distro(valid_distro("fedora", &temp), &quiet()).unwrap();
        mgr.add_profile(profile_for("base", "fedora"), &quiet()).unwrap();

        let mut sub = Profile::new("sub");
        sub.parent = Some("base".to_string());
        mgr.add_profile(sub, &quiet()).unwrap();
        mgr.add_system(system_for("box1", "sub"), &quiet()).unwrap();

        assert_eq!(mgr.distros().get("fedora").unwrap().depth(), 0);
        assert_eq!(mgr.profiles().get("base").unwrap().depth(), 1);
        assert_eq!(mgr.profiles().get("sub").unwrap().depth(), 2);
        assert_eq!(mgr.systems().get("box1").unwrap().depth(), 3);
    }

    #[test]
    fn test_add_profile_with_missing_distro_fails() {
        let mgr = manager();
        let err = mgr
            .add_profile(profile_for("web", "ghost"), &quiet())
            .unwrap_err();
        assert!(matches!(err, ForgeError::OrphanReference { .. }));
        assert!(!mgr.contains(ItemKind::Profile, "web"));
    }

    #[test]
    fn test_duplicate_add_rejected_without_overwrite() {
        let temp = tempfile::TempDir::new().unwrap();
        let mgr = manager();
        mgr.add_distro(valid_distro("fedora", &temp), &quiet()).unwrap();
        let err = mgr
            .add_distro(valid_distro("fedora", &temp), &quiet())
            .unwrap_err();
        assert!(matches!(err, ForgeError::Validation(_)));

        let overwrite = SaveOptions {
            overwrite: true,
            ..SaveOptions::default()
        };
        mgr.add_distro(valid_distro("fedora", &temp), &overwrite)
            .unwrap();
    }

    #[test]
    fn test_remove_with_children_requires_recursive() {
        let temp = tempfile::TempDir::new().unwrap();
        let mgr = manager();
        mgr.add_distro(valid_distro("fedora", &temp), &quiet()).unwrap();
        mgr.add_profile(profile_for("web", "fedora"), &quiet()).unwrap();

        let err = mgr
            .remove(ItemKind::Distro, "fedora", &RemoveOptions::default())
            .unwrap_err();
        assert!(matches!(err, ForgeError::WouldOrphan { .. }));
        // both intact
        assert!(mgr.contains(ItemKind::Distro, "fedora"));
        assert!(mgr.contains(ItemKind::Profile, "web"));

        // child first, then parent
        mgr.remove(ItemKind::Profile, "web", &RemoveOptions::default())
            .unwrap();
        mgr.remove(ItemKind::Distro, "fedora", &RemoveOptions::default())
            .unwrap();
        assert!(!mgr.contains(ItemKind::Distro, "fedora"));
    }

    #[test]
    fn test_recursive_remove_takes_whole_subtree() {
        let temp = tempfile::TempDir::new().unwrap();
        let mgr = manager();
        mgr.add_distro(valid_distro("fedora", &temp), &quiet()).unwrap();
        mgr.add_profile(profile_for("web", "fedora"), &quiet()).unwrap();
        mgr.add_system(system_for("box1", "web"), &quiet()).unwrap();

        let recursive = RemoveOptions {
            recursive: true,
            ..RemoveOptions::default()
        };
        mgr.remove(ItemKind::Distro, "fedora", &recursive).unwrap();
        assert!(!mgr.contains(ItemKind::Profile, "web"));
        assert!(!mgr.contains(ItemKind::System, "box1"));
    }

    #[test]
    fn test_persist_failure_leaves_memory_untouched() {
        let temp = tempfile::TempDir::new().unwrap();
        let storage = Box::<MemoryStorage>::default();
        storage.fail_writes.store(true, Ordering::SeqCst);
        let mgr = CollectionManager::new(Settings::default(), storage);

        let err = mgr.add_distro(valid_distro("fedora", &temp), &quiet());
        assert!(err.is_err());
        assert!(!mgr.contains(ItemKind::Distro, "fedora"));
    }

    #[test]
    fn test_load_is_init_once() {
        let temp = tempfile::TempDir::new().unwrap();
        let mgr = manager();
        mgr.load().unwrap();
        mgr.add_distro(valid_distro("fedora", &temp), &quiet()).unwrap();
        // a second load must not wipe or duplicate loaded state
        mgr.load().unwrap();
        assert_eq!(mgr.distros().len(), 1);
    }

    #[test]
    fn test_failing_trigger_never_blocks_mutation() {
        struct FailingTriggers;
        impl TriggerDispatch for FailingTriggers {
            fn run(&self, _event: &str, _args: &[String]) -> Result<()> {
                Err(ForgeError::Trigger("boom".to_string()))
            }
        }

        let temp = tempfile::TempDir::new().unwrap();
        let mgr = manager();
        mgr.set_triggers(Arc::new(FailingTriggers));
        mgr.add_distro(valid_distro("fedora", &temp), &quiet()).unwrap();
        assert!(mgr.contains(ItemKind::Distro, "fedora"));
    }
}
