//! Incremental ("lite") artifact regeneration.
//!
//! One mutation touches only the directly affected artifacts plus a
//! cascading regeneration of everything beneath it in the tree (a
//! distro or profile change invalidates the inherited configuration of
//! every descendant profile and system), followed by one trailing
//! rebuild of the aggregate boot menu.

use crate::engine::SyncEngine;
use bootforge_items::{Item, System};
use bootforge_types::{ItemKind, LiteSync, Result};
use std::sync::Arc;
use tracing::debug;

/// The incremental sync observer wired into the mutation state machine.
pub struct LiteSyncEngine {
    engine: Arc<SyncEngine>,
    manager: Arc<bootforge_items::CollectionManager>,
}

impl LiteSyncEngine {
    /// Create the incremental engine sharing the full engine's state.
    pub fn new(engine: Arc<SyncEngine>, manager: Arc<bootforge_items::CollectionManager>) -> Self {
        Self { engine, manager }
    }

    /// Regenerate a profile and cascade to its descendants; the menu is
    /// rebuilt once by the outermost call.
    fn add_profile_inner(&self, name: &str, rebuild_menu: bool) -> Result<()> {
        self.engine.sync_profile(name)?;
        for (kind, child) in self.manager.children_of(ItemKind::Profile, name) {
            match kind {
                ItemKind::Profile => self.add_profile_inner(&child, false)?,
                ItemKind::System => self.add_system_inner(&child)?,
                _ => {}
            }
        }
        if rebuild_menu {
            self.engine.make_menu()?;
        }
        Ok(())
    }

    fn add_system_inner(&self, name: &str) -> Result<()> {
        self.engine.sync_system(name)?;
        self.engine.regen_services()
    }

}

impl LiteSync for LiteSyncEngine {
    fn add_single_distro(&self, name: &str) -> Result<()> {
        let _guard = self.engine.lock.lock();
        debug!("lite sync: distro '{}'", name);
        self.engine.sync_distro(name)?;
        for (kind, child) in self.manager.children_of(ItemKind::Distro, name) {
            if kind == ItemKind::Profile {
                self.add_profile_inner(&child, false)?;
            }
        }
        self.engine.make_menu()
    }

    fn add_single_profile(&self, name: &str) -> Result<()> {
        let _guard = self.engine.lock.lock();
        debug!("lite sync: profile '{}'", name);
        self.add_profile_inner(name, true)
    }

    fn add_single_system(&self, name: &str) -> Result<()> {
        let _guard = self.engine.lock.lock();
        debug!("lite sync: system '{}'", name);
        self.add_system_inner(name)
    }

    fn add_single_image(&self, name: &str) -> Result<()> {
        let _guard = self.engine.lock.lock();
        debug!("lite sync: image '{}'", name);
        for (kind, child) in self.manager.children_of(ItemKind::Image, name) {
            if kind == ItemKind::System {
                self.add_system_inner(&child)?;
            }
        }
        self.engine.make_menu()
    }

    fn remove_single_distro(&self, name: &str) -> Result<()> {
        let _guard = self.engine.lock.lock();
        self.engine.remove_distro_artifacts(name)
    }

    fn remove_single_profile(&self, name: &str) -> Result<()> {
        let _guard = self.engine.lock.lock();
        self.engine.remove_profile_artifacts(name)?;
        self.engine.make_menu()
    }

    fn remove_single_system(&self, record: &serde_json::Value) -> Result<()> {
        let _guard = self.engine.lock.lock();
        let system = System::from_map(record)?;
        debug!("lite desync: system '{}'", system.base.name);
        self.engine.remove_system_artifacts(&system)?;
        self.engine.regen_services()
    }

    fn remove_single_image(&self, _name: &str) -> Result<()> {
        Ok(())
    }
}
