//! Command implementations.

pub mod blend;
pub mod object;
pub mod power;
pub mod sync;

use anyhow::Result;
use bootforge_autoinstall::VariableTemplateEngine;
use bootforge_core::config::Settings;
use bootforge_items::CollectionManager;
use bootforge_store::open_storage;
use bootforge_sync::{LiteSyncEngine, SyncEngine};
use bootforge_triggers::TriggerRunner;
use std::sync::Arc;

/// Everything a command needs, wired once per invocation.
pub struct AppContext {
    pub manager: Arc<CollectionManager>,
    pub engine: Arc<SyncEngine>,
}

impl AppContext {
    /// Load settings, open the configured backend, load collections,
    /// and wire the trigger runner and incremental sync observer.
    pub fn init(config_path: &str) -> Result<Self> {
        let settings = Settings::load(config_path)?;
        let storage = open_storage(&settings)?;
        let triggers = Arc::new(TriggerRunner::new(&settings.trigger_dir));

        let manager = Arc::new(CollectionManager::new(settings, storage));
        manager.load()?;
        manager.set_triggers(triggers.clone());

        let engine = Arc::new(
            SyncEngine::new(manager.clone(), Arc::new(VariableTemplateEngine::new()))
                .with_triggers(triggers),
        );
        manager.set_lite_sync(Arc::new(LiteSyncEngine::new(
            engine.clone(),
            manager.clone(),
        )));

        Ok(Self { manager, engine })
    }
}
