//! The sync engine: full-tree artifact regeneration.

use crate::dhcp::DhcpGen;
use crate::dns::DnsGen;
use crate::pxe::PxeGen;
use bootforge_autoinstall::AutoinstallGenerator;
use bootforge_core::util::fs::{mkdir_p, rmfile, rmtree};
use bootforge_items::{CollectionManager, System};
use bootforge_types::{
    trigger_path, ForgeError, ItemKind, Result, TemplateEngine, TriggerDispatch, TriggerEvent,
    TriggerPhase,
};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{info, warn};

/// Cooperative cancellation for long sync runs.
///
/// Checked between object writes only; a single object's artifacts are
/// never left half-written by cancellation.
#[derive(Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    /// Request cancellation at the next per-object boundary.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    /// Whether cancellation has been requested.
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    /// Re-arm the token for the next run.
    pub fn reset(&self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// One object that failed during a sync run.
#[derive(Debug)]
pub struct SyncFailure {
    /// Kind of the failing object
    pub kind: ItemKind,
    /// Name of the failing object
    pub name: String,
    /// What went wrong
    pub message: String,
}

/// Outcome of a full sync: per-object failures are collected, never
/// fatal to the run.
#[derive(Debug, Default)]
pub struct SyncReport {
    /// Objects whose artifacts could not be generated
    pub failures: Vec<SyncFailure>,
    /// Whether the run stopped early on a cancellation request
    pub cancelled: bool,
}

impl SyncReport {
    /// True when everything regenerated and the run completed.
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty() && !self.cancelled
    }

    fn record(&mut self, kind: ItemKind, name: &str, error: ForgeError) {
        warn!("sync of {} '{}' failed: {}", kind, name, error);
        self.failures.push(SyncFailure {
            kind,
            name: name.to_string(),
            message: error.to_string(),
        });
    }
}

/// Regenerates boot-service artifacts from resolved configurations.
///
/// One engine mutex serializes full and incremental runs targeting the
/// same tree; interleaved writers would corrupt shared files like the
/// boot menu and the DHCP config.
pub struct SyncEngine {
    manager: Arc<CollectionManager>,
    pub(crate) pxe: PxeGen,
    dhcp: DhcpGen,
    dns: DnsGen,
    generator: AutoinstallGenerator,
    triggers: Option<Arc<dyn TriggerDispatch>>,
    cancel: CancelToken,
    pub(crate) lock: Mutex<()>,
}

impl SyncEngine {
    /// Create an engine over the shared manager and template engine.
    pub fn new(manager: Arc<CollectionManager>, engine: Arc<dyn TemplateEngine>) -> Self {
        Self {
            pxe: PxeGen::new(manager.clone(), engine.clone()),
            dhcp: DhcpGen::new(manager.clone()),
            dns: DnsGen::new(manager.clone()),
            generator: AutoinstallGenerator::new(manager.clone(), engine),
            manager,
            triggers: None,
            cancel: CancelToken::default(),
            lock: Mutex::new(()),
        }
    }

    /// Attach the trigger runner for `sync/pre` and `sync/post` hooks.
    pub fn with_triggers(mut self, triggers: Arc<dyn TriggerDispatch>) -> Self {
        self.triggers = Some(triggers);
        self
    }

    /// The token cancelling in-flight runs at object granularity.
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    /// Regenerate every artifact: boot images and install-tree links per
    /// distro, answer-file caches per profile/system, per-interface PXE
    /// configs, the aggregate boot menu, and (when managed) the DHCP
    /// config and DNS zones.
    ///
    /// Per-object failures land in the report; the run continues. This
    /// is the recovery path after any incremental generation failure.
    pub fn full_sync(&self) -> Result<SyncReport> {
        let _guard = self.lock.lock();
        let mut report = SyncReport::default();

        info!("starting full sync");
        self.fire_trigger(TriggerPhase::Pre);
        self.pxe.make_tree()?;

        for name in self.manager.distros().names() {
            if self.cancel.is_cancelled() {
                report.cancelled = true;
                return Ok(report);
            }
            if let Err(e) = self.sync_distro(&name) {
                report.record(ItemKind::Distro, &name, e);
            }
        }

        for name in self.manager.profiles().names() {
            if self.cancel.is_cancelled() {
                report.cancelled = true;
                return Ok(report);
            }
            if let Err(e) = self.sync_profile(&name) {
                report.record(ItemKind::Profile, &name, e);
            }
        }

        for name in self.manager.systems().names() {
            if self.cancel.is_cancelled() {
                report.cancelled = true;
                return Ok(report);
            }
            if let Err(e) = self.sync_system(&name) {
                report.record(ItemKind::System, &name, e);
            }
        }

        // the aggregate menu goes last, once every per-object file exists
        if let Err(e) = self.pxe.make_menu() {
            report.record(ItemKind::Profile, "pxe-menu", e);
        }

        let settings = self.manager.settings();
        if settings.manage_dhcp {
            if let Err(e) = self.dhcp.regen() {
                report.record(ItemKind::System, "dhcp", e);
            }
        }
        if settings.manage_dns {
            if let Err(e) = self.dns.regen() {
                report.record(ItemKind::System, "dns", e);
            }
        }

        self.fire_trigger(TriggerPhase::Post);
        info!(
            "full sync finished with {} failure(s)",
            report.failures.len()
        );
        Ok(report)
    }

    // ------------------------------------------------------------------
    // Per-object operations shared with the incremental engine

    pub(crate) fn sync_distro(&self, name: &str) -> Result<()> {
        self.pxe.copy_distro_files(name)?;
        self.pxe.write_templates(ItemKind::Distro, name)
    }

    pub(crate) fn sync_profile(&self, name: &str) -> Result<()> {
        self.write_autoinstall_cache(ItemKind::Profile, name)?;
        self.pxe.write_templates(ItemKind::Profile, name)
    }

    pub(crate) fn sync_system(&self, name: &str) -> Result<()> {
        self.pxe.write_system_files(name)?;
        self.write_autoinstall_cache(ItemKind::System, name)?;
        self.pxe.write_templates(ItemKind::System, name)
    }

    pub(crate) fn regen_services(&self) -> Result<()> {
        let settings = self.manager.settings();
        if settings.manage_dhcp {
            self.dhcp.regen()?;
        }
        if settings.manage_dns {
            self.dns.regen()?;
        }
        Ok(())
    }

    pub(crate) fn make_menu(&self) -> Result<()> {
        self.pxe.make_menu()
    }

    pub(crate) fn remove_distro_artifacts(&self, name: &str) -> Result<()> {
        self.pxe.remove_distro_files(name)
    }

    pub(crate) fn remove_profile_artifacts(&self, name: &str) -> Result<()> {
        let settings = self.manager.settings();
        rmfile(
            settings
                .webdir
                .join("autoinstall")
                .join("profiles")
                .join(name),
        )
    }

    pub(crate) fn remove_system_artifacts(&self, system: &System) -> Result<()> {
        let settings = self.manager.settings();
        self.pxe.remove_system_files(system)?;
        rmfile(
            settings
                .webdir
                .join("autoinstall")
                .join("systems")
                .join(&system.base.name),
        )
    }

    /// Purge and rebuild the whole web-servable answer-file cache.
    pub fn clean_autoinstall_cache(&self) -> Result<()> {
        let settings = self.manager.settings();
        rmtree(settings.webdir.join("autoinstall"))?;
        mkdir_p(settings.webdir.join("autoinstall").join("profiles"))?;
        mkdir_p(settings.webdir.join("autoinstall").join("systems"))?;
        Ok(())
    }

    fn write_autoinstall_cache(&self, kind: ItemKind, name: &str) -> Result<()> {
        let rendered = match kind {
            ItemKind::Profile => self.generator.generate_profile(name)?,
            ItemKind::System => self.generator.generate_system(name)?,
            _ => return Ok(()),
        };
        let settings = self.manager.settings();
        let path = settings
            .webdir
            .join("autoinstall")
            .join(kind.collection_dir())
            .join(name);
        if let Some(parent) = path.parent() {
            mkdir_p(parent)?;
        }
        std::fs::write(&path, rendered)
            .map_err(|e| ForgeError::Sync(format!("Failed to write {:?}: {}", path, e)))
    }

    fn fire_trigger(&self, phase: TriggerPhase) {
        if let Some(triggers) = &self.triggers {
            let path = trigger_path(TriggerEvent::Sync, None, phase);
            if let Err(e) = triggers.run(&path, &[]) {
                warn!("trigger '{}' failed: {}", path, e);
            }
        }
    }
}
