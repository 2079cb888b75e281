//! PXE/TFTP tree generation.

use bootforge_core::util::data::options_to_string;
use bootforge_core::util::fs::{copy_file, mkdir_p, rmfile, rmtree, symlink_force};
use bootforge_items::{CollectionManager, System};
use bootforge_resolver::{blend, Blended};
use bootforge_types::{
    ForgeError, ItemKind, Result, TemplateEngine, TemplateVars,
};
use bootforge_autoinstall::{answer_file_url, breed_answer_option};
use indexmap::IndexMap;
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, warn};

/// Per-interface PXE config rendered for a netbooting system.
const PXE_SYSTEM_TEMPLATE: &str = "default linux\n\
prompt 0\n\
timeout 1\n\
label linux\n\
        kernel $kernel_path\n\
        append $append_line\n";

/// Per-interface PXE config for a system with netboot disabled.
const PXE_LOCAL_TEMPLATE: &str = "default local\n\
prompt 0\n\
timeout 1\n\
label local\n\
        localboot -1\n";

/// The aggregate boot menu; `$pxe_menu_items` expands to one entry per
/// menu-enabled profile.
const PXE_MENU_TEMPLATE: &str = "DEFAULT menu\n\
PROMPT 0\n\
MENU TITLE Bootforge Boot Menu\n\
TIMEOUT 200\n\
TOTALTIMEOUT 6000\n\
ONTIMEOUT local\n\
\n\
LABEL local\n\
        MENU LABEL (local)\n\
        MENU DEFAULT\n\
        LOCALBOOT -1\n\
\n\
$pxe_menu_items\n";

const PXE_MENU_ITEM_TEMPLATE: &str = "LABEL $menu_label\n\
        kernel $kernel_path\n\
        append $append_line\n";

/// Generates the PXE/TFTP layout for distros, profiles, and systems.
pub(crate) struct PxeGen {
    manager: Arc<CollectionManager>,
    engine: Arc<dyn TemplateEngine>,
}

impl PxeGen {
    pub(crate) fn new(manager: Arc<CollectionManager>, engine: Arc<dyn TemplateEngine>) -> Self {
        Self { manager, engine }
    }

    fn tftpboot(&self) -> PathBuf {
        self.manager.settings().tftpboot_dir
    }

    fn webdir(&self) -> PathBuf {
        self.manager.settings().webdir
    }

    fn pxelinux_dir(&self) -> PathBuf {
        self.tftpboot().join("pxelinux.cfg")
    }

    /// Create the directory skeleton both trees need.
    pub(crate) fn make_tree(&self) -> Result<()> {
        mkdir_p(self.pxelinux_dir())?;
        mkdir_p(self.tftpboot().join("images"))?;
        mkdir_p(self.webdir().join("images"))?;
        mkdir_p(self.webdir().join("links"))?;
        mkdir_p(self.webdir().join("autoinstall").join("profiles"))?;
        mkdir_p(self.webdir().join("autoinstall").join("systems"))?;
        Ok(())
    }

    /// Copy one distro's boot images into both trees and refresh its
    /// install-tree symlink.
    pub(crate) fn copy_distro_files(&self, name: &str) -> Result<()> {
        let distro = self
            .manager
            .distros()
            .get(name)
            .cloned()
            .ok_or_else(|| ForgeError::NotFound {
                kind: ItemKind::Distro,
                name: name.to_string(),
            })?;

        for file in [&distro.kernel, &distro.initrd] {
            let source = Path::new(file);
            let file_name = source.file_name().ok_or_else(|| {
                ForgeError::Sync(format!("Boot file '{}' has no file name", file))
            })?;
            copy_file(source, self.tftpboot().join("images").join(name).join(file_name))
                .map_err(|e| ForgeError::Sync(format!("Failed to copy '{}': {}", file, e)))?;
            copy_file(source, self.webdir().join("images").join(name).join(file_name))
                .map_err(|e| ForgeError::Sync(format!("Failed to copy '{}': {}", file, e)))?;
        }

        // An install tree named by local path gets a web-servable link.
        if let Some(Value::String(tree)) = distro.base.autoinstall_meta.get("tree") {
            if !tree.contains("://") {
                symlink_force(tree, self.webdir().join("links").join(name))?;
            }
        }

        debug!("copied boot files for distro '{}'", name);
        Ok(())
    }

    /// Drop one distro's boot images and install-tree link.
    pub(crate) fn remove_distro_files(&self, name: &str) -> Result<()> {
        rmtree(self.tftpboot().join("images").join(name))?;
        rmtree(self.webdir().join("images").join(name))?;
        rmfile(self.webdir().join("links").join(name))?;
        Ok(())
    }

    /// Write the per-interface PXE config files for one system.
    pub(crate) fn write_system_files(&self, name: &str) -> Result<()> {
        let system = self
            .manager
            .systems()
            .get(name)
            .cloned()
            .ok_or_else(|| ForgeError::NotFound {
                kind: ItemKind::System,
                name: name.to_string(),
            })?;

        let blended = blend(&self.manager, false, ItemKind::System, name)?;
        let legacy = blended.get("arch").and_then(Value::as_str) == Some("ia64");

        for interface in system.interfaces.keys() {
            let Some(file_name) = system.config_filename(interface) else {
                continue;
            };
            // legacy arches read a flat file from the TFTP root
            let path = if legacy {
                self.tftpboot().join(&file_name)
            } else {
                self.pxelinux_dir().join(&file_name)
            };

            let content = if system.netboot_enabled {
                let vars = self.boot_vars(&blended, ItemKind::System, name)?;
                self.engine.render(PXE_SYSTEM_TEMPLATE, &vars)?
            } else {
                PXE_LOCAL_TEMPLATE.to_string()
            };

            if let Some(parent) = path.parent() {
                mkdir_p(parent)?;
            }
            std::fs::write(&path, content)
                .map_err(|e| ForgeError::Sync(format!("Failed to write {:?}: {}", path, e)))?;
            debug!("wrote PXE config {:?}", path);
        }
        Ok(())
    }

    /// Drop the per-interface PXE config files for a removed system.
    ///
    /// The object is already gone from the collection, so the file keys
    /// are recomputed from the passed snapshot.
    pub(crate) fn remove_system_files(&self, system: &System) -> Result<()> {
        for interface in system.interfaces.keys() {
            if let Some(file_name) = system.config_filename(interface) {
                rmfile(self.pxelinux_dir().join(&file_name))?;
                rmfile(self.tftpboot().join(&file_name))?;
            }
        }
        Ok(())
    }

    /// Regenerate the aggregate boot menu listing menu-enabled profiles.
    pub(crate) fn make_menu(&self) -> Result<()> {
        let profile_names = self.manager.profiles().names();

        let mut items = String::new();
        for name in profile_names {
            let blended = match blend(&self.manager, false, ItemKind::Profile, &name) {
                Ok(blended) => blended,
                Err(e) => {
                    warn!("skipping menu entry for profile '{}': {}", name, e);
                    continue;
                }
            };
            if blended.get("enable_menu").and_then(Value::as_bool) == Some(false) {
                continue;
            }
            let mut vars = self.boot_vars(&blended, ItemKind::Profile, &name)?;
            vars.insert("menu_label".to_string(), Value::String(name.clone()));
            items.push_str(&self.engine.render(PXE_MENU_ITEM_TEMPLATE, &vars)?);
            items.push('\n');
        }

        let mut vars: TemplateVars = IndexMap::new();
        vars.insert("pxe_menu_items".to_string(), Value::String(items));
        let content = self.engine.render(PXE_MENU_TEMPLATE, &vars)?;

        let path = self.pxelinux_dir().join("default");
        mkdir_p(self.pxelinux_dir())?;
        std::fs::write(&path, content)
            .map_err(|e| ForgeError::Sync(format!("Failed to write {:?}: {}", path, e)))?;
        debug!("regenerated boot menu {:?}", path);
        Ok(())
    }

    /// Render any extra templates an object attaches via
    /// `template_files` (template path -> destination path).
    pub(crate) fn write_templates(&self, kind: ItemKind, name: &str) -> Result<()> {
        let blended = blend(&self.manager, false, kind, name)?;
        let templates = match blended.get("template_files") {
            Some(Value::Object(map)) => map.clone(),
            _ => return Ok(()),
        };
        for (source, dest) in &templates {
            let Some(dest) = dest.as_str().filter(|d| !d.is_empty()) else {
                continue;
            };
            let text = std::fs::read_to_string(source).map_err(|e| {
                ForgeError::Sync(format!("Failed to read template '{}': {}", source, e))
            })?;
            let rendered = self.engine.render(&text, &blended)?;
            let dest = PathBuf::from(dest);
            if let Some(parent) = dest.parent() {
                mkdir_p(parent)?;
            }
            std::fs::write(&dest, rendered)
                .map_err(|e| ForgeError::Sync(format!("Failed to write {:?}: {}", dest, e)))?;
        }
        Ok(())
    }

    /// Kernel path and append line for a boot entry, shared between
    /// per-system configs and menu entries.
    fn boot_vars(&self, blended: &Blended, kind: ItemKind, name: &str) -> Result<TemplateVars> {
        let distro_name = blended
            .get("distro_name")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        let kernel = blended
            .get("kernel")
            .and_then(Value::as_str)
            .unwrap_or_default();
        let initrd = blended
            .get("initrd")
            .and_then(Value::as_str)
            .unwrap_or_default();
        let kernel_name = Path::new(kernel)
            .file_name()
            .map(|f| f.to_string_lossy().to_string())
            .unwrap_or_default();
        let initrd_name = Path::new(initrd)
            .file_name()
            .map(|f| f.to_string_lossy().to_string())
            .unwrap_or_default();

        let options = match blended.get("kernel_options") {
            Some(Value::Object(map)) => {
                let ordered: IndexMap<String, Value> = map.clone().into_iter().collect();
                options_to_string(&ordered)
            }
            _ => String::new(),
        };

        let breed = blended.get("breed").and_then(Value::as_str).unwrap_or("");
        let answer = format!(
            "{}={}",
            breed_answer_option(breed),
            answer_file_url(blended, kind, name)
        );

        let mut append = format!("initrd=/images/{}/{}", distro_name, initrd_name);
        if !options.is_empty() {
            append.push(' ');
            append.push_str(&options);
        }
        append.push(' ');
        append.push_str(&answer);

        let mut vars: TemplateVars = IndexMap::new();
        vars.insert(
            "kernel_path".to_string(),
            Value::String(format!("/images/{}/{}", distro_name, kernel_name)),
        );
        vars.insert("append_line".to_string(), Value::String(append));
        Ok(vars)
    }
}
