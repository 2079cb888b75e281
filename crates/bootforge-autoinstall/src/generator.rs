//! The answer-file generation pipeline.

use crate::autoyast;
use bootforge_items::CollectionManager;
use bootforge_resolver::{blend, Blended};
use bootforge_types::{ForgeError, ItemKind, Result, TemplateEngine};
use serde_json::Value;
use std::sync::Arc;
use tracing::debug;

/// Renders blended configurations into installer answer files.
pub struct AutoinstallGenerator {
    manager: Arc<CollectionManager>,
    engine: Arc<dyn TemplateEngine>,
}

impl AutoinstallGenerator {
    /// Create a generator over the shared manager and template engine.
    pub fn new(manager: Arc<CollectionManager>, engine: Arc<dyn TemplateEngine>) -> Self {
        Self { manager, engine }
    }

    /// Render the answer file for a profile.
    pub fn generate_profile(&self, name: &str) -> Result<String> {
        self.generate(ItemKind::Profile, name)
    }

    /// Render the answer file for a system.
    pub fn generate_system(&self, name: &str) -> Result<String> {
        self.generate(ItemKind::System, name)
    }

    fn generate(&self, kind: ItemKind, name: &str) -> Result<String> {
        let mut blended = blend(&self.manager, false, kind, name)?;

        // Answer-file metadata keys become top-level template variables,
        // overriding same-named blended keys.
        if let Some(Value::Object(meta)) = blended.get("autoinstall_meta").cloned() {
            for (key, value) in meta {
                blended.insert(key, value);
            }
        }

        // Synthesized helper variables for the template.
        blended.insert(
            "repo_stanza".to_string(),
            Value::String(repo_stanza(&blended)),
        );
        blended.insert(
            "mirror_config_stanza".to_string(),
            Value::String(mirror_config_stanza(&blended, kind, name)),
        );

        let template_name = blended
            .get("autoinstall")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        if template_name.is_empty() {
            return Err(ForgeError::Render(format!(
                "{} '{}' resolves to no answer-file template",
                kind, name
            )));
        }

        let settings = self.manager.settings();
        let path = settings.autoinstall_dir.join(&template_name);
        debug!("rendering {:?} for {} '{}'", path, kind, name);
        let text = std::fs::read_to_string(&path).map_err(|e| {
            ForgeError::Render(format!("Failed to read template {:?}: {}", path, e))
        })?;

        let rendered = self.engine.render(&text, &blended)?;

        // XML-breed answer files get bookkeeping and callback scripts
        // spliced in as document elements.
        let breed = blended.get("breed").and_then(Value::as_str).unwrap_or("");
        if breed == "suse" {
            return autoyast::postprocess(&rendered, kind, name, &blended);
        }

        Ok(rendered)
    }
}

/// The served URL an installer fetches this object's answer file from.
pub fn answer_file_url(blended: &Blended, kind: ItemKind, name: &str) -> String {
    let http_server = blended
        .get("http_server")
        .and_then(Value::as_str)
        .unwrap_or("127.0.0.1");
    let prefix = blended
        .get("service_prefix")
        .and_then(Value::as_str)
        .unwrap_or("bootforge/svc");
    format!("http://{}/{}/op/ks/{}/{}", http_server, prefix, kind, name)
}

/// The kernel-command-line option each breed's installer expects the
/// answer-file URL under.
pub fn breed_answer_option(breed: &str) -> &'static str {
    match breed {
        "suse" => "autoyast",
        "debian" | "ubuntu" => "preseed/url",
        _ => "ks",
    }
}

/// Lines attaching every enabled repo to the installer, with mirror
/// URLs synthesized for locally mirrored repos and upstream URLs
/// deduplicated.
fn repo_stanza(blended: &Blended) -> String {
    let http_server = blended
        .get("http_server")
        .and_then(Value::as_str)
        .unwrap_or("127.0.0.1");
    let prefix = blended
        .get("service_prefix")
        .and_then(Value::as_str)
        .unwrap_or("bootforge/svc");

    let repo_data = match blended.get("repo_data") {
        Some(Value::Array(items)) => items.clone(),
        _ => Vec::new(),
    };

    let mut lines: Vec<String> = Vec::new();
    let mut seen_urls: Vec<String> = Vec::new();
    for record in &repo_data {
        let name = record.get("name").and_then(Value::as_str).unwrap_or_default();
        if name.is_empty() {
            continue;
        }
        let enabled = record
            .get("yumopts")
            .and_then(|o| o.get("enabled"))
            .and_then(Value::as_str)
            .map_or(true, |v| v == "1");
        if !enabled {
            continue;
        }
        let mirror_locally = record
            .get("mirror_locally")
            .and_then(Value::as_bool)
            .unwrap_or(true);
        let baseurl = if mirror_locally {
            format!("http://{}/{}/repo_mirror/{}", http_server, prefix, name)
        } else {
            record
                .get("mirror")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string()
        };
        if baseurl.is_empty() || seen_urls.contains(&baseurl) {
            continue;
        }
        seen_urls.push(baseurl.clone());
        lines.push(format!("repo --name={} --baseurl={}", name, baseurl));
    }
    lines.join("\n")
}

/// A post-install snippet pointing the installed machine's package
/// manager back at this server's mirror config endpoint.
fn mirror_config_stanza(blended: &Blended, kind: ItemKind, name: &str) -> String {
    let http_server = blended
        .get("http_server")
        .and_then(Value::as_str)
        .unwrap_or("127.0.0.1");
    let prefix = blended
        .get("service_prefix")
        .and_then(Value::as_str)
        .unwrap_or("bootforge/svc");
    format!(
        "curl \"http://{}/{}/op/yum/{}/{}\" --output /etc/yum.repos.d/bootforge-config.repo",
        http_server, prefix, kind, name
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::template::VariableTemplateEngine;
    use bootforge_core::config::Settings;
    use bootforge_items::{Distro, Item, Profile, Repo, SaveOptions, System};
    use bootforge_store::FileCatalog;
    use serde_json::json;
    use tempfile::TempDir;

    struct Fixture {
        _temp: TempDir,
        generator: AutoinstallGenerator,
        manager: Arc<CollectionManager>,
    }

    fn quiet() -> SaveOptions {
        SaveOptions {
            with_triggers: false,
            with_sync: false,
            ..SaveOptions::default()
        }
    }

    fn fixture(breed: &str, template: &str) -> Fixture {
        let temp = TempDir::new().unwrap();
        let kernel = temp.path().join("vmlinuz");
        let initrd = temp.path().join("initrd.img");
        std::fs::write(&kernel, "k").unwrap();
        std::fs::write(&initrd, "i").unwrap();

        let autoinstall_dir = temp.path().join("autoinstall");
        std::fs::create_dir_all(&autoinstall_dir).unwrap();
        std::fs::write(autoinstall_dir.join("default.ks"), template).unwrap();

        let mut settings = Settings::default();
        settings.server = "boot.example.com".to_string();
        settings.autoinstall_dir = autoinstall_dir;
        settings.storage_dir = temp.path().join("collections");

        let storage = Box::new(FileCatalog::open(&settings.storage_dir).unwrap());
        let manager = Arc::new(CollectionManager::new(settings, storage));
        manager.load().unwrap();

        let mut distro = Distro::new("fedora");
        distro.kernel = kernel.to_string_lossy().to_string();
        distro.initrd = initrd.to_string_lossy().to_string();
        distro.set_field("breed", &json!(breed)).unwrap();
        manager.add_distro(distro, &quiet()).unwrap();

        let mut profile = Profile::new("web");
        profile.distro = "fedora".to_string();
        manager.add_profile(profile, &quiet()).unwrap();

        let mut system = System::new("box1");
        system.profile = Some("web".to_string());
        manager.add_system(system, &quiet()).unwrap();

        let generator = AutoinstallGenerator::new(
            manager.clone(),
            Arc::new(VariableTemplateEngine::new()),
        );
        Fixture {
            _temp: temp,
            generator,
            manager,
        }
    }

    #[test]
    fn test_renders_blended_variables() {
        let fixture = fixture("redhat", "install $distro_name for $profile_name\n");
        let rendered = fixture.generator.generate_profile("web").unwrap();
        assert_eq!(rendered, "install fedora for web\n");
    }

    #[test]
    fn test_meta_keys_override_blended_keys() {
        let fixture = fixture("redhat", "tree is $tree\n");
        let mut profile = fixture.manager.profiles().get("web").unwrap().clone();
        profile
            .set_field("autoinstall_meta", &json!("tree=http://boot/tree"))
            .unwrap();
        fixture
            .manager
            .add_profile(
                profile,
                &SaveOptions {
                    overwrite: true,
                    with_triggers: false,
                    with_sync: false,
                    ..SaveOptions::default()
                },
            )
            .unwrap();

        let rendered = fixture.generator.generate_profile("web").unwrap();
        assert_eq!(rendered, "tree is http://boot/tree\n");
    }

    #[test]
    fn test_repo_stanza_synthesizes_mirror_urls() {
        let fixture = fixture("redhat", "$repo_stanza\n");

        let mut local = Repo::new("base");
        local.mirror = "rsync://upstream/base".to_string();
        local.mirror_locally = true;
        fixture.manager.add_repo(local, &quiet()).unwrap();

        let mut upstream = Repo::new("extras");
        upstream.mirror = "http://upstream/extras".to_string();
        upstream.mirror_locally = false;
        fixture.manager.add_repo(upstream, &quiet()).unwrap();

        let mut profile = fixture.manager.profiles().get("web").unwrap().clone();
        profile.set_field("repos", &json!("base extras")).unwrap();
        fixture
            .manager
            .add_profile(
                profile,
                &SaveOptions {
                    overwrite: true,
                    with_triggers: false,
                    with_sync: false,
                    ..SaveOptions::default()
                },
            )
            .unwrap();

        let rendered = fixture.generator.generate_profile("web").unwrap();
        assert!(rendered
            .contains("repo --name=base --baseurl=http://boot.example.com/bootforge/svc/repo_mirror/base"));
        assert!(rendered.contains("repo --name=extras --baseurl=http://upstream/extras"));
    }

    #[test]
    fn test_system_rendering_merges_chain_options() {
        let fixture = fixture("redhat", "opts: $kernel_options\n");

        let mut distro = fixture.manager.distros().get("fedora").unwrap().clone();
        distro.set_field("kernel_options", &json!("a=1 b=2")).unwrap();
        fixture
            .manager
            .add_distro(
                distro,
                &SaveOptions {
                    overwrite: true,
                    with_triggers: false,
                    with_sync: false,
                    ..SaveOptions::default()
                },
            )
            .unwrap();

        let mut system = fixture.manager.systems().get("box1").unwrap().clone();
        system.set_field("kernel_options", &json!("b=9")).unwrap();
        fixture
            .manager
            .add_system(
                system,
                &SaveOptions {
                    overwrite: true,
                    with_triggers: false,
                    with_sync: false,
                    ..SaveOptions::default()
                },
            )
            .unwrap();

        let rendered = fixture.generator.generate_system("box1").unwrap();
        assert!(rendered.contains("a=1"));
        assert!(rendered.contains("b=9"));
        assert!(!rendered.contains("b=2"));
    }

    #[test]
    fn test_suse_breed_gets_xml_postprocessing() {
        let fixture = fixture(
            "suse",
            "<?xml version=\"1.0\"?>\n<profile><software/></profile>",
        );
        let rendered = fixture.generator.generate_profile("web").unwrap();
        assert!(rendered.contains("<bootforge>"));
        assert!(rendered.contains("<server>boot.example.com</server>"));
        assert!(rendered.contains("init-scripts"));
    }

    #[test]
    fn test_answer_file_url_shape() {
        let fixture = fixture("redhat", "x");
        let blended = blend(&fixture.manager, false, ItemKind::Profile, "web").unwrap();
        assert_eq!(
            answer_file_url(&blended, ItemKind::Profile, "web"),
            "http://boot.example.com/bootforge/svc/op/ks/profile/web"
        );
    }

    #[test]
    fn test_breed_answer_option() {
        assert_eq!(breed_answer_option("redhat"), "ks");
        assert_eq!(breed_answer_option("suse"), "autoyast");
        assert_eq!(breed_answer_option("ubuntu"), "preseed/url");
    }
}
