//! End-to-end artifact generation tests.

use bootforge_autoinstall::VariableTemplateEngine;
use bootforge_core::config::Settings;
use bootforge_items::{
    CollectionManager, Distro, Item, NetworkInterface, Profile, RemoveOptions, SaveOptions, System,
};
use bootforge_store::FileCatalog;
use bootforge_sync::{LiteSyncEngine, PowerManager, SyncEngine};
use bootforge_types::{ItemKind, MacAddress, PowerAction};
use serde_json::json;
use std::sync::Arc;
use tempfile::TempDir;

struct Fixture {
    temp: TempDir,
    manager: Arc<CollectionManager>,
    engine: Arc<SyncEngine>,
}

fn quiet() -> SaveOptions {
    SaveOptions {
        with_triggers: false,
        with_sync: false,
        ..SaveOptions::default()
    }
}

fn overwrite_quiet() -> SaveOptions {
    SaveOptions {
        overwrite: true,
        with_triggers: false,
        with_sync: false,
        ..SaveOptions::default()
    }
}

fn fixture() -> Fixture {
    let temp = TempDir::new().unwrap();

    let autoinstall_dir = temp.path().join("autoinstall-templates");
    std::fs::create_dir_all(&autoinstall_dir).unwrap();
    std::fs::write(
        autoinstall_dir.join("default.ks"),
        "install $distro_name\nkopts: $kernel_options\n$repo_stanza\n",
    )
    .unwrap();

    let mut settings = Settings::default();
    settings.server = "10.0.0.1".to_string();
    settings.next_server = "10.0.0.1".to_string();
    settings.tftpboot_dir = temp.path().join("tftpboot");
    settings.webdir = temp.path().join("www");
    settings.autoinstall_dir = autoinstall_dir;
    settings.storage_dir = temp.path().join("collections");
    settings.manage_dhcp = true;
    settings.manage_dns = true;
    settings.dhcp_config_path = temp.path().join("dhcpd.conf");
    settings.dns_zone_dir = temp.path().join("zones");
    settings.manage_forward_zones =
        vec!["example.com".to_string(), "b.example.com".to_string()];
    settings.manage_reverse_zones = vec!["10.0".to_string(), "10.0.0".to_string()];

    let storage = Box::new(FileCatalog::open(&settings.storage_dir).unwrap());
    let manager = Arc::new(CollectionManager::new(settings, storage));
    manager.load().unwrap();

    let engine = Arc::new(SyncEngine::new(
        manager.clone(),
        Arc::new(VariableTemplateEngine::new()),
    ));

    Fixture {
        temp,
        manager,
        engine,
    }
}

/// distro D -> profile P -> system S with eth0 mac AA.. ip 10.0.0.5
fn populate(fixture: &Fixture) {
    let kernel = fixture.temp.path().join("vmlinuz");
    let initrd = fixture.temp.path().join("initrd.img");
    std::fs::write(&kernel, "kernel-bytes").unwrap();
    std::fs::write(&initrd, "initrd-bytes").unwrap();

    let mut distro = Distro::new("fedora");
    distro.kernel = kernel.to_string_lossy().to_string();
    distro.initrd = initrd.to_string_lossy().to_string();
    distro
        .set_field("kernel_options", &json!("console=ttyS0 quiet"))
        .unwrap();
    fixture.manager.add_distro(distro, &quiet()).unwrap();

    let mut profile = Profile::new("web");
    profile.distro = "fedora".to_string();
    fixture.manager.add_profile(profile, &quiet()).unwrap();

    let mut system = System::new("box1");
    system.profile = Some("web".to_string());
    system.set_field("kernel_options", &json!("quiet=off")).unwrap();
    system.set_interface(
        "eth0",
        NetworkInterface {
            mac_address: Some(MacAddress::new("AA:BB:CC:DD:EE:FF").unwrap()),
            ip_address: "10.0.0.5".to_string(),
            dns_name: "a.b.example.com".to_string(),
            ..Default::default()
        },
    );
    fixture.manager.add_system(system, &quiet()).unwrap();
}

#[test]
fn end_to_end_full_sync() {
    let fixture = fixture();
    populate(&fixture);

    let report = fixture.engine.full_sync().unwrap();
    assert!(report.is_clean(), "failures: {:?}", report.failures);

    let settings = fixture.manager.settings();

    // PXE config keyed by the system's MAC
    let pxe = settings
        .tftpboot_dir
        .join("pxelinux.cfg")
        .join("01-aa-bb-cc-dd-ee-ff");
    assert!(pxe.exists());
    let pxe_text = std::fs::read_to_string(&pxe).unwrap();
    assert!(pxe_text.contains("/images/fedora/vmlinuz"));
    assert!(pxe_text.contains("ks=http://10.0.0.1/bootforge/svc/op/ks/system/box1"));

    // boot images copied into both trees
    assert!(settings
        .tftpboot_dir
        .join("images")
        .join("fedora")
        .join("vmlinuz")
        .exists());
    assert!(settings
        .webdir
        .join("images")
        .join("fedora")
        .join("initrd.img")
        .exists());

    // aggregate menu regenerated with the profile entry
    let menu = std::fs::read_to_string(
        settings.tftpboot_dir.join("pxelinux.cfg").join("default"),
    )
    .unwrap();
    assert!(menu.contains("LABEL web"));

    // DHCP config has the MAC and the fixed address
    let dhcp = std::fs::read_to_string(&settings.dhcp_config_path).unwrap();
    assert!(dhcp.contains("aa:bb:cc:dd:ee:ff"));
    assert!(dhcp.contains("fixed-address 10.0.0.5;"));

    // rendered answer file reflects merged kernel options: the system
    // override wins, the distro-only option survives
    let ks = std::fs::read_to_string(
        settings.webdir.join("autoinstall").join("systems").join("box1"),
    )
    .unwrap();
    assert!(ks.contains("install fedora"));
    assert!(ks.contains("console=ttyS0"));
    assert!(ks.contains("quiet=off"));
}

#[test]
fn dns_longest_suffix_match_wins() {
    let fixture = fixture();
    populate(&fixture);

    let report = fixture.engine.full_sync().unwrap();
    assert!(report.is_clean());

    let settings = fixture.manager.settings();

    // host a.b.example.com goes to b.example.com, not example.com
    let specific =
        std::fs::read_to_string(settings.dns_zone_dir.join("db.b.example.com")).unwrap();
    assert!(specific.contains("a\tIN\tA\t10.0.0.5"));

    let broad = std::fs::read_to_string(settings.dns_zone_dir.join("db.example.com")).unwrap();
    assert!(!broad.contains("10.0.0.5"));

    // reverse: 10.0.0.5 goes to the longer 10.0.0 prefix
    let reverse = std::fs::read_to_string(settings.dns_zone_dir.join("db.10.0.0")).unwrap();
    assert!(reverse.contains("5\tIN\tPTR\ta.b.example.com."));
    let shorter = std::fs::read_to_string(settings.dns_zone_dir.join("db.10.0")).unwrap();
    assert!(!shorter.contains("PTR\ta.b.example.com"));
}

#[test]
fn unmatched_interface_is_skipped_not_fatal() {
    let fixture = fixture();
    populate(&fixture);

    let mut system = System::new("outsider");
    system.profile = Some("web".to_string());
    system.set_interface(
        "eth0",
        NetworkInterface {
            mac_address: Some(MacAddress::new("11:22:33:44:55:66").unwrap()),
            ip_address: "192.168.9.9".to_string(),
            dns_name: "host.elsewhere.net".to_string(),
            ..Default::default()
        },
    );
    fixture.manager.add_system(system, &quiet()).unwrap();

    let report = fixture.engine.full_sync().unwrap();
    assert!(report.is_clean());

    let settings = fixture.manager.settings();
    for zone in ["db.example.com", "db.b.example.com", "db.10.0", "db.10.0.0"] {
        let text = std::fs::read_to_string(settings.dns_zone_dir.join(zone)).unwrap();
        assert!(!text.contains("elsewhere"), "{} leaked into {}", "elsewhere", zone);
    }
}

#[test]
fn dhcp_tags_group_stanzas() {
    let fixture = fixture();
    populate(&fixture);

    let mut tagged = System::new("box2");
    tagged.profile = Some("web".to_string());
    tagged.set_interface(
        "eth0",
        NetworkInterface {
            mac_address: Some(MacAddress::new("DE:AD:BE:EF:00:01").unwrap()),
            ip_address: "10.0.0.6".to_string(),
            dhcp_tag: "lab".to_string(),
            ..Default::default()
        },
    );
    fixture.manager.add_system(tagged, &quiet()).unwrap();

    fixture.engine.full_sync().unwrap();

    let dhcp =
        std::fs::read_to_string(&fixture.manager.settings().dhcp_config_path).unwrap();
    assert!(dhcp.contains("# group for dhcp tag: lab"));
    let group_pos = dhcp.find("group {").unwrap();
    let tagged_pos = dhcp.find("de:ad:be:ef:00:01").unwrap();
    assert!(tagged_pos > group_pos);
    // untagged host is outside the group, before it
    let untagged_pos = dhcp.find("aa:bb:cc:dd:ee:ff").unwrap();
    assert!(untagged_pos < group_pos);
}

#[test]
fn netboot_disabled_system_gets_local_boot_config() {
    let fixture = fixture();
    populate(&fixture);

    let mut system = fixture.manager.systems().get("box1").unwrap().clone();
    system.set_field("netboot_enabled", &json!("no")).unwrap();
    fixture.manager.add_system(system, &overwrite_quiet()).unwrap();

    fixture.engine.full_sync().unwrap();

    let pxe = std::fs::read_to_string(
        fixture
            .manager
            .settings()
            .tftpboot_dir
            .join("pxelinux.cfg")
            .join("01-aa-bb-cc-dd-ee-ff"),
    )
    .unwrap();
    assert!(pxe.contains("localboot"));
}

#[test]
fn resolution_failure_is_collected_not_fatal() {
    let fixture = fixture();
    populate(&fixture);

    // plant a system with a broken chain straight into the backend and
    // reload through a fresh manager
    let settings = fixture.manager.settings();
    let catalog = FileCatalog::open(&settings.storage_dir).unwrap();
    use bootforge_types::Storage;
    catalog
        .serialize_item(
            ItemKind::System,
            "broken",
            &json!({"name": "broken", "profile": "ghost", "depth": 2}),
        )
        .unwrap();

    let manager = Arc::new(CollectionManager::new(
        settings.clone(),
        Box::new(FileCatalog::open(&settings.storage_dir).unwrap()),
    ));
    manager.load().unwrap();
    let engine = SyncEngine::new(manager.clone(), Arc::new(VariableTemplateEngine::new()));

    let report = engine.full_sync().unwrap();
    // the broken system failed, everything else synced
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].name, "broken");
    assert!(settings
        .tftpboot_dir
        .join("pxelinux.cfg")
        .join("01-aa-bb-cc-dd-ee-ff")
        .exists());
}

#[test]
fn lite_sync_cascades_from_profile_change() {
    let fixture = fixture();
    populate(&fixture);
    fixture.engine.full_sync().unwrap();

    let settings = fixture.manager.settings();
    let system_ks = settings.webdir.join("autoinstall").join("systems").join("box1");
    std::fs::remove_file(&system_ks).unwrap();

    // wire the incremental engine and save the profile again: the
    // descendant system's artifacts must regenerate
    let lite = Arc::new(LiteSyncEngine::new(
        fixture.engine.clone(),
        fixture.manager.clone(),
    ));
    fixture.manager.set_lite_sync(lite);

    let profile = fixture.manager.profiles().get("web").unwrap().clone();
    fixture
        .manager
        .add_profile(
            profile,
            &SaveOptions {
                overwrite: true,
                with_triggers: false,
                ..SaveOptions::default()
            },
        )
        .unwrap();

    assert!(system_ks.exists());
}

#[test]
fn removing_system_drops_its_artifacts() {
    let fixture = fixture();
    populate(&fixture);
    fixture.engine.full_sync().unwrap();

    let settings = fixture.manager.settings();
    let pxe = settings
        .tftpboot_dir
        .join("pxelinux.cfg")
        .join("01-aa-bb-cc-dd-ee-ff");
    assert!(pxe.exists());

    let lite = Arc::new(LiteSyncEngine::new(
        fixture.engine.clone(),
        fixture.manager.clone(),
    ));
    fixture.manager.set_lite_sync(lite);

    fixture
        .manager
        .remove(
            ItemKind::System,
            "box1",
            &RemoveOptions {
                with_triggers: false,
                ..RemoveOptions::default()
            },
        )
        .unwrap();

    assert!(!pxe.exists());
}

#[test]
fn cancellation_stops_between_objects() {
    let fixture = fixture();
    populate(&fixture);

    let token = fixture.engine.cancel_token();
    token.cancel();
    let report = fixture.engine.full_sync().unwrap();
    assert!(report.cancelled);

    // after re-arming the token the next run completes normally
    token.reset();
    let report = fixture.engine.full_sync().unwrap();
    assert!(!report.cancelled);
}

#[cfg(unix)]
#[test]
fn sync_triggers_fire_around_the_run() {
    use bootforge_triggers::TriggerRunner;
    use std::os::unix::fs::PermissionsExt;

    let fixture = fixture();
    populate(&fixture);

    let trigger_dir = fixture.temp.path().join("triggers");
    let post_dir = trigger_dir.join("sync").join("post");
    std::fs::create_dir_all(&post_dir).unwrap();
    let marker = fixture.temp.path().join("sync-ran");
    let script = post_dir.join("10-marker");
    std::fs::write(&script, format!("#!/bin/sh\ntouch {}\n", marker.display())).unwrap();
    std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).unwrap();

    let engine = SyncEngine::new(
        fixture.manager.clone(),
        Arc::new(VariableTemplateEngine::new()),
    )
    .with_triggers(Arc::new(TriggerRunner::new(&trigger_dir)));

    engine.full_sync().unwrap();
    assert!(marker.exists());
}

#[test]
fn power_command_runs_fence_agent() {
    let fixture = fixture();
    populate(&fixture);

    let mut system = fixture.manager.systems().get("box1").unwrap().clone();
    system.set_field("power_type", &json!("true")).unwrap();
    system.set_field("power_address", &json!("10.0.0.99")).unwrap();
    fixture.manager.add_system(system, &overwrite_quiet()).unwrap();

    // fence prefix emptied so the agent resolves to /usr/bin/true
    let power = PowerManager::new(fixture.manager.clone()).with_fence_prefix("");
    assert!(power.run("box1", PowerAction::On).is_ok());

    let mut system = fixture.manager.systems().get("box1").unwrap().clone();
    system.set_field("power_type", &json!("false")).unwrap();
    fixture.manager.add_system(system, &overwrite_quiet()).unwrap();
    assert!(power.run("box1", PowerAction::Off).is_err());
}
