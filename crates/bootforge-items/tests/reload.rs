//! Reload behavior against the real persistence backends.

use bootforge_core::config::Settings;
use bootforge_items::{
    CollectionManager, Distro, Item, Profile, RemoveOptions, SaveOptions, System,
};
use bootforge_store::{FileCatalog, SqliteStore};
use bootforge_types::{ItemKind, Storage};
use serde_json::json;
use tempfile::TempDir;

fn valid_distro(name: &str, temp: &TempDir) -> Distro {
    let kernel = temp.path().join(format!("{}-vmlinuz", name));
    let initrd = temp.path().join(format!("{}-initrd", name));
    std::fs::write(&kernel, "k").unwrap();
    std::fs::write(&initrd, "i").unwrap();
    let mut distro = Distro::new(name);
    distro.kernel = kernel.to_string_lossy().to_string();
    distro.initrd = initrd.to_string_lossy().to_string();
    distro
}

fn populate(mgr: &CollectionManager, temp: &TempDir) {
    let opts = SaveOptions::default();
    mgr.add_distro(valid_distro("fedora", temp), &opts).unwrap();

    let mut base = Profile::new("base");
    base.distro = "fedora".to_string();
    mgr.add_profile(base, &opts).unwrap();

    let mut sub = Profile::new("sub");
    sub.parent = Some("base".to_string());
    mgr.add_profile(sub, &opts).unwrap();

    let mut system = System::new("box1");
    system.profile = Some("sub".to_string());
    mgr.add_system(system, &opts).unwrap();
}

#[test]
fn file_backend_reload_restores_graph() {
    let temp = TempDir::new().unwrap();
    let root = temp.path().join("collections");

    {
        let storage = Box::new(FileCatalog::open(&root).unwrap());
        let mgr = CollectionManager::new(Settings::default(), storage);
        mgr.load().unwrap();
        populate(&mgr, &temp);
    }

    let storage = Box::new(FileCatalog::open(&root).unwrap());
    let mgr = CollectionManager::new(Settings::default(), storage);
    mgr.load().unwrap();

    assert_eq!(mgr.profiles().get("sub").unwrap().depth(), 2);
    assert_eq!(mgr.systems().get("box1").unwrap().depth(), 3);
}

#[test]
fn sqlite_backend_reload_restores_graph() {
    let temp = TempDir::new().unwrap();
    let db = temp.path().join("forge.db");

    {
        let storage = Box::new(SqliteStore::open(&db).unwrap());
        let mgr = CollectionManager::new(Settings::default(), storage);
        mgr.load().unwrap();
        populate(&mgr, &temp);
    }

    let storage = Box::new(SqliteStore::open(&db).unwrap());
    let mgr = CollectionManager::new(Settings::default(), storage);
    mgr.load().unwrap();

    assert_eq!(mgr.profiles().get("sub").unwrap().depth(), 2);
    assert_eq!(mgr.systems().get("box1").unwrap().depth(), 3);
}

#[test]
fn child_record_written_before_parent_still_loads() {
    // Write records straight into the backend in the "wrong" order, the
    // way an external tool or replication job might.
    let temp = TempDir::new().unwrap();
    let root = temp.path().join("collections");
    let storage = FileCatalog::open(&root).unwrap();

    storage
        .serialize_item(
            ItemKind::Profile,
            "sub",
            &json!({"name": "sub", "parent": "base", "depth": 2}),
        )
        .unwrap();
    storage
        .serialize_item(
            ItemKind::Profile,
            "base",
            &json!({"name": "base", "distro": "fedora", "depth": 1}),
        )
        .unwrap();
    storage
        .serialize_item(
            ItemKind::Distro,
            "fedora",
            &json!({"name": "fedora", "kernel": "/k", "initrd": "/i", "depth": 0}),
        )
        .unwrap();

    let mgr = CollectionManager::new(
        Settings::default(),
        Box::new(FileCatalog::open(&root).unwrap()),
    );
    mgr.load().unwrap();

    // the parent registered first, so the child's derived depth is right
    assert_eq!(mgr.profiles().get("base").unwrap().depth(), 1);
    assert_eq!(mgr.profiles().get("sub").unwrap().depth(), 2);
}

#[test]
fn item_round_trips_through_backend() {
    let temp = TempDir::new().unwrap();
    let root = temp.path().join("collections");

    let mut distro = valid_distro("fedora", &temp);
    distro
        .set_field("kernel_options", &json!("console=ttyS0 noapic"))
        .unwrap();
    distro.set_field("comment", &json!("round trip")).unwrap();
    let before = distro.to_map().unwrap();

    {
        let storage = Box::new(FileCatalog::open(&root).unwrap());
        let mgr = CollectionManager::new(Settings::default(), storage);
        mgr.load().unwrap();
        let opts = SaveOptions {
            with_triggers: false,
            with_sync: false,
            ..SaveOptions::default()
        };
        mgr.add_distro(distro, &opts).unwrap();
    }

    let storage = Box::new(FileCatalog::open(&root).unwrap());
    let mgr = CollectionManager::new(Settings::default(), storage);
    mgr.load().unwrap();
    let after = mgr.distros().get("fedora").unwrap().to_map().unwrap();

    // mtime moves at save; everything the operator set must survive
    for field in ["name", "uid", "kernel", "initrd", "kernel_options", "comment", "arch"] {
        assert_eq!(before[field], after[field], "field {}", field);
    }
}

#[test]
fn removal_reaches_the_backend() {
    let temp = TempDir::new().unwrap();
    let root = temp.path().join("collections");

    let storage = Box::new(FileCatalog::open(&root).unwrap());
    let mgr = CollectionManager::new(Settings::default(), storage);
    mgr.load().unwrap();
    populate(&mgr, &temp);

    let recursive = RemoveOptions {
        recursive: true,
        ..RemoveOptions::default()
    };
    mgr.remove(ItemKind::Distro, "fedora", &recursive).unwrap();

    let check = FileCatalog::open(&root).unwrap();
    assert!(check.deserialize(ItemKind::Distro, true).unwrap().is_empty());
    assert!(check.deserialize(ItemKind::Profile, true).unwrap().is_empty());
    assert!(check.deserialize(ItemKind::System, true).unwrap().is_empty());
}
