//! Add/edit/remove/list/report for every item kind.

use super::AppContext;
use crate::cli::ObjectCommand;
use anyhow::{anyhow, bail, Result};
use bootforge_items::{
    Distro, FileResource, Image, Item, MgmtClass, Package, Profile, Repo, SaveOptions, System,
};
use bootforge_types::{ItemKind, MacAddress};
use colored::Colorize;
use serde_json::Value;

pub fn run(ctx: &AppContext, kind: ItemKind, action: &ObjectCommand) -> Result<()> {
    match action {
        ObjectCommand::Add {
            name,
            set,
            interface,
            mac,
            ip,
            dns_name,
            dhcp_tag,
        } => add(
            ctx,
            kind,
            name,
            set,
            interface.as_deref(),
            mac.as_deref(),
            ip.as_deref(),
            dns_name.as_deref(),
            dhcp_tag.as_deref(),
            false,
        ),
        ObjectCommand::Edit {
            name,
            set,
            interface,
            mac,
            ip,
            dns_name,
            dhcp_tag,
        } => add(
            ctx,
            kind,
            name,
            set,
            interface.as_deref(),
            mac.as_deref(),
            ip.as_deref(),
            dns_name.as_deref(),
            dhcp_tag.as_deref(),
            true,
        ),
        ObjectCommand::Remove {
            name,
            recursive,
            yes,
        } => remove(ctx, kind, name, *recursive, *yes),
        ObjectCommand::List => list(ctx, kind),
        ObjectCommand::Report { name } => report(ctx, kind, name),
    }
}

fn parse_sets(sets: &[String]) -> Result<Vec<(String, Value)>> {
    sets.iter()
        .map(|pair| {
            let (field, value) = pair
                .split_once('=')
                .ok_or_else(|| anyhow!("expected FIELD=VALUE, got '{}'", pair))?;
            Ok((field.to_string(), Value::String(value.to_string())))
        })
        .collect()
}

fn apply_sets<T: Item>(item: &mut T, sets: &[(String, Value)]) -> Result<()> {
    for (field, value) in sets {
        item.set_field(field, value)?;
    }
    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn add(
    ctx: &AppContext,
    kind: ItemKind,
    name: &str,
    sets: &[String],
    interface: Option<&str>,
    mac: Option<&str>,
    ip: Option<&str>,
    dns_name: Option<&str>,
    dhcp_tag: Option<&str>,
    edit: bool,
) -> Result<()> {
    let sets = parse_sets(sets)?;
    if edit && sets.iter().any(|(field, _)| field == "name") {
        bail!("renaming is not supported; remove the item and add it under the new name");
    }
    let opts = SaveOptions {
        overwrite: edit,
        ..SaveOptions::default()
    };
    let mgr = &ctx.manager;

    if interface.is_some() && kind != ItemKind::System {
        bail!("--interface only applies to systems");
    }

    match kind {
        ItemKind::Distro => {
            let mut item = fetch_or_new(edit, || mgr.distros().get(name).cloned(), || Distro::new(name), kind, name)?;
            apply_sets(&mut item, &sets)?;
            mgr.add_distro(item, &opts)?;
        }
        ItemKind::Profile => {
            let mut item = fetch_or_new(edit, || mgr.profiles().get(name).cloned(), || Profile::new(name), kind, name)?;
            apply_sets(&mut item, &sets)?;
            mgr.add_profile(item, &opts)?;
        }
        ItemKind::System => {
            let mut item = fetch_or_new(edit, || mgr.systems().get(name).cloned(), || System::new(name), kind, name)?;
            apply_sets(&mut item, &sets)?;
            if let Some(if_name) = interface {
                let mut iface = item.interfaces.get(if_name).cloned().unwrap_or_default();
                if let Some(mac) = mac {
                    iface.mac_address = Some(MacAddress::new(mac)?);
                }
                if let Some(ip) = ip {
                    iface.ip_address = ip.to_string();
                }
                if let Some(dns_name) = dns_name {
                    iface.dns_name = dns_name.to_string();
                }
                if let Some(dhcp_tag) = dhcp_tag {
                    iface.dhcp_tag = dhcp_tag.to_string();
                }
                item.set_interface(if_name, iface);
            }
            mgr.add_system(item, &opts)?;
        }
        ItemKind::Repo => {
            let mut item = fetch_or_new(edit, || mgr.repos().get(name).cloned(), || Repo::new(name), kind, name)?;
            apply_sets(&mut item, &sets)?;
            mgr.add_repo(item, &opts)?;
        }
        ItemKind::Image => {
            let mut item = fetch_or_new(edit, || mgr.images().get(name).cloned(), || Image::new(name), kind, name)?;
            apply_sets(&mut item, &sets)?;
            mgr.add_image(item, &opts)?;
        }
        ItemKind::MgmtClass => {
            let mut item = fetch_or_new(edit, || mgr.mgmtclasses().get(name).cloned(), || MgmtClass::new(name), kind, name)?;
            apply_sets(&mut item, &sets)?;
            mgr.add_mgmtclass(item, &opts)?;
        }
        ItemKind::Package => {
            let mut item = fetch_or_new(edit, || mgr.packages().get(name).cloned(), || Package::new(name), kind, name)?;
            apply_sets(&mut item, &sets)?;
            mgr.add_package(item, &opts)?;
        }
        ItemKind::File => {
            let mut item = fetch_or_new(edit, || mgr.files().get(name).cloned(), || FileResource::new(name), kind, name)?;
            apply_sets(&mut item, &sets)?;
            mgr.add_file(item, &opts)?;
        }
        ItemKind::Settings => bail!("settings are edited via the settings document"),
    }

    let verb = if edit { "Updated" } else { "Added" };
    println!("{} {} '{}'", verb.green().bold(), kind, name);
    Ok(())
}

fn fetch_or_new<T>(
    edit: bool,
    fetch: impl FnOnce() -> Option<T>,
    fresh: impl FnOnce() -> T,
    kind: ItemKind,
    name: &str,
) -> Result<T> {
    if edit {
        fetch().ok_or_else(|| anyhow!("{} '{}' not found", kind, name))
    } else {
        Ok(fresh())
    }
}

fn remove(ctx: &AppContext, kind: ItemKind, name: &str, recursive: bool, yes: bool) -> Result<()> {
    if !yes {
        let confirmed = dialoguer::Confirm::new()
            .with_prompt(format!("Remove {} '{}'?", kind, name))
            .default(false)
            .interact()?;
        if !confirmed {
            println!("{}", "Aborted".yellow());
            return Ok(());
        }
    }

    ctx.manager.remove(
        kind,
        name,
        &bootforge_items::RemoveOptions {
            recursive,
            ..Default::default()
        },
    )?;
    println!("{} {} '{}'", "Removed".green().bold(), kind, name);
    Ok(())
}

fn list(ctx: &AppContext, kind: ItemKind) -> Result<()> {
    let names = match kind {
        ItemKind::Distro => ctx.manager.distros().names(),
        ItemKind::Profile => ctx.manager.profiles().names(),
        ItemKind::System => ctx.manager.systems().names(),
        ItemKind::Repo => ctx.manager.repos().names(),
        ItemKind::Image => ctx.manager.images().names(),
        ItemKind::MgmtClass => ctx.manager.mgmtclasses().names(),
        ItemKind::Package => ctx.manager.packages().names(),
        ItemKind::File => ctx.manager.files().names(),
        ItemKind::Settings => Vec::new(),
    };
    for name in names {
        println!("{}", name);
    }
    Ok(())
}

fn report(ctx: &AppContext, kind: ItemKind, name: &str) -> Result<()> {
    let record = ctx.manager.item_record(kind, name)?;
    print!("{}", serde_yaml::to_string(&record)?);
    Ok(())
}
