//! DHCP configuration generation.

use bootforge_core::util::fs::mkdir_p;
use bootforge_items::CollectionManager;
use bootforge_types::{ForgeError, Result};
use indexmap::IndexMap;
use std::sync::Arc;
use tracing::debug;

const DHCP_HEADER: &str = "# bootforge managed dhcpd.conf - regenerated on sync, do not edit\n\
ddns-update-style interim;\n\
allow booting;\n\
allow bootp;\n\
ignore client-updates;\n\
set vendorclass = option vendor-class-identifier;\n";

/// Writes one DHCP config with one host stanza per MAC-bearing
/// interface, grouped by `dhcp_tag`.
pub(crate) struct DhcpGen {
    manager: Arc<CollectionManager>,
}

impl DhcpGen {
    pub(crate) fn new(manager: Arc<CollectionManager>) -> Self {
        Self { manager }
    }

    /// Regenerate the whole DHCP configuration.
    pub(crate) fn regen(&self) -> Result<()> {
        let settings = self.manager.settings();

        // tag -> rendered host stanzas; the default tag always exists so
        // its block renders first even when empty
        let mut tags: IndexMap<String, Vec<String>> = IndexMap::new();
        tags.insert("default".to_string(), Vec::new());

        for system in self.manager.systems().iter() {
            for (if_name, interface) in &system.interfaces {
                let Some(mac) = &interface.mac_address else {
                    continue;
                };
                let tag = if interface.dhcp_tag.is_empty() {
                    "default".to_string()
                } else {
                    interface.dhcp_tag.clone()
                };

                let mut stanza = String::new();
                stanza.push_str(&format!("host {}-{} {{\n", system.base.name, if_name));
                stanza.push_str(&format!("    hardware ethernet {};\n", mac));
                if !interface.ip_address.is_empty() {
                    stanza.push_str(&format!("    fixed-address {};\n", interface.ip_address));
                }
                let host_name = if !interface.dns_name.is_empty() {
                    &interface.dns_name
                } else {
                    &system.base.name
                };
                stanza.push_str(&format!("    option host-name \"{}\";\n", host_name));
                stanza.push_str(&format!("    next-server {};\n", settings.next_server));
                stanza.push_str("    filename \"/pxelinux.0\";\n");
                stanza.push_str("}\n");

                tags.entry(tag).or_default().push(stanza);
            }
        }

        let mut body = String::new();
        for (tag, stanzas) in &tags {
            if tag == "default" {
                for stanza in stanzas {
                    body.push_str(stanza);
                    body.push('\n');
                }
            } else {
                body.push_str(&format!("# group for dhcp tag: {}\n", tag));
                body.push_str("group {\n");
                for stanza in stanzas {
                    for line in stanza.lines() {
                        body.push_str("    ");
                        body.push_str(line);
                        body.push('\n');
                    }
                }
                body.push_str("}\n\n");
            }
        }

        let content = format!("{}\n{}", DHCP_HEADER, body);
        let path = &settings.dhcp_config_path;
        if let Some(parent) = path.parent() {
            mkdir_p(parent)?;
        }
        std::fs::write(path, content)
            .map_err(|e| ForgeError::Sync(format!("Failed to write {:?}: {}", path, e)))?;
        debug!("regenerated DHCP config {:?}", path);
        Ok(())
    }
}
