//! DNS zone file generation.
//!
//! Each interface's `dns_name` lands in the longest configured forward
//! zone suffix that matches it; each IP lands in the longest configured
//! reverse network prefix. An interface matching no configured zone is
//! skipped with a debug log, never an error.

use bootforge_core::util::fs::mkdir_p;
use bootforge_items::CollectionManager;
use bootforge_types::{ForgeError, Result};
use indexmap::IndexMap;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

/// Writes forward and reverse zone files for managed zones.
pub(crate) struct DnsGen {
    manager: Arc<CollectionManager>,
}

impl DnsGen {
    pub(crate) fn new(manager: Arc<CollectionManager>) -> Self {
        Self { manager }
    }

    /// Regenerate every managed zone file.
    pub(crate) fn regen(&self) -> Result<()> {
        let settings = self.manager.settings();
        mkdir_p(&settings.dns_zone_dir)?;

        let forward = self.forward_zones(&settings.manage_forward_zones);
        for (zone, hosts) in &forward {
            let records: Vec<String> = hosts
                .iter()
                .map(|(host, ip)| format!("{}\tIN\tA\t{}", host, ip))
                .collect();
            self.write_zone(&settings.dns_zone_dir, zone, &records)?;
        }

        let reverse = self.reverse_zones(&settings.manage_reverse_zones);
        for (zone, hosts) in &reverse {
            let records: Vec<String> = hosts
                .iter()
                .map(|(suffix, name)| format!("{}\tIN\tPTR\t{}.", suffix, name))
                .collect();
            self.write_zone(&settings.dns_zone_dir, zone, &records)?;
        }

        Ok(())
    }

    /// Place every named interface into its best matching forward zone.
    ///
    /// Returned map: zone -> (short host name -> ip).
    pub(crate) fn forward_zones(&self, zones: &[String]) -> IndexMap<String, IndexMap<String, String>> {
        let mut result: IndexMap<String, IndexMap<String, String>> = IndexMap::new();
        for zone in zones {
            result.insert(zone.clone(), IndexMap::new());
        }

        for system in self.manager.systems().iter() {
            for interface in system.interfaces.values() {
                let host = &interface.dns_name;
                let ip = &interface.ip_address;
                if host.is_empty() || ip.is_empty() {
                    continue;
                }

                let mut best: Option<&String> = None;
                for zone in zones {
                    if host.ends_with(&format!(".{}", zone))
                        && zone.len() > best.map_or(0, |b| b.len())
                    {
                        best = Some(zone);
                    }
                }
                let Some(zone) = best else {
                    debug!("dns name '{}' matches no managed forward zone", host);
                    continue;
                };

                let short = host
                    .strip_suffix(&format!(".{}", zone))
                    .unwrap_or(host)
                    .to_string();
                result
                    .entry(zone.clone())
                    .or_default()
                    .insert(short, ip.clone());
            }
        }
        result
    }

    /// Place every addressed interface into its best matching reverse
    /// network prefix.
    ///
    /// Returned map: zone -> (in-zone ip suffix -> dns name).
    pub(crate) fn reverse_zones(&self, zones: &[String]) -> IndexMap<String, IndexMap<String, String>> {
        let mut result: IndexMap<String, IndexMap<String, String>> = IndexMap::new();
        for zone in zones {
            result.insert(zone.clone(), IndexMap::new());
        }

        for system in self.manager.systems().iter() {
            for interface in system.interfaces.values() {
                let ip = &interface.ip_address;
                let host = &interface.dns_name;
                if ip.is_empty() || host.is_empty() {
                    continue;
                }

                let mut best: Option<&String> = None;
                for zone in zones {
                    if ip.starts_with(&format!("{}.", zone)) && zone.len() > best.map_or(0, |b| b.len())
                    {
                        best = Some(zone);
                    }
                }
                let Some(zone) = best else {
                    debug!("ip '{}' matches no managed reverse zone", ip);
                    continue;
                };

                let suffix = ip
                    .strip_prefix(&format!("{}.", zone))
                    .unwrap_or(ip)
                    .to_string();
                result
                    .entry(zone.clone())
                    .or_default()
                    .insert(suffix, host.clone());
            }
        }
        result
    }

    fn write_zone(&self, dir: &Path, zone: &str, records: &[String]) -> Result<()> {
        let body = records.join("\n");

        // content-derived serial keeps re-syncs deterministic while still
        // changing whenever a record does
        let mut hasher = DefaultHasher::new();
        body.hash(&mut hasher);
        let serial = hasher.finish() % 100_000_000;

        let content = format!(
            "$TTL 3600\n\
@\tIN\tSOA\tns.{zone}.\thostmaster.{zone}. (\n\
\t{serial} ; serial\n\
\t3600 ; refresh\n\
\t900 ; retry\n\
\t604800 ; expire\n\
\t3600 ; minimum\n\
)\n\
@\tIN\tNS\tns.{zone}.\n\
\n\
{body}\n",
            zone = zone,
            serial = serial,
            body = body
        );

        let path = dir.join(format!("db.{}", zone));
        std::fs::write(&path, content)
            .map_err(|e| ForgeError::Sync(format!("Failed to write {:?}: {}", path, e)))?;
        debug!("regenerated zone file {:?}", path);
        Ok(())
    }
}
