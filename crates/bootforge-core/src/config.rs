//! The global settings document.
//!
//! Settings are one YAML document, not a collection: every field has a
//! serde default so a partial file (or none at all) still yields a fully
//! usable configuration. The resolver uses [`Settings::blend_map`] as the
//! base layer every inheritance chain bottoms out on.

use bootforge_types::{ForgeError, Result};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::{Path, PathBuf};

/// Global settings for the provisioning server.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Address provisioned machines use to reach this server
    pub server: String,

    /// TFTP next-server address handed out in DHCP responses
    pub next_server: String,

    /// HTTP port the install tree and answer files are served from
    pub http_port: u16,

    /// URL prefix for generated install-time service endpoints
    pub service_prefix: String,

    /// TFTP root the boot tree is generated under
    pub tftpboot_dir: PathBuf,

    /// Web root rendered answer files and install trees are published under
    pub webdir: PathBuf,

    /// Persistence backend name (`file` or `sqlite`)
    pub storage_backend: String,

    /// Root directory of the file-catalog backend
    pub storage_dir: PathBuf,

    /// Database path for the sqlite backend
    pub database_path: PathBuf,

    /// Root directory filesystem triggers are discovered under
    pub trigger_dir: PathBuf,

    /// Directory answer-file templates are read from
    pub autoinstall_dir: PathBuf,

    /// Directory service config templates (dhcp, zones) are read from
    pub templates_dir: PathBuf,

    /// Whether sync writes a DHCP configuration
    pub manage_dhcp: bool,

    /// Whether sync writes DNS zone files
    pub manage_dns: bool,

    /// DHCP config output path
    pub dhcp_config_path: PathBuf,

    /// Directory DNS zone files are written to
    pub dns_zone_dir: PathBuf,

    /// Forward zones eligible to hold interface DNS names
    pub manage_forward_zones: Vec<String>,

    /// Reverse zones (network prefixes) eligible to hold interface IPs
    pub manage_reverse_zones: Vec<String>,

    /// Kernel options applied when no object in a chain sets them
    pub kernel_options: IndexMap<String, Value>,

    /// Owners applied when no object in a chain sets them
    pub default_ownership: Vec<String>,

    /// Answer-file template used when no object in a chain names one
    pub default_autoinstall: String,

    /// Whether provisioned systems report back to disable netboot
    pub pxe_just_once: bool,

    /// Whether rendered answer files call install triggers
    pub run_install_triggers: bool,

    /// Whether generated boot menus list profiles
    pub enable_menu: bool,

    /// Attempts for one power management command
    pub power_retries: u32,

    /// Sleep between power command attempts, in seconds
    pub power_retry_delay_secs: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server: "127.0.0.1".to_string(),
            next_server: "127.0.0.1".to_string(),
            http_port: 80,
            service_prefix: "bootforge/svc".to_string(),
            tftpboot_dir: PathBuf::from("/var/lib/tftpboot"),
            webdir: PathBuf::from("/var/www/bootforge"),
            storage_backend: "file".to_string(),
            storage_dir: PathBuf::from("/var/lib/bootforge/collections"),
            database_path: PathBuf::from("/var/lib/bootforge/bootforge.db"),
            trigger_dir: PathBuf::from("/var/lib/bootforge/triggers"),
            autoinstall_dir: PathBuf::from("/var/lib/bootforge/autoinstall"),
            templates_dir: PathBuf::from("/etc/bootforge/templates"),
            manage_dhcp: false,
            manage_dns: false,
            dhcp_config_path: PathBuf::from("/etc/dhcp/dhcpd.conf"),
            dns_zone_dir: PathBuf::from("/var/named"),
            manage_forward_zones: Vec::new(),
            manage_reverse_zones: Vec::new(),
            kernel_options: IndexMap::new(),
            default_ownership: vec!["admin".to_string()],
            default_autoinstall: "default.ks".to_string(),
            pxe_just_once: false,
            run_install_triggers: true,
            enable_menu: true,
            power_retries: 3,
            power_retry_delay_secs: 1,
        }
    }
}

impl Settings {
    /// Load settings from a YAML document.
    ///
    /// A missing file yields the defaults; a present but partial file is
    /// filled in field by field.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .map_err(|e| ForgeError::Config(format!("Failed to read settings {:?}: {}", path, e)))?;

        serde_yaml::from_str(&content)
            .map_err(|e| ForgeError::Config(format!("Failed to parse settings {:?}: {}", path, e)))
    }

    /// Save settings to a YAML document.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| ForgeError::Config(format!("Failed to create {:?}: {}", parent, e)))?;
        }

        let content = serde_yaml::to_string(self)
            .map_err(|e| ForgeError::Config(format!("Failed to serialize settings: {}", e)))?;

        std::fs::write(path, content)
            .map_err(|e| ForgeError::Config(format!("Failed to write settings {:?}: {}", path, e)))
    }

    /// The `server` address with the HTTP port appended when non-default.
    pub fn http_server(&self) -> String {
        if self.http_port == 80 {
            self.server.clone()
        } else {
            format!("{}:{}", self.server, self.http_port)
        }
    }

    /// The whole document as one raw record (used by persistence).
    pub fn to_record(&self) -> Result<Value> {
        serde_json::to_value(self).map_err(Into::into)
    }

    /// Rebuild settings from a raw record.
    pub fn from_record(record: &Value) -> Result<Self> {
        serde_json::from_value(record.clone()).map_err(Into::into)
    }

    /// The defaults every inheritance chain bottoms out on.
    ///
    /// Only fields an item can meaningfully override appear here; paths
    /// and backend wiring stay out of blended configurations.
    pub fn blend_map(&self) -> IndexMap<String, Value> {
        let mut map = IndexMap::new();
        map.insert("server".to_string(), Value::String(self.server.clone()));
        map.insert(
            "next_server".to_string(),
            Value::String(self.next_server.clone()),
        );
        map.insert("http_port".to_string(), Value::from(self.http_port));
        map.insert(
            "service_prefix".to_string(),
            Value::String(self.service_prefix.clone()),
        );
        map.insert(
            "kernel_options".to_string(),
            Value::Object(self.kernel_options.clone().into_iter().collect()),
        );
        map.insert(
            "owners".to_string(),
            Value::Array(
                self.default_ownership
                    .iter()
                    .map(|o| Value::String(o.clone()))
                    .collect(),
            ),
        );
        map.insert(
            "autoinstall".to_string(),
            Value::String(self.default_autoinstall.clone()),
        );
        map.insert("enable_menu".to_string(), Value::Bool(self.enable_menu));
        map.insert("pxe_just_once".to_string(), Value::Bool(self.pxe_just_once));
        map.insert(
            "run_install_triggers".to_string(),
            Value::Bool(self.run_install_triggers),
        );
        map.insert("manage_dhcp".to_string(), Value::Bool(self.manage_dhcp));
        map.insert("manage_dns".to_string(), Value::Bool(self.manage_dns));
        map
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.http_port, 80);
        assert_eq!(settings.storage_backend, "file");
        assert_eq!(settings.power_retries, 3);
        assert!(!settings.manage_dhcp);
    }

    #[test]
    fn test_missing_file_yields_defaults() {
        let settings = Settings::load("/nonexistent/settings.yaml").unwrap();
        assert_eq!(settings.server, "127.0.0.1");
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("settings.yaml");
        std::fs::write(&path, "server: 10.0.0.1\nmanage_dhcp: true\n").unwrap();

        let settings = Settings::load(&path).unwrap();
        assert_eq!(settings.server, "10.0.0.1");
        assert!(settings.manage_dhcp);
        // untouched fields keep defaults
        assert_eq!(settings.http_port, 80);
        assert_eq!(settings.default_ownership, vec!["admin".to_string()]);
    }

    #[test]
    fn test_save_round_trip() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("sub").join("settings.yaml");

        let mut settings = Settings::default();
        settings.server = "192.168.1.1".to_string();
        settings.manage_forward_zones = vec!["example.com".to_string()];
        settings.save(&path).unwrap();

        let back = Settings::load(&path).unwrap();
        assert_eq!(back.server, "192.168.1.1");
        assert_eq!(back.manage_forward_zones, vec!["example.com".to_string()]);
    }

    #[test]
    fn test_http_server_port_handling() {
        let mut settings = Settings::default();
        settings.server = "boot.example.com".to_string();
        assert_eq!(settings.http_server(), "boot.example.com");

        settings.http_port = 8080;
        assert_eq!(settings.http_server(), "boot.example.com:8080");
    }
}
