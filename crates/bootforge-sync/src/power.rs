//! Power management commands.
//!
//! Encapsulates the fence-agent invocation so operators don't have to
//! remember per-vendor syntax. Commands run synchronously with a fixed
//! retry budget and a fixed sleep between attempts; some power switches
//! are flaky.

use bootforge_core::util::process::run_with_retries;
use bootforge_items::CollectionManager;
use bootforge_types::{ForgeError, ItemKind, PowerAction, Result};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

/// Runs power-management commands against a system's configured fence
/// agent.
pub struct PowerManager {
    manager: Arc<CollectionManager>,
    fence_prefix: String,
}

impl PowerManager {
    /// Create a power manager using the conventional `fence_` agents.
    pub fn new(manager: Arc<CollectionManager>) -> Self {
        Self {
            manager,
            fence_prefix: "fence_".to_string(),
        }
    }

    /// Override the fence-agent binary prefix (used by tests and
    /// nonstandard agent installs).
    pub fn with_fence_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.fence_prefix = prefix.into();
        self
    }

    /// Run one power action against a system.
    ///
    /// `Reboot` is off, a fixed sleep, then on.
    pub fn run(&self, system_name: &str, action: PowerAction) -> Result<String> {
        if action == PowerAction::Reboot {
            let settings = self.manager.settings();
            self.run(system_name, PowerAction::Off)?;
            std::thread::sleep(Duration::from_secs(settings.power_retry_delay_secs));
            return self.run(system_name, PowerAction::On);
        }

        let system = self
            .manager
            .systems()
            .get(system_name)
            .cloned()
            .ok_or_else(|| ForgeError::NotFound {
                kind: ItemKind::System,
                name: system_name.to_string(),
            })?;

        let power = &system.power;
        if power.power_type.is_empty() {
            return Err(ForgeError::Power(format!(
                "System '{}' has no power type configured",
                system_name
            )));
        }

        let command = format!("{}{}", self.fence_prefix, power.power_type);
        let mut args: Vec<String> = Vec::new();
        for (flag, value) in [
            ("-a", &power.power_address),
            ("-l", &power.power_user),
            ("-p", &power.power_pass),
            ("-n", &power.power_id),
        ] {
            if !value.is_empty() {
                args.push(flag.to_string());
                args.push(value.clone());
            }
        }
        args.push("-o".to_string());
        args.push(action.to_string());

        let settings = self.manager.settings();
        info!(
            "power {} on system '{}' via {}",
            action, system_name, command
        );
        let arg_refs: Vec<&str> = args.iter().map(String::as_str).collect();
        let (stdout, code, stderr) = run_with_retries(
            &command,
            &arg_refs,
            settings.power_retries,
            Duration::from_secs(settings.power_retry_delay_secs),
        )?;

        if code != 0 {
            return Err(ForgeError::Power(format!(
                "{} exited {} for system '{}': {}",
                command,
                code,
                system_name,
                stderr.trim()
            )));
        }
        Ok(stdout)
    }
}
