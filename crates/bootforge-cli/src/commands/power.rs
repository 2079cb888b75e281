//! Power-management commands.

use super::AppContext;
use anyhow::Result;
use bootforge_sync::PowerManager;
use bootforge_types::PowerAction;
use colored::Colorize;

pub fn run(ctx: &AppContext, action: &str, system: &str) -> Result<()> {
    let action: PowerAction = action.parse()?;
    let power = PowerManager::new(ctx.manager.clone());

    let output = power.run(system, action)?;
    println!("{} power {} for '{}'", "OK".green().bold(), action, system);
    if !output.trim().is_empty() {
        println!("{}", output.trim());
    }
    Ok(())
}
