//! Full artifact sync.

use super::AppContext;
use crate::ui::progress;
use anyhow::Result;
use colored::Colorize;

pub fn run(ctx: &AppContext) -> Result<()> {
    let spinner = progress::spinner("Regenerating boot-service artifacts");
    let report = ctx.engine.full_sync()?;
    spinner.finish_and_clear();

    if report.cancelled {
        println!("{}", "Sync cancelled".yellow().bold());
        return Ok(());
    }

    if report.is_clean() {
        println!("{}", "Sync complete".green().bold());
    } else {
        println!(
            "{} with {} failure(s):",
            "Sync finished".yellow().bold(),
            report.failures.len()
        );
        for failure in &report.failures {
            println!(
                "  {} {} '{}': {}",
                "!".red(),
                failure.kind,
                failure.name,
                failure.message
            );
        }
    }
    Ok(())
}
