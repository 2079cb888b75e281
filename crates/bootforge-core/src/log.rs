//! Logging initialization for bootforge.

use bootforge_types::Result;
use tracing_subscriber::EnvFilter;

/// Initialize the logging system with the default filter.
///
/// Honors `RUST_LOG` when set; defaults to `bootforge=info` otherwise.
pub fn init_default() -> Result<()> {
    init_with_filter("bootforge=info")
}

/// Initialize the logging system with an explicit filter directive.
pub fn init_with_filter(directive: &str) -> Result<()> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(directive));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_level(true)
        .try_init()
        .ok();

    Ok(())
}
