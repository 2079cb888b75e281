//! Show an item's effective configuration.

use super::AppContext;
use anyhow::Result;
use bootforge_types::ItemKind;

pub fn run(ctx: &AppContext, kind: &str, name: &str, flatten: bool) -> Result<()> {
    let kind: ItemKind = kind.parse()?;
    let blended = bootforge_resolver::blend(&ctx.manager, flatten, kind, name)?;

    // IndexMap keeps resolution order; serialize as a plain map for display
    let map: serde_json::Map<String, serde_json::Value> = blended.into_iter().collect();
    print!("{}", serde_yaml::to_string(&map)?);
    Ok(())
}
