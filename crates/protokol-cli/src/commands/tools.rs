//! Tool dictionary commands.

use protokol_core::ProtocolStore;

use crate::app::AppContext;
use crate::ui::{self, UiContext};

pub fn handle_list(ctx: &AppContext, json: bool) -> anyhow::Result<()> {
    let store = ctx.open_store()?;
    let catalog = store.tool_catalog().map_err(|e| anyhow::anyhow!("{}", e))?;

    let ui_ctx = UiContext::from_env(json);
    if ui_ctx.mode.is_json() {
        println!("{}", serde_json::to_string_pretty(&catalog)?);
        return Ok(());
    }

    if catalog.cosmetic.is_empty() && catalog.medical.is_empty() {
        if !ctx.quiet() {
            println!("Tool dictionary is empty. Add names with `protokol tools add`.");
        }
        return Ok(());
    }

    let mut rows = Vec::new();
    for name in &catalog.cosmetic {
        rows.push(vec!["cosmetic".to_string(), name.clone()]);
    }
    for name in &catalog.medical {
        rows.push(vec!["medical".to_string(), name.clone()]);
    }
    println!("{}", ui::table(&ui_ctx, &["Kategoria", "Nazwa"], rows));
    Ok(())
}

pub fn handle_add(ctx: &AppContext, category: &str, names: &[String]) -> anyhow::Result<()> {
    let mut store = ctx.open_store()?;
    let mut catalog = store.tool_catalog().map_err(|e| anyhow::anyhow!("{}", e))?;

    let target = match category {
        "cosmetic" => &mut catalog.cosmetic,
        "medical" => &mut catalog.medical,
        other => {
            return Err(anyhow::anyhow!(
                "Unknown category {other:?} (use cosmetic or medical)"
            ))
        }
    };
    let mut added = 0usize;
    for name in names {
        let name = name.trim();
        if !name.is_empty() && !target.iter().any(|existing| existing == name) {
            target.push(name.to_string());
            added += 1;
        }
    }

    store
        .save_tool_catalog(&catalog)
        .map_err(|e| anyhow::anyhow!("{}", e))?;
    if !ctx.quiet() {
        println!("Added {} name(s) to {}", added, category);
    }
    Ok(())
}
