//! Finalized protocol document commands.

use protokol_core::calendar::month_label;
use protokol_core::DocumentStore;

use crate::app::AppContext;
use crate::output::{reconciled_rows, snapshot_json, RECONCILED_COLUMNS};
use crate::ui::{self, UiContext};

pub fn handle_list(ctx: &AppContext, json: bool) -> anyhow::Result<()> {
    let store = ctx.open_store()?;
    let snapshots = store
        .list_snapshots()
        .map_err(|e| anyhow::anyhow!("{}", e))?;

    let ui_ctx = UiContext::from_env(json);
    if ui_ctx.mode.is_json() {
        let values: Vec<_> = snapshots.iter().map(snapshot_json).collect();
        println!("{}", serde_json::to_string_pretty(&values)?);
        return Ok(());
    }

    if snapshots.is_empty() {
        if !ctx.quiet() {
            println!("No finalized protocols yet.");
        }
        return Ok(());
    }

    let rows = snapshots
        .iter()
        .map(|s| {
            vec![
                s.id.clone(),
                s.client_name.clone(),
                month_label(&s.month),
                s.total_transfers.to_string(),
                s.total_packages.to_string(),
                s.created_at.format("%Y-%m-%d %H:%M").to_string(),
            ]
        })
        .collect();
    println!(
        "{}",
        ui::table(
            &ui_ctx,
            &["ID", "Klient", "Okres", "Przekazania", "Pakiety", "Utworzono"],
            rows
        )
    );
    Ok(())
}

pub fn handle_show(ctx: &AppContext, id: &str, json: bool) -> anyhow::Result<()> {
    let store = ctx.open_store()?;
    let snapshot = store
        .snapshot(id)
        .map_err(|e| anyhow::anyhow!("{}", e))?
        .ok_or_else(|| anyhow::anyhow!("No snapshot {:?}", id))?;

    let ui_ctx = UiContext::from_env(json);
    if ui_ctx.mode.is_json() {
        println!("{}", serde_json::to_string_pretty(&snapshot_json(&snapshot))?);
        return Ok(());
    }

    println!("Protokół przekazania narzędzi");
    println!("{}", ui::kv(&ui_ctx, "Klient", &snapshot.client_name));
    println!("{}", ui::kv(&ui_ctx, "Okres", &month_label(&snapshot.month)));
    println!(
        "{}",
        ui::kv(
            &ui_ctx,
            "Utworzono",
            &snapshot.created_at.format("%Y-%m-%d %H:%M").to_string()
        )
    );
    println!();

    for entry in &snapshot.entries {
        let return_date = entry
            .return_date
            .map(|d| d.format("%Y-%m-%d").to_string())
            .unwrap_or_else(|| "—".to_string());
        println!(
            "{} (zwrot: {}, usługa: {})",
            entry.date,
            return_date,
            entry.service.label()
        );
        println!(
            "{}",
            ui::table(&ui_ctx, &RECONCILED_COLUMNS, reconciled_rows(&entry.rows))
        );
    }

    println!(
        "Razem przekazań: {}  Razem pakietów: {}",
        snapshot.total_transfers, snapshot.total_packages
    );
    Ok(())
}
