//! Queue routing commands.

use protokol_core::MonthLedger;
use protokol_core::ProtocolStore;

use crate::app::AppContext;
use crate::cli::ScopeArgs;
use crate::helpers::{parse_month_arg, parse_queue_type};
use crate::output::queue_items_json;
use crate::ui::{self, BatchProgress, UiContext};

pub fn handle_set(
    ctx: &AppContext,
    scope: &ScopeArgs,
    queue_type: &str,
    indices: &[usize],
) -> anyhow::Result<()> {
    let month = parse_month_arg(&scope.month)?;
    let kind = parse_queue_type(queue_type)?;

    let mut store = ctx.open_store()?;
    let mut ledger = MonthLedger::open(&mut store, &scope.client, &month)
        .map_err(|e| anyhow::anyhow!("{}", e))?;
    ledger
        .route_selection(indices, kind)
        .map_err(|e| anyhow::anyhow!("{}", e))?;

    if !ctx.quiet() {
        println!(
            "Marked {} entr(ies) for signing via {}",
            indices.len(),
            kind.as_str()
        );
    }
    Ok(())
}

pub fn handle_clear(ctx: &AppContext, scope: &ScopeArgs, indices: &[usize]) -> anyhow::Result<()> {
    let month = parse_month_arg(&scope.month)?;
    let mut store = ctx.open_store()?;
    let mut ledger = MonthLedger::open(&mut store, &scope.client, &month)
        .map_err(|e| anyhow::anyhow!("{}", e))?;

    let ui_ctx = UiContext::from_env(false);
    let progress = BatchProgress::new(&ui_ctx, indices.len(), "Clearing");
    for &index in indices {
        ledger
            .clear_queue(index)
            .map_err(|e| anyhow::anyhow!("entry {}: {}", index, e))?;
        progress.tick();
    }
    progress.finish();

    if !ctx.quiet() {
        println!("Cleared queue flags on {} entr(ies)", indices.len());
    }
    Ok(())
}

pub fn handle_list(
    ctx: &AppContext,
    queue_type: &str,
    month: Option<&str>,
    json: bool,
) -> anyhow::Result<()> {
    let kind = parse_queue_type(queue_type)?;
    let month = month.map(parse_month_arg).transpose()?;

    let store = ctx.open_store()?;
    let items = store
        .sign_queue(kind, month.as_deref())
        .map_err(|e| anyhow::anyhow!("{}", e))?;

    let ui_ctx = UiContext::from_env(json);
    if ui_ctx.mode.is_json() {
        println!("{}", serde_json::to_string_pretty(&queue_items_json(&items))?);
        return Ok(());
    }

    if items.is_empty() {
        if !ctx.quiet() {
            println!("Queue {} is empty.", kind.as_str());
        }
        return Ok(());
    }

    let rows = items
        .iter()
        .map(|item| {
            vec![
                item.client_name.clone(),
                item.month.clone(),
                item.index.to_string(),
                item.date.clone(),
                item.packages.to_string(),
                item.courier_planned_date
                    .map(|d| d.format("%Y-%m-%d").to_string())
                    .unwrap_or_else(|| "—".to_string()),
            ]
        })
        .collect();
    println!(
        "{}",
        ui::table(
            &ui_ctx,
            &["Klient", "Miesiąc", "#", "Data", "Pakiety", "Planowany kurier"],
            rows
        )
    );
    Ok(())
}
