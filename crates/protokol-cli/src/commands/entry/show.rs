//! Show one entry with its reconciled tool rows.

use protokol_core::calendar::display_date;
use protokol_core::reconcile::reconcile_entry;
use protokol_core::MonthLedger;

use crate::app::AppContext;
use crate::cli::ScopeArgs;
use crate::helpers::parse_month_arg;
use crate::output::{
    entry_json, queue_mark, reconciled_rows, signature_marks, RECONCILED_COLUMNS,
};
use crate::ui::{self, UiContext};

pub fn handle_show(
    ctx: &AppContext,
    scope: &ScopeArgs,
    index: usize,
    json: bool,
) -> anyhow::Result<()> {
    let month = parse_month_arg(&scope.month)?;
    let mut store = ctx.open_store()?;
    let ledger = MonthLedger::open(&mut store, &scope.client, &month)
        .map_err(|e| anyhow::anyhow!("{}", e))?;
    let entry = ledger.entry(index).map_err(|e| anyhow::anyhow!("{}", e))?;

    let ui_ctx = UiContext::from_env(json);
    if ui_ctx.mode.is_json() {
        let mut value = entry_json(index, entry);
        if let Some(map) = value.as_object_mut() {
            map.insert(
                "reconciled".to_string(),
                serde_json::to_value(reconcile_entry(entry))?,
            );
        }
        println!("{}", serde_json::to_string_pretty(&value)?);
        return Ok(());
    }

    let date = entry
        .parsed_date()
        .map(display_date)
        .unwrap_or_else(|| entry.date.clone());
    println!("{}", ui::kv(&ui_ctx, "Wpis", &index.to_string()));
    println!("{}", ui::kv(&ui_ctx, "Data przekazania", &date));
    println!(
        "{}",
        ui::kv(&ui_ctx, "Usługa", entry.service().label())
    );
    if !entry.comment.is_empty() {
        println!("{}", ui::kv(&ui_ctx, "Komentarz", &entry.comment));
    }
    println!(
        "{}",
        ui::kv(
            &ui_ctx,
            "Data zwrotu",
            &entry
                .effective_return_date()
                .map(display_date)
                .unwrap_or_else(|| "—".to_string())
        )
    );
    println!(
        "{}",
        ui::kv(
            &ui_ctx,
            "Podpisy",
            &format!(
                "przekazanie {} / zwrot {}",
                signature_marks(&entry.signatures.transfer),
                signature_marks(&entry.signatures.return_leg)
            )
        )
    );
    println!("{}", ui::kv(&ui_ctx, "Kolejka", &queue_mark(entry)));
    println!();
    println!(
        "{}",
        ui::table(
            &ui_ctx,
            &RECONCILED_COLUMNS,
            reconciled_rows(&reconcile_entry(entry))
        )
    );
    Ok(())
}
