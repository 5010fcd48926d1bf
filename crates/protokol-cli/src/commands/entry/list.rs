//! List entries of one client × month.

use protokol_core::MonthLedger;

use crate::app::AppContext;
use crate::cli::EntryListArgs;
use crate::helpers::parse_month_arg;
use crate::output::{entry_json, protocol_json, entry_row, ENTRY_COLUMNS};
use crate::ui::{self, UiContext};

pub fn handle_list(ctx: &AppContext, args: &EntryListArgs) -> anyhow::Result<()> {
    let month = parse_month_arg(&args.scope.month)?;
    let mut store = ctx.open_store()?;
    let ledger = MonthLedger::open(&mut store, &args.scope.client, &month)
        .map_err(|e| anyhow::anyhow!("{}", e))?;
    let protocol = ledger.protocol();

    let ui_ctx = UiContext::from_env(args.json);
    if ui_ctx.mode.is_json() {
        if args.stored_order {
            println!("{}", serde_json::to_string_pretty(&protocol_json(protocol))?);
        } else {
            let entries: Vec<_> = ledger
                .sorted_view()
                .into_iter()
                .map(|(index, entry)| entry_json(index, entry))
                .collect();
            println!("{}", serde_json::to_string_pretty(&entries)?);
        }
        return Ok(());
    }

    if protocol.entries.is_empty() {
        if !ctx.quiet() {
            println!("No entries for {} {}.", args.scope.client, month);
        }
        return Ok(());
    }

    if !ctx.quiet() {
        println!(
            "{}",
            ui::header(
                &ui_ctx,
                "entries",
                Some(&format!("{} {}", args.scope.client, month))
            )
        );
    }

    let rows: Vec<Vec<String>> = if args.stored_order {
        protocol
            .entries
            .iter()
            .enumerate()
            .map(|(index, entry)| entry_row(index, entry))
            .collect()
    } else {
        ledger
            .sorted_view()
            .into_iter()
            .map(|(index, entry)| entry_row(index, entry))
            .collect()
    };
    println!("{}", ui::table(&ui_ctx, &ENTRY_COLUMNS, rows));

    if !ctx.quiet() {
        let hidden = protocol.entries.len()
            - if args.stored_order {
                protocol.entries.len()
            } else {
                ledger.sorted_view().len()
            };
        if hidden > 0 {
            println!(
                "{} entries have unreadable dates; use --stored-order to see all.",
                hidden
            );
        }
        println!(
            "Razem przekazań: {}  Razem pakietów: {}",
            protocol.entries.len(),
            protocol.totals.total_packages
        );
    }
    Ok(())
}
