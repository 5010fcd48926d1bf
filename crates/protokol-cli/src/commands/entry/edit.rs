//! Edit fields of an entry.

use protokol_core::storage::EntryPatch;
use protokol_core::MonthLedger;

use crate::app::AppContext;
use crate::cli::EntryEditArgs;
use crate::helpers::{parse_date_arg, parse_month_arg, parse_service, parse_tool_pairs};

pub fn handle_edit(ctx: &AppContext, args: &EntryEditArgs) -> anyhow::Result<()> {
    let month = parse_month_arg(&args.scope.month)?;

    let mut patch = EntryPatch::default();
    if let Some(date) = &args.date {
        patch = patch.with_date(parse_date_arg(date)?);
    }
    if !args.tools.is_empty() {
        patch = patch.with_tools(parse_tool_pairs(&args.tools)?);
    }
    if let Some(packages) = args.packages {
        patch = patch.with_packages(packages);
    }
    if let Some(service) = &args.service {
        patch = patch.with_service(parse_service(service)?);
    }
    if let Some(comment) = &args.comment {
        patch = patch.with_comment(comment.clone());
    }
    if patch.is_empty() {
        return Err(anyhow::anyhow!("Nothing to change; pass at least one field"));
    }

    let mut store = ctx.open_store()?;
    let mut ledger = MonthLedger::open(&mut store, &args.scope.client, &month)
        .map_err(|e| anyhow::anyhow!("{}", e))?;
    ledger
        .update(args.index, &patch)
        .map_err(|e| anyhow::anyhow!("{}", e))?;

    if !ctx.quiet() {
        println!("Updated entry {}", args.index);
    }
    Ok(())
}
