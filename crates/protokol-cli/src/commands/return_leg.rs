//! Return-leg completion commands.

use protokol_core::storage::ReturnUpdate;
use protokol_core::MonthLedger;

use crate::app::AppContext;
use crate::cli::{ReturnSetArgs, ScopeArgs};
use crate::helpers::{parse_date_arg, parse_month_arg, parse_tool_pairs};
use crate::ui::{self, Badge, UiContext};

pub fn handle_set(ctx: &AppContext, args: &ReturnSetArgs) -> anyhow::Result<()> {
    let month = parse_month_arg(&args.scope.month)?;

    let update = ReturnUpdate {
        return_date: args.date.as_deref().map(parse_date_arg).transpose()?,
        tools: if args.tools.is_empty() {
            None
        } else {
            Some(parse_tool_pairs(&args.tools)?)
        },
        return_packages: args.packages,
        match_transfer: args.match_transfer,
        return_service: None,
    };
    if update.return_date.is_none()
        && update.tools.is_none()
        && update.return_packages.is_none()
        && !update.match_transfer
    {
        return Err(anyhow::anyhow!(
            "Nothing to record; pass --date, --tool, --packages or --match-transfer"
        ));
    }

    let mut store = ctx.open_store()?;
    let mut ledger = MonthLedger::open(&mut store, &args.scope.client, &month)
        .map_err(|e| anyhow::anyhow!("{}", e))?;
    let entry = ledger
        .record_return(args.index, &update)
        .map_err(|e| anyhow::anyhow!("{}", e))?;

    if !ctx.quiet() {
        let date = entry
            .return_date
            .map(|d| d.format("%Y-%m-%d").to_string())
            .unwrap_or_else(|| "—".to_string());
        println!("Recorded return for entry {} (return date {})", args.index, date);
    }
    Ok(())
}

pub fn handle_bulk(
    ctx: &AppContext,
    scope: &ScopeArgs,
    date: &str,
    indices: &[usize],
) -> anyhow::Result<()> {
    let month = parse_month_arg(&scope.month)?;
    let date = parse_date_arg(date)?;

    let mut store = ctx.open_store()?;
    let mut ledger = MonthLedger::open(&mut store, &scope.client, &month)
        .map_err(|e| anyhow::anyhow!("{}", e))?;
    let outcome = ledger
        .bulk_return_date(indices, date)
        .map_err(|e| anyhow::anyhow!("{}", e))?;

    let ui_ctx = UiContext::from_env(false);
    if !ctx.quiet() {
        println!(
            "{}",
            ui::badge(
                &ui_ctx,
                if outcome.is_clean() { Badge::Ok } else { Badge::Warn },
                &format!("Return date set on {} entr(ies)", outcome.succeeded.len())
            )
        );
    }
    for (index, error) in &outcome.failed {
        eprintln!(
            "{}",
            ui::badge(&ui_ctx, Badge::Err, &format!("entry {}: {}", index, error))
        );
    }
    if !outcome.is_clean() {
        return Err(anyhow::anyhow!(
            "{} of {} updates failed",
            outcome.failed.len(),
            indices.len()
        ));
    }
    Ok(())
}
