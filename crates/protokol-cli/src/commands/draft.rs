//! Draft cache commands: the in-progress entry form per client × month.

use protokol_core::model::EntryDraft;
use protokol_core::MonthLedger;

use crate::app::AppContext;
use crate::cli::{DraftSaveArgs, ScopeArgs};
use crate::helpers::{parse_date_arg, parse_month_arg, parse_service, parse_tool_pairs};
use crate::ui::UiContext;

pub fn handle_save(ctx: &AppContext, args: &DraftSaveArgs) -> anyhow::Result<()> {
    let month = parse_month_arg(&args.scope.month)?;
    let draft = EntryDraft {
        date: args.date.as_deref().map(parse_date_arg).transpose()?,
        tools: parse_tool_pairs(&args.tools)?,
        packages: args.packages,
        service: parse_service(&args.service)?,
        comment: args.comment.clone(),
    };

    let mut store = ctx.open_store()?;
    let mut ledger = MonthLedger::open(&mut store, &args.scope.client, &month)
        .map_err(|e| anyhow::anyhow!("{}", e))?;
    ledger
        .save_draft(&draft)
        .map_err(|e| anyhow::anyhow!("{}", e))?;

    if !ctx.quiet() {
        println!("Draft saved for {} {}", args.scope.client, month);
    }
    Ok(())
}

pub fn handle_show(ctx: &AppContext, scope: &ScopeArgs, json: bool) -> anyhow::Result<()> {
    let month = parse_month_arg(&scope.month)?;
    let mut store = ctx.open_store()?;
    let ledger = MonthLedger::open(&mut store, &scope.client, &month)
        .map_err(|e| anyhow::anyhow!("{}", e))?;
    let draft = ledger.load_draft().map_err(|e| anyhow::anyhow!("{}", e))?;

    let ui_ctx = UiContext::from_env(json);
    if ui_ctx.mode.is_json() {
        println!("{}", serde_json::to_string_pretty(&draft)?);
        return Ok(());
    }

    match draft {
        None => println!("No saved draft for {} {}.", scope.client, month),
        Some(draft) => {
            println!(
                "Date: {}",
                draft
                    .date
                    .map(|d| d.format("%Y-%m-%d").to_string())
                    .unwrap_or_else(|| "—".to_string())
            );
            for tool in &draft.tools {
                println!("  {} = {}", tool.name, tool.count);
            }
            println!("Packages: {}", draft.packages);
            println!("Service: {}", draft.service.label());
            if !draft.comment.is_empty() {
                println!("Comment: {}", draft.comment);
            }
        }
    }
    Ok(())
}

pub fn handle_clear(ctx: &AppContext, scope: &ScopeArgs) -> anyhow::Result<()> {
    let month = parse_month_arg(&scope.month)?;
    let mut store = ctx.open_store()?;
    let mut ledger = MonthLedger::open(&mut store, &scope.client, &month)
        .map_err(|e| anyhow::anyhow!("{}", e))?;
    ledger.clear_draft().map_err(|e| anyhow::anyhow!("{}", e))?;

    if !ctx.quiet() {
        println!("Draft cleared for {} {}", scope.client, month);
    }
    Ok(())
}
