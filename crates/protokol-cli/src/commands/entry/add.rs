//! Add and duplicate entry handlers.

use protokol_core::model::EntryDraft;
use protokol_core::MonthLedger;

use crate::app::AppContext;
use crate::cli::{EntryAddArgs, ScopeArgs};
use crate::helpers::{
    ensure_date_in_month, parse_date_arg, parse_month_arg, parse_service, parse_tool_pairs,
};
use crate::ui::{self, Badge, UiContext};

pub fn handle_add(ctx: &AppContext, args: &EntryAddArgs) -> anyhow::Result<()> {
    let month = parse_month_arg(&args.scope.month)?;
    let mut store = ctx.open_store()?;
    let mut ledger = MonthLedger::open(&mut store, &args.scope.client, &month)
        .map_err(|e| anyhow::anyhow!("{}", e))?;

    // the saved draft is the base when requested; flags override it
    let mut draft = if args.from_draft {
        ledger
            .load_draft()
            .map_err(|e| anyhow::anyhow!("{}", e))?
            .ok_or_else(|| anyhow::anyhow!("No saved draft for {} {}", args.scope.client, month))?
    } else {
        EntryDraft::default()
    };

    if let Some(date) = &args.date {
        draft.date = Some(parse_date_arg(date)?);
    }
    if !args.tools.is_empty() {
        draft.tools = parse_tool_pairs(&args.tools)?;
    }
    if let Some(packages) = args.packages {
        draft.packages = packages;
    }
    if args.service != "none" || !args.from_draft {
        draft.service = parse_service(&args.service)?;
    }
    if !args.comment.is_empty() {
        draft.comment = args.comment.clone();
    }

    if let Some(date) = draft.date {
        ensure_date_in_month(date, &month)?;
    }

    let index = ledger.create(&draft).map_err(|e| anyhow::anyhow!("{}", e))?;

    if !ctx.quiet() {
        let ui_ctx = UiContext::from_env(false);
        println!(
            "{}",
            ui::badge(
                &ui_ctx,
                Badge::Ok,
                &format!("Added entry {} to {} {}", index, args.scope.client, month)
            )
        );
    }
    Ok(())
}

pub fn handle_duplicate(ctx: &AppContext, scope: &ScopeArgs, source: usize) -> anyhow::Result<()> {
    let month = parse_month_arg(&scope.month)?;
    let mut store = ctx.open_store()?;
    let mut ledger = MonthLedger::open(&mut store, &scope.client, &month)
        .map_err(|e| anyhow::anyhow!("{}", e))?;

    let draft = ledger
        .duplicate(source)
        .map_err(|e| anyhow::anyhow!("{}", e))?;
    ledger
        .save_draft(&draft)
        .map_err(|e| anyhow::anyhow!("{}", e))?;

    if !ctx.quiet() {
        println!(
            "Copied entry {} into the draft for {} {}.",
            source, scope.client, month
        );
        println!("Review with `protokol draft show`, then `protokol entry add --from-draft --date <DATE>`.");
    }
    Ok(())
}
