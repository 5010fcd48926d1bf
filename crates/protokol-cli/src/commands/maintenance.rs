//! Store maintenance and month summarization.

use protokol_core::{MonthLedger, ProtocolStore};

use crate::app::AppContext;
use crate::cli::SummarizeArgs;
use crate::helpers::parse_month_arg;
use crate::ui::{self, Badge, UiContext};

pub fn handle_check(ctx: &AppContext) -> anyhow::Result<()> {
    let store = ctx.open_store()?;
    let ui_ctx = UiContext::from_env(false);

    let metadata = store.metadata().map_err(|e| anyhow::anyhow!("{}", e))?;
    if !ctx.quiet() {
        println!(
            "{}",
            ui::kv(&ui_ctx, "Format", &metadata.format_version)
        );
        println!(
            "{}",
            ui::kv(
                &ui_ctx,
                "Created",
                &metadata.created_at.format("%Y-%m-%d %H:%M").to_string()
            )
        );
    }

    match store.check_integrity() {
        Ok(()) => {
            println!("{}", ui::badge(&ui_ctx, Badge::Ok, "Store is consistent"));
            Ok(())
        }
        Err(err) => {
            eprintln!("{}", ui::badge(&ui_ctx, Badge::Err, &err.to_string()));
            Err(anyhow::anyhow!("Integrity check failed"))
        }
    }
}

pub fn handle_summarize(ctx: &AppContext, args: &SummarizeArgs) -> anyhow::Result<()> {
    let month = parse_month_arg(&args.scope.month)?;
    let mut store = ctx.open_store()?;
    let mut ledger = MonthLedger::open(&mut store, &args.scope.client, &month)
        .map_err(|e| anyhow::anyhow!("{}", e))?;
    ledger
        .set_summarized(!args.undo)
        .map_err(|e| anyhow::anyhow!("{}", e))?;

    if !ctx.quiet() {
        let verb = if args.undo { "reopened" } else { "closed" };
        println!("Protocol {} {} {}", args.scope.client, month, verb);
    }
    Ok(())
}
