//! Remove entries, with confirmation and best-effort batch reporting.

use dialoguer::Confirm;

use protokol_core::MonthLedger;

use crate::app::AppContext;
use crate::cli::ScopeArgs;
use crate::helpers::parse_month_arg;
use crate::ui::{self, Badge, UiContext};

pub fn handle_remove(
    ctx: &AppContext,
    scope: &ScopeArgs,
    indices: &[usize],
    yes: bool,
) -> anyhow::Result<()> {
    let month = parse_month_arg(&scope.month)?;
    let ui_ctx = UiContext::from_env(false);

    if !yes {
        let confirmed = Confirm::new()
            .with_prompt(format!("Remove {} entr(ies) from {} {}?", indices.len(), scope.client, month))
            .default(false)
            .interact()
            .unwrap_or(false);
        if !confirmed {
            if !ctx.quiet() {
                println!("Aborted.");
            }
            return Ok(());
        }
    }

    let mut store = ctx.open_store()?;
    let mut ledger = MonthLedger::open(&mut store, &scope.client, &month)
        .map_err(|e| anyhow::anyhow!("{}", e))?;

    let outcome = ledger
        .remove_many(indices)
        .map_err(|e| anyhow::anyhow!("{}", e))?;

    if !ctx.quiet() {
        println!(
            "{}",
            ui::badge(
                &ui_ctx,
                if outcome.is_clean() { Badge::Ok } else { Badge::Warn },
                &format!("Removed {} entr(ies)", outcome.succeeded.len())
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
            "{} of {} deletions failed",
            outcome.failed.len(),
            indices.len()
        ));
    }
    Ok(())
}
