//! Finalize selected entries into a protocol snapshot.

use protokol_core::finalize::finalize_batch;
use protokol_core::{GateFailure, ProtocolError};

use crate::app::AppContext;
use crate::cli::FinalizeArgs;
use crate::helpers::{parse_month_arg, parse_queue_type};
use crate::output::snapshot_json;
use crate::ui::{self, Badge, UiContext};

/// Turn a gate failure into the operator-facing instruction.
fn gate_hint(failure: &GateFailure) -> &'static str {
    match failure {
        GateFailure::EmptySelection => "Select at least one entry.",
        GateFailure::MissingStaffSignature { .. } => {
            "Add a staff signature (transfer or return leg) first."
        }
        GateFailure::QueueMismatch { .. } => {
            "Route all selected entries to the same queue (courier or point) first."
        }
        GateFailure::AlreadyFinalized { .. } => {
            "The entry is already in the protocol; edit it to promote it again."
        }
    }
}

pub fn handle_finalize(ctx: &AppContext, args: &FinalizeArgs) -> anyhow::Result<()> {
    let month = parse_month_arg(&args.scope.month)?;
    let kind = parse_queue_type(&args.queue_type)?;

    let mut store = ctx.open_store()?;
    let ui_ctx = UiContext::from_env(args.json);

    let snapshot = match finalize_batch(&mut store, &args.scope.client, &month, &args.indices, kind)
    {
        Ok(snapshot) => snapshot,
        Err(ProtocolError::Gate(failure)) => {
            eprintln!(
                "{}",
                ui::badge(&ui_ctx, Badge::Err, &failure.to_string())
            );
            eprintln!("{}", gate_hint(&failure));
            return Err(anyhow::anyhow!("Finalization rejected"));
        }
        Err(err) => return Err(anyhow::anyhow!("{}", err)),
    };

    if ui_ctx.mode.is_json() {
        println!("{}", serde_json::to_string_pretty(&snapshot_json(&snapshot))?);
        return Ok(());
    }

    if !ctx.quiet() {
        println!(
            "{}",
            ui::badge(
                &ui_ctx,
                Badge::Ok,
                &format!(
                    "Added {} entr(ies) to protocol {} ({} packages)",
                    snapshot.total_transfers, snapshot.id, snapshot.total_packages
                )
            )
        );
        println!("Show it with `protokol snapshot show {}`.", snapshot.id);
    }
    Ok(())
}
