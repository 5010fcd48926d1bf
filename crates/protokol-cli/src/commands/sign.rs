//! Signature capture commands.

use serde::Deserialize;

use protokol_core::signature::{Leg, SignatureParty, SignatureSession, SignatureSlot};
use protokol_core::storage::SignatureWrite;
use protokol_core::MonthLedger;
use protokol_core::ProtocolStore;

use crate::app::AppContext;
use crate::cli::{ScopeArgs, SignAddArgs, SignPadArgs};
use crate::helpers::{
    parse_leg, parse_month_arg, parse_party, read_signature_image,
};
use crate::ui::{BatchProgress, UiContext};

pub fn handle_add(ctx: &AppContext, args: &SignAddArgs) -> anyhow::Result<()> {
    let month = parse_month_arg(&args.scope.month)?;
    let leg = parse_leg(&args.leg)?;

    let mut write = SignatureWrite::new(leg);
    if let Some(file) = &args.client_sig {
        write.client = Some(read_signature_image(file)?);
    }
    if let Some(file) = &args.staff_sig {
        write.staff = Some(read_signature_image(file)?);
    }
    write.use_default_staff = args.default_staff;
    if write.is_empty() {
        return Err(anyhow::anyhow!(
            "No signatures to save; pass --client-sig, --staff-sig or --default-staff"
        ));
    }

    let mut store = ctx.open_store()?;
    let mut ledger = MonthLedger::open(&mut store, &args.scope.client, &month)
        .map_err(|e| anyhow::anyhow!("{}", e))?;

    let ui_ctx = UiContext::from_env(false);
    let progress = BatchProgress::new(&ui_ctx, args.indices.len(), "Signing");
    for &index in &args.indices {
        ledger
            .sign_entries(&[index], std::slice::from_ref(&write))
            .map_err(|e| anyhow::anyhow!("entry {}: {}", index, e))?;
        progress.tick();
    }
    progress.finish();

    if !ctx.quiet() {
        println!(
            "Signatures saved ({} leg) on {} entr(ies)",
            leg.as_str(),
            args.indices.len()
        );
    }
    Ok(())
}

pub fn handle_remove(
    ctx: &AppContext,
    scope: &ScopeArgs,
    index: usize,
    leg: &str,
    who: &str,
) -> anyhow::Result<()> {
    let month = parse_month_arg(&scope.month)?;
    let leg = parse_leg(leg)?;
    let party = parse_party(who)?;

    let mut store = ctx.open_store()?;
    let mut ledger = MonthLedger::open(&mut store, &scope.client, &month)
        .map_err(|e| anyhow::anyhow!("{}", e))?;
    ledger
        .delete_signature(index, leg, party)
        .map_err(|e| anyhow::anyhow!("{}", e))?;

    if !ctx.quiet() {
        println!(
            "Removed {} {} signature from entry {}",
            leg.as_str(),
            party.as_str(),
            index
        );
    }
    Ok(())
}

/// Ink strokes for one leg: a list of polylines per party.
#[derive(Debug, Default, Deserialize)]
struct LegStrokes {
    #[serde(default)]
    client: Vec<Vec<(u32, u32)>>,
    #[serde(default)]
    staff: Vec<Vec<(u32, u32)>>,
}

/// Strokes file layout: `{"transfer": {"staff": [[[x,y],...]]}, ...}`.
#[derive(Debug, Default, Deserialize)]
struct StrokesFile {
    #[serde(default)]
    transfer: LegStrokes,
    #[serde(default, rename = "return")]
    return_leg: LegStrokes,
}

pub fn handle_pad(ctx: &AppContext, args: &SignPadArgs) -> anyhow::Result<()> {
    let month = parse_month_arg(&args.scope.month)?;
    let contents = std::fs::read_to_string(&args.strokes)
        .map_err(|e| anyhow::anyhow!("Failed to read {}: {}", args.strokes, e))?;
    let strokes: StrokesFile = serde_json::from_str(&contents)
        .map_err(|e| anyhow::anyhow!("Invalid strokes file {}: {}", args.strokes, e))?;

    // ink each addressed pad; untouched pads stay empty and are never
    // committed
    let mut session = SignatureSession::new();
    let slots = [
        (Leg::Transfer, SignatureParty::Client, &strokes.transfer.client),
        (Leg::Transfer, SignatureParty::Staff, &strokes.transfer.staff),
        (Leg::Return, SignatureParty::Client, &strokes.return_leg.client),
        (Leg::Return, SignatureParty::Staff, &strokes.return_leg.staff),
    ];
    for (leg, party, polylines) in slots {
        let pad = session.pad_mut(SignatureSlot::new(leg, party));
        for polyline in polylines {
            pad.stroke(polyline);
        }
    }
    if session.all_empty() {
        return Err(anyhow::anyhow!(
            "Strokes file {} draws nothing on any pad",
            args.strokes
        ));
    }

    let mut writes = Vec::new();
    for leg in [Leg::Transfer, Leg::Return] {
        let (client, staff) = session.leg_images(leg);
        if client.is_some() || staff.is_some() {
            let mut write = SignatureWrite::new(leg);
            write.client = client;
            write.staff = staff;
            writes.push(write);
        }
    }

    let mut store = ctx.open_store()?;
    let mut ledger = MonthLedger::open(&mut store, &args.scope.client, &month)
        .map_err(|e| anyhow::anyhow!("{}", e))?;
    ledger
        .sign_entries(&args.indices, &writes)
        .map_err(|e| anyhow::anyhow!("{}", e))?;

    if !ctx.quiet() {
        println!(
            "Pad signatures saved on {} entr(ies)",
            args.indices.len()
        );
    }
    Ok(())
}

pub fn handle_set_default(ctx: &AppContext, file: &str) -> anyhow::Result<()> {
    let image = read_signature_image(file)?;
    let mut store = ctx.open_store()?;
    store
        .set_default_staff_signature(&image)
        .map_err(|e| anyhow::anyhow!("{}", e))?;

    if !ctx.quiet() {
        println!("Default staff signature updated from {}", file);
    }
    Ok(())
}
