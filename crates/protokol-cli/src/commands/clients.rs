//! Client directory commands.
//!
//! The directory is owned by an external system; the CLI only lists it
//! and seeds rows so the ledger has clients to work against.

use protokol_core::model::Client;
use protokol_core::ProtocolStore;

use crate::app::AppContext;
use crate::cli::ClientAddArgs;
use crate::helpers::slug_from_name;
use crate::ui::{self, UiContext};

pub fn handle_list(ctx: &AppContext, json: bool) -> anyhow::Result<()> {
    let store = ctx.open_store()?;
    let clients = store.list_clients().map_err(|e| anyhow::anyhow!("{}", e))?;

    let ui_ctx = UiContext::from_env(json);
    if ui_ctx.mode.is_json() {
        println!("{}", serde_json::to_string_pretty(&clients)?);
        return Ok(());
    }

    if clients.is_empty() {
        if !ctx.quiet() {
            println!("No clients. Add one with `protokol clients add`.");
        }
        return Ok(());
    }

    let rows = clients
        .iter()
        .map(|c| {
            vec![
                c.id.clone(),
                c.name.clone(),
                c.address.clone(),
                c.tax_id.clone(),
                c.logistics.clone(),
            ]
        })
        .collect();
    println!(
        "{}",
        ui::table(&ui_ctx, &["ID", "Nazwa", "Adres", "NIP/PESEL", "Logistyka"], rows)
    );
    Ok(())
}

pub fn handle_add(ctx: &AppContext, args: &ClientAddArgs) -> anyhow::Result<()> {
    let id = match &args.id {
        Some(id) => id.trim().to_string(),
        None => slug_from_name(&args.name),
    };
    if id.is_empty() {
        return Err(anyhow::anyhow!(
            "Cannot derive an id from {:?}; pass --id",
            args.name
        ));
    }

    let mut store = ctx.open_store()?;
    store
        .upsert_client(&Client {
            id: id.clone(),
            name: args.name.clone(),
            address: args.address.clone(),
            tax_id: args.tax_id.clone(),
            logistics: args.logistics.clone(),
        })
        .map_err(|e| anyhow::anyhow!("{}", e))?;

    if !ctx.quiet() {
        println!("Saved client {}", id);
    }
    Ok(())
}
