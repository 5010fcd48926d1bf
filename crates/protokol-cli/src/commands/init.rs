//! Store initialization.

use protokol_core::{ProtocolStore, SqliteStore};

use crate::app::{resolve_config_path, AppContext};
use crate::cli::InitArgs;
use crate::config::{default_store_path, write_config, ProtokolConfig};
use crate::helpers::read_signature_image;

pub fn handle_init(ctx: &AppContext, args: &InitArgs) -> anyhow::Result<()> {
    let store_path = match &args.path {
        Some(path) => std::path::PathBuf::from(path),
        None => default_store_path()?,
    };

    let mut store = SqliteStore::create(&store_path).map_err(|e| anyhow::anyhow!("{}", e))?;

    if let Some(file) = &args.staff_signature {
        let image = read_signature_image(file)?;
        store
            .set_default_staff_signature(&image)
            .map_err(|e| anyhow::anyhow!("{}", e))?;
    }

    if !args.no_config {
        let config_path = resolve_config_path()?;
        let config = ProtokolConfig::new(store_path.clone(), args.staff_signature.clone());
        write_config(&config_path, &config)?;
        if !ctx.quiet() {
            println!("Config written to {}", config_path.display());
        }
    }

    if !ctx.quiet() {
        println!("Store created at {}", store_path.display());
    }
    Ok(())
}
