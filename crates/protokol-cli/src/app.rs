//! Application context for the Protokol CLI.
//!
//! Bundles the parsed CLI arguments with the lazily-loaded config so
//! handlers do not thread paths and flags individually.

use std::path::PathBuf;

use once_cell::unsync::OnceCell;

use protokol_core::SqliteStore;

use crate::cli::Cli;
use crate::config::{default_config_path, read_config, ProtokolConfig};

pub struct AppContext<'a> {
    cli: &'a Cli,
    config: OnceCell<Option<ProtokolConfig>>,
}

impl<'a> AppContext<'a> {
    pub fn new(cli: &'a Cli) -> Self {
        Self {
            cli,
            config: OnceCell::new(),
        }
    }

    /// Check if quiet mode is enabled.
    pub fn quiet(&self) -> bool {
        self.cli.quiet
    }

    /// The config file contents, if one exists.
    fn config(&self) -> anyhow::Result<&Option<ProtokolConfig>> {
        self.config.get_or_try_init(|| {
            let path = resolve_config_path()?;
            if path.exists() {
                Ok(Some(read_config(&path)?))
            } else {
                Ok(None)
            }
        })
    }

    /// Resolve the store path: `--store` flag (or `PROTOKOL_STORE`),
    /// then the config file.
    pub fn store_path(&self) -> anyhow::Result<PathBuf> {
        if let Some(path) = &self.cli.store {
            return Ok(PathBuf::from(path));
        }
        if let Some(config) = self.config()? {
            return Ok(PathBuf::from(&config.store.path));
        }
        Err(anyhow::anyhow!(
            "No store configured. Run `protokol init` or pass --store / set PROTOKOL_STORE."
        ))
    }

    /// Open the configured store.
    pub fn open_store(&self) -> anyhow::Result<SqliteStore> {
        let path = self.store_path()?;
        SqliteStore::open(&path).map_err(|e| anyhow::anyhow!("{}", e))
    }
}

pub fn resolve_config_path() -> anyhow::Result<PathBuf> {
    if let Ok(value) = std::env::var("PROTOKOL_CONFIG") {
        if !value.trim().is_empty() {
            return Ok(PathBuf::from(value));
        }
    }
    default_config_path()
}
