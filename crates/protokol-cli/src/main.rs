//! Protokol CLI - tool transfer/return protocol ledgers for a
//! sterilization service.
//!
//! This is the command-line interface for Protokol. It provides the
//! operator surface over the core library: entries, signatures, queue
//! routing and finalization into protocol documents.

mod app;
mod cli;
mod commands;
mod config;
mod helpers;
mod output;
mod ui;

use clap::{CommandFactory, Parser};
use clap_complete::generate;

use app::AppContext;
use cli::{
    Cli, ClientsCommands, Commands, DraftCommands, EntryCommands, QueueCommands, ReturnCommands,
    SignCommands, SnapshotCommands, ToolsCommands,
};

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let ctx = AppContext::new(&cli);

    match &cli.command {
        Commands::Init(args) => commands::init::handle_init(&ctx, args),

        Commands::Clients { command } => match command {
            ClientsCommands::List { json } => commands::clients::handle_list(&ctx, *json),
            ClientsCommands::Add(args) => commands::clients::handle_add(&ctx, args),
        },

        Commands::Tools { command } => match command {
            ToolsCommands::List { json } => commands::tools::handle_list(&ctx, *json),
            ToolsCommands::Add { category, names } => {
                commands::tools::handle_add(&ctx, category, names)
            }
        },

        Commands::Entry { command } => match command {
            EntryCommands::Add(args) => commands::entry::handle_add(&ctx, args),
            EntryCommands::List(args) => commands::entry::handle_list(&ctx, args),
            EntryCommands::Show { scope, index, json } => {
                commands::entry::handle_show(&ctx, scope, *index, *json)
            }
            EntryCommands::Edit(args) => commands::entry::handle_edit(&ctx, args),
            EntryCommands::Remove {
                scope,
                indices,
                yes,
            } => commands::entry::handle_remove(&ctx, scope, indices, *yes),
            EntryCommands::Duplicate { scope, source } => {
                commands::entry::handle_duplicate(&ctx, scope, *source)
            }
        },

        Commands::Draft { command } => match command {
            DraftCommands::Save(args) => commands::draft::handle_save(&ctx, args),
            DraftCommands::Show { scope, json } => commands::draft::handle_show(&ctx, scope, *json),
            DraftCommands::Clear { scope } => commands::draft::handle_clear(&ctx, scope),
        },

        Commands::Return { command } => match command {
            ReturnCommands::Set(args) => commands::return_leg::handle_set(&ctx, args),
            ReturnCommands::Bulk {
                scope,
                date,
                indices,
            } => commands::return_leg::handle_bulk(&ctx, scope, date, indices),
        },

        Commands::Queue { command } => match command {
            QueueCommands::Set {
                scope,
                queue_type,
                indices,
            } => commands::queue::handle_set(&ctx, scope, queue_type, indices),
            QueueCommands::Clear { scope, indices } => {
                commands::queue::handle_clear(&ctx, scope, indices)
            }
            QueueCommands::List {
                queue_type,
                month,
                json,
            } => commands::queue::handle_list(&ctx, queue_type, month.as_deref(), *json),
        },

        Commands::Sign { command } => match command {
            SignCommands::Add(args) => commands::sign::handle_add(&ctx, args),
            SignCommands::Remove {
                scope,
                index,
                leg,
                who,
            } => commands::sign::handle_remove(&ctx, scope, *index, leg, who),
            SignCommands::Pad(args) => commands::sign::handle_pad(&ctx, args),
            SignCommands::SetDefault { file } => commands::sign::handle_set_default(&ctx, file),
        },

        Commands::Finalize(args) => commands::finalize::handle_finalize(&ctx, args),

        Commands::Snapshot { command } => match command {
            SnapshotCommands::List { json } => commands::snapshot::handle_list(&ctx, *json),
            SnapshotCommands::Show { id, json } => commands::snapshot::handle_show(&ctx, id, *json),
        },

        Commands::Summarize(args) => commands::maintenance::handle_summarize(&ctx, args),

        Commands::Check => commands::maintenance::handle_check(&ctx),

        Commands::Completions { shell } => {
            let mut command = Cli::command();
            generate(*shell, &mut command, "protokol", &mut std::io::stdout());
            Ok(())
        }
    }
}
