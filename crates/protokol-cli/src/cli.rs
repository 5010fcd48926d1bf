use clap::{Args, Parser, Subcommand};
use clap_complete::Shell;

use protokol_core::VERSION;

/// Protokol - tool transfer/return protocol ledgers for a sterilization service
#[derive(Parser)]
#[command(name = "protokol")]
#[command(author, version = VERSION, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to the protocol store file
    #[arg(short, long, global = true, env = "PROTOKOL_STORE")]
    pub store: Option<String>,

    #[command(subcommand)]
    pub command: Commands,

    /// Quiet mode (minimal output)
    #[arg(short, long, global = true)]
    pub quiet: bool,
}

/// Client × month the command operates on.
#[derive(Args, Clone)]
pub struct ScopeArgs {
    /// Client id
    #[arg(short, long, value_name = "ID")]
    pub client: String,

    /// Month (YYYY-MM)
    #[arg(short, long, value_name = "YYYY-MM")]
    pub month: String,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize a new protocol store
    Init(InitArgs),

    /// Client directory
    Clients {
        #[command(subcommand)]
        command: ClientsCommands,
    },

    /// Tool name dictionary
    Tools {
        #[command(subcommand)]
        command: ToolsCommands,
    },

    /// Protocol entries of one client x month
    Entry {
        #[command(subcommand)]
        command: EntryCommands,
    },

    /// In-progress entry form drafts
    Draft {
        #[command(subcommand)]
        command: DraftCommands,
    },

    /// Return-leg completion
    Return {
        #[command(subcommand)]
        command: ReturnCommands,
    },

    /// Courier/point signing queues
    Queue {
        #[command(subcommand)]
        command: QueueCommands,
    },

    /// Signature capture
    Sign {
        #[command(subcommand)]
        command: SignCommands,
    },

    /// Promote selected entries into a protocol snapshot
    Finalize(FinalizeArgs),

    /// Finalized protocol documents
    Snapshot {
        #[command(subcommand)]
        command: SnapshotCommands,
    },

    /// Mark a month's protocol as closed (or reopen it)
    Summarize(SummarizeArgs),

    /// Check store integrity
    Check,

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Arguments for the `init` command
#[derive(Args)]
pub struct InitArgs {
    /// Path where the store will be created
    #[arg(value_name = "PATH")]
    pub path: Option<String>,

    /// Image file (PNG/JPEG) used as the default staff signature
    #[arg(long, value_name = "FILE")]
    pub staff_signature: Option<String>,

    /// Do not write the config file
    #[arg(long)]
    pub no_config: bool,
}

#[derive(Subcommand)]
pub enum ClientsCommands {
    /// List directory clients
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Add or update a directory client
    Add(ClientAddArgs),
}

/// Arguments for `clients add`
#[derive(Args)]
pub struct ClientAddArgs {
    /// Display name
    #[arg(value_name = "NAME")]
    pub name: String,

    /// Stable id; derived from the name when omitted
    #[arg(long)]
    pub id: Option<String>,

    /// Postal address
    #[arg(long, default_value = "")]
    pub address: String,

    /// NIP or PESEL
    #[arg(long, default_value = "")]
    pub tax_id: String,

    /// Default routing for new entries: kurier or punkt
    #[arg(long, default_value = "")]
    pub logistics: String,
}

#[derive(Subcommand)]
pub enum ToolsCommands {
    /// List the tool dictionary
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Append names to one dictionary category
    Add {
        /// Category (cosmetic or medical)
        #[arg(long, value_name = "CATEGORY")]
        category: String,

        /// Tool names to append
        #[arg(value_name = "NAME", required = true)]
        names: Vec<String>,
    },
}

#[derive(Subcommand)]
pub enum EntryCommands {
    /// Add a new entry
    Add(EntryAddArgs),

    /// List the month's entries (sorted by date)
    List(EntryListArgs),

    /// Show one entry with its reconciled tool rows
    Show {
        #[command(flatten)]
        scope: ScopeArgs,

        /// Entry index
        #[arg(value_name = "INDEX")]
        index: usize,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Edit fields of an entry
    Edit(EntryEditArgs),

    /// Remove entries
    Remove {
        #[command(flatten)]
        scope: ScopeArgs,

        /// Entry indices
        #[arg(value_name = "INDEX", required = true)]
        indices: Vec<usize>,

        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },

    /// Copy an entry's content into the month's draft
    Duplicate {
        #[command(flatten)]
        scope: ScopeArgs,

        /// Source entry index
        #[arg(value_name = "INDEX")]
        source: usize,
    },
}

/// Arguments for `entry add`
#[derive(Args)]
pub struct EntryAddArgs {
    #[command(flatten)]
    pub scope: ScopeArgs,

    /// Transfer date (YYYY-MM-DD); must fall inside the month
    #[arg(long, value_name = "DATE")]
    pub date: Option<String>,

    /// Tool position as NAME=COUNT (repeatable)
    #[arg(short, long = "tool", value_name = "NAME=COUNT")]
    pub tools: Vec<String>,

    /// Package count (min. 1)
    #[arg(short, long)]
    pub packages: Option<u32>,

    /// Additional service: none, shipping, courier-x1, courier-x2
    #[arg(long, default_value = "none")]
    pub service: String,

    /// Free-text comment
    #[arg(long, default_value = "")]
    pub comment: String,

    /// Start from the month's saved draft
    #[arg(long)]
    pub from_draft: bool,
}

/// Arguments for `entry list`
#[derive(Args)]
pub struct EntryListArgs {
    #[command(flatten)]
    pub scope: ScopeArgs,

    /// Keep the stored insertion order instead of sorting by date
    #[arg(long)]
    pub stored_order: bool,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for `entry edit`
#[derive(Args)]
pub struct EntryEditArgs {
    #[command(flatten)]
    pub scope: ScopeArgs,

    /// Entry index
    #[arg(value_name = "INDEX")]
    pub index: usize,

    /// New transfer date (YYYY-MM-DD)
    #[arg(long, value_name = "DATE")]
    pub date: Option<String>,

    /// Replacement tool list as NAME=COUNT (repeatable)
    #[arg(short, long = "tool", value_name = "NAME=COUNT")]
    pub tools: Vec<String>,

    /// New package count
    #[arg(short, long)]
    pub packages: Option<u32>,

    /// New service: none, shipping, courier-x1, courier-x2
    #[arg(long)]
    pub service: Option<String>,

    /// New comment
    #[arg(long)]
    pub comment: Option<String>,
}

#[derive(Subcommand)]
pub enum DraftCommands {
    /// Save a draft for the month
    Save(DraftSaveArgs),

    /// Show the saved draft
    Show {
        #[command(flatten)]
        scope: ScopeArgs,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Clear the saved draft
    Clear {
        #[command(flatten)]
        scope: ScopeArgs,
    },
}

/// Arguments for `draft save`
#[derive(Args)]
pub struct DraftSaveArgs {
    #[command(flatten)]
    pub scope: ScopeArgs,

    /// Transfer date (YYYY-MM-DD)
    #[arg(long, value_name = "DATE")]
    pub date: Option<String>,

    /// Tool position as NAME=COUNT (repeatable)
    #[arg(short, long = "tool", value_name = "NAME=COUNT")]
    pub tools: Vec<String>,

    /// Package count
    #[arg(short, long, default_value_t = 0)]
    pub packages: u32,

    /// Additional service: none, shipping, courier-x1, courier-x2
    #[arg(long, default_value = "none")]
    pub service: String,

    /// Free-text comment
    #[arg(long, default_value = "")]
    pub comment: String,
}

#[derive(Subcommand)]
pub enum ReturnCommands {
    /// Record the return leg of one entry
    Set(ReturnSetArgs),

    /// Set one return date on several entries
    Bulk {
        #[command(flatten)]
        scope: ScopeArgs,

        /// Return date (YYYY-MM-DD); weekends move to the next weekday
        #[arg(long, value_name = "DATE")]
        date: String,

        /// Entry indices
        #[arg(value_name = "INDEX", required = true)]
        indices: Vec<usize>,
    },
}

/// Arguments for `return set`
#[derive(Args)]
pub struct ReturnSetArgs {
    #[command(flatten)]
    pub scope: ScopeArgs,

    /// Entry index
    #[arg(value_name = "INDEX")]
    pub index: usize,

    /// Return date (YYYY-MM-DD); weekends move to the next weekday
    #[arg(long, value_name = "DATE")]
    pub date: Option<String>,

    /// Mirror the transfer quantities on the return leg
    #[arg(long)]
    pub match_transfer: bool,

    /// Return tool position as NAME=COUNT (repeatable)
    #[arg(short, long = "tool", value_name = "NAME=COUNT")]
    pub tools: Vec<String>,

    /// Return package count
    #[arg(short, long)]
    pub packages: Option<u32>,
}

#[derive(Subcommand)]
pub enum QueueCommands {
    /// Route entries to one signing queue
    Set {
        #[command(flatten)]
        scope: ScopeArgs,

        /// Queue type (courier or point)
        #[arg(short = 't', long = "type", value_name = "TYPE")]
        queue_type: String,

        /// Entry indices
        #[arg(value_name = "INDEX", required = true)]
        indices: Vec<usize>,
    },

    /// Take entries out of both queues
    Clear {
        #[command(flatten)]
        scope: ScopeArgs,

        /// Entry indices
        #[arg(value_name = "INDEX", required = true)]
        indices: Vec<usize>,
    },

    /// List entries pending in one queue across clients
    List {
        /// Queue type (courier or point)
        #[arg(short = 't', long = "type", value_name = "TYPE")]
        queue_type: String,

        /// Restrict to one month (YYYY-MM)
        #[arg(short, long, value_name = "YYYY-MM")]
        month: Option<String>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
pub enum SignCommands {
    /// Attach signatures to entries
    Add(SignAddArgs),

    /// Remove one signature slot
    Remove {
        #[command(flatten)]
        scope: ScopeArgs,

        /// Entry index
        #[arg(value_name = "INDEX")]
        index: usize,

        /// Leg (transfer or return)
        #[arg(long)]
        leg: String,

        /// Slot owner (client or staff)
        #[arg(long)]
        who: String,
    },

    /// Capture ink strokes from a file onto the four pads and sign
    Pad(SignPadArgs),

    /// Store the default staff signature image
    SetDefault {
        /// Image file (PNG or JPEG)
        #[arg(value_name = "FILE")]
        file: String,
    },
}

/// Arguments for `sign pad`
#[derive(Args)]
pub struct SignPadArgs {
    #[command(flatten)]
    pub scope: ScopeArgs,

    /// Entry indices
    #[arg(value_name = "INDEX", required = true)]
    pub indices: Vec<usize>,

    /// JSON strokes file: per leg, per party, a list of polylines
    #[arg(long, value_name = "FILE")]
    pub strokes: String,
}

/// Arguments for `sign add`
#[derive(Args)]
pub struct SignAddArgs {
    #[command(flatten)]
    pub scope: ScopeArgs,

    /// Entry indices
    #[arg(value_name = "INDEX", required = true)]
    pub indices: Vec<usize>,

    /// Leg the signatures belong to (transfer or return)
    #[arg(long)]
    pub leg: String,

    /// Client signature image file (PNG or JPEG)
    #[arg(long, value_name = "FILE")]
    pub client_sig: Option<String>,

    /// Staff signature image file (PNG or JPEG)
    #[arg(long, value_name = "FILE")]
    pub staff_sig: Option<String>,

    /// Use the store-held default staff signature
    #[arg(long)]
    pub default_staff: bool,
}

/// Arguments for the `finalize` command
#[derive(Args)]
pub struct FinalizeArgs {
    #[command(flatten)]
    pub scope: ScopeArgs,

    /// Queue type the batch goes through (courier or point)
    #[arg(short = 't', long = "type", value_name = "TYPE")]
    pub queue_type: String,

    /// Selected entry indices
    #[arg(value_name = "INDEX", required = true)]
    pub indices: Vec<usize>,

    /// Output the snapshot as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Subcommand)]
pub enum SnapshotCommands {
    /// List finalized protocol documents
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show one document with its reconciled rows
    Show {
        /// Document id (<clientId>:<YYYY-MM>)
        #[arg(value_name = "ID")]
        id: String,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

/// Arguments for the `summarize` command
#[derive(Args)]
pub struct SummarizeArgs {
    #[command(flatten)]
    pub scope: ScopeArgs,

    /// Reopen instead of closing
    #[arg(long)]
    pub undo: bool,
}
