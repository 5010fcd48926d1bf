//! Storage layer: collaborator traits and the SQLite-backed store.

mod sqlite;
mod traits;
mod types;

pub use sqlite::SqliteStore;
pub use traits::{DocumentStore, ProtocolStore};
pub use types::{
    EntryPatch, ReturnUpdate, SignQueueItem, SignatureWrite, StoreMetadata,
};
