//! Store collaborator trait definitions.
//!
//! The core never talks to a concrete backend directly: all ledger
//! persistence goes through [`ProtocolStore`] and finalized documents
//! through [`DocumentStore`]. In production these stand for the remote
//! protocol service; transport and encoding are outside core scope, so
//! the traits speak plain domain types.

use std::collections::HashSet;

use crate::error::Result;
use crate::fingerprint::Fingerprint;
use crate::model::{Client, Entry, EntryDraft, Protocol, ProtocolSnapshot, QueueKind};
use crate::signature::{Leg, SignatureImage, SignatureParty};
use crate::tools::ToolCatalog;

use super::types::{EntryPatch, ReturnUpdate, SignQueueItem, SignatureWrite, StoreMetadata};

/// The remote protocol-ledger collaborator.
///
/// All implementations must ensure:
/// - entries keep their insertion order; `index` always addresses that
///   order, and deletions close the gap
/// - at most one queue flag is pending per entry at any time
/// - signature writes are additive: an omitted slot is never cleared
///
/// Reads return the full month so callers can refresh wholesale after
/// every mutation (pull-after-push).
pub trait ProtocolStore {
    /// Get the full ordered entry list plus totals for one client × month.
    ///
    /// A month with no stored rows yields an empty protocol, not an error.
    fn month_ledger(&self, client_id: &str, month: &str) -> Result<Protocol>;

    /// Append an entry, returning its index.
    fn append_entry(&mut self, client_id: &str, month: &str, entry: Entry) -> Result<usize>;

    /// Partially update the entry at `index`.
    ///
    /// # Errors
    ///
    /// Returns `ProtocolError::NotFound` if the index does not exist.
    fn update_entry(
        &mut self,
        client_id: &str,
        month: &str,
        index: usize,
        patch: &EntryPatch,
    ) -> Result<Entry>;

    /// Delete the entry at `index`; later entries shift down by one.
    fn delete_entry(&mut self, client_id: &str, month: &str, index: usize) -> Result<()>;

    /// Set or clear one queue flag.
    ///
    /// Setting a flag pending clears the other flag, so both can never
    /// be pending at once. Entering the courier queue stamps the
    /// planned date with the entry date unless one is already set.
    fn set_queue_flag(
        &mut self,
        client_id: &str,
        month: &str,
        index: usize,
        kind: QueueKind,
        pending: bool,
    ) -> Result<Entry>;

    /// Write the non-empty slots of one leg.
    ///
    /// Once both legs end up fully signed (client and staff on each),
    /// the entry's queue flags are released — it no longer waits for
    /// signatures anywhere.
    fn write_signatures(
        &mut self,
        client_id: &str,
        month: &str,
        index: usize,
        write: &SignatureWrite,
    ) -> Result<Entry>;

    /// Remove one signature slot; an explicit delete is the only way a
    /// saved signature goes away.
    fn delete_signature(
        &mut self,
        client_id: &str,
        month: &str,
        index: usize,
        leg: Leg,
        party: SignatureParty,
    ) -> Result<Entry>;

    /// Record return-leg data (tools, packages, date, service).
    fn record_return(
        &mut self,
        client_id: &str,
        month: &str,
        index: usize,
        update: &ReturnUpdate,
    ) -> Result<Entry>;

    /// Mark a month's protocol as summarized (closed) or reopen it.
    fn set_summarized(&mut self, client_id: &str, month: &str, summarized: bool) -> Result<()>;

    /// Pending entries for one queue type across all clients, newest
    /// month first, optionally filtered to a single month.
    fn sign_queue(&self, kind: QueueKind, month: Option<&str>) -> Result<Vec<SignQueueItem>>;

    // --- Finalized fingerprint set ---

    /// The content fingerprints already promoted for this client × month.
    fn finalized_fingerprints(&self, client_id: &str, month: &str) -> Result<HashSet<String>>;

    fn record_finalized(
        &mut self,
        client_id: &str,
        month: &str,
        fingerprint: &Fingerprint,
    ) -> Result<()>;

    /// Forget a fingerprint (used when the entry it covered is deleted).
    fn forget_finalized(
        &mut self,
        client_id: &str,
        month: &str,
        fingerprint: &Fingerprint,
    ) -> Result<()>;

    // --- Draft cache ---

    /// Save the in-progress entry form for a client × month.
    fn save_draft(&mut self, client_id: &str, month: &str, draft: &EntryDraft) -> Result<()>;

    fn load_draft(&self, client_id: &str, month: &str) -> Result<Option<EntryDraft>>;

    fn clear_draft(&mut self, client_id: &str, month: &str) -> Result<()>;

    // --- Client directory (read-only to the core) ---

    fn client(&self, client_id: &str) -> Result<Option<Client>>;

    fn list_clients(&self) -> Result<Vec<Client>>;

    /// Seed or update a directory row. The directory is owned elsewhere;
    /// this exists so a fresh store can be populated.
    fn upsert_client(&mut self, client: &Client) -> Result<()>;

    // --- Tool dictionary ---

    fn tool_catalog(&self) -> Result<ToolCatalog>;

    fn save_tool_catalog(&mut self, catalog: &ToolCatalog) -> Result<()>;

    // --- Default staff signature ---

    fn default_staff_signature(&self) -> Result<Option<SignatureImage>>;

    fn set_default_staff_signature(&mut self, image: &SignatureImage) -> Result<()>;

    // --- Maintenance ---

    fn metadata(&self) -> Result<StoreMetadata>;

    /// Verify referential and invariant consistency of the stored data.
    fn check_integrity(&self) -> Result<()>;
}

/// The protocol-document collaborator receiving finalized snapshots.
pub trait DocumentStore {
    /// Save a snapshot; an existing document with the same id is
    /// replaced. The store keeps only the newest documents, pruning
    /// the oldest beyond its cap.
    fn save_snapshot(&mut self, snapshot: &ProtocolSnapshot) -> Result<()>;

    /// All stored snapshots, newest first.
    fn list_snapshots(&self) -> Result<Vec<ProtocolSnapshot>>;

    fn snapshot(&self, id: &str) -> Result<Option<ProtocolSnapshot>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_traits_are_object_safe() {
        fn _takes_store(_store: &mut dyn ProtocolStore) {}
        fn _takes_documents(_docs: &mut dyn DocumentStore) {}
    }
}
