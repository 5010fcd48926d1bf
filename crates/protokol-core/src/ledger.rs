//! The month ledger: all entry mutations for one client × month.
//!
//! `MonthLedger` mirrors the remote month locally and goes through the
//! store for every change. Consistency strategy is pull-after-push: a
//! mutation is immediately followed by a full re-fetch that replaces
//! the mirror wholesale, instead of patching it locally — with
//! index-addressed entries, partial local patching is too easy to get
//! wrong after concurrent remote changes.

use std::collections::HashSet;

use chrono::NaiveDate;

use crate::calendar::normalize_to_business_day;
use crate::error::{ProtocolError, Result};
use crate::fingerprint::fingerprint;
use crate::model::{
    Client, Entry, EntryDraft, Protocol, QueueKind, QueueState, Signatures, MAX_COMMENT_CHARS,
};
use crate::signature::{Leg, SignatureParty};
use crate::storage::{EntryPatch, ProtocolStore, ReturnUpdate, SignatureWrite};
use crate::tools::ToolDictionary;

/// Result of a best-effort batch operation: failures do not stop the
/// remaining items, they are collected and reported.
#[derive(Debug, Default)]
pub struct BatchOutcome {
    pub succeeded: Vec<usize>,
    pub failed: Vec<(usize, String)>,
}

impl BatchOutcome {
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Shift a selection set after the entry at `removed` was deleted:
/// the removed index is dropped, larger indices move down by one and
/// smaller ones stay untouched.
pub fn shift_selection(selection: &HashSet<usize>, removed: usize) -> HashSet<usize> {
    selection
        .iter()
        .filter(|&&index| index != removed)
        .map(|&index| if index > removed { index - 1 } else { index })
        .collect()
}

/// Initial queue assignment for a new entry, derived from the client's
/// logistics default.
pub fn initial_queue(logistics: &str) -> QueueState {
    let value = logistics.trim().to_lowercase();
    QueueState {
        courier_pending: value == "kurier",
        point_pending: value == "punkt",
        courier_planned_date: None,
    }
}

/// Display view: entries sorted ascending by transfer date. Entries
/// whose stored date does not parse drop out of the view but keep
/// their index for addressing.
pub fn sorted_entries(protocol: &Protocol) -> Vec<(usize, &Entry)> {
    let mut dated: Vec<(NaiveDate, usize, &Entry)> = protocol
        .entries
        .iter()
        .enumerate()
        .filter_map(|(index, entry)| entry.parsed_date().map(|date| (date, index, entry)))
        .collect();
    dated.sort_by(|a, b| a.0.cmp(&b.0).then(a.1.cmp(&b.1)));
    dated.into_iter().map(|(_, index, entry)| (index, entry)).collect()
}

fn validate_draft(draft: &EntryDraft) -> Result<()> {
    let mut missing = Vec::new();
    if draft.date.is_none() {
        missing.push("date");
    }
    if draft.packages < 1 {
        missing.push("packages (min. 1)");
    }
    let has_tool = draft
        .tools
        .iter()
        .any(|t| !t.name.trim().is_empty() && t.count > 0);
    if !has_tool {
        missing.push("at least one tool with count > 0");
    }
    if !missing.is_empty() {
        return Err(ProtocolError::Validation(format!(
            "Entry is missing: {}",
            missing.join(", ")
        )));
    }
    if draft.comment.chars().count() > MAX_COMMENT_CHARS {
        return Err(ProtocolError::Validation(format!(
            "Comment exceeds {MAX_COMMENT_CHARS} characters"
        )));
    }
    Ok(())
}

/// The per-month entry ledger over a [`ProtocolStore`].
pub struct MonthLedger<'a, S: ProtocolStore> {
    store: &'a mut S,
    client_id: String,
    month: String,
    dictionary: ToolDictionary,
    protocol: Protocol,
}

impl<'a, S: ProtocolStore> MonthLedger<'a, S> {
    /// Open the ledger for one client × month, fetching the current
    /// state and building the session tool dictionary.
    pub fn open(store: &'a mut S, client_id: &str, month: &str) -> Result<Self> {
        let month = crate::calendar::normalize_month(month)?;
        let catalog = store.tool_catalog()?;
        let protocol = store.month_ledger(client_id, &month)?;
        Ok(Self {
            store,
            client_id: client_id.to_string(),
            month,
            dictionary: ToolDictionary::from_catalog(&catalog),
            protocol,
        })
    }

    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    pub fn month(&self) -> &str {
        &self.month
    }

    /// The current local mirror of the month.
    pub fn protocol(&self) -> &Protocol {
        &self.protocol
    }

    pub fn dictionary(&self) -> &ToolDictionary {
        &self.dictionary
    }

    /// The client this ledger belongs to, if the directory knows it.
    pub fn client(&self) -> Result<Option<Client>> {
        self.store.client(&self.client_id)
    }

    /// Replace the local mirror with a fresh fetch.
    pub fn refresh(&mut self) -> Result<()> {
        self.protocol = self.store.month_ledger(&self.client_id, &self.month)?;
        Ok(())
    }

    pub fn entry(&self, index: usize) -> Result<&Entry> {
        self.protocol
            .entries
            .get(index)
            .ok_or_else(|| ProtocolError::NotFound(format!("Entry {index} not found")))
    }

    /// Entries sorted by date for display; see [`sorted_entries`].
    pub fn sorted_view(&self) -> Vec<(usize, &Entry)> {
        sorted_entries(&self.protocol)
    }

    /// Validate and append a new entry; returns its index.
    ///
    /// Tool names are canonicalized against the session dictionary and
    /// the initial queue is derived from the client's logistics
    /// default. The month's saved form draft is cleared on success.
    pub fn create(&mut self, draft: &EntryDraft) -> Result<usize> {
        validate_draft(draft)?;
        let Some(date) = draft.date else {
            return Err(ProtocolError::Validation("Entry is missing: date".to_string()));
        };

        let tools = draft
            .tools
            .iter()
            .filter(|t| !t.name.trim().is_empty())
            .map(|t| crate::model::ToolLine::new(self.dictionary.canonicalize(&t.name), t.count))
            .collect();

        let logistics = self
            .store
            .client(&self.client_id)?
            .map(|c| c.logistics)
            .unwrap_or_default();
        let mut queue = initial_queue(&logistics);
        if queue.courier_pending {
            queue.courier_planned_date = Some(date);
        }

        let (shipping, delivery) = draft.service.to_flags();
        let entry = Entry {
            date: date.format("%Y-%m-%d").to_string(),
            tools,
            packages: draft.packages,
            delivery,
            shipping,
            comment: draft.comment.clone(),
            return_date: None,
            return_tools: Vec::new(),
            return_packages: None,
            return_delivery: None,
            return_shipping: false,
            signatures: Signatures::default(),
            queue,
        };

        let index = self
            .store
            .append_entry(&self.client_id, &self.month, entry)?;
        self.store.clear_draft(&self.client_id, &self.month)?;
        self.refresh()?;
        Ok(index)
    }

    /// Merge a patch into the entry at `index`.
    pub fn update(&mut self, index: usize, patch: &EntryPatch) -> Result<Entry> {
        let entry = self
            .store
            .update_entry(&self.client_id, &self.month, index, patch)?;
        self.refresh()?;
        Ok(entry)
    }

    /// Delete the entry at `index`, forgetting its finalized
    /// fingerprint if one was recorded.
    pub fn remove(&mut self, index: usize) -> Result<()> {
        let digest = fingerprint(self.entry(index)?);
        self.store.delete_entry(&self.client_id, &self.month, index)?;
        self.store
            .forget_finalized(&self.client_id, &self.month, &digest)?;
        self.refresh()?;
        Ok(())
    }

    /// Delete several entries, highest index first so the remaining
    /// indices stay valid as the list shrinks. A failed item does not
    /// stop the rest and nothing is rolled back.
    pub fn remove_many(&mut self, indices: &[usize]) -> Result<BatchOutcome> {
        let mut order: Vec<usize> = indices.to_vec();
        order.sort_unstable_by(|a, b| b.cmp(a));
        order.dedup();

        let mut outcome = BatchOutcome::default();
        for index in order {
            let digest = self.protocol.entries.get(index).map(fingerprint);
            match self.store.delete_entry(&self.client_id, &self.month, index) {
                Ok(()) => {
                    if let Some(digest) = digest {
                        self.store
                            .forget_finalized(&self.client_id, &self.month, &digest)?;
                    }
                    outcome.succeeded.push(index);
                }
                Err(err) => outcome.failed.push((index, err.to_string())),
            }
        }
        self.refresh()?;
        Ok(outcome)
    }

    /// A fresh editable draft copying tools, packages, service and
    /// comment from an existing entry. Dates, signatures and queue
    /// state deliberately do not carry over.
    pub fn duplicate(&self, source: usize) -> Result<EntryDraft> {
        let entry = self.entry(source)?;
        Ok(EntryDraft {
            date: None,
            tools: entry.tools.clone(),
            packages: entry.packages,
            service: entry.service(),
            comment: entry.comment.clone(),
        })
    }

    // --- Queue routing ---

    /// Assign the entry to one pending queue; the other flag clears.
    /// Re-applying the current assignment is a no-op.
    pub fn set_queue(&mut self, index: usize, kind: QueueKind) -> Result<()> {
        self.store
            .set_queue_flag(&self.client_id, &self.month, index, kind, true)?;
        self.refresh()
    }

    /// Take the entry out of both queues.
    pub fn clear_queue(&mut self, index: usize) -> Result<()> {
        self.store
            .set_queue_flag(&self.client_id, &self.month, index, QueueKind::Courier, false)?;
        self.store
            .set_queue_flag(&self.client_id, &self.month, index, QueueKind::Point, false)?;
        self.refresh()
    }

    /// Route a whole selection to one queue type uniformly.
    pub fn route_selection(&mut self, indices: &[usize], kind: QueueKind) -> Result<()> {
        for &index in indices {
            self.store
                .set_queue_flag(&self.client_id, &self.month, index, kind, true)?;
        }
        self.refresh()
    }

    // --- Signature capture ---

    /// Apply signature writes to every selected entry. Writes that
    /// carry no slot are skipped; if none carries anything the call is
    /// rejected before touching the store.
    pub fn sign_entries(&mut self, indices: &[usize], writes: &[SignatureWrite]) -> Result<()> {
        let effective: Vec<&SignatureWrite> =
            writes.iter().filter(|w| !w.is_empty()).collect();
        if effective.is_empty() {
            return Err(ProtocolError::InvalidInput(
                "No signatures to save".to_string(),
            ));
        }
        for &index in indices {
            for write in &effective {
                self.store
                    .write_signatures(&self.client_id, &self.month, index, write)?;
            }
        }
        self.refresh()
    }

    /// Remove one signature slot from one entry.
    pub fn delete_signature(
        &mut self,
        index: usize,
        leg: Leg,
        party: SignatureParty,
    ) -> Result<()> {
        self.store
            .delete_signature(&self.client_id, &self.month, index, leg, party)?;
        self.refresh()
    }

    // --- Return leg ---

    /// Record return-leg data. A return date is normalized onto a
    /// business day before it is stored.
    pub fn record_return(&mut self, index: usize, update: &ReturnUpdate) -> Result<Entry> {
        let mut update = update.clone();
        if let Some(date) = update.return_date {
            update.return_date = Some(normalize_to_business_day(date));
        }
        let entry =
            self.store
                .record_return(&self.client_id, &self.month, index, &update)?;
        self.refresh()?;
        Ok(entry)
    }

    /// Set one return date on several entries, best-effort.
    pub fn bulk_return_date(
        &mut self,
        indices: &[usize],
        date: NaiveDate,
    ) -> Result<BatchOutcome> {
        let date = normalize_to_business_day(date);
        let update = ReturnUpdate {
            return_date: Some(date),
            ..ReturnUpdate::default()
        };
        let mut outcome = BatchOutcome::default();
        for &index in indices {
            match self
                .store
                .record_return(&self.client_id, &self.month, index, &update)
            {
                Ok(_) => outcome.succeeded.push(index),
                Err(err) => outcome.failed.push((index, err.to_string())),
            }
        }
        self.refresh()?;
        Ok(outcome)
    }

    /// Mark the month closed (or reopen it).
    pub fn set_summarized(&mut self, summarized: bool) -> Result<()> {
        self.store
            .set_summarized(&self.client_id, &self.month, summarized)?;
        self.refresh()
    }

    // --- Draft cache ---

    /// Save the in-progress entry form for this month.
    pub fn save_draft(&mut self, draft: &EntryDraft) -> Result<()> {
        self.store.save_draft(&self.client_id, &self.month, draft)
    }

    pub fn load_draft(&self) -> Result<Option<EntryDraft>> {
        self.store.load_draft(&self.client_id, &self.month)
    }

    pub fn clear_draft(&mut self) -> Result<()> {
        self.store.clear_draft(&self.client_id, &self.month)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ToolLine;

    #[test]
    fn test_shift_selection() {
        let selection: HashSet<usize> = [0, 2, 5, 7].into_iter().collect();
        let shifted = shift_selection(&selection, 2);
        let expected: HashSet<usize> = [0, 4, 6].into_iter().collect();
        assert_eq!(shifted, expected);
    }

    #[test]
    fn test_shift_selection_keeps_lower_indices() {
        let selection: HashSet<usize> = [0, 1].into_iter().collect();
        assert_eq!(shift_selection(&selection, 5), selection);
    }

    #[test]
    fn test_initial_queue() {
        assert!(initial_queue("kurier").courier_pending);
        assert!(!initial_queue("kurier").point_pending);
        assert!(initial_queue(" Punkt ").point_pending);
        let none = initial_queue("");
        assert!(!none.courier_pending && !none.point_pending);
    }

    #[test]
    fn test_validate_draft_names_missing_fields() {
        let draft = EntryDraft::default();
        let err = validate_draft(&draft).expect_err("invalid draft");
        let message = err.to_string();
        assert!(message.contains("date"));
        assert!(message.contains("packages"));
        assert!(message.contains("tool"));
    }

    #[test]
    fn test_validate_draft_accepts_complete_entry() {
        let draft = EntryDraft {
            date: NaiveDate::from_ymd_opt(2024, 3, 5),
            tools: vec![ToolLine::new("Clamp", 3)],
            packages: 2,
            service: crate::model::ServiceType::CourierSingle,
            comment: String::new(),
        };
        validate_draft(&draft).expect("valid draft");
    }

    #[test]
    fn test_validate_draft_rejects_zero_count_tools_only() {
        let draft = EntryDraft {
            date: NaiveDate::from_ymd_opt(2024, 3, 5),
            tools: vec![ToolLine::new("Clamp", 0)],
            packages: 1,
            service: Default::default(),
            comment: String::new(),
        };
        assert!(validate_draft(&draft).is_err());
    }

    #[test]
    fn test_sorted_entries_excludes_unparseable_dates() {
        let mut protocol = Protocol::empty("c", "2024-03");
        for date in ["2024-03-10", "not-a-date", "2024-03-02"] {
            protocol.entries.push(Entry {
                date: date.to_string(),
                tools: Vec::new(),
                packages: 1,
                delivery: None,
                shipping: false,
                comment: String::new(),
                return_date: None,
                return_tools: Vec::new(),
                return_packages: None,
                return_delivery: None,
                return_shipping: false,
                signatures: Signatures::default(),
                queue: QueueState::default(),
            });
        }
        let view = sorted_entries(&protocol);
        let indices: Vec<usize> = view.iter().map(|(i, _)| *i).collect();
        // sorted by date, index 1 (bad date) excluded but still addressable
        assert_eq!(indices, vec![2, 0]);
        assert_eq!(protocol.entries.len(), 3);
    }
}
