//! Finalization: promoting selected entries into a protocol snapshot.
//!
//! An entry reaches the snapshot only while BOTH a staff signature and
//! the batch's queue assignment hold at the moment of finalization —
//! neither attribute is remembered once unset. The whole batch passes
//! or the whole batch is rejected with the specific unmet condition.

use std::collections::HashSet;

use chrono::Utc;
use uuid::Uuid;

use crate::error::{GateFailure, Result};
use crate::fingerprint::{fingerprint, Fingerprint};
use crate::model::{Protocol, ProtocolSnapshot, QueueKind, SnapshotEntry};
use crate::reconcile::reconcile_entry;
use crate::storage::{DocumentStore, ProtocolStore};

/// Evaluate the gate over a candidate selection.
///
/// Every selected entry must:
/// 1. carry a staff signature on either leg (client ink alone is not
///    enough),
/// 2. be pending in `queue` — the queue type chosen for the whole
///    batch; a mixed or missing assignment fails the batch,
/// 3. not be finalized already (its content fingerprint is absent from
///    `finalized`).
///
/// On success returns the fingerprint of each selected entry, in
/// selection order.
pub fn check_batch(
    protocol: &Protocol,
    selection: &[usize],
    queue: QueueKind,
    finalized: &HashSet<String>,
) -> Result<Vec<Fingerprint>> {
    if selection.is_empty() {
        return Err(GateFailure::EmptySelection.into());
    }

    let mut fingerprints = Vec::with_capacity(selection.len());
    for &index in selection {
        let entry = protocol.entries.get(index).ok_or_else(|| {
            crate::error::ProtocolError::NotFound(format!("Entry {index} not found"))
        })?;

        if !entry.signatures.has_staff_signature() {
            return Err(GateFailure::MissingStaffSignature { index }.into());
        }
        if !entry.queue.is_pending(queue) {
            return Err(GateFailure::QueueMismatch {
                index,
                queue: queue.as_str().to_string(),
            }
            .into());
        }

        let digest = fingerprint(entry);
        if finalized.contains(digest.as_str()) {
            return Err(GateFailure::AlreadyFinalized { index }.into());
        }
        fingerprints.push(digest);
    }
    Ok(fingerprints)
}

/// Finalize a selection: run the gate, reconcile every entry, save the
/// snapshot to the document store and record each fingerprint so the
/// same content cannot be promoted twice.
pub fn finalize_batch<S>(
    store: &mut S,
    client_id: &str,
    month: &str,
    selection: &[usize],
    queue: QueueKind,
) -> Result<ProtocolSnapshot>
where
    S: ProtocolStore + DocumentStore,
{
    let protocol = store.month_ledger(client_id, month)?;
    let finalized = store.finalized_fingerprints(client_id, month)?;
    let fingerprints = check_batch(&protocol, selection, queue, &finalized)?;

    let entries: Vec<SnapshotEntry> = selection
        .iter()
        .map(|&index| {
            let entry = &protocol.entries[index];
            SnapshotEntry {
                date: entry.date.clone(),
                return_date: entry.effective_return_date(),
                service: entry.service(),
                rows: reconcile_entry(entry),
            }
        })
        .collect();

    let client_name = store
        .client(client_id)?
        .map(|c| c.name)
        .unwrap_or_else(|| client_id.to_string());

    let total_packages = selection
        .iter()
        .map(|&index| protocol.entries[index].packages)
        .sum();

    let snapshot = ProtocolSnapshot {
        id: format!("{client_id}:{month}"),
        snapshot_id: Uuid::new_v4(),
        client_id: client_id.to_string(),
        client_name,
        month: month.to_string(),
        total_transfers: entries.len(),
        total_packages,
        entries,
        created_at: Utc::now(),
    };

    store.save_snapshot(&snapshot)?;
    for digest in &fingerprints {
        store.record_finalized(client_id, month, digest)?;
    }
    Ok(snapshot)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ProtocolError;
    use crate::model::{Entry, QueueState, Signatures, ToolLine};
    use crate::signature::SignatureImage;

    fn ink() -> SignatureImage {
        SignatureImage::from_png_bytes(b"ink")
    }

    fn entry(staff_signed: bool, queue: Option<QueueKind>) -> Entry {
        let mut signatures = Signatures::default();
        if staff_signed {
            signatures.transfer.staff = Some(ink());
        }
        let mut state = QueueState::default();
        match queue {
            Some(QueueKind::Courier) => state.courier_pending = true,
            Some(QueueKind::Point) => state.point_pending = true,
            None => {}
        }
        Entry {
            date: "2024-03-05".to_string(),
            tools: vec![ToolLine::new("Clamp", 3)],
            packages: 2,
            delivery: None,
            shipping: false,
            comment: String::new(),
            return_date: None,
            return_tools: Vec::new(),
            return_packages: None,
            return_delivery: None,
            return_shipping: false,
            signatures,
            queue: state,
        }
    }

    fn protocol(entries: Vec<Entry>) -> Protocol {
        let mut protocol = Protocol::empty("gabinet-ewa", "2024-03");
        protocol.entries = entries;
        protocol.recompute_totals();
        protocol
    }

    #[test]
    fn test_empty_selection_fails() {
        let protocol = protocol(vec![]);
        let err = check_batch(&protocol, &[], QueueKind::Courier, &HashSet::new())
            .expect_err("gate rejects");
        assert!(matches!(
            err,
            ProtocolError::Gate(GateFailure::EmptySelection)
        ));
    }

    #[test]
    fn test_client_signature_alone_is_not_enough() {
        let mut e = entry(false, Some(QueueKind::Courier));
        e.signatures.transfer.client = Some(ink());
        e.signatures.return_leg.client = Some(ink());
        let protocol = protocol(vec![e]);
        let err = check_batch(&protocol, &[0], QueueKind::Courier, &HashSet::new())
            .expect_err("gate rejects");
        assert!(matches!(
            err,
            ProtocolError::Gate(GateFailure::MissingStaffSignature { index: 0 })
        ));
    }

    #[test]
    fn test_staff_signature_on_return_leg_passes() {
        let mut e = entry(false, Some(QueueKind::Point));
        e.signatures.return_leg.staff = Some(ink());
        let protocol = protocol(vec![e]);
        check_batch(&protocol, &[0], QueueKind::Point, &HashSet::new()).expect("gate passes");
    }

    #[test]
    fn test_mixed_queue_types_fail_the_whole_batch() {
        let protocol = protocol(vec![
            entry(true, Some(QueueKind::Courier)),
            entry(true, Some(QueueKind::Point)),
        ]);
        let err = check_batch(&protocol, &[0, 1], QueueKind::Courier, &HashSet::new())
            .expect_err("gate rejects");
        assert!(matches!(
            err,
            ProtocolError::Gate(GateFailure::QueueMismatch { index: 1, .. })
        ));
    }

    #[test]
    fn test_unqueued_entry_fails_even_with_staff_signature() {
        let protocol = protocol(vec![entry(true, None)]);
        let err = check_batch(&protocol, &[0], QueueKind::Courier, &HashSet::new())
            .expect_err("gate rejects");
        assert!(matches!(
            err,
            ProtocolError::Gate(GateFailure::QueueMismatch { index: 0, .. })
        ));
    }

    #[test]
    fn test_already_finalized_fingerprint_is_rejected() {
        let e = entry(true, Some(QueueKind::Courier));
        let digest = fingerprint(&e);
        let protocol = protocol(vec![e]);
        let finalized: HashSet<String> = [digest.as_str().to_string()].into_iter().collect();
        let err = check_batch(&protocol, &[0], QueueKind::Courier, &finalized)
            .expect_err("gate rejects");
        assert!(matches!(
            err,
            ProtocolError::Gate(GateFailure::AlreadyFinalized { index: 0 })
        ));
    }

    #[test]
    fn test_passing_batch_returns_fingerprints_in_order() {
        let protocol = protocol(vec![
            entry(true, Some(QueueKind::Courier)),
            entry(true, Some(QueueKind::Courier)),
        ]);
        let fingerprints =
            check_batch(&protocol, &[1, 0], QueueKind::Courier, &HashSet::new())
                .expect("gate passes");
        assert_eq!(fingerprints.len(), 2);
        // both entries have identical content, so identical fingerprints
        assert_eq!(fingerprints[0], fingerprints[1]);
    }
}
