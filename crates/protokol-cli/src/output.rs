//! Output formatting helpers for the CLI.
//!
//! JSON output serializes the full wire model; tables compress
//! signatures and queue state into short marks.

use protokol_core::calendar::display_date;
use protokol_core::model::{Entry, LegSignatures, Protocol, ProtocolSnapshot};
use protokol_core::reconcile::ReconciledRow;
use protokol_core::storage::SignQueueItem;

/// Full entry as JSON, with its ledger index attached.
pub fn entry_json(index: usize, entry: &Entry) -> serde_json::Value {
    let mut value = serde_json::to_value(entry).unwrap_or(serde_json::Value::Null);
    if let Some(map) = value.as_object_mut() {
        map.insert("index".to_string(), serde_json::json!(index));
    }
    value
}

pub fn protocol_json(protocol: &Protocol) -> serde_json::Value {
    serde_json::json!({
        "id": protocol.id,
        "month": protocol.month,
        "summarized": protocol.summarized,
        "totals": protocol.totals,
        "entries": protocol
            .entries
            .iter()
            .enumerate()
            .map(|(i, e)| entry_json(i, e))
            .collect::<Vec<_>>(),
    })
}

pub fn queue_items_json(items: &[SignQueueItem]) -> serde_json::Value {
    serde_json::to_value(items).unwrap_or(serde_json::Value::Null)
}

pub fn snapshot_json(snapshot: &ProtocolSnapshot) -> serde_json::Value {
    serde_json::to_value(snapshot).unwrap_or(serde_json::Value::Null)
}

/// Signature presence mark for one leg: `K` client, `S` staff.
pub fn signature_marks(leg: &LegSignatures) -> String {
    match (leg.client.is_some(), leg.staff.is_some()) {
        (true, true) => "K+S".to_string(),
        (true, false) => "K".to_string(),
        (false, true) => "S".to_string(),
        (false, false) => "—".to_string(),
    }
}

/// Queue mark: courier, point or none.
pub fn queue_mark(entry: &Entry) -> String {
    if entry.queue.courier_pending {
        "kurier".to_string()
    } else if entry.queue.point_pending {
        "punkt".to_string()
    } else {
        "—".to_string()
    }
}

/// Tool list compressed to one cell: "Nożyczki: 2, Kleszcze: 1".
pub fn tools_cell(entry: &Entry) -> String {
    if entry.tools.is_empty() {
        return "—".to_string();
    }
    entry
        .tools
        .iter()
        .map(|t| format!("{}: {}", t.name, t.count))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Table row for one ledger entry.
pub fn entry_row(index: usize, entry: &Entry) -> Vec<String> {
    let date = entry
        .parsed_date()
        .map(display_date)
        .unwrap_or_else(|| entry.date.clone());
    let return_date = entry
        .effective_return_date()
        .map(display_date)
        .unwrap_or_else(|| "—".to_string());
    vec![
        index.to_string(),
        date,
        tools_cell(entry),
        entry.packages.to_string(),
        entry.service().label().to_string(),
        signature_marks(&entry.signatures.transfer),
        signature_marks(&entry.signatures.return_leg),
        return_date,
        queue_mark(entry),
    ]
}

/// Column headers matching [`entry_row`].
pub const ENTRY_COLUMNS: [&str; 9] = [
    "#",
    "Data",
    "Narzędzia",
    "Pakiety",
    "Usługi",
    "Podpisy (przekazanie)",
    "Podpisy (zwrot)",
    "Data zwrotu",
    "Kolejka",
];

/// Table rows for a reconciled row set; the summary row is upper-cased
/// so it stands out in every output mode.
pub fn reconciled_rows(rows: &[ReconciledRow]) -> Vec<Vec<String>> {
    rows.iter()
        .map(|row| {
            let name = if row.is_summary {
                row.name.to_uppercase()
            } else {
                row.name.clone()
            };
            vec![
                name,
                row.transfer_qty.to_string(),
                row.return_qty.to_string(),
            ]
        })
        .collect()
}

/// Column headers matching [`reconciled_rows`].
pub const RECONCILED_COLUMNS: [&str; 3] = ["Nazwa", "Ilość (przekazanie)", "Ilość (zwrot)"];
