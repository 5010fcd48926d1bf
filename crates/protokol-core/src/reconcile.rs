//! Transfer/return tool-list reconciliation.
//!
//! Aligns the two independently-entered tool lists of an entry into one
//! ordered row set used for both terminal tables and export documents,
//! so the visual report and the ledger can never diverge in row count
//! or ordering. Names are matched case-insensitively, with a positional
//! fallback to tolerate retyping on the return side.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::model::{Entry, ToolLine};

/// Label of the synthetic trailing summary row.
pub const PACKAGES_LABEL: &str = "Pakiety";

/// One reconciled display row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReconciledRow {
    pub name: String,
    pub transfer_qty: u32,
    pub return_qty: u32,
    /// Marks the trailing packages row, rendered distinctly
    pub is_summary: bool,
}

fn normalize(list: &[ToolLine]) -> Vec<ToolLine> {
    list.iter()
        .filter(|t| !t.name.trim().is_empty())
        .map(|t| ToolLine::new(t.name.trim(), t.count))
        .collect()
}

fn lookup_key(name: &str) -> String {
    name.trim().to_lowercase()
}

/// Reconcile a transfer list against a return list.
///
/// With an empty return list every transfer row mirrors its own count.
/// Otherwise return quantities resolve by name first, then by the same
/// positional index, then default to 0. The trailing `Pakiety` row
/// carries the package counts (`return_packages` of 0 or `None` falls
/// back to `transfer_packages`).
pub fn reconcile(
    transfer: &[ToolLine],
    return_list: &[ToolLine],
    transfer_packages: u32,
    return_packages: Option<u32>,
) -> Vec<ReconciledRow> {
    let transfer = normalize(transfer);
    let return_list = normalize(return_list);

    let mut rows: Vec<ReconciledRow> = if return_list.is_empty() {
        transfer
            .iter()
            .map(|t| ReconciledRow {
                name: t.name.clone(),
                transfer_qty: t.count,
                return_qty: t.count,
                is_summary: false,
            })
            .collect()
    } else {
        let by_name: HashMap<String, u32> = return_list
            .iter()
            .map(|t| (lookup_key(&t.name), t.count))
            .collect();
        transfer
            .iter()
            .enumerate()
            .map(|(index, t)| {
                let return_qty = by_name
                    .get(&lookup_key(&t.name))
                    .copied()
                    .or_else(|| return_list.get(index).map(|r| r.count))
                    .unwrap_or(0);
                ReconciledRow {
                    name: t.name.clone(),
                    transfer_qty: t.count,
                    return_qty,
                    is_summary: false,
                }
            })
            .collect()
    };

    let return_pkgs = match return_packages {
        Some(n) if n > 0 => n,
        _ => transfer_packages,
    };
    rows.push(ReconciledRow {
        name: PACKAGES_LABEL.to_string(),
        transfer_qty: transfer_packages,
        return_qty: return_pkgs,
        is_summary: true,
    });
    rows
}

/// Reconcile one ledger entry.
pub fn reconcile_entry(entry: &Entry) -> Vec<ReconciledRow> {
    reconcile(
        &entry.tools,
        &entry.return_tools,
        entry.packages,
        entry.return_packages,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tools(pairs: &[(&str, u32)]) -> Vec<ToolLine> {
        pairs.iter().map(|(n, c)| ToolLine::new(*n, *c)).collect()
    }

    #[test]
    fn test_empty_return_mirrors_transfer() {
        let rows = reconcile(&tools(&[("Scissors", 2), ("Forceps", 1)]), &[], 3, None);
        assert_eq!(rows.len(), 3);
        assert_eq!(
            rows[0],
            ReconciledRow {
                name: "Scissors".to_string(),
                transfer_qty: 2,
                return_qty: 2,
                is_summary: false
            }
        );
        assert_eq!(rows[1].name, "Forceps");
        assert_eq!(rows[1].return_qty, 1);
        let summary = &rows[2];
        assert!(summary.is_summary);
        assert_eq!(summary.name, PACKAGES_LABEL);
        assert_eq!((summary.transfer_qty, summary.return_qty), (3, 3));
    }

    #[test]
    fn test_name_match_beats_position() {
        // Return side reordered and retyped with different case.
        let rows = reconcile(
            &tools(&[("Scissors", 2), ("Forceps", 1)]),
            &tools(&[("forceps", 1), ("Scissors", 3)]),
            2,
            Some(2),
        );
        assert_eq!((rows[0].transfer_qty, rows[0].return_qty), (2, 3));
        assert_eq!((rows[1].transfer_qty, rows[1].return_qty), (1, 1));
    }

    #[test]
    fn test_positional_fallback_when_renamed() {
        // Second return row was renamed entirely; its count still lands
        // on the second transfer row by position.
        let rows = reconcile(
            &tools(&[("Scissors", 2), ("Forceps", 1)]),
            &tools(&[("Scissors", 2), ("Pinzette", 4)]),
            1,
            None,
        );
        assert_eq!(rows[1].return_qty, 4);
    }

    #[test]
    fn test_missing_return_row_defaults_to_zero() {
        let rows = reconcile(
            &tools(&[("Scissors", 2), ("Forceps", 1)]),
            &tools(&[("Scissors", 2)]),
            1,
            None,
        );
        assert_eq!(rows[1].return_qty, 0);
    }

    #[test]
    fn test_blank_names_are_dropped() {
        let rows = reconcile(
            &tools(&[("Scissors", 2), ("", 9), ("   ", 9)]),
            &[],
            1,
            None,
        );
        assert_eq!(rows.len(), 2); // Scissors + summary
    }

    #[test]
    fn test_zero_return_packages_falls_back() {
        let rows = reconcile(&tools(&[("Scissors", 1)]), &[], 5, Some(0));
        let summary = rows.last().expect("summary row");
        assert_eq!(summary.return_qty, 5);
        let rows = reconcile(&tools(&[("Scissors", 1)]), &[], 5, Some(4));
        assert_eq!(rows.last().expect("summary row").return_qty, 4);
    }
}
