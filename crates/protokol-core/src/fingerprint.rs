//! Content fingerprints for finalized entries.
//!
//! Finalization status is tracked outside the entry, so storage rows
//! that predate the feature need no migration. The set is keyed by a
//! stable hash over
//! the entry's content fields. Two entries with identical content share
//! a fingerprint, so re-creating an identical row cannot be promoted a
//! second time.

use serde::Serialize;

use crate::model::{Delivery, Entry, ToolLine};

/// Hex-encoded blake3 fingerprint of an entry's content.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Fingerprint(String);

impl Fingerprint {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Rewrap a stored hex digest.
    pub fn from_hex(hex: impl Into<String>) -> Self {
        Self(hex.into())
    }
}

impl std::fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// The canonical field set, serialized in a fixed order. Signatures,
/// queue flags and return-leg data deliberately stay out: attaching a
/// signature must not change an entry's identity.
#[derive(Serialize)]
struct CanonicalEntry<'a> {
    date: &'a str,
    tools: Vec<&'a ToolLine>,
    packages: u32,
    delivery: Option<Delivery>,
    shipping: bool,
    comment: &'a str,
}

/// Fingerprint of an entry's content fields.
pub fn fingerprint(entry: &Entry) -> Fingerprint {
    let mut tools: Vec<&ToolLine> = entry
        .tools
        .iter()
        .filter(|t| !t.name.trim().is_empty())
        .collect();
    tools.sort_by(|a, b| a.name.cmp(&b.name).then(a.count.cmp(&b.count)));

    let canonical = CanonicalEntry {
        date: entry.date.trim(),
        tools,
        packages: entry.packages,
        delivery: entry.delivery,
        shipping: entry.shipping,
        comment: &entry.comment,
    };
    let json = serde_json::to_string(&canonical).expect("canonical entry serializes");
    Fingerprint(blake3::hash(json.as_bytes()).to_hex().to_string())
}
