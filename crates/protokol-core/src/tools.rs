//! Tool name dictionary and canonicalization.
//!
//! Tool names are free text typed by different staff. The dictionary is
//! built once per session from the store's tool catalog and maps a
//! normalized key (case-, diacritic- and whitespace-insensitive) back to
//! the canonical catalog spelling. Names that are not in the catalog
//! pass through unchanged.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// The two catalog categories of the tool dictionary.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ToolCatalog {
    #[serde(default)]
    pub cosmetic: Vec<String>,
    #[serde(default)]
    pub medical: Vec<String>,
}

impl ToolCatalog {
    /// All catalog names, catalog order, duplicates (by normalized key)
    /// removed with the first spelling winning.
    pub fn names(&self) -> Vec<String> {
        let mut seen = HashMap::new();
        let mut merged = Vec::new();
        for name in self.cosmetic.iter().chain(self.medical.iter()) {
            let name = name.trim();
            if name.is_empty() {
                continue;
            }
            let key = normalize_name(name);
            if seen.insert(key, ()).is_none() {
                merged.push(name.to_string());
            }
        }
        merged
    }
}

/// Fold Polish diacritics so that "nożyczki" and "nozyczki" share a key.
fn fold_diacritics(c: char) -> char {
    match c {
        'ą' => 'a',
        'ć' => 'c',
        'ę' => 'e',
        'ł' => 'l',
        'ń' => 'n',
        'ó' => 'o',
        'ś' => 's',
        'ź' | 'ż' => 'z',
        other => other,
    }
}

/// Normalized lookup key: lowercased, diacritics folded, whitespace
/// collapsed to single spaces.
pub fn normalize_name(name: &str) -> String {
    name.trim()
        .to_lowercase()
        .chars()
        .map(fold_diacritics)
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Session dictionary: normalized key -> canonical catalog name.
#[derive(Debug, Clone, Default)]
pub struct ToolDictionary {
    names: Vec<String>,
    by_key: HashMap<String, String>,
}

impl ToolDictionary {
    pub fn from_catalog(catalog: &ToolCatalog) -> Self {
        let names = catalog.names();
        let mut by_key = HashMap::new();
        for name in &names {
            by_key.entry(normalize_name(name)).or_insert(name.clone());
        }
        Self { names, by_key }
    }

    /// Canonical spelling for `name`, or the trimmed input when the
    /// catalog has no match.
    pub fn canonicalize(&self, name: &str) -> String {
        let raw = name.trim();
        if raw.is_empty() {
            return String::new();
        }
        self.by_key
            .get(&normalize_name(raw))
            .cloned()
            .unwrap_or_else(|| raw.to_string())
    }

    /// Catalog names containing `query` (normalized substring match),
    /// capped for display.
    pub fn suggestions(&self, query: &str, limit: usize) -> Vec<&str> {
        let key = normalize_name(query);
        if key.is_empty() {
            return Vec::new();
        }
        self.names
            .iter()
            .filter(|name| normalize_name(name).contains(&key))
            .map(String::as_str)
            .take(limit)
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}
