use serde::Serialize;
use std::collections::{BTreeMap, HashMap};

/// Unique market name → identifier.
///
/// Iteration order is irrelevant in memory; the writer sorts keys at publication.
pub type IdentifierMapping<T> = HashMap<String, T>;

/// Group label → id (paint-seed groups, phases, tags). Sorted so nested output is stable.
pub type GroupedIds = BTreeMap<String, i64>;

/// Pattern label → paint seeds.
pub type PatternSeeds = BTreeMap<String, Vec<i64>>;

/// Identifier of a key item: numeric when the composite ID suffix parses, raw text otherwise.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum KeyId {
    Integer(i64),
    Text(String),
}

impl KeyId {
    pub fn from_suffix(suffix: &str) -> Self {
        match suffix.parse::<i64>() {
            Ok(id) => KeyId::Integer(id),
            Err(_) => KeyId::Text(suffix.to_string()),
        }
    }
}

/// Weapon name → weapon id, built once from the skins catalog.
///
/// Market extraction uses it to drop base weapon names from marketplace listings.
/// There is no mutating API: once built it is shared behind an `Arc` and only read.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IndexTable {
    entries: IdentifierMapping<i64>,
}

impl IndexTable {
    pub fn new(entries: IdentifierMapping<i64>) -> Self {
        Self { entries }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn get(&self, name: &str) -> Option<i64> {
        self.entries.get(name).copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The underlying mapping, for publication.
    pub fn as_mapping(&self) -> &IdentifierMapping<i64> {
        &self.entries
    }
}

impl FromIterator<(String, i64)> for IndexTable {
    fn from_iter<I: IntoIterator<Item = (String, i64)>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}
