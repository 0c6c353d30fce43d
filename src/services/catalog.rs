//! Category extractors: one raw record list in, one normalized name → id mapping out.
//!
//! Every extractor is a pure function of its input. A record without a market name, or
//! without a usable identifier, is dropped silently; that is ordinary data cleanup and not
//! reported. Duplicate market names resolve last-write-wins.

use crate::models::records::{
    Agent, Collectible, Crate, Graffiti, Highlight, Key, Keychain, MusicKit, Patch, Skin, Sticker,
    Weapon,
};
use crate::models::{IdentifierMapping, IndexTable, KeyId};
use regex::Regex;
use std::collections::HashSet;
use std::sync::LazyLock;

static COLLECTIBLE_EXCLUSIONS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(Souvenir Token|2024 Souvenir Package|2025 Souvenir Package)\b")
        .expect("Invalid collectible exclusion regex")
});

static CRATE_EXCLUSIONS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(Sticker Collection|Patch Collection|Storage Unit)\b")
        .expect("Invalid crate exclusion regex")
});

static GRAFFITI_YEAR_MARKERS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(2019|2021|2022|2023|2024|2025)\b").expect("Invalid graffiti year regex")
});

/// Sticker names that the market lists under a different item and must not be mapped.
pub const STICKER_DENYLIST: [&str; 11] = [
    "Sticker | 3DMAX | DreamHack 2014",
    "Sticker | London Conspiracy | DreamHack 2014",
    "Sticker | dAT team | DreamHack 2014",
    "Sticker | mousesports | DreamHack 2014",
    "Sticker | Ninja (Foil)",
    "Sticker | The Bomber (Foil)",
    "Sticker | The Nader (Foil)",
    "Sticker | The Awper (Foil)",
    "Sticker | The Fragger (Foil)",
    "Sticker | Support (Foil)",
    "Sticker | The Leader (Foil)",
];

static STICKER_DENYSET: LazyLock<HashSet<&'static str>> =
    LazyLock::new(|| STICKER_DENYLIST.into_iter().collect());

/// Market name of a record, treating an empty string like an absent one.
fn market_name(name: &Option<String>) -> Option<&str> {
    name.as_deref().filter(|name| !name.is_empty())
}

/// Record ID, treating an empty string like an absent one.
fn record_id(id: &Option<String>) -> Option<&str> {
    id.as_deref().filter(|id| !id.is_empty())
}

/// Parse a decimal def-index style field.
pub fn parse_def_index(raw: Option<&str>) -> Option<i64> {
    raw?.parse().ok()
}

/// The identifier segment of a composite ID such as `"crate-4001"`.
///
/// This is the second hyphen-delimited segment; an ID without a hyphen has none.
pub fn composite_suffix(id: &str) -> Option<&str> {
    id.split('-').nth(1)
}

/// The composite ID suffix as an integer, if it parses.
pub fn composite_numeric_id(id: &str) -> Option<i64> {
    composite_suffix(id)?.parse().ok()
}

/// Both tables derived from the skins catalog.
#[derive(Debug, Clone, Default)]
pub struct SkinIndexes {
    /// Weapon name → weapon id
    pub def_indexes: IndexTable,

    /// Pattern name → paint index
    pub paint_indexes: IdentifierMapping<i64>,
}

pub fn extract_skin_indexes(records: &[Skin]) -> SkinIndexes {
    let mut def_indexes = IdentifierMapping::with_capacity(records.len());
    let mut paint_indexes = IdentifierMapping::with_capacity(records.len());

    for skin in records {
        if let Some((name, weapon_id)) = skin.weapon.as_ref().and_then(weapon_entry) {
            def_indexes.insert(name.to_string(), weapon_id);
        }

        let pattern = skin.pattern.as_ref().and_then(|p| market_name(&p.name));
        if let (Some(pattern), Some(paint_index)) =
            (pattern, parse_def_index(skin.paint_index.as_deref()))
        {
            paint_indexes.insert(pattern.to_string(), paint_index);
        }
    }

    SkinIndexes {
        def_indexes: IndexTable::new(def_indexes),
        paint_indexes,
    }
}

/// Weapon name and id; a weapon missing either is skipped.
fn weapon_entry(weapon: &Weapon) -> Option<(&str, i64)> {
    Some((market_name(&weapon.name)?, weapon.weapon_id?))
}

pub fn extract_agents(records: &[Agent]) -> IdentifierMapping<i64> {
    records
        .iter()
        .filter_map(|agent| {
            let id = parse_def_index(agent.def_index.as_deref())?;
            Some((market_name(&agent.market_hash_name)?.to_string(), id))
        })
        .collect()
}

pub fn extract_collectibles(records: &[Collectible]) -> IdentifierMapping<i64> {
    records
        .iter()
        .filter_map(|item| {
            let id = parse_def_index(item.def_index.as_deref())?;
            let name = market_name(&item.market_hash_name)?;
            (!COLLECTIBLE_EXCLUSIONS.is_match(name)).then(|| (name.to_string(), id))
        })
        .collect()
}

pub fn extract_crates(records: &[Crate]) -> IdentifierMapping<i64> {
    records
        .iter()
        .filter_map(|item| {
            let id = composite_numeric_id(record_id(&item.id)?)?;
            let name = market_name(&item.market_hash_name)?;
            (!CRATE_EXCLUSIONS.is_match(name)).then(|| (name.to_string(), id))
        })
        .collect()
}

/// Graffiti keyed by market name, valued by the numeric composite ID suffix kept as text.
///
/// Year-marked graffiti (tournament editions) are excluded. The `def_index` field is
/// ignored: the composite suffix is the identifier the market uses.
pub fn extract_graffiti(records: &[Graffiti]) -> IdentifierMapping<String> {
    records
        .iter()
        .filter_map(|item| {
            let suffix = composite_suffix(record_id(&item.id)?)?;
            if suffix.is_empty() || !suffix.bytes().all(|b| b.is_ascii_digit()) {
                return None;
            }
            let name = market_name(&item.market_hash_name)?;
            (!GRAFFITI_YEAR_MARKERS.is_match(name)).then(|| (name.to_string(), suffix.to_string()))
        })
        .collect()
}

pub fn extract_highlights(records: &[Highlight]) -> IdentifierMapping<String> {
    records
        .iter()
        .filter_map(|item| {
            let id = record_id(&item.id)?;
            Some((market_name(&item.market_hash_name)?.to_string(), id.to_string()))
        })
        .collect()
}

pub fn extract_keychains(records: &[Keychain]) -> IdentifierMapping<i64> {
    records
        .iter()
        .filter_map(|item| {
            let id = parse_def_index(item.def_index.as_deref())?;
            Some((market_name(&item.market_hash_name)?.to_string(), id))
        })
        .collect()
}

pub fn extract_keys(records: &[Key]) -> IdentifierMapping<KeyId> {
    records
        .iter()
        .filter_map(|item| {
            let name = market_name(&item.market_hash_name)?;
            let suffix = composite_suffix(record_id(&item.id)?)?;
            Some((name.to_string(), KeyId::from_suffix(suffix)))
        })
        .collect()
}

pub fn extract_music_kits(records: &[MusicKit]) -> IdentifierMapping<i64> {
    records
        .iter()
        .filter_map(|item| {
            let id = parse_def_index(item.def_index.as_deref())?;
            Some((market_name(&item.market_hash_name)?.to_string(), id))
        })
        .collect()
}

pub fn extract_patches(records: &[Patch]) -> IdentifierMapping<i64> {
    records
        .iter()
        .filter_map(|item| {
            let id = parse_def_index(item.def_index.as_deref())?;
            Some((market_name(&item.market_hash_name)?.to_string(), id))
        })
        .collect()
}

pub fn extract_stickers(records: &[Sticker]) -> IdentifierMapping<i64> {
    records
        .iter()
        .filter_map(|item| {
            let id = parse_def_index(item.def_index.as_deref())?;
            let name = market_name(&item.market_hash_name)?;
            (!STICKER_DENYSET.contains(name)).then(|| (name.to_string(), id))
        })
        .collect()
}
