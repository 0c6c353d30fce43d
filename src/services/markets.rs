//! Market extractors.
//!
//! The primary and regional market listings are cross-referenced against the
//! [`IndexTable`] published by wave 1: a base weapon name is never a tradable market
//! item, so any listing entry whose name is in the table is dropped. The
//! marketplace-ids catalog is split into its per-kind tables without cross-referencing.

use crate::models::records::{MarketplaceCatalog, PrimaryMarketEntry};
use crate::models::{GroupedIds, IdentifierMapping, IndexTable, PatternSeeds};
use std::collections::HashMap;

/// English-name suffix of holo/foil sticker variants listed under a different internal key.
pub const FOIL_SUFFIX: &str = "(Holo/Foil)";

/// Regional listings use this id for items the marketplace does not carry.
pub const UNKNOWN_MARKET_ID: i64 = -1;

/// Keep entries whose english name is the internal key itself or a holo/foil variant,
/// minus anything in the index table.
pub fn extract_primary_market_ids(
    listing: HashMap<String, PrimaryMarketEntry>,
    index: &IndexTable,
) -> IdentifierMapping<i64> {
    listing
        .into_iter()
        .filter_map(|(name, entry)| {
            let en_name = entry.en_name?;
            let name_id = entry.name_id?;
            (en_name == name || en_name.ends_with(FOIL_SUFFIX)).then_some((name, name_id))
        })
        .filter(|(name, _)| !index.contains(name))
        .collect()
}

/// Drop unknown-id entries and anything in the index table.
pub fn extract_regional_market_ids(
    listing: HashMap<String, i64>,
    index: &IndexTable,
) -> IdentifierMapping<i64> {
    listing
        .into_iter()
        .filter(|(name, id)| *id != UNKNOWN_MARKET_ID && !index.contains(name))
        .collect()
}

/// Tables derived from the marketplace-ids catalog.
#[derive(Debug, Clone, Default)]
pub struct MarketplaceIds {
    pub buff_market: IdentifierMapping<i64>,
    pub stickers: IdentifierMapping<i64>,
    pub paintseed_groups: IdentifierMapping<GroupedIds>,
    pub phases: IdentifierMapping<GroupedIds>,
    pub tags: IdentifierMapping<GroupedIds>,
    pub patches: IdentifierMapping<i64>,
    pub patterns: IdentifierMapping<PatternSeeds>,
}

pub fn extract_marketplace_ids(catalog: MarketplaceCatalog) -> MarketplaceIds {
    let mut ids = MarketplaceIds::default();

    for (name, item) in catalog.items {
        if let Some(id) = item.buffmarket_goods_id {
            ids.buff_market.insert(name.clone(), id);
        }
        if let Some(id) = item.buff163_sticker_id {
            ids.stickers.insert(name.clone(), id);
        }
        if let Some(groups) = item.buff163_paintseed_group_ids {
            ids.paintseed_groups.insert(name.clone(), present_ids(groups));
        }
        if let Some(phases) = item.buff163_phase_ids {
            ids.phases.insert(name.clone(), present_ids(phases));
        }
        if let Some(tags) = item.buff163_tag_ids {
            ids.tags.insert(name.clone(), present_ids(tags));
        }
        if let Some(id) = item.buff163_patch_id {
            ids.patches.insert(name, id);
        }
    }

    ids.patterns = catalog.patterns;
    ids
}

/// Sorted group ids with null entries dropped; an all-null group stays as an empty map.
fn present_ids(groups: HashMap<String, Option<i64>>) -> GroupedIds {
    groups
        .into_iter()
        .filter_map(|(label, id)| Some((label, id?)))
        .collect()
}
