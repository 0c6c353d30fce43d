//! Raw records as published by the catalog and marketplace sources.
//!
//! Only the fields the extractors read are declared; everything else in the source
//! JSON is ignored. Every declared field is optional and every struct defaults missing
//! fields, so a record with a null or absent value still decodes and is then dropped by
//! its extractor instead of failing the whole dataset.

use crate::models::mapping::PatternSeeds;
use serde::Deserialize;
use std::collections::HashMap;

/// Shape shared by the categories keyed by a decimal `def_index`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct IndexedItem {
    pub def_index: Option<String>,
    pub market_hash_name: Option<String>,
}

/// Shape shared by the categories keyed by a composite ID such as `"crate-4001"`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CompositeItem {
    pub id: Option<String>,
    pub market_hash_name: Option<String>,
}

pub type Agent = IndexedItem;
pub type Collectible = IndexedItem;
pub type Keychain = IndexedItem;
pub type MusicKit = IndexedItem;
pub type Patch = IndexedItem;
pub type Sticker = IndexedItem;

pub type Crate = CompositeItem;
pub type Graffiti = CompositeItem;
pub type Highlight = CompositeItem;
pub type Key = CompositeItem;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Weapon {
    pub weapon_id: Option<i64>,
    pub name: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Pattern {
    pub name: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Skin {
    pub weapon: Option<Weapon>,
    pub pattern: Option<Pattern>,
    pub paint_index: Option<String>,
}

/// One entry of the primary market listing, keyed by internal name.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PrimaryMarketEntry {
    pub en_name: Option<String>,
    pub name_id: Option<i64>,
}

/// Per-item ids from the marketplace-ids catalog. Nested id maps may carry nulls.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct MarketplaceItem {
    pub buffmarket_goods_id: Option<i64>,
    pub buff163_sticker_id: Option<i64>,
    pub buff163_paintseed_group_ids: Option<HashMap<String, Option<i64>>>,
    pub buff163_phase_ids: Option<HashMap<String, Option<i64>>>,
    pub buff163_tag_ids: Option<HashMap<String, Option<i64>>>,
    pub buff163_patch_id: Option<i64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct MarketplaceCatalog {
    pub items: HashMap<String, MarketplaceItem>,
    pub patterns: HashMap<String, PatternSeeds>,
}
