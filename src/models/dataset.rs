use std::fmt;

/// Catalog categories fetched from the item catalog API in wave 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    Agents,
    Collectibles,
    Crates,
    Graffiti,
    Highlights,
    Keychains,
    Keys,
    MusicKits,
    Patches,
    Skins,
    Stickers,
}

impl Category {
    /// Every category, in the order tasks are launched.
    pub const ALL: [Category; 11] = [
        Category::Skins,
        Category::Agents,
        Category::Collectibles,
        Category::Crates,
        Category::Graffiti,
        Category::Highlights,
        Category::Keychains,
        Category::Keys,
        Category::MusicKits,
        Category::Patches,
        Category::Stickers,
    ];

    /// JSON file name of this category under the catalog base URL.
    pub fn endpoint(self) -> &'static str {
        match self {
            Category::Agents => "agents.json",
            Category::Collectibles => "collectibles.json",
            Category::Crates => "crates.json",
            Category::Graffiti => "graffiti.json",
            Category::Highlights => "highlights.json",
            Category::Keychains => "keychains.json",
            Category::Keys => "keys.json",
            Category::MusicKits => "music_kits.json",
            Category::Patches => "patches.json",
            Category::Skins => "skins.json",
            Category::Stickers => "stickers.json",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.endpoint().trim_end_matches(".json"))
    }
}

/// Identity of one fetch task, used to tag failures and route results.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Dataset {
    /// One of the item catalog categories
    Catalog(Category),

    /// The third-party marketplace-ids catalog (buff163 groups, patterns)
    MarketplaceIds,

    /// The primary (Steam) market listing
    PrimaryMarket,

    /// A regional market listing, keyed by its source slug
    RegionalMarket(String),
}

impl fmt::Display for Dataset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Dataset::Catalog(category) => write!(f, "catalog/{}", category),
            Dataset::MarketplaceIds => f.write_str("marketplace-ids"),
            Dataset::PrimaryMarket => f.write_str("market/steam"),
            Dataset::RegionalMarket(slug) => write!(f, "market/{}", slug),
        }
    }
}
