use crate::models::Category;
use camino::Utf8PathBuf;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Run configuration from ItemMapper.yaml
///
/// Every section falls back to the built-in defaults, so an empty or partial file is valid.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MapperConfig {
    #[serde(default)]
    pub sources: SourceSettings,

    #[serde(default)]
    pub output: OutputSettings,

    #[serde(default)]
    pub logging: LoggingSettings,
}

/// Remote sources and HTTP client tuning
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceSettings {
    #[serde(default = "default_catalog_base_url")]
    pub catalog_base_url: String,

    #[serde(default = "default_market_ids_base_url")]
    pub market_ids_base_url: String,

    #[serde(default = "default_marketplace_ids_url")]
    pub marketplace_ids_url: String,

    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    #[serde(default = "default_max_idle_connections")]
    pub max_idle_connections: usize,

    #[serde(default = "default_idle_timeout_secs")]
    pub idle_timeout_secs: u64,

    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Regional market source slug → output file stem under `market_ids/`
    #[serde(default = "default_regional_marketplaces")]
    pub regional_marketplaces: IndexMap<String, String>,
}

/// Slug of the primary market listing under the market ids base URL
pub const PRIMARY_MARKET_SLUG: &str = "steam";

const MARKET_LISTING_FILE: &str = "730.json";

impl SourceSettings {
    pub fn catalog_url(&self, category: Category) -> String {
        join_url(&self.catalog_base_url, category.endpoint())
    }

    pub fn market_url(&self, slug: &str) -> String {
        join_url(
            &self.market_ids_base_url,
            &format!("{}/{}", slug, MARKET_LISTING_FILE),
        )
    }
}

fn join_url(base: &str, path: &str) -> String {
    format!("{}/{}", base.trim_end_matches('/'), path)
}

impl Default for SourceSettings {
    fn default() -> Self {
        Self {
            catalog_base_url: default_catalog_base_url(),
            market_ids_base_url: default_market_ids_base_url(),
            marketplace_ids_url: default_marketplace_ids_url(),
            request_timeout_secs: default_request_timeout_secs(),
            max_idle_connections: default_max_idle_connections(),
            idle_timeout_secs: default_idle_timeout_secs(),
            user_agent: default_user_agent(),
            regional_marketplaces: default_regional_marketplaces(),
        }
    }
}

fn default_catalog_base_url() -> String {
    "https://raw.githubusercontent.com/ByMykel/CSGO-API/main/public/api/en/".to_string()
}

fn default_market_ids_base_url() -> String {
    "https://raw.githubusercontent.com/EricZhu-42/SteamTradingSite-ID-Mapper/main/".to_string()
}

fn default_marketplace_ids_url() -> String {
    "https://raw.githubusercontent.com/ModestSerhat/cs2-marketplace-ids/main/cs2_marketplaceids.json"
        .to_string()
}

fn default_request_timeout_secs() -> u64 {
    10
}

fn default_max_idle_connections() -> usize {
    20
}

fn default_idle_timeout_secs() -> u64 {
    10
}

fn default_user_agent() -> String {
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/139.0.0.0 Safari/537.36"
        .to_string()
}

fn default_regional_marketplaces() -> IndexMap<String, String> {
    [("buff", "buff163"), ("c5", "c5game"), ("uuyp", "youpin898"), ("igxe", "igxe")]
        .into_iter()
        .map(|(slug, stem)| (slug.to_string(), stem.to_string()))
        .collect()
}

/// Where the `mini/` and `pretty/` trees are written
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputSettings {
    #[serde(default = "default_output_root")]
    pub root: Utf8PathBuf,
}

impl Default for OutputSettings {
    fn default() -> Self {
        Self {
            root: default_output_root(),
        }
    }
}

fn default_output_root() -> Utf8PathBuf {
    Utf8PathBuf::from(".")
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingSettings {
    #[serde(default = "default_log_dir")]
    pub log_dir: String,

    #[serde(default = "default_log_prefix")]
    pub log_prefix: String,

    #[serde(default)]
    pub debug_mode: bool,

    #[serde(default = "default_console_output")]
    pub console_output: bool,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            log_dir: default_log_dir(),
            log_prefix: default_log_prefix(),
            debug_mode: false,
            console_output: default_console_output(),
        }
    }
}

fn default_log_dir() -> String {
    "logs".to_string()
}

fn default_log_prefix() -> String {
    "item-mapper".to_string()
}

fn default_console_output() -> bool {
    true
}
