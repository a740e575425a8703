use serde::Deserialize;

use crate::services::DEFAULT_SHORTLIST_SIZE;

/// Layout of the card metadata file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MetadataFormat {
    /// `{id: {color_identity, type_line, cmc, full_name}}`
    #[default]
    Lite,
    /// Full card-database dump keyed by display name
    Scryfall,
}

/// Application configuration loaded from environment variables
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Nested decklist corpus JSON
    #[serde(default = "default_corpus_path")]
    pub corpus_path: String,

    /// Card metadata JSON
    #[serde(default = "default_metadata_path")]
    pub metadata_path: String,

    #[serde(default)]
    pub metadata_format: MetadataFormat,

    /// Widen fetchland and Urborg identities on load
    #[serde(default = "default_fix_land_identities")]
    pub fix_land_identities: bool,

    /// Candidates kept after composite ranking
    #[serde(default = "default_shortlist_size")]
    pub shortlist_size: usize,

    /// Server host address
    #[serde(default = "default_host")]
    pub host: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_corpus_path() -> String {
    "json_data/cedh_decklists.json".to_string()
}

fn default_metadata_path() -> String {
    "json_data/lite_scryfall_dict.json".to_string()
}

fn default_fix_land_identities() -> bool {
    true
}

fn default_shortlist_size() -> usize {
    DEFAULT_SHORTLIST_SIZE
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_vars(std::env::vars())
    }

    /// Load configuration from explicit key/value pairs
    pub fn from_vars<I: IntoIterator<Item = (String, String)>>(vars: I) -> anyhow::Result<Self> {
        envy::from_iter::<_, Config>(vars).map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
