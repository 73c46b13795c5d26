use std::path::PathBuf;

use log::debug;

pub const DEFAULT_BASE_URL: &str = "http://localhost:8000";
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_CACHE_TTL_SECS: i64 = 300;

/// Connection settings for [`crate::ReadNext`].
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub base_url: String,
    pub timeout_secs: u64,
    pub cache_ttl_secs: i64,
    /// When set, tokens persist in a JSON file at this path; otherwise they
    /// live in process memory only.
    pub token_file: Option<PathBuf>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            cache_ttl_secs: DEFAULT_CACHE_TTL_SECS,
            token_file: None,
        }
    }
}

impl ClientConfig {
    /// Reads `READNEXT_*` variables, honoring a local `.env` file.
    /// Unparseable values fall back to the defaults.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let mut config = Self::default();
        if let Ok(url) = std::env::var("READNEXT_API_URL") {
            config.base_url = url;
        }
        if let Ok(raw) = std::env::var("READNEXT_TIMEOUT_SECS") {
            match raw.parse() {
                Ok(secs) => config.timeout_secs = secs,
                Err(_) => debug!("ignoring invalid READNEXT_TIMEOUT_SECS: {raw}"),
            }
        }
        if let Ok(raw) = std::env::var("READNEXT_CACHE_TTL_SECS") {
            match raw.parse() {
                Ok(secs) => config.cache_ttl_secs = secs,
                Err(_) => debug!("ignoring invalid READNEXT_CACHE_TTL_SECS: {raw}"),
            }
        }
        if let Ok(path) = std::env::var("READNEXT_TOKEN_FILE") {
            config.token_file = Some(PathBuf::from(path));
        }
        config
    }
}
