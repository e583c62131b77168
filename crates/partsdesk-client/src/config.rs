//! # Client Configuration
//!
//! Where the backend lives and how the list screens behave.
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Environment Variables (highest priority)                           │
//! │     PARTSDESK_API_URL=https://api.shop.pk                              │
//! │     PARTSDESK_TIMEOUT_SECS=30                                          │
//! │     PARTSDESK_PAGE_SIZE=10                                             │
//! │     PARTSDESK_SEARCH_DEBOUNCE_MS=400                                   │
//! │     PARTSDESK_LOW_STOCK_THRESHOLD=5                                    │
//! │                                                                         │
//! │  2. TOML Config File                                                   │
//! │     $PARTSDESK_CONFIG, or                                              │
//! │     ~/.config/partsdesk/partsdesk.toml (Linux)                         │
//! │     ~/Library/Application Support/com.partsdesk.partsdesk/... (macOS)  │
//! │                                                                         │
//! │  3. Default Values (lowest priority)                                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration File Format
//! ```toml
//! [api]
//! base_url = "http://localhost:8080"
//! timeout_secs = 30
//!
//! [lists]
//! page_size = 10
//! search_debounce_ms = 400
//!
//! [inventory]
//! low_stock_threshold = 5
//! ```

use std::path::PathBuf;
use std::time::Duration;

use partsdesk_core::{DEFAULT_LOW_STOCK_THRESHOLD, DEFAULT_PAGE_SIZE};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use url::Url;

use crate::error::{ClientError, ClientResult};

/// Accepted debounce window for search boxes.
pub const DEBOUNCE_RANGE_MS: std::ops::RangeInclusive<u64> = 300..=500;

/// Largest page a list screen may ask for.
pub const MAX_PAGE_SIZE: u32 = 100;

// =============================================================================
// Sections
// =============================================================================

/// Backend connection settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiSettings {
    /// Origin of the REST API. Every path is joined onto it.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Per-request timeout (seconds).
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

fn default_base_url() -> String {
    "http://localhost:8080".to_string()
}

fn default_timeout() -> u64 {
    30
}

impl Default for ApiSettings {
    fn default() -> Self {
        ApiSettings {
            base_url: default_base_url(),
            timeout_secs: default_timeout(),
        }
    }
}

/// List screen behavior.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListSettings {
    #[serde(default = "default_page_size")]
    pub page_size: u32,

    /// Delay between the last keystroke and the search request.
    #[serde(default = "default_debounce")]
    pub search_debounce_ms: u64,
}

fn default_page_size() -> u32 {
    DEFAULT_PAGE_SIZE
}

fn default_debounce() -> u64 {
    400
}

impl Default for ListSettings {
    fn default() -> Self {
        ListSettings {
            page_size: default_page_size(),
            search_debounce_ms: default_debounce(),
        }
    }
}

impl ListSettings {
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.search_debounce_ms)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InventorySettings {
    /// Stock at or below this is "low" on every screen and badge.
    #[serde(default = "default_threshold")]
    pub low_stock_threshold: i64,
}

fn default_threshold() -> i64 {
    DEFAULT_LOW_STOCK_THRESHOLD
}

impl Default for InventorySettings {
    fn default() -> Self {
        InventorySettings {
            low_stock_threshold: default_threshold(),
        }
    }
}

// =============================================================================
// Client Configuration
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClientConfig {
    #[serde(default)]
    pub api: ApiSettings,

    #[serde(default)]
    pub lists: ListSettings,

    #[serde(default)]
    pub inventory: InventorySettings,
}

impl ClientConfig {
    /// Loads configuration from file, environment, and defaults.
    ///
    /// ## Load Order (later overrides earlier)
    /// 1. Default values
    /// 2. Config file (`config_path`, `$PARTSDESK_CONFIG`, or the platform path)
    /// 3. Environment variables
    pub fn load(config_path: Option<PathBuf>) -> ClientResult<Self> {
        let mut config = Self::default();

        let path = config_path
            .or_else(|| std::env::var("PARTSDESK_CONFIG").ok().map(PathBuf::from))
            .or_else(Self::default_config_path);

        if let Some(path) = path {
            if path.exists() {
                info!(?path, "Loading client config from file");
                let contents = std::fs::read_to_string(&path)?;
                config = toml::from_str(&contents)?;
            } else {
                debug!(?path, "Config file not found, using defaults");
            }
        }

        config.apply_overrides(|key| std::env::var(key).ok());
        config.validate()?;

        Ok(config)
    }

    /// Loads config or returns default if load fails.
    pub fn load_or_default(config_path: Option<PathBuf>) -> Self {
        Self::load(config_path).unwrap_or_else(|e| {
            warn!("Failed to load client config: {}. Using defaults.", e);
            Self::default()
        })
    }

    /// Checks every setting.
    pub fn validate(&self) -> ClientResult<()> {
        let url = Url::parse(&self.api.base_url)?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(ClientError::Config(format!(
                "API URL must start with http:// or https://, got: {}",
                self.api.base_url
            )));
        }

        if self.api.timeout_secs == 0 {
            return Err(ClientError::Config(
                "timeout_secs must be greater than 0".into(),
            ));
        }

        if self.lists.page_size == 0 || self.lists.page_size > MAX_PAGE_SIZE {
            return Err(ClientError::Config(format!(
                "page_size must be between 1 and {}",
                MAX_PAGE_SIZE
            )));
        }

        if !DEBOUNCE_RANGE_MS.contains(&self.lists.search_debounce_ms) {
            return Err(ClientError::Config(format!(
                "search_debounce_ms must be between {} and {}",
                DEBOUNCE_RANGE_MS.start(),
                DEBOUNCE_RANGE_MS.end()
            )));
        }

        if self.inventory.low_stock_threshold < 0 {
            return Err(ClientError::Config(
                "low_stock_threshold must not be negative".into(),
            ));
        }

        Ok(())
    }

    /// Applies `PARTSDESK_*` overrides read through `lookup`.
    ///
    /// Unparseable numbers are logged and ignored.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup("PARTSDESK_API_URL") {
            debug!(url = %url, "Overriding API URL from environment");
            self.api.base_url = url;
        }

        if let Some(secs) = parse_var(&lookup, "PARTSDESK_TIMEOUT_SECS") {
            self.api.timeout_secs = secs;
        }

        if let Some(size) = parse_var(&lookup, "PARTSDESK_PAGE_SIZE") {
            self.lists.page_size = size;
        }

        if let Some(ms) = parse_var(&lookup, "PARTSDESK_SEARCH_DEBOUNCE_MS") {
            self.lists.search_debounce_ms = ms;
        }

        if let Some(threshold) = parse_var::<_, i64>(&lookup, "PARTSDESK_LOW_STOCK_THRESHOLD") {
            debug!(threshold, "Overriding low-stock threshold from environment");
            self.inventory.low_stock_threshold = threshold;
        }
    }

    /// Returns the default config file path.
    fn default_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("com", "partsdesk", "partsdesk")
            .map(|dirs| dirs.config_dir().join("partsdesk.toml"))
    }

    // =========================================================================
    // Convenience Methods
    // =========================================================================

    /// The API origin with a trailing slash, so relative joins keep any path
    /// prefix the backend is mounted under.
    pub fn base_url(&self) -> ClientResult<Url> {
        let mut raw = self.api.base_url.trim().to_string();
        if !raw.ends_with('/') {
            raw.push('/');
        }
        Ok(Url::parse(&raw)?)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.api.timeout_secs)
    }

    pub fn page_size(&self) -> u32 {
        self.lists.page_size
    }

    pub fn debounce(&self) -> Duration {
        self.lists.debounce()
    }

    pub fn low_stock_threshold(&self) -> i64 {
        self.inventory.low_stock_threshold
    }
}

fn parse_var<F, T>(lookup: &F, key: &str) -> Option<T>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    let raw = lookup(key)?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            warn!(key, value = %raw, "Ignoring unparseable environment override");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    fn vars(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_default_config() {
        let config = ClientConfig::default();
        assert_eq!(config.api.base_url, "http://localhost:8080");
        assert_eq!(config.timeout(), Duration::from_secs(30));
        assert_eq!(config.page_size(), 10);
        assert_eq!(config.debounce(), Duration::from_millis(400));
        assert_eq!(config.low_stock_threshold(), 5);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_env_overrides() {
        let mut config = ClientConfig::default();
        config.apply_overrides(vars(&[
            ("PARTSDESK_API_URL", "https://api.example.pk/v2"),
            ("PARTSDESK_PAGE_SIZE", "25"),
            ("PARTSDESK_LOW_STOCK_THRESHOLD", "abc"),
        ]));
        assert_eq!(config.api.base_url, "https://api.example.pk/v2");
        assert_eq!(config.page_size(), 25);
        assert_eq!(config.low_stock_threshold(), 5);
        assert_eq!(
            config.base_url().unwrap().as_str(),
            "https://api.example.pk/v2/"
        );
    }

    #[test]
    fn test_config_validation() {
        let mut config = ClientConfig::default();

        config.api.base_url = "ftp://files".to_string();
        assert!(config.validate().is_err());

        config.api.base_url = "not a url".to_string();
        assert!(config.validate().is_err());

        config = ClientConfig::default();
        config.lists.search_debounce_ms = 50;
        assert!(config.validate().is_err());

        config = ClientConfig::default();
        config.lists.page_size = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_from_file_then_env() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "[api]\nbase_url = \"http://10.0.0.5:9000\"\n\n[inventory]\nlow_stock_threshold = 3"
        )
        .unwrap();

        let config = ClientConfig::load(Some(file.path().to_path_buf())).unwrap();
        assert_eq!(config.api.base_url, "http://10.0.0.5:9000");
        assert_eq!(config.low_stock_threshold(), 3);
        // Sections missing from the file keep their defaults
        assert_eq!(config.page_size(), 10);
    }

    #[test]
    fn test_bad_file_is_config_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[api\nbase_url = ").unwrap();
        let err = ClientConfig::load(Some(file.path().to_path_buf())).unwrap_err();
        assert!(matches!(err, ClientError::Config(_)));
    }
}
