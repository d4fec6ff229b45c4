//! Application configuration for apidoc.
//!
//! User config lives at `~/.apidoc/apidoc.toml`.
//! CLI flags override config file values, which override defaults.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{ApiDocError, Result};
use crate::path::SegmentEncoding;

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "apidoc.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".apidoc";

// ---------------------------------------------------------------------------
// Config structs (matching apidoc.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Where the documentation document comes from.
    #[serde(default)]
    pub store: StoreConfig,

    /// Cross-reference link settings.
    #[serde(default)]
    pub links: LinksConfig,

    /// Static route generation.
    #[serde(default)]
    pub routes: RoutesConfig,

    /// Static site output.
    #[serde(default)]
    pub site: SiteConfig,
}

/// `[store]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Base URL of the HTTP document store.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    /// Local JSON document, used instead of the HTTP store when set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub document_path: Option<String>,

    /// Request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            url: None,
            document_path: None,
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_timeout_secs() -> u64 {
    30
}

/// `[links]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinksConfig {
    /// Search query prefix for `std::` names; the name remainder is appended raw.
    #[serde(default = "default_std_search_url")]
    pub std_search_url: String,
}

impl Default for LinksConfig {
    fn default() -> Self {
        Self {
            std_search_url: default_std_search_url(),
        }
    }
}

fn default_std_search_url() -> String {
    "https://duckduckgo.com/?q=site%3Aen.cppreference.com+".into()
}

/// `[routes]` section.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RoutesConfig {
    /// Emit route segments unescaped. Routes are then no longer decode-safe.
    #[serde(default)]
    pub passthrough: bool,
}

impl RoutesConfig {
    /// The segment encoding selected by this config.
    pub fn encoding(&self) -> SegmentEncoding {
        if self.passthrough {
            SegmentEncoding::Passthrough
        } else {
            SegmentEncoding::Escaped
        }
    }
}

/// `[site]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteConfig {
    /// Directory the static build is written to.
    #[serde(default = "default_output_dir")]
    pub output_dir: String,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
        }
    }
}

fn default_output_dir() -> String {
    "site".into()
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.apidoc/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| ApiDocError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.apidoc/apidoc.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the application config from disk. Returns defaults if the file does not exist.
pub fn load_config() -> Result<AppConfig> {
    let path = config_file_path()?;

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| ApiDocError::io(path, e))?;

    toml::from_str(&content)
        .map_err(|e| ApiDocError::config(format!("failed to parse {}: {e}", path.display())))
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir).map_err(|e| ApiDocError::io(&dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let content = toml::to_string_pretty(&AppConfig::default())
        .map_err(|e| ApiDocError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| ApiDocError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}
