//! Configuration loading

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::info;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub catalog: CatalogConfig,
    #[serde(default)]
    pub http: HttpConfig,
    #[serde(default)]
    pub download: DownloadConfig,
    #[serde(default)]
    pub installer: InstallerConfig,
    #[serde(default)]
    pub identity: IdentityConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogConfig {
    /// Root catalog (cabinet or plain XML)
    #[serde(default = "default_index_url")]
    pub index_url: String,
    /// Base URL that relative manifest and package paths are joined onto
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Member of the root catalog cabinet holding the index XML
    #[serde(default = "default_index_file")]
    pub index_file: String,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            index_url: default_index_url(),
            base_url: default_base_url(),
            index_file: default_index_file(),
        }
    }
}

fn default_index_url() -> String {
    "https://downloads.dell.com/catalog/CatalogIndexPC.cab".to_string()
}

fn default_base_url() -> String {
    "https://downloads.dell.com/".to_string()
}

fn default_index_file() -> String {
    "CatalogIndexPC.xml".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    /// Whole-request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout(),
            user_agent: default_user_agent(),
        }
    }
}

fn default_timeout() -> u64 {
    60
}

fn default_user_agent() -> String {
    format!("biosup/{}", env!("CARGO_PKG_VERSION"))
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DownloadConfig {
    /// Staging directory; each run gets its own subdirectory
    #[serde(default = "default_download_dir")]
    pub dir: PathBuf,
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            dir: default_download_dir(),
        }
    }
}

fn default_download_dir() -> PathBuf {
    std::env::temp_dir().join("biosup")
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstallerConfig {
    #[serde(default = "default_true")]
    pub silent: bool,
    #[serde(default)]
    pub auto_restart: bool,
}

impl Default for InstallerConfig {
    fn default() -> Self {
        Self {
            silent: true,
            auto_restart: false,
        }
    }
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IdentityConfig {
    /// TOML file replacing the OS identity reader
    #[serde(default)]
    pub file: Option<PathBuf>,
}

/// Load configuration from file
pub fn load_config(path: &Path) -> Result<Config> {
    if path.exists() {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Invalid configuration in {}", path.display()))?;
        info!(path = %path.display(), "Loaded configuration");
        Ok(config)
    } else {
        info!(
            path = %path.display(),
            "Configuration file not found, using defaults"
        );
        Ok(Config::default())
    }
}

/// Save default configuration to file
pub fn save_default_config(path: &Path) -> Result<()> {
    let content = toml::to_string_pretty(&Config::default())?;
    std::fs::write(path, content)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(())
}
