//! # gpdict Configuration
//!
//! Configuration sources (in priority order):
//! 1. CLI arguments
//! 2. Environment variables (`GPDICT_SECTION__KEY`)
//! 3. User config (~/.config/gpdict/config.toml)
//! 4. Defaults

use directories::ProjectDirs;
use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

/// Prefix of environment overrides
pub const ENV_PREFIX: &str = "GPDICT_";

/// Get the configuration directory
pub fn config_dir() -> PathBuf {
    ProjectDirs::from("org", "gfxprim", "gpdict")
        .map(|d| d.config_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from("~/.config/gpdict"))
}

/// Main configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Where the download catalog is looked up
    pub catalog: CatalogConfig,
    /// Installed dictionaries
    pub dictionaries: DictionariesConfig,
    /// Download behavior
    pub download: DownloadConfig,
    /// Window settings
    pub appearance: AppearanceConfig,
}

/// Download catalog lookup
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogConfig {
    /// Catalog file tried first, relative to the working directory
    pub file_name: PathBuf,
    /// Additional catalog files, tried in order after `file_name`
    pub extra_paths: Vec<PathBuf>,
    /// System-wide catalog, tried last
    pub system_path: PathBuf,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            file_name: PathBuf::from("dict_urls.json"),
            extra_paths: Vec::new(),
            system_path: PathBuf::from("/etc/gp_apps/gpdict/dict_urls.json"),
        }
    }
}

impl CatalogConfig {
    /// Catalog sources in lookup order
    pub fn sources(&self) -> Vec<PathBuf> {
        let mut sources = Vec::with_capacity(self.extra_paths.len() + 2);
        sources.push(self.file_name.clone());
        sources.extend(self.extra_paths.iter().cloned());
        sources.push(self.system_path.clone());
        sources
    }
}

/// Installed dictionary locations
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DictionariesConfig {
    /// Install directory; relative paths are taken from the home directory
    pub install_dir: PathBuf,
    /// Extra directories scanned for dictionaries
    pub search_dirs: Vec<PathBuf>,
    /// Name of the last selected dictionary
    pub last_used: Option<String>,
}

impl Default for DictionariesConfig {
    fn default() -> Self {
        Self {
            install_dir: PathBuf::from(".stardict/dic"),
            search_dirs: vec![PathBuf::from("/usr/share/stardict/dic")],
            last_used: None,
        }
    }
}

impl DictionariesConfig {
    /// Absolute install directory
    pub fn install_path(&self) -> PathBuf {
        self.install_path_from(dirs::home_dir().as_deref())
    }

    fn install_path_from(&self, home: Option<&Path>) -> PathBuf {
        if self.install_dir.is_absolute() {
            return self.install_dir.clone();
        }
        match home {
            Some(home) => home.join(&self.install_dir),
            None => {
                tracing::warn!("No home directory, installing relative to the working directory");
                self.install_dir.clone()
            }
        }
    }

    /// Every directory scanned for dictionaries, install directory first
    pub fn scan_dirs(&self) -> Vec<PathBuf> {
        let mut dirs = vec![self.install_path()];
        for dir in &self.search_dirs {
            if !dirs.contains(dir) {
                dirs.push(dir.clone());
            }
        }
        dirs
    }
}

/// Download behavior
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DownloadConfig {
    /// HTTP User-Agent header
    pub user_agent: String,
    /// Whole-transfer timeout in seconds, 0 for none
    pub timeout_secs: u64,
    /// Leading archive path components dropped on extraction
    pub strip_components: usize,
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            user_agent: concat!("gpdict/", env!("CARGO_PKG_VERSION")).to_string(),
            timeout_secs: 0,
            strip_components: 1,
        }
    }
}

impl DownloadConfig {
    pub fn timeout(&self) -> Option<Duration> {
        (self.timeout_secs > 0).then(|| Duration::from_secs(self.timeout_secs))
    }
}

/// Window settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppearanceConfig {
    /// Prefer the dark color scheme
    pub dark_mode: bool,
    /// Initial window width
    pub window_width: i32,
    /// Initial window height
    pub window_height: i32,
}

impl Default for AppearanceConfig {
    fn default() -> Self {
        Self {
            dark_mode: false,
            window_width: 640,
            window_height: 480,
        }
    }
}

/// Configuration manager
pub struct ConfigManager {
    config: Arc<RwLock<Config>>,
    config_path: PathBuf,
}

impl ConfigManager {
    /// Load the user configuration
    pub fn new() -> anyhow::Result<Self> {
        Self::with_path(config_dir().join("config.toml"))
    }

    /// Load configuration from `path`; a missing file yields defaults
    pub fn with_path(path: impl Into<PathBuf>) -> anyhow::Result<Self> {
        let config_path = path.into();
        let config = Self::load_from_file(&config_path)?;

        Ok(Self {
            config: Arc::new(RwLock::new(config)),
            config_path,
        })
    }

    fn load_from_file(path: &Path) -> anyhow::Result<Config> {
        let mut figment = Figment::new();
        if path.exists() {
            tracing::debug!("Loading configuration from {:?}", path);
            figment = figment.merge(Toml::file(path));
        }
        let figment = figment.merge(Env::prefixed(ENV_PREFIX).split("__"));

        Ok(figment.extract()?)
    }

    /// Get current configuration
    pub fn config(&self) -> Config {
        self.config.read().clone()
    }

    /// Update configuration
    pub fn update<F>(&self, f: F)
    where
        F: FnOnce(&mut Config),
    {
        let mut config = self.config.write();
        f(&mut config);
    }

    pub fn path(&self) -> &Path {
        &self.config_path
    }

    /// Save configuration to file
    pub fn save(&self) -> anyhow::Result<()> {
        let config = self.config.read();
        let content = toml::to_string_pretty(&*config)?;

        if let Some(parent) = self.config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        std::fs::write(&self.config_path, content)?;
        tracing::debug!("Configuration saved to {:?}", self.config_path);
        Ok(())
    }
}
