//! Main application setup

use gpdict_config::{Config, ConfigManager};
use gpdict_core::{discover_dictionaries, DictionaryInfo, Installer};
use gtk4::Application;
use parking_lot::RwLock;
use std::path::PathBuf;
use std::sync::Arc;

use crate::window::MainWindow;

/// Global config manager
static CONFIG_MANAGER: std::sync::OnceLock<Arc<RwLock<ConfigManager>>> =
    std::sync::OnceLock::new();

/// Command line settings for the GUI
#[derive(Debug, Clone, Default)]
pub struct StartupOptions {
    /// Configuration file instead of the default one
    pub config_path: Option<PathBuf>,
    /// Catalog file tried before the configured sources
    pub catalog: Option<PathBuf>,
    /// Dictionary selected at start instead of the last used one
    pub dictionary: Option<String>,
}

static STARTUP_OPTIONS: std::sync::OnceLock<StartupOptions> = std::sync::OnceLock::new();

pub(crate) fn set_startup_options(options: StartupOptions) {
    let _ = STARTUP_OPTIONS.set(options);
}

fn startup_options() -> StartupOptions {
    STARTUP_OPTIONS.get().cloned().unwrap_or_default()
}

/// Get the global config manager
pub fn config_manager() -> Option<Arc<RwLock<ConfigManager>>> {
    CONFIG_MANAGER.get().cloned()
}

/// Snapshot of the current configuration, defaults when none was loaded
pub fn current_config() -> Config {
    config_manager()
        .map(|cm| cm.read().config())
        .unwrap_or_default()
}

/// Update and persist the configuration
pub fn update_config<F>(f: F)
where
    F: FnOnce(&mut Config),
{
    if let Some(cm) = config_manager() {
        let cm = cm.read();
        cm.update(f);
        if let Err(e) = cm.save() {
            tracing::warn!("Failed to save config: {}", e);
        }
    }
}

/// Initialize the global config
fn init_config(path: Option<PathBuf>) {
    let manager = match path {
        Some(path) => ConfigManager::with_path(path),
        None => ConfigManager::new(),
    };

    match manager {
        Ok(config_manager) => {
            let _ = CONFIG_MANAGER.set(Arc::new(RwLock::new(config_manager)));
            tracing::info!("Configuration loaded");
        }
        Err(e) => {
            tracing::error!("Failed to load config: {}", e);
        }
    }
}

/// Installer writing into the configured install directory
pub fn build_installer(config: &Config) -> anyhow::Result<Installer> {
    let installer = Installer::http(
        config.dictionaries.install_path(),
        &config.download.user_agent,
        config.download.timeout(),
    )?;
    Ok(installer.with_strip_components(config.download.strip_components))
}

/// Catalog sources, command line override first
pub fn catalog_sources(config: &Config) -> Vec<PathBuf> {
    let mut sources = config.catalog.sources();
    if let Some(catalog) = startup_options().catalog {
        sources.insert(0, catalog);
    }
    sources
}

/// Installed dictionaries in every configured directory
pub fn scan_dictionaries(config: &Config) -> Vec<DictionaryInfo> {
    discover_dictionaries(&config.dictionaries.scan_dirs())
}

/// Build the main UI
pub fn build_ui(app: &Application) {
    let options = startup_options();
    init_config(options.config_path);

    let mut config = current_config();
    if options.dictionary.is_some() {
        config.dictionaries.last_used = options.dictionary;
    }

    let style_manager = libadwaita::StyleManager::default();
    style_manager.set_color_scheme(if config.appearance.dark_mode {
        libadwaita::ColorScheme::PreferDark
    } else {
        libadwaita::ColorScheme::Default
    });

    let window = MainWindow::new(app, &config);
    window.present();
}
