//! # gpdict Core
//!
//! Everything in gpdict that does not need a display.
//!
//! This crate provides:
//! - The dictionary download catalog and its table view
//! - The download dialog state machine and install flow
//! - HTTP download and archive extraction
//! - Installed dictionary discovery and lookup
//! - Entry body rendering

pub mod catalog;
pub mod dialog;
pub mod dictionary;
pub mod download;
pub mod error;
pub mod extract;
pub mod install;
pub mod lookup;
pub mod markup;
pub mod table;

pub use catalog::{default_sources, load_catalog, Catalog, CatalogEntry};
pub use dialog::{DialogHost, DialogResult, DownloadDialog};
pub use dictionary::{
    discover_dictionaries, DictionaryBackend, DictionaryInfo, LookupHit, StarDictBackend,
};
pub use download::{DownloadProgress, Downloader, HttpDownloader};
pub use error::{CatalogError, CoreError, Result, NO_CATALOG_MESSAGE};
pub use extract::{ArchiveExtractor, ArchiveKind, Extractor};
pub use install::{file_name_from_url, Installer};
pub use lookup::{LookupResultTable, LookupView};
pub use markup::{render_entry, EntryFormat};
pub use table::{CatalogColumn, CatalogTable, ChoiceSource, Column, RowCursor, TableSource};

/// Core version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Initialize the core library
pub fn init() -> Result<()> {
    tracing::info!("Initializing gpdict core v{}", VERSION);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init() {
        assert!(init().is_ok());
    }
}
