//! Error types for gpdict core

use std::path::PathBuf;
use thiserror::Error;

/// Result type for gpdict core operations
pub type Result<T> = std::result::Result<T, CoreError>;

/// Message shown whenever no usable catalog could be loaded
pub const NO_CATALOG_MESSAGE: &str = "No dictionary URLs defined";

/// Catalog loading failures
///
/// Every variant means "no catalog available" to the dialog, see
/// [`CatalogError::user_message`].
#[derive(Error, Debug)]
pub enum CatalogError {
    /// None of the catalog sources could be read
    #[error("no readable catalog source (tried {})", display_paths(.tried))]
    NotFound { tried: Vec<PathBuf> },

    /// The top-level JSON value is not an array
    #[error("catalog format error: {0}")]
    Format(String),

    /// No entry survived validation
    #[error("catalog contains no valid entries")]
    Empty,
}

impl CatalogError {
    /// Text presented to the user for any catalog failure
    pub fn user_message(&self) -> &'static str {
        NO_CATALOG_MESSAGE
    }
}

fn display_paths(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Core error types
#[derive(Error, Debug)]
pub enum CoreError {
    /// Catalog could not be loaded
    #[error(transparent)]
    Catalog(#[from] CatalogError),

    /// Destination directory could not be created
    #[error("Failed to create directory '{}': {source}", .path.display())]
    DirectoryCreate {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Archive transfer failed
    #[error("Download failed: {0}")]
    Download(String),

    /// Archive extraction failed
    #[error("Extraction failed: {0}")]
    Extract(String),

    /// Dictionary open or lookup failed
    #[error("Dictionary error: {0}")]
    Dictionary(String),

    /// A download was triggered without a selected row
    #[error("No catalog row selected")]
    NoSelection,

    /// The download dialog is not open
    #[error("Download dialog is not open")]
    DialogClosed,

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
