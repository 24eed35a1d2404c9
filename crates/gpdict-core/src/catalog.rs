//! Dictionary download catalog
//!
//! The catalog is a JSON array describing downloadable dictionaries:
//!
//! ```text
//! [
//!   { "URL": "https://example.org/dicts/wordnet.tar.gz",
//!     "lang": "en", "license": "GPL", "type": "wordnet" }
//! ]
//! ```
//!
//! Sources are tried in order and the first readable file is used. Elements
//! that miss a required field or exceed a length bound are skipped, the rest
//! of the file still loads.

use crate::error::CatalogError;
use serde::Deserialize;
use serde_json::Value;
use std::path::{Path, PathBuf};

/// Catalog file looked up relative to the working directory
pub const CATALOG_FILE_NAME: &str = "dict_urls.json";

/// System-wide catalog used when no local file exists
pub const SYSTEM_CATALOG_PATH: &str = "/etc/gp_apps/gpdict/dict_urls.json";

/// Longest accepted `URL` value in bytes
pub const MAX_URL_LEN: usize = 4096;

/// Longest accepted `lang`, `license` and `type` value in bytes
pub const MAX_FIELD_LEN: usize = 16;

/// One downloadable dictionary
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogEntry {
    pub language: String,
    pub kind: String,
    pub license: String,
    pub url: String,
}

impl CatalogEntry {
    /// Local file name the archive is saved under
    pub fn file_name(&self) -> &str {
        crate::install::file_name_from_url(&self.url)
    }
}

/// Wire form of a catalog element, validated into a [`CatalogEntry`]
#[derive(Debug, Deserialize)]
struct RawEntry {
    #[serde(rename = "URL")]
    url: String,
    lang: String,
    license: String,
    #[serde(rename = "type", default)]
    kind: String,
}

impl RawEntry {
    fn validate(self) -> std::result::Result<CatalogEntry, String> {
        if self.url.is_empty() {
            return Err("empty URL".to_string());
        }
        check_len("URL", &self.url, MAX_URL_LEN)?;
        check_len("lang", &self.lang, MAX_FIELD_LEN)?;
        check_len("license", &self.license, MAX_FIELD_LEN)?;
        check_len("type", &self.kind, MAX_FIELD_LEN)?;

        Ok(CatalogEntry {
            language: self.lang,
            kind: self.kind,
            license: self.license,
            url: self.url,
        })
    }
}

fn check_len(field: &str, value: &str, max: usize) -> std::result::Result<(), String> {
    if value.len() > max {
        Err(format!("'{}' longer than {} bytes", field, max))
    } else {
        Ok(())
    }
}

/// Parsed catalog, in file order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Catalog {
    entries: Vec<CatalogEntry>,
}

impl Catalog {
    pub fn new(entries: Vec<CatalogEntry>) -> Self {
        Self { entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, idx: usize) -> Option<&CatalogEntry> {
        self.entries.get(idx)
    }

    pub fn entries(&self) -> &[CatalogEntry] {
        &self.entries
    }

    pub fn iter(&self) -> std::slice::Iter<'_, CatalogEntry> {
        self.entries.iter()
    }

    /// Parse catalog JSON text
    ///
    /// Fails with [`CatalogError::Format`] when the top-level value is not an
    /// array and with [`CatalogError::Empty`] when no element is valid.
    pub fn parse(text: &str) -> std::result::Result<Self, CatalogError> {
        let value: Value =
            serde_json::from_str(text).map_err(|e| CatalogError::Format(e.to_string()))?;

        let Value::Array(items) = value else {
            tracing::warn!("Catalog: expected array, got {}", json_kind(&value));
            return Err(CatalogError::Format("Expected array".to_string()));
        };

        let mut entries = Vec::with_capacity(items.len());
        for (idx, item) in items.into_iter().enumerate() {
            let raw = match serde_json::from_value::<RawEntry>(item) {
                Ok(raw) => raw,
                Err(e) => {
                    tracing::warn!("Catalog: skipping element {}: {}", idx, e);
                    continue;
                }
            };
            match raw.validate() {
                Ok(entry) => entries.push(entry),
                Err(reason) => {
                    tracing::warn!("Catalog: skipping element {}: {}", idx, reason);
                }
            }
        }

        if entries.is_empty() {
            return Err(CatalogError::Empty);
        }

        tracing::debug!("Catalog: {} entries loaded", entries.len());
        Ok(Self { entries })
    }
}

impl<'a> IntoIterator for &'a Catalog {
    type Item = &'a CatalogEntry;
    type IntoIter = std::slice::Iter<'a, CatalogEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Default source order: working directory first, then the system path
pub fn default_sources() -> Vec<PathBuf> {
    vec![
        PathBuf::from(CATALOG_FILE_NAME),
        PathBuf::from(SYSTEM_CATALOG_PATH),
    ]
}

/// Load the catalog from the first readable source
pub fn load_catalog<P: AsRef<Path>>(sources: &[P]) -> std::result::Result<Catalog, CatalogError> {
    for source in sources {
        let path = source.as_ref();
        match std::fs::read_to_string(path) {
            Ok(text) => {
                tracing::info!("Loading dictionary catalog from {:?}", path);
                return Catalog::parse(&text);
            }
            Err(e) => {
                tracing::debug!("Catalog source {:?} unavailable: {}", path, e);
            }
        }
    }

    Err(CatalogError::NotFound {
        tried: sources.iter().map(|p| p.as_ref().to_path_buf()).collect(),
    })
}
