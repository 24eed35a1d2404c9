//! Installed dictionary discovery and access
//!
//! Dictionaries are found by their `.ifo` descriptor, which the `stardict`
//! crate parses along with the index and data files.

use crate::error::{CoreError, Result};
use crate::markup::EntryFormat;
use stardict::StarDict;
use std::io::BufRead;
use std::path::{Path, PathBuf};

/// First line of every `.ifo` file
pub const IFO_MAGIC: &str = "StarDict's dict ifo file";

/// Directory scanned system-wide besides the per-user install directory
pub const SYSTEM_DICTIONARY_DIR: &str = "/usr/share/stardict/dic";

/// An installed dictionary
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DictionaryInfo {
    /// `bookname`, or the `.ifo` file stem when missing
    pub name: String,
    pub ifo_path: PathBuf,
    pub word_count: Option<u64>,
    /// Format from `sametypesequence`; entries without it carry their own
    pub format: EntryFormat,
}

impl DictionaryInfo {
    /// Read a `.ifo` descriptor
    pub fn from_ifo(path: &Path) -> Result<Self> {
        let mut magic = String::new();
        std::io::BufReader::new(std::fs::File::open(path)?).read_line(&mut magic)?;
        if magic.trim() != IFO_MAGIC {
            return Err(CoreError::Dictionary(format!(
                "{}: not a StarDict ifo file",
                path.display()
            )));
        }

        let ifo = stardict::Ifo::new(path.to_path_buf())
            .map_err(|e| CoreError::Dictionary(format!("{}: {e:?}", path.display())))?;

        let name = Some(ifo.bookname.trim().to_string())
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| {
                path.file_stem()
                    .map(|s| s.to_string_lossy().to_string())
                    .unwrap_or_default()
            });

        Ok(Self {
            name,
            ifo_path: path.to_path_buf(),
            word_count: (ifo.wordcount > 0).then_some(ifo.wordcount as u64),
            format: EntryFormat::from_type_sequence(&ifo.sametypesequence),
        })
    }
}

/// Find dictionaries under `dirs`, sorted by name
///
/// Missing directories are ignored, unreadable descriptors are skipped.
pub fn discover_dictionaries<P: AsRef<Path>>(dirs: &[P]) -> Vec<DictionaryInfo> {
    let mut found: Vec<DictionaryInfo> = Vec::new();

    for dir in dirs {
        let dir = dir.as_ref();
        if !dir.is_dir() {
            tracing::debug!("Dictionary directory {:?} does not exist", dir);
            continue;
        }

        for entry in walkdir::WalkDir::new(dir)
            .follow_links(true)
            .into_iter()
            .filter_map(|e| e.ok())
        {
            if !entry.file_type().is_file() {
                continue;
            }
            let is_ifo = entry
                .path()
                .extension()
                .and_then(|s| s.to_str())
                .is_some_and(|ext| ext.eq_ignore_ascii_case("ifo"));
            if !is_ifo {
                continue;
            }

            match DictionaryInfo::from_ifo(entry.path()) {
                Ok(info) => found.push(info),
                Err(e) => tracing::warn!("Skipping dictionary {:?}: {}", entry.path(), e),
            }
        }
    }

    found.sort_by(|a, b| {
        a.name
            .to_lowercase()
            .cmp(&b.name.to_lowercase())
            .then_with(|| a.ifo_path.cmp(&b.ifo_path))
    });
    found.dedup_by(|a, b| a.ifo_path == b.ifo_path);

    tracing::info!("Found {} dictionaries", found.len());
    found
}

/// One lookup result
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LookupHit {
    /// Headword as spelled by the dictionary
    pub word: String,
    /// Raw entry body, see [`crate::markup::render_entry`]
    pub body: String,
    pub format: EntryFormat,
}

/// Dictionary access used by the lookup view
pub trait DictionaryBackend {
    fn info(&self) -> &DictionaryInfo;

    /// Entries for `word`, empty when the word is unknown
    fn lookup(&mut self, word: &str) -> Result<Vec<LookupHit>>;
}

/// Backend over the `stardict` crate
pub struct StarDictBackend {
    info: DictionaryInfo,
    dict: stardict::StarDictStd,
}

impl StarDictBackend {
    pub fn open(info: &DictionaryInfo) -> Result<Self> {
        tracing::info!("Opening dictionary '{}' ({:?})", info.name, info.ifo_path);
        let dict = stardict::no_cache(info.ifo_path.as_path())
            .map_err(|e| CoreError::Dictionary(format!("{}: {e:?}", info.name)))?;

        Ok(Self {
            info: info.clone(),
            dict,
        })
    }
}

impl DictionaryBackend for StarDictBackend {
    fn info(&self) -> &DictionaryInfo {
        &self.info
    }

    fn lookup(&mut self, word: &str) -> Result<Vec<LookupHit>> {
        let defs = self
            .dict
            .lookup(word)
            .map_err(|e| CoreError::Dictionary(format!("lookup '{}' failed: {e:?}", word)))?;

        let Some(defs) = defs else {
            return Ok(Vec::new());
        };

        let hits = defs
            .into_iter()
            .map(|def| {
                let mut body = String::new();
                let mut format = EntryFormat::PlainText;
                for seg in def.segments {
                    if EntryFormat::from_type_sequence(&seg.types) == EntryFormat::Html {
                        format = EntryFormat::Html;
                    }
                    if !body.is_empty() {
                        body.push('\n');
                    }
                    body.push_str(&seg.text);
                }
                LookupHit {
                    word: def.word,
                    body,
                    format,
                }
            })
            .collect();

        Ok(hits)
    }
}
