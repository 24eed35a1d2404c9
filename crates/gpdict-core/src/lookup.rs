//! Lookup view state
//!
//! One [`LookupView`] owns everything the main window shows: the installed
//! dictionaries, which one is open, the query and its results.

use crate::dictionary::{DictionaryBackend, DictionaryInfo, LookupHit, StarDictBackend};
use crate::error::Result;
use crate::markup::render_entry;
use crate::table::{ChoiceSource, Column, TableSource};

/// Opens a backend for a dictionary
pub type BackendOpener = Box<dyn Fn(&DictionaryInfo) -> Result<Box<dyn DictionaryBackend>>>;

/// Dictionary selection, query and results of the main view
pub struct LookupView {
    dictionaries: Vec<DictionaryInfo>,
    selected: Option<usize>,
    backend: Option<Box<dyn DictionaryBackend>>,
    opener: BackendOpener,
    query: String,
    hits: Vec<LookupHit>,
    displayed: usize,
}

impl LookupView {
    pub fn new(opener: BackendOpener) -> Self {
        Self {
            dictionaries: Vec::new(),
            selected: None,
            backend: None,
            opener,
            query: String::new(),
            hits: Vec::new(),
            displayed: 0,
        }
    }

    /// View opening dictionaries with [`StarDictBackend`]
    pub fn with_stardict() -> Self {
        Self::new(Box::new(|info| {
            StarDictBackend::open(info).map(|b| Box::new(b) as Box<dyn DictionaryBackend>)
        }))
    }

    /// Replace the dictionary list
    ///
    /// Selects `preferred` if present, otherwise keeps the currently selected
    /// dictionary if it is still installed, otherwise the first one.
    pub fn set_dictionaries(
        &mut self,
        dictionaries: Vec<DictionaryInfo>,
        preferred: Option<&str>,
    ) -> Result<()> {
        let current = self.dictionary().map(|d| d.ifo_path.clone());
        self.dictionaries = dictionaries;
        self.selected = None;
        self.backend = None;

        let idx = preferred
            .and_then(|name| self.dictionaries.iter().position(|d| d.name == name))
            .or_else(|| {
                current.and_then(|path| self.dictionaries.iter().position(|d| d.ifo_path == path))
            })
            .or(if self.dictionaries.is_empty() { None } else { Some(0) });

        match idx {
            Some(idx) => self.select_dictionary(idx).map(|_| ()),
            None => {
                self.clear_results();
                Ok(())
            }
        }
    }

    pub fn dictionaries(&self) -> &[DictionaryInfo] {
        &self.dictionaries
    }

    /// Selected dictionary
    pub fn dictionary(&self) -> Option<&DictionaryInfo> {
        self.selected.and_then(|idx| self.dictionaries.get(idx))
    }

    /// Open the dictionary at `idx` and rerun the current query
    ///
    /// Returns `Ok(false)` for an out-of-range index, leaving the state as is.
    /// When opening fails the dictionary stays selected but closed.
    pub fn select_dictionary(&mut self, idx: usize) -> Result<bool> {
        let Some(info) = self.dictionaries.get(idx) else {
            return Ok(false);
        };

        self.backend = None;
        self.selected = Some(idx);

        match (self.opener)(info) {
            Ok(backend) => self.backend = Some(backend),
            Err(e) => {
                self.clear_results();
                return Err(e);
            }
        }

        let query = std::mem::take(&mut self.query);
        self.lookup(&query)?;
        Ok(true)
    }

    /// Whether the search box should accept edits
    pub fn accepts_input(&self) -> bool {
        self.backend.is_some()
    }

    /// Look `query` up in the open dictionary
    pub fn lookup(&mut self, query: &str) -> Result<()> {
        self.query = query.to_string();
        self.displayed = 0;

        let word = query.trim();
        let Some(backend) = self.backend.as_mut() else {
            self.hits.clear();
            return Ok(());
        };
        if word.is_empty() {
            self.hits.clear();
            return Ok(());
        }

        match backend.lookup(word) {
            Ok(hits) => {
                tracing::debug!("Lookup '{}': {} hits", word, hits.len());
                self.hits = hits;
                Ok(())
            }
            Err(e) => {
                self.hits.clear();
                Err(e)
            }
        }
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn hits(&self) -> &[LookupHit] {
        &self.hits
    }

    /// Show the result at `idx` in the entry pane
    pub fn show_hit(&mut self, idx: usize) -> bool {
        if idx < self.hits.len() {
            self.displayed = idx;
            true
        } else {
            false
        }
    }

    pub fn displayed_hit(&self) -> Option<&LookupHit> {
        self.hits.get(self.displayed)
    }

    pub fn displayed_word(&self) -> Option<&str> {
        self.displayed_hit().map(|h| h.word.as_str())
    }

    /// Rendered body of the displayed result
    pub fn displayed_text(&self) -> Option<String> {
        self.displayed_hit().map(|h| render_entry(h.format, &h.body))
    }

    pub fn results_table(&self) -> LookupResultTable<'_> {
        LookupResultTable { hits: &self.hits }
    }

    fn clear_results(&mut self) {
        self.hits.clear();
        self.displayed = 0;
    }
}

impl ChoiceSource for LookupView {
    fn count(&self) -> usize {
        self.dictionaries.len()
    }

    fn label(&self, idx: usize) -> Option<&str> {
        self.dictionaries.get(idx).map(|d| d.name.as_str())
    }

    fn selected(&self) -> Option<usize> {
        self.selected
    }

    fn set_selected(&mut self, idx: usize) -> bool {
        match self.select_dictionary(idx) {
            Ok(selected) => selected,
            Err(e) => {
                tracing::error!("Failed to open dictionary: {}", e);
                true
            }
        }
    }
}

const RESULT_COLUMNS: [Column; 1] = [Column { id: "res", title: "Word" }];

/// Lookup results as a one-column table
#[derive(Debug, Clone, Copy)]
pub struct LookupResultTable<'a> {
    hits: &'a [LookupHit],
}

impl TableSource for LookupResultTable<'_> {
    fn columns(&self) -> &[Column] {
        &RESULT_COLUMNS
    }

    fn row_count(&self) -> usize {
        self.hits.len()
    }

    fn cell(&self, row: usize, col: usize) -> Option<&str> {
        if col != 0 {
            return None;
        }
        self.hits.get(row).map(|h| h.word.as_str())
    }
}
