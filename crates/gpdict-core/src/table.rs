//! Read-only table sources for list widgets
//!
//! A widget renders a [`TableSource`] lazily through a [`RowCursor`]: reset
//! to the first row, advance by the number of rows it skipped or drew, and
//! ask for the maximum when sizing its scrollbar. Cells are borrowed straight
//! from the underlying data, nothing is formatted up front.

use crate::catalog::{Catalog, CatalogEntry};

/// Column description
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Column {
    /// Stable identifier
    pub id: &'static str,
    /// Header text
    pub title: &'static str,
}

/// Data source for a virtualized table
pub trait TableSource {
    /// Columns in display order
    fn columns(&self) -> &[Column];

    /// Number of rows
    fn row_count(&self) -> usize;

    /// Cell text, `None` when out of range
    fn cell(&self, row: usize, col: usize) -> Option<&str>;

    /// Index of a column by its identifier
    fn column_index(&self, id: &str) -> Option<usize> {
        self.columns().iter().position(|c| c.id == id)
    }
}

/// Row cursor over a [`TableSource`]
///
/// Seek operations return whether the cursor points at an existing row.
#[derive(Debug)]
pub struct RowCursor<'a, T: TableSource + ?Sized> {
    source: &'a T,
    row: usize,
}

impl<'a, T: TableSource + ?Sized> RowCursor<'a, T> {
    pub fn new(source: &'a T) -> Self {
        Self { source, row: 0 }
    }

    /// Move back to the first row
    pub fn reset(&mut self) -> bool {
        self.row = 0;
        self.in_bounds()
    }

    /// Move forward by `delta` rows
    pub fn advance(&mut self, delta: usize) -> bool {
        self.row = self.row.saturating_add(delta);
        self.in_bounds()
    }

    /// Number of rows in the source
    pub fn max(&self) -> usize {
        self.source.row_count()
    }

    /// Current row index
    pub fn row(&self) -> usize {
        self.row
    }

    pub fn in_bounds(&self) -> bool {
        self.row < self.source.row_count()
    }

    /// Cell of the current row
    pub fn cell(&self, col: usize) -> Option<&'a str> {
        self.source.cell(self.row, col)
    }

    /// All cells of the current row, empty when out of bounds
    pub fn row_cells(&self) -> Vec<&'a str> {
        if !self.in_bounds() {
            return Vec::new();
        }
        (0..self.source.columns().len())
            .map(|col| self.source.cell(self.row, col).unwrap_or(""))
            .collect()
    }
}

/// Catalog table columns
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CatalogColumn {
    Language,
    Type,
    License,
    Url,
}

impl CatalogColumn {
    pub const ALL: [CatalogColumn; 4] = [
        CatalogColumn::Language,
        CatalogColumn::Type,
        CatalogColumn::License,
        CatalogColumn::Url,
    ];

    pub fn from_index(idx: usize) -> Option<Self> {
        Self::ALL.get(idx).copied()
    }

    fn field(self, entry: &CatalogEntry) -> &str {
        match self {
            CatalogColumn::Language => &entry.language,
            CatalogColumn::Type => &entry.kind,
            CatalogColumn::License => &entry.license,
            CatalogColumn::Url => &entry.url,
        }
    }
}

const CATALOG_COLUMNS: [Column; 4] = [
    Column { id: "lang", title: "Language" },
    Column { id: "type", title: "Type" },
    Column { id: "license", title: "License" },
    Column { id: "url", title: "URL" },
];

/// Catalog adapter for the download dialog table
#[derive(Debug, Clone, Copy)]
pub struct CatalogTable<'a> {
    catalog: &'a Catalog,
}

impl<'a> CatalogTable<'a> {
    pub fn new(catalog: &'a Catalog) -> Self {
        Self { catalog }
    }

    pub fn cursor(&self) -> RowCursor<'_, Self> {
        RowCursor::new(self)
    }
}

impl TableSource for CatalogTable<'_> {
    fn columns(&self) -> &[Column] {
        &CATALOG_COLUMNS
    }

    fn row_count(&self) -> usize {
        self.catalog.len()
    }

    fn cell(&self, row: usize, col: usize) -> Option<&str> {
        let column = CatalogColumn::from_index(col)?;
        self.catalog.get(row).map(|entry| column.field(entry))
    }
}

/// Data source for a single-selection choice widget
pub trait ChoiceSource {
    /// Number of choices
    fn count(&self) -> usize;

    /// Label of a choice, `None` when out of range
    fn label(&self, idx: usize) -> Option<&str>;

    /// Currently selected choice
    fn selected(&self) -> Option<usize>;

    /// Select a choice; out-of-range indexes are ignored and return `false`
    fn set_selected(&mut self, idx: usize) -> bool;

    /// Labels of all choices
    fn labels(&self) -> Vec<&str> {
        (0..self.count()).filter_map(|i| self.label(i)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn catalog() -> Catalog {
        Catalog::new(
            (0..5)
                .map(|i| CatalogEntry {
                    language: format!("l{}", i),
                    kind: if i % 2 == 0 { String::new() } else { format!("t{}", i) },
                    license: "GPL".to_string(),
                    url: format!("https://example.org/d{}.tar.gz", i),
                })
                .collect(),
        )
    }

    #[test]
    fn test_row_count_and_cells() {
        let catalog = catalog();
        let table = CatalogTable::new(&catalog);

        assert_eq!(table.row_count(), 5);
        assert_eq!(table.cell(1, 0), Some("l1"));
        assert_eq!(table.cell(1, 1), Some("t1"));
        assert_eq!(table.cell(2, 1), Some(""));
        assert_eq!(table.cell(1, 2), Some("GPL"));
        assert_eq!(table.cell(1, 3), Some("https://example.org/d1.tar.gz"));
        assert_eq!(table.cell(5, 0), None);
        assert_eq!(table.cell(0, 4), None);
    }

    #[test]
    fn test_column_ids() {
        let catalog = catalog();
        let table = CatalogTable::new(&catalog);
        assert_eq!(table.column_index("lang"), Some(0));
        assert_eq!(table.column_index("url"), Some(3));
        assert_eq!(table.column_index("missing"), None);
    }

    #[test]
    fn test_cursor_matches_direct_indexing() {
        let catalog = catalog();
        let table = CatalogTable::new(&catalog);

        for k in 0..table.row_count() {
            let mut cursor = table.cursor();
            assert!(cursor.reset());
            assert!(cursor.advance(k));
            for col in 0..table.columns().len() {
                assert_eq!(cursor.cell(col), table.cell(k, col));
            }
        }
    }

    #[test]
    fn test_cursor_stepwise_advance() {
        let catalog = catalog();
        let table = CatalogTable::new(&catalog);
        let mut cursor = table.cursor();

        cursor.reset();
        cursor.advance(1);
        cursor.advance(2);
        assert_eq!(cursor.row(), 3);
        assert_eq!(cursor.row_cells(), vec!["l3", "t3", "GPL", "https://example.org/d3.tar.gz"]);
    }

    #[test]
    fn test_cursor_bounds() {
        let catalog = catalog();
        let table = CatalogTable::new(&catalog);
        let mut cursor = table.cursor();

        assert_eq!(cursor.max(), 5);
        assert!(cursor.advance(4));
        assert!(!cursor.advance(1));
        assert!(cursor.row_cells().is_empty());
        assert!(cursor.reset());

        let empty = Catalog::default();
        let empty_table = CatalogTable::new(&empty);
        assert!(!empty_table.cursor().reset());
    }
}
