//! Download dialog controller
//!
//! ```text
//!   Closed ──open()──▶ Open ──close() / successful install──▶ Closed
//!      ▲                 │
//!      └─ catalog fails ─┘ (warning shown, never opened)
//! ```
//!
//! The catalog lives exactly as long as the dialog is open.

use crate::catalog::{load_catalog, Catalog, CatalogEntry};
use crate::download::DownloadProgress;
use crate::error::{CoreError, Result};
use crate::install::Installer;
use crate::table::CatalogTable;
use std::path::PathBuf;

/// Services the dialog needs from the application embedding it
pub trait DialogHost {
    fn show_warning(&self, title: &str, message: &str);

    fn show_error(&self, title: &str, message: &str);

    /// Rescan installed dictionaries after an install
    fn reload_dictionaries(&self);
}

/// How the dialog was last closed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DialogResult {
    /// Closed by the user
    Dismissed,
    /// Closed after a dictionary was installed
    Installed,
}

#[derive(Debug)]
enum DialogState {
    Closed,
    Open {
        catalog: Catalog,
        selected: Option<usize>,
    },
}

/// Download dialog state machine
pub struct DownloadDialog {
    sources: Vec<PathBuf>,
    installer: Installer,
    state: DialogState,
    result: Option<DialogResult>,
}

impl DownloadDialog {
    /// `sources` are the catalog files in lookup order
    pub fn new(sources: Vec<PathBuf>, installer: Installer) -> Self {
        Self {
            sources,
            installer,
            state: DialogState::Closed,
            result: None,
        }
    }

    pub fn installer(&self) -> &Installer {
        &self.installer
    }

    /// Load the catalog and open
    ///
    /// On failure the host shows a warning and the dialog stays closed.
    /// Opening an already open dialog does nothing.
    pub fn open(&mut self, host: &dyn DialogHost) -> bool {
        if self.is_open() {
            return true;
        }

        match load_catalog(&self.sources) {
            Ok(catalog) => {
                tracing::info!("Download dialog opened with {} entries", catalog.len());
                self.state = DialogState::Open {
                    catalog,
                    selected: None,
                };
                self.result = None;
                true
            }
            Err(e) => {
                tracing::warn!("Cannot open download dialog: {}", e);
                host.show_warning("Warning", e.user_message());
                false
            }
        }
    }

    pub fn is_open(&self) -> bool {
        matches!(self.state, DialogState::Open { .. })
    }

    pub fn catalog(&self) -> Option<&Catalog> {
        match &self.state {
            DialogState::Open { catalog, .. } => Some(catalog),
            DialogState::Closed => None,
        }
    }

    /// Table adapter over the open catalog
    pub fn table(&self) -> Option<CatalogTable<'_>> {
        self.catalog().map(CatalogTable::new)
    }

    /// Select a row; out-of-range rows are refused
    pub fn select(&mut self, row: usize) -> bool {
        match &mut self.state {
            DialogState::Open { catalog, selected } if row < catalog.len() => {
                *selected = Some(row);
                true
            }
            _ => false,
        }
    }

    pub fn selected(&self) -> Option<usize> {
        match &self.state {
            DialogState::Open { selected, .. } => *selected,
            DialogState::Closed => None,
        }
    }

    pub fn selected_entry(&self) -> Option<&CatalogEntry> {
        match &self.state {
            DialogState::Open { catalog, selected } => selected.and_then(|i| catalog.get(i)),
            DialogState::Closed => None,
        }
    }

    /// Install the selected entry
    ///
    /// On success the host reloads its dictionaries and the dialog closes
    /// with [`DialogResult::Installed`]. On failure the dialog stays open.
    /// Directory and extraction failures are reported through the host;
    /// download failures are left to whoever shows the download progress.
    pub fn trigger_download(
        &mut self,
        host: &dyn DialogHost,
        progress: &mut dyn FnMut(DownloadProgress),
    ) -> Result<()> {
        if !self.is_open() {
            return Err(CoreError::DialogClosed);
        }
        let entry = self.selected_entry().cloned().ok_or(CoreError::NoSelection)?;

        match self.installer.install(&entry, progress) {
            Ok(()) => {
                host.reload_dictionaries();
                self.close(DialogResult::Installed);
                Ok(())
            }
            Err(e) => {
                match &e {
                    CoreError::DirectoryCreate { path, source } => host.show_error(
                        "Failed to create directory",
                        &format!("'{}': {}", path.display(), source),
                    ),
                    CoreError::Extract(reason) => {
                        host.show_error("Failed to extract dictionary", reason)
                    }
                    other => tracing::warn!("Install of '{}' failed: {}", entry.url, other),
                }
                Err(e)
            }
        }
    }

    /// Close the dialog, dropping the catalog
    pub fn close(&mut self, result: DialogResult) {
        if self.is_open() {
            tracing::info!("Download dialog closed ({:?})", result);
        }
        self.state = DialogState::Closed;
        self.result = Some(result);
    }

    /// Result of the last close
    pub fn result(&self) -> Option<DialogResult> {
        self.result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::install::testing::{installer, Calls};
    use std::cell::RefCell;
    use std::path::Path;
    use std::rc::Rc;
    use tempfile::TempDir;

    #[derive(Default)]
    struct RecordingHost {
        warnings: RefCell<Vec<(String, String)>>,
        errors: RefCell<Vec<(String, String)>>,
        reloads: RefCell<usize>,
    }

    impl DialogHost for RecordingHost {
        fn show_warning(&self, title: &str, message: &str) {
            self.warnings
                .borrow_mut()
                .push((title.to_string(), message.to_string()));
        }

        fn show_error(&self, title: &str, message: &str) {
            self.errors
                .borrow_mut()
                .push((title.to_string(), message.to_string()));
        }

        fn reload_dictionaries(&self) {
            *self.reloads.borrow_mut() += 1;
        }
    }

    const ONE_ENTRY: &str =
        r#"[{"URL": "http://x/y/a.tar", "lang": "en", "license": "GPL", "type": ""}]"#;

    fn dialog(
        tmp: &TempDir,
        catalog: Option<&str>,
        install_dir: &Path,
        extract_fails: bool,
    ) -> (DownloadDialog, Rc<RefCell<Calls>>) {
        let catalog_path = tmp.path().join("dict_urls.json");
        if let Some(text) = catalog {
            std::fs::write(&catalog_path, text).unwrap();
        }
        let (installer, calls) = installer(install_dir, false, extract_fails);
        (DownloadDialog::new(vec![catalog_path], installer), calls)
    }

    #[test]
    fn test_open_without_catalog_warns_and_stays_closed() {
        let tmp = TempDir::new().unwrap();
        let (mut dlg, _) = dialog(&tmp, None, tmp.path(), false);
        let host = RecordingHost::default();

        assert!(!dlg.open(&host));
        assert!(!dlg.is_open());
        assert!(dlg.table().is_none());
        assert_eq!(
            *host.warnings.borrow(),
            vec![("Warning".to_string(), "No dictionary URLs defined".to_string())]
        );
    }

    #[test]
    fn test_open_with_non_array_catalog_warns() {
        let tmp = TempDir::new().unwrap();
        let (mut dlg, _) = dialog(&tmp, Some(r#"{"URL": "x"}"#), tmp.path(), false);
        let host = RecordingHost::default();

        assert!(!dlg.open(&host));
        assert_eq!(host.warnings.borrow().len(), 1);
    }

    #[test]
    fn test_end_to_end_install() {
        let tmp = TempDir::new().unwrap();
        let install_dir = tmp.path().join("home/.stardict/dic");
        let (mut dlg, calls) = dialog(&tmp, Some(ONE_ENTRY), &install_dir, false);
        let host = RecordingHost::default();

        assert!(dlg.open(&host));
        let table = dlg.table().unwrap();
        assert_eq!(crate::table::TableSource::row_count(&table), 1);

        assert!(dlg.select(0));
        dlg.trigger_download(&host, &mut |_| {}).unwrap();

        assert!(install_dir.is_dir());
        assert!(!install_dir.join("a.tar").exists());
        assert_eq!(*host.reloads.borrow(), 1);
        assert!(host.errors.borrow().is_empty());
        assert_eq!(calls.borrow().downloads.len(), 1);
        assert!(!dlg.is_open());
        assert!(dlg.catalog().is_none());
        assert_eq!(dlg.result(), Some(DialogResult::Installed));
    }

    #[test]
    fn test_directory_failure_reports_path() {
        let tmp = TempDir::new().unwrap();
        let blocker = tmp.path().join("home");
        std::fs::write(&blocker, b"file").unwrap();
        let install_dir = blocker.join(".stardict/dic");
        let (mut dlg, calls) = dialog(&tmp, Some(ONE_ENTRY), &install_dir, false);
        let host = RecordingHost::default();

        assert!(dlg.open(&host));
        dlg.select(0);
        let err = dlg.trigger_download(&host, &mut |_| {}).unwrap_err();

        assert!(matches!(err, CoreError::DirectoryCreate { .. }));
        let errors = host.errors.borrow();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].0, "Failed to create directory");
        assert!(errors[0].1.contains(&install_dir.display().to_string()));
        assert!(calls.borrow().downloads.is_empty());
        assert_eq!(*host.reloads.borrow(), 0);
        assert!(dlg.is_open());
    }

    #[test]
    fn test_extract_failure_is_reported() {
        let tmp = TempDir::new().unwrap();
        let install_dir = tmp.path().join("dic");
        let (mut dlg, _) = dialog(&tmp, Some(ONE_ENTRY), &install_dir, true);
        let host = RecordingHost::default();

        dlg.open(&host);
        dlg.select(0);
        let err = dlg.trigger_download(&host, &mut |_| {}).unwrap_err();

        assert!(matches!(err, CoreError::Extract(_)));
        assert_eq!(host.errors.borrow()[0].0, "Failed to extract dictionary");
        assert!(!install_dir.join("a.tar").exists());
        assert_eq!(*host.reloads.borrow(), 0);
    }

    #[test]
    fn test_download_requires_selection() {
        let tmp = TempDir::new().unwrap();
        let (mut dlg, calls) = dialog(&tmp, Some(ONE_ENTRY), tmp.path(), false);
        let host = RecordingHost::default();

        assert!(matches!(
            dlg.trigger_download(&host, &mut |_| {}),
            Err(CoreError::DialogClosed)
        ));

        dlg.open(&host);
        assert!(!dlg.select(1));
        assert!(matches!(
            dlg.trigger_download(&host, &mut |_| {}),
            Err(CoreError::NoSelection)
        ));
        assert!(calls.borrow().downloads.is_empty());
    }

    #[test]
    fn test_explicit_close_drops_catalog() {
        let tmp = TempDir::new().unwrap();
        let (mut dlg, _) = dialog(&tmp, Some(ONE_ENTRY), tmp.path(), false);
        let host = RecordingHost::default();

        dlg.open(&host);
        dlg.select(0);
        dlg.close(DialogResult::Dismissed);

        assert!(!dlg.is_open());
        assert_eq!(dlg.selected(), None);
        assert_eq!(dlg.result(), Some(DialogResult::Dismissed));
        assert_eq!(*host.reloads.borrow(), 0);
    }
}
