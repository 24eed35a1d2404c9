//! Download-and-install flow for catalog entries

use crate::catalog::CatalogEntry;
use crate::download::{DownloadProgress, Downloader, HttpDownloader};
use crate::error::{CoreError, Result};
use crate::extract::{ArchiveExtractor, Extractor};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Install directory relative to the user's home
pub const DEFAULT_INSTALL_SUBDIR: &str = ".stardict/dic";

/// Leading archive components dropped on extraction
pub const DEFAULT_STRIP_COMPONENTS: usize = 1;

/// Local file name for a URL: the text after the last `/`, or the whole URL
pub fn file_name_from_url(url: &str) -> &str {
    match url.rfind('/') {
        Some(pos) => &url[pos + 1..],
        None => url,
    }
}

/// Downloads catalog entries and unpacks them into the install directory
pub struct Installer {
    install_dir: PathBuf,
    strip_components: usize,
    downloader: Box<dyn Downloader>,
    extractor: Box<dyn Extractor>,
}

impl Installer {
    pub fn new(
        install_dir: impl Into<PathBuf>,
        downloader: Box<dyn Downloader>,
        extractor: Box<dyn Extractor>,
    ) -> Self {
        Self {
            install_dir: install_dir.into(),
            strip_components: DEFAULT_STRIP_COMPONENTS,
            downloader,
            extractor,
        }
    }

    /// Installer fetching over HTTP and unpacking with [`ArchiveExtractor`]
    pub fn http(
        install_dir: impl Into<PathBuf>,
        user_agent: &str,
        timeout: Option<Duration>,
    ) -> Result<Self> {
        let downloader = HttpDownloader::new(user_agent, timeout)?;
        Ok(Self::new(
            install_dir,
            Box::new(downloader),
            Box::new(ArchiveExtractor::new()),
        ))
    }

    pub fn with_strip_components(mut self, strip: usize) -> Self {
        self.strip_components = strip;
        self
    }

    pub fn install_dir(&self) -> &Path {
        &self.install_dir
    }

    /// Where the archive for `entry` is stored while installing
    pub fn archive_path(&self, entry: &CatalogEntry) -> PathBuf {
        self.install_dir.join(entry.file_name())
    }

    /// Download, extract and clean up one entry
    ///
    /// The archive is removed after the extraction attempt whatever its
    /// outcome. A failed download leaves nothing behind to remove.
    pub fn install(
        &self,
        entry: &CatalogEntry,
        progress: &mut dyn FnMut(DownloadProgress),
    ) -> Result<()> {
        tracing::info!("Installing '{}'", entry.url);

        if entry.file_name().is_empty() {
            return Err(CoreError::Download(format!(
                "'{}' does not name a file",
                entry.url
            )));
        }

        std::fs::create_dir_all(&self.install_dir).map_err(|source| {
            CoreError::DirectoryCreate {
                path: self.install_dir.clone(),
                source,
            }
        })?;

        let archive = self.archive_path(entry);
        self.downloader.download(&entry.url, &archive, progress)?;

        let extracted = self
            .extractor
            .extract(&archive, &self.install_dir, self.strip_components);

        match std::fs::remove_file(&archive) {
            Ok(()) => tracing::debug!("Removed {:?}", archive),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => tracing::warn!("Failed to remove {:?}: {}", archive, e),
        }

        extracted?;
        tracing::info!("Installed '{}' into {:?}", entry.url, self.install_dir);
        Ok(())
    }
}


#[cfg(test)]
mod tests {
    use super::testing::installer;
    use super::*;
    use tempfile::TempDir;

    fn entry(url: &str) -> CatalogEntry {
        CatalogEntry {
            language: "en".to_string(),
            kind: String::new(),
            license: "GPL".to_string(),
            url: url.to_string(),
        }
    }

    #[test]
    fn test_file_name_from_url() {
        assert_eq!(
            file_name_from_url("https://example.org/path/to/dict-en.tar.xz"),
            "dict-en.tar.xz"
        );
        assert_eq!(file_name_from_url("dict-en.tar.xz"), "dict-en.tar.xz");
        assert_eq!(file_name_from_url("http://x/y/a.tar"), "a.tar");
        assert_eq!(file_name_from_url("http://x/y/"), "");
    }

    #[test]
    fn test_install_success_removes_archive() {
        let tmp = TempDir::new().unwrap();
        let dest = tmp.path().join(".stardict/dic");
        let (installer, calls) = installer(&dest, false, false);

        let mut updates = 0;
        installer
            .install(&entry("http://x/y/a.tar"), &mut |_| updates += 1)
            .unwrap();

        assert!(dest.is_dir());
        assert!(!dest.join("a.tar").exists());
        assert_eq!(updates, 1);

        let calls = calls.borrow();
        assert_eq!(
            calls.downloads,
            vec![("http://x/y/a.tar".to_string(), dest.join("a.tar"))]
        );
        assert_eq!(calls.extractions, vec![(dest.join("a.tar"), dest.clone(), 1)]);
        assert!(calls.archive_existed_during_extract);
    }

    #[test]
    fn test_install_directory_failure_skips_download() {
        let tmp = TempDir::new().unwrap();
        let blocker = tmp.path().join("file");
        std::fs::write(&blocker, b"not a directory").unwrap();
        let dest = blocker.join("dic");
        let (installer, calls) = installer(&dest, false, false);

        let err = installer
            .install(&entry("http://x/y/a.tar"), &mut |_| {})
            .unwrap_err();

        match err {
            CoreError::DirectoryCreate { path, .. } => assert_eq!(path, dest),
            other => panic!("unexpected error: {other}"),
        }
        assert!(calls.borrow().downloads.is_empty());
    }

    #[test]
    fn test_install_download_failure_skips_extract() {
        let tmp = TempDir::new().unwrap();
        let (installer, calls) = installer(tmp.path(), true, false);

        let err = installer
            .install(&entry("http://x/y/a.tar"), &mut |_| {})
            .unwrap_err();

        assert!(matches!(err, CoreError::Download(_)));
        assert!(calls.borrow().extractions.is_empty());
    }

    #[test]
    fn test_install_extract_failure_still_removes_archive() {
        let tmp = TempDir::new().unwrap();
        let (installer, _calls) = installer(tmp.path(), false, true);

        let err = installer
            .install(&entry("http://x/y/a.tar"), &mut |_| {})
            .unwrap_err();

        assert!(matches!(err, CoreError::Extract(_)));
        assert!(!tmp.path().join("a.tar").exists());
    }

    #[test]
    fn test_strip_components_is_forwarded() {
        let tmp = TempDir::new().unwrap();
        let (installer, calls) = installer(tmp.path(), false, false);
        let installer = installer.with_strip_components(0);

        installer
            .install(&entry("http://x/y/a.tar"), &mut |_| {})
            .unwrap();
        assert_eq!(calls.borrow().extractions[0].2, 0);
    }

    #[test]
    fn test_install_rejects_url_without_file_name() {
        let tmp = TempDir::new().unwrap();
        let dir = tmp.path().join("dic");
        let (installer, calls) = installer(&dir, false, false);

        let err = installer
            .install(&entry("http://example.org/dicts/"), &mut |_| {})
            .unwrap_err();

        assert!(matches!(err, CoreError::Download(_)));
        assert!(calls.borrow().downloads.is_empty());
        assert!(!dir.exists());
    }

    #[test]
    fn test_http_installer() {
        let tmp = TempDir::new().unwrap();
        let installer = Installer::http(tmp.path(), "gpdict-test", None)
            .unwrap()
            .with_strip_components(2);
        assert_eq!(installer.install_dir(), tmp.path());
        assert_eq!(installer.strip_components, 2);
    }
}
