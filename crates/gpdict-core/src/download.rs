//! Blocking archive download with progress reporting

use crate::error::{CoreError, Result};
use reqwest::blocking::Client;
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;
use std::time::Duration;

/// Default User-Agent header
pub const DEFAULT_USER_AGENT: &str = concat!("gpdict/", env!("CARGO_PKG_VERSION"));

const CHUNK_SIZE: usize = 64 * 1024;

/// Transfer progress
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DownloadProgress {
    /// Bytes written so far
    pub downloaded: u64,
    /// Size announced by the server, if any
    pub total: Option<u64>,
}

impl DownloadProgress {
    /// Completed fraction in `0.0..=1.0`, `None` when the size is unknown
    pub fn fraction(&self) -> Option<f64> {
        match self.total {
            Some(0) | None => None,
            Some(total) => Some((self.downloaded as f64 / total as f64).min(1.0)),
        }
    }
}

/// Fetches a URL into a local file
pub trait Downloader {
    /// Download `url` into `dest`, calling `progress` as data arrives
    ///
    /// On failure no file is left at `dest`.
    fn download(
        &self,
        url: &str,
        dest: &Path,
        progress: &mut dyn FnMut(DownloadProgress),
    ) -> Result<()>;
}

/// HTTP(S) downloader
pub struct HttpDownloader {
    client: Client,
}

impl HttpDownloader {
    /// Create a downloader; `timeout` of `None` lets transfers run unbounded
    pub fn new(user_agent: &str, timeout: Option<Duration>) -> Result<Self> {
        let client = Client::builder()
            .user_agent(user_agent.to_string())
            .connect_timeout(Duration::from_secs(30))
            .timeout(timeout)
            .build()
            .map_err(|e| CoreError::Download(e.to_string()))?;

        Ok(Self { client })
    }

    fn fetch(
        &self,
        url: &str,
        dest: &Path,
        progress: &mut dyn FnMut(DownloadProgress),
    ) -> Result<()> {
        let mut response = self
            .client
            .get(url)
            .send()
            .map_err(|e| CoreError::Download(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(CoreError::Download(format!("{}: HTTP {}", url, status)));
        }

        let total = response.content_length();
        let downloaded = write_stream(&mut response, total, dest, progress)?;

        tracing::info!("Downloaded {} bytes from {}", downloaded, url);
        Ok(())
    }
}

/// Copy `reader` into a new file at `dest`, returning the byte count
///
/// Read and write failures alike are download failures.
fn write_stream(
    reader: &mut dyn Read,
    total: Option<u64>,
    dest: &Path,
    progress: &mut dyn FnMut(DownloadProgress),
) -> Result<u64> {
    let write_err = |e: std::io::Error| CoreError::Download(format!("{}: {}", dest.display(), e));

    let mut state = DownloadProgress {
        downloaded: 0,
        total,
    };
    progress(state);

    let mut file = File::create(dest).map_err(write_err)?;
    let mut buf = vec![0u8; CHUNK_SIZE];
    loop {
        let n = reader
            .read(&mut buf)
            .map_err(|e| CoreError::Download(e.to_string()))?;
        if n == 0 {
            break;
        }
        file.write_all(&buf[..n]).map_err(write_err)?;
        state.downloaded += n as u64;
        progress(state);
    }
    file.flush().map_err(write_err)?;

    Ok(state.downloaded)
}

impl Downloader for HttpDownloader {
    fn download(
        &self,
        url: &str,
        dest: &Path,
        progress: &mut dyn FnMut(DownloadProgress),
    ) -> Result<()> {
        tracing::info!("Downloading '{}' to {:?}", url, dest);

        let result = self.fetch(url, dest, progress);
        if result.is_err() && dest.exists() {
            if let Err(e) = std::fs::remove_file(dest) {
                tracing::warn!("Failed to remove partial download {:?}: {}", dest, e);
            }
        }
        result
    }
}
