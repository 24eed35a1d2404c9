//! Dictionary archive extraction
//!
//! Archives usually wrap the dictionary files in a single top-level
//! directory. That directory is stripped so the `.ifo`/`.idx`/`.dict` files
//! land directly in the destination directory.

use crate::error::{CoreError, Result};
use flate2::read::GzDecoder;
use std::fs::File;
use std::io::Read;
use std::path::{Component, Path, PathBuf};
use std::process::Command;
use tar::{Archive, EntryType};

/// Unpacks an archive into a directory
pub trait Extractor {
    /// Extract `archive` into `dest`, dropping `strip_components` leading
    /// path components of every member
    fn extract(&self, archive: &Path, dest: &Path, strip_components: usize) -> Result<()>;
}

/// Archive container recognised from the file name
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveKind {
    Tar,
    TarGz,
    Zip,
    /// Anything else is handed to the system `tar`
    Other,
}

impl ArchiveKind {
    pub fn from_path(path: &Path) -> Self {
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("")
            .to_ascii_lowercase();

        if name.ends_with(".tar.gz") || name.ends_with(".tgz") {
            ArchiveKind::TarGz
        } else if name.ends_with(".tar") {
            ArchiveKind::Tar
        } else if name.ends_with(".zip") {
            ArchiveKind::Zip
        } else {
            ArchiveKind::Other
        }
    }
}

/// Extractor for tar, gzip'd tar and zip archives
///
/// Other formats (`.tar.bz2`, `.tar.xz`, ...) go through the `tar` binary,
/// whose exit status is checked.
#[derive(Debug, Clone)]
pub struct ArchiveExtractor {
    tar_program: PathBuf,
}

impl Default for ArchiveExtractor {
    fn default() -> Self {
        Self {
            tar_program: PathBuf::from("tar"),
        }
    }
}

impl ArchiveExtractor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a different `tar` executable for the formats not handled in-process
    pub fn with_tar_program(mut self, program: impl Into<PathBuf>) -> Self {
        self.tar_program = program.into();
        self
    }

    fn extract_tar<R: Read>(reader: R, dest: &Path, strip: usize) -> Result<()> {
        let mut archive = Archive::new(reader);

        for entry in archive.entries().map_err(extract_err)? {
            let mut entry = entry.map_err(extract_err)?;
            let path = entry.path().map_err(extract_err)?.into_owned();
            // Links could point later members outside `dest`
            if matches!(entry.header().entry_type(), EntryType::Symlink | EntryType::Link) {
                tracing::warn!("Skipping link archive member {:?}", path);
                continue;
            }
            let Some(rel) = strip_path(&path, strip) else {
                continue;
            };

            let target = dest.join(rel);
            if let Some(parent) = target.parent() {
                std::fs::create_dir_all(parent)?;
            }
            entry.unpack(&target).map_err(extract_err)?;
        }

        Ok(())
    }

    fn extract_zip(archive: &Path, dest: &Path, strip: usize) -> Result<()> {
        let file = File::open(archive)?;
        let mut zip = zip::ZipArchive::new(file).map_err(extract_err)?;

        for i in 0..zip.len() {
            let mut member = zip.by_index(i).map_err(extract_err)?;
            let Some(path) = member.enclosed_name() else {
                tracing::warn!("Skipping unsafe zip member {:?}", member.name());
                continue;
            };
            let Some(rel) = strip_path(&path, strip) else {
                continue;
            };

            let target = dest.join(rel);
            if member.is_dir() {
                std::fs::create_dir_all(&target)?;
                continue;
            }
            if let Some(parent) = target.parent() {
                std::fs::create_dir_all(parent)?;
            }
            let mut out = File::create(&target)?;
            std::io::copy(&mut member, &mut out)?;
        }

        Ok(())
    }

    fn extract_with_tar(&self, archive: &Path, dest: &Path, strip: usize) -> Result<()> {
        tracing::debug!(
            "Running {:?} xf {:?} --strip-components={} -C {:?}",
            self.tar_program,
            archive,
            strip,
            dest
        );

        let status = Command::new(&self.tar_program)
            .arg("xf")
            .arg(archive)
            .arg(format!("--strip-components={}", strip))
            .arg("-C")
            .arg(dest)
            .status()
            .map_err(|e| CoreError::Extract(format!("failed to run {:?}: {}", self.tar_program, e)))?;

        if !status.success() {
            return Err(CoreError::Extract(format!(
                "{:?} exited with {}",
                self.tar_program, status
            )));
        }
        Ok(())
    }
}

impl Extractor for ArchiveExtractor {
    fn extract(&self, archive: &Path, dest: &Path, strip_components: usize) -> Result<()> {
        let kind = ArchiveKind::from_path(archive);
        tracing::info!("Extracting {:?} ({:?}) into {:?}", archive, kind, dest);

        match kind {
            ArchiveKind::Tar => Self::extract_tar(File::open(archive)?, dest, strip_components),
            ArchiveKind::TarGz => Self::extract_tar(
                GzDecoder::new(File::open(archive)?),
                dest,
                strip_components,
            ),
            ArchiveKind::Zip => Self::extract_zip(archive, dest, strip_components),
            ArchiveKind::Other => self.extract_with_tar(archive, dest, strip_components),
        }
    }
}

fn extract_err(e: impl std::fmt::Display) -> CoreError {
    CoreError::Extract(e.to_string())
}

/// Drop `strip` leading components from an archive member path
///
/// Returns `None` for members that vanish entirely (the stripped directories
/// themselves) and for paths that are absolute or climb out with `..`.
pub fn strip_path(path: &Path, strip: usize) -> Option<PathBuf> {
    let mut parts = Vec::new();
    for component in path.components() {
        match component {
            Component::Normal(part) => parts.push(part),
            Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => {
                tracing::warn!("Skipping archive member with unsafe path {:?}", path);
                return None;
            }
        }
    }

    if parts.len() <= strip {
        return None;
    }
    Some(parts[strip..].iter().collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use tempfile::TempDir;

    fn build_tar(path: &Path, members: &[(&str, &[u8])]) {
        let file = File::create(path).unwrap();
        let mut builder = tar::Builder::new(file);
        for (name, data) in members {
            let mut header = tar::Header::new_gnu();
            header.set_size(data.len() as u64);
            header.set_mode(0o644);
            header.set_cksum();
            builder.append_data(&mut header, name, *data).unwrap();
        }
        builder.finish().unwrap();
    }

    fn build_tar_gz(path: &Path, members: &[(&str, &[u8])]) {
        let file = File::create(path).unwrap();
        let encoder = GzEncoder::new(file, Compression::default());
        let mut builder = tar::Builder::new(encoder);
        for (name, data) in members {
            let mut header = tar::Header::new_gnu();
            header.set_size(data.len() as u64);
            header.set_mode(0o644);
            header.set_cksum();
            builder.append_data(&mut header, name, *data).unwrap();
        }
        builder.into_inner().unwrap().finish().unwrap();
    }

    #[test]
    fn test_archive_kind() {
        assert_eq!(ArchiveKind::from_path(Path::new("a.tar")), ArchiveKind::Tar);
        assert_eq!(ArchiveKind::from_path(Path::new("a.TAR.GZ")), ArchiveKind::TarGz);
        assert_eq!(ArchiveKind::from_path(Path::new("a.tgz")), ArchiveKind::TarGz);
        assert_eq!(ArchiveKind::from_path(Path::new("a.zip")), ArchiveKind::Zip);
        assert_eq!(ArchiveKind::from_path(Path::new("a.tar.bz2")), ArchiveKind::Other);
        assert_eq!(ArchiveKind::from_path(Path::new("a.tar.xz")), ArchiveKind::Other);
    }

    #[test]
    fn test_strip_path() {
        assert_eq!(
            strip_path(Path::new("top/dict.ifo"), 1),
            Some(PathBuf::from("dict.ifo"))
        );
        assert_eq!(
            strip_path(Path::new("./top/sub/dict.idx"), 1),
            Some(PathBuf::from("sub/dict.idx"))
        );
        assert_eq!(strip_path(Path::new("top/"), 1), None);
        assert_eq!(strip_path(Path::new("top/../../etc/passwd"), 1), None);
        assert_eq!(strip_path(Path::new("/etc/passwd"), 0), None);
        assert_eq!(
            strip_path(Path::new("dict.ifo"), 0),
            Some(PathBuf::from("dict.ifo"))
        );
    }

    #[test]
    fn test_extract_tar_strips_top_directory() {
        let dir = TempDir::new().unwrap();
        let archive = dir.path().join("wordnet.tar");
        build_tar(
            &archive,
            &[
                ("stardict-wordnet/wordnet.ifo", b"StarDict's dict ifo file\n"),
                ("stardict-wordnet/wordnet.idx", b"idx"),
            ],
        );
        let dest = dir.path().join("dic");
        std::fs::create_dir_all(&dest).unwrap();

        ArchiveExtractor::new().extract(&archive, &dest, 1).unwrap();

        assert!(dest.join("wordnet.ifo").is_file());
        assert_eq!(std::fs::read(dest.join("wordnet.idx")).unwrap(), b"idx");
        assert!(!dest.join("stardict-wordnet").exists());
    }

    #[test]
    fn test_extract_tar_skips_symlinks() {
        let dir = TempDir::new().unwrap();
        let outside = dir.path().join("outside");
        std::fs::create_dir_all(&outside).unwrap();

        let archive = dir.path().join("links.tar");
        let mut builder = tar::Builder::new(File::create(&archive).unwrap());
        let mut header = tar::Header::new_gnu();
        header.set_entry_type(EntryType::Symlink);
        header.set_size(0);
        header.set_mode(0o777);
        builder.append_link(&mut header, "top/link", &outside).unwrap();
        let data: &[u8] = b"payload";
        let mut header = tar::Header::new_gnu();
        header.set_size(data.len() as u64);
        header.set_mode(0o644);
        header.set_cksum();
        builder.append_data(&mut header, "top/link/evil.txt", data).unwrap();
        builder.finish().unwrap();
        drop(builder);

        let dest = dir.path().join("dic");
        std::fs::create_dir_all(&dest).unwrap();
        ArchiveExtractor::new().extract(&archive, &dest, 1).unwrap();

        assert!(!outside.join("evil.txt").exists());
        assert!(!dest.join("link").is_symlink());
        assert_eq!(std::fs::read(dest.join("link/evil.txt")).unwrap(), b"payload");
    }

    #[test]
    fn test_extract_tar_gz() {
        let dir = TempDir::new().unwrap();
        let archive = dir.path().join("dict.tar.gz");
        build_tar_gz(&archive, &[("top/inner/dict.dict", b"body")]);
        let dest = dir.path().join("dic");
        std::fs::create_dir_all(&dest).unwrap();

        ArchiveExtractor::new().extract(&archive, &dest, 1).unwrap();

        assert_eq!(std::fs::read(dest.join("inner/dict.dict")).unwrap(), b"body");
    }

    #[test]
    fn test_extract_zip() {
        use std::io::Write;

        let dir = TempDir::new().unwrap();
        let archive = dir.path().join("dict.zip");
        let mut writer = zip::ZipWriter::new(File::create(&archive).unwrap());
        writer
            .start_file("top/dict.ifo", zip::write::SimpleFileOptions::default())
            .unwrap();
        writer.write_all(b"ifo").unwrap();
        writer.finish().unwrap();

        let dest = dir.path().join("dic");
        std::fs::create_dir_all(&dest).unwrap();
        ArchiveExtractor::new().extract(&archive, &dest, 1).unwrap();

        assert_eq!(std::fs::read(dest.join("dict.ifo")).unwrap(), b"ifo");
    }

    #[test]
    fn test_extract_corrupt_archive_fails() {
        let dir = TempDir::new().unwrap();
        let archive = dir.path().join("broken.tar.gz");
        std::fs::write(&archive, b"definitely not gzip").unwrap();

        let err = ArchiveExtractor::new()
            .extract(&archive, dir.path(), 1)
            .unwrap_err();
        assert!(matches!(err, CoreError::Extract(_)));
    }

    #[test]
    fn test_missing_tar_program_is_reported() {
        let dir = TempDir::new().unwrap();
        let archive = dir.path().join("dict.tar.xz");
        std::fs::write(&archive, b"xz").unwrap();

        let err = ArchiveExtractor::new()
            .with_tar_program("/nonexistent/gpdict-tar")
            .extract(&archive, dir.path(), 1)
            .unwrap_err();
        assert!(matches!(err, CoreError::Extract(_)));
    }
}
