//! Tarball scanning for spec generation.
//!
//! Walks the members of a tar archive (plain, gzip or xz compressed) and
//! classifies each one so the spec generator can emit `%files` entries with
//! the exact mode/uid/gid the archive recorded. Device nodes and fifos are
//! skipped — rpm never packages them from an image store.

use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use flate2::read::GzDecoder;
use tar::Archive;
use xz2::read::XzDecoder;

use crate::error::{Error, Result};

/// Classification of an archive member.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    /// Regular file or hard link.
    File,
    /// Symlink. Permission bits are not meaningful for these.
    Symlink,
    /// Directory, packaged as an owned directory (`%dir`).
    Directory,
}

/// One archive member with the metadata the spec generator needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveEntry {
    pub path: String,
    pub kind: EntryKind,
    /// Permission bits as recorded in the archive. `None` for symlinks.
    /// Zero modes are preserved as-is; the spec's `%install` fixup is the
    /// only place that touches them.
    pub mode: Option<u32>,
    pub uid: u64,
    pub gid: u64,
}

/// Open tar archive, positioned for a single sequential scan.
///
/// The member stream is read lazily and cannot be rewound; re-open the
/// archive for a fresh scan.
pub struct ArchiveScanner {
    path: PathBuf,
    archive: Archive<Box<dyn Read>>,
}

impl ArchiveScanner {
    /// Open an archive, choosing a decoder from the file extension
    /// (`.xz`/`.txz`, `.gz`/`.tgz`, otherwise plain tar).
    pub fn open(path: &Path) -> Result<Self> {
        let file = File::open(path).map_err(|e| Error::Archive {
            path: path.to_path_buf(),
            source: e,
        })?;

        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
        let reader: Box<dyn Read> = match ext {
            "xz" | "txz" => Box::new(XzDecoder::new(file)),
            "gz" | "tgz" => Box::new(GzDecoder::new(file)),
            _ => Box::new(file),
        };

        Ok(Self {
            path: path.to_path_buf(),
            archive: Archive::new(reader),
        })
    }

    /// Iterate over the archive's members in physical order.
    ///
    /// Members that rpm cannot package (devices, fifos) are silently
    /// dropped from the stream.
    pub fn entries(&mut self) -> Result<impl Iterator<Item = Result<ArchiveEntry>> + '_> {
        let path = self.path.clone();
        let raw = self.archive.entries().map_err(|e| Error::Archive {
            path: path.clone(),
            source: e,
        })?;

        Ok(raw.filter_map(move |entry| convert(entry, &path).transpose()))
    }
}

/// Scan an archive into a vector, in member order.
pub fn scan(path: &Path) -> Result<Vec<ArchiveEntry>> {
    let mut scanner = ArchiveScanner::open(path)?;
    let result = scanner.entries()?.collect();
    result
}

fn convert<R: Read>(
    entry: std::io::Result<tar::Entry<'_, R>>,
    archive_path: &Path,
) -> Result<Option<ArchiveEntry>> {
    let ctx = |e: std::io::Error| Error::Archive {
        path: archive_path.to_path_buf(),
        source: e,
    };

    let entry = entry.map_err(ctx)?;
    let header = entry.header();
    let entry_type = header.entry_type();

    let kind = if entry_type.is_file() || entry_type.is_hard_link() {
        EntryKind::File
    } else if entry_type.is_symlink() {
        EntryKind::Symlink
    } else if entry_type.is_dir() {
        EntryKind::Directory
    } else {
        return Ok(None);
    };

    let path = entry.path().map_err(ctx)?.to_string_lossy().into_owned();
    let mode = match kind {
        EntryKind::Symlink => None,
        _ => Some(header.mode().map_err(ctx)?),
    };

    Ok(Some(ArchiveEntry {
        path,
        kind,
        mode,
        uid: header.uid().map_err(ctx)?,
        gid: header.gid().map_err(ctx)?,
    }))
}
