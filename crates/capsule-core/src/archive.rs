//! Flat zip packing and unpacking for capsule payloads.
//!
//! Archives carry one reserved `metadata.json` entry plus one entry per
//! attachment, all stored by base name. There is no directory structure.

use std::fs::File;
use std::io::{self, BufReader, BufWriter, Read, Seek};
use std::path::{Path, PathBuf};

use walkdir::WalkDir;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use crate::constants::METADATA_ENTRY;
use crate::error::{CapsuleError, Result};
use crate::metadata::CapsuleMetadata;
use crate::paths::is_plain_file_name;

/// Upper bound on the metadata entry; anything larger is not a capsule we wrote.
const MAX_METADATA_BYTES: u64 = 64 * 1024 * 1024;

/// Pack every regular file directly inside `dir` into a new archive at `out`.
///
/// Returns the entry names in archive order.
pub fn pack_dir(dir: &Path, out: &Path) -> Result<Vec<String>> {
    let file = File::create(out).map_err(CapsuleError::io(out))?;
    let mut writer = ZipWriter::new(BufWriter::new(file));
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    let mut names = Vec::new();
    for entry in WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
    {
        let entry = entry.map_err(|e| CapsuleError::Io {
            path: e.path().map(Path::to_path_buf),
            source: e
                .into_io_error()
                .unwrap_or_else(|| io::Error::other("directory walk failed")),
        })?;
        if !entry.file_type().is_file() {
            continue;
        }
        let Some(name) = entry.file_name().to_str().map(str::to_string) else {
            tracing::warn!(path = %entry.path().display(), "skipping non UTF-8 file name");
            continue;
        };

        writer.start_file(name.as_str(), options)?;
        let mut source = File::open(entry.path()).map_err(CapsuleError::io(entry.path()))?;
        io::copy(&mut source, &mut writer).map_err(CapsuleError::io(entry.path()))?;
        names.push(name);
    }

    let mut inner = writer.finish()?;
    io::Write::flush(&mut inner).map_err(CapsuleError::io(out))?;
    Ok(names)
}

/// Read-side view over a decrypted capsule archive.
pub struct CapsuleArchive<R: Read + Seek> {
    inner: ZipArchive<R>,
}

impl CapsuleArchive<BufReader<File>> {
    pub fn open(path: &Path) -> Result<Self> {
        let file = File::open(path).map_err(CapsuleError::io(path))?;
        Self::new(BufReader::new(file))
    }
}

impl<R: Read + Seek> CapsuleArchive<R> {
    pub fn new(reader: R) -> Result<Self> {
        let inner = ZipArchive::new(reader)
            .map_err(|e| CapsuleError::format(format!("payload is not a valid archive: {e}")))?;
        Ok(Self { inner })
    }

    /// Parse the reserved metadata entry.
    pub fn metadata(&mut self) -> Result<CapsuleMetadata> {
        let entry = match self.inner.by_name(METADATA_ENTRY) {
            Ok(entry) => entry,
            Err(zip::result::ZipError::FileNotFound) => {
                return Err(CapsuleError::format(format!(
                    "archive has no {METADATA_ENTRY} entry"
                )));
            }
            Err(e) => return Err(e.into()),
        };
        let mut bytes = Vec::new();
        entry
            .take(MAX_METADATA_BYTES)
            .read_to_end(&mut bytes)
            .map_err(|e| CapsuleError::format(format!("unreadable metadata: {e}")))?;
        CapsuleMetadata::from_json(&bytes)
    }

    /// Attachment entry names (everything but the metadata entry), sorted.
    pub fn attachment_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .inner
            .file_names()
            .filter(|name| *name != METADATA_ENTRY)
            .map(str::to_string)
            .collect();
        names.sort();
        names
    }

    /// Extract all attachments flat into `dest`, which must already exist.
    ///
    /// Every entry name is checked before anything is written; a single
    /// nested, absolute or parent-relative name rejects the whole archive.
    pub fn extract_attachments(&mut self, dest: &Path) -> Result<Vec<PathBuf>> {
        if let Some(bad) = self.inner.file_names().find(|name| !is_plain_file_name(name)) {
            return Err(CapsuleError::format(format!(
                "archive entry {bad:?} is not a plain file name"
            )));
        }

        let mut written = Vec::new();
        for index in 0..self.inner.len() {
            let mut entry = self.inner.by_index(index)?;
            if entry.is_dir() || entry.name() == METADATA_ENTRY {
                continue;
            }
            let target = dest.join(entry.name());
            let mut out = File::create(&target).map_err(CapsuleError::io(&target))?;
            io::copy(&mut entry, &mut out).map_err(CapsuleError::io(&target))?;
            written.push(target);
        }
        written.sort();
        Ok(written)
    }
}
