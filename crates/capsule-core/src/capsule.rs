use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use serde::Serialize;
use tempfile::TempDir;

use crate::archive::{CapsuleArchive, pack_dir};
use crate::constants::METADATA_ENTRY;
use crate::crypto::{seal, unseal};
use crate::date::{self, days_remaining, parse_date};
use crate::error::{CapsuleError, Result};
use crate::header::{CapsuleHeader, KdfAlgorithm};
use crate::io::write_atomic;
use crate::key::Secret;
use crate::metadata::CapsuleMetadata;
use crate::paths::{
    archive_file_name, capsule_file_name, clean_input_path, extracted_dir, list_capsules,
    sanitize_title,
};

/// Inputs to [`TimeCapsule::create`], as typed by a user.
#[derive(Debug, Clone, Default)]
pub struct CreateRequest {
    pub title: String,
    pub content: String,
    /// `DD-MM-YYYY`.
    pub unlock_date: String,
    /// Attachment paths; whitespace and wrapping quotes are stripped.
    pub files: Vec<String>,
}

/// What a successful create produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CreateReport {
    pub path: PathBuf,
    pub title: String,
    #[serde(serialize_with = "serialize_date")]
    pub unlock_date: NaiveDate,
    /// Attachment base names stored in the capsule, sorted.
    pub attachments: Vec<String>,
    /// Requested paths that were not regular files and were left out.
    pub skipped: Vec<PathBuf>,
}

/// Result of [`TimeCapsule::open`]. Not-found and still-locked are ordinary
/// outcomes, not errors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum OpenOutcome {
    NotFound {
        path: PathBuf,
    },
    Locked {
        title: String,
        #[serde(serialize_with = "serialize_date")]
        unlock_date: NaiveDate,
        days_remaining: i64,
    },
    Opened {
        title: String,
        content: String,
        #[serde(serialize_with = "serialize_date")]
        creation_date: NaiveDate,
        #[serde(serialize_with = "serialize_date")]
        unlock_date: NaiveDate,
        extracted_path: PathBuf,
        files: Vec<String>,
    },
}

/// Capsule facts that can be shown without revealing the message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CapsuleSummary {
    pub path: PathBuf,
    pub title: String,
    #[serde(serialize_with = "serialize_date")]
    pub creation_date: NaiveDate,
    #[serde(serialize_with = "serialize_date")]
    pub unlock_date: NaiveDate,
    /// Zero once the capsule can be opened.
    pub days_remaining: i64,
    pub attachment_count: usize,
    pub sealed_with: &'static str,
}

fn serialize_date<S: serde::Serializer>(
    date: &NaiveDate,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    crate::date::dmy::serialize(date, serializer)
}

/// Creates and opens date-gated capsules under one storage root.
///
/// The secret is supplied by the caller; nothing is cached across instances.
#[derive(Debug)]
pub struct TimeCapsule {
    root: PathBuf,
    secret: Secret,
    strict_attachments: bool,
}

impl TimeCapsule {
    /// Use `root` as the storage directory, creating it if needed.
    pub fn new(root: impl AsRef<Path>, secret: impl Into<Secret>) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(&root).map_err(CapsuleError::io(&root))?;
        Ok(Self {
            root,
            secret: secret.into(),
            strict_attachments: false,
        })
    }

    /// Fail `create` on a missing attachment instead of skipping it.
    #[must_use]
    pub fn strict_attachments(mut self, strict: bool) -> Self {
        self.strict_attachments = strict;
        self
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Build a capsule, gating it on the local calendar date.
    pub fn create(&self, request: &CreateRequest) -> Result<CreateReport> {
        self.create_at(request, date::today())
    }

    /// Build a capsule as if the current date were `today`.
    pub fn create_at(&self, request: &CreateRequest, today: NaiveDate) -> Result<CreateReport> {
        let title = sanitize_title(&request.title)?;
        let unlock_date = parse_date(&request.unlock_date)?;
        if unlock_date <= today {
            return Err(CapsuleError::PastOrPresentDate { unlock_date, today });
        }

        let (attachments, skipped) = self.resolve_attachments(&request.files)?;

        let capsule_path = self.root.join(capsule_file_name(&title, unlock_date));
        if capsule_path.exists() {
            return Err(CapsuleError::CapsuleExists { path: capsule_path });
        }

        let metadata = CapsuleMetadata {
            title: title.clone(),
            content: request.content.clone(),
            unlock_date,
            creation_date: today,
        };

        let scope = self.scope(&format!("{title}_temp."))?;
        let payload = scope.path().join("payload");
        fs::create_dir(&payload).map_err(CapsuleError::io(&payload))?;

        let metadata_path = payload.join(METADATA_ENTRY);
        fs::write(&metadata_path, metadata.to_json()?).map_err(CapsuleError::io(&metadata_path))?;

        let mut stored = BTreeSet::new();
        for source in &attachments {
            // resolve_attachments only returns paths with a file name
            let Some(name) = source.file_name() else {
                continue;
            };
            let target = payload.join(name);
            let name = name.to_string_lossy().into_owned();
            if !stored.insert(name.clone()) {
                tracing::warn!(
                    file = %name,
                    source = %source.display(),
                    "attachment base name collides with an earlier file; keeping the later one"
                );
            }
            fs::copy(source, &target).map_err(CapsuleError::io(source))?;
        }

        let archive_path = scope.path().join(archive_file_name(&title, unlock_date));
        let entries = pack_dir(&payload, &archive_path)?;
        tracing::debug!(archive = %archive_path.display(), entries = entries.len(), "packed capsule archive");

        let archive = fs::read(&archive_path).map_err(CapsuleError::io(&archive_path))?;
        let sealed = seal(&self.secret, &archive)?;
        write_atomic(&capsule_path, &[sealed.as_slice()])?;

        tracing::info!(
            capsule = %capsule_path.display(),
            unlock_date = %date::format_date(unlock_date),
            attachments = stored.len(),
            skipped = skipped.len(),
            "created capsule"
        );

        Ok(CreateReport {
            path: capsule_path,
            title,
            unlock_date,
            attachments: stored.into_iter().collect(),
            skipped,
        })
    }

    /// Open a capsule, gating it on the local calendar date.
    pub fn open(&self, path: impl AsRef<Path>) -> Result<OpenOutcome> {
        self.open_at(path, date::today())
    }

    /// Open a capsule as if the current date were `today`.
    pub fn open_at(&self, path: impl AsRef<Path>, today: NaiveDate) -> Result<OpenOutcome> {
        let path = path.as_ref();
        if !path.is_file() {
            return Ok(OpenOutcome::NotFound {
                path: path.to_path_buf(),
            });
        }

        let (scope, mut archive, _) = self.decrypt_to_scope(path)?;
        let metadata = archive.metadata()?;

        if let Some(days) = days_remaining(metadata.unlock_date, today) {
            tracing::info!(
                capsule = %path.display(),
                days_remaining = days,
                "capsule is still locked"
            );
            return Ok(OpenOutcome::Locked {
                title: metadata.title,
                unlock_date: metadata.unlock_date,
                days_remaining: days,
            });
        }

        // the stored title was sanitized at build time, but the capsule may
        // not have been built by us
        let title = sanitize_title(&metadata.title)
            .map_err(|_| CapsuleError::format("metadata title is not a usable file name"))?;

        let staged = scope.path().join("extracted");
        fs::create_dir(&staged).map_err(CapsuleError::io(&staged))?;
        let written = archive.extract_attachments(&staged)?;

        let destination = extracted_dir(&self.root, &title);
        fs::rename(&staged, &destination).map_err(CapsuleError::io(&destination))?;

        let files: Vec<String> = written
            .iter()
            .filter_map(|p| p.file_name())
            .map(|name| name.to_string_lossy().into_owned())
            .collect();

        tracing::info!(
            capsule = %path.display(),
            extracted = %destination.display(),
            files = files.len(),
            "opened capsule"
        );

        Ok(OpenOutcome::Opened {
            title: metadata.title,
            content: metadata.content,
            creation_date: metadata.creation_date,
            unlock_date: metadata.unlock_date,
            extracted_path: destination,
            files,
        })
    }

    /// Read a capsule's title and dates without revealing or extracting anything.
    pub fn inspect(&self, path: impl AsRef<Path>) -> Result<Option<CapsuleSummary>> {
        self.inspect_at(path, date::today())
    }

    pub fn inspect_at(
        &self,
        path: impl AsRef<Path>,
        today: NaiveDate,
    ) -> Result<Option<CapsuleSummary>> {
        let path = path.as_ref();
        if !path.is_file() {
            return Ok(None);
        }
        let (_scope, mut archive, kdf) = self.decrypt_to_scope(path)?;
        let metadata = archive.metadata()?;
        Ok(Some(CapsuleSummary {
            path: path.to_path_buf(),
            title: metadata.title,
            creation_date: metadata.creation_date,
            unlock_date: metadata.unlock_date,
            days_remaining: days_remaining(metadata.unlock_date, today).unwrap_or(0),
            attachment_count: archive.attachment_names().len(),
            sealed_with: kdf.label(),
        }))
    }

    /// All `.capsule` files directly under the storage root, sorted by name.
    pub fn list(&self) -> Result<Vec<PathBuf>> {
        list_capsules(&self.root)
    }

    fn resolve_attachments(&self, raw: &[String]) -> Result<(Vec<PathBuf>, Vec<PathBuf>)> {
        let mut attachments = Vec::new();
        let mut skipped = Vec::new();
        for path in raw.iter().filter_map(|raw| clean_input_path(raw)) {
            if path.file_name().is_some_and(|name| name == METADATA_ENTRY) {
                tracing::warn!(path = %path.display(), "skipping attachment that uses the reserved metadata name");
                skipped.push(path);
                continue;
            }
            if path.is_file() {
                attachments.push(path);
                continue;
            }
            if self.strict_attachments {
                return Err(CapsuleError::MissingAttachment { path });
            }
            tracing::warn!(path = %path.display(), "skipping attachment that is not a regular file");
            skipped.push(path);
        }
        Ok((attachments, skipped))
    }

    fn scope(&self, prefix: &str) -> Result<TempDir> {
        tempfile::Builder::new()
            .prefix(prefix)
            .tempdir_in(&self.root)
            .map_err(CapsuleError::io(&self.root))
    }

    /// Decrypt `path` into a fresh scope and open the archive inside it.
    ///
    /// The scope must outlive the archive handle; dropping it removes the
    /// decrypted bytes.
    fn decrypt_to_scope(
        &self,
        path: &Path,
    ) -> Result<(TempDir, CapsuleArchive<std::io::BufReader<fs::File>>, KdfAlgorithm)> {
        let bytes = fs::read(path).map_err(CapsuleError::io(path))?;
        let (header, plaintext): (CapsuleHeader, Vec<u8>) = unseal(&self.secret, &bytes)?;

        let stem = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "capsule".to_string());
        let scope = self.scope(&format!("{stem}_open."))?;
        let archive_path = scope.path().join(format!("{stem}_decrypted.zip"));
        fs::write(&archive_path, &plaintext).map_err(CapsuleError::io(&archive_path))?;
        let archive = CapsuleArchive::open(&archive_path)?;
        Ok((scope, archive, header.kdf))
    }
}
