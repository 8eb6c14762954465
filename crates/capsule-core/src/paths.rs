//! File naming for the storage root.
//!
//! ```text
//! <root>/
//!   <title>_<DD-MM-YYYY>.capsule   # durable encrypted artifact
//!   <title>_temp.XXXXXX/           # build scope (removed on drop)
//!   <stem>_open.XXXXXX/            # open scope (removed on drop)
//!   <title>_extracted[_n]/         # attachments after a successful open
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;

use crate::constants::{CAPSULE_EXTENSION, MAX_TITLE_CHARS};
use crate::date::format_date;
use crate::error::{CapsuleError, Result};

/// Turn a user title into something safe to embed in a file name.
pub fn sanitize_title(title: &str) -> Result<String> {
    let cleaned: String = title
        .trim()
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();
    let cleaned = cleaned.trim_start_matches('.');
    let cleaned: String = cleaned.chars().take(MAX_TITLE_CHARS).collect();
    let cleaned = cleaned.trim_end().to_string();

    // "." and ".." are already empty once leading dots are gone
    if cleaned.is_empty() {
        return Err(CapsuleError::InvalidTitle {
            title: title.to_string(),
        });
    }
    Ok(cleaned)
}

#[must_use]
pub fn capsule_file_name(title: &str, unlock_date: NaiveDate) -> String {
    format!("{title}_{}.{CAPSULE_EXTENSION}", format_date(unlock_date))
}

#[must_use]
pub fn archive_file_name(title: &str, unlock_date: NaiveDate) -> String {
    format!("{title}_{}.zip", format_date(unlock_date))
}

/// First free `<title>_extracted`, `<title>_extracted_2`, ... under `root`.
#[must_use]
pub fn extracted_dir(root: &Path, title: &str) -> PathBuf {
    let base = root.join(format!("{title}_extracted"));
    if !base.exists() {
        return base;
    }
    (2u32..)
        .map(|n| root.join(format!("{title}_extracted_{n}")))
        .find(|candidate| !candidate.exists())
        .unwrap_or(base)
}

/// All `.capsule` files directly under `root`, sorted by name.
pub fn list_capsules(root: &Path) -> Result<Vec<PathBuf>> {
    let mut found = Vec::new();
    for entry in fs::read_dir(root).map_err(CapsuleError::io(root))? {
        let path = entry.map_err(CapsuleError::io(root))?.path();
        if path.is_file()
            && path
                .extension()
                .is_some_and(|ext| ext == CAPSULE_EXTENSION)
        {
            found.push(path);
        }
    }
    found.sort();
    Ok(found)
}

/// Strip whitespace and wrapping quotes from a user-typed path.
#[must_use]
pub fn clean_input_path(raw: &str) -> Option<PathBuf> {
    let trimmed = raw.trim().trim_matches(|c| c == '"' || c == '\'').trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(PathBuf::from(trimmed))
    }
}

/// True when `name` is a single normal path component (no separators or `..`).
#[must_use]
pub fn is_plain_file_name(name: &str) -> bool {
    let mut components = Path::new(name).components();
    matches!(
        (components.next(), components.next()),
        (Some(std::path::Component::Normal(_)), None)
    ) && !name.contains('\\')
}
