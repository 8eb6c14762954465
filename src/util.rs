use std::env;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use capsule_core::{CapsuleSummary, CreateReport, OpenOutcome, format_date};
use serde::Serialize;

pub(crate) fn env_optional(name: &str) -> Option<String> {
    env::var(name).ok().filter(|value| !value.trim().is_empty())
}

/// Splits a comma-separated path list, dropping empty items.
pub(crate) fn split_file_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}

pub(crate) fn blake3_file_hex(path: &Path) -> io::Result<String> {
    let bytes = fs::read(path)?;
    Ok(blake3::hash(&bytes).to_hex().to_string())
}

/// Bare capsule names are looked up under the storage root.
pub(crate) fn resolve_capsule_path(root: &Path, path: PathBuf) -> PathBuf {
    if path.exists() || path.is_absolute() {
        return path;
    }
    let under_root = root.join(&path);
    if under_root.exists() { under_root } else { path }
}

/// Default log filter for `-v` counts when `RUST_LOG` is unset.
pub(crate) fn verbosity_filter(verbose: u8) -> &'static str {
    match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    }
}

pub(crate) fn print_json<T: Serialize>(value: &T) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

pub(crate) fn describe_outcome(outcome: &OpenOutcome) -> String {
    match outcome {
        OpenOutcome::NotFound { .. } => "Capsule not found!".to_string(),
        OpenOutcome::Locked { days_remaining, .. } => {
            format!("This capsule cannot be opened for {days_remaining} more days!")
        }
        OpenOutcome::Opened {
            content,
            extracted_path,
            ..
        } => format!(
            "Content: {content}\nExtracted files are saved in: {}",
            extracted_path.display()
        ),
    }
}

pub(crate) fn describe_report(report: &CreateReport) -> String {
    let mut out = format!(
        "Capsule '{}' created successfully at {}",
        report.title,
        report.path.display()
    );
    out.push_str(&format!("\nUnlocks on {}", format_date(report.unlock_date)));
    if !report.attachments.is_empty() {
        out.push_str(&format!("\nAttached: {}", report.attachments.join(", ")));
    }
    for path in &report.skipped {
        out.push_str(&format!("\nSkipped (not found): {}", path.display()));
    }
    out
}

pub(crate) fn describe_summary(summary: &CapsuleSummary) -> String {
    let status = if summary.days_remaining > 0 {
        format!("locked, {} days remaining", summary.days_remaining)
    } else {
        "ready to open".to_string()
    };
    format!(
        "{}\n  title: {}\n  created: {}\n  unlocks: {} ({status})\n  attachments: {}\n  sealed with: {}",
        summary.path.display(),
        summary.title,
        format_date(summary.creation_date),
        format_date(summary.unlock_date),
        summary.attachment_count,
        summary.sealed_with,
    )
}
