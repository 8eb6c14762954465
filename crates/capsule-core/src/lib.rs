//! Core library for timecapsule: encrypted, date-gated capsules.
//!
//! A capsule bundles a message and optional files into one file sealed with
//! AES-256-GCM. [`TimeCapsule::open`] refuses to reveal anything before the
//! capsule's unlock date and reports the days still to wait instead.
//!
//! ```no_run
//! use capsule_core::{CapsuleKey, CreateRequest, OpenOutcome, TimeCapsule};
//!
//! # fn main() -> capsule_core::Result<()> {
//! let (key, _) = CapsuleKey::load_or_generate("time_capsules/capsule.key")?;
//! let capsules = TimeCapsule::new("time_capsules", key)?;
//! let report = capsules.create(&CreateRequest {
//!     title: "bday".into(),
//!     content: "Happy Birthday!".into(),
//!     unlock_date: "31-12-2030".into(),
//!     files: vec![],
//! })?;
//! match capsules.open(&report.path)? {
//!     OpenOutcome::Locked { days_remaining, .. } => println!("{days_remaining} days to go"),
//!     OpenOutcome::Opened { content, .. } => println!("{content}"),
//!     OpenOutcome::NotFound { .. } => unreachable!(),
//! }
//! # Ok(())
//! # }
//! ```
//!
//! The date gate is advisory: anyone holding the secret can decrypt a
//! capsule with other tools.

mod archive;
mod capsule;
pub mod constants;
mod crypto;
mod date;
mod error;
mod header;
mod io;
mod key;
mod metadata;
mod paths;

pub use archive::CapsuleArchive;
pub use capsule::{CapsuleSummary, CreateReport, CreateRequest, OpenOutcome, TimeCapsule};
pub use constants::*;
pub use crypto::{seal, unseal};
pub use date::{days_remaining, format_date, parse_date, today};
pub use error::{CapsuleError, Result};
pub use header::{CapsuleHeader, CipherAlgorithm, KdfAlgorithm};
pub use key::{CapsuleKey, Secret};
pub use metadata::CapsuleMetadata;
pub use paths::{clean_input_path, list_capsules, sanitize_title};
