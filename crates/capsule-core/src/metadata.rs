use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::date::dmy;
use crate::error::CapsuleError;

/// Record stored in the reserved `metadata.json` archive entry.
///
/// The schema is closed: every field is required and unknown keys are
/// rejected, so a capsule cannot smuggle anything past the parser.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CapsuleMetadata {
    pub title: String,
    pub content: String,
    #[serde(with = "dmy")]
    pub unlock_date: NaiveDate,
    #[serde(with = "dmy")]
    pub creation_date: NaiveDate,
}

impl CapsuleMetadata {
    pub fn to_json(&self) -> Result<Vec<u8>, CapsuleError> {
        Ok(serde_json::to_vec_pretty(self)?)
    }

    pub fn from_json(bytes: &[u8]) -> Result<Self, CapsuleError> {
        let meta: Self = serde_json::from_slice(bytes)
            .map_err(|e| CapsuleError::format(format!("malformed metadata: {e}")))?;
        if meta.title.trim().is_empty() {
            return Err(CapsuleError::format("metadata title is empty"));
        }
        Ok(meta)
    }
}
