use chrono::{Local, NaiveDate};

use crate::constants::DATE_FORMAT;
use crate::error::CapsuleError;

/// Parse a `DD-MM-YYYY` calendar date.
pub fn parse_date(input: &str) -> Result<NaiveDate, CapsuleError> {
    NaiveDate::parse_from_str(input.trim(), DATE_FORMAT).map_err(|_| {
        CapsuleError::InvalidDateFormat {
            input: input.to_string(),
        }
    })
}

#[must_use]
pub fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

/// The local calendar date the gate is evaluated against.
#[must_use]
pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// Whole calendar days until `unlock_date`, or `None` once it has been reached.
///
/// A capsule unlocks at the start of its unlock date, so any locked capsule
/// reports at least one day.
#[must_use]
pub fn days_remaining(unlock_date: NaiveDate, today: NaiveDate) -> Option<i64> {
    let days = (unlock_date - today).num_days();
    (days > 0).then_some(days)
}

/// serde adapter storing dates as `DD-MM-YYYY` strings.
pub(crate) mod dmy {
    use chrono::NaiveDate;
    use serde::{Deserialize, Deserializer, Serializer};

    use crate::constants::DATE_FORMAT;

    pub fn serialize<S: Serializer>(date: &NaiveDate, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&date.format(DATE_FORMAT))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveDate, D::Error> {
        let raw = String::deserialize(deserializer)?;
        NaiveDate::parse_from_str(&raw, DATE_FORMAT).map_err(serde::de::Error::custom)
    }
}
