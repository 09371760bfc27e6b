//! Canonical calendar-date handling.
//!
//! Every date that is used as a table key or compared for set membership goes
//! through [`canonical_key`] / [`parse_calendar_date`], so a timestamp such as
//! `2025-06-01T00:00:00.000Z` and the bare `2025-06-01` land on the same day.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serializer};

use crate::error::{BookingError, Result};

pub const CANONICAL_FORMAT: &str = "%Y-%m-%d";

/// `YYYY-MM-DD`, no time component.
pub fn canonical_key(date: NaiveDate) -> String {
    date.format(CANONICAL_FORMAT).to_string()
}

/// Parse a bare date or a timestamp into its calendar date.
///
/// Timestamps with an offset are normalized to UTC before the date is taken.
pub fn parse_calendar_date(raw: &str) -> Result<NaiveDate> {
    let s = raw.trim();
    if let Ok(date) = NaiveDate::parse_from_str(s, CANONICAL_FORMAT) {
        return Ok(date);
    }
    if let Ok(ts) = DateTime::parse_from_rfc3339(s) {
        return Ok(ts.with_timezone(&Utc).date_naive());
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f") {
        return Ok(naive.date());
    }
    Err(BookingError::InvalidParams {
        reason: format!("invalid date '{raw}', expected YYYY-MM-DD"),
    })
}

/// Whole calendar days from `start` to `end`, floored at zero.
pub fn nights_between(start: NaiveDate, end: NaiveDate) -> u32 {
    let days = (end - start).num_days();
    u32::try_from(days.max(0)).unwrap_or(u32::MAX)
}

/// Dates of the half-open interval `[start, end)`. Empty when `end <= start`.
pub fn half_open_days(start: NaiveDate, end: NaiveDate) -> impl Iterator<Item = NaiveDate> {
    start.iter_days().take_while(move |d| *d < end)
}

/// Long display form, e.g. `June 01, 2025`.
pub fn display_long(date: NaiveDate) -> String {
    date.format("%B %d, %Y").to_string()
}

/// Short display form, e.g. `Jun 1, 2025`.
pub fn display_short(date: NaiveDate) -> String {
    date.format("%b %-d, %Y").to_string()
}

/// Serde adapter: accepts any form [`parse_calendar_date`] accepts and
/// serializes back to the canonical key.
pub mod lenient {
    use super::{Deserialize, Deserializer, NaiveDate, Serializer, canonical_key};

    pub fn serialize<S: Serializer>(date: &NaiveDate, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&canonical_key(*date))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<NaiveDate, D::Error> {
        let raw = String::deserialize(d)?;
        super::parse_calendar_date(&raw).map_err(serde::de::Error::custom)
    }
}

/// Same as [`lenient`] for optional fields; empty strings read as `None`.
pub mod lenient_opt {
    use super::{Deserialize, Deserializer, NaiveDate, Serializer, canonical_key};

    #[allow(clippy::ref_option)]
    pub fn serialize<S: Serializer>(date: &Option<NaiveDate>, s: S) -> Result<S::Ok, S::Error> {
        match date {
            Some(d) => s.serialize_str(&canonical_key(*d)),
            None => s.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<NaiveDate>, D::Error> {
        let raw = Option::<String>::deserialize(d)?;
        match raw.as_deref().map(str::trim) {
            None | Some("") => Ok(None),
            Some(s) => super::parse_calendar_date(s)
                .map(Some)
                .map_err(serde::de::Error::custom),
        }
    }
}
