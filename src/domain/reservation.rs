use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::dates;

/// Lifecycle state of a reservation as reported by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ReservationStatus {
    Pending,
    Confirmed,
    Completed,
    Cancelled,
    Failed,
    /// A status this client does not know about. Never blocks dates.
    Other(String),
}

/// A booking without a status is unknown, so it does not block dates.
impl Default for ReservationStatus {
    fn default() -> Self {
        Self::Other(String::new())
    }
}

impl ReservationStatus {
    /// Only pending and confirmed stays occupy the calendar.
    pub fn blocks_dates(&self) -> bool {
        matches!(self, Self::Pending | Self::Confirmed)
    }
}

impl From<String> for ReservationStatus {
    fn from(raw: String) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "pending" => Self::Pending,
            "confirmed" => Self::Confirmed,
            "completed" => Self::Completed,
            "cancelled" | "canceled" => Self::Cancelled,
            "failed" | "fail" => Self::Failed,
            _ => Self::Other(raw),
        }
    }
}

impl From<ReservationStatus> for String {
    fn from(status: ReservationStatus) -> Self {
        status.to_string()
    }
}

impl std::fmt::Display for ReservationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pending => write!(f, "Pending"),
            Self::Confirmed => write!(f, "Confirmed"),
            Self::Completed => write!(f, "Completed"),
            Self::Cancelled => write!(f, "Cancelled"),
            Self::Failed => write!(f, "Failed"),
            Self::Other(s) => write!(f, "{s}"),
        }
    }
}

/// An existing stay on a property. `check_out` is exclusive.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Reservation {
    #[serde(default, rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(with = "dates::lenient")]
    pub check_in: NaiveDate,
    #[serde(with = "dates::lenient")]
    pub check_out: NaiveDate,
    #[serde(default)]
    pub status: ReservationStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub guest: Option<String>,
}

impl Reservation {
    pub fn new(check_in: NaiveDate, check_out: NaiveDate, status: ReservationStatus) -> Self {
        Self {
            id: None,
            check_in,
            check_out,
            status,
            guest: None,
        }
    }

    /// Dates this reservation occupies: `[check_in, check_out)` when active,
    /// nothing otherwise.
    pub fn blocked_dates(&self) -> impl Iterator<Item = NaiveDate> {
        let (start, end) = if self.status.blocks_dates() {
            (self.check_in, self.check_out)
        } else {
            (self.check_in, self.check_in)
        };
        dates::half_open_days(start, end)
    }
}
