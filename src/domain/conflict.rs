use std::collections::BTreeSet;

use chrono::NaiveDate;

use super::dates;
use super::reservation::Reservation;

/// Calendar dates that cannot be picked because an active reservation
/// already occupies them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConflictSet {
    blocked: BTreeSet<NaiveDate>,
}

impl ConflictSet {
    /// Expand every pending or confirmed reservation into its nights.
    ///
    /// A reservation's checkout day stays free so that back-to-back stays are
    /// possible.
    pub fn from_reservations(reservations: &[Reservation]) -> Self {
        let blocked: BTreeSet<NaiveDate> =
            reservations.iter().flat_map(Reservation::blocked_dates).collect();
        tracing::debug!(
            reservations = reservations.len(),
            blocked = blocked.len(),
            "Built conflict set"
        );
        Self { blocked }
    }

    pub fn is_blocked(&self, date: NaiveDate) -> bool {
        self.blocked.contains(&date)
    }

    /// Membership check by any date string [`dates::parse_calendar_date`]
    /// understands. Unparseable input is never blocked.
    pub fn contains_key(&self, raw: &str) -> bool {
        dates::parse_calendar_date(raw).is_ok_and(|d| self.is_blocked(d))
    }

    /// Canonical keys of all blocked dates, in order.
    pub fn keys(&self) -> Vec<String> {
        self.blocked.iter().copied().map(dates::canonical_key).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        self.blocked.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.blocked.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocked.is_empty()
    }
}
