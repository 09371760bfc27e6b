use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::dates;

/// One nightly price as delivered by the backend inside a property record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DailyPriceEntry {
    #[serde(with = "dates::lenient")]
    pub date: NaiveDate,
    #[serde(default)]
    pub price: Option<f64>,
}

/// Sparse calendar-date → nightly-price mapping.
///
/// Built from the raw entries with last-write-wins on duplicate dates.
/// Missing, negative or non-finite prices are stored as `0`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DailyPriceTable {
    prices: BTreeMap<NaiveDate, f64>,
}

impl DailyPriceTable {
    pub fn from_entries(entries: &[DailyPriceEntry]) -> Self {
        let mut prices = BTreeMap::new();
        for entry in entries {
            let price = entry.price.filter(|p| p.is_finite()).unwrap_or(0.0).max(0.0);
            if prices.insert(entry.date, price).is_some() {
                tracing::debug!(
                    date = %dates::canonical_key(entry.date),
                    "Duplicate daily price entry, keeping the later one"
                );
            }
        }
        Self { prices }
    }

    /// Price for `date`, if the table has one.
    pub fn get(&self, date: NaiveDate) -> Option<f64> {
        self.prices.get(&date).copied()
    }

    /// Price for `date`, `0` when absent.
    pub fn price_on(&self, date: NaiveDate) -> f64 {
        self.get(date).unwrap_or(0.0)
    }

    /// Sum of nightly prices over `[start, end)`.
    pub fn sum_range(&self, start: NaiveDate, end: NaiveDate) -> f64 {
        dates::half_open_days(start, end)
            .map(|d| self.price_on(d))
            .sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = (NaiveDate, f64)> + '_ {
        self.prices.iter().map(|(d, p)| (*d, *p))
    }

    pub fn len(&self) -> usize {
        self.prices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.prices.is_empty()
    }
}

impl FromIterator<(NaiveDate, f64)> for DailyPriceTable {
    fn from_iter<I: IntoIterator<Item = (NaiveDate, f64)>>(iter: I) -> Self {
        let entries: Vec<DailyPriceEntry> = iter
            .into_iter()
            .map(|(date, price)| DailyPriceEntry {
                date,
                price: Some(price),
            })
            .collect();
        Self::from_entries(&entries)
    }
}
