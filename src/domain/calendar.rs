#![allow(clippy::cast_precision_loss)]

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::conflict::ConflictSet;
use super::dates;
use super::price_table::DailyPriceTable;

/// One day of the picker: its price (if the host set one) and whether it can
/// be chosen.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CalendarDay {
    #[serde(with = "dates::lenient")]
    pub date: NaiveDate,
    pub price: Option<f64>,
    pub available: bool,
}

/// Prices and availability of one property over a window of days.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AvailabilityCalendar {
    pub property_id: String,
    pub currency: String,
    pub days: Vec<CalendarDay>,
    #[serde(default)]
    pub average_price: Option<f64>,
    #[serde(default)]
    pub occupancy_rate: Option<f64>,
    #[serde(default)]
    pub min_price: Option<f64>,
    #[serde(default)]
    pub max_price: Option<f64>,
}

impl AvailabilityCalendar {
    /// Mark every day of `[start, end)` with its price and blocked state.
    pub fn build(
        property_id: &str,
        currency: &str,
        table: &DailyPriceTable,
        conflicts: &ConflictSet,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Self {
        let days = dates::half_open_days(start, end)
            .map(|date| CalendarDay {
                date,
                price: table.get(date).filter(|p| *p > 0.0),
                available: !conflicts.is_blocked(date),
            })
            .collect();
        let mut calendar = Self {
            property_id: property_id.to_string(),
            currency: currency.to_string(),
            days,
            average_price: None,
            occupancy_rate: None,
            min_price: None,
            max_price: None,
        };
        calendar.compute_stats();
        calendar
    }

    /// Compute summary statistics from the day-by-day data.
    pub fn compute_stats(&mut self) {
        let prices: Vec<f64> = self
            .days
            .iter()
            .filter(|d| d.available)
            .filter_map(|d| d.price)
            .collect();
        if !prices.is_empty() {
            self.average_price = Some(prices.iter().sum::<f64>() / prices.len() as f64);
            self.min_price = prices.iter().copied().reduce(f64::min);
            self.max_price = prices.iter().copied().reduce(f64::max);
        }
        let total = self.days.len();
        if total > 0 {
            let unavailable = self.days.iter().filter(|d| !d.available).count();
            self.occupancy_rate = Some(unavailable as f64 / total as f64 * 100.0);
        }
    }

    pub fn available_days(&self) -> impl Iterator<Item = &CalendarDay> {
        self.days.iter().filter(|d| d.available)
    }
}

impl std::fmt::Display for AvailabilityCalendar {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(
            f,
            "Availability for property {} ({})",
            self.property_id, self.currency
        )?;
        if let Some(occ) = self.occupancy_rate {
            writeln!(f, "Booked: {occ:.1}%")?;
        }
        if let Some(avg) = self.average_price {
            write!(f, "Avg price: {avg:.0} {}", self.currency)?;
            if let (Some(min), Some(max)) = (self.min_price, self.max_price) {
                write!(f, " (range: {min:.0}-{max:.0})")?;
            }
            writeln!(f)?;
        }
        writeln!(f, "{:<12} {:>12} {:>10}", "Date", "Price", "Available")?;
        writeln!(f, "{}", "-".repeat(36))?;
        for day in &self.days {
            let price = day
                .price
                .map_or_else(|| "N/A".to_string(), |p| format!("{p:.0} {}", self.currency));
            let available = if day.available { "Yes" } else { "Booked" };
            writeln!(
                f,
                "{:<12} {:>12} {:>10}",
                dates::canonical_key(day.date),
                price,
                available
            )?;
        }
        Ok(())
    }
}
