use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::dates;
use super::price_table::DailyPriceTable;

pub const DEFAULT_SERVICE_FEE: f64 = 14.0;
pub const DEFAULT_VAT_RATE: f64 = 0.05;
pub const DEFAULT_TOURIST_FEE_PER_NIGHT: f64 = 15.0;
pub const DEFAULT_CURRENCY: &str = "AED";

/// Fixed and proportional charges applied on top of the room total.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeeSchedule {
    pub cleaning_fee: f64,
    pub service_fee: f64,
    pub vat_rate: f64,
    pub tourist_fee_per_night: f64,
    pub currency: String,
}

impl Default for FeeSchedule {
    fn default() -> Self {
        Self {
            cleaning_fee: 0.0,
            service_fee: DEFAULT_SERVICE_FEE,
            vat_rate: DEFAULT_VAT_RATE,
            tourist_fee_per_night: DEFAULT_TOURIST_FEE_PER_NIGHT,
            currency: DEFAULT_CURRENCY.into(),
        }
    }
}

impl FeeSchedule {
    #[must_use]
    pub fn with_cleaning_fee(mut self, cleaning_fee: f64) -> Self {
        self.cleaning_fee = cleaning_fee.max(0.0);
        self
    }
}

/// Itemized price of one stay.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceBreakdown {
    pub nights: u32,
    pub room_total: f64,
    pub cleaning_fee: f64,
    pub service_fee: f64,
    pub vat: f64,
    pub tourist_fee: f64,
    pub grand_total: f64,
    pub currency: String,
}

impl PriceBreakdown {
    /// All-zero breakdown, used while the range is incomplete.
    pub fn empty(currency: &str) -> Self {
        Self {
            nights: 0,
            room_total: 0.0,
            cleaning_fee: 0.0,
            service_fee: 0.0,
            vat: 0.0,
            tourist_fee: 0.0,
            grand_total: 0.0,
            currency: currency.to_string(),
        }
    }

    /// Price the half-open stay `[check_in, check_out)`.
    ///
    /// An empty or inverted range prices to zero, fixed fees included.
    pub fn compute(
        check_in: NaiveDate,
        check_out: NaiveDate,
        table: &DailyPriceTable,
        fees: &FeeSchedule,
    ) -> Self {
        let nights = dates::nights_between(check_in, check_out);
        if nights == 0 {
            return Self::empty(&fees.currency);
        }

        let room_total = table.sum_range(check_in, check_out);
        let vat = room_total * fees.vat_rate;
        let tourist_fee = f64::from(nights) * fees.tourist_fee_per_night;
        let grand_total = room_total + fees.cleaning_fee + fees.service_fee + vat + tourist_fee;

        Self {
            nights,
            room_total,
            cleaning_fee: fees.cleaning_fee,
            service_fee: fees.service_fee,
            vat,
            tourist_fee,
            grand_total,
            currency: fees.currency.clone(),
        }
    }

    /// Same as [`Self::compute`] but tolerates a missing date.
    pub fn for_selection(
        check_in: Option<NaiveDate>,
        check_out: Option<NaiveDate>,
        table: &DailyPriceTable,
        fees: &FeeSchedule,
    ) -> Self {
        match (check_in, check_out) {
            (Some(ci), Some(co)) => Self::compute(ci, co, table, fees),
            _ => Self::empty(&fees.currency),
        }
    }

    /// Average nightly room price, if there is at least one night.
    pub fn average_nightly(&self) -> Option<f64> {
        (self.nights > 0).then(|| self.room_total / f64::from(self.nights))
    }
}

impl std::fmt::Display for PriceBreakdown {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let c = &self.currency;
        let label = if self.nights == 1 { "night" } else { "nights" };
        writeln!(
            f,
            "{:<24} {:>12}",
            format!("{} {label}", self.nights),
            format!("{:.2} {c}", self.room_total)
        )?;
        writeln!(f, "{:<24} {:>12}", "Cleaning fee", format!("{:.2} {c}", self.cleaning_fee))?;
        writeln!(f, "{:<24} {:>12}", "Service fee", format!("{:.2} {c}", self.service_fee))?;
        writeln!(f, "{:<24} {:>12}", "VAT", format!("{:.2} {c}", self.vat))?;
        writeln!(f, "{:<24} {:>12}", "Tourism fee", format!("{:.2} {c}", self.tourist_fee))?;
        writeln!(f, "{}", "-".repeat(37))?;
        writeln!(f, "{:<24} {:>12}", "Total", format!("{:.2} {c}", self.grand_total))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, day).unwrap()
    }

    fn sample_table() -> DailyPriceTable {
        [(d(1), 100.0), (d(2), 120.0), (d(3), 110.0)]
            .into_iter()
            .collect()
    }

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn two_night_room_total() {
        let b = PriceBreakdown::compute(d(1), d(3), &sample_table(), &FeeSchedule::default());
        assert_eq!(b.nights, 2);
        assert!(close(b.room_total, 220.0));
    }

    #[test]
    fn full_breakdown_with_cleaning_fee() {
        let fees = FeeSchedule::default().with_cleaning_fee(50.0);
        let b = PriceBreakdown::compute(d(1), d(3), &sample_table(), &fees);
        assert!(close(b.vat, 11.0));
        assert!(close(b.tourist_fee, 30.0));
        assert!(close(b.cleaning_fee, 50.0));
        assert!(close(b.service_fee, 14.0));
        assert!(close(b.grand_total, 325.0));
    }

    #[test]
    fn missing_days_price_as_zero() {
        let b = PriceBreakdown::compute(d(2), d(6), &sample_table(), &FeeSchedule::default());
        assert_eq!(b.nights, 4);
        assert!(close(b.room_total, 230.0));
    }

    #[test]
    fn inverted_range_is_all_zero() {
        let fees = FeeSchedule::default().with_cleaning_fee(50.0);
        let b = PriceBreakdown::compute(d(3), d(1), &sample_table(), &fees);
        assert_eq!(b, PriceBreakdown::empty("AED"));
    }

    #[test]
    fn same_day_is_all_zero() {
        let b = PriceBreakdown::compute(d(1), d(1), &sample_table(), &FeeSchedule::default());
        assert_eq!(b.nights, 0);
        assert!(close(b.grand_total, 0.0));
    }

    #[test]
    fn incomplete_selection_is_empty() {
        let b = PriceBreakdown::for_selection(
            Some(d(1)),
            None,
            &sample_table(),
            &FeeSchedule::default(),
        );
        assert_eq!(b.nights, 0);
    }

    #[test]
    fn vat_is_not_rounded() {
        let table: DailyPriceTable = [(d(1), 33.33)].into_iter().collect();
        let b = PriceBreakdown::compute(d(1), d(2), &table, &FeeSchedule::default());
        assert!(close(b.vat, 33.33 * 0.05));
    }

    #[test]
    fn negative_cleaning_fee_clamped() {
        let fees = FeeSchedule::default().with_cleaning_fee(-10.0);
        assert!(close(fees.cleaning_fee, 0.0));
    }

    #[test]
    fn average_nightly() {
        let b = PriceBreakdown::compute(d(1), d(3), &sample_table(), &FeeSchedule::default());
        assert!(close(b.average_nightly().unwrap(), 110.0));
        assert!(PriceBreakdown::empty("AED").average_nightly().is_none());
    }

    #[test]
    fn display_lists_every_line() {
        let fees = FeeSchedule::default().with_cleaning_fee(50.0);
        let s = PriceBreakdown::compute(d(1), d(3), &sample_table(), &fees).to_string();
        assert!(s.contains("2 nights"));
        assert!(s.contains("220.00 AED"));
        assert!(s.contains("VAT"));
        assert!(s.contains("11.00 AED"));
        assert!(s.contains("325.00 AED"));
    }
}
