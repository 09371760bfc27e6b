//! One checkout: picking dates for a property, pricing them and turning the
//! result into a reservation request.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::calendar::AvailabilityCalendar;
use super::conflict::ConflictSet;
use super::dates;
use super::price_table::DailyPriceTable;
use super::pricing::{FeeSchedule, PriceBreakdown};
use super::property::Property;
use super::reservation::Reservation;
use super::selection::{DateRangeSelector, Phase, Rejection, SelectionOutcome};
use super::session::Session;
use crate::error::{BookingError, Result};
use crate::ports::booking_api::BookingApi;

pub const FALLBACK_GUEST_NAME: &str = "Guest";

/// Body of the reserve call.
///
/// `manual_price` is the client-side grand total; the backend takes it as the
/// price of the stay.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ReservationRequest {
    #[serde(with = "dates::lenient")]
    pub check_in: NaiveDate,
    #[serde(with = "dates::lenient")]
    pub check_out: NaiveDate,
    pub guest: String,
    pub guest_count: u32,
    pub manual_price: f64,
    pub property: String,
    pub user_id: String,
}

#[derive(Debug, Clone)]
pub struct CheckoutSession {
    property_id: String,
    table: DailyPriceTable,
    conflicts: ConflictSet,
    fees: FeeSchedule,
    selector: DateRangeSelector,
    guests: u32,
    capacity: u32,
}

impl CheckoutSession {
    /// Build a session from already-loaded data. The property's cleaning fee
    /// overrides whatever `fees` carries.
    pub fn new(property: &Property, reservations: &[Reservation], fees: FeeSchedule) -> Self {
        Self {
            property_id: property.id.clone(),
            table: property.price_table(),
            conflicts: ConflictSet::from_reservations(reservations),
            fees: fees.with_cleaning_fee(property.cleaning_fee()),
            selector: DateRangeSelector::new(),
            guests: 1,
            capacity: property.guest_capacity(),
        }
    }

    /// Fetch the property and its reservations, then open the session.
    ///
    /// Date picking is only possible once both have resolved, so a selection
    /// can never be made against a conflict set that is still loading.
    pub async fn load(api: &dyn BookingApi, property_id: &str, fees: FeeSchedule) -> Result<Self> {
        if property_id.trim().is_empty() {
            return Err(BookingError::MissingPropertyId);
        }
        let (property, reservations) = tokio::try_join!(
            api.get_property(property_id),
            api.get_property_reservations(property_id)
        )?;
        debug!(
            property_id,
            reservations = reservations.len(),
            priced_days = property.daily_prices.len(),
            "Checkout session loaded"
        );
        Ok(Self::new(&property, &reservations, fees))
    }

    pub fn property_id(&self) -> &str {
        &self.property_id
    }

    pub fn conflicts(&self) -> &ConflictSet {
        &self.conflicts
    }

    pub fn price_table(&self) -> &DailyPriceTable {
        &self.table
    }

    pub fn fees(&self) -> &FeeSchedule {
        &self.fees
    }

    pub fn selector(&self) -> &DateRangeSelector {
        &self.selector
    }

    pub fn phase(&self) -> Phase {
        self.selector.phase()
    }

    pub fn select_date(&mut self, date: NaiveDate) -> std::result::Result<SelectionOutcome, Rejection> {
        let outcome = self.selector.select(date, &self.conflicts);
        match &outcome {
            Ok(o) => debug!(property_id = %self.property_id, ?o, "Date accepted"),
            Err(r) => debug!(property_id = %self.property_id, %r, "Date rejected"),
        }
        outcome
    }

    pub fn begin_check_in(&mut self) {
        self.selector.begin_check_in();
    }

    pub fn begin_check_out(&mut self) -> std::result::Result<(), Rejection> {
        self.selector.begin_check_out()
    }

    pub fn guests(&self) -> u32 {
        self.guests
    }

    pub fn guest_capacity(&self) -> u32 {
        self.capacity
    }

    /// Add a guest, up to the property's capacity.
    pub fn increment_guests(&mut self) -> u32 {
        if self.guests < self.capacity {
            self.guests += 1;
        }
        self.guests
    }

    /// Set the party size directly, clamped to `1..=capacity`.
    pub fn set_guests(&mut self, guests: u32) -> u32 {
        self.guests = guests.clamp(1, self.capacity.max(1));
        self.guests
    }

    /// Remove a guest, never going below one.
    pub fn decrement_guests(&mut self) -> u32 {
        self.guests = self.guests.saturating_sub(1).max(1);
        self.guests
    }

    /// Price of the current selection, recomputed on every call.
    pub fn quote(&self) -> PriceBreakdown {
        PriceBreakdown::for_selection(
            self.selector.check_in(),
            self.selector.check_out(),
            &self.table,
            &self.fees,
        )
    }

    pub fn availability(&self, start: NaiveDate, end: NaiveDate) -> AvailabilityCalendar {
        AvailabilityCalendar::build(
            &self.property_id,
            &self.fees.currency,
            &self.table,
            &self.conflicts,
            start,
            end,
        )
    }

    /// Validate the selection and identity, then build the request body.
    pub fn reservation_request(&self, session: &Session) -> Result<ReservationRequest> {
        let Some((check_in, check_out)) = self.selector.range() else {
            return Err(BookingError::MissingSelection);
        };
        let Some(user_id) = session.user_id.clone().filter(|id| !id.is_empty()) else {
            return Err(BookingError::MissingUserId);
        };
        if self.property_id.is_empty() {
            return Err(BookingError::MissingPropertyId);
        }
        let quote = self.quote();
        Ok(ReservationRequest {
            check_in,
            check_out,
            guest: session
                .full_name
                .clone()
                .unwrap_or_else(|| FALLBACK_GUEST_NAME.to_string()),
            guest_count: self.guests,
            manual_price: quote.grand_total,
            property: self.property_id.clone(),
            user_id,
        })
    }

    /// Submit the current selection. On success the selection is cleared.
    pub async fn reserve(&mut self, api: &dyn BookingApi, session: &Session) -> Result<String> {
        let request = self.reservation_request(session)?;
        let message = api.reserve(&request).await?;
        tracing::info!(
            property_id = %request.property,
            check_in = %request.check_in,
            check_out = %request.check_out,
            total = request.manual_price,
            "Reservation created"
        );
        self.complete();
        Ok(message)
    }

    /// Forget the selection after a successful reservation.
    pub fn complete(&mut self) {
        self.selector.reset();
    }
}
