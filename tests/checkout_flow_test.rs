use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::NaiveDate;
use pretty_assertions::assert_eq;

use stay_booking::adapters::session::memory_store::MemoryTokenStore;
use stay_booking::domain::checkout::{CheckoutSession, ReservationRequest};
use stay_booking::domain::conflict::ConflictSet;
use stay_booking::domain::price_table::{DailyPriceEntry, DailyPriceTable};
use stay_booking::domain::pricing::{FeeSchedule, PriceBreakdown};
use stay_booking::domain::profile::{ProfileUpdate, User, UserDetails};
use stay_booking::domain::property::{Property, PropertyFilters, PropertyPage};
use stay_booking::domain::reservation::{Reservation, ReservationStatus};
use stay_booking::domain::selection::{Phase, Rejection, SelectionOutcome};
use stay_booking::domain::session::Session;
use stay_booking::error::{BookingError, Result};
use stay_booking::ports::booking_api::BookingApi;

fn d(day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 6, day).unwrap()
}

fn entry(day: u32, price: f64) -> DailyPriceEntry {
    DailyPriceEntry {
        date: d(day),
        price: Some(price),
    }
}

fn apartment() -> Property {
    Property {
        id: "apt-7".into(),
        title: "Marina Apartment".into(),
        guest_no: Some(2),
        cleaning_fee: Some(50.0),
        daily_prices: vec![entry(1, 100.0), entry(2, 120.0), entry(3, 110.0)],
        ..Default::default()
    }
}

fn fees() -> FeeSchedule {
    FeeSchedule {
        cleaning_fee: 0.0,
        service_fee: 14.0,
        vat_rate: 0.05,
        tourist_fee_per_night: 15.0,
        currency: "AED".into(),
    }
}

fn signed_in() -> Session {
    let tokens = Arc::new(MemoryTokenStore::with_access_token("token"));
    Session::new(tokens).with_user(&User {
        id: "user-1".into(),
        full_name: "Sam Traveller".into(),
        ..Default::default()
    })
}

#[test]
fn room_total_over_two_nights() {
    let table = DailyPriceTable::from_entries(&apartment().daily_prices);
    let quote = PriceBreakdown::compute(d(1), d(3), &table, &fees());
    assert_eq!(quote.nights, 2);
    assert!((quote.room_total - 220.0).abs() < 1e-9);
}

#[test]
fn confirmed_stay_blocks_nights_but_not_check_out_day() {
    let conflicts = ConflictSet::from_reservations(&[Reservation::new(
        d(1),
        d(3),
        ReservationStatus::Confirmed,
    )]);
    assert_eq!(conflicts.keys(), vec!["2025-06-01", "2025-06-02"]);
    assert!(!conflicts.is_blocked(d(3)));

    let mut checkout = CheckoutSession::new(
        &apartment(),
        &[Reservation::new(d(1), d(3), ReservationStatus::Confirmed)],
        fees(),
    );
    assert_eq!(
        checkout.select_date(d(3)),
        Ok(SelectionOutcome::CheckInSet(d(3)))
    );
}

#[test]
fn full_breakdown_with_fees() {
    let mut checkout = CheckoutSession::new(&apartment(), &[], fees());
    checkout.select_date(d(1)).unwrap();
    checkout.select_date(d(3)).unwrap();

    let quote = checkout.quote();
    assert_eq!(quote.nights, 2);
    assert!((quote.cleaning_fee - 50.0).abs() < 1e-9);
    assert!((quote.service_fee - 14.0).abs() < 1e-9);
    assert!((quote.vat - 11.0).abs() < 1e-9);
    assert!((quote.tourist_fee - 30.0).abs() < 1e-9);
    assert!((quote.grand_total - 325.0).abs() < 1e-9);
}

#[test]
fn earlier_check_out_is_rejected_and_picker_stays_open() {
    let mut checkout = CheckoutSession::new(&apartment(), &[], fees());
    checkout.select_date(d(5)).unwrap();

    let rejected = checkout.select_date(d(4));
    assert_eq!(
        rejected,
        Err(Rejection::NotAfterCheckIn {
            check_in: d(5),
            candidate: d(4),
        })
    );
    assert_eq!(checkout.phase(), Phase::AwaitingCheckOut);
    assert_eq!(checkout.selector().check_in(), Some(d(5)));
    assert_eq!(checkout.selector().check_out(), None);
}

#[test]
fn cancelled_and_completed_stays_do_not_block() {
    let reservations = [
        Reservation::new(d(1), d(4), ReservationStatus::Cancelled),
        Reservation::new(d(1), d(4), ReservationStatus::Completed),
    ];
    let mut checkout = CheckoutSession::new(&apartment(), &reservations, fees());
    assert!(checkout.conflicts().is_empty());
    assert!(checkout.select_date(d(1)).is_ok());
    assert!(checkout.select_date(d(3)).is_ok());
    assert_eq!(checkout.phase(), Phase::RangeSelected);
}

#[test]
fn guests_stay_within_capacity() {
    let mut checkout = CheckoutSession::new(&apartment(), &[], fees());
    assert_eq!(checkout.guests(), 1);
    assert_eq!(checkout.decrement_guests(), 1);
    assert_eq!(checkout.increment_guests(), 2);
    assert_eq!(checkout.increment_guests(), 2);
}

#[test]
fn change_check_out_keeps_check_in() {
    let mut checkout = CheckoutSession::new(&apartment(), &[], fees());
    checkout.select_date(d(1)).unwrap();
    checkout.select_date(d(2)).unwrap();
    checkout.begin_check_out().unwrap();
    checkout.select_date(d(3)).unwrap();
    assert_eq!(checkout.selector().range(), Some((d(1), d(3))));

    checkout.begin_check_in();
    assert_eq!(checkout.phase(), Phase::AwaitingCheckIn);
    assert_eq!(checkout.selector().check_out(), None);
    assert!((checkout.quote().grand_total).abs() < 1e-9);
}

#[test]
fn request_needs_range_and_user() {
    let mut checkout = CheckoutSession::new(&apartment(), &[], fees());
    let session = signed_in();
    assert!(matches!(
        checkout.reservation_request(&session),
        Err(BookingError::MissingSelection)
    ));

    checkout.select_date(d(1)).unwrap();
    checkout.select_date(d(3)).unwrap();
    let anonymous = Session::new(Arc::new(MemoryTokenStore::default()));
    assert!(matches!(
        checkout.reservation_request(&anonymous),
        Err(BookingError::MissingUserId)
    ));

    let request = checkout.reservation_request(&session).unwrap();
    assert_eq!(
        request,
        ReservationRequest {
            check_in: d(1),
            check_out: d(3),
            guest: "Sam Traveller".into(),
            guest_count: 1,
            manual_price: 325.0,
            property: "apt-7".into(),
            user_id: "user-1".into(),
        }
    );
}

// ---------------------------------------------------------------------------
// Load and reserve against a recording backend
// ---------------------------------------------------------------------------

#[derive(Default)]
struct RecordingApi {
    reserved: Mutex<Vec<ReservationRequest>>,
}

#[async_trait]
impl BookingApi for RecordingApi {
    async fn list_properties(&self, _filters: &PropertyFilters) -> Result<PropertyPage> {
        Ok(PropertyPage::default())
    }

    async fn get_property(&self, _id: &str) -> Result<Property> {
        Ok(apartment())
    }

    async fn get_property_reservations(&self, _property_id: &str) -> Result<Vec<Reservation>> {
        Ok(vec![Reservation::new(
            d(10),
            d(12),
            ReservationStatus::Pending,
        )])
    }

    async fn reserve(&self, request: &ReservationRequest) -> Result<String> {
        self.reserved.lock().unwrap().push(request.clone());
        Ok("Reserved".into())
    }

    async fn get_user_details(&self) -> Result<UserDetails> {
        Err(BookingError::Unauthorized)
    }

    async fn update_user_details(&self, _update: &ProfileUpdate) -> Result<UserDetails> {
        Err(BookingError::Unauthorized)
    }
}

#[tokio::test]
async fn load_then_reserve_clears_selection() {
    let api = RecordingApi::default();
    let mut checkout = CheckoutSession::load(&api, "apt-7", fees()).await.unwrap();
    assert!(checkout.conflicts().is_blocked(d(10)));
    assert!(checkout.conflicts().is_blocked(d(11)));
    assert!(!checkout.conflicts().is_blocked(d(12)));

    checkout.select_date(d(1)).unwrap();
    checkout.select_date(d(3)).unwrap();
    let message = checkout.reserve(&api, &signed_in()).await.unwrap();

    assert_eq!(message, "Reserved");
    assert_eq!(checkout.phase(), Phase::AwaitingCheckIn);
    assert_eq!(checkout.selector().range(), None);
    let sent = api.reserved.lock().unwrap();
    assert_eq!(sent.len(), 1);
    assert!((sent[0].manual_price - 325.0).abs() < 1e-9);
}

#[tokio::test]
async fn failed_validation_sends_nothing() {
    let api = RecordingApi::default();
    let mut checkout = CheckoutSession::load(&api, "apt-7", fees()).await.unwrap();
    checkout.select_date(d(1)).unwrap();

    let err = checkout.reserve(&api, &signed_in()).await.unwrap_err();
    assert!(matches!(err, BookingError::MissingSelection));
    assert!(api.reserved.lock().unwrap().is_empty());
    assert_eq!(checkout.phase(), Phase::AwaitingCheckOut);
}

#[tokio::test]
async fn blank_property_id_is_refused_before_loading() {
    let api = RecordingApi::default();
    let err = CheckoutSession::load(&api, "  ", fees()).await.unwrap_err();
    assert!(matches!(err, BookingError::MissingPropertyId));
}
