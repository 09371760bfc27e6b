use std::sync::Mutex;

use async_trait::async_trait;

use crate::domain::checkout::ReservationRequest;
use crate::domain::dates;
use crate::domain::profile::{ProfileUpdate, User, UserDetails};
use crate::domain::property::{Address, Property, PropertyFilters, PropertyPage};
use crate::domain::reservation::{Reservation, ReservationStatus};
use crate::error::Result;
use crate::ports::booking_api::BookingApi;

type ListFn = Box<dyn Fn(&PropertyFilters) -> Result<PropertyPage> + Send + Sync>;
type PropertyFn = Box<dyn Fn(&str) -> Result<Property> + Send + Sync>;
type ReservationsFn = Box<dyn Fn(&str) -> Result<Vec<Reservation>> + Send + Sync>;
type ReserveFn = Box<dyn Fn(&ReservationRequest) -> Result<String> + Send + Sync>;
type UserDetailsFn = Box<dyn Fn() -> Result<UserDetails> + Send + Sync>;
type UpdateUserFn = Box<dyn Fn(&ProfileUpdate) -> Result<UserDetails> + Send + Sync>;

#[allow(clippy::struct_field_names)]
pub struct MockBookingApi {
    list_fn: Mutex<ListFn>,
    property_fn: Mutex<PropertyFn>,
    reservations_fn: Mutex<ReservationsFn>,
    reserve_fn: Mutex<ReserveFn>,
    user_details_fn: Mutex<UserDetailsFn>,
    update_user_fn: Mutex<UpdateUserFn>,
}

impl Default for MockBookingApi {
    fn default() -> Self {
        Self::new()
    }
}

impl MockBookingApi {
    pub fn new() -> Self {
        Self {
            list_fn: Mutex::new(Box::new(|f| Ok(make_page(vec![], f.page())))),
            property_fn: Mutex::new(Box::new(|id| Ok(make_property(id, "Test Property")))),
            reservations_fn: Mutex::new(Box::new(|_| Ok(vec![]))),
            reserve_fn: Mutex::new(Box::new(|_| Ok("Reservation created".into()))),
            user_details_fn: Mutex::new(Box::new(|| Ok(make_user_details()))),
            update_user_fn: Mutex::new(Box::new(|_| Ok(make_user_details()))),
        }
    }

    #[must_use]
    pub fn with_list(
        self,
        f: impl Fn(&PropertyFilters) -> Result<PropertyPage> + Send + Sync + 'static,
    ) -> Self {
        *self.list_fn.lock().unwrap() = Box::new(f);
        self
    }

    #[must_use]
    pub fn with_property(self, f: impl Fn(&str) -> Result<Property> + Send + Sync + 'static) -> Self {
        *self.property_fn.lock().unwrap() = Box::new(f);
        self
    }

    #[must_use]
    pub fn with_reservations(
        self,
        f: impl Fn(&str) -> Result<Vec<Reservation>> + Send + Sync + 'static,
    ) -> Self {
        *self.reservations_fn.lock().unwrap() = Box::new(f);
        self
    }

    #[must_use]
    pub fn with_reserve(
        self,
        f: impl Fn(&ReservationRequest) -> Result<String> + Send + Sync + 'static,
    ) -> Self {
        *self.reserve_fn.lock().unwrap() = Box::new(f);
        self
    }

    #[must_use]
    pub fn with_user_details(
        self,
        f: impl Fn() -> Result<UserDetails> + Send + Sync + 'static,
    ) -> Self {
        *self.user_details_fn.lock().unwrap() = Box::new(f);
        self
    }

    #[must_use]
    pub fn with_update_user(
        self,
        f: impl Fn(&ProfileUpdate) -> Result<UserDetails> + Send + Sync + 'static,
    ) -> Self {
        *self.update_user_fn.lock().unwrap() = Box::new(f);
        self
    }
}

#[async_trait]
impl BookingApi for MockBookingApi {
    async fn list_properties(&self, filters: &PropertyFilters) -> Result<PropertyPage> {
        let f = self.list_fn.lock().unwrap();
        f(filters)
    }

    async fn get_property(&self, id: &str) -> Result<Property> {
        let f = self.property_fn.lock().unwrap();
        f(id)
    }

    async fn get_property_reservations(&self, property_id: &str) -> Result<Vec<Reservation>> {
        let f = self.reservations_fn.lock().unwrap();
        f(property_id)
    }

    async fn reserve(&self, request: &ReservationRequest) -> Result<String> {
        let f = self.reserve_fn.lock().unwrap();
        f(request)
    }

    async fn get_user_details(&self) -> Result<UserDetails> {
        let f = self.user_details_fn.lock().unwrap();
        f()
    }

    async fn update_user_details(&self, update: &ProfileUpdate) -> Result<UserDetails> {
        let f = self.update_user_fn.lock().unwrap();
        f(update)
    }
}

// ---------- Factory functions ----------

pub fn make_property(id: &str, title: &str) -> Property {
    Property {
        id: id.into(),
        title: title.into(),
        description: format!("{title} description"),
        address: Some(Address {
            address: "1 Marina Walk".into(),
        }),
        city: Some("Dubai".into()),
        country: Some("UAE".into()),
        price: Some(100.0),
        ..Default::default()
    }
}

pub fn make_page(properties: Vec<Property>, page: u32) -> PropertyPage {
    PropertyPage {
        total: u32::try_from(properties.len()).unwrap_or(u32::MAX),
        properties,
        page,
        limit: PropertyFilters::DEFAULT_LIMIT,
        pagination: None,
    }
}

/// Reservation over `[check_in, check_out)`, both given as `YYYY-MM-DD`.
pub fn make_reservation(check_in: &str, check_out: &str, status: ReservationStatus) -> Reservation {
    Reservation::new(
        dates::parse_calendar_date(check_in).unwrap(),
        dates::parse_calendar_date(check_out).unwrap(),
        status,
    )
}

pub fn make_user_details() -> UserDetails {
    UserDetails {
        user: User {
            id: "u1".into(),
            full_name: "Test User".into(),
            email: "test@example.com".into(),
            phone: "+971500000000".into(),
            ..Default::default()
        },
        ..Default::default()
    }
}
