use async_trait::async_trait;

use crate::domain::checkout::ReservationRequest;
use crate::domain::profile::{ProfileUpdate, UserDetails};
use crate::domain::property::{Property, PropertyFilters, PropertyPage};
use crate::domain::reservation::Reservation;
use crate::error::Result;

/// The booking backend as seen by the rest of the crate.
#[async_trait]
pub trait BookingApi: Send + Sync {
    async fn list_properties(&self, filters: &PropertyFilters) -> Result<PropertyPage>;
    async fn get_property(&self, id: &str) -> Result<Property>;
    /// Existing reservations of one property, used to build the conflict set.
    async fn get_property_reservations(&self, property_id: &str) -> Result<Vec<Reservation>>;
    /// Submit a reservation. Returns the backend's confirmation message.
    async fn reserve(&self, request: &ReservationRequest) -> Result<String>;
    async fn get_user_details(&self) -> Result<UserDetails>;
    async fn update_user_details(&self, update: &ProfileUpdate) -> Result<UserDetails>;
}
