use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::dates;
use super::property::{Address, PLACEHOLDER_IMAGE, Photo};
use super::reservation::ReservationStatus;

const NOT_AVAILABLE: &str = "N/A";
const UNTITLED: &str = "Untitled Property";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(rename = "_id", default)]
    pub id: String,
    #[serde(default)]
    pub full_name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub profile_img: Option<String>,
    #[serde(default, with = "dates::lenient_opt")]
    pub created_at: Option<NaiveDate>,
}

/// The property summary embedded in booking and watchlist entries.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PropertyRef {
    #[serde(default)]
    pub photos: Vec<Photo>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub address: Option<Address>,
    #[serde(default)]
    pub price: Option<f64>,
}

impl PropertyRef {
    fn image(&self) -> String {
        self.photos
            .first()
            .map_or(PLACEHOLDER_IMAGE, |p| p.url.as_str())
            .to_string()
    }

    fn title(&self) -> String {
        non_empty(self.title.as_deref()).unwrap_or(UNTITLED).to_string()
    }

    fn street(&self) -> String {
        non_empty(self.address.as_ref().map(|a| a.address.as_str()))
            .unwrap_or(NOT_AVAILABLE)
            .to_string()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingItem {
    #[serde(default)]
    pub property: Option<PropertyRef>,
    #[serde(default)]
    pub status: Option<ReservationStatus>,
    #[serde(default, with = "dates::lenient_opt")]
    pub check_in: Option<NaiveDate>,
    #[serde(default, with = "dates::lenient_opt")]
    pub check_out: Option<NaiveDate>,
    #[serde(default)]
    pub guest: Option<String>,
    #[serde(default)]
    pub rent: Option<f64>,
}

/// The user's reservations, grouped the way the backend reports them.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BookingGroups {
    #[serde(default)]
    pub pending: Vec<BookingItem>,
    #[serde(rename = "ConfirmedBookings", default)]
    pub confirmed: Vec<BookingItem>,
    #[serde(default)]
    pub completed: Vec<BookingItem>,
    #[serde(default)]
    pub hosting: Vec<BookingItem>,
    #[serde(default)]
    pub fail: Vec<BookingItem>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserDetails {
    #[serde(default)]
    pub user: User,
    #[serde(default)]
    pub watchlist: Vec<PropertyRef>,
    #[serde(default)]
    pub bookings: BookingGroups,
}

/// Payload of a profile update.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ProfileUpdate {
    pub full_name: String,
    pub email: String,
    pub phone: String,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub profile_img: Option<String>,
}

impl ProfileUpdate {
    /// Start from the current profile so unchanged fields are sent back as-is.
    pub fn from_user(user: &User) -> Self {
        Self {
            full_name: user.full_name.clone(),
            email: user.email.clone(),
            phone: user.phone.clone(),
            location: user.location.clone().unwrap_or_default(),
            image: None,
            profile_img: user.profile_img.clone(),
        }
    }
}

/// A reservation flattened for display.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BookingCard {
    pub image_uri: String,
    pub title: String,
    pub status: String,
    pub location: String,
    pub address: String,
    pub start_date: String,
    pub end_date: String,
    pub guest_name: String,
    pub price: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SavedPropertyCard {
    pub image_uri: String,
    pub title: String,
    pub address: String,
    pub city: String,
    pub price: String,
}

fn non_empty(s: Option<&str>) -> Option<&str> {
    s.filter(|v| !v.trim().is_empty())
}

fn format_amount(amount: Option<f64>) -> String {
    format!("{} AED", amount.unwrap_or(0.0))
}

fn card_date(date: Option<NaiveDate>) -> String {
    date.map_or_else(|| NOT_AVAILABLE.to_string(), dates::display_long)
}

fn booking_card(item: &BookingItem, default_status: &ReservationStatus) -> BookingCard {
    let property = item.property.clone().unwrap_or_default();
    BookingCard {
        image_uri: property.image(),
        title: property.title(),
        status: item.status.as_ref().unwrap_or(default_status).to_string(),
        location: format!(
            "{}, {}",
            non_empty(property.city.as_deref()).unwrap_or(NOT_AVAILABLE),
            non_empty(property.country.as_deref()).unwrap_or(NOT_AVAILABLE)
        ),
        address: property.street(),
        start_date: card_date(item.check_in),
        end_date: card_date(item.check_out),
        guest_name: non_empty(item.guest.as_deref())
            .unwrap_or(NOT_AVAILABLE)
            .to_string(),
        price: format_amount(item.rent),
    }
}

impl UserDetails {
    /// Upcoming stays: pending first, then confirmed.
    pub fn booking_cards(&self) -> Vec<BookingCard> {
        self.bookings
            .pending
            .iter()
            .chain(&self.bookings.confirmed)
            .map(|b| booking_card(b, &ReservationStatus::Pending))
            .collect()
    }

    pub fn history_cards(&self) -> Vec<BookingCard> {
        self.bookings
            .completed
            .iter()
            .map(|b| booking_card(b, &ReservationStatus::Completed))
            .collect()
    }

    pub fn saved_cards(&self) -> Vec<SavedPropertyCard> {
        self.watchlist
            .iter()
            .map(|p| SavedPropertyCard {
                image_uri: p.image(),
                title: p.title(),
                address: p.street(),
                city: non_empty(p.city.as_deref())
                    .unwrap_or(NOT_AVAILABLE)
                    .to_string(),
                price: format_amount(p.price),
            })
            .collect()
    }
}

impl std::fmt::Display for BookingCard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "**{}** [{}]", self.title, self.status)?;
        writeln!(f, "   {} | {}", self.location, self.address)?;
        writeln!(
            f,
            "   {} -> {} | Guest: {} | {}",
            self.start_date, self.end_date, self.guest_name, self.price
        )
    }
}

impl std::fmt::Display for UserDetails {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let user = &self.user;
        writeln!(f, "# {}", non_empty(Some(user.full_name.as_str())).unwrap_or("Guest"))?;
        writeln!(f, "Email: {}", user.email)?;
        if !user.phone.is_empty() {
            writeln!(f, "Phone: {}", user.phone)?;
        }
        writeln!(
            f,
            "Location: {}",
            non_empty(user.location.as_deref()).unwrap_or("NA")
        )?;
        if let Some(joined) = user.created_at {
            writeln!(f, "Member since: {}", dates::display_long(joined))?;
        }

        let bookings = self.booking_cards();
        writeln!(f, "\n## Bookings ({})", bookings.len())?;
        for card in &bookings {
            write!(f, "{card}")?;
        }
        let saved = self.saved_cards();
        writeln!(f, "\n## Saved ({})", saved.len())?;
        for card in &saved {
            writeln!(
                f,
                "**{}** | {}, {} | {}",
                card.title, card.address, card.city, card.price
            )?;
        }
        let history = self.history_cards();
        writeln!(f, "\n## History ({})", history.len())?;
        for card in &history {
            write!(f, "{card}")?;
        }
        Ok(())
    }
}
