use serde::{Deserialize, Deserializer, Serialize};

use super::price_table::{DailyPriceEntry, DailyPriceTable};
use crate::error::{BookingError, Result};

pub const PLACEHOLDER_IMAGE: &str = "https://via.placeholder.com/150";
pub const DEFAULT_GUEST_CAPACITY: u32 = 3;
const DESCRIPTION_PREVIEW_CHARS: usize = 100;

/// Rules shown when the host has not filled in any terms.
pub const DEFAULT_HOUSE_RULES: [&str; 3] =
    ["No pets allowed", "Maximum 2 guests", "No unregistered guests"];

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Address {
    #[serde(default)]
    pub address: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Photo {
    pub url: String,
}

/// What the host allows. Missing flags read as "not allowed".
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[allow(clippy::struct_excessive_bools)]
pub struct HouseTerms {
    #[serde(default)]
    pub pets: bool,
    #[serde(default)]
    pub smoking: bool,
    #[serde(default)]
    pub party: bool,
    #[serde(default)]
    pub children: bool,
    #[serde(default)]
    pub drinking: bool,
}

/// A property record as returned by the backend.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Property {
    #[serde(rename = "_id", default)]
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub address: Option<Address>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub price: Option<f64>,
    #[serde(default)]
    pub rating: Option<f64>,
    #[serde(default)]
    pub reviews: Option<u32>,
    #[serde(rename = "guest_no", default)]
    pub guest_no: Option<u32>,
    #[serde(default)]
    pub bathrooms: Option<f64>,
    #[serde(default)]
    pub room_type: Option<String>,
    #[serde(default)]
    pub superhost: Option<bool>,
    #[serde(default, deserialize_with = "amenity_names")]
    pub amenities: Vec<String>,
    #[serde(rename = "Check_in_time", default)]
    pub check_in_time: Option<String>,
    #[serde(rename = "Check_out_time", default)]
    pub check_out_time: Option<String>,
    #[serde(default)]
    pub cancellation_policy: Option<String>,
    #[serde(default)]
    pub term: Option<HouseTerms>,
    #[serde(default)]
    pub photos: Vec<Photo>,
    #[serde(default)]
    pub daily_prices: Vec<DailyPriceEntry>,
    #[serde(default)]
    pub cleaning_fee: Option<f64>,
}

/// Amenities arrive either as plain strings or as `{ "name": ... }` objects.
fn amenity_names<'de, D: Deserializer<'de>>(d: D) -> std::result::Result<Vec<String>, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Amenity {
        Name(String),
        Object { name: String },
    }
    let raw = Option::<Vec<Amenity>>::deserialize(d)?.unwrap_or_default();
    Ok(raw
        .into_iter()
        .map(|a| match a {
            Amenity::Name(n) | Amenity::Object { name: n } => n,
        })
        .collect())
}

impl Property {
    /// Maximum number of guests; the backend omits it for some listings.
    pub fn guest_capacity(&self) -> u32 {
        self.guest_no.filter(|n| *n > 0).unwrap_or(DEFAULT_GUEST_CAPACITY)
    }

    pub fn cleaning_fee(&self) -> f64 {
        self.cleaning_fee.unwrap_or(0.0).max(0.0)
    }

    pub fn price_table(&self) -> DailyPriceTable {
        DailyPriceTable::from_entries(&self.daily_prices)
    }

    pub fn street_address(&self) -> &str {
        self.address.as_ref().map_or("", |a| a.address.as_str())
    }

    pub fn first_photo(&self) -> &str {
        self.photos.first().map_or(PLACEHOLDER_IMAGE, |p| p.url.as_str())
    }

    /// The six house-rule lines shown on the detail page, or the generic
    /// [`DEFAULT_HOUSE_RULES`] when the record has no terms.
    pub fn house_rules(&self) -> Vec<String> {
        let Some(term) = &self.term else {
            return DEFAULT_HOUSE_RULES.iter().map(ToString::to_string).collect();
        };
        let rule = |allowed: bool, yes: &str, no: &str| {
            if allowed { yes.to_string() } else { no.to_string() }
        };
        vec![
            rule(term.pets, "Pets allowed", "No pets allowed"),
            rule(term.smoking, "Smoking allowed", "No smoking"),
            rule(term.party, "Parties allowed", "No parties"),
            rule(term.children, "Children allowed", "No children"),
            rule(term.drinking, "Drinking allowed", "No drinking"),
            format!("Maximum {} guests", self.guest_capacity()),
        ]
    }

    /// First 100 characters of the description, with an ellipsis when cut.
    pub fn description_preview(&self) -> String {
        if self.description.chars().count() <= DESCRIPTION_PREVIEW_CHARS {
            return self.description.clone();
        }
        let cut: String = self
            .description
            .chars()
            .take(DESCRIPTION_PREVIEW_CHARS)
            .collect();
        format!("{cut}...")
    }
}

impl std::fmt::Display for Property {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "# {}", self.title)?;
        writeln!(f, "ID: {}", self.id)?;
        let street = self.street_address();
        if !street.is_empty() {
            writeln!(f, "Location: {street}")?;
        }
        if let Some(price) = self.price {
            writeln!(f, "Price: {price} AED/night")?;
        }
        if let Some(rating) = self.rating {
            write!(f, "Rating: {rating:.1}")?;
            if let Some(reviews) = self.reviews {
                write!(f, " ({reviews} reviews)")?;
            }
            if self.superhost == Some(true) {
                write!(f, " | Superhost")?;
            }
            writeln!(f)?;
        }
        write!(f, "Guests: {}", self.guest_capacity())?;
        if let Some(baths) = self.bathrooms {
            write!(f, " | Bathrooms: {baths}")?;
        }
        if let Some(ref room) = self.room_type {
            write!(f, " | {room}")?;
        }
        writeln!(f)?;
        if let (Some(ci), Some(co)) = (&self.check_in_time, &self.check_out_time) {
            writeln!(f, "Check-in: {ci} | Check-out: {co}")?;
        }
        if let Some(ref policy) = self.cancellation_policy {
            writeln!(f, "Cancellation: {policy}")?;
        }
        if let Some(fee) = self.cleaning_fee {
            writeln!(f, "Cleaning fee: {fee:.0} AED")?;
        }
        if !self.description.is_empty() {
            writeln!(f, "\n{}", self.description)?;
        }
        if !self.amenities.is_empty() {
            writeln!(f, "\n## Amenities ({})", self.amenities.len())?;
            for amenity in &self.amenities {
                writeln!(f, "- {amenity}")?;
            }
        }
        let rules = self.house_rules();
        if !rules.is_empty() {
            writeln!(f, "\n## House rules")?;
            for rule in rules {
                writeln!(f, "- {rule}")?;
            }
        }
        Ok(())
    }
}

/// Listing filters for the property catalogue.
#[derive(Debug, Clone, Default)]
pub struct PropertyFilters {
    pub address: Option<String>,
    pub city: Option<String>,
    pub bedrooms: Option<String>,
    pub category: Option<String>,
    pub area: Option<String>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

impl PropertyFilters {
    pub const DEFAULT_PAGE: u32 = 1;
    pub const DEFAULT_LIMIT: u32 = 5;
    pub const MAX_LIMIT: u32 = 50;

    pub fn page(&self) -> u32 {
        self.page.unwrap_or(Self::DEFAULT_PAGE)
    }

    pub fn limit(&self) -> u32 {
        self.limit.unwrap_or(Self::DEFAULT_LIMIT)
    }

    pub fn validate(&self) -> Result<()> {
        if self.page() == 0 {
            return Err(BookingError::InvalidParams {
                reason: "page starts at 1".into(),
            });
        }
        if self.limit() == 0 || self.limit() > Self::MAX_LIMIT {
            return Err(BookingError::InvalidParams {
                reason: format!("limit must be between 1 and {}", Self::MAX_LIMIT),
            });
        }
        Ok(())
    }

    /// Query string pairs in the backend's bracketed `filters[...]` form.
    /// Every filter key is always sent, empty when unset.
    pub fn to_query_pairs(&self) -> Vec<(String, String)> {
        let field = |v: &Option<String>| v.as_deref().unwrap_or("").trim().to_string();
        vec![
            ("page".into(), self.page().to_string()),
            ("limit".into(), self.limit().to_string()),
            ("filters[address]".into(), field(&self.address)),
            ("filters[city]".into(), field(&self.city)),
            ("filters[bedrooms]".into(), field(&self.bedrooms)),
            ("filters[category]".into(), field(&self.category)),
            ("filters[area]".into(), field(&self.area)),
        ]
    }

    /// Stable key for the response cache.
    pub fn cache_key(&self) -> String {
        self.to_query_pairs()
            .into_iter()
            .map(|(k, v)| format!("{k}={}", v.to_lowercase()))
            .collect::<Vec<_>>()
            .join("&")
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    #[serde(default)]
    pub total_pages: u32,
}

/// One page of the property catalogue.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PropertyPage {
    #[serde(default)]
    pub properties: Vec<Property>,
    #[serde(default)]
    pub total: u32,
    #[serde(default)]
    pub page: u32,
    #[serde(default)]
    pub limit: u32,
    #[serde(default)]
    pub pagination: Option<Pagination>,
}

impl PropertyPage {
    pub fn total_pages(&self) -> u32 {
        match &self.pagination {
            Some(p) => p.total_pages,
            None if self.limit > 0 => self.total.div_ceil(self.limit),
            None => 0,
        }
    }

    /// Whether another page can be loaded after this one.
    pub fn has_more(&self) -> bool {
        self.page < self.total_pages()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn sample_json() -> &'static str {
        r#"{
            "_id": "p1",
            "title": "Marina View",
            "description": "Two bedrooms by the water",
            "address": {"address": "12 Marina Walk"},
            "city": "Dubai",
            "country": "UAE",
            "price": 450,
            "rating": 4.8,
            "reviews": 12,
            "guest_no": 4,
            "bathrooms": 2,
            "roomType": "Apartment",
            "superhost": true,
            "amenities": ["WiFi", {"name": "Pool"}],
            "Check_in_time": "15:00",
            "Check_out_time": "11:00",
            "cancellationPolicy": "Flexible",
            "term": {"pets": false, "smoking": false, "party": true, "children": true, "drinking": false},
            "photos": [{"url": "https://img.example/1.jpg"}],
            "dailyPrices": [{"date": "2025-06-01T00:00:00.000Z", "price": 100}],
            "cleaningFee": 50
        }"#
    }

    #[test]
    fn deserialize_full_record() {
        let p: Property = serde_json::from_str(sample_json()).unwrap();
        assert_eq!(p.id, "p1");
        assert_eq!(p.guest_capacity(), 4);
        assert_eq!(p.amenities, vec!["WiFi".to_string(), "Pool".to_string()]);
        assert_eq!(p.street_address(), "12 Marina Walk");
        assert_eq!(p.check_in_time.as_deref(), Some("15:00"));
        assert!((p.cleaning_fee() - 50.0).abs() < f64::EPSILON);
        assert_eq!(p.price_table().len(), 1);
        assert_eq!(p.first_photo(), "https://img.example/1.jpg");
    }

    #[test]
    fn sparse_record_uses_defaults() {
        let p: Property = serde_json::from_str(r#"{"_id":"p2"}"#).unwrap();
        assert_eq!(p.guest_capacity(), DEFAULT_GUEST_CAPACITY);
        assert!((p.cleaning_fee() - 0.0).abs() < f64::EPSILON);
        assert_eq!(p.first_photo(), PLACEHOLDER_IMAGE);
        assert_eq!(p.house_rules(), DEFAULT_HOUSE_RULES.to_vec());
        assert!(p.price_table().is_empty());
    }

    #[test]
    fn house_rules_lines() {
        let p: Property = serde_json::from_str(sample_json()).unwrap();
        assert_eq!(
            p.house_rules(),
            vec![
                "No pets allowed",
                "No smoking",
                "Parties allowed",
                "Children allowed",
                "No drinking",
                "Maximum 4 guests",
            ]
        );
    }

    #[test]
    fn description_preview_truncates() {
        let p = Property {
            description: "x".repeat(150),
            ..Default::default()
        };
        let preview = p.description_preview();
        assert_eq!(preview.len(), 103);
        assert!(preview.ends_with("..."));

        let short = Property {
            description: "short".into(),
            ..Default::default()
        };
        assert_eq!(short.description_preview(), "short");
    }

    #[test]
    fn display_contains_key_fields() {
        let p: Property = serde_json::from_str(sample_json()).unwrap();
        let s = p.to_string();
        assert!(s.contains("# Marina View"));
        assert!(s.contains("Superhost"));
        assert!(s.contains("Guests: 4"));
        assert!(s.contains("- Pool"));
        assert!(s.contains("Maximum 4 guests"));
    }

    #[test]
    fn filters_defaults_and_query_pairs() {
        let f = PropertyFilters {
            city: Some("Dubai".into()),
            ..Default::default()
        };
        let pairs = f.to_query_pairs();
        assert_eq!(pairs[0], ("page".to_string(), "1".to_string()));
        assert_eq!(pairs[1], ("limit".to_string(), "5".to_string()));
        assert!(pairs.contains(&("filters[city]".to_string(), "Dubai".to_string())));
        assert!(pairs.contains(&("filters[area]".to_string(), String::new())));
    }

    #[test]
    fn filters_validation() {
        assert!(PropertyFilters::default().validate().is_ok());
        let zero_page = PropertyFilters {
            page: Some(0),
            ..Default::default()
        };
        assert!(zero_page.validate().is_err());
        let huge = PropertyFilters {
            limit: Some(500),
            ..Default::default()
        };
        assert!(huge.validate().is_err());
    }

    #[test]
    fn cache_key_is_case_insensitive() {
        let a = PropertyFilters {
            city: Some("Dubai".into()),
            ..Default::default()
        };
        let b = PropertyFilters {
            city: Some("dubai".into()),
            ..Default::default()
        };
        assert_eq!(a.cache_key(), b.cache_key());
    }

    #[test]
    fn page_has_more() {
        let page: PropertyPage = serde_json::from_str(
            r#"{"properties":[],"total":12,"page":1,"limit":5,"pagination":{"totalPages":3}}"#,
        )
        .unwrap();
        assert_eq!(page.total_pages(), 3);
        assert!(page.has_more());

        let last = PropertyPage {
            total: 12,
            page: 3,
            limit: 5,
            ..Default::default()
        };
        assert_eq!(last.total_pages(), 3);
        assert!(!last.has_more());
    }
}
