use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Method, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, info, trace, warn};
use url::Url;

use super::envelope;
use crate::config::types::{ApiConfig, CacheConfig};
use crate::domain::checkout::ReservationRequest;
use crate::domain::profile::{ProfileUpdate, UserDetails};
use crate::domain::property::{Property, PropertyFilters, PropertyPage};
use crate::domain::reservation::Reservation;
use crate::error::{BookingError, Result};
use crate::ports::booking_api::BookingApi;
use crate::ports::cache::ResponseCache;
use crate::ports::session::TokenStore;

const PROPERTIES_PATH: &str = "api/v1/property/property";
const PROPERTY_DETAIL_PATH: &str = "api/v1/property/property/special";
const BOOKING_PATH: &str = "api/v1/booking";
const RESERVE_PATH: &str = "api/v1/booking/reserve";
const USER_DETAILS_PATH: &str = "api/v1/bookinguser/get-user-details";
const UPDATE_USER_PATH: &str = "api/v1/bookinguser/update";

const USER_DETAILS_KEY: &str = "user:details";
const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(2);

fn reservations_key(property_id: &str) -> String {
    format!("reservations:{property_id}")
}

/// One outgoing call and the message to report if the backend gives none.
struct Call {
    method: Method,
    url: Url,
    body: Option<serde_json::Value>,
    fallback: &'static str,
}

/// REST client for the booking backend.
///
/// Adds the bearer token from the token store to every call, clears the
/// tokens when the backend answers 401, and caches reads for the configured
/// stale period.
pub struct RestBookingClient {
    http: Client,
    base_url: Url,
    max_retries: u32,
    retry_delay: Duration,
    cache: Arc<dyn ResponseCache>,
    stale: Duration,
    tokens: Arc<dyn TokenStore>,
}

impl RestBookingClient {
    pub fn new(
        config: &ApiConfig,
        cache_config: &CacheConfig,
        cache: Arc<dyn ResponseCache>,
        tokens: Arc<dyn TokenStore>,
    ) -> Result<Self> {
        let http = Client::builder()
            .user_agent(&config.user_agent)
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;
        let base_url = Url::parse(&config.base_url)?;
        if base_url.cannot_be_a_base() {
            return Err(BookingError::Config(format!(
                "api.base_url is not a base URL: {}",
                config.base_url
            )));
        }

        Ok(Self {
            http,
            base_url,
            max_retries: config.max_retries,
            retry_delay: DEFAULT_RETRY_DELAY,
            cache,
            stale: Duration::from_secs(cache_config.stale_secs),
            tokens,
        })
    }

    /// Base delay between retries; attempt `n` waits `n` times this.
    #[must_use]
    pub fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }

    fn endpoint(&self, path: &str, tail: &[&str]) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| BookingError::Config("api.base_url cannot carry a path".into()))?
            .pop_if_empty()
            .extend(path.split('/'))
            .extend(tail);
        Ok(url)
    }

    fn cached<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let raw = self.cache.get(key)?;
        match serde_json::from_str(&raw) {
            Ok(value) => {
                debug!(key, "Cache hit");
                Some(value)
            }
            Err(e) => {
                warn!(key, error = %e, "Dropping unreadable cache entry");
                self.cache.invalidate(key);
                None
            }
        }
    }

    fn store<T: Serialize>(&self, key: &str, value: &T) {
        if let Ok(json) = serde_json::to_string(value) {
            self.cache.set(key, &json, self.stale);
        }
    }

    /// Send a call, retrying transport failures and 5xx answers.
    ///
    /// Only idempotent methods are retried; a POST is sent exactly once.
    async fn send(&self, call: Call) -> Result<String> {
        let retries = if call.method == Method::POST {
            0
        } else {
            self.max_retries
        };
        debug!(method = %call.method, url = %call.url, "Backend request");

        let mut last_error = None;
        for attempt in 0..=retries {
            if attempt > 0 {
                let delay = self.retry_delay * attempt;
                debug!(attempt, delay_ms = delay.as_millis(), "Retrying request");
                tokio::time::sleep(delay).await;
            }

            let mut request = self.http.request(call.method.clone(), call.url.clone());
            if let Some(token) = self.tokens.access_token() {
                request = request.bearer_auth(token);
            }
            if let Some(body) = &call.body {
                request = request.json(body);
            }

            match request.send().await {
                Ok(response) => {
                    let status = response.status();
                    let body = response.text().await?;
                    trace!(status = status.as_u16(), body = %body, "Backend response");
                    if status.is_success() {
                        return Ok(body);
                    }
                    if status == StatusCode::UNAUTHORIZED {
                        warn!(url = %call.url, "Backend answered 401, clearing stored tokens");
                        self.tokens.clear_tokens();
                        self.cache.invalidate(USER_DETAILS_KEY);
                        return Err(BookingError::Unauthorized);
                    }
                    let error = BookingError::Api {
                        status: status.as_u16(),
                        message: envelope::message_of(&body)
                            .unwrap_or_else(|| call.fallback.to_string()),
                    };
                    if status.is_client_error() {
                        return Err(error);
                    }
                    warn!(status = status.as_u16(), attempt, "Backend error");
                    last_error = Some(error);
                }
                Err(e) => {
                    warn!(error = %e, attempt, "HTTP request failed");
                    last_error = Some(BookingError::Http(e));
                }
            }
        }

        Err(last_error.unwrap_or_else(|| BookingError::Api {
            status: 0,
            message: call.fallback.to_string(),
        }))
    }

    async fn get(&self, url: Url, fallback: &'static str) -> Result<String> {
        self.send(Call {
            method: Method::GET,
            url,
            body: None,
            fallback,
        })
        .await
    }
}

#[async_trait]
impl BookingApi for RestBookingClient {
    async fn list_properties(&self, filters: &PropertyFilters) -> Result<PropertyPage> {
        filters.validate()?;

        let cache_key = format!("properties:{}", filters.cache_key());
        if let Some(page) = self.cached::<PropertyPage>(&cache_key) {
            return Ok(page);
        }

        let mut url = self.endpoint(PROPERTIES_PATH, &[])?;
        url.query_pairs_mut().extend_pairs(filters.to_query_pairs());
        let body = self.get(url, "Failed to fetch properties!").await?;
        let page: PropertyPage = envelope::unwrap_data(&body, "list properties")?;

        self.store(&cache_key, &page);
        Ok(page)
    }

    async fn get_property(&self, id: &str) -> Result<Property> {
        if id.trim().is_empty() {
            return Err(BookingError::MissingPropertyId);
        }
        let cache_key = format!("property:{id}");
        if let Some(property) = self.cached::<Property>(&cache_key) {
            return Ok(property);
        }

        let url = self.endpoint(PROPERTY_DETAIL_PATH, &[id])?;
        let body = match self.get(url, "Failed to fetch property!").await {
            Err(BookingError::Api { status: 404, .. }) => {
                return Err(BookingError::PropertyNotFound { id: id.to_string() });
            }
            other => other?,
        };
        let property: Property = envelope::unwrap_data(&body, "property detail")?;

        self.store(&cache_key, &property);
        Ok(property)
    }

    async fn get_property_reservations(&self, property_id: &str) -> Result<Vec<Reservation>> {
        if property_id.trim().is_empty() {
            return Err(BookingError::MissingPropertyId);
        }
        let cache_key = reservations_key(property_id);
        if let Some(list) = self.cached::<Vec<Reservation>>(&cache_key) {
            return Ok(list);
        }

        let url = self.endpoint(BOOKING_PATH, &[property_id, "bookings"])?;
        let body = self.get(url, "Failed to fetch booking Details!").await?;
        let list = envelope::reservations(&body)?;
        debug!(property_id, count = list.len(), "Reservations fetched");

        self.store(&cache_key, &list);
        Ok(list)
    }

    async fn reserve(&self, request: &ReservationRequest) -> Result<String> {
        let url = self.endpoint(RESERVE_PATH, &[])?;
        let body = self
            .send(Call {
                method: Method::POST,
                url,
                body: Some(serde_json::to_value(request)?),
                fallback: "Reserving failed!",
            })
            .await?;

        self.cache.invalidate(&reservations_key(&request.property));
        self.cache.invalidate(USER_DETAILS_KEY);

        let message =
            envelope::message_of(&body).unwrap_or_else(|| "Reservation created".to_string());
        info!(property_id = %request.property, %message, "Reservation accepted by backend");
        Ok(message)
    }

    async fn get_user_details(&self) -> Result<UserDetails> {
        if let Some(details) = self.cached::<UserDetails>(USER_DETAILS_KEY) {
            return Ok(details);
        }

        let url = self.endpoint(USER_DETAILS_PATH, &[])?;
        let body = self.get(url, "Failed to fetch userDetails!").await?;
        let details: UserDetails = envelope::unwrap_data(&body, "user details")?;

        self.store(USER_DETAILS_KEY, &details);
        Ok(details)
    }

    async fn update_user_details(&self, update: &ProfileUpdate) -> Result<UserDetails> {
        let url = self.endpoint(UPDATE_USER_PATH, &[])?;
        self.send(Call {
            method: Method::PUT,
            url,
            body: Some(serde_json::to_value(update)?),
            fallback: "Editing user details failed!",
        })
        .await?;

        self.cache.invalidate(USER_DETAILS_KEY);
        self.get_user_details().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::cache::memory_cache::MemoryCache;
    use crate::adapters::session::memory_store::MemoryTokenStore;

    fn client(base_url: &str) -> Result<RestBookingClient> {
        let config = ApiConfig {
            base_url: base_url.into(),
            ..ApiConfig::default()
        };
        RestBookingClient::new(
            &config,
            &CacheConfig::default(),
            Arc::new(MemoryCache::new(10)),
            Arc::new(MemoryTokenStore::default()),
        )
    }

    #[test]
    fn endpoint_joins_segments() {
        let c = client("http://localhost:8000").unwrap();
        let url = c.endpoint(BOOKING_PATH, &["p1", "bookings"]).unwrap();
        assert_eq!(url.as_str(), "http://localhost:8000/api/v1/booking/p1/bookings");
    }

    #[test]
    fn endpoint_keeps_base_path() {
        let c = client("https://example.com/backend/").unwrap();
        let url = c.endpoint(PROPERTY_DETAIL_PATH, &["abc"]).unwrap();
        assert_eq!(
            url.as_str(),
            "https://example.com/backend/api/v1/property/property/special/abc"
        );
    }

    #[test]
    fn endpoint_escapes_ids() {
        let c = client("http://localhost:8000").unwrap();
        let url = c.endpoint(PROPERTY_DETAIL_PATH, &["a/b"]).unwrap();
        assert!(url.as_str().ends_with("/special/a%2Fb"));
    }

    #[test]
    fn rejects_non_base_url() {
        assert!(matches!(
            client("mailto:someone@example.com"),
            Err(BookingError::Config(_))
        ));
        assert!(matches!(client("not a url"), Err(BookingError::Url(_))));
    }
}
