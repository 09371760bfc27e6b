use std::collections::HashMap;
use std::fmt::Write as _;
use std::sync::Arc;
use tokio::sync::RwLock;

use chrono::{Days, NaiveDate, Utc};
use rmcp::{
    ErrorData as McpError, RoleServer, ServerHandler,
    handler::server::{router::tool::ToolRouter, wrapper::Parameters},
    model::{
        CallToolResult, Content, Implementation, ListResourceTemplatesResult, ListResourcesResult,
        PaginatedRequestParams, ProtocolVersion, RawResource, RawResourceTemplate,
        ReadResourceRequestParams, ReadResourceResult, Resource, ResourceContents,
        ResourceTemplate, ServerCapabilities, ServerInfo,
    },
    schemars,
    service::RequestContext,
    tool, tool_handler, tool_router,
};

use crate::config::types::PricingConfig;
use crate::domain::checkout::CheckoutSession;
use crate::domain::dates;
use crate::domain::profile::ProfileUpdate;
use crate::domain::property::PropertyFilters;
use crate::domain::session::Session;
use crate::error::{BookingError, Result as BookingResult};
use crate::ports::booking_api::BookingApi;

const DEFAULT_AVAILABILITY_DAYS: u32 = 30;
const MAX_AVAILABILITY_DAYS: u32 = 365;

// ---------- Resource Store ----------

/// Text rendered by earlier tool calls, exposed as MCP resources under
/// `booking://` URIs.
#[derive(Clone, Default)]
pub struct ResourceStore {
    entries: Arc<RwLock<HashMap<String, ResourceEntry>>>,
}

#[derive(Clone)]
struct ResourceEntry {
    name: String,
    text: String,
}

impl ResourceStore {
    async fn insert(&self, uri: impl Into<String>, name: impl Into<String>, text: String) {
        self.entries.write().await.insert(
            uri.into(),
            ResourceEntry {
                name: name.into(),
                text,
            },
        );
    }

    async fn get(&self, uri: &str) -> Option<ResourceEntry> {
        self.entries.read().await.get(uri).cloned()
    }

    async fn list(&self) -> Vec<(String, String)> {
        let mut entries: Vec<_> = self
            .entries
            .read()
            .await
            .iter()
            .map(|(uri, entry)| (uri.clone(), entry.name.clone()))
            .collect();
        entries.sort();
        entries
    }
}

impl std::fmt::Debug for ResourceStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResourceStore").finish()
    }
}

// ---------- Tool parameter types ----------

#[derive(Debug, Default, serde::Deserialize, schemars::JsonSchema)]
pub struct SearchToolParams {
    /// Street address filter
    pub address: Option<String>,
    /// City filter (e.g. "Dubai")
    pub city: Option<String>,
    /// Number of bedrooms filter
    pub bedrooms: Option<String>,
    /// Property category filter (e.g. "Apartment", "Villa")
    pub category: Option<String>,
    /// Area or neighbourhood filter
    pub area: Option<String>,
    /// Page number, starting at 1 (default: 1)
    pub page: Option<u32>,
    /// Results per page, 1-50 (default: 5)
    pub limit: Option<u32>,
}

#[derive(Debug, serde::Deserialize, schemars::JsonSchema)]
pub struct PropertyToolParams {
    /// Property ID from booking_search_properties
    pub id: String,
}

#[derive(Debug, serde::Deserialize, schemars::JsonSchema)]
pub struct AvailabilityToolParams {
    /// Property ID
    pub id: String,
    /// First day of the window (YYYY-MM-DD, default: today)
    pub start: Option<String>,
    /// Number of days to show (1-365, default: 30)
    pub days: Option<u32>,
}

#[derive(Debug, serde::Deserialize, schemars::JsonSchema)]
pub struct StayToolParams {
    /// Property ID
    pub id: String,
    /// Check-in date (YYYY-MM-DD)
    pub check_in: String,
    /// Check-out date (YYYY-MM-DD), the morning the guest leaves
    pub check_out: String,
    /// Number of guests (default: 1, capped at the property's capacity)
    pub guests: Option<u32>,
}

#[derive(Debug, Default, serde::Deserialize, schemars::JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct UpdateProfileToolParams {
    /// New full name
    pub full_name: Option<String>,
    /// New email address
    pub email: Option<String>,
    /// New phone number
    pub phone: Option<String>,
    /// New location
    pub location: Option<String>,
    /// URL of a new profile image
    pub profile_img: Option<String>,
}

impl UpdateProfileToolParams {
    fn is_empty(&self) -> bool {
        self.full_name.is_none()
            && self.email.is_none()
            && self.phone.is_none()
            && self.location.is_none()
            && self.profile_img.is_none()
    }

    fn apply(self, update: &mut ProfileUpdate) {
        if let Some(v) = self.full_name {
            update.full_name = v;
        }
        if let Some(v) = self.email {
            update.email = v;
        }
        if let Some(v) = self.phone {
            update.phone = v;
        }
        if let Some(v) = self.location {
            update.location = v;
        }
        if let Some(v) = self.profile_img {
            update.profile_img = Some(v);
        }
    }
}

// ---------- MCP Server ----------

fn failure(context: &str, e: &BookingError) -> CallToolResult {
    if e.is_user_error() {
        tracing::debug!(error = %e, "{context}");
    } else {
        tracing::warn!(error = %e, "{context}");
    }
    let hint = match e {
        BookingError::Unauthorized => {
            " Set STAY_BOOKING_TOKEN to a valid access token and restart the server."
        }
        BookingError::PropertyNotFound { .. } | BookingError::MissingPropertyId => {
            " Use booking_search_properties to find valid property IDs."
        }
        BookingError::Selection(_) => " Use booking_availability to see which dates are free.",
        _ => "",
    };
    CallToolResult::error(vec![Content::text(format!("{context}: {e}.{hint}"))])
}

#[derive(Clone)]
pub struct BookingMcpServer {
    api: Arc<dyn BookingApi>,
    session: Arc<RwLock<Session>>,
    pricing: PricingConfig,
    tool_router: ToolRouter<Self>,
    resources: ResourceStore,
}

#[tool_router]
impl BookingMcpServer {
    pub fn new(api: Arc<dyn BookingApi>, session: Session, pricing: PricingConfig) -> Self {
        Self {
            api,
            session: Arc::new(RwLock::new(session)),
            pricing,
            tool_router: Self::tool_router(),
            resources: ResourceStore::default(),
        }
    }

    /// Open a checkout for the property and pick the requested stay.
    async fn checkout_for(&self, params: &StayToolParams) -> BookingResult<CheckoutSession> {
        let check_in = dates::parse_calendar_date(&params.check_in)?;
        let check_out = dates::parse_calendar_date(&params.check_out)?;
        let mut checkout =
            CheckoutSession::load(self.api.as_ref(), &params.id, self.pricing.fee_schedule(0.0))
                .await?;
        checkout.select_date(check_in)?;
        checkout.select_date(check_out)?;
        checkout.set_guests(params.guests.unwrap_or(1));
        Ok(checkout)
    }

    /// Make sure the session knows who the user is, asking the backend once.
    async fn identified_session(&self) -> BookingResult<Session> {
        {
            let session = self.session.read().await;
            if session.user_id.is_some() {
                return Ok(session.clone());
            }
        }
        let details = self.api.get_user_details().await?;
        let mut session = self.session.write().await;
        session.identify(&details.user);
        Ok(session.clone())
    }

    #[tool(
        name = "booking_search_properties",
        description = "Browse the property catalogue with optional address, city, bedrooms, category and area filters. Results are paginated (default 5 per page). Returns property IDs for the other tools.",
        annotations(read_only_hint = true, open_world_hint = true)
    )]
    async fn booking_search_properties(
        &self,
        Parameters(params): Parameters<SearchToolParams>,
    ) -> Result<CallToolResult, McpError> {
        let filters = PropertyFilters {
            address: params.address,
            city: params.city,
            bedrooms: params.bedrooms,
            category: params.category,
            area: params.area,
            page: params.page,
            limit: params.limit,
        };

        match self.api.list_properties(&filters).await {
            Ok(page) => {
                let mut text = String::new();
                if page.properties.is_empty() {
                    text.push_str("No properties match these filters.\n");
                } else {
                    let _ = writeln!(
                        text,
                        "Page {} of {} ({} properties):\n",
                        page.page.max(1),
                        page.total_pages().max(1),
                        page.total
                    );
                    for (i, property) in page.properties.iter().enumerate() {
                        let _ = write!(
                            text,
                            "{}. **{}** (ID: {})",
                            i + 1,
                            property.title,
                            property.id
                        );
                        if let Some(price) = property.price {
                            let _ = write!(text, " | {price} {}/night", self.pricing.currency);
                        }
                        if let Some(rating) = property.rating {
                            let _ = write!(text, " | Rating: {rating:.1}");
                        }
                        let street = property.street_address();
                        if !street.is_empty() {
                            let _ = write!(text, "\n   {street}");
                        }
                        let _ = writeln!(text, "\n   {}\n", property.description_preview());
                    }
                    if page.has_more() {
                        let _ = writeln!(
                            text,
                            "More results available. Use page {} to see the next page.",
                            page.page + 1
                        );
                    }
                }
                let uri = format!("booking://search/{}", filters.cache_key());
                let name = format!("Search: page {}", filters.page());
                self.resources.insert(uri, name, text.clone()).await;
                Ok(CallToolResult::success(vec![Content::text(text)]))
            }
            Err(e) => Ok(failure("Property search failed", &e)),
        }
    }

    #[tool(
        name = "booking_property_details",
        description = "Get the full record of one property: description, capacity, amenities, check-in and check-out times, cancellation policy, house rules and cleaning fee.",
        annotations(read_only_hint = true, open_world_hint = true)
    )]
    async fn booking_property_details(
        &self,
        Parameters(params): Parameters<PropertyToolParams>,
    ) -> Result<CallToolResult, McpError> {
        match self.api.get_property(&params.id).await {
            Ok(property) => {
                let text = property.to_string();
                let uri = format!("booking://property/{}", params.id);
                let name = format!("Property: {}", property.title);
                self.resources.insert(uri, name, text.clone()).await;
                Ok(CallToolResult::success(vec![Content::text(text)]))
            }
            Err(e) => Ok(failure(
                &format!("Failed to get property '{}'", params.id),
                &e,
            )),
        }
    }

    #[tool(
        name = "booking_availability",
        description = "Show the nightly prices of a property and which days are already booked, for a window of days (default 30 from today). Check-in and check-out must both be free days, and check-out must be after check-in.",
        annotations(read_only_hint = true, open_world_hint = true)
    )]
    async fn booking_availability(
        &self,
        Parameters(params): Parameters<AvailabilityToolParams>,
    ) -> Result<CallToolResult, McpError> {
        let start = match params.start.as_deref().map(dates::parse_calendar_date) {
            Some(Ok(date)) => date,
            Some(Err(e)) => return Ok(failure("Invalid start date", &e)),
            None => Utc::now().date_naive(),
        };
        let days = params
            .days
            .unwrap_or(DEFAULT_AVAILABILITY_DAYS)
            .clamp(1, MAX_AVAILABILITY_DAYS);
        let end = start
            .checked_add_days(Days::new(u64::from(days)))
            .unwrap_or(NaiveDate::MAX);

        let checkout =
            match CheckoutSession::load(self.api.as_ref(), &params.id, self.pricing.fee_schedule(0.0))
                .await
            {
                Ok(c) => c,
                Err(e) => {
                    return Ok(failure(
                        &format!("Failed to load availability for '{}'", params.id),
                        &e,
                    ));
                }
            };

        let calendar = checkout.availability(start, end);
        let mut text = calendar.to_string();
        let _ = writeln!(
            text,
            "\nCleaning fee: {:.2} {} | Max guests: {}",
            checkout.fees().cleaning_fee,
            checkout.fees().currency,
            checkout.guest_capacity()
        );
        let uri = format!("booking://property/{}/availability", params.id);
        let name = format!("Availability: property {}", params.id);
        self.resources.insert(uri, name, text.clone()).await;
        Ok(CallToolResult::success(vec![Content::text(text)]))
    }

    #[tool(
        name = "booking_quote",
        description = "Price a stay: nights, room total from the daily prices, cleaning fee, service fee, VAT and tourism fee, and the grand total. Check-in and check-out must both be free days, and check-out must be after check-in; the nights in between are not checked.",
        annotations(read_only_hint = true, open_world_hint = true)
    )]
    async fn booking_quote(
        &self,
        Parameters(params): Parameters<StayToolParams>,
    ) -> Result<CallToolResult, McpError> {
        match self.checkout_for(&params).await {
            Ok(checkout) => {
                let quote = checkout.quote();
                let mut text = String::new();
                let _ = writeln!(
                    text,
                    "Quote for property {}: {} -> {} ({} guest{})\n",
                    params.id,
                    params.check_in,
                    params.check_out,
                    checkout.guests(),
                    if checkout.guests() == 1 { "" } else { "s" }
                );
                let _ = write!(text, "{quote}");
                if let Some(requested) = params.guests
                    && requested > checkout.guests()
                {
                    let _ = writeln!(
                        text,
                        "\nNote: this property hosts at most {} guests.",
                        checkout.guest_capacity()
                    );
                }
                Ok(CallToolResult::success(vec![Content::text(text)]))
            }
            Err(e) => Ok(failure("Could not price this stay", &e)),
        }
    }

    #[tool(
        name = "booking_reserve",
        description = "Reserve a stay for the signed-in user. The price sent is the grand total from booking_quote. Requires an access token.",
        annotations(destructive_hint = false, idempotent_hint = false, open_world_hint = true)
    )]
    async fn booking_reserve(
        &self,
        Parameters(params): Parameters<StayToolParams>,
    ) -> Result<CallToolResult, McpError> {
        let session = match self.identified_session().await {
            Ok(s) => s,
            Err(e) => return Ok(failure("Cannot reserve", &e)),
        };
        let mut checkout = match self.checkout_for(&params).await {
            Ok(c) => c,
            Err(e) => return Ok(failure("Cannot reserve", &e)),
        };
        let quote = checkout.quote();

        match checkout.reserve(self.api.as_ref(), &session).await {
            Ok(message) => {
                let mut text = String::new();
                let _ = writeln!(text, "{message}\n");
                let _ = writeln!(
                    text,
                    "Property {} | {} -> {} | {} guest(s)",
                    params.id,
                    params.check_in,
                    params.check_out,
                    checkout.guests()
                );
                let _ = write!(text, "{quote}");
                Ok(CallToolResult::success(vec![Content::text(text)]))
            }
            Err(e) => Ok(failure("Reservation failed", &e)),
        }
    }

    #[tool(
        name = "booking_profile",
        description = "Show the signed-in user's profile with upcoming bookings (pending and confirmed), saved properties and past stays. Requires an access token.",
        annotations(read_only_hint = true, open_world_hint = true)
    )]
    async fn booking_profile(&self) -> Result<CallToolResult, McpError> {
        match self.api.get_user_details().await {
            Ok(details) => {
                self.session.write().await.identify(&details.user);
                let text = details.to_string();
                self.resources
                    .insert("booking://profile", "Profile", text.clone())
                    .await;
                Ok(CallToolResult::success(vec![Content::text(text)]))
            }
            Err(e) => Ok(failure("Failed to load profile", &e)),
        }
    }

    #[tool(
        name = "booking_update_profile",
        description = "Change the signed-in user's name, email, phone, location or profile image. Fields left out keep their current value.",
        annotations(destructive_hint = false, idempotent_hint = true, open_world_hint = true)
    )]
    async fn booking_update_profile(
        &self,
        Parameters(params): Parameters<UpdateProfileToolParams>,
    ) -> Result<CallToolResult, McpError> {
        if params.is_empty() {
            return Ok(CallToolResult::error(vec![Content::text(
                "Nothing to update: pass at least one of full_name, email, phone, location, profile_img.",
            )]));
        }
        let current = match self.api.get_user_details().await {
            Ok(d) => d,
            Err(e) => return Ok(failure("Failed to load profile", &e)),
        };
        let mut update = ProfileUpdate::from_user(&current.user);
        params.apply(&mut update);

        match self.api.update_user_details(&update).await {
            Ok(details) => {
                self.session.write().await.identify(&details.user);
                let text = format!("Profile updated.\n\n{details}");
                self.resources
                    .insert("booking://profile", "Profile", details.to_string())
                    .await;
                Ok(CallToolResult::success(vec![Content::text(text)]))
            }
            Err(e) => Ok(failure("Profile update failed", &e)),
        }
    }
}

#[tool_handler]
impl ServerHandler for BookingMcpServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::LATEST,
            capabilities: ServerCapabilities::builder()
                .enable_tools()
                .enable_resources()
                .build(),
            server_info: Implementation::from_build_env(),
            instructions: Some(
                "Property booking server: browse properties, check availability, price and reserve stays.\n\
                 \n\
                 ## Tools\n\
                 - booking_search_properties: paginated catalogue with address/city/bedrooms/category/area filters\n\
                 - booking_property_details: full property record and house rules\n\
                 - booking_availability: daily prices and booked days for a window of dates\n\
                 - booking_quote: itemized price of a stay (room, cleaning, service, VAT, tourism fee)\n\
                 - booking_reserve: reserve a stay for the signed-in user\n\
                 - booking_profile: the user's bookings, saved properties and history\n\
                 - booking_update_profile: change name, email, phone, location or image\n\
                 \n\
                 ## Dates\n\
                 Stays are check-in inclusive and check-out exclusive: the check-out day is not a \
                 night of the stay, so it may fall on a day someone else checks in.\n\
                 \n\
                 ## Resources\n\
                 Text returned by the tools is kept as booking:// resources for later reference."
                    .into(),
            ),
        }
    }

    async fn list_resources(
        &self,
        _request: Option<PaginatedRequestParams>,
        _context: RequestContext<RoleServer>,
    ) -> Result<ListResourcesResult, McpError> {
        let resources: Vec<Resource> = self
            .resources
            .list()
            .await
            .into_iter()
            .map(|(uri, name)| Resource {
                annotations: None,
                raw: RawResource {
                    uri,
                    name,
                    title: None,
                    description: None,
                    mime_type: Some("text/plain".into()),
                    size: None,
                    icons: None,
                    meta: None,
                },
            })
            .collect();
        Ok(ListResourcesResult {
            resources,
            next_cursor: None,
            meta: None,
        })
    }

    async fn list_resource_templates(
        &self,
        _request: Option<PaginatedRequestParams>,
        _context: RequestContext<RoleServer>,
    ) -> Result<ListResourceTemplatesResult, McpError> {
        let template = |uri_template: &str, name: &str, description: &str| ResourceTemplate {
            annotations: None,
            raw: RawResourceTemplate {
                uri_template: uri_template.into(),
                name: name.into(),
                title: None,
                description: Some(description.into()),
                mime_type: Some("text/plain".into()),
                icons: None,
            },
        };
        Ok(ListResourceTemplatesResult {
            resource_templates: vec![
                template(
                    "booking://property/{id}",
                    "Property",
                    "Property record (fetched via booking_property_details)",
                ),
                template(
                    "booking://property/{id}/availability",
                    "Availability",
                    "Daily prices and booked days (fetched via booking_availability)",
                ),
                template(
                    "booking://search/{query}",
                    "Search Results",
                    "A page of the catalogue (fetched via booking_search_properties)",
                ),
                template(
                    "booking://profile",
                    "Profile",
                    "The user's profile and bookings (fetched via booking_profile)",
                ),
            ],
            next_cursor: None,
            meta: None,
        })
    }

    async fn read_resource(
        &self,
        request: ReadResourceRequestParams,
        _context: RequestContext<RoleServer>,
    ) -> Result<ReadResourceResult, McpError> {
        match self.resources.get(&request.uri).await {
            Some(entry) => Ok(ReadResourceResult {
                contents: vec![ResourceContents::text(entry.text, request.uri)],
            }),
            None => Err(McpError::resource_not_found(
                format!("resource not found: {}", request.uri),
                None,
            )),
        }
    }
}
