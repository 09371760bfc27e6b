use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::domain::pricing::{
    DEFAULT_CURRENCY, DEFAULT_SERVICE_FEE, DEFAULT_TOURIST_FEE_PER_NIGHT, DEFAULT_VAT_RATE,
    FeeSchedule,
};
use crate::error::{BookingError, Result};

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct Config {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub session: SessionConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub pricing: PricingConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ApiConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_timeout")]
    pub request_timeout_secs: u64,
    #[serde(default = "default_retries")]
    pub max_retries: u32,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            request_timeout_secs: default_timeout(),
            max_retries: default_retries(),
            user_agent: default_user_agent(),
        }
    }
}

/// Where tokens are kept between runs. In memory when no file is set.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct SessionConfig {
    #[serde(default)]
    pub token_file: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CacheConfig {
    #[serde(default = "default_max_entries")]
    pub max_entries: usize,
    /// How long a backend response is served before it is fetched again.
    #[serde(default = "default_stale_secs")]
    pub stale_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_entries: default_max_entries(),
            stale_secs: default_stale_secs(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PricingConfig {
    #[serde(default = "default_service_fee")]
    pub service_fee: f64,
    #[serde(default = "default_vat_rate")]
    pub vat_rate: f64,
    #[serde(default = "default_tourist_fee")]
    pub tourist_fee_per_night: f64,
    #[serde(default = "default_currency")]
    pub currency: String,
}

impl Default for PricingConfig {
    fn default() -> Self {
        Self {
            service_fee: default_service_fee(),
            vat_rate: default_vat_rate(),
            tourist_fee_per_night: default_tourist_fee(),
            currency: default_currency(),
        }
    }
}

impl PricingConfig {
    /// Fees and rates must be finite and non-negative.
    pub fn validate(&self) -> Result<()> {
        let fields = [
            ("service_fee", self.service_fee),
            ("vat_rate", self.vat_rate),
            ("tourist_fee_per_night", self.tourist_fee_per_night),
        ];
        for (name, value) in fields {
            if !value.is_finite() || value < 0.0 {
                return Err(BookingError::Config(format!(
                    "pricing.{name} must be a non-negative number, got {value}"
                )));
            }
        }
        Ok(())
    }

    /// Fees for one property. The cleaning fee is per property, the rest
    /// come from here.
    pub fn fee_schedule(&self, cleaning_fee: f64) -> FeeSchedule {
        FeeSchedule {
            cleaning_fee: 0.0,
            service_fee: self.service_fee,
            vat_rate: self.vat_rate,
            tourist_fee_per_night: self.tourist_fee_per_night,
            currency: self.currency.clone(),
        }
        .with_cleaning_fee(cleaning_fee)
    }
}

fn default_base_url() -> String {
    "http://localhost:8000".into()
}

fn default_timeout() -> u64 {
    10
}

fn default_retries() -> u32 {
    2
}

fn default_user_agent() -> String {
    concat!("stay-booking/", env!("CARGO_PKG_VERSION")).into()
}

fn default_max_entries() -> usize {
    500
}

fn default_stale_secs() -> u64 {
    300
}

fn default_service_fee() -> f64 {
    DEFAULT_SERVICE_FEE
}

fn default_vat_rate() -> f64 {
    DEFAULT_VAT_RATE
}

fn default_tourist_fee() -> f64 {
    DEFAULT_TOURIST_FEE_PER_NIGHT
}

fn default_currency() -> String {
    DEFAULT_CURRENCY.into()
}
