use chrono::FixedOffset;
use fabriq_common::{ConfigLoader, ConfigurationError};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Service identity configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    pub name: String,
    /// Deployment environment (e.g. "development", "production")
    pub environment: String,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            name: "fabriq-billing".to_string(),
            environment: "development".to_string(),
        }
    }
}

/// HTTP listener configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    pub listen_address: String,
    pub port: u16,
    /// Per-request timeout in seconds
    pub request_timeout: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            listen_address: "0.0.0.0".to_string(),
            port: 8082,
            request_timeout: 30,
        }
    }
}

/// Makerspace-wide settings the engine depends on
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MakerspaceConfig {
    /// Local UTC offset, RFC 3339 style (e.g. "+02:00"). Daily spending
    /// caps reset at this timezone's midnight.
    pub timezone_offset: String,
    /// ISO 4217 currency code; amounts themselves are currency-agnostic.
    pub currency: String,
}

impl Default for MakerspaceConfig {
    fn default() -> Self {
        Self {
            timezone_offset: "+00:00".to_string(),
            currency: "EUR".to_string(),
        }
    }
}

/// Main configuration structure for the billing service
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct BillingConfig {
    pub service: ServiceConfig,
    pub http: HttpConfig,
    pub makerspace: MakerspaceConfig,
}

impl ConfigLoader<BillingConfig> for BillingConfig {
    fn env_prefix() -> &'static str {
        "FABRIQ_BILLING_"
    }
}

impl BillingConfig {
    /// Load configuration from file and environment
    pub fn load(config_path: Option<&Path>) -> Result<Self, ConfigurationError> {
        <Self as ConfigLoader<Self>>::load(config_path)
    }

    /// Generate example configuration file
    pub fn generate_example() -> Result<String, ConfigurationError> {
        <Self as ConfigLoader<Self>>::generate_example()
    }

    /// The makerspace's local timezone as a fixed UTC offset.
    pub fn timezone(&self) -> Result<FixedOffset, ConfigurationError> {
        self.makerspace
            .timezone_offset
            .parse::<FixedOffset>()
            .map_err(|e| ConfigurationError::InvalidValue {
                field: "makerspace.timezone_offset".to_string(),
                details: format!("{e} (expected an offset like \"+02:00\")"),
            })
    }

    /// Get request timeout as Duration
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.http.request_timeout)
    }
}
