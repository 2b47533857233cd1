//! Server Configuration
//!
//! Every knob can be overridden through environment variables:
//!
//! | Variable | Default | Meaning |
//! |----------|---------|---------|
//! | WORK_DIR | ./data | Working directory (database, images, logs) |
//! | HTTP_PORT | 3000 | HTTP API port |
//! | PUBLIC_BASE_URL | http://localhost:3000/files | Base URL for stored images |
//! | PAYMENT_BASE_URL | http://localhost:9200 | Payment provider base URL |
//! | DEFAULT_CURRENCY | EUR | Currency for new variants and orders |
//! | FREE_SHIPPING_THRESHOLD | 3500 | Subtotal (minor units) above which shipping is free |
//! | SHIPPING_FEE | 495 | Flat shipping fee in minor units |
//! | CHECKOUT_TIMEOUT_MS | 5000 | Ceiling on the checkout transaction |
//! | LISTING_CACHE_TTL_MS | 30000 | Listing cache time-to-live |
//! | LISTING_CACHE_CAPACITY | 256 | Listing cache entry bound |
//! | JWT_SECRET | (required) | HS256 signing secret, >= 32 bytes |

use std::time::Duration;

use crate::auth::JwtConfig;
use crate::utils::AppError;

#[derive(Debug, Clone)]
pub struct Config {
    /// Working directory: database, images and logs live under here
    pub work_dir: String,
    pub http_port: u16,
    /// Public base URL stored images are served under
    pub public_base_url: String,
    /// Payment provider base URL
    pub payment_base_url: String,
    pub default_currency: String,
    pub free_shipping_threshold: i64,
    pub shipping_fee: i64,
    pub checkout_timeout: Duration,
    pub listing_cache_ttl: Duration,
    pub listing_cache_capacity: usize,
    pub jwt: JwtConfig,
}

fn env_parse<T: std::str::FromStr>(name: &str, default: T) -> T {
    std::env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

impl Config {
    /// Load configuration from environment variables, falling back to
    /// defaults for everything except the JWT secret.
    pub fn from_env() -> Result<Self, AppError> {
        let jwt = JwtConfig::from_env().map_err(|e| AppError::internal(e.to_string()))?;
        Ok(Self {
            work_dir: std::env::var("WORK_DIR").unwrap_or_else(|_| "./data".into()),
            http_port: env_parse("HTTP_PORT", 3000),
            public_base_url: std::env::var("PUBLIC_BASE_URL")
                .unwrap_or_else(|_| "http://localhost:3000/files".into()),
            payment_base_url: std::env::var("PAYMENT_BASE_URL")
                .unwrap_or_else(|_| "http://localhost:9200".into()),
            default_currency: std::env::var("DEFAULT_CURRENCY").unwrap_or_else(|_| "EUR".into()),
            free_shipping_threshold: env_parse("FREE_SHIPPING_THRESHOLD", 3500),
            shipping_fee: env_parse("SHIPPING_FEE", 495),
            checkout_timeout: Duration::from_millis(env_parse("CHECKOUT_TIMEOUT_MS", 5000)),
            listing_cache_ttl: Duration::from_millis(env_parse("LISTING_CACHE_TTL_MS", 30000)),
            listing_cache_capacity: env_parse("LISTING_CACHE_CAPACITY", 256),
            jwt,
        })
    }

    /// Database file path under the working directory.
    pub fn db_path(&self) -> String {
        format!("{}/saffron.db", self.work_dir)
    }
}
