//! Server State
//!
//! Shared handle every request sees. Arc-backed services, cheap to clone.

use std::sync::Arc;

use crate::auth::JwtService;
use crate::catalog::{CatalogService, ListingCache};
use crate::checkout::{CheckoutConfig, CheckoutService, HttpPaymentSessions, PaymentSessions};
use crate::core::Config;
use crate::db::DbService;
use crate::storage::{FileStorage, LocalFileStorage};
use crate::utils::AppError;

#[derive(Clone)]
pub struct ServerState {
    pub config: Config,
    pub db: DbService,
    pub catalog: CatalogService,
    pub checkout: CheckoutService,
    pub jwt_service: Arc<JwtService>,
}

impl ServerState {
    /// Initialize in order: working directory, database (with
    /// migrations), storage, then the services on top.
    pub async fn initialize(config: &Config) -> Result<Self, AppError> {
        tokio::fs::create_dir_all(&config.work_dir)
            .await
            .map_err(|e| AppError::internal(format!("Failed to create work dir: {e}")))?;

        let db = DbService::new(&config.db_path()).await?;
        let storage: Arc<dyn FileStorage> = Arc::new(
            LocalFileStorage::new(&config.work_dir, &config.public_base_url).await?,
        );
        let payments: Arc<dyn PaymentSessions> =
            Arc::new(HttpPaymentSessions::new(&config.payment_base_url));

        Ok(Self::assemble(config.clone(), db, storage, payments))
    }

    /// Wire the services onto an existing database and collaborators.
    /// Tests use this with an in-memory pool and stub collaborators.
    pub fn assemble(
        config: Config,
        db: DbService,
        storage: Arc<dyn FileStorage>,
        payments: Arc<dyn PaymentSessions>,
    ) -> Self {
        let cache = ListingCache::new(config.listing_cache_ttl, config.listing_cache_capacity);
        let catalog = CatalogService::new(
            db.clone(),
            cache,
            storage,
            config.default_currency.clone(),
        );
        let checkout = CheckoutService::new(
            db.clone(),
            payments,
            CheckoutConfig {
                free_shipping_threshold: config.free_shipping_threshold,
                shipping_fee: config.shipping_fee,
                currency: config.default_currency.clone(),
                timeout: config.checkout_timeout,
            },
        );
        let jwt_service = Arc::new(JwtService::new(config.jwt.clone()));

        Self {
            config,
            db,
            catalog,
            checkout,
            jwt_service,
        }
    }
}
