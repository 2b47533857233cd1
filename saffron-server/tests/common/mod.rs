//! Shared fixtures for integration tests: in-memory database, stub
//! collaborators and seed helpers.

use std::sync::Arc;
use std::time::Duration;

use saffron_server::catalog::{CatalogService, ListingCache};
use saffron_server::checkout::payment::StaticPaymentSessions;
use saffron_server::checkout::{CheckoutConfig, CheckoutService};
use saffron_server::db::DbService;
use saffron_server::storage::NoopFileStorage;
use shared::models::{
    Category, CategoryCreate, AttributeCreate, CheckoutLine, CheckoutRequest, ImageFileSet,
    ImageOpCreate, Product, ProductCreate, ProductStatus, ShippingAddress, StoredFile,
    VariantCreate,
};

pub const FREE_SHIPPING_THRESHOLD: i64 = 3500;
pub const SHIPPING_FEE: i64 = 495;

pub async fn setup() -> (CatalogService, CheckoutService, DbService) {
    setup_with_payments(false).await
}

pub async fn setup_with_payments(fail_payments: bool) -> (CatalogService, CheckoutService, DbService) {
    let db = DbService::new_in_memory().await.expect("in-memory db");
    let cache = ListingCache::new(Duration::from_secs(60), 16);
    let catalog = CatalogService::new(
        db.clone(),
        cache,
        Arc::new(NoopFileStorage),
        "EUR".to_string(),
    );
    let checkout = CheckoutService::new(
        db.clone(),
        Arc::new(StaticPaymentSessions {
            fail: fail_payments,
        }),
        CheckoutConfig {
            free_shipping_threshold: FREE_SHIPPING_THRESHOLD,
            shipping_fee: SHIPPING_FEE,
            currency: "EUR".to_string(),
            timeout: Duration::from_secs(5),
        },
    );
    (catalog, checkout, db)
}

pub fn file_set(n: u32) -> ImageFileSet {
    let entry = |slot: &str| StoredFile {
        key: format!("file-{n}-{slot}.jpg"),
        url: format!("http://localhost/files/file-{n}-{slot}.jpg"),
    };
    ImageFileSet {
        thumb: entry("thumb"),
        medium: entry("medium"),
        large: entry("large"),
    }
}

pub async fn seed_category(
    catalog: &CatalogService,
    name: &str,
    attributes: &[(&str, &[&str])],
) -> Category {
    catalog
        .create_category(CategoryCreate {
            name: name.to_string(),
            sort_order: None,
            attributes: attributes
                .iter()
                .map(|(attr, values)| AttributeCreate {
                    name: attr.to_string(),
                    values: values.iter().map(|v| v.to_string()).collect(),
                })
                .collect(),
        })
        .await
        .expect("seed category")
}

pub fn variant(name: &str, price: i64, stock: i64, value_ids: &[i64]) -> VariantCreate {
    VariantCreate {
        name: Some(name.to_string()),
        sku: None,
        price,
        stock,
        currency: None,
        attribute_value_ids: value_ids.to_vec(),
    }
}

pub async fn seed_product(
    catalog: &CatalogService,
    category_id: i64,
    name: &str,
    variants: Vec<VariantCreate>,
) -> Product {
    catalog
        .create_product(ProductCreate {
            name: name.to_string(),
            description: None,
            category_id,
            status: Some(ProductStatus::Published),
            variants,
            images: vec![ImageOpCreate {
                file_index: 0,
                alt_text: None,
                is_thumbnail: true,
                position: None,
            }],
            files: vec![file_set(1)],
        })
        .await
        .expect("seed product")
}

pub fn address() -> ShippingAddress {
    ShippingAddress {
        name: "Maria Keller".to_string(),
        line1: "Gewürzgasse 12".to_string(),
        line2: None,
        city: "Vienna".to_string(),
        postal_code: "1010".to_string(),
        country: "AT".to_string(),
    }
}

pub fn checkout_request(lines: &[(i64, i64)]) -> CheckoutRequest {
    CheckoutRequest {
        items: lines
            .iter()
            .map(|&(variant_id, quantity)| CheckoutLine {
                variant_id,
                quantity,
            })
            .collect(),
        address: address(),
    }
}

/// Current stock of one variant, read through the product aggregate.
pub async fn stock_of(catalog: &CatalogService, product_id: i64, variant_id: i64) -> i64 {
    let product = catalog.get_product(product_id).await.expect("product");
    product
        .variants
        .iter()
        .find(|v| v.id == variant_id)
        .expect("variant")
        .stock
}
