//! Order Model
//!
//! Orders snapshot name/sku/price at checkout time and are never
//! recomputed from live product data. Stock is reserved when the order is
//! created (status PENDING), before payment confirmation.

use serde::{Deserialize, Serialize};

/// Order lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
#[cfg_attr(feature = "db", sqlx(rename_all = "UPPERCASE"))]
pub enum OrderStatus {
    Pending,
    Paid,
    Fulfilled,
    Cancelled,
    Refunded,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "PENDING",
            OrderStatus::Paid => "PAID",
            OrderStatus::Fulfilled => "FULFILLED",
            OrderStatus::Cancelled => "CANCELLED",
            OrderStatus::Refunded => "REFUNDED",
        }
    }
}

/// Shipping progress, independent of payment status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
#[cfg_attr(feature = "db", sqlx(rename_all = "SCREAMING_SNAKE_CASE"))]
pub enum ShippingStatus {
    NotShipped,
    Shipped,
    Delivered,
}

/// Shipping address snapshot stored on the order
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShippingAddress {
    pub name: String,
    pub line1: String,
    pub line2: Option<String>,
    pub city: String,
    pub postal_code: String,
    pub country: String,
}

/// Order entity
///
/// All amounts are integer minor units.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Order {
    pub id: i64,
    pub user_id: String,
    pub status: OrderStatus,
    pub shipping_status: ShippingStatus,
    pub subtotal: i64,
    pub shipping_fee: i64,
    pub total: i64,
    pub currency: String,
    pub payment_session_id: Option<String>,
    pub payment_reference: Option<String>,
    pub ship_name: String,
    pub ship_line1: String,
    pub ship_line2: Option<String>,
    pub ship_city: String,
    pub ship_postal_code: String,
    pub ship_country: String,
    /// RFC 3339 timestamp
    pub created_at: String,

    #[cfg_attr(feature = "db", sqlx(skip))]
    #[serde(default)]
    pub items: Vec<OrderItem>,
}

/// Order line item — immutable snapshot taken at checkout
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct OrderItem {
    pub id: i64,
    pub order_id: i64,
    pub product_id: i64,
    pub variant_id: i64,
    pub name: String,
    pub sku: Option<String>,
    pub unit_price: i64,
    pub quantity: i64,
    pub line_total: i64,
}

/// One checkout line: variant + quantity (> 0)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckoutLine {
    pub variant_id: i64,
    pub quantity: i64,
}

/// Checkout request payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckoutRequest {
    pub items: Vec<CheckoutLine>,
    pub address: ShippingAddress,
}

/// Payment-provider completion webhook payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentWebhook {
    pub session_id: String,
    pub order_id: i64,
    pub payment_reference: String,
}
