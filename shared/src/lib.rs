//! Shared domain models for the Saffron backend
//!
//! Plain serde structs used by both the server and any future clients.
//! Database derives (`sqlx::FromRow`) are gated behind the `db` feature so
//! client builds stay free of sqlx.

pub mod models;

pub use models::{
    Attribute, AttributeCreate, AttributeValue, Category, CategoryCreate, CategoryUpdate,
    CheckoutLine, CheckoutRequest, Image, ImageFileSet, ImageOpCreate, ImageOpUpdate, ImageOps,
    Order, OrderItem, OrderStatus, PaymentWebhook, Product, ProductCreate, ProductStatus,
    ProductUpdate, ProductVariant, ShippingAddress, ShippingStatus, StoredFile, VariantCreate,
    VariantOps, VariantUpdate,
};
