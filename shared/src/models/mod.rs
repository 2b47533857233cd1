//! Domain models
//!
//! One module per aggregate, each with its entity structs and the
//! `Create`/`Update` payloads the API accepts.

pub mod category;
pub mod order;
pub mod product;

pub use category::{Attribute, AttributeCreate, AttributeValue, Category, CategoryCreate, CategoryUpdate};
pub use order::{
    CheckoutLine, CheckoutRequest, Order, OrderItem, OrderStatus, PaymentWebhook, ShippingAddress,
    ShippingStatus,
};
pub use product::{
    Image, ImageFileSet, ImageOpCreate, ImageOpUpdate, ImageOps, Product, ProductCreate,
    ProductStatus, ProductUpdate, ProductVariant, StoredFile, VariantCreate, VariantOps,
    VariantUpdate,
};
