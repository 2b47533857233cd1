//! Product Model
//!
//! A product owns its variants and images (cascade delete). Invariants
//! enforced by the catalog engine: at least one variant, at least one
//! image, exactly one thumbnail, and no two variants with the same
//! attribute-value combination.

use serde::{Deserialize, Serialize};

/// Product lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
#[cfg_attr(feature = "db", sqlx(rename_all = "UPPERCASE"))]
pub enum ProductStatus {
    Draft,
    Published,
    Archived,
}

impl ProductStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProductStatus::Draft => "DRAFT",
            ProductStatus::Published => "PUBLISHED",
            ProductStatus::Archived => "ARCHIVED",
        }
    }
}

/// Product entity
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Product {
    pub id: i64,
    pub name: String,
    /// Derived from name, unique
    pub slug: String,
    pub description: Option<String>,
    pub status: ProductStatus,
    /// Optimistic concurrency counter, bumped on every write
    pub version: i64,
    pub category_id: i64,

    // -- Relations (populated by application code, skipped by FromRow) --

    #[cfg_attr(feature = "db", sqlx(skip))]
    #[serde(default)]
    pub variants: Vec<ProductVariant>,
    #[cfg_attr(feature = "db", sqlx(skip))]
    #[serde(default)]
    pub images: Vec<Image>,
}

/// Product variant entity
///
/// `price` is in integer minor units (cents). The attribute-value id set
/// holds at most one value per distinct attribute.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct ProductVariant {
    pub id: i64,
    pub product_id: i64,
    pub name: Option<String>,
    pub sku: Option<String>,
    /// Price in minor units, >= 0
    pub price: i64,
    /// Units in stock, >= 0
    pub stock: i64,
    pub currency: String,

    /// Attribute value ids (junction table)
    #[cfg_attr(feature = "db", sqlx(skip))]
    #[serde(default)]
    pub attribute_value_ids: Vec<i64>,
}

/// Image entity with per-size storage keys/urls
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Image {
    pub id: i64,
    pub product_id: i64,
    pub thumb_key: String,
    pub thumb_url: String,
    pub medium_key: String,
    pub medium_url: String,
    pub large_key: String,
    pub large_url: String,
    pub alt_text: Option<String>,
    pub is_thumbnail: bool,
    pub position: i32,
}

/// One stored file: storage key + public URL
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredFile {
    pub key: String,
    pub url: String,
}

/// Size variants of one uploaded image, as returned by the storage service
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageFileSet {
    pub thumb: StoredFile,
    pub medium: StoredFile,
    pub large: StoredFile,
}

// =============================================================================
// Create / Update payloads
// =============================================================================

/// Create product payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductCreate {
    pub name: String,
    pub description: Option<String>,
    pub category_id: i64,
    /// Requested status; the catalog engine may downgrade to DRAFT
    pub status: Option<ProductStatus>,
    pub variants: Vec<VariantCreate>,
    /// Image ops referencing `files` by index
    pub images: Vec<ImageOpCreate>,
    /// Newly uploaded files the image ops reference
    #[serde(default)]
    pub files: Vec<ImageFileSet>,
}

/// Update product payload
///
/// `expected_version` is compared against the stored counter in the same
/// UPDATE statement; a mismatch rejects the whole request as a conflict.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductUpdate {
    pub expected_version: i64,
    pub name: Option<String>,
    pub description: Option<String>,
    pub category_id: Option<i64>,
    pub status: Option<ProductStatus>,
    pub variant_ops: Option<VariantOps>,
    pub image_ops: Option<ImageOps>,
    #[serde(default)]
    pub files: Vec<ImageFileSet>,
}

/// Variant delta operations applied in one transaction
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VariantOps {
    #[serde(default)]
    pub create: Vec<VariantCreate>,
    #[serde(default)]
    pub update: Vec<VariantUpdate>,
    /// Variant ids to delete
    #[serde(default)]
    pub delete: Vec<i64>,
}

/// Create variant payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VariantCreate {
    pub name: Option<String>,
    pub sku: Option<String>,
    pub price: i64,
    pub stock: i64,
    pub currency: Option<String>,
    #[serde(default)]
    pub attribute_value_ids: Vec<i64>,
}

/// Update variant payload (None = unchanged)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VariantUpdate {
    pub id: i64,
    pub name: Option<String>,
    pub sku: Option<String>,
    pub price: Option<i64>,
    pub stock: Option<i64>,
    /// When present, replaces the whole attribute-value set
    pub attribute_value_ids: Option<Vec<i64>>,
}

/// Image delta operations applied in one transaction
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ImageOps {
    #[serde(default)]
    pub create: Vec<ImageOpCreate>,
    #[serde(default)]
    pub update: Vec<ImageOpUpdate>,
    /// Image ids to delete
    #[serde(default)]
    pub delete: Vec<i64>,
}

/// Create image op, referencing an uploaded file set by index
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageOpCreate {
    pub file_index: usize,
    pub alt_text: Option<String>,
    #[serde(default)]
    pub is_thumbnail: bool,
    pub position: Option<i32>,
}

/// Update image op; `file_index` replaces the stored files
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageOpUpdate {
    pub id: i64,
    pub file_index: Option<usize>,
    pub alt_text: Option<String>,
    pub is_thumbnail: Option<bool>,
    pub position: Option<i32>,
}
