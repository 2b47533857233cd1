//! Category Model
//!
//! A category owns an ordered list of attributes; each attribute owns the
//! set of values a variant may carry for it. Attribute values are unique
//! per attribute, category names unique globally.

use serde::{Deserialize, Serialize};

/// Category entity
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Category {
    pub id: i64,
    pub name: String,
    pub sort_order: i32,

    // -- Relations (populated by application code, skipped by FromRow) --

    /// Attributes in display order, values embedded
    #[cfg_attr(feature = "db", sqlx(skip))]
    #[serde(default)]
    pub attributes: Vec<Attribute>,
}

/// Attribute entity (belongs to exactly one category)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Attribute {
    pub id: i64,
    pub category_id: i64,
    pub name: String,
    pub sort_order: i32,

    #[cfg_attr(feature = "db", sqlx(skip))]
    #[serde(default)]
    pub values: Vec<AttributeValue>,
}

/// One allowed value of an attribute (e.g. Weight = "50g")
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct AttributeValue {
    pub id: i64,
    pub attribute_id: i64,
    pub value: String,
}

/// Create category payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryCreate {
    pub name: String,
    pub sort_order: Option<i32>,
    #[serde(default)]
    pub attributes: Vec<AttributeCreate>,
}

/// Attribute payload embedded in category create/update
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttributeCreate {
    pub name: String,
    pub values: Vec<String>,
}

/// Update category payload
///
/// `attributes`, when present, replaces the whole attribute schema.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryUpdate {
    pub name: Option<String>,
    pub sort_order: Option<i32>,
    pub attributes: Option<Vec<AttributeCreate>>,
}
