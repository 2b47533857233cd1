//! Category attribute schema
//!
//! Flattened view of a category's attributes used by the validators:
//! a value-id → attribute-id map plus the value-set sizes the capacity
//! calculator needs.

use std::collections::HashMap;

use shared::models::Category;

use super::capacity::max_combinations;

/// Attribute schema of one category, indexed for validation.
#[derive(Debug, Clone, Default)]
pub struct CategorySchema {
    /// attribute value id → owning attribute id
    value_owners: HashMap<i64, i64>,
    /// value-set size per attribute, in attribute order
    value_counts: Vec<usize>,
}

impl CategorySchema {
    pub fn from_category(category: &Category) -> Self {
        let mut value_owners = HashMap::new();
        let mut value_counts = Vec::with_capacity(category.attributes.len());
        for attr in &category.attributes {
            value_counts.push(attr.values.len());
            for value in &attr.values {
                value_owners.insert(value.id, attr.id);
            }
        }
        Self {
            value_owners,
            value_counts,
        }
    }

    /// Build directly from (value id, attribute id) pairs. Used by tests
    /// and by callers that already hold a flat map.
    pub fn from_pairs(pairs: &[(i64, i64)], value_counts: Vec<usize>) -> Self {
        Self {
            value_owners: pairs.iter().copied().collect(),
            value_counts,
        }
    }

    /// Owning attribute of a value id, if the value belongs to this category.
    pub fn attribute_of(&self, value_id: i64) -> Option<i64> {
        self.value_owners.get(&value_id).copied()
    }

    pub fn has_attributes(&self) -> bool {
        !self.value_counts.is_empty()
    }

    /// Maximum number of distinguishable variants this schema permits.
    pub fn capacity(&self) -> u64 {
        max_combinations(&self.value_counts)
    }
}
