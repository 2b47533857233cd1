//! Variant set validation
//!
//! Validates a prospective variant set (current rows + create/update/delete
//! deltas) against the category's attribute schema. All violations are
//! collected and reported together; the validator never stops at the first
//! failure. Pure functions, no I/O.

use std::collections::HashMap;

use shared::models::{ProductVariant, VariantOps};

use super::schema::CategorySchema;
use super::violation::{CatalogViolations, ViolationCode};

/// Current state of one variant, as the validator sees it.
#[derive(Debug, Clone)]
pub struct VariantState {
    pub id: i64,
    pub name: Option<String>,
    pub sku: Option<String>,
    pub price: i64,
    pub value_ids: Vec<i64>,
}

impl VariantState {
    pub fn from_variant(v: &ProductVariant) -> Self {
        Self {
            id: v.id,
            name: v.name.clone(),
            sku: v.sku.clone(),
            price: v.price,
            value_ids: v.attribute_value_ids.clone(),
        }
    }
}

/// Where a surviving variant came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VariantRef {
    Existing(i64),
    /// Index into `ops.create`
    Created(usize),
}

/// One variant of the final set, with its normalized combination.
#[derive(Debug, Clone)]
pub struct FinalVariant {
    pub source: VariantRef,
    pub name: Option<String>,
    pub sku: Option<String>,
    pub price: i64,
    /// Attribute value ids, sorted (order-independent combination key)
    pub value_ids: Vec<i64>,
}

impl FinalVariant {
    /// Human label for violation messages: name, else sku, else id/index.
    pub fn label(&self) -> String {
        if let Some(name) = &self.name {
            return format!("'{name}'");
        }
        if let Some(sku) = &self.sku {
            return format!("sku {sku}");
        }
        match self.source {
            VariantRef::Existing(id) => format!("#{id}"),
            VariantRef::Created(idx) => format!("new variant {}", idx + 1),
        }
    }

    pub fn has_values(&self) -> bool {
        !self.value_ids.is_empty()
    }
}

/// Validate variant delta ops against the category schema.
///
/// Returns the final variant set (deltas applied, combinations normalized)
/// or every violation found. Update/delete entries referencing unknown
/// variant ids are ignored here; the repository rejects them when applying.
pub fn validate_variant_ops(
    schema: &CategorySchema,
    current: &[VariantState],
    ops: &VariantOps,
) -> Result<Vec<FinalVariant>, CatalogViolations> {
    let mut violations = CatalogViolations::new();

    let finals = apply_ops(current, ops);

    // Value legality + one-value-per-attribute, per touched variant.
    // Only creates and updates are checked: existing untouched rows were
    // validated when they were written.
    for variant in finals.iter().filter(|f| is_touched(f, ops)) {
        check_value_set(schema, variant, &mut violations);
    }

    // Capacity of the final set
    let capacity = schema.capacity();
    if finals.len() as u64 > capacity {
        violations.push(
            ViolationCode::CapacityExceeded,
            format!(
                "{} variant(s) exceed the {} unique combination(s) this category's attributes permit",
                finals.len(),
                capacity
            ),
        );
    }

    // Duplicate combinations, order-independent, empty set included
    let mut seen: HashMap<&[i64], &FinalVariant> = HashMap::new();
    for variant in &finals {
        match seen.get(variant.value_ids.as_slice()) {
            Some(first) => violations.push(
                ViolationCode::DuplicateCombination,
                format!(
                    "variants {} and {} share the same attribute-value combination",
                    first.label(),
                    variant.label()
                ),
            ),
            None => {
                seen.insert(variant.value_ids.as_slice(), variant);
            }
        }
    }

    violations.into_result()?;
    Ok(finals)
}

/// Check the variant count against the capacity of a target category.
///
/// Used when a product changes category: the count must fit the new
/// category's schema before any other mutation is attempted.
pub fn check_category_capacity(
    schema: &CategorySchema,
    variant_count: usize,
) -> Result<(), CatalogViolations> {
    let capacity = schema.capacity();
    if variant_count as u64 > capacity {
        let mut violations = CatalogViolations::new();
        violations.push(
            ViolationCode::CategoryCapacityExceeded,
            format!(
                "{variant_count} variant(s) exceed the {capacity} unique combination(s) the target category's attributes permit"
            ),
        );
        return Err(violations);
    }
    Ok(())
}

/// Apply deltas to the current set: deletes remove, updates override,
/// creates append. Combinations are normalized by sorting.
pub fn apply_ops(current: &[VariantState], ops: &VariantOps) -> Vec<FinalVariant> {
    let updates: HashMap<i64, &shared::models::VariantUpdate> =
        ops.update.iter().map(|u| (u.id, u)).collect();

    let mut finals: Vec<FinalVariant> = current
        .iter()
        .filter(|v| !ops.delete.contains(&v.id))
        .map(|v| {
            let mut name = v.name.clone();
            let mut sku = v.sku.clone();
            let mut price = v.price;
            let mut value_ids = v.value_ids.clone();
            if let Some(u) = updates.get(&v.id) {
                if let Some(n) = &u.name {
                    name = Some(n.clone());
                }
                if let Some(s) = &u.sku {
                    sku = Some(s.clone());
                }
                if let Some(p) = u.price {
                    price = p;
                }
                if let Some(ids) = &u.attribute_value_ids {
                    value_ids = ids.clone();
                }
            }
            value_ids.sort_unstable();
            value_ids.dedup();
            FinalVariant {
                source: VariantRef::Existing(v.id),
                name,
                sku,
                price,
                value_ids,
            }
        })
        .collect();

    for (idx, c) in ops.create.iter().enumerate() {
        let mut value_ids = c.attribute_value_ids.clone();
        value_ids.sort_unstable();
        value_ids.dedup();
        finals.push(FinalVariant {
            source: VariantRef::Created(idx),
            name: c.name.clone(),
            sku: c.sku.clone(),
            price: c.price,
            value_ids,
        });
    }

    finals
}

fn is_touched(variant: &FinalVariant, ops: &VariantOps) -> bool {
    match variant.source {
        VariantRef::Created(_) => true,
        VariantRef::Existing(id) => ops.update.iter().any(|u| u.id == id),
    }
}

fn check_value_set(
    schema: &CategorySchema,
    variant: &FinalVariant,
    violations: &mut CatalogViolations,
) {
    let mut owners: HashMap<i64, i64> = HashMap::new();
    for &value_id in &variant.value_ids {
        match schema.attribute_of(value_id) {
            None => violations.push(
                ViolationCode::UnknownAttributeValue,
                format!(
                    "variant {} references attribute value {} which does not belong to the product's category",
                    variant.label(),
                    value_id
                ),
            ),
            Some(attr_id) => {
                if let Some(prev) = owners.insert(attr_id, value_id)
                    && prev != value_id
                {
                    violations.push(
                        ViolationCode::DuplicateAttribute,
                        format!(
                            "variant {} carries two values of the same attribute ({} and {})",
                            variant.label(),
                            prev,
                            value_id
                        ),
                    );
                }
            }
        }
    }
}
