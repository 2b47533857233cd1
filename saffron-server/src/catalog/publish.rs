//! Publish readiness and status resolution
//!
//! Two independent gates protect the PUBLISHED state:
//!
//! - price: at least one variant of the final set must have price > 0
//! - distinguishability: a no-attribute category may publish at most one
//!   variant; with attributes and more than one variant, every variant
//!   must carry attribute values so buyers can tell them apart
//!
//! When a gate fails, the target status is downgraded to DRAFT instead of
//! rejecting the request. The same policy applies to every flow (direct
//! create/update, bulk status update, category change) so incremental
//! data entry is never blocked.

use shared::models::ProductStatus;

use super::variants::FinalVariant;

/// Why a product cannot be published right now.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublishBlocker {
    /// No variant of the final set has price > 0
    NoPositivePrice,
    /// Variants are not distinguishable to a buyer
    NotDistinguishable,
}

/// Collect the publish blockers of a final variant set.
pub fn publish_blockers(
    category_has_attributes: bool,
    variants: &[FinalVariant],
) -> Vec<PublishBlocker> {
    let mut blockers = Vec::new();

    if !variants.iter().any(|v| v.price > 0) {
        blockers.push(PublishBlocker::NoPositivePrice);
    }

    let distinguishable = if category_has_attributes {
        variants.len() <= 1 || variants.iter().all(|v| v.has_values())
    } else {
        variants.len() <= 1
    };
    if !distinguishable {
        blockers.push(PublishBlocker::NotDistinguishable);
    }

    blockers
}

/// Resolve the effective status: the requested status, downgraded to
/// DRAFT when PUBLISHED is requested but the set is not publish-ready.
pub fn resolve_status(
    requested: ProductStatus,
    category_has_attributes: bool,
    variants: &[FinalVariant],
) -> ProductStatus {
    if requested == ProductStatus::Published
        && !publish_blockers(category_has_attributes, variants).is_empty()
    {
        return ProductStatus::Draft;
    }
    requested
}

/// Status resolution on category change.
///
/// Fires on every category change independent of price: if the new
/// category has attributes and not all surviving variants carry values,
/// or it has none and more than one variant remains, the product is
/// forced back to DRAFT. Otherwise the requested (or current) status is
/// kept.
pub fn resolve_status_for_category_change(
    current: ProductStatus,
    requested: Option<ProductStatus>,
    new_category_has_attributes: bool,
    final_variant_count: usize,
    variants_with_values: usize,
) -> ProductStatus {
    if new_category_has_attributes && variants_with_values < final_variant_count {
        return ProductStatus::Draft;
    }
    if !new_category_has_attributes && final_variant_count > 1 {
        return ProductStatus::Draft;
    }
    requested.unwrap_or(current)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::variants::{FinalVariant, VariantRef};

    fn variant(price: i64, values: &[i64]) -> FinalVariant {
        FinalVariant {
            source: VariantRef::Created(0),
            name: None,
            sku: None,
            price,
            value_ids: values.to_vec(),
        }
    }

    #[test]
    fn test_all_zero_prices_downgrade_to_draft() {
        // Requesting PUBLISHED with only zero-priced variants is not an
        // error; the product simply stays a draft.
        let variants = vec![variant(0, &[1]), variant(0, &[2])];
        let status = resolve_status(ProductStatus::Published, true, &variants);
        assert_eq!(status, ProductStatus::Draft);
    }

    #[test]
    fn test_one_positive_price_suffices() {
        let variants = vec![variant(0, &[1]), variant(250, &[2])];
        let status = resolve_status(ProductStatus::Published, true, &variants);
        assert_eq!(status, ProductStatus::Published);
    }

    #[test]
    fn test_draft_request_never_downgraded() {
        let variants = vec![variant(0, &[])];
        assert_eq!(
            resolve_status(ProductStatus::Draft, true, &variants),
            ProductStatus::Draft
        );
        assert_eq!(
            resolve_status(ProductStatus::Archived, true, &variants),
            ProductStatus::Archived
        );
    }

    #[test]
    fn test_multiple_variants_need_values_when_category_has_attributes() {
        let variants = vec![variant(100, &[1]), variant(100, &[])];
        let blockers = publish_blockers(true, &variants);
        assert_eq!(blockers, vec![PublishBlocker::NotDistinguishable]);
    }

    #[test]
    fn test_single_variant_without_values_is_publishable() {
        let variants = vec![variant(100, &[])];
        assert!(publish_blockers(true, &variants).is_empty());
        assert!(publish_blockers(false, &variants).is_empty());
    }

    #[test]
    fn test_no_attribute_category_caps_published_variants_at_one() {
        let variants = vec![variant(100, &[]), variant(200, &[])];
        let blockers = publish_blockers(false, &variants);
        assert_eq!(blockers, vec![PublishBlocker::NotDistinguishable]);
    }

    #[test]
    fn test_category_change_forces_draft_when_values_missing() {
        let status = resolve_status_for_category_change(
            ProductStatus::Published,
            None,
            true, // new category has attributes
            3,
            2, // one variant has no values yet
        );
        assert_eq!(status, ProductStatus::Draft);
    }

    #[test]
    fn test_category_change_forces_draft_on_attribute_less_target() {
        let status = resolve_status_for_category_change(
            ProductStatus::Published,
            Some(ProductStatus::Published),
            false,
            2,
            0,
        );
        assert_eq!(status, ProductStatus::Draft);
    }

    #[test]
    fn test_category_change_keeps_status_when_consistent() {
        let status = resolve_status_for_category_change(
            ProductStatus::Published,
            None,
            true,
            2,
            2,
        );
        assert_eq!(status, ProductStatus::Published);

        let status = resolve_status_for_category_change(
            ProductStatus::Draft,
            Some(ProductStatus::Archived),
            false,
            1,
            0,
        );
        assert_eq!(status, ProductStatus::Archived);
    }
}
