//! Catalog service flows on an in-memory SQLite pool: rule violations
//! surfacing through the service, status downgrades, versioned updates
//! and cache behavior.

mod common;

use common::*;
use saffron_server::AppError;
use saffron_server::catalog::ViolationCode;
use saffron_server::db::repository::product::ProductFilter;
use shared::models::{
    ImageOpCreate, ImageOps, ProductCreate, ProductStatus, ProductUpdate, VariantOps,
    VariantUpdate,
};

fn base_create(category_id: i64, name: &str) -> ProductCreate {
    ProductCreate {
        name: name.to_string(),
        description: None,
        category_id,
        status: Some(ProductStatus::Published),
        variants: vec![],
        images: vec![ImageOpCreate {
            file_index: 0,
            alt_text: None,
            is_thumbnail: true,
            position: None,
        }],
        files: vec![file_set(1)],
    }
}

fn base_update(version: i64) -> ProductUpdate {
    ProductUpdate {
        expected_version: version,
        name: None,
        description: None,
        category_id: None,
        status: None,
        variant_ops: None,
        image_ops: None,
        files: vec![],
    }
}

#[tokio::test]
async fn test_duplicate_combination_rejected_with_all_violations() {
    let (catalog, _checkout, _db) = setup().await;
    let category = seed_category(&catalog, "Pepper", &[("Weight", &["50g", "100g"])]).await;
    let weight = &category.attributes[0].values;

    let mut create = base_create(category.id, "Kampot Pepper");
    create.variants = vec![
        variant("50g a", 500, 5, &[weight[0].id]),
        variant("50g b", 600, 5, &[weight[0].id]),
    ];
    let err = catalog.create_product(create).await.unwrap_err();
    let AppError::CatalogRules(violations) = err else {
        panic!("expected catalog rules error");
    };
    assert!(violations.contains(ViolationCode::DuplicateCombination));
    // Nothing persisted
    assert!(catalog
        .list_products(ProductFilter {
            category_id: Some(category.id),
            ..Default::default()
        })
        .await
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn test_capacity_violation_through_service() {
    let (catalog, _checkout, _db) = setup().await;
    let category = seed_category(
        &catalog,
        "Blends",
        &[("Weight", &["50g", "100g"]), ("Grade", &["A", "B"])],
    )
    .await;
    let w = &category.attributes[0].values;
    let g = &category.attributes[1].values;

    let mut create = base_create(category.id, "House Blend");
    create.variants = vec![
        variant("a", 100, 1, &[w[0].id, g[0].id]),
        variant("b", 100, 1, &[w[0].id, g[1].id]),
        variant("c", 100, 1, &[w[1].id, g[0].id]),
        variant("d", 100, 1, &[w[1].id, g[1].id]),
        variant("e", 100, 1, &[]),
    ];
    let err = catalog.create_product(create).await.unwrap_err();
    let AppError::CatalogRules(violations) = err else {
        panic!("expected catalog rules error");
    };
    assert!(violations.contains(ViolationCode::CapacityExceeded));
}

#[tokio::test]
async fn test_all_zero_prices_create_as_draft() {
    let (catalog, _checkout, _db) = setup().await;
    let category = seed_category(&catalog, "Samples", &[("Size", &["S", "M"])]).await;
    let size = &category.attributes[0].values;

    let mut create = base_create(category.id, "Sample Pack");
    create.variants = vec![
        variant("s", 0, 10, &[size[0].id]),
        variant("m", 0, 10, &[size[1].id]),
    ];
    // PUBLISHED was requested but the set is not publish-ready
    let product = catalog.create_product(create).await.unwrap();
    assert_eq!(product.status, ProductStatus::Draft);
}

#[tokio::test]
async fn test_version_conflict_on_stale_update() {
    let (catalog, _checkout, _db) = setup().await;
    let category = seed_category(&catalog, "Nutmeg", &[]).await;
    let product = seed_product(
        &catalog,
        category.id,
        "Whole Nutmeg",
        vec![variant("jar", 300, 5, &[])],
    )
    .await;
    assert_eq!(product.version, 1);

    // First writer wins
    let mut update = base_update(1);
    update.name = Some("Whole Nutmeg (Grenada)".to_string());
    let updated = catalog.update_product(product.id, update).await.unwrap();
    assert_eq!(updated.version, 2);
    assert_eq!(updated.name, "Whole Nutmeg (Grenada)");

    // Second writer carries the stale version
    let mut stale = base_update(1);
    stale.name = Some("Someone else's name".to_string());
    let err = catalog.update_product(product.id, stale).await.unwrap_err();
    assert!(matches!(err, AppError::VersionConflict { expected: 1 }));
    assert_eq!(
        catalog.get_product(product.id).await.unwrap().name,
        "Whole Nutmeg (Grenada)"
    );
}

#[tokio::test]
async fn test_variant_ops_applied_in_one_update() {
    let (catalog, _checkout, _db) = setup().await;
    let category = seed_category(&catalog, "Paprika", &[("Heat", &["sweet", "hot", "smoked"])]).await;
    let heat = &category.attributes[0].values;
    let product = seed_product(
        &catalog,
        category.id,
        "Paprika",
        vec![
            variant("sweet", 350, 10, &[heat[0].id]),
            variant("hot", 350, 10, &[heat[1].id]),
        ],
    )
    .await;
    let sweet = product.variants[0].id;
    let hot = product.variants[1].id;

    let mut update = base_update(1);
    update.variant_ops = Some(VariantOps {
        create: vec![variant("smoked", 400, 5, &[heat[2].id])],
        update: vec![VariantUpdate {
            id: sweet,
            name: None,
            sku: None,
            price: Some(375),
            stock: None,
            attribute_value_ids: None,
        }],
        delete: vec![hot],
    });
    let updated = catalog.update_product(product.id, update).await.unwrap();

    assert_eq!(updated.variants.len(), 2);
    let sweet_row = updated.variants.iter().find(|v| v.id == sweet).unwrap();
    assert_eq!(sweet_row.price, 375);
    assert!(updated.variants.iter().all(|v| v.id != hot));
    assert!(updated
        .variants
        .iter()
        .any(|v| v.name.as_deref() == Some("smoked")));
}

#[tokio::test]
async fn test_category_change_forces_draft() {
    let (catalog, _checkout, _db) = setup().await;
    let with_attrs = seed_category(&catalog, "Tea", &[("Size", &["S", "L"])]).await;
    let no_attrs = seed_category(&catalog, "Gifts", &[]).await;
    let size = &with_attrs.attributes[0].values;

    let product = seed_product(
        &catalog,
        with_attrs.id,
        "Chai Mix",
        vec![
            variant("s", 500, 5, &[size[0].id]),
            variant("l", 900, 5, &[size[1].id]),
        ],
    )
    .await;
    assert_eq!(product.status, ProductStatus::Published);

    // Two variants cannot be told apart in a no-attribute category
    let mut update = base_update(1);
    update.category_id = Some(no_attrs.id);
    let err = catalog.update_product(product.id, update).await.unwrap_err();
    let AppError::CatalogRules(violations) = err else {
        panic!("expected catalog rules error, capacity of target is 1");
    };
    assert!(violations.contains(ViolationCode::CategoryCapacityExceeded));

    // Dropping to one variant makes the move legal; a single variant
    // stays distinguishable, so the status is kept
    let mut update = base_update(1);
    update.category_id = Some(no_attrs.id);
    update.variant_ops = Some(VariantOps {
        delete: vec![product.variants[1].id],
        ..Default::default()
    });
    let moved = catalog.update_product(product.id, update).await.unwrap();
    assert_eq!(moved.category_id, no_attrs.id);
    assert_eq!(moved.status, ProductStatus::Published);
}

#[tokio::test]
async fn test_category_change_with_valueless_variants_forces_draft() {
    let (catalog, _checkout, _db) = setup().await;
    let source = seed_category(&catalog, "Bulk", &[]).await;
    let target = seed_category(&catalog, "Packaged", &[("Size", &["S", "L"])]).await;

    let mut create = base_create(source.id, "Bulk Cloves");
    create.variants = vec![variant("only", 600, 10, &[])];
    let product = catalog.create_product(create).await.unwrap();
    assert_eq!(product.status, ProductStatus::Published);

    // Target category has attributes but the variant carries no values.
    // A single variant is tolerated by the publish gates, yet a second
    // one added in the same move is not.
    let mut update = base_update(1);
    update.category_id = Some(target.id);
    let size = &target.attributes[0].values;
    update.variant_ops = Some(VariantOps {
        create: vec![variant("large", 900, 5, &[size[1].id])],
        ..Default::default()
    });
    let moved = catalog.update_product(product.id, update).await.unwrap();
    assert_eq!(moved.category_id, target.id);
    assert_eq!(moved.status, ProductStatus::Draft);
}

#[tokio::test]
async fn test_thumbnail_invariant_on_create_and_update() {
    let (catalog, _checkout, _db) = setup().await;
    let category = seed_category(&catalog, "Anise", &[]).await;

    let mut create = base_create(category.id, "Star Anise");
    create.variants = vec![variant("bag", 450, 10, &[])];
    create.images = vec![
        ImageOpCreate {
            file_index: 0,
            alt_text: Some("front".to_string()),
            is_thumbnail: false,
            position: None,
        },
        ImageOpCreate {
            file_index: 1,
            alt_text: Some("back".to_string()),
            is_thumbnail: true,
            position: None,
        },
    ];
    create.files = vec![file_set(1), file_set(2)];
    let product = catalog.create_product(create).await.unwrap();

    assert_eq!(product.images.len(), 2);
    let thumbs: Vec<_> = product.images.iter().filter(|i| i.is_thumbnail).collect();
    assert_eq!(thumbs.len(), 1);
    assert_eq!(thumbs[0].alt_text.as_deref(), Some("back"));
    let thumb_id = thumbs[0].id;

    // Deleting the thumbnail hands the flag to the survivor
    let mut update = base_update(1);
    update.image_ops = Some(ImageOps {
        delete: vec![thumb_id],
        ..Default::default()
    });
    let updated = catalog.update_product(product.id, update).await.unwrap();
    assert_eq!(updated.images.len(), 1);
    assert!(updated.images[0].is_thumbnail);

    // Removing the last image fails the whole request
    let mut update = base_update(2);
    update.image_ops = Some(ImageOps {
        delete: vec![updated.images[0].id],
        ..Default::default()
    });
    let err = catalog.update_product(product.id, update).await.unwrap_err();
    let AppError::CatalogRules(violations) = err else {
        panic!("expected catalog rules error");
    };
    assert!(violations.contains(ViolationCode::NoImagesRemain));
}

#[tokio::test]
async fn test_listing_cache_sees_writes() {
    let (catalog, _checkout, _db) = setup().await;
    let category = seed_category(&catalog, "Cumin", &[]).await;
    let filter = || ProductFilter {
        category_id: Some(category.id),
        status: None,
        page: 0,
        page_size: 20,
    };

    assert!(catalog.list_products(filter()).await.unwrap().is_empty());

    // The write must invalidate the cached empty listing
    seed_product(
        &catalog,
        category.id,
        "Cumin Seeds",
        vec![variant("bag", 300, 10, &[])],
    )
    .await;
    let listed = catalog.list_products(filter()).await.unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].name, "Cumin Seeds");
}

#[tokio::test]
async fn test_bulk_status_applies_readiness_per_product() {
    let (catalog, _checkout, _db) = setup().await;
    let category = seed_category(&catalog, "Salts", &[("Grain", &["fine", "coarse"])]).await;
    let grain = &category.attributes[0].values;

    let ready = seed_product(
        &catalog,
        category.id,
        "Sea Salt",
        vec![variant("fine", 250, 10, &[grain[0].id])],
    )
    .await;
    let mut unpriced = base_create(category.id, "Display Salt");
    unpriced.status = Some(ProductStatus::Draft);
    unpriced.variants = vec![variant("coarse", 0, 10, &[grain[1].id])];
    let unpriced = catalog.create_product(unpriced).await.unwrap();

    let outcome = catalog
        .bulk_set_status(&[ready.id, unpriced.id, 9999], ProductStatus::Published)
        .await
        .unwrap();

    assert_eq!(outcome.missing, vec![9999]);
    let by_id = |id: i64| {
        outcome
            .updated
            .iter()
            .find(|p| p.id == id)
            .unwrap()
            .status
    };
    assert_eq!(by_id(ready.id), ProductStatus::Published);
    // Not publish-ready: lands in DRAFT instead of failing the batch
    assert_eq!(by_id(unpriced.id), ProductStatus::Draft);
}

#[tokio::test]
async fn test_category_schema_replacement_downgrades_published_products() {
    let (catalog, _checkout, _db) = setup().await;
    let category = seed_category(&catalog, "Herbs", &[("Form", &["dried", "fresh"])]).await;
    let form = &category.attributes[0].values;
    let product = seed_product(
        &catalog,
        category.id,
        "Oregano",
        vec![
            variant("dried", 200, 10, &[form[0].id]),
            variant("fresh", 300, 10, &[form[1].id]),
        ],
    )
    .await;
    assert_eq!(product.status, ProductStatus::Published);

    // Replace the schema: old values vanish, variants lose their values
    catalog
        .update_category(
            category.id,
            shared::models::CategoryUpdate {
                name: None,
                sort_order: None,
                attributes: Some(vec![shared::models::AttributeCreate {
                    name: "Origin".to_string(),
                    values: vec!["Greece".to_string(), "Turkey".to_string()],
                }]),
            },
        )
        .await
        .unwrap();

    let product = catalog.get_product(product.id).await.unwrap();
    assert_eq!(product.status, ProductStatus::Draft);
}
