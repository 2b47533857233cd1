//! Catalog Service
//!
//! Orchestrates category and product mutations: runs the pure rule
//! modules against current rows, applies the deltas inside one sqlx
//! transaction, then invalidates the listing cache and cleans up
//! storage. Handlers stay thin; everything stateful happens here.

use std::sync::Arc;

use shared::models::{
    Category, CategoryCreate, CategoryUpdate, ImageFileSet, ImageOps, Product, ProductCreate,
    ProductStatus, ProductUpdate, VariantOps,
};

use crate::catalog::cache::{ListingCache, ListingKey};
use crate::catalog::publish::{
    publish_blockers, resolve_status, resolve_status_for_category_change,
};
use crate::catalog::schema::CategorySchema;
use crate::catalog::thumbnail::{reconcile_thumbnails, validate_file_refs};
use crate::catalog::variants::{
    FinalVariant, VariantState, check_category_capacity, validate_variant_ops,
};
use crate::db::DbService;
use crate::db::repository::{category, image, product, variant};
use crate::db::repository::product::ProductFilter;
use crate::storage::FileStorage;
use crate::utils::validation::{
    MAX_NAME_LEN, MAX_TEXT_LEN, validate_amount, validate_optional_text, validate_required_text,
};
use crate::utils::{AppError, AppResult};

/// Outcome of a bulk status request: missing ids are reported, not fatal.
#[derive(Debug, serde::Serialize)]
pub struct BulkStatusOutcome {
    pub updated: Vec<Product>,
    pub missing: Vec<i64>,
}

#[derive(Clone)]
pub struct CatalogService {
    db: DbService,
    cache: ListingCache,
    storage: Arc<dyn FileStorage>,
    default_currency: String,
}

impl CatalogService {
    pub fn new(
        db: DbService,
        cache: ListingCache,
        storage: Arc<dyn FileStorage>,
        default_currency: String,
    ) -> Self {
        Self {
            db,
            cache,
            storage,
            default_currency,
        }
    }

    // =========================================================================
    // Categories
    // =========================================================================

    pub async fn list_categories(&self) -> AppResult<Vec<Category>> {
        Ok(category::find_all(&self.db.pool).await?)
    }

    pub async fn get_category(&self, id: i64) -> AppResult<Category> {
        category::find_by_id(&self.db.pool, id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Category {id} not found")))
    }

    pub async fn create_category(&self, data: CategoryCreate) -> AppResult<Category> {
        validate_required_text(&data.name, "name", MAX_NAME_LEN)?;
        for attr in &data.attributes {
            validate_required_text(&attr.name, "attribute name", MAX_NAME_LEN)?;
            for value in &attr.values {
                validate_required_text(value, "attribute value", MAX_NAME_LEN)?;
            }
        }
        Ok(category::create(&self.db.pool, data).await?)
    }

    /// Update a category. Replacing the attribute schema re-checks every
    /// product in the category and downgrades PUBLISHED products whose
    /// variant sets no longer qualify.
    pub async fn update_category(&self, id: i64, data: CategoryUpdate) -> AppResult<Category> {
        if let Some(name) = &data.name {
            validate_required_text(name, "name", MAX_NAME_LEN)?;
        }
        let schema_replaced = data.attributes.is_some();
        let updated = category::update(&self.db.pool, id, data).await?;

        if schema_replaced {
            self.resync_category_products(id).await?;
            self.cache.invalidate(Some(id), None).await;
        }
        Ok(updated)
    }

    pub async fn delete_category(&self, id: i64) -> AppResult<()> {
        let deleted = category::delete(&self.db.pool, id).await?;
        if !deleted {
            return Err(AppError::not_found(format!("Category {id} not found")));
        }
        self.cache.invalidate(Some(id), None).await;
        Ok(())
    }

    /// Downgrade published products whose variants lost publish
    /// readiness after an attribute-schema replacement. Value deletion
    /// cascades through the junction table, so variants may have lost
    /// their distinguishing values here.
    async fn resync_category_products(&self, category_id: i64) -> AppResult<()> {
        let schema = self.load_schema(category_id).await?;
        let mut conn = self.db.pool.acquire().await?;
        let rows = product::list_rows_in_category(&mut conn, category_id).await?;

        for row in rows {
            if row.status != ProductStatus::Published {
                continue;
            }
            let variants = variant::list_for_product(&mut conn, row.id).await?;
            let states: Vec<VariantState> =
                variants.iter().map(VariantState::from_variant).collect();
            let finals = crate::catalog::variants::apply_ops(&states, &VariantOps::default());
            if !publish_blockers(schema.has_attributes(), &finals).is_empty() {
                product::set_status(&mut conn, row.id, ProductStatus::Draft).await?;
                tracing::info!(product_id = row.id, "Product downgraded to draft after category schema change");
            }
        }
        Ok(())
    }

    async fn load_schema(&self, category_id: i64) -> AppResult<CategorySchema> {
        let category = category::find_by_id(&self.db.pool, category_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Category {category_id} not found")))?;
        Ok(CategorySchema::from_category(&category))
    }

    // =========================================================================
    // Products
    // =========================================================================

    /// List products through the cache. Entries may be up to the TTL
    /// stale; every write path invalidates the affected keys.
    pub async fn list_products(&self, filter: ProductFilter) -> AppResult<Vec<Product>> {
        let key = ListingKey {
            category_id: filter.category_id,
            status: filter.status,
            page: filter.page,
            page_size: filter.page_size,
        };
        if let Some(hit) = self.cache.get(&key).await {
            return Ok((*hit).clone());
        }
        let products = product::list(&self.db.pool, &filter).await?;
        self.cache.insert(key, products.clone()).await;
        Ok(products)
    }

    pub async fn get_product(&self, id: i64) -> AppResult<Product> {
        product::find_by_id(&self.db.pool, id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Product {id} not found")))
    }

    pub async fn create_product(&self, data: ProductCreate) -> AppResult<Product> {
        let files = data.files.clone();
        let result = self.create_product_inner(data).await;
        if result.is_err() {
            self.discard_files(&files).await;
        }
        result
    }

    async fn create_product_inner(&self, data: ProductCreate) -> AppResult<Product> {
        validate_required_text(&data.name, "name", MAX_NAME_LEN)?;
        validate_optional_text(&data.description, "description", MAX_TEXT_LEN)?;
        if data.variants.is_empty() {
            return Err(AppError::validation("a product needs at least one variant"));
        }
        if data.images.is_empty() {
            return Err(AppError::validation("a product needs at least one image"));
        }
        for v in &data.variants {
            validate_amount(v.price, "price")?;
            validate_amount(v.stock, "stock")?;
        }

        let schema = self.load_schema(data.category_id).await?;

        let variant_ops = VariantOps {
            create: data.variants.clone(),
            ..Default::default()
        };
        let finals = validate_variant_ops(&schema, &[], &variant_ops)?;

        let image_ops = ImageOps {
            create: data.images.clone(),
            ..Default::default()
        };
        validate_file_refs(&image_ops, data.files.len())?;
        let patched = reconcile_thumbnails(&[], &image_ops)?;

        let status = resolve_status(
            data.status.unwrap_or(ProductStatus::Draft),
            schema.has_attributes(),
            &finals,
        );

        let mut tx = self.db.pool.begin().await?;
        let slug = product::unique_slug(&mut tx, &data.name).await?;
        let product_id = product::insert(
            &mut tx,
            &data.name,
            &slug,
            data.description.as_deref(),
            status,
            data.category_id,
        )
        .await?;

        for v in &data.variants {
            variant::insert(&mut tx, product_id, v, &self.default_currency).await?;
        }
        for (position, op) in patched.create.iter().enumerate() {
            let files = data
                .files
                .get(op.file_index)
                .ok_or_else(|| AppError::internal("file index out of bounds after validation"))?;
            image::insert(
                &mut tx,
                product_id,
                files,
                op.alt_text.as_deref(),
                op.is_thumbnail,
                op.position.unwrap_or(position as i32),
            )
            .await?;
        }
        tx.commit().await?;

        self.cache.invalidate(Some(data.category_id), None).await;
        tracing::info!(product_id, status = status.as_str(), "Product created");
        self.get_product(product_id).await
    }

    pub async fn update_product(&self, id: i64, data: ProductUpdate) -> AppResult<Product> {
        let files = data.files.clone();
        let result = self.update_product_inner(id, data).await;
        if result.is_err() {
            self.discard_files(&files).await;
        }
        result
    }

    async fn update_product_inner(&self, id: i64, data: ProductUpdate) -> AppResult<Product> {
        if let Some(name) = &data.name {
            validate_required_text(name, "name", MAX_NAME_LEN)?;
        }
        validate_optional_text(&data.description, "description", MAX_TEXT_LEN)?;

        let current = self.get_product(id).await?;
        if current.version != data.expected_version {
            return Err(AppError::VersionConflict {
                expected: data.expected_version,
            });
        }

        let category_changed = data
            .category_id
            .is_some_and(|c| c != current.category_id);
        let target_category_id = data.category_id.unwrap_or(current.category_id);
        let schema = self.load_schema(target_category_id).await?;

        let variant_ops = data.variant_ops.clone().unwrap_or_default();
        for v in &variant_ops.create {
            validate_amount(v.price, "price")?;
            validate_amount(v.stock, "stock")?;
        }
        for u in &variant_ops.update {
            if let Some(price) = u.price {
                validate_amount(price, "price")?;
            }
            if let Some(stock) = u.stock {
                validate_amount(stock, "stock")?;
            }
        }
        self.check_variant_ownership(&current, &variant_ops)?;
        let states: Vec<VariantState> = current
            .variants
            .iter()
            .map(VariantState::from_variant)
            .collect();

        if category_changed {
            let final_count = crate::catalog::variants::apply_ops(&states, &variant_ops).len();
            check_category_capacity(&schema, final_count)?;
        }

        let finals = validate_variant_ops(&schema, &states, &variant_ops)?;
        if finals.is_empty() {
            return Err(AppError::validation("at least one variant must remain"));
        }

        let image_ops = data.image_ops.clone().unwrap_or_default();
        self.check_image_ownership(&current, &image_ops)?;
        validate_file_refs(&image_ops, data.files.len())?;
        let patched = reconcile_thumbnails(&current.images, &image_ops)?;

        let status = self.resolve_update_status(&current, &data, category_changed, &schema, &finals);

        let mut tx = self.db.pool.begin().await?;

        let applied = product::update_guarded(
            &mut tx,
            id,
            data.expected_version,
            data.name.as_deref(),
            data.description.as_deref(),
            data.category_id,
            status,
        )
        .await?;
        if !applied {
            // Row was there a moment ago: someone else won the write
            return Err(AppError::VersionConflict {
                expected: data.expected_version,
            });
        }

        for variant_id in &variant_ops.delete {
            variant::delete(&mut tx, *variant_id).await?;
        }
        for u in &variant_ops.update {
            variant::apply_update(&mut tx, u).await?;
        }
        for c in &variant_ops.create {
            variant::insert(&mut tx, id, c, &self.default_currency).await?;
        }

        // Keys of deleted images, and of the file sets replaced by updates
        let replaced_ids: Vec<i64> = patched
            .update
            .iter()
            .filter(|u| u.file_index.is_some())
            .map(|u| u.id)
            .collect();
        let mut stale_keys = image::storage_keys(&mut tx, &patched.delete).await?;
        stale_keys.extend(image::storage_keys(&mut tx, &replaced_ids).await?);

        for image_id in &patched.delete {
            image::delete(&mut tx, *image_id).await?;
        }
        for u in &patched.update {
            let files = u.file_index.and_then(|i| data.files.get(i));
            image::apply_update(
                &mut tx,
                u.id,
                files,
                u.alt_text.as_deref(),
                u.is_thumbnail,
                u.position,
            )
            .await?;
        }
        let existing_count = current.images.len() as i32;
        for (offset, op) in patched.create.iter().enumerate() {
            let files = data
                .files
                .get(op.file_index)
                .ok_or_else(|| AppError::internal("file index out of bounds after validation"))?;
            image::insert(
                &mut tx,
                id,
                files,
                op.alt_text.as_deref(),
                op.is_thumbnail,
                op.position.unwrap_or(existing_count + offset as i32),
            )
            .await?;
        }

        tx.commit().await?;

        self.storage.delete_by_keys(&stale_keys).await.ok();
        self.cache.invalidate(Some(current.category_id), None).await;
        if category_changed {
            self.cache.invalidate(Some(target_category_id), None).await;
        }
        self.get_product(id).await
    }

    fn resolve_update_status(
        &self,
        current: &Product,
        data: &ProductUpdate,
        category_changed: bool,
        schema: &CategorySchema,
        finals: &[FinalVariant],
    ) -> ProductStatus {
        if category_changed {
            let with_values = finals.iter().filter(|f| f.has_values()).count();
            resolve_status_for_category_change(
                current.status,
                data.status,
                schema.has_attributes(),
                finals.len(),
                with_values,
            )
        } else {
            resolve_status(
                data.status.unwrap_or(current.status),
                schema.has_attributes(),
                finals,
            )
        }
    }

    pub async fn delete_product(&self, id: i64) -> AppResult<()> {
        let current = self.get_product(id).await?;
        let keys: Vec<String> = current
            .images
            .iter()
            .flat_map(|img| {
                [
                    img.thumb_key.clone(),
                    img.medium_key.clone(),
                    img.large_key.clone(),
                ]
            })
            .collect();

        let deleted = product::delete(&self.db.pool, id).await?;
        if !deleted {
            return Err(AppError::not_found(format!("Product {id} not found")));
        }
        self.storage.delete_by_keys(&keys).await.ok();
        self.cache.invalidate(Some(current.category_id), None).await;
        Ok(())
    }

    /// Set the status of many products at once. Publish requests go
    /// through the readiness gates per product; a product that is not
    /// ready lands in DRAFT instead of failing the batch.
    pub async fn bulk_set_status(
        &self,
        ids: &[i64],
        requested: ProductStatus,
    ) -> AppResult<BulkStatusOutcome> {
        let mut outcome = BulkStatusOutcome {
            updated: Vec::new(),
            missing: Vec::new(),
        };

        for &id in ids {
            let Some(current) = product::find_by_id(&self.db.pool, id).await? else {
                outcome.missing.push(id);
                continue;
            };
            let schema = self.load_schema(current.category_id).await?;
            let states: Vec<VariantState> = current
                .variants
                .iter()
                .map(VariantState::from_variant)
                .collect();
            let finals = crate::catalog::variants::apply_ops(&states, &VariantOps::default());
            let status = resolve_status(requested, schema.has_attributes(), &finals);

            let mut conn = self.db.pool.acquire().await?;
            product::set_status(&mut conn, id, status).await?;
            drop(conn);

            self.cache.invalidate(Some(current.category_id), None).await;
            outcome.updated.push(self.get_product(id).await?);
        }
        Ok(outcome)
    }

    // =========================================================================
    // Helpers
    // =========================================================================

    fn check_variant_ownership(&self, product: &Product, ops: &VariantOps) -> AppResult<()> {
        let known: Vec<i64> = product.variants.iter().map(|v| v.id).collect();
        for id in ops.update.iter().map(|u| u.id).chain(ops.delete.iter().copied()) {
            if !known.contains(&id) {
                return Err(AppError::validation(format!(
                    "variant {id} does not belong to product {}",
                    product.id
                )));
            }
        }
        Ok(())
    }

    fn check_image_ownership(&self, product: &Product, ops: &ImageOps) -> AppResult<()> {
        let known: Vec<i64> = product.images.iter().map(|i| i.id).collect();
        for id in ops.update.iter().map(|u| u.id).chain(ops.delete.iter().copied()) {
            if !known.contains(&id) {
                return Err(AppError::validation(format!(
                    "image {id} does not belong to product {}",
                    product.id
                )));
            }
        }
        Ok(())
    }

    /// Best-effort cleanup of uploaded files whose rows never landed.
    async fn discard_files(&self, files: &[ImageFileSet]) {
        if files.is_empty() {
            return;
        }
        let keys: Vec<String> = files
            .iter()
            .flat_map(|f| {
                [
                    f.thumb.key.clone(),
                    f.medium.key.clone(),
                    f.large.key.clone(),
                ]
            })
            .collect();
        self.storage.delete_by_keys(&keys).await.ok();
    }
}
