//! Product Repository
//!
//! Every product write bumps `version`; guarded updates embed the
//! expected version in the UPDATE itself so the check and the write are
//! one statement.

use super::{RepoError, RepoResult, image, variant};
use shared::models::{Product, ProductStatus};
use sqlx::{SqliteConnection, SqlitePool};

/// Listing query filters, pagination included.
#[derive(Debug, Clone, Default)]
pub struct ProductFilter {
    pub category_id: Option<i64>,
    pub status: Option<ProductStatus>,
    pub page: u32,
    pub page_size: u32,
}

pub async fn list(pool: &SqlitePool, filter: &ProductFilter) -> RepoResult<Vec<Product>> {
    let page_size = filter.page_size.clamp(1, 100) as i64;
    let offset = filter.page as i64 * page_size;

    let mut sql = String::from(
        "SELECT id, name, slug, description, status, version, category_id FROM product WHERE 1=1",
    );
    if filter.category_id.is_some() {
        sql.push_str(" AND category_id = ?");
    }
    if filter.status.is_some() {
        sql.push_str(" AND status = ?");
    }
    sql.push_str(" ORDER BY id LIMIT ? OFFSET ?");

    let mut query = sqlx::query_as::<_, Product>(&sql);
    if let Some(category_id) = filter.category_id {
        query = query.bind(category_id);
    }
    if let Some(status) = filter.status {
        query = query.bind(status);
    }
    let mut products = query.bind(page_size).bind(offset).fetch_all(pool).await?;

    let mut conn = pool.acquire().await?;
    for product in &mut products {
        product.variants = variant::list_for_product(&mut conn, product.id).await?;
        product.images = image::list_for_product(&mut conn, product.id).await?;
    }
    Ok(products)
}

pub async fn find_by_id(pool: &SqlitePool, id: i64) -> RepoResult<Option<Product>> {
    let product = sqlx::query_as::<_, Product>(
        "SELECT id, name, slug, description, status, version, category_id FROM product WHERE id = ?",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;
    match product {
        Some(mut product) => {
            let mut conn = pool.acquire().await?;
            product.variants = variant::list_for_product(&mut conn, product.id).await?;
            product.images = image::list_for_product(&mut conn, product.id).await?;
            Ok(Some(product))
        }
        None => Ok(None),
    }
}

pub async fn insert(
    conn: &mut SqliteConnection,
    name: &str,
    slug: &str,
    description: Option<&str>,
    status: ProductStatus,
    category_id: i64,
) -> RepoResult<i64> {
    let id: i64 = sqlx::query_scalar(
        "INSERT INTO product (name, slug, description, status, category_id) \
         VALUES (?, ?, ?, ?, ?) RETURNING id",
    )
    .bind(name)
    .bind(slug)
    .bind(description)
    .bind(status)
    .bind(category_id)
    .fetch_one(conn)
    .await?;
    Ok(id)
}

/// Guarded update: only applies when the stored version still matches
/// `expected_version`. Returns false when no row changed, which the
/// caller disambiguates into not-found vs version-conflict.
pub async fn update_guarded(
    conn: &mut SqliteConnection,
    id: i64,
    expected_version: i64,
    name: Option<&str>,
    description: Option<&str>,
    category_id: Option<i64>,
    status: ProductStatus,
) -> RepoResult<bool> {
    let rows = sqlx::query(
        "UPDATE product SET \
            name = COALESCE(?1, name), \
            description = COALESCE(?2, description), \
            category_id = COALESCE(?3, category_id), \
            status = ?4, \
            version = version + 1 \
         WHERE id = ?5 AND version = ?6",
    )
    .bind(name)
    .bind(description)
    .bind(category_id)
    .bind(status)
    .bind(id)
    .bind(expected_version)
    .execute(conn)
    .await?;
    Ok(rows.rows_affected() == 1)
}

/// Unguarded status write used by category-schema resolution, where the
/// server itself is the writer.
pub async fn set_status(
    conn: &mut SqliteConnection,
    id: i64,
    status: ProductStatus,
) -> RepoResult<()> {
    sqlx::query("UPDATE product SET status = ?, version = version + 1 WHERE id = ?")
        .bind(status)
        .bind(id)
        .execute(conn)
        .await?;
    Ok(())
}

pub async fn delete(pool: &SqlitePool, id: i64) -> RepoResult<bool> {
    let rows = sqlx::query("DELETE FROM product WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(rows.rows_affected() > 0)
}

pub async fn slug_exists(conn: &mut SqliteConnection, slug: &str) -> RepoResult<bool> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM product WHERE slug = ?")
        .bind(slug)
        .fetch_one(conn)
        .await?;
    Ok(count > 0)
}

/// Derive a unique slug from the product name, suffixing -2, -3, ... on
/// collision.
pub async fn unique_slug(conn: &mut SqliteConnection, name: &str) -> RepoResult<String> {
    let base = crate::utils::slug::slugify(name);
    if !slug_exists(conn, &base).await? {
        return Ok(base);
    }
    for n in 2..1000 {
        let candidate = crate::utils::slug::with_suffix(&base, n);
        if !slug_exists(conn, &candidate).await? {
            return Ok(candidate);
        }
    }
    Err(RepoError::Validation(format!(
        "Could not derive a unique slug for '{name}'"
    )))
}

/// All products in a category, rows only (category-schema resolution).
pub async fn list_rows_in_category(
    conn: &mut SqliteConnection,
    category_id: i64,
) -> RepoResult<Vec<Product>> {
    let products = sqlx::query_as::<_, Product>(
        "SELECT id, name, slug, description, status, version, category_id \
         FROM product WHERE category_id = ? ORDER BY id",
    )
    .bind(category_id)
    .fetch_all(conn)
    .await?;
    Ok(products)
}
