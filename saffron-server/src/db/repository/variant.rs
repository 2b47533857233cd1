//! Product Variant Repository
//!
//! All stock mutations go through the conditional-decrement pattern:
//! the stock check and the write happen in the same UPDATE statement, so
//! concurrent checkouts on one variant serialize at the row.

use super::RepoResult;
use shared::models::{ProductVariant, VariantCreate, VariantUpdate};
use sqlx::SqliteConnection;

pub async fn list_for_product(
    conn: &mut SqliteConnection,
    product_id: i64,
) -> RepoResult<Vec<ProductVariant>> {
    let mut variants = sqlx::query_as::<_, ProductVariant>(
        "SELECT id, product_id, name, sku, price, stock, currency FROM product_variant WHERE product_id = ? ORDER BY id",
    )
    .bind(product_id)
    .fetch_all(&mut *conn)
    .await?;
    for variant in &mut variants {
        variant.attribute_value_ids = value_ids(conn, variant.id).await?;
    }
    Ok(variants)
}

pub async fn value_ids(conn: &mut SqliteConnection, variant_id: i64) -> RepoResult<Vec<i64>> {
    let ids: Vec<i64> = sqlx::query_scalar(
        "SELECT value_id FROM variant_attribute_value WHERE variant_id = ? ORDER BY value_id",
    )
    .bind(variant_id)
    .fetch_all(conn)
    .await?;
    Ok(ids)
}

pub async fn insert(
    conn: &mut SqliteConnection,
    product_id: i64,
    data: &VariantCreate,
    default_currency: &str,
) -> RepoResult<i64> {
    let id: i64 = sqlx::query_scalar(
        "INSERT INTO product_variant (product_id, name, sku, price, stock, currency) \
         VALUES (?, ?, ?, ?, ?, ?) RETURNING id",
    )
    .bind(product_id)
    .bind(&data.name)
    .bind(&data.sku)
    .bind(data.price)
    .bind(data.stock)
    .bind(data.currency.as_deref().unwrap_or(default_currency))
    .fetch_one(&mut *conn)
    .await?;
    replace_value_ids(conn, id, &data.attribute_value_ids).await?;
    Ok(id)
}

pub async fn apply_update(conn: &mut SqliteConnection, data: &VariantUpdate) -> RepoResult<()> {
    sqlx::query(
        "UPDATE product_variant SET \
            name = COALESCE(?1, name), \
            sku = COALESCE(?2, sku), \
            price = COALESCE(?3, price), \
            stock = COALESCE(?4, stock) \
         WHERE id = ?5",
    )
    .bind(&data.name)
    .bind(&data.sku)
    .bind(data.price)
    .bind(data.stock)
    .bind(data.id)
    .execute(&mut *conn)
    .await?;

    if let Some(ids) = &data.attribute_value_ids {
        replace_value_ids(conn, data.id, ids).await?;
    }
    Ok(())
}

pub async fn delete(conn: &mut SqliteConnection, id: i64) -> RepoResult<()> {
    sqlx::query("DELETE FROM product_variant WHERE id = ?")
        .bind(id)
        .execute(conn)
        .await?;
    Ok(())
}

async fn replace_value_ids(
    conn: &mut SqliteConnection,
    variant_id: i64,
    ids: &[i64],
) -> RepoResult<()> {
    sqlx::query("DELETE FROM variant_attribute_value WHERE variant_id = ?")
        .bind(variant_id)
        .execute(&mut *conn)
        .await?;
    for value_id in ids {
        sqlx::query("INSERT INTO variant_attribute_value (variant_id, value_id) VALUES (?, ?)")
            .bind(variant_id)
            .bind(value_id)
            .execute(&mut *conn)
            .await?;
    }
    Ok(())
}

// =============================================================================
// Stock reservation
// =============================================================================

/// Conditionally decrement stock: succeeds only when `stock >= quantity`
/// at write time. Returns false when zero rows were affected (insufficient
/// stock or unknown variant).
pub async fn reserve_stock(
    conn: &mut SqliteConnection,
    variant_id: i64,
    quantity: i64,
) -> RepoResult<bool> {
    let rows = sqlx::query(
        "UPDATE product_variant SET stock = stock - ?1 WHERE id = ?2 AND stock >= ?1",
    )
    .bind(quantity)
    .bind(variant_id)
    .execute(conn)
    .await?;
    Ok(rows.rows_affected() == 1)
}

/// Return previously reserved stock (order cancellation).
pub async fn restore_stock(
    conn: &mut SqliteConnection,
    variant_id: i64,
    quantity: i64,
) -> RepoResult<()> {
    sqlx::query("UPDATE product_variant SET stock = stock + ?1 WHERE id = ?2")
        .bind(quantity)
        .bind(variant_id)
        .execute(conn)
        .await?;
    Ok(())
}

/// Snapshot row for order items: variant joined with its product name.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct VariantSnapshot {
    pub variant_id: i64,
    pub product_id: i64,
    pub product_name: String,
    pub variant_name: Option<String>,
    pub sku: Option<String>,
    pub price: i64,
    pub currency: String,
}

pub async fn snapshot(
    conn: &mut SqliteConnection,
    variant_id: i64,
) -> RepoResult<Option<VariantSnapshot>> {
    let snapshot = sqlx::query_as::<_, VariantSnapshot>(
        "SELECT v.id AS variant_id, p.id AS product_id, p.name AS product_name, \
                v.name AS variant_name, v.sku, v.price, v.currency \
         FROM product_variant v JOIN product p ON p.id = v.product_id \
         WHERE v.id = ?",
    )
    .bind(variant_id)
    .fetch_optional(conn)
    .await?;
    Ok(snapshot)
}
