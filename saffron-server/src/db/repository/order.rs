//! Order Repository
//!
//! Orders and their line items are written in the checkout transaction;
//! status transitions are single guarded UPDATEs.

use super::RepoResult;
use shared::models::{Order, OrderItem, OrderStatus, ShippingAddress, ShippingStatus};
use sqlx::{SqliteConnection, SqlitePool};

#[allow(clippy::too_many_arguments)]
pub async fn insert(
    conn: &mut SqliteConnection,
    user_id: &str,
    subtotal: i64,
    shipping_fee: i64,
    total: i64,
    currency: &str,
    address: &ShippingAddress,
    created_at: &str,
) -> RepoResult<i64> {
    let id: i64 = sqlx::query_scalar(
        "INSERT INTO orders (user_id, status, shipping_status, subtotal, shipping_fee, total, \
                             currency, ship_name, ship_line1, ship_line2, ship_city, \
                             ship_postal_code, ship_country, created_at) \
         VALUES (?, 'PENDING', 'NOT_SHIPPED', ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?) RETURNING id",
    )
    .bind(user_id)
    .bind(subtotal)
    .bind(shipping_fee)
    .bind(total)
    .bind(currency)
    .bind(&address.name)
    .bind(&address.line1)
    .bind(&address.line2)
    .bind(&address.city)
    .bind(&address.postal_code)
    .bind(&address.country)
    .bind(created_at)
    .fetch_one(conn)
    .await?;
    Ok(id)
}

#[allow(clippy::too_many_arguments)]
pub async fn insert_item(
    conn: &mut SqliteConnection,
    order_id: i64,
    product_id: i64,
    variant_id: i64,
    name: &str,
    sku: Option<&str>,
    unit_price: i64,
    quantity: i64,
    line_total: i64,
) -> RepoResult<i64> {
    let id: i64 = sqlx::query_scalar(
        "INSERT INTO order_item (order_id, product_id, variant_id, name, sku, unit_price, \
                                 quantity, line_total) \
         VALUES (?, ?, ?, ?, ?, ?, ?, ?) RETURNING id",
    )
    .bind(order_id)
    .bind(product_id)
    .bind(variant_id)
    .bind(name)
    .bind(sku)
    .bind(unit_price)
    .bind(quantity)
    .bind(line_total)
    .fetch_one(conn)
    .await?;
    Ok(id)
}

const ORDER_COLUMNS: &str = "id, user_id, status, shipping_status, subtotal, shipping_fee, total, \
                             currency, payment_session_id, payment_reference, ship_name, \
                             ship_line1, ship_line2, ship_city, ship_postal_code, ship_country, \
                             created_at";

pub async fn find_by_id(pool: &SqlitePool, id: i64) -> RepoResult<Option<Order>> {
    let sql = format!("SELECT {ORDER_COLUMNS} FROM orders WHERE id = ?");
    let order = sqlx::query_as::<_, Order>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await?;
    match order {
        Some(mut order) => {
            order.items = load_items(pool, order.id).await?;
            Ok(Some(order))
        }
        None => Ok(None),
    }
}

pub async fn list_by_user(pool: &SqlitePool, user_id: &str) -> RepoResult<Vec<Order>> {
    let sql = format!("SELECT {ORDER_COLUMNS} FROM orders WHERE user_id = ? ORDER BY id DESC");
    let mut orders = sqlx::query_as::<_, Order>(&sql)
        .bind(user_id)
        .fetch_all(pool)
        .await?;
    for order in &mut orders {
        order.items = load_items(pool, order.id).await?;
    }
    Ok(orders)
}

async fn load_items(pool: &SqlitePool, order_id: i64) -> RepoResult<Vec<OrderItem>> {
    let items = sqlx::query_as::<_, OrderItem>(
        "SELECT id, order_id, product_id, variant_id, name, sku, unit_price, quantity, line_total \
         FROM order_item WHERE order_id = ? ORDER BY id",
    )
    .bind(order_id)
    .fetch_all(pool)
    .await?;
    Ok(items)
}

pub async fn set_payment_session(
    pool: &SqlitePool,
    order_id: i64,
    session_id: &str,
) -> RepoResult<()> {
    sqlx::query("UPDATE orders SET payment_session_id = ? WHERE id = ?")
        .bind(session_id)
        .bind(order_id)
        .execute(pool)
        .await?;
    Ok(())
}

/// Mark an order PAID, guarded on it still being PENDING. Returns false
/// when the guard failed (already paid, cancelled, or unknown).
pub async fn complete_payment(
    conn: &mut SqliteConnection,
    order_id: i64,
    payment_reference: &str,
) -> RepoResult<bool> {
    let rows = sqlx::query(
        "UPDATE orders SET status = 'PAID', payment_reference = ? \
         WHERE id = ? AND status = 'PENDING'",
    )
    .bind(payment_reference)
    .bind(order_id)
    .execute(conn)
    .await?;
    Ok(rows.rows_affected() == 1)
}

/// Guarded status transition: only applies when the order is still in
/// `from`. Returns false on guard failure.
pub async fn transition_status(
    conn: &mut SqliteConnection,
    order_id: i64,
    from: OrderStatus,
    to: OrderStatus,
) -> RepoResult<bool> {
    let rows = sqlx::query("UPDATE orders SET status = ? WHERE id = ? AND status = ?")
        .bind(to)
        .bind(order_id)
        .bind(from)
        .execute(conn)
        .await?;
    Ok(rows.rows_affected() == 1)
}

pub async fn set_shipping_status(
    pool: &SqlitePool,
    order_id: i64,
    shipping_status: ShippingStatus,
) -> RepoResult<bool> {
    let rows = sqlx::query("UPDATE orders SET shipping_status = ? WHERE id = ?")
        .bind(shipping_status)
        .bind(order_id)
        .execute(pool)
        .await?;
    Ok(rows.rows_affected() == 1)
}

/// Items with quantities, for restock on cancellation.
pub async fn items_for_restock(
    conn: &mut SqliteConnection,
    order_id: i64,
) -> RepoResult<Vec<(i64, i64)>> {
    let rows: Vec<(i64, i64)> = sqlx::query_as(
        "SELECT variant_id, quantity FROM order_item WHERE order_id = ?",
    )
    .bind(order_id)
    .fetch_all(conn)
    .await?;
    Ok(rows)
}
