//! Category Repository
//!
//! Categories own their attributes and values (cascade delete). The
//! attribute schema is replaced wholesale on update; partial attribute
//! edits are not supported.

use super::{RepoError, RepoResult};
use shared::models::{Attribute, AttributeCreate, AttributeValue, Category, CategoryCreate, CategoryUpdate};
use sqlx::SqlitePool;

pub async fn find_all(pool: &SqlitePool) -> RepoResult<Vec<Category>> {
    let mut categories = sqlx::query_as::<_, Category>(
        "SELECT id, name, sort_order FROM category ORDER BY sort_order, name",
    )
    .fetch_all(pool)
    .await?;
    for category in &mut categories {
        category.attributes = load_attributes(pool, category.id).await?;
    }
    Ok(categories)
}

pub async fn find_by_id(pool: &SqlitePool, id: i64) -> RepoResult<Option<Category>> {
    let category =
        sqlx::query_as::<_, Category>("SELECT id, name, sort_order FROM category WHERE id = ?")
            .bind(id)
            .fetch_optional(pool)
            .await?;
    match category {
        Some(mut category) => {
            category.attributes = load_attributes(pool, category.id).await?;
            Ok(Some(category))
        }
        None => Ok(None),
    }
}

/// Load a category's attributes with their values, in display order.
pub async fn load_attributes(pool: &SqlitePool, category_id: i64) -> RepoResult<Vec<Attribute>> {
    let mut attributes = sqlx::query_as::<_, Attribute>(
        "SELECT id, category_id, name, sort_order FROM attribute WHERE category_id = ? ORDER BY sort_order, id",
    )
    .bind(category_id)
    .fetch_all(pool)
    .await?;
    for attr in &mut attributes {
        attr.values = sqlx::query_as::<_, AttributeValue>(
            "SELECT id, attribute_id, value FROM attribute_value WHERE attribute_id = ? ORDER BY id",
        )
        .bind(attr.id)
        .fetch_all(pool)
        .await?;
    }
    Ok(attributes)
}

pub async fn create(pool: &SqlitePool, data: CategoryCreate) -> RepoResult<Category> {
    let mut tx = pool.begin().await?;

    let id: i64 = sqlx::query_scalar(
        "INSERT INTO category (name, sort_order) VALUES (?, ?) RETURNING id",
    )
    .bind(&data.name)
    .bind(data.sort_order.unwrap_or(0))
    .fetch_one(&mut *tx)
    .await
    .map_err(|e| duplicate_name(e, &data.name))?;

    insert_attributes(&mut tx, id, &data.attributes).await?;
    tx.commit().await?;

    find_by_id(pool, id)
        .await?
        .ok_or_else(|| RepoError::Database("Failed to create category".into()))
}

pub async fn update(pool: &SqlitePool, id: i64, data: CategoryUpdate) -> RepoResult<Category> {
    let mut tx = pool.begin().await?;

    let rows = sqlx::query(
        "UPDATE category SET name = COALESCE(?1, name), sort_order = COALESCE(?2, sort_order) WHERE id = ?3",
    )
    .bind(&data.name)
    .bind(data.sort_order)
    .bind(id)
    .execute(&mut *tx)
    .await
    .map_err(|e| duplicate_name(e, data.name.as_deref().unwrap_or("")))?;
    if rows.rows_affected() == 0 {
        return Err(RepoError::NotFound(format!("Category {id} not found")));
    }

    // Replace the whole attribute schema when one is supplied
    if let Some(attributes) = &data.attributes {
        sqlx::query("DELETE FROM attribute WHERE category_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        insert_attributes(&mut tx, id, attributes).await?;
    }

    tx.commit().await?;
    find_by_id(pool, id)
        .await?
        .ok_or_else(|| RepoError::NotFound(format!("Category {id} not found")))
}

pub async fn delete(pool: &SqlitePool, id: i64) -> RepoResult<bool> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM product WHERE category_id = ?")
        .bind(id)
        .fetch_one(pool)
        .await?;
    if count > 0 {
        return Err(RepoError::Validation(
            "Cannot delete a category that still has products".into(),
        ));
    }
    let rows = sqlx::query("DELETE FROM category WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(rows.rows_affected() > 0)
}

async fn insert_attributes(
    tx: &mut sqlx::Transaction<'_, sqlx::Sqlite>,
    category_id: i64,
    attributes: &[AttributeCreate],
) -> RepoResult<()> {
    for (order, attr) in attributes.iter().enumerate() {
        let attr_id: i64 = sqlx::query_scalar(
            "INSERT INTO attribute (category_id, name, sort_order) VALUES (?, ?, ?) RETURNING id",
        )
        .bind(category_id)
        .bind(&attr.name)
        .bind(order as i32)
        .fetch_one(&mut **tx)
        .await?;
        for value in &attr.values {
            sqlx::query("INSERT INTO attribute_value (attribute_id, value) VALUES (?, ?)")
                .bind(attr_id)
                .bind(value)
                .execute(&mut **tx)
                .await?;
        }
    }
    Ok(())
}

fn duplicate_name(e: sqlx::Error, name: &str) -> RepoError {
    match RepoError::from(e) {
        RepoError::Duplicate(_) => {
            RepoError::Duplicate(format!("Category name '{name}' already exists"))
        }
        other => other,
    }
}
