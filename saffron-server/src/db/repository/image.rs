//! Image Repository
//!
//! Images live fully inside the product aggregate. Thumbnail consistency
//! is the catalog engine's job; this module only persists the rows it is
//! handed.

use super::RepoResult;
use shared::models::{Image, ImageFileSet};
use sqlx::SqliteConnection;

pub async fn list_for_product(
    conn: &mut SqliteConnection,
    product_id: i64,
) -> RepoResult<Vec<Image>> {
    let images = sqlx::query_as::<_, Image>(
        "SELECT id, product_id, thumb_key, thumb_url, medium_key, medium_url, \
                large_key, large_url, alt_text, is_thumbnail, position \
         FROM image WHERE product_id = ? ORDER BY position, id",
    )
    .bind(product_id)
    .fetch_all(conn)
    .await?;
    Ok(images)
}

pub async fn find_by_id(conn: &mut SqliteConnection, id: i64) -> RepoResult<Option<Image>> {
    let img = sqlx::query_as::<_, Image>(
        "SELECT id, product_id, thumb_key, thumb_url, medium_key, medium_url, \
                large_key, large_url, alt_text, is_thumbnail, position \
         FROM image WHERE id = ?",
    )
    .bind(id)
    .fetch_optional(conn)
    .await?;
    Ok(img)
}

pub async fn insert(
    conn: &mut SqliteConnection,
    product_id: i64,
    files: &ImageFileSet,
    alt_text: Option<&str>,
    is_thumbnail: bool,
    position: i32,
) -> RepoResult<i64> {
    let id: i64 = sqlx::query_scalar(
        "INSERT INTO image (product_id, thumb_key, thumb_url, medium_key, medium_url, \
                            large_key, large_url, alt_text, is_thumbnail, position) \
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?) RETURNING id",
    )
    .bind(product_id)
    .bind(&files.thumb.key)
    .bind(&files.thumb.url)
    .bind(&files.medium.key)
    .bind(&files.medium.url)
    .bind(&files.large.key)
    .bind(&files.large.url)
    .bind(alt_text)
    .bind(is_thumbnail)
    .bind(position)
    .fetch_one(conn)
    .await?;
    Ok(id)
}

/// Partial update; `files` when present replaces all three size slots.
pub async fn apply_update(
    conn: &mut SqliteConnection,
    id: i64,
    files: Option<&ImageFileSet>,
    alt_text: Option<&str>,
    is_thumbnail: Option<bool>,
    position: Option<i32>,
) -> RepoResult<()> {
    if let Some(files) = files {
        sqlx::query(
            "UPDATE image SET thumb_key = ?, thumb_url = ?, medium_key = ?, medium_url = ?, \
                              large_key = ?, large_url = ? WHERE id = ?",
        )
        .bind(&files.thumb.key)
        .bind(&files.thumb.url)
        .bind(&files.medium.key)
        .bind(&files.medium.url)
        .bind(&files.large.key)
        .bind(&files.large.url)
        .bind(id)
        .execute(&mut *conn)
        .await?;
    }
    sqlx::query(
        "UPDATE image SET \
            alt_text = COALESCE(?1, alt_text), \
            is_thumbnail = COALESCE(?2, is_thumbnail), \
            position = COALESCE(?3, position) \
         WHERE id = ?4",
    )
    .bind(alt_text)
    .bind(is_thumbnail)
    .bind(position)
    .bind(id)
    .execute(conn)
    .await?;
    Ok(())
}

pub async fn delete(conn: &mut SqliteConnection, id: i64) -> RepoResult<()> {
    sqlx::query("DELETE FROM image WHERE id = ?")
        .bind(id)
        .execute(conn)
        .await?;
    Ok(())
}

/// Storage keys for a set of images, so the service can clean up files
/// after the delete commits.
pub async fn storage_keys(conn: &mut SqliteConnection, ids: &[i64]) -> RepoResult<Vec<String>> {
    let mut keys = Vec::with_capacity(ids.len() * 3);
    for id in ids {
        if let Some(img) = find_by_id(conn, *id).await? {
            keys.push(img.thumb_key);
            keys.push(img.medium_key);
            keys.push(img.large_key);
        }
    }
    Ok(keys)
}
