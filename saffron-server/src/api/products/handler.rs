//! Product API Handlers

use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::Deserialize;
use shared::models::{Product, ProductCreate, ProductStatus, ProductUpdate};

use crate::auth::CurrentUser;
use crate::catalog::service::BulkStatusOutcome;
use crate::core::ServerState;
use crate::db::repository::product::ProductFilter;
use crate::utils::{AppResponse, AppResult, ok};

#[derive(Debug, Deserialize)]
pub struct ListingQuery {
    pub category_id: Option<i64>,
    pub status: Option<ProductStatus>,
    #[serde(default)]
    pub page: u32,
    pub page_size: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub struct BulkStatusRequest {
    pub ids: Vec<i64>,
    pub status: ProductStatus,
}

/// GET /api/products - cached listing with filters
pub async fn list(
    State(state): State<ServerState>,
    Query(query): Query<ListingQuery>,
) -> AppResult<Json<Vec<Product>>> {
    let filter = ProductFilter {
        category_id: query.category_id,
        status: query.status,
        page: query.page,
        page_size: query.page_size.unwrap_or(20),
    };
    Ok(Json(state.catalog.list_products(filter).await?))
}

/// GET /api/products/{id}
pub async fn get_by_id(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
) -> AppResult<Json<Product>> {
    Ok(Json(state.catalog.get_product(id).await?))
}

/// POST /api/products
pub async fn create(
    State(state): State<ServerState>,
    user: CurrentUser,
    Json(payload): Json<ProductCreate>,
) -> AppResult<Json<Product>> {
    user.require_staff()?;
    Ok(Json(state.catalog.create_product(payload).await?))
}

/// PUT /api/products/{id} - versioned update with variant and image ops
pub async fn update(
    State(state): State<ServerState>,
    user: CurrentUser,
    Path(id): Path<i64>,
    Json(payload): Json<ProductUpdate>,
) -> AppResult<Json<Product>> {
    user.require_staff()?;
    Ok(Json(state.catalog.update_product(id, payload).await?))
}

/// DELETE /api/products/{id}
pub async fn delete(
    State(state): State<ServerState>,
    user: CurrentUser,
    Path(id): Path<i64>,
) -> AppResult<Json<AppResponse<()>>> {
    user.require_staff()?;
    state.catalog.delete_product(id).await?;
    Ok(ok(()))
}

/// POST /api/products/bulk-status
pub async fn bulk_status(
    State(state): State<ServerState>,
    user: CurrentUser,
    Json(payload): Json<BulkStatusRequest>,
) -> AppResult<Json<BulkStatusOutcome>> {
    user.require_staff()?;
    Ok(Json(
        state
            .catalog
            .bulk_set_status(&payload.ids, payload.status)
            .await?,
    ))
}
