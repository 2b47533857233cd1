//! Order API Handlers

use axum::{
    Json,
    extract::{Path, State},
};
use shared::models::{CheckoutRequest, Order, PaymentWebhook};

use crate::auth::CurrentUser;
use crate::checkout::{CheckoutOutcome, OrderStatusUpdate};
use crate::core::ServerState;
use crate::utils::{AppError, AppResult};

/// POST /api/orders/checkout
pub async fn checkout(
    State(state): State<ServerState>,
    user: CurrentUser,
    Json(payload): Json<CheckoutRequest>,
) -> AppResult<Json<CheckoutOutcome>> {
    Ok(Json(state.checkout.checkout(&user.id, &payload).await?))
}

/// GET /api/orders - the caller's own orders
pub async fn list(
    State(state): State<ServerState>,
    user: CurrentUser,
) -> AppResult<Json<Vec<Order>>> {
    Ok(Json(state.checkout.list_orders(&user.id).await?))
}

/// GET /api/orders/{id} - owner or staff
pub async fn get_by_id(
    State(state): State<ServerState>,
    user: CurrentUser,
    Path(id): Path<i64>,
) -> AppResult<Json<Order>> {
    let order = state.checkout.get_order(id).await?;
    if order.user_id != user.id && !user.is_staff() {
        // Hide existence from other customers
        return Err(AppError::not_found(format!("Order {id} not found")));
    }
    Ok(Json(order))
}

/// POST /api/orders/payment-webhook
pub async fn payment_webhook(
    State(state): State<ServerState>,
    Json(payload): Json<PaymentWebhook>,
) -> AppResult<Json<Order>> {
    Ok(Json(state.checkout.complete_payment(&payload).await?))
}

/// PUT /api/orders/{id}/status - staff transitions
pub async fn update_status(
    State(state): State<ServerState>,
    user: CurrentUser,
    Path(id): Path<i64>,
    Json(payload): Json<OrderStatusUpdate>,
) -> AppResult<Json<Order>> {
    user.require_staff()?;
    Ok(Json(state.checkout.update_order_status(id, &payload).await?))
}
