//! Checkout Service
//!
//! Runs the checkout transaction: per line item one conditional stock
//! decrement, then the order row and its item snapshots, all inside a
//! single sqlx transaction. Any failure rolls the whole thing back; a
//! timeout does the same. The payment session is opened only after the
//! transaction commits so a slow provider never holds the database.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use serde::Deserialize;
use shared::models::{CheckoutRequest, Order, OrderStatus, PaymentWebhook, ShippingStatus};
use sqlx::{Sqlite, Transaction};

use crate::checkout::payment::{PaymentSessions, SessionRequest};
use crate::db::DbService;
use crate::db::repository::{order, variant};
use crate::utils::{AppError, AppResult};

/// Money and timing knobs of the checkout flow.
#[derive(Debug, Clone)]
pub struct CheckoutConfig {
    /// Subtotals strictly above this ship free
    pub free_shipping_threshold: i64,
    /// Flat fee below the threshold, minor units
    pub shipping_fee: i64,
    pub currency: String,
    /// Upper bound on the whole reservation transaction
    pub timeout: Duration,
}

/// A created order plus where to send the buyer.
#[derive(Debug, serde::Serialize)]
pub struct CheckoutOutcome {
    pub order: Order,
    pub checkout_url: String,
}

/// Staff order-management payload: payment status transition and/or
/// shipping progress.
#[derive(Debug, Clone, Deserialize)]
pub struct OrderStatusUpdate {
    pub status: Option<OrderStatus>,
    pub shipping_status: Option<ShippingStatus>,
}

#[derive(Clone)]
pub struct CheckoutService {
    db: DbService,
    payments: Arc<dyn PaymentSessions>,
    config: CheckoutConfig,
}

impl CheckoutService {
    pub fn new(db: DbService, payments: Arc<dyn PaymentSessions>, config: CheckoutConfig) -> Self {
        Self {
            db,
            payments,
            config,
        }
    }

    /// Reserve stock and create a PENDING order, or fail with no
    /// persisted side effect at all.
    pub async fn checkout(
        &self,
        user_id: &str,
        request: &CheckoutRequest,
    ) -> AppResult<CheckoutOutcome> {
        if request.items.is_empty() {
            return Err(AppError::validation("checkout needs at least one item"));
        }
        for line in &request.items {
            if line.quantity <= 0 {
                return Err(AppError::validation(format!(
                    "quantity for variant {} must be positive",
                    line.variant_id
                )));
            }
        }

        // Bounded: on timeout the transaction is dropped and rolls back
        let order_id = tokio::time::timeout(
            self.config.timeout,
            self.reserve_and_create(user_id, request),
        )
        .await
        .map_err(|_| AppError::conflict("Checkout timed out, nothing was reserved"))??;

        // Stock is committed; open the payment session outside the
        // transaction. A provider failure here leaves a PENDING order
        // holding its reservation for later reconciliation.
        let order = order::find_by_id(&self.db.pool, order_id)
            .await?
            .ok_or_else(|| AppError::internal("Order vanished after commit"))?;
        let session = self
            .payments
            .create_session(&SessionRequest {
                order_id,
                amount: order.total,
                currency: order.currency.clone(),
            })
            .await
            .inspect_err(|e| {
                tracing::warn!(order_id, error = %e, "Payment session creation failed, order stays pending");
            })?;

        order::set_payment_session(&self.db.pool, order_id, &session.session_id).await?;
        let order = order::find_by_id(&self.db.pool, order_id)
            .await?
            .ok_or_else(|| AppError::internal("Order vanished after commit"))?;

        tracing::info!(order_id, total = order.total, "Order created");
        Ok(CheckoutOutcome {
            order,
            checkout_url: session.redirect_url,
        })
    }

    async fn reserve_and_create(
        &self,
        user_id: &str,
        request: &CheckoutRequest,
    ) -> AppResult<i64> {
        let mut tx: Transaction<'_, Sqlite> = self.db.pool.begin().await?;

        let mut subtotal: i64 = 0;
        let mut lines = Vec::with_capacity(request.items.len());
        for line in &request.items {
            // Check-and-decrement in one statement; zero rows means
            // insufficient stock or unknown variant, either way abort.
            let reserved = variant::reserve_stock(&mut tx, line.variant_id, line.quantity).await?;
            if !reserved {
                return Err(AppError::InsufficientStock {
                    variant_id: line.variant_id,
                });
            }
            let snapshot = variant::snapshot(&mut tx, line.variant_id)
                .await?
                .ok_or_else(|| AppError::internal("Variant vanished inside transaction"))?;
            subtotal += snapshot.price * line.quantity;
            lines.push((snapshot, line.quantity));
        }

        let shipping_fee = if subtotal > self.config.free_shipping_threshold {
            0
        } else {
            self.config.shipping_fee
        };
        let total = subtotal + shipping_fee;
        let created_at = Utc::now().to_rfc3339();

        let order_id = order::insert(
            &mut tx,
            user_id,
            subtotal,
            shipping_fee,
            total,
            &self.config.currency,
            &request.address,
            &created_at,
        )
        .await?;

        for (snapshot, quantity) in &lines {
            let name = match &snapshot.variant_name {
                Some(v) => format!("{} ({v})", snapshot.product_name),
                None => snapshot.product_name.clone(),
            };
            order::insert_item(
                &mut tx,
                order_id,
                snapshot.product_id,
                snapshot.variant_id,
                &name,
                snapshot.sku.as_deref(),
                snapshot.price,
                *quantity,
                snapshot.price * quantity,
            )
            .await?;
        }

        tx.commit().await?;
        Ok(order_id)
    }

    // =========================================================================
    // Order queries
    // =========================================================================

    pub async fn get_order(&self, id: i64) -> AppResult<Order> {
        order::find_by_id(&self.db.pool, id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Order {id} not found")))
    }

    pub async fn list_orders(&self, user_id: &str) -> AppResult<Vec<Order>> {
        Ok(order::list_by_user(&self.db.pool, user_id).await?)
    }

    // =========================================================================
    // Payment webhook
    // =========================================================================

    /// Flip PENDING to PAID when the provider confirms payment. The
    /// session id must match the one stored at checkout; stock is not
    /// touched, the reservation already happened.
    pub async fn complete_payment(&self, webhook: &PaymentWebhook) -> AppResult<Order> {
        let current = self.get_order(webhook.order_id).await?;

        match &current.payment_session_id {
            Some(session) if *session == webhook.session_id => {}
            _ => {
                tracing::warn!(
                    order_id = webhook.order_id,
                    "Webhook session id does not match stored payment session"
                );
                return Err(AppError::conflict(
                    "Payment session does not match this order",
                ));
            }
        }

        // Repeated delivery of the same confirmation is fine
        if current.status == OrderStatus::Paid
            && current.payment_reference.as_deref() == Some(webhook.payment_reference.as_str())
        {
            return Ok(current);
        }

        let mut conn = self.db.pool.acquire().await?;
        let applied =
            order::complete_payment(&mut conn, webhook.order_id, &webhook.payment_reference)
                .await?;
        if !applied {
            return Err(AppError::conflict(format!(
                "Order {} is not awaiting payment",
                webhook.order_id
            )));
        }
        drop(conn);
        self.get_order(webhook.order_id).await
    }

    // =========================================================================
    // Staff transitions
    // =========================================================================

    /// Apply a staff status change. Cancelling a PENDING order returns
    /// its reserved stock in the same transaction as the flip.
    pub async fn update_order_status(
        &self,
        order_id: i64,
        update: &OrderStatusUpdate,
    ) -> AppResult<Order> {
        let current = self.get_order(order_id).await?;

        if let Some(target) = update.status {
            self.transition(&current, target).await?;
        }
        if let Some(shipping) = update.shipping_status {
            order::set_shipping_status(&self.db.pool, order_id, shipping).await?;
        }
        self.get_order(order_id).await
    }

    async fn transition(&self, current: &Order, target: OrderStatus) -> AppResult<()> {
        use OrderStatus::*;
        match (current.status, target) {
            (Pending, Cancelled) => {
                let mut tx = self.db.pool.begin().await?;
                let applied =
                    order::transition_status(&mut tx, current.id, Pending, Cancelled).await?;
                if !applied {
                    return Err(AppError::conflict("Order is no longer pending"));
                }
                // Return the reservation
                let items = order::items_for_restock(&mut tx, current.id).await?;
                for (variant_id, quantity) in items {
                    variant::restore_stock(&mut tx, variant_id, quantity).await?;
                }
                tx.commit().await?;
                tracing::info!(order_id = current.id, "Pending order cancelled, stock restored");
                Ok(())
            }
            (Paid, Fulfilled) | (Paid, Refunded) | (Fulfilled, Refunded) => {
                let mut conn = self.db.pool.acquire().await?;
                let applied =
                    order::transition_status(&mut conn, current.id, current.status, target).await?;
                if !applied {
                    return Err(AppError::conflict("Order status changed concurrently"));
                }
                Ok(())
            }
            (from, to) => Err(AppError::validation(format!(
                "transition {} -> {} is not allowed",
                from.as_str(),
                to.as_str()
            ))),
        }
    }
}
