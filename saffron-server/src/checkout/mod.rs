//! Checkout Module
//!
//! The order checkout transaction and its payment-provider collaborator.

pub mod payment;
pub mod service;

pub use payment::{HttpPaymentSessions, PaymentSession, PaymentSessions, SessionRequest};
pub use service::{CheckoutConfig, CheckoutOutcome, CheckoutService, OrderStatusUpdate};
