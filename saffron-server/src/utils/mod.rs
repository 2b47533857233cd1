//! Utility module - shared helpers and types
//!
//! - [`AppError`] / [`AppResult`] - application error types
//! - [`AppResponse`] - API response envelope
//! - logging, validation and slug helpers

pub mod error;
pub mod logger;
pub mod result;
pub mod slug;
pub mod validation;

pub use error::{AppError, AppResponse, ok};
pub use result::AppResult;
