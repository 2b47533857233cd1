//! Auth Module
//!
//! JWT validation and the request-scoped user context.

pub mod extractor;
pub mod jwt;

pub use jwt::{Claims, CurrentUser, JwtConfig, JwtError, JwtService, Role};
