//! Catalog Module
//!
//! Validation engine and orchestration for categories, products,
//! variants and images. The submodules under here split into two layers:
//! pure rule logic (capacity, schema, variants, publish, thumbnail) with
//! no I/O, and the service that runs those rules inside transactions.

pub mod cache;
pub mod capacity;
pub mod publish;
pub mod schema;
pub mod service;
pub mod thumbnail;
pub mod variants;
pub mod violation;

pub use cache::{ListingCache, ListingKey};
pub use schema::CategorySchema;
pub use service::CatalogService;
pub use violation::{CatalogViolations, Violation, ViolationCode};
