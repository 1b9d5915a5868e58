//! # CalBridge Server
//!
//! Axum HTTP surface over the core services: the public feed endpoint,
//! import/export, subscription management and feed token management.
//!
//! The binary in `main.rs` wires config → pool → repositories → services →
//! scheduler → router; everything here is reusable from tests via
//! [`build_router`].

pub mod context;
pub mod error;
pub mod extract;
pub mod routes;

pub use context::AppContext;
pub use error::{ApiError, ApiResult};
pub use routes::build_router;
