//! Error types for the media gateway.
//!
//! A hierarchical `thiserror` layering: a top-level
//! [`GatewayError`] wraps per-layer error enums and implements
//! `axum::response::IntoResponse` so handlers can simply `?` their way out.

mod types;

pub use types::{AuthError, GatewayError, ResolveError, UpstreamError};

pub type GatewayResult<T> = Result<T, GatewayError>;
pub type UpstreamResult<T> = Result<T, UpstreamError>;
pub type ResolveResult<T> = Result<T, ResolveError>;
