//! Request extractors with gateway-specific rejections.
//!
//! Every extractor rejects with [`Error`](crate::handler::Error), so a
//! malformed request is answered with the same JSON error envelope as any
//! other failure.
//!
//! - [`Json`], [`ValidateJson`], [`Path`], [`Query`] and [`Multipart`] wrap
//!   their axum counterparts.
//! - [`AuthHeader`] reads the bearer token and [`AuthClaims`] decodes its
//!   payload.

pub mod auth;
pub mod reject;

pub use crate::TRACING_TARGET_AUTHENTICATION;
pub use crate::extract::auth::{AuthClaims, AuthHeader, SUPPORTED_ALGORITHMS};
pub use crate::extract::reject::{Json, Multipart, Path, Query, ValidateJson};
