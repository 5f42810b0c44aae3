//! Middleware for `axum::Router` and HTTP request processing.
//!
//! Every concern is exposed as an extension trait so the binary can compose
//! the final stack explicitly:
//!
//! ```rust,ignore
//! let app = handler::routes(&auth, state.clone())
//!     .with_open_api(OpenApiConfig::default())
//!     .with_state(state)
//!     .with_observability()
//!     .with_security(&CorsConfig::default(), &SecurityHeadersConfig::default())
//!     .with_recovery(&RecoveryConfig::default());
//! ```

mod authentication;
mod observability;
mod recovery;
mod security;
mod specification;

pub use authentication::{AuthConfig, RouterAuthExt, require_authentication};
pub use observability::RouterObservabilityExt;
pub use recovery::{RecoveryConfig, RouterRecoveryExt};
pub use security::{
    CorsConfig, FrameOptions, MAX_BODY_SIZE, ReferrerPolicy, RouterSecurityExt,
    SecurityHeadersConfig,
};
pub use specification::{OpenApiConfig, RouterOpenApiExt};
