//! Bearer token requirement for private routes.

use aide::axum::ApiRouter;
use axum::extract::Request;
use axum::middleware::{Next, from_fn};
use axum::response::Response;
#[cfg(feature = "config")]
use clap::Args;
use serde::{Deserialize, Serialize};

use crate::TRACING_TARGET_AUTHENTICATION;
use crate::extract::AuthClaims;

/// Authentication settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "config", derive(Args))]
#[must_use = "config does nothing unless you use it"]
pub struct AuthConfig {
    /// Require a bearer token on every private route.
    #[cfg_attr(
        feature = "config",
        arg(long, env = "REQUIRE_AUTH", default_value = "true", action = clap::ArgAction::Set)
    )]
    pub require_auth: bool,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self { require_auth: true }
    }
}

/// Extension trait for [`ApiRouter`] to require authentication.
pub trait RouterAuthExt<S> {
    /// Requires a bearer token on the routes registered so far, when enabled.
    ///
    /// Applied as a route layer, so unknown paths still answer `404`.
    fn with_authentication(self, config: &AuthConfig) -> Self;
}

impl<S> RouterAuthExt<S> for ApiRouter<S>
where
    S: Clone + Send + Sync + 'static,
{
    fn with_authentication(self, config: &AuthConfig) -> Self {
        if !config.require_auth {
            tracing::warn!(
                target: TRACING_TARGET_AUTHENTICATION,
                "Authentication is disabled for private routes"
            );
            return self;
        }

        self.route_layer(from_fn(require_authentication))
    }
}

/// Rejects requests without a parseable bearer token.
///
/// The decoded claims stay in the request extensions for later extractors.
pub async fn require_authentication(claims: AuthClaims, request: Request, next: Next) -> Response {
    tracing::trace!(
        target: TRACING_TARGET_AUTHENTICATION,
        subject = claims.subject().unwrap_or_default(),
        "Authenticated request"
    );

    next.run(request).await
}
