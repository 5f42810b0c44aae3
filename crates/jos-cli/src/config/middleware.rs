//! Middleware configuration for the HTTP server.
//!
//! All middleware configs are re-exported from `jos-server` and support both
//! CLI arguments and environment variables.

use clap::Args;
use jos_server::middleware::{AuthConfig, CorsConfig, OpenApiConfig, RecoveryConfig};
use serde::{Deserialize, Serialize};

use super::TRACING_TARGET_CONFIG;

/// Middleware configuration combining auth, CORS, OpenAPI and recovery settings.
#[derive(Debug, Clone, Args, Serialize, Deserialize)]
pub struct MiddlewareConfig {
    /// Bearer token requirement on private routes.
    #[clap(flatten)]
    pub auth: AuthConfig,

    #[clap(flatten)]
    pub cors: CorsConfig,

    /// Paths of the OpenAPI document and of the Scalar UI.
    #[clap(flatten)]
    pub openapi: OpenApiConfig,

    /// Request timeout and panic recovery.
    #[clap(flatten)]
    pub recovery: RecoveryConfig,
}

impl MiddlewareConfig {
    /// Logs middleware configuration at info level.
    pub fn log(&self) {
        tracing::info!(
            target: TRACING_TARGET_CONFIG,
            require_auth = self.auth.require_auth,
            origins = ?self.cors.allowed_origins,
            credentials = self.cors.allow_credentials,
            openapi_path = %self.openapi.open_api_json,
            scalar_path = %self.openapi.scalar_ui,
            request_timeout_secs = self.recovery.request_timeout,
            "Middleware configuration"
        );
    }
}
