//! OpenAPI document and Scalar UI for the gateway.
//!
//! Handlers tag their path items with one of the names in `API_TAGS`. The
//! document lists the tags in that order so the UI groups operations by
//! upstream system.

use aide::axum::ApiRouter;
use aide::openapi::{Contact, Info, OpenApi, Tag};
use aide::scalar::Scalar;
use axum::routing::{Router, get};
use axum::{Extension, Json};
#[cfg(feature = "config")]
use clap::Args;
use serde::{Deserialize, Serialize};

/// Operation groups, in display order, with their descriptions.
const API_TAGS: [(&str, &str); 8] = [
    ("Charts", "Packaged chart upload and chart repository listing in Harbor."),
    ("Releases", "Helm release install, upgrade, rollback and removal."),
    ("Pods", "Pod listing, logs, restarts and resource usage."),
    ("Nodes", "Cluster nodes and their Prometheus metrics."),
    ("Routes", "Ingress hosts with their TLS secrets and Cluster API clusters."),
    ("Apisix", "Upstreams, routes and SSL certificates in the Apisix gateway."),
    ("Components", "Registry projects, repositories and image tags."),
    ("Health", "Reachability of the cluster API server."),
];

/// Paths of the OpenAPI document and of the Scalar UI.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "config", derive(Args))]
#[must_use = "config does nothing unless you use it"]
pub struct OpenApiConfig {
    /// Path of the OpenAPI JSON document.
    #[cfg_attr(
        feature = "config",
        arg(long, env = "OPENAPI_JSON_PATH", default_value = "/v1alpha1/openapi.json")
    )]
    pub open_api_json: String,

    /// Path of the Scalar API reference UI.
    #[cfg_attr(
        feature = "config",
        arg(long, env = "OPENAPI_SCALAR_PATH", default_value = "/v1alpha1/docs")
    )]
    pub scalar_ui: String,
}

impl Default for OpenApiConfig {
    fn default() -> Self {
        Self {
            open_api_json: "/v1alpha1/openapi.json".to_owned(),
            scalar_ui: "/v1alpha1/docs".to_owned(),
        }
    }
}

/// Builds the document metadata served for this gateway build.
fn gateway_info() -> Info {
    Info {
        title: "JOS Deployment Gateway".to_owned(),
        summary: Some("Chart, release and cluster operations behind one REST API".to_owned()),
        description: Some(
            "Every response uses the `{success, code, message, data}` envelope. \
            Failures carry `code = 10000 + HTTP status` and a human readable message."
                .to_owned(),
        ),
        contact: Some(Contact {
            name: Some("JoiningOS Platform".to_owned()),
            url: Some("https://joiningos.com".to_owned()),
            ..Contact::default()
        }),
        version: env!("CARGO_PKG_VERSION").to_owned(),
        ..Info::default()
    }
}

fn gateway_tags() -> Vec<Tag> {
    API_TAGS
        .iter()
        .map(|(name, description)| Tag {
            name: (*name).to_owned(),
            description: Some((*description).to_owned()),
            ..Tag::default()
        })
        .collect()
}

/// Extension trait for [`ApiRouter`] to serve its OpenAPI document.
pub trait RouterOpenApiExt<S> {
    /// Finishes the API with the gateway metadata and serves the document and UI.
    fn with_open_api(self, config: OpenApiConfig) -> Router<S>;
}

impl<S> RouterOpenApiExt<S> for ApiRouter<S>
where
    S: Clone + Send + Sync + 'static,
{
    fn with_open_api(self, config: OpenApiConfig) -> Router<S> {
        async fn serve_openapi(Extension(api): Extension<OpenApi>) -> Json<OpenApi> {
            Json(api)
        }

        let mut api = OpenApi {
            info: gateway_info(),
            tags: gateway_tags(),
            ..OpenApi::default()
        };

        let scalar = Scalar::new(&config.open_api_json).with_title("JOS Deployment Gateway");
        self.route(&config.scalar_ui, scalar.axum_route())
            .route(&config.open_api_json, get(serve_openapi))
            .finish_api(&mut api)
            .layer(Extension(api))
    }
}

#[cfg(test)]
mod tests {
    use aide::axum::routing::get_with;
    use axum_test::TestServer;
    use serde_json::Value;

    use super::*;

    async fn ping() -> &'static str {
        "pong"
    }

    fn router() -> Router {
        ApiRouter::new()
            .api_route(
                "/v1alpha1/ping",
                get_with(ping, |op| op.summary("Ping").tag("Health")),
            )
            .with_open_api(OpenApiConfig::default())
    }

    #[tokio::test]
    async fn document_lists_gateway_tags() -> anyhow::Result<()> {
        let server = TestServer::new(router())?;

        let response = server.get("/v1alpha1/openapi.json").await;
        response.assert_status_ok();
        let document: Value = response.json();

        assert_eq!(document["info"]["title"], "JOS Deployment Gateway");
        let tags: Vec<&str> = document["tags"]
            .as_array()
            .into_iter()
            .flatten()
            .filter_map(|tag| tag["name"].as_str())
            .collect();
        let expected: Vec<&str> = API_TAGS.iter().map(|(name, _)| *name).collect();
        assert_eq!(tags, expected);
        assert_eq!(
            document["paths"]["/v1alpha1/ping"]["get"]["tags"][0],
            "Health"
        );
        Ok(())
    }

    #[tokio::test]
    async fn scalar_ui_is_served() -> anyhow::Result<()> {
        let server = TestServer::new(router())?;

        let response = server.get("/v1alpha1/docs").await;
        response.assert_status_ok();
        assert!(response.text().contains("/v1alpha1/openapi.json"));
        Ok(())
    }
}
