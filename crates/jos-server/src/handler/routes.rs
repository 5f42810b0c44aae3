//! Ingress, TLS secret and service listing handlers.

use aide::axum::ApiRouter;
use aide::transform::TransformOperation;
use axum::extract::State;
use axum::http::StatusCode;
use jos_kube::KubeClient;
use jos_kube::model::{CertInfo, RouteRule, ServiceInfo};
use jos_kube::query::{IngressRepository, SecretRepository, ServiceRepository};

use crate::extract::{Json, Query, ValidateJson};
use crate::handler::Result;
use crate::handler::request::{CreateRoute, CreateTls, DeleteRoute, NamespaceQuery};
use crate::handler::response::{Envelope, ErrorResponse};
use crate::service::ServiceState;

/// Tracing target for ingress and secret operations.
const TRACING_TARGET: &str = "jos_server::handler::routes";

#[tracing::instrument(skip_all, fields(namespace = %query.namespace))]
async fn list_routes(
    State(kube): State<KubeClient>,
    Query(query): Query<NamespaceQuery>,
) -> Result<(StatusCode, Json<Envelope<Vec<RouteRule>>>)> {
    let rules = kube.list_routes(&query.namespace).await?;
    Ok((StatusCode::OK, Json(Envelope::new("success", rules))))
}

fn list_routes_docs(op: TransformOperation) -> TransformOperation {
    op.summary("List routes")
        .description("Flattens the rules of every ingress in the namespace.")
        .response::<200, Json<Envelope<Vec<RouteRule>>>>()
        .response::<500, Json<ErrorResponse>>()
}

#[tracing::instrument(skip_all, fields(namespace = %request.namespace, ingress = %request.ing_name))]
async fn create_route(
    State(kube): State<KubeClient>,
    ValidateJson(request): ValidateJson<CreateRoute>,
) -> Result<(StatusCode, Json<Envelope<()>>)> {
    let created = kube
        .apply_route(&request.namespace, &request.ing_name, &request.rules)
        .await?;

    tracing::info!(
        target: TRACING_TARGET,
        created,
        rule_count = request.rules.len(),
        "Route applied"
    );

    Ok((
        StatusCode::OK,
        Json(Envelope::message("Route created successfully")),
    ))
}

fn create_route_docs(op: TransformOperation) -> TransformOperation {
    op.summary("Create or replace route")
        .description("Creates the ingress, or replaces the rules of an existing one. Paths match by prefix.")
        .response::<200, Json<Envelope<()>>>()
        .response::<400, Json<ErrorResponse>>()
}

#[tracing::instrument(skip_all, fields(namespace = %query.namespace, ingress = %query.route_name))]
async fn delete_route(
    State(kube): State<KubeClient>,
    Query(query): Query<DeleteRoute>,
) -> Result<(StatusCode, Json<Envelope<()>>)> {
    kube.delete_route(&query.namespace, &query.route_name)
        .await?;

    tracing::info!(target: TRACING_TARGET, "Route deleted");

    Ok((
        StatusCode::OK,
        Json(Envelope::message("Route deleted successfully")),
    ))
}

fn delete_route_docs(op: TransformOperation) -> TransformOperation {
    op.summary("Delete route")
        .response::<200, Json<Envelope<()>>>()
        .response::<404, Json<ErrorResponse>>()
}

#[tracing::instrument(skip_all, fields(namespace = %query.namespace))]
async fn list_certs(
    State(kube): State<KubeClient>,
    Query(query): Query<NamespaceQuery>,
) -> Result<(StatusCode, Json<Envelope<Vec<CertInfo>>>)> {
    let certs = kube.list_certificates(&query.namespace).await?;

    Ok((
        StatusCode::OK,
        Json(Envelope::new("Successfully retrieved TLS certificates", certs)),
    ))
}

fn list_certs_docs(op: TransformOperation) -> TransformOperation {
    op.summary("List TLS certificates")
        .description(
            "Lists `kubernetes.io/tls` secrets with the first DNS name and the expiry of their certificate.",
        )
        .response::<200, Json<Envelope<Vec<CertInfo>>>>()
        .response::<500, Json<ErrorResponse>>()
}

#[tracing::instrument(skip_all, fields(namespace = %request.namespace, secret = %request.name))]
async fn create_tls(
    State(kube): State<KubeClient>,
    ValidateJson(request): ValidateJson<CreateTls>,
) -> Result<(StatusCode, Json<Envelope<()>>)> {
    kube.create_tls_secret(&request.namespace, &request.name, &request.crt, &request.key)
        .await?;

    Ok((
        StatusCode::OK,
        Json(Envelope::message("TLS secret created successfully")),
    ))
}

fn create_tls_docs(op: TransformOperation) -> TransformOperation {
    op.summary("Create TLS secret")
        .response::<200, Json<Envelope<()>>>()
        .response::<400, Json<ErrorResponse>>()
        .response::<409, Json<ErrorResponse>>()
}

#[tracing::instrument(skip_all, fields(namespace = %query.namespace))]
async fn list_services(
    State(kube): State<KubeClient>,
    Query(query): Query<NamespaceQuery>,
) -> Result<(StatusCode, Json<Envelope<Vec<ServiceInfo>>>)> {
    let services = kube.list_services(&query.namespace).await?;

    Ok((
        StatusCode::OK,
        Json(Envelope::new("Successfully retrieved service list", services)),
    ))
}

fn list_services_docs(op: TransformOperation) -> TransformOperation {
    op.summary("List services")
        .response::<200, Json<Envelope<Vec<ServiceInfo>>>>()
        .response::<500, Json<ErrorResponse>>()
}

/// Returns a [`Router`] with all ingress, certificate and service routes.
///
/// [`Router`]: axum::routing::Router
pub fn routes() -> ApiRouter<ServiceState> {
    use aide::axum::routing::*;

    ApiRouter::new()
        .api_route(
            "/v1alpha1/routes",
            get_with(list_routes, list_routes_docs)
                .post_with(create_route, create_route_docs)
                .delete_with(delete_route, delete_route_docs),
        )
        .api_route(
            "/v1alpha1/certs",
            get_with(list_certs, list_certs_docs).post_with(create_tls, create_tls_docs),
        )
        .api_route(
            "/v1alpha1/services",
            get_with(list_services, list_services_docs),
        )
        .with_path_items(|item| item.tag("Routes"))
}
