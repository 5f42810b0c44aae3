//! Apisix route, upstream and traffic split handlers.

use aide::axum::ApiRouter;
use aide::transform::TransformOperation;
use axum::extract::State;
use axum::http::StatusCode;
use jos_kube::KubeClient;
use jos_kube::model::{ApisixRouteSpec, HttpRoute, StreamRoute, WeightedRoute};
use jos_kube::query::ApisixRepository;

use crate::extract::{Json, Query, ValidateJson};
use crate::handler::Result;
use crate::handler::request::{
    CreateApisixRoute, CreateUpstream, CreateWeightedRoute, DeleteApisixRoute, DeleteUpstream,
    NamespaceQuery, namespace_or_default,
};
use crate::handler::response::{ApisixRouteItem, Envelope, ErrorResponse};
use crate::service::ServiceState;

/// Tracing target for Apisix operations.
const TRACING_TARGET: &str = "jos_server::handler::apisix";

/// Creates the route, or replaces the rules of an existing one.
#[tracing::instrument(skip_all, fields(namespace = %request.namespace, route = %request.ar_name))]
async fn create_apisix_route(
    State(kube): State<KubeClient>,
    ValidateJson(request): ValidateJson<CreateApisixRoute>,
) -> Result<(StatusCode, Json<Envelope<()>>)> {
    let http: Vec<HttpRoute> = request.http.iter().map(Into::into).collect();
    let stream: Vec<StreamRoute> = request.stream.iter().map(Into::into).collect();
    let spec = ApisixRouteSpec::from_routes(&http, &stream);

    let created = kube
        .apply_apisix_route(&request.namespace, &request.ar_name, spec)
        .await?;

    tracing::info!(
        target: TRACING_TARGET,
        created,
        http_rules = http.len(),
        stream_rules = stream.len(),
        "ApisixRoute applied"
    );

    let message = if created {
        "ApisixRoute created successfully"
    } else {
        "ApisixRoute updated successfully"
    };
    Ok((StatusCode::OK, Json(Envelope::message(message))))
}

fn create_apisix_route_docs(op: TransformOperation) -> TransformOperation {
    op.summary("Create or update Apisix route")
        .description(
            "HTTP rules are named `http-route-<host>`, stream rules `stream-route-<port>`. \
             A missing route is only created when at least one rule is given.",
        )
        .response::<200, Json<Envelope<()>>>()
        .response::<400, Json<ErrorResponse>>()
}

#[tracing::instrument(skip_all, fields(route = %query.ar_name))]
async fn delete_apisix_route(
    State(kube): State<KubeClient>,
    Query(query): Query<DeleteApisixRoute>,
) -> Result<(StatusCode, Json<Envelope<()>>)> {
    let namespace = namespace_or_default(query.namespace);
    kube.delete_apisix_route(&namespace, &query.ar_name).await?;

    tracing::info!(target: TRACING_TARGET, namespace, "ApisixRoute deleted");

    Ok((
        StatusCode::OK,
        Json(Envelope::message("ApisixRoute deleted successfully")),
    ))
}

fn delete_apisix_route_docs(op: TransformOperation) -> TransformOperation {
    op.summary("Delete Apisix route")
        .response::<200, Json<Envelope<()>>>()
        .response::<400, Json<ErrorResponse>>()
        .response::<404, Json<ErrorResponse>>()
}

#[tracing::instrument(skip_all, fields(namespace = %query.namespace))]
async fn list_apisix_routes(
    State(kube): State<KubeClient>,
    Query(query): Query<NamespaceQuery>,
) -> Result<(StatusCode, Json<Envelope<Vec<ApisixRouteItem>>>)> {
    let routes: Vec<ApisixRouteItem> = kube
        .list_apisix_routes(&query.namespace)
        .await?
        .into_iter()
        .map(Into::into)
        .collect();

    Ok((StatusCode::OK, Json(Envelope::new("success", routes))))
}

fn list_apisix_routes_docs(op: TransformOperation) -> TransformOperation {
    op.summary("List Apisix routes")
        .response::<200, Json<Envelope<Vec<ApisixRouteItem>>>>()
        .response::<500, Json<ErrorResponse>>()
}

#[tracing::instrument(skip_all, fields(namespace = %request.namespace, upstream = %request.name))]
async fn create_upstream(
    State(kube): State<KubeClient>,
    ValidateJson(request): ValidateJson<CreateUpstream>,
) -> Result<(StatusCode, Json<Envelope<()>>)> {
    kube.create_upstream(&request.namespace, &request.name, &request.host, request.port)
        .await?;

    Ok((
        StatusCode::OK,
        Json(Envelope::message("ApisixUpstream created successfully")),
    ))
}

fn create_upstream_docs(op: TransformOperation) -> TransformOperation {
    op.summary("Create Apisix upstream")
        .description("Creates a round-robin upstream with a single external domain node.")
        .response::<200, Json<Envelope<()>>>()
        .response::<400, Json<ErrorResponse>>()
        .response::<409, Json<ErrorResponse>>()
}

#[tracing::instrument(skip_all, fields(namespace = %query.namespace, upstream = %query.name))]
async fn delete_upstream(
    State(kube): State<KubeClient>,
    Query(query): Query<DeleteUpstream>,
) -> Result<(StatusCode, Json<Envelope<()>>)> {
    kube.delete_upstream(&query.namespace, &query.name).await?;

    Ok((
        StatusCode::OK,
        Json(Envelope::message("ApisixUpstream deleted successfully")),
    ))
}

fn delete_upstream_docs(op: TransformOperation) -> TransformOperation {
    op.summary("Delete Apisix upstream")
        .response::<200, Json<Envelope<()>>>()
        .response::<404, Json<ErrorResponse>>()
}

#[tracing::instrument(skip_all, fields(namespace = %request.namespace, route = %request.route_name))]
async fn create_weighted_route(
    State(kube): State<KubeClient>,
    ValidateJson(request): ValidateJson<CreateWeightedRoute>,
) -> Result<(StatusCode, Json<Envelope<()>>)> {
    let namespace = request.namespace.clone();
    let name = request.route_name.clone();
    let route = WeightedRoute::from(request);

    kube.create_weighted_route(&namespace, &name, &route).await?;

    Ok((
        StatusCode::OK,
        Json(Envelope::message("Weighted route created successfully")),
    ))
}

fn create_weighted_route_docs(op: TransformOperation) -> TransformOperation {
    op.summary("Split traffic across upstreams")
        .description(
            "Creates a route for one host whose traffic is split across upstreams by weight. \
             Non-positive weights are dropped; without any weight the route falls back to \
             `upstream_name`.",
        )
        .response::<200, Json<Envelope<()>>>()
        .response::<400, Json<ErrorResponse>>()
        .response::<409, Json<ErrorResponse>>()
}

/// Returns a [`Router`] with all Apisix routes.
///
/// [`Router`]: axum::routing::Router
pub fn routes() -> ApiRouter<ServiceState> {
    use aide::axum::routing::*;

    ApiRouter::new()
        .api_route(
            "/v1alpha1/apisix/routes",
            get_with(list_apisix_routes, list_apisix_routes_docs)
                .post_with(create_apisix_route, create_apisix_route_docs)
                .delete_with(delete_apisix_route, delete_apisix_route_docs),
        )
        .api_route(
            "/v1alpha1/apisix/upstreams",
            post_with(create_upstream, create_upstream_docs)
                .delete_with(delete_upstream, delete_upstream_docs),
        )
        .api_route(
            "/v1alpha1/apisix/traffic",
            post_with(create_weighted_route, create_weighted_route_docs),
        )
        .with_path_items(|item| item.tag("Apisix"))
}
