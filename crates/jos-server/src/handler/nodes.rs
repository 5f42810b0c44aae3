//! Cluster node handlers.
//!
//! New nodes are requested as Cluster API machines; the providers installed in
//! the cluster take care of provisioning.

use aide::axum::ApiRouter;
use aide::transform::TransformOperation;
use axum::extract::State;
use axum::http::StatusCode;
use jos_kube::KubeClient;
use jos_kube::model::NodeInfo;
use jos_kube::query::{MachineRepository, NodeRepository};

use crate::extract::{Json, Path, Query, ValidateJson};
use crate::handler::Result;
use crate::handler::request::{AddNode, ListNodes, NodePath};
use crate::handler::response::{CreatedMachine, Envelope, ErrorResponse};
use crate::service::ServiceState;

/// Tracing target for node operations.
const TRACING_TARGET: &str = "jos_server::handler::nodes";

#[tracing::instrument(skip_all)]
async fn list_nodes(
    State(kube): State<KubeClient>,
    Query(query): Query<ListNodes>,
) -> Result<(StatusCode, Json<Envelope<Vec<NodeInfo>>>)> {
    let keyword = query.keyword.unwrap_or_default();
    let nodes = kube.list_nodes(&keyword).await?;

    tracing::debug!(
        target: TRACING_TARGET,
        node_count = nodes.len(),
        "Nodes listed"
    );

    Ok((StatusCode::OK, Json(Envelope::new("success", nodes))))
}

fn list_nodes_docs(op: TransformOperation) -> TransformOperation {
    op.summary("List nodes")
        .description("Lists cluster nodes, optionally filtered by a substring of their name or internal IP.")
        .response::<200, Json<Envelope<Vec<NodeInfo>>>>()
        .response::<500, Json<ErrorResponse>>()
}

#[tracing::instrument(skip_all, fields(node = %request.name))]
async fn add_node(
    State(kube): State<KubeClient>,
    ValidateJson(request): ValidateJson<AddNode>,
) -> Result<(StatusCode, Json<Envelope<CreatedMachine>>)> {
    let machine = kube.create_machine(&request.name).await?;

    tracing::info!(target: TRACING_TARGET, "Machine requested");

    Ok((
        StatusCode::OK,
        Json(Envelope::new(
            "Machine resource created (cluster-api will handle machine provisioning)",
            CreatedMachine::from(&machine),
        )),
    ))
}

fn add_node_docs(op: TransformOperation) -> TransformOperation {
    op.summary("Add node")
        .description("Creates a Cluster API machine joining the configured cluster.")
        .response::<200, Json<Envelope<CreatedMachine>>>()
        .response::<400, Json<ErrorResponse>>()
        .response::<409, Json<ErrorResponse>>()
}

#[tracing::instrument(skip_all, fields(node = %path.name))]
async fn delete_node(
    State(kube): State<KubeClient>,
    Path(path): Path<NodePath>,
) -> Result<(StatusCode, Json<Envelope<()>>)> {
    kube.delete_node(&path.name).await?;

    tracing::info!(target: TRACING_TARGET, "Node deleted");

    Ok((StatusCode::OK, Json(Envelope::message("success"))))
}

fn delete_node_docs(op: TransformOperation) -> TransformOperation {
    op.summary("Delete node")
        .description("Deletes the node object. The backing machine is not touched.")
        .response::<200, Json<Envelope<()>>>()
        .response::<404, Json<ErrorResponse>>()
}

/// Returns a [`Router`] with all node routes.
///
/// [`Router`]: axum::routing::Router
pub fn routes() -> ApiRouter<ServiceState> {
    use aide::axum::routing::*;

    ApiRouter::new()
        .api_route(
            "/v1alpha1/nodes",
            get_with(list_nodes, list_nodes_docs).post_with(add_node, add_node_docs),
        )
        .api_route(
            "/v1alpha1/nodes/{name}",
            delete_with(delete_node, delete_node_docs),
        )
        .with_path_items(|item| item.tag("Nodes"))
}
