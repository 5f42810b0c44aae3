//! Component handlers: pod owner lookup, registry browsing and workload
//! cloning.
//!
//! A component is a copy of an existing Deployment or StatefulSet running a
//! different image, exposed by a copy of the workload's service.

use aide::axum::ApiRouter;
use aide::transform::TransformOperation;
use axum::extract::State;
use axum::http::StatusCode;
use jos_harbor::{HarborClient, ProjectImage};
use jos_kube::KubeClient;
use jos_kube::model::{RootWorkload, WorkloadKind};
use jos_kube::query::{OwnerRepository, WorkloadRepository};

use crate::extract::{Json, Query};
use crate::handler::request::{CreateComponent, PodOwners, ProjectImages};
use crate::handler::response::{Envelope, ErrorResponse};
use crate::handler::{ErrorKind, Result};
use crate::service::ServiceState;

/// Tracing target for component operations.
const TRACING_TARGET: &str = "jos_server::handler::components";

/// Resolves the root workloads of a pod and their application services.
#[tracing::instrument(skip_all, fields(namespace = %query.namespace, pod = %query.name))]
async fn pod_owners(
    State(kube): State<KubeClient>,
    Query(query): Query<PodOwners>,
) -> Result<(StatusCode, Json<Envelope<Vec<RootWorkload>>>)> {
    let roots = kube
        .pod_root_workloads(&query.namespace, &query.name)
        .await?;

    tracing::debug!(
        target: TRACING_TARGET,
        root_count = roots.len(),
        "Pod owners resolved"
    );

    Ok((StatusCode::OK, Json(Envelope::new("success", roots))))
}

fn pod_owners_docs(op: TransformOperation) -> TransformOperation {
    op.summary("Root workloads of a pod")
        .description(
            "Follows controller owner references (at most four hops) up to the root workload, \
             and looks up the single service labelled with the workload's application name.",
        )
        .response::<200, Json<Envelope<Vec<RootWorkload>>>>()
        .response::<400, Json<ErrorResponse>>()
        .response::<404, Json<ErrorResponse>>()
}

#[tracing::instrument(skip_all)]
async fn harbor_projects(
    State(harbor): State<HarborClient>,
) -> Result<(StatusCode, Json<Envelope<Vec<String>>>)> {
    let projects = harbor.list_projects().await?;
    Ok((StatusCode::OK, Json(Envelope::new("success", projects))))
}

fn harbor_projects_docs(op: TransformOperation) -> TransformOperation {
    op.summary("List registry projects")
        .response::<200, Json<Envelope<Vec<String>>>>()
        .response::<500, Json<ErrorResponse>>()
}

#[tracing::instrument(skip_all, fields(project = %query.project_name))]
async fn harbor_images(
    State(harbor): State<HarborClient>,
    Query(query): Query<ProjectImages>,
) -> Result<(StatusCode, Json<Envelope<Vec<ProjectImage>>>)> {
    if query.project_name.is_empty() {
        return Err(ErrorKind::BadRequest.with_message("missing project name"));
    }

    let images = harbor.list_repositories(&query.project_name).await?;
    Ok((StatusCode::OK, Json(Envelope::new("success", images))))
}

fn harbor_images_docs(op: TransformOperation) -> TransformOperation {
    op.summary("List project images")
        .description("Lists the repositories of a registry project with their tags.")
        .response::<200, Json<Envelope<Vec<ProjectImage>>>>()
        .response::<400, Json<ErrorResponse>>()
        .response::<500, Json<ErrorResponse>>()
}

/// Clones a workload and its service as `<source>-<name>` running `image`.
#[tracing::instrument(skip_all, fields(component = %request.name))]
async fn create_component(
    State(kube): State<KubeClient>,
    Json(request): Json<CreateComponent>,
) -> Result<(StatusCode, Json<Envelope<()>>)> {
    if !request.is_complete() {
        return Err(ErrorKind::BadRequest.with_message("missing required fields"));
    }

    let deploy_info = &request.deploy_info;
    let namespace = deploy_info.namespace.as_str();
    if !kube.namespace_exists(namespace).await? {
        return Err(ErrorKind::NotFound.with_message(format!("namespace {namespace} not found")));
    }

    let kind: WorkloadKind = deploy_info.kind.parse()?;
    let source = request.source();
    let clone_name = request.clone_name();

    kube.clone_workload(namespace, kind, source, &clone_name, &request.image)
        .await?;
    kube.clone_service(namespace, &deploy_info.service_name, &clone_name)
        .await?;

    tracing::info!(
        target: TRACING_TARGET,
        namespace,
        source,
        clone = %clone_name,
        "Component created"
    );

    Ok((StatusCode::OK, Json(Envelope::message("success"))))
}

fn create_component_docs(op: TransformOperation) -> TransformOperation {
    op.summary("Create component")
        .description(
            "Clones a Deployment or StatefulSet with a new image, together with its service. \
             The clones select each other through the component label.",
        )
        .response::<200, Json<Envelope<()>>>()
        .response::<400, Json<ErrorResponse>>()
        .response::<404, Json<ErrorResponse>>()
        .response::<409, Json<ErrorResponse>>()
}

/// Returns a [`Router`] with all component routes.
///
/// [`Router`]: axum::routing::Router
pub fn routes() -> ApiRouter<ServiceState> {
    use aide::axum::routing::*;

    ApiRouter::new()
        .api_route(
            "/v1alpha1/pods/owners",
            get_with(pod_owners, pod_owners_docs),
        )
        .api_route(
            "/v1alpha1/harbor/projects",
            get_with(harbor_projects, harbor_projects_docs),
        )
        .api_route(
            "/v1alpha1/harbor/images",
            get_with(harbor_images, harbor_images_docs),
        )
        .api_route(
            "/v1alpha1/components",
            post_with(create_component, create_component_docs),
        )
        .with_path_items(|item| item.tag("Components"))
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};

    use axum::Router;
    use axum::extract::{Path as AxumPath, Query as AxumQuery};
    use axum::routing::get;
    use serde_json::{Value, json};

    use super::*;
    use crate::handler::test::{TestContext, kube_not_found, spawn_upstream};

    /// Objects posted to the mock API server, in order.
    type Received = Arc<Mutex<Vec<Value>>>;

    fn owner(kind: &str, name: &str, controller: bool) -> Value {
        json!([{
            "apiVersion": "apps/v1",
            "kind": kind,
            "name": name,
            "uid": format!("uid-{name}"),
            "controller": controller
        }])
    }

    fn deployment() -> Value {
        json!({
            "apiVersion": "apps/v1",
            "kind": "Deployment",
            "metadata": {"name": "shop", "namespace": "prod", "resourceVersion": "42", "uid": "uid-shop"},
            "spec": {
                "selector": {"matchLabels": {"app": "shop"}},
                "template": {
                    "metadata": {"labels": {"app": "shop"}},
                    "spec": {"containers": [{"name": "web", "image": "registry/shop:1"}]}
                }
            },
            "status": {"replicas": 2}
        })
    }

    fn service() -> Value {
        json!({
            "apiVersion": "v1",
            "kind": "Service",
            "metadata": {"name": "shop-svc", "namespace": "prod", "labels": {"team": "retail"}},
            "spec": {
                "selector": {"app": "shop"},
                "clusterIP": "10.96.0.10",
                "clusterIPs": ["10.96.0.10"],
                "ports": [{"port": 80}]
            }
        })
    }

    async fn spawn_cluster(received: Received) -> anyhow::Result<String> {
        let deployments = received.clone();
        let services = received;

        let router = Router::new()
            .route(
                "/api/v1/namespaces/{namespace}/pods/{name}",
                get(|AxumPath((_, name)): AxumPath<(String, String)>| async move {
                    let owners = match name.as_str() {
                        "shop-7d9f-abcde" => owner("ReplicaSet", "shop-7d9f", true),
                        _ => owner("ReplicaSet", "shop-7d9f", false),
                    };
                    axum::Json(json!({
                        "apiVersion": "v1",
                        "kind": "Pod",
                        "metadata": {"name": name, "namespace": "prod", "ownerReferences": owners}
                    }))
                }),
            )
            .route(
                "/apis/apps/v1/namespaces/{namespace}/replicasets/{name}",
                get(|| async {
                    axum::Json(json!({
                        "apiVersion": "apps/v1",
                        "kind": "ReplicaSet",
                        "metadata": {
                            "name": "shop-7d9f",
                            "namespace": "prod",
                            "ownerReferences": owner("Deployment", "web-shop", true)
                        },
                        "spec": {"selector": {}}
                    }))
                }),
            )
            .route(
                "/api/v1/namespaces/{namespace}/services",
                get(|AxumQuery(query): AxumQuery<HashMap<String, String>>| async move {
                    let selector = query.get("labelSelector").cloned().unwrap_or_default();
                    let items = if selector == "seagoing.com.cn/service-code=shop" {
                        vec![service()]
                    } else {
                        Vec::new()
                    };
                    axum::Json(json!({"apiVersion": "v1", "kind": "ServiceList", "metadata": {}, "items": items}))
                })
                .post(move |axum::Json(body): axum::Json<Value>| async move {
                    services.lock().unwrap().push(body.clone());
                    (StatusCode::CREATED, axum::Json(body))
                }),
            )
            .route(
                "/api/v1/namespaces/{namespace}/services/{name}",
                get(|| async { axum::Json(service()) }),
            )
            .route(
                "/api/v1/namespaces/{namespace}",
                get(|AxumPath(name): AxumPath<String>| async move {
                    if name == "prod" {
                        let namespace = json!({"apiVersion": "v1", "kind": "Namespace", "metadata": {"name": name}});
                        (StatusCode::OK, axum::Json(namespace))
                    } else {
                        kube_not_found()
                    }
                }),
            )
            .route(
                "/apis/apps/v1/namespaces/{namespace}/deployments",
                axum::routing::post(move |axum::Json(body): axum::Json<Value>| async move {
                    deployments.lock().unwrap().push(body.clone());
                    (StatusCode::CREATED, axum::Json(body))
                }),
            )
            .route(
                "/apis/apps/v1/namespaces/{namespace}/deployments/{name}",
                get(|AxumPath((_, name)): AxumPath<(String, String)>| async move {
                    if name == "shop" {
                        (StatusCode::OK, axum::Json(deployment()))
                    } else {
                        kube_not_found()
                    }
                }),
            );
        spawn_upstream(router).await
    }

    fn component(kind: &str) -> Value {
        json!({
            "name": "canary",
            "image": "registry/shop:2",
            "deploy_info": {
                "namespace": "prod",
                "deploy_name": "shop",
                "kind": kind,
                "service_name": "shop-svc"
            }
        })
    }

    #[tokio::test]
    async fn owners_resolve_to_deployment() -> anyhow::Result<()> {
        let cluster = spawn_cluster(Received::default()).await?;
        let ctx = TestContext::builder().with_kube_url(&cluster).build()?;
        let server = ctx.server(routes())?;

        let response = server
            .get("/v1alpha1/pods/owners")
            .add_query_param("namespace", "prod")
            .add_query_param("name", "shop-7d9f-abcde")
            .await;
        response.assert_status_ok();

        let roots = response
            .json::<Envelope<Vec<RootWorkload>>>()
            .data
            .unwrap_or_default();
        assert_eq!(
            roots,
            [RootWorkload {
                namespace: "prod".to_owned(),
                deploy_name: "web-shop".to_owned(),
                kind: "Deployment".to_owned(),
                service_name: "shop-svc".to_owned(),
            }]
        );
        Ok(())
    }

    #[tokio::test]
    async fn non_controller_owner_is_rejected() -> anyhow::Result<()> {
        let cluster = spawn_cluster(Received::default()).await?;
        let ctx = TestContext::builder().with_kube_url(&cluster).build()?;
        let server = ctx.server(routes())?;

        let response = server
            .get("/v1alpha1/pods/owners")
            .add_query_param("namespace", "prod")
            .add_query_param("name", "orphan")
            .await;
        response.assert_status_bad_request();
        assert_eq!(
            response.json::<Value>()["message"],
            "Pod owner is not a controller"
        );
        Ok(())
    }

    #[tokio::test]
    async fn harbor_projects_and_images() -> anyhow::Result<()> {
        let harbor = spawn_upstream(
            Router::new()
                .route(
                    "/api/v2.0/projects",
                    get(|| async { axum::Json(json!([{"name": "library"}, {"name": "apps"}])) }),
                )
                .route(
                    "/api/v2.0/projects/{project}/repositories",
                    get(|| async {
                        axum::Json(json!([{"name": "apps/web", "tags": [{"name": "v1"}]}]))
                    }),
                ),
        )
        .await?;
        let ctx = TestContext::builder().with_harbor_url(&harbor).build()?;
        let server = ctx.server(routes())?;

        let response = server.get("/v1alpha1/harbor/projects").await;
        response.assert_status_ok();
        let projects = response.json::<Envelope<Vec<String>>>().data.unwrap_or_default();
        assert_eq!(projects, ["library", "apps"]);

        let response = server
            .get("/v1alpha1/harbor/images")
            .add_query_param("project_name", "apps")
            .await;
        response.assert_status_ok();
        let images = response.json::<Envelope<Vec<ProjectImage>>>().data.unwrap_or_default();
        assert_eq!(images[0].repository, "apps/web");
        assert_eq!(images[0].tags, ["v1"]);
        Ok(())
    }

    #[tokio::test]
    async fn harbor_images_require_project() -> anyhow::Result<()> {
        let ctx = TestContext::builder().build()?;
        let server = ctx.server(routes())?;

        let response = server.get("/v1alpha1/harbor/images").await;
        response.assert_status_bad_request();
        assert_eq!(response.json::<Value>()["message"], "missing project name");
        Ok(())
    }

    #[tokio::test]
    async fn harbor_status_is_reported() -> anyhow::Result<()> {
        let harbor = spawn_upstream(Router::new().route(
            "/api/v2.0/projects",
            get(|| async { StatusCode::UNAUTHORIZED }),
        ))
        .await?;
        let ctx = TestContext::builder().with_harbor_url(&harbor).build()?;
        let server = ctx.server(routes())?;

        let response = server.get("/v1alpha1/harbor/projects").await;
        response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            response.json::<Value>()["message"],
            "harbor API returned status 401"
        );
        Ok(())
    }

    #[tokio::test]
    async fn component_clones_workload_and_service() -> anyhow::Result<()> {
        let received = Received::default();
        let cluster = spawn_cluster(received.clone()).await?;
        let ctx = TestContext::builder().with_kube_url(&cluster).build()?;
        let server = ctx.server(routes())?;

        let response = server
            .post("/v1alpha1/components")
            .json(&component("Deployment"))
            .await;
        response.assert_status_ok();
        assert_eq!(response.json::<Envelope<()>>().message, "success");

        let objects = received.lock().unwrap().clone();
        assert_eq!(objects.len(), 2);

        let deployment = &objects[0];
        assert_eq!(deployment["metadata"]["name"], "shop-canary");
        assert!(deployment["metadata"].get("resourceVersion").is_none());
        assert!(deployment.get("status").is_none());
        let template = &deployment["spec"]["template"];
        assert_eq!(template["metadata"]["labels"]["joiningos.com/componment"], "shop-canary");
        assert_eq!(template["spec"]["containers"][0]["image"], "registry/shop:2");

        let service = &objects[1];
        assert_eq!(service["metadata"]["name"], "shop-canary");
        assert_eq!(service["metadata"]["labels"]["joiningos.com/mode"], "customize");
        assert_eq!(
            service["spec"]["selector"]["joiningos.com/componment"],
            "shop-canary"
        );
        assert!(service["spec"].get("clusterIP").is_none());
        Ok(())
    }

    #[tokio::test]
    async fn component_validates_request() -> anyhow::Result<()> {
        let received = Received::default();
        let cluster = spawn_cluster(received.clone()).await?;
        let ctx = TestContext::builder().with_kube_url(&cluster).build()?;
        let server = ctx.server(routes())?;

        let response = server
            .post("/v1alpha1/components")
            .json(&json!({"name": "canary"}))
            .await;
        response.assert_status_bad_request();
        assert_eq!(response.json::<Value>()["message"], "missing required fields");

        let response = server
            .post("/v1alpha1/components")
            .json(&component("DaemonSet"))
            .await;
        response.assert_status_bad_request();
        assert_eq!(
            response.json::<Value>()["message"],
            "unsupported controlledBy kind"
        );

        let mut request = component("Deployment");
        request["deploy_info"]["namespace"] = json!("staging");
        let response = server.post("/v1alpha1/components").json(&request).await;
        response.assert_status_not_found();

        assert!(received.lock().unwrap().is_empty());
        Ok(())
    }
}
