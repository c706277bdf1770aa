use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use tracing::warn;

use crate::AppState;
use crate::error::ApiError;
use crate::handlers::kubeconfig_attachment;

/// GET /api/configs/cluster/info: server version and namespace names.
pub async fn cluster_info(State(state): State<AppState>) -> Result<Response, ApiError> {
    if let Err(e) = state.rbac.ensure_app_namespace().await {
        warn!("App namespace initialization failed: {}", e);
    }
    let info = state.rbac.cluster_info().await?;
    let namespaces = state.rbac.list_namespace_names().await?;
    let body = json!({ "clusterInfo": info, "namespaces": namespaces });
    Ok((StatusCode::OK, Json(body)).into_response())
}

/// GET /api/configs/nodes: node objects as kubectl reports them.
pub async fn list_nodes(State(state): State<AppState>) -> Result<Response, ApiError> {
    let nodes = state.rbac.list_nodes().await?;
    Ok((StatusCode::OK, Json(nodes)).into_response())
}

/// GET /api/configs/namespaces
pub async fn list_namespaces(State(state): State<AppState>) -> Result<Response, ApiError> {
    let names = state.rbac.list_namespace_names().await?;
    Ok((StatusCode::OK, Json(json!({ "items": names }))).into_response())
}

/// GET /api/configs/{ns}/{name}: kubeconfig download for a ServiceAccount.
pub async fn download_kubeconfig(
    State(state): State<AppState>,
    Path((ns, name)): Path<(String, String)>,
) -> Result<Response, ApiError> {
    let yaml = state.rbac.generate_kubeconfig(&name, &ns).await?;
    Ok(kubeconfig_attachment(&ns, &name, yaml))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::testing::{body_json, state};
    use pkg_rbac::fake::FakeOp;
    use pkg_types::kind::ResourceId;
    use pkg_types::kind::ResourceKind;
    use pkg_types::meta::ObjectMeta;
    use pkg_types::namespace::Namespace;
    use pkg_types::service_account::ServiceAccount;

    #[tokio::test]
    async fn test_cluster_info() {
        let (fake, state) = state();
        fake.set_version(json!({
            "clientVersion": { "gitVersion": "v1.30.1" },
            "serverVersion": { "major": "1", "minor": "29", "gitVersion": "v1.29.4", "platform": "linux/amd64" }
        }));
        fake.insert(&Namespace::new(ObjectMeta::cluster("team-a")));

        let body = body_json(cluster_info(State(state.clone())).await.unwrap()).await;
        assert_eq!(body["clusterInfo"]["version"]["gitVersion"], "v1.29.4");
        let namespaces = body["namespaces"].as_array().unwrap();
        assert!(namespaces.contains(&json!("team-a")));
        assert!(namespaces.contains(&json!(state.rbac.config().default_namespace.as_str())));
    }

    #[tokio::test]
    async fn test_cluster_info_without_server_version() {
        let (fake, state) = state();
        fake.set_version(json!({ "clientVersion": { "gitVersion": "v1.30.1" } }));
        let err = cluster_info(State(state)).await.unwrap_err();
        assert_eq!(err.status, StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn test_list_namespaces_propagates_failure() {
        let (fake, state) = state();
        fake.fail_on(FakeOp::List, ResourceKind::Namespace.cli_name());
        let err = list_namespaces(State(state)).await.unwrap_err();
        assert_eq!(err.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.body.code, "execution_error");
    }

    #[tokio::test]
    async fn test_kubeconfig_for_unmanaged_account() {
        let (fake, state) = state();
        fake.insert(&ServiceAccount::new(ObjectMeta::namespaced("default", "kube-system")));
        let err = download_kubeconfig(
            State(state),
            Path(("kube-system".into(), "default".into())),
        )
        .await
        .unwrap_err();
        assert_eq!(err.status, StatusCode::FORBIDDEN);
        assert_eq!(
            fake.count_kind(FakeOp::Create, ResourceKind::Secret),
            0,
            "no token secret for an unmanaged account"
        );
        assert!(fake.contains(&ResourceId::namespaced(
            ResourceKind::ServiceAccount,
            "default",
            "kube-system"
        )));
    }
}
