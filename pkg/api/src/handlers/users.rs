use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use pkg_rbac::{AccessLevel, RbacError};
use pkg_types::api::{CreateUserRequest, CreateUserResponse, UpdateUserRequest};
use serde_json::json;
use tracing::{info, warn};

use crate::AppState;
use crate::error::ApiError;
use crate::handlers::kubeconfig_attachment;

/// GET /api/users: managed ServiceAccounts across all namespaces.
pub async fn list_users(State(state): State<AppState>) -> Result<Response, ApiError> {
    let users = state.rbac.list_service_accounts(None).await?;
    Ok((StatusCode::OK, Json(users)).into_response())
}

/// GET /api/users/{ns}/{name}
pub async fn get_user(
    State(state): State<AppState>,
    Path((ns, name)): Path<(String, String)>,
) -> Result<Response, ApiError> {
    match state.rbac.get_service_account(&name, &ns).await {
        Ok(user) => Ok((StatusCode::OK, Json(user)).into_response()),
        Err(RbacError::NotManaged(_)) => Err(ApiError::not_found(format!(
            "ServiceAccount {}/{} not found",
            ns, name
        ))),
        Err(e) => Err(e.into()),
    }
}

/// POST /api/users: create a ServiceAccount, optionally grant view or edit
/// access, and hand back a kubeconfig for it.
pub async fn create_user(
    State(state): State<AppState>,
    Json(req): Json<CreateUserRequest>,
) -> Result<Response, ApiError> {
    let access = AccessLevel::from_flags(req.grant_view_access, req.grant_edit_access);
    let created = state
        .rbac
        .create_service_account(&req.name, req.namespace.as_deref(), access)
        .await?;

    let user = created.service_account;
    let mut warnings = created.warnings;
    let ns = user
        .metadata
        .namespace
        .clone()
        .unwrap_or_else(|| state.rbac.config().default_namespace.clone());

    let kubeconfig = match state.rbac.generate_kubeconfig(&user.metadata.name, &ns).await {
        Ok(yaml) => Some(yaml),
        Err(e) => {
            warn!("Kubeconfig for {}/{} not generated: {}", ns, user.metadata.name, e);
            warnings.push(format!("Kubeconfig not generated: {}", e));
            None
        }
    };

    info!("Created user {}/{}", ns, user.metadata.name);
    let body = CreateUserResponse {
        message: format!("ServiceAccount {}/{} created", ns, user.metadata.name),
        user,
        kubeconfig,
        warnings,
    };
    Ok((StatusCode::CREATED, Json(body)).into_response())
}

/// PUT /api/users/{ns}/{name}: replace labels and annotations of a managed ServiceAccount.
pub async fn update_user(
    State(state): State<AppState>,
    Path((ns, name)): Path<(String, String)>,
    Json(req): Json<UpdateUserRequest>,
) -> Result<Response, ApiError> {
    let user = state
        .rbac
        .update_service_account(&name, &ns, req.labels, req.annotations)
        .await?;
    let body = json!({
        "message": format!("ServiceAccount {}/{} updated", ns, name),
        "user": user,
    });
    Ok((StatusCode::OK, Json(body)).into_response())
}

/// DELETE /api/users/{ns}/{name}: the ServiceAccount and its companion grants.
pub async fn delete_user(
    State(state): State<AppState>,
    Path((ns, name)): Path<(String, String)>,
) -> Result<Response, ApiError> {
    let report = state.rbac.delete_service_account(&name, &ns).await?;
    let body = json!({
        "message": format!("ServiceAccount {}/{} deleted", ns, name),
        "result": report,
    });
    Ok((StatusCode::OK, Json(body)).into_response())
}

/// GET /api/users/{ns}/{name}/kubeconfig
pub async fn user_kubeconfig(
    State(state): State<AppState>,
    Path((ns, name)): Path<(String, String)>,
) -> Result<Response, ApiError> {
    let yaml = state.rbac.generate_kubeconfig(&name, &ns).await?;
    Ok(kubeconfig_attachment(&ns, &name, yaml))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::testing::{body_json, body_text, state};
    use axum::http::header;
    use pkg_rbac::fake::FakeOp;
    use pkg_types::kind::{ResourceId, ResourceKind};
    use pkg_types::meta::ObjectMeta;
    use pkg_types::service_account::ServiceAccount;

    const CA: &str = "LS0tLS1CRUdJTiBDRVJUSUZJQ0FURS0tLS0tCk1JSUJkekNDQVIyZ0F3SUJBZ0lCQURBS0JnZ3Foa2pP";

    fn request(name: &str, namespace: Option<&str>, view: bool, edit: bool) -> Json<CreateUserRequest> {
        Json(CreateUserRequest {
            name: name.to_string(),
            namespace: namespace.map(str::to_string),
            grant_view_access: view,
            grant_edit_access: edit,
        })
    }

    fn cluster_view() -> serde_json::Value {
        json!({
            "apiVersion": "v1",
            "kind": "Config",
            "clusters": [ { "name": "prod", "cluster": { "server": "https://10.0.0.1:6443", "certificate-authority-data": CA } } ],
            "contexts": [ { "name": "admin@prod", "context": { "cluster": "prod", "user": "admin" } } ],
            "current-context": "admin@prod"
        })
    }

    #[tokio::test]
    async fn test_create_user_with_kubeconfig() {
        let (fake, state) = state();
        fake.set_config_view(cluster_view());
        fake.populate_tokens_on_get(1, "sa-token");

        let response = create_user(State(state), request("deployer", Some("team-a"), false, true))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);

        let body = body_json(response).await;
        assert_eq!(body["user"]["metadata"]["name"], "deployer");
        let kubeconfig = body["kubeconfig"].as_str().unwrap();
        assert!(kubeconfig.contains("token: sa-token"));
        assert!(kubeconfig.contains("server: https://10.0.0.1:6443"));
        assert!(fake.contains(&ResourceId::namespaced(
            ResourceKind::Role,
            "deployer-edit-role",
            "team-a"
        )));
        assert!(!fake.contains(&ResourceId::namespaced(
            ResourceKind::Role,
            "deployer-view-role",
            "team-a"
        )));
    }

    #[tokio::test]
    async fn test_create_user_without_token_warns() {
        let (_fake, state) = state();
        let default_ns = state.rbac.config().default_namespace.clone();
        let response = create_user(State(state), request("bot", None, false, false))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);

        let body = body_json(response).await;
        assert_eq!(body["user"]["metadata"]["namespace"], default_ns.as_str());
        assert!(body["kubeconfig"].is_null());
        assert_eq!(body["warnings"].as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_create_user_invalid_name() {
        let (_fake, state) = state();
        let err = create_user(State(state), request("Not_Valid", None, false, false))
            .await
            .unwrap_err();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_create_user_conflict() {
        let (_fake, state) = state();
        create_user(State(state.clone()), request("dup", Some("team-a"), false, false))
            .await
            .unwrap();
        let err = create_user(State(state), request("dup", Some("team-a"), false, false))
            .await
            .unwrap_err();
        assert_eq!(err.status, StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn test_get_user_hides_unmanaged() {
        let (fake, state) = state();
        fake.insert(&ServiceAccount::new(ObjectMeta::namespaced("default", "team-a")));

        let err = get_user(State(state.clone()), Path(("team-a".into(), "default".into())))
            .await
            .unwrap_err();
        assert_eq!(err.status, StatusCode::NOT_FOUND);

        let missing = get_user(State(state), Path(("team-a".into(), "ghost".into())))
            .await
            .unwrap_err();
        assert_eq!(missing.status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_list_and_delete_user() {
        let (fake, state) = state();
        fake.insert(&ServiceAccount::new(ObjectMeta::namespaced("default", "team-a")));
        create_user(State(state.clone()), request("ci", Some("team-a"), true, false))
            .await
            .unwrap();

        let listed = body_json(list_users(State(state.clone())).await.unwrap()).await;
        let names: Vec<&str> = listed
            .as_array()
            .unwrap()
            .iter()
            .filter_map(|u| u["metadata"]["name"].as_str())
            .collect();
        assert_eq!(names, vec!["ci"]);

        let response = delete_user(State(state), Path(("team-a".into(), "ci".into())))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["result"]["companions"]["failed"].as_array().unwrap().len(), 0);
        assert!(!fake.contains(&ResourceId::namespaced(
            ResourceKind::ServiceAccount,
            "ci",
            "team-a"
        )));
        assert!(!fake.contains(&ResourceId::namespaced(
            ResourceKind::RoleBinding,
            "ci-view-binding",
            "team-a"
        )));
    }

    #[tokio::test]
    async fn test_update_user() {
        let (fake, state) = state();
        fake.insert(&ServiceAccount::new(ObjectMeta::namespaced("default", "team-a")));
        create_user(State(state.clone()), request("ci", Some("team-a"), false, false))
            .await
            .unwrap();

        let req = UpdateUserRequest {
            labels: [("tier".to_string(), "batch".to_string())].into(),
            ..Default::default()
        };
        let response = update_user(
            State(state.clone()),
            Path(("team-a".into(), "ci".into())),
            Json(req.clone()),
        )
        .await
        .unwrap();
        let body = body_json(response).await;
        assert_eq!(body["user"]["metadata"]["labels"]["tier"], "batch");

        let err = update_user(
            State(state),
            Path(("team-a".into(), "default".into())),
            Json(req),
        )
        .await
        .unwrap_err();
        assert_eq!(err.status, StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_kubeconfig_download() {
        let (fake, state) = state();
        fake.set_config_view(cluster_view());
        fake.populate_tokens_on_get(1, "dl-token");
        state
            .rbac
            .create_service_account("deployer", Some("team-a"), AccessLevel::None)
            .await
            .unwrap();

        let response = user_kubeconfig(State(state), Path(("team-a".into(), "deployer".into())))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let disposition = response.headers()[header::CONTENT_DISPOSITION].to_str().unwrap();
        assert!(disposition.contains("kubeconfig-team-a-deployer.yaml"));
        assert!(body_text(response).await.contains("token: dl-token"));
        assert_eq!(fake.count_kind(FakeOp::Create, ResourceKind::Secret), 1);
    }
}
