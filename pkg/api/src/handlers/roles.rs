use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use pkg_rbac::BindingTarget;
use pkg_rbac::templates::permission_templates;
use pkg_types::api::{
    AddRoleRequest, BindingsResponse, ClusterRoleBindingRequest, RoleBindingRequest, RoleRequest,
    RolesResponse,
};
use pkg_types::rbac::RoleKind;
use serde_json::json;
use tracing::info;

use crate::AppState;
use crate::error::ApiError;

fn required_name(name: Option<String>, what: &str) -> Result<String, ApiError> {
    name.filter(|n| !n.is_empty())
        .ok_or_else(|| ApiError::bad_request(format!("{} name is required", what)))
}

fn created<T: serde::Serialize>(message: String, key: &str, value: T) -> Response {
    (StatusCode::CREATED, Json(json!({ "message": message, key: value }))).into_response()
}

// --- Listing ---

/// GET /api/roles: managed Roles in every namespace plus managed ClusterRoles.
pub async fn list_roles(State(state): State<AppState>) -> Result<Response, ApiError> {
    let roles = state.rbac.list_roles(None).await?;
    let cluster_roles = state.rbac.list_cluster_roles().await?;
    let body = RolesResponse {
        roles,
        cluster_roles,
    };
    Ok((StatusCode::OK, Json(body)).into_response())
}

/// GET /api/roles/bindings
pub async fn list_bindings(State(state): State<AppState>) -> Result<Response, ApiError> {
    let role_bindings = state.rbac.list_role_bindings(None).await?;
    let cluster_role_bindings = state.rbac.list_cluster_role_bindings().await?;
    let body = BindingsResponse {
        role_bindings,
        cluster_role_bindings,
    };
    Ok((StatusCode::OK, Json(body)).into_response())
}

/// GET /api/roles/bindings/{ns}/{name}: every binding naming this ServiceAccount.
pub async fn service_account_bindings(
    State(state): State<AppState>,
    Path((ns, name)): Path<(String, String)>,
) -> Result<Response, ApiError> {
    let bindings = state.rbac.bindings_for_service_account(&name, &ns).await?;
    Ok((StatusCode::OK, Json(bindings)).into_response())
}

/// GET /api/roles/namespace/{ns}
pub async fn namespace_roles(
    State(state): State<AppState>,
    Path(ns): Path<String>,
) -> Result<Response, ApiError> {
    let roles = state.rbac.list_roles(Some(&ns)).await?;
    Ok((StatusCode::OK, Json(roles)).into_response())
}

/// GET /api/roles/templates
pub async fn templates() -> impl IntoResponse {
    (StatusCode::OK, Json(permission_templates()))
}

// --- Roles ---

pub async fn create_role(
    State(state): State<AppState>,
    Path(ns): Path<String>,
    Json(req): Json<RoleRequest>,
) -> Result<Response, ApiError> {
    let name = required_name(req.name, "Role")?;
    let role = state.rbac.create_role(&name, &ns, req.rules).await?;
    Ok(created(format!("Role {}/{} created", ns, name), "role", role))
}

pub async fn update_role(
    State(state): State<AppState>,
    Path((ns, name)): Path<(String, String)>,
    Json(req): Json<RoleRequest>,
) -> Result<Response, ApiError> {
    let role = state.rbac.update_role(&name, &ns, req.rules).await?;
    Ok((StatusCode::OK, Json(role)).into_response())
}

pub async fn delete_role(
    State(state): State<AppState>,
    Path((ns, name)): Path<(String, String)>,
) -> Result<Response, ApiError> {
    let outcome = state.rbac.delete_role(&name, &ns).await?;
    Ok((StatusCode::OK, Json(outcome)).into_response())
}

pub async fn create_cluster_role(
    State(state): State<AppState>,
    Json(req): Json<RoleRequest>,
) -> Result<Response, ApiError> {
    let name = required_name(req.name, "ClusterRole")?;
    let role = state.rbac.create_cluster_role(&name, req.rules).await?;
    Ok(created(format!("ClusterRole {} created", name), "clusterRole", role))
}

pub async fn update_cluster_role(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Json(req): Json<RoleRequest>,
) -> Result<Response, ApiError> {
    let role = state.rbac.update_cluster_role(&name, req.rules).await?;
    Ok((StatusCode::OK, Json(role)).into_response())
}

pub async fn delete_cluster_role(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Response, ApiError> {
    let outcome = state.rbac.delete_cluster_role(&name).await?;
    Ok((StatusCode::OK, Json(outcome)).into_response())
}

// --- Bindings ---

/// The ServiceAccount namespace defaults to the binding's own namespace and
/// the role kind to `Role`.
fn role_binding_target(ns: &str, req: &RoleBindingRequest) -> BindingTarget {
    BindingTarget::new(
        req.role_kind.unwrap_or(RoleKind::Role),
        &req.role_name,
        &req.service_account_name,
        req.service_account_namespace.as_deref().unwrap_or(ns),
    )
}

fn cluster_role_binding_target(req: &ClusterRoleBindingRequest) -> BindingTarget {
    BindingTarget::new(
        RoleKind::ClusterRole,
        &req.cluster_role_name,
        &req.service_account_name,
        &req.service_account_namespace,
    )
}

pub async fn create_role_binding(
    State(state): State<AppState>,
    Path(ns): Path<String>,
    Json(req): Json<RoleBindingRequest>,
) -> Result<Response, ApiError> {
    let target = role_binding_target(&ns, &req);
    let name = required_name(req.name, "RoleBinding")?;
    let binding = state.rbac.create_role_binding(&name, &ns, &target).await?;
    Ok(created(
        format!("RoleBinding {}/{} created", ns, name),
        "roleBinding",
        binding,
    ))
}

pub async fn update_role_binding(
    State(state): State<AppState>,
    Path((ns, name)): Path<(String, String)>,
    Json(req): Json<RoleBindingRequest>,
) -> Result<Response, ApiError> {
    let target = role_binding_target(&ns, &req);
    let binding = state.rbac.update_role_binding(&name, &ns, &target).await?;
    Ok((StatusCode::OK, Json(binding)).into_response())
}

pub async fn delete_role_binding(
    State(state): State<AppState>,
    Path((ns, name)): Path<(String, String)>,
) -> Result<Response, ApiError> {
    let outcome = state.rbac.delete_role_binding(&name, &ns).await?;
    Ok((StatusCode::OK, Json(outcome)).into_response())
}

pub async fn create_cluster_role_binding(
    State(state): State<AppState>,
    Json(req): Json<ClusterRoleBindingRequest>,
) -> Result<Response, ApiError> {
    let target = cluster_role_binding_target(&req);
    let name = required_name(req.name, "ClusterRoleBinding")?;
    let binding = state.rbac.create_cluster_role_binding(&name, &target).await?;
    Ok(created(
        format!("ClusterRoleBinding {} created", name),
        "clusterRoleBinding",
        binding,
    ))
}

pub async fn update_cluster_role_binding(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Json(req): Json<ClusterRoleBindingRequest>,
) -> Result<Response, ApiError> {
    let target = cluster_role_binding_target(&req);
    let binding = state.rbac.update_cluster_role_binding(&name, &target).await?;
    Ok((StatusCode::OK, Json(binding)).into_response())
}

pub async fn delete_cluster_role_binding(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Response, ApiError> {
    let outcome = state.rbac.delete_cluster_role_binding(&name).await?;
    Ok((StatusCode::OK, Json(outcome)).into_response())
}

// --- ServiceAccount permissions ---

/// POST /api/roles/serviceaccount/add-role: bind one role in many namespaces.
pub async fn add_role_to_service_account(
    State(state): State<AppState>,
    Json(req): Json<AddRoleRequest>,
) -> Result<Response, ApiError> {
    let report = state
        .rbac
        .bind_across_namespaces(
            &req.service_account_name,
            &req.service_account_namespace,
            req.role_kind.unwrap_or(RoleKind::ClusterRole),
            &req.role_name,
            &req.target_namespaces,
        )
        .await?;
    info!(
        "{} for {}/{}",
        report.summary, req.service_account_namespace, req.service_account_name
    );
    Ok((StatusCode::OK, Json(report)).into_response())
}

pub async fn service_account_permissions(
    State(state): State<AppState>,
    Path((ns, name)): Path<(String, String)>,
) -> Result<Response, ApiError> {
    let report = state.rbac.get_permissions(&name, &ns).await?;
    Ok((StatusCode::OK, Json(report)).into_response())
}

/// DELETE /api/roles/serviceaccount/{ns}/{name}/role/{roleName}
pub async fn remove_role_from_service_account(
    State(state): State<AppState>,
    Path((ns, name, role_name)): Path<(String, String, String)>,
) -> Result<Response, ApiError> {
    let report = state
        .rbac
        .remove_role_from_service_account(&name, &ns, &role_name, None)
        .await?;
    Ok((StatusCode::OK, Json(report)).into_response())
}
