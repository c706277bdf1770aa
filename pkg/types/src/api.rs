//! Request and response bodies of the HTTP API, shared by the server and `kuactl`.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::rbac::{ClusterRole, ClusterRoleBinding, PolicyRule, Role, RoleBinding, RoleKind};
use crate::service_account::ServiceAccount;

// --- Auth ---

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub success: bool,
    pub token: String,
    pub expires_in: String,
}

/// Uniform error body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub code: String,
    pub message: String,
}

// --- Users (ServiceAccounts) ---

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub namespace: Option<String>,
    #[serde(default)]
    pub grant_view_access: bool,
    #[serde(default)]
    pub grant_edit_access: bool,
}

/// Replacement labels and annotations for an existing ServiceAccount.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateUserRequest {
    #[serde(default)]
    pub labels: BTreeMap<String, String>,
    #[serde(default)]
    pub annotations: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserResponse {
    pub message: String,
    pub user: ServiceAccount,
    pub kubeconfig: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

// --- Roles ---

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RoleRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub rules: Vec<PolicyRule>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RolesResponse {
    pub roles: Vec<Role>,
    #[serde(rename = "clusterRoles")]
    pub cluster_roles: Vec<ClusterRole>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BindingsResponse {
    pub role_bindings: Vec<RoleBinding>,
    pub cluster_role_bindings: Vec<ClusterRoleBinding>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoleBindingRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub role_name: String,
    #[serde(default)]
    pub service_account_name: String,
    #[serde(default)]
    pub service_account_namespace: Option<String>,
    #[serde(default)]
    pub role_kind: Option<RoleKind>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusterRoleBindingRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub cluster_role_name: String,
    #[serde(default)]
    pub service_account_name: String,
    #[serde(default)]
    pub service_account_namespace: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddRoleRequest {
    #[serde(default)]
    pub service_account_name: String,
    #[serde(default)]
    pub service_account_namespace: String,
    #[serde(default)]
    pub role_name: String,
    #[serde(default)]
    pub target_namespaces: Vec<String>,
    #[serde(default)]
    pub role_kind: Option<RoleKind>,
}

/// A named, reusable rule set offered to the UI.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PermissionTemplate {
    pub name: String,
    pub description: String,
    pub rules: Vec<PolicyRule>,
}

// --- Cluster ---

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerVersion {
    #[serde(default)]
    pub major: String,
    #[serde(default)]
    pub minor: String,
    #[serde(default)]
    pub git_version: String,
    #[serde(default)]
    pub build_date: String,
    #[serde(default)]
    pub platform: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClusterInfo {
    pub version: ServerVersion,
}
