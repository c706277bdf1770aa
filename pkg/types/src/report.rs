//! Structured results of multi-step operations.
//!
//! Batch operations never abort on the first failure; they return a
//! successful/failed partition so callers see exactly what happened.

use serde::{Deserialize, Serialize};

use crate::kind::ResourceId;
use crate::rbac::{RoleBinding, RoleKind};

// --- Deletes ---

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteOutcome {
    pub resource: ResourceId,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FailedDelete {
    pub resource: ResourceId,
    pub error: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchReport {
    pub successful: Vec<DeleteOutcome>,
    pub failed: Vec<FailedDelete>,
    pub summary: String,
}

/// Result of deleting a ServiceAccount together with its companion roles and bindings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeardownReport {
    pub service_account: DeleteOutcome,
    pub companions: BatchReport,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

// --- Multi-namespace fan-out ---

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NamespaceBinding {
    pub namespace: String,
    pub binding_name: String,
    pub binding: RoleBinding,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NamespaceFailure {
    pub namespace: String,
    pub binding_name: String,
    pub error: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FanOutReport {
    pub successful: Vec<NamespaceBinding>,
    pub failed: Vec<NamespaceFailure>,
    pub summary: String,
}

// --- Permission aggregation ---

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubjectRef {
    pub name: String,
    pub namespace: String,
}

/// Everything a ServiceAccount is granted through one role.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PermissionRecord {
    pub role_name: String,
    pub role_kind: RoleKind,
    /// Namespaces the role applies in; `*` for cluster-wide.
    pub namespaces: Vec<String>,
    pub bindings: Vec<ResourceId>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PermissionSummary {
    pub total_roles: usize,
    pub role_bindings: usize,
    pub cluster_role_bindings: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PermissionReport {
    pub service_account: SubjectRef,
    pub permissions: Vec<PermissionRecord>,
    pub summary: PermissionSummary,
}
