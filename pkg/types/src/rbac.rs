use pkg_constants::rbac::{RBAC_API_GROUP, RBAC_API_VERSION};
use serde::{Deserialize, Deserializer, Serialize};

use crate::meta::ObjectMeta;

/// The API server writes `null` rather than `[]` for some empty lists.
fn null_as_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<Vec<T>>::deserialize(deserializer).map(Option::unwrap_or_default)
}

// --- Policy rules ---

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PolicyRule {
    /// API groups this rule applies to (e.g., "" for core, "*" for all)
    #[serde(default)]
    pub api_groups: Vec<String>,
    /// Resource types (e.g., "pods", "services", "*" for all)
    #[serde(default)]
    pub resources: Vec<String>,
    /// Allowed verbs (e.g., "get", "list", "create", "update", "delete", "*" for all)
    #[serde(default)]
    pub verbs: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub resource_names: Vec<String>,
    #[serde(
        default,
        rename = "nonResourceURLs",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub non_resource_urls: Vec<String>,
}

impl PolicyRule {
    pub fn new(api_groups: &[&str], resources: &[&str], verbs: &[&str]) -> Self {
        let owned = |v: &[&str]| v.iter().map(|s| s.to_string()).collect();
        Self {
            api_groups: owned(api_groups),
            resources: owned(resources),
            verbs: owned(verbs),
            ..Default::default()
        }
    }
}

// --- Role / ClusterRole ---

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Role {
    #[serde(default)]
    pub api_version: String,
    #[serde(default)]
    pub kind: String,
    pub metadata: ObjectMeta,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub rules: Vec<PolicyRule>,
}

impl Role {
    pub fn new(metadata: ObjectMeta, rules: Vec<PolicyRule>) -> Self {
        Self {
            api_version: RBAC_API_VERSION.to_string(),
            kind: "Role".to_string(),
            metadata,
            rules,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusterRole {
    #[serde(default)]
    pub api_version: String,
    #[serde(default)]
    pub kind: String,
    pub metadata: ObjectMeta,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub rules: Vec<PolicyRule>,
}

impl ClusterRole {
    pub fn new(metadata: ObjectMeta, rules: Vec<PolicyRule>) -> Self {
        Self {
            api_version: RBAC_API_VERSION.to_string(),
            kind: "ClusterRole".to_string(),
            metadata,
            rules,
        }
    }
}

// --- RoleRef ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum RoleKind {
    Role,
    ClusterRole,
}

impl std::fmt::Display for RoleKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RoleKind::Role => write!(f, "Role"),
            RoleKind::ClusterRole => write!(f, "ClusterRole"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoleRef {
    #[serde(default)]
    pub api_group: String,
    pub kind: RoleKind,
    pub name: String,
}

impl RoleRef {
    pub fn new(kind: RoleKind, name: &str) -> Self {
        Self {
            api_group: RBAC_API_GROUP.to_string(),
            kind,
            name: name.to_string(),
        }
    }
}

// --- Subject ---

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SubjectKind {
    User,
    Group,
    ServiceAccount,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Subject {
    pub kind: SubjectKind,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_group: Option<String>,
}

impl Subject {
    pub fn service_account(name: &str, namespace: &str) -> Self {
        Self {
            kind: SubjectKind::ServiceAccount,
            name: name.to_string(),
            namespace: Some(namespace.to_string()),
            api_group: None,
        }
    }

    /// Exact (kind, name, namespace) match against a ServiceAccount.
    pub fn is_service_account(&self, name: &str, namespace: &str) -> bool {
        self.kind == SubjectKind::ServiceAccount
            && self.name == name
            && self.namespace.as_deref() == Some(namespace)
    }
}

// --- RoleBinding / ClusterRoleBinding ---

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoleBinding {
    #[serde(default)]
    pub api_version: String,
    #[serde(default)]
    pub kind: String,
    pub metadata: ObjectMeta,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub subjects: Vec<Subject>,
    pub role_ref: RoleRef,
}

impl RoleBinding {
    pub fn new(metadata: ObjectMeta, subjects: Vec<Subject>, role_ref: RoleRef) -> Self {
        Self {
            api_version: RBAC_API_VERSION.to_string(),
            kind: "RoleBinding".to_string(),
            metadata,
            subjects,
            role_ref,
        }
    }

    pub fn binds_service_account(&self, name: &str, namespace: &str) -> bool {
        self.subjects
            .iter()
            .any(|s| s.is_service_account(name, namespace))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusterRoleBinding {
    #[serde(default)]
    pub api_version: String,
    #[serde(default)]
    pub kind: String,
    pub metadata: ObjectMeta,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub subjects: Vec<Subject>,
    pub role_ref: RoleRef,
}

impl ClusterRoleBinding {
    pub fn new(metadata: ObjectMeta, subjects: Vec<Subject>, role_ref: RoleRef) -> Self {
        Self {
            api_version: RBAC_API_VERSION.to_string(),
            kind: "ClusterRoleBinding".to_string(),
            metadata,
            subjects,
            role_ref,
        }
    }

    pub fn binds_service_account(&self, name: &str, namespace: &str) -> bool {
        self.subjects
            .iter()
            .any(|s| s.is_service_account(name, namespace))
    }
}
