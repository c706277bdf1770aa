use serde::{Deserialize, Serialize};

/// Every object kind kua touches through kubectl.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ResourceKind {
    Namespace,
    Node,
    ServiceAccount,
    Secret,
    Role,
    ClusterRole,
    RoleBinding,
    ClusterRoleBinding,
}

impl ResourceKind {
    pub const ALL: [ResourceKind; 8] = [
        ResourceKind::Namespace,
        ResourceKind::Node,
        ResourceKind::ServiceAccount,
        ResourceKind::Secret,
        ResourceKind::Role,
        ResourceKind::ClusterRole,
        ResourceKind::RoleBinding,
        ResourceKind::ClusterRoleBinding,
    ];

    /// Parse the `kind` field of a manifest.
    pub fn from_kind(kind: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.to_string() == kind)
    }

    /// Resource name as kubectl expects it on the command line.
    pub fn cli_name(self) -> &'static str {
        match self {
            ResourceKind::Namespace => "namespace",
            ResourceKind::Node => "node",
            ResourceKind::ServiceAccount => "serviceaccount",
            ResourceKind::Secret => "secret",
            ResourceKind::Role => "role",
            ResourceKind::ClusterRole => "clusterrole",
            ResourceKind::RoleBinding => "rolebinding",
            ResourceKind::ClusterRoleBinding => "clusterrolebinding",
        }
    }

    pub fn is_namespaced(self) -> bool {
        matches!(
            self,
            ResourceKind::ServiceAccount
                | ResourceKind::Secret
                | ResourceKind::Role
                | ResourceKind::RoleBinding
        )
    }
}

impl std::fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ResourceKind::Namespace => "Namespace",
            ResourceKind::Node => "Node",
            ResourceKind::ServiceAccount => "ServiceAccount",
            ResourceKind::Secret => "Secret",
            ResourceKind::Role => "Role",
            ResourceKind::ClusterRole => "ClusterRole",
            ResourceKind::RoleBinding => "RoleBinding",
            ResourceKind::ClusterRoleBinding => "ClusterRoleBinding",
        };
        write!(f, "{}", name)
    }
}

/// Identity of a single object: kind, name and (for namespaced kinds) namespace.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ResourceId {
    pub kind: ResourceKind,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
}

impl ResourceId {
    pub fn namespaced(kind: ResourceKind, name: &str, namespace: &str) -> Self {
        Self {
            kind,
            name: name.to_string(),
            namespace: Some(namespace.to_string()),
        }
    }

    pub fn cluster(kind: ResourceKind, name: &str) -> Self {
        Self {
            kind,
            name: name.to_string(),
            namespace: None,
        }
    }
}

impl std::fmt::Display for ResourceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.namespace {
            Some(ns) => write!(f, "{} {}/{}", self.kind, ns, self.name),
            None => write!(f, "{} {}", self.kind, self.name),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scope_matches_kubernetes() {
        assert!(ResourceKind::Role.is_namespaced());
        assert!(ResourceKind::ServiceAccount.is_namespaced());
        assert!(!ResourceKind::ClusterRole.is_namespaced());
        assert!(!ResourceKind::ClusterRoleBinding.is_namespaced());
    }

    #[test]
    fn test_from_kind() {
        assert_eq!(
            ResourceKind::from_kind("ClusterRoleBinding"),
            Some(ResourceKind::ClusterRoleBinding)
        );
        assert_eq!(ResourceKind::from_kind("Pod"), None);
    }

    #[test]
    fn test_display() {
        let id = ResourceId::namespaced(ResourceKind::RoleBinding, "rb", "dev");
        assert_eq!(id.to_string(), "RoleBinding dev/rb");
        let id = ResourceId::cluster(ResourceKind::ClusterRole, "reader");
        assert_eq!(id.to_string(), "ClusterRole reader");
    }

    #[test]
    fn test_kinds_order_as_declared() {
        let mut by_kind = std::collections::BTreeMap::new();
        by_kind.insert(ResourceKind::ClusterRoleBinding, "crb");
        by_kind.insert(ResourceKind::Namespace, "ns");
        by_kind.insert(ResourceKind::Role, "role");
        let keys: Vec<ResourceKind> = by_kind.into_keys().collect();
        assert_eq!(
            keys,
            vec![ResourceKind::Namespace, ResourceKind::Role, ResourceKind::ClusterRoleBinding]
        );
        assert!(ResourceKind::Secret < ResourceKind::Role);
    }
}
