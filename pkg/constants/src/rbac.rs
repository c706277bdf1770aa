//! RBAC constants.

/// API version of all `rbac.authorization.k8s.io` objects.
pub const RBAC_API_VERSION: &str = "rbac.authorization.k8s.io/v1";

/// API group referenced by every `roleRef`.
pub const RBAC_API_GROUP: &str = "rbac.authorization.k8s.io";

/// Namespace holding ServiceAccounts when the caller names none.
pub const DEFAULT_APP_NAMESPACE: &str = "kua-auth";

/// Built-in ClusterRoles that may be bound without carrying the ownership label.
pub const BUILTIN_CLUSTER_ROLES: &[&str] = &["view", "edit", "admin", "cluster-admin"];

/// Namespace marker used for cluster-wide permission records.
pub const CLUSTER_WIDE: &str = "*";
