//! Ownership labels and well-known annotation keys.

/// Label key that marks a resource as managed by kua.
pub const MANAGED_BY_KEY: &str = "app.kubernetes.io/managed-by";

/// Value of [`MANAGED_BY_KEY`] stamped on every resource kua creates.
pub const MANAGED_BY_VALUE: &str = "kua-auth";

/// Annotation that ties a token secret to its ServiceAccount.
pub const SERVICE_ACCOUNT_NAME_ANNOTATION: &str = "kubernetes.io/service-account.name";
