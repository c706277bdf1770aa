use std::path::PathBuf;
use std::time::Duration;

use pkg_constants::labels::{MANAGED_BY_KEY, MANAGED_BY_VALUE};
use pkg_constants::rbac::{BUILTIN_CLUSTER_ROLES, DEFAULT_APP_NAMESPACE};
use pkg_constants::token::{TOKEN_POLL_ATTEMPTS, TOKEN_POLL_DELAY_MS};

/// How permission records are grouped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AggregationKey {
    /// A Role and a ClusterRole with the same name fold into one record.
    RoleName,
    /// Role and ClusterRole stay separate even when names collide.
    #[default]
    KindAndName,
}

/// Bounded polling for the token controller to populate a secret.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenPollPolicy {
    pub attempts: u32,
    /// Slept before every attempt, including the first.
    pub delay: Duration,
}

impl Default for TokenPollPolicy {
    fn default() -> Self {
        Self {
            attempts: TOKEN_POLL_ATTEMPTS,
            delay: Duration::from_millis(TOKEN_POLL_DELAY_MS),
        }
    }
}

/// Immutable settings for [`crate::RbacService`]. Built once at startup.
#[derive(Debug, Clone)]
pub struct RbacConfig {
    pub managed_by_key: String,
    pub managed_by_value: String,
    /// Namespace for ServiceAccounts when the caller names none.
    pub default_namespace: String,
    /// ClusterRoles that may be bound without the ownership label.
    pub builtin_cluster_roles: Vec<String>,
    pub token_poll: TokenPollPolicy,
    /// Last-resort CA bundle read from local disk during kubeconfig assembly.
    pub ca_cert_path: Option<PathBuf>,
    pub aggregation_key: AggregationKey,
}

impl Default for RbacConfig {
    fn default() -> Self {
        Self {
            managed_by_key: MANAGED_BY_KEY.to_string(),
            managed_by_value: MANAGED_BY_VALUE.to_string(),
            default_namespace: DEFAULT_APP_NAMESPACE.to_string(),
            builtin_cluster_roles: BUILTIN_CLUSTER_ROLES.iter().map(|s| s.to_string()).collect(),
            token_poll: TokenPollPolicy::default(),
            ca_cert_path: None,
            aggregation_key: AggregationKey::default(),
        }
    }
}

impl RbacConfig {
    /// `key=value` selector matching every managed object.
    pub fn managed_selector(&self) -> String {
        format!("{}={}", self.managed_by_key, self.managed_by_value)
    }

    pub fn is_builtin_cluster_role(&self, name: &str) -> bool {
        self.builtin_cluster_roles.iter().any(|r| r == name)
    }
}
