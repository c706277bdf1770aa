//! RBAC reconciliation over a [`ClusterClient`].
//!
//! Every object created here carries the ownership label from [`RbacConfig`];
//! every update or delete re-reads the live object and refuses to proceed
//! without it.

pub mod bindings;
pub mod cluster;
pub mod config;
pub mod error;
pub mod fanout;
pub mod kubeconfig;
pub mod ops;
pub mod ownership;
pub mod permissions;
pub mod roles;
pub mod service_accounts;
pub mod templates;
pub mod token;

#[cfg(any(test, feature = "testing"))]
pub mod fake;

use std::sync::Arc;

use pkg_kubectl::ClusterClient;

pub use bindings::BindingTarget;
pub use config::{AggregationKey, RbacConfig, TokenPollPolicy};
pub use error::{RbacError, Result};
pub use service_accounts::{AccessLevel, ServiceAccountCreated};

/// Stateless façade over the cluster. Cheap to clone; shared by all request handlers.
#[derive(Clone)]
pub struct RbacService {
    client: Arc<dyn ClusterClient>,
    config: Arc<RbacConfig>,
}

impl RbacService {
    pub fn new(client: Arc<dyn ClusterClient>, config: RbacConfig) -> Self {
        Self {
            client,
            config: Arc::new(config),
        }
    }

    pub fn config(&self) -> &RbacConfig {
        &self.config
    }

    pub(crate) fn client(&self) -> &dyn ClusterClient {
        self.client.as_ref()
    }
}

pub(crate) fn require_name(name: &str) -> Result<()> {
    pkg_types::validate::validate_name(name).map_err(|e| RbacError::Validation(e.to_string()))
}

pub(crate) fn require_namespace(namespace: &str) -> Result<()> {
    pkg_types::validate::validate_namespace(namespace)
        .map_err(|e| RbacError::Validation(e.to_string()))
}
