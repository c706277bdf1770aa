use async_trait::async_trait;
use pkg_types::kind::{ResourceId, ResourceKind};
use serde_json::Value;

use crate::exec::ExecError;
use crate::staging::StagingError;

#[derive(Debug, thiserror::Error)]
pub enum ClusterError {
    #[error("{0} not found")]
    NotFound(String),
    #[error("{0} already exists")]
    AlreadyExists(String),
    #[error(transparent)]
    Exec(ExecError),
    #[error(transparent)]
    Staging(#[from] StagingError),
    #[error("unexpected kubectl output: {0}")]
    Decode(String),
}

impl ClusterError {
    /// Sort an executor failure into NotFound / AlreadyExists by its stderr,
    /// keeping everything else as an execution error.
    pub fn classify(what: impl std::fmt::Display, err: ExecError) -> Self {
        match err.stderr() {
            Some(s) if s.contains("(NotFound)") || s.contains("not found") => {
                ClusterError::NotFound(what.to_string())
            }
            Some(s) if s.contains("(AlreadyExists)") || s.contains("already exists") => {
                ClusterError::AlreadyExists(what.to_string())
            }
            _ => ClusterError::Exec(err),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, ClusterError::NotFound(_))
    }
}

/// Filters for a list call. `namespace: None` means all namespaces for
/// namespaced kinds and is ignored for cluster-scoped ones.
#[derive(Debug, Clone, Default)]
pub struct ListOptions {
    pub namespace: Option<String>,
    pub label_selector: Option<String>,
    pub field_selector: Option<String>,
}

impl ListOptions {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn in_namespace(namespace: &str) -> Self {
        Self {
            namespace: Some(namespace.to_string()),
            ..Default::default()
        }
    }

    pub fn with_labels(mut self, selector: impl Into<String>) -> Self {
        self.label_selector = Some(selector.into());
        self
    }

    pub fn with_fields(mut self, selector: impl Into<String>) -> Self {
        self.field_selector = Some(selector.into());
        self
    }
}

/// The narrow slice of the Kubernetes API kua needs.
/// Implementations: kubectl subprocesses in production, in-memory for tests.
#[async_trait]
pub trait ClusterClient: Send + Sync {
    /// Fetch one object as JSON.
    async fn get(&self, id: &ResourceId) -> Result<Value, ClusterError>;

    /// List objects of one kind; returns the `items` array.
    async fn list(&self, kind: ResourceKind, opts: &ListOptions)
    -> Result<Vec<Value>, ClusterError>;

    /// Create a new object from a full manifest. Fails with `AlreadyExists` if the name is taken.
    async fn create(&self, manifest: &Value) -> Result<(), ClusterError>;

    /// Create or replace an object from a full manifest.
    async fn apply(&self, manifest: &Value) -> Result<(), ClusterError>;

    async fn delete(&self, id: &ResourceId, ignore_not_found: bool) -> Result<(), ClusterError>;

    /// The active client configuration with secrets and CA data inlined.
    async fn config_view_raw(&self) -> Result<Value, ClusterError>;

    /// `kubectl version` output as JSON.
    async fn server_version(&self) -> Result<Value, ClusterError>;
}
