use pkg_kubectl::ListOptions;
use pkg_types::api::{ClusterInfo, ServerVersion};
use pkg_types::kind::{ResourceId, ResourceKind};
use pkg_types::meta::ObjectMeta;
use pkg_types::namespace::Namespace;
use serde_json::Value;
use tracing::info;

use crate::error::{RbacError, Result};
use crate::ops::decode;
use crate::RbacService;

impl RbacService {
    /// Make sure the default application namespace exists.
    /// Returns `true` if it had to be created.
    pub async fn ensure_app_namespace(&self) -> Result<bool> {
        let name = self.config().default_namespace.clone();
        let id = ResourceId::cluster(ResourceKind::Namespace, &name);
        match self.fetch::<Namespace>(&id).await {
            Ok(_) => Ok(false),
            Err(RbacError::NotFound(_)) => {
                self.create_managed(Namespace::new(ObjectMeta::cluster(&name)))
                    .await?;
                info!("Initialized app namespace {}", name);
                Ok(true)
            }
            Err(e) => Err(e),
        }
    }

    pub async fn cluster_info(&self) -> Result<ClusterInfo> {
        let raw = self.client().server_version().await?;
        let server = raw
            .get("serverVersion")
            .cloned()
            .ok_or_else(|| RbacError::Decode("no serverVersion in kubectl version output".to_string()))?;
        let version: ServerVersion = decode("serverVersion", server)?;
        Ok(ClusterInfo { version })
    }

    pub async fn list_namespace_names(&self) -> Result<Vec<String>> {
        let namespaces: Vec<Namespace> = self.list_typed(&ListOptions::all()).await?;
        Ok(namespaces.into_iter().map(|n| n.metadata.name).collect())
    }

    /// Nodes exactly as the API server returns them.
    pub async fn list_nodes(&self) -> Result<Vec<Value>> {
        Ok(self
            .client()
            .list(ResourceKind::Node, &ListOptions::all())
            .await?)
    }
}
