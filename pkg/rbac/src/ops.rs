use pkg_kubectl::ListOptions;
use pkg_types::kind::ResourceId;
use pkg_types::report::DeleteOutcome;
use pkg_types::resource::Resource;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::info;

use crate::error::{RbacError, Result};
use crate::ownership::stamp;
use crate::RbacService;

pub(crate) fn decode<T: DeserializeOwned>(what: &str, value: Value) -> Result<T> {
    serde_json::from_value(value).map_err(|e| RbacError::Decode(format!("{}: {}", what, e)))
}

impl RbacService {
    pub(crate) async fn fetch<T: Resource>(&self, id: &ResourceId) -> Result<T> {
        let value = self.client().get(id).await?;
        decode(&id.to_string(), value)
    }

    pub(crate) async fn list_typed<T: Resource>(&self, opts: &ListOptions) -> Result<Vec<T>> {
        let items = self.client().list(T::KIND, opts).await?;
        items
            .into_iter()
            .map(|item| decode(&format!("{} list", T::KIND), item))
            .collect()
    }

    /// Managed objects of one kind; `namespace: None` spans every namespace.
    pub(crate) async fn list_managed<T: Resource>(&self, namespace: Option<&str>) -> Result<Vec<T>> {
        let opts = ListOptions {
            namespace: namespace.map(str::to_string),
            ..Default::default()
        }
        .with_labels(self.config().managed_selector());
        self.list_typed(&opts).await
    }

    /// Stamp, create and read back. A taken name surfaces as `AlreadyExists`.
    pub(crate) async fn create_managed<T: Resource>(&self, mut obj: T) -> Result<T> {
        stamp(obj.metadata_mut(), self.config());
        let id = obj.id();
        let manifest = serde_json::to_value(&obj)
            .map_err(|e| RbacError::Decode(format!("{}: {}", id, e)))?;
        self.client().create(&manifest).await.map_err(|e| match e {
            pkg_kubectl::ClusterError::AlreadyExists(_) => RbacError::AlreadyExists(id.to_string()),
            other => other.into(),
        })?;
        info!("Created {}", id);
        self.fetch(&id).await
    }

    /// Ownership check, then apply with the live labels and the marker kept, then read back.
    pub(crate) async fn update_managed<T: Resource>(&self, mut obj: T) -> Result<T> {
        let id = obj.id();
        let live: T = self.assert_managed(&id).await?;

        let meta = obj.metadata_mut();
        let mut labels = live.metadata().labels.clone();
        labels.extend(std::mem::take(&mut meta.labels));
        meta.labels = labels;
        meta.resource_version = None;
        stamp(meta, self.config());

        let manifest = serde_json::to_value(&obj)
            .map_err(|e| RbacError::Decode(format!("{}: {}", id, e)))?;
        self.client().apply(&manifest).await?;
        info!("Updated {}", id);
        self.fetch(&id).await
    }

    /// Ownership check, then delete.
    pub(crate) async fn delete_managed<T: Resource>(&self, id: &ResourceId) -> Result<DeleteOutcome> {
        self.assert_managed::<T>(id).await?;
        self.client().delete(id, false).await?;
        info!("Deleted {}", id);
        Ok(DeleteOutcome {
            resource: id.clone(),
            message: format!("{} deleted", id),
        })
    }
}
