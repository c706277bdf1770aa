use pkg_types::kind::ResourceId;
use pkg_types::meta::ObjectMeta;
use pkg_types::resource::Resource;

use crate::config::RbacConfig;
use crate::error::{RbacError, Result};
use crate::RbacService;

/// Put the ownership label on `meta`, keeping any other labels.
pub fn stamp(meta: &mut ObjectMeta, config: &RbacConfig) {
    meta.labels.insert(
        config.managed_by_key.clone(),
        config.managed_by_value.clone(),
    );
}

/// Exact match on key and value. Absent or different values are unmanaged.
pub fn is_managed(meta: &ObjectMeta, config: &RbacConfig) -> bool {
    meta.label(&config.managed_by_key) == Some(config.managed_by_value.as_str())
}

impl RbacService {
    /// Fetch the live object and fail unless it carries the ownership label.
    ///
    /// Any fetch failure propagates, so callers never mutate on a failed check.
    pub async fn assert_managed<T: Resource>(&self, id: &ResourceId) -> Result<T> {
        let obj: T = self.fetch(id).await?;
        if !is_managed(obj.metadata(), self.config()) {
            tracing::warn!("Refusing to touch unmanaged {}", id);
            return Err(RbacError::NotManaged(id.to_string()));
        }
        Ok(obj)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use pkg_types::kind::ResourceKind;
    use pkg_types::rbac::ClusterRole;

    use super::*;
    use crate::fake::{FakeCluster, FakeOp};

    #[test]
    fn test_stamp_then_check() {
        let cfg = RbacConfig::default();
        let mut meta = ObjectMeta::namespaced("ci", "dev");
        meta.labels.insert("team".into(), "a".into());
        assert!(!is_managed(&meta, &cfg));

        stamp(&mut meta, &cfg);
        assert!(is_managed(&meta, &cfg));
        assert_eq!(meta.label("team"), Some("a"));
    }

    #[test]
    fn test_other_value_is_unmanaged() {
        let cfg = RbacConfig::default();
        let mut meta = ObjectMeta::cluster("reader");
        meta.labels
            .insert(cfg.managed_by_key.clone(), "helm".to_string());
        assert!(!is_managed(&meta, &cfg));
    }

    #[tokio::test]
    async fn test_aggregated_role_with_null_rules_is_unmanaged() {
        let fake = Arc::new(FakeCluster::new());
        let svc = RbacService::new(fake.clone(), RbacConfig::default());
        let id = ResourceId::cluster(ResourceKind::ClusterRole, "monitoring");
        fake.insert_raw(
            &id,
            serde_json::json!({
                "apiVersion": "rbac.authorization.k8s.io/v1",
                "kind": "ClusterRole",
                "metadata": { "name": "monitoring" },
                "aggregationRule": { "clusterRoleSelectors": [ { "matchLabels": { "rbac.example.com/aggregate": "true" } } ] },
                "rules": null
            }),
        );

        let err = svc.assert_managed::<ClusterRole>(&id).await.unwrap_err();
        assert!(matches!(err, RbacError::NotManaged(_)));
        let err = svc.delete_cluster_role("monitoring").await.unwrap_err();
        assert!(matches!(err, RbacError::NotManaged(_)));
        assert_eq!(fake.count(FakeOp::Delete), 0);
    }
}
