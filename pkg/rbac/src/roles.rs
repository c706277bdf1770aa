use pkg_types::kind::{ResourceId, ResourceKind};
use pkg_types::meta::ObjectMeta;
use pkg_types::rbac::{ClusterRole, PolicyRule, Role};
use pkg_types::report::DeleteOutcome;

use crate::error::{RbacError, Result};
use crate::{RbacService, require_name, require_namespace};

fn require_rules(rules: &[PolicyRule]) -> Result<()> {
    if rules.is_empty() {
        return Err(RbacError::Validation(
            "at least one rule is required".to_string(),
        ));
    }
    Ok(())
}

impl RbacService {
    /// Managed Roles in `namespace`, or in every namespace.
    pub async fn list_roles(&self, namespace: Option<&str>) -> Result<Vec<Role>> {
        self.list_managed(namespace).await
    }

    pub async fn list_cluster_roles(&self) -> Result<Vec<ClusterRole>> {
        self.list_managed(None).await
    }

    pub async fn create_role(
        &self,
        name: &str,
        namespace: &str,
        rules: Vec<PolicyRule>,
    ) -> Result<Role> {
        require_name(name)?;
        require_namespace(namespace)?;
        require_rules(&rules)?;
        self.create_managed(Role::new(ObjectMeta::namespaced(name, namespace), rules))
            .await
    }

    pub async fn update_role(
        &self,
        name: &str,
        namespace: &str,
        rules: Vec<PolicyRule>,
    ) -> Result<Role> {
        require_rules(&rules)?;
        self.update_managed(Role::new(ObjectMeta::namespaced(name, namespace), rules))
            .await
    }

    pub async fn delete_role(&self, name: &str, namespace: &str) -> Result<DeleteOutcome> {
        let id = ResourceId::namespaced(ResourceKind::Role, name, namespace);
        self.delete_managed::<Role>(&id).await
    }

    pub async fn create_cluster_role(
        &self,
        name: &str,
        rules: Vec<PolicyRule>,
    ) -> Result<ClusterRole> {
        require_name(name)?;
        require_rules(&rules)?;
        self.create_managed(ClusterRole::new(ObjectMeta::cluster(name), rules))
            .await
    }

    pub async fn update_cluster_role(
        &self,
        name: &str,
        rules: Vec<PolicyRule>,
    ) -> Result<ClusterRole> {
        require_rules(&rules)?;
        self.update_managed(ClusterRole::new(ObjectMeta::cluster(name), rules))
            .await
    }

    pub async fn delete_cluster_role(&self, name: &str) -> Result<DeleteOutcome> {
        let id = ResourceId::cluster(ResourceKind::ClusterRole, name);
        self.delete_managed::<ClusterRole>(&id).await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::RbacConfig;
    use crate::fake::{FakeCluster, FakeOp};
    use crate::ownership::is_managed;

    fn service() -> (Arc<FakeCluster>, RbacService) {
        let fake = Arc::new(FakeCluster::new());
        let svc = RbacService::new(fake.clone(), RbacConfig::default());
        (fake, svc)
    }

    fn reader_rules() -> Vec<PolicyRule> {
        vec![PolicyRule::new(&[""], &["pods"], &["get", "list"])]
    }

    #[tokio::test]
    async fn test_created_role_reads_back_managed() {
        let (fake, svc) = service();
        let role = svc.create_role("reader", "dev", reader_rules()).await.unwrap();
        assert!(is_managed(&role.metadata, svc.config()));
        assert!(role.metadata.uid.is_some());
        assert_eq!(fake.count(FakeOp::Create), 1);
    }

    #[tokio::test]
    async fn test_create_existing_name_is_already_exists() {
        let (_fake, svc) = service();
        svc.create_role("reader", "dev", reader_rules()).await.unwrap();
        let err = svc
            .create_role("reader", "dev", reader_rules())
            .await
            .unwrap_err();
        assert!(matches!(err, RbacError::AlreadyExists(_)));
    }

    #[tokio::test]
    async fn test_create_rejects_bad_input() {
        let (fake, svc) = service();
        assert!(matches!(
            svc.create_role("Bad_Name", "dev", reader_rules()).await,
            Err(RbacError::Validation(_))
        ));
        assert!(matches!(
            svc.create_role("reader", "dev", vec![]).await,
            Err(RbacError::Validation(_))
        ));
        assert!(fake.calls().is_empty());
    }

    #[tokio::test]
    async fn test_update_unlabelled_role_is_not_managed() {
        let (fake, svc) = service();
        fake.insert(&Role::new(ObjectMeta::namespaced("foreign", "dev"), reader_rules()));

        let err = svc
            .update_role("foreign", "dev", reader_rules())
            .await
            .unwrap_err();
        assert!(matches!(err, RbacError::NotManaged(_)));
        let err = svc.delete_role("foreign", "dev").await.unwrap_err();
        assert!(matches!(err, RbacError::NotManaged(_)));
        assert_eq!(fake.count(FakeOp::Apply), 0);
        assert_eq!(fake.count(FakeOp::Delete), 0);
    }

    #[tokio::test]
    async fn test_update_missing_role_is_not_found() {
        let (fake, svc) = service();
        let err = svc
            .update_role("ghost", "dev", reader_rules())
            .await
            .unwrap_err();
        assert!(matches!(err, RbacError::NotFound(_)));
        let err = svc.delete_cluster_role("ghost").await.unwrap_err();
        assert!(matches!(err, RbacError::NotFound(_)));
        assert_eq!(fake.count(FakeOp::Apply), 0);
    }

    #[tokio::test]
    async fn test_update_replaces_rules_and_keeps_marker() {
        let (_fake, svc) = service();
        svc.create_cluster_role("auditor", reader_rules())
            .await
            .unwrap();
        let updated = svc
            .update_cluster_role(
                "auditor",
                vec![PolicyRule::new(&["apps"], &["deployments"], &["get"])],
            )
            .await
            .unwrap();
        assert_eq!(updated.rules[0].resources, vec!["deployments"]);
        assert!(is_managed(&updated.metadata, svc.config()));
    }

    #[tokio::test]
    async fn test_delete_managed_role() {
        let (fake, svc) = service();
        svc.create_role("reader", "dev", reader_rules()).await.unwrap();
        let outcome = svc.delete_role("reader", "dev").await.unwrap();
        assert_eq!(outcome.resource.to_string(), "Role dev/reader");
        assert!(!fake.contains(&outcome.resource));
    }

    #[tokio::test]
    async fn test_list_only_returns_managed() {
        let (fake, svc) = service();
        fake.insert(&Role::new(ObjectMeta::namespaced("foreign", "dev"), reader_rules()));
        svc.create_role("mine", "dev", reader_rules()).await.unwrap();
        svc.create_role("other", "prod", reader_rules()).await.unwrap();

        let all = svc.list_roles(None).await.unwrap();
        assert_eq!(all.len(), 2);
        let dev = svc.list_roles(Some("dev")).await.unwrap();
        assert_eq!(dev.len(), 1);
        assert_eq!(dev[0].metadata.name, "mine");
    }
}
