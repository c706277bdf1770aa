use std::collections::BTreeMap;

use pkg_types::kind::{ResourceId, ResourceKind};
use pkg_types::meta::ObjectMeta;
use pkg_types::rbac::RoleKind;
use pkg_types::report::{BatchReport, DeleteOutcome, FailedDelete, TeardownReport};
use pkg_types::service_account::ServiceAccount;
use tracing::{info, warn};

use crate::bindings::BindingTarget;
use crate::error::Result;
use crate::templates::{edit_rules, view_rules};
use crate::{RbacService, require_name, require_namespace};

/// Namespace-scoped access granted alongside a new ServiceAccount.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AccessLevel {
    #[default]
    None,
    View,
    Edit,
}

impl AccessLevel {
    /// Edit wins when both are requested.
    pub fn from_flags(view: bool, edit: bool) -> Self {
        match (view, edit) {
            (_, true) => AccessLevel::Edit,
            (true, false) => AccessLevel::View,
            (false, false) => AccessLevel::None,
        }
    }

    fn suffix(self) -> Option<&'static str> {
        match self {
            AccessLevel::None => None,
            AccessLevel::View => Some("view"),
            AccessLevel::Edit => Some("edit"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ServiceAccountCreated {
    pub service_account: ServiceAccount,
    /// Access grants that failed. The ServiceAccount itself exists regardless.
    pub warnings: Vec<String>,
}

/// Role and binding names created for `name` by an access grant, in deletion order.
pub fn companion_ids(name: &str, namespace: &str) -> Vec<ResourceId> {
    let mut ids = Vec::with_capacity(4);
    for level in ["view", "edit"] {
        ids.push(ResourceId::namespaced(
            ResourceKind::Role,
            &format!("{}-{}-role", name, level),
            namespace,
        ));
    }
    for level in ["view", "edit"] {
        ids.push(ResourceId::namespaced(
            ResourceKind::RoleBinding,
            &format!("{}-{}-binding", name, level),
            namespace,
        ));
    }
    ids
}

impl RbacService {
    pub async fn list_service_accounts(&self, namespace: Option<&str>) -> Result<Vec<ServiceAccount>> {
        self.list_managed(namespace).await
    }

    /// A single managed ServiceAccount; unmanaged ones are reported as `NotManaged`.
    pub async fn get_service_account(&self, name: &str, namespace: &str) -> Result<ServiceAccount> {
        let id = ResourceId::namespaced(ResourceKind::ServiceAccount, name, namespace);
        self.assert_managed(&id).await
    }

    /// Create a ServiceAccount, then optionally a companion Role + RoleBinding.
    ///
    /// Grant failures are downgraded to warnings on the result.
    pub async fn create_service_account(
        &self,
        name: &str,
        namespace: Option<&str>,
        access: AccessLevel,
    ) -> Result<ServiceAccountCreated> {
        let namespace = namespace.unwrap_or(&self.config().default_namespace);
        require_name(name)?;
        require_namespace(namespace)?;

        let service_account = self
            .create_managed(ServiceAccount::new(ObjectMeta::namespaced(name, namespace)))
            .await?;

        let mut warnings = Vec::new();
        if let Some(level) = access.suffix()
            && let Err(e) = self.grant_access(name, namespace, access).await
        {
            warn!("Failed to grant {} access to {}/{}: {}", level, namespace, name, e);
            warnings.push(format!("Failed to grant {} access: {}", level, e));
        }

        Ok(ServiceAccountCreated {
            service_account,
            warnings,
        })
    }

    /// Re-apply a managed ServiceAccount with new labels and annotations.
    /// Live labels the caller does not override, and the marker, are kept.
    pub async fn update_service_account(
        &self,
        name: &str,
        namespace: &str,
        labels: BTreeMap<String, String>,
        annotations: BTreeMap<String, String>,
    ) -> Result<ServiceAccount> {
        let mut meta = ObjectMeta::namespaced(name, namespace);
        meta.labels = labels;
        meta.annotations = annotations;
        self.update_managed(ServiceAccount::new(meta)).await
    }

    async fn grant_access(&self, name: &str, namespace: &str, access: AccessLevel) -> Result<()> {
        let (level, rules) = match access {
            AccessLevel::None => return Ok(()),
            AccessLevel::View => ("view", view_rules()),
            AccessLevel::Edit => ("edit", edit_rules()),
        };
        let role_name = format!("{}-{}-role", name, level);
        let binding_name = format!("{}-{}-binding", name, level);

        self.create_role(&role_name, namespace, rules).await?;
        let target = BindingTarget::new(RoleKind::Role, &role_name, name, namespace);
        self.create_role_binding(&binding_name, namespace, &target)
            .await?;
        info!("Granted {} access to {}/{}", level, namespace, name);
        Ok(())
    }

    /// Delete a managed ServiceAccount and its companion roles and bindings.
    ///
    /// Companion deletes ignore missing objects and never block the primary delete.
    pub async fn delete_service_account(&self, name: &str, namespace: &str) -> Result<TeardownReport> {
        let id = ResourceId::namespaced(ResourceKind::ServiceAccount, name, namespace);
        self.assert_managed::<ServiceAccount>(&id).await?;

        let mut companions = BatchReport::default();
        for companion in companion_ids(name, namespace) {
            match self.client().delete(&companion, true).await {
                Ok(()) => companions.successful.push(DeleteOutcome {
                    message: format!("{} deleted", companion),
                    resource: companion,
                }),
                Err(e) => {
                    warn!("Could not delete {}: {}", companion, e);
                    companions.failed.push(FailedDelete {
                        error: e.to_string(),
                        resource: companion,
                    });
                }
            }
        }
        companions.summary = format!(
            "{} companion resources removed, {} failed",
            companions.successful.len(),
            companions.failed.len()
        );
        let warnings = companions
            .failed
            .iter()
            .map(|f| format!("Could not delete {}: {}", f.resource, f.error))
            .collect();

        self.client().delete(&id, false).await?;
        info!("Deleted {}", id);

        Ok(TeardownReport {
            service_account: DeleteOutcome {
                message: format!("{} deleted", id),
                resource: id,
            },
            companions,
            warnings,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::fake::{FakeCluster, FakeOp};
    use crate::ownership::is_managed;
    use crate::{RbacConfig, RbacError};

    fn service() -> (Arc<FakeCluster>, RbacService) {
        let fake = Arc::new(FakeCluster::new());
        let svc = RbacService::new(fake.clone(), RbacConfig::default());
        (fake, svc)
    }

    #[test]
    fn test_edit_wins_over_view() {
        assert_eq!(AccessLevel::from_flags(true, true), AccessLevel::Edit);
        assert_eq!(AccessLevel::from_flags(true, false), AccessLevel::View);
        assert_eq!(AccessLevel::from_flags(false, false), AccessLevel::None);
    }

    #[tokio::test]
    async fn test_create_defaults_namespace() {
        let (_fake, svc) = service();
        let created = svc
            .create_service_account("deployer", None, AccessLevel::None)
            .await
            .unwrap();
        let meta = &created.service_account.metadata;
        assert_eq!(meta.namespace.as_deref(), Some("kua-auth"));
        assert!(is_managed(meta, svc.config()));
        assert!(created.warnings.is_empty());
    }

    #[tokio::test]
    async fn test_create_with_view_access() {
        let (fake, svc) = service();
        svc.create_service_account("bot", Some("team-a"), AccessLevel::View)
            .await
            .unwrap();
        assert!(fake.contains(&ResourceId::namespaced(ResourceKind::Role, "bot-view-role", "team-a")));
        let rb = fake
            .object(&ResourceId::namespaced(ResourceKind::RoleBinding, "bot-view-binding", "team-a"))
            .unwrap();
        assert_eq!(rb["roleRef"]["name"], "bot-view-role");
        assert_eq!(rb["subjects"][0]["name"], "bot");
    }

    #[tokio::test]
    async fn test_grant_failure_is_a_warning() {
        let (fake, svc) = service();
        fake.fail_on(FakeOp::Create, "bot-edit-binding");
        let created = svc
            .create_service_account("bot", Some("team-a"), AccessLevel::Edit)
            .await
            .unwrap();
        assert_eq!(created.warnings.len(), 1);
        assert!(created.warnings[0].contains("edit"));
        assert!(fake.contains(&ResourceId::namespaced(ResourceKind::ServiceAccount, "bot", "team-a")));
    }

    #[tokio::test]
    async fn test_duplicate_service_account() {
        let (_fake, svc) = service();
        svc.create_service_account("bot", Some("team-a"), AccessLevel::None)
            .await
            .unwrap();
        let err = svc
            .create_service_account("bot", Some("team-a"), AccessLevel::None)
            .await
            .unwrap_err();
        assert!(matches!(err, RbacError::AlreadyExists(_)));
    }

    #[tokio::test]
    async fn test_teardown_issues_all_companion_deletes() {
        let (fake, svc) = service();
        svc.create_service_account("bot", Some("team-a"), AccessLevel::View)
            .await
            .unwrap();

        let report = svc.delete_service_account("bot", "team-a").await.unwrap();
        assert_eq!(report.companions.successful.len(), 4);
        assert!(report.companions.failed.is_empty());
        assert_eq!(fake.count_kind(FakeOp::Delete, ResourceKind::Role), 2);
        assert_eq!(fake.count_kind(FakeOp::Delete, ResourceKind::RoleBinding), 2);
        assert!(!fake.contains(&report.service_account.resource));
        assert!(!fake.contains(&ResourceId::namespaced(ResourceKind::Role, "bot-view-role", "team-a")));
    }

    #[tokio::test]
    async fn test_teardown_survives_companion_failures() {
        let (fake, svc) = service();
        svc.create_service_account("bot", Some("team-a"), AccessLevel::None)
            .await
            .unwrap();
        for id in companion_ids("bot", "team-a") {
            fake.fail_on(FakeOp::Delete, &id.name);
        }

        let report = svc.delete_service_account("bot", "team-a").await.unwrap();
        assert_eq!(report.companions.failed.len(), 4);
        assert_eq!(report.warnings.len(), 4);
        assert!(!fake.contains(&ResourceId::namespaced(ResourceKind::ServiceAccount, "bot", "team-a")));
    }

    #[tokio::test]
    async fn test_teardown_refuses_unmanaged() {
        let (fake, svc) = service();
        fake.insert(&ServiceAccount::new(ObjectMeta::namespaced("default", "team-a")));
        let err = svc.delete_service_account("default", "team-a").await.unwrap_err();
        assert!(matches!(err, RbacError::NotManaged(_)));
        assert_eq!(fake.count(FakeOp::Delete), 0);
    }

    #[tokio::test]
    async fn test_update_keeps_marker_and_live_labels() {
        let (fake, svc) = service();
        svc.create_service_account("bot", Some("team-a"), AccessLevel::None)
            .await
            .unwrap();

        let labels = BTreeMap::from([("team".to_string(), "payments".to_string())]);
        let annotations = BTreeMap::from([("owner".to_string(), "ops@example.com".to_string())]);
        let updated = svc
            .update_service_account("bot", "team-a", labels, annotations)
            .await
            .unwrap();
        assert!(is_managed(&updated.metadata, svc.config()));
        assert_eq!(updated.metadata.label("team"), Some("payments"));
        assert_eq!(updated.metadata.annotation("owner"), Some("ops@example.com"));
        assert_eq!(fake.count_kind(FakeOp::Apply, ResourceKind::ServiceAccount), 1);
    }

    #[tokio::test]
    async fn test_update_refuses_unmanaged_and_missing() {
        let (fake, svc) = service();
        fake.insert(&ServiceAccount::new(ObjectMeta::namespaced("default", "team-a")));
        let err = svc
            .update_service_account("default", "team-a", BTreeMap::new(), BTreeMap::new())
            .await
            .unwrap_err();
        assert!(matches!(err, RbacError::NotManaged(_)));

        let err = svc
            .update_service_account("ghost", "team-a", BTreeMap::new(), BTreeMap::new())
            .await
            .unwrap_err();
        assert!(matches!(err, RbacError::NotFound(_)));
        assert_eq!(fake.count(FakeOp::Apply), 0);
    }
}
