use pkg_constants::rbac::CLUSTER_WIDE;
use pkg_kubectl::ListOptions;
use pkg_types::api::BindingsResponse;
use pkg_types::kind::{ResourceId, ResourceKind};
use pkg_types::rbac::{ClusterRoleBinding, RoleBinding, RoleKind, RoleRef};
use pkg_types::report::{
    BatchReport, FailedDelete, PermissionRecord, PermissionReport,
    PermissionSummary, SubjectRef,
};
use tracing::{info, warn};

use crate::config::AggregationKey;
use crate::error::{RbacError, Result};
use crate::RbacService;

/// Folds bindings into one record per role, in first-seen order.
struct Aggregator {
    key: AggregationKey,
    records: Vec<PermissionRecord>,
}

impl Aggregator {
    fn new(key: AggregationKey) -> Self {
        Self {
            key,
            records: Vec::new(),
        }
    }

    fn add(&mut self, role_ref: &RoleRef, namespace: &str, binding: ResourceId) {
        let key = self.key;
        let pos = self.records.iter().position(|r| {
            r.role_name == role_ref.name
                && (key == AggregationKey::RoleName || r.role_kind == role_ref.kind)
        });
        let record = match pos {
            Some(i) => &mut self.records[i],
            None => {
                self.records.push(PermissionRecord {
                    role_name: role_ref.name.clone(),
                    role_kind: role_ref.kind,
                    namespaces: Vec::new(),
                    bindings: Vec::new(),
                });
                let last = self.records.len() - 1;
                &mut self.records[last]
            }
        };
        if !record.namespaces.iter().any(|n| n == namespace) {
            record.namespaces.push(namespace.to_string());
        }
        record.bindings.push(binding);
    }
}

fn matches_role(record: &PermissionRecord, role_name: &str, role_kind: Option<RoleKind>) -> bool {
    record.role_name == role_name && role_kind.is_none_or(|k| k == record.role_kind)
}

impl RbacService {
    /// Every binding in the cluster whose subjects name this ServiceAccount, managed or not.
    pub async fn bindings_for_service_account(
        &self,
        name: &str,
        namespace: &str,
    ) -> Result<BindingsResponse> {
        let role_bindings: Vec<RoleBinding> = self.list_typed(&ListOptions::all()).await?;
        let cluster_role_bindings: Vec<ClusterRoleBinding> =
            self.list_typed(&ListOptions::all()).await?;
        Ok(BindingsResponse {
            role_bindings: role_bindings
                .into_iter()
                .filter(|b| b.binds_service_account(name, namespace))
                .collect(),
            cluster_role_bindings: cluster_role_bindings
                .into_iter()
                .filter(|b| b.binds_service_account(name, namespace))
                .collect(),
        })
    }

    /// Group every binding of this ServiceAccount by role.
    ///
    /// Namespaced bindings contribute their namespace, cluster bindings contribute `*`.
    pub async fn get_permissions(&self, name: &str, namespace: &str) -> Result<PermissionReport> {
        let found = self.bindings_for_service_account(name, namespace).await?;

        let mut agg = Aggregator::new(self.config().aggregation_key);
        for rb in &found.role_bindings {
            let ns = rb.metadata.namespace.as_deref().unwrap_or_default();
            agg.add(
                &rb.role_ref,
                ns,
                ResourceId::namespaced(ResourceKind::RoleBinding, &rb.metadata.name, ns),
            );
        }
        for crb in &found.cluster_role_bindings {
            agg.add(
                &crb.role_ref,
                CLUSTER_WIDE,
                ResourceId::cluster(ResourceKind::ClusterRoleBinding, &crb.metadata.name),
            );
        }

        let summary = PermissionSummary {
            total_roles: agg.records.len(),
            role_bindings: found.role_bindings.len(),
            cluster_role_bindings: found.cluster_role_bindings.len(),
        };
        Ok(PermissionReport {
            service_account: SubjectRef {
                name: name.to_string(),
                namespace: namespace.to_string(),
            },
            permissions: agg.records,
            summary,
        })
    }

    /// Delete every binding that grants `role_name` to this ServiceAccount.
    ///
    /// Each delete is ownership-checked on its own; failures land in the report.
    pub async fn remove_role_from_service_account(
        &self,
        name: &str,
        namespace: &str,
        role_name: &str,
        role_kind: Option<RoleKind>,
    ) -> Result<BatchReport> {
        let report = self.get_permissions(name, namespace).await?;
        let bindings: Vec<ResourceId> = report
            .permissions
            .into_iter()
            .filter(|r| matches_role(r, role_name, role_kind))
            .flat_map(|r| r.bindings)
            .collect();
        if bindings.is_empty() {
            return Err(RbacError::NotFound(format!(
                "role {} for ServiceAccount {}/{}",
                role_name, namespace, name
            )));
        }

        let mut out = BatchReport::default();
        for id in bindings {
            let res = match id.kind {
                ResourceKind::ClusterRoleBinding => {
                    self.delete_managed::<ClusterRoleBinding>(&id).await
                }
                _ => self.delete_managed::<RoleBinding>(&id).await,
            };
            match res {
                Ok(outcome) => out.successful.push(outcome),
                Err(e) => {
                    warn!("Could not remove {}: {}", id, e);
                    out.failed.push(FailedDelete {
                        resource: id,
                        error: e.to_string(),
                    });
                }
            }
        }
        out.summary = format!(
            "Removed {} bindings, {} failed",
            out.successful.len(),
            out.failed.len()
        );
        info!(
            "Removed role {} from {}/{}: {}",
            role_name, namespace, name, out.summary
        );
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use pkg_types::meta::ObjectMeta;
    use pkg_types::rbac::Subject;

    use super::*;
    use crate::fake::{FakeCluster, FakeOp};
    use crate::ownership::stamp;
    use crate::RbacConfig;

    fn rb(name: &str, ns: &str, kind: RoleKind, role: &str, managed: bool) -> RoleBinding {
        let mut meta = ObjectMeta::namespaced(name, ns);
        if managed {
            stamp(&mut meta, &RbacConfig::default());
        }
        RoleBinding::new(
            meta,
            vec![Subject::service_account("ci", "tools")],
            RoleRef::new(kind, role),
        )
    }

    fn crb(name: &str, role: &str, managed: bool) -> ClusterRoleBinding {
        let mut meta = ObjectMeta::cluster(name);
        if managed {
            stamp(&mut meta, &RbacConfig::default());
        }
        ClusterRoleBinding::new(
            meta,
            vec![Subject::service_account("ci", "tools")],
            RoleRef::new(RoleKind::ClusterRole, role),
        )
    }

    fn service(config: RbacConfig) -> (Arc<FakeCluster>, RbacService) {
        let fake = Arc::new(FakeCluster::new());
        let svc = RbacService::new(fake.clone(), config);
        (fake, svc)
    }

    #[tokio::test]
    async fn test_one_record_per_role() {
        let (fake, svc) = service(RbacConfig::default());
        fake.insert(&rb("ci-edit", "ns1", RoleKind::ClusterRole, "edit", true));
        fake.insert(&crb("ci-view", "view", true));

        let report = svc.get_permissions("ci", "tools").await.unwrap();
        assert_eq!(report.permissions.len(), 2);
        let edit = report.permissions.iter().find(|p| p.role_name == "edit").unwrap();
        assert_eq!(edit.namespaces, vec!["ns1"]);
        let view = report.permissions.iter().find(|p| p.role_name == "view").unwrap();
        assert_eq!(view.namespaces, vec!["*"]);
        assert_eq!(report.summary.total_roles, 2);
        assert_eq!(report.summary.role_bindings, 1);
        assert_eq!(report.summary.cluster_role_bindings, 1);
        assert_eq!(fake.count(FakeOp::List), 2);
    }

    #[tokio::test]
    async fn test_subject_match_is_exact() {
        let (fake, svc) = service(RbacConfig::default());
        let mut other = rb("other", "ns1", RoleKind::ClusterRole, "edit", true);
        other.subjects = vec![Subject::service_account("ci", "elsewhere")];
        fake.insert(&other);

        let report = svc.get_permissions("ci", "tools").await.unwrap();
        assert!(report.permissions.is_empty());
        assert_eq!(report.summary.total_roles, 0);
    }

    #[tokio::test]
    async fn test_namespaces_are_deduplicated() {
        let (fake, svc) = service(RbacConfig::default());
        fake.insert(&rb("a", "ns1", RoleKind::ClusterRole, "edit", true));
        fake.insert(&rb("b", "ns1", RoleKind::ClusterRole, "edit", true));
        fake.insert(&rb("c", "ns2", RoleKind::ClusterRole, "edit", true));

        let report = svc.get_permissions("ci", "tools").await.unwrap();
        assert_eq!(report.permissions.len(), 1);
        assert_eq!(report.permissions[0].namespaces, vec!["ns1", "ns2"]);
        assert_eq!(report.permissions[0].bindings.len(), 3);
    }

    #[tokio::test]
    async fn test_aggregation_key_choice() {
        let (fake, svc) = service(RbacConfig::default());
        fake.insert(&rb("a", "ns1", RoleKind::Role, "ops", true));
        fake.insert(&crb("b", "ops", true));
        let report = svc.get_permissions("ci", "tools").await.unwrap();
        assert_eq!(report.permissions.len(), 2);

        let config = RbacConfig {
            aggregation_key: AggregationKey::RoleName,
            ..Default::default()
        };
        let (fake, svc) = service(config);
        fake.insert(&rb("a", "ns1", RoleKind::Role, "ops", true));
        fake.insert(&crb("b", "ops", true));
        let report = svc.get_permissions("ci", "tools").await.unwrap();
        assert_eq!(report.permissions.len(), 1);
        assert_eq!(report.permissions[0].namespaces, vec!["ns1", "*"]);
    }

    #[tokio::test]
    async fn test_remove_role_partitions_results() {
        let (fake, svc) = service(RbacConfig::default());
        fake.insert(&rb("mine", "ns1", RoleKind::ClusterRole, "view", true));
        fake.insert(&rb("foreign", "ns2", RoleKind::ClusterRole, "view", false));
        fake.insert(&crb("global", "view", true));

        let report = svc
            .remove_role_from_service_account("ci", "tools", "view", None)
            .await
            .unwrap();
        assert_eq!(report.successful.len(), 2);
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].resource.name, "foreign");
        assert_eq!(report.summary, "Removed 2 bindings, 1 failed");
    }

    #[tokio::test]
    async fn test_remove_unknown_role_is_not_found() {
        let (_fake, svc) = service(RbacConfig::default());
        let err = svc
            .remove_role_from_service_account("ci", "tools", "nope", None)
            .await
            .unwrap_err();
        assert!(matches!(err, RbacError::NotFound(_)));
    }
}
