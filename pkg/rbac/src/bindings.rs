use pkg_types::kind::{ResourceId, ResourceKind};
use pkg_types::meta::ObjectMeta;
use pkg_types::rbac::{ClusterRole, ClusterRoleBinding, Role, RoleBinding, RoleKind, RoleRef, Subject};
use pkg_types::report::DeleteOutcome;
use pkg_types::service_account::ServiceAccount;

use crate::error::{RbacError, Result};
use crate::{RbacService, require_name, require_namespace};

/// The role a binding references and the ServiceAccount it grants.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BindingTarget {
    pub role_kind: RoleKind,
    pub role_name: String,
    pub service_account: String,
    pub service_account_namespace: String,
}

impl BindingTarget {
    pub fn new(role_kind: RoleKind, role_name: &str, service_account: &str, sa_namespace: &str) -> Self {
        Self {
            role_kind,
            role_name: role_name.to_string(),
            service_account: service_account.to_string(),
            service_account_namespace: sa_namespace.to_string(),
        }
    }

    /// Every field must name something before the cluster is consulted.
    pub fn validate(&self) -> Result<()> {
        require_name(&self.role_name)?;
        require_name(&self.service_account)?;
        require_namespace(&self.service_account_namespace)
    }

    fn role_ref(&self) -> RoleRef {
        RoleRef::new(self.role_kind, &self.role_name)
    }

    fn subject(&self) -> Subject {
        Subject::service_account(&self.service_account, &self.service_account_namespace)
    }
}

impl RbacService {
    pub async fn list_role_bindings(&self, namespace: Option<&str>) -> Result<Vec<RoleBinding>> {
        self.list_managed(namespace).await
    }

    pub async fn list_cluster_role_bindings(&self) -> Result<Vec<ClusterRoleBinding>> {
        self.list_managed(None).await
    }

    /// Both ends of a binding must be ours, except the built-in ClusterRoles.
    /// `binding_namespace` is `None` for ClusterRoleBindings.
    pub(crate) async fn verify_binding_target(
        &self,
        target: &BindingTarget,
        binding_namespace: Option<&str>,
    ) -> Result<()> {
        match (target.role_kind, binding_namespace) {
            (RoleKind::Role, Some(ns)) => {
                let id = ResourceId::namespaced(ResourceKind::Role, &target.role_name, ns);
                self.assert_managed::<Role>(&id).await?;
            }
            (RoleKind::Role, None) => {
                return Err(RbacError::Validation(
                    "a ClusterRoleBinding can only reference a ClusterRole".to_string(),
                ));
            }
            (RoleKind::ClusterRole, _) => {
                if !self.config().is_builtin_cluster_role(&target.role_name) {
                    let id = ResourceId::cluster(ResourceKind::ClusterRole, &target.role_name);
                    self.assert_managed::<ClusterRole>(&id).await?;
                }
            }
        }

        let sa = ResourceId::namespaced(
            ResourceKind::ServiceAccount,
            &target.service_account,
            &target.service_account_namespace,
        );
        self.assert_managed::<ServiceAccount>(&sa).await?;
        Ok(())
    }

    pub async fn create_role_binding(
        &self,
        name: &str,
        namespace: &str,
        target: &BindingTarget,
    ) -> Result<RoleBinding> {
        require_name(name)?;
        require_namespace(namespace)?;
        target.validate()?;
        self.verify_binding_target(target, Some(namespace)).await?;
        let binding = RoleBinding::new(
            ObjectMeta::namespaced(name, namespace),
            vec![target.subject()],
            target.role_ref(),
        );
        self.create_managed(binding).await
    }

    /// Re-apply under the same name. A changed roleRef replaces the binding.
    pub async fn update_role_binding(
        &self,
        name: &str,
        namespace: &str,
        target: &BindingTarget,
    ) -> Result<RoleBinding> {
        target.validate()?;
        let id = ResourceId::namespaced(ResourceKind::RoleBinding, name, namespace);
        self.assert_managed::<RoleBinding>(&id).await?;
        self.verify_binding_target(target, Some(namespace)).await?;
        let binding = RoleBinding::new(
            ObjectMeta::namespaced(name, namespace),
            vec![target.subject()],
            target.role_ref(),
        );
        self.update_managed(binding).await
    }

    pub async fn delete_role_binding(&self, name: &str, namespace: &str) -> Result<DeleteOutcome> {
        let id = ResourceId::namespaced(ResourceKind::RoleBinding, name, namespace);
        self.delete_managed::<RoleBinding>(&id).await
    }

    pub async fn create_cluster_role_binding(
        &self,
        name: &str,
        target: &BindingTarget,
    ) -> Result<ClusterRoleBinding> {
        require_name(name)?;
        target.validate()?;
        self.verify_binding_target(target, None).await?;
        let binding = ClusterRoleBinding::new(
            ObjectMeta::cluster(name),
            vec![target.subject()],
            target.role_ref(),
        );
        self.create_managed(binding).await
    }

    pub async fn update_cluster_role_binding(
        &self,
        name: &str,
        target: &BindingTarget,
    ) -> Result<ClusterRoleBinding> {
        target.validate()?;
        let id = ResourceId::cluster(ResourceKind::ClusterRoleBinding, name);
        self.assert_managed::<ClusterRoleBinding>(&id).await?;
        self.verify_binding_target(target, None).await?;
        let binding = ClusterRoleBinding::new(
            ObjectMeta::cluster(name),
            vec![target.subject()],
            target.role_ref(),
        );
        self.update_managed(binding).await
    }

    pub async fn delete_cluster_role_binding(&self, name: &str) -> Result<DeleteOutcome> {
        let id = ResourceId::cluster(ResourceKind::ClusterRoleBinding, name);
        self.delete_managed::<ClusterRoleBinding>(&id).await
    }
}
