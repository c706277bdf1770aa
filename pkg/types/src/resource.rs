use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::kind::{ResourceId, ResourceKind};
use crate::meta::ObjectMeta;
use crate::namespace::Namespace;
use crate::rbac::{ClusterRole, ClusterRoleBinding, Role, RoleBinding};
use crate::secret::Secret;
use crate::service_account::ServiceAccount;

/// A typed Kubernetes object kua reads and writes as JSON.
pub trait Resource: Serialize + DeserializeOwned + Send + Sync {
    const KIND: ResourceKind;

    fn metadata(&self) -> &ObjectMeta;
    fn metadata_mut(&mut self) -> &mut ObjectMeta;

    fn id(&self) -> ResourceId {
        let meta = self.metadata();
        match (Self::KIND.is_namespaced(), &meta.namespace) {
            (true, Some(ns)) => ResourceId::namespaced(Self::KIND, &meta.name, ns),
            _ => ResourceId::cluster(Self::KIND, &meta.name),
        }
    }
}

macro_rules! impl_resource {
    ($($ty:ty => $kind:ident),* $(,)?) => {
        $(
            impl Resource for $ty {
                const KIND: ResourceKind = ResourceKind::$kind;

                fn metadata(&self) -> &ObjectMeta {
                    &self.metadata
                }

                fn metadata_mut(&mut self) -> &mut ObjectMeta {
                    &mut self.metadata
                }
            }
        )*
    };
}

impl_resource! {
    Namespace => Namespace,
    ServiceAccount => ServiceAccount,
    Secret => Secret,
    Role => Role,
    ClusterRole => ClusterRole,
    RoleBinding => RoleBinding,
    ClusterRoleBinding => ClusterRoleBinding,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_id_follows_scope() {
        let sa = ServiceAccount::new(ObjectMeta::namespaced("ci", "tools"));
        assert_eq!(
            sa.id(),
            ResourceId::namespaced(ResourceKind::ServiceAccount, "ci", "tools")
        );

        // A namespace on a cluster-scoped object is ignored.
        let cr = ClusterRole::new(ObjectMeta::namespaced("reader", "stray"), vec![]);
        assert_eq!(cr.id(), ResourceId::cluster(ResourceKind::ClusterRole, "reader"));
    }
}
