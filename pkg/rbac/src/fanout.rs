use pkg_types::rbac::RoleKind;
use pkg_types::report::{FanOutReport, NamespaceBinding, NamespaceFailure};
use tracing::{info, warn};

use crate::bindings::BindingTarget;
use crate::error::{RbacError, Result};
use crate::RbacService;

/// `<sa>-<role>-<namespace>`.
pub fn fan_out_binding_name(service_account: &str, role_name: &str, namespace: &str) -> String {
    format!("{}-{}-{}", service_account, role_name, namespace)
}

impl RbacService {
    /// Create one RoleBinding per target namespace, sequentially.
    ///
    /// Each namespace succeeds or fails on its own. Repeated namespaces are bound once.
    pub async fn bind_across_namespaces(
        &self,
        service_account: &str,
        service_account_namespace: &str,
        role_kind: RoleKind,
        role_name: &str,
        namespaces: &[String],
    ) -> Result<FanOutReport> {
        if namespaces.is_empty() {
            return Err(RbacError::Validation(
                "at least one target namespace is required".to_string(),
            ));
        }

        let target = BindingTarget::new(
            role_kind,
            role_name,
            service_account,
            service_account_namespace,
        );
        target.validate()?;
        let mut report = FanOutReport::default();
        let mut seen: Vec<&str> = Vec::with_capacity(namespaces.len());
        for namespace in namespaces {
            if seen.contains(&namespace.as_str()) {
                continue;
            }
            seen.push(namespace);

            let binding_name = fan_out_binding_name(service_account, role_name, namespace);
            match self
                .create_role_binding(&binding_name, namespace, &target)
                .await
            {
                Ok(binding) => report.successful.push(NamespaceBinding {
                    namespace: namespace.clone(),
                    binding_name,
                    binding,
                }),
                Err(e) => {
                    warn!("Failed to bind {} in {}: {}", role_name, namespace, e);
                    report.failed.push(NamespaceFailure {
                        namespace: namespace.clone(),
                        binding_name,
                        error: e.to_string(),
                    });
                }
            }
        }

        report.summary = format!(
            "Created {} RoleBindings, {} failed",
            report.successful.len(),
            report.failed.len()
        );
        info!(
            "Bound {} {} to {}/{}: {}",
            role_kind, role_name, service_account_namespace, service_account, report.summary
        );
        Ok(report)
    }
}
