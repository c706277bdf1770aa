//! Built-in rule sets.

use pkg_types::api::PermissionTemplate;
use pkg_types::rbac::PolicyRule;

const WORKLOAD_GROUPS: &[&str] = &["", "apps", "batch", "extensions", "networking.k8s.io"];
const WORKLOAD_RESOURCES: &[&str] = &[
    "pods",
    "services",
    "deployments",
    "statefulsets",
    "daemonsets",
    "replicasets",
    "jobs",
    "cronjobs",
    "configmaps",
    "secrets",
    "ingresses",
    "persistentvolumeclaims",
    "serviceaccounts",
    "roles",
    "rolebindings",
];
const READ_VERBS: &[&str] = &["get", "list", "watch"];
const WRITE_VERBS: &[&str] = &["get", "list", "watch", "create", "update", "patch", "delete"];

/// Rules of the `<sa>-view-role` granted at ServiceAccount creation.
pub fn view_rules() -> Vec<PolicyRule> {
    vec![PolicyRule::new(WORKLOAD_GROUPS, WORKLOAD_RESOURCES, READ_VERBS)]
}

/// Rules of the `<sa>-edit-role` granted at ServiceAccount creation.
pub fn edit_rules() -> Vec<PolicyRule> {
    vec![PolicyRule::new(WORKLOAD_GROUPS, WORKLOAD_RESOURCES, WRITE_VERBS)]
}

fn template(name: &str, description: &str, rules: Vec<PolicyRule>) -> PermissionTemplate {
    PermissionTemplate {
        name: name.to_string(),
        description: description.to_string(),
        rules,
    }
}

pub fn permission_templates() -> Vec<PermissionTemplate> {
    vec![
        template(
            "admin",
            "Full administrative access within namespace",
            vec![PolicyRule::new(&["*"], &["*"], &["*"])],
        ),
        template(
            "developer",
            "Access to deployments, pods, services, and related resources",
            vec![
                PolicyRule::new(
                    &["", "apps", "extensions"],
                    &["deployments", "replicasets", "pods", "services", "configmaps", "secrets"],
                    WRITE_VERBS,
                ),
                PolicyRule::new(&[""], &["pods/log", "pods/exec"], &["get", "list", "create"]),
            ],
        ),
        template(
            "viewer",
            "Read-only access to all resources",
            vec![PolicyRule::new(&["*"], &["*"], READ_VERBS)],
        ),
        template(
            "logs-only",
            "Access to view logs only",
            vec![PolicyRule::new(&[""], &["pods", "pods/log"], READ_VERBS)],
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_template_names() {
        let names: Vec<String> = permission_templates().into_iter().map(|t| t.name).collect();
        assert_eq!(names, vec!["admin", "developer", "viewer", "logs-only"]);
    }

    #[test]
    fn test_view_is_read_only() {
        let rule = &view_rules()[0];
        assert!(!rule.verbs.iter().any(|v| v == "delete" || v == "create"));
        assert_eq!(rule.resources, edit_rules()[0].resources);
    }
}
