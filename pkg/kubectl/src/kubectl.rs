use async_trait::async_trait;
use pkg_types::kind::{ResourceId, ResourceKind};
use serde_json::Value;
use tracing::debug;

use crate::client::{ClusterClient, ClusterError, ListOptions};
use crate::exec::Kubectl;
use crate::staging::ManifestStager;

/// [`ClusterClient`] backed by kubectl subprocesses.
/// Every mutation goes through a staged manifest file.
pub struct KubectlClient {
    exec: Kubectl,
    stager: ManifestStager,
}

impl KubectlClient {
    pub fn new(exec: Kubectl, stager: ManifestStager) -> Self {
        Self { exec, stager }
    }

    async fn run_json(&self, what: &str, args: &[&str]) -> Result<Value, ClusterError> {
        let out = self
            .exec
            .run(args)
            .await
            .map_err(|e| ClusterError::classify(what, e))?;
        serde_json::from_str(&out).map_err(|e| ClusterError::Decode(format!("{}: {}", what, e)))
    }

    /// Stage `manifest`, run `kubectl <verb> -f <file>`, and always remove the file.
    async fn submit(&self, verb: &str, manifest: &Value) -> Result<(), ClusterError> {
        let label = describe(manifest);
        let logical = format!(
            "{}-{}",
            manifest_str(manifest, &["kind"]).to_lowercase(),
            manifest_str(manifest, &["metadata", "name"])
        );
        let staged = self.stager.stage(&logical, manifest).await?;
        let path = staged.path().to_string_lossy().to_string();
        debug!("{} {} from {}", verb, label, path);

        let res = self.exec.run(&[verb, "-f", &path]).await;
        staged.unstage().await;
        res.map(|_| ()).map_err(|e| ClusterError::classify(label, e))
    }
}

fn manifest_str<'a>(manifest: &'a Value, path: &[&str]) -> &'a str {
    path.iter()
        .try_fold(manifest, |v, key| v.get(key))
        .and_then(Value::as_str)
        .unwrap_or("unknown")
}

fn describe(manifest: &Value) -> String {
    let kind = manifest_str(manifest, &["kind"]);
    let name = manifest_str(manifest, &["metadata", "name"]);
    match manifest.pointer("/metadata/namespace").and_then(Value::as_str) {
        Some(ns) => format!("{} {}/{}", kind, ns, name),
        None => format!("{} {}", kind, name),
    }
}

/// Arguments for `kubectl get` on a kind, honoring namespace scoping and selectors.
fn list_args(kind: ResourceKind, opts: &ListOptions) -> Vec<String> {
    let mut args = vec!["get".to_string(), kind.cli_name().to_string()];
    if kind.is_namespaced() {
        match &opts.namespace {
            Some(ns) => {
                args.push("-n".to_string());
                args.push(ns.clone());
            }
            None => args.push("--all-namespaces".to_string()),
        }
    }
    if let Some(sel) = &opts.label_selector {
        args.push("-l".to_string());
        args.push(sel.clone());
    }
    if let Some(sel) = &opts.field_selector {
        args.push(format!("--field-selector={}", sel));
    }
    args.push("-o".to_string());
    args.push("json".to_string());
    args
}

fn scoped_args(verb: &str, id: &ResourceId) -> Vec<String> {
    let mut args = vec![
        verb.to_string(),
        id.kind.cli_name().to_string(),
        id.name.clone(),
    ];
    if let Some(ns) = &id.namespace {
        args.push("-n".to_string());
        args.push(ns.clone());
    }
    args
}

#[async_trait]
impl ClusterClient for KubectlClient {
    async fn get(&self, id: &ResourceId) -> Result<Value, ClusterError> {
        let mut args = scoped_args("get", id);
        args.extend(["-o".to_string(), "json".to_string()]);
        let args: Vec<&str> = args.iter().map(String::as_str).collect();
        self.run_json(&id.to_string(), &args).await
    }

    async fn list(
        &self,
        kind: ResourceKind,
        opts: &ListOptions,
    ) -> Result<Vec<Value>, ClusterError> {
        let args = list_args(kind, opts);
        let args: Vec<&str> = args.iter().map(String::as_str).collect();
        let mut list = self.run_json(&format!("{} list", kind), &args).await?;
        match list.get_mut("items").map(Value::take) {
            Some(Value::Array(items)) => Ok(items),
            Some(Value::Null) | None => Ok(Vec::new()),
            Some(other) => Err(ClusterError::Decode(format!(
                "{} list: items is not an array: {}",
                kind, other
            ))),
        }
    }

    async fn create(&self, manifest: &Value) -> Result<(), ClusterError> {
        self.submit("create", manifest).await
    }

    async fn apply(&self, manifest: &Value) -> Result<(), ClusterError> {
        self.submit("apply", manifest).await
    }

    async fn delete(&self, id: &ResourceId, ignore_not_found: bool) -> Result<(), ClusterError> {
        let mut args = scoped_args("delete", id);
        if ignore_not_found {
            args.push("--ignore-not-found".to_string());
        }
        let args: Vec<&str> = args.iter().map(String::as_str).collect();
        self.exec
            .run(&args)
            .await
            .map(|_| ())
            .map_err(|e| ClusterError::classify(id, e))
    }

    async fn config_view_raw(&self) -> Result<Value, ClusterError> {
        self.run_json("kubeconfig", &["config", "view", "--raw", "-o", "json"])
            .await
    }

    async fn server_version(&self) -> Result<Value, ClusterError> {
        self.run_json("server version", &["version", "-o", "json"])
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_list_args_all_namespaces() {
        let args = list_args(
            ResourceKind::RoleBinding,
            &ListOptions::all().with_labels("app.kubernetes.io/managed-by=kua-auth"),
        );
        assert_eq!(
            args,
            vec![
                "get",
                "rolebinding",
                "--all-namespaces",
                "-l",
                "app.kubernetes.io/managed-by=kua-auth",
                "-o",
                "json"
            ]
        );
    }

    #[test]
    fn test_list_args_cluster_scoped_ignores_namespace() {
        let args = list_args(
            ResourceKind::ClusterRole,
            &ListOptions::in_namespace("dev"),
        );
        assert_eq!(args, vec!["get", "clusterrole", "-o", "json"]);
    }

    #[test]
    fn test_list_args_field_selector() {
        let args = list_args(
            ResourceKind::Secret,
            &ListOptions::in_namespace("default").with_fields("type=kubernetes.io/service-account-token"),
        );
        assert!(args.contains(&"--field-selector=type=kubernetes.io/service-account-token".to_string()));
        assert!(args.contains(&"-n".to_string()));
    }

    #[test]
    fn test_describe_manifest() {
        let m = serde_json::json!({"kind": "RoleBinding", "metadata": {"name": "rb", "namespace": "dev"}});
        assert_eq!(describe(&m), "RoleBinding dev/rb");
        let m = serde_json::json!({"kind": "ClusterRole", "metadata": {"name": "cr"}});
        assert_eq!(describe(&m), "ClusterRole cr");
    }

    fn echo_client(scratch: &std::path::Path) -> KubectlClient {
        KubectlClient::new(Kubectl::new("echo"), ManifestStager::new(scratch))
    }

    #[tokio::test]
    async fn test_get_rejects_non_json_output() {
        let tmp = tempfile::tempdir().unwrap();
        let err = echo_client(tmp.path())
            .get(&ResourceId::namespaced(ResourceKind::Role, "reader", "dev"))
            .await
            .unwrap_err();
        match err {
            ClusterError::Decode(msg) => assert!(msg.starts_with("Role dev/reader")),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_create_stages_and_cleans_up() {
        let tmp = tempfile::tempdir().unwrap();
        let scratch = tmp.path().join("scratch");
        let manifest = serde_json::json!({"kind": "ServiceAccount", "metadata": {"name": "ci", "namespace": "dev"}});
        echo_client(&scratch).create(&manifest).await.unwrap();
        assert!(scratch.exists());
        assert_eq!(std::fs::read_dir(&scratch).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_failed_apply_still_cleans_up() {
        let tmp = tempfile::tempdir().unwrap();
        let scratch = tmp.path().join("scratch");
        let client = KubectlClient::new(Kubectl::new("false"), ManifestStager::new(&scratch));
        let manifest = serde_json::json!({"kind": "Role", "metadata": {"name": "r", "namespace": "dev"}});
        let err = client.apply(&manifest).await.unwrap_err();
        assert!(matches!(err, ClusterError::Exec(_)));
        assert_eq!(std::fs::read_dir(&scratch).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_delete_ignore_not_found() {
        let tmp = tempfile::tempdir().unwrap();
        echo_client(tmp.path())
            .delete(
                &ResourceId::cluster(ResourceKind::ClusterRoleBinding, "ci-view"),
                true,
            )
            .await
            .unwrap();
    }
}
