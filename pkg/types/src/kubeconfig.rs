use serde::{Deserialize, Serialize};

/// Client configuration document, as read from `kubectl config view --raw -o json`
/// and as emitted for a ServiceAccount.
///
/// Example output:
/// ```yaml
/// apiVersion: v1
/// kind: Config
/// clusters:
/// - name: prod
///   cluster:
///     server: https://10.0.0.1:6443
///     certificate-authority-data: LS0tLS1CRUdJTi...
/// contexts:
/// - name: team-a-deployer-prod
///   context:
///     cluster: prod
///     user: deployer
///     namespace: team-a
/// current-context: team-a-deployer-prod
/// users:
/// - name: deployer
///   user:
///     token: eyJhbGciOi...
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Kubeconfig {
    #[serde(rename = "apiVersion", default)]
    pub api_version: String,
    #[serde(default)]
    pub kind: String,
    #[serde(default)]
    pub clusters: Vec<NamedCluster>,
    #[serde(default)]
    pub contexts: Vec<NamedContext>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_context: Option<String>,
    #[serde(default)]
    pub users: Vec<NamedUser>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NamedCluster {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub cluster: ClusterEntry,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ClusterEntry {
    #[serde(default)]
    pub server: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub certificate_authority_data: Option<String>,
    /// Path to a CA file. Only ever read from an existing config, never emitted.
    #[serde(default, skip_serializing)]
    pub certificate_authority: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub insecure_skip_tls_verify: Option<bool>,
}

/// How a client verifies the API server. Exactly one of the two ends up in the document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClusterTls {
    /// Base64-encoded PEM bundle.
    CaData(String),
    Insecure,
}

impl ClusterEntry {
    pub fn new(server: &str, tls: ClusterTls) -> Self {
        let (certificate_authority_data, insecure_skip_tls_verify) = match tls {
            ClusterTls::CaData(data) => (Some(data), None),
            ClusterTls::Insecure => (None, Some(true)),
        };
        Self {
            server: server.to_string(),
            certificate_authority_data,
            certificate_authority: None,
            insecure_skip_tls_verify,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NamedContext {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub context: ContextEntry,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContextEntry {
    #[serde(default)]
    pub cluster: String,
    #[serde(default)]
    pub user: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NamedUser {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub user: UserEntry,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserEntry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}

impl Kubeconfig {
    /// Single-cluster, single-user config that authenticates as a ServiceAccount.
    pub fn for_service_account(
        cluster_name: &str,
        server: &str,
        tls: ClusterTls,
        namespace: &str,
        service_account: &str,
        token: &str,
    ) -> Self {
        let context_name = format!("{}-{}-{}", namespace, service_account, cluster_name);
        Self {
            api_version: "v1".to_string(),
            kind: "Config".to_string(),
            clusters: vec![NamedCluster {
                name: cluster_name.to_string(),
                cluster: ClusterEntry::new(server, tls),
            }],
            contexts: vec![NamedContext {
                name: context_name.clone(),
                context: ContextEntry {
                    cluster: cluster_name.to_string(),
                    user: service_account.to_string(),
                    namespace: Some(namespace.to_string()),
                },
            }],
            current_context: Some(context_name),
            users: vec![NamedUser {
                name: service_account.to_string(),
                user: UserEntry {
                    token: Some(token.to_string()),
                },
            }],
        }
    }

    /// The cluster selected by `current-context`, falling back to the first entry.
    pub fn current_cluster(&self) -> Option<&NamedCluster> {
        let by_context = self.current_context.as_deref().and_then(|current| {
            let ctx = self.contexts.iter().find(|c| c.name == current)?;
            self.clusters.iter().find(|c| c.name == ctx.context.cluster)
        });
        by_context.or_else(|| self.clusters.first())
    }

    pub fn to_yaml(&self) -> Result<String, serde_yaml::Error> {
        serde_yaml::to_string(self)
    }
}
