use std::path::Path;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use pkg_constants::token::{LEGACY_TOKEN_NAMESPACE, LEGACY_TOKEN_PREFIX, MIN_CA_DATA_LEN};
use pkg_kubectl::ListOptions;
use pkg_types::kubeconfig::{ClusterTls, Kubeconfig, NamedCluster};
use pkg_types::secret::Secret;
use tracing::{debug, info, warn};

use crate::error::{RbacError, Result};
use crate::ops::decode;
use crate::RbacService;

/// Placeholder or truncated CA values are treated as absent.
pub fn plausible_ca(value: &str) -> bool {
    let value = value.trim();
    !value.is_empty()
        && value.len() >= MIN_CA_DATA_LEN
        && value != "null"
        && !value.contains("OMITTED")
        && !value.contains("REDACTED")
}

fn usable(value: Option<&str>) -> Option<String> {
    value
        .filter(|v| plausible_ca(v))
        .map(|v| v.trim().to_string())
}

async fn read_ca_file(path: &Path) -> Option<String> {
    match tokio::fs::read(path).await {
        Ok(bytes) => usable(Some(&STANDARD.encode(bytes))),
        Err(e) => {
            warn!("Could not read CA file {}: {}", path.display(), e);
            None
        }
    }
}

impl RbacService {
    /// Render a kubeconfig that authenticates as this ServiceAccount.
    pub async fn generate_kubeconfig(&self, name: &str, namespace: &str) -> Result<String> {
        let config = self.build_kubeconfig(name, namespace).await?;
        config
            .to_yaml()
            .map_err(|e| RbacError::Decode(format!("kubeconfig for {}/{}: {}", namespace, name, e)))
    }

    pub async fn build_kubeconfig(&self, name: &str, namespace: &str) -> Result<Kubeconfig> {
        let token = self.service_account_token(name, namespace).await?;

        let raw = self
            .client()
            .config_view_raw()
            .await
            .map_err(|e| RbacError::ClusterConfig(format!("kubectl config view failed: {}", e)))?;
        let current: Kubeconfig = decode("kubectl config view", raw)?;
        let cluster = current
            .current_cluster()
            .filter(|c| !c.cluster.server.is_empty())
            .ok_or_else(|| {
                RbacError::ClusterConfig("no cluster with a server URL is configured".to_string())
            })?;
        let cluster_name = if cluster.name.is_empty() {
            "kubernetes"
        } else {
            cluster.name.as_str()
        };

        let tls = self.resolve_cluster_tls(&current, cluster).await;
        info!("Generated kubeconfig for {}/{} on cluster {}", namespace, name, cluster_name);
        Ok(Kubeconfig::for_service_account(
            cluster_name,
            &cluster.cluster.server,
            tls,
            namespace,
            name,
            &token,
        ))
    }

    /// First usable CA wins; each step runs only if the previous ones found nothing.
    async fn resolve_cluster_tls(&self, config: &Kubeconfig, current: &NamedCluster) -> ClusterTls {
        if let Some(data) = usable(current.cluster.certificate_authority_data.as_deref()) {
            return ClusterTls::CaData(data);
        }
        if let Some(path) = current.cluster.certificate_authority.as_deref()
            && let Some(data) = read_ca_file(Path::new(path)).await
        {
            debug!("Using CA file {} of cluster {}", path, current.name);
            return ClusterTls::CaData(data);
        }
        if let Some(data) = config
            .clusters
            .iter()
            .find_map(|c| usable(c.cluster.certificate_authority_data.as_deref()))
        {
            debug!("Using CA data from another configured cluster");
            return ClusterTls::CaData(data);
        }
        if let Some(data) = self.legacy_token_ca().await {
            debug!("Using ca.crt of the legacy default token secret");
            return ClusterTls::CaData(data);
        }
        if let Some(path) = &self.config().ca_cert_path
            && let Some(data) = read_ca_file(path).await
        {
            debug!("Using CA file {}", path.display());
            return ClusterTls::CaData(data);
        }
        warn!(
            "No CA data found for cluster {}; emitting insecure-skip-tls-verify",
            current.name
        );
        ClusterTls::Insecure
    }

    async fn legacy_token_ca(&self) -> Option<String> {
        let secrets: Vec<Secret> = match self
            .list_typed(&ListOptions::in_namespace(LEGACY_TOKEN_NAMESPACE))
            .await
        {
            Ok(s) => s,
            Err(e) => {
                debug!("Could not list secrets in {}: {}", LEGACY_TOKEN_NAMESPACE, e);
                return None;
            }
        };
        secrets
            .iter()
            .find(|s| s.metadata.name.starts_with(LEGACY_TOKEN_PREFIX))
            .and_then(|s| usable(s.data_value("ca.crt")))
    }
}
