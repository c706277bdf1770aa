use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use pkg_constants::labels::SERVICE_ACCOUNT_NAME_ANNOTATION;
use pkg_constants::token::SERVICE_ACCOUNT_TOKEN_TYPE;
use pkg_kubectl::ListOptions;
use pkg_types::kind::{ResourceId, ResourceKind};
use pkg_types::meta::ObjectMeta;
use pkg_types::resource::Resource;
use pkg_types::secret::Secret;
use pkg_types::service_account::ServiceAccount;
use tracing::{debug, info, warn};

use crate::error::{RbacError, Result};
use crate::ownership::stamp;
use crate::RbacService;

pub(crate) fn decode_base64(what: &str, encoded: &str) -> Result<String> {
    let bytes = STANDARD
        .decode(encoded.trim())
        .map_err(|e| RbacError::Decode(format!("{}: {}", what, e)))?;
    String::from_utf8(bytes).map_err(|e| RbacError::Decode(format!("{}: {}", what, e)))
}

impl RbacService {
    /// Bearer token for a managed ServiceAccount.
    ///
    /// Reuses a populated token secret the ServiceAccount already references.
    /// Otherwise replaces this account's managed token secrets with a fresh one
    /// and polls until the token controller fills it in.
    pub async fn service_account_token(&self, name: &str, namespace: &str) -> Result<String> {
        let id = ResourceId::namespaced(ResourceKind::ServiceAccount, name, namespace);
        let sa: ServiceAccount = self.assert_managed(&id).await?;

        if let Some(token) = self.existing_token(&sa, namespace).await {
            debug!("Reusing existing token secret for {}", id);
            return Ok(token);
        }

        let secret_name = format!("{}-token-{}", name, chrono::Utc::now().timestamp_millis());
        self.prune_token_secrets(name, namespace, &secret_name).await;

        let mut meta = ObjectMeta::namespaced(&secret_name, namespace);
        meta.annotations
            .insert(SERVICE_ACCOUNT_NAME_ANNOTATION.to_string(), name.to_string());
        stamp(&mut meta, self.config());
        let secret = Secret::service_account_token(meta);
        let secret_id = secret.id();
        let manifest = serde_json::to_value(&secret)
            .map_err(|e| RbacError::Decode(format!("{}: {}", secret_id, e)))?;
        self.client().create(&manifest).await?;
        info!("Created token secret {}", secret_id);

        match self.poll_token(&secret_id).await {
            Ok(token) => Ok(token),
            Err(e) => {
                if let Err(cleanup) = self.client().delete(&secret_id, true).await {
                    warn!("Failed to clean up {}: {}", secret_id, cleanup);
                }
                Err(e)
            }
        }
    }

    async fn existing_token(&self, sa: &ServiceAccount, namespace: &str) -> Option<String> {
        for reference in &sa.secrets {
            let id = ResourceId::namespaced(ResourceKind::Secret, &reference.name, namespace);
            match self.fetch::<Secret>(&id).await {
                Ok(secret) if secret.is_service_account_token() => {
                    if let Some(encoded) = secret.data_value("token") {
                        match decode_base64(&id.to_string(), encoded) {
                            Ok(token) => return Some(token),
                            Err(e) => warn!("Ignoring undecodable token in {}: {}", id, e),
                        }
                    }
                }
                Ok(_) => {}
                Err(e) => warn!("Error checking existing secret {}: {}", id, e),
            }
        }
        None
    }

    /// Delete managed token secrets of this ServiceAccount other than `keep`. Best effort.
    async fn prune_token_secrets(&self, name: &str, namespace: &str, keep: &str) {
        let opts = ListOptions::in_namespace(namespace)
            .with_labels(self.config().managed_selector())
            .with_fields(format!("type={}", SERVICE_ACCOUNT_TOKEN_TYPE));
        let secrets: Vec<Secret> = match self.list_typed(&opts).await {
            Ok(s) => s,
            Err(e) => {
                warn!("Could not list old token secrets in {}: {}", namespace, e);
                return;
            }
        };
        for old in secrets {
            if old.metadata.name == keep
                || old.metadata.annotation(SERVICE_ACCOUNT_NAME_ANNOTATION) != Some(name)
            {
                continue;
            }
            let id = old.id();
            match self.client().delete(&id, true).await {
                Ok(()) => info!("Deleted superseded token secret {}", id),
                Err(e) => warn!("Could not delete old secret {}: {}", id, e),
            }
        }
    }

    async fn poll_token(&self, id: &ResourceId) -> Result<String> {
        let policy = self.config().token_poll;
        for attempt in 1..=policy.attempts {
            tokio::time::sleep(policy.delay).await;
            match self.fetch::<Secret>(id).await {
                Ok(secret) => {
                    if let Some(encoded) = secret.data_value("token") {
                        debug!("Token for {} populated after {} attempts", id, attempt);
                        return decode_base64(&id.to_string(), encoded);
                    }
                    debug!("Attempt {}/{}: {} not populated yet", attempt, policy.attempts, id);
                }
                Err(e) => warn!("Attempt {}/{} to read {} failed: {}", attempt, policy.attempts, id, e),
            }
        }
        Err(RbacError::TokenUnavailable {
            secret: id.to_string(),
            attempts: policy.attempts,
        })
    }
}
