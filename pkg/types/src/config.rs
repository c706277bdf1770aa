use serde::{Deserialize, Serialize};

/// Server configuration file (YAML).
///
/// Every field is optional; CLI flags and environment variables win over
/// the file, and built-in defaults fill whatever is left.
///
/// Example `config.yaml`:
/// ```yaml
/// port: 3000
/// kubeconfig: /etc/kua/admin.kubeconfig
/// default-namespace: kua-auth
/// admin-password: change-me
/// jwt-secret: long-random-string
/// ca-cert-path: /etc/kubernetes/pki/ca.crt
/// command-timeout-secs: 30
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServerConfigFile {
    #[serde(default)]
    pub port: Option<u16>,
    #[serde(default)]
    pub kubeconfig: Option<String>,
    #[serde(default)]
    pub kubectl: Option<String>,
    #[serde(default, alias = "default-namespace")]
    pub default_namespace: Option<String>,
    #[serde(default, alias = "admin-password")]
    pub admin_password: Option<String>,
    #[serde(default, alias = "jwt-secret")]
    pub jwt_secret: Option<String>,
    #[serde(default, alias = "ca-cert-path")]
    pub ca_cert_path: Option<String>,
    #[serde(default, alias = "command-timeout-secs")]
    pub command_timeout_secs: Option<u64>,
    #[serde(default, alias = "scratch-dir")]
    pub scratch_dir: Option<String>,
    #[serde(default, alias = "token-poll-attempts")]
    pub token_poll_attempts: Option<u32>,
    #[serde(default, alias = "token-poll-delay-ms")]
    pub token_poll_delay_ms: Option<u64>,
}

/// Load a YAML config file, returning the default if the file doesn't exist.
pub fn load_config_file<T: serde::de::DeserializeOwned + Default>(path: &str) -> anyhow::Result<T> {
    let content = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Ok(T::default());
        }
        Err(e) => return Err(e.into()),
    };
    if content.trim().is_empty() {
        return Ok(T::default());
    }
    let config: T = serde_yaml::from_str(&content)?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn missing_file_yields_default() {
        let cfg: ServerConfigFile = load_config_file("/nonexistent/kua/config.yaml").unwrap();
        assert!(cfg.port.is_none());
        assert!(cfg.jwt_secret.is_none());
    }

    #[test]
    fn reads_kebab_case_keys() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "port: 8080\ndefault-namespace: platform\nadmin-password: s3cret\ntoken-poll-attempts: 3"
        )
        .unwrap();
        let cfg: ServerConfigFile = load_config_file(file.path().to_str().unwrap()).unwrap();
        assert_eq!(cfg.port, Some(8080));
        assert_eq!(cfg.default_namespace.as_deref(), Some("platform"));
        assert_eq!(cfg.admin_password.as_deref(), Some("s3cret"));
        assert_eq!(cfg.token_poll_attempts, Some(3));
        assert!(cfg.kubeconfig.is_none());
    }

    #[test]
    fn empty_file_yields_default() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let cfg: ServerConfigFile = load_config_file(file.path().to_str().unwrap()).unwrap();
        assert!(cfg.port.is_none());
    }

    #[test]
    fn malformed_yaml_is_an_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "port: [not, a, number").unwrap();
        let res: anyhow::Result<ServerConfigFile> =
            load_config_file(file.path().to_str().unwrap());
        assert!(res.is_err());
    }
}
