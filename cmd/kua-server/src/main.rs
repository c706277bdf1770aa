use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use pkg_api::AppState;
use pkg_api::auth::SessionSigner;
use pkg_api::server::start_server;
use pkg_constants::auth::{DEFAULT_ADMIN_PASSWORD, DEFAULT_JWT_SECRET, SESSION_TTL_SECS};
use pkg_constants::kubectl::{DEFAULT_COMMAND_TIMEOUT_SECS, DEFAULT_KUBECTL_BIN};
use pkg_constants::network::DEFAULT_API_PORT;
use pkg_constants::paths::{DEFAULT_SERVER_CONFIG, MANIFEST_SCRATCH_DIR};
use pkg_kubectl::{Kubectl, KubectlClient, ManifestStager};
use pkg_rbac::{RbacConfig, RbacService, TokenPollPolicy};
use pkg_types::config::{ServerConfigFile, load_config_file};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "kua-server", about = "Kubernetes RBAC management server")]
struct Cli {
    /// Path to YAML config file
    #[arg(long, short, default_value = DEFAULT_SERVER_CONFIG)]
    config: String,

    /// Port to listen on
    #[arg(long, env = "PORT")]
    port: Option<u16>,

    /// Kubeconfig handed to every kubectl invocation
    #[arg(long, env = "KUBECONFIG")]
    kubeconfig: Option<String>,

    /// kubectl binary
    #[arg(long)]
    kubectl: Option<String>,

    /// Namespace for ServiceAccounts created without one
    #[arg(long, env = "DEFAULT_NAMESPACE")]
    default_namespace: Option<String>,

    /// Password for the admin session
    #[arg(long, env = "ADMIN_PASSWORD", hide_env_values = true)]
    admin_password: Option<String>,

    /// HS256 secret for session tokens
    #[arg(long, env = "JWT_SECRET", hide_env_values = true)]
    jwt_secret: Option<String>,

    /// CA bundle used when the cluster config carries none
    #[arg(long, env = "CA_CERT_PATH")]
    ca_cert_path: Option<String>,

    /// Upper bound on a single kubectl call
    #[arg(long)]
    command_timeout_secs: Option<u64>,

    /// Directory for staged manifests
    #[arg(long)]
    scratch_dir: Option<String>,
}

/// Effective settings after merging CLI, environment, file and defaults.
struct Settings {
    port: u16,
    kubeconfig: Option<String>,
    kubectl: String,
    default_namespace: Option<String>,
    admin_password: String,
    jwt_secret: String,
    ca_cert_path: Option<String>,
    command_timeout: Duration,
    scratch_dir: String,
    token_poll: TokenPollPolicy,
}

impl Settings {
    // CLI args (and env) > config file > defaults
    fn merge(cli: Cli, file: ServerConfigFile) -> Self {
        let mut token_poll = TokenPollPolicy::default();
        if let Some(attempts) = file.token_poll_attempts {
            token_poll.attempts = attempts;
        }
        if let Some(ms) = file.token_poll_delay_ms {
            token_poll.delay = Duration::from_millis(ms);
        }

        Self {
            port: cli.port.or(file.port).unwrap_or(DEFAULT_API_PORT),
            kubeconfig: cli.kubeconfig.or(file.kubeconfig),
            kubectl: cli
                .kubectl
                .or(file.kubectl)
                .unwrap_or_else(|| DEFAULT_KUBECTL_BIN.to_string()),
            default_namespace: cli.default_namespace.or(file.default_namespace),
            admin_password: cli
                .admin_password
                .or(file.admin_password)
                .unwrap_or_else(|| DEFAULT_ADMIN_PASSWORD.to_string()),
            jwt_secret: cli
                .jwt_secret
                .or(file.jwt_secret)
                .unwrap_or_else(|| DEFAULT_JWT_SECRET.to_string()),
            ca_cert_path: cli.ca_cert_path.or(file.ca_cert_path),
            command_timeout: Duration::from_secs(
                cli.command_timeout_secs
                    .or(file.command_timeout_secs)
                    .unwrap_or(DEFAULT_COMMAND_TIMEOUT_SECS),
            ),
            scratch_dir: cli
                .scratch_dir
                .or(file.scratch_dir)
                .unwrap_or_else(|| MANIFEST_SCRATCH_DIR.to_string()),
            token_poll,
        }
    }
}

/// Only the length of a secret ever reaches the log.
fn mask(secret: &str) -> String {
    format!("*** ({} chars)", secret.chars().count())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();
    let cli = Cli::parse();

    // Load config file (returns defaults if file not found)
    let file_cfg: ServerConfigFile = load_config_file(&cli.config)?;
    info!("Config file: {}", cli.config);
    let settings = Settings::merge(cli, file_cfg);

    let mut rbac_config = RbacConfig {
        token_poll: settings.token_poll,
        ca_cert_path: settings.ca_cert_path.as_ref().map(PathBuf::from),
        ..Default::default()
    };
    if let Some(ns) = &settings.default_namespace {
        rbac_config.default_namespace = ns.clone();
    }

    info!("Starting kua-server");
    info!("  Port:        {}", settings.port);
    info!("  kubectl:     {}", settings.kubectl);
    info!(
        "  Kubeconfig:  {}",
        settings.kubeconfig.as_deref().unwrap_or("(kubectl default)")
    );
    info!("  Namespace:   {}", rbac_config.default_namespace);
    info!("  Scratch dir: {}", settings.scratch_dir);
    info!("  Timeout:     {:?}", settings.command_timeout);
    info!("  Password:    {}", mask(&settings.admin_password));
    info!("  JWT secret:  {}", mask(&settings.jwt_secret));

    if settings.admin_password == DEFAULT_ADMIN_PASSWORD {
        warn!("Running with the default admin password; set ADMIN_PASSWORD");
    }
    if settings.jwt_secret == DEFAULT_JWT_SECRET {
        warn!("Running with the default JWT secret; set JWT_SECRET");
    }

    let mut kubectl = Kubectl::new(&settings.kubectl).with_timeout(settings.command_timeout);
    if let Some(path) = &settings.kubeconfig {
        kubectl = kubectl.with_kubeconfig(path);
    }
    let client = KubectlClient::new(kubectl, ManifestStager::new(&settings.scratch_dir));
    let rbac = RbacService::new(Arc::new(client), rbac_config);

    match rbac.ensure_app_namespace().await {
        Ok(true) => {}
        Ok(false) => info!("App namespace already present"),
        Err(e) => warn!("App namespace initialization failed: {}", e),
    }

    let sessions = SessionSigner::new(
        &settings.admin_password,
        &settings.jwt_secret,
        Duration::from_secs(SESSION_TTL_SECS),
    );
    let state = AppState {
        rbac,
        sessions: Arc::new(sessions),
    };

    start_server(SocketAddr::from(([0, 0, 0, 0], settings.port)), state).await?;

    Ok(())
}
