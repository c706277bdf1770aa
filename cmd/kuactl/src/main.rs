use std::path::PathBuf;

use anyhow::{Context, bail};
use clap::{Parser, Subcommand};
use pkg_constants::network::DEFAULT_API_ADDR;
use pkg_constants::paths::{CLI_STATE_DIR, CLI_TOKEN_FILE};
use pkg_types::api::{
    AddRoleRequest, CreateUserRequest, CreateUserResponse, ErrorResponse, LoginRequest,
    LoginResponse,
};
use pkg_types::rbac::RoleKind;
use pkg_types::report::{BatchReport, FanOutReport, PermissionReport, TeardownReport};
use pkg_types::service_account::ServiceAccount;
use reqwest::{RequestBuilder, Response};
use serde::de::DeserializeOwned;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "kuactl", about = "CLI tool for kua RBAC management")]
struct Cli {
    /// Server API endpoint
    #[arg(long, env = "KUA_SERVER", default_value = DEFAULT_API_ADDR)]
    server: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Log in as admin and store the session token
    Login {
        #[arg(long, env = "KUA_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Manage ServiceAccounts
    Users {
        #[command(subcommand)]
        action: UsersAction,
    },
    /// Download a kubeconfig for a ServiceAccount
    Kubeconfig {
        namespace: String,
        name: String,
        /// Write to this file instead of stdout
        #[arg(long, short)]
        output: Option<PathBuf>,
    },
    /// Show everything a ServiceAccount is granted
    Permissions { namespace: String, name: String },
    /// Bind a role to a ServiceAccount in several namespaces
    Bind {
        namespace: String,
        name: String,
        #[arg(long)]
        role: String,
        #[arg(long, default_value = "ClusterRole", value_parser = parse_role_kind)]
        kind: RoleKind,
        #[arg(long, value_delimiter = ',', required = true)]
        namespaces: Vec<String>,
    },
    /// Remove every binding of a role from a ServiceAccount
    Unbind {
        namespace: String,
        name: String,
        role: String,
    },
}

#[derive(Subcommand)]
enum UsersAction {
    /// List managed ServiceAccounts
    List,
    /// Create a ServiceAccount
    Create {
        name: String,
        #[arg(long, short)]
        namespace: Option<String>,
        /// Grant read-only access in its namespace
        #[arg(long, conflicts_with = "edit")]
        view: bool,
        /// Grant read-write access in its namespace
        #[arg(long)]
        edit: bool,
    },
    /// Delete a ServiceAccount and its companion grants
    Delete { namespace: String, name: String },
}

fn parse_role_kind(s: &str) -> Result<RoleKind, String> {
    match s.to_ascii_lowercase().as_str() {
        "role" => Ok(RoleKind::Role),
        "clusterrole" => Ok(RoleKind::ClusterRole),
        _ => Err(format!("unknown role kind '{}' (expected Role or ClusterRole)", s)),
    }
}

fn token_path() -> anyhow::Result<PathBuf> {
    let home = dirs::home_dir().context("cannot determine home directory")?;
    Ok(home.join(CLI_STATE_DIR).join(CLI_TOKEN_FILE))
}

/// Thin HTTP client bound to one server and an optional session token.
struct ApiClient {
    http: reqwest::Client,
    base: String,
    token: Option<String>,
}

impl ApiClient {
    fn new(server: &str) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder().build()?;
        let token = token_path()
            .ok()
            .and_then(|p| std::fs::read_to_string(p).ok())
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty());
        Ok(Self {
            http,
            base: server.trim_end_matches('/').to_string(),
            token,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base, path)
    }

    fn authed(&self, req: RequestBuilder) -> anyhow::Result<RequestBuilder> {
        match &self.token {
            Some(token) => Ok(req.bearer_auth(token)),
            None => bail!("not logged in; run `kuactl login --password ...` first"),
        }
    }

    async fn send(&self, req: RequestBuilder) -> anyhow::Result<Response> {
        let resp = self.authed(req)?.send().await?;
        check(resp).await
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> anyhow::Result<T> {
        let resp = self.send(self.http.get(self.url(path))).await?;
        Ok(resp.json().await?)
    }

    async fn delete<T: DeserializeOwned>(&self, path: &str) -> anyhow::Result<T> {
        let resp = self.send(self.http.delete(self.url(path))).await?;
        Ok(resp.json().await?)
    }

    async fn post<B: serde::Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> anyhow::Result<T> {
        let resp = self.send(self.http.post(self.url(path)).json(body)).await?;
        Ok(resp.json().await?)
    }
}

/// Turn a non-success response into an error carrying the server's message.
async fn check(resp: Response) -> anyhow::Result<Response> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let text = resp.text().await.unwrap_or_default();
    match serde_json::from_str::<ErrorResponse>(&text) {
        Ok(err) => bail!("server returned {}: {}", status, err.message),
        Err(_) => bail!("server returned {}: {}", status, text),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();
    let cli = Cli::parse();
    let api = ApiClient::new(&cli.server)?;

    match cli.command {
        Commands::Login { password } => {
            info!("Logging in to {}", cli.server);
            let resp = api
                .http
                .post(api.url("/api/auth/login"))
                .json(&LoginRequest { password })
                .send()
                .await?;
            let login: LoginResponse = check(resp).await?.json().await?;

            let path = token_path()?;
            if let Some(dir) = path.parent() {
                std::fs::create_dir_all(dir)?;
            }
            std::fs::write(&path, &login.token)?;
            println!("Logged in (session valid for {})", login.expires_in);
            println!("Token stored at {}", path.display());
        }
        Commands::Users { action } => match action {
            UsersAction::List => {
                let users: Vec<ServiceAccount> = api.get("/api/users").await?;
                println!("{:<24} {:<32} {}", "NAMESPACE", "NAME", "CREATED");
                for user in &users {
                    let created = user
                        .metadata
                        .creation_timestamp
                        .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
                        .unwrap_or_else(|| "-".to_string());
                    println!(
                        "{:<24} {:<32} {}",
                        user.metadata.namespace.as_deref().unwrap_or("-"),
                        user.metadata.name,
                        created
                    );
                }
                if users.is_empty() {
                    println!("(no managed service accounts)");
                }
            }
            UsersAction::Create {
                name,
                namespace,
                view,
                edit,
            } => {
                let req = CreateUserRequest {
                    name,
                    namespace,
                    grant_view_access: view,
                    grant_edit_access: edit,
                };
                let created: CreateUserResponse = api.post("/api/users", &req).await?;
                println!("{}", created.message);
                for warning in &created.warnings {
                    println!("warning: {}", warning);
                }
                if created.kubeconfig.is_some() {
                    println!("Kubeconfig ready; fetch it with `kuactl kubeconfig`");
                }
            }
            UsersAction::Delete { namespace, name } => {
                let body: serde_json::Value = api
                    .delete(&format!("/api/users/{}/{}", namespace, name))
                    .await?;
                let report: TeardownReport = serde_json::from_value(body["result"].clone())?;
                println!("{}", report.service_account.message);
                println!("{}", report.companions.summary);
                for failed in &report.companions.failed {
                    println!("  failed: {} ({})", failed.resource, failed.error);
                }
            }
        },
        Commands::Kubeconfig {
            namespace,
            name,
            output,
        } => {
            let path = format!("/api/users/{}/{}/kubeconfig", namespace, name);
            let yaml = api.send(api.http.get(api.url(&path))).await?.text().await?;
            match output {
                Some(file) => {
                    std::fs::write(&file, yaml)?;
                    println!("Kubeconfig written to {}", file.display());
                }
                None => print!("{}", yaml),
            }
        }
        Commands::Permissions { namespace, name } => {
            let report: PermissionReport = api
                .get(&format!(
                    "/api/roles/serviceaccount/{}/{}/permissions",
                    namespace, name
                ))
                .await?;
            println!("{:<32} {:<12} {}", "ROLE", "KIND", "NAMESPACES");
            for record in &report.permissions {
                println!(
                    "{:<32} {:<12} {}",
                    record.role_name,
                    record.role_kind,
                    record.namespaces.join(",")
                );
            }
            println!(
                "{} roles via {} RoleBindings and {} ClusterRoleBindings",
                report.summary.total_roles,
                report.summary.role_bindings,
                report.summary.cluster_role_bindings
            );
        }
        Commands::Bind {
            namespace,
            name,
            role,
            kind,
            namespaces,
        } => {
            let req = AddRoleRequest {
                service_account_name: name,
                service_account_namespace: namespace,
                role_name: role,
                target_namespaces: namespaces,
                role_kind: Some(kind),
            };
            let report: FanOutReport = api.post("/api/roles/serviceaccount/add-role", &req).await?;
            println!("{}", report.summary);
            for ok in &report.successful {
                println!("  {:<24} {}", ok.namespace, ok.binding_name);
            }
            for failed in &report.failed {
                println!("  {:<24} failed: {}", failed.namespace, failed.error);
            }
        }
        Commands::Unbind {
            namespace,
            name,
            role,
        } => {
            let report: BatchReport = api
                .delete(&format!(
                    "/api/roles/serviceaccount/{}/{}/role/{}",
                    namespace, name, role
                ))
                .await?;
            println!("{}", report.summary);
            for failed in &report.failed {
                println!("  failed: {} ({})", failed.resource, failed.error);
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_role_kind() {
        assert_eq!(parse_role_kind("Role"), Ok(RoleKind::Role));
        assert_eq!(parse_role_kind("clusterrole"), Ok(RoleKind::ClusterRole));
        assert!(parse_role_kind("binding").is_err());
    }

    #[test]
    fn test_bind_splits_namespaces() {
        let cli = Cli::try_parse_from([
            "kuactl", "bind", "tools", "ci", "--role", "view", "--namespaces", "a,b,c",
        ])
        .unwrap();
        match cli.command {
            Commands::Bind { kind, namespaces, .. } => {
                assert_eq!(kind, RoleKind::ClusterRole);
                assert_eq!(namespaces, vec!["a", "b", "c"]);
            }
            _ => panic!("expected bind"),
        }
    }

    #[test]
    fn test_view_and_edit_conflict() {
        let parsed = Cli::try_parse_from(["kuactl", "users", "create", "ci", "--view", "--edit"]);
        assert!(parsed.is_err());
    }
}
