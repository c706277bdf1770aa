use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;

use pkg_constants::kubectl::{DEFAULT_COMMAND_TIMEOUT_SECS, DEFAULT_KUBECTL_BIN};
use tracing::debug;

#[derive(Debug, thiserror::Error)]
pub enum ExecError {
    #[error("failed to spawn {binary}: {source}")]
    Spawn {
        binary: String,
        #[source]
        source: std::io::Error,
    },

    #[error("kubectl exited with {}: {stderr}", describe_exit(*.code, *.signal))]
    Failed {
        code: Option<i32>,
        signal: Option<i32>,
        stderr: String,
    },

    /// Exit status was zero but the command only wrote to stderr.
    #[error("kubectl produced no output: {stderr}")]
    StderrOnly { stderr: String },

    #[error("kubectl timed out after {0:?}")]
    Timeout(Duration),
}

impl ExecError {
    /// The captured stderr, when the process got far enough to produce one.
    pub fn stderr(&self) -> Option<&str> {
        match self {
            ExecError::Failed { stderr, .. } | ExecError::StderrOnly { stderr } => Some(stderr),
            _ => None,
        }
    }
}

fn describe_exit(code: Option<i32>, signal: Option<i32>) -> String {
    match (code, signal) {
        (Some(c), _) => format!("exit code {}", c),
        (None, Some(s)) => format!("signal {}", s),
        (None, None) => "unknown status".to_string(),
    }
}

#[cfg(unix)]
fn exit_signal(status: &std::process::ExitStatus) -> Option<i32> {
    use std::os::unix::process::ExitStatusExt;
    status.signal()
}

#[cfg(not(unix))]
fn exit_signal(_status: &std::process::ExitStatus) -> Option<i32> {
    None
}

/// Runs kubectl invocations with a fixed kubeconfig and a per-call timeout.
#[derive(Debug, Clone)]
pub struct Kubectl {
    binary: String,
    kubeconfig: Option<PathBuf>,
    timeout: Duration,
}

impl Default for Kubectl {
    fn default() -> Self {
        Self {
            binary: DEFAULT_KUBECTL_BIN.to_string(),
            kubeconfig: None,
            timeout: Duration::from_secs(DEFAULT_COMMAND_TIMEOUT_SECS),
        }
    }
}

impl Kubectl {
    pub fn new(binary: &str) -> Self {
        Self {
            binary: binary.to_string(),
            ..Default::default()
        }
    }

    pub fn with_kubeconfig(mut self, path: impl Into<PathBuf>) -> Self {
        self.kubeconfig = Some(path.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn binary(&self) -> &str {
        &self.binary
    }

    fn cmd(&self) -> tokio::process::Command {
        let mut cmd = tokio::process::Command::new(&self.binary);
        if let Some(path) = &self.kubeconfig {
            cmd.arg(format!("--kubeconfig={}", path.display()));
        }
        cmd.stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        cmd
    }

    /// Run one command and return its stdout.
    ///
    /// Fails on a non-zero exit, or when stdout is empty while stderr is not.
    /// On timeout the child is dropped, which kills it.
    pub async fn run(&self, args: &[&str]) -> Result<String, ExecError> {
        debug!("{} {}", self.binary, args.join(" "));

        let child = self
            .cmd()
            .args(args)
            .spawn()
            .map_err(|source| ExecError::Spawn {
                binary: self.binary.clone(),
                source,
            })?;

        let output = match tokio::time::timeout(self.timeout, child.wait_with_output()).await {
            Ok(res) => res.map_err(|source| ExecError::Spawn {
                binary: self.binary.clone(),
                source,
            })?,
            Err(_) => return Err(ExecError::Timeout(self.timeout)),
        };

        let stdout = String::from_utf8_lossy(&output.stdout).to_string();
        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();

        if !output.status.success() {
            return Err(ExecError::Failed {
                code: output.status.code(),
                signal: exit_signal(&output.status),
                stderr,
            });
        }
        if stdout.trim().is_empty() && !stderr.is_empty() {
            return Err(ExecError::StderrOnly { stderr });
        }
        Ok(stdout)
    }
}
