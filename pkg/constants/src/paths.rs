//! Filesystem path constants.

// ─── Server ────────────────────────────────────────────────────────────────

/// Default config file path for the server.
pub const DEFAULT_SERVER_CONFIG: &str = "/etc/kua/config.yaml";

/// Scratch directory for staged manifests handed to `kubectl apply -f`.
pub const MANIFEST_SCRATCH_DIR: &str = "/tmp/kua-auth";

// ─── CLI ───────────────────────────────────────────────────────────────────

/// Directory (relative to `$HOME`) where `kuactl` keeps its session token.
pub const CLI_STATE_DIR: &str = ".kua";

/// File name of the stored session token inside [`CLI_STATE_DIR`].
pub const CLI_TOKEN_FILE: &str = "token";
