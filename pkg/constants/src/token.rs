//! ServiceAccount token secret constants.

/// Secret type the token controller populates.
pub const SERVICE_ACCOUNT_TOKEN_TYPE: &str = "kubernetes.io/service-account-token";

/// How many times the token secret is re-fetched before giving up.
pub const TOKEN_POLL_ATTEMPTS: u32 = 10;

/// Delay before each token fetch attempt, in milliseconds.
pub const TOKEN_POLL_DELAY_MS: u64 = 1500;

/// Namespace searched for a legacy `default-token-*` secret during CA resolution.
pub const LEGACY_TOKEN_NAMESPACE: &str = "default";

/// Name prefix of the legacy default token secret.
pub const LEGACY_TOKEN_PREFIX: &str = "default-token";

/// Minimum plausible length of base64 CA data; shorter values are placeholders.
pub const MIN_CA_DATA_LEN: usize = 50;
