//! Session authentication defaults.

/// Admin password used when none is configured.
pub const DEFAULT_ADMIN_PASSWORD: &str = "admin";

/// JWT signing secret used when none is configured.
pub const DEFAULT_JWT_SECRET: &str = "kua-auth-secret";

/// Session token lifetime, in seconds (24h).
pub const SESSION_TTL_SECS: u64 = 24 * 60 * 60;

/// Role claim carried by every session token.
pub const ADMIN_ROLE: &str = "admin";
