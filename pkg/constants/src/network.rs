//! Network-related constants.

/// Default port for the kua API server.
pub const DEFAULT_API_PORT: u16 = 3000;

/// Default API server address (HTTP), used by `kuactl`.
pub const DEFAULT_API_ADDR: &str = "http://127.0.0.1:3000";
