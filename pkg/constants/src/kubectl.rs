//! Command executor constants.

/// Default kubectl binary, resolved through `$PATH`.
pub const DEFAULT_KUBECTL_BIN: &str = "kubectl";

/// Upper bound on a single kubectl invocation, in seconds.
pub const DEFAULT_COMMAND_TIMEOUT_SECS: u64 = 30;
