//! Standard exit codes for CLI operations

/// Some CRDs failed under `--error-policy skip`
pub const PARTIAL_FAILURE: i32 = 2;
