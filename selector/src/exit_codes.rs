//! Stable exit codes for the selector CLI.

/// Every confidence level passed.
pub const OK: i32 = 0;
/// Missing tool or credential, request error, or an empty selection.
pub const FAILED: i32 = 1;
