//! Exit codes for netsleuthctl.
//!
//! Only the two fatal classes terminate with a dedicated code; degraded
//! upstream calls never reach here, they surface as empty report sections.

/// Exit code for success.
pub const EXIT_SUCCESS: i32 = 0;

/// Exit code for general errors.
pub const EXIT_GENERAL_ERROR: i32 = 1;

/// Exit code when the discovery query against the session source fails.
pub const EXIT_DISCOVERY_FAILED: i32 = 69;

/// Exit code when the environment configuration or failure store is
/// missing or unreadable.
pub const EXIT_SETUP_FAILED: i32 = 78;
