//! Standard exit codes for the leproc launcher
//!
//! When the native loader reports a failure the launcher exits with that
//! loader code instead (see `config::ExitPolicy`); these codes cover failures
//! that happen before the loader is reached.

/// Successful execution
pub const EXIT_SUCCESS: i32 = 0;

/// Generic error (avoid using - be more specific)
pub const EXIT_ERROR: i32 = 1;

/// Panic or unrecoverable error
pub const EXIT_PANIC: i32 = 101;

/// Execution error (native loader refused the launch, relaunch failed)
pub const EXIT_EXECUTION_ERROR: i32 = 104;

/// Invalid command-line arguments
pub const EXIT_INVALID_ARGS: i32 = 105;

/// I/O error (file not found, permission denied, disk error)
pub const EXIT_IO_ERROR: i32 = 106;

/// Configuration error (invalid profile, unknown locale)
pub const EXIT_CONFIG_ERROR: i32 = 109;

/// Dependency error (native loader DLLs missing)
pub const EXIT_DEPENDENCY_ERROR: i32 = 110;
