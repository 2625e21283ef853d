//! Standard exit codes for CLI operations
//!
//! These exit codes follow Unix conventions and sysexits.h where applicable.

/// Success - operation completed without errors
pub const SUCCESS: i32 = 0;

/// General error - unspecified failure
pub const ERROR: i32 = 1;

/// Configuration error - unreadable or invalid proxy configuration
pub const CONFIG_ERROR: i32 = 2;

/// Not found - no local copy and no remote could provide one
pub const NOT_FOUND: i32 = 3;

/// Layout error - path or coordinate could not be translated
pub const LAYOUT_ERROR: i32 = 4;

/// IO error - file not found, permission denied, etc.
pub const IO_ERROR: i32 = 5;

/// Checksum error - a file disagrees with its sidecar
pub const CHECKSUM_ERROR: i32 = 6;

/// Usage error - invalid arguments or options (following sysexits.h convention)
pub const USAGE_ERROR: i32 = 64;
