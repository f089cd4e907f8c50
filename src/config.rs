//! Configuration constants for the ring logger.

use crate::level::LogLevel;

/// Whether logging is enabled on boot.
pub const LOG_EN_DEFAULT: bool = true;

/// Whether a full buffer triggers an automatic flush on boot.
pub const LOG_AUTOFLUSH_DEFAULT: bool = true;

/// Whether records are echoed to the console on boot.
pub const LOG_ECHO_DEFAULT: bool = false;

/// Compile-time level ceiling, selected by the `max-level-*` cargo features.
///
/// The runtime level setter clamps to this value, and the platform logging
/// macros compare against it with a constant condition so that statements
/// above the ceiling are removed entirely by the optimizer.
pub const LEVEL_CEILING: LogLevel = if cfg!(feature = "max-level-off") {
    LogLevel::Off
} else if cfg!(feature = "max-level-critical") {
    LogLevel::Critical
} else if cfg!(feature = "max-level-error") {
    LogLevel::Error
} else if cfg!(feature = "max-level-warning") {
    LogLevel::Warning
} else if cfg!(feature = "max-level-info") {
    LogLevel::Info
} else {
    LogLevel::Debug
};
