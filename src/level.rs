//! Log level ordinals and level-name tables.

/// Number of log levels, `Off` included.
pub const LEVEL_COUNT: usize = 6;

/// Severity ordinals. Lower is more severe; `Off` disables output entirely.
///
/// A record is admitted when its level is less than or equal to the active
/// filter level, so raising the filter towards [`LogLevel::Debug`] makes the
/// log more verbose.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(feature = "defmt-log", derive(defmt::Format))]
#[repr(u8)]
pub enum LogLevel {
    /// Logging disabled.
    Off = 0,
    /// The system is unusable, or an unrecoverable error occurred.
    Critical = 1,
    /// An error condition.
    Error = 2,
    /// A warning condition.
    Warning = 3,
    /// Informational messages.
    Info = 4,
    /// Debug-level messages.
    Debug = 5,
}

impl LogLevel {
    /// Long name from the default table, e.g. `"warning"`.
    pub fn name(self) -> &'static str {
        DEFAULT_LEVEL_NAMES.long[self as usize]
    }

    /// Short record prefix from the default table, e.g. `"<W> "`.
    pub fn short_name(self) -> &'static str {
        DEFAULT_LEVEL_NAMES.short[self as usize]
    }
}

/// Lookup tables mapping each level ordinal to a display name.
///
/// Both arrays are sized by [`LEVEL_COUNT`], so a table with the wrong number
/// of entries is rejected at compile time.
pub struct LevelNames {
    /// Full names, used for configuration and diagnostics.
    pub long: [&'static str; LEVEL_COUNT],
    /// Record prefixes written ahead of every log statement.
    pub short: [&'static str; LEVEL_COUNT],
}

/// Default name tables.
pub static DEFAULT_LEVEL_NAMES: LevelNames = LevelNames {
    long: ["off", "critical", "error", "warning", "info", "debug"],
    short: ["O", "<!> ", "<E> ", "<W> ", "<I> ", "<D> "],
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ordering_tracks_verbosity() {
        assert!(LogLevel::Off < LogLevel::Critical);
        assert!(LogLevel::Critical < LogLevel::Error);
        assert!(LogLevel::Error < LogLevel::Warning);
        assert!(LogLevel::Warning < LogLevel::Info);
        assert!(LogLevel::Info < LogLevel::Debug);
    }

    #[test]
    fn name_tables() {
        assert_eq!(LogLevel::Critical.name(), "critical");
        assert_eq!(LogLevel::Critical.short_name(), "<!> ");
        assert_eq!(LogLevel::Debug.short_name(), "<D> ");
        assert_eq!(LogLevel::Off.short_name(), "O");
        assert_eq!(DEFAULT_LEVEL_NAMES.long.len(), LEVEL_COUNT);
    }
}
