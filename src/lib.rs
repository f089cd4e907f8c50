//! Buffered ring logger for embedded targets
//!
//! Log records are rendered into a fixed-capacity ring buffer in RAM and
//! drained on demand to a slower backing sink: an SD card file, an EEPROM
//! window, or a raw console. No heap allocation, no unbounded blocking for
//! the record producer, and a dedicated interrupt-context entry point that
//! never touches the sink.
//!
//! The core pieces:
//!
//! - [`RingBuffer`]: overwrite-on-full circular byte storage
//! - [`SinkWriter`]: capability trait for the backing medium
//! - [`BufferedLogCore`]: buffer, overrun accounting and flush policy
//! - [`ModuleLogger`]: optional per-module level filtering
//! - [`PlatformLogger`]: optional process-wide instance plus logging macros
//!
//! ```
//! use ring_logger::{BufferedLogCore, ConsoleSink, LogLevel};
//!
//! fn putc(b: u8) {
//!     // forward to the board's serial console
//!     let _ = b;
//! }
//!
//! let mut log: BufferedLogCore<ConsoleSink, 1024> =
//!     BufferedLogCore::new(ConsoleSink::new(putc));
//! log.set_level(LogLevel::Info);
//! log.info(format_args!("boot complete, vbat={} mV\n", 3291));
//! let _ = log.flush();
//! ```

#![cfg_attr(not(test), no_std)]

#[cfg(all(feature = "defmt-log", feature = "log"))]
compile_error!("the `log` and `defmt-log` features are mutually exclusive");

// Crate-internal diagnostics, routed to `defmt` or `log` depending on the
// selected feature. No-ops when neither is enabled.
macro_rules! debug {
    ($($arg:tt)*) => {{
        #[cfg(feature = "defmt-log")]
        ::defmt::debug!($($arg)*);
        #[cfg(feature = "log")]
        ::log::debug!($($arg)*);
    }};
}

macro_rules! warn {
    ($($arg:tt)*) => {{
        #[cfg(feature = "defmt-log")]
        ::defmt::warn!($($arg)*);
        #[cfg(feature = "log")]
        ::log::warn!($($arg)*);
    }};
}

macro_rules! error {
    ($($arg:tt)*) => {{
        #[cfg(feature = "defmt-log")]
        ::defmt::error!($($arg)*);
        #[cfg(feature = "log")]
        ::log::error!($($arg)*);
    }};
}

pub mod config;
pub mod eeprom;
pub mod level;
pub mod logger;
pub mod modules;
pub mod platform;
pub mod ring_buffer;
#[cfg(feature = "sdmmc")]
pub mod sd_writer;
pub mod sink;

pub use eeprom::{EepromStore, EepromWindowSink, EEPROM_SENTINEL};
pub use level::{LevelNames, LogLevel, DEFAULT_LEVEL_NAMES, LEVEL_COUNT};
pub use logger::{BufferedLogCore, FlushError, OverrunTracker};
pub use modules::{ModuleLevelTable, ModuleLogger};
pub use platform::PlatformLogger;
pub use ring_buffer::RingBuffer;
#[cfg(feature = "sdmmc")]
pub use sd_writer::SdFileSink;
pub use sink::{ConsoleSink, SinkWriter};
