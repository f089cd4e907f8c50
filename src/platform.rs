//! Process-wide logger instance and the logging macro layer.
//!
//! Libraries take an explicit [`BufferedLogCore`] (or `&mut` to one); the
//! platform instance exists for the application boundary, where one logger
//! serves the whole firmware. It is initialized once during bring-up and
//! never torn down, matching a run-to-completion embedded target.
//!
//! ```no_run
//! # use critical_section as _;
//! use ring_logger::{ConsoleSink, BufferedLogCore, PlatformLogger};
//! use ring_logger::{loginfo, logflush};
//!
//! fn putc(b: u8) { let _ = b; }
//!
//! static LOGGER: PlatformLogger<ConsoleSink, 1024> = PlatformLogger::new();
//!
//! fn main() {
//!     LOGGER.init(BufferedLogCore::new(ConsoleSink::new(putc)));
//!     loginfo!(LOGGER, "boot complete\n");
//!     logflush!(LOGGER);
//! }
//! ```

use core::cell::RefCell;

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::blocking_mutex::Mutex;
use portable_atomic::{AtomicBool, Ordering};

use crate::logger::BufferedLogCore;
use crate::sink::SinkWriter;

/// A process-wide logger slot.
///
/// Access goes through a critical-section mutex, which serializes the
/// foreground and interrupt contexts on a single-core target. The interrupt
/// macros still must use the `*_interrupt` entry points so the sink is never
/// touched with interrupts masked.
pub struct PlatformLogger<S: SinkWriter, const N: usize> {
    core: Mutex<CriticalSectionRawMutex, RefCell<Option<BufferedLogCore<S, N>>>>,
    initialized: AtomicBool,
}

impl<S: SinkWriter, const N: usize> PlatformLogger<S, N> {
    /// An empty slot, suitable for a `static`.
    pub const fn new() -> Self {
        Self {
            core: Mutex::new(RefCell::new(None)),
            initialized: AtomicBool::new(false),
        }
    }

    /// Install the log core. The first call wins; later calls are ignored
    /// and return `false`.
    pub fn init(&self, core: BufferedLogCore<S, N>) -> bool {
        if self.initialized.swap(true, Ordering::AcqRel) {
            warn!("platform logger already initialized");
            return false;
        }
        self.core.lock(|cell| {
            *cell.borrow_mut() = Some(core);
        });
        debug!("platform logger initialized");
        true
    }

    /// Whether [`init`](Self::init) has run.
    pub fn is_initialized(&self) -> bool {
        self.initialized.load(Ordering::Acquire)
    }

    /// Run `f` against the logger inside a critical section. Returns `None`
    /// when the slot has not been initialized.
    pub fn with<R>(&self, f: impl FnOnce(&mut BufferedLogCore<S, N>) -> R) -> Option<R> {
        self.core.lock(|cell| cell.borrow_mut().as_mut().map(f))
    }
}

impl<S: SinkWriter, const N: usize> Default for PlatformLogger<S, N> {
    fn default() -> Self {
        Self::new()
    }
}

/// Log at critical level through a [`PlatformLogger`].
#[macro_export]
macro_rules! logcritical {
    ($logger:expr, $($arg:tt)*) => {
        if ($crate::LogLevel::Critical as u8) <= ($crate::config::LEVEL_CEILING as u8) {
            let _ = $logger.with(|log| log.critical(::core::format_args!($($arg)*)));
        }
    };
}

/// Log at error level through a [`PlatformLogger`].
#[macro_export]
macro_rules! logerror {
    ($logger:expr, $($arg:tt)*) => {
        if ($crate::LogLevel::Error as u8) <= ($crate::config::LEVEL_CEILING as u8) {
            let _ = $logger.with(|log| log.error(::core::format_args!($($arg)*)));
        }
    };
}

/// Log at warning level through a [`PlatformLogger`].
#[macro_export]
macro_rules! logwarning {
    ($logger:expr, $($arg:tt)*) => {
        if ($crate::LogLevel::Warning as u8) <= ($crate::config::LEVEL_CEILING as u8) {
            let _ = $logger.with(|log| log.warning(::core::format_args!($($arg)*)));
        }
    };
}

/// Log at info level through a [`PlatformLogger`].
#[macro_export]
macro_rules! loginfo {
    ($logger:expr, $($arg:tt)*) => {
        if ($crate::LogLevel::Info as u8) <= ($crate::config::LEVEL_CEILING as u8) {
            let _ = $logger.with(|log| log.info(::core::format_args!($($arg)*)));
        }
    };
}

/// Log at debug level through a [`PlatformLogger`].
#[macro_export]
macro_rules! logdebug {
    ($logger:expr, $($arg:tt)*) => {
        if ($crate::LogLevel::Debug as u8) <= ($crate::config::LEVEL_CEILING as u8) {
            let _ = $logger.with(|log| log.debug(::core::format_args!($($arg)*)));
        }
    };
}

/// Log at critical level from interrupt context through a [`PlatformLogger`].
#[macro_export]
macro_rules! logcritical_interrupt {
    ($logger:expr, $($arg:tt)*) => {
        if ($crate::LogLevel::Critical as u8) <= ($crate::config::LEVEL_CEILING as u8) {
            let _ = $logger.with(|log| log.critical_interrupt(::core::format_args!($($arg)*)));
        }
    };
}

/// Log at error level from interrupt context through a [`PlatformLogger`].
#[macro_export]
macro_rules! logerror_interrupt {
    ($logger:expr, $($arg:tt)*) => {
        if ($crate::LogLevel::Error as u8) <= ($crate::config::LEVEL_CEILING as u8) {
            let _ = $logger.with(|log| log.error_interrupt(::core::format_args!($($arg)*)));
        }
    };
}

/// Log at warning level from interrupt context through a [`PlatformLogger`].
#[macro_export]
macro_rules! logwarning_interrupt {
    ($logger:expr, $($arg:tt)*) => {
        if ($crate::LogLevel::Warning as u8) <= ($crate::config::LEVEL_CEILING as u8) {
            let _ = $logger.with(|log| log.warning_interrupt(::core::format_args!($($arg)*)));
        }
    };
}

/// Log at info level from interrupt context through a [`PlatformLogger`].
#[macro_export]
macro_rules! loginfo_interrupt {
    ($logger:expr, $($arg:tt)*) => {
        if ($crate::LogLevel::Info as u8) <= ($crate::config::LEVEL_CEILING as u8) {
            let _ = $logger.with(|log| log.info_interrupt(::core::format_args!($($arg)*)));
        }
    };
}

/// Log at debug level from interrupt context through a [`PlatformLogger`].
#[macro_export]
macro_rules! logdebug_interrupt {
    ($logger:expr, $($arg:tt)*) => {
        if ($crate::LogLevel::Debug as u8) <= ($crate::config::LEVEL_CEILING as u8) {
            let _ = $logger.with(|log| log.debug_interrupt(::core::format_args!($($arg)*)));
        }
    };
}

/// Flush a [`PlatformLogger`]'s buffer to its sink, discarding the result.
#[macro_export]
macro_rules! logflush {
    ($logger:expr) => {
        let _ = $logger.with(|log| log.flush());
    };
}

/// Discard a [`PlatformLogger`]'s buffered bytes without writing them.
#[macro_export]
macro_rules! logclear {
    ($logger:expr) => {
        let _ = $logger.with(|log| log.clear());
    };
}
