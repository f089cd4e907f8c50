//! Per-module log level filtering.

use core::fmt;

use crate::config;
use crate::level::LogLevel;
use crate::logger::{BufferedLogCore, FlushError};
use crate::sink::SinkWriter;

/// Independent filter levels for up to `M` subsystems.
///
/// Every slot starts at the compile-time ceiling. Module ids index the array
/// directly; an out-of-range id panics.
pub struct ModuleLevelTable<const M: usize> {
    levels: [LogLevel; M],
}

impl<const M: usize> ModuleLevelTable<M> {
    /// Create a table with all modules at the compile-time ceiling.
    pub const fn new() -> Self {
        Self {
            levels: [config::LEVEL_CEILING; M],
        }
    }

    /// The filter level for `module`.
    pub fn level(&self, module: usize) -> LogLevel {
        self.levels[module]
    }

    /// Set the filter level for `module`. Values above the compile-time
    /// ceiling are ignored; the effective level is returned either way.
    pub fn set_level(&mut self, module: usize, level: LogLevel) -> LogLevel {
        if level <= config::LEVEL_CEILING {
            self.levels[module] = level;
        }
        self.levels[module]
    }

    /// Whether a record at `level` passes the filter for `module`.
    pub fn passes(&self, module: usize, level: LogLevel) -> bool {
        level <= self.levels[module]
    }
}

impl<const M: usize> Default for ModuleLevelTable<M> {
    fn default() -> Self {
        Self::new()
    }
}

/// A [`BufferedLogCore`] with a per-module filter in front of it.
///
/// The module filter is checked before the shared log path, so the core's
/// global level still applies afterwards; the two settings never overwrite
/// each other.
pub struct ModuleLogger<S: SinkWriter, const N: usize, const M: usize> {
    core: BufferedLogCore<S, N>,
    modules: ModuleLevelTable<M>,
}

impl<S: SinkWriter, const N: usize, const M: usize> ModuleLogger<S, N, M> {
    /// Wrap a log core with a fresh module table.
    pub fn new(core: BufferedLogCore<S, N>) -> Self {
        Self {
            core,
            modules: ModuleLevelTable::new(),
        }
    }

    /// Shared access to the underlying core.
    pub fn core(&self) -> &BufferedLogCore<S, N> {
        &self.core
    }

    /// Exclusive access to the underlying core (global level, echo,
    /// auto-flush and the other knobs live there).
    pub fn core_mut(&mut self) -> &mut BufferedLogCore<S, N> {
        &mut self.core
    }

    /// The filter level for `module`.
    pub fn module_level(&self, module: usize) -> LogLevel {
        self.modules.level(module)
    }

    /// Set the filter level for `module`, independent of the global level.
    pub fn set_module_level(&mut self, module: usize, level: LogLevel) -> LogLevel {
        self.modules.set_level(module, level)
    }

    /// Render a record for `module`, if its filter admits `level`.
    pub fn log(&mut self, module: usize, level: LogLevel, args: fmt::Arguments<'_>) {
        if self.modules.passes(module, level) {
            self.core.log(level, args);
        }
    }

    /// Interrupt-context variant of [`log`](Self::log).
    pub fn log_interrupt(&mut self, module: usize, level: LogLevel, args: fmt::Arguments<'_>) {
        if self.modules.passes(module, level) {
            self.core.log_interrupt(level, args);
        }
    }

    /// Drain the shared buffer to the sink.
    pub fn flush(&mut self) -> Result<(), FlushError<S::Error>> {
        self.core.flush()
    }

    /// Discard the shared buffer without writing to the sink.
    pub fn clear(&mut self) {
        self.core.clear()
    }
}
