//! Buffered log core: ring buffer, overrun accounting and flush policy.

use core::fmt;

use crate::config;
use crate::level::{LevelNames, LogLevel, DEFAULT_LEVEL_NAMES};
use crate::ring_buffer::RingBuffer;
use crate::sink::SinkWriter;

/// Records data loss between flush cycles.
///
/// The flag is set when a byte is stored while the buffer is full and no
/// flush freed space first; it is cleared only by a completed flush cycle or
/// an explicit [`BufferedLogCore::clear`]. The dropped-byte count is a
/// lifetime counter kept for diagnostics and never resets.
#[derive(Debug, Default)]
pub struct OverrunTracker {
    overrun_since_last_flush: bool,
    dropped: u32,
}

impl OverrunTracker {
    fn record(&mut self) {
        self.overrun_since_last_flush = true;
        self.dropped = self.dropped.saturating_add(1);
    }

    fn clear(&mut self) {
        self.overrun_since_last_flush = false;
    }

    /// `true` if data was lost since the last completed flush.
    pub fn has_overrun(&self) -> bool {
        self.overrun_since_last_flush
    }

    /// Total bytes overwritten while full, saturating.
    pub fn dropped_bytes(&self) -> u32 {
        self.dropped
    }
}

/// Error draining the buffer to the sink.
///
/// Either case is fatal for the logging subsystem: the medium is typically
/// already gone (card removed, EEPROM exhausted), so nothing retries.
#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum FlushError<E: fmt::Debug> {
    /// The sink driver reported an error.
    #[error("sink driver fault: {0:?}")]
    Driver(E),
    /// The sink accepted fewer bytes than requested.
    #[error("short write to sink: {written} of {expected} bytes")]
    ShortWrite {
        /// Bytes the flush cycle asked the sink to take.
        expected: usize,
        /// Bytes the sink actually reported written.
        written: usize,
    },
}

/// The buffered-sink coordination engine.
///
/// Owns a [`RingBuffer`] of `N` bytes and an [`OverrunTracker`], plus the
/// injected [`SinkWriter`] the buffer drains into. Records are rendered one
/// byte at a time into [`push_byte`](Self::push_byte); the overwrite and
/// overrun policy and the two-segment chronological drain live here, so sink
/// drivers stay trivial.
///
/// To aggregate an externally owned driver instead of owning it, construct
/// the core over `&mut Driver` (see the blanket [`SinkWriter`] impl).
pub struct BufferedLogCore<S: SinkWriter, const N: usize> {
    buf: RingBuffer<u8, N>,
    overrun: OverrunTracker,
    sink: S,
    enabled: bool,
    level: LogLevel,
    echo: bool,
    auto_flush: bool,
    echo_out: Option<fn(u8)>,
    fatal_hook: Option<fn(&'static str)>,
    names: &'static LevelNames,
}

impl<S: SinkWriter, const N: usize> BufferedLogCore<S, N> {
    /// Create a core with the boot defaults from [`config`].
    pub fn new(sink: S) -> Self {
        Self::with_options(
            sink,
            config::LOG_EN_DEFAULT,
            config::LEVEL_CEILING,
            config::LOG_ECHO_DEFAULT,
        )
    }

    /// Create a core with explicit enable/level/echo settings.
    ///
    /// A level above [`config::LEVEL_CEILING`] is clamped to the ceiling.
    pub fn with_options(sink: S, enabled: bool, level: LogLevel, echo: bool) -> Self {
        let level = if level <= config::LEVEL_CEILING {
            level
        } else {
            config::LEVEL_CEILING
        };
        Self {
            buf: RingBuffer::new(),
            overrun: OverrunTracker::default(),
            sink,
            enabled,
            level,
            echo,
            auto_flush: config::LOG_AUTOFLUSH_DEFAULT,
            echo_out: None,
            fatal_hook: None,
            names: &DEFAULT_LEVEL_NAMES,
        }
    }

    /// Bytes currently buffered.
    pub fn size(&self) -> usize {
        self.buf.size()
    }

    /// Buffer capacity `N`.
    pub fn capacity(&self) -> usize {
        self.buf.capacity()
    }

    /// Whether records are accepted at all.
    pub fn enabled(&self) -> bool {
        self.enabled
    }

    /// Enable or disable record intake. Returns the prior setting.
    pub fn set_enabled(&mut self, enable: bool) -> bool {
        let prior = self.enabled;
        self.enabled = enable;
        prior
    }

    /// Whether record bytes are mirrored to the echo console.
    pub fn echo(&self) -> bool {
        self.echo
    }

    /// Enable or disable console echo. Returns the prior setting so a caller
    /// can restore it afterwards.
    pub fn set_echo(&mut self, enable: bool) -> bool {
        let prior = self.echo;
        self.echo = enable;
        prior
    }

    /// Whether a full buffer flushes itself from the record path.
    pub fn auto_flush(&self) -> bool {
        self.auto_flush
    }

    /// Enable or disable auto-flush. Returns the prior setting so a caller
    /// can restore it afterwards.
    pub fn set_auto_flush(&mut self, enable: bool) -> bool {
        let prior = self.auto_flush;
        self.auto_flush = enable;
        prior
    }

    /// The runtime filter level.
    pub fn level(&self) -> LogLevel {
        self.level
    }

    /// Set the runtime filter level. Values above the compile-time ceiling
    /// are ignored; the effective level is returned either way.
    pub fn set_level(&mut self, level: LogLevel) -> LogLevel {
        if level <= config::LEVEL_CEILING {
            self.level = level;
        }
        self.level
    }

    /// `true` if data was lost since the last completed flush.
    pub fn has_overrun(&self) -> bool {
        self.overrun.has_overrun()
    }

    /// Lifetime count of bytes overwritten while full.
    pub fn dropped_bytes(&self) -> u32 {
        self.overrun.dropped_bytes()
    }

    /// Install the console output used by echo mode.
    pub fn set_echo_console(&mut self, putc: fn(u8)) {
        self.echo_out = Some(putc);
    }

    /// Install the hook invoked on a fatal sink failure. On hardware this
    /// typically halts or reboots; if it returns, the failed flush also
    /// reports the error to its caller.
    pub fn set_fatal_hook(&mut self, hook: fn(&'static str)) {
        self.fatal_hook = Some(hook);
    }

    /// Replace the level-name tables used for record prefixes.
    pub fn set_level_names(&mut self, names: &'static LevelNames) {
        self.names = names;
    }

    /// Shared access to the sink driver.
    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Exclusive access to the sink driver.
    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    /// Consume the core, returning the sink driver.
    pub fn into_sink(self) -> S {
        self.sink
    }

    /// Store one rendered byte, applying the overwrite-or-overrun policy.
    ///
    /// On a full buffer: with auto-flush enabled the buffer is flushed first
    /// (a failed flush leaves it full, and the overwrite is recorded as an
    /// overrun); with auto-flush disabled the overwrite is recorded as an
    /// overrun. The byte is always stored afterwards.
    pub fn push_byte(&mut self, c: u8) {
        if self.buf.is_full() {
            if self.auto_flush {
                let _ = self.flush();
                if self.buf.is_full() {
                    self.overrun.record();
                }
            } else {
                self.overrun.record();
            }
        }

        self.buf.put(c);
    }

    /// Render a record at `level`: the short level prefix, then the body.
    ///
    /// No-op when disabled or when `level` is above the runtime filter.
    pub fn log(&mut self, level: LogLevel, args: fmt::Arguments<'_>) {
        if !self.enabled || level > self.level {
            return;
        }

        let prefix = self.names.short[level as usize];
        self.emit_str(prefix);
        self.print(args);
    }

    /// Render a record from interrupt context.
    ///
    /// Auto-flush and echo are forced off for the duration of the call and
    /// restored to their prior values afterwards, so this path can only ever
    /// mutate the RAM buffer: it never reaches the sink writer and never
    /// performs console I/O.
    pub fn log_interrupt(&mut self, level: LogLevel, args: fmt::Arguments<'_>) {
        if !self.enabled || level > self.level {
            return;
        }

        let flush_setting = self.set_auto_flush(false);
        let echo_setting = self.set_echo(false);

        let prefix = self.names.short[level as usize];
        self.emit_str(prefix);
        self.print(args);

        self.set_auto_flush(flush_setting);
        self.set_echo(echo_setting);
    }

    /// Render directly into the buffer with no prefix and no level filter.
    pub fn print(&mut self, args: fmt::Arguments<'_>) {
        let _ = fmt::Write::write_fmt(&mut ByteEmitter { core: self }, args);
    }

    /// Log at critical level.
    pub fn critical(&mut self, args: fmt::Arguments<'_>) {
        self.log(LogLevel::Critical, args);
    }

    /// Log at error level.
    pub fn error(&mut self, args: fmt::Arguments<'_>) {
        self.log(LogLevel::Error, args);
    }

    /// Log at warning level.
    pub fn warning(&mut self, args: fmt::Arguments<'_>) {
        self.log(LogLevel::Warning, args);
    }

    /// Log at info level.
    pub fn info(&mut self, args: fmt::Arguments<'_>) {
        self.log(LogLevel::Info, args);
    }

    /// Log at debug level.
    pub fn debug(&mut self, args: fmt::Arguments<'_>) {
        self.log(LogLevel::Debug, args);
    }

    /// Log at critical level from interrupt context.
    pub fn critical_interrupt(&mut self, args: fmt::Arguments<'_>) {
        self.log_interrupt(LogLevel::Critical, args);
    }

    /// Log at error level from interrupt context.
    pub fn error_interrupt(&mut self, args: fmt::Arguments<'_>) {
        self.log_interrupt(LogLevel::Error, args);
    }

    /// Log at warning level from interrupt context.
    pub fn warning_interrupt(&mut self, args: fmt::Arguments<'_>) {
        self.log_interrupt(LogLevel::Warning, args);
    }

    /// Log at info level from interrupt context.
    pub fn info_interrupt(&mut self, args: fmt::Arguments<'_>) {
        self.log_interrupt(LogLevel::Info, args);
    }

    /// Log at debug level from interrupt context.
    pub fn debug_interrupt(&mut self, args: fmt::Arguments<'_>) {
        self.log_interrupt(LogLevel::Debug, args);
    }

    /// Drain all buffered bytes to the sink.
    ///
    /// No-op on an empty buffer. If an overrun was recorded during this fill
    /// cycle, a synthetic critical record noting the overrun is appended and
    /// drained as well, so the loss itself is never silently dropped even
    /// though the overwritten bytes are gone. The overrun flag clears only
    /// after that second drain completes; a failed drain leaves the buffer
    /// and the flag untouched for inspection.
    pub fn flush(&mut self) -> Result<(), FlushError<S::Error>> {
        if self.buf.is_empty() {
            return Ok(());
        }

        self.drain()?;

        if self.overrun.has_overrun() {
            // The notice must not re-enter this flush through the record
            // path, so auto-flush is suspended while it is rendered.
            let flush_setting = self.set_auto_flush(false);
            self.critical(format_args!("---Log buffer overrun detected---\n"));
            self.set_auto_flush(flush_setting);
            self.drain()?;
        }

        self.overrun.clear();
        Ok(())
    }

    /// Discard the buffered bytes and the overrun flag without touching the
    /// sink.
    pub fn clear(&mut self) {
        self.buf.reset();
        self.overrun.clear();
    }

    fn emit_byte(&mut self, c: u8) {
        self.push_byte(c);
        if self.echo {
            if let Some(putc) = self.echo_out {
                putc(c);
            }
        }
    }

    fn emit_str(&mut self, s: &str) {
        for &b in s.as_bytes() {
            self.emit_byte(b);
        }
    }

    /// Two-phase chronological drain: the `[tail, N)` run first, then the
    /// `[0, head)` run, so wraparound never reorders records on the medium.
    fn drain(&mut self) -> Result<(), FlushError<S::Error>> {
        let expected = self.buf.size();
        let head = self.buf.head();
        let tail = self.buf.tail();

        let mut written = 0;
        if head < tail || (tail > 0 && self.buf.is_full()) {
            written += self.write_run(tail, self.buf.capacity())?;
            written += self.write_run(0, head)?;
        } else {
            written += self.write_run(tail, tail + expected)?;
        }

        if written != expected {
            self.fatal("short write to log sink");
            return Err(FlushError::ShortWrite { expected, written });
        }

        if let Err(e) = self.sink.commit() {
            self.fatal("log sink commit failed");
            return Err(FlushError::Driver(e));
        }

        self.buf.reset();
        Ok(())
    }

    fn write_run(&mut self, start: usize, end: usize) -> Result<usize, FlushError<S::Error>> {
        if start == end {
            return Ok(0);
        }
        match self.sink.write(&self.buf.storage()[start..end]) {
            Ok(n) => Ok(n),
            Err(e) => {
                self.fatal("log sink write failed");
                Err(FlushError::Driver(e))
            }
        }
    }

    fn fatal(&mut self, reason: &'static str) {
        error!("{}", reason);
        if let Some(hook) = self.fatal_hook {
            hook(reason);
        }
    }
}

/// Routes `core::fmt` output into the buffer one byte at a time, mirroring
/// to the echo console when enabled.
struct ByteEmitter<'a, S: SinkWriter, const N: usize> {
    core: &'a mut BufferedLogCore<S, N>,
}

impl<S: SinkWriter, const N: usize> fmt::Write for ByteEmitter<'_, S, N> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        self.core.emit_str(s);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::Mutex;

    #[derive(Default)]
    struct MemSink {
        data: Vec<u8>,
        write_calls: usize,
        commits: usize,
        accept_limit: Option<usize>,
        fail_writes: bool,
    }

    impl SinkWriter for MemSink {
        type Error = &'static str;

        fn write(&mut self, bytes: &[u8]) -> Result<usize, Self::Error> {
            self.write_calls += 1;
            if self.fail_writes {
                return Err("medium gone");
            }
            let take = match self.accept_limit {
                Some(limit) => bytes.len().min(limit.saturating_sub(self.data.len())),
                None => bytes.len(),
            };
            self.data.extend_from_slice(&bytes[..take]);
            Ok(take)
        }

        fn commit(&mut self) -> Result<(), Self::Error> {
            self.commits += 1;
            Ok(())
        }
    }

    fn core<const N: usize>() -> BufferedLogCore<MemSink, N> {
        BufferedLogCore::new(MemSink::default())
    }

    #[test]
    fn boot_defaults() {
        let log = core::<64>();
        assert_eq!(log.size(), 0);
        assert_eq!(log.capacity(), 64);
        assert!(log.enabled());
        assert!(!log.echo());
        assert!(log.auto_flush());
        assert_eq!(log.level(), config::LEVEL_CEILING);
        assert!(!log.has_overrun());
    }

    #[test]
    fn flush_roundtrip_single_segment() {
        let mut log = core::<64>();
        log.debug(format_args!("Hello world\n"));
        assert_eq!(log.size(), "<D> Hello world\n".len());

        log.flush().unwrap();
        assert_eq!(log.sink().data, b"<D> Hello world\n");
        assert_eq!(log.size(), 0);
        assert_eq!(log.sink().commits, 1);

        // a second flush with nothing buffered does not touch the sink
        log.flush().unwrap();
        assert_eq!(log.sink().write_calls, 1);
    }

    #[test]
    fn prefixes_per_level() {
        let mut log = core::<128>();
        log.critical(format_args!("c\n"));
        log.error(format_args!("e\n"));
        log.warning(format_args!("w\n"));
        log.info(format_args!("i\n"));
        log.debug(format_args!("d\n"));
        log.flush().unwrap();
        assert_eq!(
            log.sink().data,
            b"<!> c\n<E> e\n<W> w\n<I> i\n<D> d\n"
        );
    }

    #[test]
    fn clear_discards_without_sink_write() {
        let mut log = core::<64>();
        log.debug(format_args!("Hello world\n"));
        log.clear();
        assert_eq!(log.size(), 0);
        assert!(log.sink().data.is_empty());
        assert_eq!(log.sink().write_calls, 0);
    }

    #[test]
    fn runtime_filter_swallows_verbose_records() {
        let mut log = core::<64>();
        assert_eq!(log.set_level(LogLevel::Warning), LogLevel::Warning);

        let before = log.size();
        log.debug(format_args!("should not be added"));
        assert_eq!(log.size(), before);

        log.warning(format_args!("kept"));
        assert!(log.size() > before);
    }

    #[test]
    fn disabled_core_accepts_nothing() {
        let mut log = core::<64>();
        log.set_enabled(false);
        log.critical(format_args!("dropped"));
        assert_eq!(log.size(), 0);
    }

    #[test]
    fn print_skips_prefix_and_filter() {
        let mut log = core::<64>();
        log.set_level(LogLevel::Off);
        log.print(format_args!("raw"));
        log.flush().unwrap();
        assert_eq!(log.sink().data, b"raw");
    }

    #[test]
    fn wrapped_fill_flushes_chronologically() {
        let mut log = core::<16>();
        log.set_auto_flush(false);

        for &b in b"ABCDEFGHIJ" {
            log.push_byte(b);
        }
        for &b in b"0123456789" {
            log.push_byte(b);
        }
        assert_eq!(log.size(), 16);
        assert_eq!(log.capacity(), 16);
        assert!(log.has_overrun());
        assert_eq!(log.dropped_bytes(), 4);

        log.flush().unwrap();
        // first drain: record 1 minus its 4 overwritten bytes, then record 2
        assert_eq!(&log.sink().data[..16], b"EFGHIJ0123456789");
        // the wrap split the first drain into two sink writes
        assert!(log.sink().write_calls >= 2);
        assert!(!log.has_overrun());
    }

    #[test]
    fn overrun_notice_recorded_exactly_once() {
        let mut log = core::<64>();
        log.set_auto_flush(false);

        for _ in 0..65 {
            log.push_byte(b'x');
        }
        assert!(log.has_overrun());

        log.flush().unwrap();
        assert!(!log.has_overrun());

        let data = std::str::from_utf8(&log.sink().data).unwrap();
        assert_eq!(data.matches("---Log buffer overrun detected---").count(), 1);
        assert!(data.contains("<!> ---Log buffer overrun detected---\n"));

        // next cycle is clean: no second notice
        log.push_byte(b'y');
        log.flush().unwrap();
        let data = std::str::from_utf8(&log.sink().data).unwrap();
        assert_eq!(data.matches("---Log buffer overrun detected---").count(), 1);
    }

    #[test]
    fn overrun_flag_persists_until_flush() {
        let mut log = core::<8>();
        log.set_auto_flush(false);
        for _ in 0..9 {
            log.push_byte(b'x');
        }
        assert!(log.has_overrun());
        log.push_byte(b'x');
        assert!(log.has_overrun());
        log.flush().unwrap();
        assert!(!log.has_overrun());
    }

    #[test]
    fn auto_flush_drains_before_overwrite() {
        let mut log = core::<8>();
        for &b in b"ABCDEFGH" {
            log.push_byte(b);
        }
        // buffer exactly full, nothing flushed yet
        assert_eq!(log.sink().write_calls, 0);

        log.push_byte(b'I');
        assert_eq!(log.sink().data, b"ABCDEFGH");
        assert_eq!(log.size(), 1);
        assert!(!log.has_overrun());

        log.flush().unwrap();
        assert_eq!(log.sink().data, b"ABCDEFGHI");
    }

    static INTERRUPT_ECHOES: AtomicUsize = AtomicUsize::new(0);

    fn count_interrupt_echo(_b: u8) {
        INTERRUPT_ECHOES.fetch_add(1, Ordering::SeqCst);
    }

    #[test]
    fn interrupt_path_never_reaches_sink_or_console() {
        let mut log = core::<4>();
        log.set_echo_console(count_interrupt_echo);
        log.set_echo(true);
        assert!(log.auto_flush());

        // fill to the brim so any flush or echo would be observable
        for &b in b"abcd" {
            log.push_byte(b);
        }

        log.info_interrupt(format_args!("isr event"));

        assert_eq!(log.sink().write_calls, 0);
        assert_eq!(INTERRUPT_ECHOES.load(Ordering::SeqCst), 0);
        // prior settings restored bit-for-bit
        assert!(log.auto_flush());
        assert!(log.echo());
        // the buffer absorbed the record by overwriting
        assert_eq!(log.size(), 4);
        assert!(log.has_overrun());
    }

    static ECHOED: Mutex<Vec<u8>> = Mutex::new(Vec::new());

    fn capture_echo(b: u8) {
        ECHOED.lock().unwrap().push(b);
    }

    #[test]
    fn echo_mirrors_record_bytes() {
        let mut log = core::<64>();
        log.set_echo_console(capture_echo);
        log.set_echo(true);

        log.info(format_args!("echoed\n"));
        assert_eq!(ECHOED.lock().unwrap().as_slice(), b"<I> echoed\n");
        // echo is a mirror, not a drain
        assert_eq!(log.size(), "<I> echoed\n".len());
    }

    static FATAL_SHORT: AtomicBool = AtomicBool::new(false);

    fn note_fatal_short(_reason: &'static str) {
        FATAL_SHORT.store(true, Ordering::SeqCst);
    }

    #[test]
    fn short_write_is_fatal_and_preserves_buffer() {
        let mut log = core::<64>();
        log.set_fatal_hook(note_fatal_short);
        log.sink_mut().accept_limit = Some(3);

        log.debug(format_args!("Hello\n"));
        let buffered = log.size();

        let err = log.flush().unwrap_err();
        assert_eq!(
            err,
            FlushError::ShortWrite {
                expected: buffered,
                written: 3
            }
        );
        assert!(FATAL_SHORT.load(Ordering::SeqCst));
        // nothing was reset: the buffer still holds the cycle for inspection
        assert_eq!(log.size(), buffered);
        assert_eq!(log.sink().commits, 0);
    }

    static FATAL_DRIVER: AtomicBool = AtomicBool::new(false);

    fn note_fatal_driver(_reason: &'static str) {
        FATAL_DRIVER.store(true, Ordering::SeqCst);
    }

    #[test]
    fn driver_error_is_fatal() {
        let mut log = core::<64>();
        log.set_fatal_hook(note_fatal_driver);
        log.sink_mut().fail_writes = true;

        log.debug(format_args!("Hello\n"));
        assert_eq!(log.flush().unwrap_err(), FlushError::Driver("medium gone"));
        assert!(FATAL_DRIVER.load(Ordering::SeqCst));
    }

    #[test]
    fn zero_capacity_core_is_inert() {
        let mut log = core::<0>();
        log.debug(format_args!("dropped on the floor"));
        assert_eq!(log.size(), 0);
        assert_eq!(log.capacity(), 0);
        log.flush().unwrap();
        assert_eq!(log.sink().write_calls, 0);
        assert!(!log.has_overrun());
    }

    #[test]
    fn setters_return_prior_values() {
        let mut log = core::<8>();
        assert!(!log.set_echo(true));
        assert!(log.set_echo(false));
        assert!(log.set_auto_flush(false));
        assert!(!log.set_auto_flush(true));
        assert!(log.set_enabled(false));
        assert!(!log.set_enabled(true));
    }
}
