//! Backing sink capability and the raw console driver.

use core::convert::Infallible;

/// Capability interface over the backing storage medium.
///
/// A driver only has to implement [`write`](SinkWriter::write); `open`,
/// `commit` and `close` default to no-ops for media without those notions
/// (a raw console, a memory window that is always addressable).
///
/// A successful `write` reports how many bytes the medium actually accepted.
/// The flush protocol treats a total short of the requested length as a sink
/// failure, so drivers for all-or-nothing media simply report the full
/// length on success.
pub trait SinkWriter {
    /// Driver-specific error type.
    type Error: core::fmt::Debug;

    /// Make the driver's current target writable (open the log file, power
    /// the medium). Idempotent.
    fn open(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }

    /// Append bytes to the medium, returning how many were accepted.
    fn write(&mut self, bytes: &[u8]) -> Result<usize, Self::Error>;

    /// Called once at the end of each flush cycle, after all segments have
    /// been written: sync file metadata, place the end-of-data sentinel.
    fn commit(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }

    /// Release the current target.
    fn close(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }

    /// Total capacity of the medium in bytes, if the driver knows it.
    fn capacity(&self) -> Option<usize> {
        None
    }
}

/// A mutable borrow of a sink is itself a sink, so a log core can either own
/// its driver or borrow one owned elsewhere.
impl<S: SinkWriter> SinkWriter for &mut S {
    type Error = S::Error;

    fn open(&mut self) -> Result<(), Self::Error> {
        (**self).open()
    }

    fn write(&mut self, bytes: &[u8]) -> Result<usize, Self::Error> {
        (**self).write(bytes)
    }

    fn commit(&mut self) -> Result<(), Self::Error> {
        (**self).commit()
    }

    fn close(&mut self) -> Result<(), Self::Error> {
        (**self).close()
    }

    fn capacity(&self) -> Option<usize> {
        (**self).capacity()
    }
}

/// Unbuffered console sink over a `putchar`-style function.
///
/// Flushing a log core into this sink dumps the buffered records to the
/// console one byte at a time. Writes cannot fail.
pub struct ConsoleSink {
    putc: fn(u8),
}

impl ConsoleSink {
    /// Wrap a raw console output function.
    pub const fn new(putc: fn(u8)) -> Self {
        Self { putc }
    }
}

impl SinkWriter for ConsoleSink {
    type Error = Infallible;

    fn write(&mut self, bytes: &[u8]) -> Result<usize, Self::Error> {
        for &b in bytes {
            (self.putc)(b);
        }
        Ok(bytes.len())
    }
}
