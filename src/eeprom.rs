//! EEPROM window sink: rotating log storage in a bounded address range.

use crate::sink::SinkWriter;

/// End-of-valid-data marker written after every flush cycle. Readers stop at
/// the first occurrence, which separates live data from stale leftovers of a
/// previous, longer log cycle.
pub const EEPROM_SENTINEL: u8 = 0x00;

/// Byte-addressed storage capability for EEPROM-style media.
///
/// Addresses are absolute within the device; the window sink adds its own
/// base offset. Implemented by the board's EEPROM driver.
pub trait EepromStore {
    /// Driver-specific error type.
    type Error: core::fmt::Debug;

    /// Read one byte.
    fn read_byte(&mut self, addr: u32) -> Result<u8, Self::Error>;

    /// Write one byte.
    fn write_byte(&mut self, addr: u32, value: u8) -> Result<(), Self::Error>;
}

/// Log sink over a fixed window `[base, base + window)` of an EEPROM.
///
/// Bytes go in one at a time at a persistent cursor, which wraps at the
/// window boundary; once wrapped, the window is permanently full and new
/// data overwrites the oldest. Each [`commit`](SinkWriter::commit) places a
/// [`EEPROM_SENTINEL`] at the cursor without advancing it, so the next cycle
/// overwrites the sentinel with its first byte.
pub struct EepromWindowSink<E: EepromStore> {
    store: E,
    base: u32,
    window: u32,
    cursor: u32,
    wrapped: bool,
}

impl<E: EepromStore> EepromWindowSink<E> {
    /// Create a sink over `window` bytes starting at `base`.
    pub fn new(store: E, base: u32, window: u32) -> Self {
        Self {
            store,
            base,
            window,
            cursor: 0,
            wrapped: false,
        }
    }

    /// `true` once the cursor has wrapped; from then on every write evicts
    /// the oldest byte in the window.
    pub fn window_full(&self) -> bool {
        self.wrapped
    }

    /// Current write offset within the window.
    pub fn cursor(&self) -> u32 {
        self.cursor
    }

    /// Consume the sink, returning the store.
    pub fn into_store(self) -> E {
        self.store
    }

    /// Read the valid window contents in chronological order (oldest byte
    /// first once wrapped), stopping at the sentinel or when `out` is full.
    /// Returns the number of bytes read.
    pub fn read_back(&mut self, out: &mut [u8]) -> Result<usize, E::Error> {
        let mut count = 0;

        let start = if self.wrapped { self.cursor + 1 } else { 0 };
        let span = if self.wrapped {
            self.window.saturating_sub(1)
        } else {
            self.window
        };

        for i in 0..span {
            if count == out.len() {
                break;
            }
            let offset = (start + i) % self.window;
            let b = self.store.read_byte(self.base + offset)?;
            if b == EEPROM_SENTINEL {
                break;
            }
            out[count] = b;
            count += 1;
        }

        Ok(count)
    }
}

impl<E: EepromStore> SinkWriter for EepromWindowSink<E> {
    type Error = E::Error;

    fn write(&mut self, bytes: &[u8]) -> Result<usize, Self::Error> {
        if self.window == 0 {
            return Ok(0);
        }

        for &b in bytes {
            self.store.write_byte(self.base + self.cursor, b)?;
            self.cursor += 1;
            if self.cursor == self.window {
                // Once wrapped, the window stays full for good.
                self.wrapped = true;
                self.cursor = 0;
            }
        }

        Ok(bytes.len())
    }

    fn commit(&mut self) -> Result<(), Self::Error> {
        if self.window == 0 {
            return Ok(());
        }
        self.store.write_byte(self.base + self.cursor, EEPROM_SENTINEL)
    }

    fn capacity(&self) -> Option<usize> {
        Some(self.window as usize)
    }
}
