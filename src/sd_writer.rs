//! SD card file sink — rotation helpers and the block-file driver.

use embedded_sdmmc::{BlockDevice, Mode, RawDirectory, RawFile, TimeSource, VolumeManager};
use heapless::String;

use crate::sink::SinkWriter;

/// Log file numbers run 1..=9999 and then wrap back to 1.
const MAX_LOG_INDEX: u16 = 9999;

/// Append-only log file driver over an `embedded-sdmmc` volume.
///
/// The driver owns the filename sequence: on construction it scans the
/// directory for existing `LOG_NNNN.TXT` files and positions itself after
/// the highest. `open` creates-or-appends the current file, `commit` syncs
/// it after each flush cycle, and [`rotate`](Self::rotate) moves on to the
/// next file in the sequence. When to rotate (size threshold, per boot) is
/// the caller's policy.
///
/// The card either accepts a write in full or reports an error, so a
/// successful write reports the complete byte count.
pub struct SdFileSink<'a, D, T, const DIRS: usize, const FILES: usize, const VOLS: usize>
where
    D: BlockDevice,
    T: TimeSource,
    D::Error: core::fmt::Debug,
{
    volume_mgr: &'a VolumeManager<D, T, DIRS, FILES, VOLS>,
    dir: RawDirectory,
    file: Option<RawFile>,
    index: u16,
    bytes_written: u32,
}

impl<'a, D, T, const DIRS: usize, const FILES: usize, const VOLS: usize>
    SdFileSink<'a, D, T, DIRS, FILES, VOLS>
where
    D: BlockDevice,
    T: TimeSource,
    D::Error: core::fmt::Debug,
{
    /// Create a sink writing into `dir`, positioned at the next unused log
    /// file number.
    pub fn new(volume_mgr: &'a VolumeManager<D, T, DIRS, FILES, VOLS>, dir: RawDirectory) -> Self {
        let index = next_log_index(volume_mgr, dir);
        Self {
            volume_mgr,
            dir,
            file: None,
            index,
            bytes_written: 0,
        }
    }

    /// The current log file number.
    pub fn log_index(&self) -> u16 {
        self.index
    }

    /// The current log file name.
    pub fn file_name(&self) -> String<12> {
        log_file_name(self.index)
    }

    /// Bytes written to the current file since it was opened or rotated.
    pub fn bytes_written(&self) -> u32 {
        self.bytes_written
    }

    /// Close the current file and start the next one in the sequence.
    pub fn rotate(&mut self) -> Result<(), embedded_sdmmc::Error<D::Error>> {
        self.close()?;
        self.index = self.index.wrapping_add(1);
        self.bytes_written = 0;
        debug!("rotating to log file {}", self.index);
        self.open()
    }

    fn ensure_open(&mut self) -> Result<RawFile, embedded_sdmmc::Error<D::Error>> {
        if let Some(file) = self.file {
            return Ok(file);
        }
        let name = log_file_name(self.index);
        let file = self.volume_mgr.open_file_in_dir(
            self.dir,
            name.as_str(),
            Mode::ReadWriteCreateOrAppend,
        )?;
        debug!("opened log file {}", name.as_str());
        self.file = Some(file);
        Ok(file)
    }
}

impl<D, T, const DIRS: usize, const FILES: usize, const VOLS: usize> SinkWriter
    for SdFileSink<'_, D, T, DIRS, FILES, VOLS>
where
    D: BlockDevice,
    T: TimeSource,
    D::Error: core::fmt::Debug,
{
    type Error = embedded_sdmmc::Error<D::Error>;

    fn open(&mut self) -> Result<(), Self::Error> {
        self.ensure_open().map(|_| ())
    }

    fn write(&mut self, bytes: &[u8]) -> Result<usize, Self::Error> {
        let file = self.ensure_open()?;
        self.volume_mgr.write(file, bytes)?;
        self.bytes_written = self.bytes_written.saturating_add(bytes.len() as u32);
        Ok(bytes.len())
    }

    fn commit(&mut self) -> Result<(), Self::Error> {
        match self.file {
            Some(file) => self.volume_mgr.flush_file(file),
            None => Ok(()),
        }
    }

    fn close(&mut self) -> Result<(), Self::Error> {
        match self.file.take() {
            Some(file) => self.volume_mgr.close_file(file),
            None => Ok(()),
        }
    }
}

/// Find the next unused log file number by scanning `dir` for existing
/// `LOG_NNNN.TXT` entries.
pub fn next_log_index<D, T, const DIRS: usize, const FILES: usize, const VOLS: usize>(
    volume_mgr: &VolumeManager<D, T, DIRS, FILES, VOLS>,
    dir: RawDirectory,
) -> u16
where
    D: BlockDevice,
    T: TimeSource,
    D::Error: core::fmt::Debug,
{
    let mut max_index: u16 = 0;

    let _ = volume_mgr.iterate_dir(dir, |entry| {
        let name = entry.name.base_name();
        let ext = entry.name.extension();

        if name.len() >= 8 && ext == b"TXT" && name[0..4] == *b"LOG_" {
            if let Some(index) = parse_index(&name[4..8]) {
                if index > max_index {
                    max_index = index;
                }
            }
        }
    });

    max_index.wrapping_add(1)
}

/// Parse 4 ASCII digits into a file number.
fn parse_index(digits: &[u8]) -> Option<u16> {
    if digits.len() < 4 {
        return None;
    }
    let mut index: u16 = 0;
    for &d in &digits[0..4] {
        if !d.is_ascii_digit() {
            return None;
        }
        index = index * 10 + (d - b'0') as u16;
    }
    Some(index)
}

/// Format a log file name: `LOG_0001.TXT` and so on. Wraps past
/// [`MAX_LOG_INDEX`] and skips 0, so there is always a valid number.
pub fn log_file_name(index: u16) -> String<12> {
    let n = match index % (MAX_LOG_INDEX + 1) {
        0 => 1,
        v => v,
    };
    let mut name = String::new();
    let _ = core::fmt::Write::write_fmt(&mut name, format_args!("LOG_{:04}.TXT", n));
    name
}
