//! The SDRAM backing array.
//!
//! Words are addressed by (bank, row, column) and stored little-endian in a
//! lazily allocated buffer. Every address component is masked to its
//! configured width before use, so an out-of-range access wraps; it never
//! touches a neighboring cell.

use std::fs;
use std::path::Path;

use crate::common::error::SimError;
use crate::config::{DataWidth, SdramConfig};
use crate::periph::sdram::buffer::LazyBuffer;

/// Persistent word storage for the SDRAM model.
pub struct MemoryArray {
    buffer: LazyBuffer,
    row_bits: u32,
    col_bits: u32,
    bank_bits: u32,
    width: DataWidth,
}

impl MemoryArray {
    /// Allocates an array for the given geometry.
    pub fn new(cfg: &SdramConfig) -> Self {
        let words = 1usize << (cfg.bank_bits + cfg.row_bits + cfg.col_bits);
        let bytes = words * cfg.width.bytes() as usize;
        Self {
            buffer: LazyBuffer::new(bytes),
            row_bits: cfg.row_bits,
            col_bits: cfg.col_bits,
            bank_bits: cfg.bank_bits,
            width: cfg.width,
        }
    }

    /// Configured word width.
    pub fn width(&self) -> DataWidth {
        self.width
    }

    /// Total capacity in bytes.
    pub fn capacity(&self) -> usize {
        self.buffer.len()
    }

    /// Mask covering a column address.
    #[inline]
    pub fn col_mask(&self) -> u64 {
        (1u64 << self.col_bits) - 1
    }

    /// Mask covering a row address.
    #[inline]
    pub fn row_mask(&self) -> u64 {
        (1u64 << self.row_bits) - 1
    }

    /// Mask covering a bank address.
    #[inline]
    pub fn bank_mask(&self) -> u64 {
        (1u64 << self.bank_bits) - 1
    }

    #[inline]
    fn offset(&self, bank: u64, row: u64, col: u64) -> usize {
        let bank = bank & self.bank_mask();
        let row = row & self.row_mask();
        let col = col & self.col_mask();
        let word = (bank << (self.row_bits + self.col_bits)) | (row << self.col_bits) | col;
        word as usize * self.width.bytes() as usize
    }

    /// Reads the word at (bank, row, col).
    pub fn read(&self, bank: u64, row: u64, col: u64) -> u64 {
        let off = self.offset(bank, row, col);
        let mut word = [0u8; 8];
        let n = self.width.bytes() as usize;
        word[..n].copy_from_slice(self.buffer.read_slice(off, n));
        u64::from_le_bytes(word)
    }

    /// Writes `value` at (bank, row, col), updating only the byte lanes
    /// whose bit is set in `lanes`.
    pub fn write(&mut self, bank: u64, row: u64, col: u64, value: u64, lanes: u8) {
        let off = self.offset(bank, row, col);
        let bytes = value.to_le_bytes();
        for lane in 0..self.width.bytes() as usize {
            if lanes & (1 << lane) != 0 {
                self.buffer.write_slice(off + lane, &bytes[lane..=lane]);
            }
        }
    }

    /// Preloads the array from a raw little-endian image file.
    ///
    /// A shorter image fills a prefix of the array; a longer one is an
    /// error, never a silent truncation.
    pub fn load_image(&mut self, path: &str) -> Result<(), SimError> {
        let data = fs::read(path).map_err(|e| SimError::Image {
            path: path.to_owned(),
            source: e,
        })?;
        if data.len() > self.buffer.len() {
            return Err(SimError::ImageTooLarge {
                path: path.to_owned(),
                actual: data.len() as u64,
                capacity: self.buffer.len() as u64,
            });
        }
        self.buffer.write_slice(0, &data);
        Ok(())
    }

    /// Dumps the whole array to a raw little-endian image file.
    pub fn dump_image(&self, path: &Path) -> Result<(), SimError> {
        let data = self.buffer.read_slice(0, self.buffer.len());
        fs::write(path, data).map_err(|e| SimError::Image {
            path: path.display().to_string(),
            source: e,
        })
    }
}

impl std::fmt::Debug for MemoryArray {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryArray")
            .field("banks", &(1u64 << self.bank_bits))
            .field("rows", &(1u64 << self.row_bits))
            .field("cols", &(1u64 << self.col_bits))
            .field("width", &self.width)
            .finish()
    }
}
