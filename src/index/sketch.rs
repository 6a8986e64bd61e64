//! Count-min sketch frequency estimator.
//!
//! Geometry is fixed at compile time: 4 rows of 2048 signed 32-bit counters.
//! Each row hashes the item with FNV-1a salted by the row index, so the four
//! positions are independent. Estimates are the minimum across rows and can
//! only over-count, never under-count. The binary form is the contiguous
//! little-endian dump of the counter table (32 KiB).

use std::io::{self, Read, Write};

pub const SKETCH_DEPTH: usize = 4;
pub const SKETCH_WIDTH: usize = 2048;

/// Serialized size: depth × width × 4 bytes.
pub const SKETCH_BYTES: usize = SKETCH_DEPTH * SKETCH_WIDTH * 4;

const FNV32_OFFSET_BASIS: u32 = 0x811c_9dc5;
const FNV32_PRIME: u32 = 0x0100_0193;

pub struct CountMinSketch {
    table: [[i32; SKETCH_WIDTH]; SKETCH_DEPTH],
}

impl Default for CountMinSketch {
    fn default() -> Self {
        Self::new()
    }
}

impl CountMinSketch {
    pub fn new() -> Self {
        Self {
            table: [[0; SKETCH_WIDTH]; SKETCH_DEPTH],
        }
    }

    fn cell(item: &str, row: usize) -> usize {
        let mut hash = FNV32_OFFSET_BASIS;
        for &byte in item.as_bytes() {
            hash ^= u32::from(byte);
            hash = hash.wrapping_mul(FNV32_PRIME);
        }
        hash ^= row as u32;
        hash = hash.wrapping_mul(FNV32_PRIME);
        hash as usize % SKETCH_WIDTH
    }

    pub fn add(&mut self, item: &str, count: i32) {
        for row in 0..SKETCH_DEPTH {
            let col = Self::cell(item, row);
            self.table[row][col] = self.table[row][col].saturating_add(count);
        }
    }

    /// Minimum across the four row cells.
    pub fn estimate(&self, item: &str) -> i32 {
        (0..SKETCH_DEPTH)
            .map(|row| self.table[row][Self::cell(item, row)])
            .min()
            .unwrap_or(0)
    }

    pub fn write_to<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        for row in &self.table {
            for &cell in row {
                writer.write_all(&cell.to_le_bytes())?;
            }
        }
        Ok(())
    }

    pub fn read_from<R: Read>(reader: &mut R) -> io::Result<Self> {
        let mut table = [[0i32; SKETCH_WIDTH]; SKETCH_DEPTH];
        let mut buf = [0u8; 4];
        for row in &mut table {
            for cell in row.iter_mut() {
                reader.read_exact(&mut buf)?;
                *cell = i32::from_le_bytes(buf);
            }
        }
        Ok(Self { table })
    }
}
