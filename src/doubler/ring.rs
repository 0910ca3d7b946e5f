//! Four-row accumulator ring for the pre-combined Mitchell path.

use std::sync::Arc;

use super::DoublerError;
use crate::memory::{AccumBuffer, Allocator};

/// Horizontally filtered source rows, four slots of `stride` accumulators.
///
/// Source row `r` lives in slot `r & 3`, so the four most recent rows are
/// always resident once the ring has been primed.
#[derive(Debug)]
pub struct AccumRing {
    buf: AccumBuffer,
    stride: usize,
    filled: usize,
}

impl AccumRing {
    pub const SLOTS: usize = 4;

    pub fn new(allocator: Arc<dyn Allocator>, stride: usize) -> Result<Self, DoublerError> {
        let len = stride
            .checked_mul(Self::SLOTS)
            .ok_or(DoublerError::OutOfMemory { bytes: usize::MAX })?;
        Ok(Self {
            buf: AccumBuffer::zeroed(allocator, len)?,
            stride,
            filled: 0,
        })
    }

    #[inline]
    pub fn slot(row: usize) -> usize {
        row & (Self::SLOTS - 1)
    }

    /// Calls seen so far (`tmp_y`)
    pub fn filled(&self) -> usize {
        self.filled
    }

    pub fn advance(&mut self) {
        self.filled += 1;
    }

    pub fn row(&self, row: usize) -> &[i32] {
        let start = Self::slot(row) * self.stride;
        &self.buf[start..start + self.stride]
    }

    pub fn row_mut(&mut self, row: usize) -> &mut [i32] {
        let start = Self::slot(row) * self.stride;
        &mut self.buf[start..start + self.stride]
    }

    pub fn rows(&self, rows: [usize; 4]) -> [&[i32]; 4] {
        rows.map(|r| self.row(r))
    }
}
