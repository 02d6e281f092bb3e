//! The `block` module provides [`Block`], one contiguous run of bytes at a known
//! start address. Blocks are the storage unit of [`BlockSet`](crate::BlockSet).

use crate::Address;
use std::fmt;

/// Contiguous address-tagged byte range covering the half-open interval `[start, end)`.
///
/// Two blocks are equal when they start at the same address and hold the same bytes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Block {
    start: Address,
    data: Vec<u8>,
}

impl Block {
    /// Creates an empty block at `start`.
    #[must_use]
    pub const fn new(start: Address) -> Self {
        Self {
            start,
            data: Vec::new(),
        }
    }

    /// Creates a block holding `data` at `start`.
    ///
    /// # Example
    /// ```
    /// use srecordlib::Block;
    ///
    /// let block = Block::from_bytes(0x20, vec![0xAA; 16]);
    /// assert_eq!(block.end(), 0x30);
    /// ```
    #[must_use]
    pub const fn from_bytes(start: Address, data: Vec<u8>) -> Self {
        Self { start, data }
    }

    #[must_use]
    pub const fn start(&self) -> Address {
        self.start
    }

    pub const fn set_start(&mut self, start: Address) {
        self.start = start;
    }

    /// First address behind the block (`start + len`), saturating at `Address::MAX`.
    ///
    /// Validation reports a block this far up as `RangeExceeded`.
    #[must_use]
    pub const fn end(&self) -> Address {
        self.start.saturating_add(self.data.len() as Address)
    }

    #[must_use]
    pub const fn len(&self) -> usize {
        self.data.len()
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    #[must_use]
    pub fn bytes(&self) -> &[u8] {
        &self.data
    }

    /// Mutable access to the byte buffer. Changing its length moves `end()`.
    pub const fn bytes_mut(&mut self) -> &mut Vec<u8> {
        &mut self.data
    }

    #[must_use]
    pub fn into_bytes(self) -> Vec<u8> {
        self.data
    }

    /// Returns a copy of the part of this block that lies inside `[start, end)`.
    ///
    /// The returned block may start later and end earlier than requested. It is
    /// empty when the ranges do not intersect or `start >= end`.
    ///
    /// # Example
    /// ```
    /// use srecordlib::Block;
    ///
    /// let block = Block::from_bytes(0x20, (0..16).collect());
    /// let part = block.get_range(0x00, 0x24);
    ///
    /// assert_eq!(part.start(), 0x20);
    /// assert_eq!(part.bytes(), &[0, 1, 2, 3]);
    /// ```
    #[allow(clippy::cast_possible_truncation)]
    #[must_use]
    pub fn get_range(&self, start: Address, end: Address) -> Self {
        let start = start.max(self.start);
        let end = end.min(self.end());
        if start >= end {
            return Self::new(start);
        }
        let from = (start - self.start) as usize;
        let to = (end - self.start) as usize;
        Self::from_bytes(start, self.data[from..to].to_vec())
    }

    /// True if at least one byte of this block lies inside `[start, end)`.
    #[must_use]
    pub const fn in_range(&self, start: Address, end: Address) -> bool {
        start < end && start < self.end() && end > self.start
    }

    pub(crate) fn truncate_to(&mut self, end: Address) {
        if end <= self.start {
            self.data.clear();
        } else if end < self.end() {
            self.data.truncate((end - self.start) as usize);
        }
    }

    /// Pads the block with `fill` so that it ends at `end` (never shrinks).
    pub(crate) fn extend_to(&mut self, end: Address, fill: u8) {
        if end > self.end() {
            self.data.resize((end - self.start) as usize, fill);
        }
    }

    /// Pads the block with `fill` in front so that it starts at `start` (never shrinks).
    pub(crate) fn prepend_to(&mut self, start: Address, fill: u8) {
        if start < self.start {
            let pad = (self.start - start) as usize;
            self.data.splice(0..0, std::iter::repeat_n(fill, pad));
            self.start = start;
        }
    }

    /// Writes rows of 16 bytes, each prefixed with its aligned address.
    pub(crate) fn dump(&self, f: &mut impl fmt::Write) -> fmt::Result {
        const ALIGN: Address = 16;

        if self.data.is_empty() {
            return writeln!(f, "(empty block)");
        }
        let mut addr = self.start - self.start % ALIGN;
        write!(f, "<{addr:08X}>")?;
        while addr < self.start {
            write!(f, "{}  ", if addr % 2 == 0 { " " } else { "" })?;
            addr = addr.saturating_add(1);
        }
        for byte in &self.data {
            if addr % ALIGN == 0 && addr != self.start {
                write!(f, "\n<{addr:08X}>")?;
            }
            if addr % 2 == 0 {
                write!(f, " ")?;
            }
            write!(f, "{byte:02X}")?;
            addr = addr.saturating_add(1);
        }
        writeln!(f)
    }
}
