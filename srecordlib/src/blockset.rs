//! The `blockset` module provides [`BlockSet`], the sparse memory image behind an
//! S-record: an address-ordered collection of non-overlapping [`Block`]s.
//!
//! Every public mutator except [`BlockSet::push`] leaves the set normalised:
//! 1. blocks are sorted ascending by start address,
//! 2. no two blocks overlap,
//! 3. no block is empty,
//! 4. no two blocks are adjacent (`a.end() == b.start()` is coalesced into one block).

use crate::Address;
use crate::block::Block;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BlockSet {
    blocks: Vec<Block>,
}

impl<'a> IntoIterator for &'a BlockSet {
    type Item = &'a Block;
    type IntoIter = std::slice::Iter<'a, Block>;
    fn into_iter(self) -> Self::IntoIter {
        self.blocks.iter()
    }
}

impl BlockSet {
    #[must_use]
    pub const fn new() -> Self {
        Self { blocks: Vec::new() }
    }

    /// Number of blocks (not bytes).
    #[must_use]
    pub const fn len(&self) -> usize {
        self.blocks.len()
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Total number of data bytes over all blocks.
    #[must_use]
    pub fn byte_count(&self) -> usize {
        self.blocks.iter().map(Block::len).sum()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Block> {
        self.into_iter()
    }

    #[must_use]
    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    /// Start address of the first block, 0 if there is none.
    #[must_use]
    pub fn start(&self) -> Address {
        self.blocks.first().map_or(0, Block::start)
    }

    /// End address of the last block, 0 if there is none.
    #[must_use]
    pub fn end(&self) -> Address {
        self.blocks.last().map_or(0, Block::end)
    }

    pub fn clear(&mut self) {
        self.blocks.clear();
    }

    /// Appends `block` as-is, without sorting or coalescing.
    ///
    /// The set may become unordered or overlapping; [`SRecord::validate`](crate::SRecord::validate)
    /// reports that, and [`normalize`](Self::normalize) or [`merge`](Self::merge)
    /// repair it.
    pub fn push(&mut self, block: Block) {
        self.blocks.push(block);
    }

    /// Sorts blocks, drops empty ones and coalesces adjacent ones.
    pub fn normalize(&mut self) {
        self.reorder();
        self.coalesce();
    }

    /// Returns the parts of all blocks that lie inside `[start, end)`, ordered by address.
    ///
    /// # Example
    /// ```
    /// use srecordlib::{Block, BlockSet};
    ///
    /// let mut set = BlockSet::new();
    /// set.set_range(Block::from_bytes(0x20, vec![0; 16]));
    /// set.set_range(Block::from_bytes(0x40, vec![0; 16]));
    ///
    /// assert_eq!(set.get_ranges(0x00, 0x20).len(), 0);
    /// assert_eq!(set.get_ranges(0x20, 0x41).len(), 2);
    /// ```
    #[must_use]
    pub fn get_ranges(&self, start: Address, end: Address) -> Vec<Block> {
        if start >= end {
            return Vec::new();
        }
        let mut ranges: Vec<Block> = self
            .blocks
            .iter()
            .map(|b| b.get_range(start, end))
            .filter(|b| !b.is_empty())
            .collect();
        reorder(&mut ranges);
        ranges
    }

    /// Returns exactly `[start, end)` as one block. Addresses without data read as `fill`.
    ///
    /// # Example
    /// ```
    /// use srecordlib::{Block, BlockSet};
    ///
    /// let mut set = BlockSet::new();
    /// set.set_range(Block::from_bytes(0x02, vec![0xAA, 0xBB]));
    ///
    /// let block = set.get_range(0x00, 0x06, 0xFF);
    /// assert_eq!(block.bytes(), &[0xFF, 0xFF, 0xAA, 0xBB, 0xFF, 0xFF]);
    /// ```
    #[must_use]
    pub fn get_range(&self, start: Address, end: Address, fill: u8) -> Block {
        if start >= end {
            return Block::new(start);
        }
        let mut block = connect(self.get_ranges(start, end), fill).unwrap_or(Block::new(start));
        block.prepend_to(start, fill);
        block.extend_to(end, fill);
        block
    }

    /// Writes `block` into the set, overwriting whatever data intersects its range.
    ///
    /// # Example
    /// ```
    /// use srecordlib::{Block, BlockSet};
    ///
    /// let mut set = BlockSet::new();
    /// set.set_range(Block::from_bytes(0x00, vec![0x00; 8]));
    /// set.set_range(Block::from_bytes(0x04, vec![0xFF; 8]));
    ///
    /// assert_eq!(set.len(), 1);
    /// assert_eq!(set.blocks()[0].bytes(), &[0, 0, 0, 0, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF]);
    /// ```
    pub fn set_range(&mut self, block: Block) {
        if block.is_empty() {
            return;
        }
        let (start, end) = (block.start(), block.end());
        self.reorder();

        let Some(first) = self.blocks.iter().position(|b| b.in_range(start, end)) else {
            // No existing data is affected
            self.blocks.push(block);
            self.reorder();
            self.coalesce();
            return;
        };
        let last = self
            .blocks
            .iter()
            .rposition(|b| b.in_range(start, end))
            .unwrap_or(first);

        // Everything between first and last is overwritten; keep only the outer remainders
        let before = self.blocks[first].get_range(self.blocks[first].start(), start);
        let after = self.blocks[last].get_range(end, self.blocks[last].end());
        self.blocks.splice(first..=last, [before, block, after]);

        self.reorder();
        self.coalesce();
    }

    /// Removes all bytes inside `[start, end)`, shrinking or splitting blocks as needed.
    ///
    /// # Example
    /// ```
    /// use srecordlib::{Block, BlockSet};
    ///
    /// let mut set = BlockSet::new();
    /// set.set_range(Block::from_bytes(0x20, vec![0; 16]));
    /// set.remove_range(0x24, 0x28);
    ///
    /// assert_eq!(set.len(), 2);
    /// assert_eq!(set.blocks()[0].end(), 0x24);
    /// assert_eq!(set.blocks()[1].start(), 0x28);
    /// ```
    pub fn remove_range(&mut self, start: Address, end: Address) {
        if start >= end || self.blocks.is_empty() {
            return;
        }
        self.reorder();
        let Some(first) = self.blocks.iter().position(|b| b.in_range(start, end)) else {
            return;
        };
        let count = self.blocks[first..]
            .iter()
            .take_while(|b| b.in_range(start, end))
            .count();
        let last = first + count - 1;

        let before = self.blocks[first].get_range(self.blocks[first].start(), start);
        let after = self.blocks[last].get_range(end, self.blocks[last].end());
        self.blocks.splice(first..=last, [before, after]);
        self.remove_empty();
    }

    /// Collapses all blocks into one spanning `[start(), end())`, gaps filled with `fill`.
    ///
    /// Blocks are processed in ascending address order; where two blocks overlap,
    /// the bytes of the one starting later win.
    pub fn merge(&mut self, fill: u8) {
        let blocks = std::mem::take(&mut self.blocks);
        if let Some(block) = connect(blocks, fill)
            && !block.is_empty()
        {
            self.blocks.push(block);
        }
    }

    /// Address of the first occurrence of `sequence` at or after `from`, or
    /// [`end()`](Self::end) if there is none.
    ///
    /// Matches never span two blocks, and an empty sequence never matches.
    ///
    /// # Example
    /// ```
    /// use srecordlib::{Block, BlockSet};
    ///
    /// let mut set = BlockSet::new();
    /// set.set_range(Block::from_bytes(0x20, (0..8).collect()));
    ///
    /// assert_eq!(set.find(&[1, 2], 0), 0x21);
    /// assert_eq!(set.find(&[1, 2], 0x22), set.end());
    /// ```
    #[allow(clippy::cast_possible_truncation)]
    #[must_use]
    pub fn find(&self, sequence: &[u8], from: Address) -> Address {
        if sequence.is_empty() {
            return self.end();
        }
        for block in &self.blocks {
            if block.end() <= from {
                continue;
            }
            let offset = from.saturating_sub(block.start()) as usize;
            if let Some(pos) = block.bytes()[offset..]
                .windows(sequence.len())
                .position(|window| window == sequence)
            {
                return block.start().saturating_add((offset + pos) as Address);
            }
        }
        self.end()
    }

    /// Fast path used while assembling data lines: extends the last block in place
    /// when `block` starts right at its end, otherwise inserts at the sorted position.
    /// Overlaps are kept and left to validation.
    pub(crate) fn append_or_insert(&mut self, block: Block) {
        if let Some(last) = self.blocks.last_mut()
            && last.end() == block.start()
        {
            last.bytes_mut().extend_from_slice(block.bytes());
            return;
        }
        let pos = self
            .blocks
            .partition_point(|b| b.start() <= block.start());
        self.blocks.insert(pos, block);
    }

    fn reorder(&mut self) {
        reorder(&mut self.blocks);
    }

    fn remove_empty(&mut self) {
        self.blocks.retain(|b| !b.is_empty());
    }

    /// Joins every pair of adjacent blocks and drops empty ones.
    fn coalesce(&mut self) {
        self.remove_empty();
        let mut joined: Vec<Block> = Vec::with_capacity(self.blocks.len());
        for block in self.blocks.drain(..) {
            if let Some(last) = joined.last_mut()
                && last.end() == block.start()
            {
                last.bytes_mut().extend(block.into_bytes());
            } else {
                joined.push(block);
            }
        }
        self.blocks = joined;
    }
}

/// Stable sort by start address; blocks with equal start keep their relative order.
fn reorder(blocks: &mut [Block]) {
    blocks.sort_by_key(Block::start);
}

/// Connects blocks into one spanning the lowest start to the highest end, filling
/// gaps with `fill`. The later block (by address) wins where two overlap.
#[allow(clippy::cast_possible_truncation)]
fn connect(mut blocks: Vec<Block>, fill: u8) -> Option<Block> {
    reorder(&mut blocks);
    let start = blocks.first()?.start();
    let end = blocks.iter().map(Block::end).max()?;

    let mut data = vec![fill; (end - start) as usize];
    for block in &blocks {
        let from = (block.start() - start) as usize;
        let len = (block.end() - block.start()) as usize;
        data[from..from + len].copy_from_slice(&block.bytes()[..len]);
    }
    Some(Block::from_bytes(start, data))
}
