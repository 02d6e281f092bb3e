use crate::Address;
use crate::block::Block;
use regex::bytes::Regex;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchType {
    Hex(Vec<u8>),
    Ascii(String),
    Regex(String),
}

/// Searches for a pattern in the record data.
/// Matches never span two blocks.
pub(crate) fn search<'a>(
    blocks: impl Iterator<Item = &'a Block>,
    search_type: &SearchType,
) -> Vec<Address> {
    match search_type {
        SearchType::Hex(p) => search_bytes(blocks, p),
        SearchType::Ascii(s) => search_bytes(blocks, s.as_bytes()),
        SearchType::Regex(p) => search_regex(blocks, p),
    }
}

/// Slide window search within each block.
/// Returns the starting addresses of all (possibly overlapping) matches.
fn search_bytes<'a>(blocks: impl Iterator<Item = &'a Block>, pattern: &[u8]) -> Vec<Address> {
    if pattern.is_empty() {
        return vec![];
    }

    blocks
        .flat_map(|block| {
            block
                .bytes()
                .windows(pattern.len())
                .enumerate()
                .filter(move |(_, window)| *window == pattern)
                .map(move |(offset, _)| block.start() + offset as Address)
        })
        .collect()
}

/// Regex search within each block.
/// An invalid pattern yields no matches.
fn search_regex<'a>(blocks: impl Iterator<Item = &'a Block>, pattern: &str) -> Vec<Address> {
    let Ok(re) = Regex::new(pattern) else {
        return vec![];
    };
    let mut matches = Vec::new();

    for block in blocks {
        for mtch in re.find_iter(block.bytes()) {
            matches.push(block.start() + mtch.start() as Address);
        }
    }

    matches
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::Rng;

    fn random_block(start: Address, len: usize) -> Block {
        let rng = rand::rng();
        let bytes: Vec<u8> = rng
            .sample_iter(rand::distr::StandardUniform)
            .take(len)
            .collect();
        Block::from_bytes(start, bytes)
    }

    #[test]
    fn test_search_bytes() {
        // Arrange
        let start_addr = 0x1000;
        let pattern = vec![0xAA, 0xBB, 0xCC, 0xDD, 0xEE];
        let mut block = random_block(start_addr, 1000);
        block.bytes_mut()[203..208].copy_from_slice(&pattern); // plant the pattern

        // Act
        let res = search([&block].into_iter(), &SearchType::Hex(pattern));

        // Assert
        assert_eq!(res, vec![start_addr + 203]);
    }

    #[test]
    fn test_search_ascii_literals() {
        // Arrange
        let start_addr = 0x1000;
        let mut block = random_block(start_addr, 1000);
        block.bytes_mut()[203..208].copy_from_slice(b"20.71");

        // Act
        let res = search([&block].into_iter(), &SearchType::Ascii("20.71".to_string()));

        // Assert
        assert_eq!(res, vec![start_addr + 203]);
    }

    #[test]
    fn test_search_ascii_regex() {
        // Arrange
        let blocks = [
            Block::from_bytes(0x20, b"..77LoL..".to_vec()),
            Block::from_bytes(0x80, b"12abL".to_vec()),
        ];

        // Act
        let res = search(blocks.iter(), &SearchType::Regex(r"\d{2}\D{2}L".to_string()));

        // Assert
        assert_eq!(res, vec![0x22, 0x80]);
    }

    #[test]
    fn test_search_does_not_span_blocks() {
        // Arrange
        let blocks = [
            Block::from_bytes(0x00, vec![0x01, 0x02]),
            Block::from_bytes(0x02, vec![0x03, 0x04]),
        ];

        // Act
        let res = search(blocks.iter(), &SearchType::Hex(vec![0x02, 0x03]));
        let empty = search(blocks.iter(), &SearchType::Hex(vec![]));
        let invalid = search(blocks.iter(), &SearchType::Regex("(".to_string()));

        // Assert
        assert!(res.is_empty());
        assert!(empty.is_empty());
        assert!(invalid.is_empty());
    }
}
