//! The `srecord` module provides the [`SRecord`] struct, a high-level API for
//! managing Motorola S-record data (S19/S28/S37).
//!
//! Parsed data lives in a sparse [`BlockSet`] of address-tagged byte blocks. Next to
//! parsing and composing, the module provides range read/write/remove operations,
//! typed reads, pattern search and binary file interop.

use crate::Address;
use crate::assembler::{Feed, RecordAssembler};
use crate::block::Block;
use crate::blockset::BlockSet;
use crate::compose::{self, ComposeInput, HEADER_MIN_LEN};
use crate::error::{SRecordError, SRecordErrorKind};
use crate::line::{AddressWidth, Line};
use crate::reader::LineReader;
use crate::search::{self, SearchType};
use crate::validate;
use std::error::Error;
use std::fmt::Write as _;
use std::io::{BufRead, BufReader, Write};
use std::path::Path;
use std::str::FromStr;
use tracing::{debug, warn};

/// Byte order for multi-byte reads.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum Endianness {
    #[default]
    Little,
    Big,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SRecord {
    blocks: BlockSet,
    width: AddressWidth,
    /// Always between 10 and 25 bytes
    header: Vec<u8>,
    termination_address: Address,
    /// Fill byte for gaps in `get_range`, `merge` and binary output
    default_value: u8,
    strict: bool,
    error: Option<SRecordError>,
    parser_line: usize,
}

impl Default for SRecord {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a> IntoIterator for &'a SRecord {
    type Item = &'a Block;
    type IntoIter = std::slice::Iter<'a, Block>;
    fn into_iter(self) -> Self::IntoIter {
        self.blocks.iter()
    }
}

impl FromStr for SRecord {
    type Err = SRecordError;

    /// Parses `s` as one self-contained record in lenient mode.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut srec = Self::new();
        srec.parse_str(s)?;
        Ok(srec)
    }
}

impl SRecord {
    /// Creates an empty, lenient `SRecord` with a zeroed header and fill value 0x00.
    ///
    /// # Example
    /// ```
    /// use srecordlib::SRecord;
    ///
    /// let srec = SRecord::new();
    /// assert!(srec.blocks().is_empty());
    /// assert!(srec.good());
    /// ```
    #[must_use]
    pub fn new() -> Self {
        Self {
            blocks: BlockSet::new(),
            width: AddressWidth::Undefined,
            header: vec![0; HEADER_MIN_LEN],
            termination_address: 0,
            default_value: 0x00,
            strict: false,
            error: None,
            parser_line: 0,
        }
    }

    /// Drops data, header, width, termination address and error state.
    /// The strict flag and the default value are kept.
    pub fn clear(&mut self) {
        self.blocks.clear();
        self.width = AddressWidth::Undefined;
        self.header = vec![0; HEADER_MIN_LEN];
        self.termination_address = 0;
        self.error = None;
        self.parser_line = 0;
    }

    #[must_use]
    pub const fn strict_parsing(&self) -> bool {
        self.strict
    }

    /// Enables strict parsing: structural rules (header, termination, line count,
    /// single data type, no overlaps, sufficient address width) become hard errors.
    pub const fn set_strict_parsing(&mut self, strict: bool) {
        self.strict = strict;
    }

    #[must_use]
    pub const fn default_value(&self) -> u8 {
        self.default_value
    }

    pub const fn set_default_value(&mut self, value: u8) {
        self.default_value = value;
    }

    #[must_use]
    pub const fn address_width(&self) -> AddressWidth {
        self.width
    }

    /// Sets the width used for composing. `Undefined` picks the smallest fitting one.
    pub const fn set_address_width(&mut self, width: AddressWidth) {
        self.width = width;
    }

    #[must_use]
    pub const fn termination_address(&self) -> Address {
        self.termination_address
    }

    pub const fn set_termination_address(&mut self, address: Address) {
        self.termination_address = address;
    }

    #[must_use]
    pub fn header(&self) -> &[u8] {
        &self.header
    }

    /// Sets the raw header bytes, NUL-padded to 10 and truncated to 25 bytes.
    pub fn set_header(&mut self, header: Vec<u8>) {
        self.header = compose::normalize_header(header);
    }

    /// Header text up to the first NUL byte, trailing whitespace removed.
    ///
    /// # Example
    /// ```
    /// use srecordlib::SRecord;
    ///
    /// let mut srec = SRecord::new();
    /// srec.set_header_str("boot v1.2   ");
    ///
    /// assert_eq!(srec.header().len(), 12);
    /// assert_eq!(srec.header_str(), "boot v1.2");
    /// ```
    #[must_use]
    pub fn header_str(&self) -> String {
        let text = self
            .header
            .split(|b| *b == 0)
            .next()
            .unwrap_or_default();
        String::from_utf8_lossy(text).trim_end().to_string()
    }

    pub fn set_header_str(&mut self, header: &str) {
        self.set_header(header.as_bytes().to_vec());
    }

    /// Last error of a parse, load or validate call, `None` after success.
    #[must_use]
    pub const fn error(&self) -> Option<&SRecordError> {
        self.error.as_ref()
    }

    #[must_use]
    pub const fn good(&self) -> bool {
        self.error.is_none()
    }

    /// Human readable message of the last error, empty if there is none.
    #[must_use]
    pub fn error_message(&self) -> String {
        self.error.as_ref().map_or_else(String::new, ToString::to_string)
    }

    /// Number of the last line read by the parser (1-based, blank lines counted).
    #[must_use]
    pub const fn parser_line(&self) -> usize {
        self.parser_line
    }

    /// Address attached to the last validation error, 0 otherwise.
    #[must_use]
    pub fn error_address(&self) -> Address {
        self.error
            .as_ref()
            .and_then(SRecordError::address)
            .unwrap_or(0)
    }

    fn fail<T>(&mut self, err: SRecordError) -> Result<T, SRecordError> {
        warn!(%err, line = self.parser_line, "S-record operation failed");
        self.error = Some(err.clone());
        Err(err)
    }

    /// Parses `text` as one self-contained record, replacing the current content.
    ///
    /// Whitespace anywhere in a line, blank lines and hex digit case are ignored.
    ///
    /// # Errors
    /// Returns the first parse or validation error. The error is also kept in the
    /// instance (see [`error`](Self::error)), and the data is left empty.
    ///
    /// # Example
    /// ```
    /// use srecordlib::SRecord;
    ///
    /// let mut srec = SRecord::new();
    /// srec.parse_str("S00F000068656C6C6F212020202000003B\n\
    ///                 S111003848656C6C6F20776F726C642E0A0042\n\
    ///                 S9030000FC\n").unwrap();
    ///
    /// assert_eq!(srec.header_str(), "hello!");
    /// assert_eq!(srec.start(), 0x38);
    /// assert_eq!(srec.end(), 0x46);
    /// ```
    pub fn parse_str(&mut self, text: &str) -> Result<(), SRecordError> {
        self.parse_reader(&mut LineReader::new(text.as_bytes()), true)
    }

    /// Parses the next record from `reader`, replacing the current content.
    ///
    /// A second header line ends the record and is left in the reader. Unless
    /// `single_file_stream` is set, so does any line that does not start with `S`;
    /// this allows several records to be read from one concatenated stream. A
    /// foreign line in front of any record line fails with `MissingDataLines` and
    /// stays in the reader as well.
    ///
    /// # Errors
    /// Returns the first parse or validation error, or `ReadFailed` if the stream
    /// cannot be read. The error is also kept in the instance.
    pub fn parse_reader<R: BufRead>(
        &mut self,
        reader: &mut LineReader<R>,
        single_file_stream: bool,
    ) -> Result<(), SRecordError> {
        self.clear();
        match self.parse_lines(reader, single_file_stream) {
            Ok(()) => {
                debug!(
                    blocks = self.blocks.len(),
                    bytes = self.blocks.byte_count(),
                    width = ?self.width,
                    lines = self.parser_line,
                    "parsed S-record"
                );
                Ok(())
            }
            Err(err) => {
                self.blocks.clear();
                self.fail(err)
            }
        }
    }

    fn parse_lines<R: BufRead>(
        &mut self,
        reader: &mut LineReader<R>,
        single_file_stream: bool,
    ) -> Result<(), SRecordError> {
        let mut assembler = RecordAssembler::new(self.strict);

        loop {
            let raw = reader.next_line().map_err(|_| {
                SRecordError::ParseError(SRecordErrorKind::ReadFailed, self.parser_line + 1)
            })?;
            let Some(raw) = raw else {
                break;
            };
            self.parser_line += 1;

            let text: Vec<u8> = raw
                .iter()
                .copied()
                .filter(|ch| !ch.is_ascii_whitespace())
                .collect();
            if text.is_empty() {
                continue;
            }
            if !single_file_stream && !text[0].eq_ignore_ascii_case(&b'S') {
                // Not part of this record
                reader.push_back(raw);
                self.parser_line -= 1;
                break;
            }

            let line = Line::parse(&text)
                .map_err(|kind| SRecordError::ParseError(kind, self.parser_line))?;
            let feed = assembler
                .push(line)
                .map_err(|kind| SRecordError::ParseError(kind, self.parser_line))?;
            if feed == Feed::EndOfRecord {
                reader.push_back(raw);
                self.parser_line -= 1;
                break;
            }
        }

        let out = assembler
            .finish()
            .map_err(|kind| SRecordError::ParseError(kind, self.parser_line))?;

        self.header = compose::normalize_header(out.header.unwrap_or_default());
        self.termination_address = out.termination_address.unwrap_or(0);
        self.width = validate::validate(&out.blocks, out.width, self.strict)?;
        self.blocks = out.blocks;
        self.blocks.normalize();
        Ok(())
    }

    /// Parses the next record of a possibly concatenated stream.
    ///
    /// # Errors
    /// See [`parse_reader`](Self::parse_reader).
    ///
    /// # Example
    /// ```
    /// use srecordlib::{LineReader, SRecord};
    ///
    /// let one = "S00D000068656C6C6F2100000000BD\nS107000001020304EE\nS9030000FC\n";
    /// let stream = format!("{one}\n{one}");
    /// let mut reader = LineReader::new(stream.as_bytes());
    ///
    /// let first = SRecord::from_reader(&mut reader).unwrap();
    /// let second = SRecord::from_reader(&mut reader).unwrap();
    ///
    /// assert_eq!(first.header_str(), "hello!");
    /// assert_eq!(first.blocks(), second.blocks());
    /// assert!(reader.is_exhausted().unwrap());
    /// ```
    pub fn from_reader<R: BufRead>(reader: &mut LineReader<R>) -> Result<Self, SRecordError> {
        let mut srec = Self::new();
        srec.parse_reader(reader, false)?;
        Ok(srec)
    }

    /// Creates an `SRecord` from an S-record file.
    ///
    /// # Errors
    /// See [`load`](Self::load).
    ///
    /// # Example
    /// ```
    /// use srecordlib::SRecord;
    ///
    /// let srec = SRecord::from_file("tests/fixtures/example.s19").unwrap();
    /// assert_eq!(srec.header_str(), "hello!");
    /// ```
    pub fn from_file<P: AsRef<Path>>(filepath: P) -> Result<Self, SRecordError> {
        let mut srec = Self::new();
        srec.load(filepath)?;
        Ok(srec)
    }

    /// Loads an S-record file (`.s19`, `.s28`, `.s37`, `.srec`, ...), replacing the current content.
    ///
    /// The whole file has to be one record; comments or a second record are an error.
    ///
    /// # Errors
    /// - `LoadError(OpenFailed)` if the path is empty or the file cannot be opened,
    /// - the parse or validation error of the content,
    /// - `LoadError(LoadIncomplete)` if data follows the record.
    pub fn load<P: AsRef<Path>>(&mut self, filepath: P) -> Result<(), SRecordError> {
        let filepath = filepath.as_ref();
        self.clear();
        if filepath.as_os_str().is_empty() {
            return self.fail(SRecordError::LoadError(SRecordErrorKind::OpenFailed));
        }
        let Ok(file) = std::fs::File::open(filepath) else {
            return self.fail(SRecordError::LoadError(SRecordErrorKind::OpenFailed));
        };

        let mut reader = LineReader::new(BufReader::new(file));
        self.parse_reader(&mut reader, true)?;
        if !reader.is_exhausted().unwrap_or(false) {
            self.blocks.clear();
            return self.fail(SRecordError::LoadError(SRecordErrorKind::LoadIncomplete));
        }
        debug!(path = %filepath.display(), "loaded S-record file");
        Ok(())
    }

    /// Creates an `SRecord` from a raw binary file placed at `base_address`.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read.
    ///
    /// # Example
    /// ```
    /// use srecordlib::SRecord;
    ///
    /// let srec = SRecord::from_bin("tests/fixtures/example.bin", 0x1000).unwrap();
    ///
    /// assert_eq!(srec.start(), 0x1000);
    /// assert_eq!(srec.end(), 0x1046);
    /// ```
    pub fn from_bin<P: AsRef<Path>>(
        filepath: P,
        base_address: Address,
    ) -> Result<Self, Box<dyn Error>> {
        let mut srec = Self::new();
        srec.load_bin(filepath, base_address)?;
        Ok(srec)
    }

    /// Replaces the content with a raw binary file placed at `base_address`.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read.
    pub fn load_bin<P: AsRef<Path>>(
        &mut self,
        filepath: P,
        base_address: Address,
    ) -> Result<(), Box<dyn Error>> {
        // Bin only contains data bytes
        let data = std::fs::read(&filepath)?;
        self.clear();
        self.set_range(Block::from_bytes(base_address, data));
        Ok(())
    }

    /// Checks that the record can be composed and settles the address width
    /// (adopted when undefined, widened when too small in lenient mode).
    ///
    /// # Errors
    /// - `NoBinaryData` if there are no bytes,
    /// - `BlocksUnordered`/`OverlappingBlocks` after raw [`push_block`](Self::push_block) calls,
    /// - `RangeExceeded` for data above the 32-bit address space,
    /// - `RecordTypeTooSmall` in strict mode if the set width cannot address the data.
    ///
    /// # Example
    /// ```
    /// use srecordlib::{Block, SRecord, SRecordErrorKind};
    ///
    /// let mut srec = SRecord::new();
    /// srec.push_block(Block::from_bytes(0x20, vec![0; 16]));
    /// srec.push_block(Block::from_bytes(0x28, vec![0; 16]));
    ///
    /// let err = srec.validate().unwrap_err();
    /// assert_eq!(err.kind(), &SRecordErrorKind::OverlappingBlocks);
    /// assert_eq!(srec.error_address(), 0x28);
    /// ```
    pub fn validate(&mut self) -> Result<(), SRecordError> {
        match validate::validate(&self.blocks, self.width, self.strict) {
            Ok(width) => {
                self.width = width;
                Ok(())
            }
            Err(err) => self.fail(err),
        }
    }

    /// Composes the record as S-record text.
    ///
    /// `line_length` is the approximate number of characters per data line
    /// (0 = default, at most 92). The record itself is not modified.
    ///
    /// # Errors
    /// Returns a validation error, or `TooManyDataLines` if the data line count does
    /// not fit into an S6 line.
    ///
    /// # Example
    /// ```
    /// use srecordlib::{Block, SRecord};
    ///
    /// let mut srec = SRecord::new();
    /// srec.set_range(Block::from_bytes(0x0010, (0..16).collect()));
    ///
    /// let text = srec.compose(0).unwrap();
    /// let copy: SRecord = text.parse().unwrap();
    ///
    /// assert_eq!(copy.blocks(), srec.blocks());
    /// ```
    pub fn compose(&self, line_length: usize) -> Result<String, SRecordError> {
        let width = validate::validate(&self.blocks, self.width, self.strict)?;
        compose::compose(
            &ComposeInput {
                blocks: &self.blocks,
                header: &self.header,
                width,
                termination_address: self.termination_address,
            },
            line_length,
        )
    }

    /// Composes the record into `writer`.
    ///
    /// # Errors
    /// Returns an error if composing fails or the writer cannot be written.
    pub fn compose_to<W: Write>(
        &self,
        writer: &mut W,
        line_length: usize,
    ) -> Result<(), Box<dyn Error>> {
        let text = self.compose(line_length)?;
        writer.write_all(text.as_bytes())?;
        Ok(())
    }

    /// Writes the composed record to a file, creating parent directories as needed.
    ///
    /// # Errors
    /// Returns an error if composing fails or the file cannot be written.
    ///
    /// # Example
    /// ```
    /// use srecordlib::SRecord;
    ///
    /// let srec = SRecord::from_file("tests/fixtures/example.s19").unwrap();
    /// srec.write_srec("build/doc/example.s19", 0).unwrap();
    ///
    /// assert_eq!(SRecord::from_file("build/doc/example.s19").unwrap(), srec);
    /// ```
    pub fn write_srec<P: AsRef<Path>>(
        &self,
        filepath: P,
        line_length: usize,
    ) -> Result<(), Box<dyn Error>> {
        let text = self.compose(line_length)?;
        if let Some(parent) = filepath.as_ref().parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(filepath, text)?;
        Ok(())
    }

    /// Writes the bytes from [`start`](Self::start) to [`end`](Self::end) as a binary
    /// file. Address gaps are filled with `gap_fill` (usually 0x00 or 0xFF).
    ///
    /// # Errors
    /// Returns an error if the file cannot be written.
    pub fn write_bin<P: AsRef<Path>>(&self, filepath: P, gap_fill: u8) -> Result<(), Box<dyn Error>> {
        if let Some(parent) = filepath.as_ref().parent() {
            std::fs::create_dir_all(parent)?;
        }
        let image = self.get_range_filled(self.start(), self.end(), gap_fill);
        std::fs::write(filepath, image.bytes())?;
        Ok(())
    }

    #[must_use]
    pub const fn blocks(&self) -> &BlockSet {
        &self.blocks
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Block> {
        self.into_iter()
    }

    /// Appends a block without sorting, overlap checks or coalescing.
    /// Use [`validate`](Self::validate) to check the result.
    pub fn push_block(&mut self, block: Block) {
        self.blocks.push(block);
    }

    /// Lowest address with data, 0 if there is none.
    #[must_use]
    pub fn start(&self) -> Address {
        self.blocks.start()
    }

    /// One past the highest address with data, 0 if there is none.
    #[must_use]
    pub fn end(&self) -> Address {
        self.blocks.end()
    }

    /// Copies of all data inside `[start, end)`, one block per contiguous run.
    #[must_use]
    pub fn get_ranges(&self, start: Address, end: Address) -> Vec<Block> {
        self.blocks.get_ranges(start, end)
    }

    /// Exactly `[start, end)` as one block, gaps filled with the default value.
    #[must_use]
    pub fn get_range(&self, start: Address, end: Address) -> Block {
        self.get_range_filled(start, end, self.default_value)
    }

    /// Exactly `[start, end)` as one block, gaps filled with `fill`.
    #[must_use]
    pub fn get_range_filled(&self, start: Address, end: Address, fill: u8) -> Block {
        self.blocks.get_range(start, end, fill)
    }

    /// Writes `block` into the data, overwriting what was there.
    ///
    /// # Example
    /// ```
    /// use srecordlib::{Block, SRecord};
    ///
    /// let mut srec = SRecord::new();
    /// srec.set_range(Block::from_bytes(0x10, vec![0xAA; 4]));
    /// srec.set_range(Block::from_bytes(0x12, vec![0xBB; 4]));
    ///
    /// assert_eq!(srec.get_range(0x10, 0x16).bytes(), &[0xAA, 0xAA, 0xBB, 0xBB, 0xBB, 0xBB]);
    /// ```
    pub fn set_range(&mut self, block: Block) {
        self.blocks.set_range(block);
    }

    /// Removes all data inside `[start, end)`.
    pub fn remove_range(&mut self, start: Address, end: Address) {
        self.blocks.remove_range(start, end);
    }

    /// Joins all data into one block, gaps filled with the default value.
    pub fn merge(&mut self) {
        self.blocks.merge(self.default_value);
    }

    /// Address of the first occurrence of `sequence` at or after `from`, or
    /// [`end`](Self::end) if there is none. Matches never span two blocks.
    #[must_use]
    pub fn find(&self, sequence: &[u8], from: Address) -> Address {
        self.blocks.find(sequence, from)
    }

    /// Start addresses of all matches of `search_type`. Matches never span two blocks.
    ///
    /// # Example
    /// ```
    /// use srecordlib::{SRecord, SearchType};
    ///
    /// let srec = SRecord::from_file("tests/fixtures/example.s19").unwrap();
    /// let found = srec.search(&SearchType::Ascii("world".to_string()));
    ///
    /// assert_eq!(found, vec![0x3E]);
    /// ```
    #[must_use]
    pub fn search(&self, search_type: &SearchType) -> Vec<Address> {
        search::search(self.blocks.iter(), search_type)
    }

    /// Byte at `address`, `None` if there is no data.
    #[must_use]
    pub fn get_byte(&self, address: Address) -> Option<u8> {
        self.get_array::<1>(address).map(|[b]| b)
    }

    /// Two bytes at `address`, `None` if any of them is unset.
    #[must_use]
    pub fn get_u16(&self, address: Address, endianness: Endianness) -> Option<u16> {
        let bytes = self.get_array::<2>(address)?;
        Some(match endianness {
            Endianness::Little => u16::from_le_bytes(bytes),
            Endianness::Big => u16::from_be_bytes(bytes),
        })
    }

    /// Four bytes at `address`, `None` if any of them is unset.
    ///
    /// # Example
    /// ```
    /// use srecordlib::{Block, Endianness, SRecord};
    ///
    /// let mut srec = SRecord::new();
    /// srec.set_range(Block::from_bytes(0x00, vec![0x78, 0x56, 0x34, 0x12]));
    ///
    /// assert_eq!(srec.get_u32(0x00, Endianness::Little), Some(0x1234_5678));
    /// assert_eq!(srec.get_u32(0x00, Endianness::Big), Some(0x7856_3412));
    /// assert_eq!(srec.get_u32(0x01, Endianness::Big), None);
    /// ```
    #[must_use]
    pub fn get_u32(&self, address: Address, endianness: Endianness) -> Option<u32> {
        let bytes = self.get_array::<4>(address)?;
        Some(match endianness {
            Endianness::Little => u32::from_le_bytes(bytes),
            Endianness::Big => u32::from_be_bytes(bytes),
        })
    }

    fn get_array<const N: usize>(&self, address: Address) -> Option<[u8; N]> {
        let end = address.checked_add(N as Address)?;
        match self.blocks.get_ranges(address, end).as_slice() {
            [block] if block.len() == N => block.bytes().try_into().ok(),
            _ => None,
        }
    }

    /// Human readable dump of the record.
    ///
    /// # Example
    /// ```
    /// use srecordlib::{Block, SRecord};
    ///
    /// let mut srec = SRecord::new();
    /// srec.set_range(Block::from_bytes(0x10, vec![0xAB, 0xCD]));
    ///
    /// assert_eq!(
    ///     srec.dump(),
    ///     "srec {\n data type: (auto/not set)\n blocks: [\n    <00000010> ABCD\n\n ]\n}\n"
    /// );
    /// ```
    #[must_use]
    pub fn dump(&self) -> String {
        let data_type = match self.width.data_type() {
            Some(ltype) => format!("S{}", ltype as u8),
            None => "(auto/not set)".to_string(),
        };
        let mut out = format!("srec {{\n data type: {data_type}\n blocks: [\n");
        for block in &self.blocks {
            let mut text = String::new();
            // Writing to a String cannot fail
            let _ = block.dump(&mut text);
            for line in text.lines().filter(|l| !l.is_empty()) {
                let _ = writeln!(out, "    {line}");
            }
            out.push('\n');
        }
        out.push_str(" ]\n}\n");
        out
    }

    /// Parses `text` without keeping the error state. Benchmarking hook.
    ///
    /// # Errors
    /// Same as [`parse_str`](Self::parse_str).
    #[cfg(feature = "benchmarking")]
    pub fn bench_priv_parse(&mut self, text: &str) -> Result<(), SRecordError> {
        self.clear();
        self.parse_lines(&mut LineReader::new(text.as_bytes()), true)
    }
}
