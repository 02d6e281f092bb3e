//! The `line` module defines [`Line`] and [`LineType`], used for parsing (and
//! generating) single S-record text lines.

use crate::Address;
use crate::error::SRecordErrorKind;
use crate::hex;

mod sizes {
    /// `S` + type digit + count + 2-byte address + checksum
    pub const SMALLEST_LINE: usize = 2 + (1 + 2 + 1) * 2;
    /// `S` + type digit + 255 counted bytes + count byte
    pub const LARGEST_LINE: usize = 2 + (1 + 255) * 2;
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum LineType {
    Header = 0,
    Data16 = 1,
    Data24 = 2,
    Data32 = 3,
    Count16 = 5,
    Count24 = 6,
    Start32 = 7,
    Start24 = 8,
    Start16 = 9,
}

impl LineType {
    const fn from_digit(digit: u8) -> Option<Self> {
        match digit {
            0 => Some(Self::Header),
            1 => Some(Self::Data16),
            2 => Some(Self::Data24),
            3 => Some(Self::Data32),
            5 => Some(Self::Count16),
            6 => Some(Self::Count24),
            7 => Some(Self::Start32),
            8 => Some(Self::Start24),
            9 => Some(Self::Start16),
            _ => None,
        }
    }

    /// Number of bytes in the address field of this line type.
    #[must_use]
    pub const fn address_len(self) -> usize {
        match self {
            Self::Header | Self::Data16 | Self::Count16 | Self::Start16 => 2,
            Self::Data24 | Self::Count24 | Self::Start24 => 3,
            Self::Data32 | Self::Start32 => 4,
        }
    }

    #[must_use]
    pub const fn is_data(self) -> bool {
        matches!(self, Self::Data16 | Self::Data24 | Self::Data32)
    }

    #[must_use]
    pub const fn is_count(self) -> bool {
        matches!(self, Self::Count16 | Self::Count24)
    }

    #[must_use]
    pub const fn is_termination(self) -> bool {
        matches!(self, Self::Start32 | Self::Start24 | Self::Start16)
    }
}

/// Address width of a record's data lines, selecting S1/S2/S3 and S9/S8/S7.
///
/// Ordered by size, `Undefined` being the smallest.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum AddressWidth {
    #[default]
    Undefined,
    Width16,
    Width24,
    Width32,
}

impl AddressWidth {
    /// Width implied by a data line type, `Undefined` for any other type.
    #[must_use]
    pub const fn from_data_type(ltype: LineType) -> Self {
        match ltype {
            LineType::Data16 => Self::Width16,
            LineType::Data24 => Self::Width24,
            LineType::Data32 => Self::Width32,
            _ => Self::Undefined,
        }
    }

    /// Smallest width that can address every byte below `end`, or `None` above 32 bits.
    #[must_use]
    pub const fn needed_for(end: Address) -> Option<Self> {
        match end {
            0..=0x1_0000 => Some(Self::Width16),
            0x1_0001..=0x100_0000 => Some(Self::Width24),
            0x100_0001..=0x1_0000_0000 => Some(Self::Width32),
            _ => None,
        }
    }

    #[must_use]
    pub const fn data_type(self) -> Option<LineType> {
        match self {
            Self::Undefined => None,
            Self::Width16 => Some(LineType::Data16),
            Self::Width24 => Some(LineType::Data24),
            Self::Width32 => Some(LineType::Data32),
        }
    }

    /// S9 for 16-bit, S8 for 24-bit and S7 for 32-bit records.
    #[must_use]
    pub const fn termination_type(self) -> Option<LineType> {
        match self {
            Self::Undefined => None,
            Self::Width16 => Some(LineType::Start16),
            Self::Width24 => Some(LineType::Start24),
            Self::Width32 => Some(LineType::Start32),
        }
    }

    /// Conventional file extension (`s19`, `s28`, `s37`).
    #[must_use]
    pub const fn extension(self) -> &'static str {
        match self {
            Self::Undefined | Self::Width16 => "s19",
            Self::Width24 => "s28",
            Self::Width32 => "s37",
        }
    }
}

/// One decoded S-record line.
///
/// For count lines (S5/S6) `address` holds the declared number of data lines,
/// for termination lines (S7/S8/S9) the start address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Line {
    pub ltype: LineType,
    pub address: Address,
    pub data: Vec<u8>,
}

impl Line {
    /// Parse a line with all whitespace already removed. Hex digits may be in either case.
    ///
    /// # Errors
    /// Returns the first line-level problem found, checked in this order: characters,
    /// leading `S`, type digit, line length, type 4, checksum, byte count, S0 address.
    pub fn parse(line: &[u8]) -> Result<Self, SRecordErrorKind> {
        // Only hex digits and 'S' may appear
        if !line
            .iter()
            .all(|ch| ch.is_ascii_hexdigit() || ch.eq_ignore_ascii_case(&b'S'))
        {
            return Err(SRecordErrorKind::UnacceptableCharacter);
        }
        if line.len() < 2 {
            return Err(SRecordErrorKind::InvalidLineLength);
        }
        if !line[0].eq_ignore_ascii_case(&b'S') {
            return Err(SRecordErrorKind::LineNotStartingWithS);
        }
        if !line[1].is_ascii_digit() {
            return Err(SRecordErrorKind::InvalidRecordType);
        }
        if line.len() % 2 != 0 || !(sizes::SMALLEST_LINE..=sizes::LARGEST_LINE).contains(&line.len())
        {
            return Err(SRecordErrorKind::InvalidLineLength);
        }

        // An 'S' past the prefix makes the decode fail
        let bytes = hex::decode(&line[2..]).ok_or(SRecordErrorKind::UnacceptableCharacter)?;
        let ltype = LineType::from_digit(line[1] - b'0').ok_or(SRecordErrorKind::InvalidRecordType)?;

        let (body, found) = bytes.split_at(bytes.len() - 1);
        let expected = hex::checksum(body);
        if expected != found[0] {
            return Err(SRecordErrorKind::ChecksumIncorrect(expected, found[0]));
        }

        let declared = usize::from(body[0]);
        let actual = bytes.len() - 1;
        if declared != actual || declared < ltype.address_len() + 1 {
            return Err(SRecordErrorKind::LengthMismatch(declared, actual));
        }

        let (addr_bytes, data) = body[1..].split_at(ltype.address_len());
        let address = addr_bytes
            .iter()
            .fold(0, |acc: Address, b| (acc << 8) | Address::from(*b));
        if ltype == LineType::Header && address != 0 {
            return Err(SRecordErrorKind::HeaderAddressNonzero);
        }

        Ok(Self {
            ltype,
            address,
            data: data.to_vec(),
        })
    }

    /// Create the line text (uppercase, no line terminator).
    ///
    /// The address is truncated to the width of the line type. `data` must be short
    /// enough for the count byte (at most `254 - address_len` bytes).
    #[allow(clippy::cast_possible_truncation)]
    #[must_use]
    pub fn create(ltype: LineType, address: Address, data: &[u8]) -> String {
        let addr_len = ltype.address_len();
        let mut bytes = Vec::with_capacity(1 + addr_len + data.len());
        bytes.push((addr_len + data.len() + 1) as u8);
        bytes.extend((0..addr_len).rev().map(|i| (address >> (8 * i)) as u8));
        bytes.extend_from_slice(data);

        let mut line = String::with_capacity(2 + (bytes.len() + 1) * 2);
        line.push('S');
        line.push(char::from(b'0' + ltype as u8));
        line.push_str(&hex::to_hex(&bytes));
        hex::push_hex(&mut line, hex::checksum(&bytes));
        line
    }
}
