//! The `error` module defines the [`SRecordError`] enum that describes the errors that
//! can occur when parsing, validating, composing, or loading S-records via [`SRecord`].
//! It contains three pieces of information:
//! 1. In which phase the error occurred (parse, validate, compose, load).
//! 2. What kind of error was encountered (via [`SRecordErrorKind`]).
//! 3. Where it occurred: the line number for parse errors, the address for
//!    validation errors.
//!
//! [`SRecord`]: crate::SRecord

use crate::Address;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SRecordError {
    #[error("Error encountered during parsing at line #{1} of the S-record:\n{0}")]
    ParseError(SRecordErrorKind, usize),
    #[error("Error encountered during validation at address 0x{1:X}:\n{0}")]
    ValidateError(SRecordErrorKind, Address),
    #[error("Error encountered during composition of the S-record:\n{0}")]
    ComposeError(SRecordErrorKind),
    #[error("Error encountered during loading of the S-record file:\n{0}")]
    LoadError(SRecordErrorKind),
}

impl SRecordError {
    /// The error code, independent of the phase it was raised in.
    #[must_use]
    pub const fn kind(&self) -> &SRecordErrorKind {
        match self {
            Self::ParseError(kind, _)
            | Self::ValidateError(kind, _)
            | Self::ComposeError(kind)
            | Self::LoadError(kind) => kind,
        }
    }

    /// Line number (1-based, blank lines counted) for parse errors.
    #[must_use]
    pub const fn line(&self) -> Option<usize> {
        match self {
            Self::ParseError(_, line) => Some(*line),
            _ => None,
        }
    }

    /// Offending address for validation errors.
    #[must_use]
    pub const fn address(&self) -> Option<Address> {
        match self {
            Self::ValidateError(_, address) => Some(*address),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SRecordErrorKind {
    /// Line contains characters other than hex digits and 'S'
    #[error("[parse] Unacceptable character")]
    UnacceptableCharacter,
    /// Line does not begin with 'S'
    #[error("[parse] Line not starting with S")]
    LineNotStartingWithS,
    /// Line length is odd, shorter than 10 or longer than 514 characters
    #[error("[parse] Invalid line length")]
    InvalidLineLength,
    /// Record type digit is not one of 0-3, 5-9
    #[error("[parse] Invalid record type")]
    InvalidRecordType,
    /// Line checksum mismatch
    #[error("[parse] Line checksum mismatch - expected: 0x{0:02X}, found: 0x{1:02X}")]
    ChecksumIncorrect(u8, u8),
    /// Declared byte count differs from the number of bytes on the line
    #[error("[parse] Line data length mismatch - declared: {0} bytes, found: {1}")]
    LengthMismatch(usize, usize),
    #[error("[parse] Missing record header (S0)")]
    MissingHeader,
    #[error("[parse] S0 address field is nonzero")]
    HeaderAddressNonzero,
    #[error("[parse] Duplicate S5/S6 line found")]
    DuplicateLineCount,
    /// S5/S6 declaration does not match the number of data lines
    #[error(
        "[parse] Number of data lines does not match the declaration (S5/S6) - declared: {0}, found: {1}"
    )]
    LineCountMismatch(u64, u64),
    #[error("[parse] Duplicate start address specification (S7/S8/S9)")]
    DuplicateStartAddress,
    #[error("[parse] Missing start address line (S7/S8/S9)")]
    MissingStartAddress,
    /// Termination line type does not correspond to the data line type
    #[error("[parse] Start address type (S7/S8/S9) does not match the data type (S3/S2/S1)")]
    StartAddressTypeMismatch,
    #[error("[parse] Missing data lines (S1/S2/S3)")]
    MissingDataLines,
    #[error("[parse] Mixed data types in one record (S1/S2/S3)")]
    MixedDataLineTypes,
    /// Underlying stream failed while reading
    #[error("[parse] Reading the input stream failed")]
    ReadFailed,
    #[error("[compose] The output has too many data lines for the S5/S6 line data")]
    TooManyDataLines,
    #[error(
        "[validate] The specified record type (S1/S2/S3) is too small for the needed data address range"
    )]
    RecordTypeTooSmall,
    #[error("[validate] The data range exceeds the greatest possible address of an S-record")]
    RangeExceeded,
    #[error("[validate] No binary data blocks to write found in a record")]
    NoBinaryData,
    #[error("[validate] Unordered data blocks detected")]
    BlocksUnordered,
    #[error("[validate] Overlapping data blocks detected (address range collision)")]
    OverlappingBlocks,
    #[error("[load] Opening file failed")]
    OpenFailed,
    /// File contains more than one record or trailing non-record data
    #[error("[load] File was not consumed completely")]
    LoadIncomplete,
}
