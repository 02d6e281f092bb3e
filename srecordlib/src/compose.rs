//! Turns a validated block set plus metadata back into S-record text.

use crate::Address;
use crate::blockset::BlockSet;
use crate::error::{SRecordError, SRecordErrorKind};
use crate::line::{AddressWidth, Line, LineType};
use std::fmt::Write;
use tracing::debug;

pub(crate) const HEADER_MIN_LEN: usize = 10;
pub(crate) const HEADER_MAX_LEN: usize = 25;

/// Upper bound of a composed line, in characters.
const MAX_LINE_LENGTH: usize = 92;
/// Default number of data characters per line when no length is requested.
const DEFAULT_DATA_CHARS: usize = 64;

/// Pads `header` with NUL bytes to the minimum length and truncates it to the maximum.
pub(crate) fn normalize_header(mut header: Vec<u8>) -> Vec<u8> {
    header.resize(header.len().clamp(HEADER_MIN_LEN, HEADER_MAX_LEN), 0);
    header
}

/// Characters of a data line that are not payload: `S`, type, count, address, checksum.
const fn frame_size(width: AddressWidth) -> usize {
    let address_len = match width.data_type() {
        Some(ltype) => ltype.address_len(),
        None => 2,
    };
    2 + 2 + 2 * address_len + 2
}

/// Number of payload bytes per data line for a requested line length (0 = default).
pub(crate) const fn data_bytes_per_line(width: AddressWidth, line_length: usize) -> usize {
    let frame = frame_size(width);
    let mut length = if line_length == 0 {
        frame + DEFAULT_DATA_CHARS
    } else {
        line_length
    };
    if length > MAX_LINE_LENGTH {
        length = MAX_LINE_LENGTH;
    }
    if length < frame + 8 {
        length = frame + 8;
    }
    (length - frame) / 2
}

/// S5 while the data line count fits 16 bits, S6 while it fits 24 bits.
const fn count_line_type(data_lines: usize) -> Option<LineType> {
    match data_lines {
        0..=0xFFFF => Some(LineType::Count16),
        0x1_0000..=0xFF_FFFF => Some(LineType::Count24),
        _ => None,
    }
}

/// Everything a record needs to be written out.
#[derive(Debug)]
pub(crate) struct ComposeInput<'a> {
    pub(crate) blocks: &'a BlockSet,
    pub(crate) header: &'a [u8],
    pub(crate) width: AddressWidth,
    pub(crate) termination_address: Address,
}

/// Writes header, data lines, line count and termination line, each ending in `\n`.
///
/// `input.width` must be the width returned by validation.
pub(crate) fn compose(input: &ComposeInput, line_length: usize) -> Result<String, SRecordError> {
    let (Some(data_type), Some(termination_type)) =
        (input.width.data_type(), input.width.termination_type())
    else {
        return Err(SRecordError::ComposeError(
            SRecordErrorKind::RecordTypeTooSmall,
        ));
    };
    let per_line = data_bytes_per_line(input.width, line_length);

    let data_lines: usize = input
        .blocks
        .iter()
        .map(|b| b.len().div_ceil(per_line))
        .sum();
    let Some(count_type) = count_line_type(data_lines) else {
        return Err(SRecordError::ComposeError(
            SRecordErrorKind::TooManyDataLines,
        ));
    };

    let mut out = String::with_capacity((data_lines + 3) * (2 * per_line + 16));
    let header = normalize_header(input.header.to_vec());
    push_line(&mut out, &Line::create(LineType::Header, 0, &header));

    for block in input.blocks {
        let mut address = block.start();
        for chunk in block.bytes().chunks(per_line) {
            push_line(&mut out, &Line::create(data_type, address, chunk));
            address += chunk.len() as Address;
        }
    }

    push_line(&mut out, &Line::create(count_type, data_lines as Address, &[]));
    push_line(
        &mut out,
        &Line::create(termination_type, input.termination_address, &[]),
    );

    debug!(
        width = ?input.width,
        data_lines,
        bytes_per_line = per_line,
        "composed S-record"
    );
    Ok(out)
}

fn push_line(out: &mut String, line: &str) {
    // Writing to a String cannot fail
    let _ = writeln!(out, "{line}");
}
