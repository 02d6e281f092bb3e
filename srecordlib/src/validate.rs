//! Pre-compose checks of a block set against an address width.

use crate::Address;
use crate::blockset::BlockSet;
use crate::error::{SRecordError, SRecordErrorKind};
use crate::line::AddressWidth;
use tracing::debug;

/// Checks `blocks` and returns the address width a composer has to use.
///
/// An undefined `width` adopts the smallest width that fits the data. A width that is
/// too small is an error in strict mode and silently widened otherwise.
///
/// # Errors
/// The first problem found, in order: no data, unordered blocks, overlapping blocks,
/// data above the 32-bit address space, width too small (strict only).
pub(crate) fn validate(
    blocks: &BlockSet,
    width: AddressWidth,
    strict: bool,
) -> Result<AddressWidth, SRecordError> {
    let fail = |kind, address| Err(SRecordError::ValidateError(kind, address));

    let mut present = blocks.iter().filter(|b| !b.is_empty());
    let Some(first) = present.next() else {
        return fail(SRecordErrorKind::NoBinaryData, 0);
    };

    let mut prev = first;
    let mut end: Address = first.end();
    for block in present {
        if block.start() < prev.start() {
            return fail(SRecordErrorKind::BlocksUnordered, block.start());
        }
        if block.start() < prev.end() {
            return fail(SRecordErrorKind::OverlappingBlocks, block.start());
        }
        end = end.max(block.end());
        prev = block;
    }

    let Some(needed) = AddressWidth::needed_for(end) else {
        return fail(SRecordErrorKind::RangeExceeded, end);
    };
    if width == AddressWidth::Undefined {
        return Ok(needed);
    }
    if width < needed {
        if strict {
            return fail(SRecordErrorKind::RecordTypeTooSmall, end);
        }
        debug!(?width, ?needed, "widening address width to fit data");
        return Ok(needed);
    }
    Ok(width)
}
