//! Byte <-> hex digit conversion and the S-record line checksum.

const HEX_DIGITS: &[u8; 16] = b"0123456789ABCDEF";

/// One's complement of the low byte of the sum of `bytes`.
pub(crate) fn checksum(bytes: &[u8]) -> u8 {
    !bytes.iter().fold(0u8, |sum, b| sum.wrapping_add(*b))
}

/// Append the two uppercase hex digits of `byte` to `out`.
pub(crate) fn push_hex(out: &mut String, byte: u8) {
    out.push(char::from(HEX_DIGITS[usize::from(byte >> 4)]));
    out.push(char::from(HEX_DIGITS[usize::from(byte & 0x0F)]));
}

pub(crate) fn to_hex(bytes: &[u8]) -> String {
    let mut s = String::with_capacity(bytes.len() * 2);
    for b in bytes {
        push_hex(&mut s, *b);
    }
    s
}

/// Value of a single hex digit (either case).
pub(crate) const fn digit_value(ch: u8) -> Option<u8> {
    match ch {
        b'0'..=b'9' => Some(ch - b'0'),
        b'A'..=b'F' => Some(ch - b'A' + 10),
        b'a'..=b'f' => Some(ch - b'a' + 10),
        _ => None,
    }
}

/// Decode pairs of hex digits. Returns `None` on odd length or a non-hex character.
pub(crate) fn decode(chars: &[u8]) -> Option<Vec<u8>> {
    if chars.len() % 2 != 0 {
        return None;
    }
    chars
        .chunks_exact(2)
        .map(|pair| Some((digit_value(pair[0])? << 4) | digit_value(pair[1])?))
        .collect()
}
