//! UTF-8 code point extraction at arbitrary byte offsets.
//!
//! The parser advances its cursor independently of the helpers that peek
//! ahead, so [`decode`] accepts offsets that land inside a multi-byte
//! sequence. It walks back to the sequence head, decodes the whole code
//! point, and reports how many bytes remain from the probed offset to the
//! start of the next code point.

use std::fmt;

#[cfg(test)]
#[path = "./rune_tests.rs"]
mod tests;

/// Longest UTF-8 sequence.
const MAX_SEQUENCE: usize = 4;

/// One decoded code point plus the number of source bytes that remain from
/// the probed offset to the next code point.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub struct Rune {
    /// The decoded code point. `'\0'` for the end sentinel.
    pub ch: char,
    /// Bytes to advance to reach the next code point. Zero only for
    /// [`Rune::END`].
    pub width: u32,
}

impl Rune {
    /// End-of-input sentinel, produced at the end of the buffer and at a NUL byte.
    pub const END: Rune = Rune {
        ch: '\0',
        width: 0,
    };

    /// Returns `true` for the end-of-input sentinel.
    #[inline]
    pub fn is_end(&self) -> bool {
        self.width == 0
    }
}

/// Reasons a byte sequence is not valid UTF-8.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum DecodeError {
    /// The byte at the sequence head cannot start a sequence.
    InvalidLead {
        /// Offset of the offending byte.
        offset: usize,
    },
    /// A continuation byte was expected but something else was found, or the
    /// buffer ended inside a sequence.
    Truncated {
        /// Offset of the sequence head.
        offset: usize,
    },
    /// The encoded value is an overlong form, a surrogate, or beyond U+10FFFF.
    InvalidCodePoint {
        /// Offset of the sequence head.
        offset: usize,
    },
    /// Walking back from a continuation byte did not find a sequence head
    /// that covers it.
    NoSequenceStart {
        /// The probed offset.
        offset: usize,
    },
}

impl DecodeError {
    /// Byte offset the error refers to.
    pub fn offset(&self) -> usize {
        match *self {
            Self::InvalidLead { offset }
            | Self::Truncated { offset }
            | Self::InvalidCodePoint { offset }
            | Self::NoSequenceStart { offset } => offset,
        }
    }
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidLead { offset } => write!(f, "invalid lead byte at offset {offset}"),
            Self::Truncated { offset } => write!(f, "truncated sequence at offset {offset}"),
            Self::InvalidCodePoint { offset } => {
                write!(f, "invalid code point at offset {offset}")
            }
            Self::NoSequenceStart { offset } => {
                write!(f, "no sequence start before offset {offset}")
            }
        }
    }
}

#[inline]
fn is_continuation(b: u8) -> bool {
    b & 0xC0 == 0x80
}

/// Length of the sequence introduced by `lead`, or `None` if `lead` cannot
/// start a sequence.
#[inline]
fn sequence_len(lead: u8) -> Option<usize> {
    match lead {
        0x00..=0x7F => Some(1),
        0xC0..=0xDF => Some(2),
        0xE0..=0xEF => Some(3),
        0xF0..=0xF7 => Some(4),
        _ => None,
    }
}

/// Decodes the code point covering `bytes[offset]`.
///
/// Returns [`Rune::END`] when `offset` is past the end of `bytes` or when the
/// byte at `offset` is NUL. When `offset` points at a continuation byte the
/// decoder walks back at most three bytes to the sequence head; the returned
/// width then counts only the bytes from `offset` to the next code point.
pub fn decode(bytes: &[u8], offset: usize) -> Result<Rune, DecodeError> {
    let Some(&probe) = bytes.get(offset) else {
        return Ok(Rune::END);
    };
    if probe == 0 {
        return Ok(Rune::END);
    }
    if probe < 0x80 {
        return Ok(Rune {
            ch: probe as char,
            width: 1,
        });
    }

    let mut start = offset;
    while is_continuation(bytes[start]) {
        if offset - start == MAX_SEQUENCE - 1 || start == 0 {
            return Err(DecodeError::NoSequenceStart { offset });
        }
        start -= 1;
    }

    let lead = bytes[start];
    let Some(len) = sequence_len(lead) else {
        return Err(DecodeError::InvalidLead { offset: start });
    };
    if start + len <= offset {
        // The head found belongs to an earlier, shorter sequence.
        return Err(DecodeError::NoSequenceStart { offset });
    }
    if start + len > bytes.len() {
        return Err(DecodeError::Truncated { offset: start });
    }

    let mut value = match len {
        1 => u32::from(lead),
        2 => u32::from(lead & 0x1F),
        3 => u32::from(lead & 0x0F),
        _ => u32::from(lead & 0x07),
    };
    for &b in &bytes[start + 1..start + len] {
        if !is_continuation(b) {
            return Err(DecodeError::Truncated { offset: start });
        }
        value = (value << 6) | u32::from(b & 0x3F);
    }

    let min = match len {
        2 => 0x80,
        3 => 0x800,
        _ => 0x1_0000,
    };
    if value < min {
        return Err(DecodeError::InvalidCodePoint { offset: start });
    }
    let Some(ch) = char::from_u32(value) else {
        return Err(DecodeError::InvalidCodePoint { offset: start });
    };

    Ok(Rune {
        ch,
        width: (len - (offset - start)) as u32,
    })
}
