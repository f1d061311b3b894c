//! Data length codes
//!
//! Classic CAN carries the byte count directly as `0`-`8`. CAN-FD extends the
//! single code character with `9`-`F`, each covering a bucket of byte counts.

use std::fmt;

use super::{CodecError, MAX_PAYLOAD_BYTES};

/// Upper bound of each CAN-FD bucket, indexed from code `9`
const FD_BUCKETS: [(usize, char); 7] = [
    (12, '9'),
    (16, 'A'),
    (20, 'B'),
    (24, 'C'),
    (32, 'D'),
    (48, 'E'),
    (64, 'F'),
];

/// Single-character SLCAN length code
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LengthCode(char);

impl LengthCode {
    /// Parse a code character as sent by the adapter (hex digits, either case)
    pub fn from_char(c: char) -> Option<Self> {
        let upper = c.to_ascii_uppercase();
        match upper {
            '0'..='9' | 'A'..='F' => Some(Self(upper)),
            _ => None,
        }
    }

    /// The code character
    pub fn as_char(self) -> char {
        self.0
    }

    /// Largest number of bytes a frame with this code can carry
    pub fn capacity(self) -> usize {
        match self.0 {
            c @ '0'..='8' => c as usize - '0' as usize,
            c => FD_BUCKETS
                .iter()
                .find(|(_, code)| *code == c)
                .map(|(max, _)| *max)
                .unwrap_or(MAX_PAYLOAD_BYTES),
        }
    }
}

impl fmt::Display for LengthCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Map a payload byte count to its length code
///
/// Counts above 8 round up to the next CAN-FD bucket. Counts above 64 are
/// rejected.
pub fn encode_length(byte_count: usize) -> Result<LengthCode, CodecError> {
    if byte_count <= 8 {
        // 0..=8 is a single decimal digit
        let digit = char::from(b'0' + byte_count as u8);
        return Ok(LengthCode(digit));
    }

    FD_BUCKETS
        .iter()
        .find(|(max, _)| byte_count <= *max)
        .map(|(_, code)| LengthCode(*code))
        .ok_or(CodecError::InvalidLength(byte_count))
}
