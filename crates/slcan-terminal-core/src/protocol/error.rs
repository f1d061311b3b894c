//! Codec errors

use thiserror::Error;

/// Errors raised while translating shorthand frames
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    /// First character is not a frame type
    #[error("Invalid packet type '{0}' (use t,T,r,R,d,D,b,B)")]
    InvalidPacketType(char),

    /// Data or identifier contains a non-hex character
    #[error("Invalid hex {field}: {text}")]
    InvalidHex {
        /// Which part was malformed
        field: &'static str,
        /// The offending text
        text: String,
    },

    /// Data has an odd number of hex digits
    #[error("Data must have even number of hex digits (got {0})")]
    OddLength(usize),

    /// Payload exceeds 64 bytes
    #[error("Data too long: {0} bytes (max 64 bytes)")]
    TooLong(usize),

    /// Identifier has more digits than the frame type allows
    #[error("CAN ID too long: {actual} hex digits (max {width})")]
    IdTooLong {
        /// Digits allowed
        width: usize,
        /// Digits given
        actual: usize,
    },

    /// Byte count has no length code
    #[error("Invalid length: {0} bytes cannot be encoded (max 64)")]
    InvalidLength(usize),
}
