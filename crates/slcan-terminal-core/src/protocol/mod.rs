//! SLCAN Protocol Translation
//!
//! Pure text transforms between the operator's shorthand and the adapter's
//! ASCII wire syntax, plus decoding of the adapter's feedback codes and
//! error reports.
//!
//! Nothing in this module performs I/O.

mod command;
mod error;
pub mod error_report;
pub mod feedback;
mod length;
mod reply;
pub mod shorthand;

pub use command::SlcanCommand;
pub use error::CodecError;
pub use error_report::{decode_error, BusStatus, ErrorReport, FirmwareFlags, ProtocolErrorKind};
pub use feedback::{decode_feedback, FeedbackEvent};
pub use length::{encode_length, LengthCode};
pub use reply::{describe_reply, split_replies, Reply};
pub use shorthand::{translate_shorthand, PacketType, ShorthandFrame, Translation};

/// Message separator used by the adapter in both directions
pub const MESSAGE_SEPARATOR: char = '\r';

/// Largest payload a CAN-FD frame can carry
pub const MAX_PAYLOAD_BYTES: usize = 64;

/// Hex digits in a standard (11-bit) identifier
pub const STANDARD_ID_WIDTH: usize = 3;

/// Hex digits in an extended (29-bit) identifier
pub const EXTENDED_ID_WIDTH: usize = 8;
