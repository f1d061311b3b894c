//! Adapter feedback codes
//!
//! Firmware that supports feedback answers each command with `#` followed by
//! a single status character. A bare line end after the `#` means success.

/// Decoded feedback code
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedbackEvent {
    /// `#` followed by the line end
    Success,
    /// `#1`
    InvalidCommand,
    /// `#2`
    InvalidParameter,
    /// `#3`
    AdapterMustBeOpen,
    /// `#4`
    AdapterMustBeClosed,
    /// `#5`
    HalError,
    /// `#6`
    NotSupported,
    /// `#7`
    TxBufferFull,
    /// `#8`
    BusOff,
    /// `#9`
    SilentModeTxRejected,
    /// `#:`
    BaudrateNotSet,
    /// `#;`
    FlashProgrammingFailed,
    /// `#<`
    HardwareResetRequired,
    /// Any other character; carries no recognized meaning
    Unknown(char),
}

impl FeedbackEvent {
    /// Map the character following `#`
    pub fn from_code(code: char) -> Self {
        match code {
            '\r' | '\n' => FeedbackEvent::Success,
            '1' => FeedbackEvent::InvalidCommand,
            '2' => FeedbackEvent::InvalidParameter,
            '3' => FeedbackEvent::AdapterMustBeOpen,
            '4' => FeedbackEvent::AdapterMustBeClosed,
            '5' => FeedbackEvent::HalError,
            '6' => FeedbackEvent::NotSupported,
            '7' => FeedbackEvent::TxBufferFull,
            '8' => FeedbackEvent::BusOff,
            '9' => FeedbackEvent::SilentModeTxRejected,
            ':' => FeedbackEvent::BaudrateNotSet,
            ';' => FeedbackEvent::FlashProgrammingFailed,
            '<' => FeedbackEvent::HardwareResetRequired,
            other => FeedbackEvent::Unknown(other),
        }
    }

    /// Whether this is one of the documented codes
    pub fn is_recognized(&self) -> bool {
        !matches!(self, FeedbackEvent::Unknown(_))
    }

    /// Human-readable meaning, `None` for unrecognized codes
    pub fn description(&self) -> Option<&'static str> {
        let text = match self {
            FeedbackEvent::Success => "Success",
            FeedbackEvent::InvalidCommand => "Invalid command",
            FeedbackEvent::InvalidParameter => "Invalid parameter",
            FeedbackEvent::AdapterMustBeOpen => "Adapter must be open",
            FeedbackEvent::AdapterMustBeClosed => "Adapter must be closed",
            FeedbackEvent::HalError => "HAL error from ST Microelectronics",
            FeedbackEvent::NotSupported => "Feature not supported/implemented",
            FeedbackEvent::TxBufferFull => "CAN Tx buffer full - no ACK, 67 packets waiting",
            FeedbackEvent::BusOff => "CAN bus off - severe error occurred",
            FeedbackEvent::SilentModeTxRejected => "Sending not possible in silent mode",
            FeedbackEvent::BaudrateNotSet => "Baudrate not set",
            FeedbackEvent::FlashProgrammingFailed => "Flash Option Bytes programming failed",
            FeedbackEvent::HardwareResetRequired => "Hardware reset required - reconnect USB",
            FeedbackEvent::Unknown(_) => return None,
        };
        Some(text)
    }
}

/// Find the first `#` in a reply and decode the character after it
///
/// Returns `None` if there is no `#` or nothing follows it.
pub fn decode_feedback(response: &str) -> Option<FeedbackEvent> {
    let pos = response.find('#')?;
    response[pos + 1..].chars().next().map(FeedbackEvent::from_code)
}
