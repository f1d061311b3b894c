//! Adapter error reports
//!
//! The adapter reports its error state as `E` followed by eight hex digits:
//!
//! | digits | meaning                         |
//! |--------|---------------------------------|
//! | 1      | bus status                      |
//! | 2      | last protocol error (0 = none)  |
//! | 3-4    | firmware error flags (bitset)   |
//! | 5-6    | transmit error counter          |
//! | 7-8    | receive error counter           |

use std::fmt;

use bitflags::bitflags;

/// Hex digits following the `E`
const REPORT_DIGITS: usize = 8;

/// CAN controller bus state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BusStatus {
    /// Error active, normal operation
    Active,
    /// An error counter passed the warning limit
    WarningLevel,
    /// Error passive
    BusPassive,
    /// Disconnected from the bus
    BusOff,
    /// Undocumented status digit
    Unknown(char),
}

impl BusStatus {
    fn from_digit(c: char) -> Self {
        match c {
            '0' => BusStatus::Active,
            '1' => BusStatus::WarningLevel,
            '2' => BusStatus::BusPassive,
            '3' => BusStatus::BusOff,
            other => BusStatus::Unknown(other),
        }
    }
}

impl fmt::Display for BusStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            BusStatus::Active => "Bus Active",
            BusStatus::WarningLevel => "Warning Level",
            BusStatus::BusPassive => "Bus Passive",
            BusStatus::BusOff => "Bus Off",
            BusStatus::Unknown(_) => "Unknown Bus Status",
        })
    }
}

/// Last protocol error seen on the bus
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProtocolErrorKind {
    /// No protocol error
    None,
    /// Six equal bits in a row
    BitStuffing,
    /// Fixed-form field had the wrong level
    FrameFormat,
    /// Nobody acknowledged the frame
    NoAck,
    /// Sent recessive, read back dominant
    RecessiveBit,
    /// Sent dominant, read back recessive
    DominantBit,
    /// Checksum mismatch
    Crc,
    /// Undocumented error digit
    Unknown(char),
}

impl ProtocolErrorKind {
    fn from_digit(c: char) -> Self {
        match c {
            '0' => ProtocolErrorKind::None,
            '1' => ProtocolErrorKind::BitStuffing,
            '2' => ProtocolErrorKind::FrameFormat,
            '3' => ProtocolErrorKind::NoAck,
            '4' => ProtocolErrorKind::RecessiveBit,
            '5' => ProtocolErrorKind::DominantBit,
            '6' => ProtocolErrorKind::Crc,
            other => ProtocolErrorKind::Unknown(other),
        }
    }
}

impl fmt::Display for ProtocolErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ProtocolErrorKind::None => "No error",
            ProtocolErrorKind::BitStuffing => "Bit stuffing error",
            ProtocolErrorKind::FrameFormat => "Frame format error",
            ProtocolErrorKind::NoAck => "No ACK received",
            ProtocolErrorKind::RecessiveBit => "Recessive bit error",
            ProtocolErrorKind::DominantBit => "Dominant bit error",
            ProtocolErrorKind::Crc => "CRC error",
            ProtocolErrorKind::Unknown(_) => "Unknown protocol error",
        })
    }
}

bitflags! {
    /// Firmware error flags from digits 3-4 of a report
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct FirmwareFlags: u8 {
        /// Receiving a frame failed
        const RX_FAILED = 0x01;
        /// Transmitting a frame failed
        const TX_FAILED = 0x02;
        /// The CAN transmit buffer overflowed
        const TX_BUFFER_OVERFLOW = 0x04;
        /// The USB IN buffer overflowed
        const USB_IN_OVERFLOW = 0x08;
        /// A transmission timed out
        const TX_TIMEOUT = 0x10;
    }
}

impl FirmwareFlags {
    /// Display names of the set flags, in bit order
    pub fn labels(&self) -> Vec<&'static str> {
        const LABELS: [(FirmwareFlags, &str); 5] = [
            (FirmwareFlags::RX_FAILED, "Rx Failed"),
            (FirmwareFlags::TX_FAILED, "Tx Failed"),
            (FirmwareFlags::TX_BUFFER_OVERFLOW, "CAN Tx buffer overflow"),
            (FirmwareFlags::USB_IN_OVERFLOW, "USB IN buffer overflow"),
            (FirmwareFlags::TX_TIMEOUT, "Tx Timeout"),
        ];
        LABELS
            .iter()
            .filter(|(flag, _)| self.contains(*flag))
            .map(|(_, label)| *label)
            .collect()
    }
}

/// A decoded `Exxxxxxxx` report
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ErrorReport {
    /// Controller bus state
    pub bus_status: BusStatus,
    /// Last protocol error
    pub protocol_error: ProtocolErrorKind,
    /// Firmware-level error flags
    pub firmware_flags: FirmwareFlags,
    /// Transmit error counter
    pub tx_error_count: u8,
    /// Receive error counter
    pub rx_error_count: u8,
}

impl ErrorReport {
    /// Decode the eight hex digits following the `E`
    fn from_digits(digits: &str) -> Option<Self> {
        if digits.len() != REPORT_DIGITS || !digits.chars().all(|c| c.is_ascii_hexdigit()) {
            return None;
        }
        let mut chars = digits.chars();
        let bus_status = BusStatus::from_digit(chars.next()?);
        let protocol_error = ProtocolErrorKind::from_digit(chars.next()?);
        let flags = u8::from_str_radix(&digits[2..4], 16).ok()?;

        Some(Self {
            bus_status,
            protocol_error,
            // Undefined bits are ignored for display
            firmware_flags: FirmwareFlags::from_bits_truncate(flags),
            tx_error_count: u8::from_str_radix(&digits[4..6], 16).ok()?,
            rx_error_count: u8::from_str_radix(&digits[6..8], 16).ok()?,
        })
    }
}

impl fmt::Display for ErrorReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.bus_status)?;
        if self.protocol_error != ProtocolErrorKind::None {
            write!(f, ", {}", self.protocol_error)?;
        }
        if !self.firmware_flags.is_empty() {
            write!(f, ", {}", self.firmware_flags.labels().join("+"))?;
        }
        write!(
            f,
            ", Tx Errors: {}, Rx Errors: {}",
            self.tx_error_count, self.rx_error_count
        )
    }
}

/// Find the first `E` in a reply and decode the eight digits after it
///
/// Needs at least eight characters after the `E`; shorter replies and
/// non-hex digits yield `None`.
pub fn decode_error(response: &str) -> Option<ErrorReport> {
    let pos = response.find('E')?;
    let start = pos + 1;
    let window = response.get(start..start + REPORT_DIGITS)?;
    ErrorReport::from_digits(window)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_all_clear() {
        let report = decode_error("E00000000").unwrap();
        assert_eq!(report.bus_status, BusStatus::Active);
        assert_eq!(report.protocol_error, ProtocolErrorKind::None);
        assert!(report.firmware_flags.is_empty());
        assert_eq!(report.tx_error_count, 0);
        assert_eq!(report.rx_error_count, 0);
        assert_eq!(report.to_string(), "Bus Active, Tx Errors: 0, Rx Errors: 0");
    }

    #[test]
    fn test_exactly_eight_digits_at_end() {
        // Boundary: the window ends at the last byte of the reply
        assert!(decode_error("xE00000000").is_some());
        assert!(decode_error("E0000000").is_none());
    }

    #[test]
    fn test_flags_and_counters() {
        let report = decode_error("E31050A0F").unwrap();
        assert_eq!(report.bus_status, BusStatus::BusOff);
        assert_eq!(report.protocol_error, ProtocolErrorKind::BitStuffing);
        assert_eq!(
            report.firmware_flags,
            FirmwareFlags::RX_FAILED | FirmwareFlags::TX_BUFFER_OVERFLOW
        );
        assert_eq!(report.tx_error_count, 10);
        assert_eq!(report.rx_error_count, 15);
        assert_eq!(
            report.to_string(),
            "Bus Off, Bit stuffing error, Rx Failed+CAN Tx buffer overflow, Tx Errors: 10, Rx Errors: 15"
        );
    }

    #[test]
    fn test_all_flags() {
        let report = decode_error("E201FFF80").unwrap();
        assert_eq!(report.firmware_flags, FirmwareFlags::all());
        assert_eq!(
            report.firmware_flags.labels(),
            vec![
                "Rx Failed",
                "Tx Failed",
                "CAN Tx buffer overflow",
                "USB IN buffer overflow",
                "Tx Timeout"
            ]
        );
        assert_eq!(report.tx_error_count, 255);
        assert_eq!(report.rx_error_count, 128);
    }

    #[test]
    fn test_unknown_digits() {
        let report = decode_error("E9F000000").unwrap();
        assert_eq!(report.bus_status, BusStatus::Unknown('9'));
        assert_eq!(report.protocol_error, ProtocolErrorKind::Unknown('F'));
        assert!(report.to_string().starts_with("Unknown Bus Status, Unknown protocol error"));
    }

    #[test]
    fn test_rejects_non_hex() {
        assert!(decode_error("E0000000G").is_none());
        assert!(decode_error("no report here").is_none());
    }
}
