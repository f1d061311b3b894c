//! Shorthand frame translation
//!
//! Operators type frames as `<type><id>#<data>`, in the style of `cansend`.
//! The adapter expects the identifier zero-padded to its full width and an
//! explicit length code, so `t123#DEADBEEF` goes out as `t12304DEADBEEF`.
//!
//! Text without a `#` is assumed to already be wire syntax and is left alone.

use tracing::debug;

use super::{encode_length, CodecError, EXTENDED_ID_WIDTH, MAX_PAYLOAD_BYTES, STANDARD_ID_WIDTH};

/// Frame type selected by the first character of a frame command
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PacketType {
    /// `t` - classic data frame, standard id
    Data,
    /// `T` - classic data frame, extended id
    DataExtended,
    /// `r` - remote frame, standard id
    Remote,
    /// `R` - remote frame, extended id
    RemoteExtended,
    /// `d` - CAN-FD frame, standard id
    Fd,
    /// `D` - CAN-FD frame, extended id
    FdExtended,
    /// `b` - CAN-FD frame with bit-rate switch, standard id
    FdBrs,
    /// `B` - CAN-FD frame with bit-rate switch, extended id
    FdBrsExtended,
}

impl PacketType {
    /// Look up the packet type for a command character
    pub fn from_char(c: char) -> Option<Self> {
        match c {
            't' => Some(PacketType::Data),
            'T' => Some(PacketType::DataExtended),
            'r' => Some(PacketType::Remote),
            'R' => Some(PacketType::RemoteExtended),
            'd' => Some(PacketType::Fd),
            'D' => Some(PacketType::FdExtended),
            'b' => Some(PacketType::FdBrs),
            'B' => Some(PacketType::FdBrsExtended),
            _ => None,
        }
    }

    /// The command character
    pub fn as_char(self) -> char {
        match self {
            PacketType::Data => 't',
            PacketType::DataExtended => 'T',
            PacketType::Remote => 'r',
            PacketType::RemoteExtended => 'R',
            PacketType::Fd => 'd',
            PacketType::FdExtended => 'D',
            PacketType::FdBrs => 'b',
            PacketType::FdBrsExtended => 'B',
        }
    }

    /// Whether the frame uses a 29-bit identifier
    pub fn is_extended(self) -> bool {
        matches!(
            self,
            PacketType::DataExtended
                | PacketType::RemoteExtended
                | PacketType::FdExtended
                | PacketType::FdBrsExtended
        )
    }

    /// Number of hex digits the identifier occupies on the wire
    pub fn id_width(self) -> usize {
        if self.is_extended() {
            EXTENDED_ID_WIDTH
        } else {
            STANDARD_ID_WIDTH
        }
    }

    /// Remote transmission request
    pub fn is_remote(self) -> bool {
        matches!(self, PacketType::Remote | PacketType::RemoteExtended)
    }

    /// CAN-FD frame, with or without bitrate switch
    pub fn is_fd(self) -> bool {
        matches!(
            self,
            PacketType::Fd | PacketType::FdExtended | PacketType::FdBrs | PacketType::FdBrsExtended
        )
    }

    /// CAN-FD frame sent with bitrate switching
    pub fn has_bitrate_switch(self) -> bool {
        matches!(self, PacketType::FdBrs | PacketType::FdBrsExtended)
    }
}

/// A validated shorthand frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShorthandFrame {
    /// Frame type
    pub packet_type: PacketType,
    /// Identifier hex digits as typed (unpadded)
    pub id: String,
    /// Payload hex digits with separators removed
    pub data: String,
}

impl ShorthandFrame {
    /// Parse `<type><id>#<data>`
    ///
    /// Returns `Ok(None)` when the text contains no `#`. Dots and spaces in
    /// the data part are separators and are dropped.
    pub fn parse(input: &str) -> Result<Option<Self>, CodecError> {
        let Some(hash_pos) = input.find('#') else {
            return Ok(None);
        };

        let first = input.chars().next().unwrap_or('#');
        let packet_type = PacketType::from_char(first).ok_or(CodecError::InvalidPacketType(first))?;

        // The type character is ASCII, so byte offset 1 is a char boundary
        let id_text = &input[1..hash_pos];
        let data_text = &input[hash_pos + 1..];

        let data: String = data_text.chars().filter(|c| *c != '.' && *c != ' ').collect();

        if !data.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(CodecError::InvalidHex {
                field: "data",
                text: data,
            });
        }

        if data.len() % 2 != 0 {
            return Err(CodecError::OddLength(data.len()));
        }

        let byte_count = data.len() / 2;
        if byte_count > MAX_PAYLOAD_BYTES {
            return Err(CodecError::TooLong(byte_count));
        }

        let width = packet_type.id_width();
        let id_len = id_text.chars().count();
        if id_len > width {
            return Err(CodecError::IdTooLong {
                width,
                actual: id_len,
            });
        }

        if !id_text.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(CodecError::InvalidHex {
                field: "CAN ID",
                text: id_text.to_string(),
            });
        }

        Ok(Some(Self {
            packet_type,
            id: id_text.to_string(),
            data,
        }))
    }

    /// Payload size in bytes
    pub fn byte_count(&self) -> usize {
        self.data.len() / 2
    }

    /// Render the frame in wire syntax (without the trailing carriage return)
    pub fn encode(&self) -> Result<String, CodecError> {
        let width = self.packet_type.id_width();
        let code = encode_length(self.byte_count())?;

        let mut out = String::with_capacity(1 + width + 2 + self.data.len());
        out.push(self.packet_type.as_char());
        out.push_str(&format!("{:0>width$}", self.id, width = width));
        // With a payload the length is a zero-led two-character field
        if !self.data.is_empty() {
            out.push('0');
        }
        out.push(code.as_char());
        out.push_str(&self.data);
        Ok(out)
    }
}

/// Outcome of translating one line of operator input
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Translation {
    /// No `#` present; the text is sent as typed
    Passthrough(String),
    /// A shorthand frame rewritten into wire syntax
    Encoded(String),
    /// Malformed shorthand; the original text is kept so the session can go on
    Rejected { original: String, error: CodecError },
}

impl Translation {
    /// Text to put on the wire
    pub fn text(&self) -> &str {
        match self {
            Translation::Passthrough(text) | Translation::Encoded(text) => text,
            Translation::Rejected { original, .. } => original,
        }
    }

    /// Owned version of [`Translation::text`]
    pub fn into_text(self) -> String {
        match self {
            Translation::Passthrough(text) | Translation::Encoded(text) => text,
            Translation::Rejected { original, .. } => original,
        }
    }

    /// The translation error, if the shorthand was malformed
    pub fn error(&self) -> Option<&CodecError> {
        match self {
            Translation::Rejected { error, .. } => Some(error),
            _ => None,
        }
    }
}

/// Translate shorthand to wire syntax
///
/// Failures never abort: a malformed frame comes back as
/// [`Translation::Rejected`] carrying the untouched input.
pub fn translate_shorthand(input: &str) -> Translation {
    let result = ShorthandFrame::parse(input).and_then(|frame| match frame {
        Some(frame) => frame.encode().map(Some),
        None => Ok(None),
    });

    match result {
        Ok(None) => Translation::Passthrough(input.to_string()),
        Ok(Some(encoded)) => {
            debug!(input, encoded = %encoded, "Translated shorthand frame");
            Translation::Encoded(encoded)
        }
        Err(error) => Translation::Rejected {
            original: input.to_string(),
            error,
        },
    }
}
