//! Splitting and annotating adapter replies

use std::fmt;

use super::{decode_error, decode_feedback, MESSAGE_SEPARATOR};

/// One adapter message ready for display
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    /// Message text with trailing line ends removed
    pub text: String,
    /// Decoded meaning of a feedback code or error report
    pub annotation: Option<String>,
}

impl Reply {
    /// Build a reply from one raw message, terminator included if present
    pub fn from_raw(raw: &str) -> Self {
        Self {
            text: raw.trim_end_matches(['\r', '\n']).to_string(),
            annotation: describe_reply(raw),
        }
    }
}

impl fmt::Display for Reply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)?;
        if let Some(annotation) = &self.annotation {
            write!(f, " ({annotation})")?;
        }
        Ok(())
    }
}

/// Decode a feedback code, falling back to an error report
///
/// Unrecognized feedback codes count as no feedback.
pub fn describe_reply(message: &str) -> Option<String> {
    decode_feedback(message)
        .and_then(|event| event.description())
        .map(str::to_string)
        .or_else(|| decode_error(message).map(|report| report.to_string()))
}

/// Split a received chunk into messages
///
/// The decoders see each message with its `\r` still attached so that a
/// success code (`#` directly followed by the terminator) is recognized.
/// Messages that are empty once line ends are removed are dropped.
pub fn split_replies(chunk: &str) -> Vec<Reply> {
    chunk
        .split_inclusive(MESSAGE_SEPARATOR)
        .map(Reply::from_raw)
        .filter(|reply| !reply.text.is_empty())
        .collect()
}
