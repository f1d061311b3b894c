//! Outbound command framing

use std::fmt;

use super::MESSAGE_SEPARATOR;

/// A command ready for the wire, always terminated by exactly one `\r`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlcanCommand(String);

impl SlcanCommand {
    /// Frame `text` as a command
    ///
    /// Any run of trailing CR/LF characters is replaced by a single `\r`.
    pub fn new(text: &str) -> Self {
        let mut line = text.trim_end_matches(['\r', '\n']).to_string();
        line.push(MESSAGE_SEPARATOR);
        Self(line)
    }

    /// The command including its terminator
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The command without its terminator, for display
    pub fn body(&self) -> &str {
        self.0.trim_end_matches(MESSAGE_SEPARATOR)
    }

    /// Wire bytes, terminator included
    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }
}

impl fmt::Display for SlcanCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.body())
    }
}
