//! Keystroke line editor

/// End of text (Ctrl+C)
pub const INTERRUPT: u8 = 0x03;
const BACKSPACE: u8 = 0x08;
const DELETE: u8 = 0x7f;

/// Result of feeding one byte to the editor
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Edit {
    /// A printable character was appended
    Insert(char),
    /// The last character was removed
    Erase,
    /// Enter was pressed; carries the finished line
    Submit(String),
    /// The operator asked to abort the session
    Interrupt,
    /// Nothing changed
    Ignored,
}

/// Single-line editor fed one byte at a time
#[derive(Debug, Default)]
pub struct LineEditor {
    buffer: String,
}

impl LineEditor {
    /// Empty editor
    pub fn new() -> Self {
        Self::default()
    }

    /// Current, unsubmitted line
    pub fn buffer(&self) -> &str {
        &self.buffer
    }

    /// Apply one input byte
    pub fn feed(&mut self, byte: u8) -> Edit {
        match byte {
            b'\r' | b'\n' => Edit::Submit(std::mem::take(&mut self.buffer)),
            BACKSPACE | DELETE => {
                if self.buffer.pop().is_some() {
                    Edit::Erase
                } else {
                    Edit::Ignored
                }
            }
            INTERRUPT => Edit::Interrupt,
            0x20..=0x7e => {
                let c = byte as char;
                self.buffer.push(c);
                Edit::Insert(c)
            }
            _ => Edit::Ignored,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn feed_all(editor: &mut LineEditor, bytes: &[u8]) -> Vec<Edit> {
        bytes.iter().map(|b| editor.feed(*b)).collect()
    }

    #[test]
    fn test_submit_line() {
        let mut editor = LineEditor::new();
        let edits = feed_all(&mut editor, b"V\r");
        assert_eq!(edits, vec![Edit::Insert('V'), Edit::Submit("V".to_string())]);
        assert_eq!(editor.buffer(), "");
    }

    #[test]
    fn test_backspace_and_delete() {
        let mut editor = LineEditor::new();
        feed_all(&mut editor, b"S7\x08");
        assert_eq!(editor.buffer(), "S");
        assert_eq!(editor.feed(DELETE), Edit::Erase);
        assert_eq!(editor.feed(DELETE), Edit::Ignored);
        assert_eq!(editor.feed(b'\n'), Edit::Submit(String::new()));
    }

    #[test]
    fn test_interrupt_and_control_bytes() {
        let mut editor = LineEditor::new();
        assert_eq!(editor.feed(0x1b), Edit::Ignored);
        assert_eq!(editor.feed(0x80), Edit::Ignored);
        assert_eq!(editor.feed(INTERRUPT), Edit::Interrupt);
    }
}
