//! Shared display surface
//!
//! Both the interactive thread and the receiver write here. Every call emits
//! one whole message under the lock, so messages are never torn, but the
//! order between the two threads is not fixed.

use std::io::{self, Write};
use std::sync::{Arc, Mutex, MutexGuard};

use crate::protocol::{Reply, SlcanCommand};

/// Erase the current line before printing a received message over a prompt
const CLEAR_LINE: &str = "\r\x1b[K";

/// Prompt shown while waiting for input
pub const PROMPT: &str = "> ";

/// Cloneable handle to the terminal output
#[derive(Clone)]
pub struct Console {
    out: Arc<Mutex<Box<dyn Write + Send>>>,
}

impl Console {
    /// Console writing to any sink
    pub fn new(out: impl Write + Send + 'static) -> Self {
        Self {
            out: Arc::new(Mutex::new(Box::new(out))),
        }
    }

    /// Console writing to standard output
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }

    fn lock(&self) -> MutexGuard<'_, Box<dyn Write + Send>> {
        self.out.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn emit(&self, text: &str) {
        let mut out = self.lock();
        let _ = out.write_all(text.as_bytes());
        let _ = out.flush();
    }

    /// Print a full line
    pub fn line(&self, text: &str) {
        self.emit(&format!("{text}\n"));
    }

    /// Show the input prompt
    pub fn prompt(&self) {
        self.emit(PROMPT);
    }

    /// Echo typed text
    pub fn echo(&self, text: &str) {
        self.emit(text);
    }

    /// Report a recoverable error
    pub fn error(&self, message: &str) {
        self.line(&format!("Error: {message}"));
    }

    /// Echo a command that was sent
    pub fn transmitted(&self, command: &SlcanCommand) {
        self.line(&format!("[TX] {command}"));
    }

    /// Print messages from the receiver and redraw the prompt
    pub fn received(&self, replies: &[Reply]) {
        let mut text = String::new();
        for reply in replies {
            text.push_str(&format!("{CLEAR_LINE}[RX] {reply}\n"));
        }
        text.push_str(PROMPT);
        self.emit(&text);
    }

    /// Show an init command before it is sent
    pub fn init_command(&self, command: &str) {
        self.line(&format!("[INIT] {command}"));
    }

    /// Show a reply to an init command
    pub fn init_response(&self, reply: &Reply) {
        self.line(&format!("[RESP] {reply}"));
    }
}
