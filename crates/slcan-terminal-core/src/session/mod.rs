//! Interactive Session
//!
//! Ties the codec and the serial link together. A session moves through
//! `Idle -> Open -> Running -> Closed`:
//!
//! - **Open**: a link is attached. Init commands run here on a single thread,
//!   each one followed by a short wait and one read for the reply.
//! - **Running**: the interactive loop reads keystrokes while a background
//!   receiver thread polls the link and prints what arrives. Only the
//!   interactive thread writes to the link and only the receiver reads.
//! - **Closed**: the receiver has been joined, console input restored and the
//!   link released.
//!
//! The shared running flag is the only cancellation signal. It is cleared by
//! a quit word, the interrupt key, end of input, or externally through
//! [`Session::running_flag`].

mod console;
mod editor;
mod receiver;

pub use console::{Console, PROMPT};
pub use editor::{Edit, LineEditor, INTERRUPT};

use std::io::{self, Read};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::TerminalConfig;
use crate::link::{Link, LinkError, SerialLink};
use crate::protocol::{split_replies, translate_shorthand, SlcanCommand, Translation};
use receiver::Receiver;

/// Session lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// No link attached yet
    Idle,
    /// Link usable, no receiver running
    Open,
    /// Interactive loop and receiver active
    Running,
    /// Finished; terminal state
    Closed,
}

/// Errors that can occur while driving a session
#[derive(Error, Debug)]
pub enum SessionError {
    /// The operation needs a different lifecycle state
    #[error("Operation not allowed while session is {0:?}")]
    InvalidState(SessionState),

    /// The serial link failed
    #[error(transparent)]
    Link(#[from] LinkError),

    /// The receiver thread could not be started
    #[error("Failed to start receiver: {0}")]
    Spawn(io::Error),

    /// Reading keystrokes failed
    #[error("Failed to read input: {0}")]
    Input(io::Error),
}

/// How reading one input line ended
enum LineOutcome {
    Line(String),
    Interrupt,
    EndOfInput,
    /// The running flag was cleared while waiting for keys
    Stopped,
    Failed(io::Error),
}

/// One terminal session against one adapter
pub struct Session {
    config: TerminalConfig,
    console: Console,
    running: Arc<AtomicBool>,
    state: SessionState,
    link: Option<Box<dyn Link>>,
}

impl Session {
    /// New idle session
    pub fn new(config: TerminalConfig, console: Console) -> Self {
        Self {
            config,
            console,
            running: Arc::new(AtomicBool::new(true)),
            state: SessionState::Idle,
            link: None,
        }
    }

    /// Current lifecycle state
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Flag shared with the receiver; clearing it ends the session
    pub fn running_flag(&self) -> Arc<AtomicBool> {
        self.running.clone()
    }

    /// Whether termination has not been requested yet
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Request termination
    pub fn stop(&self) {
        self.running.store(false, Ordering::SeqCst);
    }

    /// Open the serial device at `path` and attach it
    pub fn open(&mut self, path: &str) -> Result<(), SessionError> {
        self.expect_state(SessionState::Idle)?;
        let link = SerialLink::open_with(path, &self.config.link_settings())?;
        self.attach(Box::new(link))
    }

    /// Attach an already opened link
    pub fn attach(&mut self, link: Box<dyn Link>) -> Result<(), SessionError> {
        self.expect_state(SessionState::Idle)?;
        debug!(device = link.name(), "Link attached");
        self.link = Some(link);
        self.state = SessionState::Open;
        Ok(())
    }

    fn expect_state(&self, expected: SessionState) -> Result<(), SessionError> {
        if self.state == expected {
            Ok(())
        } else {
            Err(SessionError::InvalidState(self.state))
        }
    }

    fn link_mut(&mut self) -> Result<&mut Box<dyn Link>, SessionError> {
        let state = self.state;
        self.link.as_mut().ok_or(SessionError::InvalidState(state))
    }

    /// Translate `text` if it is shorthand, frame it and write it
    ///
    /// Translation and write failures are shown on the console; the write
    /// failure is also returned so the caller may react, but the session
    /// stays usable either way.
    pub fn send_command(&mut self, text: &str, show: bool) -> Result<SlcanCommand, SessionError> {
        let translation = translate_shorthand(text);
        if let Translation::Rejected { error, .. } = &translation {
            self.console.error(&error.to_string());
        }
        let command = SlcanCommand::new(translation.text());

        let console = self.console.clone();
        let link = self.link_mut()?;
        match link.write(command.as_bytes()) {
            Ok(written) => {
                debug!(command = %command, written, "Command sent");
                if show {
                    console.transmitted(&command);
                }
                Ok(command)
            }
            Err(e) => {
                console.error(&format!("write: {e}"));
                Err(e.into())
            }
        }
    }

    /// Send each init command in order and print the adapter's replies
    ///
    /// Strictly sequential: every command is followed by the settle delay,
    /// the response wait and a single read. Stops early if the session is
    /// asked to terminate.
    pub fn run_init_commands(&mut self, commands: &[String]) -> Result<(), SessionError> {
        self.expect_state(SessionState::Open)?;
        if commands.is_empty() {
            return Ok(());
        }

        self.console.line("\n=== Sending initialization commands ===");

        for command in commands {
            if !self.is_running() {
                info!("Initialization interrupted");
                break;
            }

            self.console.init_command(command);
            // Write failures were already reported; still listen for a reply
            let _ = self.send_command(command, false);

            thread::sleep(self.config.init_settle());
            thread::sleep(self.config.init_response_wait());

            let batch = self.config.rx_batch_size;
            let reply = self.link_mut()?.read(batch);
            match reply {
                Ok(bytes) if !bytes.is_empty() => {
                    let chunk = String::from_utf8_lossy(&bytes);
                    for reply in split_replies(&chunk) {
                        self.console.init_response(&reply);
                    }
                }
                Ok(_) => {}
                Err(e) => warn!(command = %command, "No reply to init command: {e}"),
            }
        }

        self.console.line("=== Initialization complete ===\n");
        Ok(())
    }

    /// Run the interactive loop until quit, interrupt, end of input or an
    /// external stop
    ///
    /// `input` supplies keystrokes (normally [`crate::terminal::RawStdin`]).
    /// A read failing with `TimedOut`, `WouldBlock` or `Interrupted` is a
    /// wait without input; the running flag is checked and the read retried.
    /// The input is dropped after the receiver has been joined, which
    /// restores the console settings. The link is closed before returning.
    pub fn run_interactive<R: Read>(&mut self, mut input: R) -> Result<(), SessionError> {
        self.expect_state(SessionState::Open)?;

        let reader = self.link_mut()?.try_clone()?;
        let device = reader.name().to_string();
        let receiver = Receiver {
            link: reader,
            console: self.console.clone(),
            running: self.running.clone(),
            poll_interval: self.config.poll_interval(),
            batch_size: self.config.rx_batch_size,
        };
        let handle = receiver.spawn().map_err(SessionError::Spawn)?;
        self.state = SessionState::Running;

        self.console.line("\n=== SLCAN Terminal ===");
        self.console.line(&format!("Connected to: {device}"));
        self.console
            .line("Commands: Enter SLCAN commands (e.g., 'V' for version, 'O' to open)");
        self.console.line(&format!(
            "Special: {} to close, Ctrl+C to abort",
            self.config
                .quit_words
                .iter()
                .map(|w| format!("'{w}'"))
                .collect::<Vec<_>>()
                .join(" or ")
        ));
        self.console.line("======================\n");

        let mut editor = LineEditor::new();
        let mut failure = None;

        while self.is_running() {
            self.console.prompt();

            match self.read_line(&mut input, &mut editor) {
                LineOutcome::Line(line) => {
                    if !self.is_running() {
                        break;
                    }
                    if line.is_empty() {
                        continue;
                    }
                    if self.config.is_quit_word(&line) {
                        break;
                    }
                    // Reported on the console; the loop carries on
                    let _ = self.send_command(&line, true);
                }
                LineOutcome::Interrupt => {
                    debug!("Interrupt key received");
                    break;
                }
                LineOutcome::EndOfInput => {
                    debug!("End of input");
                    break;
                }
                LineOutcome::Stopped => {
                    info!("Termination requested");
                    break;
                }
                LineOutcome::Failed(e) => {
                    failure = Some(e);
                    break;
                }
            }
        }

        self.stop();
        if handle.join().is_err() {
            warn!("Receiver thread panicked");
        }
        drop(input);
        self.close();
        self.console.line("\nTerminal closed.");

        match failure {
            Some(e) => Err(SessionError::Input(e)),
            None => Ok(()),
        }
    }

    fn read_line<R: Read>(&self, input: &mut R, editor: &mut LineEditor) -> LineOutcome {
        let mut byte = [0u8; 1];
        loop {
            match input.read(&mut byte) {
                Ok(0) => return LineOutcome::EndOfInput,
                Ok(_) => match editor.feed(byte[0]) {
                    Edit::Insert(c) => self.console.echo(c.encode_utf8(&mut [0u8; 4])),
                    Edit::Erase => self.console.echo("\x08 \x08"),
                    Edit::Submit(line) => {
                        self.console.echo("\n");
                        return LineOutcome::Line(line);
                    }
                    Edit::Interrupt => return LineOutcome::Interrupt,
                    Edit::Ignored => {}
                },
                // Timed-out waits let an external stop end the session
                Err(e)
                    if matches!(
                        e.kind(),
                        io::ErrorKind::Interrupted
                            | io::ErrorKind::TimedOut
                            | io::ErrorKind::WouldBlock
                    ) =>
                {
                    if !self.is_running() {
                        return LineOutcome::Stopped;
                    }
                }
                Err(e) => return LineOutcome::Failed(e),
            }
        }
    }

    /// Stop the session and release the link
    ///
    /// Dropping a [`SerialLink`] restores the device's previous settings.
    pub fn close(&mut self) {
        self.stop();
        if let Some(link) = self.link.take() {
            debug!(device = link.name(), "Closing link");
        }
        self.state = SessionState::Closed;
    }
}
