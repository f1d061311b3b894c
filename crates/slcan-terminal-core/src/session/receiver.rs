//! Background receiver
//!
//! Polls the link on its own thread and prints whatever the adapter sends.
//! Polling is cooperative: the running flag is checked once per iteration,
//! so shutdown takes at most one read timeout plus one poll interval.

use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::{debug, trace, warn};

use super::Console;
use crate::link::Link;
use crate::protocol::split_replies;

pub(crate) struct Receiver {
    pub(crate) link: Box<dyn Link>,
    pub(crate) console: Console,
    pub(crate) running: Arc<AtomicBool>,
    pub(crate) poll_interval: Duration,
    pub(crate) batch_size: usize,
}

impl Receiver {
    pub(crate) fn spawn(self) -> io::Result<JoinHandle<()>> {
        thread::Builder::new()
            .name("slcan-rx".to_string())
            .spawn(move || self.run())
    }

    fn run(mut self) {
        debug!(device = self.link.name(), "Receiver started");
        let mut last_error: Option<String> = None;

        while self.running.load(Ordering::SeqCst) {
            match self.link.read(self.batch_size) {
                Ok(bytes) if !bytes.is_empty() => {
                    trace!(len = bytes.len(), "Received bytes");
                    let chunk = String::from_utf8_lossy(&bytes);
                    self.console.received(&split_replies(&chunk));
                    last_error = None;
                }
                Ok(_) => {}
                Err(e) => {
                    // Keep polling; only log when the failure changes
                    let message = e.to_string();
                    if last_error.as_deref() != Some(message.as_str()) {
                        warn!("Receiver read failed: {message}");
                        last_error = Some(message);
                    }
                }
            }
            thread::sleep(self.poll_interval);
        }

        debug!("Receiver stopped");
    }
}
