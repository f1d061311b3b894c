//! Link abstraction
//!
//! The session talks to the adapter through [`Link`] so that the receiver
//! thread can own an independent read handle while the interactive thread
//! keeps writing on the original.

use super::LinkError;

/// A bidirectional byte link to an SLCAN adapter
pub trait Link: Send {
    /// Read up to `max_bytes`
    ///
    /// Blocks no longer than the link's read timeout. An empty result means
    /// nothing arrived in time and is not an error.
    fn read(&mut self, max_bytes: usize) -> Result<Vec<u8>, LinkError>;

    /// Write `bytes`, returning how many were written
    ///
    /// Failures are reported to the caller; no retry is attempted.
    fn write(&mut self, bytes: &[u8]) -> Result<usize, LinkError>;

    /// Open a second handle on the same device
    fn try_clone(&self) -> Result<Box<dyn Link>, LinkError>;

    /// Device name for display
    fn name(&self) -> &str;
}
