//! Serial link errors

use thiserror::Error;

/// Errors that can occur while opening or using the adapter's serial link
#[derive(Error, Debug)]
pub enum LinkError {
    /// Nothing exists at the path
    #[error("Device not found: {0}")]
    DeviceNotFound(String),

    /// The path exists but is not a character device
    #[error("{0} is not a character device")]
    NotACharacterDevice(String),

    /// Another process holds the device exclusively
    #[error("Cannot get exclusive access to {0} (port already in use?)")]
    DeviceBusy(String),

    /// The device has no terminal attributes
    #[error("{0} - cannot get terminal attributes (not a TTY?)")]
    NotATerminal(String),

    /// Line settings could not be applied
    #[error("Failed to configure {path}: {reason}")]
    Configuration {
        /// Device path
        path: String,
        /// Why the settings were refused
        reason: String,
    },

    /// Writing to the adapter failed
    #[error("Write error: {0}")]
    Write(String),

    /// Reading from the adapter failed
    #[error("Read error: {0}")]
    Read(String),

    /// The link was already closed
    #[error("Link is closed")]
    Closed,

    /// Any other I/O failure
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl LinkError {
    /// Whether the error happened while opening the device
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            LinkError::DeviceNotFound(_)
                | LinkError::NotACharacterDevice(_)
                | LinkError::DeviceBusy(_)
                | LinkError::NotATerminal(_)
                | LinkError::Configuration { .. }
        )
    }
}
