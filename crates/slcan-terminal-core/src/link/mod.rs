//! Serial Link
//!
//! Owns the connection to the SLCAN adapter: opening and configuring the TTY,
//! timed reads, writes, and restoring the device on close.

mod channel;
pub mod discovery;
mod error;
pub mod serial;

pub use channel::Link;
pub use discovery::{find_slcan_device, find_slcan_device_in, SERIAL_BY_ID_DIR};
pub use error::LinkError;
pub use serial::{LinkSettings, SerialLink, DEFAULT_BAUD_RATE, DEFAULT_READ_TIMEOUT_MS};
