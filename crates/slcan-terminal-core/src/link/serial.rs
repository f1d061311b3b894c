//! Serial port handling
//!
//! Opens the adapter's TTY with exclusive access and the fixed SLCAN line
//! settings, and puts the device's previous line discipline back when the
//! link is closed or dropped.

use serialport::{ClearBuffer, DataBits, FlowControl, Parity, SerialPort, StopBits, TTYPort};
use std::fs::OpenOptions;
use std::io::{self, Read, Write};
use std::os::unix::fs::{FileTypeExt, OpenOptionsExt};
use std::os::unix::io::AsRawFd;
use std::time::Duration;
use tracing::{debug, warn};

use super::{Link, LinkError};
use crate::terminal::{get_attributes, set_attributes};

/// Default baud rate for SLCAN adapters
pub const DEFAULT_BAUD_RATE: u32 = 115200;

/// Longest a read waits for the first byte
pub const DEFAULT_READ_TIMEOUT_MS: u64 = 100;

/// Line settings applied on open
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LinkSettings {
    /// Line speed in baud
    pub baud_rate: u32,
    /// Longest a read waits for the first byte
    pub read_timeout: Duration,
}

impl Default for LinkSettings {
    fn default() -> Self {
        Self {
            baud_rate: DEFAULT_BAUD_RATE,
            read_timeout: Duration::from_millis(DEFAULT_READ_TIMEOUT_MS),
        }
    }
}

/// Exclusive, configured connection to an SLCAN adapter
///
/// The previous terminal settings are restored on [`SerialLink::close`] and
/// on drop.
pub struct SerialLink {
    path: String,
    port: Option<TTYPort>,
    prior: libc::termios,
}

impl SerialLink {
    /// Open `path` with the default settings (115200 8N1, 100ms read timeout)
    pub fn open(path: &str) -> Result<Self, LinkError> {
        Self::open_with(path, &LinkSettings::default())
    }

    /// Open `path` with explicit settings
    pub fn open_with(path: &str, settings: &LinkSettings) -> Result<Self, LinkError> {
        let metadata = std::fs::metadata(path).map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => LinkError::DeviceNotFound(path.to_string()),
            _ => LinkError::Io(e),
        })?;
        if !metadata.file_type().is_char_device() {
            return Err(LinkError::NotACharacterDevice(path.to_string()));
        }

        let prior = capture_prior_settings(path)?;

        let mut port = serialport::new(path, settings.baud_rate)
            .data_bits(DataBits::Eight)
            .parity(Parity::None)
            .stop_bits(StopBits::One)
            .flow_control(FlowControl::None)
            .timeout(settings.read_timeout)
            .open_native()
            .map_err(|e| open_error(path, e))?;

        // Drop anything the adapter sent before we were listening
        port.clear(ClearBuffer::All)
            .map_err(|e| LinkError::Configuration {
                path: path.to_string(),
                reason: e.to_string(),
            })?;

        debug!(
            path,
            baud_rate = settings.baud_rate,
            timeout_ms = settings.read_timeout.as_millis() as u64,
            "Serial link opened"
        );

        Ok(Self {
            path: path.to_string(),
            port: Some(port),
            prior,
        })
    }

    /// Device path the link was opened with
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Whether the device is still held
    pub fn is_open(&self) -> bool {
        self.port.is_some()
    }

    /// Restore the previous line settings and release the device
    ///
    /// Safe to call more than once.
    pub fn close(&mut self) {
        if let Some(port) = self.port.take() {
            if let Err(e) = set_attributes(port.as_raw_fd(), &self.prior) {
                warn!(path = %self.path, "Failed to restore serial settings: {e}");
            }
            drop(port);
            debug!(path = %self.path, "Serial link closed");
        }
    }

    fn port_mut(&mut self) -> Result<&mut TTYPort, LinkError> {
        self.port.as_mut().ok_or(LinkError::Closed)
    }
}

impl Drop for SerialLink {
    fn drop(&mut self) {
        self.close();
    }
}

impl Link for SerialLink {
    fn read(&mut self, max_bytes: usize) -> Result<Vec<u8>, LinkError> {
        read_port(self.port_mut()?, max_bytes)
    }

    fn write(&mut self, bytes: &[u8]) -> Result<usize, LinkError> {
        write_port(self.port_mut()?, bytes)
    }

    fn try_clone(&self) -> Result<Box<dyn Link>, LinkError> {
        let port = self.port.as_ref().ok_or(LinkError::Closed)?;
        let clone = port
            .try_clone_native()
            .map_err(|e| LinkError::Io(io::Error::new(io::ErrorKind::Other, e)))?;
        Ok(Box::new(PortHandle {
            name: self.path.clone(),
            port: clone,
        }))
    }

    fn name(&self) -> &str {
        &self.path
    }
}

/// Additional handle on an open link
///
/// Does not own the saved settings; the originating [`SerialLink`] restores
/// them.
struct PortHandle {
    name: String,
    port: TTYPort,
}

impl Link for PortHandle {
    fn read(&mut self, max_bytes: usize) -> Result<Vec<u8>, LinkError> {
        read_port(&mut self.port, max_bytes)
    }

    fn write(&mut self, bytes: &[u8]) -> Result<usize, LinkError> {
        write_port(&mut self.port, bytes)
    }

    fn try_clone(&self) -> Result<Box<dyn Link>, LinkError> {
        let clone = self
            .port
            .try_clone_native()
            .map_err(|e| LinkError::Io(io::Error::new(io::ErrorKind::Other, e)))?;
        Ok(Box::new(PortHandle {
            name: self.name.clone(),
            port: clone,
        }))
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Probe the device before configuring it
///
/// Detects a competing exclusive owner and saves the line settings that
/// `close` puts back.
fn capture_prior_settings(path: &str) -> Result<libc::termios, LinkError> {
    let probe = OpenOptions::new()
        .read(true)
        .write(true)
        .custom_flags(libc::O_NOCTTY | libc::O_NONBLOCK)
        .open(path)
        .map_err(|e| {
            if e.raw_os_error() == Some(libc::EBUSY) {
                LinkError::DeviceBusy(path.to_string())
            } else if e.kind() == io::ErrorKind::NotFound {
                LinkError::DeviceNotFound(path.to_string())
            } else {
                LinkError::Io(e)
            }
        })?;

    get_attributes(probe.as_raw_fd()).map_err(|_| LinkError::NotATerminal(path.to_string()))
}

/// Classify a failure from the serialport open
///
/// The device can be claimed by someone else between the probe and this
/// open, so busy is recognized here as well.
fn open_error(path: &str, e: serialport::Error) -> LinkError {
    // serialport only keeps the errno text, e.g. "Device or resource busy"
    if e.description.to_lowercase().contains("busy") {
        return LinkError::DeviceBusy(path.to_string());
    }
    match e.kind() {
        serialport::ErrorKind::Io(io::ErrorKind::NotFound) => {
            LinkError::DeviceNotFound(path.to_string())
        }
        _ => LinkError::Configuration {
            path: path.to_string(),
            reason: e.to_string(),
        },
    }
}

fn read_port(port: &mut TTYPort, max_bytes: usize) -> Result<Vec<u8>, LinkError> {
    let mut buf = vec![0u8; max_bytes];
    match port.read(&mut buf) {
        Ok(n) => {
            buf.truncate(n);
            Ok(buf)
        }
        Err(e)
            if matches!(
                e.kind(),
                io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock | io::ErrorKind::Interrupted
            ) =>
        {
            Ok(Vec::new())
        }
        Err(e) => Err(LinkError::Read(e.to_string())),
    }
}

fn write_port(port: &mut TTYPort, bytes: &[u8]) -> Result<usize, LinkError> {
    port.write_all(bytes)
        .map_err(|e| LinkError::Write(e.to_string()))?;
    Ok(bytes.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings() {
        let settings = LinkSettings::default();
        assert_eq!(settings.baud_rate, 115200);
        assert_eq!(settings.read_timeout, Duration::from_millis(100));
    }

    #[test]
    fn test_missing_device() {
        let err = SerialLink::open("/dev/does-not-exist-slcan").err().unwrap();
        assert!(matches!(err, LinkError::DeviceNotFound(_)));
        assert!(err.is_fatal());
    }

    #[test]
    fn test_regular_file_rejected() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let path = file.path().to_str().unwrap();
        let err = SerialLink::open(path).err().unwrap();
        assert!(matches!(err, LinkError::NotACharacterDevice(_)));
    }

    #[test]
    fn test_busy_during_open_is_device_busy() {
        let busy = serialport::Error::new(
            serialport::ErrorKind::Io(io::ErrorKind::Other),
            "Device or resource busy",
        );
        assert!(matches!(
            open_error("/dev/ttyACM0", busy),
            LinkError::DeviceBusy(path) if path == "/dev/ttyACM0"
        ));

        let missing = serialport::Error::new(
            serialport::ErrorKind::Io(io::ErrorKind::NotFound),
            "No such file or directory",
        );
        assert!(matches!(
            open_error("/dev/ttyACM0", missing),
            LinkError::DeviceNotFound(_)
        ));

        let other = serialport::Error::new(serialport::ErrorKind::InvalidInput, "bad baud rate");
        assert!(matches!(
            open_error("/dev/ttyACM0", other),
            LinkError::Configuration { .. }
        ));
    }

    #[test]
    fn test_character_device_that_is_not_a_tty() {
        let err = SerialLink::open("/dev/null").err().unwrap();
        assert!(matches!(err, LinkError::NotATerminal(_)));
    }
}
