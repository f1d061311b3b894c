//! Raw console input
//!
//! The interactive loop reads keystrokes one at a time, so standard input is
//! switched out of canonical mode for the lifetime of a [`RawStdin`].

use std::io::{self, Read};
use std::mem::MaybeUninit;
use std::os::unix::io::RawFd;
use std::time::Duration;
use tracing::{debug, warn};

/// How long a read waits for a keystroke before reporting a timeout
pub const DEFAULT_KEY_WAIT: Duration = Duration::from_millis(100);

/// Read the terminal attributes of `fd`
pub(crate) fn get_attributes(fd: RawFd) -> io::Result<libc::termios> {
    let mut termios = MaybeUninit::<libc::termios>::uninit();
    // SAFETY: tcgetattr fully initializes the struct when it returns 0
    let rc = unsafe { libc::tcgetattr(fd, termios.as_mut_ptr()) };
    if rc < 0 {
        return Err(io::Error::last_os_error());
    }
    // SAFETY: checked rc above
    Ok(unsafe { termios.assume_init() })
}

/// Apply terminal attributes to `fd` immediately
pub(crate) fn set_attributes(fd: RawFd, termios: &libc::termios) -> io::Result<()> {
    // SAFETY: termios points to a valid, initialized struct
    let rc = unsafe { libc::tcsetattr(fd, libc::TCSANOW, termios) };
    if rc < 0 {
        return Err(io::Error::last_os_error());
    }
    Ok(())
}

/// Standard input in character-at-a-time mode without echo
///
/// Signal generation is also disabled so Ctrl+C arrives as the interrupt
/// byte. The original settings are restored on drop.
///
/// Reads wait at most the key wait and then fail with
/// [`io::ErrorKind::TimedOut`], so a caller blocked on the keyboard still
/// gets to check for termination.
pub struct RawStdin {
    saved: libc::termios,
    key_wait: Duration,
}

impl RawStdin {
    /// Switch standard input to raw mode
    pub fn enable() -> io::Result<Self> {
        Self::with_key_wait(DEFAULT_KEY_WAIT)
    }

    /// Switch standard input to raw mode with an explicit key wait
    pub fn with_key_wait(key_wait: Duration) -> io::Result<Self> {
        let saved = get_attributes(libc::STDIN_FILENO)?;

        let mut raw = saved;
        raw.c_lflag &= !(libc::ICANON | libc::ECHO | libc::ISIG);
        raw.c_cc[libc::VMIN] = 1;
        raw.c_cc[libc::VTIME] = 0;
        set_attributes(libc::STDIN_FILENO, &raw)?;

        debug!("Standard input switched to raw mode");
        Ok(Self { saved, key_wait })
    }
}

impl Read for RawStdin {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if !wait_readable(libc::STDIN_FILENO, self.key_wait)? {
            return Err(io::ErrorKind::TimedOut.into());
        }
        io::stdin().lock().read(buf)
    }
}

/// Wait until `fd` has input, up to `timeout`
///
/// Hang-up and error conditions count as readable so the following read
/// reports them.
fn wait_readable(fd: RawFd, timeout: Duration) -> io::Result<bool> {
    let mut pollfd = libc::pollfd {
        fd,
        events: libc::POLLIN,
        revents: 0,
    };
    let timeout_ms = libc::c_int::try_from(timeout.as_millis()).unwrap_or(libc::c_int::MAX);
    // SAFETY: pollfd is a single valid entry for the duration of the call
    let rc = unsafe { libc::poll(&mut pollfd, 1, timeout_ms) };
    if rc < 0 {
        return Err(io::Error::last_os_error());
    }
    Ok(rc > 0)
}

impl Drop for RawStdin {
    fn drop(&mut self) {
        if let Err(e) = set_attributes(libc::STDIN_FILENO, &self.saved) {
            warn!("Failed to restore standard input settings: {e}");
        } else {
            debug!("Standard input settings restored");
        }
    }
}
