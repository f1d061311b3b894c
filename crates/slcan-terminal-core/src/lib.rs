//! # slcan-terminal core library
//!
//! Interactive bridge between an operator and a serial-attached CAN adapter
//! speaking the SLCAN ASCII protocol.

#![warn(missing_docs)]
#![cfg_attr(docsrs, feature(doc_cfg))]

//!
//! This library provides:
//! - Translation of `cansend`-style shorthand (`t123#DEADBEEF`) into SLCAN
//!   wire syntax, including CAN-FD length codes
//! - Decoding of adapter feedback codes and `E` error reports
//! - An exclusive, self-restoring serial link to the adapter
//! - The interactive session: init commands, line editor and background
//!   receiver
//!
//! ## Example
//!
//! ```rust,ignore
//! use slcan_terminal_core::{config::TerminalConfig, session::{Console, Session}, terminal::RawStdin};
//!
//! let mut session = Session::new(TerminalConfig::default(), Console::stdout());
//! session.open("/dev/ttyACM0")?;
//! session.run_init_commands(&["S6".to_string(), "O".to_string()])?;
//! session.run_interactive(RawStdin::enable()?)?;
//! ```

pub mod config;
pub mod link;
pub mod protocol;
pub mod session;
pub mod terminal;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::config::{parse_init_commands, TerminalConfig};
    pub use crate::link::{find_slcan_device, Link, LinkError, SerialLink};
    pub use crate::protocol::{
        decode_error, decode_feedback, encode_length, translate_shorthand, ErrorReport,
        FeedbackEvent, SlcanCommand, Translation,
    };
    pub use crate::session::{Console, Session, SessionError, SessionState};
    pub use crate::terminal::RawStdin;
}

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
