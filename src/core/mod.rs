//! Core raw mode components.
//!
//! This module contains the terminal-facing logic:
//!
//! - **termios**: attribute snapshots and the raw-mode transformation
//! - **tty**: device access (`tcgetattr`, `tcsetattr`, `read`) and errors
//! - **session**: the raw mode guard that restores the terminal on every exit path
//! - **reader**: single-byte reads with a timeout
//!
//! # Architecture
//!
//! ```text
//! RawModeSession
//! ├── Tty (any TerminalDevice)
//! ├── original: TerminalConfiguration
//! └── RawReader (borrows the session)
//! ```

pub mod reader;
pub mod session;
pub mod termios;
pub mod tty;

#[cfg(test)]
pub mod mock;

pub use reader::{DecodedByte, RawReader};
pub use session::RawModeSession;
pub use termios::ReadTimeout;
pub use tty::{TermError, TerminalDevice, Tty};
