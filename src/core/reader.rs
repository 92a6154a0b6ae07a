//! Single-byte reads under raw mode

use std::io;

use tracing::trace;

use super::session::RawModeSession;
use super::tty::{Result, TermError, TerminalDevice};

/// One unit of raw input
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DecodedByte {
    /// A byte arrived
    Byte(u8),
    /// The read timer expired with nothing to read
    Pending,
}

/// Reads bytes from a device while its raw mode session is alive
pub struct RawReader<'s, D: TerminalDevice> {
    session: &'s mut RawModeSession<D>,
}

impl<'s, D: TerminalDevice> RawReader<'s, D> {
    pub(crate) fn new(session: &'s mut RawModeSession<D>) -> Self {
        Self { session }
    }

    /// Wait up to the session's read timeout for one byte.
    ///
    /// A zero-length read, EAGAIN and EINTR all mean "nothing yet" and come
    /// back as [`DecodedByte::Pending`].
    pub fn read_one(&mut self) -> Result<DecodedByte> {
        let mut buf = [0u8; 1];
        match self.session.device_mut().read(&mut buf) {
            Ok(0) => Ok(DecodedByte::Pending),
            Ok(_) => {
                trace!("read byte {}", buf[0]);
                Ok(DecodedByte::Byte(buf[0]))
            }
            Err(e)
                if matches!(
                    e.kind(),
                    io::ErrorKind::WouldBlock | io::ErrorKind::Interrupted
                ) =>
            {
                Ok(DecodedByte::Pending)
            }
            Err(e) => Err(TermError::ReadFailed(e)),
        }
    }
}
