//! Terminal device access over termios
//!
//! This module wraps the three syscalls raw mode needs (`tcgetattr`,
//! `tcsetattr`, `read`) behind the [`TerminalDevice`] trait so the session
//! logic can run against an in-memory device in tests.

use std::io;
use std::mem::MaybeUninit;
use std::os::unix::io::{AsRawFd, RawFd};
use std::sync::atomic::{AtomicBool, Ordering};

use thiserror::Error;

use super::termios::TerminalConfiguration;

#[derive(Error, Debug)]
pub enum TermError {
    #[error("tcgetattr: {0}")]
    QueryFailed(#[source] io::Error),

    #[error("tcsetattr: {0}")]
    UpdateFailed(#[source] io::Error),

    #[error("read: {0}")]
    ReadFailed(#[source] io::Error),

    #[error("standard input is already claimed by a raw mode session")]
    AlreadyClaimed,
}

pub type Result<T> = std::result::Result<T, TermError>;

/// The operations raw mode performs on a terminal.
///
/// Errors are plain `io::Error`s; the session layer decides which
/// [`TermError`] they become.
pub trait TerminalDevice {
    /// Current driver attributes
    fn get_attributes(&self) -> io::Result<TerminalConfiguration>;

    /// Install `config`, discarding unread input first (`TCSAFLUSH`)
    fn set_attributes(&mut self, config: &TerminalConfiguration) -> io::Result<()>;

    /// One `read(2)` into `buf`
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize>;
}

static STDIN_CLAIMED: AtomicBool = AtomicBool::new(false);

/// A terminal reached through a file descriptor
pub struct Tty {
    fd: RawFd,
    owns_stdin: bool,
}

impl Tty {
    /// Claim standard input.
    ///
    /// Only one claim exists at a time; a second call before the first
    /// handle is dropped fails with [`TermError::AlreadyClaimed`].
    pub fn stdin() -> Result<Self> {
        if STDIN_CLAIMED
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(TermError::AlreadyClaimed);
        }
        Ok(Self {
            fd: libc::STDIN_FILENO,
            owns_stdin: true,
        })
    }

    /// Borrow some other descriptor. The caller keeps it open for the
    /// lifetime of the handle.
    #[cfg(test)]
    pub(crate) fn from_fd(fd: &impl AsRawFd) -> Self {
        Self {
            fd: fd.as_raw_fd(),
            owns_stdin: false,
        }
    }
}

impl AsRawFd for Tty {
    fn as_raw_fd(&self) -> RawFd {
        self.fd
    }
}

impl TerminalDevice for Tty {
    fn get_attributes(&self) -> io::Result<TerminalConfiguration> {
        let mut buf = MaybeUninit::<libc::termios>::uninit();
        // SAFETY: tcgetattr fully initialises the record when it returns 0
        unsafe {
            if libc::tcgetattr(self.fd, buf.as_mut_ptr()) == 0 {
                Ok(TerminalConfiguration::from(buf.assume_init()))
            } else {
                Err(io::Error::last_os_error())
            }
        }
    }

    fn set_attributes(&mut self, config: &TerminalConfiguration) -> io::Result<()> {
        // SAFETY: the pointer refers to a live, initialised termios
        let rc = unsafe { libc::tcsetattr(self.fd, libc::TCSAFLUSH, config.as_termios()) };
        if rc == 0 {
            Ok(())
        } else {
            Err(io::Error::last_os_error())
        }
    }

    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        // SAFETY: buf is valid for buf.len() writable bytes
        let n = unsafe { libc::read(self.fd, buf.as_mut_ptr().cast(), buf.len()) };
        if n < 0 {
            Err(io::Error::last_os_error())
        } else {
            Ok(n as usize)
        }
    }
}

impl Drop for Tty {
    fn drop(&mut self) {
        if self.owns_stdin {
            STDIN_CLAIMED.store(false, Ordering::Release);
        }
    }
}
