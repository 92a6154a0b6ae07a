//! In-memory terminal for tests
//!
//! `MockTerminal` is a cheap handle around shared state, so a test can keep
//! one clone for inspection after handing another to a session.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::io;
use std::rc::Rc;

use super::termios::TerminalConfiguration;
use super::tty::TerminalDevice;

/// What the next `read` call does once the input queue is empty
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum IdleRead {
    /// Return zero bytes, as a VTIME expiry does
    Timeout,
    /// Fail with EAGAIN, as some platforms report the expiry
    WouldBlock,
}

/// One scripted outcome of a `read` call
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReadEvent {
    Byte(u8),
    Idle(IdleRead),
}

#[derive(Debug)]
struct State {
    /// `None` means the device is not a terminal
    attributes: Option<TerminalConfiguration>,
    installed: Vec<TerminalConfiguration>,
    input: VecDeque<ReadEvent>,
    /// Delivered right after the next successful install
    typed_later: Vec<ReadEvent>,
    idle: IdleRead,
    fail_set_after: Option<usize>,
    read_error: Option<io::ErrorKind>,
    flushed_bytes: usize,
}

#[derive(Clone, Debug)]
pub struct MockTerminal {
    state: Rc<RefCell<State>>,
}

impl MockTerminal {
    /// A terminal currently in `attributes`
    pub fn new(attributes: TerminalConfiguration) -> Self {
        Self::with_attributes(Some(attributes))
    }

    /// A device that is not a terminal (tcgetattr fails with ENOTTY)
    pub fn not_a_tty() -> Self {
        Self::with_attributes(None)
    }

    fn with_attributes(attributes: Option<TerminalConfiguration>) -> Self {
        Self {
            state: Rc::new(RefCell::new(State {
                attributes,
                installed: Vec::new(),
                input: VecDeque::new(),
                typed_later: Vec::new(),
                idle: IdleRead::Timeout,
                fail_set_after: None,
                read_error: None,
                flushed_bytes: 0,
            })),
        }
    }

    /// Queue bytes as if typed
    pub fn push_input(&self, bytes: &[u8]) {
        let events = bytes.iter().map(|&b| ReadEvent::Byte(b));
        self.state.borrow_mut().input.extend(events);
    }

    /// Queue bytes that arrive once the next configuration is installed,
    /// so flush-then-apply does not discard them
    pub fn type_after_install(&self, bytes: &[u8]) {
        let events = bytes.iter().map(|&b| ReadEvent::Byte(b));
        self.state.borrow_mut().typed_later.extend(events);
    }

    /// Like `type_after_install`, with empty reads between the bytes
    pub fn script_after_install(&self, events: &[ReadEvent]) {
        self.state.borrow_mut().typed_later.extend_from_slice(events);
    }

    pub fn set_idle(&self, idle: IdleRead) {
        self.state.borrow_mut().idle = idle;
    }

    /// Let `n` attribute updates succeed, then fail every later one with EIO
    pub fn fail_set_after(&self, n: usize) {
        self.state.borrow_mut().fail_set_after = Some(n);
    }

    /// Make the next read fail once the input queue is drained
    pub fn fail_reads_with(&self, kind: io::ErrorKind) {
        self.state.borrow_mut().read_error = Some(kind);
    }

    /// Currently installed attributes
    pub fn attributes(&self) -> Option<TerminalConfiguration> {
        self.state.borrow().attributes
    }

    /// Every configuration successfully installed, in order
    pub fn installed(&self) -> Vec<TerminalConfiguration> {
        self.state.borrow().installed.clone()
    }

    /// Input bytes discarded by flush-then-apply
    pub fn flushed_bytes(&self) -> usize {
        self.state.borrow().flushed_bytes
    }
}

impl TerminalDevice for MockTerminal {
    fn get_attributes(&self) -> io::Result<TerminalConfiguration> {
        self.state
            .borrow()
            .attributes
            .ok_or_else(|| io::Error::from_raw_os_error(libc::ENOTTY))
    }

    fn set_attributes(&mut self, config: &TerminalConfiguration) -> io::Result<()> {
        let mut state = self.state.borrow_mut();
        if state.attributes.is_none() {
            return Err(io::Error::from_raw_os_error(libc::ENOTTY));
        }
        if let Some(n) = state.fail_set_after {
            if state.installed.len() >= n {
                return Err(io::Error::from_raw_os_error(libc::EIO));
            }
        }
        let flushed = state
            .input
            .drain(..)
            .filter(|e| matches!(e, ReadEvent::Byte(_)))
            .count();
        state.flushed_bytes += flushed;
        let typed = std::mem::take(&mut state.typed_later);
        state.input.extend(typed);
        state.attributes = Some(*config);
        state.installed.push(*config);
        Ok(())
    }

    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let mut state = self.state.borrow_mut();
        if buf.is_empty() {
            return Ok(0);
        }
        let idle = match state.input.pop_front() {
            Some(ReadEvent::Byte(byte)) => {
                buf[0] = byte;
                return Ok(1);
            }
            Some(ReadEvent::Idle(idle)) => idle,
            None => match state.read_error.take() {
                Some(kind) => return Err(io::Error::from(kind)),
                None => state.idle,
            },
        };
        match idle {
            IdleRead::Timeout => Ok(0),
            IdleRead::WouldBlock => Err(io::Error::from_raw_os_error(libc::EAGAIN)),
        }
    }
}
