//! Terminal attribute snapshots and the raw-mode transformation.
//!
//! [`TerminalConfiguration`] is a plain copy of the driver's `termios`
//! record. The flag words are exposed through `bitflags` views whose named
//! members are exactly the bits raw mode touches; every other bit passes
//! through untouched.

use std::fmt;
use std::time::Duration;

use bitflags::bitflags;

bitflags! {
    /// Input processing flags (`c_iflag`)
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub struct InputFlags: libc::tcflag_t {
        /// Break condition raises SIGINT
        const BRKINT = libc::BRKINT;
        /// Translate CR to NL on input
        const ICRNL  = libc::ICRNL;
        /// Parity checking
        const INPCK  = libc::INPCK;
        /// Strip the eighth bit
        const ISTRIP = libc::ISTRIP;
        /// Ctrl-S / Ctrl-Q flow control
        const IXON   = libc::IXON;
    }
}

bitflags! {
    /// Output processing flags (`c_oflag`)
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub struct OutputFlags: libc::tcflag_t {
        /// Output post-processing (NL -> CRNL and friends)
        const OPOST = libc::OPOST;
    }
}

bitflags! {
    /// Control flags (`c_cflag`)
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub struct ControlFlags: libc::tcflag_t {
        /// Character size mask
        const CSIZE = libc::CSIZE;
        /// Eight bits per byte
        const CS8   = libc::CS8;
    }
}

bitflags! {
    /// Local flags (`c_lflag`)
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub struct LocalFlags: libc::tcflag_t {
        /// Echo typed characters
        const ECHO   = libc::ECHO;
        /// Line-buffered input
        const ICANON = libc::ICANON;
        /// Implementation-defined extensions (Ctrl-V, Ctrl-O)
        const IEXTEN = libc::IEXTEN;
        /// Ctrl-C / Ctrl-Z / Ctrl-\ generate signals
        const ISIG   = libc::ISIG;
    }
}

impl InputFlags {
    /// Input flags cleared in raw mode
    pub const RAW_CLEARED: Self = Self::BRKINT
        .union(Self::ICRNL)
        .union(Self::INPCK)
        .union(Self::ISTRIP)
        .union(Self::IXON);
}

impl LocalFlags {
    /// Local flags cleared in raw mode
    pub const RAW_CLEARED: Self = Self::ECHO
        .union(Self::ICANON)
        .union(Self::IEXTEN)
        .union(Self::ISIG);
}

/// Upper bound the driver accepts for `VTIME`, in milliseconds
pub const MAX_TIMEOUT_MS: u64 = 25_500;

/// Non-canonical read timeout, in tenths of a second (`VTIME`)
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ReadTimeout(u8);

impl ReadTimeout {
    /// Build from milliseconds, rounding up to the next tenth of a second.
    ///
    /// Returns `None` for zero or anything above [`MAX_TIMEOUT_MS`].
    pub fn from_millis(ms: u64) -> Option<Self> {
        if ms == 0 || ms > MAX_TIMEOUT_MS {
            return None;
        }
        let tenths = (ms + 99) / 100;
        u8::try_from(tenths).ok().map(Self)
    }

    pub fn deciseconds(self) -> u8 {
        self.0
    }

    pub fn as_duration(self) -> Duration {
        Duration::from_millis(u64::from(self.0) * 100)
    }
}

impl Default for ReadTimeout {
    fn default() -> Self {
        Self(1)
    }
}

/// Snapshot of every terminal driver attribute for one device
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct TerminalConfiguration {
    termios: libc::termios,
}

impl From<libc::termios> for TerminalConfiguration {
    fn from(termios: libc::termios) -> Self {
        Self { termios }
    }
}

impl TerminalConfiguration {
    /// Underlying record, for handing back to `tcsetattr`
    pub fn as_termios(&self) -> &libc::termios {
        &self.termios
    }

    pub fn input_flags(&self) -> InputFlags {
        InputFlags::from_bits_retain(self.termios.c_iflag)
    }

    pub fn output_flags(&self) -> OutputFlags {
        OutputFlags::from_bits_retain(self.termios.c_oflag)
    }

    pub fn control_flags(&self) -> ControlFlags {
        ControlFlags::from_bits_retain(self.termios.c_cflag)
    }

    pub fn local_flags(&self) -> LocalFlags {
        LocalFlags::from_bits_retain(self.termios.c_lflag)
    }

    /// Minimum byte count before a non-canonical read returns
    pub fn min_bytes(&self) -> u8 {
        self.termios.c_cc[libc::VMIN]
    }

    /// Non-canonical read timer, in tenths of a second
    pub fn timeout_deciseconds(&self) -> u8 {
        self.termios.c_cc[libc::VTIME]
    }

    /// Compute the raw-mode variant of this configuration.
    ///
    /// Pure: `self` is left as is and the result depends only on `self` and
    /// `timeout`.
    ///
    /// - `BRKINT`, `ICRNL`, `INPCK`, `ISTRIP`, `IXON` off: every input byte
    ///   arrives with all eight bits and no CR/NL rewriting, and Ctrl-S /
    ///   Ctrl-Q / break are plain input rather than line control.
    /// - `OPOST` off: output goes out exactly as written.
    /// - character size forced to `CS8`.
    /// - `ECHO`, `ICANON`, `IEXTEN`, `ISIG` off: no echo, no line buffering,
    ///   no Ctrl-V literal-next, and Ctrl-C / Ctrl-Z are bytes, not signals.
    /// - `VMIN = 0`, `VTIME = timeout`: a read returns as soon as one byte is
    ///   there, or with nothing once the timer expires.
    pub fn derive_raw(&self, timeout: ReadTimeout) -> Self {
        let mut raw = *self;

        raw.termios.c_iflag = self
            .input_flags()
            .difference(InputFlags::RAW_CLEARED)
            .bits();
        raw.termios.c_oflag = self
            .output_flags()
            .difference(OutputFlags::OPOST)
            .bits();

        let mut control = self.control_flags();
        control.remove(ControlFlags::CSIZE);
        control.insert(ControlFlags::CS8);
        raw.termios.c_cflag = control.bits();

        raw.termios.c_lflag = self
            .local_flags()
            .difference(LocalFlags::RAW_CLEARED)
            .bits();

        raw.termios.c_cc[libc::VMIN] = 0;
        raw.termios.c_cc[libc::VTIME] = timeout.deciseconds();

        raw
    }
}

impl fmt::Debug for TerminalConfiguration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TerminalConfiguration")
            .field("iflag", &format_args!("{:#o}", self.termios.c_iflag))
            .field("oflag", &format_args!("{:#o}", self.termios.c_oflag))
            .field("cflag", &format_args!("{:#o}", self.termios.c_cflag))
            .field("lflag", &format_args!("{:#o}", self.termios.c_lflag))
            .field("vmin", &self.min_bytes())
            .field("vtime", &self.timeout_deciseconds())
            .finish()
    }
}
