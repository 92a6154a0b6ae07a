//! Raw mode session
//!
//! A [`RawModeSession`] exists exactly while raw attributes are installed.
//! It owns the device and the attributes captured before the switch, and
//! puts those back when it ends: through [`RawModeSession::restore`], which
//! reports failures, or from `Drop` when a session is dropped unrestored
//! (early `?` returns and unwinding), where a failure can only be logged.

use tracing::{debug, error, info};

use super::reader::RawReader;
use super::termios::{ReadTimeout, TerminalConfiguration};
use super::tty::{Result, TermError, TerminalDevice};

/// Read the device's current attributes
pub fn capture_original<D: TerminalDevice>(device: &D) -> Result<TerminalConfiguration> {
    device.get_attributes().map_err(TermError::QueryFailed)
}

/// Apply `config` with flush-then-apply semantics
pub fn install<D: TerminalDevice>(device: &mut D, config: &TerminalConfiguration) -> Result<()> {
    device.set_attributes(config).map_err(TermError::UpdateFailed)
}

pub struct RawModeSession<D: TerminalDevice> {
    device: D,
    original: TerminalConfiguration,
    active: TerminalConfiguration,
    restored: bool,
}

impl<D: TerminalDevice> RawModeSession<D> {
    /// Capture the current attributes, then install their raw variant.
    ///
    /// Nothing is installed when the capture fails, and no session exists
    /// when the install fails.
    pub fn activate(mut device: D, timeout: ReadTimeout) -> Result<Self> {
        let original = capture_original(&device)?;
        debug!("Captured terminal attributes: {:?}", original);

        let active = original.derive_raw(timeout);
        install(&mut device, &active)?;
        info!(
            "Raw mode enabled (VMIN={}, VTIME={})",
            active.min_bytes(),
            active.timeout_deciseconds()
        );

        Ok(Self {
            device,
            original,
            active,
            restored: false,
        })
    }

    /// Attributes currently installed
    pub fn active(&self) -> &TerminalConfiguration {
        &self.active
    }

    /// Byte reader bound to this session
    pub fn reader(&mut self) -> RawReader<'_, D> {
        RawReader::new(self)
    }

    pub(crate) fn device_mut(&mut self) -> &mut D {
        &mut self.device
    }

    /// Put the original attributes back and end the session
    pub fn restore(mut self) -> Result<()> {
        self.restored = true;
        self.reinstall_original()
    }

    fn reinstall_original(&mut self) -> Result<()> {
        install(&mut self.device, &self.original)?;
        self.active = self.original;
        info!("Terminal attributes restored");
        Ok(())
    }
}

impl<D: TerminalDevice> Drop for RawModeSession<D> {
    fn drop(&mut self) {
        if self.restored {
            return;
        }
        self.restored = true;
        if let Err(e) = self.reinstall_original() {
            error!("Failed to restore terminal attributes: {}", e);
        }
    }
}
