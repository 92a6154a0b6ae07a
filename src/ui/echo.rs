//! Key echo
//!
//! Prints each byte read in raw mode as its decimal value, followed by the
//! character itself when it is printable ASCII. Lines end in `\r\n` since
//! output post-processing is off while raw mode is active.

use std::io::{self, Write};

/// What the read loop should do after a byte has been echoed
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

/// Format one byte the way the echo loop prints it
pub fn format_byte(byte: u8) -> String {
    if byte.is_ascii_graphic() || byte == b' ' {
        format!("{} ('{}')\r\n", byte, byte as char)
    } else {
        format!("{}\r\n", byte)
    }
}

/// Echoes bytes and recognises the quit byte
pub struct KeyEcho {
    quit_byte: u8,
}

impl KeyEcho {
    pub fn new(quit_byte: u8) -> Self {
        Self { quit_byte }
    }

    pub fn quit_byte(&self) -> u8 {
        self.quit_byte
    }

    /// Print `byte` and report whether the loop should stop
    pub fn handle<W: Write>(&self, byte: u8, out: &mut W) -> io::Result<Flow> {
        out.write_all(format_byte(byte).as_bytes())?;
        out.flush()?;

        if byte == self.quit_byte {
            Ok(Flow::Quit)
        } else {
            Ok(Flow::Continue)
        }
    }
}

impl Default for KeyEcho {
    fn default() -> Self {
        Self::new(b'q')
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_printable_bytes() {
        assert_eq!(format_byte(b'a'), "97 ('a')\r\n");
        assert_eq!(format_byte(b'q'), "113 ('q')\r\n");
        assert_eq!(format_byte(b' '), "32 (' ')\r\n");
        assert_eq!(format_byte(b'~'), "126 ('~')\r\n");
    }

    #[test]
    fn test_control_bytes() {
        // Ctrl-C, Ctrl-Q, Enter, Escape, Delete
        assert_eq!(format_byte(3), "3\r\n");
        assert_eq!(format_byte(17), "17\r\n");
        assert_eq!(format_byte(13), "13\r\n");
        assert_eq!(format_byte(27), "27\r\n");
        assert_eq!(format_byte(127), "127\r\n");
    }

    #[test]
    fn test_high_bytes_are_numeric_only() {
        assert_eq!(format_byte(0xC3), "195\r\n");
        assert_eq!(format_byte(0xFF), "255\r\n");
    }

    #[test]
    fn test_quit_byte_stops_after_echo() {
        let echo = KeyEcho::default();
        let mut out = Vec::new();

        assert_eq!(echo.handle(b'x', &mut out).unwrap(), Flow::Continue);
        assert_eq!(echo.handle(17, &mut out).unwrap(), Flow::Continue);
        assert_eq!(echo.handle(b'q', &mut out).unwrap(), Flow::Quit);
        assert_eq!(out, b"120 ('x')\r\n17\r\n113 ('q')\r\n");
    }

    #[test]
    fn test_custom_quit_byte() {
        let echo = KeyEcho::new(4);
        let mut out = Vec::new();

        assert_eq!(echo.handle(b'q', &mut out).unwrap(), Flow::Continue);
        assert_eq!(echo.handle(4, &mut out).unwrap(), Flow::Quit);
        assert_eq!(echo.quit_byte(), 4);
    }
}
