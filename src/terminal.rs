//! Terminal handling for screenform.
//!
//! This module provides the POSIX [`Driver`] implementation: termios raw
//! mode, the alternate screen, and ANSI/SGR output.
//!
//! # No-TTY Mode
//!
//! When the input/output file descriptors are not connected to a real TTY
//! (e.g., when running with redirected I/O), the terminal operates in
//! "no-TTY mode". In this mode:
//!
//! - Output operations (writing escape sequences) still work normally
//! - Terminal attribute changes (raw mode, echo) are no-ops
//! - The [`Terminal::is_no_tty()`] method returns `true`
//!
//! # Safety
//!
//! This module contains unsafe code for interfacing with POSIX terminal APIs.
//! The unsafe code is limited to:
//! - `libc::tcgetattr`/`libc::tcsetattr` for terminal attribute manipulation
//! - `libc::ioctl` for terminal size queries
//! - `libc::write` for raw terminal output

use crate::color::ColorPair;
use crate::driver::Driver;
use crate::error::{Error, Result};
use crate::types::{EditMode, LockKeys, ScreenPoint, ScreenSize};
use std::io;
use std::mem::MaybeUninit;
use std::os::unix::io::RawFd;
use unicode_width::UnicodeWidthChar;

/// Original terminal settings for restoration.
#[derive(Clone)]
pub struct TermSettings {
    /// Original termios settings.
    termios: libc::termios,
    /// Whether settings have been saved.
    saved: bool,
}

impl TermSettings {
    /// Create empty settings.
    pub fn new() -> Self {
        // SAFETY: `libc::termios` is a C struct of integers and integer
        // arrays, all of which have valid zero representations. It is filled
        // in by `tcgetattr` before use.
        let termios = unsafe { MaybeUninit::<libc::termios>::zeroed().assume_init() };
        Self {
            termios,
            saved: false,
        }
    }

    /// Save current terminal settings.
    ///
    /// Returns `Ok(true)` if settings were saved, `Ok(false)` if the file
    /// descriptor is not a TTY (ENOTTY), or an error for other failures.
    pub fn save(&mut self, fd: RawFd) -> Result<bool> {
        // SAFETY: `&mut self.termios` is a valid pointer to a termios struct;
        // `tcgetattr` fully initialises it on success.
        let result = unsafe { libc::tcgetattr(fd, &mut self.termios) };
        if result == 0 {
            self.saved = true;
            Ok(true)
        } else {
            let errno = last_errno();
            if errno == libc::ENOTTY {
                self.saved = false;
                Ok(false)
            } else {
                Err(Error::SystemError(errno))
            }
        }
    }

    /// Restore saved terminal settings. A no-op if nothing was saved.
    pub fn restore(&self, fd: RawFd) -> Result<()> {
        if !self.saved {
            return Ok(());
        }
        // SAFETY: `self.termios` was initialised by a successful `tcgetattr`
        // (guaranteed by `self.saved`).
        let result = unsafe { libc::tcsetattr(fd, libc::TCSANOW, &self.termios) };
        if result == 0 {
            Ok(())
        } else {
            let errno = last_errno();
            if errno == libc::ENOTTY {
                // TTY went away
                Ok(())
            } else {
                Err(Error::SystemError(errno))
            }
        }
    }

    /// Check if settings have been saved.
    pub fn is_saved(&self) -> bool {
        self.saved
    }
}

impl Default for TermSettings {
    fn default() -> Self {
        Self::new()
    }
}

fn last_errno() -> i32 {
    io::Error::last_os_error().raw_os_error().unwrap_or(-1)
}

/// A POSIX terminal driven with ANSI escape sequences.
pub struct Terminal {
    /// Input file descriptor.
    input_fd: RawFd,
    /// Output file descriptor.
    output_fd: RawFd,
    /// Whether the terminal is operating without a real TTY.
    no_tty: bool,
    /// Whether program mode is active.
    active: bool,
    /// Original (shell) terminal settings.
    shell_settings: TermSettings,
    /// Last known size.
    size: ScreenSize,
    /// Output buffer, written out on flush.
    output_buffer: Vec<u8>,
    /// Colors selected by the last SGR sequence.
    pen: Option<ColorPair>,
    /// Where the terminal's own cursor is after the last output.
    position: Option<ScreenPoint>,
    /// Current cursor shape.
    shape: EditMode,
}

impl Terminal {
    /// Create a new terminal with the given file descriptors.
    pub fn new(input_fd: RawFd, output_fd: RawFd) -> Result<Self> {
        let mut shell_settings = TermSettings::new();
        let no_tty = !shell_settings.save(input_fd)?;

        let mut term = Self {
            input_fd,
            output_fd,
            no_tty,
            active: false,
            shell_settings,
            size: ScreenSize::default(),
            output_buffer: Vec::with_capacity(4096),
            pen: None,
            position: None,
            shape: EditMode::Insert,
        };
        term.update_size();
        tracing::debug!(no_tty, size = ?term.size, "terminal opened");
        Ok(term)
    }

    /// Create a terminal using stdin/stdout.
    pub fn from_stdio() -> Result<Self> {
        Self::new(libc::STDIN_FILENO, libc::STDOUT_FILENO)
    }

    /// Update terminal size from the system.
    ///
    /// Falls back to `LINES`/`COLUMNS`, and keeps the previous size if
    /// neither is available.
    pub fn update_size(&mut self) -> ScreenSize {
        // SAFETY: `libc::winsize` is a plain struct of integers.
        let mut ws = unsafe { MaybeUninit::<libc::winsize>::zeroed().assume_init() };

        // SAFETY: `TIOCGWINSZ` writes a `winsize` through the valid pointer.
        let result = unsafe { libc::ioctl(self.output_fd, libc::TIOCGWINSZ, &mut ws) };

        if result == 0 && ws.ws_row > 0 && ws.ws_col > 0 {
            self.size = ScreenSize::new(ws.ws_col as i32, ws.ws_row as i32);
        } else {
            let env = |key| std::env::var(key).ok().and_then(|v| v.trim().parse().ok());
            if let Some(n) = env("LINES") {
                self.size.height = n;
            }
            if let Some(n) = env("COLUMNS") {
                self.size.width = n;
            }
        }
        self.size
    }

    /// Enter program mode: raw input, alternate screen, cleared display.
    pub fn enter_program_mode(&mut self) -> Result<()> {
        if !self.no_tty {
            let mut settings = self.shell_settings.termios;

            // Disable canonical mode, echo and signals
            settings.c_lflag &= !(libc::ICANON | libc::ECHO | libc::ISIG | libc::IEXTEN);
            // Disable input processing
            settings.c_iflag &= !(libc::ICRNL | libc::INLCR | libc::IXON);
            // Disable output processing
            settings.c_oflag &= !libc::OPOST;
            settings.c_cc[libc::VMIN] = 1;
            settings.c_cc[libc::VTIME] = 0;

            // SAFETY: `settings` is a copy of a termios initialised by
            // `tcgetattr`.
            let result = unsafe { libc::tcsetattr(self.input_fd, libc::TCSANOW, &settings) };
            if result != 0 {
                return Err(Error::SystemError(last_errno()));
            }
        }

        self.active = true;
        self.pen = None;
        self.position = None;

        // Alternate screen, cleared
        self.write_str("\x1b[?1049h\x1b[0m\x1b[2J\x1b[?25h");
        self.write_shape(self.shape);
        self.flush()?;
        tracing::debug!("entered program mode");
        Ok(())
    }

    /// Leave program mode and restore the shell's terminal settings.
    pub fn leave_program_mode(&mut self) -> Result<()> {
        if !self.active {
            return Ok(());
        }
        // Default cursor shape, reset colors, leave alternate screen
        self.write_str("\x1b[0 q\x1b[0m\x1b[?25h\x1b[?1049l");
        self.flush()?;
        self.shell_settings.restore(self.input_fd)?;
        self.active = false;
        tracing::debug!("left program mode");
        Ok(())
    }

    /// Whether the terminal is operating without a real TTY.
    pub fn is_no_tty(&self) -> bool {
        self.no_tty
    }

    /// Input file descriptor, for a [`crate::input::KeyReader`].
    pub fn input_fd(&self) -> RawFd {
        self.input_fd
    }

    fn write_str(&mut self, s: &str) {
        self.output_buffer.extend_from_slice(s.as_bytes());
    }

    fn write_shape(&mut self, mode: EditMode) {
        let seq = match mode {
            EditMode::Insert => "\x1b[4 q",
            EditMode::Overwrite => "\x1b[2 q",
        };
        self.write_str(seq);
    }

    fn goto(&mut self, to: ScreenPoint) {
        if self.position != Some(to) {
            let seq = format!("\x1b[{};{}H", to.y + 1, to.x + 1);
            self.write_str(&seq);
            self.position = Some(to);
        }
    }
}

impl Driver for Terminal {
    fn size(&mut self) -> ScreenSize {
        self.update_size()
    }

    fn put_cell(&mut self, at: ScreenPoint, ch: char, color: ColorPair) -> Result<()> {
        if !self.size.contains(at) {
            return Err(Error::OutOfBounds {
                x: at.x,
                y: at.y,
                max_x: self.size.width,
                max_y: self.size.height,
            });
        }
        self.goto(at);
        if self.pen != Some(color) {
            let sgr = color.sgr();
            self.write_str(&sgr);
            self.pen = Some(color);
        }
        let mut buf = [0u8; 4];
        self.write_str(ch.encode_utf8(&mut buf));

        // The terminal advances its cursor; the last column leaves it pending.
        let next = at.offset(1, 0);
        self.position = (next.x < self.size.width && ch.width() == Some(1)).then_some(next);
        Ok(())
    }

    fn move_cursor(&mut self, to: ScreenPoint) -> Result<()> {
        self.goto(to.clamp_to(self.size));
        Ok(())
    }

    fn set_cursor_shape(&mut self, mode: EditMode) -> Result<()> {
        if self.shape != mode {
            self.shape = mode;
            self.write_shape(mode);
        }
        Ok(())
    }

    fn lock_keys(&mut self) -> LockKeys {
        // A POSIX terminal cannot report keyboard LEDs.
        match self.shape {
            EditMode::Insert => LockKeys::INSERT,
            EditMode::Overwrite => LockKeys::empty(),
        }
    }

    fn beep(&mut self) -> Result<()> {
        self.write_str("\x07");
        self.flush()
    }

    fn flush(&mut self) -> Result<()> {
        let mut written = 0;
        while written < self.output_buffer.len() {
            let rest = &self.output_buffer[written..];
            // SAFETY: `rest` is a live slice of the output buffer and the
            // length passed matches it exactly.
            let result =
                unsafe { libc::write(self.output_fd, rest.as_ptr() as *const libc::c_void, rest.len()) };
            if result < 0 {
                let err = io::Error::last_os_error();
                if err.kind() == io::ErrorKind::Interrupted {
                    continue;
                }
                self.output_buffer.clear();
                return Err(err.into());
            }
            written += result as usize;
        }
        self.output_buffer.clear();
        Ok(())
    }
}

impl Drop for Terminal {
    fn drop(&mut self) {
        if self.active {
            let _ = self.leave_program_mode();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_term_settings() {
        let settings = TermSettings::new();
        assert!(!settings.is_saved());
        // Restoring unsaved settings is a no-op.
        assert!(settings.restore(-1).is_ok());
    }
}
