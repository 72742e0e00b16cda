//! Terminal driver abstraction.
//!
//! The [`Driver`] trait is the only seam between the form engine and a
//! physical terminal. [`crate::terminal::Terminal`] implements it over a POSIX
//! TTY; [`HeadlessDriver`] implements it in memory so forms can be exercised
//! without one.

use crate::color::ColorPair;
use crate::error::{Error, Result};
use crate::types::{EditMode, LockKeys, ScreenPoint, ScreenSize};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Low-level cell output and terminal state queries.
pub trait Driver: Send {
    /// Current terminal dimensions.
    fn size(&mut self) -> ScreenSize;

    /// Paint one cell.
    fn put_cell(&mut self, at: ScreenPoint, ch: char, color: ColorPair) -> Result<()>;

    /// Move the visible cursor.
    fn move_cursor(&mut self, to: ScreenPoint) -> Result<()>;

    /// Select the cursor shape for the given edit mode.
    fn set_cursor_shape(&mut self, mode: EditMode) -> Result<()>;

    /// Current lock-key state.
    fn lock_keys(&mut self) -> LockKeys;

    /// Ring the bell.
    fn beep(&mut self) -> Result<()>;

    /// Push any pending output to the device.
    fn flush(&mut self) -> Result<()>;
}

#[derive(Debug)]
struct HeadlessState {
    size: ScreenSize,
    cells: Vec<(char, ColorPair)>,
    cursor: ScreenPoint,
    shape: EditMode,
    locks: LockKeys,
    beeps: usize,
    flushes: usize,
    fail_with: Option<std::io::ErrorKind>,
}

/// An in-memory terminal.
///
/// Clones share the same state, so a test can keep one handle while the
/// form owns another.
#[derive(Clone, Debug)]
pub struct HeadlessDriver {
    state: Arc<Mutex<HeadlessState>>,
}

impl HeadlessDriver {
    /// Create a blank terminal of the given size.
    pub fn new(size: ScreenSize) -> Self {
        let cells = vec![(' ', ColorPair::default()); (size.width.max(0) * size.height.max(0)) as usize];
        Self {
            state: Arc::new(Mutex::new(HeadlessState {
                size,
                cells,
                cursor: ScreenPoint::default(),
                shape: EditMode::Insert,
                locks: LockKeys::empty(),
                beeps: 0,
                flushes: 0,
                fail_with: None,
            })),
        }
    }

    fn state(&self) -> MutexGuard<'_, HeadlessState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// The character painted at a cell.
    pub fn char_at(&self, at: ScreenPoint) -> Option<char> {
        self.cell(at).map(|(ch, _)| ch)
    }

    /// The character and color painted at a cell.
    pub fn cell(&self, at: ScreenPoint) -> Option<(char, ColorPair)> {
        let state = self.state();
        if !state.size.contains(at) {
            return None;
        }
        state.cells.get((at.y * state.size.width + at.x) as usize).copied()
    }

    /// The text of one row.
    pub fn row_text(&self, y: i32) -> String {
        let state = self.state();
        if y < 0 || y >= state.size.height {
            return String::new();
        }
        let start = (y * state.size.width) as usize;
        state.cells[start..start + state.size.width as usize]
            .iter()
            .map(|(ch, _)| *ch)
            .collect()
    }

    /// Text of `len` cells starting at `at`.
    pub fn text_at(&self, at: ScreenPoint, len: usize) -> String {
        self.row_text(at.y)
            .chars()
            .skip(at.x.max(0) as usize)
            .take(len)
            .collect()
    }

    /// Where the visible cursor is.
    pub fn cursor(&self) -> ScreenPoint {
        self.state().cursor
    }

    /// The last cursor shape selected.
    pub fn cursor_shape(&self) -> EditMode {
        self.state().shape
    }

    /// How many times the bell rang.
    pub fn beeps(&self) -> usize {
        self.state().beeps
    }

    /// How many times output was flushed.
    pub fn flushes(&self) -> usize {
        self.state().flushes
    }

    /// Set the lock-key state reported to the form.
    pub fn set_lock_keys(&self, locks: LockKeys) {
        self.state().locks = locks;
    }

    /// Resize the terminal; existing content is discarded.
    pub fn resize(&self, size: ScreenSize) {
        let mut state = self.state();
        state.size = size;
        state.cells = vec![(' ', ColorPair::default()); (size.width.max(0) * size.height.max(0)) as usize];
        state.cursor = state.cursor.clamp_to(size);
    }

    /// Make every following output call fail with the given I/O error.
    pub fn fail_output(&self, kind: Option<std::io::ErrorKind>) {
        self.state().fail_with = kind;
    }
}

impl Driver for HeadlessDriver {
    fn size(&mut self) -> ScreenSize {
        self.state().size
    }

    fn put_cell(&mut self, at: ScreenPoint, ch: char, color: ColorPair) -> Result<()> {
        let mut state = self.state();
        if let Some(kind) = state.fail_with {
            return Err(Error::Io(kind));
        }
        if !state.size.contains(at) {
            return Err(Error::OutOfBounds {
                x: at.x,
                y: at.y,
                max_x: state.size.width,
                max_y: state.size.height,
            });
        }
        let index = (at.y * state.size.width + at.x) as usize;
        state.cells[index] = (ch, color);
        Ok(())
    }

    fn move_cursor(&mut self, to: ScreenPoint) -> Result<()> {
        let mut state = self.state();
        if let Some(kind) = state.fail_with {
            return Err(Error::Io(kind));
        }
        state.cursor = to.clamp_to(state.size);
        Ok(())
    }

    fn set_cursor_shape(&mut self, mode: EditMode) -> Result<()> {
        self.state().shape = mode;
        Ok(())
    }

    fn lock_keys(&mut self) -> LockKeys {
        let state = self.state();
        let mut locks = state.locks - LockKeys::INSERT;
        if state.shape == EditMode::Insert {
            locks |= LockKeys::INSERT;
        }
        locks
    }

    fn beep(&mut self) -> Result<()> {
        self.state().beeps += 1;
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        let mut state = self.state();
        if let Some(kind) = state.fail_with {
            return Err(Error::Io(kind));
        }
        state.flushes += 1;
        Ok(())
    }
}
