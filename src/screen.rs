//! Screen buffer I/O.
//!
//! [`ScreenBuffer`] is the only layer that talks to a [`Driver`]. It keeps a
//! shadow grid of every painted cell so that text already on screen can be
//! read back, and it writes through to the driver on every operation: there
//! is no batching across calls.

use crate::color::ColorPair;
use crate::driver::Driver;
use crate::error::{Error, Result};
use crate::render::{CellWriter, PlainRender, Render};
use crate::types::{Coord, EditMode, FieldBounds, LockKeys, ScreenPoint, ScreenSize};
use std::sync::Arc;
use unicode_width::UnicodeWidthChar;

/// One painted terminal cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Cell {
    /// The character shown.
    pub ch: char,
    /// Its colors.
    pub color: ColorPair,
}

impl Default for Cell {
    fn default() -> Self {
        Self {
            ch: ' ',
            color: ColorPair::default(),
        }
    }
}

/// Cell-level access to the terminal screen.
pub struct ScreenBuffer {
    /// The terminal driver.
    driver: Box<dyn Driver>,
    /// Text painting primitive used by [`ScreenBuffer::write_at`].
    renderer: Arc<dyn Render>,
    /// Grid size.
    size: ScreenSize,
    /// Shadow copy of the screen, row-major.
    cells: Vec<Cell>,
    /// Logical cursor. May sit one past the right edge while text is painted.
    cursor: ScreenPoint,
}

impl ScreenBuffer {
    /// Create a screen buffer over a driver using [`PlainRender`].
    pub fn new(driver: Box<dyn Driver>) -> Self {
        Self::with_renderer(driver, Arc::new(PlainRender))
    }

    /// Create a screen buffer with a custom text renderer.
    pub fn with_renderer(mut driver: Box<dyn Driver>, renderer: Arc<dyn Render>) -> Self {
        let size = driver.size();
        Self {
            driver,
            renderer,
            size,
            cells: vec![Cell::default(); cell_count(size)],
            cursor: ScreenPoint::default(),
        }
    }

    /// Replace the text renderer.
    pub fn set_renderer(&mut self, renderer: Arc<dyn Render>) {
        self.renderer = renderer;
    }

    /// Grid size as of the last [`refresh_size`](Self::refresh_size).
    pub fn size(&self) -> ScreenSize {
        self.size
    }

    /// Re-query the terminal size, resizing the shadow grid if it changed.
    pub fn refresh_size(&mut self) -> ScreenSize {
        let size = self.driver.size();
        if size != self.size {
            let mut cells = vec![Cell::default(); cell_count(size)];
            for y in 0..size.height.min(self.size.height) {
                for x in 0..size.width.min(self.size.width) {
                    cells[(y * size.width + x) as usize] = self.cells[self.index(ScreenPoint::new(x, y))];
                }
            }
            tracing::debug!(from = ?self.size, to = ?size, "screen resized");
            self.cells = cells;
            self.size = size;
            self.cursor = self.cursor.clamp_to(size);
        }
        size
    }

    fn index(&self, p: ScreenPoint) -> usize {
        (p.y * self.size.width + p.x) as usize
    }

    fn out_of_bounds(&self, p: ScreenPoint) -> Error {
        Error::OutOfBounds {
            x: p.x,
            y: p.y,
            max_x: self.size.width,
            max_y: self.size.height,
        }
    }

    // ========================================================================
    // Cursor
    // ========================================================================

    /// The cursor position, always on screen.
    pub fn get_cursor(&self) -> ScreenPoint {
        self.cursor.clamp_to(self.size)
    }

    /// Move the cursor, clamped to the screen. Returns where it landed.
    pub fn set_cursor(&mut self, p: ScreenPoint) -> Result<ScreenPoint> {
        self.cursor = p.clamp_to(self.size);
        self.driver.move_cursor(self.cursor)?;
        self.driver.flush()?;
        Ok(self.cursor)
    }

    /// Select the cursor shape mirroring the edit mode.
    pub fn set_cursor_shape(&mut self, mode: EditMode) -> Result<()> {
        self.driver.set_cursor_shape(mode)?;
        self.driver.flush()
    }

    // ========================================================================
    // Reading back
    // ========================================================================

    /// The cell at `p`.
    pub fn read_char(&self, p: ScreenPoint) -> Result<Cell> {
        if !self.size.contains(p) {
            return Err(self.out_of_bounds(p));
        }
        Ok(self.cells[self.index(p)])
    }

    /// The text of row `y`.
    pub fn read_line(&self, y: Coord) -> Result<String> {
        if y < 0 || y >= self.size.height {
            return Err(self.out_of_bounds(ScreenPoint::new(0, y)));
        }
        let start = self.index(ScreenPoint::new(0, y));
        Ok(self.cells[start..start + self.size.width as usize]
            .iter()
            .map(|c| c.ch)
            .collect())
    }

    /// The text of a rectangle, one string per row.
    pub fn read_block(&self, bounds: FieldBounds) -> Result<Vec<String>> {
        if !bounds.fits(self.size) {
            return Err(self.out_of_bounds(ScreenPoint::new(bounds.right() - 1, bounds.bottom() - 1)));
        }
        Ok((bounds.top()..bounds.bottom())
            .map(|y| {
                (bounds.left()..bounds.right())
                    .map(|x| self.cells[self.index(ScreenPoint::new(x, y))].ch)
                    .collect()
            })
            .collect())
    }

    // ========================================================================
    // Painting
    // ========================================================================

    fn paint(&mut self, p: ScreenPoint, ch: char, color: ColorPair) -> Result<()> {
        self.driver.put_cell(p, ch, color)?;
        let index = self.index(p);
        self.cells[index] = Cell { ch, color };
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        self.driver.move_cursor(self.cursor.clamp_to(self.size))?;
        self.driver.flush()
    }

    /// Fill a rectangle. Cells beyond the screen are skipped.
    pub fn fill_rect(&mut self, bounds: FieldBounds, ch: char, color: ColorPair) -> Result<()> {
        for y in bounds.top().max(0)..bounds.bottom().min(self.size.height) {
            for x in bounds.left().max(0)..bounds.right().min(self.size.width) {
                self.paint(ScreenPoint::new(x, y), ch, color)?;
            }
        }
        self.finish()
    }

    /// Fill the whole screen.
    pub fn clear(&mut self, color: ColorPair) -> Result<()> {
        let full = FieldBounds {
            location: ScreenPoint::default(),
            width: self.size.width,
            height: self.size.height,
        };
        self.fill_rect(full, ' ', color)
    }

    /// Move the cursor to `p` and paint `text` through the renderer.
    ///
    /// Returns the column after the last painted cell. Characters falling
    /// off the screen are dropped.
    pub fn write_at(&mut self, p: ScreenPoint, text: &str, color: ColorPair) -> Result<Coord> {
        self.cursor = p;
        let renderer = Arc::clone(&self.renderer);
        let column = renderer.render(self, text, color)?;
        self.finish()?;
        Ok(column)
    }

    // ========================================================================
    // Terminal state
    // ========================================================================

    /// Current lock-key state.
    pub fn lock_keys(&mut self) -> LockKeys {
        self.driver.lock_keys()
    }

    /// Ring the bell.
    pub fn beep(&mut self) -> Result<()> {
        self.driver.beep()
    }
}

impl CellWriter for ScreenBuffer {
    fn put_char(&mut self, ch: char, color: ColorPair) -> Result<()> {
        let width = ch.width().unwrap_or(0) as Coord;
        let at = self.cursor;
        if self.size.contains(at) && at.x + width <= self.size.width {
            self.paint(at, ch, color)?;
            if width == 2 {
                let index = self.index(at.offset(1, 0));
                self.cells[index] = Cell { ch: ' ', color };
            }
        }
        self.cursor.x += width;
        Ok(())
    }

    fn cursor(&self) -> ScreenPoint {
        self.cursor
    }
}

fn cell_count(size: ScreenSize) -> usize {
    (size.width.max(0) * size.height.max(0)) as usize
}
