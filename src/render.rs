//! Text rendering primitive.
//!
//! Callers that use a markup language for colored text plug their renderer
//! in through [`Render`]. Field content is always handed over unformatted.

use crate::color::ColorPair;
use crate::error::Result;
use crate::types::{Coord, ScreenPoint};
use unicode_width::UnicodeWidthChar;

/// Something text can be painted into, one cell at a time.
pub trait CellWriter {
    /// Paint `ch` at the cursor and advance it by the character's width.
    fn put_char(&mut self, ch: char, color: ColorPair) -> Result<()>;

    /// Where the next character will go.
    fn cursor(&self) -> ScreenPoint;
}

/// Paints text at the writer's cursor.
pub trait Render: Send + Sync {
    /// Paint `text` in `color` and return the column after the last cell.
    fn render(&self, sink: &mut dyn CellWriter, text: &str, color: ColorPair) -> Result<Coord>;
}

/// Paints text verbatim.
///
/// Zero-width and control characters are skipped so they cannot move the
/// terminal's cursor behind the shadow grid's back.
#[derive(Clone, Copy, Debug, Default)]
pub struct PlainRender;

impl Render for PlainRender {
    fn render(&self, sink: &mut dyn CellWriter, text: &str, color: ColorPair) -> Result<Coord> {
        for ch in text.chars() {
            match ch.width() {
                Some(w) if w > 0 => sink.put_char(ch, color)?,
                _ => {}
            }
        }
        Ok(sink.cursor().x)
    }
}
