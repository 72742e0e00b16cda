//! Field string manager.
//!
//! A [`StringManager`] owns the text of one field and keeps three things in
//! step: the logical insertion offset, the selection, and the 2D layout of
//! the text inside the field's rectangle.
//!
//! Line breaks are held as a single `'\n'` so that a break is one offset
//! position and is deleted atomically; [`StringManager::text`] reports them
//! as `"\r\n"`. Layout wraps eagerly: once a row is full the next position
//! is column 0 of the following row. Columns are display cells, so a
//! double-width character takes two and never straddles a row end.

use crate::color::{ColorPair, FieldColors};
use crate::error::{Error, Result};
use crate::screen::ScreenBuffer;
use crate::types::{Coord, EditMode, FieldBounds, ScreenPoint};
use unicode_width::UnicodeWidthChar;

const BREAK: char = '\n';

fn cell_width(ch: char) -> usize {
    ch.width().unwrap_or(0)
}

/// Whether `ch` belongs to a word for word-wise movement.
pub fn is_word_char(ch: char) -> bool {
    ch.is_ascii_alphanumeric() || ch == '_'
}

/// Text, insertion offset and selection of one field.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StringManager {
    content: Vec<char>,
    offset: usize,
    selection_start: Option<usize>,
    selection_length: usize,
    width: usize,
    height: usize,
}

impl StringManager {
    /// Create an empty manager for a field of the given size.
    pub fn new(width: Coord, height: Coord) -> Result<Self> {
        if width < 1 || height < 1 {
            return Err(Error::InvalidDimensions { width, height });
        }
        Ok(Self {
            content: Vec::new(),
            offset: 0,
            selection_start: None,
            selection_length: 0,
            width: width as usize,
            height: height as usize,
        })
    }

    /// Create a manager holding `text`, truncated to fit.
    pub fn with_text(width: Coord, height: Coord, text: &str) -> Result<Self> {
        let mut manager = Self::new(width, height)?;
        manager.set_text(text);
        Ok(manager)
    }

    /// Field width in cells.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Field height in rows.
    pub fn height(&self) -> usize {
        self.height
    }

    /// Whether the field spans more than one row.
    pub fn is_multiline(&self) -> bool {
        self.height > 1
    }

    // ========================================================================
    // Content
    // ========================================================================

    /// The text, with line breaks as `"\r\n"`.
    pub fn text(&self) -> String {
        let mut out = String::with_capacity(self.content.len());
        for &ch in &self.content {
            if ch == BREAK {
                out.push_str("\r\n");
            } else {
                out.push(ch);
            }
        }
        out
    }

    /// The characters, with each line break as one `'\n'`.
    pub fn chars(&self) -> &[char] {
        &self.content
    }

    /// Number of offset positions in the content.
    pub fn len(&self) -> usize {
        self.content.len()
    }

    /// Whether the content is empty.
    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }

    /// The character at `offset`, if any.
    pub fn char_at(&self, offset: usize) -> Option<char> {
        self.content.get(offset).copied()
    }

    /// Replace the whole content, truncating what does not fit.
    ///
    /// The selection is cleared and the offset clamped.
    pub fn set_text(&mut self, text: &str) {
        self.content = self.normalize(text);
        self.truncate_to_fit();
        self.clear_selection();
        self.offset = self.offset.min(self.content.len());
    }

    /// Whether `text` fits the field without truncation.
    pub fn fits_text(&self, text: &str) -> bool {
        self.fits(&self.normalize(text))
    }

    /// Convert external text into stored characters: breaks become `'\n'`
    /// (or vanish in a single-line field). Control and zero-width characters
    /// are dropped.
    fn normalize(&self, text: &str) -> Vec<char> {
        let mut out = Vec::with_capacity(text.len());
        let mut chars = text.chars().peekable();
        while let Some(ch) = chars.next() {
            match ch {
                '\r' | '\n' => {
                    if ch == '\r' && chars.peek() == Some(&'\n') {
                        chars.next();
                    }
                    if self.is_multiline() {
                        out.push(BREAK);
                    }
                }
                c if c.is_control() || cell_width(c) == 0 => {}
                c => out.push(c),
            }
        }
        out
    }

    // ========================================================================
    // Layout
    // ========================================================================

    /// Uncapped layout position of every offset `0..=len` of `content`.
    ///
    /// A character that would cross the right edge starts the next row.
    fn layout_of(&self, content: &[char]) -> Vec<ScreenPoint> {
        let mut points = Vec::with_capacity(content.len() + 1);
        let (mut col, mut row) = (0usize, 0);
        for &ch in content {
            if ch == BREAK {
                points.push(ScreenPoint::new(col as Coord, row));
                col = 0;
                row += 1;
                continue;
            }
            let width = cell_width(ch);
            if col > 0 && col + width > self.width {
                col = 0;
                row += 1;
            }
            points.push(ScreenPoint::new(col as Coord, row));
            col += width;
            if col >= self.width {
                col = 0;
                row += 1;
            }
        }
        points.push(ScreenPoint::new(col as Coord, row));
        points
    }

    /// Length of the longest prefix of `content` that fits the field.
    fn fitting_len(&self, content: &[char]) -> usize {
        let last_row = self.height as Coord - 1;
        let points = self.layout_of(content);
        content
            .iter()
            .zip(&points)
            .position(|(&ch, p)| {
                p.y > last_row
                    || (ch == BREAK && p.y >= last_row)
                    || p.x as usize + cell_width(ch) > self.width
            })
            .unwrap_or(content.len())
    }

    fn fits(&self, content: &[char]) -> bool {
        self.fitting_len(content) == content.len()
    }

    fn truncate_to_fit(&mut self) {
        let len = self.fitting_len(&self.content);
        self.content.truncate(len);
    }

    fn cap(&self, p: ScreenPoint) -> ScreenPoint {
        let last_row = self.height as Coord - 1;
        if p.y > last_row {
            ScreenPoint::new(self.width as Coord, last_row)
        } else {
            p
        }
    }

    /// Field-relative point of `offset`.
    ///
    /// An offset just past a completely full field maps to one column past
    /// the last cell of the last row.
    pub fn offset_to_point(&self, offset: usize) -> ScreenPoint {
        let offset = offset.min(self.content.len());
        let points = self.layout_of(&self.content[..offset]);
        self.cap(points[offset])
    }

    /// Offset at field-relative point `p`.
    ///
    /// Points between or after characters on a row resolve to the last
    /// offset on that row left of `p`; points below the text resolve to the
    /// end of the content.
    pub fn point_to_offset(&self, p: ScreenPoint) -> usize {
        let len = self.content.len();
        let x = p.x.max(0);
        let mut best = None;
        for (offset, point) in self.layout_of(&self.content).into_iter().enumerate() {
            let point = self.cap(point);
            if point.y == p.y {
                if point.x == x {
                    return offset;
                }
                if point.x < x {
                    best = Some(offset);
                }
            }
        }
        best.unwrap_or(len)
    }

    /// Field-relative point of the insertion offset.
    pub fn cursor_point(&self) -> ScreenPoint {
        self.offset_to_point(self.offset)
    }

    // ========================================================================
    // Offset and selection
    // ========================================================================

    /// The insertion offset.
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Move the insertion offset (clamped) and clear the selection.
    pub fn set_offset(&mut self, offset: usize) {
        self.offset = offset.min(self.content.len());
        self.clear_selection();
    }

    /// Active selection as `(start, length)`.
    pub fn selection(&self) -> Option<(usize, usize)> {
        self.selection_start
            .filter(|_| self.selection_length > 0)
            .map(|start| (start, self.selection_length))
    }

    fn selection_range(&self) -> Option<(usize, usize)> {
        self.selection().map(|(start, len)| (start, start + len))
    }

    /// The selected text, with breaks as `"\r\n"`.
    pub fn selected_text(&self) -> Option<String> {
        self.selection_range().map(|(start, end)| {
            self.content[start..end]
                .iter()
                .fold(String::new(), |mut s, &ch| {
                    if ch == BREAK {
                        s.push_str("\r\n");
                    } else {
                        s.push(ch);
                    }
                    s
                })
        })
    }

    /// Select `length` characters from `start`, clamped to the content.
    pub fn select(&mut self, start: usize, length: usize) {
        let len = self.content.len();
        let start = start.min(len);
        let length = length.min(len - start);
        if length == 0 {
            self.clear_selection();
        } else {
            self.selection_start = Some(start);
            self.selection_length = length;
        }
    }

    /// Select everything and put the offset at the end.
    pub fn select_all(&mut self) {
        self.offset = self.content.len();
        self.select(0, self.content.len());
    }

    /// Drop the selection.
    pub fn clear_selection(&mut self) {
        self.selection_start = None;
        self.selection_length = 0;
    }

    /// Move the offset to `to`, extending the selection from its anchor.
    pub fn extend_selection(&mut self, to: usize) {
        let to = to.min(self.content.len());
        let anchor = match self.selection_range() {
            Some((start, end)) if self.offset == start => end,
            Some((start, _)) => start,
            None => self.offset,
        };
        self.offset = to;
        self.select(anchor.min(to), anchor.abs_diff(to));
    }

    // ========================================================================
    // Editing
    // ========================================================================

    fn take_selection(&mut self) -> bool {
        match self.selection_range() {
            Some((start, end)) => {
                self.content.drain(start..end);
                self.offset = start;
                self.clear_selection();
                true
            }
            None => false,
        }
    }

    /// Insert `text` at the offset.
    ///
    /// An active selection is replaced. Otherwise the text is spliced in
    /// (insert mode) or replaces the characters after the offset up to the
    /// next line break (overwrite mode). Returns `false`, leaving the
    /// content untouched, if the result would not fit the field.
    pub fn insert(&mut self, text: &str, mode: EditMode) -> bool {
        let text = self.normalize(text);
        if text.is_empty() {
            return false;
        }

        let mut content = self.content.clone();
        let mut offset = self.offset;
        if let Some((start, end)) = self.selection_range() {
            content.drain(start..end);
            offset = start;
        }

        let end = match mode {
            EditMode::Overwrite if self.selection().is_none() => {
                let mut end = offset;
                while end < content.len() && end - offset < text.len() && content[end] != BREAK {
                    end += 1;
                }
                end
            }
            _ => offset,
        };
        content.splice(offset..end, text.iter().copied());

        if !self.fits(&content) {
            return false;
        }
        self.content = content;
        self.offset = offset + text.len();
        self.clear_selection();
        true
    }

    /// Delete the selection, or the character left of the offset.
    pub fn delete_left(&mut self) -> bool {
        if self.take_selection() {
            return true;
        }
        if self.offset == 0 {
            return false;
        }
        self.offset -= 1;
        self.content.remove(self.offset);
        true
    }

    /// Delete the selection, or the character right of the offset.
    pub fn delete_right(&mut self) -> bool {
        if self.take_selection() {
            return true;
        }
        if self.offset >= self.content.len() {
            return false;
        }
        self.content.remove(self.offset);
        true
    }

    /// Move to the start of the previous word. No-op if there is none.
    pub fn word_left(&mut self) -> bool {
        let mut i = self.offset;
        while i > 0 && !is_word_char(self.content[i - 1]) {
            i -= 1;
        }
        if i == 0 {
            return false;
        }
        while i > 0 && is_word_char(self.content[i - 1]) {
            i -= 1;
        }
        self.set_offset(i);
        true
    }

    /// Move to the start of the next word. No-op if there is none.
    pub fn word_right(&mut self) -> bool {
        let len = self.content.len();
        let mut i = self.offset;
        while i < len && is_word_char(self.content[i]) {
            i += 1;
        }
        while i < len && !is_word_char(self.content[i]) {
            i += 1;
        }
        if i == len {
            return false;
        }
        self.set_offset(i);
        true
    }

    // ========================================================================
    // Rendering
    // ========================================================================

    /// Repaint the field rectangle.
    ///
    /// Content is painted in the data color, the selection in the selection
    /// color, and unused cells with `template` in the base color. The cursor
    /// is left at the insertion point, or where it was before if
    /// `restore_cursor` is set.
    pub fn render(
        &self,
        screen: &mut ScreenBuffer,
        bounds: FieldBounds,
        colors: &FieldColors,
        template: char,
        restore_cursor: bool,
    ) -> Result<()> {
        let saved = screen.get_cursor();
        let selection = self.selection_range();
        let points = self.layout_of(&self.content);

        let mut rows: Vec<Vec<(char, ColorPair)>> = vec![Vec::new(); self.height];
        for (i, &ch) in self.content.iter().enumerate() {
            if ch == BREAK {
                continue;
            }
            let color = match selection {
                Some((start, end)) if i >= start && i < end => colors.selection,
                _ => colors.data,
            };
            if let Some(row) = rows.get_mut(points[i].y as usize) {
                row.push((ch, color));
            }
        }

        for (y, row) in rows.iter().enumerate() {
            let origin = bounds.location.offset(0, y as Coord);
            let mut col = 0;
            let mut rest = row.as_slice();
            while let Some(&(_, color)) = rest.first() {
                let run = rest.iter().take_while(|(_, c)| *c == color).count();
                let text: String = rest[..run].iter().map(|(ch, _)| *ch).collect();
                screen.write_at(origin.offset(col, 0), &text, color)?;
                col += rest[..run].iter().map(|&(ch, _)| cell_width(ch)).sum::<usize>() as Coord;
                rest = &rest[run..];
            }
            if (col as usize) < self.width {
                let rest = FieldBounds {
                    location: origin.offset(col, 0),
                    width: self.width as Coord - col,
                    height: 1,
                };
                screen.fill_rect(rest, template, colors.base)?;
            }
        }

        let cursor = if restore_cursor {
            saved
        } else {
            bounds.absolute(self.cursor_point())
        };
        screen.set_cursor(cursor)?;
        Ok(())
    }
}
