//! Fields.
//!
//! A [`Field`] is one on-screen input control bound to a single typed
//! value. It pairs a [`StringManager`] with presentation metadata and a
//! [`FieldKind`] that decides which keys are acceptable.

use crate::color::FieldColors;
use crate::error::{Error, Result};
use crate::key::{KeyCode, KeyEvent, Modifiers};
use crate::kinds::{FieldKind, Formatter, KeyHandler, KeyOutcome, Validator};
use crate::screen::ScreenBuffer;
use crate::string_manager::StringManager;
use crate::types::{EditMode, FieldBounds, ScreenPoint};
use crate::value::FieldValue;
use regex::Regex;
use unicode_width::UnicodeWidthStr;

/// Compile a pattern that must match a whole string.
fn compile_anchored(pattern: &str) -> Result<Regex> {
    Regex::new(&format!("^(?:{})$", pattern)).map_err(|e| Error::InvalidPattern {
        pattern: pattern.to_string(),
        message: e.to_string(),
    })
}

/// One input control of a form.
#[derive(Clone, Debug)]
pub struct Field {
    /// Editable text.
    text: StringManager,
    /// Label painted next to the field.
    title: String,
    /// Where the label starts.
    title_location: ScreenPoint,
    /// Where the field is.
    bounds: FieldBounds,
    /// Key in the result map.
    data_name: String,
    /// Paint colors.
    colors: FieldColors,
    /// Whether editing keys are refused.
    read_only: bool,
    /// Every typed character must match.
    filter: Option<Regex>,
    /// The whole text must match.
    validation: Option<Regex>,
    /// Value type.
    kind: FieldKind,
    /// Value at creation, restored by [`Field::revert`].
    original: FieldValue,
}

impl Field {
    /// Create a field showing `value`.
    ///
    /// Fails with [`Error::KindMismatch`] if the value is not of the kind's
    /// type, and with [`Error::InvalidDimensions`] if the bounds are too
    /// narrow for a fixed-width kind or too small to show `value` whole.
    pub fn new(
        kind: impl Into<FieldKind>,
        data_name: impl Into<String>,
        bounds: FieldBounds,
        value: FieldValue,
    ) -> Result<Self> {
        let kind = kind.into();
        let min_width = match &kind {
            FieldKind::Boolean(k) => k.words.width(),
            FieldKind::DateTime(k) => k.layout.width(),
            _ => 1,
        };
        if (bounds.width as usize) < min_width {
            return Err(Error::InvalidDimensions {
                width: bounds.width,
                height: bounds.height,
            });
        }

        let shown = kind.format(&value)?;
        let text = StringManager::with_text(bounds.width, bounds.height, &shown)?;
        if !text.fits_text(&shown) {
            return Err(Error::InvalidDimensions {
                width: bounds.width,
                height: bounds.height,
            });
        }
        Ok(Self {
            text,
            title: String::new(),
            title_location: bounds.location,
            bounds,
            data_name: data_name.into(),
            colors: FieldColors::default(),
            read_only: false,
            filter: None,
            validation: None,
            kind,
            original: value,
        })
    }

    /// Create a field holding the kind's empty value.
    pub fn empty(kind: impl Into<FieldKind>, data_name: impl Into<String>, bounds: FieldBounds) -> Result<Self> {
        let kind = kind.into();
        let value = kind.default_value();
        Self::new(kind, data_name, bounds, value)
    }

    /// Set the label and where it is painted.
    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>, location: ScreenPoint) -> Self {
        self.title = title.into();
        self.title_location = location;
        self
    }

    /// Set the paint colors.
    #[must_use]
    pub fn with_colors(mut self, colors: FieldColors) -> Self {
        self.colors = colors;
        self
    }

    /// Refuse or allow editing.
    #[must_use]
    pub fn read_only(mut self, read_only: bool) -> Self {
        self.read_only = read_only;
        self
    }

    /// Only accept typed characters matching `pattern`.
    pub fn with_filter(mut self, pattern: &str) -> Result<Self> {
        self.filter = Some(compile_anchored(pattern)?);
        Ok(self)
    }

    /// Only consider the data valid if all of it matches `pattern`.
    pub fn with_validation(mut self, pattern: &str) -> Result<Self> {
        self.validation = Some(compile_anchored(pattern)?);
        Ok(self)
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    /// Key in the result map.
    pub fn data_name(&self) -> &str {
        &self.data_name
    }

    /// The label.
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Field rectangle.
    pub fn bounds(&self) -> FieldBounds {
        self.bounds
    }

    /// Rectangle covered by the label, if there is one.
    pub fn title_bounds(&self) -> Option<FieldBounds> {
        let width = self.title.width() as i32;
        FieldBounds::new(self.title_location, width, 1).ok()
    }

    /// The value type.
    pub fn kind(&self) -> &FieldKind {
        &self.kind
    }

    /// Paint colors.
    pub fn colors(&self) -> &FieldColors {
        &self.colors
    }

    /// Whether editing keys are refused.
    pub fn is_read_only(&self) -> bool {
        self.read_only
    }

    /// The current text, with line breaks as `"\r\n"`.
    pub fn text(&self) -> String {
        self.text.text()
    }

    /// The string manager.
    pub fn manager(&self) -> &StringManager {
        &self.text
    }

    /// Mutable access to the string manager.
    pub fn manager_mut(&mut self) -> &mut StringManager {
        &mut self.text
    }

    /// Whether Enter edits this field rather than moving to the next one.
    pub fn takes_enter(&self) -> bool {
        !self.read_only && self.kind.accepts_enter(&self.text)
    }

    /// Absolute position of the insertion point.
    pub fn cursor_position(&self) -> ScreenPoint {
        self.bounds.absolute(self.text.cursor_point())
    }

    /// Put the insertion point at the offset nearest to absolute point `p`.
    pub fn place_cursor(&mut self, p: ScreenPoint) {
        let offset = self.text.point_to_offset(self.bounds.relative(p));
        self.text.set_offset(offset);
    }

    // ========================================================================
    // Operations
    // ========================================================================

    /// Paint the label and the content; the cursor is left where it was.
    pub fn write(&self, screen: &mut ScreenBuffer, template: char) -> Result<()> {
        self.paint(screen, template, true)
    }

    /// Paint the label and the content, optionally leaving the cursor at
    /// the insertion point.
    pub fn paint(&self, screen: &mut ScreenBuffer, template: char, restore_cursor: bool) -> Result<()> {
        if !self.title.is_empty() {
            let saved = screen.get_cursor();
            let color = if self.is_valid_data() {
                self.colors.title
            } else {
                self.colors.invalid
            };
            screen.write_at(self.title_location, &self.title, color)?;
            screen.set_cursor(saved)?;
        }
        self.text
            .render(screen, self.bounds, &self.colors, template, restore_cursor)
    }

    /// Apply a keystroke. Nothing is painted.
    pub fn process_key(&mut self, key: KeyEvent, mode: EditMode) -> KeyOutcome {
        if let Some(ch) = key.typed_char() {
            if self.read_only {
                return KeyOutcome::Rejected;
            }
            if let Some(filter) = &self.filter {
                let mut buf = [0u8; 4];
                if !filter.is_match(ch.encode_utf8(&mut buf)) {
                    tracing::trace!(field = %self.data_name, %ch, "character filtered");
                    return KeyOutcome::Rejected;
                }
            }
        }
        if !self.read_only {
            if let Some(outcome) = self.kind.handle_key(&mut self.text, key, mode) {
                return outcome;
            }
        }
        self.generic_key(key)
    }

    /// Editing and selection keys shared by every kind.
    fn generic_key(&mut self, key: KeyEvent) -> KeyOutcome {
        let done = |changed: bool| {
            if changed {
                KeyOutcome::Handled
            } else {
                KeyOutcome::Rejected
            }
        };
        let offset = self.text.offset();
        match (key.code, key.modifiers) {
            (KeyCode::Backspace | KeyCode::Delete, _) if self.read_only => KeyOutcome::Rejected,
            (KeyCode::Backspace, m) if m.is_empty() => done(self.text.delete_left()),
            (KeyCode::Delete, m) if m.is_empty() => done(self.text.delete_right()),
            (KeyCode::Home, m) if m == Modifiers::SHIFT => {
                self.text.extend_selection(0);
                KeyOutcome::Handled
            }
            (KeyCode::End, m) if m == Modifiers::SHIFT => {
                self.text.extend_selection(self.text.len());
                KeyOutcome::Handled
            }
            (KeyCode::Home, m) if m.is_empty() => {
                self.text.set_offset(0);
                KeyOutcome::Handled
            }
            (KeyCode::End, m) if m.is_empty() => {
                self.text.set_offset(self.text.len());
                KeyOutcome::Handled
            }
            (KeyCode::Left, m) if m == Modifiers::SHIFT => {
                self.text.extend_selection(offset.saturating_sub(1));
                KeyOutcome::Handled
            }
            (KeyCode::Right, m) if m == Modifiers::SHIFT => {
                self.text.extend_selection(offset + 1);
                KeyOutcome::Handled
            }
            (KeyCode::Left, m) if m == Modifiers::ALT => {
                if self.text.word_left() {
                    KeyOutcome::Handled
                } else {
                    KeyOutcome::Ignored
                }
            }
            (KeyCode::Right, m) if m == Modifiers::ALT => {
                if self.text.word_right() {
                    KeyOutcome::Handled
                } else {
                    KeyOutcome::Ignored
                }
            }
            (KeyCode::Char('a'), m) if m == Modifiers::CTRL => {
                self.text.select_all();
                KeyOutcome::Handled
            }
            _ => KeyOutcome::Ignored,
        }
    }

    /// Whether the text is a legal value and matches the validation pattern.
    pub fn is_valid_data(&self) -> bool {
        let text = self.text.text();
        self.kind.is_valid(&text) && self.validation.as_ref().map_or(true, |re| re.is_match(&text))
    }

    /// Restore the value the field was created with.
    pub fn revert(&mut self) {
        // The original value was formatted successfully at construction.
        if let Ok(shown) = self.kind.format(&self.original) {
            self.text.set_text(&shown);
        }
        self.text.set_offset(0);
    }

    /// The value currently entered.
    pub fn to_value(&self) -> Result<FieldValue> {
        self.kind.parse(&self.text.text())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::HeadlessDriver;
    use crate::kinds::{BoolWords, BooleanKind, DateLayout, DateTimeKind, IntWidth, IntegerKind, TextKind};
    use crate::types::ScreenSize;

    fn bounds(x: i32, y: i32, w: i32) -> FieldBounds {
        FieldBounds::new(ScreenPoint::new(x, y), w, 1).unwrap()
    }

    #[test]
    fn test_kind_mismatch() {
        let err = Field::new(TextKind, "name", bounds(0, 0, 5), FieldValue::Int(3)).unwrap_err();
        assert_eq!(
            err,
            Error::KindMismatch {
                kind: "String",
                value: "integer"
            }
        );
    }

    #[test]
    fn test_too_narrow_for_date() {
        let result = Field::empty(DateTimeKind::new(DateLayout::Date), "d", bounds(0, 0, 8));
        assert!(matches!(result, Err(Error::InvalidDimensions { .. })));
    }

    #[test]
    fn test_value_wider_than_field() {
        let result = Field::new(IntegerKind::new(IntWidth::I64), "n", bounds(0, 0, 3), FieldValue::Int(12345));
        assert!(matches!(result, Err(Error::InvalidDimensions { width: 3, height: 1 })));

        let field = Field::new(IntegerKind::new(IntWidth::I64), "n", bounds(0, 0, 5), FieldValue::Int(12345)).unwrap();
        assert_eq!(field.to_value().unwrap(), FieldValue::Int(12345));
    }

    #[test]
    fn test_invalid_pattern() {
        let field = Field::empty(TextKind, "name", bounds(0, 0, 5)).unwrap();
        assert!(matches!(
            field.with_filter("[a-"),
            Err(Error::InvalidPattern { .. })
        ));
    }

    #[test]
    fn test_filter_and_validation() {
        let mut field = Field::empty(TextKind, "code", bounds(0, 0, 6))
            .unwrap()
            .with_filter("[A-F0-9]")
            .unwrap()
            .with_validation("[A-F0-9]{4}")
            .unwrap();
        assert_eq!(field.process_key(KeyEvent::char('g'), EditMode::Insert), KeyOutcome::Rejected);
        for ch in "BEEF".chars() {
            assert_eq!(field.process_key(KeyEvent::char(ch), EditMode::Insert), KeyOutcome::Handled);
        }
        assert!(field.is_valid_data());
        field.process_key(KeyEvent::plain(KeyCode::Backspace), EditMode::Insert);
        assert!(!field.is_valid_data());
    }

    #[test]
    fn test_read_only() {
        let mut field = Field::new(TextKind, "n", bounds(0, 0, 5), "abc".into())
            .unwrap()
            .read_only(true);
        assert_eq!(field.process_key(KeyEvent::char('x'), EditMode::Insert), KeyOutcome::Rejected);
        assert_eq!(
            field.process_key(KeyEvent::plain(KeyCode::Backspace), EditMode::Insert),
            KeyOutcome::Rejected
        );
        assert_eq!(field.process_key(KeyEvent::plain(KeyCode::End), EditMode::Insert), KeyOutcome::Handled);
        assert_eq!(field.text(), "abc");
    }

    #[test]
    fn test_selection_keys() {
        let mut field = Field::new(TextKind, "n", bounds(0, 0, 10), "one two".into()).unwrap();
        field.process_key(KeyEvent::plain(KeyCode::End), EditMode::Insert);
        field.process_key(KeyEvent::alt(KeyCode::Left), EditMode::Insert);
        assert_eq!(field.manager().offset(), 4);
        field.process_key(KeyEvent::shift(KeyCode::End), EditMode::Insert);
        assert_eq!(field.manager().selected_text().as_deref(), Some("two"));
        field.process_key(KeyEvent::char('X'), EditMode::Insert);
        assert_eq!(field.text(), "one X");
        field.process_key(KeyEvent::ctrl(KeyCode::Char('a')), EditMode::Insert);
        field.process_key(KeyEvent::plain(KeyCode::Delete), EditMode::Insert);
        assert_eq!(field.text(), "");
    }

    #[test]
    fn test_revert_is_idempotent() {
        let mut field = Field::new(IntegerKind::new(IntWidth::I32), "n", bounds(0, 0, 6), FieldValue::Int(42)).unwrap();
        field.process_key(KeyEvent::plain(KeyCode::End), EditMode::Insert);
        field.process_key(KeyEvent::char('7'), EditMode::Insert);
        assert_eq!(field.to_value().unwrap(), FieldValue::Int(427));
        field.revert();
        let once = field.text();
        field.revert();
        assert_eq!(field.text(), once);
        assert_eq!(field.to_value().unwrap(), FieldValue::Int(42));
    }

    #[test]
    fn test_write_paints_title_by_validity() {
        let driver = HeadlessDriver::new(ScreenSize::new(30, 5));
        let mut screen = ScreenBuffer::new(Box::new(driver.clone()));
        let mut field = Field::new(BooleanKind::new(BoolWords::YesNo), "ok", bounds(10, 1, 3), false.into())
            .unwrap()
            .with_title("OK?", ScreenPoint::new(2, 1));
        field.write(&mut screen, '_').unwrap();
        assert_eq!(driver.text_at(ScreenPoint::new(2, 1), 11), "OK?     No_");
        assert_eq!(driver.cell(ScreenPoint::new(2, 1)).map(|c| c.1), Some(field.colors().title));

        field.manager_mut().set_text("??");
        field.write(&mut screen, '_').unwrap();
        assert_eq!(driver.cell(ScreenPoint::new(2, 1)).map(|c| c.1), Some(field.colors().invalid));
        assert_eq!(screen.get_cursor(), ScreenPoint::new(0, 0));
    }

    #[test]
    fn test_wide_chars_stay_inside_field() {
        let driver = HeadlessDriver::new(ScreenSize::new(20, 3));
        let mut screen = ScreenBuffer::new(Box::new(driver.clone()));
        let mut field = Field::empty(TextKind, "cjk", bounds(2, 1, 4)).unwrap();
        let outcomes: Vec<_> = (0..4)
            .map(|_| field.process_key(KeyEvent::char('中'), EditMode::Insert))
            .collect();
        assert_eq!(
            outcomes,
            [KeyOutcome::Handled, KeyOutcome::Handled, KeyOutcome::Rejected, KeyOutcome::Rejected]
        );
        field.write(&mut screen, '_').unwrap();
        assert_eq!(driver.text_at(ScreenPoint::new(6, 1), 4), "    ");
        assert_eq!(field.cursor_position(), ScreenPoint::new(6, 1));
    }

    #[test]
    fn test_title_bounds() {
        let field = Field::empty(TextKind, "n", bounds(10, 1, 3))
            .unwrap()
            .with_title("Name:", ScreenPoint::new(3, 1));
        let title = field.title_bounds().unwrap();
        assert_eq!((title.left(), title.right()), (3, 8));
        assert!(Field::empty(TextKind, "m", bounds(0, 0, 3)).unwrap().title_bounds().is_none());
    }
}
