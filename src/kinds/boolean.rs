//! Boolean fields shown as a word pair.

use super::{invalid, mismatch, Formatter, KeyHandler, KeyOutcome, Validator};
use crate::error::Result;
use crate::key::{KeyCode, KeyEvent};
use crate::string_manager::StringManager;
use crate::types::EditMode;
use crate::value::FieldValue;
use unicode_width::UnicodeWidthStr;

/// The words shown for `true` and `false`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum BoolWords {
    /// Yes / No
    #[default]
    YesNo,
    /// True / False
    TrueFalse,
    /// On / Off
    OnOff,
    /// 1 / 0
    OneZero,
    /// √ / X
    CheckCross,
}

impl BoolWords {
    /// Word for `value`.
    pub const fn word(self, value: bool) -> &'static str {
        match (self, value) {
            (BoolWords::YesNo, true) => "Yes",
            (BoolWords::YesNo, false) => "No",
            (BoolWords::TrueFalse, true) => "True",
            (BoolWords::TrueFalse, false) => "False",
            (BoolWords::OnOff, true) => "On",
            (BoolWords::OnOff, false) => "Off",
            (BoolWords::OneZero, true) => "1",
            (BoolWords::OneZero, false) => "0",
            (BoolWords::CheckCross, true) => "\u{221a}",
            (BoolWords::CheckCross, false) => "X",
        }
    }

    /// Width of the longer word.
    pub fn width(self) -> usize {
        self.word(true).width().max(self.word(false).width())
    }
}

/// A boolean toggled with single keys.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BooleanKind {
    /// The displayed word pair.
    pub words: BoolWords,
}

impl BooleanKind {
    /// Create a boolean kind with the given word pair.
    pub const fn new(words: BoolWords) -> Self {
        Self { words }
    }

    fn value_of(&self, text: &str) -> Option<bool> {
        let text = text.trim();
        if text.eq_ignore_ascii_case(self.words.word(true)) {
            Some(true)
        } else if text.eq_ignore_ascii_case(self.words.word(false)) {
            Some(false)
        } else {
            None
        }
    }

    fn show(&self, text: &mut StringManager, value: bool) {
        text.set_text(self.words.word(value));
        text.set_offset(0);
    }
}

impl KeyHandler for BooleanKind {
    fn handle_key(&self, text: &mut StringManager, key: KeyEvent, _mode: EditMode) -> Option<KeyOutcome> {
        if let Some(ch) = key.typed_char() {
            let current = self.value_of(&text.text()).unwrap_or(false);
            let next = match ch.to_ascii_uppercase() {
                'Y' | 'T' | '1' | '\u{221a}' => true,
                'N' | 'F' | '0' | 'X' => false,
                'O' | ' ' => !current,
                _ => return Some(KeyOutcome::Rejected),
            };
            self.show(text, next);
            return Some(KeyOutcome::Handled);
        }
        match key.code {
            KeyCode::Home => text.set_offset(0),
            KeyCode::End => text.set_offset(text.len()),
            KeyCode::Backspace | KeyCode::Delete => return Some(KeyOutcome::Rejected),
            _ => return None,
        }
        Some(KeyOutcome::Handled)
    }
}

impl Formatter for BooleanKind {
    fn format(&self, value: &FieldValue) -> Result<String> {
        match value {
            FieldValue::Bool(v) => Ok(self.words.word(*v).to_string()),
            other => Err(mismatch("Boolean", other)),
        }
    }

    fn parse(&self, text: &str) -> Result<FieldValue> {
        self.value_of(text)
            .map(FieldValue::Bool)
            .ok_or_else(|| invalid("Boolean", text))
    }
}

impl Validator for BooleanKind {
    fn is_valid(&self, text: &str) -> bool {
        self.value_of(text).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn press(kind: &BooleanKind, sm: &mut StringManager, key: KeyEvent) -> Option<KeyOutcome> {
        kind.handle_key(sm, key, EditMode::Insert)
    }

    #[test]
    fn test_keys_set_value() {
        let kind = BooleanKind::new(BoolWords::YesNo);
        let mut sm = StringManager::with_text(3, 1, "No").unwrap();
        assert_eq!(press(&kind, &mut sm, KeyEvent::char('y')), Some(KeyOutcome::Handled));
        assert_eq!(sm.text(), "Yes");
        assert_eq!(kind.parse(&sm.text()).unwrap(), FieldValue::Bool(true));
        assert_eq!(press(&kind, &mut sm, KeyEvent::char(' ')), Some(KeyOutcome::Handled));
        assert_eq!(sm.text(), "No");
        assert_eq!(press(&kind, &mut sm, KeyEvent::char('O')), Some(KeyOutcome::Handled));
        assert_eq!(sm.text(), "Yes");
        assert_eq!(press(&kind, &mut sm, KeyEvent::char('q')), Some(KeyOutcome::Rejected));
    }

    #[test]
    fn test_home_end() {
        let kind = BooleanKind::new(BoolWords::TrueFalse);
        let mut sm = StringManager::with_text(5, 1, "False").unwrap();
        press(&kind, &mut sm, KeyEvent::plain(KeyCode::End));
        assert_eq!(sm.offset(), 5);
        press(&kind, &mut sm, KeyEvent::plain(KeyCode::Home));
        assert_eq!(sm.offset(), 0);
        assert_eq!(
            press(&kind, &mut sm, KeyEvent::plain(KeyCode::Backspace)),
            Some(KeyOutcome::Rejected)
        );
        assert_eq!(press(&kind, &mut sm, KeyEvent::plain(KeyCode::Enter)), None);
    }

    #[test]
    fn test_word_pairs() {
        assert_eq!(BoolWords::OnOff.width(), 3);
        let kind = BooleanKind::new(BoolWords::CheckCross);
        assert_eq!(kind.format(&FieldValue::Bool(true)).unwrap(), "\u{221a}");
        assert_eq!(kind.parse("X").unwrap(), FieldValue::Bool(false));
        assert!(!kind.is_valid("maybe"));
    }
}
