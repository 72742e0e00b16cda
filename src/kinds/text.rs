//! Free-text fields.

use super::{mismatch, type_char, Formatter, KeyHandler, KeyOutcome, Validator};
use crate::error::Result;
use crate::key::{KeyCode, KeyEvent};
use crate::string_manager::StringManager;
use crate::types::EditMode;
use crate::value::FieldValue;

/// Free text, constrained only by the field's patterns and bounds.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TextKind;

impl KeyHandler for TextKind {
    fn handle_key(&self, text: &mut StringManager, key: KeyEvent, mode: EditMode) -> Option<KeyOutcome> {
        if let Some(ch) = key.typed_char() {
            return Some(type_char(text, ch, mode));
        }
        match key.code {
            KeyCode::Enter if key.modifiers.is_empty() && text.is_multiline() => {
                Some(if text.insert("\r\n", EditMode::Insert) {
                    KeyOutcome::Handled
                } else {
                    KeyOutcome::Rejected
                })
            }
            _ => None,
        }
    }
}

impl Formatter for TextKind {
    fn format(&self, value: &FieldValue) -> Result<String> {
        match value {
            FieldValue::String(s) => Ok(s.clone()),
            other => Err(mismatch("String", other)),
        }
    }

    fn parse(&self, text: &str) -> Result<FieldValue> {
        Ok(FieldValue::String(text.to_string()))
    }
}

impl Validator for TextKind {
    fn is_valid(&self, _text: &str) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_enter_in_multiline() {
        let mut sm = StringManager::with_text(5, 3, "ab").unwrap();
        sm.set_offset(2);
        let enter = KeyEvent::plain(KeyCode::Enter);
        assert_eq!(TextKind.handle_key(&mut sm, enter, EditMode::Insert), Some(KeyOutcome::Handled));
        assert_eq!(sm.text(), "ab\r\n");

        let mut single = StringManager::with_text(5, 1, "ab").unwrap();
        assert_eq!(TextKind.handle_key(&mut single, enter, EditMode::Insert), None);
    }

    #[test]
    fn test_typing_into_full_field() {
        let mut sm = StringManager::with_text(2, 1, "ab").unwrap();
        sm.set_offset(2);
        assert_eq!(
            TextKind.handle_key(&mut sm, KeyEvent::char('c'), EditMode::Insert),
            Some(KeyOutcome::Rejected)
        );
    }
}
