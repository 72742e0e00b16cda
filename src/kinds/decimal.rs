//! Fixed-precision decimal fields.

use super::integer::accepts_sign;
use super::{invalid, mismatch, type_char, Formatter, KeyHandler, KeyOutcome, Validator};
use crate::error::Result;
use crate::key::KeyEvent;
use crate::string_manager::StringManager;
use crate::types::EditMode;
use crate::value::FieldValue;

/// Largest number of fraction digits.
pub const MAX_PRECISION: u8 = 9;

/// A decimal number shown with a fixed number of fraction digits.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DecimalKind {
    precision: u8,
}

impl Default for DecimalKind {
    fn default() -> Self {
        Self { precision: 2 }
    }
}

impl DecimalKind {
    /// Create a decimal kind; precision is clamped to [`MAX_PRECISION`].
    pub fn new(precision: u8) -> Self {
        Self {
            precision: precision.min(MAX_PRECISION),
        }
    }

    /// Number of fraction digits.
    pub fn precision(&self) -> u8 {
        self.precision
    }

    fn parse_number(&self, text: &str) -> Option<f64> {
        let text = text.trim();
        let unsigned = text.strip_prefix('-').unwrap_or(text);
        let (int_part, frac_part) = match unsigned.split_once('.') {
            Some((i, f)) => (i, Some(f)),
            None => (unsigned, None),
        };
        let digits = |s: &str| s.chars().all(|c| c.is_ascii_digit());
        if int_part.is_empty() && frac_part.map_or(true, str::is_empty) {
            return None;
        }
        if !digits(int_part) || !frac_part.map_or(true, digits) {
            return None;
        }
        if frac_part.map_or(0, str::len) > self.precision as usize {
            return None;
        }
        if frac_part.is_some() && self.precision == 0 {
            return None;
        }
        text.parse::<f64>().ok().filter(|v| v.is_finite())
    }
}

impl KeyHandler for DecimalKind {
    fn handle_key(&self, text: &mut StringManager, key: KeyEvent, mode: EditMode) -> Option<KeyOutcome> {
        let ch = key.typed_char()?;
        let replaced = text.selection().map(|(start, len)| start..start + len);
        let has_point = text
            .chars()
            .iter()
            .enumerate()
            .any(|(i, &c)| c == '.' && !replaced.as_ref().is_some_and(|r| r.contains(&i)));
        Some(match ch {
            // Nothing may be inserted in front of the sign.
            '0'..='9' | '.' if text.offset() == 0 && !accepts_sign(text, mode) => KeyOutcome::Rejected,
            '0'..='9' => type_char(text, ch, mode),
            '-' if accepts_sign(text, mode) => type_char(text, ch, mode),
            '.' if self.precision > 0 && !has_point => type_char(text, ch, mode),
            _ => KeyOutcome::Rejected,
        })
    }
}

impl Formatter for DecimalKind {
    fn format(&self, value: &FieldValue) -> Result<String> {
        match value {
            FieldValue::Decimal(v) => Ok(format!("{:.*}", self.precision as usize, v)),
            other => Err(mismatch("Decimal", other)),
        }
    }

    fn parse(&self, text: &str) -> Result<FieldValue> {
        self.parse_number(text)
            .map(FieldValue::Decimal)
            .ok_or_else(|| invalid("Decimal", text))
    }
}

impl Validator for DecimalKind {
    fn is_valid(&self, text: &str) -> bool {
        self.parse_number(text).is_some()
    }
}
