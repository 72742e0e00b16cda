//! Integer fields.

use super::{invalid, mismatch, type_char, Formatter, KeyHandler, KeyOutcome, Validator};
use crate::error::Result;
use crate::key::KeyEvent;
use crate::string_manager::StringManager;
use crate::types::EditMode;
use crate::value::FieldValue;

/// Storage width of an integer field, which bounds its legal range.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum IntWidth {
    /// `i8`
    I8,
    /// `i16`
    I16,
    /// `i32`
    I32,
    /// `i64`
    #[default]
    I64,
    /// `u8`
    U8,
    /// `u16`
    U16,
    /// `u32`
    U32,
    /// `u64`
    U64,
}

impl IntWidth {
    /// Whether negative values are allowed.
    pub const fn is_signed(self) -> bool {
        matches!(self, IntWidth::I8 | IntWidth::I16 | IntWidth::I32 | IntWidth::I64)
    }

    /// Smallest legal value.
    pub const fn min(self) -> i128 {
        match self {
            IntWidth::I8 => i8::MIN as i128,
            IntWidth::I16 => i16::MIN as i128,
            IntWidth::I32 => i32::MIN as i128,
            IntWidth::I64 => i64::MIN as i128,
            _ => 0,
        }
    }

    /// Largest legal value.
    pub const fn max(self) -> i128 {
        match self {
            IntWidth::I8 => i8::MAX as i128,
            IntWidth::I16 => i16::MAX as i128,
            IntWidth::I32 => i32::MAX as i128,
            IntWidth::I64 => i64::MAX as i128,
            IntWidth::U8 => u8::MAX as i128,
            IntWidth::U16 => u16::MAX as i128,
            IntWidth::U32 => u32::MAX as i128,
            IntWidth::U64 => u64::MAX as i128,
        }
    }

    /// Type name shown on the status line.
    pub const fn name(self) -> &'static str {
        match self {
            IntWidth::I8 => "Int8",
            IntWidth::I16 => "Int16",
            IntWidth::I32 => "Int32",
            IntWidth::I64 => "Int64",
            IntWidth::U8 => "UInt8",
            IntWidth::U16 => "UInt16",
            IntWidth::U32 => "UInt32",
            IntWidth::U64 => "UInt64",
        }
    }
}

/// A signed or unsigned integer.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct IntegerKind {
    /// Storage width.
    pub width: IntWidth,
}

impl IntegerKind {
    /// Create an integer kind of the given width.
    pub const fn new(width: IntWidth) -> Self {
        Self { width }
    }

    fn parse_wide(&self, text: &str) -> Option<i128> {
        let text = text.trim();
        if text.is_empty() || text == "-" {
            return None;
        }
        text.parse::<i128>()
            .ok()
            .filter(|v| (self.width.min()..=self.width.max()).contains(v))
    }
}

/// Whether a leading minus sign may be typed at the offset.
pub(crate) fn accepts_sign(text: &StringManager, mode: EditMode) -> bool {
    if text.offset() != 0 {
        return false;
    }
    match text.selection() {
        Some((0, _)) => true,
        Some(_) => false,
        None => mode == EditMode::Overwrite || text.char_at(0) != Some('-'),
    }
}

impl KeyHandler for IntegerKind {
    fn handle_key(&self, text: &mut StringManager, key: KeyEvent, mode: EditMode) -> Option<KeyOutcome> {
        let ch = key.typed_char()?;
        Some(match ch {
            // Nothing may be inserted in front of the sign.
            '0'..='9' if text.offset() == 0 && !accepts_sign(text, mode) => KeyOutcome::Rejected,
            '0'..='9' => type_char(text, ch, mode),
            '-' if self.width.is_signed() && accepts_sign(text, mode) => type_char(text, ch, mode),
            _ => KeyOutcome::Rejected,
        })
    }
}

impl Formatter for IntegerKind {
    fn format(&self, value: &FieldValue) -> Result<String> {
        match (value, self.width.is_signed()) {
            (FieldValue::Int(v), true) => Ok(v.to_string()),
            (FieldValue::UInt(v), false) => Ok(v.to_string()),
            (other, _) => Err(mismatch(self.width.name(), other)),
        }
    }

    fn parse(&self, text: &str) -> Result<FieldValue> {
        let v = self
            .parse_wide(text)
            .ok_or_else(|| invalid(self.width.name(), text))?;
        Ok(if self.width.is_signed() {
            FieldValue::Int(v as i64)
        } else {
            FieldValue::UInt(v as u64)
        })
    }
}

impl Validator for IntegerKind {
    fn is_valid(&self, text: &str) -> bool {
        self.parse_wide(text).is_some()
    }
}
