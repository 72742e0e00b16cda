//! Field kinds.
//!
//! Every field has one [`FieldKind`], a closed set of variants resolved by
//! pattern matching. Each variant implements three small traits:
//!
//! - [`KeyHandler`]: kind-specific keystrokes
//! - [`Formatter`]: value to text and back
//! - [`Validator`]: whether the current text is a legal value

mod boolean;
mod datetime;
mod decimal;
mod integer;
mod text;

pub use boolean::{BoolWords, BooleanKind};
pub use datetime::{DateLayout, DateTimeKind};
pub use decimal::{DecimalKind, MAX_PRECISION};
pub use integer::{IntWidth, IntegerKind};
pub use text::TextKind;

use crate::error::{Error, Result};
use crate::key::KeyEvent;
use crate::string_manager::StringManager;
use crate::types::EditMode;
use crate::value::FieldValue;

/// What a field did with a keystroke.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum KeyOutcome {
    /// The key was consumed; the field may have changed.
    Handled,
    /// The key applies to this field but is not acceptable here.
    Rejected,
    /// The key means nothing to this field.
    Ignored,
}

/// Kind-specific keystroke handling.
pub trait KeyHandler {
    /// Handle `key`, or return `None` to fall back to generic editing.
    fn handle_key(&self, text: &mut StringManager, key: KeyEvent, mode: EditMode) -> Option<KeyOutcome>;
}

/// Conversion between values and field text.
pub trait Formatter {
    /// Text shown for `value`.
    fn format(&self, value: &FieldValue) -> Result<String>;

    /// Value represented by `text`.
    fn parse(&self, text: &str) -> Result<FieldValue>;
}

/// Kind-level validity of field text.
pub trait Validator {
    /// Whether `text` is a legal value of this kind.
    fn is_valid(&self, text: &str) -> bool;
}

/// The type of a field.
#[derive(Clone, Debug, PartialEq)]
pub enum FieldKind {
    /// Free text.
    Text(TextKind),
    /// Signed or unsigned integer.
    Integer(IntegerKind),
    /// Fixed-precision decimal.
    Decimal(DecimalKind),
    /// Word-pair boolean.
    Boolean(BooleanKind),
    /// Date or date and time.
    DateTime(DateTimeKind),
}

impl FieldKind {
    /// Name shown on the status line.
    pub fn name(&self) -> &'static str {
        match self {
            FieldKind::Text(_) => "String",
            FieldKind::Integer(k) => k.width.name(),
            FieldKind::Decimal(_) => "Decimal",
            FieldKind::Boolean(_) => "Boolean",
            FieldKind::DateTime(k) => match k.layout {
                DateLayout::Date => "Date",
                DateLayout::DateTime => "DateTime",
            },
        }
    }

    /// The kind's natural empty value.
    pub fn default_value(&self) -> FieldValue {
        match self {
            FieldKind::Text(_) => FieldValue::String(String::new()),
            FieldKind::Integer(k) if k.width.is_signed() => FieldValue::Int(0),
            FieldKind::Integer(_) => FieldValue::UInt(0),
            FieldKind::Decimal(_) => FieldValue::Decimal(0.0),
            FieldKind::Boolean(_) => FieldValue::Bool(false),
            FieldKind::DateTime(k) => FieldValue::DateTime(k.now()),
        }
    }

    /// Whether Enter inserts a line break instead of moving on.
    pub fn accepts_enter(&self, text: &StringManager) -> bool {
        matches!(self, FieldKind::Text(_)) && text.is_multiline()
    }
}

impl KeyHandler for FieldKind {
    fn handle_key(&self, text: &mut StringManager, key: KeyEvent, mode: EditMode) -> Option<KeyOutcome> {
        match self {
            FieldKind::Text(k) => k.handle_key(text, key, mode),
            FieldKind::Integer(k) => k.handle_key(text, key, mode),
            FieldKind::Decimal(k) => k.handle_key(text, key, mode),
            FieldKind::Boolean(k) => k.handle_key(text, key, mode),
            FieldKind::DateTime(k) => k.handle_key(text, key, mode),
        }
    }
}

impl Formatter for FieldKind {
    fn format(&self, value: &FieldValue) -> Result<String> {
        match self {
            FieldKind::Text(k) => k.format(value),
            FieldKind::Integer(k) => k.format(value),
            FieldKind::Decimal(k) => k.format(value),
            FieldKind::Boolean(k) => k.format(value),
            FieldKind::DateTime(k) => k.format(value),
        }
    }

    fn parse(&self, text: &str) -> Result<FieldValue> {
        match self {
            FieldKind::Text(k) => k.parse(text),
            FieldKind::Integer(k) => k.parse(text),
            FieldKind::Decimal(k) => k.parse(text),
            FieldKind::Boolean(k) => k.parse(text),
            FieldKind::DateTime(k) => k.parse(text),
        }
    }
}

impl Validator for FieldKind {
    fn is_valid(&self, text: &str) -> bool {
        match self {
            FieldKind::Text(k) => k.is_valid(text),
            FieldKind::Integer(k) => k.is_valid(text),
            FieldKind::Decimal(k) => k.is_valid(text),
            FieldKind::Boolean(k) => k.is_valid(text),
            FieldKind::DateTime(k) => k.is_valid(text),
        }
    }
}

impl From<TextKind> for FieldKind {
    fn from(k: TextKind) -> Self {
        FieldKind::Text(k)
    }
}

impl From<IntegerKind> for FieldKind {
    fn from(k: IntegerKind) -> Self {
        FieldKind::Integer(k)
    }
}

impl From<DecimalKind> for FieldKind {
    fn from(k: DecimalKind) -> Self {
        FieldKind::Decimal(k)
    }
}

impl From<BooleanKind> for FieldKind {
    fn from(k: BooleanKind) -> Self {
        FieldKind::Boolean(k)
    }
}

impl From<DateTimeKind> for FieldKind {
    fn from(k: DateTimeKind) -> Self {
        FieldKind::DateTime(k)
    }
}

/// Error for a value of the wrong variant.
pub(crate) fn mismatch(kind: &'static str, value: &FieldValue) -> Error {
    Error::KindMismatch {
        kind,
        value: value.type_name(),
    }
}

/// Error for text that does not parse.
pub(crate) fn invalid(kind: &'static str, text: &str) -> Error {
    Error::InvalidValue {
        kind,
        text: text.to_string(),
    }
}

/// Insert a typed character, mapping a full field to a rejection.
pub(crate) fn type_char(text: &mut StringManager, ch: char, mode: EditMode) -> KeyOutcome {
    let mut buf = [0u8; 4];
    if text.insert(ch.encode_utf8(&mut buf), mode) {
        KeyOutcome::Handled
    } else {
        KeyOutcome::Rejected
    }
}
