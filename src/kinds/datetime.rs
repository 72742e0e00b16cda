//! Date and date/time fields.
//!
//! The text always has the full template width. Each column has a fixed
//! meaning and a fixed range of legal digits; separators are skipped over
//! while typing.

use super::{invalid, mismatch, Formatter, KeyHandler, KeyOutcome, Validator};
use crate::error::Result;
use crate::key::{KeyCode, KeyEvent};
use crate::string_manager::StringManager;
use crate::types::EditMode;
use crate::value::FieldValue;
use chrono::{Datelike, Duration, Local, Months, NaiveDate, NaiveDateTime, Timelike};

/// Years that fit the four-digit year columns.
const YEARS: std::ops::RangeInclusive<i32> = 0..=9999;

const DATE_FORMAT: &str = "%Y-%m-%d";
const DATE_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Template of a date/time field.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum DateLayout {
    /// `yyyy-MM-dd`
    #[default]
    Date,
    /// `yyyy-MM-dd HH:mm:ss`
    DateTime,
}

impl DateLayout {
    /// The template text.
    pub const fn template(self) -> &'static str {
        match self {
            DateLayout::Date => "yyyy-MM-dd",
            DateLayout::DateTime => "yyyy-MM-dd HH:mm:ss",
        }
    }

    /// Number of columns.
    pub const fn width(self) -> usize {
        self.template().len()
    }

    fn chrono_format(self) -> &'static str {
        match self {
            DateLayout::Date => DATE_FORMAT,
            DateLayout::DateTime => DATE_TIME_FORMAT,
        }
    }
}

/// The calendar component a column belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Component {
    Year,
    Month,
    Day,
    Hour,
    Minute,
    Second,
}

/// Component and largest legal digit of a column, `None` for separators.
fn column(pos: usize) -> Option<(Component, u32)> {
    Some(match pos {
        0..=3 => (Component::Year, 9),
        5 => (Component::Month, 1),
        6 => (Component::Month, 9),
        8 => (Component::Day, 3),
        9 => (Component::Day, 9),
        11 => (Component::Hour, 2),
        12 => (Component::Hour, 9),
        14 => (Component::Minute, 5),
        15 => (Component::Minute, 9),
        17 => (Component::Second, 5),
        18 => (Component::Second, 9),
        _ => return None,
    })
}

/// A date, or a date and time, edited column by column.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DateTimeKind {
    /// The template.
    pub layout: DateLayout,
}

impl DateTimeKind {
    /// Create a date/time kind with the given layout.
    pub const fn new(layout: DateLayout) -> Self {
        Self { layout }
    }

    /// The current local time, truncated to what the layout shows.
    pub fn now(&self) -> NaiveDateTime {
        self.truncate(Local::now().naive_local())
    }

    fn truncate(&self, value: NaiveDateTime) -> NaiveDateTime {
        match self.layout {
            DateLayout::Date => value.date().and_hms_opt(0, 0, 0).unwrap_or(value),
            DateLayout::DateTime => value.with_nanosecond(0).unwrap_or(value),
        }
    }

    fn render(&self, value: NaiveDateTime) -> String {
        value.format(self.layout.chrono_format()).to_string()
    }

    fn parse_text(&self, text: &str) -> Option<NaiveDateTime> {
        let text = text.trim();
        match self.layout {
            DateLayout::Date => NaiveDate::parse_from_str(text, DATE_FORMAT)
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0)),
            DateLayout::DateTime => NaiveDateTime::parse_from_str(text, DATE_TIME_FORMAT).ok(),
        }
    }

    /// First digit column at or after `pos`.
    fn next_digit(&self, mut pos: usize) -> usize {
        while pos < self.layout.width() && column(pos).is_none() {
            pos += 1;
        }
        pos
    }

    /// Component edited at `pos`; separators belong to the column before.
    fn component_at(&self, pos: usize) -> Component {
        let mut pos = pos.min(self.layout.width() - 1);
        loop {
            if let Some((component, _)) = column(pos) {
                return component;
            }
            if pos == 0 {
                return Component::Year;
            }
            pos -= 1;
        }
    }

    fn step(&self, value: NaiveDateTime, component: Component, up: bool) -> Option<NaiveDateTime> {
        let months = |n| {
            if up {
                value.checked_add_months(Months::new(n))
            } else {
                value.checked_sub_months(Months::new(n))
            }
        };
        let delta = |d: Duration| {
            if up {
                value.checked_add_signed(d)
            } else {
                value.checked_sub_signed(d)
            }
        };
        let stepped = match component {
            Component::Year => months(12),
            Component::Month => months(1),
            Component::Day => delta(Duration::days(1)),
            Component::Hour => delta(Duration::hours(1)),
            Component::Minute => delta(Duration::minutes(1)),
            Component::Second => delta(Duration::seconds(1)),
        };
        stepped.filter(|v| YEARS.contains(&v.year()))
    }

    fn type_digit(&self, text: &mut StringManager, digit: char) -> KeyOutcome {
        let pos = self.next_digit(text.offset());
        let legal = column(pos)
            .zip(digit.to_digit(10))
            .is_some_and(|((_, max), d)| d <= max);
        if pos >= text.len() || !legal {
            return KeyOutcome::Rejected;
        }
        text.set_offset(pos);
        let mut buf = [0u8; 4];
        if !text.insert(digit.encode_utf8(&mut buf), EditMode::Overwrite) {
            return KeyOutcome::Rejected;
        }
        text.set_offset(self.next_digit(pos + 1));
        KeyOutcome::Handled
    }
}

impl KeyHandler for DateTimeKind {
    fn handle_key(&self, text: &mut StringManager, key: KeyEvent, _mode: EditMode) -> Option<KeyOutcome> {
        if let Some(ch) = key.typed_char() {
            return Some(match ch {
                '0'..='9' => self.type_digit(text, ch),
                'n' | 'N' => {
                    let offset = text.offset();
                    text.set_text(&self.render(self.now()));
                    text.set_offset(offset);
                    KeyOutcome::Handled
                }
                _ => KeyOutcome::Rejected,
            });
        }
        match key.code {
            KeyCode::PageUp | KeyCode::PageDown if key.modifiers.is_empty() => {
                let offset = text.offset();
                let component = self.component_at(offset);
                let stepped = self
                    .parse_text(&text.text())
                    .and_then(|v| self.step(v, component, key.code == KeyCode::PageUp));
                Some(match stepped {
                    Some(value) => {
                        text.set_text(&self.render(value));
                        text.set_offset(offset);
                        KeyOutcome::Handled
                    }
                    None => KeyOutcome::Rejected,
                })
            }
            KeyCode::Backspace if key.modifiers.is_empty() => {
                let mut pos = text.offset();
                while pos > 0 {
                    pos -= 1;
                    if column(pos).is_some() {
                        text.set_offset(pos);
                        return Some(KeyOutcome::Handled);
                    }
                }
                Some(KeyOutcome::Rejected)
            }
            KeyCode::Delete => Some(KeyOutcome::Rejected),
            _ => None,
        }
    }
}

impl Formatter for DateTimeKind {
    fn format(&self, value: &FieldValue) -> Result<String> {
        match value {
            FieldValue::DateTime(v) if YEARS.contains(&v.year()) => Ok(self.render(*v)),
            FieldValue::DateTime(v) => Err(invalid("DateTime", &v.to_string())),
            other => Err(mismatch("DateTime", other)),
        }
    }

    fn parse(&self, text: &str) -> Result<FieldValue> {
        self.parse_text(text)
            .map(FieldValue::DateTime)
            .ok_or_else(|| invalid("DateTime", text))
    }
}

impl Validator for DateTimeKind {
    fn is_valid(&self, text: &str) -> bool {
        self.parse_text(text).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date_field(text: &str) -> (DateTimeKind, StringManager) {
        let kind = DateTimeKind::new(DateLayout::Date);
        (kind, StringManager::with_text(10, 1, text).unwrap())
    }

    fn press(kind: &DateTimeKind, sm: &mut StringManager, key: KeyEvent) -> Option<KeyOutcome> {
        kind.handle_key(sm, key, EditMode::Insert)
    }

    #[test]
    fn test_month_rollover_is_leap_correct() {
        let (kind, mut sm) = date_field("2024-01-31");
        sm.set_offset(5);
        assert_eq!(press(&kind, &mut sm, KeyEvent::plain(KeyCode::PageUp)), Some(KeyOutcome::Handled));
        assert_eq!(sm.text(), "2024-02-29");
        assert_eq!(sm.offset(), 5);
    }

    #[test]
    fn test_components() {
        let (kind, mut sm) = date_field("2023-12-31");
        sm.set_offset(9);
        press(&kind, &mut sm, KeyEvent::plain(KeyCode::PageUp));
        assert_eq!(sm.text(), "2024-01-01");
        sm.set_offset(4);
        press(&kind, &mut sm, KeyEvent::plain(KeyCode::PageDown));
        assert_eq!(sm.text(), "2023-01-01");

        let kind = DateTimeKind::new(DateLayout::DateTime);
        let mut sm = StringManager::with_text(19, 1, "2024-03-10 23:59:59").unwrap();
        sm.set_offset(18);
        press(&kind, &mut sm, KeyEvent::plain(KeyCode::PageUp));
        assert_eq!(sm.text(), "2024-03-11 00:00:00");
    }

    #[test]
    fn test_typing_respects_column_ranges() {
        let (kind, mut sm) = date_field("2024-01-31");
        sm.set_offset(4);
        assert_eq!(press(&kind, &mut sm, KeyEvent::char('2')), Some(KeyOutcome::Rejected));
        assert_eq!(press(&kind, &mut sm, KeyEvent::char('1')), Some(KeyOutcome::Handled));
        assert_eq!(sm.text(), "2024-11-31");
        assert_eq!(sm.offset(), 6);
        assert_eq!(press(&kind, &mut sm, KeyEvent::char('2')), Some(KeyOutcome::Handled));
        assert_eq!(sm.offset(), 8);
        assert_eq!(sm.text(), "2024-12-31");
        assert_eq!(press(&kind, &mut sm, KeyEvent::char('4')), Some(KeyOutcome::Rejected));
        assert_eq!(press(&kind, &mut sm, KeyEvent::char('x')), Some(KeyOutcome::Rejected));
    }

    #[test]
    fn test_backspace_moves_left() {
        let (kind, mut sm) = date_field("2024-01-31");
        sm.set_offset(8);
        assert_eq!(press(&kind, &mut sm, KeyEvent::plain(KeyCode::Backspace)), Some(KeyOutcome::Handled));
        assert_eq!(sm.offset(), 6);
        assert_eq!(sm.text(), "2024-01-31");
    }

    #[test]
    fn test_now_key() {
        let (kind, mut sm) = date_field("2000-01-01");
        assert_eq!(press(&kind, &mut sm, KeyEvent::char('N')), Some(KeyOutcome::Handled));
        assert!(kind.is_valid(&sm.text()));
        assert_ne!(sm.text(), "2000-01-01");
    }

    #[test]
    fn test_step_stays_within_four_digit_years() {
        let (kind, mut sm) = date_field("9999-12-31");
        sm.set_offset(9);
        assert_eq!(press(&kind, &mut sm, KeyEvent::plain(KeyCode::PageUp)), Some(KeyOutcome::Rejected));
        sm.set_offset(0);
        assert_eq!(press(&kind, &mut sm, KeyEvent::plain(KeyCode::PageUp)), Some(KeyOutcome::Rejected));
        assert_eq!(sm.text(), "9999-12-31");

        let (kind, mut sm) = date_field("0000-01-01");
        sm.set_offset(9);
        assert_eq!(press(&kind, &mut sm, KeyEvent::plain(KeyCode::PageDown)), Some(KeyOutcome::Rejected));
        assert_eq!(sm.text(), "0000-01-01");

        let far = NaiveDate::from_ymd_opt(10000, 1, 1).and_then(|d| d.and_hms_opt(0, 0, 0)).unwrap();
        assert!(matches!(
            kind.format(&FieldValue::DateTime(far)),
            Err(crate::error::Error::InvalidValue { .. })
        ));
    }

    #[test]
    fn test_round_trip() {
        let kind = DateTimeKind::new(DateLayout::DateTime);
        let value = kind.parse("1999-12-31 08:30:05").unwrap();
        assert_eq!(kind.format(&value).unwrap(), "1999-12-31 08:30:05");
        assert!(!kind.is_valid("2023-02-29 00:00:00"));
    }
}
