//! Integration tests for screenform
//!
//! These tests drive whole forms through the headless driver and scripted
//! key input, and check the layout and navigation properties with proptest.

use chrono::NaiveDate;
use proptest::prelude::*;
use screenform::kinds::{
    BoolWords, BooleanKind, DateLayout, DateTimeKind, DecimalKind, IntWidth, IntegerKind,
    TextKind,
};
use screenform::*;

fn bounds(x: i32, y: i32, width: i32, height: i32) -> FieldBounds {
    FieldBounds::new(ScreenPoint::new(x, y), width, height).unwrap()
}

fn headless(width: i32, height: i32) -> (SharedScreen, HeadlessDriver) {
    let driver = HeadlessDriver::new(ScreenSize::new(width, height));
    let screen = SharedScreen::new(ScreenBuffer::new(Box::new(driver.clone())));
    (screen, driver)
}

fn fast_config() -> FormConfig {
    FormConfig::default().with_status_interval(std::time::Duration::from_millis(5))
}

// ============================================================================
// Scenarios
// ============================================================================

/// Scenario A: insert and overwrite in a single-line text field
#[test]
fn test_insert_and_overwrite() {
    let mut text = StringManager::with_text(10, 1, "hello").unwrap();
    text.set_offset(5);
    assert!(text.insert("!!", EditMode::Insert));
    assert_eq!(text.text(), "hello!!");

    let mut text = StringManager::with_text(10, 1, "hello").unwrap();
    text.set_offset(3);
    assert!(text.insert("!!", EditMode::Overwrite));
    assert_eq!(text.text(), "hel!!");
}

/// Scenario B: the Y key turns a Yes/No field to Yes
#[test]
fn test_boolean_yes_key() {
    let mut field = Field::new(
        BooleanKind::new(BoolWords::YesNo),
        "agree",
        bounds(5, 2, 3, 1),
        FieldValue::Bool(false),
    )
    .unwrap();
    assert_eq!(field.text(), "No");
    assert_eq!(field.process_key(KeyEvent::char('Y'), EditMode::Insert), KeyOutcome::Handled);
    assert_eq!(field.text(), "Yes");
    assert_eq!(field.to_value().unwrap(), FieldValue::Bool(true));
}

/// Scenario C: PageUp on the month column of 2024-01-31 gives 2024-02-29
#[test]
fn test_date_month_step() {
    let date = NaiveDate::from_ymd_opt(2024, 1, 31)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .unwrap();
    let mut field = Field::new(
        DateTimeKind::new(DateLayout::Date),
        "due",
        bounds(5, 2, 10, 1),
        FieldValue::DateTime(date),
    )
    .unwrap();
    field.manager_mut().set_offset(5);
    assert_eq!(
        field.process_key(KeyEvent::plain(KeyCode::PageUp), EditMode::Insert),
        KeyOutcome::Handled
    );
    assert_eq!(field.text(), "2024-02-29");
    let expected = NaiveDate::from_ymd_opt(2024, 2, 29)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .unwrap();
    assert_eq!(field.to_value().unwrap(), FieldValue::DateTime(expected));
}

/// Scenario D: tab order over fields on rows 4, 6 and 8
#[test]
fn test_tab_order_wraps() {
    let mut fields = FieldCollection::new(ScreenSize::new(80, 24));
    for (name, y) in [("first", 4), ("second", 6), ("third", 8)] {
        let field = Field::empty(TextKind, name, bounds(20, y, 15, 1)).unwrap();
        assert_eq!(fields.add(field).unwrap(), AddOutcome::Added);
    }
    let row_of = |i: Option<usize>| i.and_then(|i| fields.get(i)).map(|f| f.bounds().top());
    assert_eq!(row_of(fields.next(ScreenPoint::new(20, 4))), Some(6));
    assert_eq!(row_of(fields.next(ScreenPoint::new(20, 8))), Some(4));
}

// ============================================================================
// Whole forms
// ============================================================================

fn order_form(size: ScreenSize) -> FieldCollection {
    let mut fields = FieldCollection::new(size);
    fields
        .add(
            Field::empty(TextKind, "customer", bounds(12, 2, 20, 1))
                .unwrap()
                .with_title("Customer", ScreenPoint::new(2, 2))
                .with_validation(".+")
                .unwrap(),
        )
        .unwrap();
    fields
        .add(
            Field::new(IntegerKind::new(IntWidth::U16), "qty", bounds(12, 4, 5, 1), FieldValue::UInt(1))
                .unwrap()
                .with_title("Qty", ScreenPoint::new(2, 4)),
        )
        .unwrap();
    fields
        .add(
            Field::new(DecimalKind::new(2), "price", bounds(12, 6, 8, 1), FieldValue::Decimal(9.5))
                .unwrap()
                .with_title("Price", ScreenPoint::new(2, 6)),
        )
        .unwrap();
    fields
        .add(
            Field::empty(TextKind, "notes", bounds(12, 8, 10, 2))
                .unwrap()
                .with_title("Notes", ScreenPoint::new(2, 8)),
        )
        .unwrap();
    fields
}

#[test]
fn test_form_accept() {
    let (screen, driver) = headless(40, 14);
    let mut form = Controller::new("Order", order_form(ScreenSize::new(40, 14)), FunctionKeyBindings::new())
        .with_config(fast_config());

    let mut keys = ScriptedKeys::default();
    keys.type_text("ACME")
        .push(KeyEvent::plain(KeyCode::Tab))
        .push(KeyEvent::ctrl(KeyCode::Char('a')))
        .type_text("12")
        .push(KeyEvent::plain(KeyCode::Enter))
        .push(KeyEvent::ctrl(KeyCode::Char('a')))
        .type_text("3.25")
        .push(KeyEvent::plain(KeyCode::Tab))
        .type_text("line one")
        .push(KeyEvent::plain(KeyCode::Enter))
        .type_text("two")
        .push(KeyEvent::plain(KeyCode::F(1)));

    let values = form.execute(&screen, &mut keys).unwrap();
    assert_eq!(values.len(), 4);
    assert_eq!(values["customer"], FieldValue::from("ACME"));
    assert_eq!(values["qty"], FieldValue::UInt(12));
    assert_eq!(values["price"], FieldValue::Decimal(3.25));
    assert_eq!(values["notes"], FieldValue::from("line one\r\ntwo"));

    assert_eq!(driver.text_at(ScreenPoint::new(12, 8), 10), "line one__");
    assert_eq!(driver.text_at(ScreenPoint::new(12, 9), 10), "two_______");
}

#[test]
fn test_form_cancel_returns_nothing() {
    let (screen, _driver) = headless(40, 14);
    let mut form = Controller::new("Order", order_form(ScreenSize::new(40, 14)), FunctionKeyBindings::new())
        .with_config(fast_config());
    let mut keys = ScriptedKeys::new([
        KeyEvent::char('Z'),
        KeyEvent::plain(KeyCode::F(3)),
        KeyEvent::char('y'),
    ]);
    assert!(form.execute(&screen, &mut keys).unwrap().is_empty());
}

#[test]
fn test_form_revert_then_accept() {
    let (screen, _driver) = headless(40, 14);
    let mut form = Controller::new("Order", order_form(ScreenSize::new(40, 14)), FunctionKeyBindings::new())
        .with_config(fast_config());
    let mut keys = ScriptedKeys::default();
    keys.type_text("ACME")
        .push(KeyEvent::plain(KeyCode::Tab))
        .push(KeyEvent::plain(KeyCode::End))
        .type_text("00")
        .push(KeyEvent::plain(KeyCode::F(2)))
        .type_text("y")
        .push(KeyEvent::plain(KeyCode::BackTab))
        .type_text("Initech")
        .push(KeyEvent::plain(KeyCode::F(1)));
    let values = form.execute(&screen, &mut keys).unwrap();
    assert_eq!(values["customer"], FieldValue::from("Initech"));
    assert_eq!(values["qty"], FieldValue::UInt(1));
}

#[test]
fn test_form_custom_binding() {
    let (screen, driver) = headless(40, 14);
    let mut bindings = FunctionKeyBindings::new();
    let key = bindings
        .bind(FunctionKey::ACCEPT, "Fill", |ctx| {
            if let Some(field) = ctx.focused_field_mut() {
                field.manager_mut().set_text("filled");
            }
            Ok(())
        })
        .unwrap();
    assert_eq!(key.number(), 4);

    let mut form = Controller::new("Order", order_form(ScreenSize::new(40, 14)), bindings)
        .with_config(fast_config());
    let mut keys = ScriptedKeys::new([KeyEvent::plain(KeyCode::F(4)), KeyEvent::plain(KeyCode::F(1))]);
    let values = form.execute(&screen, &mut keys).unwrap();
    assert_eq!(values["customer"], FieldValue::from("filled"));
    assert!(driver.row_text(12).contains("F4=Fill"));
}

#[test]
fn test_form_rejected_keys_beep() {
    let (screen, driver) = headless(40, 14);
    let mut form = Controller::new("Order", order_form(ScreenSize::new(40, 14)), FunctionKeyBindings::new())
        .with_config(fast_config());
    let mut keys = ScriptedKeys::new([
        KeyEvent::plain(KeyCode::Tab),
        KeyEvent::char('x'),
        KeyEvent::plain(KeyCode::F(1)),
    ]);
    assert_eq!(form.execute(&screen, &mut keys).unwrap_err(), Error::Eof);
    // 'x' in the quantity field, then Accept with an empty customer.
    assert_eq!(driver.beeps(), 2);
}

#[test]
fn test_read_only_field_survives_editing() {
    let mut fields = FieldCollection::new(ScreenSize::new(40, 10));
    let field = Field::new(TextKind, "id", bounds(2, 2, 8, 1), FieldValue::from("A-17"))
        .unwrap()
        .read_only(true);
    fields.add(field).unwrap();
    let (screen, _driver) = headless(40, 10);
    let mut form = Controller::new("View", fields, FunctionKeyBindings::new()).with_config(fast_config());
    let mut keys = ScriptedKeys::new([
        KeyEvent::char('x'),
        KeyEvent::plain(KeyCode::Delete),
        KeyEvent::plain(KeyCode::F(1)),
    ]);
    let values = form.execute(&screen, &mut keys).unwrap();
    assert_eq!(values["id"], FieldValue::from("A-17"));
}

#[test]
fn test_screen_read_back() {
    let (screen, _driver) = headless(20, 5);
    screen
        .use_screen(|s| {
            s.write_at(ScreenPoint::new(2, 1), "hello", ColorPair::default())?;
            assert_eq!(s.read_char(ScreenPoint::new(2, 1))?.ch, 'h');
            assert_eq!(s.read_block(bounds(2, 1, 5, 1))?, vec!["hello".to_string()]);
            assert!(s.read_line(5).is_err());
            Ok(())
        })
        .unwrap();
}

// ============================================================================
// Properties
// ============================================================================

fn field_text() -> impl Strategy<Value = String> {
    prop::collection::vec(
        prop_oneof![
            8 => prop::char::range('a', 'z').prop_map(|c| c.to_string()),
            2 => Just(" ".to_string()),
            1 => Just("\r\n".to_string()),
        ],
        0..40,
    )
    .prop_map(|parts| parts.concat())
}

const SIGNED: [IntWidth; 4] = [IntWidth::I8, IntWidth::I16, IntWidth::I32, IntWidth::I64];
const UNSIGNED: [IntWidth; 4] = [IntWidth::U8, IntWidth::U16, IntWidth::U32, IntWidth::U64];
const WORDS: [BoolWords; 5] = [
    BoolWords::YesNo,
    BoolWords::TrueFalse,
    BoolWords::OnOff,
    BoolWords::OneZero,
    BoolWords::CheckCross,
];

/// Build a one-row field holding `value` and read the value back.
fn shown(kind: impl Into<FieldKind>, width: i32, value: FieldValue) -> FieldValue {
    let field = Field::new(kind, "v", bounds(0, 1, width, 1), value).unwrap();
    field.to_value().unwrap()
}

#[test]
fn test_integer_limits_round_trip() {
    for width in SIGNED {
        for v in [width.min(), -1, 0, width.max()] {
            let value = FieldValue::Int(v as i64);
            assert_eq!(shown(IntegerKind::new(width), 20, value.clone()), value);
        }
    }
    for width in UNSIGNED {
        for v in [0, width.max()] {
            let value = FieldValue::UInt(v as u64);
            assert_eq!(shown(IntegerKind::new(width), 20, value.clone()), value);
        }
    }
}

#[test]
fn test_value_must_fit_field() {
    let result = Field::new(IntegerKind::new(IntWidth::I64), "n", bounds(0, 1, 3, 1), FieldValue::Int(12345));
    assert!(matches!(result, Err(Error::InvalidDimensions { .. })));
}

proptest! {
    #[test]
    fn prop_offset_point_bijection(text in field_text(), width in 1i32..12, height in 1i32..5) {
        let manager = StringManager::with_text(width, height, &text).unwrap();
        let mut seen = std::collections::HashSet::new();
        for offset in 0..=manager.len() {
            let point = manager.offset_to_point(offset);
            prop_assert!(seen.insert(point), "point {:?} reused", point);
            prop_assert_eq!(manager.point_to_offset(point), offset);
        }
    }

    #[test]
    fn prop_collection_never_overlaps(
        layouts in prop::collection::vec((0i32..30, 0i32..12, 1i32..10, 1i32..3, 0usize..6), 1..20)
    ) {
        let mut fields = FieldCollection::new(ScreenSize::new(40, 14));
        for (x, y, w, h, name) in layouts {
            let field = Field::empty(TextKind, format!("f{}", name), bounds(x, y, w, h))
                .unwrap()
                .with_title("T", ScreenPoint::new(x, y).offset(-1, 0).clamp_to(ScreenSize::new(40, 14)));
            let _ = fields.add(field);
        }
        let regions: Vec<FieldBounds> = fields
            .iter()
            .flat_map(|f| std::iter::once(f.bounds()).chain(f.title_bounds()))
            .collect();
        for (i, field) in fields.iter().enumerate() {
            for other in fields.iter().skip(i + 1) {
                let own = [Some(field.bounds()), field.title_bounds()];
                let theirs = [Some(other.bounds()), other.title_bounds()];
                for a in own.iter().flatten() {
                    for b in theirs.iter().flatten() {
                        prop_assert!(!a.intersects(b));
                    }
                }
            }
        }
        prop_assert!(regions.iter().all(|r| r.fits(ScreenSize::new(40, 14))));
    }

    #[test]
    fn prop_next_prev_inverse(rows in prop::collection::btree_set(1i32..20, 1..8), pick in 0usize..8) {
        let mut fields = FieldCollection::new(ScreenSize::new(40, 24));
        for (i, y) in rows.iter().enumerate() {
            let field = Field::empty(TextKind, format!("f{}", i), bounds(5, *y, 10, 1)).unwrap();
            fields.add(field).unwrap();
        }
        let index = pick % fields.len();
        let at = |i: usize| fields.get(i).map(|f| f.bounds().location).unwrap();
        let next = fields.next(at(index)).unwrap();
        prop_assert_eq!(fields.prev(at(next)), Some(index));
        let prev = fields.prev(at(index)).unwrap();
        prop_assert_eq!(fields.next(at(prev)), Some(index));
    }

    #[test]
    fn prop_signed_round_trip(width in prop::sample::select(SIGNED.to_vec()), value in any::<i64>()) {
        let value = FieldValue::Int((value as i128).clamp(width.min(), width.max()) as i64);
        prop_assert_eq!(shown(IntegerKind::new(width), 20, value.clone()), value);
    }

    #[test]
    fn prop_unsigned_round_trip(width in prop::sample::select(UNSIGNED.to_vec()), value in any::<u64>()) {
        let value = FieldValue::UInt((value as i128).min(width.max()) as u64);
        prop_assert_eq!(shown(IntegerKind::new(width), 20, value.clone()), value);
    }

    #[test]
    fn prop_decimal_round_trip(cents in -1_000_000_000i64..1_000_000_000) {
        let value = FieldValue::Decimal(cents as f64 / 100.0);
        prop_assert_eq!(shown(DecimalKind::new(2), 14, value.clone()), value);
    }

    #[test]
    fn prop_boolean_round_trip(words in prop::sample::select(WORDS.to_vec()), value in any::<bool>()) {
        let width = words.width() as i32;
        prop_assert_eq!(shown(BooleanKind::new(words), width, FieldValue::Bool(value)), FieldValue::Bool(value));
    }

    #[test]
    fn prop_text_round_trip(text in "[ -~]{0,20}") {
        let value = FieldValue::from(text.as_str());
        prop_assert_eq!(shown(TextKind, 20, value.clone()), value);
    }

    #[test]
    fn prop_date_round_trip(days in 0i64..3_652_000) {
        let base = NaiveDate::from_ymd_opt(0, 1, 1).unwrap();
        let value = FieldValue::DateTime((base + chrono::Duration::days(days)).and_hms_opt(0, 0, 0).unwrap());
        prop_assert_eq!(shown(DateTimeKind::new(DateLayout::Date), 10, value.clone()), value);
    }

    #[test]
    fn prop_datetime_round_trip(days in 0i64..100_000, seconds in 0u32..86_400) {
        let base = NaiveDate::from_ymd_opt(1900, 1, 1).unwrap();
        let date = base + chrono::Duration::days(days);
        let value = date.and_hms_opt(seconds / 3600, seconds / 60 % 60, seconds % 60).unwrap();
        let value = FieldValue::DateTime(value);
        prop_assert_eq!(shown(DateTimeKind::new(DateLayout::DateTime), 19, value.clone()), value);
    }

    #[test]
    fn prop_revert_is_idempotent(typed in "[a-z]{0,8}") {
        let mut field = Field::new(TextKind, "s", bounds(0, 1, 10, 1), FieldValue::from("seed")).unwrap();
        for ch in typed.chars() {
            field.process_key(KeyEvent::char(ch), EditMode::Insert);
        }
        field.revert();
        let once = field.text();
        field.revert();
        prop_assert_eq!(field.text(), once.clone());
        prop_assert_eq!(once, "seed");
    }
}
