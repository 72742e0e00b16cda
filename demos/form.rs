//! Form example demonstrating data entry forms.
//!
//! Features demonstrated:
//! - Fields of every kind, with titles
//! - Filter and validation patterns
//! - A custom function-key binding
//! - Tab, Shift+Tab, arrows and Ctrl+arrows navigation
//!
//! Set `SCREENFORM_LOG` to a file path to capture diagnostics; the filter
//! comes from `RUST_LOG`.

use screenform::kinds::{BoolWords, BooleanKind, DateLayout, DateTimeKind, DecimalKind, IntWidth, IntegerKind, TextKind};
use screenform::*;
use std::sync::Mutex;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

fn init_logging() {
    let Ok(path) = std::env::var("SCREENFORM_LOG") else {
        return;
    };
    let Ok(file) = std::fs::File::create(&path) else {
        eprintln!("cannot open log file {}", path);
        return;
    };
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(Mutex::new(file)).with_ansi(false))
        .with(EnvFilter::from_default_env())
        .init();
}

fn build_fields(size: ScreenSize) -> Result<FieldCollection> {
    let label = |y| ScreenPoint::new(2, y);
    let at = |y, width, height| FieldBounds::new(ScreenPoint::new(16, y), width, height);

    let mut fields = FieldCollection::new(size);
    let all = [
        Field::empty(TextKind, "name", at(2, 30, 1)?)?
            .with_title("Name", label(2))
            .with_validation(r"\S.*")?,
        Field::empty(TextKind, "phone", at(3, 16, 1)?)?
            .with_title("Phone", label(3))
            .with_filter(r"[0-9 +()-]")?,
        Field::new(IntegerKind::new(IntWidth::U8), "age", at(5, 4, 1)?, FieldValue::UInt(30))?
            .with_title("Age", label(5)),
        Field::new(DecimalKind::new(2), "salary", at(6, 12, 1)?, FieldValue::Decimal(0.0))?
            .with_title("Salary", label(6)),
        Field::empty(DateTimeKind::new(DateLayout::Date), "born", at(7, 10, 1)?)?
            .with_title("Born", label(7)),
        Field::new(BooleanKind::new(BoolWords::YesNo), "member", at(8, 3, 1)?, false.into())?
            .with_title("Member", label(8)),
        Field::new(TextKind, "id", at(9, 8, 1)?, "C-0042".into())?
            .with_title("Customer id", label(9))
            .read_only(true),
        Field::empty(TextKind, "notes", at(11, 40, 4)?)?.with_title("Notes", label(11)),
    ];
    for field in all {
        if let AddOutcome::Rejected { conflict } = fields.add(field)? {
            tracing::warn!(%conflict, "field overlaps another one");
        }
    }
    Ok(fields)
}

fn main() -> Result<()> {
    init_logging();
    let config = FormConfig::from_env();

    let mut terminal = Terminal::from_stdio()?;
    terminal.enter_program_mode()?;
    let size = terminal.size();
    let screen = SharedScreen::new(ScreenBuffer::new(Box::new(terminal)));
    let mut keys = KeyReader::from_stdin(config.escape_delay);

    let mut bindings = FunctionKeyBindings::new();
    bindings.bind(FunctionKey::new(5).ok_or(Error::NoFreeFunctionKey)?, "Clear", |ctx| {
        if let Some(field) = ctx.focused_field_mut() {
            if !field.is_read_only() {
                field.manager_mut().set_text("");
            }
        }
        Ok(())
    })?;

    let mut form = Controller::new("Customer record", build_fields(size)?, bindings).with_config(config);
    let values = form.execute(&screen, &mut keys);

    // Dropping the last screen handle restores the terminal.
    drop(form);
    drop(screen);

    let mut values: Vec<_> = values?.into_iter().collect();
    values.sort_by(|a, b| a.0.cmp(&b.0));
    if values.is_empty() {
        println!("Cancelled.");
    }
    for (name, value) in values {
        println!("{:>8}: {}", name, value);
    }
    Ok(())
}
