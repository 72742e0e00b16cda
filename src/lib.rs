//! # screenform
//!
//! Full-screen data-entry forms edited in place on a raw terminal screen.
//!
//! A form is a set of typed fields laid out at fixed screen positions. The
//! user moves between them with the arrow keys and Tab, edits them in insert
//! or overwrite mode, and finishes with a function key. The result is a map
//! from each field's data name to its typed value.
//!
//! ## Layers
//!
//! - [`ScreenBuffer`]: cell-level screen I/O over a [`Driver`]
//! - [`StringManager`]: one field's text, insertion offset and selection
//! - [`Field`]: a string manager plus title, colors, patterns and a [`FieldKind`]
//! - [`FieldCollection`]: non-overlapping fields and their tab order
//! - [`Controller`]: chrome, function keys and the input loop
//!
//! ## Example
//!
//! ```rust,no_run
//! use screenform::kinds::{DateLayout, DateTimeKind, TextKind};
//! use screenform::*;
//!
//! fn main() -> Result<()> {
//!     let config = FormConfig::from_env();
//!     let mut terminal = Terminal::from_stdio()?;
//!     terminal.enter_program_mode()?;
//!     let size = terminal.size();
//!     let screen = SharedScreen::new(ScreenBuffer::new(Box::new(terminal)));
//!     let mut keys = KeyReader::from_stdin(config.escape_delay);
//!
//!     let mut fields = FieldCollection::new(size);
//!     let name = FieldBounds::new(ScreenPoint::new(12, 2), 30, 1)?;
//!     let born = FieldBounds::new(ScreenPoint::new(12, 4), 10, 1)?;
//!     fields.add(Field::empty(TextKind, "name", name)?.with_title("Name", ScreenPoint::new(2, 2)))?;
//!     fields.add(
//!         Field::empty(DateTimeKind::new(DateLayout::Date), "born", born)?
//!             .with_title("Born", ScreenPoint::new(2, 4)),
//!     )?;
//!
//!     let mut form = Controller::new("New contact", fields, FunctionKeyBindings::new())
//!         .with_config(config);
//!     let values = form.execute(&screen, &mut keys)?;
//!     drop(screen);
//!     println!("{:?}", values);
//!     Ok(())
//! }
//! ```

#![allow(clippy::needless_doctest_main)]
#![warn(missing_docs)]

pub mod bindings;
pub mod collection;
pub mod color;
pub mod config;
pub mod controller;
pub mod driver;
pub mod error;
pub mod field;
pub mod input;
pub mod key;
pub mod kinds;
pub mod render;
pub mod screen;
pub mod shared;
pub mod status;
pub mod string_manager;
pub mod terminal;
pub mod types;
pub mod value;

// Re-export commonly used items at crate root
pub use bindings::{FunctionKeyBindings, Handler, HandlerContext, Prompt};
pub use collection::{AddOutcome, Direction, FieldCollection};
pub use color::{Color, ColorPair, FieldColors, Theme};
pub use config::FormConfig;
pub use controller::Controller;
pub use driver::{Driver, HeadlessDriver};
pub use error::{Error, Result};
pub use field::Field;
pub use input::{KeyReader, KeySource, ScriptedKeys};
pub use key::{FunctionKey, KeyCode, KeyEvent, Modifiers};
pub use kinds::{FieldKind, KeyOutcome};
pub use render::{PlainRender, Render};
pub use screen::ScreenBuffer;
pub use shared::SharedScreen;
pub use status::RunState;
pub use string_manager::StringManager;
pub use terminal::Terminal;
pub use types::*;
pub use value::FieldValue;

/// The screenform version string
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
