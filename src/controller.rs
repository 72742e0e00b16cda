//! # Form controller
//!
//! The [`Controller`] owns a [`FieldCollection`] and the function-key
//! bindings, draws the chrome around the fields and runs the modal input
//! loop.
//!
//! Screen layout:
//!
//! - row 0: title bar
//! - rows 1 to `h-3`: fields
//! - row `h-2`: function-key legend
//! - row `h-1`: status line
//!
//! ## Example
//!
//! ```rust
//! use screenform::kinds::TextKind;
//! use screenform::{
//!     Controller, Field, FieldBounds, FieldCollection, FunctionKeyBindings, HeadlessDriver,
//!     KeyCode, KeyEvent, ScreenBuffer, ScreenPoint, ScreenSize, ScriptedKeys, SharedScreen,
//! };
//!
//! let size = ScreenSize::new(40, 10);
//! let driver = HeadlessDriver::new(size);
//! let screen = SharedScreen::new(ScreenBuffer::new(Box::new(driver)));
//!
//! let mut fields = FieldCollection::new(size);
//! let bounds = FieldBounds::new(ScreenPoint::new(8, 2), 20, 1)?;
//! fields.add(Field::empty(TextKind, "name", bounds)?.with_title("Name", ScreenPoint::new(2, 2)))?;
//!
//! let mut keys = ScriptedKeys::default();
//! keys.type_text("Ada").push(KeyEvent::plain(KeyCode::F(1)));
//!
//! let mut form = Controller::new("Sign up", fields, FunctionKeyBindings::new());
//! let values = form.execute(&screen, &mut keys)?;
//! assert_eq!(values["name"].as_str(), Some("Ada"));
//! # Ok::<(), screenform::Error>(())
//! ```

use crate::bindings::{FunctionKeyBindings, HandlerContext, Prompt};
use crate::collection::{Direction, FieldCollection};
use crate::color::ColorPair;
use crate::config::FormConfig;
use crate::error::{Error, Result};
use crate::input::KeySource;
use crate::key::{FunctionKey, KeyCode, KeyEvent, Modifiers};
use crate::kinds::KeyOutcome;
use crate::screen::ScreenBuffer;
use crate::shared::SharedScreen;
use crate::status::{draw_prompt, draw_status, RunState, SharedRunState, StatusThread};
use crate::types::{EditMode, FieldBounds, LockKeys, ScreenPoint, ScreenSize};
use crate::value::FieldValue;
use std::collections::HashMap;

/// Smallest screen height: title bar, one field row, legend and status line.
const MIN_HEIGHT: i32 = 4;

fn fits_form(size: ScreenSize) -> bool {
    size.height >= MIN_HEIGHT && size.width >= 1
}

/// Answers confirmation questions on the status line.
struct StatusPrompt<'a> {
    screen: &'a SharedScreen,
    keys: &'a mut dyn KeySource,
    color: ColorPair,
    beep: bool,
}

impl Prompt for StatusPrompt<'_> {
    fn confirm(&mut self, question: &str) -> Result<bool> {
        let color = self.color;
        self.screen.use_screen(|s| draw_prompt(s, question, color))?;
        loop {
            let key = self.keys.read_key()?;
            match key.code {
                KeyCode::Char('y' | 'Y') => return Ok(true),
                KeyCode::Char('n' | 'N') | KeyCode::Esc => return Ok(false),
                _ if self.beep => self.screen.use_screen(|s| s.beep())?,
                _ => {}
            }
        }
    }
}

/// Runs a form.
#[derive(Debug)]
pub struct Controller {
    title: String,
    fields: FieldCollection,
    bindings: FunctionKeyBindings,
    config: FormConfig,
    state: SharedRunState,
    mode: EditMode,
    cursor: ScreenPoint,
    focused: Option<usize>,
}

impl Controller {
    /// Create a controller with the default configuration.
    pub fn new(title: impl Into<String>, fields: FieldCollection, bindings: FunctionKeyBindings) -> Self {
        Self {
            title: title.into(),
            fields,
            bindings,
            config: FormConfig::default(),
            state: SharedRunState::default(),
            mode: EditMode::Insert,
            cursor: ScreenPoint::new(0, 1),
            focused: None,
        }
    }

    /// Replace the configuration.
    #[must_use]
    pub fn with_config(mut self, config: FormConfig) -> Self {
        self.config = config;
        self
    }

    /// The fields.
    pub fn fields(&self) -> &FieldCollection {
        &self.fields
    }

    /// Mutable access to the fields.
    pub fn fields_mut(&mut self) -> &mut FieldCollection {
        &mut self.fields
    }

    /// Mutable access to the function-key bindings.
    pub fn bindings_mut(&mut self) -> &mut FunctionKeyBindings {
        &mut self.bindings
    }

    /// The configuration.
    pub fn config(&self) -> &FormConfig {
        &self.config
    }

    /// Current run state.
    pub fn run_state(&self) -> RunState {
        self.state.get()
    }

    /// Current edit mode.
    pub fn edit_mode(&self) -> EditMode {
        self.mode
    }

    /// Where the cursor is.
    pub fn cursor(&self) -> ScreenPoint {
        self.cursor
    }

    /// Index of the field holding the cursor.
    pub fn focused(&self) -> Option<usize> {
        self.focused
    }

    /// Run the form until a handler stops it.
    ///
    /// Returns every field's value keyed by data name when the form is
    /// accepted, and an empty map when it is cancelled.
    pub fn execute(
        &mut self,
        screen: &SharedScreen,
        keys: &mut dyn KeySource,
    ) -> Result<HashMap<String, FieldValue>> {
        let size = screen.use_screen(|s| Ok(s.refresh_size()))?;
        if !fits_form(size) {
            return Err(Error::InvalidArgument(format!(
                "screen {}x{} too small for a form",
                size.width, size.height
            )));
        }

        tracing::debug!(title = %self.title, fields = self.fields.len(), "form started");
        self.state.set(RunState::Running);
        self.focus_first();
        let outcome = self.run(screen, keys);
        self.state.set(RunState::Stopped);
        match &outcome {
            Ok(values) => tracing::debug!(accepted = !values.is_empty(), "form finished"),
            Err(e) => tracing::warn!(error = %e, "form aborted"),
        }
        outcome
    }

    fn run(&mut self, screen: &SharedScreen, keys: &mut dyn KeySource) -> Result<HashMap<String, FieldValue>> {
        let locks = screen.use_screen(|s| self.draw_all(s))?;
        let mut status = StatusThread::spawn(
            screen.clone(),
            self.state.clone(),
            self.config.status_interval,
            self.config.theme.status,
            locks,
        )?;
        let outcome = self.input_loop(screen, keys);
        self.state.set(RunState::Stopped);
        status.stop();
        outcome
    }

    fn input_loop(
        &mut self,
        screen: &SharedScreen,
        keys: &mut dyn KeySource,
    ) -> Result<HashMap<String, FieldValue>> {
        let mut result = None;
        loop {
            let key = keys.read_key()?;
            self.state.set(RunState::Paused);
            let mut run = RunState::Paused;
            self.dispatch(key, screen, keys, &mut run, &mut result)?;
            if run == RunState::Stopped {
                return Ok(result.unwrap_or_default());
            }
            screen.use_screen(|s| self.refresh(s))?;
            self.state.set(RunState::Running);
        }
    }

    // ========================================================================
    // Key dispatch
    // ========================================================================

    fn dispatch(
        &mut self,
        key: KeyEvent,
        screen: &SharedScreen,
        keys: &mut dyn KeySource,
        run: &mut RunState,
        result: &mut Option<HashMap<String, FieldValue>>,
    ) -> Result<()> {
        tracing::trace!(%key, focused = ?self.focused, "key");
        if key == KeyEvent::plain(KeyCode::Esc) {
            return self.invoke(FunctionKey::CANCEL, screen, keys, run, result);
        }
        if let Some(fkey) = key.function_key() {
            return self.invoke(fkey, screen, keys, run, result);
        }

        let m = key.modifiers;
        let direction = match key.code {
            KeyCode::Up => Some(Direction::Up),
            KeyCode::Down => Some(Direction::Down),
            KeyCode::Left => Some(Direction::Left),
            KeyCode::Right => Some(Direction::Right),
            _ => None,
        };
        match (key.code, direction) {
            (_, Some(d)) if m.is_empty() => self.move_cursor(d),
            (_, Some(d)) if m == Modifiers::CTRL => self.jump(d),
            (KeyCode::Tab, _) if m.is_empty() => self.focus_next(),
            (KeyCode::BackTab, _) => self.focus_prev(),
            (KeyCode::Tab, _) if m == Modifiers::SHIFT => self.focus_prev(),
            (KeyCode::Insert, _) if m.is_empty() => {
                self.mode = self.mode.toggled();
                tracing::debug!(mode = ?self.mode, "edit mode");
                let mode = self.mode;
                screen.use_screen(|s| s.set_cursor_shape(mode))?;
            }
            (KeyCode::Enter, _) if m.is_empty() && !self.focused_takes_enter() => self.focus_next(),
            _ => self.edit(key, screen)?,
        }
        Ok(())
    }

    fn invoke(
        &mut self,
        fkey: FunctionKey,
        screen: &SharedScreen,
        keys: &mut dyn KeySource,
        run: &mut RunState,
        result: &mut Option<HashMap<String, FieldValue>>,
    ) -> Result<()> {
        let beep = self.config.beep_on_reject;
        let mut prompt = StatusPrompt {
            screen,
            keys,
            color: self.config.theme.status,
            beep,
        };
        let mut ctx = HandlerContext::new(&mut self.fields, self.focused, run, result, &mut prompt);
        let bound = self.bindings.invoke(fkey, &mut ctx)?;
        let rejected = !bound || ctx.was_rejected();

        if rejected && beep {
            screen.use_screen(|s| s.beep())?;
        }
        if self.focused.is_some_and(|i| i >= self.fields.len()) {
            self.focused = None;
        }
        if *run != RunState::Stopped {
            let template = self.config.template_char;
            screen.use_screen(|s| self.fields.write_all(s, template))?;
        }
        Ok(())
    }

    /// Forward a key to the focused field.
    fn edit(&mut self, key: KeyEvent, screen: &SharedScreen) -> Result<()> {
        let Some(index) = self.focused else {
            return Ok(());
        };
        let template = self.config.template_char;
        let mode = self.mode;
        let Some(field) = self.fields.get_mut(index) else {
            return Ok(());
        };
        match field.process_key(key, mode) {
            KeyOutcome::Handled => {
                self.cursor = field.cursor_position();
                let field = &*field;
                screen.use_screen(|s| field.paint(s, template, false))?;
            }
            KeyOutcome::Rejected => {
                tracing::trace!(field = field.data_name(), %key, "key rejected");
                if self.config.beep_on_reject {
                    screen.use_screen(|s| s.beep())?;
                }
            }
            KeyOutcome::Ignored => {}
        }
        Ok(())
    }

    // ========================================================================
    // Navigation
    // ========================================================================

    fn focused_takes_enter(&self) -> bool {
        self.focused
            .and_then(|i| self.fields.get(i))
            .is_some_and(|f| f.takes_enter())
    }

    fn focus(&mut self, index: usize) {
        if let Some(field) = self.fields.get_mut(index) {
            self.cursor = field.bounds().location;
            field.place_cursor(self.cursor);
            self.focused = Some(index);
            tracing::debug!(field = field.data_name(), "focus");
        }
    }

    fn focus_first(&mut self) {
        if self.fields.is_empty() {
            self.focused = None;
        } else {
            self.focus(0);
        }
    }

    /// A point identifying the focused field, or the cursor.
    fn anchor(&self) -> ScreenPoint {
        self.focused
            .and_then(|i| self.fields.get(i))
            .map_or(self.cursor, |f| f.bounds().location)
    }

    fn focus_next(&mut self) {
        if let Some(index) = self.fields.next(self.anchor()) {
            self.focus(index);
        }
    }

    fn focus_prev(&mut self) {
        if let Some(index) = self.fields.prev(self.anchor()) {
            self.focus(index);
        }
    }

    /// Keep `p` between the title bar and the legend.
    fn clamp_to_body(&self, p: ScreenPoint) -> ScreenPoint {
        let size = self.fields.screen_size();
        ScreenPoint::new(
            p.x.clamp(0, (size.width - 1).max(0)),
            p.y.clamp(1, (size.height - 3).max(1)),
        )
    }

    /// Put field `index`'s insertion point nearest `p` and return where it is.
    fn land(&mut self, index: usize, p: ScreenPoint) -> ScreenPoint {
        match self.fields.get_mut(index) {
            Some(field) => {
                field.place_cursor(p);
                field.cursor_position()
            }
            None => p,
        }
    }

    /// Move one cell. Inside a field the cursor snaps to the insertion
    /// point; if that leaves it where it was, it steps out of the field.
    fn move_cursor(&mut self, direction: Direction) {
        let (dx, dy) = direction.delta();
        let mut next = self.clamp_to_body(self.cursor.offset(dx, dy));
        if let Some(index) = self.fields.field_at(next) {
            let at = self.land(index, next);
            if at != self.cursor {
                self.cursor = at;
                self.focused = Some(index);
                return;
            }
            if let Some(bounds) = self.fields.get(index).map(|f| f.bounds()) {
                next = self.clamp_to_body(match direction {
                    Direction::Up => ScreenPoint::new(next.x, bounds.top() - 1),
                    Direction::Down => ScreenPoint::new(next.x, bounds.bottom()),
                    Direction::Left => ScreenPoint::new(bounds.left() - 1, next.y),
                    Direction::Right => ScreenPoint::new(bounds.right(), next.y),
                });
            }
        }
        self.focused = self.fields.field_at(next);
        self.cursor = match self.focused {
            Some(index) => self.land(index, next),
            None => next,
        };
    }

    fn jump(&mut self, direction: Direction) {
        if let Some(index) = self.fields.scan(self.anchor_cell(), direction) {
            self.focus(index);
        }
    }

    /// The cursor, or the focused field's first cell if the cursor has
    /// run past the field's end.
    fn anchor_cell(&self) -> ScreenPoint {
        match self.focused.and_then(|i| self.fields.get(i)) {
            Some(f) if !f.bounds().contains(self.cursor) => f.bounds().location,
            _ => self.cursor,
        }
    }

    // ========================================================================
    // Drawing
    // ========================================================================

    fn focused_kind(&self) -> Option<&'static str> {
        self.focused
            .and_then(|i| self.fields.get(i))
            .map(|f| f.kind().name())
    }

    fn draw_title(&self, s: &mut ScreenBuffer) -> Result<()> {
        let width = s.size().width.max(0) as usize;
        let text = format!("{:^width$}", self.title, width = width);
        s.write_at(ScreenPoint::new(0, 0), &text, self.config.theme.title_bar)?;
        Ok(())
    }

    fn draw_legend(&self, s: &mut ScreenBuffer) -> Result<()> {
        let theme = &self.config.theme;
        let size = s.size();
        let row = size.height - 2;
        s.fill_rect(FieldBounds::new(ScreenPoint::new(0, row), size.width, 1)?, ' ', theme.legend)?;
        let valid = self.fields.is_valid();
        let mut x = 0;
        for (key, label) in self.bindings.labels() {
            let color = if key == FunctionKey::ACCEPT && !valid {
                theme.legend_disabled
            } else {
                theme.legend
            };
            x = s.write_at(ScreenPoint::new(x, row), &format!(" {}={} ", key, label), color)?;
        }
        Ok(())
    }

    fn draw_all(&self, s: &mut ScreenBuffer) -> Result<LockKeys> {
        if !fits_form(s.refresh_size()) {
            return Ok(s.lock_keys());
        }
        s.clear(self.config.theme.background)?;
        self.draw_title(s)?;
        self.fields.write_all(s, self.config.template_char)?;
        s.set_cursor_shape(self.mode)?;
        self.draw_legend(s)?;
        let locks = draw_status(s, self.cursor, self.focused_kind(), self.config.theme.status)?;
        s.set_cursor(self.cursor)?;
        Ok(locks)
    }

    /// Redraw the legend and the status line after a key, or everything if
    /// the terminal was resized.
    fn refresh(&self, s: &mut ScreenBuffer) -> Result<()> {
        let before = s.size();
        if s.refresh_size() != before {
            self.draw_all(s)?;
            return Ok(());
        }
        if !fits_form(before) {
            return Ok(());
        }
        self.draw_legend(s)?;
        draw_status(s, self.cursor, self.focused_kind(), self.config.theme.status)?;
        s.set_cursor(self.cursor)?;
        Ok(())
    }
}
