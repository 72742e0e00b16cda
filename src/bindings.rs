//! Function-key bindings.
//!
//! Each of the twelve function keys can carry one handler. F1 to F3 are
//! reserved for Accept, Revert and Cancel; a user binding asking for one of
//! them is moved to the next free key.

use crate::collection::FieldCollection;
use crate::error::{Error, Result};
use crate::field::Field;
use crate::key::{FunctionKey, FUNCTION_KEYS};
use crate::status::RunState;
use crate::value::FieldValue;
use std::collections::HashMap;
use std::fmt;

/// Asks the user a yes/no question.
pub trait Prompt {
    /// Show `question` and wait for an answer.
    fn confirm(&mut self, question: &str) -> Result<bool>;
}

/// What a function-key handler gets to work with.
pub struct HandlerContext<'a> {
    /// All fields of the form.
    pub fields: &'a mut FieldCollection,
    /// Index of the field holding the cursor, if any.
    pub focused: Option<usize>,
    /// The form's run state; set it to [`RunState::Stopped`] to finish.
    pub state: &'a mut RunState,
    result: &'a mut Option<HashMap<String, FieldValue>>,
    prompt: &'a mut dyn Prompt,
    rejected: bool,
}

impl<'a> HandlerContext<'a> {
    /// Create a context.
    pub fn new(
        fields: &'a mut FieldCollection,
        focused: Option<usize>,
        state: &'a mut RunState,
        result: &'a mut Option<HashMap<String, FieldValue>>,
        prompt: &'a mut dyn Prompt,
    ) -> Self {
        Self {
            fields,
            focused,
            state,
            result,
            prompt,
            rejected: false,
        }
    }

    /// The field holding the cursor.
    pub fn focused_field(&self) -> Option<&Field> {
        self.focused.and_then(|i| self.fields.get(i))
    }

    /// Mutable access to the field holding the cursor.
    pub fn focused_field_mut(&mut self) -> Option<&mut Field> {
        match self.focused {
            Some(i) => self.fields.get_mut(i),
            None => None,
        }
    }

    /// Collect every value and finish the form.
    pub fn accept(&mut self) -> Result<()> {
        *self.result = Some(self.fields.values()?);
        *self.state = RunState::Stopped;
        Ok(())
    }

    /// Finish the form without a result.
    pub fn cancel(&mut self) {
        *self.result = None;
        *self.state = RunState::Stopped;
    }

    /// Ask the user a yes/no question on the status line.
    pub fn confirm(&mut self, question: &str) -> Result<bool> {
        self.prompt.confirm(question)
    }

    /// Report that the key could not be acted on.
    pub fn reject(&mut self) {
        self.rejected = true;
    }

    /// Whether [`HandlerContext::reject`] was called.
    pub fn was_rejected(&self) -> bool {
        self.rejected
    }
}

/// A function-key handler.
pub type Handler = Box<dyn FnMut(&mut HandlerContext<'_>) -> Result<()> + Send>;

struct Binding {
    label: String,
    handler: Handler,
}

/// The handlers bound to F1-F12.
pub struct FunctionKeyBindings {
    slots: Vec<Option<Binding>>,
}

impl FunctionKeyBindings {
    /// Bindings with only the reserved Accept, Revert and Cancel keys.
    pub fn new() -> Self {
        let mut bindings = Self::empty();
        bindings.set(FunctionKey::ACCEPT, "Accept", Box::new(accept));
        bindings.set(FunctionKey::REVERT, "Revert", Box::new(revert));
        bindings.set(FunctionKey::CANCEL, "Cancel", Box::new(cancel));
        bindings
    }

    /// No bindings at all.
    pub fn empty() -> Self {
        Self {
            slots: (0..FUNCTION_KEYS).map(|_| None).collect(),
        }
    }

    fn set(&mut self, key: FunctionKey, label: &str, handler: Handler) {
        self.slots[key.index()] = Some(Binding {
            label: label.to_string(),
            handler,
        });
    }

    /// Bind `handler` to `key` and return the key actually used.
    ///
    /// A reserved key is replaced by the first unbound key after it; a key
    /// already bound by the caller is rebound. Fails with
    /// [`Error::NoFreeFunctionKey`] when no key is left.
    pub fn bind<F>(&mut self, key: FunctionKey, label: &str, handler: F) -> Result<FunctionKey>
    where
        F: FnMut(&mut HandlerContext<'_>) -> Result<()> + Send + 'static,
    {
        let target = if key.is_reserved() {
            FunctionKey::all()
                .skip(key.index() + 1)
                .find(|k| !k.is_reserved() && !self.is_bound(*k))
                .ok_or(Error::NoFreeFunctionKey)?
        } else {
            key
        };
        if target != key {
            tracing::debug!(requested = %key, assigned = %target, "reserved function key reassigned");
        }
        self.set(target, label, Box::new(handler));
        Ok(target)
    }

    /// Remove the binding of a non-reserved key.
    pub fn unbind(&mut self, key: FunctionKey) -> bool {
        !key.is_reserved() && self.slots[key.index()].take().is_some()
    }

    /// Whether `key` has a handler.
    pub fn is_bound(&self, key: FunctionKey) -> bool {
        self.slots[key.index()].is_some()
    }

    /// Legend label of `key`.
    pub fn label(&self, key: FunctionKey) -> Option<&str> {
        self.slots[key.index()].as_ref().map(|b| b.label.as_str())
    }

    /// Bound keys and their labels, in key order.
    pub fn labels(&self) -> impl Iterator<Item = (FunctionKey, &str)> {
        FunctionKey::all().filter_map(move |k| self.label(k).map(|l| (k, l)))
    }

    /// Run the handler of `key`. Returns `false` if nothing is bound.
    pub fn invoke(&mut self, key: FunctionKey, ctx: &mut HandlerContext<'_>) -> Result<bool> {
        match self.slots[key.index()].as_mut() {
            Some(binding) => {
                tracing::debug!(%key, label = %binding.label, "function key");
                (binding.handler)(ctx)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

impl Default for FunctionKeyBindings {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for FunctionKeyBindings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.labels()).finish()
    }
}

fn accept(ctx: &mut HandlerContext<'_>) -> Result<()> {
    if ctx.fields.is_valid() {
        ctx.accept()
    } else {
        ctx.reject();
        Ok(())
    }
}

fn revert(ctx: &mut HandlerContext<'_>) -> Result<()> {
    if ctx.confirm("Revert all changes?")? {
        ctx.fields.revert_all();
    }
    Ok(())
}

fn cancel(ctx: &mut HandlerContext<'_>) -> Result<()> {
    if ctx.confirm("Cancel this form?")? {
        ctx.cancel();
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kinds::{IntWidth, IntegerKind};
    use crate::types::{FieldBounds, ScreenPoint, ScreenSize};

    struct Answer(bool, usize);

    impl Prompt for Answer {
        fn confirm(&mut self, _question: &str) -> Result<bool> {
            self.1 += 1;
            Ok(self.0)
        }
    }

    fn fields() -> FieldCollection {
        let mut fields = FieldCollection::new(ScreenSize::new(40, 10));
        let bounds = FieldBounds::new(ScreenPoint::new(5, 2), 5, 1).unwrap();
        let field = Field::new(IntegerKind::new(IntWidth::I16), "n", bounds, FieldValue::Int(7)).unwrap();
        fields.add(field).unwrap();
        fields
    }

    fn fkey(n: u8) -> FunctionKey {
        FunctionKey::new(n).unwrap()
    }

    #[test]
    fn test_reserved_keys_are_reassigned() {
        let mut bindings = FunctionKeyBindings::new();
        assert_eq!(bindings.bind(fkey(1), "Help", |_| Ok(())).unwrap(), fkey(4));
        assert_eq!(bindings.bind(fkey(2), "Find", |_| Ok(())).unwrap(), fkey(5));
        assert_eq!(bindings.bind(fkey(7), "Save", |_| Ok(())).unwrap(), fkey(7));
        assert_eq!(bindings.bind(fkey(7), "Store", |_| Ok(())).unwrap(), fkey(7));
        assert_eq!(bindings.label(fkey(7)), Some("Store"));
        assert_eq!(bindings.label(fkey(1)), Some("Accept"));
    }

    #[test]
    fn test_no_free_key() {
        let mut bindings = FunctionKeyBindings::new();
        for n in 4..=12 {
            bindings.bind(fkey(n), "x", |_| Ok(())).unwrap();
        }
        assert_eq!(
            bindings.bind(fkey(3), "y", |_| Ok(())).unwrap_err(),
            Error::NoFreeFunctionKey
        );
        assert!(!bindings.unbind(fkey(1)));
        assert!(bindings.unbind(fkey(12)));
        assert_eq!(bindings.bind(fkey(3), "y", |_| Ok(())).unwrap(), fkey(12));
    }

    #[test]
    fn test_accept_collects_values() {
        let mut bindings = FunctionKeyBindings::new();
        let mut fields = fields();
        let mut state = RunState::Running;
        let mut result = None;
        let mut prompt = Answer(true, 0);
        let mut ctx = HandlerContext::new(&mut fields, Some(0), &mut state, &mut result, &mut prompt);
        assert!(bindings.invoke(FunctionKey::ACCEPT, &mut ctx).unwrap());
        assert!(!ctx.was_rejected());
        assert_eq!(state, RunState::Stopped);
        assert_eq!(result.and_then(|r| r.get("n").cloned()), Some(FieldValue::Int(7)));
    }

    #[test]
    fn test_accept_refused_when_invalid() {
        let mut bindings = FunctionKeyBindings::new();
        let mut fields = fields();
        if let Some(f) = fields.get_mut(0) {
            f.manager_mut().set_text("-");
        }
        let mut state = RunState::Running;
        let mut result = None;
        let mut prompt = Answer(true, 0);
        let mut ctx = HandlerContext::new(&mut fields, Some(0), &mut state, &mut result, &mut prompt);
        bindings.invoke(FunctionKey::ACCEPT, &mut ctx).unwrap();
        assert!(ctx.was_rejected());
        assert_eq!(state, RunState::Running);
        assert!(result.is_none());
    }

    #[test]
    fn test_cancel_and_revert_confirm() {
        let mut bindings = FunctionKeyBindings::new();
        let mut fields = fields();
        if let Some(f) = fields.get_mut(0) {
            f.manager_mut().set_text("99");
        }
        let mut state = RunState::Running;
        let mut result = None;

        let mut no = Answer(false, 0);
        let mut ctx = HandlerContext::new(&mut fields, None, &mut state, &mut result, &mut no);
        bindings.invoke(FunctionKey::CANCEL, &mut ctx).unwrap();
        bindings.invoke(FunctionKey::REVERT, &mut ctx).unwrap();
        assert_eq!(no.1, 2);
        assert_eq!(state, RunState::Running);
        assert_eq!(fields.get(0).map(Field::text).as_deref(), Some("99"));

        let mut yes = Answer(true, 0);
        let mut ctx = HandlerContext::new(&mut fields, None, &mut state, &mut result, &mut yes);
        bindings.invoke(FunctionKey::REVERT, &mut ctx).unwrap();
        bindings.invoke(FunctionKey::CANCEL, &mut ctx).unwrap();
        assert_eq!(state, RunState::Stopped);
        assert!(result.is_none());
        assert_eq!(fields.get(0).map(Field::text).as_deref(), Some("7"));
    }

    #[test]
    fn test_custom_handler_sees_focus() {
        let mut bindings = FunctionKeyBindings::new();
        let key = bindings
            .bind(fkey(5), "Clear", |ctx| {
                if let Some(field) = ctx.focused_field_mut() {
                    field.manager_mut().set_text("");
                }
                Ok(())
            })
            .unwrap();
        let mut fields = fields();
        let mut state = RunState::Running;
        let mut result = None;
        let mut prompt = Answer(true, 0);
        let mut ctx = HandlerContext::new(&mut fields, Some(0), &mut state, &mut result, &mut prompt);
        assert!(bindings.invoke(key, &mut ctx).unwrap());
        assert!(!bindings.invoke(fkey(9), &mut ctx).unwrap());
        assert_eq!(fields.get(0).map(Field::text).as_deref(), Some(""));
    }
}
