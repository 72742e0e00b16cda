//! Key definitions for screenform.
//!
//! Raw terminal input is decoded into [`KeyEvent`]s: a [`KeyCode`] plus the
//! [`Modifiers`] held while it was pressed.

use std::fmt;

bitflags::bitflags! {
    /// Modifier keys held during a key press.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct Modifiers: u8 {
        /// Shift.
        const SHIFT = 0x01;
        /// Alt / Meta.
        const ALT   = 0x02;
        /// Control.
        const CTRL  = 0x04;
    }
}

impl Modifiers {
    /// Decode the xterm modifier parameter (`1 + bits`) used in
    /// sequences such as `ESC [ 1 ; 5 A`.
    pub fn from_xterm(param: u8) -> Self {
        Modifiers::from_bits_truncate(param.saturating_sub(1))
    }
}

/// A key, independent of modifiers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum KeyCode {
    /// A printable character.
    Char(char),
    /// Enter / Return.
    Enter,
    /// Tab.
    Tab,
    /// Shift+Tab as reported by the terminal.
    BackTab,
    /// Backspace.
    Backspace,
    /// Delete.
    Delete,
    /// Insert.
    Insert,
    /// Home.
    Home,
    /// End.
    End,
    /// Page Up.
    PageUp,
    /// Page Down.
    PageDown,
    /// Up arrow.
    Up,
    /// Down arrow.
    Down,
    /// Left arrow.
    Left,
    /// Right arrow.
    Right,
    /// Escape.
    Esc,
    /// Function key F1-F12.
    F(u8),
}

/// A decoded key press.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct KeyEvent {
    /// The key.
    pub code: KeyCode,
    /// Modifiers held.
    pub modifiers: Modifiers,
}

impl KeyEvent {
    /// Create a key event.
    pub const fn new(code: KeyCode, modifiers: Modifiers) -> Self {
        Self { code, modifiers }
    }

    /// A key press without modifiers.
    pub const fn plain(code: KeyCode) -> Self {
        Self::new(code, Modifiers::empty())
    }

    /// A printable character without modifiers.
    pub const fn char(ch: char) -> Self {
        Self::plain(KeyCode::Char(ch))
    }

    /// A key press with Ctrl held.
    pub const fn ctrl(code: KeyCode) -> Self {
        Self::new(code, Modifiers::CTRL)
    }

    /// A key press with Shift held.
    pub const fn shift(code: KeyCode) -> Self {
        Self::new(code, Modifiers::SHIFT)
    }

    /// A key press with Alt held.
    pub const fn alt(code: KeyCode) -> Self {
        Self::new(code, Modifiers::ALT)
    }

    /// Whether Shift is held.
    pub fn has_shift(&self) -> bool {
        self.modifiers.contains(Modifiers::SHIFT)
    }

    /// Whether Ctrl is held.
    pub fn has_ctrl(&self) -> bool {
        self.modifiers.contains(Modifiers::CTRL)
    }

    /// Whether Alt is held.
    pub fn has_alt(&self) -> bool {
        self.modifiers.contains(Modifiers::ALT)
    }

    /// The function key, if this is an unmodified F1-F12.
    pub fn function_key(&self) -> Option<FunctionKey> {
        match self.code {
            KeyCode::F(n) if self.modifiers.is_empty() => FunctionKey::new(n),
            _ => None,
        }
    }

    /// The printable character typed, ignoring Shift.
    pub fn typed_char(&self) -> Option<char> {
        match self.code {
            KeyCode::Char(c) if !self.has_ctrl() && !self.has_alt() => Some(c),
            _ => None,
        }
    }
}

impl fmt::Display for KeyEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.has_ctrl() {
            write!(f, "Ctrl+")?;
        }
        if self.has_alt() {
            write!(f, "Alt+")?;
        }
        if self.has_shift() {
            write!(f, "Shift+")?;
        }
        match self.code {
            KeyCode::Char(' ') => write!(f, "Space"),
            KeyCode::Char(c) => write!(f, "{}", c),
            KeyCode::F(n) => write!(f, "F{}", n),
            other => write!(f, "{:?}", other),
        }
    }
}

/// Number of function keys.
pub const FUNCTION_KEYS: usize = 12;

/// One of the twelve function keys.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FunctionKey(u8);

impl FunctionKey {
    /// F1, reserved for Accept.
    pub const ACCEPT: FunctionKey = FunctionKey(1);
    /// F2, reserved for Revert.
    pub const REVERT: FunctionKey = FunctionKey(2);
    /// F3, reserved for Cancel.
    pub const CANCEL: FunctionKey = FunctionKey(3);

    /// Create a function key from its number (1-12).
    pub const fn new(n: u8) -> Option<Self> {
        if n >= 1 && n as usize <= FUNCTION_KEYS {
            Some(FunctionKey(n))
        } else {
            None
        }
    }

    /// The key number (1-12).
    pub const fn number(self) -> u8 {
        self.0
    }

    /// Zero-based slot index.
    pub const fn index(self) -> usize {
        self.0 as usize - 1
    }

    /// Whether the key is one of the reserved F1-F3.
    pub const fn is_reserved(self) -> bool {
        self.0 <= 3
    }

    /// All function keys in order.
    pub fn all() -> impl Iterator<Item = FunctionKey> {
        (1..=FUNCTION_KEYS as u8).map(FunctionKey)
    }
}

impl fmt::Display for FunctionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "F{}", self.0)
    }
}
