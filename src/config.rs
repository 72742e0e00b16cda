//! Form configuration.
//!
//! [`FormConfig`] collects the knobs that are not part of an individual
//! field: refresh timing, the template character for empty cells, escape
//! sequence timing and the color theme.

use crate::color::Theme;
use std::time::Duration;

/// Default status refresh interval.
pub const DEFAULT_STATUS_INTERVAL: Duration = Duration::from_millis(250);

/// Default escape-sequence delay in milliseconds (curses' `ESCDELAY`).
pub const DEFAULT_ESCAPE_DELAY: u64 = 100;

/// Runtime settings for a form.
#[derive(Clone, Debug, PartialEq)]
pub struct FormConfig {
    /// How often the status thread polls lock-key state.
    pub status_interval: Duration,
    /// Character painted into unused field cells.
    pub template_char: char,
    /// Ring the bell when a field rejects a keystroke.
    pub beep_on_reject: bool,
    /// How long to wait for the rest of an escape sequence, in milliseconds.
    pub escape_delay: u64,
    /// Colors of the chrome and the default field colors.
    pub theme: Theme,
}

impl Default for FormConfig {
    fn default() -> Self {
        Self {
            status_interval: DEFAULT_STATUS_INTERVAL,
            template_char: '_',
            beep_on_reject: true,
            escape_delay: DEFAULT_ESCAPE_DELAY,
            theme: Theme::default(),
        }
    }
}

impl FormConfig {
    /// Defaults adjusted by the environment.
    ///
    /// - `ESCDELAY`: escape delay in milliseconds
    /// - `NO_COLOR`: when set and non-empty, use the monochrome theme
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();
        if let Some(delay) = lookup("ESCDELAY").and_then(|v| v.trim().parse().ok()) {
            config.escape_delay = delay;
        }
        if lookup("NO_COLOR").is_some_and(|v| !v.is_empty()) {
            config.theme = Theme::monochrome();
        }
        config
    }

    /// Set the status refresh interval.
    #[must_use]
    pub fn with_status_interval(mut self, interval: Duration) -> Self {
        self.status_interval = interval;
        self
    }

    /// Set the template character.
    #[must_use]
    pub fn with_template_char(mut self, ch: char) -> Self {
        self.template_char = ch;
        self
    }

    /// Enable or disable the reject bell.
    #[must_use]
    pub fn with_beep_on_reject(mut self, beep: bool) -> Self {
        self.beep_on_reject = beep;
        self
    }

    /// Set the escape delay.
    #[must_use]
    pub fn with_escape_delay(mut self, millis: u64) -> Self {
        self.escape_delay = millis;
        self
    }

    /// Set the theme.
    #[must_use]
    pub fn with_theme(mut self, theme: Theme) -> Self {
        self.theme = theme;
        self
    }
}
