//! Color support for screenform.
//!
//! Every painted cell carries a [`ColorPair`]. Colors are passed explicitly
//! to each paint call; there is no ambient "current color" state.

use crate::error::{Error, Result};

/// Standard terminal color (the 16-entry ANSI palette plus the terminal default).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Color {
    /// The terminal's configured default.
    #[default]
    Default,
    /// Black (color 0).
    Black,
    /// Red (color 1).
    Red,
    /// Green (color 2).
    Green,
    /// Yellow (color 3).
    Yellow,
    /// Blue (color 4).
    Blue,
    /// Magenta (color 5).
    Magenta,
    /// Cyan (color 6).
    Cyan,
    /// White (color 7).
    White,
    /// Bright black / grey (color 8).
    BrightBlack,
    /// Bright red (color 9).
    BrightRed,
    /// Bright green (color 10).
    BrightGreen,
    /// Bright yellow (color 11).
    BrightYellow,
    /// Bright blue (color 12).
    BrightBlue,
    /// Bright magenta (color 13).
    BrightMagenta,
    /// Bright cyan (color 14).
    BrightCyan,
    /// Bright white (color 15).
    BrightWhite,
}

impl Color {
    /// Convert from a palette index (0-15).
    pub fn from_index(index: i16) -> Option<Self> {
        use Color::*;
        const TABLE: [Color; 16] = [
            Black,
            Red,
            Green,
            Yellow,
            Blue,
            Magenta,
            Cyan,
            White,
            BrightBlack,
            BrightRed,
            BrightGreen,
            BrightYellow,
            BrightBlue,
            BrightMagenta,
            BrightCyan,
            BrightWhite,
        ];
        usize::try_from(index).ok().and_then(|i| TABLE.get(i).copied())
    }

    /// Palette index, or `None` for the terminal default.
    pub const fn index(self) -> Option<u8> {
        match self {
            Color::Default => None,
            Color::Black => Some(0),
            Color::Red => Some(1),
            Color::Green => Some(2),
            Color::Yellow => Some(3),
            Color::Blue => Some(4),
            Color::Magenta => Some(5),
            Color::Cyan => Some(6),
            Color::White => Some(7),
            Color::BrightBlack => Some(8),
            Color::BrightRed => Some(9),
            Color::BrightGreen => Some(10),
            Color::BrightYellow => Some(11),
            Color::BrightBlue => Some(12),
            Color::BrightMagenta => Some(13),
            Color::BrightCyan => Some(14),
            Color::BrightWhite => Some(15),
        }
    }

    /// SGR parameter selecting this color as foreground.
    pub fn fg_code(self) -> u8 {
        match self.index() {
            None => 39,
            Some(i) if i < 8 => 30 + i,
            Some(i) => 90 + i - 8,
        }
    }

    /// SGR parameter selecting this color as background.
    pub fn bg_code(self) -> u8 {
        match self.index() {
            None => 49,
            Some(i) if i < 8 => 40 + i,
            Some(i) => 100 + i - 8,
        }
    }
}

impl TryFrom<i16> for Color {
    type Error = Error;

    fn try_from(value: i16) -> Result<Self> {
        Color::from_index(value)
            .ok_or_else(|| Error::InvalidArgument(format!("invalid color index: {}", value)))
    }
}

/// Foreground and background color of one cell.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct ColorPair {
    /// Foreground color.
    pub foreground: Color,
    /// Background color.
    pub background: Color,
}

impl ColorPair {
    /// Create a new color pair.
    pub const fn new(foreground: Color, background: Color) -> Self {
        Self {
            foreground,
            background,
        }
    }

    /// The same pair with foreground and background swapped.
    pub const fn reversed(self) -> Self {
        Self {
            foreground: self.background,
            background: self.foreground,
        }
    }

    /// The SGR escape sequence selecting this pair.
    pub fn sgr(self) -> String {
        format!(
            "\x1b[0;{};{}m",
            self.foreground.fg_code(),
            self.background.bg_code()
        )
    }
}

/// Colors used to paint a single field.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct FieldColors {
    /// Unused cells (template characters).
    pub base: ColorPair,
    /// Entered content.
    pub data: ColorPair,
    /// Selected content.
    pub selection: ColorPair,
    /// The field's title.
    pub title: ColorPair,
    /// The title while the field's data is invalid.
    pub invalid: ColorPair,
}

impl Default for FieldColors {
    fn default() -> Self {
        Theme::default().field
    }
}

/// Colors of the whole form: chrome plus the default field colors.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Theme {
    /// Background of the form area.
    pub background: ColorPair,
    /// Title bar on the top row.
    pub title_bar: ColorPair,
    /// Function-key legend.
    pub legend: ColorPair,
    /// Legend entry of a key that cannot currently be used.
    pub legend_disabled: ColorPair,
    /// Status line on the bottom row.
    pub status: ColorPair,
    /// Default colors for fields that do not bring their own.
    pub field: FieldColors,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            background: ColorPair::new(Color::White, Color::Blue),
            title_bar: ColorPair::new(Color::Black, Color::Cyan),
            legend: ColorPair::new(Color::BrightWhite, Color::Blue),
            legend_disabled: ColorPair::new(Color::BrightBlack, Color::Blue),
            status: ColorPair::new(Color::Black, Color::White),
            field: FieldColors {
                base: ColorPair::new(Color::BrightBlack, Color::Black),
                data: ColorPair::new(Color::BrightWhite, Color::Black),
                selection: ColorPair::new(Color::Black, Color::BrightCyan),
                title: ColorPair::new(Color::BrightYellow, Color::Blue),
                invalid: ColorPair::new(Color::BrightRed, Color::Blue),
            },
        }
    }
}

impl Theme {
    /// A theme using only the terminal's default colors, for `NO_COLOR`.
    pub fn monochrome() -> Self {
        let plain = ColorPair::default();
        let inverse = ColorPair::new(Color::Black, Color::White);
        Self {
            background: plain,
            title_bar: inverse,
            legend: plain,
            legend_disabled: plain,
            status: inverse,
            field: FieldColors {
                base: plain,
                data: plain,
                selection: inverse,
                title: plain,
                invalid: inverse,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_color_codes() {
        assert_eq!(Color::Red.fg_code(), 31);
        assert_eq!(Color::Red.bg_code(), 41);
        assert_eq!(Color::BrightBlue.fg_code(), 94);
        assert_eq!(Color::BrightBlue.bg_code(), 104);
        assert_eq!(Color::Default.fg_code(), 39);
        assert_eq!(Color::Default.bg_code(), 49);
    }

    #[test]
    fn test_color_from_index() {
        assert_eq!(Color::from_index(0), Some(Color::Black));
        assert_eq!(Color::from_index(15), Some(Color::BrightWhite));
        assert_eq!(Color::from_index(16), None);
        assert!(Color::try_from(-1).is_err());
    }

    #[test]
    fn test_pair_sgr() {
        let pair = ColorPair::new(Color::Yellow, Color::Blue);
        assert_eq!(pair.sgr(), "\x1b[0;33;44m");
        assert_eq!(pair.reversed(), ColorPair::new(Color::Blue, Color::Yellow));
    }
}
