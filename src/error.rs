//! Error types for screenform.

use thiserror::Error;

/// Result type alias for screenform operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur while building or running a form.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// A field does not fit on the terminal screen.
    #[error("field `{name}` at ({x}, {y}) size {width}x{height} lies outside the {max_x}x{max_y} screen")]
    Bounds {
        /// The field's data name.
        name: String,
        /// Left column of the field.
        x: i32,
        /// Top row of the field.
        y: i32,
        /// Field width.
        width: i32,
        /// Field height.
        height: i32,
        /// Screen width.
        max_x: i32,
        /// Screen height.
        max_y: i32,
    },

    /// A field was given a non-positive width or height.
    #[error("invalid field dimensions {width}x{height}")]
    InvalidDimensions {
        /// The requested width.
        width: i32,
        /// The requested height.
        height: i32,
    },

    /// A screen read or write addressed a cell outside the grid.
    #[error("position ({x}, {y}) out of bounds (max: {max_x}, {max_y})")]
    OutOfBounds {
        /// The requested X coordinate.
        x: i32,
        /// The requested Y coordinate.
        y: i32,
        /// The maximum X coordinate.
        max_x: i32,
        /// The maximum Y coordinate.
        max_y: i32,
    },

    /// An I/O error occurred.
    #[error("I/O error: {0:?}")]
    Io(std::io::ErrorKind),

    /// A system call failed with the given errno.
    #[error("system error: {0}")]
    SystemError(i32),

    /// A filter or validation pattern failed to compile.
    #[error("invalid pattern `{pattern}`: {message}")]
    InvalidPattern {
        /// The pattern source.
        pattern: String,
        /// The compiler's diagnostic.
        message: String,
    },

    /// Field content could not be converted to the field's value type.
    #[error("invalid {kind} value: {text:?}")]
    InvalidValue {
        /// Name of the field kind.
        kind: &'static str,
        /// The offending text.
        text: String,
    },

    /// An initial value does not match the field kind.
    #[error("{kind} field cannot hold a {value} value")]
    KindMismatch {
        /// Name of the field kind.
        kind: &'static str,
        /// Name of the value variant.
        value: &'static str,
    },

    /// Every user-assignable function key is already bound.
    #[error("no free function key")]
    NoFreeFunctionKey,

    /// A lock (mutex) was poisoned.
    #[error("lock poisoned")]
    LockPoisoned,

    /// End of input was reached while waiting for a key.
    #[error("end of input")]
    Eof,

    /// An invalid argument was passed to a function.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Io(err.kind())
    }
}
