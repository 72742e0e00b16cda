//! Core type definitions for screenform.
//!
//! Coordinates are absolute terminal cells with `(0, 0)` at the top-left
//! corner, `x` growing to the right and `y` growing downwards.

use crate::error::{Error, Result};

/// Terminal coordinate type.
pub type Coord = i32;

/// An absolute terminal cell.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ScreenPoint {
    /// X coordinate (column).
    pub x: Coord,
    /// Y coordinate (row).
    pub y: Coord,
}

impl ScreenPoint {
    /// Create a new point.
    #[must_use]
    pub const fn new(x: Coord, y: Coord) -> Self {
        Self { x, y }
    }

    /// Offset this point by `dx` columns and `dy` rows.
    #[must_use]
    pub const fn offset(self, dx: Coord, dy: Coord) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
        }
    }

    /// Clamp this point into a screen of the given size.
    #[must_use]
    pub fn clamp_to(self, size: ScreenSize) -> Self {
        Self {
            x: self.x.clamp(0, (size.width - 1).max(0)),
            y: self.y.clamp(0, (size.height - 1).max(0)),
        }
    }
}

impl From<(Coord, Coord)> for ScreenPoint {
    fn from((x, y): (Coord, Coord)) -> Self {
        Self { x, y }
    }
}

/// Terminal dimensions in cells.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ScreenSize {
    /// Number of columns.
    pub width: Coord,
    /// Number of rows.
    pub height: Coord,
}

impl ScreenSize {
    /// Create a new size.
    #[must_use]
    pub const fn new(width: Coord, height: Coord) -> Self {
        Self { width, height }
    }

    /// Check if a point lies on the screen.
    #[must_use]
    pub const fn contains(&self, p: ScreenPoint) -> bool {
        p.x >= 0 && p.y >= 0 && p.x < self.width && p.y < self.height
    }
}

impl Default for ScreenSize {
    fn default() -> Self {
        Self::new(80, 24)
    }
}

/// A rectangular region of the screen occupied by a field.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct FieldBounds {
    /// Top-left cell.
    pub location: ScreenPoint,
    /// Width in columns (at least 1).
    pub width: Coord,
    /// Height in rows (at least 1).
    pub height: Coord,
}

impl FieldBounds {
    /// Create new bounds, rejecting non-positive dimensions.
    pub fn new(location: ScreenPoint, width: Coord, height: Coord) -> Result<Self> {
        if width < 1 || height < 1 {
            return Err(Error::InvalidDimensions { width, height });
        }
        Ok(Self {
            location,
            width,
            height,
        })
    }

    /// Left X coordinate.
    #[must_use]
    pub const fn left(&self) -> Coord {
        self.location.x
    }

    /// Top Y coordinate.
    #[must_use]
    pub const fn top(&self) -> Coord {
        self.location.y
    }

    /// Right X coordinate (exclusive).
    #[must_use]
    pub const fn right(&self) -> Coord {
        self.location.x + self.width
    }

    /// Bottom Y coordinate (exclusive).
    #[must_use]
    pub const fn bottom(&self) -> Coord {
        self.location.y + self.height
    }

    /// Check if a point is within these bounds.
    #[must_use]
    pub const fn contains(&self, p: ScreenPoint) -> bool {
        p.x >= self.left() && p.x < self.right() && p.y >= self.top() && p.y < self.bottom()
    }

    /// Check if two rectangles share at least one cell.
    #[must_use]
    pub const fn intersects(&self, other: &FieldBounds) -> bool {
        self.left() < other.right()
            && other.left() < self.right()
            && self.top() < other.bottom()
            && other.top() < self.bottom()
    }

    /// The smallest rectangle covering both.
    #[must_use]
    pub fn union(&self, other: &FieldBounds) -> FieldBounds {
        let left = self.left().min(other.left());
        let top = self.top().min(other.top());
        FieldBounds {
            location: ScreenPoint::new(left, top),
            width: self.right().max(other.right()) - left,
            height: self.bottom().max(other.bottom()) - top,
        }
    }

    /// Check if these bounds lie completely on a screen of the given size.
    #[must_use]
    pub const fn fits(&self, size: ScreenSize) -> bool {
        self.left() >= 0 && self.top() >= 0 && self.right() <= size.width && self.bottom() <= size.height
    }

    /// Convert an absolute point into a point relative to the top-left cell.
    #[must_use]
    pub const fn relative(&self, p: ScreenPoint) -> ScreenPoint {
        ScreenPoint::new(p.x - self.location.x, p.y - self.location.y)
    }

    /// Convert a relative point into an absolute one.
    #[must_use]
    pub const fn absolute(&self, p: ScreenPoint) -> ScreenPoint {
        ScreenPoint::new(p.x + self.location.x, p.y + self.location.y)
    }
}

/// Editing mode, mirrored by the terminal cursor shape.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum EditMode {
    /// Typed characters shift existing text to the right (underline cursor).
    #[default]
    Insert,
    /// Typed characters replace existing text (block cursor).
    Overwrite,
}

impl EditMode {
    /// The other mode.
    #[must_use]
    pub const fn toggled(self) -> Self {
        match self {
            EditMode::Insert => EditMode::Overwrite,
            EditMode::Overwrite => EditMode::Insert,
        }
    }
}

bitflags::bitflags! {
    /// Keyboard lock state shown on the status line.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct LockKeys: u8 {
        /// Caps Lock is on.
        const CAPS   = 0x01;
        /// Num Lock is on.
        const NUM    = 0x02;
        /// Scroll Lock is on.
        const SCROLL = 0x04;
        /// Insert mode is active.
        const INSERT = 0x08;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bounds_rejects_empty() {
        assert!(FieldBounds::new(ScreenPoint::new(0, 0), 0, 1).is_err());
        assert!(FieldBounds::new(ScreenPoint::new(0, 0), 3, -1).is_err());
        assert!(FieldBounds::new(ScreenPoint::new(0, 0), 1, 1).is_ok());
    }

    #[test]
    fn test_bounds_intersects() {
        let a = FieldBounds::new(ScreenPoint::new(2, 2), 4, 2).unwrap();
        let b = FieldBounds::new(ScreenPoint::new(5, 3), 2, 2).unwrap();
        let c = FieldBounds::new(ScreenPoint::new(6, 2), 2, 2).unwrap();
        assert!(a.intersects(&b));
        assert!(!a.intersects(&c));
        assert!(c.intersects(&b));
    }

    #[test]
    fn test_bounds_fit_and_union() {
        let size = ScreenSize::new(10, 5);
        let a = FieldBounds::new(ScreenPoint::new(8, 4), 2, 1).unwrap();
        let b = FieldBounds::new(ScreenPoint::new(9, 4), 2, 1).unwrap();
        assert!(a.fits(size));
        assert!(!b.fits(size));

        let u = a.union(&FieldBounds::new(ScreenPoint::new(0, 0), 1, 1).unwrap());
        assert_eq!(u.location, ScreenPoint::new(0, 0));
        assert_eq!((u.width, u.height), (10, 5));
    }

    #[test]
    fn test_point_clamp() {
        let size = ScreenSize::new(80, 24);
        assert_eq!(ScreenPoint::new(-3, 30).clamp_to(size), ScreenPoint::new(0, 23));
    }
}
