//! Field collections.
//!
//! A [`FieldCollection`] is the ordered set of fields making up a form. It
//! keeps fields from overlapping each other (labels included), maps screen
//! points to fields, and defines the tab order.

use crate::error::{Error, Result};
use crate::field::Field;
use crate::screen::ScreenBuffer;
use crate::types::{Coord, FieldBounds, ScreenPoint, ScreenSize};
use crate::value::FieldValue;
use std::collections::HashMap;

/// What [`FieldCollection::add`] did with a field.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AddOutcome {
    /// The field was appended.
    Added,
    /// The field took the place of the field with the same data name.
    Replaced,
    /// The field overlaps another field and was dropped.
    Rejected {
        /// Data name of the field in the way.
        conflict: String,
    },
}

/// A direction for cell-by-cell scans.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Towards row 0.
    Up,
    /// Towards the last row.
    Down,
    /// Towards column 0.
    Left,
    /// Towards the last column.
    Right,
}

impl Direction {
    /// Column and row step of one cell in this direction.
    pub const fn delta(self) -> (Coord, Coord) {
        match self {
            Direction::Up => (0, -1),
            Direction::Down => (0, 1),
            Direction::Left => (-1, 0),
            Direction::Right => (1, 0),
        }
    }
}

/// All regions a field occupies: its bounds and, if present, its label.
fn regions(field: &Field) -> impl Iterator<Item = FieldBounds> {
    std::iter::once(field.bounds()).chain(field.title_bounds())
}

/// The ordered fields of one form.
#[derive(Clone, Debug)]
pub struct FieldCollection {
    screen: ScreenSize,
    fields: Vec<Field>,
}

impl FieldCollection {
    /// Create an empty collection for a screen of the given size.
    pub fn new(screen: ScreenSize) -> Self {
        Self {
            screen,
            fields: Vec::new(),
        }
    }

    /// Screen size fields are checked against.
    pub fn screen_size(&self) -> ScreenSize {
        self.screen
    }

    /// Add a field.
    ///
    /// A field lying off the screen is an error. A field overlapping
    /// another one is dropped and reported as [`AddOutcome::Rejected`],
    /// unless the other field has the same data name, in which case it is
    /// replaced.
    pub fn add(&mut self, field: Field) -> Result<AddOutcome> {
        for region in regions(&field) {
            if !region.fits(self.screen) {
                return Err(Error::Bounds {
                    name: field.data_name().to_string(),
                    x: region.left(),
                    y: region.top(),
                    width: region.width,
                    height: region.height,
                    max_x: self.screen.width,
                    max_y: self.screen.height,
                });
            }
        }

        let conflict = self
            .fields
            .iter()
            .filter(|other| other.data_name() != field.data_name())
            .find(|other| regions(other).any(|a| regions(&field).any(|b| a.intersects(&b))));
        if let Some(other) = conflict {
            tracing::debug!(
                field = field.data_name(),
                conflict = other.data_name(),
                "overlapping field rejected"
            );
            return Ok(AddOutcome::Rejected {
                conflict: other.data_name().to_string(),
            });
        }

        match self.position(field.data_name()) {
            Some(index) => {
                tracing::debug!(field = field.data_name(), "field replaced");
                self.fields[index] = field;
                Ok(AddOutcome::Replaced)
            }
            None => {
                tracing::debug!(field = field.data_name(), bounds = ?field.bounds(), "field added");
                self.fields.push(field);
                Ok(AddOutcome::Added)
            }
        }
    }

    /// Remove the field with the given data name.
    pub fn remove(&mut self, data_name: &str) -> Option<Field> {
        let index = self.position(data_name)?;
        Some(self.fields.remove(index))
    }

    // ========================================================================
    // Lookup
    // ========================================================================

    /// Number of fields.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Whether there are no fields.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// The field at an index.
    pub fn get(&self, index: usize) -> Option<&Field> {
        self.fields.get(index)
    }

    /// Mutable access to the field at an index.
    pub fn get_mut(&mut self, index: usize) -> Option<&mut Field> {
        self.fields.get_mut(index)
    }

    /// Index of the field with the given data name.
    pub fn position(&self, data_name: &str) -> Option<usize> {
        self.fields.iter().position(|f| f.data_name() == data_name)
    }

    /// The field with the given data name.
    pub fn by_name(&self, data_name: &str) -> Option<&Field> {
        self.position(data_name).map(|i| &self.fields[i])
    }

    /// Iterate over the fields in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &Field> {
        self.fields.iter()
    }

    /// Iterate mutably over the fields in insertion order.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Field> {
        self.fields.iter_mut()
    }

    /// Index of the field containing `p`.
    pub fn field_at(&self, p: ScreenPoint) -> Option<usize> {
        self.fields.iter().position(|f| f.bounds().contains(p))
    }

    /// Smallest rectangle covering every field.
    pub fn aggregate_bounds(&self) -> Option<FieldBounds> {
        self.fields
            .iter()
            .map(Field::bounds)
            .reduce(|a, b| a.union(&b))
    }

    // ========================================================================
    // Tab order
    // ========================================================================

    /// The field after the one containing `p`, wrapping.
    ///
    /// From a point outside every field, the aggregate rectangle is scanned
    /// row by row from `p` until a field is reached.
    pub fn next(&self, p: ScreenPoint) -> Option<usize> {
        let count = self.fields.len();
        if let Some(index) = self.field_at(p) {
            return Some((index + 1) % count);
        }
        let area = self.aggregate_bounds()?;
        let after = raster_cells(area).find(|c| (c.y, c.x) > (p.y, p.x) && self.field_at(*c).is_some());
        after
            .or_else(|| raster_cells(area).find(|c| self.field_at(*c).is_some()))
            .and_then(|c| self.field_at(c))
    }

    /// The field before the one containing `p`, wrapping.
    pub fn prev(&self, p: ScreenPoint) -> Option<usize> {
        let count = self.fields.len();
        if let Some(index) = self.field_at(p) {
            return Some((index + count - 1) % count);
        }
        let area = self.aggregate_bounds()?;
        let cells: Vec<ScreenPoint> = raster_cells(area).collect();
        let before = cells
            .iter()
            .rev()
            .find(|c| (c.y, c.x) < (p.y, p.x) && self.field_at(**c).is_some());
        before
            .or_else(|| cells.iter().rev().find(|c| self.field_at(**c).is_some()))
            .and_then(|c| self.field_at(*c))
    }

    /// Walk from `p` one cell at a time until a field other than the one
    /// containing `p` is reached, staying inside the aggregate rectangle.
    pub fn scan(&self, p: ScreenPoint, direction: Direction) -> Option<usize> {
        let area = self.aggregate_bounds()?;
        let start = self.field_at(p);
        let (dx, dy) = direction.delta();
        let mut at = p;
        loop {
            at = at.offset(dx, dy);
            let outside = match direction {
                Direction::Up => at.y < area.top(),
                Direction::Down => at.y >= area.bottom(),
                Direction::Left => at.x < area.left(),
                Direction::Right => at.x >= area.right(),
            };
            if outside {
                return None;
            }
            match self.field_at(at) {
                Some(index) if Some(index) != start => return Some(index),
                _ => {}
            }
        }
    }

    // ========================================================================
    // Whole-form operations
    // ========================================================================

    /// Whether every field holds valid data.
    pub fn is_valid(&self) -> bool {
        self.fields.iter().all(Field::is_valid_data)
    }

    /// The value of every field, keyed by data name.
    pub fn values(&self) -> Result<HashMap<String, FieldValue>> {
        self.fields
            .iter()
            .map(|f| Ok((f.data_name().to_string(), f.to_value()?)))
            .collect()
    }

    /// Restore every field's original value.
    pub fn revert_all(&mut self) {
        for field in &mut self.fields {
            field.revert();
        }
    }

    /// Paint every field.
    pub fn write_all(&self, screen: &mut ScreenBuffer, template: char) -> Result<()> {
        for field in &self.fields {
            field.write(screen, template)?;
        }
        Ok(())
    }
}

/// Every cell of `area` in row-major order.
fn raster_cells(area: FieldBounds) -> impl Iterator<Item = ScreenPoint> {
    (area.top()..area.bottom())
        .flat_map(move |y| (area.left()..area.right()).map(move |x| ScreenPoint::new(x, y)))
}

impl<'a> IntoIterator for &'a FieldCollection {
    type Item = &'a Field;
    type IntoIter = std::slice::Iter<'a, Field>;

    fn into_iter(self) -> Self::IntoIter {
        self.fields.iter()
    }
}
