//! Positions
//!
//! Two coordinate types cross the wire: the floating position a client
//! reports for itself, and the integer point used for maze cells.

use std::fmt;
use serde::{Serialize, Deserialize};

/// Integer point in maze rendering coordinates.
///
/// `x` is the column index; `y` is the negated row index, so walking down
/// the grid decreases `y`.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct GridPoint {
    /// Horizontal coordinate (column).
    pub x: i32,
    /// Vertical coordinate (negated row).
    pub y: i32,
}

impl GridPoint {
    /// Create a new point.
    #[inline]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Convert a grid (row, col) index into a rendering point.
    #[inline]
    pub fn from_cell(row: usize, col: usize) -> Self {
        Self {
            x: col as i32,
            y: -(row as i32),
        }
    }
}

impl fmt::Debug for GridPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

impl fmt::Display for GridPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Position reported by a client, in the same axes as [`GridPoint`].
///
/// `z` is carried through untouched for the renderer.
#[derive(Clone, Copy, Debug, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    /// Horizontal coordinate.
    pub x: f64,
    /// Vertical coordinate.
    pub y: f64,
    /// Depth coordinate, unused by the server.
    #[serde(default)]
    pub z: f64,
}

impl Position {
    /// Create a new position.
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Round `x` and `y` to the nearest integer cell.
    ///
    /// Halves round toward positive infinity, so `-2.5` lands on `-2`.
    /// Returns `None` for non-finite coordinates.
    pub fn rounded(&self) -> Option<GridPoint> {
        if !self.x.is_finite() || !self.y.is_finite() {
            return None;
        }
        let x = (self.x + 0.5).floor();
        let y = (self.y + 0.5).floor();
        if x < i32::MIN as f64 || x > i32::MAX as f64 || y < i32::MIN as f64 || y > i32::MAX as f64 {
            return None;
        }
        Some(GridPoint::new(x as i32, y as i32))
    }
}
