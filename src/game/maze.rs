//! Maze Generation
//!
//! Randomized depth-first carving over an odd-sized grid.
//!
//! Cells at odd (row, col) indices form the carving lattice. The generator
//! walks that lattice with an explicit stack, opening the single wall cell
//! between each pair of lattice cells it connects. The result is a spanning
//! tree: every open cell is reachable from the entrance and there are no
//! loops.

use serde::{Serialize, Deserialize};

use crate::core::position::GridPoint;
use crate::core::rng::DeterministicRng;

/// Default maze size, also the floor for regenerated mazes.
pub const DEFAULT_MAZE_SIZE: usize = 11;

/// Entrance cell (row, col).
pub const ENTRANCE: CellIndex = CellIndex { row: 1, col: 1 };

/// Grid cell state.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum Cell {
    /// Walkable cell.
    Open = 0,
    /// Solid cell.
    Wall = 1,
}

impl Cell {
    /// Wire encoding: 0 for open, 1 for wall.
    #[inline]
    pub fn as_u8(self) -> u8 {
        self as u8
    }
}

/// Grid index of a cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CellIndex {
    /// Row index, 0 at the top.
    pub row: usize,
    /// Column index, 0 at the left.
    pub col: usize,
}

impl CellIndex {
    /// Create a new index.
    pub const fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }

    /// Rendering point for this cell.
    pub fn to_point(self) -> GridPoint {
        GridPoint::from_cell(self.row, self.col)
    }
}

/// Maze dimensions in cells.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MazeDimensions {
    /// Number of rows (height).
    pub rows: usize,
    /// Number of columns (width).
    pub cols: usize,
}

impl MazeDimensions {
    /// Create new dimensions.
    pub const fn new(rows: usize, cols: usize) -> Self {
        Self { rows, cols }
    }

    /// Square dimensions.
    pub const fn square(size: usize) -> Self {
        Self { rows: size, cols: size }
    }

    /// Force both axes odd and at least `min` (itself rounded up to odd).
    pub fn normalized(self, min: usize) -> Self {
        let min = make_odd(min.max(3));
        Self {
            rows: make_odd(self.rows).max(min),
            cols: make_odd(self.cols).max(min),
        }
    }

    /// Dimensions for the maze that replaces a won one.
    ///
    /// Each axis is `client_count * 3 + r` with `r` drawn from `[0, 4)`,
    /// bumped to odd, then raised to `min` if smaller.
    pub fn scaled(client_count: usize, min: MazeDimensions, rng: &mut DeterministicRng) -> Self {
        let rows = scale_axis(client_count, rng).max(min.rows);
        let cols = scale_axis(client_count, rng).max(min.cols);
        Self { rows, cols }
    }
}

impl Default for MazeDimensions {
    fn default() -> Self {
        Self::square(DEFAULT_MAZE_SIZE)
    }
}

#[inline]
fn make_odd(n: usize) -> usize {
    if n % 2 == 0 { n + 1 } else { n }
}

fn scale_axis(client_count: usize, rng: &mut DeterministicRng) -> usize {
    let jitter = rng.next_int(4) as usize;
    make_odd(client_count.saturating_mul(3).saturating_add(jitter))
}

/// A carved maze. Immutable once generated.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Maze {
    rows: usize,
    cols: usize,
    /// Row-major cells.
    cells: Vec<Cell>,
    entrance: CellIndex,
    exit: CellIndex,
    walkable: Vec<CellIndex>,
}

impl Maze {
    /// Carve a new maze.
    ///
    /// `dims` must be odd and at least 3 on both axes; callers normalize
    /// before calling.
    pub fn generate(dims: MazeDimensions, rng: &mut DeterministicRng) -> Self {
        let MazeDimensions { rows, cols } = dims;
        let mut cells = vec![Cell::Wall; rows * cols];
        let idx = |c: CellIndex| c.row * cols + c.col;

        let mut stack = vec![ENTRANCE];
        let mut neighbors = Vec::with_capacity(4);

        while let Some(&current) = stack.last() {
            cells[idx(current)] = Cell::Open;

            neighbors.clear();
            let CellIndex { row, col } = current;
            if row >= 3 {
                neighbors.push(CellIndex::new(row - 2, col));
            }
            if col >= 3 {
                neighbors.push(CellIndex::new(row, col - 2));
            }
            if row + 2 <= rows.saturating_sub(2) {
                neighbors.push(CellIndex::new(row + 2, col));
            }
            if col + 2 <= cols.saturating_sub(2) {
                neighbors.push(CellIndex::new(row, col + 2));
            }
            neighbors.retain(|n| cells[idx(*n)] == Cell::Wall);

            match rng.choose(&neighbors).copied() {
                None => {
                    stack.pop();
                }
                Some(next) => {
                    let wall = CellIndex::new((row + next.row) / 2, (col + next.col) / 2);
                    cells[idx(wall)] = Cell::Open;
                    stack.push(next);
                }
            }
        }

        let walkable: Vec<CellIndex> = (0..rows)
            .flat_map(|row| (0..cols).map(move |col| CellIndex::new(row, col)))
            .filter(|c| cells[idx(*c)] == Cell::Open)
            .collect();

        // Entrance is always carved, so the list is never empty.
        let exit = rng.choose(&walkable).copied().unwrap_or(ENTRANCE);

        Self {
            rows,
            cols,
            cells,
            entrance: ENTRANCE,
            exit,
            walkable,
        }
    }

    /// Number of columns.
    pub fn width(&self) -> usize {
        self.cols
    }

    /// Number of rows.
    pub fn height(&self) -> usize {
        self.rows
    }

    /// Dimensions of this maze.
    pub fn dimensions(&self) -> MazeDimensions {
        MazeDimensions::new(self.rows, self.cols)
    }

    /// Cell at (row, col), or `None` out of bounds.
    pub fn cell(&self, row: usize, col: usize) -> Option<Cell> {
        if row < self.rows && col < self.cols {
            Some(self.cells[row * self.cols + col])
        } else {
            None
        }
    }

    /// Whether (row, col) is an open cell.
    pub fn is_open(&self, row: usize, col: usize) -> bool {
        self.cell(row, col) == Some(Cell::Open)
    }

    /// Rows of 0 (open) / 1 (wall).
    pub fn matrix(&self) -> Vec<Vec<u8>> {
        self.cells
            .chunks(self.cols)
            .map(|row| row.iter().map(|c| c.as_u8()).collect())
            .collect()
    }

    /// Open cells in row-major order.
    pub fn walkable_cells(&self) -> &[CellIndex] {
        &self.walkable
    }

    /// Open cells as rendering points, row-major.
    pub fn walkable_positions(&self) -> Vec<GridPoint> {
        self.walkable.iter().map(|c| c.to_point()).collect()
    }

    /// Entrance cell.
    pub fn entrance_cell(&self) -> CellIndex {
        self.entrance
    }

    /// Exit cell.
    pub fn exit_cell(&self) -> CellIndex {
        self.exit
    }

    /// Entrance as a rendering point.
    pub fn entrance(&self) -> GridPoint {
        self.entrance.to_point()
    }

    /// Exit as a rendering point.
    pub fn exit(&self) -> GridPoint {
        self.exit.to_point()
    }
}
