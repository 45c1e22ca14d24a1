#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Hive Defence navigation engine.
//!
//! This crate defines the value types that connect the authoritative world,
//! the pure search systems, and the adapters: grid coordinates, footprint
//! rectangles, traversability classes, routes, and the error taxonomy. None
//! of these types own mutable simulation state; the world crate does.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Location of a single grid cell expressed as column and row coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CellCoord {
    column: u32,
    row: u32,
}

impl CellCoord {
    /// Creates a new grid cell coordinate.
    #[must_use]
    pub const fn new(column: u32, row: u32) -> Self {
        Self { column, row }
    }

    /// Zero-based column index of the cell.
    #[must_use]
    pub const fn column(&self) -> u32 {
        self.column
    }

    /// Zero-based row index of the cell.
    #[must_use]
    pub const fn row(&self) -> u32 {
        self.row
    }

    /// Computes the Manhattan distance between two cell coordinates.
    #[must_use]
    pub fn manhattan_distance(self, other: CellCoord) -> u32 {
        self.column().abs_diff(other.column()) + self.row().abs_diff(other.row())
    }

    /// Computes the Euclidean distance between two cell coordinates.
    #[must_use]
    pub fn euclidean_distance(self, other: CellCoord) -> f64 {
        let column_diff = f64::from(self.column().abs_diff(other.column()));
        let row_diff = f64::from(self.row().abs_diff(other.row()));
        (column_diff * column_diff + row_diff * row_diff).sqrt()
    }
}

/// Axis-aligned rectangle expressed in cell coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CellRect {
    origin: CellCoord,
    size: CellRectSize,
}

impl CellRect {
    /// Constructs a rectangle from an origin cell and size.
    #[must_use]
    pub const fn from_origin_and_size(origin: CellCoord, size: CellRectSize) -> Self {
        Self { origin, size }
    }

    /// Upper-left cell that anchors the rectangle.
    #[must_use]
    pub const fn origin(&self) -> CellCoord {
        self.origin
    }

    /// Dimensions of the rectangle measured in whole cells.
    #[must_use]
    pub const fn size(&self) -> CellRectSize {
        self.size
    }

    /// Exclusive column bound of the rectangle, saturating at `u32::MAX`.
    #[must_use]
    pub const fn right(&self) -> u32 {
        self.origin.column().saturating_add(self.size.width())
    }

    /// Exclusive row bound of the rectangle, saturating at `u32::MAX`.
    #[must_use]
    pub const fn bottom(&self) -> u32 {
        self.origin.row().saturating_add(self.size.height())
    }

    /// Reports whether the rectangle covers the provided cell.
    #[must_use]
    pub fn contains(&self, cell: CellCoord) -> bool {
        cell.column() >= self.origin.column()
            && cell.column() < self.right()
            && cell.row() >= self.origin.row()
            && cell.row() < self.bottom()
    }

    /// Iterates over every cell covered by the rectangle in row-major order.
    pub fn cells(&self) -> impl Iterator<Item = CellCoord> {
        let origin = self.origin;
        let right = self.right();
        let bottom = self.bottom();
        (origin.row()..bottom)
            .flat_map(move |row| (origin.column()..right).map(move |column| CellCoord::new(column, row)))
    }
}

/// Size of a [`CellRect`] measured in whole cells.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CellRectSize {
    width: u32,
    height: u32,
}

impl CellRectSize {
    /// Creates a new size descriptor with explicit dimensions.
    #[must_use]
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Width of the rectangle in cells.
    #[must_use]
    pub const fn width(&self) -> u32 {
        self.width
    }

    /// Height of the rectangle in cells.
    #[must_use]
    pub const fn height(&self) -> u32 {
        self.height
    }
}

/// Traversability class assigned to a tile when the world is generated.
///
/// `Limited` marks tiles reserved for a privileged agent (the player); routed
/// agents treat them exactly like walls. The class never changes after world
/// load; only the occupancy flag of a tile mutates.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TileClass {
    /// Freely traversable ground.
    Open,
    /// Ground reserved for the privileged agent, impassable to routed agents.
    Limited,
    /// Permanently impassable terrain.
    Wall,
}

/// Opaque terrain/decoration identifier carried by each tile.
///
/// Pathing never inspects the value; it exists so rendering and persistence
/// collaborators can round-trip their tile flavour through the grid.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TerrainId(u8);

impl TerrainId {
    /// Creates a new terrain identifier from its raw byte.
    #[must_use]
    pub const fn new(value: u8) -> Self {
        Self(value)
    }

    /// Retrieves the raw byte backing the identifier.
    #[must_use]
    pub const fn get(&self) -> u8 {
        self.0
    }
}

/// Ordered sequence of cells produced by the point-to-point search.
///
/// A route runs from the requesting agent's start cell (inclusive) to the
/// terminal cell that satisfied the goal test. Two distinct outcomes share
/// the length-1 shape: a start cell that already satisfies the goal test and
/// an exhausted search that found no path. Callers must run the goal test on
/// the start cell to tell them apart before consuming a single-cell route.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Route {
    cells: Vec<CellCoord>,
}

impl Route {
    /// Creates a route from an ordered cell sequence.
    #[must_use]
    pub fn from_cells(cells: Vec<CellCoord>) -> Self {
        Self { cells }
    }

    /// Creates the degenerate single-cell route anchored at `cell`.
    #[must_use]
    pub fn single(cell: CellCoord) -> Self {
        Self { cells: vec![cell] }
    }

    /// Ordered cells composing the route, start first.
    #[must_use]
    pub fn cells(&self) -> &[CellCoord] {
        &self.cells
    }

    /// Number of cells in the route.
    #[must_use]
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// Reports whether the route contains no cells.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Final cell of the route, if any.
    #[must_use]
    pub fn terminal(&self) -> Option<CellCoord> {
        self.cells.last().copied()
    }

    /// Iterator over the route's cells in travel order.
    pub fn iter(&self) -> impl Iterator<Item = CellCoord> + '_ {
        self.cells.iter().copied()
    }
}

/// Errors surfaced by occupancy grid lookups and mutations.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum GridError {
    /// The requested coordinate lies outside the grid extent.
    ///
    /// Never silently clamped: clamping would corrupt routing correctness.
    #[error("cell ({column}, {row}) lies outside the {columns}x{rows} grid")]
    OutOfBounds {
        /// Column of the offending coordinate.
        column: u32,
        /// Row of the offending coordinate.
        row: u32,
        /// Number of columns in the grid.
        columns: u32,
        /// Number of rows in the grid.
        rows: u32,
    },
    /// The tile vector supplied at load time disagrees with the dimensions.
    #[error("expected {expected} tiles for the grid, received {actual}")]
    CellCountMismatch {
        /// Tile count implied by the grid dimensions.
        expected: usize,
        /// Tile count actually provided.
        actual: usize,
    },
}

/// Errors surfaced by the point-to-point search.
///
/// Search exhaustion is deliberately absent: an exhausted search returns the
/// degenerate single-cell [`Route`] rather than an error, because it is a
/// routine outcome on partially blocked maps.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum SearchError {
    /// A grid lookup failed; propagated unmodified from the occupancy grid.
    #[error(transparent)]
    Grid(#[from] GridError),
    /// The goal test was invoked with no registered goal cells.
    ///
    /// Indicates a configuration bug upstream (no goal structures placed);
    /// the search aborts deterministically instead of looping.
    #[error("goal registry is empty; no goal structures have been placed")]
    EmptyGoalRegistry,
}
