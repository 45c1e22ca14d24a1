#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative navigation state for Hive Defence.
//!
//! The world owns the only shared mutable state of the navigation core: the
//! occupancy grid, the goal registry, and the heat field derived from both.
//! Structure placement mutates the grid and registry; every search system
//! reads them through the [`query`] module and never writes back.

mod heatmap;

use std::collections::BTreeSet;

use hive_defence_core::{CellCoord, CellRect, GridError, TerrainId, TileClass};

pub use heatmap::HeatMap;

/// One grid unit of the world map.
///
/// Class and terrain are fixed at world load; only the occupancy flag
/// mutates, and only through structure placement. A tile is *empty* for
/// routing purposes iff its class is [`TileClass::Open`] and it carries no
/// structure.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Tile {
    class: TileClass,
    terrain: TerrainId,
    occupied: bool,
}

impl Tile {
    /// Creates an unoccupied tile with the provided class and terrain.
    #[must_use]
    pub const fn new(class: TileClass, terrain: TerrainId) -> Self {
        Self {
            class,
            terrain,
            occupied: false,
        }
    }

    /// Traversability class assigned at world load.
    #[must_use]
    pub const fn class(&self) -> TileClass {
        self.class
    }

    /// Opaque terrain identifier carried for rendering collaborators.
    #[must_use]
    pub const fn terrain(&self) -> TerrainId {
        self.terrain
    }

    /// Reports whether a structure currently occupies the tile.
    #[must_use]
    pub const fn is_occupied(&self) -> bool {
        self.occupied
    }

    /// Reports whether routed agents may enter the tile.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        matches!(self.class, TileClass::Open) && !self.occupied
    }

    fn mark_occupied(&mut self) {
        self.occupied = true;
    }
}

/// Fixed-size rectangular array of tiles and their occupancy state.
///
/// Allocated once at world load and never resized. Out-of-bounds lookups are
/// surfaced as [`GridError::OutOfBounds`] rather than clamped.
#[derive(Clone, Debug)]
pub struct OccupancyGrid {
    columns: u32,
    rows: u32,
    tiles: Vec<Tile>,
}

impl OccupancyGrid {
    /// Creates a grid of entirely open tiles with default terrain.
    #[must_use]
    pub fn open(columns: u32, rows: u32) -> Self {
        let capacity_u64 = u64::from(columns) * u64::from(rows);
        let capacity = usize::try_from(capacity_u64).unwrap_or(0);
        Self {
            columns,
            rows,
            tiles: vec![Tile::new(TileClass::Open, TerrainId::new(0)); capacity],
        }
    }

    /// Creates a grid from tiles produced by the world-load collaborator.
    ///
    /// The tiles must be laid out in row-major order and match the provided
    /// dimensions exactly.
    pub fn from_tiles(columns: u32, rows: u32, tiles: Vec<Tile>) -> Result<Self, GridError> {
        let expected_u64 = u64::from(columns) * u64::from(rows);
        let expected = usize::try_from(expected_u64).unwrap_or(usize::MAX);
        if tiles.len() != expected {
            return Err(GridError::CellCountMismatch {
                expected,
                actual: tiles.len(),
            });
        }

        Ok(Self {
            columns,
            rows,
            tiles,
        })
    }

    /// Number of columns in the grid.
    #[must_use]
    pub const fn columns(&self) -> u32 {
        self.columns
    }

    /// Number of rows in the grid.
    #[must_use]
    pub const fn rows(&self) -> u32 {
        self.rows
    }

    /// Provides the grid dimensions as a `(columns, rows)` pair.
    #[must_use]
    pub const fn dimensions(&self) -> (u32, u32) {
        (self.columns, self.rows)
    }

    /// Bounds-checked tile lookup.
    pub fn cell_at(&self, cell: CellCoord) -> Result<&Tile, GridError> {
        let index = self.index(cell).ok_or(self.out_of_bounds(cell))?;
        self.tiles.get(index).ok_or(self.out_of_bounds(cell))
    }

    /// Reports whether routed agents may enter the cell.
    ///
    /// Out-of-bounds cells are never enterable.
    #[must_use]
    pub fn is_empty(&self, cell: CellCoord) -> bool {
        self.index(cell)
            .and_then(|index| self.tiles.get(index))
            .is_some_and(Tile::is_empty)
    }

    /// Reports whether the cell rejects structure placement.
    ///
    /// True when the cell is occupied, is a wall, or lies out of bounds.
    #[must_use]
    pub fn obstructs_tower(&self, cell: CellCoord) -> bool {
        match self.index(cell).and_then(|index| self.tiles.get(index)) {
            Some(tile) => tile.is_occupied() || matches!(tile.class(), TileClass::Wall),
            None => true,
        }
    }

    /// Marks every cell in the rectangle as occupied by a structure.
    ///
    /// The whole rectangle is bounds-checked before any flag is written, so
    /// a failed call leaves the grid untouched. Re-marking an occupied cell
    /// is a no-op.
    pub fn mark_occupied(&mut self, region: CellRect) -> Result<(), GridError> {
        self.check_region(region)?;
        for cell in region.cells() {
            if let Some(index) = self.index(cell) {
                if let Some(tile) = self.tiles.get_mut(index) {
                    tile.mark_occupied();
                }
            }
        }
        Ok(())
    }

    fn check_region(&self, region: CellRect) -> Result<(), GridError> {
        if region.right() > self.columns || region.bottom() > self.rows {
            let corner = CellCoord::new(
                region.right().saturating_sub(1),
                region.bottom().saturating_sub(1),
            );
            return Err(self.out_of_bounds(corner));
        }
        Ok(())
    }

    fn out_of_bounds(&self, cell: CellCoord) -> GridError {
        GridError::OutOfBounds {
            column: cell.column(),
            row: cell.row(),
            columns: self.columns,
            rows: self.rows,
        }
    }

    pub(crate) fn index(&self, cell: CellCoord) -> Option<usize> {
        if cell.column() < self.columns && cell.row() < self.rows {
            let row = usize::try_from(cell.row()).ok()?;
            let column = usize::try_from(cell.column()).ok()?;
            let width = usize::try_from(self.columns).ok()?;
            Some(row * width + column)
        } else {
            None
        }
    }
}

/// Set of cells currently acting as path destinations.
///
/// The registry is the union of all goal-bearing structure footprints. It
/// stores coordinates only; occupancy state lives in the grid. Iteration
/// order is the coordinate order of [`CellCoord`], keeping every consumer
/// deterministic.
#[derive(Clone, Debug, Default)]
pub struct GoalRegistry {
    cells: BTreeSet<CellCoord>,
}

impl GoalRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds every cell of the footprint to the registry.
    pub fn register(&mut self, footprint: CellRect) {
        for cell in footprint.cells() {
            let _ = self.cells.insert(cell);
        }
    }

    /// Removes every cell of the footprint from the registry.
    pub fn unregister(&mut self, footprint: CellRect) {
        for cell in footprint.cells() {
            let _ = self.cells.remove(&cell);
        }
    }

    /// Number of registered goal cells.
    #[must_use]
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// Reports whether no goal cells are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Reports whether the exact cell is registered as a goal.
    #[must_use]
    pub fn contains(&self, cell: CellCoord) -> bool {
        self.cells.contains(&cell)
    }

    /// Iterator over registered goal cells in coordinate order.
    pub fn cells(&self) -> impl Iterator<Item = CellCoord> + '_ {
        self.cells.iter().copied()
    }

    /// Minimum Euclidean distance from `cell` to any registered goal cell.
    ///
    /// Returns `None` when the registry is empty; callers treat that as an
    /// invariant violation rather than "infinitely far".
    #[must_use]
    pub fn nearest_goal_distance(&self, cell: CellCoord) -> Option<f64> {
        self.cells
            .iter()
            .map(|goal| cell.euclidean_distance(*goal))
            .min_by(f64::total_cmp)
    }

    /// Goal-test primitive: is any registered cell within `radius` of `cell`?
    #[must_use]
    pub fn contains_within(&self, cell: CellCoord, radius: f64) -> bool {
        self.nearest_goal_distance(cell)
            .is_some_and(|distance| distance <= radius)
    }
}

/// Authoritative navigation world combining grid, goals, and heat field.
#[derive(Clone, Debug)]
pub struct World {
    grid: OccupancyGrid,
    goals: GoalRegistry,
    heat: HeatMap,
}

impl World {
    /// Creates a world around a grid delivered by the world-load collaborator.
    ///
    /// The heat field starts entirely unset; call
    /// [`World::refresh_flow_field`] once goals are registered.
    #[must_use]
    pub fn from_grid(grid: OccupancyGrid) -> Self {
        Self {
            grid,
            goals: GoalRegistry::new(),
            heat: HeatMap::default(),
        }
    }

    /// Places a structure footprint, registering it as a goal when asked.
    ///
    /// Marks every footprint cell occupied; goal-bearing structures
    /// additionally contribute their footprint to the goal registry. The
    /// heat field is not refreshed implicitly; callers refresh after a batch
    /// of structural changes.
    pub fn place_structure(&mut self, region: CellRect, goal_bearing: bool) -> Result<(), GridError> {
        self.grid.mark_occupied(region)?;
        if goal_bearing {
            self.goals.register(region);
        }
        Ok(())
    }

    /// Reports whether the footprint is placeable: in bounds and unobstructed.
    #[must_use]
    pub fn can_place(&self, region: CellRect) -> bool {
        region.cells().count() > 0 && region.cells().all(|cell| !self.grid.obstructs_tower(cell))
    }

    /// Marks a non-goal structure footprint as occupied.
    pub fn mark_structure_occupied(&mut self, region: CellRect) -> Result<(), GridError> {
        self.grid.mark_occupied(region)
    }

    /// Registers a goal footprint without touching occupancy.
    pub fn register_goal(&mut self, region: CellRect) -> Result<(), GridError> {
        if region.right() > self.grid.columns() || region.bottom() > self.grid.rows() {
            let corner = CellCoord::new(
                region.right().saturating_sub(1),
                region.bottom().saturating_sub(1),
            );
            return Err(GridError::OutOfBounds {
                column: corner.column(),
                row: corner.row(),
                columns: self.grid.columns(),
                rows: self.grid.rows(),
            });
        }
        self.goals.register(region);
        Ok(())
    }

    /// Removes a goal footprint from the registry.
    pub fn unregister_goal(&mut self, region: CellRect) {
        self.goals.unregister(region);
    }

    /// Recomputes the heat field wholesale from the current grid and goals.
    ///
    /// Must be re-invoked after any structural change; the field is never
    /// patched incrementally.
    pub fn refresh_flow_field(&mut self) {
        self.heat.rebuild(&self.grid, &self.goals);
    }

    /// Hop distance from the cell to the nearest goal, if reachable.
    #[must_use]
    pub fn flow_value_at(&self, cell: CellCoord) -> Option<u16> {
        self.heat.value(cell)
    }

    /// Largest hop distance assigned by the last refresh.
    #[must_use]
    pub fn flow_range(&self) -> u16 {
        self.heat.range()
    }
}

/// Query functions that provide read-only access to the world state.
pub mod query {
    use super::{GoalRegistry, HeatMap, OccupancyGrid, World};

    /// Provides read-only access to the occupancy grid.
    #[must_use]
    pub fn grid(world: &World) -> &OccupancyGrid {
        &world.grid
    }

    /// Provides read-only access to the goal registry.
    #[must_use]
    pub fn goals(world: &World) -> &GoalRegistry {
        &world.goals
    }

    /// Provides read-only access to the heat field published by the last refresh.
    #[must_use]
    pub fn heat_map(world: &World) -> &HeatMap {
        &world.heat
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hive_defence_core::CellRectSize;

    fn rect(column: u32, row: u32, width: u32, height: u32) -> CellRect {
        CellRect::from_origin_and_size(
            CellCoord::new(column, row),
            CellRectSize::new(width, height),
        )
    }

    #[test]
    fn cell_at_rejects_out_of_bounds_coordinates() {
        let grid = OccupancyGrid::open(4, 3);
        assert!(grid.cell_at(CellCoord::new(3, 2)).is_ok());
        assert_eq!(
            grid.cell_at(CellCoord::new(4, 0)),
            Err(GridError::OutOfBounds {
                column: 4,
                row: 0,
                columns: 4,
                rows: 3,
            })
        );
    }

    #[test]
    fn from_tiles_rejects_mismatched_cell_count() {
        let tiles = vec![Tile::new(TileClass::Open, TerrainId::new(0)); 5];
        assert_eq!(
            OccupancyGrid::from_tiles(2, 3, tiles).unwrap_err(),
            GridError::CellCountMismatch {
                expected: 6,
                actual: 5,
            }
        );
    }

    #[test]
    fn walls_and_limited_tiles_are_never_empty() {
        let tiles = vec![
            Tile::new(TileClass::Open, TerrainId::new(0)),
            Tile::new(TileClass::Limited, TerrainId::new(0)),
            Tile::new(TileClass::Wall, TerrainId::new(0)),
        ];
        let grid = OccupancyGrid::from_tiles(3, 1, tiles).expect("grid");
        assert!(grid.is_empty(CellCoord::new(0, 0)));
        assert!(!grid.is_empty(CellCoord::new(1, 0)));
        assert!(!grid.is_empty(CellCoord::new(2, 0)));
        assert!(!grid.is_empty(CellCoord::new(3, 0)));
    }

    #[test]
    fn mark_occupied_is_idempotent_and_visible_to_is_empty() {
        let mut grid = OccupancyGrid::open(4, 4);
        let region = rect(1, 1, 2, 2);
        grid.mark_occupied(region).expect("first placement");
        grid.mark_occupied(region).expect("idempotent placement");

        for cell in region.cells() {
            assert!(!grid.is_empty(cell));
            assert!(grid.obstructs_tower(cell));
        }
        assert!(grid.is_empty(CellCoord::new(0, 0)));
    }

    #[test]
    fn mark_occupied_rejects_region_crossing_the_boundary() {
        let mut grid = OccupancyGrid::open(4, 4);
        let result = grid.mark_occupied(rect(3, 3, 2, 1));
        assert_eq!(
            result,
            Err(GridError::OutOfBounds {
                column: 4,
                row: 3,
                columns: 4,
                rows: 4,
            })
        );
        // Failed placement must leave the grid untouched.
        assert!(grid.is_empty(CellCoord::new(3, 3)));
    }

    #[test]
    fn obstructs_tower_matches_walls_and_occupancy() {
        let tiles = vec![
            Tile::new(TileClass::Open, TerrainId::new(0)),
            Tile::new(TileClass::Wall, TerrainId::new(0)),
            Tile::new(TileClass::Limited, TerrainId::new(0)),
            Tile::new(TileClass::Open, TerrainId::new(0)),
        ];
        let mut grid = OccupancyGrid::from_tiles(2, 2, tiles).expect("grid");
        grid.mark_occupied(rect(1, 1, 1, 1)).expect("placement");

        assert!(!grid.obstructs_tower(CellCoord::new(0, 0)));
        assert!(grid.obstructs_tower(CellCoord::new(1, 0)));
        // Limited tiles accept structures even though agents cannot cross them.
        assert!(!grid.obstructs_tower(CellCoord::new(0, 1)));
        assert!(grid.obstructs_tower(CellCoord::new(1, 1)));
        assert!(grid.obstructs_tower(CellCoord::new(2, 0)));
    }

    #[test]
    fn registry_is_union_of_registered_footprints() {
        let mut goals = GoalRegistry::new();
        goals.register(rect(0, 0, 2, 1));
        goals.register(rect(1, 0, 2, 1));
        assert_eq!(goals.len(), 3);
        assert!(goals.contains(CellCoord::new(1, 0)));

        goals.unregister(rect(1, 0, 2, 1));
        assert_eq!(goals.len(), 1);
        assert!(goals.contains(CellCoord::new(0, 0)));
        assert!(!goals.contains(CellCoord::new(2, 0)));
    }

    #[test]
    fn nearest_goal_distance_scans_all_goals() {
        let mut goals = GoalRegistry::new();
        goals.register(rect(0, 0, 1, 1));
        goals.register(rect(6, 8, 1, 1));

        let probe = CellCoord::new(3, 4);
        let expected = probe.euclidean_distance(CellCoord::new(0, 0));
        let actual = goals.nearest_goal_distance(probe).expect("distance");
        assert!((actual - expected).abs() < f64::EPSILON);
        assert!(goals.nearest_goal_distance(CellCoord::new(6, 8)).expect("distance") == 0.0);
    }

    #[test]
    fn nearest_goal_distance_is_none_for_empty_registry() {
        let goals = GoalRegistry::new();
        assert_eq!(goals.nearest_goal_distance(CellCoord::new(0, 0)), None);
        assert!(!goals.contains_within(CellCoord::new(0, 0), 100.0));
    }

    #[test]
    fn contains_within_accepts_diagonal_adjacency() {
        let mut goals = GoalRegistry::new();
        goals.register(rect(5, 5, 1, 1));
        let radius = std::f64::consts::SQRT_2;

        assert!(goals.contains_within(CellCoord::new(5, 5), radius));
        assert!(goals.contains_within(CellCoord::new(4, 5), radius));
        assert!(goals.contains_within(CellCoord::new(4, 4), radius));
        assert!(!goals.contains_within(CellCoord::new(3, 5), radius));
        assert!(!goals.contains_within(CellCoord::new(3, 4), radius));
    }

    #[test]
    fn place_structure_marks_occupancy_and_optionally_goals() {
        let mut world = World::from_grid(OccupancyGrid::open(8, 8));
        world.place_structure(rect(1, 1, 2, 2), false).expect("structure");
        world.place_structure(rect(5, 5, 2, 2), true).expect("hub");

        assert!(query::grid(&world).obstructs_tower(CellCoord::new(1, 1)));
        assert!(!query::goals(&world).contains(CellCoord::new(1, 1)));
        assert!(query::goals(&world).contains(CellCoord::new(5, 5)));
        assert!(query::goals(&world).contains(CellCoord::new(6, 6)));
        assert_eq!(query::goals(&world).len(), 4);
    }

    #[test]
    fn can_place_rejects_obstructed_and_out_of_bounds_footprints() {
        let mut world = World::from_grid(OccupancyGrid::open(4, 4));
        world.place_structure(rect(0, 0, 2, 2), false).expect("structure");

        assert!(!world.can_place(rect(1, 1, 2, 2)));
        assert!(world.can_place(rect(2, 2, 2, 2)));
        assert!(!world.can_place(rect(3, 3, 2, 2)));
        assert!(!world.can_place(rect(0, 0, 0, 0)));
    }

    #[test]
    fn register_goal_rejects_out_of_bounds_footprints() {
        let mut world = World::from_grid(OccupancyGrid::open(4, 4));
        assert!(world.register_goal(rect(4, 0, 1, 1)).is_err());
        assert!(query::goals(&world).is_empty());
    }

    #[test]
    fn refresh_flow_field_tracks_structural_changes() {
        let mut world = World::from_grid(OccupancyGrid::open(5, 5));
        world.place_structure(rect(2, 2, 1, 1), true).expect("hub");
        world.refresh_flow_field();

        assert_eq!(world.flow_value_at(CellCoord::new(2, 2)), Some(0));
        assert_eq!(world.flow_value_at(CellCoord::new(2, 0)), Some(2));

        // New blocking structure forces a detour after the next refresh.
        world.place_structure(rect(2, 1, 1, 1), false).expect("blocker");
        assert_eq!(world.flow_value_at(CellCoord::new(2, 0)), Some(2));
        world.refresh_flow_field();
        assert_eq!(world.flow_value_at(CellCoord::new(2, 1)), None);
        assert_eq!(world.flow_value_at(CellCoord::new(2, 0)), Some(4));
    }
}
