#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Deterministic point-to-point search toward the nearest hive.
//!
//! Each invocation of [`find_route`] builds its search state from scratch,
//! reads the occupancy grid and goal registry, and returns an owned
//! [`Route`]. Nothing is shared between invocations, so agents needing new
//! routes within the same simulation tick plan independently and in any
//! order without affecting each other's results.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use hive_defence_core::{CellCoord, Route, SearchError};
use hive_defence_world::{GoalRegistry, OccupancyGrid};

/// Maximum number of node expansions before a search is abandoned.
///
/// Bounds worst-case cost on disconnected or very large maps. A search that
/// hits the cutoff returns the degenerate single-cell route, which callers
/// must treat as "no path found" rather than a teleport instruction.
pub const EXPANSION_CUTOFF: usize = 20_000;

/// Goal-test radius: a cell satisfies the goal test when some registered
/// goal cell lies within one step, diagonal steps included.
pub const GOAL_RADIUS: f64 = std::f64::consts::SQRT_2;

const ORTHOGONAL_STEP: f64 = 1.0;
const DIAGONAL_STEP: f64 = std::f64::consts::SQRT_2;

/// Plans the best-effort shortest route from `start` to the nearest cell
/// satisfying the goal test.
///
/// The returned route begins at `start` and ends at the terminal cell. Two
/// outcomes share the length-1 shape: `start` already satisfying the goal
/// test, and an exhausted search (cutoff reached or the open set drained
/// with no path). Callers disambiguate by running
/// [`GoalRegistry::contains_within`] on the start cell with [`GOAL_RADIUS`].
///
/// # Errors
///
/// Fails with [`SearchError::Grid`] when `start` lies outside the grid and
/// with [`SearchError::EmptyGoalRegistry`] when no goal structure has been
/// placed; both indicate configuration bugs in the surrounding system.
pub fn find_route(
    grid: &OccupancyGrid,
    goals: &GoalRegistry,
    start: CellCoord,
) -> Result<Route, SearchError> {
    let _ = grid.cell_at(start)?;
    if goals.is_empty() {
        return Err(SearchError::EmptyGoalRegistry);
    }

    if goals.contains_within(start, GOAL_RADIUS) {
        return Ok(Route::single(start));
    }

    let mut search = Search::new(grid, goals);
    search.push_start(start);

    let mut expansions = 0;
    while let Some(node_index) = search.pop_authoritative() {
        if expansions == EXPANSION_CUTOFF {
            return Ok(Route::single(start));
        }
        expansions += 1;

        if goals.contains_within(search.cell_of(node_index), GOAL_RADIUS) {
            return Ok(search.reconstruct(node_index));
        }

        search.expand(node_index);
    }

    // Open set drained without reaching a goal: the start is walled in.
    Ok(Route::single(start))
}

/// Ephemeral state owned by a single search invocation.
struct Search<'a> {
    grid: &'a OccupancyGrid,
    goals: &'a GoalRegistry,
    columns: u32,
    rows: u32,
    arena: Vec<SearchNode>,
    open: BinaryHeap<OpenEntry>,
    settled: Vec<bool>,
    sequence: u64,
}

/// Arena-allocated search node; parent links are arena indices.
struct SearchNode {
    cell: CellCoord,
    parent: Option<usize>,
    cost: f64,
}

/// Heap entry ordered by (priority asc, cost asc, insertion sequence asc).
///
/// Duplicate entries for one cell are expected; the first pop of a cell is
/// authoritative and later duplicates are discarded as stale.
struct OpenEntry {
    priority: f64,
    cost: f64,
    sequence: u64,
    node: usize,
}

impl PartialEq for OpenEntry {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for OpenEntry {}

impl PartialOrd for OpenEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for OpenEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reversed: BinaryHeap is a max-heap and the search pops minima.
        other
            .priority
            .total_cmp(&self.priority)
            .then_with(|| other.cost.total_cmp(&self.cost))
            .then_with(|| other.sequence.cmp(&self.sequence))
    }
}

impl<'a> Search<'a> {
    fn new(grid: &'a OccupancyGrid, goals: &'a GoalRegistry) -> Self {
        let (columns, rows) = grid.dimensions();
        let cell_count_u64 = u64::from(columns) * u64::from(rows);
        let cell_count = usize::try_from(cell_count_u64).unwrap_or(0);
        Self {
            grid,
            goals,
            columns,
            rows,
            arena: Vec::new(),
            open: BinaryHeap::new(),
            settled: vec![false; cell_count],
            sequence: 0,
        }
    }

    fn push_start(&mut self, start: CellCoord) {
        self.push_node(start, None, 0.0);
    }

    fn push_node(&mut self, cell: CellCoord, parent: Option<usize>, cost: f64) {
        let Some(heuristic) = self.goals.nearest_goal_distance(cell) else {
            return;
        };

        let node = self.arena.len();
        self.arena.push(SearchNode { cell, parent, cost });
        self.open.push(OpenEntry {
            priority: cost + heuristic,
            cost,
            sequence: self.sequence,
            node,
        });
        self.sequence += 1;
    }

    /// Pops until an unsettled cell surfaces, discarding stale duplicates.
    fn pop_authoritative(&mut self) -> Option<usize> {
        while let Some(entry) = self.open.pop() {
            let cell = self.arena[entry.node].cell;
            let Some(index) = self.cell_index(cell) else {
                continue;
            };
            if self.settled[index] {
                continue;
            }
            self.settled[index] = true;
            return Some(entry.node);
        }
        None
    }

    fn cell_of(&self, node: usize) -> CellCoord {
        self.arena[node].cell
    }

    fn expand(&mut self, node: usize) {
        let cell = self.arena[node].cell;
        let cost = self.arena[node].cost;
        let column = cell.column();
        let row = cell.row();

        let west = column.checked_sub(1);
        let east = (column + 1 < self.columns).then_some(column + 1);
        let north = row.checked_sub(1);
        let south = (row + 1 < self.rows).then_some(row + 1);

        let orthogonals = [
            north.map(|r| CellCoord::new(column, r)),
            east.map(|c| CellCoord::new(c, row)),
            south.map(|r| CellCoord::new(column, r)),
            west.map(|c| CellCoord::new(c, row)),
        ];

        for neighbor in orthogonals.into_iter().flatten() {
            if self.enterable(neighbor) {
                self.push_node(neighbor, Some(node), cost + ORTHOGONAL_STEP);
            }
        }

        let diagonals = [
            match (east, north) {
                (Some(c), Some(r)) => Some(CellCoord::new(c, r)),
                _ => None,
            },
            match (east, south) {
                (Some(c), Some(r)) => Some(CellCoord::new(c, r)),
                _ => None,
            },
            match (west, south) {
                (Some(c), Some(r)) => Some(CellCoord::new(c, r)),
                _ => None,
            },
            match (west, north) {
                (Some(c), Some(r)) => Some(CellCoord::new(c, r)),
                _ => None,
            },
        ];

        for diagonal in diagonals.into_iter().flatten() {
            if !self.enterable(diagonal) {
                continue;
            }

            // A diagonal move may not cut a corner: at least one of the two
            // flanking orthogonal cells must be empty ground.
            let flank_a = CellCoord::new(diagonal.column(), row);
            let flank_b = CellCoord::new(column, diagonal.row());
            if !self.grid.is_empty(flank_a) && !self.grid.is_empty(flank_b) {
                continue;
            }

            self.push_node(diagonal, Some(node), cost + DIAGONAL_STEP);
        }
    }

    fn enterable(&self, cell: CellCoord) -> bool {
        match self.cell_index(cell) {
            Some(index) => !self.settled[index] && self.grid.is_empty(cell),
            None => false,
        }
    }

    /// Walks parent links from the terminal back to the start, then reverses.
    fn reconstruct(&self, terminal: usize) -> Route {
        let mut cells = Vec::new();
        let mut cursor = Some(terminal);
        while let Some(node) = cursor {
            cells.push(self.arena[node].cell);
            cursor = self.arena[node].parent;
        }
        cells.reverse();
        Route::from_cells(cells)
    }

    fn cell_index(&self, cell: CellCoord) -> Option<usize> {
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

#[cfg(test)]
mod tests {
    use super::*;
    use hive_defence_core::{CellRect, CellRectSize};

    fn rect(column: u32, row: u32, width: u32, height: u32) -> CellRect {
        CellRect::from_origin_and_size(
            CellCoord::new(column, row),
            CellRectSize::new(width, height),
        )
    }

    fn goals_at(cells: &[(u32, u32)]) -> GoalRegistry {
        let mut goals = GoalRegistry::new();
        for &(column, row) in cells {
            goals.register(rect(column, row, 1, 1));
        }
        goals
    }

    #[test]
    fn open_entry_orders_by_priority_then_cost_then_sequence() {
        let mut heap = BinaryHeap::new();
        heap.push(OpenEntry {
            priority: 2.0,
            cost: 1.0,
            sequence: 0,
            node: 0,
        });
        heap.push(OpenEntry {
            priority: 1.0,
            cost: 0.5,
            sequence: 1,
            node: 1,
        });
        heap.push(OpenEntry {
            priority: 1.0,
            cost: 0.25,
            sequence: 2,
            node: 2,
        });
        heap.push(OpenEntry {
            priority: 1.0,
            cost: 0.25,
            sequence: 3,
            node: 3,
        });

        let order: Vec<usize> = std::iter::from_fn(|| heap.pop().map(|entry| entry.node)).collect();
        assert_eq!(order, vec![2, 3, 1, 0]);
    }

    #[test]
    fn start_out_of_bounds_surfaces_grid_error() {
        let grid = OccupancyGrid::open(4, 4);
        let goals = goals_at(&[(2, 2)]);
        let result = find_route(&grid, &goals, CellCoord::new(4, 0));
        assert!(matches!(result, Err(SearchError::Grid(_))));
    }

    #[test]
    fn empty_registry_aborts_deterministically() {
        let grid = OccupancyGrid::open(4, 4);
        let goals = GoalRegistry::new();
        assert_eq!(
            find_route(&grid, &goals, CellCoord::new(0, 0)),
            Err(SearchError::EmptyGoalRegistry)
        );
    }

    #[test]
    fn start_satisfying_goal_test_yields_single_cell_route() {
        let grid = OccupancyGrid::open(4, 4);
        let goals = goals_at(&[(2, 2)]);
        let start = CellCoord::new(1, 1);

        let route = find_route(&grid, &goals, start).expect("route");
        assert_eq!(route.cells(), &[start]);
        assert!(goals.contains_within(start, GOAL_RADIUS));
    }

    #[test]
    fn enclosed_start_returns_degenerate_route() {
        let mut grid = OccupancyGrid::open(5, 5);
        grid.mark_occupied(rect(1, 0, 1, 2)).expect("east wall");
        grid.mark_occupied(rect(0, 1, 1, 1)).expect("south wall");
        let goals = goals_at(&[(4, 4)]);
        let start = CellCoord::new(0, 0);

        let route = find_route(&grid, &goals, start).expect("route");
        assert_eq!(route.cells(), &[start]);
        assert!(!goals.contains_within(start, GOAL_RADIUS));
    }

    #[test]
    fn route_steps_are_adjacent_and_start_anchored() {
        let mut grid = OccupancyGrid::open(8, 8);
        grid.mark_occupied(rect(3, 0, 1, 6)).expect("wall");
        let goals = goals_at(&[(6, 2)]);
        let start = CellCoord::new(1, 1);

        let route = find_route(&grid, &goals, start).expect("route");
        assert_eq!(route.cells().first(), Some(&start));
        for pair in route.cells().windows(2) {
            let column_diff = pair[0].column().abs_diff(pair[1].column());
            let row_diff = pair[0].row().abs_diff(pair[1].row());
            assert!(column_diff <= 1 && row_diff <= 1 && column_diff + row_diff >= 1);
        }
        let terminal = route.terminal().expect("terminal");
        assert!(goals.contains_within(terminal, GOAL_RADIUS));
    }

    #[test]
    fn diagonal_steps_never_cut_corners() {
        let mut grid = OccupancyGrid::open(6, 6);
        // Two blockers pinching the diagonal between (2, 2) and (3, 3).
        grid.mark_occupied(rect(3, 2, 1, 1)).expect("blocker");
        grid.mark_occupied(rect(2, 3, 1, 1)).expect("blocker");
        let goals = goals_at(&[(5, 5)]);

        let route = find_route(&grid, &goals, CellCoord::new(0, 0)).expect("route");
        for pair in route.cells().windows(2) {
            let column_diff = pair[0].column().abs_diff(pair[1].column());
            let row_diff = pair[0].row().abs_diff(pair[1].row());
            if column_diff == 1 && row_diff == 1 {
                let flank_a = CellCoord::new(pair[1].column(), pair[0].row());
                let flank_b = CellCoord::new(pair[0].column(), pair[1].row());
                assert!(grid.is_empty(flank_a) || grid.is_empty(flank_b));
            }
        }
    }

    #[test]
    fn repeated_searches_return_identical_routes() {
        let mut grid = OccupancyGrid::open(12, 12);
        grid.mark_occupied(rect(4, 2, 1, 8)).expect("wall");
        grid.mark_occupied(rect(7, 0, 1, 7)).expect("wall");
        let goals = goals_at(&[(10, 10)]);
        let start = CellCoord::new(0, 0);

        let first = find_route(&grid, &goals, start).expect("first");
        let second = find_route(&grid, &goals, start).expect("second");
        assert_eq!(first, second);
    }
}
