//! Multi-source heat field shared by every agent steering toward the hives.

use std::collections::VecDeque;

use hive_defence_core::CellCoord;

use crate::{GoalRegistry, OccupancyGrid};

/// Sentinel stored for cells no breadth-first wave has reached.
const UNSET: u16 = u16::MAX;

/// Dense hop-distance grid seeded from every registered goal cell.
///
/// The field mirrors the occupancy grid's dimensions and stores the result
/// of a multi-source breadth-first search: goal cells hold 0, every other
/// reachable empty cell holds the hop count to its nearest goal, and
/// unreachable cells stay unset. Propagation is strictly orthogonal; the
/// point-to-point search takes diagonal shortcuts the field deliberately
/// ignores, trading resolution for a single bulk pass shared by all agents.
#[derive(Clone, Debug, Default)]
pub struct HeatMap {
    columns: u32,
    rows: u32,
    distances: Vec<u16>,
    range: u16,
}

impl HeatMap {
    /// Recomputes the field wholesale from the grid and goal registry.
    ///
    /// Every previous value is discarded. Goal cells are seeded at distance
    /// 0 even when the goal structure occupies them; the wave then expands
    /// only into cells that are empty for routing purposes.
    pub fn rebuild(&mut self, grid: &OccupancyGrid, goals: &GoalRegistry) {
        let (columns, rows) = grid.dimensions();
        let cell_count_u64 = u64::from(columns) * u64::from(rows);
        let cell_count = usize::try_from(cell_count_u64).unwrap_or(0);

        self.columns = columns;
        self.rows = rows;
        self.range = 0;

        if cell_count == 0 {
            self.distances.clear();
            return;
        }

        if self.distances.len() != cell_count {
            self.distances = vec![UNSET; cell_count];
        } else {
            self.distances.fill(UNSET);
        }

        let mut queue = VecDeque::new();

        for goal in goals.cells() {
            let Some(index) = grid.index(goal) else {
                continue;
            };

            if self.distances[index] == 0 {
                continue;
            }

            self.distances[index] = 0;
            queue.push_back(goal);
        }

        while let Some(cell) = queue.pop_front() {
            let Some(current_index) = grid.index(cell) else {
                continue;
            };
            let current_distance = self.distances[current_index];

            if current_distance >= UNSET.saturating_sub(1) {
                continue;
            }

            let next_distance = current_distance + 1;

            for neighbor in orthogonal_neighbors(cell, columns, rows) {
                if !grid.is_empty(neighbor) {
                    continue;
                }

                let Some(neighbor_index) = grid.index(neighbor) else {
                    continue;
                };

                if self.distances[neighbor_index] != UNSET {
                    continue;
                }

                self.distances[neighbor_index] = next_distance;
                if next_distance > self.range {
                    self.range = next_distance;
                }
                queue.push_back(neighbor);
            }
        }
    }

    /// Number of columns covered by the field.
    #[must_use]
    pub const fn columns(&self) -> u32 {
        self.columns
    }

    /// Number of rows covered by the field.
    #[must_use]
    pub const fn rows(&self) -> u32 {
        self.rows
    }

    /// Hop distance for the cell, or `None` when unreachable or out of bounds.
    #[must_use]
    pub fn value(&self, cell: CellCoord) -> Option<u16> {
        if cell.column() >= self.columns || cell.row() >= self.rows {
            return None;
        }

        let width = usize::try_from(self.columns).ok()?;
        let row = usize::try_from(cell.row()).ok()?;
        let column = usize::try_from(cell.column()).ok()?;
        match self.distances.get(row * width + column).copied() {
            Some(UNSET) | None => None,
            Some(distance) => Some(distance),
        }
    }

    /// Largest hop distance assigned by the last rebuild.
    ///
    /// Visualization collaborators use this to normalize the field.
    #[must_use]
    pub const fn range(&self) -> u16 {
        self.range
    }

    /// Dense distances in row-major order; unreachable cells hold `u16::MAX`.
    #[must_use]
    pub fn cells(&self) -> &[u16] {
        &self.distances
    }
}

fn orthogonal_neighbors(cell: CellCoord, columns: u32, rows: u32) -> impl Iterator<Item = CellCoord> {
    let mut candidates = [None; 4];
    let mut count = 0;

    if let Some(row) = cell.row().checked_sub(1) {
        candidates[count] = Some(CellCoord::new(cell.column(), row));
        count += 1;
    }

    if let Some(column) = cell.column().checked_add(1) {
        if column < columns {
            candidates[count] = Some(CellCoord::new(column, cell.row()));
            count += 1;
        }
    }

    if let Some(row) = cell.row().checked_add(1) {
        if row < rows {
            candidates[count] = Some(CellCoord::new(cell.column(), row));
            count += 1;
        }
    }

    if let Some(column) = cell.column().checked_sub(1) {
        candidates[count] = Some(CellCoord::new(column, cell.row()));
        count += 1;
    }

    candidates.into_iter().take(count).flatten()
}
