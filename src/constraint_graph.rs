use std::collections::HashMap;

use smallvec::SmallVec;

use crate::grid::Grid;
use crate::types::{GridCoord, SlotId, MAX_SLOT_LENGTH};

/// A struct representing a crossing between one slot and another, referencing the other slot's id
/// and the location of the intersection within the other slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Crossing {
    pub other_slot_id: SlotId,
    pub other_slot_cell: usize,
}

/// The binary constraints of the puzzle. Everything is computed eagerly from slot geometry so
/// that lookups during propagation and search are O(1).
#[derive(Debug, Clone)]
pub struct ConstraintGraph {
    slot_count: usize,

    /// Dense `slot_count * slot_count` table; entry `x * slot_count + y` holds `(i, j)` if cell
    /// `i` of slot `x` is cell `j` of slot `y`.
    overlaps: Vec<Option<(usize, usize)>>,

    /// Neighbors of each slot, sorted by id.
    neighbors: Vec<Vec<SlotId>>,

    /// For each slot, the crossing (if any) at each of its cells.
    crossings: Vec<SmallVec<[Option<Crossing>; MAX_SLOT_LENGTH]>>,
}

impl ConstraintGraph {
    pub fn new(grid: &Grid) -> ConstraintGraph {
        let slot_count = grid.slot_count();

        // Build a map from cell location to the slots running through it, which we can then use
        // to calculate crossings.
        let mut slots_by_loc: HashMap<GridCoord, SmallVec<[(SlotId, usize); 2]>> = HashMap::new();
        for (slot_id, slot) in grid.slots().iter().enumerate() {
            for (cell_idx, loc) in slot.cells().enumerate() {
                slots_by_loc.entry(loc).or_default().push((slot_id, cell_idx));
            }
        }

        let mut overlaps = vec![None; slot_count * slot_count];
        let mut neighbors: Vec<Vec<SlotId>> = vec![vec![]; slot_count];
        let mut crossings: Vec<SmallVec<[Option<Crossing>; MAX_SLOT_LENGTH]>> = grid
            .slots()
            .iter()
            .map(|slot| (0..slot.length).map(|_| None).collect())
            .collect();

        for entries in slots_by_loc.values() {
            for &(x, i) in entries {
                for &(y, j) in entries {
                    if x == y {
                        continue;
                    }
                    overlaps[x * slot_count + y] = Some((i, j));
                    neighbors[x].push(y);
                    crossings[x][i] = Some(Crossing { other_slot_id: y, other_slot_cell: j });
                }
            }
        }

        for slot_neighbors in &mut neighbors {
            slot_neighbors.sort_unstable();
            slot_neighbors.dedup();
        }

        ConstraintGraph { slot_count, overlaps, neighbors, crossings }
    }

    pub fn slot_count(&self) -> usize {
        self.slot_count
    }

    /// If `x` and `y` share a cell, return `(i, j)` such that character `i` of `x`'s word must
    /// equal character `j` of `y`'s word.
    pub fn overlaps(&self, x: SlotId, y: SlotId) -> Option<(usize, usize)> {
        if x >= self.slot_count || y >= self.slot_count {
            return None;
        }
        self.overlaps[x * self.slot_count + y]
    }

    pub fn neighbors(&self, slot_id: SlotId) -> &[SlotId] {
        self.neighbors.get(slot_id).map(Vec::as_slice).unwrap_or_default()
    }

    /// Number of slots crossing this one.
    pub fn degree(&self, slot_id: SlotId) -> usize {
        self.neighbors(slot_id).len()
    }

    pub fn crossings(&self, slot_id: SlotId) -> &[Option<Crossing>] {
        self.crossings.get(slot_id).map(|crossings| crossings.as_slice()).unwrap_or_default()
    }

    /// Every ordered pair of neighboring slots.
    pub fn arcs(&self) -> impl Iterator<Item=(SlotId, SlotId)> + '_ {
        self.neighbors
            .iter()
            .enumerate()
            .flat_map(|(x, slot_neighbors)| slot_neighbors.iter().map(move |&y| (x, y)))
    }
}

#[cfg(test)]
mod tests {
    use crate::grid::Grid;
    use crate::test_utils::grid_from_template;
    use super::{ConstraintGraph, Crossing};

    #[test]
    fn test_overlaps_are_symmetric() {
        // 0: across at (1, 0); 1: down at (0, 1).
        let grid = grid_from_template(
            "
            #.#
            ...
            #.#
            ",
        );
        let graph = ConstraintGraph::new(&grid);

        assert_eq!(graph.overlaps(0, 1), Some((1, 1)));
        assert_eq!(graph.overlaps(1, 0), Some((1, 1)));
        assert_eq!(graph.overlaps(0, 0), None);
        assert_eq!(graph.neighbors(0), &[1]);
        assert_eq!(graph.neighbors(1), &[0]);
        assert_eq!(graph.arcs().collect::<Vec<_>>(), vec![(0, 1), (1, 0)]);
        assert_eq!(
            graph.crossings(0),
            &[None, Some(Crossing { other_slot_id: 1, other_slot_cell: 1 }), None],
        );
    }

    #[test]
    fn test_offsets_in_open_square() {
        let grid = grid_from_template(
            "
            ...
            ...
            ...
            ",
        );
        let graph = ConstraintGraph::new(&grid);

        // Across rows are 0..3, down columns are 3..6.
        for row in 0..3 {
            for col in 0..3 {
                assert_eq!(graph.overlaps(row, 3 + col), Some((col, row)));
            }
            assert_eq!(graph.degree(row), 3);
        }
        assert_eq!(graph.overlaps(0, 1), None, "parallel slots never overlap");
        assert_eq!(graph.arcs().count(), 18);
    }

    #[test]
    fn test_isolated_slot_has_no_neighbors() {
        let graph = ConstraintGraph::new(&Grid::new(vec![vec![true; 4]]));

        assert_eq!(graph.slot_count(), 1);
        assert!(graph.neighbors(0).is_empty());
        assert_eq!(graph.arcs().count(), 0);
        assert_eq!(graph.overlaps(0, 7), None);

        // Unknown slots look isolated too.
        assert!(graph.neighbors(7).is_empty());
        assert_eq!(graph.degree(7), 0);
        assert!(graph.crossings(7).is_empty());
    }
}
