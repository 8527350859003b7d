use std::fmt::{Debug, Formatter};

use crate::types::{Direction, GridCoord, SlotId};

/// A struct representing a single across or down entry in the grid: a maximal run of at least two
/// fillable cells. Two slots are the same slot iff all four fields match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Slot {
    pub row: usize,
    pub col: usize,
    pub direction: Direction,
    pub length: usize,
}

impl Slot {
    /// The coords of the cell at `cell_idx` within this slot.
    pub fn cell(&self, cell_idx: usize) -> GridCoord {
        match self.direction {
            Direction::Across => (self.row, self.col + cell_idx),
            Direction::Down => (self.row + cell_idx, self.col),
        }
    }

    /// Generate the coords for each cell of this slot.
    pub fn cells(&self) -> impl Iterator<Item = GridCoord> + '_ {
        (0..self.length).map(move |cell_idx| self.cell(cell_idx))
    }
}

/// The static structure of a puzzle: which cells can hold letters, and the slots derived from
/// them. Nothing here changes during filling.
#[derive(Clone)]
pub struct Grid {
    height: usize,
    width: usize,
    cells: Vec<Vec<bool>>,
    slots: Vec<Slot>,
}

impl Debug for Grid {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Grid")
            .field("height", &self.height)
            .field("width", &self.width)
            .field("slots", &self.slots)
            .finish()
    }
}

impl Grid {
    /// Build a grid from a row-major mask where `true` marks a fillable cell. Rows shorter than the
    /// widest row are padded with blocked cells, so a ragged mask never fails; it just produces
    /// fewer slots.
    pub fn new(structure: Vec<Vec<bool>>) -> Grid {
        let height = structure.len();
        let width = structure.iter().map(|row| row.len()).max().unwrap_or(0);

        let cells: Vec<Vec<bool>> = structure
            .into_iter()
            .map(|mut row| {
                row.resize(width, false);
                row
            })
            .collect();

        let mut grid = Grid { height, width, cells, slots: vec![] };
        grid.slots = grid.build_slots();
        grid
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn width(&self) -> usize {
        self.width
    }

    /// Is the given cell part of the puzzle? Anything out of bounds counts as blocked.
    pub fn is_fillable(&self, (row, col): GridCoord) -> bool {
        self.cells.get(row).and_then(|cells| cells.get(col)).copied().unwrap_or(false)
    }

    pub fn slots(&self) -> &[Slot] {
        &self.slots
    }

    pub fn slot(&self, slot_id: SlotId) -> &Slot {
        &self.slots[slot_id]
    }

    pub fn slot_count(&self) -> usize {
        self.slots.len()
    }

    /// Find the id of a slot by its structural identity.
    pub fn slot_id(&self, slot: &Slot) -> Option<SlotId> {
        self.slots.iter().position(|candidate| candidate == slot)
    }

    /// Scan rows for across runs, then columns for down runs. Ids follow that order.
    fn build_slots(&self) -> Vec<Slot> {
        let mut slots = vec![];

        for row in 0..self.height {
            self.collect_runs(&mut slots, Direction::Across, (0..self.width).map(|col| (row, col)));
        }
        for col in 0..self.width {
            self.collect_runs(&mut slots, Direction::Down, (0..self.height).map(|row| (row, col)));
        }

        slots
    }

    fn collect_runs<Line>(&self, slots: &mut Vec<Slot>, direction: Direction, line: Line)
        where
            Line: Iterator<Item=GridCoord>
    {
        let mut run_start: Option<GridCoord> = None;
        let mut run_length = 0;

        for loc in line.map(Some).chain([None]) {
            match loc {
                Some(loc) if self.is_fillable(loc) => {
                    if run_start.is_none() {
                        run_start = Some(loc);
                    }
                    run_length += 1;
                }
                _ => {
                    if let Some((row, col)) = run_start.take() {
                        if run_length > 1 {
                            slots.push(Slot { row, col, direction, length: run_length });
                        }
                    }
                    run_length = 0;
                }
            }
        }
    }
}
