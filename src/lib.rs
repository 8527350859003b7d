//! Crossword filling as a constraint-satisfaction problem.
//!
//! Slots are the variables, words are the values, and crossing slots must agree on their shared
//! letter. A fill runs node consistency (word length), then AC-3, then backtracking search with
//! minimum-remaining-values, degree, and least-constraining-value ordering.

pub mod arc_consistency;
pub mod backtracking_search;
pub mod constraint_graph;
pub mod domain;
pub mod grid;
pub mod types;
pub mod word_list;

pub use backtracking_search::{
    find_fill, Assignment, Choice, FillFailure, FillOptions, FillSuccess, Solver, Statistics,
};
pub use constraint_graph::{ConstraintGraph, Crossing};
pub use domain::DomainStore;
pub use grid::{Grid, Slot};
pub use types::{Direction, GridCoord, SlotId, WordId, MAX_SLOT_LENGTH};
pub use word_list::{Word, WordList};

#[cfg(test)]
pub(crate) mod test_utils {
    use crate::grid::Grid;

    /// Build a grid from a string template, with # representing blocks and anything else
    /// representing a fillable cell. Blank lines and indentation are ignored.
    pub fn grid_from_template(template: &str) -> Grid {
        Grid::new(
            template
                .lines()
                .map(str::trim)
                .filter(|line| !line.is_empty())
                .map(|line| line.chars().map(|c| c != '#').collect::<Vec<bool>>())
                .collect(),
        )
    }
}
