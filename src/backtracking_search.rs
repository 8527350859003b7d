use std::cmp::Reverse;
use std::collections::{HashMap, HashSet};
use std::error::Error;
use std::fmt::{self, Debug, Display, Formatter};

use instant::{Duration, Instant};
use log::{debug, info, trace};

use crate::arc_consistency::{ac3, ArcConsistencyFailure};
use crate::constraint_graph::ConstraintGraph;
use crate::domain::{DomainStore, TrailMark};
use crate::grid::Grid;
use crate::types::{SlotId, WordId};
use crate::word_list::WordList;

/// Settings that shape a fill. The defaults give plain backtracking with no budget.
#[derive(Debug, Clone, Default)]
pub struct FillOptions {
    /// After each tentative choice, prune the crossing slots' domains and re-run AC-3 from the
    /// chosen slot. All pruning is rolled back when the choice is undone.
    pub maintain_arc_consistency: bool,

    /// Forbid using the same word in two different slots.
    pub unique_words: bool,

    /// Give up after entering this many search states.
    pub max_states: Option<u64>,

    /// Give up once the fill has been running for this long.
    pub time_limit: Option<Duration>,
}

/// A struct recording a slot assignment made during the filling process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Choice {
    pub slot_id: SlotId,
    pub word_id: WordId,
}

/// A partial mapping from slots to chosen words.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Assignment {
    words: Vec<Option<WordId>>,
    count: usize,
}

impl Assignment {
    pub fn get(&self, slot_id: SlotId) -> Option<WordId> {
        self.words.get(slot_id).copied().flatten()
    }

    pub fn is_assigned(&self, slot_id: SlotId) -> bool {
        self.get(slot_id).is_some()
    }

    /// Set the word for a slot, returning whatever was there before.
    pub fn assign(&mut self, slot_id: SlotId, word_id: WordId) -> Option<WordId> {
        if slot_id >= self.words.len() {
            self.words.resize(slot_id + 1, None);
        }
        let previous = self.words[slot_id].replace(word_id);
        if previous.is_none() {
            self.count += 1;
        }
        previous
    }

    pub fn unassign(&mut self, slot_id: SlotId) -> Option<WordId> {
        let previous = self.words.get_mut(slot_id).and_then(Option::take);
        if previous.is_some() {
            self.count -= 1;
        }
        previous
    }

    /// Number of assigned slots.
    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    pub fn iter(&self) -> impl Iterator<Item=Choice> + '_ {
        self.words.iter().enumerate().filter_map(|(slot_id, word_id)| {
            word_id.map(|word_id| Choice { slot_id, word_id })
        })
    }

    pub fn choices(&self) -> Vec<Choice> {
        self.iter().collect()
    }

    pub fn word_for<'a>(&self, slot_id: SlotId, words: &'a WordList) -> Option<&'a str> {
        self.get(slot_id).map(|word_id| words.get(word_id).string.as_str())
    }

    /// Project the assignment onto the grid's cells, row-major. Blocked and unassigned cells are
    /// `None`.
    pub fn letter_grid(&self, grid: &Grid, words: &WordList) -> Vec<Vec<Option<char>>> {
        let mut letters = vec![vec![None; grid.width()]; grid.height()];

        for Choice { slot_id, word_id } in self.iter() {
            if slot_id >= grid.slot_count() {
                continue;
            }
            let slot = grid.slot(slot_id);
            for ((row, col), &glyph) in slot.cells().zip(&words.get(word_id).glyphs) {
                letters[row][col] = Some(glyph);
            }
        }

        letters
    }
}

/// A struct tracking statistics about the filling process.
#[derive(Debug, Clone, Default)]
pub struct Statistics {
    pub states: u64,
    pub backtracks: u64,
    pub revisions: u64,
    pub duration: Duration,
}

/// A struct representing the results of a fill operation.
#[derive(Debug)]
pub struct FillSuccess {
    pub statistics: Statistics,
    pub assignment: Assignment,
}

/// Why a fill couldn't be produced. All three mean "no solution" to the caller, but they differ in
/// how much is known: a propagation failure is a cheap proof, an exhausted search is an expensive
/// one, and a blown budget proves nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FillFailure {
    PropagationFailure { slot_id: SlotId },
    SearchExhausted,
    BudgetExhausted,
}

impl Display for FillFailure {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            FillFailure::PropagationFailure { slot_id } => {
                write!(f, "no solution: slot {} has no consistent words", slot_id)
            }
            FillFailure::SearchExhausted => write!(f, "no solution: search space exhausted"),
            FillFailure::BudgetExhausted => write!(f, "no solution found within budget"),
        }
    }
}

impl Error for FillFailure {}

impl From<ArcConsistencyFailure> for FillFailure {
    fn from(failure: ArcConsistencyFailure) -> FillFailure {
        FillFailure::PropagationFailure { slot_id: failure.slot_id }
    }
}

/// One level of the explicit search stack.
#[derive(Debug)]
struct Frame {
    slot_id: SlotId,

    /// Values for `slot_id` in the order we'll try them.
    values: Vec<WordId>,
    next: usize,

    /// Domain state from before any value at this level was tried.
    mark: TrailMark,
}

/// Fills a grid from a word list: node consistency, then AC-3, then backtracking search.
pub struct Solver<'a> {
    grid: &'a Grid,
    words: &'a WordList,
    graph: ConstraintGraph,
    domains: DomainStore,
    options: FillOptions,
    statistics: Statistics,
    start: Option<Instant>,
}

impl Debug for Solver<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("Solver")
            .field("grid", &self.grid)
            .field("words", &self.words)
            .field("options", &self.options)
            .field("statistics", &self.statistics)
            .finish()
    }
}

impl<'a> Solver<'a> {
    /// Set up a solver where every slot can still take any word.
    pub fn new(grid: &'a Grid, words: &'a WordList, options: FillOptions) -> Solver<'a> {
        Solver {
            grid,
            words,
            graph: ConstraintGraph::new(grid),
            domains: DomainStore::initialize(words, grid.slot_count()),
            options,
            statistics: Statistics::default(),
            start: None,
        }
    }

    pub fn graph(&self) -> &ConstraintGraph {
        &self.graph
    }

    pub fn domains(&self) -> &DomainStore {
        &self.domains
    }

    pub fn statistics(&self) -> &Statistics {
        &self.statistics
    }

    pub fn enforce_node_consistency(&mut self) {
        self.domains.node_consistency(self.grid, self.words);
    }

    /// Run AC-3 over `arcs`, or over every arc in the grid if `arcs` is `None`.
    pub fn ac3(&mut self, arcs: Option<Vec<(SlotId, SlotId)>>) -> Result<(), FillFailure> {
        let result = ac3(&self.graph, self.words, &mut self.domains, arcs);
        match result {
            Ok(success) => {
                self.statistics.revisions += success.revisions;
                Ok(())
            }
            Err(failure) => {
                self.statistics.revisions += failure.revisions;
                debug!("arc consistency failed: {}", failure);
                Err(failure.into())
            }
        }
    }

    pub fn is_complete(&self, assignment: &Assignment) -> bool {
        (0..self.grid.slot_count()).all(|slot_id| assignment.is_assigned(slot_id))
    }

    /// Check every assigned word against its slot's length and against every assigned crossing.
    pub fn is_consistent(&self, assignment: &Assignment) -> bool {
        let mut used: HashSet<WordId> = HashSet::new();

        for Choice { slot_id, word_id } in assignment.iter() {
            if slot_id >= self.grid.slot_count() {
                return false;
            }
            let word = self.words.get(word_id);
            if word.len() != self.grid.slot(slot_id).length {
                return false;
            }
            if self.options.unique_words && !used.insert(word_id) {
                return false;
            }

            for &neighbor in self.graph.neighbors(slot_id) {
                // Each crossing only needs checking from one side.
                if neighbor < slot_id {
                    continue;
                }
                let (Some(neighbor_word_id), Some((i, j))) =
                    (assignment.get(neighbor), self.graph.overlaps(slot_id, neighbor)) else {
                    continue;
                };
                if word.glyphs.get(i) != self.words.get(neighbor_word_id).glyphs.get(j) {
                    return false;
                }
            }
        }

        true
    }

    /// Pick the unassigned slot with the fewest remaining options, preferring slots that cross
    /// more others, then the earliest slot in grid order.
    pub fn select_unassigned(&self, assignment: &Assignment) -> Option<SlotId> {
        (0..self.grid.slot_count())
            .filter(|&slot_id| !assignment.is_assigned(slot_id))
            .min_by_key(|&slot_id| {
                (
                    self.domains.len(slot_id),
                    Reverse(self.graph.degree(slot_id)),
                    *self.grid.slot(slot_id),
                )
            })
    }

    /// Return the slot's remaining words ordered by how many options each would rule out across
    /// the unassigned crossing slots, fewest first. Ties keep word list order.
    pub fn order_values(&self, slot_id: SlotId, assignment: &Assignment) -> Vec<WordId> {
        // For each unassigned crossing: where the letters meet, how many options it has, and how
        // many of them put each letter in the shared cell.
        let crossing_counts: Vec<(usize, usize, HashMap<char, usize>)> = self
            .graph
            .crossings(slot_id)
            .iter()
            .enumerate()
            .filter_map(|(cell_idx, crossing)| {
                let crossing = crossing.as_ref()?;
                let other_slot_id = crossing.other_slot_id;
                if assignment.is_assigned(other_slot_id) {
                    return None;
                }
                let mut counts: HashMap<char, usize> = HashMap::new();
                for word_id in self.domains.words(other_slot_id) {
                    let glyphs = &self.words.get(word_id).glyphs;
                    if let Some(&glyph) = glyphs.get(crossing.other_slot_cell) {
                        *counts.entry(glyph).or_default() += 1;
                    }
                }
                Some((cell_idx, self.domains.len(other_slot_id), counts))
            })
            .collect();

        let mut values: Vec<WordId> = self.domains.words(slot_id).collect();
        values.sort_by_cached_key(|&word_id| {
            let glyphs = &self.words.get(word_id).glyphs;
            crossing_counts
                .iter()
                .map(|(i, total, counts)| {
                    let compatible = glyphs.get(*i).and_then(|glyph| counts.get(glyph)).copied();
                    total - compatible.unwrap_or(0)
                })
                .sum::<usize>()
        });
        values
    }

    /// Extend `assignment` to a complete, consistent one by depth-first search. On failure every
    /// domain is back where it was when the search started.
    pub fn backtrack(&mut self, mut assignment: Assignment) -> Result<Assignment, FillFailure> {
        let root_mark = self.domains.mark();
        let mut stack: Vec<Frame> = vec![];

        'descend: loop {
            if self.is_complete(&assignment) {
                return Ok(assignment);
            }

            self.statistics.states += 1;
            if let Err(failure) = self.check_budget() {
                self.domains.undo_to(root_mark);
                return Err(failure);
            }

            let Some(slot_id) = self.select_unassigned(&assignment) else {
                return Ok(assignment);
            };
            let values = self.order_values(slot_id, &assignment);
            trace!("slot {} has {} candidate values", slot_id, values.len());
            stack.push(Frame { slot_id, values, next: 0, mark: self.domains.mark() });

            // Try the next value of the deepest frame, popping frames as they run out.
            loop {
                let Some(frame) = stack.last_mut() else {
                    return Err(FillFailure::SearchExhausted);
                };

                if frame.next >= frame.values.len() {
                    stack.pop();
                    if let Some(parent) = stack.last() {
                        assignment.unassign(parent.slot_id);
                        self.domains.undo_to(parent.mark);
                        self.statistics.backtracks += 1;
                        trace!("backtracking out of slot {}", parent.slot_id);
                    }
                    continue;
                }
                let word_id = frame.values[frame.next];
                frame.next += 1;
                let (slot_id, mark) = (frame.slot_id, frame.mark);

                assignment.assign(slot_id, word_id);
                trace!("trying {:?} in slot {}", self.words.get(word_id).string, slot_id);

                if self.is_consistent(&assignment)
                    && self.propagate(slot_id, word_id, &assignment)
                {
                    continue 'descend;
                }

                assignment.unassign(slot_id);
                self.domains.undo_to(mark);
                self.statistics.backtracks += 1;
            }
        }
    }

    /// Node consistency, then AC-3 over the whole grid, then search from an empty assignment.
    pub fn solve(&mut self) -> Result<FillSuccess, FillFailure> {
        let start = *self.start.get_or_insert_with(Instant::now);
        info!(
            "filling {} slots from {} words",
            self.grid.slot_count(),
            self.words.len(),
        );

        let result = self.solve_impl();
        self.statistics.duration = start.elapsed();

        match &result {
            Ok(_) => info!("found a fill: {:?}", self.statistics),
            Err(failure) => info!("{}: {:?}", failure, self.statistics),
        }

        result.map(|assignment| FillSuccess { statistics: self.statistics.clone(), assignment })
    }

    fn solve_impl(&mut self) -> Result<Assignment, FillFailure> {
        self.enforce_node_consistency();

        // An isolated slot with no word of the right length never shows up in AC-3.
        let empty_slot_id =
            (0..self.grid.slot_count()).find(|&slot_id| self.domains.is_empty(slot_id));
        if let Some(slot_id) = empty_slot_id {
            debug!("slot {} has no words of length {}", slot_id, self.grid.slot(slot_id).length);
            return Err(FillFailure::PropagationFailure { slot_id });
        }

        self.ac3(None)?;
        debug!(
            "initial arc consistency removed options in {} revisions",
            self.statistics.revisions,
        );

        self.backtrack(Assignment::default())
    }

    /// With `maintain_arc_consistency`, commit the choice to the domain store and propagate it to
    /// the unassigned crossings. Returns false if that empties some slot.
    fn propagate(&mut self, slot_id: SlotId, word_id: WordId, assignment: &Assignment) -> bool {
        if !self.options.maintain_arc_consistency {
            return true;
        }

        self.domains.restrict(slot_id, word_id);
        let arcs: Vec<(SlotId, SlotId)> = self
            .graph
            .neighbors(slot_id)
            .iter()
            .filter(|&&neighbor| !assignment.is_assigned(neighbor))
            .map(|&neighbor| (neighbor, slot_id))
            .collect();

        self.ac3(Some(arcs)).is_ok()
    }

    fn check_budget(&mut self) -> Result<(), FillFailure> {
        if let Some(max_states) = self.options.max_states {
            if self.statistics.states > max_states {
                debug!("state budget of {} exhausted", max_states);
                return Err(FillFailure::BudgetExhausted);
            }
        }
        if let Some(time_limit) = self.options.time_limit {
            let start = *self.start.get_or_insert_with(Instant::now);
            if start.elapsed() >= time_limit {
                debug!("time budget of {:?} exhausted", time_limit);
                return Err(FillFailure::BudgetExhausted);
            }
        }
        Ok(())
    }
}

/// Search for a valid fill for the given grid and word list.
pub fn find_fill(
    grid: &Grid,
    words: &WordList,
    options: &FillOptions,
) -> Result<FillSuccess, FillFailure> {
    Solver::new(grid, words, options.clone()).solve()
}
