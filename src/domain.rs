use std::collections::HashSet;

use bit_set::BitSet;

use crate::constraint_graph::ConstraintGraph;
use crate::grid::Grid;
use crate::types::{SlotId, WordId};
use crate::word_list::WordList;

/// A position in the undo trail, as returned by `DomainStore::mark`.
pub type TrailMark = usize;

/// The live set of candidate words for every slot. Domains only ever shrink, except when a caller
/// rolls the store back to an earlier `TrailMark`, which restores exactly the words removed since.
#[derive(Debug, Clone)]
pub struct DomainStore {
    domains: Vec<BitSet>,

    /// Cached `domains[slot_id].len()`, since `BitSet::len` has to walk the whole set.
    counts: Vec<usize>,

    /// Every removal in the order it happened.
    trail: Vec<(SlotId, WordId)>,
}

impl DomainStore {
    /// Give every slot the full word list.
    pub fn initialize(words: &WordList, slot_count: usize) -> DomainStore {
        let full: BitSet = (0..words.len()).collect();

        DomainStore {
            domains: (0..slot_count).map(|_| full.clone()).collect(),
            counts: vec![words.len(); slot_count],
            trail: vec![],
        }
    }

    pub fn slot_count(&self) -> usize {
        self.domains.len()
    }

    pub fn domain(&self, slot_id: SlotId) -> &BitSet {
        &self.domains[slot_id]
    }

    pub fn len(&self, slot_id: SlotId) -> usize {
        self.counts[slot_id]
    }

    pub fn is_empty(&self, slot_id: SlotId) -> bool {
        self.counts[slot_id] == 0
    }

    pub fn contains(&self, slot_id: SlotId, word_id: WordId) -> bool {
        self.domains[slot_id].contains(word_id)
    }

    pub fn words(&self, slot_id: SlotId) -> impl Iterator<Item=WordId> + '_ {
        self.domains[slot_id].iter()
    }

    /// Remove a word from a slot's domain, recording it on the trail. Returns false if the word
    /// wasn't there.
    pub fn remove(&mut self, slot_id: SlotId, word_id: WordId) -> bool {
        if !self.domains[slot_id].remove(word_id) {
            return false;
        }
        self.counts[slot_id] -= 1;
        self.trail.push((slot_id, word_id));
        true
    }

    /// Shrink a slot's domain down to the single given word.
    pub fn restrict(&mut self, slot_id: SlotId, word_id: WordId) {
        let others: Vec<WordId> = self.words(slot_id).filter(|&other| other != word_id).collect();
        for other in others {
            self.remove(slot_id, other);
        }
    }

    pub fn mark(&self) -> TrailMark {
        self.trail.len()
    }

    /// Put back every word removed since `mark`.
    pub fn undo_to(&mut self, mark: TrailMark) {
        while self.trail.len() > mark {
            if let Some((slot_id, word_id)) = self.trail.pop() {
                self.domains[slot_id].insert(word_id);
                self.counts[slot_id] += 1;
            }
        }
    }

    /// Remove, for every slot, each word whose length differs from the slot's length.
    pub fn node_consistency(&mut self, grid: &Grid, words: &WordList) {
        for (slot_id, slot) in grid.slots().iter().enumerate().take(self.slot_count()) {
            let wrong_length: Vec<WordId> = self
                .words(slot_id)
                .filter(|&word_id| words.get(word_id).len() != slot.length)
                .collect();

            for word_id in wrong_length {
                self.remove(slot_id, word_id);
            }
        }
    }

    /// Make `x` arc-consistent with `y`: drop every word from `x` that has no word in `y` agreeing
    /// with it at their shared cell. Returns whether anything was removed; a pair that doesn't
    /// overlap is left alone.
    pub fn revise(
        &mut self,
        graph: &ConstraintGraph,
        words: &WordList,
        x: SlotId,
        y: SlotId,
    ) -> bool {
        let Some((i, j)) = graph.overlaps(x, y) else {
            return false;
        };

        // Which letters can `y` still put in the shared cell?
        let supported: HashSet<char> = self
            .words(y)
            .filter_map(|word_id| words.get(word_id).glyphs.get(j).copied())
            .collect();

        let unsupported: Vec<WordId> = self
            .words(x)
            .filter(|&word_id| {
                words.get(word_id).glyphs.get(i).map_or(true, |glyph| !supported.contains(glyph))
            })
            .collect();

        for &word_id in &unsupported {
            self.remove(x, word_id);
        }

        !unsupported.is_empty()
    }
}
