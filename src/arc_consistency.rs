use std::collections::VecDeque;
use std::error::Error;
use std::fmt::{self, Display, Formatter};

use bit_set::BitSet;
use log::trace;

use crate::constraint_graph::ConstraintGraph;
use crate::domain::DomainStore;
use crate::types::SlotId;
use crate::word_list::WordList;

/// Returned when propagation leaves a slot with no options at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArcConsistencyFailure {
    pub slot_id: SlotId,

    /// Revisions that removed something before the slot emptied, including the last one.
    pub revisions: u64,
}

impl Display for ArcConsistencyFailure {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "slot {} has no remaining options", self.slot_id)
    }
}

impl Error for ArcConsistencyFailure {}

/// Results from a successful call to `ac3`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ArcConsistencySuccess {
    /// How many `revise` calls actually removed something.
    pub revisions: u64,
}

pub type ArcConsistencyResult = Result<ArcConsistencySuccess, ArcConsistencyFailure>;

/// FIFO queue of directed arcs `(x, y)` meaning "make `x` consistent with `y`". An arc that is
/// already waiting in the queue isn't added a second time.
#[derive(Debug)]
struct ArcQueue {
    slot_count: usize,
    queue: VecDeque<(SlotId, SlotId)>,
    queued: BitSet,
}

impl ArcQueue {
    fn new(slot_count: usize) -> ArcQueue {
        ArcQueue {
            slot_count,
            queue: VecDeque::new(),
            queued: BitSet::with_capacity(slot_count * slot_count),
        }
    }

    fn enqueue(&mut self, x: SlotId, y: SlotId) {
        if self.queued.insert(x * self.slot_count + y) {
            self.queue.push_back((x, y));
        }
    }

    fn pop_front(&mut self) -> Option<(SlotId, SlotId)> {
        let (x, y) = self.queue.pop_front()?;
        self.queued.remove(x * self.slot_count + y);
        Some((x, y))
    }
}

/// Enforce arc consistency with AC-3. With `arcs` of `None` the queue starts with every ordered
/// pair of neighboring slots; otherwise only with the given arcs, which is how callers
/// re-propagate after a local change. Stops at the first slot whose domain empties.
pub fn ac3(
    graph: &ConstraintGraph,
    words: &WordList,
    domains: &mut DomainStore,
    arcs: Option<Vec<(SlotId, SlotId)>>,
) -> ArcConsistencyResult {
    let mut queue = ArcQueue::new(graph.slot_count());
    match arcs {
        Some(arcs) => {
            for (x, y) in arcs {
                queue.enqueue(x, y);
            }
        }
        None => {
            for (x, y) in graph.arcs() {
                queue.enqueue(x, y);
            }
        }
    }

    let mut success = ArcConsistencySuccess::default();

    while let Some((x, y)) = queue.pop_front() {
        if !domains.revise(graph, words, x, y) {
            continue;
        }
        success.revisions += 1;
        trace!("revised slot {} against slot {}: {} options left", x, y, domains.len(x));

        if domains.is_empty(x) {
            return Err(ArcConsistencyFailure { slot_id: x, revisions: success.revisions });
        }

        // `x` lost options, so anything that relied on them needs checking again.
        for &z in graph.neighbors(x) {
            if z != y {
                queue.enqueue(z, x);
            }
        }
    }

    Ok(success)
}

/// Check that every word left in every slot has a compatible word in each neighboring slot.
pub fn is_arc_consistent(graph: &ConstraintGraph, words: &WordList, domains: &DomainStore) -> bool {
    graph.arcs().all(|(x, y)| {
        let Some((i, j)) = graph.overlaps(x, y) else {
            return true;
        };
        domains.words(x).all(|word_x| {
            let glyph = words.get(word_x).glyphs.get(i);
            glyph.is_some()
                && domains.words(y).any(|word_y| words.get(word_y).glyphs.get(j) == glyph)
        })
    })
}
