//! Bounded top-k selection.
//!
//! A size-k heap keeps the worst retained candidate on top, so each new score
//! costs one comparison and at most one O(log k) replacement. Ranking order is
//! a total order: higher score first, then lower target index. The order of
//! the output never depends on heap internals.

use crate::types::Neighbor;
use std::cmp::Ordering;
use std::collections::BinaryHeap;

/// Heap entry ordered so that the *worse* ranked candidate compares greater.
#[derive(Debug, Clone, Copy)]
struct Candidate {
    score: f32,
    index: usize,
}

impl Ord for Candidate {
    fn cmp(&self, other: &Self) -> Ordering {
        // Scores are validated finite before ranking starts.
        other
            .score
            .partial_cmp(&self.score)
            .unwrap_or(Ordering::Equal)
            .then_with(|| self.index.cmp(&other.index))
    }
}

impl PartialOrd for Candidate {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Candidate {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Candidate {}

/// Reusable bounded selector for the `k` best `(index, score)` pairs.
///
/// One selector is allocated per worker batch and cleared between rows, so a
/// row needs O(k) memory no matter how many targets it scans.
#[derive(Debug)]
pub struct TopK {
    k: usize,
    heap: BinaryHeap<Candidate>,
    scratch: Vec<Candidate>,
}

impl TopK {
    /// Create a selector retaining at most `k` candidates.
    pub fn new(k: usize) -> Self {
        Self {
            k,
            heap: BinaryHeap::with_capacity(k + 1),
            scratch: Vec::with_capacity(k),
        }
    }

    /// Capacity `k`
    pub fn k(&self) -> usize {
        self.k
    }

    /// Number of candidates currently retained
    pub fn len(&self) -> usize {
        self.heap.len()
    }

    /// True when nothing is retained
    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    /// Drop all retained candidates, keeping the allocation.
    pub fn clear(&mut self) {
        self.heap.clear();
    }

    /// Offer a candidate.
    #[inline]
    pub fn push(&mut self, index: usize, score: f32) {
        if self.k == 0 {
            return;
        }
        let candidate = Candidate { score, index };
        if self.heap.len() < self.k {
            self.heap.push(candidate);
        } else if let Some(mut worst) = self.heap.peek_mut() {
            if candidate < *worst {
                *worst = candidate;
            }
        }
    }

    /// Write the retained candidates, best first, into `out` and clear the
    /// selector. Returns how many entries were written.
    ///
    /// # Panics
    /// Panics if `out` is shorter than [`TopK::len`].
    pub fn drain_sorted_into(&mut self, out: &mut [Neighbor]) -> usize {
        self.scratch.clear();
        self.scratch.extend(self.heap.drain());
        self.scratch.sort_unstable();

        let written = self.scratch.len();
        for (slot, c) in out[..written].iter_mut().zip(self.scratch.iter()) {
            *slot = Neighbor {
                index: c.index,
                score: c.score,
            };
        }
        written
    }

    /// Retained candidates, best first, as a new vector. Clears the selector.
    pub fn into_sorted_vec(mut self) -> Vec<Neighbor> {
        let mut out = vec![Neighbor::default(); self.heap.len()];
        self.drain_sorted_into(&mut out);
        out
    }
}

/// Select the `k` best of an arbitrary stream of `(index, score)` pairs.
pub fn top_k<I>(scores: I, k: usize) -> Vec<Neighbor>
where
    I: IntoIterator<Item = (usize, f32)>,
{
    let mut selector = TopK::new(k);
    for (index, score) in scores {
        selector.push(index, score);
    }
    selector.into_sorted_vec()
}
