//! Ordering and top-K selection of match results.
//!
//! Results are ordered by score (higher first) and then by candidate index (lower first), so
//! the ranking is total and deterministic regardless of how a scan was split across threads.

use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::sync::Arc;

/// A candidate that matched the current query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchResult {
    pub index: usize,
    pub score: i64,
    /// Sorted char indices into the candidate text
    pub positions: Vec<usize>,
}

impl MatchResult {
    pub fn new(index: usize, score: i64, positions: Vec<usize>) -> Self {
        Self {
            index,
            score,
            positions,
        }
    }

    /// Compare by rank: `Less` means `self` ranks ahead of `other`.
    #[inline]
    pub fn rank_cmp(&self, other: &Self) -> Ordering {
        other
            .score
            .cmp(&self.score)
            .then_with(|| self.index.cmp(&other.index))
    }
}

/// Heap entry ordered so that the worst-ranked result sits on top of the max-heap.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Ranked(MatchResult);

impl Ord for Ranked {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.rank_cmp(&other.0)
    }
}

impl PartialOrd for Ranked {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Bounded collector that keeps the best `capacity` results seen so far.
#[derive(Debug, Clone)]
pub struct TopK {
    capacity: Option<usize>,
    heap: BinaryHeap<Ranked>,
}

impl TopK {
    /// Keep at most `capacity` results.
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: Some(capacity),
            heap: BinaryHeap::with_capacity(capacity.min(4096).saturating_add(1)),
        }
    }

    /// Keep every result (filter mode).
    pub fn unbounded() -> Self {
        Self {
            capacity: None,
            heap: BinaryHeap::new(),
        }
    }

    /// `Some(k)` keeps the best `k`, `None` keeps everything.
    pub fn with_limit(limit: Option<usize>) -> Self {
        match limit {
            Some(capacity) => Self::new(capacity),
            None => Self::unbounded(),
        }
    }

    pub fn capacity(&self) -> Option<usize> {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    /// Offer a result; returns `true` if it was kept.
    pub fn offer(&mut self, result: MatchResult) -> bool {
        match self.capacity {
            Some(0) => false,
            Some(capacity) if self.heap.len() >= capacity => {
                let Some(worst) = self.heap.peek() else {
                    return false;
                };
                if result.rank_cmp(&worst.0) != Ordering::Less {
                    return false;
                }
                self.heap.pop();
                self.heap.push(Ranked(result));
                true
            }
            _ => {
                self.heap.push(Ranked(result));
                true
            }
        }
    }

    /// Fold another collector into this one.
    pub fn merge(&mut self, other: TopK) {
        for Ranked(result) in other.heap {
            self.offer(result);
        }
    }

    /// Results sorted best-first, leaving the collector intact.
    pub fn snapshot(&self) -> Vec<MatchResult> {
        let mut results: Vec<MatchResult> = self.heap.iter().map(|r| r.0.clone()).collect();
        results.sort_by(MatchResult::rank_cmp);
        results
    }

    /// Results sorted best-first, consuming the collector.
    pub fn into_sorted_vec(self) -> Vec<MatchResult> {
        // Ascending by Ranked is best-first
        self.heap.into_sorted_vec().into_iter().map(|r| r.0).collect()
    }
}

/// The ranked answer to one query generation, possibly still partial.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RankedView {
    pub generation: u64,
    pub query: Arc<str>,
    /// Best matches first, at most the configured K
    pub matches: Vec<MatchResult>,
    /// All candidates that matched so far, not only the ones kept
    pub matched_count: usize,
    /// Candidates examined for this generation
    pub scanned_count: usize,
    /// Candidates in the store when the view was produced
    pub total_count: usize,
    /// True once every candidate in the store has been examined
    pub complete: bool,
}

impl RankedView {
    pub fn empty() -> Self {
        Self {
            generation: 0,
            query: Arc::from(""),
            matches: Vec::new(),
            matched_count: 0,
            scanned_count: 0,
            total_count: 0,
            complete: true,
        }
    }

    pub fn len(&self) -> usize {
        self.matches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.matches.is_empty()
    }

    pub fn get(&self, row: usize) -> Option<&MatchResult> {
        self.matches.get(row)
    }
}

impl Default for RankedView {
    fn default() -> Self {
        Self::empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(index: usize, score: i64) -> MatchResult {
        MatchResult::new(index, score, Vec::new())
    }

    fn order(results: &[MatchResult]) -> Vec<(usize, i64)> {
        results.iter().map(|r| (r.index, r.score)).collect()
    }

    #[test]
    fn keeps_best_k_in_rank_order() {
        let mut top = TopK::new(3);
        for (index, score) in [(0, 5), (1, 9), (2, 1), (3, 9), (4, 7), (5, 3)] {
            top.offer(result(index, score));
        }
        assert_eq!(top.len(), 3);
        assert_eq!(order(&top.snapshot()), vec![(1, 9), (3, 9), (4, 7)]);
        assert_eq!(order(&top.into_sorted_vec()), vec![(1, 9), (3, 9), (4, 7)]);
    }

    #[test]
    fn ties_break_on_lower_index() {
        let mut top = TopK::new(2);
        top.offer(result(7, 10));
        top.offer(result(5, 10));
        top.offer(result(6, 10));
        assert_eq!(order(&top.snapshot()), vec![(5, 10), (6, 10)]);
        assert!(!top.offer(result(8, 10)));
        assert!(top.offer(result(1, 10)));
        assert_eq!(order(&top.snapshot()), vec![(1, 10), (5, 10)]);
    }

    #[test]
    fn zero_capacity_keeps_nothing() {
        let mut top = TopK::new(0);
        assert!(!top.offer(result(0, 100)));
        assert!(top.is_empty());
        assert_eq!(TopK::with_limit(None).capacity(), None);
    }

    #[test]
    fn merge_equals_single_pass() {
        let all: Vec<MatchResult> = (0..50).map(|i| result(i, ((i * 37) % 11) as i64)).collect();

        let mut single = TopK::new(8);
        for r in all.iter().cloned() {
            single.offer(r);
        }

        let mut left = TopK::new(8);
        let mut right = TopK::new(8);
        for r in all.iter().cloned() {
            if r.index % 2 == 0 {
                left.offer(r);
            } else {
                right.offer(r);
            }
        }
        left.merge(right);

        assert_eq!(left.snapshot(), single.snapshot());
    }

    #[test]
    fn unbounded_keeps_everything() {
        let mut top = TopK::unbounded();
        for i in 0..10_000 {
            top.offer(result(i, (i % 3) as i64));
        }
        assert_eq!(top.len(), 10_000);
        let sorted = top.into_sorted_vec();
        assert_eq!(sorted[0].score, 2);
        assert_eq!(sorted[0].index, 2);
        assert_eq!(sorted.last().map(|r| r.score), Some(0));
    }
}
