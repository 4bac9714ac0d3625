//! Append-only candidate store.
//!
//! Candidates live in fixed-size chunks. Every chunk except the last is full, so a global
//! index maps to `(index / CHUNK_SIZE, index % CHUNK_SIZE)`. Writers swap in new chunk
//! `Arc`s under a short write lock; readers clone the chunk list once and then iterate
//! without holding any lock. A chunk that a reader still holds is copied on write, so a
//! snapshot never observes later appends.

use crate::candidate::Candidate;
use parking_lot::RwLock;
use std::ops::Range;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Number of candidates per chunk.
pub const CHUNK_SIZE: usize = 1024;

/// Immutable-once-shared block of candidates.
#[derive(Debug, Clone, Default)]
pub struct Chunk {
    items: Vec<Arc<Candidate>>,
}

impl Chunk {
    fn is_full(&self) -> bool {
        self.items.len() >= CHUNK_SIZE
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn items(&self) -> &[Arc<Candidate>] {
        &self.items
    }
}

/// Session-wide candidate pool. Indices are append-only and never reused.
#[derive(Debug, Default)]
pub struct CandidateStore {
    chunks: RwLock<Vec<Arc<Chunk>>>,
    len: AtomicUsize,
}

impl CandidateStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of candidates ingested so far.
    pub fn len(&self) -> usize {
        self.len.load(Ordering::Acquire)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Append a batch of lines, returning the index range they were assigned.
    pub fn push_lines<I>(&self, lines: I) -> Range<usize>
    where
        I: IntoIterator<Item = String>,
    {
        let mut chunks = self.chunks.write();
        let start = self.len.load(Ordering::Acquire);
        let mut next = start;

        for line in lines {
            let candidate = Arc::new(Candidate::new(next, line));
            match chunks.last_mut() {
                Some(last) if !last.is_full() => Arc::make_mut(last).items.push(candidate),
                _ => {
                    let mut chunk = Chunk {
                        items: Vec::with_capacity(CHUNK_SIZE),
                    };
                    chunk.items.push(candidate);
                    chunks.push(Arc::new(chunk));
                }
            }
            next += 1;
        }

        self.len.store(next, Ordering::Release);
        start..next
    }

    /// Look up a candidate by its stable index.
    pub fn get(&self, index: usize) -> Option<Arc<Candidate>> {
        let chunks = self.chunks.read();
        chunks
            .get(index / CHUNK_SIZE)
            .and_then(|chunk| chunk.items.get(index % CHUNK_SIZE))
            .cloned()
    }

    /// Take a consistent, lock-free view of everything ingested so far.
    pub fn snapshot(&self) -> StoreSnapshot {
        let chunks = self.chunks.read();
        let len = chunks.iter().map(|chunk| chunk.len()).sum();
        StoreSnapshot {
            chunks: chunks.clone(),
            len,
        }
    }
}

/// Point-in-time view over the store.
#[derive(Debug, Clone, Default)]
pub struct StoreSnapshot {
    chunks: Vec<Arc<Chunk>>,
    len: usize,
}

impl StoreSnapshot {
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn get(&self, index: usize) -> Option<&Arc<Candidate>> {
        self.chunks
            .get(index / CHUNK_SIZE)
            .and_then(|chunk| chunk.items.get(index % CHUNK_SIZE))
    }

    /// Iterate candidates whose index falls in `range`, clamped to the snapshot length.
    pub fn iter_range(&self, range: Range<usize>) -> impl Iterator<Item = &Arc<Candidate>> + '_ {
        let end = range.end.min(self.len);
        let start = range.start.min(end);
        let first_chunk = start / CHUNK_SIZE;
        let skip = start % CHUNK_SIZE;

        self.chunks
            .iter()
            .skip(first_chunk)
            .flat_map(|chunk| chunk.items.iter())
            .skip(skip)
            .take(end - start)
    }
}
