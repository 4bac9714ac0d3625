//! Candidate lines and the append-only store that holds them.
//!
//! A [`Candidate`] is created exactly once when a line is ingested and is never mutated
//! afterwards. Its index is assigned by the [`CandidateStore`] and stays stable for the
//! lifetime of the session, so match results can refer to candidates by index alone.

pub mod normalize;
pub mod store;

pub use store::{CandidateStore, Chunk, StoreSnapshot, CHUNK_SIZE};

use normalize::fold;

/// One selectable line of text in the search pool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    index: usize,
    raw: Box<str>,
    /// Case-folded form; `None` when folding would not change the text
    folded: Option<Box<str>>,
    char_len: usize,
    ascii: bool,
}

impl Candidate {
    /// Build a candidate, computing its normalized form eagerly.
    pub fn new(index: usize, raw: impl Into<String>) -> Self {
        let raw: String = raw.into();
        let ascii = raw.is_ascii();
        let char_len = if ascii { raw.len() } else { raw.chars().count() };
        let folded = fold(&raw).map(String::into_boxed_str);

        Self {
            index,
            raw: raw.into_boxed_str(),
            folded,
            char_len,
            ascii,
        }
    }

    /// Stable position of this candidate in input order.
    pub fn index(&self) -> usize {
        self.index
    }

    /// The line exactly as it was read.
    pub fn text(&self) -> &str {
        &self.raw
    }

    /// Case-folded text with the same number of chars as [`Candidate::text`].
    pub fn folded(&self) -> &str {
        self.folded.as_deref().unwrap_or(&self.raw)
    }

    /// Text to match against for the requested case sensitivity.
    pub fn haystack(&self, case_sensitive: bool) -> &str {
        if case_sensitive {
            self.text()
        } else {
            self.folded()
        }
    }

    /// Number of chars (not bytes) in the line.
    pub fn char_len(&self) -> usize {
        self.char_len
    }

    /// True when every byte is ASCII, so byte offsets equal char offsets.
    pub fn is_ascii(&self) -> bool {
        self.ascii
    }
}
