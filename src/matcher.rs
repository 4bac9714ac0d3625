//! Matching a parsed query against one candidate.
//!
//! [`Matcher`] owns the matching configuration and turns query strings into [`Pattern`]s.
//! [`Matcher::match_candidate`] is the hot path: it runs cheap `str`-level prefilters for every
//! term first and only decodes the candidate into the [`Scratch`] buffers once all of them
//! pass.

pub mod exact;
pub mod fuzzy;
pub mod pattern;
pub mod scoring;

pub use fuzzy::FuzzyAlgorithm;
pub use pattern::{CaseMode, Pattern, PatternOptions, Term, TermGroup, TermKind};

use crate::candidate::Candidate;
use scoring::{compute_bonuses, finalize};

/// Score and highlight positions for a matching candidate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchOutcome {
    pub score: i64,
    /// Sorted, deduplicated char indices into the candidate text
    pub positions: Vec<usize>,
}

impl MatchOutcome {
    /// Result for a query that places no constraint on the candidate.
    pub fn neutral() -> Self {
        Self {
            score: 0,
            positions: Vec::new(),
        }
    }
}

/// Reusable per-thread buffers for the matcher.
#[derive(Debug, Default)]
pub struct Scratch {
    raw: Vec<char>,
    folded: Vec<char>,
    bonuses: Vec<i64>,
    table: Vec<i64>,
}

impl Scratch {
    pub fn new() -> Self {
        Self::default()
    }

    fn prepare(&mut self, candidate: &Candidate) {
        self.raw.clear();
        self.raw.extend(candidate.text().chars());
        self.folded.clear();
        self.folded.extend(candidate.folded().chars());
        compute_bonuses(&self.raw, &mut self.bonuses);
    }
}

/// Full matcher configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MatcherOptions {
    pub pattern: PatternOptions,
    pub algorithm: FuzzyAlgorithm,
}

/// Stateless matcher; cheap to copy into worker threads.
#[derive(Debug, Clone, Copy, Default)]
pub struct Matcher {
    options: MatcherOptions,
}

impl Matcher {
    pub fn new(options: MatcherOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &MatcherOptions {
        &self.options
    }

    /// Parse a query string with this matcher's options.
    pub fn parse(&self, query: &str) -> Pattern {
        Pattern::parse(query, &self.options.pattern)
    }

    /// Match `candidate` against `pattern`.
    ///
    /// Every group must match; within a group the first matching term is used. Inverse
    /// terms only filter. When no positive term exists the outcome is neutral (score 0).
    pub fn match_candidate(
        &self,
        pattern: &Pattern,
        candidate: &Candidate,
        scratch: &mut Scratch,
    ) -> Option<MatchOutcome> {
        if pattern.is_empty() {
            return Some(MatchOutcome::neutral());
        }

        if !pattern
            .groups()
            .iter()
            .all(|group| group.terms.iter().any(|term| prefilter(term, candidate)))
        {
            return None;
        }

        if !pattern.has_positive_terms() {
            return Some(MatchOutcome::neutral());
        }

        scratch.prepare(candidate);

        let mut structural = 0;
        let mut positions = Vec::new();
        for group in pattern.groups() {
            let (score, term_positions) = group
                .terms
                .iter()
                .filter(|term| prefilter(term, candidate))
                .find_map(|term| self.score_term(term, candidate, scratch))?;
            structural += score;
            positions.extend(term_positions);
        }

        positions.sort_unstable();
        positions.dedup();

        Some(MatchOutcome {
            score: finalize(structural, candidate.char_len()),
            positions,
        })
    }

    /// Score one positive term, or confirm an inverse term with a neutral contribution.
    fn score_term(
        &self,
        term: &Term,
        candidate: &Candidate,
        scratch: &mut Scratch,
    ) -> Option<(i64, Vec<usize>)> {
        if term.inverse {
            // Already verified absent by the prefilter
            return Some((0, Vec::new()));
        }

        let hay_chars = if term.case_sensitive {
            &scratch.raw
        } else {
            &scratch.folded
        };
        let bonuses = &scratch.bonuses;

        match term.kind {
            TermKind::Fuzzy => fuzzy::fuzzy_match(
                hay_chars,
                &term.chars,
                bonuses,
                self.options.algorithm,
                &mut scratch.table,
            ),
            TermKind::Exact => exact::substring_match(
                candidate.haystack(term.case_sensitive),
                hay_chars,
                &term.text,
                &term.chars,
                bonuses,
            ),
            TermKind::Prefix => exact::prefix_match(hay_chars, &term.chars, bonuses),
            TermKind::Suffix => exact::suffix_match(hay_chars, &term.chars, bonuses),
            TermKind::Equal => exact::equal_match(hay_chars, &term.chars, bonuses),
        }
    }
}

/// `str`-level check that is exact for anchored/exact terms and necessary for fuzzy ones.
/// Inverse terms pass when the text is absent.
fn prefilter(term: &Term, candidate: &Candidate) -> bool {
    let haystack = candidate.haystack(term.case_sensitive);
    let found = match term.kind {
        TermKind::Fuzzy => fuzzy::is_subsequence(&term.text, haystack),
        TermKind::Exact => haystack.contains(&*term.text),
        TermKind::Prefix => haystack.starts_with(&*term.text),
        TermKind::Suffix => haystack.trim_end().ends_with(&*term.text),
        TermKind::Equal => haystack == &*term.text,
    };
    found != term.inverse
}
