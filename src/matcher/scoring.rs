//! Score model shared by every match algorithm.
//!
//! A match is scored from its positions alone, so the optimal and greedy fuzzy algorithms and
//! the exact matchers all rank on the same scale:
//!
//! - every matched char earns [`SCORE_MATCH`] plus its boundary bonus
//! - a matched char directly after the previous one earns [`BONUS_CONSECUTIVE`]
//! - every unmatched char between two matched chars costs [`PENALTY_GAP`]
//!
//! One skipped char costs more than a word-boundary bonus earns, so the tightest span wins
//! before boundaries are considered. The final score folds in the candidate length so that,
//! among equally good matches, shorter candidates rank first.

use crate::candidate::normalize::CharClass;

pub const SCORE_MATCH: i64 = 16;
pub const BONUS_CONSECUTIVE: i64 = 6;
pub const BONUS_BOUNDARY: i64 = 4;
pub const BONUS_CAMEL: i64 = 3;
pub const PENALTY_GAP: i64 = 5;

/// Multiplier that leaves room below the structural score for the length penalty.
pub const LENGTH_SCALE: i64 = 1024;

/// Bonus for matching `current` given the class of the char before it.
#[inline]
pub fn bonus_for(prev: Option<CharClass>, current: CharClass) -> i64 {
    match prev {
        None if current.is_word() => BONUS_BOUNDARY,
        None => 0,
        Some(prev) if !prev.is_word() && current.is_word() => BONUS_BOUNDARY,
        Some(CharClass::Lower) if current == CharClass::Upper => BONUS_CAMEL,
        Some(prev) if prev.is_letter() && current == CharClass::Digit => BONUS_CAMEL,
        _ => 0,
    }
}

/// Fill `out` with the per-position bonus of `raw` (the unfolded text, so camel case survives).
pub fn compute_bonuses(raw: &[char], out: &mut Vec<i64>) {
    out.clear();
    out.reserve(raw.len());
    let mut prev = None;
    for &c in raw {
        let class = CharClass::of(c);
        out.push(bonus_for(prev, class));
        prev = Some(class);
    }
}

/// Score a sorted set of matched positions, ignoring candidate length.
pub fn structural_score(bonuses: &[i64], positions: &[usize]) -> i64 {
    let mut score = 0;
    let mut prev: Option<usize> = None;

    for &pos in positions {
        score += SCORE_MATCH + bonuses.get(pos).copied().unwrap_or(0);
        if let Some(prev) = prev {
            if pos == prev + 1 {
                score += BONUS_CONSECUTIVE;
            } else {
                score -= PENALTY_GAP * (pos - prev - 1) as i64;
            }
        }
        prev = Some(pos);
    }

    score
}

/// Fold the candidate length into a structural score.
///
/// Candidates of 1023 chars or more share the same length penalty and fall back to input
/// order among themselves.
#[inline]
pub fn finalize(structural: i64, char_len: usize) -> i64 {
    let length_penalty = (char_len as i64).min(LENGTH_SCALE - 1);
    structural * LENGTH_SCALE - length_penalty
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bonuses(text: &str) -> Vec<i64> {
        let chars: Vec<char> = text.chars().collect();
        let mut out = Vec::new();
        compute_bonuses(&chars, &mut out);
        out
    }

    #[test]
    fn boundary_and_camel_bonuses() {
        let b = bonuses("fooBar_baz9 x");
        assert_eq!(b[0], BONUS_BOUNDARY); // f at start
        assert_eq!(b[1], 0);
        assert_eq!(b[3], BONUS_CAMEL); // B after o
        assert_eq!(b[7], BONUS_BOUNDARY); // b after _
        assert_eq!(b[10], BONUS_CAMEL); // 9 after z
        assert_eq!(b[12], BONUS_BOUNDARY); // x after space
        assert_eq!(b[6], 0); // '_' itself
    }

    #[test]
    fn path_separator_starts_a_word() {
        let b = bonuses("foo/bar");
        assert_eq!(b[4], BONUS_BOUNDARY);
    }

    #[test]
    fn consecutive_and_gap_scoring() {
        let b = bonuses("abcdef");
        let tight = structural_score(&b, &[0, 1, 2]);
        let spread = structural_score(&b, &[0, 2, 4]);
        assert_eq!(
            tight,
            3 * SCORE_MATCH + BONUS_BOUNDARY + 2 * BONUS_CONSECUTIVE
        );
        assert_eq!(spread, 3 * SCORE_MATCH + BONUS_BOUNDARY - 2 * PENALTY_GAP);
        assert!(tight > spread);
    }

    #[test]
    fn skipped_char_outweighs_boundary_bonus() {
        assert!(PENALTY_GAP > BONUS_BOUNDARY);
    }

    #[test]
    fn finalize_prefers_shorter_candidates() {
        assert!(finalize(40, 10) > finalize(40, 11));
        assert!(finalize(41, 1000) > finalize(40, 1));
        assert_eq!(finalize(40, 5000), finalize(40, 9000));
    }
}
