//! Fuzzy subsequence matching.
//!
//! [`FuzzyAlgorithm::Optimal`] finds the best-scoring alignment with a dynamic program over
//! `needle × haystack`. The table lives in a caller-owned buffer so the hot path does not
//! allocate per candidate. Haystacks too large for the table fall back to
//! [`FuzzyAlgorithm::Greedy`], which picks the tightest window ending at the first complete
//! match and is scored with the same formula.

use crate::matcher::scoring::{
    structural_score, BONUS_CONSECUTIVE, PENALTY_GAP, SCORE_MATCH,
};

/// Haystacks longer than this many chars are matched greedily.
pub const MAX_DP_CHARS: usize = 2048;

/// Upper bound on DP table cells (`needle_len * haystack_len`).
pub const MAX_DP_CELLS: usize = 128 * 1024;

const NEG: i64 = i64::MIN / 4;

/// Fuzzy algorithm selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FuzzyAlgorithm {
    /// Optimal alignment (falls back to greedy on very long lines)
    #[default]
    Optimal,
    /// Tightest-window greedy scan; faster, may miss the best alignment
    Greedy,
}

impl FuzzyAlgorithm {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Optimal => "optimal",
            Self::Greedy => "greedy",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "optimal" | "v2" => Some(Self::Optimal),
            "greedy" | "v1" => Some(Self::Greedy),
            _ => None,
        }
    }
}

/// Cheap check that `needle` occurs in order inside `haystack`.
#[inline]
pub fn is_subsequence(needle: &str, haystack: &str) -> bool {
    if needle.is_ascii() && haystack.is_ascii() {
        let mut rest = haystack.as_bytes();
        for &b in needle.as_bytes() {
            match memchr::memchr(b, rest) {
                Some(pos) => rest = &rest[pos + 1..],
                None => return false,
            }
        }
        return true;
    }

    let mut hay = haystack.chars();
    needle.chars().all(|n| hay.any(|h| h == n))
}

/// Match `needle` against `haystack` (both already case-normalized).
///
/// `bonuses` holds the per-position boundary bonus of the haystack and `table` is scratch
/// space for the DP. Returns the structural score and sorted char positions.
pub fn fuzzy_match(
    haystack: &[char],
    needle: &[char],
    bonuses: &[i64],
    algorithm: FuzzyAlgorithm,
    table: &mut Vec<i64>,
) -> Option<(i64, Vec<usize>)> {
    if needle.is_empty() || needle.len() > haystack.len() {
        return None;
    }

    let fits_table = haystack.len() <= MAX_DP_CHARS
        && needle.len().saturating_mul(haystack.len()) <= MAX_DP_CELLS;

    let positions = match algorithm {
        FuzzyAlgorithm::Optimal if fits_table => {
            match optimal_positions(haystack, needle, bonuses, table) {
                Some(positions) => positions,
                None => greedy_positions(haystack, needle)?,
            }
        }
        _ => greedy_positions(haystack, needle)?,
    };

    Some((structural_score(bonuses, &positions), positions))
}

/// Best-scoring alignment via DP.
///
/// `D[i][j]` is the best score of matching `needle[..=i]` with `needle[i]` placed at
/// `haystack[j]`, or `NEG` if impossible. Gap predecessors are tracked with a running
/// maximum of `D[i-1][k] + PENALTY_GAP * k`, which keeps each row linear.
fn optimal_positions(
    haystack: &[char],
    needle: &[char],
    bonuses: &[i64],
    table: &mut Vec<i64>,
) -> Option<Vec<usize>> {
    let n = haystack.len();
    let m = needle.len();
    table.clear();
    table.resize(n * m, NEG);

    for (j, &h) in haystack.iter().enumerate() {
        if h == needle[0] {
            table[j] = SCORE_MATCH + bonuses[j];
        }
    }

    for i in 1..m {
        let (prev_rows, rest) = table.split_at_mut(i * n);
        let prev = &prev_rows[(i - 1) * n..];
        let row = &mut rest[..n];
        let mut running = NEG;

        for j in i..n {
            if j >= 2 && prev[j - 2] != NEG {
                running = running.max(prev[j - 2] + PENALTY_GAP * (j - 2) as i64);
            }
            if haystack[j] != needle[i] {
                continue;
            }

            let consecutive = if prev[j - 1] != NEG {
                prev[j - 1] + BONUS_CONSECUTIVE
            } else {
                NEG
            };
            let gapped = if running != NEG {
                running - PENALTY_GAP * (j - 1) as i64
            } else {
                NEG
            };
            let best = consecutive.max(gapped);
            if best != NEG {
                row[j] = best + SCORE_MATCH + bonuses[j];
            }
        }
    }

    // Leftmost end among equal scores.
    let last = &table[(m - 1) * n..];
    let mut end = None;
    let mut best = NEG;
    for (j, &score) in last.iter().enumerate() {
        if score > best {
            best = score;
            end = Some(j);
        }
    }
    let mut j = end?;

    let mut positions = vec![0; m];
    positions[m - 1] = j;
    for i in (1..m).rev() {
        let base = table[i * n + j] - SCORE_MATCH - bonuses[j];
        let prev = &table[(i - 1) * n..i * n];

        let consecutive = j >= 1 && prev[j - 1] != NEG && prev[j - 1] + BONUS_CONSECUTIVE == base;
        j = if consecutive {
            j - 1
        } else {
            (0..j.saturating_sub(1))
                .rev()
                .find(|&k| prev[k] != NEG && prev[k] - PENALTY_GAP * (j - 1 - k) as i64 == base)?
        };
        positions[i - 1] = j;
    }

    Some(positions)
}

/// Tightest window ending at the first complete forward match.
fn greedy_positions(haystack: &[char], needle: &[char]) -> Option<Vec<usize>> {
    // Forward: where does the first complete match end?
    let mut ni = 0;
    let mut end = None;
    for (j, &h) in haystack.iter().enumerate() {
        if h == needle[ni] {
            ni += 1;
            if ni == needle.len() {
                end = Some(j);
                break;
            }
        }
    }
    let end = end?;

    // Backward from the end: how late can the match start?
    let mut ni = needle.len();
    let mut start = end;
    for j in (0..=end).rev() {
        if haystack[j] == needle[ni - 1] {
            ni -= 1;
            if ni == 0 {
                start = j;
                break;
            }
        }
    }

    // Forward again inside the window for left-aligned positions.
    let mut positions = Vec::with_capacity(needle.len());
    let mut ni = 0;
    for (j, &h) in haystack.iter().enumerate().take(end + 1).skip(start) {
        if ni < needle.len() && h == needle[ni] {
            positions.push(j);
            ni += 1;
        }
    }

    (positions.len() == needle.len()).then_some(positions)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matcher::scoring::compute_bonuses;

    fn run(haystack: &str, needle: &str, algorithm: FuzzyAlgorithm) -> Option<(i64, Vec<usize>)> {
        let hay: Vec<char> = haystack.chars().collect();
        let needle: Vec<char> = needle.chars().collect();
        let mut bonuses = Vec::new();
        compute_bonuses(&hay, &mut bonuses);
        let mut table = Vec::new();
        fuzzy_match(&hay, &needle, &bonuses, algorithm, &mut table)
    }

    #[test]
    fn subsequence_prefilter() {
        assert!(is_subsequence("fb", "foo/bar.go"));
        assert!(!is_subsequence("fb", "bazfoo"));
        assert!(is_subsequence("汉漢", "app/汉语/漢語"));
        assert!(!is_subsequence("漢汉", "app/汉语/漢語"));
        assert!(is_subsequence("", "anything"));
    }

    #[test]
    fn optimal_prefers_consecutive_run() {
        let (_, positions) = run("a_b_abc", "abc", FuzzyAlgorithm::Optimal).unwrap();
        assert_eq!(positions, vec![4, 5, 6]);
    }

    #[test]
    fn optimal_beats_or_equals_greedy() {
        let cases = [
            ("axxbxxabc", "abc"),
            ("src/main/fuzzy_matcher.rs", "fm"),
            ("controllers/user_controller.rb", "uc"),
            ("a_b_c_abc", "abc"),
        ];
        for (hay, needle) in cases {
            let optimal = run(hay, needle, FuzzyAlgorithm::Optimal).unwrap();
            let greedy = run(hay, needle, FuzzyAlgorithm::Greedy).unwrap();
            assert!(optimal.0 >= greedy.0, "{hay}/{needle}");
        }
    }

    #[test]
    fn greedy_finds_tightest_window_of_first_match() {
        let (_, positions) = run("aaab", "ab", FuzzyAlgorithm::Greedy).unwrap();
        assert_eq!(positions, vec![2, 3]);
    }

    #[test]
    fn no_match_when_order_differs() {
        assert!(run("bazfoo", "fb", FuzzyAlgorithm::Optimal).is_none());
        assert!(run("bazfoo", "fb", FuzzyAlgorithm::Greedy).is_none());
        assert!(run("ab", "abc", FuzzyAlgorithm::Optimal).is_none());
    }

    #[test]
    fn long_haystack_falls_back_to_greedy() {
        let mut hay = "x".repeat(MAX_DP_CHARS + 10);
        hay.push_str("needle");
        let (_, positions) = run(&hay, "ndl", FuzzyAlgorithm::Optimal).unwrap();
        assert_eq!(positions.len(), 3);
        assert!(positions.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn algorithm_names_round_trip() {
        assert_eq!(FuzzyAlgorithm::from_name("v1"), Some(FuzzyAlgorithm::Greedy));
        assert_eq!(
            FuzzyAlgorithm::from_name(FuzzyAlgorithm::Optimal.name()),
            Some(FuzzyAlgorithm::Optimal)
        );
        assert_eq!(FuzzyAlgorithm::from_name("v3"), None);
    }
}
