//! Exact substring, prefix, suffix and whole-line matching.
//!
//! These all produce contiguous positions and are scored with the shared score model, so an
//! exact term ranks on the same scale as a fuzzy one.

use crate::matcher::scoring::structural_score;
use memchr::memmem;

/// Best-scoring occurrence of `needle` inside `haystack`; leftmost wins ties.
///
/// `haystack` and `hay_chars` are two views of the same normalized text. When it is ASCII
/// the byte offsets from `memmem` are char offsets, otherwise occurrences are found by
/// sliding over the char slice.
pub fn substring_match(
    haystack: &str,
    hay_chars: &[char],
    needle: &str,
    needle_chars: &[char],
    bonuses: &[i64],
) -> Option<(i64, Vec<usize>)> {
    let m = needle_chars.len();
    if m == 0 || m > hay_chars.len() {
        return None;
    }

    let mut best: Option<(i64, usize)> = None;
    let mut consider = |start: usize| {
        let positions: Vec<usize> = (start..start + m).collect();
        let score = structural_score(bonuses, &positions);
        if best.map_or(true, |(best_score, _)| score > best_score) {
            best = Some((score, start));
        }
    };

    if haystack.is_ascii() && needle.is_ascii() {
        for start in memmem::find_iter(haystack.as_bytes(), needle.as_bytes()) {
            consider(start);
        }
    } else {
        for start in 0..=hay_chars.len() - m {
            if hay_chars[start..start + m] == *needle_chars {
                consider(start);
            }
        }
    }

    best.map(|(score, start)| (score, (start..start + m).collect()))
}

/// `needle` anchored at the start of the line.
pub fn prefix_match(
    hay_chars: &[char],
    needle_chars: &[char],
    bonuses: &[i64],
) -> Option<(i64, Vec<usize>)> {
    if !hay_chars.starts_with(needle_chars) || needle_chars.is_empty() {
        return None;
    }
    let positions: Vec<usize> = (0..needle_chars.len()).collect();
    Some((structural_score(bonuses, &positions), positions))
}

/// `needle` anchored at the end of the line, ignoring trailing whitespace.
pub fn suffix_match(
    hay_chars: &[char],
    needle_chars: &[char],
    bonuses: &[i64],
) -> Option<(i64, Vec<usize>)> {
    let trimmed_len = hay_chars
        .iter()
        .rposition(|c| !c.is_whitespace())
        .map_or(0, |pos| pos + 1);
    let hay = &hay_chars[..trimmed_len];

    if !hay.ends_with(needle_chars) || needle_chars.is_empty() {
        return None;
    }
    let start = hay.len() - needle_chars.len();
    let positions: Vec<usize> = (start..hay.len()).collect();
    Some((structural_score(bonuses, &positions), positions))
}

/// The whole line equals `needle`.
pub fn equal_match(
    hay_chars: &[char],
    needle_chars: &[char],
    bonuses: &[i64],
) -> Option<(i64, Vec<usize>)> {
    if hay_chars != needle_chars || needle_chars.is_empty() {
        return None;
    }
    let positions: Vec<usize> = (0..needle_chars.len()).collect();
    Some((structural_score(bonuses, &positions), positions))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matcher::scoring::compute_bonuses;

    struct Hay {
        text: String,
        chars: Vec<char>,
        bonuses: Vec<i64>,
    }

    fn hay(text: &str) -> Hay {
        let chars: Vec<char> = text.chars().collect();
        let mut bonuses = Vec::new();
        compute_bonuses(&chars, &mut bonuses);
        Hay {
            text: text.to_string(),
            chars,
            bonuses,
        }
    }

    fn chars(s: &str) -> Vec<char> {
        s.chars().collect()
    }

    #[test]
    fn substring_prefers_word_start_occurrence() {
        let h = hay("barfoo foo");
        let (_, positions) =
            substring_match(&h.text, &h.chars, "foo", &chars("foo"), &h.bonuses).unwrap();
        assert_eq!(positions, vec![7, 8, 9]);
    }

    #[test]
    fn substring_on_unicode_text_reports_char_positions() {
        let h = hay("ärger über alles");
        let (_, positions) =
            substring_match(&h.text, &h.chars, "über", &chars("über"), &h.bonuses).unwrap();
        assert_eq!(positions, vec![6, 7, 8, 9]);
    }

    #[test]
    fn substring_absent() {
        let h = hay("foobar");
        assert!(substring_match(&h.text, &h.chars, "baz", &chars("baz"), &h.bonuses).is_none());
    }

    #[test]
    fn anchored_matches() {
        let h = hay("src/lib.rs  ");
        assert_eq!(
            prefix_match(&h.chars, &chars("src"), &h.bonuses).unwrap().1,
            vec![0, 1, 2]
        );
        assert_eq!(
            suffix_match(&h.chars, &chars(".rs"), &h.bonuses).unwrap().1,
            vec![7, 8, 9]
        );
        assert!(prefix_match(&h.chars, &chars("lib"), &h.bonuses).is_none());

        let exact = hay("Makefile");
        assert!(equal_match(&exact.chars, &chars("Makefile"), &exact.bonuses).is_some());
        assert!(equal_match(&exact.chars, &chars("Make"), &exact.bonuses).is_none());
    }
}
