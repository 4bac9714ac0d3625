//! Char-level normalization shared by candidates and query terms.
//!
//! Folding is done one char at a time so that a folded string always has the same number
//! of chars as its source. Chars whose lowercase form expands to several chars are kept as-is.

/// Lowercase a single char without changing the char count.
#[inline]
pub fn fold_char(c: char) -> char {
    if c.is_ascii() {
        return c.to_ascii_lowercase();
    }
    let mut lower = c.to_lowercase();
    match (lower.next(), lower.next()) {
        (Some(folded), None) => folded,
        _ => c,
    }
}

/// Fold a whole string; returns `None` when the text is already folded.
pub fn fold(text: &str) -> Option<String> {
    if text.is_ascii() {
        if !text.bytes().any(|b| b.is_ascii_uppercase()) {
            return None;
        }
        return Some(text.to_ascii_lowercase());
    }

    if text.chars().all(|c| fold_char(c) == c) {
        None
    } else {
        Some(text.chars().map(fold_char).collect())
    }
}

/// Whether the text contains any uppercase char (drives smart-case).
pub fn has_uppercase(text: &str) -> bool {
    text.chars().any(char::is_uppercase)
}

/// Classification used by the scorer to detect word and camel-case boundaries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CharClass {
    Lower,
    Upper,
    Digit,
    /// Alphabetic without case (CJK and friends)
    Letter,
    /// Anything that separates words: whitespace, punctuation, path separators
    NonWord,
}

impl CharClass {
    pub fn of(c: char) -> Self {
        if c.is_ascii() {
            return match c {
                'a'..='z' => CharClass::Lower,
                'A'..='Z' => CharClass::Upper,
                '0'..='9' => CharClass::Digit,
                _ => CharClass::NonWord,
            };
        }
        if c.is_lowercase() {
            CharClass::Lower
        } else if c.is_uppercase() {
            CharClass::Upper
        } else if c.is_numeric() {
            CharClass::Digit
        } else if c.is_alphabetic() {
            CharClass::Letter
        } else {
            CharClass::NonWord
        }
    }

    pub fn is_word(self) -> bool {
        !matches!(self, CharClass::NonWord)
    }

    pub fn is_letter(self) -> bool {
        matches!(self, CharClass::Lower | CharClass::Upper | CharClass::Letter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fold_char_handles_ascii_and_unicode() {
        assert_eq!(fold_char('A'), 'a');
        assert_eq!(fold_char('z'), 'z');
        assert_eq!(fold_char('Ä'), 'ä');
        // Expands to two chars when lowercased, so it is left alone
        assert_eq!(fold_char('İ'), 'İ');
    }

    #[test]
    fn fold_returns_none_when_unchanged() {
        assert_eq!(fold("plain text"), None);
        assert_eq!(fold("Mixed Case"), Some("mixed case".to_string()));
        assert_eq!(fold("schön"), None);
        assert_eq!(fold("SCHÖN"), Some("schön".to_string()));
    }

    #[test]
    fn uppercase_detection() {
        assert!(has_uppercase("Foo"));
        assert!(!has_uppercase("foo/bar"));
        assert!(has_uppercase("ümlautÜ"));
    }

    #[test]
    fn char_classes() {
        assert_eq!(CharClass::of('a'), CharClass::Lower);
        assert_eq!(CharClass::of('Q'), CharClass::Upper);
        assert_eq!(CharClass::of('7'), CharClass::Digit);
        assert_eq!(CharClass::of('/'), CharClass::NonWord);
        assert_eq!(CharClass::of(' '), CharClass::NonWord);
        assert_eq!(CharClass::of('漢'), CharClass::Letter);
        assert!(CharClass::of('é').is_letter());
        assert!(!CharClass::of('_').is_word());
    }
}
