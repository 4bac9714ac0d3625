//! Query parsing.
//!
//! In extended mode a query is a list of space-separated terms that must all match. A term
//! may carry markers:
//!
//! | Token     | Meaning                              |
//! |-----------|--------------------------------------|
//! | `sbtrkt`  | fuzzy match                          |
//! | `'wild`   | exact substring                      |
//! | `^music`  | prefix                               |
//! | `.mp3$`   | suffix                               |
//! | `^README$`| whole line                           |
//! | `!fire`   | line must not contain `fire`         |
//! | `a \| b`  | either `a` or `b` (OR group)         |
//!
//! `\ ` is a literal space. With `exact` enabled, unmarked terms are exact and `'` turns a
//! term back into a fuzzy one.

use crate::candidate::normalize::{fold_char, has_uppercase};
use std::sync::Arc;

/// How letter case is treated when matching.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CaseMode {
    /// Case-insensitive unless the term contains an uppercase char
    #[default]
    Smart,
    /// Always case-insensitive
    Ignore,
    /// Always case-sensitive
    Respect,
}

/// Kind of comparison a term performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TermKind {
    Fuzzy,
    Exact,
    Prefix,
    Suffix,
    Equal,
}

/// One parsed query term.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Term {
    pub kind: TermKind,
    pub inverse: bool,
    pub case_sensitive: bool,
    /// Normalized text (folded when case-insensitive)
    pub text: Box<str>,
    pub chars: Box<[char]>,
}

impl Term {
    fn new(kind: TermKind, inverse: bool, text: &str, case: CaseMode) -> Self {
        let case_sensitive = match case {
            CaseMode::Smart => has_uppercase(text),
            CaseMode::Ignore => false,
            CaseMode::Respect => true,
        };
        let text: String = if case_sensitive {
            text.to_string()
        } else {
            text.chars().map(fold_char).collect()
        };
        let chars = text.chars().collect::<Vec<_>>().into_boxed_slice();

        Self {
            kind,
            inverse,
            case_sensitive,
            text: text.into_boxed_str(),
            chars,
        }
    }
}

/// Terms joined by `|`; the group matches when any term does.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TermGroup {
    pub terms: Vec<Term>,
}

/// Options that shape how a query string becomes a [`Pattern`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PatternOptions {
    pub case: CaseMode,
    pub extended: bool,
    pub exact: bool,
}

impl Default for PatternOptions {
    fn default() -> Self {
        Self {
            case: CaseMode::Smart,
            extended: true,
            exact: false,
        }
    }
}

/// Immutable parsed form of a query string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pattern {
    query: Arc<str>,
    groups: Vec<TermGroup>,
}

impl Pattern {
    pub fn parse(query: &str, options: &PatternOptions) -> Self {
        let groups = if options.extended {
            parse_extended(query, options)
        } else if query.is_empty() {
            Vec::new()
        } else {
            let kind = if options.exact {
                TermKind::Exact
            } else {
                TermKind::Fuzzy
            };
            vec![TermGroup {
                terms: vec![Term::new(kind, false, query, options.case)],
            }]
        };

        Self {
            query: Arc::from(query),
            groups,
        }
    }

    /// The query text this pattern was parsed from.
    pub fn query(&self) -> &str {
        &self.query
    }

    /// Shared handle to the query text.
    pub fn shared_query(&self) -> Arc<str> {
        Arc::clone(&self.query)
    }

    pub fn groups(&self) -> &[TermGroup] {
        &self.groups
    }

    /// True when nothing constrains the match (every candidate matches neutrally).
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// True when at least one term contributes score and positions.
    pub fn has_positive_terms(&self) -> bool {
        self.groups
            .iter()
            .any(|group| group.terms.iter().any(|term| !term.inverse))
    }
}

fn parse_extended(query: &str, options: &PatternOptions) -> Vec<TermGroup> {
    let mut groups: Vec<TermGroup> = Vec::new();
    let mut join_next = false;

    for token in split_tokens(query) {
        if token == "|" {
            join_next = !groups.is_empty();
            continue;
        }

        let Some(term) = parse_term(&token, options) else {
            continue;
        };

        match groups.last_mut() {
            Some(group) if join_next => group.terms.push(term),
            _ => groups.push(TermGroup { terms: vec![term] }),
        }
        join_next = false;
    }

    groups
}

/// Split on unescaped spaces; `\ ` becomes a literal space inside a token.
fn split_tokens(query: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut chars = query.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '\\' if chars.peek() == Some(&' ') => {
                current.push(' ');
                chars.next();
            }
            ' ' => {
                if !current.is_empty() {
                    tokens.push(std::mem::take(&mut current));
                }
            }
            _ => current.push(c),
        }
    }
    if !current.is_empty() {
        tokens.push(current);
    }

    tokens
}

fn parse_term(token: &str, options: &PatternOptions) -> Option<Term> {
    let mut text = token;
    let mut inverse = false;

    if let Some(rest) = text.strip_prefix('!') {
        inverse = true;
        text = rest;
    }

    let default_kind = if options.exact || inverse {
        TermKind::Exact
    } else {
        TermKind::Fuzzy
    };
    let mut kind = default_kind;

    if let Some(rest) = text.strip_prefix('\'') {
        kind = if options.exact && !inverse {
            TermKind::Fuzzy
        } else {
            TermKind::Exact
        };
        text = rest;
    } else {
        let prefix = text.strip_prefix('^');
        if let Some(rest) = prefix {
            kind = TermKind::Prefix;
            text = rest;
        }
        if text.len() > 1 || (prefix.is_some() && !text.is_empty()) {
            if let Some(rest) = text.strip_suffix('$') {
                kind = if kind == TermKind::Prefix {
                    TermKind::Equal
                } else {
                    TermKind::Suffix
                };
                text = rest;
            }
        }
    }

    if text.is_empty() {
        return None;
    }

    Some(Term::new(kind, inverse, text, options.case))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(query: &str) -> Pattern {
        Pattern::parse(query, &PatternOptions::default())
    }

    fn kinds(pattern: &Pattern) -> Vec<Vec<(TermKind, bool, String)>> {
        pattern
            .groups()
            .iter()
            .map(|group| {
                group
                    .terms
                    .iter()
                    .map(|t| (t.kind, t.inverse, t.text.to_string()))
                    .collect()
            })
            .collect()
    }

    #[test]
    fn empty_and_whitespace_queries_are_empty() {
        assert!(parse("").is_empty());
        assert!(parse("   ").is_empty());
        assert!(parse("^").is_empty());
        assert!(parse("!").is_empty());
    }

    #[test]
    fn term_markers() {
        let pattern = parse("sbtrkt 'wild ^music .mp3$ ^README$ !fire");
        assert_eq!(
            kinds(&pattern),
            vec![
                vec![(TermKind::Fuzzy, false, "sbtrkt".to_string())],
                vec![(TermKind::Exact, false, "wild".to_string())],
                vec![(TermKind::Prefix, false, "music".to_string())],
                vec![(TermKind::Suffix, false, ".mp3".to_string())],
                vec![(TermKind::Equal, false, "README".to_string())],
                vec![(TermKind::Exact, true, "fire".to_string())],
            ]
        );
    }

    #[test]
    fn lone_dollar_is_literal() {
        let pattern = parse("$");
        assert_eq!(
            kinds(&pattern),
            vec![vec![(TermKind::Fuzzy, false, "$".to_string())]]
        );
    }

    #[test]
    fn or_groups() {
        let pattern = parse("^core go$ | rb$ | py$");
        assert_eq!(pattern.groups().len(), 2);
        assert_eq!(pattern.groups()[1].terms.len(), 3);
        assert_eq!(pattern.groups()[1].terms[2].kind, TermKind::Suffix);

        // A leading bar has nothing to join
        assert_eq!(parse("| foo").groups().len(), 1);
    }

    #[test]
    fn escaped_space_stays_in_term() {
        let pattern = parse(r"foo\ bar baz");
        assert_eq!(pattern.groups().len(), 2);
        assert_eq!(&*pattern.groups()[0].terms[0].text, "foo bar");
    }

    #[test]
    fn smart_case_per_term() {
        let pattern = parse("Foo bar");
        let terms: Vec<&Term> = pattern.groups().iter().map(|g| &g.terms[0]).collect();
        assert!(terms[0].case_sensitive);
        assert_eq!(&*terms[0].text, "Foo");
        assert!(!terms[1].case_sensitive);
    }

    #[test]
    fn case_modes_override_smart_case() {
        let ignore = PatternOptions {
            case: CaseMode::Ignore,
            ..PatternOptions::default()
        };
        let pattern = Pattern::parse("Foo", &ignore);
        assert!(!pattern.groups()[0].terms[0].case_sensitive);
        assert_eq!(&*pattern.groups()[0].terms[0].text, "foo");

        let respect = PatternOptions {
            case: CaseMode::Respect,
            ..PatternOptions::default()
        };
        let pattern = Pattern::parse("foo", &respect);
        assert!(pattern.groups()[0].terms[0].case_sensitive);
    }

    #[test]
    fn exact_mode_flips_quote_meaning() {
        let options = PatternOptions {
            exact: true,
            ..PatternOptions::default()
        };
        let pattern = Pattern::parse("abc 'def", &options);
        assert_eq!(pattern.groups()[0].terms[0].kind, TermKind::Exact);
        assert_eq!(pattern.groups()[1].terms[0].kind, TermKind::Fuzzy);
    }

    #[test]
    fn non_extended_keeps_query_whole() {
        let options = PatternOptions {
            extended: false,
            ..PatternOptions::default()
        };
        let pattern = Pattern::parse("^foo bar$", &options);
        assert_eq!(pattern.groups().len(), 1);
        assert_eq!(pattern.groups()[0].terms[0].kind, TermKind::Fuzzy);
        assert_eq!(&*pattern.groups()[0].terms[0].text, "^foo bar$");
        assert_eq!(pattern.query(), "^foo bar$");
    }

    #[test]
    fn inverse_only_query_has_no_positive_terms() {
        let pattern = parse("!test");
        assert!(!pattern.is_empty());
        assert!(!pattern.has_positive_terms());
        assert!(parse("foo !test").has_positive_terms());
    }
}
