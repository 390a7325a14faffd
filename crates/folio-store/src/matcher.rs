//! Field comparators for queries, including the loose text matcher.

use std::collections::HashSet;

/// How a query condition compares a stored field with its value.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Comparator {
    /// Encoded tokens must be identical.
    Exact,
    /// The value must be loosely contained in the stored text
    /// (see [`loosely_contains`]).
    Loose,
}

/// Whether `term` is loosely contained in `candidate`.
///
/// Checks run in order and the first success wins:
///
/// 1. an empty term always matches
/// 2. case-insensitive substring
/// 3. every distinct word of the term is a word of the candidate
/// 4. every word of the term is a substring of the candidate, in any order
///
/// Words are runs of alphanumeric characters or `_`, compared lower-cased.
pub fn loosely_contains(candidate: &str, term: &str) -> bool {
    if term.is_empty() {
        return true;
    }

    let candidate = candidate.to_lowercase();
    let term = term.to_lowercase();
    if candidate.contains(&term) {
        return true;
    }

    let term_words: HashSet<&str> = words(&term).collect();
    if !term_words.is_empty() {
        let candidate_words: HashSet<&str> = words(&candidate).collect();
        if term_words.is_subset(&candidate_words) {
            return true;
        }
    }

    !term_words.is_empty() && term_words.iter().all(|w| candidate.contains(w))
}

fn words(s: &str) -> impl Iterator<Item = &str> {
    s.split(|c: char| !(c.is_alphanumeric() || c == '_'))
        .filter(|w| !w.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn substring_and_case() {
        assert!(loosely_contains("Hello World", "hello"));
        assert!(loosely_contains("Hello World", "world"));
        assert!(loosely_contains("HELLO WORLD", "hello world"));
        assert!(loosely_contains("MiXeD CaSe", "mixed case"));
        assert!(loosely_contains("Frankenstein; or, The Modern Prometheus", "frankenstein"));
    }

    #[test]
    fn word_order_is_ignored() {
        assert!(loosely_contains("The quick brown fox", "fox quick"));
        assert!(loosely_contains("Python is great", "great python"));
        assert!(loosely_contains("Version 2.0", "version 2"));
    }

    #[test]
    fn partial_words_match_as_substrings() {
        assert!(loosely_contains("partially matching", "art match"));
        assert!(loosely_contains("understanding", "under stand"));
    }

    #[test]
    fn punctuation_separates_words() {
        assert!(loosely_contains("Hello, World!", "world"));
        assert!(loosely_contains("Test-string", "test string"));
        assert!(loosely_contains("Multiple   spaces", "spaces"));
    }

    #[test]
    fn empty_inputs() {
        assert!(loosely_contains("", ""));
        assert!(loosely_contains("Anything", ""));
        assert!(!loosely_contains("", "something"));
        assert!(!loosely_contains("", "!!"));
    }

    #[test]
    fn mismatches() {
        assert!(!loosely_contains("Hello World", "hello there"));
        assert!(!loosely_contains("Python", "java"));
        // No words at all and no substring hit.
        assert!(!loosely_contains("abc", "?!"));
    }
}
