//! Utility functions for text editing

use unicode_normalization::UnicodeNormalization;
use unicode_segmentation::UnicodeSegmentation;

/// Opening and closing delimiter pairs, in the order they are looked up.
///
/// Text delimiters come after the bracket pairs; for some of them the opener
/// and closer are the same grapheme.
pub const DELIMITERS: &[(&str, &str)] = &[
    ("(", ")"),
    ("[", "]"),
    ("{", "}"),
    ("\"", "\""),
    ("'", "'"),
    ("“", "”"),
    ("‘", "’"),
    ("«", "»"),
];

/// The subset of [`DELIMITERS`] that open and close text literals
pub const TEXT_DELIMITERS: &[(&str, &str)] = &[
    ("\"", "\""),
    ("'", "'"),
    ("“", "”"),
    ("‘", "’"),
    ("«", "»"),
];

/// Operator symbols usable in binary and unary position
pub const OPERATORS: &[char] = &[
    '+', '-', '×', '·', '÷', '*', '^', '%', '<', '>', '≤', '≥', '=', '≠', '&', '|', '~',
];

/// Closing delimiter for an opening delimiter
pub fn closer_for(opener: &str) -> Option<&'static str> {
    DELIMITERS
        .iter()
        .find(|(open, _)| *open == opener)
        .map(|(_, close)| *close)
}

/// Opening delimiter for a closing delimiter (the reverse table)
pub fn opener_for(closer: &str) -> Option<&'static str> {
    DELIMITERS
        .iter()
        .find(|(_, close)| *close == closer)
        .map(|(open, _)| *open)
}

/// Closing delimiter for a text literal opener
pub fn text_closer_for(opener: &str) -> Option<&'static str> {
    TEXT_DELIMITERS
        .iter()
        .find(|(open, _)| *open == opener)
        .map(|(_, close)| *close)
}

pub fn is_opening_delimiter(text: &str) -> bool {
    closer_for(text).is_some()
}

pub fn is_closing_delimiter(text: &str) -> bool {
    opener_for(text).is_some()
}

pub fn is_operator(ch: char) -> bool {
    OPERATORS.contains(&ch)
}

/// Characters that never appear inside a name
pub fn is_reserved(ch: char) -> bool {
    ch.is_whitespace()
        || is_operator(ch)
        || matches!(
            ch,
            '(' | ')'
                | '['
                | ']'
                | '{'
                | '}'
                | ':'
                | ','
                | '/'
                | '_'
                | 'ƒ'
                | '?'
                | '⊤'
                | '⊥'
                | 'ø'
                | '.'
                | ';'
                | '@'
                | '#'
                | '$'
                | '\\'
                | '`'
                | '!'
        )
        || TEXT_DELIMITERS
            .iter()
            .any(|(open, close)| open.starts_with(ch) || close.starts_with(ch))
}

/// Whitespace that belongs to the space before a token
pub fn is_space(ch: char) -> bool {
    matches!(ch, ' ' | '\t' | '\n' | '\r')
}

/// Canonical (NFC) form of typed or pasted text
pub fn normalize(text: &str) -> String {
    text.nfc().collect()
}

/// Number of extended grapheme clusters in a string
pub fn grapheme_count(text: &str) -> usize {
    text.graphemes(true).count()
}

/// Split a string after `index` graphemes, clamping to its length.
pub fn split_at_grapheme(text: &str, index: usize) -> (&str, &str) {
    let byte = text
        .grapheme_indices(true)
        .nth(index)
        .map(|(i, _)| i)
        .unwrap_or(text.len());
    text.split_at(byte)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_delimiter_tables_are_reversible() {
        for (open, close) in DELIMITERS {
            assert_eq!(closer_for(open), Some(*close));
            assert!(is_closing_delimiter(close));
        }
        assert_eq!(opener_for("]"), Some("["));
        assert_eq!(opener_for("»"), Some("«"));
        assert_eq!(closer_for("x"), None);
    }

    #[test]
    fn test_reserved_characters() {
        assert!(is_reserved('('));
        assert!(is_reserved('+'));
        assert!(is_reserved('"'));
        assert!(is_reserved('”'));
        assert!(!is_reserved('a'));
        assert!(!is_reserved('é'));
        assert!(!is_reserved('🐈'));
    }

    #[test]
    fn test_split_at_grapheme_clamps() {
        assert_eq!(split_at_grapheme("  \n ", 2), ("  ", "\n "));
        assert_eq!(split_at_grapheme("ab", 10), ("ab", ""));
        // e + combining acute is a single grapheme
        assert_eq!(split_at_grapheme("e\u{301}x", 1), ("e\u{301}", "x"));
    }

    #[test]
    fn test_normalize_composes() {
        assert_eq!(normalize("e\u{301}"), "é");
        assert_eq!(grapheme_count("e\u{301}"), 1);
    }
}
