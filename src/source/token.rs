//! Token symbols and token payloads.

use serde::{Deserialize, Serialize};

use crate::util::{grapheme_count, split_at_grapheme, text_closer_for};

/// The lexical category of a token
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Sym {
    Name,
    Number,
    /// A whole text literal including its delimiters (the closer may be missing)
    Text,
    Boolean,
    None,
    Placeholder,
    Bind,
    Comma,
    Language,
    Function,
    Conditional,
    Operator,
    EvalOpen,
    EvalClose,
    ListOpen,
    ListClose,
    SetOpen,
    SetClose,
    Unknown,
    /// Zero-width token that owns the document's trailing whitespace
    End,
}

impl Sym {
    pub fn is_open(self) -> bool {
        matches!(self, Sym::EvalOpen | Sym::ListOpen | Sym::SetOpen)
    }

    pub fn is_close(self) -> bool {
        matches!(self, Sym::EvalClose | Sym::ListClose | Sym::SetClose)
    }

    /// The closer that matches this opener
    pub fn closer(self) -> Option<Sym> {
        match self {
            Sym::EvalOpen => Some(Sym::EvalClose),
            Sym::ListOpen => Some(Sym::ListClose),
            Sym::SetOpen => Some(Sym::SetClose),
            _ => None,
        }
    }
}

/// A token's symbol and exact source text
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Token {
    pub sym: Sym,
    pub text: String,
}

impl Token {
    pub fn new(sym: Sym, text: impl Into<String>) -> Self {
        Self {
            sym,
            text: text.into(),
        }
    }

    /// Length in graphemes
    pub fn len(&self) -> usize {
        grapheme_count(&self.text)
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// First grapheme of the token's text
    pub fn first_grapheme(&self) -> Option<&str> {
        let (first, _) = split_at_grapheme(&self.text, 1);
        (!first.is_empty()).then_some(first)
    }

    /// The delimiter that would close this token if it is a text literal.
    ///
    /// Looked up from the token's first grapheme; delimiters are single
    /// graphemes.
    pub fn text_closer(&self) -> Option<&'static str> {
        if self.sym != Sym::Text {
            return None;
        }
        self.first_grapheme().and_then(text_closer_for)
    }

    /// Whether a text literal is still waiting for its closer
    pub fn is_unclosed(&self) -> bool {
        match self.text_closer() {
            Some(closer) => self.len() < 2 || !self.text.ends_with(closer),
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_closer_uses_first_grapheme() {
        assert_eq!(Token::new(Sym::Text, "“hi”").text_closer(), Some("”"));
        assert_eq!(Token::new(Sym::Text, "'a'").text_closer(), Some("'"));
        assert_eq!(Token::new(Sym::Name, "hi").text_closer(), None);
    }

    #[test]
    fn test_unclosed_text() {
        assert!(Token::new(Sym::Text, "\"").is_unclosed());
        assert!(Token::new(Sym::Text, "\"abc").is_unclosed());
        assert!(!Token::new(Sym::Text, "\"abc\"").is_unclosed());
        assert!(!Token::new(Sym::Text, "«»").is_unclosed());
    }
}
