//! Splits source text into tokens, each carrying the whitespace before it.
//!
//! The tokenizer is total: every grapheme lands either in a token or in the
//! leading space of the following token, and the trailing whitespace belongs
//! to a zero-width [`Sym::End`] token. Concatenating `space + text` over the
//! output reproduces the input exactly.

use unicode_segmentation::UnicodeSegmentation;

use super::token::{Sym, Token};
use crate::util::{is_operator, is_reserved, is_space, text_closer_for};

/// A token and the whitespace that precedes it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Lexeme {
    pub space: String,
    pub token: Token,
}

fn first_char(grapheme: &str) -> char {
    grapheme.chars().next().unwrap_or('\0')
}

pub fn tokenize(source: &str) -> Vec<Lexeme> {
    let graphemes: Vec<&str> = source.graphemes(true).collect();
    let mut lexemes = Vec::new();
    let mut i = 0;

    loop {
        let space_start = i;
        while i < graphemes.len() && is_space(first_char(graphemes[i])) {
            i += 1;
        }
        let space = graphemes[space_start..i].concat();

        if i >= graphemes.len() {
            lexemes.push(Lexeme {
                space,
                token: Token::new(Sym::End, ""),
            });
            break;
        }

        let start = i;
        let grapheme = graphemes[i];
        let ch = first_char(grapheme);
        i += 1;

        let sym = if ch.is_ascii_digit() {
            while i < graphemes.len() && first_char(graphemes[i]).is_ascii_digit() {
                i += 1;
            }
            if i + 1 < graphemes.len()
                && graphemes[i] == "."
                && first_char(graphemes[i + 1]).is_ascii_digit()
            {
                i += 1;
                while i < graphemes.len() && first_char(graphemes[i]).is_ascii_digit() {
                    i += 1;
                }
            }
            Sym::Number
        } else if let Some(closer) = text_closer_for(grapheme) {
            // Text runs to its closer, or to the end of the line when unclosed
            while i < graphemes.len() {
                let next = graphemes[i];
                if next == "\n" || next == "\r\n" {
                    break;
                }
                i += 1;
                if next == closer {
                    break;
                }
            }
            Sym::Text
        } else {
            match ch {
                '(' => Sym::EvalOpen,
                ')' => Sym::EvalClose,
                '[' => Sym::ListOpen,
                ']' => Sym::ListClose,
                '{' => Sym::SetOpen,
                '}' => Sym::SetClose,
                ':' => Sym::Bind,
                ',' => Sym::Comma,
                '/' => Sym::Language,
                'ƒ' => Sym::Function,
                '?' => Sym::Conditional,
                '_' => Sym::Placeholder,
                '⊤' | '⊥' => Sym::Boolean,
                'ø' => Sym::None,
                c if is_operator(c) => Sym::Operator,
                c if is_reserved(c) => Sym::Unknown,
                _ => {
                    while i < graphemes.len() && !is_reserved(first_char(graphemes[i])) {
                        i += 1;
                    }
                    Sym::Name
                }
            }
        };

        lexemes.push(Lexeme {
            space,
            token: Token::new(sym, graphemes[start..i].concat()),
        });
    }

    lexemes
}
