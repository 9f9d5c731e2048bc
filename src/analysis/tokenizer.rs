//! Splitting text values into tokens.
//!
//! Linguistic normalization is left to the caller: the tokenizer here only
//! splits on separator characters and lowercases. Plug a different
//! [`Tokenizer`] into the index builder for anything smarter.

use std::fmt::Debug;

use crate::analysis::token::Token;

/// Characters that separate tokens by default.
pub const DEFAULT_SEPARATORS: &str = " \t\r\n,./{}[]:;\\~!@#$%^&*-_=+()|'\"`<>?";

/// Turns a text value into a sequence of tokens.
pub trait Tokenizer: Send + Sync + Debug {
    /// Tokenize `text`. Positions are assigned in order, starting at 0.
    fn tokenize(&self, text: &str) -> Vec<Token>;

    /// Normalize a single query term the same way indexed tokens are.
    fn normalize(&self, term: &str) -> String {
        term.to_lowercase()
    }
}

/// Splits on a fixed set of separator characters and lowercases each token.
#[derive(Debug, Clone)]
pub struct SeparatorTokenizer {
    separators: Vec<char>,
}

impl SeparatorTokenizer {
    /// Create a tokenizer with the default separators.
    pub fn new() -> Self {
        Self::with_separators(DEFAULT_SEPARATORS)
    }

    /// Create a tokenizer splitting on every character of `separators`.
    pub fn with_separators(separators: &str) -> Self {
        SeparatorTokenizer {
            separators: separators.chars().collect(),
        }
    }

    fn is_separator(&self, c: char) -> bool {
        self.separators.contains(&c)
    }
}

impl Default for SeparatorTokenizer {
    fn default() -> Self {
        Self::new()
    }
}

impl Tokenizer for SeparatorTokenizer {
    fn tokenize(&self, text: &str) -> Vec<Token> {
        let mut tokens = Vec::new();
        let mut push = |begin: usize, end: usize| {
            let position = tokens.len() as u32;
            tokens.push(Token::with_offset(
                text[begin..end].to_lowercase(),
                position,
                begin as u32,
            ));
        };

        let mut start = None;
        for (idx, c) in text.char_indices() {
            if self.is_separator(c) {
                if let Some(begin) = start.take() {
                    push(begin, idx);
                }
            } else if start.is_none() {
                start = Some(idx);
            }
        }
        if let Some(begin) = start {
            push(begin, text.len());
        }

        tokens
    }
}
