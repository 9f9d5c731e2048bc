//! Tokens produced by text analysis.

/// A single token cut out of a text value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    /// Normalized (lowercased) token text.
    pub text: String,
    /// Position in the token stream, 0-based. Stopwords still consume a
    /// position.
    pub position: u32,
    /// Byte offset of the token's first byte in the source text.
    pub byte_offset: u32,
}

impl Token {
    /// Create a token at `position` starting at byte 0.
    pub fn new<S: Into<String>>(text: S, position: u32) -> Self {
        Token {
            text: text.into(),
            position,
            byte_offset: 0,
        }
    }

    /// Create a token with an explicit byte offset.
    pub fn with_offset<S: Into<String>>(text: S, position: u32, byte_offset: u32) -> Self {
        Token {
            text: text.into(),
            position,
            byte_offset,
        }
    }
}
