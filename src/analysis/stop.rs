//! Per-index stopword lists.

use ahash::AHashSet;

/// Default English stopwords.
pub const DEFAULT_STOPWORDS: &[&str] = &[
    "a", "an", "and", "are", "as", "at", "be", "but", "by", "for", "if", "in", "into", "is", "it",
    "no", "not", "of", "on", "or", "such", "that", "the", "their", "then", "there", "these",
    "they", "this", "to", "was", "will", "with",
];

/// Words that are neither indexed nor searched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StopWordList {
    words: AHashSet<String>,
}

impl StopWordList {
    /// The built-in English list.
    pub fn new() -> Self {
        Self::from_words(DEFAULT_STOPWORDS.iter().copied())
    }

    /// A list holding exactly `words`, lowercased.
    pub fn from_words<I, S>(words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        StopWordList {
            words: words.into_iter().map(|w| w.as_ref().to_lowercase()).collect(),
        }
    }

    /// Whether `term` is a stopword. Case-insensitive.
    pub fn contains(&self, term: &str) -> bool {
        self.words.contains(term) || self.words.contains(&term.to_lowercase())
    }

    /// Number of words in the list.
    pub fn len(&self) -> usize {
        self.words.len()
    }

    /// Whether the list is empty.
    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }
}

impl Default for StopWordList {
    fn default() -> Self {
        Self::new()
    }
}
