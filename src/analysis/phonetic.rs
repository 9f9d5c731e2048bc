//! Phonetic keys for sound-alike matching.
//!
//! Fields with the phonetic option match query terms whose key equals the
//! key of an indexed term. The encoder is pluggable; [`Soundex`] is the
//! default.

use std::fmt::Debug;

/// Maps a term to a phonetic key.
pub trait PhoneticEncoder: Send + Sync + Debug {
    /// The key for `term`, or `None` when the term has no letters to encode.
    fn encode(&self, term: &str) -> Option<String>;
}

/// American Soundex with a handful of silent or merged leading clusters
/// ("ph", "kn", "gn", "wr", "ps") rewritten first, so that e.g. "phelix"
/// and "felix" share a key.
#[derive(Debug, Clone, Copy, Default)]
pub struct Soundex;

const KEY_LEN: usize = 4;

const LEADING_CLUSTERS: &[(&str, &str)] = &[
    ("ph", "f"),
    ("kn", "n"),
    ("gn", "n"),
    ("wr", "r"),
    ("ps", "s"),
];

fn digit(c: char) -> Option<char> {
    match c {
        'b' | 'f' | 'p' | 'v' => Some('1'),
        'c' | 'g' | 'j' | 'k' | 'q' | 's' | 'x' | 'z' => Some('2'),
        'd' | 't' => Some('3'),
        'l' => Some('4'),
        'm' | 'n' => Some('5'),
        'r' => Some('6'),
        _ => None,
    }
}

impl PhoneticEncoder for Soundex {
    fn encode(&self, term: &str) -> Option<String> {
        let letters: String = term
            .chars()
            .filter(char::is_ascii_alphabetic)
            .map(|c| c.to_ascii_lowercase())
            .collect();

        let rewritten = LEADING_CLUSTERS
            .iter()
            .find(|(cluster, _)| letters.starts_with(cluster))
            .map(|(cluster, replacement)| format!("{replacement}{}", &letters[cluster.len()..]))
            .unwrap_or(letters);

        let mut chars = rewritten.chars();
        let first = chars.next()?;

        let mut key = String::with_capacity(KEY_LEN);
        key.push(first.to_ascii_uppercase());
        let mut last = digit(first);

        for c in chars {
            if key.len() == KEY_LEN {
                break;
            }
            // h and w do not separate equal codes
            if c == 'h' || c == 'w' {
                continue;
            }
            let code = digit(c);
            if let Some(d) = code {
                if code != last {
                    key.push(d);
                }
            }
            last = code;
        }

        while key.len() < KEY_LEN {
            key.push('0');
        }
        Some(key)
    }
}
