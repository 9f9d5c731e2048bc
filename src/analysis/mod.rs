//! Text analysis collaborators: tokenization, stopwords, synonyms and
//! phonetic keys.

pub mod phonetic;
pub mod stop;
pub mod synonym;
pub mod token;
pub mod tokenizer;

pub use phonetic::{PhoneticEncoder, Soundex};
pub use stop::StopWordList;
pub use synonym::SynonymMap;
pub use token::Token;
pub use tokenizer::{SeparatorTokenizer, Tokenizer};
