use std::collections::HashSet;
use std::fmt::{Debug, Formatter};

use smallvec::SmallVec;

use crate::types::{WordId, MAX_SLOT_LENGTH};

/// A struct representing a word that can be chosen for a given slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Word {
    pub string: String,
    pub glyphs: SmallVec<[char; MAX_SLOT_LENGTH]>,
}

impl Word {
    /// Length in characters, which is what has to match a slot's length.
    pub fn len(&self) -> usize {
        self.glyphs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.glyphs.is_empty()
    }
}

/// The candidate vocabulary, indexed by `WordId`. Each distinct word appears once, in the order
/// it was first seen.
#[derive(Clone, Default)]
pub struct WordList {
    words: Vec<Word>,
}

impl Debug for WordList {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WordList")
            .field("words", &(["(", &self.words.len().to_string(), " entries)"].join("")))
            .finish()
    }
}

impl WordList {
    pub fn new<I, S>(words: I) -> WordList
        where
            I: IntoIterator<Item=S>,
            S: AsRef<str>,
    {
        let mut seen: HashSet<String> = HashSet::new();
        let mut result: Vec<Word> = vec![];

        for word in words {
            let word = word.as_ref();
            if word.is_empty() || !seen.insert(word.to_string()) {
                continue;
            }
            result.push(Word { string: word.to_string(), glyphs: word.chars().collect() });
        }

        WordList { words: result }
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    pub fn get(&self, word_id: WordId) -> &Word {
        &self.words[word_id]
    }

    pub fn word_id(&self, string: &str) -> Option<WordId> {
        self.words.iter().position(|word| word.string == string)
    }

    pub fn iter(&self) -> impl Iterator<Item=&Word> {
        self.words.iter()
    }
}
