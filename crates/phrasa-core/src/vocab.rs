//! Bidirectional surface token ↔ id mapping, one instance per corpus side.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Dense per-side token id.
pub type TokenId = u32;

/// Every id of the `TokenId` range is taken.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("vocabulary full: more than {} distinct tokens", TokenId::MAX as u64 + 1)]
pub struct VocabularyFull;

fn next_id(len: usize) -> Result<TokenId, VocabularyFull> {
    TokenId::try_from(len).map_err(|_| VocabularyFull)
}

/// Growable vocabulary. Ids are assigned densely in first-seen order.
///
/// Only the id → word list is serialized; the reverse map is rebuilt on load.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(try_from = "Vec<String>", into = "Vec<String>")]
pub struct Vocabulary {
    ids: HashMap<String, TokenId>,
    words: Vec<String>,
}

impl Vocabulary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the id for `word`, assigning the next free id if it is new.
    pub fn get_or_insert(&mut self, word: &str) -> Result<TokenId, VocabularyFull> {
        if let Some(&id) = self.ids.get(word) {
            return Ok(id);
        }
        let id = next_id(self.words.len())?;
        self.ids.insert(word.to_string(), id);
        self.words.push(word.to_string());
        Ok(id)
    }

    /// Looks up an id without assigning one. `None` means OOV.
    pub fn id(&self, word: &str) -> Option<TokenId> {
        self.ids.get(word).copied()
    }

    /// Reverse lookup.
    pub fn word(&self, id: TokenId) -> Option<&str> {
        self.words.get(id as usize).map(String::as_str)
    }

    /// Maps every word to its id, or `None` if any word is OOV.
    pub fn ids_of<'a>(&self, words: impl IntoIterator<Item = &'a str>) -> Option<Vec<TokenId>> {
        words.into_iter().map(|w| self.id(w)).collect()
    }

    /// Tokenizes `line` on whitespace and interns every token.
    pub fn encode_line(&mut self, line: &str) -> Result<Vec<TokenId>, VocabularyFull> {
        line.split_whitespace()
            .map(|w| self.get_or_insert(w))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }
}

impl TryFrom<Vec<String>> for Vocabulary {
    type Error = VocabularyFull;

    fn try_from(words: Vec<String>) -> Result<Self, Self::Error> {
        let ids = words
            .iter()
            .enumerate()
            .map(|(i, w)| Ok((w.clone(), next_id(i)?)))
            .collect::<Result<_, VocabularyFull>>()?;
        Ok(Self { ids, words })
    }
}

impl From<Vocabulary> for Vec<String> {
    fn from(vocab: Vocabulary) -> Self {
        vocab.words
    }
}
