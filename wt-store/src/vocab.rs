use std::collections::HashMap;

use crate::record::WeightRecord;
use crate::result::WeightResult;

/// An immutable bidirectional mapping between characters and model indices.
#[derive(Debug, Clone)]
pub struct Vocabulary {
    chars: Vec<char>,
    ids: HashMap<char, usize>,
}

/// The alphabet of the Shakespeare character model, in model index order.
const CHAR_RNN_ALPHABET: &str = "\n! $'&-,.3;:?ACBEDGFIHKJMLONQPSRUTWVYXZacbedgfihkjmlonqpsrutwvyxz";

impl Vocabulary {
    /// Build a vocabulary where each character maps to its position.
    ///
    /// Panics if a character appears more than once.
    pub fn from_chars(chars: impl IntoIterator<Item = char>) -> Self {
        let chars: Vec<char> = chars.into_iter().collect();
        let mut ids = HashMap::with_capacity(chars.len());
        for (i, &c) in chars.iter().enumerate() {
            let prev = ids.insert(c, i);
            assert!(prev.is_none(), "Character {:?} appears twice in vocabulary", c);
        }
        Vocabulary { chars, ids }
    }

    /// The 65 character vocabulary of the char-rnn model.
    pub fn char_rnn() -> Self {
        Vocabulary::from_chars(CHAR_RNN_ALPHABET.chars())
    }

    pub fn len(&self) -> usize {
        self.chars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chars.is_empty()
    }

    pub fn id(&self, c: char) -> Option<usize> {
        self.ids.get(&c).copied()
    }

    pub fn char(&self, id: usize) -> Option<char> {
        self.chars.get(id).copied()
    }

    /// Map every character of `text`, or `None` if any is not part of the vocabulary.
    pub fn encode(&self, text: &str) -> Option<Vec<usize>> {
        text.chars().map(|c| self.id(c)).collect()
    }

    pub fn decode(&self, ids: &[usize]) -> Option<String> {
        ids.iter().map(|&i| self.char(i)).collect()
    }
}

/// Copy row `id` out of an embedding matrix of `width` wide f32 rows.
pub fn embedding_row(embedding: &WeightRecord, id: usize, width: usize) -> WeightResult<Vec<f32>> {
    embedding.slice_to_vec::<f32>(id * width, width)
}
