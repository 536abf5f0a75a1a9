// ============================================================
// Layer 4 — Vocabulary
// ============================================================
// Loads the persisted word → index mapping.
//
// Expected JSON layout:
//   {
//     "words_to_idx": { "<NULL>": 0, "<START>": 1, "<END>": 2, ... },
//     "idx_to_words": { "0": "<NULL>", ... }          (optional)
//   }
//
// The vocabulary size is max(index) + 1 so that every index
// fits inside the output layer, even if the mapping has gaps.
// Index 0 is reserved for padding.
//
// Reference: serde_json documentation

use serde::Deserialize;
use std::{collections::HashMap, fs, path::Path};

use crate::data::error::DataError;

pub const PAD_INDEX:   usize = 0;
pub const START_TOKEN: &str  = "<START>";
pub const END_TOKEN:   &str  = "<END>";
pub const UNK_TOKEN:   &str  = "<UNK>";

#[derive(Debug, Deserialize)]
struct VocabularyFile {
    words_to_idx: HashMap<String, usize>,
    #[serde(default)]
    idx_to_words: Option<HashMap<String, String>>,
}

/// Immutable word ↔ index mapping, shared read-only once loaded.
#[derive(Debug, Clone)]
pub struct Vocabulary {
    words_to_idx: HashMap<String, usize>,
    idx_to_words: Vec<Option<String>>,
    start_index:  usize,
    end_index:    Option<usize>,
}

impl Vocabulary {
    /// Read and validate a vocabulary JSON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, DataError> {
        let path = path.as_ref();
        let json = fs::read_to_string(path).map_err(|e| DataError::io(path, e))?;
        let vocab = Self::from_json(&json)?;
        tracing::debug!(
            "Loaded vocabulary from '{}' ({} words, size {})",
            path.display(),
            vocab.word_count(),
            vocab.size(),
        );
        Ok(vocab)
    }

    pub fn from_json(json: &str) -> Result<Self, DataError> {
        let file: VocabularyFile = serde_json::from_str(json)?;
        Self::from_map(file.words_to_idx, file.idx_to_words)
    }

    pub fn from_map(
        words_to_idx: HashMap<String, usize>,
        idx_to_words: Option<HashMap<String, String>>,
    ) -> Result<Self, DataError> {
        let size = words_to_idx
            .values()
            .max()
            .map(|&m| m + 1)
            .ok_or(DataError::EmptyVocabulary)?;

        let start_index = *words_to_idx
            .get(START_TOKEN)
            .ok_or_else(|| DataError::MissingToken(START_TOKEN.to_string()))?;
        let end_index = words_to_idx.get(END_TOKEN).copied();

        // Reverse table: prefer the explicit one, fill gaps from the forward map
        let mut reverse: Vec<Option<String>> = vec![None; size];
        for (word, &idx) in &words_to_idx {
            reverse[idx] = Some(word.clone());
        }
        if let Some(explicit) = idx_to_words {
            for (key, word) in explicit {
                if let Ok(idx) = key.parse::<usize>() {
                    if idx < size {
                        reverse[idx] = Some(word);
                    }
                }
            }
        }

        Ok(Self { words_to_idx, idx_to_words: reverse, start_index, end_index })
    }

    /// Width of the one-hot target and of the output layer
    pub fn size(&self) -> usize {
        self.idx_to_words.len()
    }

    pub fn word_count(&self) -> usize {
        self.words_to_idx.len()
    }

    pub fn index_of(&self, word: &str) -> Option<usize> {
        self.words_to_idx.get(word).copied()
    }

    pub fn word(&self, index: usize) -> &str {
        self.idx_to_words
            .get(index)
            .and_then(|w| w.as_deref())
            .unwrap_or(UNK_TOKEN)
    }

    pub fn start_index(&self) -> usize {
        self.start_index
    }

    pub fn end_index(&self) -> Option<usize> {
        self.end_index
    }

    pub fn pad_index(&self) -> usize {
        PAD_INDEX
    }

    /// Join token indices into a sentence, dropping padding and the
    /// start/end markers.
    pub fn decode(&self, indices: &[usize]) -> String {
        indices
            .iter()
            .filter(|&&i| i != PAD_INDEX && i != self.start_index && Some(i) != self.end_index)
            .map(|&i| self.word(i))
            .collect::<Vec<_>>()
            .join(" ")
    }
}
