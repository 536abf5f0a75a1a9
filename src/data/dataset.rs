// ============================================================
// Layer 4 — Story Dataset
// ============================================================
// Reads one pre-built dataset container (.npz archive) and
// exposes it through Burn's Dataset trait.
//
// Container layout:
//   image_embeddings  f32  [stories, images_per_story, embedding_dim]
//   story_sentences   i64  [stories, images_per_story, sentence_len]
//
// Every story expands into images_per_story samples, so
//   len() == stories * images_per_story
// and sample index i maps to
//   story = i / images_per_story,  sentence = i % images_per_story
//
// Reference: Burn Book §4 (Datasets and Dataloaders)
//            ndarray-npy documentation

use burn::data::dataset::Dataset;
use ndarray::{s, Array3};
use ndarray_npy::NpzReader;
use std::{fs::File, path::Path};

use crate::data::error::DataError;
use crate::domain::story::StorySample;

pub const IMAGE_EMBEDDINGS: &str = "image_embeddings";
pub const STORY_SENTENCES:  &str = "story_sentences";

pub struct StoryDataset {
    image_embeddings: Array3<f32>,
    story_sentences:  Array3<i64>,
}

impl StoryDataset {
    /// Open an .npz container and load both arrays into memory
    pub fn open(path: impl AsRef<Path>) -> Result<Self, DataError> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| DataError::io(path, e))?;
        let mut npz = NpzReader::new(file)?;

        // numpy stores arrays as "<name>.npy" inside the archive
        let names = npz.names()?;
        let entry = |name: &str| -> Result<String, DataError> {
            names
                .iter()
                .find(|n| n.as_str() == name || n.trim_end_matches(".npy") == name)
                .cloned()
                .ok_or_else(|| DataError::MissingArray {
                    path: path.to_path_buf(),
                    name: name.to_string(),
                })
        };

        let image_embeddings: Array3<f32> = npz.by_name(&entry(IMAGE_EMBEDDINGS)?)?;
        let story_sentences:  Array3<i64> = npz.by_name(&entry(STORY_SENTENCES)?)?;

        let dataset = Self::from_arrays(image_embeddings, story_sentences)?;
        tracing::debug!(
            "Opened '{}': {} stories × {} images, embedding_dim={}, sentence_len={}",
            path.display(),
            dataset.story_count(),
            dataset.images_per_story(),
            dataset.embedding_dim(),
            dataset.sentence_len(),
        );
        Ok(dataset)
    }

    pub fn from_arrays(
        image_embeddings: Array3<f32>,
        story_sentences:  Array3<i64>,
    ) -> Result<Self, DataError> {
        let (img_stories, img_per_story, _) = image_embeddings.dim();
        let (sen_stories, sen_per_story, _) = story_sentences.dim();
        if img_stories != sen_stories || img_per_story != sen_per_story {
            return Err(DataError::ShapeMismatch(format!(
                "image_embeddings is {:?} but story_sentences is {:?}",
                image_embeddings.shape(),
                story_sentences.shape(),
            )));
        }
        if let Some(&bad) = story_sentences.iter().find(|&&t| t < 0) {
            return Err(DataError::NegativeToken(bad));
        }
        Ok(Self { image_embeddings, story_sentences })
    }

    pub fn story_count(&self) -> usize {
        self.image_embeddings.dim().0
    }

    pub fn images_per_story(&self) -> usize {
        self.image_embeddings.dim().1
    }

    pub fn embedding_dim(&self) -> usize {
        self.image_embeddings.dim().2
    }

    pub fn sentence_len(&self) -> usize {
        self.story_sentences.dim().2
    }

    /// Largest token index that appears in any sentence
    pub fn max_token_index(&self) -> Option<usize> {
        self.story_sentences.iter().max().map(|&t| t as usize)
    }

    /// All samples of one story, in sentence order
    pub fn story_samples(&self, story: usize) -> Result<Vec<StorySample>, DataError> {
        if story >= self.story_count() {
            return Err(DataError::IndexOutOfRange { index: story, len: self.story_count() });
        }
        let per_story = self.images_per_story();
        Ok((0..per_story)
            .filter_map(|j| self.get(story * per_story + j))
            .collect())
    }
}

impl Dataset<StorySample> for StoryDataset {
    fn get(&self, index: usize) -> Option<StorySample> {
        let per_story = self.images_per_story();
        if per_story == 0 || index >= self.len() {
            return None;
        }
        let story    = index / per_story;
        let sentence = index % per_story;

        let images = self.image_embeddings.slice(s![story, .., ..]);
        let image_embeddings = images
            .outer_iter()
            .enumerate()
            .map(|(t, row)| {
                if t <= sentence { row.to_vec() } else { vec![0.0; row.len()] }
            })
            .collect();

        let sentence_tokens = self
            .story_sentences
            .slice(s![story, sentence, ..])
            .iter()
            .map(|&t| t as usize)
            .collect();

        Some(StorySample {
            story_index:    story,
            sentence_index: sentence,
            image_embeddings,
            sentence:       sentence_tokens,
        })
    }

    fn len(&self) -> usize {
        self.story_count() * self.images_per_story()
    }
}
