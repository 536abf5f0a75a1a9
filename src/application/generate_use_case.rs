// ============================================================
// Layer 2 — Generate Use Case
// ============================================================
// Loads a trained model and writes one sentence per image of
// a chosen story:
//   1. Rebuild the model from its record + manifest
//   2. Load vocabulary and dataset container
//   3. Build the story's samples in the order the model was
//      trained on (reversed if the manifest says so)
//   4. Greedy-decode each sample and map indices back to words

use anyhow::{Context, Result};
use burn::prelude::*;
use std::path::PathBuf;

use crate::data::{dataset::StoryDataset, vocabulary::Vocabulary};
use crate::infra::model_store::ModelStore;
use crate::ml::inferencer::Inferencer;

type InferBackend = burn::backend::Wgpu;

/// One decoded sentence next to the sentence it should have been
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratedSentence {
    pub sentence_index: usize,
    pub generated:      String,
    pub reference:      String,
}

pub struct GenerateUseCase {
    model_path:      PathBuf,
    vocabulary_path: PathBuf,
    dataset_path:    PathBuf,
}

impl GenerateUseCase {
    pub fn new(
        model_path:      impl Into<PathBuf>,
        vocabulary_path: impl Into<PathBuf>,
        dataset_path:    impl Into<PathBuf>,
    ) -> Self {
        Self {
            model_path:      model_path.into(),
            vocabulary_path: vocabulary_path.into(),
            dataset_path:    dataset_path.into(),
        }
    }

    pub fn execute(&self, story: usize) -> Result<Vec<GeneratedSentence>> {
        let device = burn::backend::wgpu::WgpuDevice::default();
        self.execute_on::<InferBackend>(story, &device)
    }

    pub fn execute_on<B: Backend>(&self, story: usize, device: &B::Device) -> Result<Vec<GeneratedSentence>> {
        let (model, manifest) = ModelStore::load::<B>(&self.model_path, device)?;

        let vocabulary = Vocabulary::load(&self.vocabulary_path)
            .with_context(|| format!("Cannot load vocabulary '{}'", self.vocabulary_path.display()))?;
        anyhow::ensure!(
            vocabulary.size() == model.num_tokens(),
            "Vocabulary has {} entries but the model was trained with {}",
            vocabulary.size(),
            model.num_tokens(),
        );

        let dataset = StoryDataset::open(&self.dataset_path)
            .with_context(|| format!("Cannot open dataset '{}'", self.dataset_path.display()))?;
        anyhow::ensure!(
            dataset.embedding_dim() == manifest.model.image_embedding_dim,
            "Dataset embeddings are {}-dimensional but the model expects {}",
            dataset.embedding_dim(),
            manifest.model.image_embedding_dim,
        );
        let mut samples = dataset
            .story_samples(story)
            .with_context(|| format!("No story {story} in '{}'", self.dataset_path.display()))?;
        if manifest.reverse_input {
            samples.iter_mut().for_each(|s| s.reverse_images());
        }

        let inferencer = Inferencer::new(model, &vocabulary, manifest.sentence_len, device.clone());
        let sentences = samples
            .iter()
            .map(|sample| GeneratedSentence {
                sentence_index: sample.sentence_index,
                generated:      vocabulary.decode(&inferencer.decode(sample)),
                reference:      vocabulary.decode(&sample.sentence),
            })
            .collect::<Vec<_>>();

        tracing::info!("Generated {} sentences for story {story}", sentences.len());
        Ok(sentences)
    }
}
