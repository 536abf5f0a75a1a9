// ============================================================
// Layer 4 — Model Data Generator
// ============================================================
// Produces the mini-batches the fit loop consumes.
//
//   StoryDataset ──get(i)──► StorySample ──(reverse?)──► Vec<StorySample>
//                                                           │
//                                   StoryBatcher::batch ◄───┘
//
// The generator only decides WHICH samples go together and in
// what order. Turning them into tensors is the batcher's job,
// so the same generator serves the autodiff backend during
// training and the inner backend during validation.
//
// Ordering:
//   - shuffle = false → samples in dataset order
//   - shuffle = true  → a fresh permutation per epoch, seeded
//                       from (seed, epoch) so runs are repeatable
//
// The last batch of an epoch may be shorter than batch_size;
// no sample is ever dropped.
//
// Reference: Burn Book §4 (Datasets and Dataloaders)
//            rand crate documentation

use burn::data::dataset::Dataset;
use rand::{rngs::StdRng, seq::SliceRandom, SeedableRng};
use std::sync::Arc;

use crate::data::{dataset::StoryDataset, error::DataError, vocabulary::Vocabulary};
use crate::domain::story::StorySample;

#[derive(Clone)]
pub struct ModelDataGenerator {
    dataset:    Arc<StoryDataset>,
    vocabulary: Arc<Vocabulary>,
    batch_size: usize,
    reverse:    bool,
    shuffle:    bool,
    seed:       u64,
}

impl ModelDataGenerator {
    pub fn new(
        dataset:    Arc<StoryDataset>,
        vocabulary: Arc<Vocabulary>,
        batch_size: usize,
    ) -> Result<Self, DataError> {
        if batch_size == 0 {
            return Err(DataError::InvalidBatchSize(batch_size));
        }
        Ok(Self { dataset, vocabulary, batch_size, reverse: false, shuffle: false, seed: 0 })
    }

    /// Feed image sequences back to front
    pub fn with_reverse(mut self, reverse: bool) -> Self {
        self.reverse = reverse;
        self
    }

    /// Reshuffle the sample order at the start of every epoch
    pub fn with_shuffle(mut self, shuffle: bool, seed: u64) -> Self {
        self.shuffle = shuffle;
        self.seed    = seed;
        self
    }

    pub fn sample_count(&self) -> usize {
        self.dataset.len()
    }

    pub fn story_count(&self) -> usize {
        self.dataset.story_count()
    }

    pub fn token_vocabulary_size(&self) -> usize {
        self.vocabulary.size()
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    pub fn reverse(&self) -> bool {
        self.reverse
    }

    pub fn vocabulary(&self) -> &Arc<Vocabulary> {
        &self.vocabulary
    }

    pub fn dataset(&self) -> &Arc<StoryDataset> {
        &self.dataset
    }

    /// ceil(samples / batch_size)
    pub fn steps_per_epoch(&self) -> usize {
        self.sample_count().div_ceil(self.batch_size)
    }

    /// Sample indices in the order epoch `epoch` visits them
    pub fn epoch_order(&self, epoch: usize) -> Vec<usize> {
        let mut order: Vec<usize> = (0..self.sample_count()).collect();
        if self.shuffle {
            let mut rng = StdRng::seed_from_u64(self.seed.wrapping_add(epoch as u64));
            order.shuffle(&mut rng);
        }
        order
    }

    /// Lazily yields the batches of one epoch
    pub fn epoch(&self, epoch: usize) -> EpochBatches {
        EpochBatches {
            generator: self.clone(),
            order:     self.epoch_order(epoch),
            cursor:    0,
        }
    }

    /// Never-ending stream: epoch 0, then epoch 1, and so on
    pub fn batches(&self) -> impl Iterator<Item = Vec<StorySample>> + '_ {
        (0..).flat_map(move |epoch| self.epoch(epoch))
    }

    fn sample(&self, index: usize) -> Option<StorySample> {
        let mut sample = self.dataset.get(index)?;
        if self.reverse {
            sample.reverse_images();
        }
        Some(sample)
    }
}

/// Iterator over the batches of a single epoch.
pub struct EpochBatches {
    generator: ModelDataGenerator,
    order:     Vec<usize>,
    cursor:    usize,
}

impl Iterator for EpochBatches {
    type Item = Vec<StorySample>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.cursor >= self.order.len() {
            return None;
        }
        let end = (self.cursor + self.generator.batch_size).min(self.order.len());
        let batch = self.order[self.cursor..end]
            .iter()
            .filter_map(|&i| self.generator.sample(i))
            .collect();
        self.cursor = end;
        Some(batch)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let left = (self.order.len() - self.cursor).div_ceil(self.generator.batch_size);
        (left, Some(left))
    }
}

impl ExactSizeIterator for EpochBatches {}
