// ============================================================
// Layer 4 — Story Batcher
// ============================================================
// Implements Burn's Batcher trait to convert a Vec<StorySample>
// into the tensors one forward pass needs.
//
// Shapes (N = samples, T = image timesteps, D = embedding dim,
//         L = sentence length, V = vocabulary size):
//
//   images          [N, T, D]   float
//   image_mask      [N, T]      1 = real embedding, 0 = padding
//   decoder_inputs  [N, L]      int, <START> + target shifted right
//   decoder_mask    [N, L]      1 = real token, 0 = padding
//   targets         [N, L, V]   one-hot, all-zero row for padding
//
// Teacher forcing: the decoder sees the ground-truth previous
// word at every step, e.g.
//
//   target          a    dog  ran  <END>  0
//   decoder input   <S>  a    dog  ran    <END>
//
// Reference: Burn Book §4 (Batcher)

use burn::{data::dataloader::batcher::Batcher, prelude::*};

use crate::data::vocabulary::Vocabulary;
use crate::domain::story::StorySample;

// ─── StoryBatch ───────────────────────────────────────────────────────────────
#[derive(Debug, Clone)]
pub struct StoryBatch<B: Backend> {
    pub images:         Tensor<B, 3>,
    pub image_mask:     Tensor<B, 2>,
    pub decoder_inputs: Tensor<B, 2, Int>,
    pub decoder_mask:   Tensor<B, 2>,
    pub targets:        Tensor<B, 3>,
}

// ─── StoryBatcher ─────────────────────────────────────────────────────────────
#[derive(Clone, Debug)]
pub struct StoryBatcher<B: Backend> {
    pub device:  B::Device,
    num_tokens:  usize,
    start_index: usize,
    pad_index:   usize,
}

impl<B: Backend> StoryBatcher<B> {
    pub fn new(device: B::Device, vocabulary: &Vocabulary) -> Self {
        Self {
            device,
            num_tokens:  vocabulary.size(),
            start_index: vocabulary.start_index(),
            pad_index:   vocabulary.pad_index(),
        }
    }

    /// Image tensors only, for decoding without a target sentence
    pub fn images(&self, items: &[StorySample]) -> (Tensor<B, 3>, Tensor<B, 2>) {
        let batch_size = items.len();
        let timesteps  = items[0].timesteps();
        let dim        = items[0].embedding_dim();

        let images_flat: Vec<f32> = items
            .iter()
            .flat_map(|s| s.image_embeddings.iter().flatten().copied())
            .collect();
        let mask_flat: Vec<f32> = items.iter().flat_map(|s| s.image_mask()).collect();

        let images = Tensor::<B, 1>::from_floats(images_flat.as_slice(), &self.device)
            .reshape([batch_size, timesteps, dim]);
        let image_mask = Tensor::<B, 1>::from_floats(mask_flat.as_slice(), &self.device)
            .reshape([batch_size, timesteps]);
        (images, image_mask)
    }

    /// `<START>` followed by the sentence without its last token
    pub fn decoder_input_ids(&self, sentence: &[usize]) -> Vec<usize> {
        std::iter::once(self.start_index)
            .chain(sentence.iter().copied())
            .take(sentence.len())
            .collect()
    }
}

impl<B: Backend> Batcher<StorySample, StoryBatch<B>> for StoryBatcher<B> {
    fn batch(&self, items: Vec<StorySample>) -> StoryBatch<B> {
        let batch_size = items.len();
        let sent_len   = items[0].sentence.len();
        let vocab      = self.num_tokens;

        let (images, image_mask) = self.images(&items);

        // ── Decoder inputs and their mask ─────────────────────────────────────
        let mut dec_flat  = Vec::with_capacity(batch_size * sent_len);
        let mut dmask_flat = Vec::with_capacity(batch_size * sent_len);
        for s in &items {
            for id in self.decoder_input_ids(&s.sentence) {
                dec_flat.push(id as i32);
                dmask_flat.push(if id == self.pad_index { 0.0f32 } else { 1.0 });
            }
        }

        // ── One-hot targets ───────────────────────────────────────────────────
        // Padding and out-of-vocabulary indices stay all-zero rows,
        // so they carry no weight in the loss.
        let mut one_hot = vec![0.0f32; batch_size * sent_len * vocab];
        for (n, s) in items.iter().enumerate() {
            for (t, &tok) in s.sentence.iter().enumerate() {
                if tok != self.pad_index && tok < vocab {
                    one_hot[(n * sent_len + t) * vocab + tok] = 1.0;
                }
            }
        }

        let decoder_inputs = Tensor::<B, 1, Int>::from_ints(dec_flat.as_slice(), &self.device)
            .reshape([batch_size, sent_len]);
        let decoder_mask = Tensor::<B, 1>::from_floats(dmask_flat.as_slice(), &self.device)
            .reshape([batch_size, sent_len]);
        let targets = Tensor::<B, 1>::from_floats(one_hot.as_slice(), &self.device)
            .reshape([batch_size, sent_len, vocab]);

        StoryBatch { images, image_mask, decoder_inputs, decoder_mask, targets }
    }
}
