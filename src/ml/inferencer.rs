// ============================================================
// Layer 5 — Inferencer
// ============================================================
// Greedy sentence decoding with a trained model.
use burn::prelude::*;

use crate::data::{batcher::StoryBatcher, vocabulary::Vocabulary};
use crate::domain::story::StorySample;
use crate::ml::model::Seq2SeqModel;

pub struct Inferencer<B: Backend> {
    model:    Seq2SeqModel<B>,
    batcher:  StoryBatcher<B>,
    start:    usize,
    end:      Option<usize>,
    max_len:  usize,
}

impl<B: Backend> Inferencer<B> {
    pub fn new(model: Seq2SeqModel<B>, vocabulary: &Vocabulary, max_len: usize, device: B::Device) -> Self {
        Self {
            model,
            batcher: StoryBatcher::new(device, vocabulary),
            start:   vocabulary.start_index(),
            end:     vocabulary.end_index(),
            max_len,
        }
    }

    /// Decode one sentence for `sample`, feeding back the most likely word
    /// at every step. Stops at `<END>` (included) or after `max_len` tokens.
    pub fn decode(&self, sample: &StorySample) -> Vec<usize> {
        let (images, image_mask) = self.batcher.images(std::slice::from_ref(sample));
        let device = images.device();
        let vocab  = self.model.num_tokens();

        let mut prefix = vec![self.start as i32];
        let mut out    = Vec::with_capacity(self.max_len);

        while out.len() < self.max_len {
            let steps  = prefix.len();
            let inputs = Tensor::<B, 1, Int>::from_ints(prefix.as_slice(), &device)
                .reshape([1, steps]);
            let logits = self.model.forward(images.clone(), Some(image_mask.clone()), inputs, None);

            let next = logits
                .slice([0..1, steps - 1..steps, 0..vocab])
                .reshape([vocab])
                .argmax(0)
                .into_scalar()
                .elem::<i64>() as usize;

            out.push(next);
            if Some(next) == self.end {
                break;
            }
            prefix.push(next as i32);
        }

        tracing::debug!(
            "Decoded story {} sentence {}: {:?}",
            sample.story_index, sample.sentence_index, out
        );
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::dataset::fixtures;
    use crate::domain::cell_type::CellType;
    use crate::ml::model::Seq2SeqConfig;
    use burn::{backend::NdArray, data::dataset::Dataset};

    type TestBackend = NdArray;

    #[test]
    fn test_decode_respects_max_len_and_vocabulary() {
        let device = Default::default();
        let vocab  = Vocabulary::from_json(fixtures::VOCAB_JSON).unwrap();
        let model: Seq2SeqModel<TestBackend> =
            Seq2SeqConfig::new(vocab.size(), 6, 4, 1, 3, CellType::Lstm).init(&device);
        let inferencer = Inferencer::new(model, &vocab, 5, device);

        let sample = fixtures::dataset(1, 2, 3, 5).get(1).unwrap();
        let tokens = inferencer.decode(&sample);

        assert!(!tokens.is_empty() && tokens.len() <= 5);
        assert!(tokens.iter().all(|&t| t < vocab.size()));
        // <END> can only appear as the last token
        let end = vocab.end_index().unwrap();
        assert!(tokens[..tokens.len() - 1].iter().all(|&t| t != end));
    }
}
