// ============================================================
// Layer 3 — Story Sample Domain Type
// ============================================================
// A visual story is an ordered run of image embeddings with
// one sentence per image. Every story is expanded into one
// sample per sentence:
//
//   sample j = images[0..=j] (rest zero-filled)  →  sentence j
//
// so the model always sees the story so far and learns to
// write the sentence for the newest image.
//
// Reference: Rust Book §5 (Structs and Methods)

use serde::{Deserialize, Serialize};

/// One training pair produced from a story.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StorySample {
    /// Index of the story inside its dataset container
    pub story_index: usize,

    /// Which sentence of the story this sample targets
    pub sentence_index: usize,

    /// Image embeddings, one row per timestep: [images_per_story][embedding_dim].
    /// Positions after the current image are all-zero vectors.
    pub image_embeddings: Vec<Vec<f32>>,

    /// Target token indices, zero-padded to the sentence length
    pub sentence: Vec<usize>,
}

impl StorySample {
    pub fn timesteps(&self) -> usize {
        self.image_embeddings.len()
    }

    pub fn embedding_dim(&self) -> usize {
        self.image_embeddings.first().map_or(0, Vec::len)
    }

    /// Flip the timestep order of the image embeddings in place.
    /// Zero padding moves along with everything else.
    pub fn reverse_images(&mut self) {
        self.image_embeddings.reverse();
    }

    /// 1.0 for timesteps holding a real embedding, 0.0 for zero padding.
    pub fn image_mask(&self) -> Vec<f32> {
        self.image_embeddings
            .iter()
            .map(|v| if v.iter().any(|&x| x != 0.0) { 1.0 } else { 0.0 })
            .collect()
    }

    /// Number of non-padding target tokens
    pub fn sentence_length(&self, pad_index: usize) -> usize {
        self.sentence.iter().filter(|&&t| t != pad_index).count()
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> StorySample {
        StorySample {
            story_index:      0,
            sentence_index:   1,
            image_embeddings: vec![vec![1.0, 2.0], vec![3.0, 0.0], vec![0.0, 0.0]],
            sentence:         vec![4, 5, 2, 0, 0],
        }
    }

    #[test]
    fn test_image_mask_marks_zero_rows() {
        assert_eq!(sample().image_mask(), vec![1.0, 1.0, 0.0]);
    }

    #[test]
    fn test_reverse_images_flips_order() {
        let mut s = sample();
        s.reverse_images();
        assert_eq!(s.image_embeddings[0], vec![0.0, 0.0]);
        assert_eq!(s.image_embeddings[2], vec![1.0, 2.0]);
        assert_eq!(s.image_mask(), vec![0.0, 1.0, 1.0]);
    }

    #[test]
    fn test_sentence_length_skips_padding() {
        assert_eq!(sample().sentence_length(0), 3);
        assert_eq!(sample().timesteps(), 3);
        assert_eq!(sample().embedding_dim(), 2);
    }
}
