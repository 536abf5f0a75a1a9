use burn::{
    nn::{Dropout, DropoutConfig, Embedding, EmbeddingConfig, Linear, LinearConfig},
    prelude::*,
    tensor::activation,
};

use crate::data::batcher::StoryBatch;
use crate::domain::cell_type::CellType;
use crate::ml::recurrent::StackedRecurrent;

// NOTE: #[derive(Config)] already generates Clone and Serialize/Deserialize
// internally — do NOT add them again or you get conflicting impls.
#[derive(Config, Debug)]
pub struct Seq2SeqConfig {
    /// Vocabulary size; width of the softmax output
    pub num_tokens:          usize,
    pub latent_dim:          usize,
    pub word_embedding_size: usize,
    pub num_layers:          usize,
    pub image_embedding_dim: usize,
    pub cell_type:           CellType,
    #[config(default = true)]
    pub masking:             bool,
    #[config(default = 0.2)]
    pub recurrent_dropout:   f64,
}

impl Seq2SeqConfig {
    pub fn init<B: Backend>(&self, device: &B::Device) -> Seq2SeqModel<B> {
        let encoder = StackedRecurrent::new(
            self.cell_type,
            self.image_embedding_dim,
            self.latent_dim,
            self.num_layers,
            self.recurrent_dropout,
            device,
        );
        let word_embedding = EmbeddingConfig::new(self.num_tokens, self.word_embedding_size).init(device);
        let decoder = StackedRecurrent::new(
            self.cell_type,
            self.word_embedding_size,
            self.latent_dim,
            self.num_layers,
            self.recurrent_dropout,
            device,
        );
        let dropout = DropoutConfig::new(self.recurrent_dropout).init();
        let output  = LinearConfig::new(self.latent_dim, self.num_tokens).init(device);
        Seq2SeqModel {
            encoder,
            word_embedding,
            decoder,
            dropout,
            output,
            num_tokens: self.num_tokens,
            masking:    self.masking,
        }
    }
}

/// Encoder over image embeddings, decoder over words.
///
/// The final state of encoder layer `i` seeds decoder layer `i`,
/// so both stacks share depth, width and cell kind.
#[derive(Module, Debug)]
pub struct Seq2SeqModel<B: Backend> {
    pub encoder:        StackedRecurrent<B>,
    pub word_embedding: Embedding<B>,
    pub decoder:        StackedRecurrent<B>,
    pub dropout:        Dropout,
    pub output:         Linear<B>,
    pub num_tokens:     usize,
    pub masking:        bool,
}

impl<B: Backend> Seq2SeqModel<B> {
    /// images: [batch, img_steps, img_dim], decoder_inputs: [batch, sent_len]
    /// → logits: [batch, sent_len, num_tokens]
    pub fn forward(
        &self,
        images:         Tensor<B, 3>,
        image_mask:     Option<Tensor<B, 2>>,
        decoder_inputs: Tensor<B, 2, Int>,
        decoder_mask:   Option<Tensor<B, 2>>,
    ) -> Tensor<B, 3> {
        let (image_mask, decoder_mask) = if self.masking {
            (image_mask, decoder_mask)
        } else {
            (None, None)
        };

        let (_, encoder_states) = self.encoder.forward(images, image_mask, None);

        let words = self.word_embedding.forward(decoder_inputs);
        let (decoded, _) = self.decoder.forward(words, decoder_mask, Some(encoder_states));

        self.output.forward(self.dropout.forward(decoded))
    }

    pub fn forward_batch(&self, batch: StoryBatch<B>) -> (Tensor<B, 1>, Tensor<B, 3>) {
        let logits = self.forward(
            batch.images,
            Some(batch.image_mask),
            batch.decoder_inputs,
            Some(batch.decoder_mask),
        );
        let loss = categorical_cross_entropy(logits.clone(), batch.targets);
        (loss, logits)
    }

    pub fn num_tokens(&self) -> usize {
        self.num_tokens
    }
}

/// Cross-entropy against one-hot targets, averaged over the target
/// rows that actually hold a token. All-zero rows (padding) add nothing
/// to the sum and nothing to the count.
pub fn categorical_cross_entropy<B: Backend>(
    logits:  Tensor<B, 3>,
    targets: Tensor<B, 3>,
) -> Tensor<B, 1> {
    let log_probs   = activation::log_softmax(logits, 2);
    let token_count = targets.clone().sum().clamp_min(1.0);
    (targets * log_probs).sum().neg() / token_count
}
