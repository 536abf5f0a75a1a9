// ============================================================
// Layer 1 — CLI Commands and Arguments
// ============================================================
// Defines the two subcommands: `train` and `generate`
// and all their configurable flags.
//
// clap's derive macros automatically generate:
//   - help text (--help)
//   - error messages for missing args
//   - type conversion (string → usize, f64, CellType, etc.)
//
// Reference: Rust Book §12 (Building a CLI Program)

use clap::{builder::RangedU64ValueParser, Args, Subcommand};
use std::path::PathBuf;

use crate::application::train_use_case::TrainConfig;
use crate::domain::cell_type::CellType;

/// The two top-level subcommands available to the user
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Train an image-sequence → sentence model
    Train(TrainArgs),

    /// Generate sentences for one story with a trained model
    Generate(GenerateArgs),
}

/// All arguments for the `train` command.
#[derive(Args, Debug)]
pub struct TrainArgs {
    /// Word → index JSON vocabulary
    #[arg(long, default_value = "./dataset/vist2017_vocabulary.json")]
    pub vocabulary: PathBuf,

    /// Training container (.npz with image_embeddings + story_sentences)
    #[arg(long, default_value = "./dataset/image_embeddings_to_sentence/stories_to_index_train.npz")]
    pub train_dataset: PathBuf,

    /// Validation container, same layout as the training one
    #[arg(long, default_value = "./dataset/image_embeddings_to_sentence/stories_to_index_valid.npz")]
    pub valid_dataset: PathBuf,

    /// Where best-val_loss snapshots are written
    #[arg(long, default_value = "./checkpoints")]
    pub checkpoint_dir: PathBuf,

    /// Where per-epoch loss CSVs are written
    #[arg(long, default_value = "./loss_logs")]
    pub loss_log_dir: PathBuf,

    /// Where the final model and its manifest are written
    #[arg(long, default_value = "./trained_models")]
    pub model_dir: PathBuf,

    /// Results log; one row is appended per run
    #[arg(long, default_value = "./results/model_results.csv")]
    pub results: PathBuf,

    /// Samples per gradient step (at least 1)
    #[arg(long, default_value_t = 13, value_parser = RangedU64ValueParser::<usize>::new().range(1..))]
    pub batch_size: usize,

    #[arg(long, default_value_t = 100)]
    pub epochs: usize,

    /// Hidden size of every recurrent layer
    #[arg(long, default_value_t = 1024)]
    pub latent_dim: usize,

    #[arg(long, default_value_t = 300)]
    pub word_embedding_size: usize,

    /// Stacked recurrent layers in both encoder and decoder
    #[arg(long, default_value_t = 2)]
    pub num_layers: usize,

    #[arg(long, value_enum, default_value_t = CellType::Gru)]
    pub cell_type: CellType,

    #[arg(long, default_value_t = 0.0001)]
    pub learning_rate: f64,

    /// Gradients are clipped element-wise to ±this value
    #[arg(long, default_value_t = 5.0)]
    pub gradient_clip_value: f64,

    /// Feed each story's images last-to-first
    #[arg(long)]
    pub reverse: bool,

    /// Dropout on the hidden state entering each recurrent step
    #[arg(long, default_value_t = 0.2)]
    pub recurrent_dropout: f64,

    /// Let zero image vectors and padding tokens update the state
    #[arg(long)]
    pub no_masking: bool,

    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    /// Free text copied into the results log
    #[arg(long, default_value = "")]
    pub notes: String,
}

/// Convert CLI TrainArgs into the application-layer TrainConfig.
/// This is the boundary between Layer 1 and Layer 2 —
/// the application layer never sees clap types.
impl From<TrainArgs> for TrainConfig {
    fn from(a: TrainArgs) -> Self {
        TrainConfig {
            vocabulary_path:     a.vocabulary,
            train_dataset:       a.train_dataset,
            valid_dataset:       a.valid_dataset,
            checkpoint_dir:      a.checkpoint_dir,
            loss_log_dir:        a.loss_log_dir,
            model_dir:           a.model_dir,
            results_path:        a.results,
            batch_size:          a.batch_size,
            epochs:              a.epochs,
            latent_dim:          a.latent_dim,
            word_embedding_size: a.word_embedding_size,
            num_layers:          a.num_layers,
            cell_type:           a.cell_type,
            learning_rate:       a.learning_rate,
            gradient_clip_value: a.gradient_clip_value,
            reverse:             a.reverse,
            recurrent_dropout:   a.recurrent_dropout,
            masking:             !a.no_masking,
            seed:                a.seed,
            notes:               a.notes,
        }
    }
}

/// All arguments for the `generate` command
#[derive(Args, Debug)]
pub struct GenerateArgs {
    /// Model record written by `train` (its .json manifest must sit next to it)
    #[arg(long)]
    pub model: PathBuf,

    #[arg(long, default_value = "./dataset/vist2017_vocabulary.json")]
    pub vocabulary: PathBuf,

    #[arg(long, default_value = "./dataset/image_embeddings_to_sentence/stories_to_index_valid.npz")]
    pub dataset: PathBuf,

    /// Index of the story within the dataset
    #[arg(long, default_value_t = 0)]
    pub story: usize,
}
