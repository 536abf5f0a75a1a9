// ============================================================
// Layer 2 — TrainUseCase
// ============================================================
// Orchestrates one full training run in order:
//
//   Step 1: Stamp the start time, seed the backend
//   Step 2: Load vocabulary + datasets     (Layer 4 - data)
//   Step 3: Build train/valid generators   (Layer 4 - data)
//   Step 4: Build the seq2seq model        (Layer 5 - ml)
//   Step 5: Register callbacks             (Layer 6 - infra)
//   Step 6: Run the fit loop               (Layer 5 - ml)
//   Step 7: Save the final model           (Layer 6 - infra)
//   Step 8: Append the run report          (Layer 6 - infra)
//
// Reference: Rust Book §13 (Iterators and Closures)
//            Burn Book §5 (Training)

use anyhow::{Context, Result};
use burn::{prelude::*, tensor::backend::AutodiffBackend};
use chrono::Local;
use serde::{Deserialize, Serialize};
use std::{path::PathBuf, sync::Arc, time::Instant};

use crate::data::{dataset::StoryDataset, generator::ModelDataGenerator, vocabulary::Vocabulary};
use crate::domain::{cell_type::CellType, run_report::RunReport, traits::RunRecordSink};
use crate::infra::{
    checkpoint::ModelCheckpoint,
    clock::{format_duration, run_stamp},
    metrics::CsvLogger,
    model_store::{ModelManifest, ModelStore},
    report_writer::ReportWriter,
};
use crate::ml::{
    model::Seq2SeqConfig,
    trainer::{fit, Callbacks, FitConfig},
};

type TrainBackend = burn::backend::Autodiff<burn::backend::Wgpu>;

// ─── Training Configuration ──────────────────────────────────────────────────
// All paths and hyperparameters of a run. Built once from the CLI
// and only ever borrowed afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainConfig {
    pub vocabulary_path:     PathBuf,
    pub train_dataset:       PathBuf,
    pub valid_dataset:       PathBuf,
    pub checkpoint_dir:      PathBuf,
    pub loss_log_dir:        PathBuf,
    pub model_dir:           PathBuf,
    pub results_path:        PathBuf,
    pub batch_size:          usize,
    pub epochs:              usize,
    pub latent_dim:          usize,
    pub word_embedding_size: usize,
    pub num_layers:          usize,
    pub cell_type:           CellType,
    pub learning_rate:       f64,
    pub gradient_clip_value: f64,
    pub reverse:             bool,
    pub recurrent_dropout:   f64,
    pub masking:             bool,
    pub seed:                u64,
    pub notes:               String,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            vocabulary_path:     "./dataset/vist2017_vocabulary.json".into(),
            train_dataset:       "./dataset/image_embeddings_to_sentence/stories_to_index_train.npz".into(),
            valid_dataset:       "./dataset/image_embeddings_to_sentence/stories_to_index_valid.npz".into(),
            checkpoint_dir:      "./checkpoints".into(),
            loss_log_dir:        "./loss_logs".into(),
            model_dir:           "./trained_models".into(),
            results_path:        "./results/model_results.csv".into(),
            batch_size:          13,
            epochs:              100,
            latent_dim:          1024,
            word_embedding_size: 300,
            num_layers:          2,
            cell_type:           CellType::Gru,
            learning_rate:       0.0001,
            gradient_clip_value: 5.0,
            reverse:             false,
            recurrent_dropout:   0.2,
            masking:             true,
            seed:                42,
            notes:               String::new(),
        }
    }
}

// ─── TrainUseCase ─────────────────────────────────────────────────────────────
pub struct TrainUseCase {
    config: TrainConfig,
}

impl TrainUseCase {
    pub fn new(config: TrainConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &TrainConfig {
        &self.config
    }

    /// Train on the default GPU device
    pub fn execute(&self) -> Result<RunReport> {
        let device = burn::backend::wgpu::WgpuDevice::default();
        self.execute_on::<TrainBackend>(&device)
    }

    /// Execute the full training pipeline on any autodiff backend
    pub fn execute_on<B: AutodiffBackend>(&self, device: &B::Device) -> Result<RunReport> {
        let cfg = &self.config;

        // ── Step 1: Start stamp + seed ───────────────────────────────────────
        let started = Instant::now();
        let start   = run_stamp(&Local::now());
        B::seed(cfg.seed);
        tracing::info!("Run {start}: {} {} layer(s), latent={}", cfg.cell_type, cfg.num_layers, cfg.latent_dim);

        // ── Step 2: Load vocabulary and datasets ─────────────────────────────
        let vocabulary = Arc::new(
            Vocabulary::load(&cfg.vocabulary_path)
                .with_context(|| format!("Cannot load vocabulary '{}'", cfg.vocabulary_path.display()))?,
        );
        let train_set = Arc::new(
            StoryDataset::open(&cfg.train_dataset)
                .with_context(|| format!("Cannot open training set '{}'", cfg.train_dataset.display()))?,
        );
        let valid_set = Arc::new(
            StoryDataset::open(&cfg.valid_dataset)
                .with_context(|| format!("Cannot open validation set '{}'", cfg.valid_dataset.display()))?,
        );
        tracing::info!(
            "Vocabulary: {} tokens | train: {} stories | valid: {} stories",
            vocabulary.size(),
            train_set.story_count(),
            valid_set.story_count(),
        );

        for (split, set) in [("Training", &train_set), ("Validation", &valid_set)] {
            if let Some(max) = set.max_token_index() {
                anyhow::ensure!(
                    max < vocabulary.size(),
                    "{split} set uses token {max} but the vocabulary only has {} entries",
                    vocabulary.size(),
                );
            }
        }
        if valid_set.story_count() > 0 {
            anyhow::ensure!(
                valid_set.embedding_dim() == train_set.embedding_dim(),
                "Validation embeddings are {}-dimensional but training embeddings are {}",
                valid_set.embedding_dim(),
                train_set.embedding_dim(),
            );
        }

        // ── Step 3: Generators ───────────────────────────────────────────────
        let train = ModelDataGenerator::new(train_set.clone(), vocabulary.clone(), cfg.batch_size)
            .context("Cannot build training generator")?
            .with_reverse(cfg.reverse)
            .with_shuffle(true, cfg.seed);
        let valid = ModelDataGenerator::new(valid_set, vocabulary.clone(), cfg.batch_size)
            .context("Cannot build validation generator")?
            .with_reverse(cfg.reverse);

        // ── Step 4: Model ────────────────────────────────────────────────────
        let model_config = Seq2SeqConfig::new(
            vocabulary.size(),
            cfg.latent_dim,
            cfg.word_embedding_size,
            cfg.num_layers,
            train_set.embedding_dim(),
            cfg.cell_type,
        )
        .with_masking(cfg.masking)
        .with_recurrent_dropout(cfg.recurrent_dropout);
        let model = model_config.init::<B>(device);

        // ── Step 5: Callbacks ────────────────────────────────────────────────
        let loss_log = cfg.loss_log_dir.join(format!("{start}.csv"));
        let mut callbacks: Callbacks<B> = vec![
            Box::new(
                ModelCheckpoint::new(cfg.checkpoint_dir.join(format!("{start}checkpoint")))
                    .with_verbose(true),
            ),
            Box::new(CsvLogger::new(&loss_log)),
        ];

        // ── Step 6: Fit ──────────────────────────────────────────────────────
        let fit_config = FitConfig {
            epochs:              cfg.epochs,
            learning_rate:       cfg.learning_rate,
            gradient_clip_value: cfg.gradient_clip_value as f32,
        };
        let (model, history) = fit(model, &fit_config, &train, &valid, &mut callbacks, device)
            .context("Training failed")?;

        // ── Step 7: Save the final model ─────────────────────────────────────
        let end      = run_stamp(&Local::now());
        let manifest = ModelManifest {
            model:         model_config,
            reverse_input: cfg.reverse,
            sentence_len:  train_set.sentence_len(),
        };
        let model_path = ModelStore::new(&cfg.model_dir).save(&format!("{start}-{end}"), &model, &manifest)?;

        tracing::info!("loss history:     {:?}", history.loss);
        tracing::info!("val_loss history: {:?}", history.val_loss);

        // ── Step 8: Report ───────────────────────────────────────────────────
        let report = RunReport {
            num_samples:             train.sample_count(),
            duration:                format_duration(started.elapsed()),
            num_epochs:              cfg.epochs,
            loss:                    history.final_loss().unwrap_or(f64::NAN),
            val_loss:                history.final_val_loss_or_sentinel(),
            num_layers:              cfg.num_layers,
            cell_type:               cfg.cell_type.name().to_string(),
            activation:              "tanh".to_string(),
            hidden_dimension:        cfg.latent_dim,
            learning_rate:           cfg.learning_rate,
            gradient_clipping_value: cfg.gradient_clip_value,
            optimizer:               "adam".to_string(),
            loss_history_filename:   loss_log.display().to_string(),
            model_filename:          model_path.display().to_string(),
            reverse_sequence:        cfg.reverse,
            notes:                   cfg.notes.clone(),
        };
        ReportWriter::new(&cfg.results_path).append(&report)?;

        tracing::info!("Run {start} finished in {}", report.duration);
        Ok(report)
    }
}
