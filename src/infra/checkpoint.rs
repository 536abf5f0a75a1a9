// ============================================================
// Layer 6 — Model Checkpoint Callback
// ============================================================
// Saves the model whenever the validation loss improves on the
// best value seen so far in this run.
//
// Uses Burn's CompactRecorder (named MessagePack, half precision)
// so snapshots stay small. One file per run, overwritten on each
// improvement:
//
//   checkpoints/
//     2026-10-19_14:03:51checkpoint.mpk
//
// There is no resume logic: nothing reads these files back
// before training starts.
//
// Reference: Burn Book §5 (Records and Checkpointing)

use anyhow::{Context, Result};
use std::{fs, path::PathBuf};
use burn::{
    prelude::*,
    record::{CompactRecorder, FileRecorder, Recorder},
};

use crate::domain::history::EpochLogs;
use crate::domain::traits::TrainingCallback;
use crate::ml::model::Seq2SeqModel;

pub struct ModelCheckpoint {
    /// Target path without extension; the recorder adds it
    path:           PathBuf,
    save_best_only: bool,
    verbose:        bool,
    best:           f64,
}

impl ModelCheckpoint {
    /// Monitor `val_loss`, save only on improvement
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path:           path.into(),
            save_best_only: true,
            verbose:        false,
            best:           f64::INFINITY,
        }
    }

    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    pub fn with_save_best_only(mut self, save_best_only: bool) -> Self {
        self.save_best_only = save_best_only;
        self
    }

    /// Best monitored value so far (+∞ until the first save)
    pub fn best(&self) -> f64 {
        self.best
    }

    /// The file the recorder writes, extension included
    pub fn file_path<B: Backend>(&self) -> PathBuf {
        self.path.with_extension(<CompactRecorder as FileRecorder<B>>::file_extension())
    }

    fn save<B: Backend>(&self, model: &Seq2SeqModel<B>) -> Result<()> {
        if let Some(dir) = self.path.parent() {
            fs::create_dir_all(dir)
                .with_context(|| format!("Cannot create checkpoint dir '{}'", dir.display()))?;
        }
        CompactRecorder::new()
            .record(model.clone().into_record(), self.path.clone())
            .with_context(|| {
                format!("Failed to save checkpoint to '{}'", self.path.display())
            })?;
        Ok(())
    }
}

impl<B: Backend> TrainingCallback<Seq2SeqModel<B>> for ModelCheckpoint {
    fn on_epoch_end(&mut self, logs: &EpochLogs, model: &Seq2SeqModel<B>) -> Result<()> {
        let Some(current) = logs.val_loss else {
            tracing::warn!("Can save best model only with val_loss available, skipping.");
            return Ok(());
        };

        if !self.save_best_only {
            if self.verbose {
                tracing::info!(
                    "Epoch {:05}: saving model to {}",
                    logs.epoch + 1,
                    self.file_path::<B>().display()
                );
            }
            return self.save(model);
        }

        if current < self.best {
            if self.verbose {
                tracing::info!(
                    "Epoch {:05}: val_loss improved from {:.5} to {:.5}, saving model to {}",
                    logs.epoch + 1,
                    self.best,
                    current,
                    self.file_path::<B>().display()
                );
            }
            self.best = current;
            self.save(model)
        } else {
            if self.verbose {
                tracing::info!(
                    "Epoch {:05}: val_loss did not improve from {:.5}",
                    logs.epoch + 1,
                    self.best
                );
            }
            Ok(())
        }
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::cell_type::CellType;
    use crate::ml::model::Seq2SeqConfig;
    use burn::backend::NdArray;

    type TestBackend = NdArray;

    fn model() -> Seq2SeqModel<TestBackend> {
        Seq2SeqConfig::new(5, 3, 2, 1, 2, CellType::SimpleRnn).init(&Default::default())
    }

    fn logs(epoch: usize, val_loss: Option<f64>) -> EpochLogs {
        EpochLogs { epoch, loss: 1.0, val_loss }
    }

    #[test]
    fn test_saves_only_on_improvement() {
        let dir   = tempfile::tempdir().unwrap();
        let mut c = ModelCheckpoint::new(dir.path().join("runcheckpoint"));
        let file  = c.file_path::<TestBackend>();
        let m     = model();

        c.on_epoch_end(&logs(0, Some(2.0)), &m).unwrap();
        assert!(file.exists());
        assert_eq!(c.best(), 2.0);

        fs::remove_file(&file).unwrap();
        c.on_epoch_end(&logs(1, Some(2.5)), &m).unwrap();
        assert!(!file.exists());
        assert_eq!(c.best(), 2.0);

        c.on_epoch_end(&logs(2, Some(1.5)), &m).unwrap();
        assert!(file.exists());
        assert_eq!(c.best(), 1.5);
    }

    #[test]
    fn test_missing_val_loss_skips() {
        let dir   = tempfile::tempdir().unwrap();
        let mut c = ModelCheckpoint::new(dir.path().join("nested/ckpt")).with_verbose(true);
        c.on_epoch_end(&logs(0, None), &model()).unwrap();
        assert!(!c.file_path::<TestBackend>().exists());
        assert!(c.best().is_infinite());
    }

    #[test]
    fn test_save_every_epoch_when_not_best_only() {
        let dir   = tempfile::tempdir().unwrap();
        let mut c = ModelCheckpoint::new(dir.path().join("ckpt")).with_save_best_only(false);
        let file  = c.file_path::<TestBackend>();
        c.on_epoch_end(&logs(0, Some(3.0)), &model()).unwrap();
        fs::remove_file(&file).unwrap();
        c.on_epoch_end(&logs(1, Some(4.0)), &model()).unwrap();
        assert!(file.exists());
    }
}
