// ============================================================
// Layer 6 — CSV Loss Logger
// ============================================================
// Records the loss of every epoch to a CSV file so learning
// curves can be plotted after the run.
//
// Output file: loss_logs/<start>.csv
//
// Example:
//   epoch,loss,val_loss
//   0,4.812300,4.511020
//   1,4.102551,4.009114
//
// Epochs are 0-based. A run without validation data writes NA
// in the val_loss column.
//
// append = false truncates the file when training begins,
// append = true keeps earlier rows and only writes the header
// if the file is new or empty.
//
// Reference: Rust Book §12 (I/O and File Handling)

use anyhow::{Context, Result};
use std::{
    fs::{self, OpenOptions},
    io::Write,
    path::{Path, PathBuf},
};

use crate::domain::history::EpochLogs;
use crate::domain::traits::TrainingCallback;

pub const HEADER: [&str; 3] = ["epoch", "loss", "val_loss"];

pub struct CsvLogger {
    csv_path:  PathBuf,
    separator: char,
    append:    bool,
}

impl CsvLogger {
    pub fn new(csv_path: impl Into<PathBuf>) -> Self {
        Self { csv_path: csv_path.into(), separator: ',', append: false }
    }

    pub fn with_separator(mut self, separator: char) -> Self {
        self.separator = separator;
        self
    }

    pub fn with_append(mut self, append: bool) -> Self {
        self.append = append;
        self
    }

    pub fn csv_path(&self) -> &Path {
        &self.csv_path
    }

    fn open(&self, truncate: bool) -> Result<fs::File> {
        OpenOptions::new()
            .create(true)
            .write(true)
            .append(!truncate)
            .truncate(truncate)
            .open(&self.csv_path)
            .with_context(|| format!("Cannot open loss log '{}'", self.csv_path.display()))
    }
}

impl<M> TrainingCallback<M> for CsvLogger {
    fn on_train_begin(&mut self) -> Result<()> {
        if let Some(dir) = self.csv_path.parent() {
            fs::create_dir_all(dir)
                .with_context(|| format!("Cannot create loss log dir '{}'", dir.display()))?;
        }

        let is_empty = fs::metadata(&self.csv_path).map(|m| m.len() == 0).unwrap_or(true);
        let mut f = self.open(!self.append)?;
        if !self.append || is_empty {
            writeln!(f, "{}", HEADER.join(&self.separator.to_string()))?;
            tracing::debug!("Created loss log: '{}'", self.csv_path.display());
        }
        Ok(())
    }

    fn on_epoch_end(&mut self, logs: &EpochLogs, _model: &M) -> Result<()> {
        let mut f = self.open(false)?;
        let val_loss = logs
            .val_loss
            .map(|v| format!("{v:.6}"))
            .unwrap_or_else(|| "NA".to_string());
        let sep = self.separator;
        writeln!(f, "{}{sep}{:.6}{sep}{}", logs.epoch, logs.loss, val_loss)?;

        tracing::debug!(
            "Logged epoch {} losses: loss={:.4}, val_loss={}",
            logs.epoch,
            logs.loss,
            val_loss,
        );
        Ok(())
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    fn run(logger: &mut CsvLogger, epochs: &[EpochLogs]) {
        TrainingCallback::<()>::on_train_begin(logger).unwrap();
        for logs in epochs {
            logger.on_epoch_end(logs, &()).unwrap();
        }
    }

    #[test]
    fn test_writes_header_and_rows() {
        let dir        = tempfile::tempdir().unwrap();
        let mut logger = CsvLogger::new(dir.path().join("logs/run.csv"));
        run(&mut logger, &[
            EpochLogs { epoch: 0, loss: 2.5, val_loss: Some(2.75) },
            EpochLogs { epoch: 1, loss: 2.0, val_loss: None },
        ]);
        let text = fs::read_to_string(logger.csv_path()).unwrap();
        assert_eq!(text, "epoch,loss,val_loss\n0,2.500000,2.750000\n1,2.000000,NA\n");
    }

    #[test]
    fn test_no_append_truncates_previous_run() {
        let dir        = tempfile::tempdir().unwrap();
        let mut logger = CsvLogger::new(dir.path().join("run.csv"));
        let one = [EpochLogs { epoch: 0, loss: 1.0, val_loss: None }];
        run(&mut logger, &one);
        run(&mut logger, &one);
        let text = fs::read_to_string(logger.csv_path()).unwrap();
        assert_eq!(text.lines().count(), 2);
    }

    #[test]
    fn test_unwritable_log_dir_names_the_path() {
        let dir     = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("not_a_dir");
        fs::write(&blocker, "").unwrap();
        let mut logger = CsvLogger::new(blocker.join("run.csv"));

        let err = TrainingCallback::<()>::on_train_begin(&mut logger).unwrap_err();
        assert!(format!("{err:#}").contains("Cannot create loss log dir"));
    }

    #[test]
    fn test_append_keeps_rows_and_single_header() {
        let dir        = tempfile::tempdir().unwrap();
        let mut logger = CsvLogger::new(dir.path().join("run.csv"))
            .with_append(true)
            .with_separator(';');
        let one = [EpochLogs { epoch: 0, loss: 1.0, val_loss: Some(1.0) }];
        run(&mut logger, &one);
        run(&mut logger, &one);
        let text = fs::read_to_string(logger.csv_path()).unwrap();
        assert_eq!(text, "epoch;loss;val_loss\n0;1.000000;1.000000\n0;1.000000;1.000000\n");
    }
}
