// ============================================================
// Layer 3 — Core Traits (Abstractions)
// ============================================================
// The fit loop and the training driver only talk to these
// traits. Concrete checkpointing, CSV logging and report
// writing live in the infrastructure layer.
//
// Reference: Rust Book §10 (Traits: Defining Shared Behaviour)

use anyhow::Result;

use crate::domain::history::{EpochLogs, History};
use crate::domain::run_report::RunReport;

// ─── TrainingCallback ─────────────────────────────────────────────────────────
/// Observer of the training loop lifecycle.
///
/// `M` is the model type being trained, so callbacks that persist
/// the model (checkpoints) can see it without this layer knowing
/// anything about Burn.
///
/// Implementations:
///   - ModelCheckpoint → saves the model when val_loss improves
///   - CsvLogger       → writes one CSV row per epoch
pub trait TrainingCallback<M> {
    /// Called once before the first epoch
    fn on_train_begin(&mut self) -> Result<()> {
        Ok(())
    }

    /// Called after every epoch, once training and validation are done
    fn on_epoch_end(&mut self, logs: &EpochLogs, model: &M) -> Result<()>;

    /// Called once after the last epoch
    fn on_train_end(&mut self, _history: &History) -> Result<()> {
        Ok(())
    }
}

// ─── RunRecordSink ────────────────────────────────────────────────────────────
/// Somewhere a finished run can be recorded.
///
/// Implementations:
///   - ReportWriter → appends a row to a CSV file
pub trait RunRecordSink {
    fn append(&self, report: &RunReport) -> Result<()>;
}
