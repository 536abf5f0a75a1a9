// ============================================================
// Layer 3 — Epoch Logs and Training History
// ============================================================
// EpochLogs is what the fit loop hands to every callback at the
// end of an epoch. History accumulates the same numbers for the
// whole run and is returned when training finishes.

use serde::{Deserialize, Serialize};

/// Value written to the results log when no validation loss exists.
pub const MISSING_VAL_LOSS: f64 = -1.0;

/// Metrics for a single finished epoch.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EpochLogs {
    /// 0-based epoch index
    pub epoch: usize,

    /// Mean training loss over all batches of the epoch
    pub loss: f64,

    /// Mean validation loss, `None` when the validation split is empty
    pub val_loss: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct History {
    pub loss:     Vec<f64>,
    pub val_loss: Vec<f64>,
}

impl History {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, logs: &EpochLogs) {
        self.loss.push(logs.loss);
        if let Some(v) = logs.val_loss {
            self.val_loss.push(v);
        }
    }

    pub fn epochs(&self) -> usize {
        self.loss.len()
    }

    pub fn final_loss(&self) -> Option<f64> {
        self.loss.last().copied()
    }

    /// Last validation loss, or the `-1` sentinel when validation never ran.
    /// Only emptiness is checked: a recorded NaN is reported as NaN.
    pub fn final_val_loss_or_sentinel(&self) -> f64 {
        self.val_loss.last().copied().unwrap_or(MISSING_VAL_LOSS)
    }
}
