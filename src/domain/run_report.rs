// ============================================================
// Layer 3 — Run Report
// ============================================================
// One row of the results log. Field order here is the column
// order in the CSV file.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunReport {
    pub num_samples:             usize,
    pub duration:                String,
    pub num_epochs:              usize,
    pub loss:                    f64,
    pub val_loss:                f64,
    pub num_layers:              usize,
    pub cell_type:               String,
    pub activation:              String,
    pub hidden_dimension:        usize,
    pub learning_rate:           f64,
    pub gradient_clipping_value: f64,
    pub optimizer:               String,
    pub loss_history_filename:   String,
    pub model_filename:          String,
    pub reverse_sequence:        bool,
    pub notes:                   String,
}
