// ============================================================
// Layer 3 — Recurrent Cell Variants
// ============================================================
// The model builder supports a closed set of recurrent cells.
// The variant is picked once, when the configuration is built,
// and the ML layer matches on it when it creates the layers.
//
//   simplernn — basic tanh recurrence
//   gru       — gated recurrent unit, with recurrent dropout
//   cudnngru  — gated recurrent unit in its fused/accelerated
//               form: no recurrent dropout
//   lstm      — long short-term memory

use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum CellType {
    #[value(name = "simplernn")]
    SimpleRnn,
    #[value(name = "gru")]
    Gru,
    #[value(name = "cudnngru")]
    CudnnGru,
    #[value(name = "lstm")]
    Lstm,
}

impl CellType {
    /// Lower-case name written to the results log
    pub fn name(&self) -> &'static str {
        match self {
            CellType::SimpleRnn => "simplernn",
            CellType::Gru       => "gru",
            CellType::CudnnGru  => "cudnngru",
            CellType::Lstm      => "lstm",
        }
    }

    /// Whether the cell carries a memory cell next to its hidden state
    pub fn has_cell_state(&self) -> bool {
        matches!(self, CellType::Lstm)
    }

    /// The fused GRU kernel has no recurrent dropout
    pub fn supports_recurrent_dropout(&self) -> bool {
        !matches!(self, CellType::CudnnGru)
    }
}

impl fmt::Display for CellType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
