// ============================================================
// Layer 6 — Infrastructure Layer
// ============================================================
// Everything that writes to or reads from the filesystem on
// behalf of a training run:
//
//   checkpoint.rs    — ModelCheckpoint callback: snapshot on
//                      validation-loss improvement
//                      (Burn CompactRecorder)
//
//   metrics.rs       — CsvLogger callback: one row per epoch
//
//   model_store.rs   — Final model artifact: full-precision
//                      record + JSON manifest, and loading it
//                      back for generation
//
//   report_writer.rs — Appends the run summary row to the
//                      results CSV
//
//   clock.rs         — Filename timestamps and durations
//
// Reference: Rust Book §9 (Error Handling with anyhow)
//            Burn Book §5 (Checkpointing)

/// Best-validation-loss checkpoints
pub mod checkpoint;

/// Per-epoch loss CSV
pub mod metrics;

/// Final model save/load
pub mod model_store;

/// Results log
pub mod report_writer;

/// Run timestamps
pub mod clock;
