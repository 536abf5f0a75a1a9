// ============================================================
// Layer 4 — Data Pipeline
// ============================================================
// Everything from files on disk to tensor batches.
//
//   vocabulary.json ─► Vocabulary ─────────────┐
//                                              ▼
//   stories_*.npz   ─► StoryDataset ─► ModelDataGenerator ─► StoryBatcher ─► StoryBatch
//
// Each module is responsible for exactly one step.
//
// Reference: Burn Book §4 (Datasets and Dataloaders)
//            Rust Book §13 (Iterators and Closures)

/// Typed errors for the data layer
pub mod error;

/// Word ↔ index mapping
pub mod vocabulary;

/// Reads .npz story containers, implements Burn's Dataset trait
pub mod dataset;

/// Per-epoch batching, shuffling and input reversal
pub mod generator;

/// Implements Burn's Batcher trait to create tensor batches
pub mod batcher;
