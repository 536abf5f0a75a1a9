// ============================================================
// Layer 3 — Domain Layer
// ============================================================
// Plain Rust structs, enums and traits describing what a
// training run is made of.
//
// Rules for this layer:
//   - NO Burn framework types allowed here
//   - NO file I/O
//   - Only plain Rust structs, enums, and traits
//
// Reference: Rust Book §5 (Structs), §10 (Traits)

// One (story-so-far, sentence) training pair
pub mod story;

// The closed set of recurrent cell variants
pub mod cell_type;

// Per-epoch logs and the accumulated loss history
pub mod history;

// The summary row appended to the results log
pub mod run_report;

// Callback and sink abstractions that other layers implement
pub mod traits;
