// ============================================================
// Layer 5 — ML / Model Layer (Burn)
// ============================================================
// Model topology, loss, training loop and greedy decoding.
//
//   recurrent.rs  — SimpleRNN / GRU / LSTM layers, stacked,
//                   with step-wise masking and recurrent dropout
//
//   model.rs      — Seq2SeqConfig (the model builder) and
//                   Seq2SeqModel: image encoder → word decoder
//                   → softmax over the vocabulary; categorical
//                   cross-entropy with padding excluded
//
//   trainer.rs    — The fit loop: Adam + gradient clipping,
//                   validation pass, callback notifications
//
//   inferencer.rs — Greedy decoding of a sentence for a story
//
// Reference: Burn Book §3 (Building Blocks)
//            Burn Book §5 (Training)
//            Sutskever et al. (2014) Sequence to Sequence Learning

/// Stacked recurrent layers for every supported cell kind
pub mod recurrent;

/// Encoder–decoder architecture and loss
pub mod model;

/// Fixed-epoch training loop with callbacks
pub mod trainer;

/// Greedy sentence decoding
pub mod inferencer;
