// ============================================================
// Layer 1 — CLI / Presentation Layer
// ============================================================
// This is the entry point for all user interaction.
// It uses the `clap` crate to parse command line arguments.
// All business logic is delegated to Layer 2 (application).
//
// Two commands are supported:
//   1. `train`    — trains a model and appends a results row
//   2. `generate` — loads a model and decodes one story
//
// Reference: Rust Book §7 (Modules), §12 (CLI programs)

pub mod commands;

use anyhow::Result;
use clap::Parser;
use commands::{Commands, GenerateArgs, TrainArgs};

/// The main CLI struct — clap reads the fields and generates
/// argument parsing code automatically via the Parser derive macro.
#[derive(Parser, Debug)]
#[command(
    name = "visual-story-seq2seq",
    version,
    about = "Train a recurrent encoder-decoder that writes a sentence for each image of a story."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Match on the subcommand and dispatch to the correct use case.
    pub fn run(self) -> Result<()> {
        match self.command {
            Commands::Train(args)    => run_train(args),
            Commands::Generate(args) => run_generate(args),
        }
    }
}

fn run_train(args: TrainArgs) -> Result<()> {
    use crate::application::train_use_case::TrainUseCase;

    tracing::info!("Starting training on: {}", args.train_dataset.display());

    let use_case = TrainUseCase::new(args.into());
    let report   = use_case.execute()?;

    println!(
        "Training complete in {}. loss={:.4} val_loss={:.4}",
        report.duration, report.loss, report.val_loss
    );
    println!("Model saved to {}", report.model_filename);
    Ok(())
}

fn run_generate(args: GenerateArgs) -> Result<()> {
    use crate::application::generate_use_case::GenerateUseCase;

    let use_case  = GenerateUseCase::new(args.model, args.vocabulary, args.dataset);
    let sentences = use_case.execute(args.story)?;

    for s in sentences {
        println!("[{}] {}", s.sentence_index, s.generated);
        println!("    reference: {}", s.reference);
    }
    Ok(())
}
