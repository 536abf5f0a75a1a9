// ============================================================
// Layer 5 — Training Loop
// ============================================================
// Fixed-epoch train + validation loop with Adam and value
// gradient clipping.
//
// Every epoch:
//   1. one full pass over the training generator (shuffled)
//   2. one full pass over the validation generator on the
//      inner backend (model.valid(): no autodiff, no dropout)
//   3. the epoch logs go to the history and to every callback
//
// The loop itself never touches the filesystem — checkpoints
// and loss logs are callbacks.
//
// Reference: Burn Book §5, Kingma & Ba (2015) Adam

use anyhow::Result;
use burn::{
    data::dataloader::batcher::Batcher,
    grad_clipping::GradientClippingConfig,
    module::AutodiffModule,
    optim::{AdamConfig, GradientsParams, Optimizer},
    prelude::*,
    tensor::backend::AutodiffBackend,
};

use crate::data::{batcher::StoryBatcher, generator::ModelDataGenerator};
use crate::domain::history::{EpochLogs, History};
use crate::domain::traits::TrainingCallback;
use crate::ml::model::Seq2SeqModel;

/// Callbacks the fit loop notifies, boxed so different observers can mix
pub type Callbacks<B> = Vec<Box<dyn TrainingCallback<Seq2SeqModel<B>>>>;

#[derive(Debug, Clone)]
pub struct FitConfig {
    pub epochs:              usize,
    pub learning_rate:       f64,
    pub gradient_clip_value: f32,
}

impl FitConfig {
    pub fn optimizer(&self) -> AdamConfig {
        AdamConfig::new()
            .with_epsilon(1e-8)
            .with_grad_clipping(Some(GradientClippingConfig::Value(self.gradient_clip_value)))
    }
}

/// Train `model` and return it together with its loss history.
pub fn fit<B: AutodiffBackend>(
    mut model: Seq2SeqModel<B>,
    cfg:       &FitConfig,
    train:     &ModelDataGenerator,
    valid:     &ModelDataGenerator,
    callbacks: &mut Callbacks<B>,
    device:    &B::Device,
) -> Result<(Seq2SeqModel<B>, History)> {
    let mut optim = cfg.optimizer().init();

    let train_batcher = StoryBatcher::<B>::new(device.clone(), train.vocabulary());
    let valid_batcher = StoryBatcher::<B::InnerBackend>::new(device.clone(), valid.vocabulary());

    tracing::info!(
        "Training on {} samples ({} steps/epoch), validating on {} samples ({} steps)",
        train.sample_count(),
        train.steps_per_epoch(),
        valid.sample_count(),
        valid.steps_per_epoch(),
    );

    for callback in callbacks.iter_mut() {
        callback.on_train_begin()?;
    }

    let mut history = History::new();

    for epoch in 0..cfg.epochs {
        // ── Training phase ────────────────────────────────────────────────────
        let mut loss_sum = 0.0f64;
        let mut seen     = 0usize;

        for items in train.epoch(epoch) {
            if items.is_empty() {
                continue;
            }
            let size = items.len();
            let (loss, _) = model.forward_batch(train_batcher.batch(items));

            loss_sum += loss.clone().into_scalar().elem::<f64>() * size as f64;
            seen     += size;

            let grads = loss.backward();
            let grads = GradientsParams::from_grads(grads, &model);
            model = optim.step(cfg.learning_rate, model, grads);
        }

        let loss = if seen > 0 { loss_sum / seen as f64 } else { f64::NAN };

        // ── Validation phase ──────────────────────────────────────────────────
        let val_loss = if valid.sample_count() > 0 {
            Some(evaluate(&model.valid(), valid, &valid_batcher))
        } else {
            None
        };

        let logs = EpochLogs { epoch, loss, val_loss };
        match val_loss {
            Some(v) => println!("Epoch {:>3}/{} | loss={:.4} | val_loss={:.4}", epoch + 1, cfg.epochs, loss, v),
            None    => println!("Epoch {:>3}/{} | loss={:.4}", epoch + 1, cfg.epochs, loss),
        }

        history.record(&logs);
        for callback in callbacks.iter_mut() {
            callback.on_epoch_end(&logs, &model)?;
        }
    }

    for callback in callbacks.iter_mut() {
        callback.on_train_end(&history)?;
    }

    tracing::info!("Training complete after {} epochs", history.epochs());
    Ok((model, history))
}

/// Loss over one full, unshuffled pass of `generator`: the mean of the
/// batch losses weighted by batch size, so a short last batch counts
/// for what it holds.
pub fn evaluate<B: Backend>(
    model:     &Seq2SeqModel<B>,
    generator: &ModelDataGenerator,
    batcher:   &StoryBatcher<B>,
) -> f64 {
    let mut loss_sum = 0.0f64;
    let mut seen     = 0usize;
    for items in generator.epoch(0) {
        if items.is_empty() {
            continue;
        }
        let size = items.len();
        let (loss, _) = model.forward_batch(batcher.batch(items));
        loss_sum += loss.into_scalar().elem::<f64>() * size as f64;
        seen     += size;
    }
    if seen > 0 { loss_sum / seen as f64 } else { f64::NAN }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{dataset::fixtures, vocabulary::Vocabulary};
    use crate::domain::cell_type::CellType;
    use crate::ml::model::Seq2SeqConfig;
    use burn::backend::{Autodiff, NdArray};
    use std::{cell::RefCell, rc::Rc, sync::Arc};

    type TestBackend = Autodiff<NdArray>;

    /// Records every event it sees
    struct EventLog(Rc<RefCell<Vec<String>>>);

    impl<M> TrainingCallback<M> for EventLog {
        fn on_train_begin(&mut self) -> Result<()> {
            self.0.borrow_mut().push("begin".into());
            Ok(())
        }
        fn on_epoch_end(&mut self, logs: &EpochLogs, _model: &M) -> Result<()> {
            self.0.borrow_mut().push(format!("epoch {}", logs.epoch));
            Ok(())
        }
        fn on_train_end(&mut self, history: &History) -> Result<()> {
            self.0.borrow_mut().push(format!("end {}", history.epochs()));
            Ok(())
        }
    }

    fn generators(train_stories: usize, valid_stories: usize) -> (ModelDataGenerator, ModelDataGenerator) {
        let vocab = Arc::new(Vocabulary::from_json(fixtures::VOCAB_JSON).unwrap());
        let train = ModelDataGenerator::new(
            Arc::new(fixtures::dataset(train_stories, 3, 4, 5)), vocab.clone(), 4,
        )
        .unwrap()
        .with_shuffle(true, 1);
        let valid = ModelDataGenerator::new(
            Arc::new(fixtures::dataset(valid_stories, 3, 4, 5)), vocab, 4,
        )
        .unwrap();
        (train, valid)
    }

    fn model(device: &<TestBackend as Backend>::Device) -> Seq2SeqModel<TestBackend> {
        Seq2SeqConfig::new(8, 8, 4, 1, 4, CellType::Gru).init(device)
    }

    fn fit_config(epochs: usize) -> FitConfig {
        FitConfig { epochs, learning_rate: 1e-2, gradient_clip_value: 5.0 }
    }

    #[test]
    fn test_callbacks_are_notified_in_order() {
        let device = Default::default();
        let (train, valid) = generators(2, 1);
        let events = Rc::new(RefCell::new(Vec::new()));
        let mut callbacks: Callbacks<TestBackend> = vec![Box::new(EventLog(events.clone()))];

        let (_, history) = fit(model(&device), &fit_config(2), &train, &valid, &mut callbacks, &device).unwrap();

        assert_eq!(history.loss.len(), 2);
        assert_eq!(history.val_loss.len(), 2);
        assert_eq!(*events.borrow(), vec!["begin", "epoch 0", "epoch 1", "end 2"]);
    }

    #[test]
    fn test_empty_validation_leaves_val_history_empty() {
        let device = Default::default();
        let (train, valid) = generators(2, 0);
        let mut callbacks: Callbacks<TestBackend> = Vec::new();

        let (_, history) = fit(model(&device), &fit_config(1), &train, &valid, &mut callbacks, &device).unwrap();

        assert!(history.loss[0].is_finite());
        assert!(history.val_loss.is_empty());
        assert_eq!(history.final_val_loss_or_sentinel(), -1.0);
    }

    #[test]
    fn test_training_reduces_loss_on_a_tiny_set() {
        let device = Default::default();
        let (train, valid) = generators(2, 1);
        let mut callbacks: Callbacks<TestBackend> = Vec::new();

        let (_, history) = fit(model(&device), &fit_config(15), &train, &valid, &mut callbacks, &device).unwrap();

        let first = history.loss[0];
        let last  = history.final_loss().unwrap();
        assert!(last < first, "loss went from {first} to {last}");
    }

    #[test]
    fn test_evaluate_weights_batches_by_size() {
        type Inner = NdArray;
        let device = Default::default();
        let vocab  = Arc::new(Vocabulary::from_json(fixtures::VOCAB_JSON).unwrap());
        // 2 stories × 3 sentences, batches of 4 → sizes 4 and 2
        let generator = ModelDataGenerator::new(Arc::new(fixtures::dataset(2, 3, 4, 5)), vocab.clone(), 4)
            .unwrap();
        let batcher = StoryBatcher::<Inner>::new(device, &vocab);
        let model: Seq2SeqModel<Inner> = Seq2SeqConfig::new(8, 8, 4, 1, 4, CellType::Gru).init(&device);

        let batch_losses: Vec<(f64, usize)> = generator
            .epoch(0)
            .map(|items| {
                let size = items.len();
                let (loss, _) = model.forward_batch(batcher.batch(items));
                (loss.into_scalar().elem::<f64>(), size)
            })
            .collect();
        assert_eq!(batch_losses.iter().map(|&(_, n)| n).collect::<Vec<_>>(), vec![4, 2]);

        let weighted = batch_losses.iter().map(|&(l, n)| l * n as f64).sum::<f64>() / 6.0;
        let value    = evaluate(&model, &generator, &batcher);
        assert!((value - weighted).abs() < 1e-6, "{value} != {weighted}");
    }
}
