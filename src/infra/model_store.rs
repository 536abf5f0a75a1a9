// ============================================================
// Layer 6 — Model Store
// ============================================================
// Persists the final model artifact: learned parameters plus
// enough topology to rebuild the network before loading them.
//
//   trained_models/
//     <start>-<end>.mpk    ← parameters (full precision)
//     <start>-<end>.json   ← manifest: Seq2SeqConfig + input order
//
// The manifest is written next to the record with the same
// stem, so a single model path is all a reader needs.
//
// Reference: Burn Book §5 (Records and Checkpointing)

use anyhow::{Context, Result};
use burn::{
    prelude::*,
    record::{FileRecorder, FullPrecisionSettings, NamedMpkFileRecorder, Recorder},
};
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::ml::model::{Seq2SeqConfig, Seq2SeqModel};

type ModelRecorder = NamedMpkFileRecorder<FullPrecisionSettings>;

/// Topology and input conventions of a saved model
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelManifest {
    pub model:         Seq2SeqConfig,
    pub reverse_input: bool,
    pub sentence_len:  usize,
}

pub struct ModelStore {
    dir: PathBuf,
}

impl ModelStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Path the record for `stem` ends up at
    pub fn model_path<B: Backend>(&self, stem: &str) -> PathBuf {
        self.dir
            .join(stem)
            .with_extension(<ModelRecorder as FileRecorder<B>>::file_extension())
    }

    /// Write record and manifest; returns the record path actually written.
    pub fn save<B: Backend>(
        &self,
        stem:     &str,
        model:    &Seq2SeqModel<B>,
        manifest: &ModelManifest,
    ) -> Result<PathBuf> {
        fs::create_dir_all(&self.dir)
            .with_context(|| format!("Cannot create model dir '{}'", self.dir.display()))?;

        let path = self.model_path::<B>(stem);
        ModelRecorder::new()
            .record(model.clone().into_record(), path.clone())
            .with_context(|| format!("Failed to save model to '{}'", path.display()))?;

        let manifest_path = path.with_extension("json");
        fs::write(&manifest_path, serde_json::to_string_pretty(manifest)?)
            .with_context(|| format!("Cannot write manifest '{}'", manifest_path.display()))?;

        tracing::info!("Saved model to '{}'", path.display());
        Ok(path)
    }

    /// Rebuild a model from a record path written by [`ModelStore::save`].
    pub fn load<B: Backend>(
        model_path: impl AsRef<Path>,
        device:     &B::Device,
    ) -> Result<(Seq2SeqModel<B>, ModelManifest)> {
        let model_path    = model_path.as_ref();
        let manifest_path = model_path.with_extension("json");

        let json = fs::read_to_string(&manifest_path).with_context(|| {
            format!("Cannot read model manifest '{}'", manifest_path.display())
        })?;
        let manifest: ModelManifest = serde_json::from_str(&json)
            .with_context(|| format!("Malformed model manifest '{}'", manifest_path.display()))?;

        let record = ModelRecorder::new()
            .load(model_path.to_path_buf(), device)
            .with_context(|| format!("Cannot load model '{}'", model_path.display()))?;

        let model = manifest.model.init::<B>(device).load_record(record);
        tracing::info!("Loaded model from '{}'", model_path.display());
        Ok((model, manifest))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::cell_type::CellType;
    use burn::backend::NdArray;

    type TestBackend = NdArray;

    #[test]
    fn test_save_then_load_restores_weights() {
        let dir    = tempfile::tempdir().unwrap();
        let store  = ModelStore::new(dir.path().join("trained_models"));
        let device = Default::default();
        let cfg    = Seq2SeqConfig::new(6, 4, 3, 2, 5, CellType::CudnnGru);
        let model: Seq2SeqModel<TestBackend> = cfg.init(&device);
        let manifest = ModelManifest { model: cfg, reverse_input: true, sentence_len: 7 };

        let path = store.save("a-b", &model, &manifest).unwrap();
        assert_eq!(path, store.model_path::<TestBackend>("a-b"));
        assert!(path.exists());
        assert!(path.with_extension("json").exists());

        let (loaded, manifest) = ModelStore::load::<TestBackend>(&path, &device).unwrap();
        assert!(manifest.reverse_input);
        assert_eq!(manifest.sentence_len, 7);

        let images = Tensor::<TestBackend, 3>::ones([1, 2, 5], &device);
        let words  = Tensor::<TestBackend, 2, Int>::ones([1, 3], &device);
        let a: Vec<f32> = model.forward(images.clone(), None, words.clone(), None).into_data().to_vec().unwrap();
        let b: Vec<f32> = loaded.forward(images, None, words, None).into_data().to_vec().unwrap();
        assert!(a.iter().zip(&b).all(|(x, y)| (x - y).abs() < 1e-6));
    }

    #[test]
    fn test_load_without_manifest_fails() {
        let dir = tempfile::tempdir().unwrap();
        let err = ModelStore::load::<TestBackend>(dir.path().join("missing.mpk"), &Default::default());
        assert!(err.is_err());
    }
}
