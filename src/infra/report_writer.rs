// ============================================================
// Layer 6 — Report Writer
// ============================================================
// Appends one summary row per training run to the results
// log (results/model_results.csv). Rows are never rewritten;
// the header goes in only when the file is new or empty.
//
// Uses the csv crate so free-text fields (notes, paths) are
// quoted correctly.

use anyhow::{Context, Result};
use std::{
    fs::{self, OpenOptions},
    path::{Path, PathBuf},
};

use crate::domain::run_report::RunReport;
use crate::domain::traits::RunRecordSink;

pub struct ReportWriter {
    path: PathBuf,
}

impl ReportWriter {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn write(&self, report: &RunReport) -> Result<()> {
        if let Some(dir) = self.path.parent() {
            fs::create_dir_all(dir)
                .with_context(|| format!("Cannot create results dir '{}'", dir.display()))?;
        }

        let needs_header = fs::metadata(&self.path).map(|m| m.len() == 0).unwrap_or(true);
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .with_context(|| format!("Cannot open results log '{}'", self.path.display()))?;

        let mut writer = csv::WriterBuilder::new()
            .has_headers(needs_header)
            .from_writer(file);
        writer.serialize(report)?;
        writer.flush()?;

        tracing::info!("Appended run report to '{}'", self.path.display());
        Ok(())
    }

    /// Every row written so far, oldest first
    pub fn read_all(&self) -> Result<Vec<RunReport>> {
        let mut reader = csv::Reader::from_path(&self.path)
            .with_context(|| format!("Cannot read results log '{}'", self.path.display()))?;
        let rows = reader.deserialize().collect::<Result<Vec<RunReport>, _>>()?;
        Ok(rows)
    }
}

impl RunRecordSink for ReportWriter {
    fn append(&self, report: &RunReport) -> Result<()> {
        self.write(report)
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    fn report(notes: &str) -> RunReport {
        RunReport {
            num_samples:             65,
            duration:                "00:01:02".into(),
            num_epochs:              100,
            loss:                    1.25,
            val_loss:                -1.0,
            num_layers:              2,
            cell_type:               "gru".into(),
            activation:              "tanh".into(),
            hidden_dimension:        1024,
            learning_rate:           0.0001,
            gradient_clipping_value: 5.0,
            optimizer:               "adam".into(),
            loss_history_filename:   "./loss_logs/x.csv".into(),
            model_filename:          "./trained_models/x-y.mpk".into(),
            reverse_sequence:        false,
            notes:                   notes.into(),
        }
    }

    #[test]
    fn test_rows_are_appended_with_one_header() {
        let dir    = tempfile::tempdir().unwrap();
        let writer = ReportWriter::new(dir.path().join("results/model_results.csv"));
        writer.write(&report("first")).unwrap();
        writer.append(&report("second, with a comma")).unwrap();

        let text = fs::read_to_string(writer.path()).unwrap();
        assert_eq!(text.matches("num_samples").count(), 1);

        let rows = writer.read_all().unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].notes, "first");
        assert_eq!(rows[1], report("second, with a comma"));
    }

    #[test]
    fn test_header_lists_fields_in_order() {
        let dir    = tempfile::tempdir().unwrap();
        let writer = ReportWriter::new(dir.path().join("r.csv"));
        writer.write(&report("")).unwrap();
        let text = fs::read_to_string(writer.path()).unwrap();
        assert!(text.starts_with(
            "num_samples,duration,num_epochs,loss,val_loss,num_layers,cell_type,activation,\
             hidden_dimension,learning_rate,gradient_clipping_value,optimizer,\
             loss_history_filename,model_filename,reverse_sequence,notes\n"
        ));
    }
}
