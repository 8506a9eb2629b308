//! Batch orchestration for a full preparation run
//!
//! Wires the components end to end: reference table, fold assignment,
//! output tree, then a single sequential pass writing every record's
//! processed waveform and label. Each fold's test list is enumerated first
//! (with per-class duplicates), then its combined list. The first failure
//! aborts the whole run; a partially written tree carries no completion
//! marker.

use anyhow::{Context, Result};
use log::info;
use serde::Serialize;

use crate::config::PrepConfig;
use crate::folds::{assign_folds, FoldPlan};
use crate::layout::FoldLayout;
use crate::npy;
use crate::processing;
use crate::reference::{class_lookup, load_reference, RecordEntry};
use crate::signal;

/// Completion report of a successful run
#[derive(Debug, Clone, Serialize)]
pub struct PrepReport {
    pub records: usize,
    pub n_folds: usize,
    pub seed: u64,
    pub test_counts: Vec<usize>,
    pub combined_counts: Vec<usize>,
}

/// Single-pass fold preparation job
pub struct PrepRunner {
    config: PrepConfig,
}

impl PrepRunner {
    pub fn new(config: PrepConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PrepConfig {
        &self.config
    }

    /// Load the reference table and compute the fold assignment
    ///
    /// Touches nothing on disk beyond reading the CSV; backs both the
    /// `plan` command and the dry-run path.
    pub fn plan(&self) -> Result<(Vec<RecordEntry>, FoldPlan)> {
        let entries = load_reference(&self.config.inputs.reference_csv)?;
        let plan = assign_folds(&entries, self.config.folds.n_folds, self.config.folds.seed)?;
        Ok((entries, plan))
    }

    /// Load one record and run the processing pipeline on it
    pub fn load_and_process(&self, record: &str) -> Result<Vec<f32>> {
        let raw = signal::load_record(
            &self.config.inputs.mat_dir,
            &self.config.inputs.hea_dir,
            record,
        )
        .with_context(|| format!("loading record '{record}'"))?;
        Ok(processing::run(&raw))
    }

    /// Full run: destroy and rebuild the output tree, then persist every
    /// record of every fold
    pub fn run(&self) -> Result<PrepReport> {
        let (entries, plan) = self.plan()?;
        let classes = class_lookup(&entries);

        let layout = FoldLayout::new(self.config.output.root.clone(), plan.n_folds());
        layout.reset()?;
        layout.create_all()?;

        let mut test_counts = Vec::with_capacity(plan.n_folds());
        let mut combined_counts = Vec::with_capacity(plan.n_folds());

        for fold in 0..plan.n_folds() {
            let test = plan.test_records(fold);
            for (idx, record) in test.iter().enumerate() {
                let class = *classes
                    .get(*record)
                    .with_context(|| format!("record '{record}' missing from reference lookup"))?;
                let processed = self.load_and_process(record)?;

                let (data_path, label_path) = layout.test_paths(fold, idx);
                npy::write_f32_1d(&data_path, &processed)
                    .with_context(|| format!("writing {}", data_path.display()))?;
                npy::write_i64_scalar(&label_path, class.label())
                    .with_context(|| format!("writing {}", label_path.display()))?;

                let (class_data, class_label) = layout.class_paths(fold, class, idx);
                npy::write_f32_1d(&class_data, &processed)
                    .with_context(|| format!("writing {}", class_data.display()))?;
                npy::write_i64_scalar(&class_label, class.label())
                    .with_context(|| format!("writing {}", class_label.display()))?;
            }
            info!(
                "[Prep] {}: wrote {} test records",
                FoldLayout::test_dir_name(fold),
                test.len()
            );
            test_counts.push(test.len());

            let combined = plan.combined_records(fold);
            for (idx, record) in combined.iter().enumerate() {
                let class = *classes
                    .get(*record)
                    .with_context(|| format!("record '{record}' missing from reference lookup"))?;
                let processed = self.load_and_process(record)?;

                let (data_path, label_path) = layout.combined_paths(fold, idx);
                npy::write_f32_1d(&data_path, &processed)
                    .with_context(|| format!("writing {}", data_path.display()))?;
                npy::write_i64_scalar(&label_path, class.label())
                    .with_context(|| format!("writing {}", label_path.display()))?;
            }
            info!(
                "[Prep] {}: wrote {} train records",
                layout.combined_dir_name(fold),
                combined.len()
            );
            combined_counts.push(combined.len());
        }

        info!(
            "[Prep] Fold preparation complete: {} records across {} folds under {}",
            entries.len(),
            plan.n_folds(),
            layout.root().display()
        );

        Ok(PrepReport {
            records: entries.len(),
            n_folds: plan.n_folds(),
            seed: plan.seed(),
            test_counts,
            combined_counts,
        })
    }
}
