//! Reference table loader
//!
//! The reference table is a headerless two-column CSV mapping record
//! identifiers to single-character rhythm labels. Rows with labels outside
//! the known set are silently dropped (documented filter behavior, not an
//! error); the surviving rows keep their file order because the fold
//! assignment depends on it.

use std::collections::HashMap;
use std::path::Path;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::error::DatasetError;

/// Rhythm class of an ECG record
///
/// The integer labels (0/1/2) and the per-class output directory names are
/// fixed by the downstream training layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RhythmClass {
    /// Normal sinus rhythm (label `N`)
    Normal,
    /// Atrial fibrillation (label `A`)
    Af,
    /// Other rhythm (label `O`)
    Other,
}

impl RhythmClass {
    /// All classes in label order
    pub const ALL: [RhythmClass; 3] = [RhythmClass::Normal, RhythmClass::Af, RhythmClass::Other];

    /// Map a reference-table symbol to a class, if known
    pub fn from_symbol(symbol: &str) -> Option<Self> {
        match symbol {
            "N" => Some(RhythmClass::Normal),
            "A" => Some(RhythmClass::Af),
            "O" => Some(RhythmClass::Other),
            _ => None,
        }
    }

    /// Integer label persisted next to each waveform
    pub fn label(&self) -> i64 {
        match self {
            RhythmClass::Normal => 0,
            RhythmClass::Af => 1,
            RhythmClass::Other => 2,
        }
    }

    /// Per-class subdirectory name in the test-fold tree
    pub fn dir_name(&self) -> &'static str {
        match self {
            RhythmClass::Normal => "normal",
            RhythmClass::Af => "AF",
            RhythmClass::Other => "other",
        }
    }
}

/// One filtered reference row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordEntry {
    pub id: String,
    pub class: RhythmClass,
}

/// Load and filter the reference table
///
/// # Arguments
/// * `path` - Path to the headerless CSV file
///
/// # Returns
/// Filtered entries in file order. Rows whose label is not in {N, A, O}
/// are dropped with a debug log line.
pub fn load_reference(path: &Path) -> Result<Vec<RecordEntry>, DatasetError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .from_path(path)
        .map_err(|err| DatasetError::ReferenceMissing {
            path: path.display().to_string(),
            details: err.to_string(),
        })?;

    let mut entries = Vec::new();
    let mut dropped = 0usize;

    for (row_idx, row) in reader.records().enumerate() {
        let row = row.map_err(|err| DatasetError::ReferenceParse {
            line: row_idx as u64 + 1,
            details: err.to_string(),
        })?;

        let id = row.get(0).unwrap_or("").trim();
        let symbol = row.get(1).unwrap_or("").trim();
        if id.is_empty() {
            return Err(DatasetError::ReferenceParse {
                line: row_idx as u64 + 1,
                details: "empty record identifier".to_string(),
            });
        }

        match RhythmClass::from_symbol(symbol) {
            Some(class) => entries.push(RecordEntry {
                id: id.to_string(),
                class,
            }),
            None => {
                debug!(
                    "[Reference] Dropping record '{}' with unknown label '{}'",
                    id, symbol
                );
                dropped += 1;
            }
        }
    }

    if dropped > 0 {
        log::info!(
            "[Reference] Loaded {} records ({} rows dropped by label filter)",
            entries.len(),
            dropped
        );
    }

    Ok(entries)
}

/// Build an identifier-to-class lookup from filtered entries
pub fn class_lookup(entries: &[RecordEntry]) -> HashMap<&str, RhythmClass> {
    entries
        .iter()
        .map(|entry| (entry.id.as_str(), entry.class))
        .collect()
}
