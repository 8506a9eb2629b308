//! Configuration for the fold preparation pipeline
//!
//! This module replaces the hard-coded constants of the original batch job
//! with an explicit configuration structure. All paths, the fold count, and
//! the shuffle seed can be loaded from a JSON file and overridden per field
//! from the command line.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Complete pipeline configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrepConfig {
    pub inputs: InputConfig,
    pub folds: FoldConfig,
    pub output: OutputConfig,
}

/// Input dataset locations
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InputConfig {
    /// Headerless two-column reference CSV (record identifier, label)
    pub reference_csv: PathBuf,
    /// Directory of MATLAB `.mat` signal containers
    pub mat_dir: PathBuf,
    /// Directory of WFDB `.hea`/`.dat` file pairs
    pub hea_dir: PathBuf,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            reference_csv: PathBuf::from("REFERENCE.csv"),
            mat_dir: PathBuf::from("mat_files"),
            hea_dir: PathBuf::from("hea_files"),
        }
    }
}

/// Cross-validation split parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FoldConfig {
    /// Number of disjoint test folds
    pub n_folds: usize,
    /// Seed for the shuffled k-fold partition
    pub seed: u64,
}

impl Default for FoldConfig {
    fn default() -> Self {
        Self { n_folds: 4, seed: 42 }
    }
}

/// Output tree location
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Root directory of the generated fold tree (destroyed and rebuilt per run)
    pub root: PathBuf,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("folds"),
        }
    }
}

impl Default for PrepConfig {
    /// Default configuration values (fallback if config file not found)
    fn default() -> Self {
        Self {
            inputs: InputConfig::default(),
            folds: FoldConfig::default(),
            output: OutputConfig::default(),
        }
    }
}

impl PrepConfig {
    /// Load configuration from JSON file
    ///
    /// # Arguments
    /// * `path` - Path to JSON config file
    ///
    /// # Returns
    /// The loaded configuration, or the defaults if the file is absent or
    /// the JSON is invalid (a warning is logged in both cases).
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Self {
        match fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str(&contents) {
                Ok(config) => {
                    log::info!("[Config] Loaded configuration from {:?}", path.as_ref());
                    config
                }
                Err(err) => {
                    log::warn!(
                        "[Config] Failed to parse JSON from {:?}: {}. Using defaults.",
                        path.as_ref(),
                        err
                    );
                    Self::default()
                }
            },
            Err(err) => {
                log::warn!(
                    "[Config] Failed to read config file {:?}: {}. Using defaults.",
                    path.as_ref(),
                    err
                );
                Self::default()
            }
        }
    }
}
