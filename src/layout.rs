//! Directory builder for the fold output tree
//!
//! Layout per fold index `i`:
//!
//! ```text
//! <root>/fold{i}/{data,label}/                      test split
//! <root>/fold{i}/{AF,normal,other}/{data,label}/    test split, per class
//! <root>/fold{concat j != i}/{data,label}/          train split
//! ```
//!
//! `reset()` destroys the whole root; `create_all()` is idempotent. The
//! path helpers are the single source of truth for file naming, shared by
//! the writer and the tests.

use std::fs;
use std::path::{Path, PathBuf};

use log::info;

use crate::error::DatasetError;
use crate::reference::RhythmClass;

/// Output tree of a fold preparation run
#[derive(Debug, Clone)]
pub struct FoldLayout {
    root: PathBuf,
    n_folds: usize,
}

impl FoldLayout {
    pub fn new<P: Into<PathBuf>>(root: P, n_folds: usize) -> Self {
        Self {
            root: root.into(),
            n_folds,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory name of test fold `fold` (e.g. `fold0`)
    pub fn test_dir_name(fold: usize) -> String {
        format!("fold{fold}")
    }

    /// Directory name of the combined set for `fold` (e.g. `fold123` for 0)
    pub fn combined_dir_name(&self, fold: usize) -> String {
        let mut name = String::from("fold");
        for j in 0..self.n_folds {
            if j != fold {
                name.push_str(&j.to_string());
            }
        }
        name
    }

    /// Remove any previous output tree to avoid stale files
    pub fn reset(&self) -> Result<(), DatasetError> {
        if self.root.exists() {
            info!("[Layout] Removing stale output tree {}", self.root.display());
            fs::remove_dir_all(&self.root).map_err(|err| self.io_error(&self.root, err))?;
        }
        Ok(())
    }

    /// Create every fold, split, and class directory
    pub fn create_all(&self) -> Result<(), DatasetError> {
        for fold in 0..self.n_folds {
            let test_dir = self.root.join(Self::test_dir_name(fold));
            let combined_dir = self.root.join(self.combined_dir_name(fold));
            for dir in [&test_dir, &combined_dir] {
                for sub in ["data", "label"] {
                    let path = dir.join(sub);
                    fs::create_dir_all(&path).map_err(|err| self.io_error(&path, err))?;
                }
            }
            for class in RhythmClass::ALL {
                for sub in ["data", "label"] {
                    let path = test_dir.join(class.dir_name()).join(sub);
                    fs::create_dir_all(&path).map_err(|err| self.io_error(&path, err))?;
                }
            }
        }
        Ok(())
    }

    /// `.npy` pair for entry `idx` of the test split of `fold`
    pub fn test_paths(&self, fold: usize, idx: usize) -> (PathBuf, PathBuf) {
        let dir = self.root.join(Self::test_dir_name(fold));
        (
            dir.join("data").join(format!("{idx}.npy")),
            dir.join("label").join(format!("{idx}.npy")),
        )
    }

    /// `.npy` pair for the per-class duplicate of a test entry
    pub fn class_paths(&self, fold: usize, class: RhythmClass, idx: usize) -> (PathBuf, PathBuf) {
        let dir = self
            .root
            .join(Self::test_dir_name(fold))
            .join(class.dir_name());
        (
            dir.join("data").join(format!("{idx}.npy")),
            dir.join("label").join(format!("{idx}.npy")),
        )
    }

    /// `.npy` pair for entry `idx` of the combined (train) split of `fold`
    pub fn combined_paths(&self, fold: usize, idx: usize) -> (PathBuf, PathBuf) {
        let dir = self.root.join(self.combined_dir_name(fold));
        (
            dir.join("data").join(format!("{idx}.npy")),
            dir.join("label").join(format!("{idx}.npy")),
        )
    }

    fn io_error(&self, path: &Path, err: std::io::Error) -> DatasetError {
        DatasetError::OutputIo {
            path: path.display().to_string(),
            details: err.to_string(),
        }
    }
}
