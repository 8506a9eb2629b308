//! Fold assigner - seeded shuffled k-fold partition
//!
//! Mirrors a shuffled k-fold splitter: record indices are shuffled with a
//! seeded PRNG, then cut into `n_folds` contiguous chunks where the first
//! `n % n_folds` chunks receive one extra element. Chunk `i` is test fold
//! `i`; the combined (train) set for fold `i` is every record whose fold
//! differs from `i`.
//!
//! Determinism: for a fixed seed and a fixed record ordering, the
//! assignment is reproducible bit-for-bit across runs and platforms.

use std::collections::HashMap;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::Serialize;

use crate::error::DatasetError;
use crate::reference::RecordEntry;

/// Deterministic fold assignment over an ordered record set
#[derive(Debug, Clone, Serialize)]
pub struct FoldPlan {
    n_folds: usize,
    seed: u64,
    /// Record identifiers in reference order
    order: Vec<String>,
    /// Identifier -> test fold index
    assignments: HashMap<String, usize>,
}

impl FoldPlan {
    /// Number of test folds
    pub fn n_folds(&self) -> usize {
        self.n_folds
    }

    /// Seed the shuffle was drawn from
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Record identifiers in reference order
    pub fn order(&self) -> &[String] {
        &self.order
    }

    /// Test fold index of a record, if it was assigned
    pub fn fold_of(&self, id: &str) -> Option<usize> {
        self.assignments.get(id).copied()
    }

    /// Records held out in test fold `fold`, in reference order
    pub fn test_records(&self, fold: usize) -> Vec<&str> {
        self.order
            .iter()
            .filter(|id| self.assignments.get(id.as_str()) == Some(&fold))
            .map(|id| id.as_str())
            .collect()
    }

    /// Records of the combined (train) set for fold `fold`, in reference order
    pub fn combined_records(&self, fold: usize) -> Vec<&str> {
        self.order
            .iter()
            .filter(|id| self.assignments.get(id.as_str()) != Some(&fold))
            .map(|id| id.as_str())
            .collect()
    }
}

/// Partition records into `n_folds` disjoint test folds
///
/// # Arguments
/// * `records` - Filtered reference entries in file order
/// * `n_folds` - Number of test folds (>= 2, <= record count)
/// * `seed` - Shuffle seed
pub fn assign_folds(
    records: &[RecordEntry],
    n_folds: usize,
    seed: u64,
) -> Result<FoldPlan, DatasetError> {
    if n_folds < 2 || records.len() < n_folds {
        return Err(DatasetError::InvalidFoldCount {
            folds: n_folds,
            records: records.len(),
        });
    }

    let mut indices: Vec<usize> = (0..records.len()).collect();
    let mut rng = StdRng::seed_from_u64(seed);
    indices.shuffle(&mut rng);

    // First (n % k) folds take one extra element, as in a standard k-fold cut.
    let base = records.len() / n_folds;
    let remainder = records.len() % n_folds;

    let mut assignments = HashMap::with_capacity(records.len());
    let mut cursor = 0usize;
    for fold in 0..n_folds {
        let size = base + usize::from(fold < remainder);
        for &idx in &indices[cursor..cursor + size] {
            assignments.insert(records[idx].id.clone(), fold);
        }
        cursor += size;
    }

    Ok(FoldPlan {
        n_folds,
        seed,
        order: records.iter().map(|entry| entry.id.clone()).collect(),
        assignments,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reference::RhythmClass;

    fn records(n: usize) -> Vec<RecordEntry> {
        (0..n)
            .map(|i| RecordEntry {
                id: format!("A{:05}", i + 1),
                class: match i % 3 {
                    0 => RhythmClass::Normal,
                    1 => RhythmClass::Af,
                    _ => RhythmClass::Other,
                },
            })
            .collect()
    }

    #[test]
    fn test_assignment_is_deterministic() {
        let recs = records(37);
        let a = assign_folds(&recs, 4, 42).expect("assign");
        let b = assign_folds(&recs, 4, 42).expect("assign");
        for rec in &recs {
            assert_eq!(a.fold_of(&rec.id), b.fold_of(&rec.id));
        }
    }

    #[test]
    fn test_different_seeds_differ() {
        let recs = records(64);
        let a = assign_folds(&recs, 4, 42).expect("assign");
        let b = assign_folds(&recs, 4, 43).expect("assign");
        let moved = recs
            .iter()
            .filter(|rec| a.fold_of(&rec.id) != b.fold_of(&rec.id))
            .count();
        assert!(moved > 0, "expected at least one record to move folds");
    }

    #[test]
    fn test_folds_partition_the_record_set() {
        let recs = records(37);
        let plan = assign_folds(&recs, 4, 42).expect("assign");

        let mut seen = std::collections::HashSet::new();
        for fold in 0..4 {
            for id in plan.test_records(fold) {
                assert!(seen.insert(id.to_string()), "record {id} in two test folds");
            }
        }
        assert_eq!(seen.len(), recs.len());

        // Every record sits in exactly n_folds - 1 combined sets.
        for rec in &recs {
            let appearances = (0..4)
                .filter(|&fold| plan.combined_records(fold).contains(&rec.id.as_str()))
                .count();
            assert_eq!(appearances, 3);
        }
    }

    #[test]
    fn test_chunk_sizes_follow_kfold_rule() {
        // 37 = 4 * 9 + 1, so fold 0 has 10 records, folds 1-3 have 9.
        let recs = records(37);
        let plan = assign_folds(&recs, 4, 42).expect("assign");
        assert_eq!(plan.test_records(0).len(), 10);
        for fold in 1..4 {
            assert_eq!(plan.test_records(fold).len(), 9);
        }
    }

    #[test]
    fn test_degenerate_one_record_per_fold() {
        // 4 records, 4 folds: each record lands in its own test fold, and a
        // rerun reproduces the identical assignment.
        let recs = records(4);
        let a = assign_folds(&recs, 4, 42).expect("assign");
        for fold in 0..4 {
            assert_eq!(a.test_records(fold).len(), 1);
            assert_eq!(a.combined_records(fold).len(), 3);
        }
        let b = assign_folds(&recs, 4, 42).expect("assign");
        for rec in &recs {
            assert_eq!(a.fold_of(&rec.id), b.fold_of(&rec.id));
        }
    }

    #[test]
    fn test_lists_preserve_reference_order() {
        let recs = records(12);
        let plan = assign_folds(&recs, 4, 42).expect("assign");
        for fold in 0..4 {
            let combined = plan.combined_records(fold);
            let mut sorted = combined.clone();
            sorted.sort();
            // Identifiers were generated in ascending order, so reference
            // order and lexicographic order coincide here.
            assert_eq!(combined, sorted);
        }
    }

    #[test]
    fn test_rejects_unusable_fold_counts() {
        let recs = records(3);
        assert!(matches!(
            assign_folds(&recs, 4, 42),
            Err(DatasetError::InvalidFoldCount { folds: 4, records: 3 })
        ));
        assert!(matches!(
            assign_folds(&recs, 1, 42),
            Err(DatasetError::InvalidFoldCount { .. })
        ));
    }
}
