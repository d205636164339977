//! Repeated stratified k-fold partitions.
//!
//! A [`FoldPlan`] holds `folds × repeats` [`Split`]s. Within each repeat, rows
//! are grouped by label, each group is shuffled, and rows are dealt to folds
//! round-robin with one counter running across all groups, so every fold gets
//! close to the overall label mix. A split's test set is the complement of its
//! training set.

use std::{collections::BTreeMap, fmt};

use rand::{SeedableRng as _, seq::SliceRandom as _};
use rand_pcg::Pcg32;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display, derive_more::Error)]
pub enum FoldError {
    #[display("at least 2 folds are required, got {folds}")]
    TooFewFolds { folds: usize },
    #[display("at least one repeat is required")]
    NoRepeats,
    #[display("cannot split {samples} samples into {folds} folds")]
    TooFewSamples { folds: usize, samples: usize },
}

/// One-based split number, `1..=folds × repeats` in repeat-major order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct SplitId(pub usize);

impl fmt::Display for SplitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// One train/test partition of the row indices.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Split {
    pub id: SplitId,
    /// One-based repeat number.
    pub repeat: usize,
    /// One-based fold number within the repeat.
    pub fold: usize,
    /// Ascending training row indices.
    pub train: Vec<usize>,
    /// Ascending test row indices.
    pub test: Vec<usize>,
}

impl Split {
    /// `Fold{fold}.Rep{repeat}`.
    #[must_use]
    pub fn name(&self) -> String {
        format!("Fold{}.Rep{}", self.fold, self.repeat)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FoldPlan {
    folds: usize,
    repeats: usize,
    splits: Vec<Split>,
}

impl FoldPlan {
    /// Generates a stratified plan for rows labelled by `labels`.
    ///
    /// The same labels, fold count, repeat count and seed always give the same
    /// plan.
    ///
    /// ```
    /// use crisk_validation::FoldPlan;
    ///
    /// let labels = [0, 1, 1, 0, 2, 1, 0, 2, 1, 0];
    /// let plan = FoldPlan::stratified(&labels, 5, 2, 42).unwrap();
    /// assert_eq!(plan.splits().len(), 10);
    /// assert_eq!(plan.splits()[5].name(), "Fold1.Rep2");
    /// for split in plan.splits() {
    ///     assert_eq!(split.train.len() + split.test.len(), labels.len());
    /// }
    /// ```
    pub fn stratified<L>(
        labels: &[L],
        folds: usize,
        repeats: usize,
        seed: u64,
    ) -> Result<Self, FoldError>
    where
        L: Ord,
    {
        if folds < 2 {
            return Err(FoldError::TooFewFolds { folds });
        }
        if repeats == 0 {
            return Err(FoldError::NoRepeats);
        }
        let n = labels.len();
        if folds > n {
            return Err(FoldError::TooFewSamples { folds, samples: n });
        }

        let mut strata = BTreeMap::<&L, Vec<usize>>::new();
        for (index, label) in labels.iter().enumerate() {
            strata.entry(label).or_default().push(index);
        }

        let mut rng = Pcg32::seed_from_u64(seed);
        let mut splits = Vec::with_capacity(folds * repeats);
        for repeat in 1..=repeats {
            let mut fold_of = vec![0; n];
            let mut counter = 0;
            for members in strata.values() {
                let mut members = members.clone();
                members.shuffle(&mut rng);
                for index in members {
                    fold_of[index] = counter % folds;
                    counter += 1;
                }
            }

            for fold in 0..folds {
                let train = (0..n).filter(|&i| fold_of[i] != fold).collect::<Vec<_>>();
                let test = complement(&train, n);
                splits.push(Split {
                    id: SplitId(splits.len() + 1),
                    repeat,
                    fold: fold + 1,
                    train,
                    test,
                });
            }
        }

        log::debug!(
            "fold plan: {} splits over {n} rows in {} strata",
            splits.len(),
            strata.len()
        );
        Ok(Self {
            folds,
            repeats,
            splits,
        })
    }

    #[must_use]
    pub fn folds(&self) -> usize {
        self.folds
    }

    #[must_use]
    pub fn repeats(&self) -> usize {
        self.repeats
    }

    #[must_use]
    pub fn splits(&self) -> &[Split] {
        &self.splits
    }
}

fn complement(sorted: &[usize], n: usize) -> Vec<usize> {
    let mut taken = vec![false; n];
    for &i in sorted {
        taken[i] = true;
    }
    (0..n).filter(|&i| !taken[i]).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels() -> Vec<u8> {
        // 40 / 30 / 30 mix over 100 rows
        (0..100)
            .map(|i| match i % 10 {
                0..=3 => 1,
                4..=6 => 2,
                _ => 0,
            })
            .collect()
    }

    #[test]
    fn test_partition_invariants() {
        let labels = labels();
        let plan = FoldPlan::stratified(&labels, 5, 3, 7).unwrap();
        assert_eq!(plan.splits().len(), 15);

        for (k, split) in plan.splits().iter().enumerate() {
            assert_eq!(split.id, SplitId(k + 1));
            let mut all = split.train.clone();
            all.extend(&split.test);
            all.sort_unstable();
            assert_eq!(all, (0..100).collect::<Vec<_>>());
            assert!(split.test.iter().all(|i| split.train.binary_search(i).is_err()));
        }

        for repeat in plan.splits().chunks(5) {
            let mut seen = repeat.iter().flat_map(|s| s.test.clone()).collect::<Vec<_>>();
            seen.sort_unstable();
            assert_eq!(seen, (0..100).collect::<Vec<_>>());
        }
    }

    #[test]
    fn test_strata_balanced() {
        let labels = labels();
        let plan = FoldPlan::stratified(&labels, 5, 1, 1).unwrap();
        for split in plan.splits() {
            assert_eq!(split.test.len(), 20);
            let events = split.test.iter().filter(|&&i| labels[i] == 1).count();
            let competing = split.test.iter().filter(|&&i| labels[i] == 2).count();
            assert_eq!(events, 8);
            assert_eq!(competing, 6);
        }
    }

    #[test]
    fn test_deterministic() {
        let labels = labels();
        let a = FoldPlan::stratified(&labels, 5, 2, 99).unwrap();
        let b = FoldPlan::stratified(&labels, 5, 2, 99).unwrap();
        let c = FoldPlan::stratified(&labels, 5, 2, 100).unwrap();
        assert_eq!(a, b);
        assert_ne!(a, c);
        // repeats differ from each other
        assert_ne!(a.splits()[0].test, a.splits()[5].test);
    }

    #[test]
    fn test_errors() {
        assert_eq!(
            FoldPlan::stratified(&[0, 1], 1, 1, 0),
            Err(FoldError::TooFewFolds { folds: 1 })
        );
        assert_eq!(
            FoldPlan::stratified(&[0, 1], 2, 0, 0),
            Err(FoldError::NoRepeats)
        );
        assert_eq!(
            FoldPlan::stratified(&[0, 1], 3, 1, 0),
            Err(FoldError::TooFewSamples {
                folds: 3,
                samples: 2
            })
        );
    }
}
