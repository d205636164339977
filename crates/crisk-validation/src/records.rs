use std::collections::BTreeMap;

use crisk_metrics::CalibrationBin;
use serde::Serialize;

use crate::{Split, SplitId};

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, derive_more::Display,
)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    #[display("incidence")]
    Incidence,
    #[display("auc")]
    Auc,
    #[display("brier")]
    Brier,
    #[display("ibs")]
    Ibs,
    #[display("concordance")]
    Concordance,
}

/// Grouping key of a metric value.
///
/// Incidence is keyed by time only, AUC and Brier by horizon and time, IBS and
/// concordance by horizon only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct MetricKey {
    pub metric: Metric,
    pub horizon: Option<u32>,
    pub time: Option<u32>,
}

impl MetricKey {
    #[must_use]
    pub fn incidence(time: u32) -> Self {
        Self {
            metric: Metric::Incidence,
            horizon: None,
            time: Some(time),
        }
    }

    #[must_use]
    pub fn timed(metric: Metric, horizon: u32, time: u32) -> Self {
        Self {
            metric,
            horizon: Some(horizon),
            time: Some(time),
        }
    }

    #[must_use]
    pub fn at_horizon(metric: Metric, horizon: u32) -> Self {
        Self {
            metric,
            horizon: Some(horizon),
            time: None,
        }
    }
}

/// One metric value of one split; `None` when the metric is undefined.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MetricRecord {
    pub split: SplitId,
    #[serde(flatten)]
    pub key: MetricKey,
    pub value: Option<f64>,
}

/// One calibration bin of one split at one horizon.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CalibrationRecord {
    pub split: SplitId,
    pub horizon: u32,
    #[serde(flatten)]
    pub bin: CalibrationBin,
}

/// A fitted model together with the split it was trained on.
#[derive(Debug, Clone)]
pub struct RegistryEntry<M> {
    pub split: Split,
    pub model: M,
}

/// Fitted models of a run, keyed by split id.
#[derive(Debug, Clone)]
pub struct ModelRegistry<M> {
    entries: BTreeMap<SplitId, RegistryEntry<M>>,
}

impl<M> Default for ModelRegistry<M> {
    fn default() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }
}

impl<M> ModelRegistry<M> {
    /// Adds the model of `split`, replacing any earlier entry for that split.
    pub fn insert(&mut self, split: Split, model: M) {
        self.entries.insert(split.id, RegistryEntry { split, model });
    }

    #[must_use]
    pub fn get(&self, id: SplitId) -> Option<&RegistryEntry<M>> {
        self.entries.get(&id)
    }

    #[must_use]
    pub fn model(&self, id: SplitId) -> Option<&M> {
        self.get(id).map(|e| &e.model)
    }

    /// Entries in split id order.
    pub fn iter(&self) -> impl Iterator<Item = &RegistryEntry<M>> {
        self.entries.values()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
