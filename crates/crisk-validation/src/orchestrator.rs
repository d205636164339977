use std::thread;

use crisk_model::{Dataset, FitError, ModelFitter, ModelSpec};
use serde::Serialize;

use crate::{
    CalibrationEvaluator, CalibrationRecord, CalibrationSummary, ConfigError, CvConfig, FoldError,
    FoldPlan, MetricRecord, ModelRegistry, ModelTrainer, RiskEvaluation, RiskEvaluator, Split,
    SplitId, SummaryRecord, summarize_calibration, summarize_metrics,
};

#[derive(Debug, derive_more::Display, derive_more::Error)]
pub enum CvError {
    #[display("invalid configuration: {source}")]
    Config { source: ConfigError },
    #[display("invalid fold plan: {source}")]
    Fold { source: FoldError },
    #[display("model fit failed on split {split}: {source}")]
    Fit { split: SplitId, source: FitError },
    #[display("worker for split {split} panicked")]
    WorkerPanicked { split: SplitId },
}

impl From<ConfigError> for CvError {
    fn from(source: ConfigError) -> Self {
        Self::Config { source }
    }
}

impl From<FoldError> for CvError {
    fn from(source: FoldError) -> Self {
        Self::Fold { source }
    }
}

/// Everything one split produced.
#[derive(Debug)]
pub struct SplitOutcome<M> {
    pub split: Split,
    pub model: M,
    pub risk: RiskEvaluation,
    pub calibration: Vec<CalibrationRecord>,
}

/// Per-split records of a run, in split id order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RecordTables {
    pub incidence: Vec<MetricRecord>,
    pub auc: Vec<MetricRecord>,
    pub brier: Vec<MetricRecord>,
    pub ibs: Vec<MetricRecord>,
    pub concordance: Vec<MetricRecord>,
    pub calibration: Vec<CalibrationRecord>,
}

impl RecordTables {
    fn append(&mut self, risk: RiskEvaluation, calibration: Vec<CalibrationRecord>) {
        self.incidence.extend(risk.incidence);
        self.auc.extend(risk.auc);
        self.brier.extend(risk.brier);
        self.ibs.extend(risk.ibs);
        self.concordance.extend(risk.concordance);
        self.calibration.extend(calibration);
    }

    #[must_use]
    pub fn summarize(&self) -> SummaryTables {
        SummaryTables {
            incidence: summarize_metrics(&self.incidence),
            auc: summarize_metrics(&self.auc),
            brier: summarize_metrics(&self.brier),
            ibs: summarize_metrics(&self.ibs),
            concordance: summarize_metrics(&self.concordance),
            calibration: summarize_calibration(&self.calibration),
        }
    }
}

/// Cross-split summaries of a run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryTables {
    /// Keyed by time.
    pub incidence: Vec<SummaryRecord>,
    /// Keyed by `(horizon, time)`.
    pub auc: Vec<SummaryRecord>,
    /// Keyed by `(horizon, time)`.
    pub brier: Vec<SummaryRecord>,
    /// Keyed by horizon.
    pub ibs: Vec<SummaryRecord>,
    /// Keyed by horizon.
    pub concordance: Vec<SummaryRecord>,
    pub calibration: Vec<CalibrationSummary>,
}

/// Result of a cross-validation run.
#[derive(Debug)]
pub struct CvReport<M> {
    pub plan: FoldPlan,
    pub spec: ModelSpec,
    pub records: RecordTables,
    pub summaries: SummaryTables,
    pub registry: ModelRegistry<M>,
    /// Split with the highest concordance at the largest horizon.
    pub best_split: Option<SplitId>,
    pub max_horizon: u32,
}

impl<M> CvReport<M> {
    #[must_use]
    pub fn best_model(&self) -> Option<&M> {
        self.registry.model(self.best_split?)
    }

    /// Calibration records of the best split, across all calibration horizons.
    pub fn best_calibration(&self) -> impl Iterator<Item = &CalibrationRecord> {
        let best = self.best_split;
        self.records
            .calibration
            .iter()
            .filter(move |r| Some(r.split) == best)
    }
}

/// Picks the split with the highest concordance at `horizon`.
///
/// Ties go to the lowest split id; missing values never win.
///
/// ```
/// use crisk_validation::{Metric, MetricKey, MetricRecord, SplitId, select_best_split};
///
/// let record = |split, value| MetricRecord {
///     split: SplitId(split),
///     key: MetricKey::at_horizon(Metric::Concordance, 60),
///     value,
/// };
/// let records = [record(3, Some(0.7)), record(1, None), record(2, Some(0.7))];
/// assert_eq!(select_best_split(&records, 60), Some(SplitId(2)));
/// ```
#[must_use]
pub fn select_best_split(concordance: &[MetricRecord], horizon: u32) -> Option<SplitId> {
    let mut best: Option<(SplitId, f64)> = None;
    for record in concordance {
        if record.key.horizon != Some(horizon) {
            continue;
        }
        let Some(value) = record.value else {
            continue;
        };
        let better = match best {
            None => true,
            Some((id, current)) => value > current || (value == current && record.split < id),
        };
        if better {
            best = Some((record.split, value));
        }
    }
    best.map(|(id, _)| id)
}

/// Repeated stratified k-fold cross-validation of one model family.
#[derive(Debug, Clone)]
pub struct CrossValidator<F> {
    fitter: F,
    config: CvConfig,
}

impl<F> CrossValidator<F>
where
    F: ModelFitter,
{
    #[must_use]
    pub fn new(fitter: F, config: CvConfig) -> Self {
        Self { fitter, config }
    }

    #[must_use]
    pub fn config(&self) -> &CvConfig {
        &self.config
    }

    /// Runs the full loop on `dataset`.
    ///
    /// The dataset must have been built with this configuration's predictors
    /// and maximum time. Any failed fit aborts the run.
    pub fn run(&self, dataset: &Dataset) -> Result<CvReport<F::Model>, CvError> {
        let config = &self.config;
        config.validate()?;
        let cause = config.cause()?;

        let plan =
            FoldPlan::stratified(&dataset.statuses(), config.folds, config.repeats, config.seed)?;
        let spec = ModelSpec::all_columns(dataset.design(), cause);
        log::info!(
            "cross-validating {spec} on {} subjects: {} folds x {} repeats",
            dataset.len(),
            plan.folds(),
            plan.repeats()
        );

        let worker = SplitWorker {
            dataset,
            trainer: ModelTrainer::new(&self.fitter, &spec),
            risk: RiskEvaluator::new(cause, config.horizons.clone()),
            calibration: CalibrationEvaluator::new(
                cause,
                config.sorted_calibration_horizons(),
                config.calibration_bins,
            ),
        };
        let max_horizon = worker.risk.max_horizon();
        let outcomes = if config.parallel {
            worker.run_parallel(plan.splits())?
        } else {
            plan.splits()
                .iter()
                .map(|split| worker.run(split))
                .collect::<Result<Vec<_>, _>>()?
        };

        let mut records = RecordTables::default();
        let mut registry = ModelRegistry::default();
        for outcome in outcomes {
            records.append(outcome.risk, outcome.calibration);
            registry.insert(outcome.split, outcome.model);
        }

        let summaries = records.summarize();
        let best_split = select_best_split(&records.concordance, max_horizon);
        match best_split {
            Some(id) => log::info!("best split: {id} (concordance at horizon {max_horizon})"),
            None => log::warn!("no split has a concordance at horizon {max_horizon}"),
        }

        Ok(CvReport {
            plan,
            spec,
            records,
            summaries,
            registry,
            best_split,
            max_horizon,
        })
    }
}

struct SplitWorker<'a, F> {
    dataset: &'a Dataset,
    trainer: ModelTrainer<'a, F>,
    risk: RiskEvaluator,
    calibration: CalibrationEvaluator,
}

impl<F> SplitWorker<'_, F>
where
    F: ModelFitter,
{
    fn run(&self, split: &Split) -> Result<SplitOutcome<F::Model>, CvError> {
        log::debug!(
            "{} ({}): {} train / {} test",
            split.name(),
            split.id,
            split.train.len(),
            split.test.len()
        );
        let model = self.trainer.train(self.dataset, split)?;
        let test = self.dataset.subset(&split.test);
        let risk = self.risk.evaluate(split.id, &model, &test);
        let calibration = self.calibration.evaluate(split.id, &model, &test);
        Ok(SplitOutcome {
            split: split.clone(),
            model,
            risk,
            calibration,
        })
    }

    /// Runs every split on its own scoped thread.
    ///
    /// Results come back in split order; the first failure by split id wins.
    fn run_parallel(&self, splits: &[Split]) -> Result<Vec<SplitOutcome<F::Model>>, CvError> {
        thread::scope(|s| {
            let handles = splits
                .iter()
                .map(|split| (split.id, s.spawn(move || self.run(split))))
                .collect::<Vec<_>>();
            handles
                .into_iter()
                .map(|(id, handle)| {
                    handle
                        .join()
                        .map_err(|_| CvError::WorkerPanicked { split: id })?
                })
                .collect()
        })
    }
}

#[cfg(test)]
mod tests {
    use crisk_model::{
        CompetingRiskModel as _, FineGrayFitter, Subject,
        simulate::{OracleModel, SimulationParams, simulate_records},
    };

    use super::*;
    use crate::Metric;

    fn dataset(rows: usize, seed: u64) -> (CvConfig, Dataset) {
        let config = CvConfig {
            folds: 5,
            repeats: 2,
            categorical: vec!["group".into()],
            continuous: vec!["x1".into(), "x2".into()],
            horizons: vec![60, 36],
            calibration_bins: 4,
            calibration_horizons: vec![36, 60],
            max_time: 120.0,
            ..CvConfig::default()
        };
        // About 40% events, 30% competing, 30% censored.
        let params = SimulationParams {
            rows,
            event_rate: 0.005,
            competing_rate: 0.006,
            censoring_rate: 0.0035,
            ..SimulationParams::default()
        };
        let records = simulate_records(&params, seed).unwrap();
        let dataset =
            Dataset::from_records(&records, &config.predictors(), config.max_time).unwrap();
        (config, dataset)
    }

    #[test]
    fn test_end_to_end() {
        let (config, dataset) = dataset(100, 11);
        let report = CrossValidator::new(FineGrayFitter::default(), config)
            .run(&dataset)
            .unwrap();

        let [censored, events, competing] = dataset.status_counts();
        assert_eq!(censored + events + competing, 100);
        assert!((25..=55).contains(&events), "{events} events");
        assert!((15..=45).contains(&competing), "{competing} competing");
        assert!((15..=45).contains(&censored), "{censored} censored");

        assert_eq!(report.plan.splits().len(), 10);
        assert_eq!(report.registry.len(), 10);
        assert_eq!(report.max_horizon, 60);
        assert_eq!(report.records.incidence.len(), 10 * 61);
        assert_eq!(report.records.concordance.len(), 10 * 2);

        for horizon in [36, 60] {
            fn at_horizon(records: &[MetricRecord], horizon: u32) -> Vec<&MetricRecord> {
                records
                    .iter()
                    .filter(|r| r.key.horizon == Some(horizon))
                    .collect::<Vec<_>>()
            }
            let ibs = at_horizon(&report.records.ibs, horizon);
            assert_eq!(ibs.len(), 10, "IBS values at horizon {horizon}");
            assert!(ibs.iter().all(|r| r.key.time.is_none()));

            for records in [&report.records.auc, &report.records.brier] {
                let records = at_horizon(records, horizon);
                assert_eq!(records.len(), 10 * horizon as usize);
                for split in 1..=10 {
                    let times = records
                        .iter()
                        .filter(|r| r.split == SplitId(split))
                        .map(|r| r.key.time.unwrap())
                        .collect::<Vec<_>>();
                    assert_eq!(times, (1..=horizon).collect::<Vec<_>>());
                }
            }
        }
        assert_eq!(report.records.auc.len(), 10 * (36 + 60));
        assert_eq!(report.records.brier.len(), 10 * (36 + 60));

        assert_eq!(report.summaries.incidence.len(), 61);
        assert_eq!(report.summaries.auc.len(), 36 + 60);
        assert_eq!(report.summaries.brier.len(), 36 + 60);
        assert_eq!(report.summaries.ibs.len(), 2);
        assert_eq!(report.summaries.ibs[0].key.horizon, Some(36));

        let best = report.best_split.unwrap();
        let best_value = report
            .records
            .concordance
            .iter()
            .find(|r| r.split == best && r.key.horizon == Some(60))
            .and_then(|r| r.value)
            .unwrap();
        assert!(
            report
                .records
                .concordance
                .iter()
                .filter(|r| r.key.horizon == Some(60))
                .filter_map(|r| r.value)
                .all(|v| v <= best_value)
        );
        assert!(report.best_model().is_some());
        assert!(report.best_calibration().all(|r| r.split == best));
        assert!(report.best_calibration().any(|r| r.horizon == 36));
    }

    #[test]
    fn test_fine_gray_beats_chance() {
        let (config, dataset) = dataset(400, 21);
        let config = CvConfig {
            folds: 2,
            repeats: 1,
            ..config
        };
        let report = CrossValidator::new(FineGrayFitter::default(), config)
            .run(&dataset)
            .unwrap();
        let concordance = report
            .summaries
            .concordance
            .iter()
            .find(|s| s.key == crate::MetricKey::at_horizon(Metric::Concordance, 60))
            .unwrap();
        assert_eq!(concordance.summary.n, 2);
        assert!(concordance.summary.mean.unwrap() > 0.5);
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let (config, dataset) = dataset(150, 3);
        let sequential = CrossValidator::new(FineGrayFitter::default(), config.clone())
            .run(&dataset)
            .unwrap();
        let parallel = CrossValidator::new(
            FineGrayFitter::default(),
            CvConfig {
                parallel: true,
                ..config
            },
        )
        .run(&dataset)
        .unwrap();

        assert_eq!(parallel.plan, sequential.plan);
        assert_eq!(parallel.records, sequential.records);
        assert_eq!(parallel.summaries, sequential.summaries);
        assert_eq!(parallel.best_split, sequential.best_split);
        for (a, b) in parallel.registry.iter().zip(sequential.registry.iter()) {
            assert_eq!(a.model.coefficients(), b.model.coefficients());
        }
    }

    #[derive(Debug)]
    struct FailOnSmallTraining {
        below: usize,
    }

    impl ModelFitter for FailOnSmallTraining {
        type Model = OracleModel;

        fn fit(&self, _spec: &ModelSpec, subjects: &[Subject]) -> Result<Self::Model, FitError> {
            if subjects.len() < self.below {
                return Err(FitError::Singular { column: 1 });
            }
            Ok(OracleModel {
                params: SimulationParams::default(),
            })
        }
    }

    #[test]
    fn test_fit_failure_aborts() {
        let (config, dataset) = dataset(100, 5);
        for parallel in [false, true] {
            let config = CvConfig {
                parallel,
                ..config.clone()
            };
            let err = CrossValidator::new(FailOnSmallTraining { below: usize::MAX }, config)
                .run(&dataset)
                .unwrap_err();
            assert!(matches!(
                err,
                CvError::Fit {
                    split: SplitId(1),
                    source: FitError::Singular { column: 1 }
                }
            ));
        }
    }

    #[test]
    fn test_oracle_run() {
        let (config, dataset) = dataset(200, 8);
        let report = CrossValidator::new(FailOnSmallTraining { below: 0 }, config)
            .run(&dataset)
            .unwrap();
        let model = report.best_model().unwrap();
        let cif = model.predict_cif(&[0.0, 0.0, 0.0, 0.0], &[0.0, 60.0]);
        assert!(cif[0].abs() < 1e-12);
        assert!(cif[1] > 0.0);
    }

    #[test]
    fn test_invalid_config() {
        let (config, dataset) = dataset(50, 1);
        let config = CvConfig { folds: 1, ..config };
        let err = CrossValidator::new(FineGrayFitter::default(), config)
            .run(&dataset)
            .unwrap_err();
        assert!(matches!(
            err,
            CvError::Config {
                source: ConfigError::TooFewFolds { folds: 1 }
            }
        ));
    }

    #[test]
    fn test_best_split_ignores_other_horizons() {
        let record = |split, horizon, value| MetricRecord {
            split: SplitId(split),
            key: crate::MetricKey::at_horizon(Metric::Concordance, horizon),
            value,
        };
        let records = [
            record(1, 36, Some(0.9)),
            record(1, 60, Some(0.6)),
            record(2, 60, Some(0.65)),
            record(3, 60, None),
        ];
        assert_eq!(select_best_split(&records, 60), Some(SplitId(2)));
        assert_eq!(select_best_split(&records[3..], 60), None);
    }
}
