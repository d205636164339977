use crisk_stats::survival::KaplanMeierCurve;
use serde::Serialize;

use super::linalg;
use crate::{CompetingRiskModel, FitError, ModelFitter, ModelSpec, Status, Subject};

/// Largest Newton step (in any coefficient) taken in one iteration.
const MAX_STEP: f64 = 5.0;
/// Coefficients are clamped to `±MAX_COEFFICIENT` to keep separated data finite.
const MAX_COEFFICIENT: f64 = 20.0;
/// Ridge added to near-zero diagonal entries of the information matrix.
const RIDGE: f64 = 1e-6;

/// Fine-Gray proportional subdistribution hazards regression.
///
/// Coefficients maximize the weighted partial likelihood by Newton-Raphson on
/// mean-centred covariates. Subjects with a competing event stay in the risk
/// set after their event with weight `G(t-) / G(T_i-)`, where `G` is the
/// Kaplan-Meier estimate of the censoring distribution. The baseline cumulative
/// subdistribution hazard is the Breslow estimator.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FineGrayFitter {
    pub max_iter: usize,
    /// Convergence threshold on the largest coefficient update.
    pub tol: f64,
}

impl Default for FineGrayFitter {
    fn default() -> Self {
        Self {
            max_iter: 50,
            tol: 1e-9,
        }
    }
}

/// A fitted Fine-Gray model.
///
/// Predicts `F(t | x) = 1 - exp(-Λ0(t) exp((x - x̄)ᵀβ))`.
#[derive(Debug, Clone, Serialize)]
pub struct FineGrayModel {
    cause: Status,
    predictors: Vec<String>,
    columns: Vec<usize>,
    coefficients: Vec<f64>,
    means: Vec<f64>,
    baseline_times: Vec<f64>,
    baseline_hazard: Vec<f64>,
    iterations: usize,
    converged: bool,
    log_likelihood: f64,
}

impl FineGrayModel {
    #[must_use]
    pub fn predictors(&self) -> &[String] {
        &self.predictors
    }

    /// Estimated coefficients (log subdistribution hazard ratios).
    #[must_use]
    pub fn coefficients(&self) -> &[f64] {
        &self.coefficients
    }

    #[must_use]
    pub fn iterations(&self) -> usize {
        self.iterations
    }

    #[must_use]
    pub fn converged(&self) -> bool {
        self.converged
    }

    #[must_use]
    pub fn log_likelihood(&self) -> f64 {
        self.log_likelihood
    }

    /// Baseline cumulative subdistribution hazard `Λ0(t)`.
    #[must_use]
    pub fn baseline_hazard_at(&self, time: f64) -> f64 {
        let idx = self.baseline_times.partition_point(|t| *t <= time);
        if idx == 0 {
            0.0
        } else {
            self.baseline_hazard[idx - 1]
        }
    }

    /// Centred linear predictor `(x - x̄)ᵀβ` for a full design covariate vector.
    #[must_use]
    pub fn linear_predictor(&self, covariates: &[f64]) -> f64 {
        self.columns
            .iter()
            .zip(&self.means)
            .zip(&self.coefficients)
            .map(|((&c, mean), beta)| (covariates[c] - mean) * beta)
            .sum()
    }
}

impl CompetingRiskModel for FineGrayModel {
    fn cause(&self) -> Status {
        self.cause
    }

    fn predict_cif(&self, covariates: &[f64], times: &[f64]) -> Vec<f64> {
        let risk = exp_clamped(self.linear_predictor(covariates));
        times
            .iter()
            .map(|&t| {
                let hazard = self.baseline_hazard_at(t) * risk;
                (1.0 - (-hazard).exp()).clamp(0.0, 1.0)
            })
            .collect()
    }
}

impl ModelFitter for FineGrayFitter {
    type Model = FineGrayModel;

    fn fit(&self, spec: &ModelSpec, subjects: &[Subject]) -> Result<FineGrayModel, FitError> {
        if spec.cause.is_censored() {
            return Err(FitError::CensoredCause);
        }
        if subjects.is_empty() {
            return Err(FitError::Empty);
        }
        let design = CentredDesign::new(spec, subjects)?;
        let risk_sets = RiskSets::new(subjects, spec.cause, &design)?;
        let p = design.p;

        let mut beta = vec![0.0; p];
        let mut state = risk_sets.evaluate(&design, &beta);
        let mut iterations = 0;
        let mut converged = false;

        while iterations < self.max_iter {
            iterations += 1;

            let mut information = state.information.clone();
            for j in 0..p {
                if information[j * p + j].abs() < 1e-10 {
                    information[j * p + j] += RIDGE;
                }
            }
            let step = linalg::solve(&information, &state.gradient)
                .map_err(|column| FitError::Singular { column })?;
            if step.iter().any(|d| !d.is_finite()) {
                return Err(FitError::Diverged { iterations });
            }

            let largest = step.iter().map(|d| d.abs()).fold(0.0, f64::max);
            let scale = if largest > MAX_STEP {
                MAX_STEP / largest
            } else {
                1.0
            };
            for (b, d) in beta.iter_mut().zip(&step) {
                *b = (*b + scale * d).clamp(-MAX_COEFFICIENT, MAX_COEFFICIENT);
            }

            state = risk_sets.evaluate(&design, &beta);
            if !state.log_likelihood.is_finite() {
                return Err(FitError::Diverged { iterations });
            }
            if largest * scale < self.tol {
                converged = true;
                break;
            }
        }

        if converged {
            log::debug!(
                "fine-gray: converged after {iterations} iterations, log-likelihood {:.4}",
                state.log_likelihood
            );
        } else {
            log::warn!(
                "fine-gray: no convergence after {iterations} iterations, log-likelihood {:.4}",
                state.log_likelihood
            );
        }

        let (baseline_times, baseline_hazard) = risk_sets.breslow(&design, &beta);
        Ok(FineGrayModel {
            cause: spec.cause,
            predictors: spec.predictors.clone(),
            columns: spec.columns.clone(),
            coefficients: beta,
            means: design.means,
            baseline_times,
            baseline_hazard,
            iterations,
            converged,
            log_likelihood: state.log_likelihood,
        })
    }
}

/// Model columns of the training sample, centred on their means.
#[derive(Debug)]
struct CentredDesign {
    p: usize,
    means: Vec<f64>,
    /// Row-major `n × p`.
    x: Vec<f64>,
}

impl CentredDesign {
    #[expect(clippy::cast_precision_loss)]
    fn new(spec: &ModelSpec, subjects: &[Subject]) -> Result<Self, FitError> {
        let p = spec.columns.len();
        let expected = spec.columns.iter().max().map_or(0, |c| c + 1);
        let mut x = Vec::with_capacity(subjects.len() * p);
        for (index, subject) in subjects.iter().enumerate() {
            if subject.covariates.len() < expected {
                return Err(FitError::Dimension {
                    index,
                    found: subject.covariates.len(),
                    expected,
                });
            }
            let row = spec.select(&subject.covariates);
            if !subject.time.is_finite() || row.iter().any(|v| !v.is_finite()) {
                return Err(FitError::NonFinite { index });
            }
            x.extend(row);
        }

        let mut means = vec![0.0; p];
        if p > 0 {
            for row in x.chunks_exact(p) {
                for (m, v) in means.iter_mut().zip(row) {
                    *m += v;
                }
            }
            for m in &mut means {
                *m /= subjects.len() as f64;
            }
            for row in x.chunks_exact_mut(p) {
                for (v, m) in row.iter_mut().zip(&means) {
                    *v -= m;
                }
            }
        }
        Ok(Self { p, means, x })
    }

    fn row(&self, i: usize) -> &[f64] {
        &self.x[i * self.p..(i + 1) * self.p]
    }

    fn risk(&self, i: usize, beta: &[f64]) -> f64 {
        exp_clamped(self.row(i).iter().zip(beta).map(|(x, b)| x * b).sum())
    }
}

/// Weighted risk set at one distinct event time of the cause.
#[derive(Debug)]
struct EventTime {
    time: f64,
    /// Number of cause events at `time`.
    events: usize,
    /// Sum of centred covariates of those events.
    event_sum: Vec<f64>,
    /// `(subject, weight)` pairs with positive weight.
    members: Vec<(usize, f64)>,
}

#[derive(Debug)]
struct RiskSets {
    event_times: Vec<EventTime>,
}

#[derive(Debug)]
struct LikelihoodState {
    log_likelihood: f64,
    /// Score vector.
    gradient: Vec<f64>,
    /// Observed information, row-major `p × p`.
    information: Vec<f64>,
}

impl RiskSets {
    fn new(subjects: &[Subject], cause: Status, design: &CentredDesign) -> Result<Self, FitError> {
        let mut event_times_list = subjects
            .iter()
            .filter(|s| s.status.is_cause(cause))
            .map(|s| s.time)
            .collect::<Vec<_>>();
        if event_times_list.is_empty() {
            return Err(FitError::NoEvents { cause: cause.code() });
        }
        event_times_list.sort_by(f64::total_cmp);
        event_times_list.dedup();

        let censoring =
            KaplanMeierCurve::censoring(subjects.iter().map(|s| (s.time, s.status.is_censored())));
        let g_before = subjects
            .iter()
            .map(|s| censoring.survival_before(s.time))
            .collect::<Vec<_>>();

        let p = design.p;
        let event_times = event_times_list
            .into_iter()
            .map(|time| {
                let g_now = censoring.survival_before(time);
                let mut events = 0;
                let mut event_sum = vec![0.0; p];
                let mut members = vec![];
                for (i, subject) in subjects.iter().enumerate() {
                    if subject.time == time && subject.status.is_cause(cause) {
                        events += 1;
                        for (acc, v) in event_sum.iter_mut().zip(design.row(i)) {
                            *acc += v;
                        }
                    }
                    let weight = if subject.time >= time {
                        1.0
                    } else if subject.status.is_competing(cause) && g_before[i] > 0.0 {
                        g_now / g_before[i]
                    } else {
                        0.0
                    };
                    if weight > 0.0 {
                        members.push((i, weight));
                    }
                }
                EventTime {
                    time,
                    events,
                    event_sum,
                    members,
                }
            })
            .collect();
        Ok(Self { event_times })
    }

    #[expect(clippy::cast_precision_loss)]
    fn evaluate(&self, design: &CentredDesign, beta: &[f64]) -> LikelihoodState {
        let p = design.p;
        let mut log_likelihood = 0.0;
        let mut gradient = vec![0.0; p];
        let mut information = vec![0.0; p * p];

        for et in &self.event_times {
            let mut s0 = 0.0;
            let mut s1 = vec![0.0; p];
            let mut s2 = vec![0.0; p * p];
            for &(i, weight) in &et.members {
                let w = weight * design.risk(i, beta);
                let xi = design.row(i);
                s0 += w;
                for j in 0..p {
                    s1[j] += w * xi[j];
                    for k in 0..p {
                        s2[j * p + k] += w * xi[j] * xi[k];
                    }
                }
            }
            if s0 <= 0.0 {
                continue;
            }

            let d = et.events as f64;
            let eta_sum = et.event_sum.iter().zip(beta).map(|(x, b)| x * b).sum::<f64>();
            log_likelihood += eta_sum - d * s0.ln();
            for j in 0..p {
                let mean_j = s1[j] / s0;
                gradient[j] += et.event_sum[j] - d * mean_j;
                for k in 0..p {
                    information[j * p + k] += d * (s2[j * p + k] / s0 - mean_j * s1[k] / s0);
                }
            }
        }

        LikelihoodState {
            log_likelihood,
            gradient,
            information,
        }
    }

    /// Breslow estimate of the baseline cumulative subdistribution hazard.
    #[expect(clippy::cast_precision_loss)]
    fn breslow(&self, design: &CentredDesign, beta: &[f64]) -> (Vec<f64>, Vec<f64>) {
        let mut cumulative = 0.0;
        let mut times = Vec::with_capacity(self.event_times.len());
        let mut hazard = Vec::with_capacity(self.event_times.len());
        for et in &self.event_times {
            let s0 = et
                .members
                .iter()
                .map(|&(i, weight)| weight * design.risk(i, beta))
                .sum::<f64>();
            if s0 > 0.0 {
                cumulative += et.events as f64 / s0;
            }
            times.push(et.time);
            hazard.push(cumulative);
        }
        (times, hazard)
    }
}

fn exp_clamped(x: f64) -> f64 {
    x.clamp(-700.0, 700.0).exp()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn subject(x: f64, time: f64, status: Status) -> Subject {
        Subject {
            covariates: vec![x],
            time,
            status,
        }
    }

    fn intercept_only() -> ModelSpec {
        ModelSpec {
            cause: Status::Event,
            predictors: vec![],
            columns: vec![],
        }
    }

    fn slope() -> ModelSpec {
        ModelSpec {
            cause: Status::Event,
            predictors: vec!["x".into()],
            columns: vec![0],
        }
    }

    #[test]
    fn test_baseline_without_competing_is_nelson_aalen() {
        let subjects = (1..=4)
            .map(|t| subject(0.0, f64::from(t), Status::Event))
            .collect::<Vec<_>>();
        let model = FineGrayFitter::default()
            .fit(&intercept_only(), &subjects)
            .unwrap();
        assert!(model.converged());
        assert!((model.baseline_hazard_at(1.0) - 0.25).abs() < 1e-12);
        assert!((model.baseline_hazard_at(2.5) - (0.25 + 1.0 / 3.0)).abs() < 1e-12);
        assert_eq!(model.baseline_hazard_at(0.5), 0.0);

        let cif = model.predict_cif(&[0.0], &[1.0]);
        assert!((cif[0] - (1.0 - (-0.25_f64).exp())).abs() < 1e-12);
    }

    #[test]
    fn test_competing_subjects_stay_in_risk_set() {
        let subjects = vec![
            subject(0.0, 1.0, Status::Competing),
            subject(0.0, 2.0, Status::Event),
            subject(0.0, 3.0, Status::Censored),
            subject(0.0, 4.0, Status::Event),
        ];
        let model = FineGrayFitter::default()
            .fit(&intercept_only(), &subjects)
            .unwrap();
        // t=2: three at risk plus the competing subject at full weight.
        assert!((model.baseline_hazard_at(2.0) - 0.25).abs() < 1e-12);
        // t=4: one at risk plus the competing subject at weight G(4-) = 0.5.
        assert!((model.baseline_hazard_at(4.0) - (0.25 + 1.0 / 1.5)).abs() < 1e-12);
    }

    #[test]
    fn test_positive_effect() {
        let mut subjects = vec![];
        for (t, status) in [
            (1.0, Status::Event),
            (2.0, Status::Event),
            (4.0, Status::Competing),
            (5.0, Status::Event),
            (9.0, Status::Censored),
        ] {
            subjects.push(subject(1.0, t, status));
        }
        for (t, status) in [
            (3.0, Status::Event),
            (6.0, Status::Competing),
            (7.0, Status::Event),
            (8.0, Status::Censored),
            (10.0, Status::Censored),
        ] {
            subjects.push(subject(0.0, t, status));
        }

        let model = FineGrayFitter::default().fit(&slope(), &subjects).unwrap();
        assert!(model.converged());
        assert!(model.coefficients()[0] > 0.0);
        assert!(model.coefficients()[0] < MAX_COEFFICIENT);

        let high = model.predict_cif(&[1.0], &[0.5, 3.0, 7.0, 100.0]);
        let low = model.predict_cif(&[0.0], &[0.5, 3.0, 7.0, 100.0]);
        assert_eq!(high[0], 0.0);
        assert!(high.windows(2).all(|w| w[0] <= w[1]));
        assert!(high.iter().all(|v| (0.0..=1.0).contains(v)));
        assert!(high[2] > low[2]);
    }

    #[test]
    fn test_fit_errors() {
        let fitter = FineGrayFitter::default();
        assert_eq!(fitter.fit(&slope(), &[]).unwrap_err(), FitError::Empty);

        let censored_only = vec![
            subject(0.0, 1.0, Status::Censored),
            subject(1.0, 2.0, Status::Competing),
        ];
        assert_eq!(
            fitter.fit(&slope(), &censored_only).unwrap_err(),
            FitError::NoEvents { cause: 1 }
        );

        let wide = ModelSpec {
            cause: Status::Event,
            predictors: vec!["x".into(), "y".into()],
            columns: vec![0, 1],
        };
        let err = fitter
            .fit(&wide, &[subject(0.0, 1.0, Status::Event)])
            .unwrap_err();
        assert!(matches!(err, FitError::Dimension { expected: 2, .. }));
    }
}
