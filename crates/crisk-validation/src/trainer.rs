use crisk_model::{Dataset, ModelFitter, ModelSpec};

use crate::{CvError, Split};

/// Fits one model per split on that split's training rows.
#[derive(Debug, Clone)]
pub struct ModelTrainer<'a, F> {
    fitter: &'a F,
    spec: &'a ModelSpec,
}

impl<'a, F> ModelTrainer<'a, F>
where
    F: ModelFitter,
{
    #[must_use]
    pub fn new(fitter: &'a F, spec: &'a ModelSpec) -> Self {
        Self { fitter, spec }
    }

    /// Fits the model for `split`.
    ///
    /// A failed fit is reported with the split id; it is not retried.
    pub fn train(&self, dataset: &Dataset, split: &Split) -> Result<F::Model, CvError> {
        let training = dataset.subset(&split.train);
        self.fitter.fit(self.spec, &training).map_err(|source| {
            log::error!("{} ({}): model fit failed: {source}", split.name(), split.id);
            CvError::Fit {
                split: split.id,
                source,
            }
        })
    }
}
