use crate::classifier::ClassifierError;
use crate::dataset::DatasetError;
use crate::metrics::MetricsError;
use crate::model_store::ModelError;
use crate::split::SplitError;

/// Any error raised by the training and evaluation pipeline.
#[derive(Debug, thiserror::Error)]
pub enum TriageError {
    #[error(transparent)]
    Dataset(#[from] DatasetError),
    #[error(transparent)]
    Split(#[from] SplitError),
    #[error(transparent)]
    Classifier(#[from] ClassifierError),
    #[error(transparent)]
    Model(#[from] ModelError),
    #[error(transparent)]
    Metrics(#[from] MetricsError),
}
