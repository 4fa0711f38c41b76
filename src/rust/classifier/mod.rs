mod builder;
#[allow(clippy::module_inception)]
mod classifier;
mod error;
mod model;
mod svm;
mod tokenizer;
mod utils;
mod vectorizer;

use serde::Serialize;

use crate::config::TrainingConfig;

pub use builder::ClassifierBuilder;
pub use classifier::{PredictRequest, Prediction, TicketClassifier};
pub use error::ClassifierError;
pub use model::{BundleMetadata, ModelBundle};
pub use svm::LinearSvc;
pub use utils::FeatureVector;
pub use vectorizer::TfidfVectorizer;

/// Anything that maps a built text field to a label.
///
/// Implemented by [`ModelBundle`] and [`TicketClassifier`]; the evaluator is
/// written against this trait so it can be exercised with stub predictors.
pub trait TicketPredictor {
    fn predict_text(&self, text: &str) -> String;
}

/// Information about a loaded classifier
#[derive(Debug, Clone, Serialize)]
pub struct ClassifierInfo {
    pub labels: Vec<String>,
    pub num_classes: usize,
    pub vocabulary_size: usize,
    pub n_train_samples: usize,
    pub crate_version: String,
    pub config: TrainingConfig,
}
