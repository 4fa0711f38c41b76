//! End-to-end training and evaluation runs.

use std::path::Path;

use log::info;

use crate::classifier::{ClassifierBuilder, ModelBundle};
use crate::config::TrainingConfig;
use crate::dataset::Dataset;
use crate::error::TriageError;
use crate::metrics::{evaluate, Metrics};
use crate::model_store::ModelStore;
use crate::split::split;

/// Parameters of a training run.
#[derive(Debug, Clone, PartialEq)]
pub struct TrainingOptions {
    /// Share of each category held out for evaluation
    pub test_fraction: f64,
    /// Seed for the stratified split
    pub seed: u64,
    pub config: TrainingConfig,
}

impl Default for TrainingOptions {
    fn default() -> Self {
        Self {
            test_fraction: 0.2,
            seed: 42,
            config: TrainingConfig::default(),
        }
    }
}

/// Result of a training run: the fitted bundle and its held-out scores.
#[derive(Debug, Clone)]
pub struct TrainingOutcome {
    pub bundle: ModelBundle,
    /// Metrics on the held-out split
    pub metrics: Metrics,
    pub n_train: usize,
    pub n_test: usize,
}

/// Splits `dataset`, fits on the train part only and scores the test part.
pub fn train(dataset: &Dataset, options: &TrainingOptions) -> Result<TrainingOutcome, TriageError> {
    options.config.validate()?;
    let (train_set, test_set) = split(dataset, options.test_fraction, options.seed)?;

    let bundle = ClassifierBuilder::new()
        .with_config(options.config.clone())
        .add_dataset(&train_set)
        .build()?;
    let metrics = evaluate(&bundle, &test_set)?;

    Ok(TrainingOutcome {
        bundle,
        metrics,
        n_train: train_set.len(),
        n_test: test_set.len(),
    })
}

/// Loads a CSV dataset, trains on it and persists the bundle at `model_path`.
pub fn train_to_path(
    data_path: impl AsRef<Path>,
    model_path: impl AsRef<Path>,
    options: &TrainingOptions,
) -> Result<TrainingOutcome, TriageError> {
    let dataset = Dataset::load(data_path)?;
    let outcome = train(&dataset, options)?;
    ModelStore::save(&outcome.bundle, model_path)?;
    info!(
        "Trained on {} tickets, held out {} (accuracy {:.4})",
        outcome.n_train, outcome.n_test, outcome.metrics.accuracy
    );
    Ok(outcome)
}

/// Scores a persisted bundle against every record of a CSV dataset.
pub fn evaluate_path(
    data_path: impl AsRef<Path>,
    model_path: impl AsRef<Path>,
) -> Result<Metrics, TriageError> {
    let dataset = Dataset::load(data_path)?;
    let bundle = ModelStore::load(model_path)?;
    Ok(evaluate(&bundle, &dataset)?)
}
