use serde::{Deserialize, Serialize};

use super::svm::LinearSvc;
use super::vectorizer::TfidfVectorizer;
use super::TicketPredictor;
use crate::config::TrainingConfig;

/// Provenance recorded when a bundle is trained.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BundleMetadata {
    /// Version of this crate that produced the bundle
    pub crate_version: String,
    /// Number of examples the classifier was fitted on
    pub n_train_samples: usize,
    /// Configuration used for fitting
    pub config: TrainingConfig,
}

/// The persisted unit: fitted vectorizer, fitted classifier and the frozen label set.
///
/// A bundle is created by [`crate::ClassifierBuilder::build`], written once by
/// [`crate::ModelStore::save`] and read many times. It exposes no mutation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelBundle {
    vectorizer: TfidfVectorizer,
    classifier: LinearSvc,
    labels: Vec<String>,
    metadata: BundleMetadata,
}

impl ModelBundle {
    pub(crate) fn new(
        vectorizer: TfidfVectorizer,
        classifier: LinearSvc,
        metadata: BundleMetadata,
    ) -> Self {
        let labels = classifier.classes().to_vec();
        Self {
            vectorizer,
            classifier,
            labels,
            metadata,
        }
    }

    /// Predicts the label for an already-built text field.
    pub fn predict_label(&self, text: &str) -> &str {
        let features = self.vectorizer.transform_one(text);
        self.classifier.predict(&features)
    }

    /// Sorted label set known to the bundle.
    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    pub fn vectorizer(&self) -> &TfidfVectorizer {
        &self.vectorizer
    }

    pub fn classifier(&self) -> &LinearSvc {
        &self.classifier
    }

    pub fn metadata(&self) -> &BundleMetadata {
        &self.metadata
    }

    /// Checks the internal invariants a freshly deserialized bundle must satisfy.
    pub(crate) fn check_consistency(&self) -> Result<(), String> {
        if !self.classifier.is_consistent() {
            return Err("classifier weights do not match its class list".into());
        }
        if self.labels.as_slice() != self.classifier.classes() {
            return Err("label set does not match classifier classes".into());
        }
        if self.labels.windows(2).any(|pair| pair[0] >= pair[1]) {
            return Err("label set is not sorted and unique".into());
        }
        if self.labels.len() < 2 {
            return Err(format!("expected at least 2 labels, found {}", self.labels.len()));
        }
        if self.classifier.n_features() != self.vectorizer.dimension() {
            return Err(format!(
                "classifier expects {} features but vectorizer produces {}",
                self.classifier.n_features(),
                self.vectorizer.dimension()
            ));
        }
        Ok(())
    }
}

impl TicketPredictor for ModelBundle {
    fn predict_text(&self, text: &str) -> String {
        self.predict_label(text).to_string()
    }
}
