use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::model::ModelBundle;
use super::{ClassifierInfo, TicketPredictor};
use crate::dataset::build_text;
use crate::model_store::{ModelError, ModelStore};

/// Prediction request as sent by the API and UI collaborators. Missing fields are empty.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PredictRequest {
    #[serde(default)]
    pub subject: String,
    #[serde(default)]
    pub description: String,
}

/// Prediction response: the raw category label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Prediction {
    pub category: String,
}

/// Read-only inference handle over a loaded [`ModelBundle`].
///
/// Load it once at startup and share it; predictions never retrain or mutate
/// the bundle, so no locking is needed.
///
/// ```no_run
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// use ticket_triage::TicketClassifier;
/// use std::sync::Arc;
/// use std::thread;
///
/// let classifier = Arc::new(TicketClassifier::load("models/model.bin")?);
///
/// let classifier_clone = Arc::clone(&classifier);
/// thread::spawn(move || {
///     let prediction = classifier_clone.predict("Billing issue", "Charged twice this month");
///     println!("{}", prediction.category);
/// });
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct TicketClassifier {
    bundle: Arc<ModelBundle>,
}

// Compile-time verification of thread-safety
const _: () = {
    fn assert_send_sync<T: Send + Sync>() {}
    fn verify_thread_safety() {
        assert_send_sync::<TicketClassifier>();
    }
};

impl TicketClassifier {
    /// Wraps an in-memory bundle, e.g. one just produced by training
    pub fn new(bundle: ModelBundle) -> Self {
        Self {
            bundle: Arc::new(bundle),
        }
    }

    /// Loads a persisted bundle
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ModelError> {
        Ok(Self::new(ModelStore::load(path)?))
    }

    /// Classifies a ticket. Empty subject and description are accepted.
    pub fn predict(&self, subject: &str, description: &str) -> Prediction {
        let text = build_text(Some(subject), Some(description));
        Prediction {
            category: self.bundle.predict_label(&text).to_string(),
        }
    }

    pub fn predict_request(&self, request: &PredictRequest) -> Prediction {
        self.predict(&request.subject, &request.description)
    }

    pub fn labels(&self) -> &[String] {
        self.bundle.labels()
    }

    pub fn bundle(&self) -> &ModelBundle {
        &self.bundle
    }

    /// Returns information about the loaded model
    pub fn info(&self) -> ClassifierInfo {
        ClassifierInfo {
            labels: self.bundle.labels().to_vec(),
            num_classes: self.bundle.labels().len(),
            vocabulary_size: self.bundle.vectorizer().vocabulary_size(),
            n_train_samples: self.bundle.metadata().n_train_samples,
            crate_version: self.bundle.metadata().crate_version.clone(),
            config: self.bundle.metadata().config.clone(),
        }
    }
}

impl TicketPredictor for TicketClassifier {
    fn predict_text(&self, text: &str) -> String {
        self.bundle.predict_label(text).to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ClassifierBuilder;

    fn setup_test_classifier() -> TicketClassifier {
        let bundle = ClassifierBuilder::new()
            .add_example("Charged twice for subscription", "Billing Inquiry")
            .add_example("Invoice amount wrong", "Billing Inquiry")
            .add_example("App crash on login", "Bug Report")
            .add_example("Crash when exporting report", "Bug Report")
            .build()
            .expect("Failed to train classifier");
        TicketClassifier::new(bundle)
    }

    #[test]
    fn test_predict_uses_subject_and_description() {
        let classifier = setup_test_classifier();
        assert_eq!(classifier.predict("Invoice", "charged twice").category, "Billing Inquiry");
        assert_eq!(classifier.predict("", "app crash").category, "Bug Report");
    }

    #[test]
    fn test_empty_request_still_returns_known_label() {
        let classifier = setup_test_classifier();
        let prediction = classifier.predict_request(&PredictRequest::default());
        assert!(classifier.labels().contains(&prediction.category));
    }

    #[test]
    fn test_request_fields_default_to_empty() {
        let request: PredictRequest = serde_json::from_str(r#"{"subject": "crash"}"#).unwrap();
        assert_eq!(request.description, "");
        let prediction = Prediction { category: "Bug Report".into() };
        let response = serde_json::to_string(&prediction).unwrap();
        assert_eq!(response, r#"{"category":"Bug Report"}"#);
    }

    #[test]
    fn test_class_info() {
        let classifier = setup_test_classifier();
        let info = classifier.info();
        assert_eq!(info.num_classes, 2);
        assert_eq!(info.n_train_samples, 4);
        assert!(info.vocabulary_size > 0);
    }
}
