//! Support ticket auto-triage: classify ticket text into a fixed set of categories.
//!
//! Training turns a CSV of tickets into a [`ModelBundle`] (TF-IDF vectorizer,
//! one-vs-rest linear SVM and the frozen label set); inference loads that
//! bundle once and classifies subject/description pairs.
//!
//! # Basic Usage
//!
//! ```rust
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! use ticket_triage::{ClassifierBuilder, TicketClassifier};
//!
//! let bundle = ClassifierBuilder::new()
//!     .add_example("App crash on login", "Bug Report")
//!     .add_example("Export CSV please", "Feature Request")
//!     .add_example("VPN fails to connect", "Technical Issue")
//!     .add_example("Charged twice", "Billing Inquiry")
//!     .add_example("Password reset issue", "Account Management")
//!     .build()?;
//!
//! let classifier = TicketClassifier::new(bundle);
//! let prediction = classifier.predict("Billing discrepancy", "on invoice");
//! assert!(classifier.labels().contains(&prediction.category));
//! # Ok(())
//! # }
//! ```
//!
//! # Training from a dataset
//!
//! ```no_run
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! use ticket_triage::{pipeline, TicketClassifier, TrainingOptions};
//!
//! let options = TrainingOptions::default();
//! let outcome = pipeline::train_to_path("data/tickets.csv", "models/model.bin", &options)?;
//! println!("{}", outcome.metrics);
//!
//! let classifier = TicketClassifier::load("models/model.bin")?;
//! println!("{}", classifier.predict("Charged twice", "").category);
//! # Ok(())
//! # }
//! ```

pub mod classifier;
pub mod config;
pub mod dataset;
mod error;
pub mod metrics;
pub mod model_store;
pub mod pipeline;
pub mod split;

pub use classifier::{
    BundleMetadata, ClassifierBuilder, ClassifierError, ClassifierInfo, FeatureVector, LinearSvc,
    ModelBundle, PredictRequest, Prediction, TfidfVectorizer, TicketClassifier, TicketPredictor,
};
pub use config::{SvmConfig, TrainingConfig, VectorizerConfig};
pub use dataset::{build_text, Dataset, DatasetError, TicketRecord, REQUIRED_COLUMNS};
pub use error::TriageError;
pub use metrics::{compute_metrics, evaluate, ClassMetrics, Metrics, MetricsError};
pub use model_store::{ModelError, ModelStore};
pub use pipeline::{TrainingOptions, TrainingOutcome};
pub use split::{split, SplitError};

pub fn init_logger() {
    env_logger::init();
}
