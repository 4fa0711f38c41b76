use std::collections::BTreeSet;
use std::time::Instant;

use log::info;

use super::error::ClassifierError;
use super::model::{BundleMetadata, ModelBundle};
use super::svm::LinearSvc;
use super::vectorizer::TfidfVectorizer;
use crate::config::TrainingConfig;
use crate::dataset::Dataset;

/// A builder for training a [`ModelBundle`] with a fluent interface.
///
/// # Example
/// ```
/// use ticket_triage::ClassifierBuilder;
///
/// let bundle = ClassifierBuilder::new()
///     .with_regularization(1.0)
///     .add_example("App crash on login", "Bug Report")
///     .add_example("Charged twice", "Billing Inquiry")
///     .build()
///     .unwrap();
/// assert_eq!(bundle.labels().len(), 2);
/// ```
#[derive(Debug, Clone, Default)]
pub struct ClassifierBuilder {
    config: TrainingConfig,
    texts: Vec<String>,
    labels: Vec<String>,
}

impl ClassifierBuilder {
    /// Creates an empty builder with the default training configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the whole training configuration
    pub fn with_config(mut self, config: TrainingConfig) -> Self {
        self.config = config;
        self
    }

    /// Caps the vocabulary at the `size` most frequent terms
    pub fn with_max_vocabulary_size(mut self, size: usize) -> Self {
        self.config.vectorizer.max_vocabulary_size = size;
        self
    }

    /// Sets the inclusive range of n-gram lengths
    pub fn with_ngram_range(mut self, min_n: usize, max_n: usize) -> Self {
        self.config.vectorizer.ngram_range = (min_n, max_n);
        self
    }

    /// Sets the regularization strength `C` of the SVM
    pub fn with_regularization(mut self, c: f64) -> Self {
        self.config.svm.c = c;
        self
    }

    /// Adds one training example. `text` should already be a built text field.
    pub fn add_example(mut self, text: impl Into<String>, label: impl Into<String>) -> Self {
        self.texts.push(text.into());
        self.labels.push(label.into());
        self
    }

    /// Adds aligned `(text, label)` pairs.
    pub fn add_examples<T, L>(mut self, examples: impl IntoIterator<Item = (T, L)>) -> Self
    where
        T: Into<String>,
        L: Into<String>,
    {
        for (text, label) in examples {
            self.texts.push(text.into());
            self.labels.push(label.into());
        }
        self
    }

    /// Adds every record of `dataset`, deriving each text field the same way inference does.
    pub fn add_dataset(self, dataset: &Dataset) -> Self {
        let examples: Vec<(String, String)> = dataset
            .text_fields()
            .into_iter()
            .zip(dataset.labels().into_iter().map(str::to_string))
            .collect();
        self.add_examples(examples)
    }

    pub fn config(&self) -> &TrainingConfig {
        &self.config
    }

    /// Fits the vectorizer on the collected texts, then the classifier on their vectors.
    ///
    /// # Errors
    /// - `EmptyTrainingSet` if no examples were added
    /// - `InsufficientClasses` if fewer than two distinct labels were added
    /// - `InvalidConfig` if the configuration does not validate
    /// - `EmptyVocabulary` if the texts yield no terms
    /// - `Training` if the SVM solver fails on a class
    pub fn build(self) -> Result<ModelBundle, ClassifierError> {
        if self.texts.is_empty() {
            return Err(ClassifierError::EmptyTrainingSet);
        }
        let distinct: BTreeSet<&str> = self.labels.iter().map(String::as_str).collect();
        if distinct.len() < 2 {
            return Err(ClassifierError::InsufficientClasses { found: distinct.len() });
        }
        self.config.validate()?;

        let start = Instant::now();
        info!(
            "Training on {} examples across {} classes",
            self.texts.len(),
            distinct.len()
        );

        let vectorizer = TfidfVectorizer::fit(&self.texts, &self.config.vectorizer)?;
        let vectors = vectorizer.transform(&self.texts);
        let classifier = LinearSvc::fit(&vectors, &self.labels, &self.config.svm)?;

        info!("Training finished in {:.2?}", start.elapsed());

        let metadata = BundleMetadata {
            crate_version: env!("CARGO_PKG_VERSION").to_string(),
            n_train_samples: self.texts.len(),
            config: self.config,
        };
        Ok(ModelBundle::new(vectorizer, classifier, metadata))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_collects_configuration() {
        let builder = ClassifierBuilder::new()
            .with_max_vocabulary_size(10)
            .with_ngram_range(1, 1)
            .with_regularization(0.5);
        assert_eq!(builder.config().vectorizer.max_vocabulary_size, 10);
        assert_eq!(builder.config().vectorizer.ngram_range, (1, 1));
        assert_eq!(builder.config().svm.c, 0.5);
    }

    #[test]
    fn test_single_class_is_rejected_before_fitting() {
        let result = ClassifierBuilder::new()
            .add_example("the and of", "Bug Report")
            .add_example("", "Bug Report")
            .build();
        // Class count is checked before the vocabulary, so the empty text is never reached.
        assert_eq!(result.unwrap_err(), ClassifierError::InsufficientClasses { found: 1 });
    }

    #[test]
    fn test_empty_builder() {
        assert_eq!(
            ClassifierBuilder::new().build().unwrap_err(),
            ClassifierError::EmptyTrainingSet
        );
    }

    #[test]
    fn test_invalid_config() {
        let result = ClassifierBuilder::new()
            .with_ngram_range(0, 2)
            .add_example("crash", "Bug Report")
            .add_example("invoice", "Billing Inquiry")
            .build();
        assert!(matches!(result, Err(ClassifierError::InvalidConfig(_))));
    }

    #[test]
    fn test_build_freezes_sorted_labels() {
        let bundle = ClassifierBuilder::new()
            .add_examples(vec![
                ("Password reset issue", "Account Management"),
                ("App crash on login", "Bug Report"),
                ("Charged twice", "Billing Inquiry"),
                ("App freezes on login", "Bug Report"),
            ])
            .build()
            .unwrap();
        assert_eq!(
            bundle.labels(),
            &["Account Management", "Billing Inquiry", "Bug Report"]
        );
        assert_eq!(bundle.metadata().n_train_samples, 4);
        assert!(bundle.check_consistency().is_ok());
    }
}
