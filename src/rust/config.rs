use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::classifier::ClassifierError;

/// Settings for the TF-IDF feature extractor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VectorizerConfig {
    /// Maximum number of terms kept in the vocabulary, most frequent first
    pub max_vocabulary_size: usize,
    /// Inclusive range of n-gram lengths, in tokens
    pub ngram_range: (usize, usize),
}

impl Default for VectorizerConfig {
    fn default() -> Self {
        Self {
            max_vocabulary_size: 50_000,
            ngram_range: (1, 2),
        }
    }
}

impl VectorizerConfig {
    pub fn validate(&self) -> Result<(), ClassifierError> {
        if self.max_vocabulary_size == 0 {
            return Err(ClassifierError::InvalidConfig(
                "max_vocabulary_size must be at least 1".into(),
            ));
        }
        let (min_n, max_n) = self.ngram_range;
        if min_n == 0 || min_n > max_n {
            return Err(ClassifierError::InvalidConfig(format!(
                "ngram_range must satisfy 1 <= min <= max, got ({}, {})",
                min_n, max_n
            )));
        }
        Ok(())
    }
}

/// Settings for the one-vs-rest linear SVM solver.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SvmConfig {
    /// Regularization strength; larger values fit the training set more tightly
    pub c: f64,
    /// Stopping tolerance of the SMO solver
    pub tol: f64,
}

impl Default for SvmConfig {
    fn default() -> Self {
        Self { c: 1.0, tol: 1e-4 }
    }
}

impl SvmConfig {
    pub fn validate(&self) -> Result<(), ClassifierError> {
        if !self.c.is_finite() || self.c <= 0.0 {
            return Err(ClassifierError::InvalidConfig(format!(
                "C must be a positive finite number, got {}",
                self.c
            )));
        }
        if !self.tol.is_finite() || self.tol <= 0.0 {
            return Err(ClassifierError::InvalidConfig(format!(
                "tol must be a positive finite number, got {}",
                self.tol
            )));
        }
        Ok(())
    }
}

/// Complete training configuration, stored alongside the fitted model.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrainingConfig {
    pub vectorizer: VectorizerConfig,
    pub svm: SvmConfig,
}

impl TrainingConfig {
    pub fn validate(&self) -> Result<(), ClassifierError> {
        self.vectorizer.validate()?;
        self.svm.validate()
    }

    /// Layers a flat key/value map over the current settings.
    ///
    /// Accepted keys are the pipeline-style names `tfidf__max_features`,
    /// `tfidf__ngram_range`, `clf__C` and `clf__tol`, plus the short aliases
    /// `max_vocabulary_size`, `ngram_range` and `C`. Unknown keys are rejected.
    pub fn apply_overrides(
        &mut self,
        overrides: &HashMap<String, Value>,
    ) -> Result<(), ClassifierError> {
        let mut updated = self.clone();
        let mut keys: Vec<&String> = overrides.keys().collect();
        keys.sort();
        for key in keys {
            let value = &overrides[key];
            match key.as_str() {
                "tfidf__max_features" | "max_vocabulary_size" => {
                    updated.vectorizer.max_vocabulary_size = as_usize(key, value)?;
                }
                "tfidf__ngram_range" | "ngram_range" => {
                    updated.vectorizer.ngram_range = as_range(key, value)?;
                }
                "clf__C" | "C" => updated.svm.c = as_f64(key, value)?,
                "clf__tol" => updated.svm.tol = as_f64(key, value)?,
                other => {
                    return Err(ClassifierError::InvalidConfig(format!(
                        "unknown parameter '{}'",
                        other
                    )))
                }
            }
        }
        updated.validate()?;
        *self = updated;
        Ok(())
    }

    /// Parses a JSON object of overrides, as passed on the command line.
    pub fn apply_json_overrides(&mut self, json: &str) -> Result<(), ClassifierError> {
        let overrides: HashMap<String, Value> = serde_json::from_str(json).map_err(|e| {
            ClassifierError::InvalidConfig(format!("parameters must be a JSON object: {}", e))
        })?;
        self.apply_overrides(&overrides)
    }
}

fn as_usize(key: &str, value: &Value) -> Result<usize, ClassifierError> {
    value.as_u64().map(|v| v as usize).ok_or_else(|| {
        ClassifierError::InvalidConfig(format!(
            "'{}' expects a non-negative integer, got {}",
            key, value
        ))
    })
}

fn as_f64(key: &str, value: &Value) -> Result<f64, ClassifierError> {
    value.as_f64().ok_or_else(|| {
        ClassifierError::InvalidConfig(format!("'{}' expects a number, got {}", key, value))
    })
}

fn as_range(key: &str, value: &Value) -> Result<(usize, usize), ClassifierError> {
    match value.as_array().map(Vec::as_slice) {
        Some([min_n, max_n]) => Ok((as_usize(key, min_n)?, as_usize(key, max_n)?)),
        _ => Err(ClassifierError::InvalidConfig(format!(
            "'{}' expects a two-element array [min, max], got {}",
            key, value
        ))),
    }
}
