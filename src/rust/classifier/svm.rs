use linfa::prelude::*;
use linfa_svm::Svm;
use log::{debug, info};
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};

use super::error::ClassifierError;
use super::utils::{sparse_dot, to_dense, FeatureVector};
use crate::config::SvmConfig;

/// One-vs-rest linear support vector classifier.
///
/// Each class gets a weight row and an intercept separating it from every
/// other class. The binary separators are C-SVC fits with a linear kernel;
/// the support vector expansion `w = sum(alpha_i * x_i)` is folded into a
/// dense weight row so prediction is `w.x - rho` per class.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinearSvc {
    /// Sorted, deduplicated class labels; row `k` of `weights` belongs to `classes[k]`
    classes: Vec<String>,
    weights: Array2<f64>,
    intercepts: Array1<f64>,
}

impl LinearSvc {
    /// Trains one binary separator per distinct label.
    ///
    /// # Errors
    /// - `LengthMismatch` if `vectors` and `labels` differ in length
    /// - `EmptyTrainingSet` if there are no examples
    /// - `InsufficientClasses` if fewer than two distinct labels are present
    /// - `InvalidConfig` if `config` does not validate
    /// - `Training` if the solver rejects a subproblem
    pub fn fit<L: AsRef<str>>(
        vectors: &[FeatureVector],
        labels: &[L],
        config: &SvmConfig,
    ) -> Result<Self, ClassifierError> {
        if vectors.len() != labels.len() {
            return Err(ClassifierError::LengthMismatch {
                vectors: vectors.len(),
                labels: labels.len(),
            });
        }
        if vectors.is_empty() {
            return Err(ClassifierError::EmptyTrainingSet);
        }

        let mut classes: Vec<String> = labels.iter().map(|l| l.as_ref().to_string()).collect();
        classes.sort();
        classes.dedup();
        if classes.len() < 2 {
            return Err(ClassifierError::InsufficientClasses { found: classes.len() });
        }
        config.validate()?;

        let dim = vectors.iter().map(FeatureVector::dim).max().unwrap_or(0);
        let records = to_dense(vectors, dim);
        let mut weights = Array2::zeros((classes.len(), dim));
        let mut intercepts = Array1::zeros(classes.len());

        info!(
            "Training {} one-vs-rest separators on {} examples with {} features (C={})",
            classes.len(),
            vectors.len(),
            dim,
            config.c
        );

        for (k, class) in classes.iter().enumerate() {
            let targets: Array1<bool> = labels.iter().map(|l| l.as_ref() == class).collect();
            let dataset = Dataset::new(records.clone(), targets);

            let model = Svm::<_, bool>::params()
                .pos_neg_weights(config.c, config.c)
                .eps(config.tol)
                .linear_kernel()
                .fit(&dataset)
                .map_err(|e| ClassifierError::Training(format!("class '{}': {}", class, e)))?;

            // w = sum(alpha_i * x_i); alpha already carries the target sign
            let mut row = weights.row_mut(k);
            for (x, &alpha) in vectors.iter().zip(model.alpha.iter()) {
                if alpha != 0.0 {
                    for (idx, &v) in x.iter() {
                        row[idx] += alpha * v;
                    }
                }
            }
            intercepts[k] = -model.rho;
            debug!(
                "Class '{}': {} support vectors, rho={:.6}",
                class,
                model.nsupport(),
                model.rho
            );
        }

        Ok(Self {
            classes,
            weights,
            intercepts,
        })
    }

    /// Per-class decision scores, aligned with [`LinearSvc::classes`].
    pub fn decision_function(&self, x: &FeatureVector) -> Array1<f64> {
        Array1::from_iter(
            self.weights
                .rows()
                .into_iter()
                .zip(self.intercepts.iter())
                .map(|(row, &b)| sparse_dot(x, &row) + b),
        )
    }

    /// Returns the class with the highest decision score.
    ///
    /// Equal scores resolve to the class that sorts first, since the margin
    /// objective gives no preference between them.
    pub fn predict(&self, x: &FeatureVector) -> &str {
        let scores = self.decision_function(x);
        let mut best = 0;
        for (k, &score) in scores.iter().enumerate().skip(1) {
            if score > scores[best] {
                best = k;
            }
        }
        &self.classes[best]
    }

    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    pub fn n_features(&self) -> usize {
        self.weights.ncols()
    }

    pub(crate) fn is_consistent(&self) -> bool {
        self.weights.nrows() == self.classes.len() && self.intercepts.len() == self.classes.len()
    }
}
