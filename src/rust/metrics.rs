//! Accuracy and per-class precision/recall/F1 against held-out labels.

use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use log::info;
use serde::{Deserialize, Serialize};

use crate::classifier::TicketPredictor;
use crate::dataset::Dataset;

#[derive(Debug, thiserror::Error)]
pub enum MetricsError {
    #[error("Length mismatch: {truth} true labels but {predicted} predictions")]
    LengthMismatch { truth: usize, predicted: usize },
    #[error("Failed to write report to {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Failed to serialize report: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Scores for a single label.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassMetrics {
    pub label: String,
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    /// Number of true instances of the label
    pub support: usize,
}

/// Unweighted or support-weighted mean over the per-class rows.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AveragedMetrics {
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Metrics {
    pub accuracy: f64,
    /// Number of evaluated examples
    pub total: usize,
    pub correct: usize,
    /// One row per label of the true-label set, sorted by label
    pub per_class: Vec<ClassMetrics>,
    pub macro_avg: AveragedMetrics,
    pub weighted_avg: AveragedMetrics,
}

#[derive(Default)]
struct Counts {
    true_positive: usize,
    predicted: usize,
    actual: usize,
}

fn ratio(numerator: usize, denominator: usize) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        numerator as f64 / denominator as f64
    }
}

/// Computes metrics from aligned true and predicted labels.
///
/// Precision of a label that was never predicted is 0, and F1 is 0 whenever
/// precision and recall are both 0. Rows are kept for true labels only, but
/// the averages run over every label seen on either side, so a label that is
/// only ever predicted pulls the macro average down with zero precision and
/// recall, as `classification_report` does.
pub fn compute_metrics<T: AsRef<str>, P: AsRef<str>>(
    y_true: &[T],
    y_pred: &[P],
) -> Result<Metrics, MetricsError> {
    if y_true.len() != y_pred.len() {
        return Err(MetricsError::LengthMismatch {
            truth: y_true.len(),
            predicted: y_pred.len(),
        });
    }

    let mut counts: BTreeMap<&str, Counts> = BTreeMap::new();
    let mut correct = 0;
    for (truth, pred) in y_true.iter().zip(y_pred) {
        let (truth, pred) = (truth.as_ref(), pred.as_ref());
        counts.entry(truth).or_default().actual += 1;
        let c = counts.entry(pred).or_default();
        c.predicted += 1;
        if truth == pred {
            c.true_positive += 1;
            correct += 1;
        }
    }

    let rows: Vec<ClassMetrics> = counts
        .iter()
        .map(|(label, c)| {
            let precision = ratio(c.true_positive, c.predicted);
            let recall = ratio(c.true_positive, c.actual);
            let f1 = if precision + recall > 0.0 {
                2.0 * precision * recall / (precision + recall)
            } else {
                0.0
            };
            ClassMetrics {
                label: label.to_string(),
                precision,
                recall,
                f1,
                support: c.actual,
            }
        })
        .collect();

    let macro_avg = average(&rows, |_| 1.0);
    let weighted_avg = average(&rows, |c| c.support as f64);
    let per_class = rows.into_iter().filter(|c| c.support > 0).collect();

    let total = y_true.len();
    Ok(Metrics {
        accuracy: ratio(correct, total),
        total,
        correct,
        per_class,
        macro_avg,
        weighted_avg,
    })
}

fn average(rows: &[ClassMetrics], weight: impl Fn(&ClassMetrics) -> f64) -> AveragedMetrics {
    let total_weight: f64 = rows.iter().map(&weight).sum();
    if total_weight == 0.0 {
        return AveragedMetrics { precision: 0.0, recall: 0.0, f1: 0.0 };
    }
    let weighted = |field: fn(&ClassMetrics) -> f64| {
        rows.iter().map(|r| field(r) * weight(r)).sum::<f64>() / total_weight
    };
    AveragedMetrics {
        precision: weighted(|r| r.precision),
        recall: weighted(|r| r.recall),
        f1: weighted(|r| r.f1),
    }
}

/// Predicts every record of `dataset` with `predictor` and scores the result.
pub fn evaluate<P: TicketPredictor + ?Sized>(
    predictor: &P,
    dataset: &Dataset,
) -> Result<Metrics, MetricsError> {
    let y_pred: Vec<String> = dataset
        .text_fields()
        .iter()
        .map(|text| predictor.predict_text(text))
        .collect();
    let metrics = compute_metrics(&dataset.labels(), &y_pred)?;
    info!(
        "Evaluated {} tickets: accuracy {:.4} ({} correct)",
        metrics.total, metrics.accuracy, metrics.correct
    );
    Ok(metrics)
}

impl Metrics {
    pub fn class(&self, label: &str) -> Option<&ClassMetrics> {
        self.per_class.iter().find(|c| c.label == label)
    }

    /// Writes the full report as pretty JSON, creating parent directories.
    pub fn write_json<P: AsRef<Path>>(&self, path: P) -> Result<(), MetricsError> {
        let path = path.as_ref();
        let write_error = |source| MetricsError::Write {
            path: path.to_path_buf(),
            source,
        };
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(write_error)?;
        }
        fs::write(path, serde_json::to_string_pretty(self)?).map_err(write_error)?;
        info!("Report written to {}", path.display());
        Ok(())
    }
}

impl fmt::Display for Metrics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let width = self
            .per_class
            .iter()
            .map(|c| c.label.len())
            .chain(std::iter::once("weighted avg".len()))
            .max()
            .unwrap_or(0);

        writeln!(
            f,
            "{:>width$}  {:>9}  {:>9}  {:>9}  {:>9}",
            "", "precision", "recall", "f1-score", "support"
        )?;
        writeln!(f)?;
        for c in &self.per_class {
            writeln!(
                f,
                "{:>width$}  {:>9.2}  {:>9.2}  {:>9.2}  {:>9}",
                c.label, c.precision, c.recall, c.f1, c.support
            )?;
        }
        writeln!(f)?;
        writeln!(
            f,
            "{:>width$}  {:>9}  {:>9}  {:>9.2}  {:>9}",
            "accuracy", "", "", self.accuracy, self.total
        )?;
        for (name, avg) in [("macro avg", &self.macro_avg), ("weighted avg", &self.weighted_avg)] {
            writeln!(
                f,
                "{:>width$}  {:>9.2}  {:>9.2}  {:>9.2}  {:>9}",
                name, avg.precision, avg.recall, avg.f1, self.total
            )?;
        }
        Ok(())
    }
}
