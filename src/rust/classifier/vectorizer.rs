use std::collections::{HashMap, HashSet};

use log::{debug, info};
use serde::{Deserialize, Serialize};

use super::error::ClassifierError;
use super::tokenizer::analyze;
use super::utils::{feature_vector, normalize_vector, FeatureVector};
use crate::config::VectorizerConfig;

/// TF-IDF vectorizer over lowercased, stopword-filtered word n-grams.
///
/// The vectorizer is a two-phase object: [`TfidfVectorizer::fit`] freezes the
/// vocabulary and document frequencies from training text only, and
/// [`TfidfVectorizer::transform`] maps any text onto that frozen space. Terms
/// outside the vocabulary contribute nothing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(into = "VectorizerState", try_from = "VectorizerState")]
pub struct TfidfVectorizer {
    config: VectorizerConfig,
    /// Terms in column order (lexically sorted)
    terms: Vec<String>,
    vocabulary: HashMap<String, usize>,
    idf: Vec<f64>,
    n_documents: usize,
}

/// On-disk shape: the term list is enough to rebuild the lookup table.
#[derive(Serialize, Deserialize)]
struct VectorizerState {
    config: VectorizerConfig,
    terms: Vec<String>,
    idf: Vec<f64>,
    n_documents: usize,
}

impl From<TfidfVectorizer> for VectorizerState {
    fn from(v: TfidfVectorizer) -> Self {
        Self {
            config: v.config,
            terms: v.terms,
            idf: v.idf,
            n_documents: v.n_documents,
        }
    }
}

impl TryFrom<VectorizerState> for TfidfVectorizer {
    type Error = String;

    fn try_from(state: VectorizerState) -> Result<Self, Self::Error> {
        if state.terms.len() != state.idf.len() {
            return Err(format!(
                "vocabulary has {} terms but {} idf weights",
                state.terms.len(),
                state.idf.len()
            ));
        }
        let vocabulary: HashMap<String, usize> = state
            .terms
            .iter()
            .enumerate()
            .map(|(idx, term)| (term.clone(), idx))
            .collect();
        if vocabulary.len() != state.terms.len() {
            return Err("vocabulary contains duplicate terms".to_string());
        }
        Ok(Self {
            config: state.config,
            terms: state.terms,
            vocabulary,
            idf: state.idf,
            n_documents: state.n_documents,
        })
    }
}

impl TfidfVectorizer {
    /// Learns the vocabulary and inverse document frequencies from `documents`.
    ///
    /// Terms are ranked by their total count across the corpus; ties go to the
    /// lexically smaller term. Only the top `max_vocabulary_size` are kept.
    pub fn fit<S: AsRef<str>>(
        documents: &[S],
        config: &VectorizerConfig,
    ) -> Result<Self, ClassifierError> {
        config.validate()?;

        let mut term_counts: HashMap<String, usize> = HashMap::new();
        let mut document_frequency: HashMap<String, usize> = HashMap::new();

        for doc in documents {
            let terms = analyze(doc.as_ref(), config.ngram_range);
            let unique: HashSet<&String> = terms.iter().collect();
            for term in unique {
                *document_frequency.entry(term.clone()).or_insert(0) += 1;
            }
            for term in terms {
                *term_counts.entry(term).or_insert(0) += 1;
            }
        }

        if term_counts.is_empty() {
            return Err(ClassifierError::EmptyVocabulary);
        }

        let mut ranked: Vec<(String, usize)> = term_counts.into_iter().collect();
        let total_terms = ranked.len();
        if ranked.len() > config.max_vocabulary_size {
            ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
            ranked.truncate(config.max_vocabulary_size);
        }

        let mut terms: Vec<String> = ranked.into_iter().map(|(term, _)| term).collect();
        terms.sort();

        let n_documents = documents.len();
        let idf: Vec<f64> = terms
            .iter()
            .map(|term| {
                let df = document_frequency.get(term).copied().unwrap_or(0);
                ((1.0 + n_documents as f64) / (1.0 + df as f64)).ln() + 1.0
            })
            .collect();

        let vocabulary = terms
            .iter()
            .enumerate()
            .map(|(idx, term)| (term.clone(), idx))
            .collect();

        info!(
            "Fitted vocabulary: {} terms kept of {} seen across {} documents",
            terms.len(),
            total_terms,
            n_documents
        );

        Ok(Self {
            config: config.clone(),
            terms,
            vocabulary,
            idf,
            n_documents,
        })
    }

    /// Maps one text onto the fitted feature space.
    pub fn transform_one(&self, text: &str) -> FeatureVector {
        let mut counts: HashMap<usize, f64> = HashMap::new();
        for term in analyze(text, self.config.ngram_range) {
            if let Some(&idx) = self.vocabulary.get(&term) {
                *counts.entry(idx).or_insert(0.0) += 1.0;
            }
        }

        let (indices, mut weights): (Vec<usize>, Vec<f64>) = counts
            .into_iter()
            .map(|(idx, tf)| (idx, tf * self.idf[idx]))
            .unzip();
        normalize_vector(&mut weights);
        feature_vector(self.dimension(), indices.into_iter().zip(weights).collect())
    }

    /// Maps each text onto the fitted feature space, preserving order.
    pub fn transform<S: AsRef<str>>(&self, documents: &[S]) -> Vec<FeatureVector> {
        let vectors: Vec<FeatureVector> =
            documents.iter().map(|d| self.transform_one(d.as_ref())).collect();
        debug!("Transformed {} documents", vectors.len());
        vectors
    }

    pub fn dimension(&self) -> usize {
        self.terms.len()
    }

    pub fn vocabulary_size(&self) -> usize {
        self.terms.len()
    }

    /// Terms in column order.
    pub fn terms(&self) -> &[String] {
        &self.terms
    }

    pub fn index_of(&self, term: &str) -> Option<usize> {
        self.vocabulary.get(term).copied()
    }

    pub fn idf(&self, term: &str) -> Option<f64> {
        self.index_of(term).map(|idx| self.idf[idx])
    }

    pub fn config(&self) -> &VectorizerConfig {
        &self.config
    }

    pub fn n_documents(&self) -> usize {
        self.n_documents
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn corpus() -> Vec<&'static str> {
        vec![
            "App crash on login",
            "Export CSV please",
            "VPN fails to connect",
            "Charged twice",
            "Password reset issue",
        ]
    }

    #[test]
    fn test_fit_builds_sorted_vocabulary() {
        let v = TfidfVectorizer::fit(&corpus(), &VectorizerConfig::default()).unwrap();
        let mut sorted = v.terms().to_vec();
        sorted.sort();
        assert_eq!(v.terms(), sorted.as_slice());
        assert!(v.index_of("crash").is_some());
        assert!(v.index_of("vpn fails").is_some());
        assert!(v.index_of("please").is_none());
        assert_eq!(v.n_documents(), 5);
    }

    #[test]
    fn test_smooth_idf() {
        let docs = vec!["refund refund", "refund invoice"];
        let config = VectorizerConfig { max_vocabulary_size: 100, ngram_range: (1, 1) };
        let v = TfidfVectorizer::fit(&docs, &config).unwrap();
        // df(refund) = 2, df(invoice) = 1, n = 2
        assert!((v.idf("refund").unwrap() - 1.0).abs() < 1e-12);
        assert!((v.idf("invoice").unwrap() - ((3.0f64 / 2.0).ln() + 1.0)).abs() < 1e-12);
    }

    #[test]
    fn test_vocabulary_cap_prefers_frequent_then_lexical() {
        let docs = vec!["zeta zeta alpha beta", "zeta gamma"];
        let config = VectorizerConfig { max_vocabulary_size: 2, ngram_range: (1, 1) };
        let v = TfidfVectorizer::fit(&docs, &config).unwrap();
        // zeta (3) wins outright; alpha, beta, gamma tie at 1 and alpha is lexically first
        assert_eq!(v.terms(), &["alpha".to_string(), "zeta".to_string()]);
    }

    #[test]
    fn test_transform_is_l2_normalized() {
        let v = TfidfVectorizer::fit(&corpus(), &VectorizerConfig::default()).unwrap();
        let x = v.transform_one("App crash on login");
        let squared_norm: f64 = x.data().iter().map(|v| v * v).sum();
        assert!((squared_norm - 1.0).abs() < 1e-9);
        assert_eq!(x.dim(), v.dimension());
    }

    #[test]
    fn test_unknown_terms_contribute_nothing() {
        let v = TfidfVectorizer::fit(&corpus(), &VectorizerConfig::default()).unwrap();
        let before = v.clone();
        let x = v.transform_one("quarterly synergy roadmap");
        assert_eq!(x.nnz(), 0);
        assert_eq!(x.dim(), v.dimension());
        assert_eq!(v.transform_one("").nnz(), 0);
        assert_eq!(v, before);
    }

    #[test]
    fn test_empty_vocabulary() {
        let docs = vec!["the and of", ""];
        assert_eq!(
            TfidfVectorizer::fit(&docs, &VectorizerConfig::default()).unwrap_err(),
            ClassifierError::EmptyVocabulary
        );
    }

    #[test]
    fn test_serde_round_trip_rebuilds_lookup() {
        let v = TfidfVectorizer::fit(&corpus(), &VectorizerConfig::default()).unwrap();
        let json = serde_json::to_string(&v).unwrap();
        let restored: TfidfVectorizer = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, v);
        assert_eq!(restored.transform_one("vpn"), v.transform_one("vpn"));
    }
}
