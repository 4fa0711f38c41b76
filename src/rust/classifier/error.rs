use std::fmt;

/// Represents the different types of errors that can occur while fitting the classifier.
#[derive(Debug, Clone, PartialEq)]
pub enum ClassifierError {
    /// Fewer than two distinct labels were available for training
    InsufficientClasses {
        /// Number of distinct labels that were found
        found: usize,
    },
    /// The training corpus produced no terms (empty text or only stopwords)
    EmptyVocabulary,
    /// Feature vectors and labels were not aligned
    LengthMismatch { vectors: usize, labels: usize },
    /// No training examples were supplied
    EmptyTrainingSet,
    /// A configuration value was out of range or could not be parsed
    InvalidConfig(String),
    /// The SVM solver rejected a one-vs-rest subproblem
    Training(String),
}

impl fmt::Display for ClassifierError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InsufficientClasses { found } => write!(
                f,
                "Insufficient classes: need at least 2 distinct labels to train, found {}",
                found
            ),
            Self::EmptyVocabulary => write!(
                f,
                "Empty vocabulary: training documents contain only stopwords or no tokens"
            ),
            Self::LengthMismatch { vectors, labels } => write!(
                f,
                "Length mismatch: {} feature vectors but {} labels",
                vectors, labels
            ),
            Self::EmptyTrainingSet => write!(f, "Training set is empty"),
            Self::InvalidConfig(msg) => write!(f, "Invalid configuration: {}", msg),
            Self::Training(msg) => write!(f, "Training failed: {}", msg),
        }
    }
}

impl std::error::Error for ClassifierError {}
