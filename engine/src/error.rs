/// Failures surfaced by engine calls. Degenerate inputs (empty query, empty
/// history, out-of-vocabulary text) are never errors; they produce empty or
/// zero-scored results instead.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    /// The model artifacts have not been installed yet. Safe to retry later.
    #[error("model not loaded")]
    NotReady,
    #[error("invalid vectorizer configuration: {0}")]
    InvalidConfig(String),
    #[error("inconsistent model artifacts: {0}")]
    CorruptModel(String),
    #[error("after pruning, no terms remain; try a lower min_df or a higher max_df")]
    EmptyVocabulary,
    #[error("unknown algorithm: {0}")]
    UnknownAlgorithm(String),
    #[error("{0} recommender is not available")]
    AlgorithmUnavailable(&'static str),
}
