use serde::{Deserialize, Serialize};

use crate::EngineError;

/// Longest n-gram a vocabulary term may span.
pub const MAX_NGRAM: usize = 3;

/// Document-frequency bound used to prune the vocabulary at fit time.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocFreqBound {
    /// Absolute number of documents.
    Count(u32),
    /// Fraction of the corpus, in `[0, 1]`.
    Proportion(f64),
}

impl DocFreqBound {
    pub fn resolve(self, num_docs: usize) -> f64 {
        match self {
            DocFreqBound::Count(c) => c as f64,
            DocFreqBound::Proportion(p) => p * num_docs as f64,
        }
    }

    fn validate(self, name: &str) -> Result<(), EngineError> {
        match self {
            DocFreqBound::Proportion(p) if !(0.0..=1.0).contains(&p) => {
                Err(EngineError::InvalidConfig(format!("{name} proportion {p} outside [0, 1]")))
            }
            _ => Ok(()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VectorizerConfig {
    pub max_features: Option<usize>,
    pub ngram_range: (usize, usize),
    pub min_df: DocFreqBound,
    pub max_df: DocFreqBound,
    pub stop_words: bool,
    pub sublinear_tf: bool,
    pub smooth_idf: bool,
}

impl Default for VectorizerConfig {
    fn default() -> Self {
        Self {
            max_features: Some(5000),
            ngram_range: (1, 2),
            min_df: DocFreqBound::Count(2),
            max_df: DocFreqBound::Proportion(0.8),
            stop_words: true,
            sublinear_tf: false,
            smooth_idf: true,
        }
    }
}

impl VectorizerConfig {
    pub fn validate(&self) -> Result<(), EngineError> {
        let (min_n, max_n) = self.ngram_range;
        if min_n == 0 || min_n > max_n || max_n > MAX_NGRAM {
            return Err(EngineError::InvalidConfig(format!(
                "ngram_range ({min_n}, {max_n}) must satisfy 1 <= min <= max <= {MAX_NGRAM}"
            )));
        }
        if self.max_features == Some(0) {
            return Err(EngineError::InvalidConfig("max_features must be positive".into()));
        }
        self.min_df.validate("min_df")?;
        self.max_df.validate("max_df")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert!(VectorizerConfig::default().validate().is_ok());
    }

    #[test]
    fn rejects_bad_ngram_range() {
        for range in [(0, 1), (2, 1), (1, 4)] {
            let cfg = VectorizerConfig { ngram_range: range, ..Default::default() };
            assert!(matches!(cfg.validate(), Err(EngineError::InvalidConfig(_))));
        }
    }

    #[test]
    fn deserializes_partial_json() {
        let cfg: VectorizerConfig =
            serde_json::from_str(r#"{"ngram_range":[1,3],"min_df":{"count":1},"max_df":{"proportion":1.0}}"#).unwrap();
        assert_eq!(cfg.ngram_range, (1, 3));
        assert_eq!(cfg.min_df, DocFreqBound::Count(1));
        assert_eq!(cfg.max_features, Some(5000));
        assert_eq!(DocFreqBound::Proportion(0.5).resolve(10), 5.0);
    }
}
