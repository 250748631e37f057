use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

use crate::analyzer::Analyzer;
use crate::config::VectorizerConfig;
use crate::sparse::SparseVector;
use crate::{EngineError, TermId};

/// Term → column mapping. Columns are contiguous `[0, len)` and follow the
/// ascending order of the terms.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "Vec<String>", into = "Vec<String>")]
pub struct Vocabulary {
    terms: Vec<String>,
    index: HashMap<String, TermId>,
}

impl From<Vec<String>> for Vocabulary {
    fn from(terms: Vec<String>) -> Self {
        let index = terms.iter().enumerate().map(|(i, t)| (t.clone(), i as TermId)).collect();
        Self { terms, index }
    }
}

impl From<Vocabulary> for Vec<String> {
    fn from(vocab: Vocabulary) -> Self { vocab.terms }
}

impl Vocabulary {
    pub fn get(&self, term: &str) -> Option<TermId> { self.index.get(term).copied() }
    pub fn term(&self, column: TermId) -> Option<&str> { self.terms.get(column as usize).map(String::as_str) }
    pub fn len(&self) -> usize { self.terms.len() }
    pub fn is_empty(&self) -> bool { self.terms.is_empty() }
}

/// Fitted TF-IDF vectorizer. Immutable once built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TfidfModel {
    config: VectorizerConfig,
    vocabulary: Vocabulary,
    idf: Vec<f32>,
}

impl TfidfModel {
    /// Learns vocabulary and IDF weights from already-normalized documents.
    pub fn fit<S: AsRef<str>>(documents: &[S], config: &VectorizerConfig) -> Result<Self, EngineError> {
        config.validate()?;
        if documents.is_empty() {
            return Err(EngineError::EmptyVocabulary);
        }
        let analyzer = Analyzer::new(config);
        let num_docs = documents.len();

        let mut df: HashMap<String, u32> = HashMap::new();
        let mut term_counts: HashMap<String, u64> = HashMap::new();
        for doc in documents {
            let terms = analyzer.analyze(doc.as_ref());
            let mut seen_in_doc: HashSet<&str> = HashSet::new();
            for term in &terms {
                *term_counts.entry(term.clone()).or_insert(0) += 1;
                if seen_in_doc.insert(term.as_str()) {
                    *df.entry(term.clone()).or_insert(0) += 1;
                }
            }
        }

        let max_count = config.max_df.resolve(num_docs);
        let min_count = config.min_df.resolve(num_docs);
        if max_count < min_count {
            return Err(EngineError::InvalidConfig(
                "max_df corresponds to fewer documents than min_df".into(),
            ));
        }

        let mut kept: Vec<(String, u32)> = df
            .into_iter()
            .filter(|(_, d)| {
                let d = *d as f64;
                d >= min_count && d <= max_count
            })
            .collect();

        if let Some(limit) = config.max_features {
            if kept.len() > limit {
                kept.sort_by(|(ta, _), (tb, _)| {
                    let (ca, cb) = (term_counts[ta], term_counts[tb]);
                    cb.cmp(&ca).then_with(|| ta.cmp(tb))
                });
                kept.truncate(limit);
            }
        }
        if kept.is_empty() {
            return Err(EngineError::EmptyVocabulary);
        }
        kept.sort_by(|(ta, _), (tb, _)| ta.cmp(tb));

        let n = num_docs as f32;
        let idf: Vec<f32> = kept
            .iter()
            .map(|(_, d)| {
                let d = *d as f32;
                if config.smooth_idf { ((1.0 + n) / (1.0 + d)).ln() + 1.0 } else { (n / d).ln() + 1.0 }
            })
            .collect();
        let vocabulary = Vocabulary::from(kept.into_iter().map(|(t, _)| t).collect::<Vec<_>>());

        tracing::info!(num_docs, num_features = vocabulary.len(), "fitted tf-idf vectorizer");
        Ok(Self { config: config.clone(), vocabulary, idf })
    }

    /// Weighted, L2-normalized vector for normalized text. Terms outside the
    /// vocabulary are ignored; empty text gives the zero vector.
    pub fn vectorize(&self, normalized: &str) -> SparseVector {
        let mut counts: HashMap<TermId, u32> = HashMap::new();
        for term in Analyzer::new(&self.config).analyze(normalized) {
            if let Some(tid) = self.vocabulary.get(&term) {
                *counts.entry(tid).or_insert(0) += 1;
            }
        }
        let pairs: Vec<(TermId, f32)> = counts
            .into_iter()
            .map(|(tid, tf_raw)| {
                let tf = if self.config.sublinear_tf { 1.0 + (tf_raw as f32).ln() } else { tf_raw as f32 };
                (tid, tf * self.idf[tid as usize])
            })
            .collect();
        let mut vector = SparseVector::from_pairs(pairs);
        vector.l2_normalize();
        vector
    }

    /// Checks a deserialized model before it is served: one IDF weight per
    /// term, terms strictly ascending (so unique), finite positive weights,
    /// and a config `fit` would have accepted.
    pub fn validate(&self) -> Result<(), EngineError> {
        self.config.validate()?;
        let terms = &self.vocabulary.terms;
        if terms.is_empty() {
            return Err(EngineError::CorruptModel("vocabulary is empty".into()));
        }
        if self.idf.len() != terms.len() {
            return Err(EngineError::CorruptModel(format!(
                "{} idf weights for {} terms",
                self.idf.len(),
                terms.len()
            )));
        }
        if let Some(pair) = terms.windows(2).find(|w| w[0] >= w[1]) {
            return Err(EngineError::CorruptModel(format!(
                "vocabulary not strictly ascending at {:?} / {:?}",
                pair[0], pair[1]
            )));
        }
        if let Some(w) = self.idf.iter().find(|w| !w.is_finite() || **w <= 0.0) {
            return Err(EngineError::CorruptModel(format!("idf weight {w} is not a positive number")));
        }
        Ok(())
    }

    pub fn vocabulary(&self) -> &Vocabulary { &self.vocabulary }
    pub fn idf(&self) -> &[f32] { &self.idf }
    pub fn config(&self) -> &VectorizerConfig { &self.config }
    pub fn num_features(&self) -> usize { self.vocabulary.len() }
}
