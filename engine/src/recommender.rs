use anyhow::{anyhow, ensure};
use once_cell::sync::OnceCell;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use crate::config::VectorizerConfig;
use crate::corpus::Corpus;
use crate::normalizer::normalize;
use crate::persist::{self, ModelMetadata, ModelPaths};
use crate::ranker::rank;
use crate::sparse::{cosine, SparseVector};
use crate::vectorizer::TfidfModel;
use crate::{Candidate, CandidateScore, CorpusDocument, EngineError, ModelInfo, RowId, ScoredResult};

/// Common surface of every recommendation algorithm. Implementations hold
/// read-only state once loaded, so calls may run concurrently.
pub trait Recommender: Send + Sync {
    fn algorithm(&self) -> Algorithm;

    /// Installs the fitted artifacts found under `paths`. Called once at start.
    fn load(&self, paths: &ModelPaths) -> anyhow::Result<()>;

    fn is_loaded(&self) -> bool;

    /// Ranks the corpus against a free-text query.
    fn recommend(&self, query: &str, top_k: usize, min_score: f64) -> Result<Vec<ScoredResult>, EngineError>;

    /// Ranks the corpus against the joined reading history, skipping
    /// documents whose id appears in `exclude_ids`.
    fn recommend_from_history(
        &self,
        history_contents: &[String],
        top_k: usize,
        min_score: f64,
        exclude_ids: &[String],
    ) -> Result<Vec<ScoredResult>, EngineError>;

    /// Scores external candidates against the reading history. Always one
    /// entry per candidate, in input order.
    fn score_candidates(
        &self,
        history_contents: &[String],
        candidates: &[Candidate],
    ) -> Result<Vec<CandidateScore>, EngineError>;

    fn model_info(&self) -> Result<ModelInfo, EngineError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Algorithm {
    Tfidf,
    Bert,
    Hybrid,
}

impl FromStr for Algorithm {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "tfidf" => Ok(Algorithm::Tfidf),
            "bert" => Ok(Algorithm::Bert),
            "hybrid" => Ok(Algorithm::Hybrid),
            other => Err(EngineError::UnknownAlgorithm(other.to_string())),
        }
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Algorithm::Tfidf => "tfidf",
            Algorithm::Bert => "bert",
            Algorithm::Hybrid => "hybrid",
        };
        f.write_str(name)
    }
}

/// Builds the recommender selected by configuration.
pub fn create_recommender(algorithm: Algorithm) -> Result<Box<dyn Recommender>, EngineError> {
    match algorithm {
        Algorithm::Tfidf => Ok(Box::new(TfidfRecommender::new())),
        Algorithm::Bert => Err(EngineError::AlgorithmUnavailable("bert")),
        Algorithm::Hybrid => Err(EngineError::AlgorithmUnavailable("hybrid")),
    }
}

/// Fitted vectorizer, corpus and metadata, immutable after construction.
#[derive(Debug, Clone)]
pub struct TfidfState {
    model: TfidfModel,
    corpus: Corpus,
    metadata: ModelMetadata,
}

impl TfidfState {
    pub fn new(model: TfidfModel, corpus: Corpus, metadata: ModelMetadata) -> anyhow::Result<Self> {
        ensure!(
            corpus.matrix().num_cols() == model.num_features(),
            "corpus matrix has {} columns but the vocabulary has {} terms",
            corpus.matrix().num_cols(),
            model.num_features()
        );
        Ok(Self { model, corpus, metadata })
    }

    /// Fits a vectorizer on the documents' normalized `combined_text` and
    /// vectorizes the corpus with it.
    pub fn fit(documents: Vec<CorpusDocument>, config: &VectorizerConfig) -> Result<Self, EngineError> {
        let texts: Vec<String> = documents.iter().map(|d| normalize(&d.combined_text)).collect();
        let model = TfidfModel::fit(&texts, config)?;
        let corpus = Corpus::build(documents, &model);
        let metadata = ModelMetadata::new(corpus.len(), model.num_features(), config.max_features);
        Ok(Self { model, corpus, metadata })
    }

    pub fn model(&self) -> &TfidfModel { &self.model }
    pub fn corpus(&self) -> &Corpus { &self.corpus }
    pub fn metadata(&self) -> &ModelMetadata { &self.metadata }

    /// Profile vector for a reading history: entries joined with a single
    /// space, normalized, vectorized. `None` when there is no content.
    fn profile_vector(&self, history_contents: &[String]) -> Option<SparseVector> {
        if history_contents.is_empty() {
            return None;
        }
        let cleaned = normalize(&history_contents.join(" "));
        if cleaned.is_empty() {
            return None;
        }
        Some(self.model.vectorize(&cleaned))
    }

    fn rank_corpus(
        &self,
        query: &SparseVector,
        top_k: usize,
        min_score: f64,
        exclude: &HashSet<RowId>,
    ) -> Vec<ScoredResult> {
        let matrix = self.corpus.matrix();
        let candidates = (0..matrix.num_rows()).map(|row| (row, matrix.row(row))).collect();
        let ranked = rank(query.view(), candidates, min_score, exclude, top_k);
        tracing::debug!(query_terms = query.nnz(), hits = ranked.len(), "ranked corpus");
        ranked.into_iter().map(|(row, score)| self.corpus.materialize(row, score)).collect()
    }
}

#[derive(Debug, Default)]
pub struct TfidfRecommender {
    state: OnceCell<TfidfState>,
}

impl TfidfRecommender {
    pub fn new() -> Self { Self::default() }

    pub fn with_state(state: TfidfState) -> Self {
        Self { state: OnceCell::with_value(state) }
    }

    /// Installs state exactly once; later attempts fail and keep the
    /// installed state.
    pub fn install(&self, state: TfidfState) -> anyhow::Result<()> {
        self.state.set(state).map_err(|_| anyhow!("model already loaded"))
    }

    fn state(&self) -> Result<&TfidfState, EngineError> {
        self.state.get().ok_or(EngineError::NotReady)
    }
}

impl Recommender for TfidfRecommender {
    fn algorithm(&self) -> Algorithm { Algorithm::Tfidf }

    fn load(&self, paths: &ModelPaths) -> anyhow::Result<()> {
        if self.is_loaded() {
            return Err(anyhow!("model already loaded"));
        }
        let state = persist::load_model(paths)?;
        self.install(state)
    }

    fn is_loaded(&self) -> bool { self.state.get().is_some() }

    fn recommend(&self, query: &str, top_k: usize, min_score: f64) -> Result<Vec<ScoredResult>, EngineError> {
        let state = self.state()?;
        let cleaned = normalize(query);
        if cleaned.is_empty() {
            return Ok(Vec::new());
        }
        let query_vector = state.model.vectorize(&cleaned);
        Ok(state.rank_corpus(&query_vector, top_k, min_score, &HashSet::new()))
    }

    fn recommend_from_history(
        &self,
        history_contents: &[String],
        top_k: usize,
        min_score: f64,
        exclude_ids: &[String],
    ) -> Result<Vec<ScoredResult>, EngineError> {
        let state = self.state()?;
        let Some(profile) = state.profile_vector(history_contents) else {
            return Ok(Vec::new());
        };
        let exclude = state.corpus.rows_matching(exclude_ids);
        Ok(state.rank_corpus(&profile, top_k, min_score, &exclude))
    }

    fn score_candidates(
        &self,
        history_contents: &[String],
        candidates: &[Candidate],
    ) -> Result<Vec<CandidateScore>, EngineError> {
        let state = self.state()?;
        let Some(profile) = state.profile_vector(history_contents) else {
            return Ok(candidates
                .iter()
                .map(|c| CandidateScore { id: c.id.clone(), similarity_score: 0.0 })
                .collect());
        };

        let scores: Vec<CandidateScore> = candidates
            .par_iter()
            .map(|c| {
                // Title counted twice to bias toward title relevance.
                let cleaned = normalize(&format!("{} {} {}", c.title, c.title, c.body));
                let similarity_score = if cleaned.is_empty() {
                    0.0
                } else {
                    cosine(profile.view(), state.model.vectorize(&cleaned).view())
                };
                CandidateScore { id: c.id.clone(), similarity_score }
            })
            .collect();
        Ok(scores)
    }

    fn model_info(&self) -> Result<ModelInfo, EngineError> {
        let state = self.state()?;
        Ok(ModelInfo {
            algorithm: "TF-IDF".to_string(),
            num_posts: state.metadata.num_posts,
            num_features: state.metadata.num_features,
            training_date: state.metadata.training_date.clone(),
            max_features: state.metadata.max_features,
            strategy: "content-based".to_string(),
        })
    }
}
