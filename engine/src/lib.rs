pub mod analyzer;
pub mod config;
pub mod corpus;
pub mod error;
pub mod normalizer;
pub mod persist;
pub mod ranker;
pub mod recommender;
pub mod sparse;
pub mod vectorizer;

use serde::{Deserialize, Serialize};

pub use error::EngineError;
pub use recommender::{create_recommender, Algorithm, Recommender, TfidfRecommender};

pub type TermId = u32;
pub type RowId = usize;

/// One post of the pre-vectorized corpus. Row `i` of the corpus matrix
/// belongs to the `i`-th document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CorpusDocument {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub combined_text: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub subreddit: String,
    #[serde(default)]
    pub score: i64,
    #[serde(default)]
    pub created_utc: i64,
}

/// A caller-supplied post scored on demand. Missing fields deserialize to
/// empty strings, which normalize to "no content".
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub body: String,
}

/// A corpus document materialized together with its similarity to the query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredResult {
    pub id: String,
    pub title: String,
    pub text: String,
    pub url: String,
    pub subreddit: String,
    pub score: i64,
    pub similarity_score: f32,
    pub created_utc: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateScore {
    pub id: String,
    pub similarity_score: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelInfo {
    pub algorithm: String,
    pub num_posts: usize,
    pub num_features: usize,
    pub training_date: String,
    pub max_features: Option<usize>,
    pub strategy: String,
}
