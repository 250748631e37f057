use anyhow::Result;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use engine::persist::ModelPaths;
use engine::{create_recommender, Algorithm, Candidate, CandidateScore, EngineError, Recommender, ScoredResult};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub const MAX_TOP_K: i64 = 100;
const TEXT_PREVIEW_CHARS: usize = 500;

#[derive(Deserialize)]
pub struct QueryParams {
    pub q: Option<String>,
    pub query: Option<String>,
    #[serde(default = "default_query_k")]
    pub top_k: i64,
    #[serde(default)]
    pub min_score: f64,
}
fn default_query_k() -> i64 { 5 }

#[derive(Deserialize)]
pub struct HistoryRequest {
    pub history_contents: Option<Vec<String>>,
    /// Legacy single-query form, treated as a one-entry history.
    pub query: Option<String>,
    #[serde(default = "default_history_k")]
    pub top_k: i64,
    #[serde(default)]
    pub min_score: f64,
    #[serde(default)]
    pub exclude_ids: Vec<String>,
}
fn default_history_k() -> i64 { 10 }

#[derive(Deserialize)]
pub struct ScoreRequest {
    #[serde(default)]
    pub history_contents: Vec<String>,
    #[serde(default)]
    pub candidates: Vec<Candidate>,
    pub top_k: Option<i64>,
}

#[derive(Serialize)]
pub struct QueryResponse {
    pub success: bool,
    pub query: String,
    pub count: usize,
    pub recommendations: Vec<ScoredResult>,
}

#[derive(Serialize)]
pub struct HistoryResponse {
    pub success: bool,
    pub algorithm: String,
    pub count: usize,
    pub recommendations: Vec<ScoredResult>,
}

#[derive(Serialize)]
pub struct ScoreResponse {
    pub success: bool,
    pub algorithm: String,
    pub count: usize,
    pub scored_candidates: Vec<CandidateScore>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

#[derive(Clone)]
pub struct AppState {
    pub recommender: Arc<dyn Recommender>,
    pub algorithm: Algorithm,
}

/// Failure responses, all rendered as `{"success": false, "error": ...}`.
#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    NotFound,
    Engine(EngineError),
}

impl From<EngineError> for ApiError {
    fn from(err: EngineError) -> Self { ApiError::Engine(err) }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::NotFound => (StatusCode::NOT_FOUND, "Endpoint not found".to_string()),
            ApiError::Engine(EngineError::NotReady) => (StatusCode::SERVICE_UNAVAILABLE, EngineError::NotReady.to_string()),
            ApiError::Engine(err) => {
                tracing::error!(error = %err, "engine call failed");
                (StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
            }
        };
        (status, Json(serde_json::json!({ "success": false, "error": message }))).into_response()
    }
}

/// Creates the configured recommender, loads its artifacts once, and builds
/// the router around it.
pub fn build_app(models_dir: &str, algorithm: Algorithm) -> Result<Router> {
    let recommender = create_recommender(algorithm)?;
    recommender.load(&ModelPaths::new(models_dir))?;
    tracing::info!(%algorithm, models_dir, "recommender ready");
    Ok(router(Arc::from(recommender)))
}

pub fn router(recommender: Arc<dyn Recommender>) -> Router {
    let algorithm = recommender.algorithm();
    let app_state = AppState { recommender, algorithm };

    Router::new()
        .route("/api/health", get(health))
        .route("/api/model/info", get(model_info))
        .route("/api/recommend", get(recommend_query).post(recommend_history))
        .route("/api/score", post(score_candidates))
        .fallback(|| async { ApiError::NotFound })
        .with_state(app_state)
        .layer(cors_layer())
        .layer(TraceLayer::new_for_http())
}

// CORS: read CORS_ALLOW_ORIGIN (comma-separated) or allow Any by default
fn cors_layer() -> CorsLayer {
    match std::env::var("CORS_ALLOW_ORIGIN") {
        Ok(val) => {
            let origins: Vec<_> = val
                .split(',')
                .filter_map(|s| s.trim().parse().ok())
                .collect();
            if origins.is_empty() {
                CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any)
            } else {
                CorsLayer::new().allow_origin(AllowOrigin::list(origins)).allow_methods(Any).allow_headers(Any)
            }
        }
        Err(_) => CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any),
    }
}

fn validate_top_k(top_k: i64) -> Result<usize, ApiError> {
    if (1..=MAX_TOP_K).contains(&top_k) {
        Ok(top_k as usize)
    } else {
        Err(ApiError::BadRequest(format!("top_k must be an integer between 1 and {MAX_TOP_K}")))
    }
}

fn validate_min_score(min_score: f64) -> Result<f64, ApiError> {
    if (0.0..=1.0).contains(&min_score) {
        Ok(min_score)
    } else {
        Err(ApiError::BadRequest("min_score must be a number between 0 and 1".into()))
    }
}

fn truncate_text(mut result: ScoredResult) -> ScoredResult {
    if let Some((idx, _)) = result.text.char_indices().nth(TEXT_PREVIEW_CHARS) {
        result.text.truncate(idx);
    }
    result
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "healthy",
        "service": "Content-Based Recommendation API",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

async fn model_info(State(state): State<AppState>) -> Result<Json<serde_json::Value>, ApiError> {
    let info = state.recommender.model_info()?;
    Ok(Json(serde_json::json!({ "success": true, "data": info })))
}

pub async fn recommend_query(
    State(state): State<AppState>,
    params: Result<Query<QueryParams>, QueryRejection>,
) -> Result<Json<QueryResponse>, ApiError> {
    let Query(params) = params.map_err(|e| ApiError::BadRequest(format!("Invalid parameter value: {}", e.body_text())))?;
    let query = params
        .q
        .or(params.query)
        .filter(|q| !q.is_empty())
        .ok_or_else(|| ApiError::BadRequest("Missing required parameter: q or query".into()))?;
    let top_k = validate_top_k(params.top_k)?;
    let min_score = validate_min_score(params.min_score)?;

    let recommendations: Vec<ScoredResult> = state
        .recommender
        .recommend(&query, top_k, min_score)?
        .into_iter()
        .map(truncate_text)
        .collect();
    tracing::debug!(%query, count = recommendations.len(), "query recommendations");
    Ok(Json(QueryResponse { success: true, query, count: recommendations.len(), recommendations }))
}

pub async fn recommend_history(
    State(state): State<AppState>,
    body: Result<Json<HistoryRequest>, JsonRejection>,
) -> Result<Json<HistoryResponse>, ApiError> {
    let Json(req) = body.map_err(|e| ApiError::BadRequest(e.body_text()))?;
    let history = match req.history_contents {
        Some(h) if !h.is_empty() => h,
        _ => match req.query {
            Some(q) => vec![q],
            None => return Err(ApiError::BadRequest("Missing required field: history_contents".into())),
        },
    };
    let top_k = validate_top_k(req.top_k)?;
    let min_score = validate_min_score(req.min_score)?;

    let recommendations: Vec<ScoredResult> = state
        .recommender
        .recommend_from_history(&history, top_k, min_score, &req.exclude_ids)?
        .into_iter()
        .map(truncate_text)
        .collect();
    let info = state.recommender.model_info()?;
    Ok(Json(HistoryResponse {
        success: true,
        algorithm: info.algorithm,
        count: recommendations.len(),
        recommendations,
    }))
}

pub async fn score_candidates(
    State(state): State<AppState>,
    body: Result<Json<ScoreRequest>, JsonRejection>,
) -> Result<Json<ScoreResponse>, ApiError> {
    let Json(req) = body.map_err(|e| ApiError::BadRequest(e.body_text()))?;
    if req.candidates.is_empty() {
        return Err(ApiError::BadRequest("No candidates provided".into()));
    }

    let mut scored = state.recommender.score_candidates(&req.history_contents, &req.candidates)?;
    // stable: equal scores keep request order
    scored.sort_by(|a, b| b.similarity_score.total_cmp(&a.similarity_score));
    if let Some(k) = req.top_k.filter(|k| *k > 0) {
        scored.truncate(k as usize);
    }
    let note = req
        .history_contents
        .is_empty()
        .then(|| "No history available, returning unscored candidates".to_string());
    Ok(Json(ScoreResponse {
        success: true,
        algorithm: state.algorithm.to_string(),
        count: scored.len(),
        scored_candidates: scored,
        note,
    }))
}
