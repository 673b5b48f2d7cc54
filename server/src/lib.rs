use anyhow::Result;
use axum::{
    extract::{Form, Path, Query, State},
    http::{HeaderMap, StatusCode},
    routing::{get, post},
    Json, Router,
};
use parking_lot::RwLock;
use policy_core::{Engine, Generation, ResultRecord, SchemeDocument, DEFAULT_TOP_K};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

const MAX_TOP_K: usize = 100;

#[derive(Deserialize)]
pub struct SearchParams {
    pub q: String,
    #[serde(default = "default_k")]
    pub k: usize,
}

#[derive(Deserialize)]
pub struct SearchForm {
    pub query: String,
    #[serde(default = "default_k")]
    pub k: usize,
}

fn default_k() -> usize { DEFAULT_TOP_K }

#[derive(Serialize)]
pub struct SearchResponse {
    pub query: String,
    pub took_ms: u128,
    pub took_s: f64,
    /// Returned results with a non-zero score.
    pub total_hits: usize,
    pub generation: u64,
    pub results: Vec<ResultRecord>,
}

/// Where the artifacts live and how the server should hold them.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub model_path: PathBuf,
    pub matrix_path: PathBuf,
    pub cache_capacity: usize,
    pub admin_token: Option<String>,
}

#[derive(Clone)]
pub struct AppState {
    current: Arc<RwLock<Arc<Generation>>>,
    next_generation: Arc<AtomicU64>,
    config: Arc<ServerConfig>,
}

impl AppState {
    /// Loads the first generation. Fails when either artifact is missing or
    /// the pair is inconsistent, so nothing is served from a bad index.
    pub fn load(config: ServerConfig) -> Result<Self> {
        let engine = Engine::initialize(&config.model_path, &config.matrix_path)?;
        let generation = Generation::new(1, engine, config.cache_capacity);
        Ok(Self {
            current: Arc::new(RwLock::new(Arc::new(generation))),
            next_generation: Arc::new(AtomicU64::new(2)),
            config: Arc::new(config),
        })
    }

    pub fn current(&self) -> Arc<Generation> {
        self.current.read().clone()
    }

    /// Builds a fresh generation from disk and swaps it in. On failure the
    /// current generation keeps serving.
    pub fn reload(&self) -> policy_core::Result<u64> {
        let engine = Engine::initialize(&self.config.model_path, &self.config.matrix_path)?;
        let id = self.next_generation.fetch_add(1, Ordering::SeqCst);
        let generation = Arc::new(Generation::new(id, engine, self.config.cache_capacity));
        *self.current.write() = generation;
        tracing::info!(generation = id, "artifacts reloaded");
        Ok(id)
    }
}

pub fn build_app(config: ServerConfig) -> Result<Router> {
    let app_state = AppState::load(config)?;

    // CORS: read CORS_ALLOW_ORIGIN (comma-separated) or allow Any by default
    let cors = match std::env::var("CORS_ALLOW_ORIGIN") {
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
    };

    let app = Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/search", get(search_handler).post(search_form_handler))
        .route("/doc/:slug", get(doc_handler))
        .route("/admin/reload", post(reload_handler))
        .with_state(app_state)
        .layer(cors)
        .layer(TraceLayer::new_for_http());
    Ok(app)
}

fn run_search(state: &AppState, query: String, k: usize) -> SearchResponse {
    let start = Instant::now();
    let generation = state.current();
    let k = k.clamp(1, MAX_TOP_K);
    let results = generation.search(&query, k);
    let total_hits = results.iter().filter(|r| r.score > 0.0).count();
    let elapsed = start.elapsed();
    SearchResponse {
        query,
        took_ms: elapsed.as_millis(),
        took_s: elapsed.as_secs_f64(),
        total_hits,
        generation: generation.id,
        results: results.as_ref().clone(),
    }
}

pub async fn search_handler(State(state): State<AppState>, Query(params): Query<SearchParams>) -> Json<SearchResponse> {
    Json(run_search(&state, params.q, params.k))
}

pub async fn search_form_handler(State(state): State<AppState>, Form(form): Form<SearchForm>) -> Json<SearchResponse> {
    Json(run_search(&state, form.query, form.k))
}

pub async fn doc_handler(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<SchemeDocument>, (StatusCode, String)> {
    let generation = state.current();
    generation
        .engine()
        .document_by_slug(&slug)
        .cloned()
        .map(Json)
        .ok_or_else(|| (StatusCode::NOT_FOUND, format!("no scheme with slug {slug:?}")))
}

async fn reload_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<serde_json::Value>, (StatusCode, String)> {
    authorize(&state, &headers)?;
    let worker = state.clone();
    let outcome = tokio::task::spawn_blocking(move || worker.reload())
        .await
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;
    match outcome {
        Ok(id) => Ok(Json(serde_json::json!({ "generation": id }))),
        Err(e) => {
            tracing::error!(error = %e, "reload rejected, keeping current generation");
            Err((StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))
        }
    }
}

fn authorize(state: &AppState, headers: &HeaderMap) -> Result<(), (StatusCode, String)> {
    let required = match &state.config.admin_token {
        Some(t) => t,
        None => return Err((StatusCode::UNAUTHORIZED, "ADMIN_TOKEN not set".into())),
    };
    let provided = headers.get("X-ADMIN-TOKEN").and_then(|v| v.to_str().ok()).unwrap_or("");
    if provided == required {
        Ok(())
    } else {
        Err((StatusCode::UNAUTHORIZED, "invalid admin token".into()))
    }
}
