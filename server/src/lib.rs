use anyhow::Result;
use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use cinematch_core::catalog::{read_records, Attribute, Catalog, Item};
use cinematch_core::persist::{load_or_build, save_snapshot, IndexPaths};
use cinematch_core::poster::{poster_or_placeholder, CatalogPosters, PosterSource};
use cinematch_core::recommend::ReloadOutcome;
use cinematch_core::{RecommendError, Recommender, RecommenderConfig, SharedRecommender};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

#[derive(Debug, Clone)]
pub struct ServerSettings {
    /// Catalog file, reread on every admin reload.
    pub catalog: PathBuf,
    /// When set, the index is memoized on disk here keyed by catalog fingerprint.
    pub cache_dir: Option<PathBuf>,
    pub config: RecommenderConfig,
    pub admin_token: Option<String>,
}

#[derive(Deserialize)]
pub struct RecommendParams {
    #[serde(default)]
    pub title: String,
    #[serde(default = "default_k")]
    pub k: usize,
}
fn default_k() -> usize { 10 }

#[derive(Serialize)]
pub struct RecommendResponse {
    pub query: String,
    pub resolved_title: String,
    pub exact: bool,
    pub match_ratio: f64,
    pub took_s: f64,
    pub results: Vec<RecommendHit>,
}

#[derive(Serialize)]
pub struct RecommendHit {
    pub score: f32,
    #[serde(flatten)]
    pub item: ItemView,
}

#[derive(Serialize)]
pub struct ItemView {
    pub id: u32,
    pub title: String,
    pub genre: String,
    pub director: String,
    pub lead_star: String,
    pub plot: String,
    pub display: BTreeMap<String, String>,
    pub poster: String,
}

impl ItemView {
    fn new(item: &Item, posters: &dyn PosterSource) -> Self {
        Self {
            id: item.id,
            title: item.title.clone(),
            genre: item.attribute(Attribute::Genre).to_string(),
            director: item.attribute(Attribute::Director).to_string(),
            lead_star: item.attribute(Attribute::LeadStar).to_string(),
            plot: item.attribute(Attribute::Plot).to_string(),
            display: item.display.clone(),
            poster: poster_or_placeholder(posters, item),
        }
    }
}

#[derive(Serialize)]
pub struct ReloadResponse {
    /// The index was rebuilt from new feature text.
    pub rebuilt: bool,
    /// A new catalog was published, with or without a rebuilt index.
    pub published: bool,
    pub items: usize,
    pub terms: usize,
    pub fingerprint: String,
}

#[derive(thiserror::Error, Debug)]
pub enum ApiError {
    #[error(transparent)]
    Recommend(#[from] RecommendError),

    #[error("item {0} not found")]
    ItemNotFound(u32),

    #[error("{0}")]
    Unauthorized(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self { ApiError::Internal(format!("{err:#}")) }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::Recommend(RecommendError::EmptyQuery) => StatusCode::BAD_REQUEST,
            ApiError::Recommend(RecommendError::NotFound { .. }) | ApiError::ItemNotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }
        (status, Json(serde_json::json!({ "error": self.to_string() }))).into_response()
    }
}

#[derive(Clone)]
pub struct AppState {
    pub recommender: Arc<SharedRecommender>,
    pub settings: Arc<ServerSettings>,
    pub posters: Arc<dyn PosterSource>,
}

fn load_recommender(settings: &ServerSettings) -> Result<Recommender> {
    let records = read_records(&settings.catalog)?;
    let catalog = Catalog::load(records, &settings.config.schema);
    match &settings.cache_dir {
        Some(dir) => Ok(load_or_build(&IndexPaths::new(dir), catalog, settings.config.clone())?.0),
        None => Ok(Recommender::build(catalog, settings.config.clone())?),
    }
}

pub fn build_app(settings: ServerSettings) -> Result<Router> {
    // The index is built before the router exists, so no query sees a missing index.
    let recommender = load_recommender(&settings)?;
    let app_state = AppState {
        recommender: Arc::new(SharedRecommender::new(recommender)),
        settings: Arc::new(settings),
        posters: Arc::new(CatalogPosters::default()),
    };

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
        .route("/recommend", get(recommend_handler))
        .route("/titles", get(titles_handler))
        .route("/item/:id", get(item_handler))
        .route("/admin/reload", post(reload_handler))
        .with_state(app_state)
        .layer(cors)
        .layer(TraceLayer::new_for_http());
    Ok(app)
}

pub async fn recommend_handler(
    State(state): State<AppState>,
    Query(params): Query<RecommendParams>,
) -> Result<Json<RecommendResponse>, ApiError> {
    let start = std::time::Instant::now();
    let snapshot = state.recommender.snapshot();
    let recs = snapshot.recommend(&params.title, params.k)?;
    let results = recs
        .items
        .iter()
        .map(|r| RecommendHit { score: r.score, item: ItemView::new(&r.item, state.posters.as_ref()) })
        .collect();
    Ok(Json(RecommendResponse {
        query: params.title,
        resolved_title: recs.resolved.title,
        exact: recs.resolved.exact,
        match_ratio: recs.resolved.ratio,
        took_s: start.elapsed().as_secs_f64(),
        results,
    }))
}

pub async fn titles_handler(State(state): State<AppState>) -> Json<serde_json::Value> {
    let snapshot = state.recommender.snapshot();
    let titles: Vec<&str> = snapshot.catalog().canonical_titles().collect();
    Json(serde_json::json!({ "titles": titles }))
}

pub async fn item_handler(State(state): State<AppState>, Path(id): Path<u32>) -> Result<Json<ItemView>, ApiError> {
    let snapshot = state.recommender.snapshot();
    let item = snapshot.catalog().get(id).ok_or(ApiError::ItemNotFound(id))?;
    Ok(Json(ItemView::new(item, state.posters.as_ref())))
}

async fn reload_handler(State(state): State<AppState>, headers: HeaderMap) -> Result<Json<ReloadResponse>, ApiError> {
    authorize(&state, &headers)?;
    let shared = state.recommender.clone();
    let settings = state.settings.clone();
    let outcome = tokio::task::spawn_blocking(move || -> Result<ReloadOutcome> {
        let records = read_records(&settings.catalog)?;
        let catalog = Catalog::load(records, &settings.config.schema);
        let outcome = shared.reload(catalog, settings.config.clone())?;
        if let (true, Some(dir)) = (outcome.published(), &settings.cache_dir) {
            save_snapshot(&IndexPaths::new(dir), &shared.snapshot())?;
        }
        Ok(outcome)
    })
    .await
    .map_err(|e| ApiError::Internal(e.to_string()))??;

    let snapshot = state.recommender.snapshot();
    let index = snapshot.index();
    let rebuilt = outcome == ReloadOutcome::Rebuilt;
    tracing::info!(rebuilt, published = outcome.published(), items = index.len(), "catalog reloaded");
    Ok(Json(ReloadResponse {
        rebuilt,
        published: outcome.published(),
        items: index.len(),
        terms: index.vocabulary().len(),
        fingerprint: index.fingerprint().to_string(),
    }))
}

fn authorize(state: &AppState, headers: &HeaderMap) -> Result<(), ApiError> {
    let required = match &state.settings.admin_token {
        Some(t) => t,
        None => return Err(ApiError::Unauthorized("ADMIN_TOKEN not set".into())),
    };
    let provided = headers.get("X-ADMIN-TOKEN").and_then(|v| v.to_str().ok()).unwrap_or("");
    if provided == required {
        Ok(())
    } else {
        Err(ApiError::Unauthorized("invalid admin token".into()))
    }
}
