use axum::{
    routing::{delete, get},
    Router,
    extract::{Query, State},
    response::Response,
};
use tower_http::cors::{CorsLayer, Any};
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::AppState;
use crate::api::models::{CacheStatus, JobView, LinkQuery, LinkResponse};
use crate::api::response;
use crate::error::Result;
use crate::models::JobFilters;

pub fn create_router(app_state: AppState) -> Router {
    Router::new()
        .route("/api/jobs", get(jobs_handler))
        .route("/api/stats", get(stats_handler))
        .route("/api/companies", get(companies_handler))
        .route("/api/companies/cached", get(cached_companies_handler))
        .route("/api/companies/cache", delete(clear_companies_cache_handler))
        .route("/api/cache", get(cache_status_handler).delete(clear_all_caches_handler))
        .route("/api/link", get(link_handler))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(app_state)
}

async fn jobs_handler(
    State(state): State<AppState>,
    Query(filters): Query<JobFilters>,
) -> Result<Response> {
    let jobs = state.data.fetch_jobs_data().await?;
    let views: Vec<JobView> = state
        .data
        .filter_jobs(&jobs, &filters)
        .into_iter()
        .map(JobView::from)
        .collect();

    info!(total = jobs.len(), shown = views.len(), "Serving jobs");
    Ok(response::success(views))
}

async fn stats_handler(
    State(state): State<AppState>,
    Query(filters): Query<JobFilters>,
) -> Result<Response> {
    let jobs = state.data.fetch_jobs_data().await?;
    let jobs = state.data.filter_jobs(&jobs, &filters);
    Ok(response::success(state.data.process_jobs_data(&jobs)))
}

async fn companies_handler(State(state): State<AppState>) -> Result<Response> {
    let companies = state.data.fetch_companies_data().await?;
    Ok(response::success(companies))
}

async fn cached_companies_handler(State(state): State<AppState>) -> Response {
    response::success(state.data.cached_companies_data())
}

async fn cache_status_handler(State(state): State<AppState>) -> Response {
    let cached = state.data.cached_companies_data();
    response::success(CacheStatus {
        fresh: state.data.is_cache_valid(),
        cached_companies: cached.map(|companies| companies.len()),
        ttl_secs: state.config.cache_ttl.as_secs(),
    })
}

async fn clear_companies_cache_handler(State(state): State<AppState>) -> Response {
    state.data.clear_companies_cache();
    response::done("Companies cache cleared")
}

async fn clear_all_caches_handler(State(state): State<AppState>) -> Response {
    state.data.clear_all_caches();
    response::done("All caches cleared")
}

async fn link_handler(
    State(state): State<AppState>,
    Query(query): Query<LinkQuery>,
) -> Response {
    response::success(LinkResponse {
        link: state.data.extract_application_link(query.raw.as_deref()),
    })
}
