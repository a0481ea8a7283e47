use axum::{
    extract::{rejection::JsonRejection, State},
    routing::{get, post},
    Json, Router,
};
use std::{sync::Arc, time::Instant};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::debug;

use crate::error::ClusterError;
use crate::metrics::Metrics;
use crate::model::ClusterModel;
use crate::types::{ClusterRequest, ClusterResponse};

#[derive(Clone)]
pub struct AppState {
    pub model: Arc<ClusterModel>,
    pub metrics: Arc<Metrics>,
}

impl AppState {
    pub fn new(model: ClusterModel) -> Self {
        Self {
            model: Arc::new(model),
            metrics: Arc::new(Metrics::new()),
        }
    }
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(home))
        .route("/health", get(health))
        .route("/metrics", get(metrics_endpoint))
        .route("/api/match", post(assign))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn home() -> &'static str {
    "Peer Study Matchmaker API is running"
}

async fn health(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "version": env!("CARGO_PKG_VERSION"),
        "clusters": state.model.n_clusters(),
        "features": state.model.n_features(),
    }))
}

async fn metrics_endpoint(State(state): State<AppState>) -> String {
    state.metrics.format()
}

async fn assign(
    State(state): State<AppState>,
    payload: Result<Json<ClusterRequest>, JsonRejection>,
) -> Result<Json<ClusterResponse>, ClusterError> {
    let t0 = Instant::now();
    let result = classify(&state.model, payload);

    if let Err(e) = &result {
        debug!(error = %e, "cluster assignment rejected");
        state.metrics.inc_error();
    }
    state.metrics.observe_request(t0.elapsed());

    result.map(Json)
}

fn classify(
    model: &ClusterModel,
    payload: Result<Json<ClusterRequest>, JsonRejection>,
) -> Result<ClusterResponse, ClusterError> {
    let Json(request) = payload?;
    let features = request
        .features
        .ok_or_else(|| ClusterError::BadRequest("Missing 'features' field".to_string()))?;
    let cluster = model.assign_cluster(&features)?;
    Ok(ClusterResponse { cluster })
}
