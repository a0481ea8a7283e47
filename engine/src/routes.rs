use axum::{
    extract::{rejection::JsonRejection, State},
    response::Json,
    routing::{get, post},
    Router,
};
use serde_json::Value;
use std::{sync::Arc, time::Instant};
use tower_http::trace::TraceLayer;
use tracing::debug;

use crate::{
    error::{missing_field, AppError},
    similarity::MatchEngine,
    types::{Match, MatchRequest, MatchResponse},
};

pub type AppState = Arc<MatchEngine>;

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(home))
        .route("/health", get(health_check))
        .route("/api/match", post(match_students))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn home() -> &'static str {
    "Peer Study Matchmaker API is running successfully!"
}

pub async fn health_check(State(engine): State<AppState>) -> Json<Value> {
    Json(serde_json::json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "version": env!("CARGO_PKG_VERSION"),
        "students": engine.roster().len(),
        "terms": engine.vectorizer().vocabulary().len(),
        "top_k": engine.top_k(),
    }))
}

pub async fn match_students(
    State(engine): State<AppState>,
    payload: Result<Json<MatchRequest>, JsonRejection>,
) -> Result<Json<MatchResponse>, AppError> {
    let start = Instant::now();
    metrics::counter!("match_requests_total").increment(1);

    let result = rank(&engine, payload);

    let latency = start.elapsed().as_secs_f64() * 1000.0;
    metrics::histogram!("match_request_duration_ms").record(latency);

    if let Err(AppError::NotFound(_)) = &result {
        metrics::counter!("match_not_found_total").increment(1);
    }
    let matches = result?;

    Ok(Json(MatchResponse { matches }))
}

fn rank(
    engine: &MatchEngine,
    payload: Result<Json<MatchRequest>, JsonRejection>,
) -> Result<Vec<Match>, AppError> {
    let Json(request) = payload?;
    let name = request.name.ok_or_else(|| missing_field("name"))?;
    debug!("Match request for {}", name);
    engine.rank_matches(&name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{roster::Roster, types::StudentRecord};
    use metrics_exporter_prometheus::PrometheusBuilder;

    fn engine() -> AppState {
        let roster = Roster::new(vec![
            StudentRecord::new("Alice", "math physics", "evenings"),
            StudentRecord::new("Bob", "history art", "weekends"),
        ]);
        Arc::new(MatchEngine::new(roster, 3).unwrap())
    }

    fn request(name: Option<&str>) -> Result<Json<MatchRequest>, JsonRejection> {
        Ok(Json(MatchRequest {
            name: name.map(str::to_string),
        }))
    }

    #[test]
    fn latency_is_recorded_for_failed_requests() {
        let recorder = PrometheusBuilder::new().build_recorder();
        let handle = recorder.handle();
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();

        metrics::with_local_recorder(&recorder, || {
            runtime.block_on(async {
                assert!(match_students(State(engine()), request(Some("Zoe"))).await.is_err());
                assert!(match_students(State(engine()), request(None)).await.is_err());
                assert!(match_students(State(engine()), request(Some("Alice"))).await.is_ok());
            })
        });

        let rendered = handle.render();
        assert!(rendered.contains("match_requests_total 3"));
        assert!(rendered.contains("match_not_found_total 1"));
        assert!(rendered.contains("match_request_duration_ms_count 3"));
    }
}
