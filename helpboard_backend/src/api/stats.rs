use super::AppState;
use crate::stats::StatsSummary;
use axum::extract::State;
use axum::Json;
use serde::Serialize;

#[derive(Serialize)]
pub(crate) struct HealthResponse {
    status: &'static str,
    version: &'static str,
    api_port: u16,
}

pub(crate) async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        api_port: state.config.api_port,
    })
}

#[derive(Serialize)]
pub(crate) struct StatsResponse {
    pub data: Option<StatsSummary>,
    pub is_loading: bool,
    pub is_error: bool,
    pub error: Option<String>,
}

/// Serves the aggregator's cached snapshot; freshness is the background
/// timer's job, so this handler never blocks on the database.
pub(crate) async fn stats_handler(State(state): State<AppState>) -> Json<StatsResponse> {
    let snapshot = state.stats.current();
    Json(StatsResponse {
        is_error: snapshot.is_error(),
        error: snapshot.error.as_ref().map(|err| err.to_string()),
        data: snapshot.data,
        is_loading: snapshot.is_loading,
    })
}
