mod listings;
mod stats;

use crate::config::HelpboardConfig;
use crate::database::Database;
use crate::stats::{StatsAggregator, StatsSubscription};
use anyhow::Result;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Serialize;
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};

#[derive(Clone)]
pub struct AppState {
    pub config: HelpboardConfig,
    pub database: Database,
    pub stats: StatsSubscription,
}

pub(crate) type ApiResult<T> = Result<Json<T>, ApiError>;

#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    NotFound(String),
    Internal(anyhow::Error),
}

impl ApiError {
    fn into_response_parts(self) -> (StatusCode, ErrorResponse) {
        match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, ErrorResponse { message: msg }),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, ErrorResponse { message: msg }),
            ApiError::Internal(err) => {
                tracing::error!(error = ?err, "internal server error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorResponse {
                        message: "internal server error".into(),
                    },
                )
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = self.into_response_parts();
        (status, Json(body)).into_response()
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        ApiError::Internal(err)
    }
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    message: String,
}

/// Tries to bind to the given port, or finds the next available port
async fn find_available_port(start_port: u16) -> Result<(TcpListener, u16)> {
    const MAX_PORT_ATTEMPTS: u16 = 100;

    for offset in 0..MAX_PORT_ATTEMPTS {
        // stop at the top of the port range instead of wrapping around
        let Some(port) = start_port.checked_add(offset) else {
            break;
        };
        let addr = SocketAddr::from(([0, 0, 0, 0], port));

        match TcpListener::bind(addr).await {
            Ok(listener) => return Ok((listener, port)),
            Err(e) => {
                if offset == 0 {
                    tracing::debug!(port, error = %e, "Port in use, trying next port");
                }
                continue;
            }
        }
    }

    anyhow::bail!(
        "Could not find available port in {} attempts starting at {}",
        MAX_PORT_ATTEMPTS,
        start_port
    )
}

pub async fn serve_http(config: HelpboardConfig, database: Database) -> Result<()> {
    let aggregator =
        StatsAggregator::for_database(database.clone(), config.stats.refresh_interval);
    // the server holds one subscription for its lifetime, which keeps the
    // refresh timer running until shutdown
    let stats = aggregator.subscribe();

    let state = AppState {
        config: config.clone(),
        database,
        stats,
    };

    let router = Router::new()
        .route("/health", get(stats::health_handler))
        .route("/stats", get(stats::stats_handler))
        .route(
            "/requests",
            get(listings::list_requests).post(listings::create_request),
        )
        .route("/requests/:id", get(listings::get_request))
        .route("/requests/:id/status", post(listings::set_request_status))
        .route(
            "/offers",
            get(listings::list_offers).post(listings::create_offer),
        )
        .route("/offers/:id", get(listings::get_offer))
        .route("/offers/:id/status", post(listings::set_offer_status))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state);

    // Try to bind to the configured port, or find the next available port
    let (listener, actual_port) = find_available_port(config.api_port).await?;
    let addr = SocketAddr::from(([0, 0, 0, 0], actual_port));

    if actual_port != config.api_port {
        tracing::warn!(
            requested_port = config.api_port,
            actual_port = actual_port,
            "Configured port was in use, bound to next available port"
        );
    }

    tracing::info!(?addr, "HTTP server listening");
    axum::serve(listener, router.into_make_service()).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn find_available_port_stops_at_the_end_of_the_port_range() {
        // hold the very last port so the search cannot succeed there and has
        // nowhere left to go
        let addr = SocketAddr::from(([0, 0, 0, 0], u16::MAX));
        let _occupied = TcpListener::bind(addr).await.ok();

        let result = find_available_port(u16::MAX).await;
        assert!(result.is_err());
    }
}
