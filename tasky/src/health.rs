//! Welcome page and probe handlers

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde::{Deserialize, Serialize};

use crate::{state::AppState, store::DocumentStore};

/// Body of `GET /`
pub const WELCOME: &str = "Welcome to Tasky API";

/// Error reported by the readiness probe when the store is unreachable
pub const STORE_DOWN: &str = "Database not connected";

/// Probe response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProbeResponse {
    /// `UP`, `READY`, `DOWN` or `ALIVE`
    pub status: String,

    /// API version, reported by the health endpoint
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,

    /// Why the service is not ready
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ProbeResponse {
    fn status(status: &str) -> Self {
        Self {
            status: status.to_string(),
            version: None,
            error: None,
        }
    }
}

/// `GET /`
pub async fn welcome() -> &'static str {
    WELCOME
}

/// `GET /api/v1/health`
pub async fn health() -> Json<ProbeResponse> {
    tracing::info!("Healthcheck endpoint hit");
    Json(ProbeResponse {
        version: Some(env!("CARGO_PKG_VERSION").to_string()),
        ..ProbeResponse::status("UP")
    })
}

/// `GET /api/v1/readyz`
///
/// Pings the store under the readiness deadline; 503 when it does not answer.
pub async fn readiness<S: DocumentStore>(State(state): State<AppState<S>>) -> impl IntoResponse {
    let deadline = state.config().store.readiness_timeout();

    let failure = match tokio::time::timeout(deadline, state.store().ping()).await {
        Ok(Ok(())) => None,
        Ok(Err(e)) => Some(e.to_string()),
        Err(_) => Some(format!("ping exceeded {}ms deadline", deadline.as_millis())),
    };

    match failure {
        None => {
            tracing::info!("Store connected");
            (StatusCode::OK, Json(ProbeResponse::status("READY")))
        }
        Some(reason) => {
            tracing::error!("{}: {}", STORE_DOWN, reason);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(ProbeResponse {
                    error: Some(STORE_DOWN.to_string()),
                    ..ProbeResponse::status("DOWN")
                }),
            )
        }
    }
}

/// `GET /api/v1/healthz`
pub async fn liveness() -> Json<ProbeResponse> {
    tracing::info!("Liveness probe hit");
    Json(ProbeResponse::status("ALIVE"))
}
