//! Liveness endpoint.

use axum::Json;
use axum::extract::State;
use serde::Serialize;
use taskhive_core::store::TenantStore;
use tracing::warn;

use crate::AppState;
use crate::envelope::ApiResponse;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthStatus {
    pub status: &'static str,
    pub version: &'static str,
    pub store_connected: bool,
}

/// `GET /api/health`: reports the core version and store connectivity.
pub async fn health_handler(State(state): State<AppState>) -> Json<ApiResponse<HealthStatus>> {
    let store_connected = match state.store.ping().await {
        Ok(()) => true,
        Err(e) => {
            warn!("Store health check failed: {e}");
            false
        }
    };

    Json(ApiResponse::ok(HealthStatus {
        status: "ok",
        version: taskhive_core::version(),
        store_connected,
    }))
}
