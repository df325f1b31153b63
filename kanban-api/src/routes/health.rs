/// Health check endpoint
///
/// # Endpoint
///
/// ```text
/// GET /health
/// ```
///
/// # Response
///
/// ```json
/// {
///   "status": "healthy",
///   "version": "0.1.0",
///   "database": "connected",
///   "connections": { "active": 1, "idle": 4, "total": 5 }
/// }
/// ```
///
/// Always answers 200; an unreachable database shows up as
/// `"status": "degraded"`.

use crate::app::AppState;
use axum::{extract::State, Json};
use kanban_shared::db::pool::{get_pool_stats, health_check as ping};
use serde::{Deserialize, Serialize};

/// Health check response
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Service status
    pub status: String,

    /// Application version
    pub version: String,

    /// Database status
    pub database: String,

    pub connections: ConnectionCounts,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ConnectionCounts {
    pub active: usize,
    pub idle: usize,
    pub total: usize,
}

pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let connected = match ping(&state.pool).await {
        Ok(()) => true,
        Err(e) => {
            tracing::warn!(error = %e, "Database health check failed");
            false
        }
    };
    let stats = get_pool_stats(&state.pool);

    Json(HealthResponse {
        status: if connected { "healthy" } else { "degraded" }.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        database: if connected { "connected" } else { "disconnected" }.to_string(),
        connections: ConnectionCounts {
            active: stats.active_connections,
            idle: stats.idle_connections,
            total: stats.total_connections,
        },
    })
}
