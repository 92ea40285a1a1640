use actix_web::{web, HttpResponse};
use serde::{Deserialize, Serialize};

use crate::{
    state::AppState,
    store::StoreStats,
    utils::{response, AppError},
};

#[derive(Serialize, Deserialize, utoipa::ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub service: String,
    pub version: String,
    pub timestamp: i64,
}

/// Liveness: no toca el store y queda fuera del envelope
#[utoipa::path(
    get,
    path = "/health",
    tag = "Health",
    responses(
        (status = 200, description = "Service is up", body = HealthResponse)
    )
)]
pub async fn health_check() -> HttpResponse {
    HttpResponse::Ok().json(HealthResponse {
        status: "healthy".to_string(),
        service: env!("CARGO_PKG_NAME").to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: chrono::Utc::now().timestamp(),
    })
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct StoreProbe {
    pub backend: String,
    #[serde(flatten)]
    pub counts: StoreStats,
    pub timestamp: i64,
}

/// Prueba de conectividad con el store
#[utoipa::path(
    get,
    path = "/api/test",
    tag = "Health",
    responses(
        (status = 200, description = "Store reachable", body = StoreProbe),
        (status = 500, description = "Store unavailable")
    )
)]
pub async fn store_probe(state: web::Data<AppState>) -> Result<HttpResponse, AppError> {
    let counts = state.store.stats().await?;
    log::info!(
        "🔌 GET /api/test - {} ({} products, {} orders)",
        state.store.backend(),
        counts.products,
        counts.orders
    );

    Ok(response::ok(StoreProbe {
        backend: state.store.backend().to_string(),
        counts,
        timestamp: chrono::Utc::now().timestamp(),
    }))
}
