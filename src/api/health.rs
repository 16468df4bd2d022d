use actix_web::{web, HttpResponse};
use serde::{Deserialize, Serialize};

use crate::services::ImportService;

#[derive(Serialize, Deserialize, utoipa::ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub service: String,
    pub version: String,
    /// Whether the directory uploads are staged in is usable.
    pub upload_dir_ready: bool,
    pub timestamp: i64,
}

/// Liveness plus a check that uploads can still be staged.
#[utoipa::path(
    get,
    path = "/health",
    tag = "Health",
    responses(
        (status = 200, description = "Service is healthy", body = HealthResponse),
        (status = 503, description = "Upload directory unavailable", body = HealthResponse)
    )
)]
pub async fn health_check(service: web::Data<ImportService>) -> HttpResponse {
    let upload_dir_ready = service.upload_dir().is_dir();

    let body = HealthResponse {
        status: if upload_dir_ready { "healthy" } else { "degraded" }.to_string(),
        service: env!("CARGO_PKG_NAME").to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        upload_dir_ready,
        timestamp: chrono::Utc::now().timestamp(),
    };

    if upload_dir_ready {
        HttpResponse::Ok().json(body)
    } else {
        log::warn!("⚠️  Upload directory {} is not available", service.upload_dir().display());
        HttpResponse::ServiceUnavailable().json(body)
    }
}
