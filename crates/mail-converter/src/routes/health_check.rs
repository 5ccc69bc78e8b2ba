use actix_web::HttpResponse;
use serde::Serialize;

#[derive(Serialize)]
struct HealthBody {
    status: &'static str,
    version: &'static str,
}

/// `GET /health`: no external dependency contacted, matching the teacher's
/// empty-200 `health_check` generalized to carry a minimal liveness body.
pub async fn health_check() -> HttpResponse {
    HttpResponse::Ok().json(HealthBody {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}
