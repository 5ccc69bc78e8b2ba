use actix_web::HttpResponse;

/// `GET /health` — liveness only, no auth.
pub async fn health_check() -> HttpResponse { HttpResponse::Ok().finish() }
