use actix_web::body::MessageBody;
use actix_web::dev::ServiceRequest;
use actix_web::dev::ServiceResponse;
use actix_web::http::header::AUTHORIZATION;
use actix_web_lab::middleware::Next;
use chrono::Utc;
use secrecy::ExposeSecret;
use secrecy::Secret;
use sqlx::PgPool;

use crate::request_info::capture;

fn bearer_token(req: &ServiceRequest) -> Option<&str> {
    req.headers()
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
}

async fn reject(mut req: ServiceRequest) -> actix_web::Error {
    let info = capture(&mut req).await;
    tracing::warn!(
        method = %info.method,
        path = %info.path,
        headers = ?info.headers,
        body_len = info.body_len,
        "rejected unauthenticated request"
    );
    actix_web::error::ErrorUnauthorized(
        serde_json::json!({"status": "error", "code": 401, "message": "unauthorized"}),
    )
}

/// Validates a fixed bearer token. Used for both the *External* regime
/// (`POST /receive` on the mail converter, checked against
/// `EXTERNAL_API_TOKEN`) and the *Inter-service* regime (every other
/// endpoint on M and O, checked against `SERVICE_TOKEN`) — two named
/// regimes that share one mechanism.
pub fn require_bearer_token(
    expected: Secret<String>,
) -> impl Fn(
    ServiceRequest,
    Next<impl MessageBody>,
) -> std::pin::Pin<
    Box<dyn std::future::Future<Output = Result<ServiceResponse<impl MessageBody>, actix_web::Error>>>,
> + Clone {
    move |req: ServiceRequest, next: Next<_>| {
        let expected = expected.clone();
        Box::pin(async move {
            match bearer_token(&req) {
                Some(token) if token == expected.expose_secret() => next.call(req).await,
                _ => Err(reject(req).await),
            }
        })
    }
}

/// Row shape read from the (externally owned) `login_sessions` table.
struct LoginSession {
    expires_at: chrono::DateTime<Utc>,
}

/// Resolves a `Authorization: Bearer <token>` header for P's protected
/// surface: the token is accepted outright if it equals `SERVICE_TOKEN`
/// (inter-service bypass), otherwise it is looked up as a
/// `session_id` in `login_sessions` and must not be expired.
pub async fn validate_user_session(
    token: &str,
    pool: &PgPool,
    service_token: &Secret<String>,
) -> Result<(), sqlx::Error> {
    if token == service_token.expose_secret() {
        return Ok(());
    }

    let session = sqlx::query_as!(
        LoginSession,
        r#"SELECT expires_at FROM login_sessions WHERE session_id = $1"#,
        token,
    )
    .fetch_optional(pool)
    .await?;

    match session {
        Some(s) if s.expires_at > Utc::now() => Ok(()),
        _ => Err(sqlx::Error::RowNotFound),
    }
}

/// Middleware factory for P's protected group: Bearer `SERVICE_TOKEN` or a
/// live `login_sessions` row.
pub fn require_user_session(
    pool: PgPool,
    service_token: Secret<String>,
) -> impl Fn(
    ServiceRequest,
    Next<impl MessageBody>,
) -> std::pin::Pin<
    Box<dyn std::future::Future<Output = Result<ServiceResponse<impl MessageBody>, actix_web::Error>>>,
> + Clone {
    move |req: ServiceRequest, next: Next<_>| {
        let pool = pool.clone();
        let service_token = service_token.clone();
        Box::pin(async move {
            let token = bearer_token(&req).map(str::to_owned);
            match token {
                Some(token) => match validate_user_session(&token, &pool, &service_token).await {
                    Ok(()) => next.call(req).await,
                    Err(_) => Err(reject(req).await),
                },
                None => Err(reject(req).await),
            }
        })
    }
}
