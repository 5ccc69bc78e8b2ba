use std::collections::BTreeMap;

use actix_web::dev::ServiceRequest;
use actix_web::web::Bytes;
use actix_web::FromRequest;

/// Headers stripped from the log line before an unauthorized request is
/// recorded.
const SENSITIVE_HEADERS: &[&str] = &["authorization", "cookie", "set-cookie", "x-api-key"];

/// A sanitized snapshot of a rejected request, logged once per 401 and
/// nowhere else. Body bytes are read and re-injected into the request so the
/// downstream handler (which never runs for a 401, but shares this helper's
/// body-buffering with the retry-safe paths) can still consume the payload.
#[derive(Debug)]
pub struct RequestInfo {
    pub method: String,
    pub path: String,
    pub headers: BTreeMap<String, String>,
    pub body_len: usize,
}

/// Buffers the request body (so it can be logged and replayed) and returns a
/// sanitized `RequestInfo` alongside the now-restored `ServiceRequest`.
pub async fn capture(req: &mut ServiceRequest) -> RequestInfo {
    let method = req.method().to_string();
    let path = req.path().to_string();

    let headers = req
        .headers()
        .iter()
        .filter(|(name, _)| !SENSITIVE_HEADERS.contains(&name.as_str().to_ascii_lowercase().as_str()))
        .map(|(name, value)| {
            (
                name.to_string(),
                value.to_str().unwrap_or("<binary>").to_string(),
            )
        })
        .collect();

    let (http_req, mut payload) = req.parts_mut();
    let body = Bytes::from_request(http_req, &mut payload)
        .await
        .unwrap_or_else(|_| Bytes::new());
    let body_len = body.len();

    // Re-inject the already-consumed bytes so the route handler downstream
    // of this middleware still sees a readable body.
    req.set_payload(bytes_to_payload(body));

    RequestInfo {
        method,
        path,
        headers,
        body_len,
    }
}

fn bytes_to_payload(bytes: Bytes) -> actix_web::dev::Payload {
    let (_, mut sender) = actix_http::h1::Payload::create(true);
    sender.unread_data(bytes);
    actix_web::dev::Payload::from(sender)
}
