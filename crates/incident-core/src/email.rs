use serde::Deserialize;
use serde::Serialize;

/// Bytes kept of a truncated body, chosen so the suffix still reads as
/// obviously-truncated rather than cut mid-sentence.
pub const TRUNCATED_BODY_LIMIT: usize = 1000;
const TRUNCATED_SUFFIX: &str = "... (truncated)";

/// Parsed MIME envelope, produced by the mail converter and consumed
/// verbatim by the orchestrator and persistence service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmailData {
    pub from: String,
    pub to: String,
    #[serde(default)]
    pub cc: String,
    pub subject: String,
    pub date: String,
    #[serde(default)]
    pub original_message_id: String,
    #[serde(default)]
    pub mime_version: String,
    #[serde(default)]
    pub content_type: String,
    #[serde(default)]
    pub content_transfer_encoding: String,
    pub body: String,
    #[serde(default)]
    pub file_name: Option<String>,
}

impl EmailData {
    /// Body as stored in `ServiceState`: truncated to
    /// [`TRUNCATED_BODY_LIMIT`] bytes on a valid UTF-8 boundary, with a
    /// trailing marker so the truncation is visible to an operator reading
    /// the state store directly.
    pub fn truncated_body(&self) -> String {
        truncate_utf8(&self.body, TRUNCATED_BODY_LIMIT)
    }
}

/// Truncates `s` to at most `limit` bytes, backing off to the nearest valid
/// UTF-8 char boundary, and appends the truncation marker when truncation
/// actually happened.
fn truncate_utf8(
    s: &str,
    limit: usize,
) -> String {
    if s.len() <= limit {
        return s.to_string();
    }
    let mut end = limit;
    while end > 0 && !s.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}{TRUNCATED_SUFFIX}", &s[..end])
}
