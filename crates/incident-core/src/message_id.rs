use std::fmt;
use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;
use std::time::SystemTime;
use std::time::UNIX_EPOCH;

use serde::Deserialize;
use serde::Serialize;

/// Guards against two `MessageId::generate()` calls landing on the same
/// wall-clock nanosecond (observed under load on coarse-grained clocks);
/// `SystemTime` alone is not guaranteed monotonic across calls.
static LAST_NANOS: AtomicU64 = AtomicU64::new(0);

/// Opaque, ASCII, per-email correlation id. Primary identity across the
/// pipeline: unique and immutable once assigned.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageId(String);

impl MessageId {
    pub fn new(raw: impl Into<String>) -> Self { Self(raw.into()) }

    /// `"gen-<monotonic-nanos>"`, used when the caller supplies no
    /// `X-Message-ID`.
    pub fn generate() -> Self {
        let now_nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_nanos() as u64;

        // Ensure strictly increasing values even if two calls race the same tick.
        let nanos = LAST_NANOS
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |last| {
                Some(std::cmp::max(last + 1, now_nanos))
            })
            .unwrap_or(now_nanos);

        Self(format!("gen-{nanos}"))
    }

    pub fn as_str(&self) -> &str { &self.0 }

    /// Key used to address a `ServiceState` row: `"<message_id>:<service_type>"`.
    pub fn service_state_key(
        &self,
        service: crate::state::ServiceType,
    ) -> String {
        format!("{}:{}", self.0, service.as_str())
    }
}

impl fmt::Display for MessageId {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for MessageId {
    fn from(value: String) -> Self { Self(value) }
}

impl AsRef<str> for MessageId {
    fn as_ref(&self) -> &str { &self.0 }
}
