use chrono::DateTime;
use chrono::Utc;
use chrono_tz::Asia::Tokyo;
use chrono_tz::Tz;

/// Injected time source: every row-level
/// timestamp in the rewrite goes through this trait instead of an ad hoc
/// `Utc::now()`/`Local::now()` call, so tests can pin time.
pub trait Clock: Send + Sync {
    fn now_jst(&self) -> DateTime<Tz>;
}

/// Production clock: wall time, converted to Asia/Tokyo.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_jst(&self) -> DateTime<Tz> { Utc::now().with_timezone(&Tokyo) }
}

/// Test clock: always returns the same instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Tz>);

impl FixedClock {
    pub fn from_unix(secs: i64) -> Self {
        let utc = DateTime::from_timestamp(secs, 0).expect("valid unix timestamp");
        Self(utc.with_timezone(&Tokyo))
    }
}

impl Clock for FixedClock {
    fn now_jst(&self) -> DateTime<Tz> { self.0 }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_clock_is_stable() {
        let clock = FixedClock::from_unix(1_710_000_000);
        assert_eq!(clock.now_jst(), clock.now_jst());
    }
}
