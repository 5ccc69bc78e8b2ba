use incident_aiclient::AiData;

/// Derives the `IncidentStatus.code` for an AI workflow outcome:
/// `status == "succeeded"` maps to 0 (未着手), anything else maps to
/// 99 (解決済み(error)).
pub fn status_code_for(ai_status: &str) -> i32 {
    if ai_status == "succeeded" {
        0
    } else {
        99
    }
}

/// `datetime` on the Incident row derives from the AI payload's
/// `data.created_at`, interpreted as Unix seconds.
pub fn incident_datetime(data: &AiData) -> chrono::DateTime<chrono::Utc> {
    chrono::DateTime::from_timestamp(data.created_at, 0).unwrap_or_else(chrono::Utc::now)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn succeeded_maps_to_code_zero() {
        assert_eq!(status_code_for("succeeded"), 0);
    }

    #[test]
    fn anything_else_maps_to_code_ninety_nine() {
        assert_eq!(status_code_for("error"), 99);
        assert_eq!(status_code_for(""), 99);
        assert_eq!(status_code_for("failed"), 99);
    }

    #[test]
    fn incident_datetime_from_unix_seconds() {
        let data = AiData {
            id: "1".into(),
            workflow_id: "WF".into(),
            status: "succeeded".into(),
            outputs: Default::default(),
            error: None,
            elapsed_time: None,
            total_tokens: None,
            total_steps: None,
            created_at: 1_710_000_000,
            finished_at: None,
        };
        assert_eq!(incident_datetime(&data).timestamp(), 1_710_000_000);
    }
}
