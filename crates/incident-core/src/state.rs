use std::fmt;

use serde::Deserialize;
use serde::Serialize;

/// Overall per-message lifecycle. Monotonic: PENDING -> RUNNING ->
/// {COMPLETE, FAILED}; no backward moves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ProcessingStatus {
    Pending,
    Running,
    Complete,
    Failed,
}

impl ProcessingStatus {
    /// Whether a transition from `self` to `next` is one of the allowed
    /// forward moves in the state machine. Used by callers that want to
    /// assert monotonicity rather than trust every write site.
    pub fn can_advance_to(
        &self,
        next: ProcessingStatus,
    ) -> bool {
        use ProcessingStatus::*;
        matches!(
            (self, next),
            (Pending, Running)
                | (Pending, Complete)
                | (Pending, Failed)
                | (Running, Complete)
                | (Running, Failed)
        )
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, ProcessingStatus::Complete | ProcessingStatus::Failed)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ProcessingStatus::Pending => "PENDING",
            ProcessingStatus::Running => "RUNNING",
            ProcessingStatus::Complete => "COMPLETE",
            ProcessingStatus::Failed => "FAILED",
        }
    }
}

impl fmt::Display for ProcessingStatus {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The three components that each maintain a `ServiceState` sub-state row
/// for a message. Named after the informal service nicknames
/// used in the original system (`auto-pilot` = orchestrator, `db-pilot` =
/// persistence) rather than the crate names, since that's the literal value
/// stored in the `service_type` column and read by the existing UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ServiceType {
    MailConverter,
    AutoPilot,
    DbPilot,
}

impl ServiceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ServiceType::MailConverter => "mail-converter",
            ServiceType::AutoPilot => "auto-pilot",
            ServiceType::DbPilot => "db-pilot",
        }
    }
}

impl fmt::Display for ServiceType {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ProcessingStatus::*;

    #[test]
    fn forward_transitions_allowed() {
        assert!(Pending.can_advance_to(Running));
        assert!(Running.can_advance_to(Complete));
        assert!(Running.can_advance_to(Failed));
    }

    #[test]
    fn backward_transitions_rejected() {
        assert!(!Running.can_advance_to(Pending));
        assert!(!Complete.can_advance_to(Running));
        assert!(!Failed.can_advance_to(Complete));
    }

    #[test]
    fn terminal_states() {
        assert!(Complete.is_terminal());
        assert!(Failed.is_terminal());
        assert!(!Running.is_terminal());
        assert!(!Pending.is_terminal());
    }

    #[test]
    fn service_type_wire_format() {
        assert_eq!(ServiceType::AutoPilot.as_str(), "auto-pilot");
        assert_eq!(ServiceType::DbPilot.as_str(), "db-pilot");
    }
}
