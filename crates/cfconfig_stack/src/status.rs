//! Stack status taxonomy.

use serde::{Deserialize, Serialize};

pub const COMPLETE_STATUSES: &[&str] = &["CREATE_COMPLETE", "UPDATE_COMPLETE"];
pub const FAILED_STATUSES: &[&str] = &["CREATE_FAILED", "UPDATE_FAILED"];
pub const ROLLBACK_STATUSES: &[&str] = &["ROLLBACK_COMPLETE", "UPDATE_ROLLBACK_COMPLETE"];
pub const IN_PROGRESS_STATUSES: &[&str] = &[
    "CREATE_IN_PROGRESS",
    "UPDATE_IN_PROGRESS",
    "ROLLBACK_IN_PROGRESS",
];

/// Complete, failed and rolled-back statuses.
pub fn terminal_statuses() -> Vec<&'static str> {
    COMPLETE_STATUSES
        .iter()
        .chain(FAILED_STATUSES)
        .chain(ROLLBACK_STATUSES)
        .copied()
        .collect()
}

/// Bucket a raw status string falls into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusClass {
    Complete,
    Failed,
    Rollback,
    InProgress,
    /// Anything the taxonomy does not name. Never terminal.
    Unknown,
}

impl StatusClass {
    pub fn classify(status: &str) -> Self {
        if COMPLETE_STATUSES.contains(&status) {
            StatusClass::Complete
        } else if FAILED_STATUSES.contains(&status) {
            StatusClass::Failed
        } else if ROLLBACK_STATUSES.contains(&status) {
            StatusClass::Rollback
        } else if IN_PROGRESS_STATUSES.contains(&status) {
            StatusClass::InProgress
        } else {
            StatusClass::Unknown
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            StatusClass::Complete | StatusClass::Failed | StatusClass::Rollback
        )
    }

    /// Raw statuses belonging to this class.
    pub fn statuses(&self) -> &'static [&'static str] {
        match self {
            StatusClass::Complete => COMPLETE_STATUSES,
            StatusClass::Failed => FAILED_STATUSES,
            StatusClass::Rollback => ROLLBACK_STATUSES,
            StatusClass::InProgress => IN_PROGRESS_STATUSES,
            StatusClass::Unknown => &[],
        }
    }
}

impl std::fmt::Display for StatusClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StatusClass::Complete => write!(f, "complete"),
            StatusClass::Failed => write!(f, "failed"),
            StatusClass::Rollback => write!(f, "rollback"),
            StatusClass::InProgress => write!(f, "in progress"),
            StatusClass::Unknown => write!(f, "unknown"),
        }
    }
}

pub fn is_terminal(status: &str) -> bool {
    StatusClass::classify(status).is_terminal()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classification() {
        assert_eq!(StatusClass::classify("CREATE_COMPLETE"), StatusClass::Complete);
        assert_eq!(StatusClass::classify("UPDATE_FAILED"), StatusClass::Failed);
        assert_eq!(
            StatusClass::classify("UPDATE_ROLLBACK_COMPLETE"),
            StatusClass::Rollback
        );
        assert_eq!(
            StatusClass::classify("ROLLBACK_IN_PROGRESS"),
            StatusClass::InProgress
        );
    }

    #[test]
    fn test_unrecognised_status_is_never_terminal() {
        for status in ["DELETE_COMPLETE", "IMPORT_IN_PROGRESS", "", "create_complete"] {
            assert_eq!(StatusClass::classify(status), StatusClass::Unknown);
            assert!(!is_terminal(status));
        }
    }

    #[test]
    fn test_terminal_set() {
        let terminal = terminal_statuses();
        assert_eq!(terminal.len(), 6);
        assert!(terminal.iter().all(|s| is_terminal(s)));
        assert!(IN_PROGRESS_STATUSES.iter().all(|s| !is_terminal(s)));
    }
}
