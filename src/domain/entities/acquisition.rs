use serde::{Deserialize, Serialize};
use std::fmt;

/// Result of a single try-acquire against the lock store.
///
/// `Busy` and `Unavailable` both mean the caller must not run the job,
/// but only `Unavailable` is worth alerting on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", content = "reason", rename_all = "lowercase")]
pub enum Acquisition {
    Acquired,
    Busy,
    Unavailable(String),
}

impl Acquisition {
    pub fn acquired(&self) -> bool {
        matches!(self, Acquisition::Acquired)
    }

    pub fn error(&self) -> Option<String> {
        match self {
            Acquisition::Acquired => None,
            Acquisition::Busy => Some("lock is held by another run".to_string()),
            Acquisition::Unavailable(reason) => Some(reason.clone()),
        }
    }

    /// Metric label
    pub fn outcome(&self) -> &'static str {
        match self {
            Acquisition::Acquired => "acquired",
            Acquisition::Busy => "busy",
            Acquisition::Unavailable(_) => "unavailable",
        }
    }
}

impl fmt::Display for Acquisition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Acquisition::Unavailable(reason) => write!(f, "unavailable ({})", reason),
            other => f.write_str(other.outcome()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_acquired_is_acquired() {
        assert!(Acquisition::Acquired.acquired());
        assert!(!Acquisition::Busy.acquired());
        assert!(!Acquisition::Unavailable("down".to_string()).acquired());
    }

    #[test]
    fn test_errors_are_non_empty_when_not_acquired() {
        assert_eq!(Acquisition::Acquired.error(), None);
        assert!(!Acquisition::Busy.error().unwrap().is_empty());
        assert_eq!(
            Acquisition::Unavailable("connection refused".to_string()).error(),
            Some("connection refused".to_string())
        );
    }
}
