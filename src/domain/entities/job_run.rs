use super::{JobOutcome, JobStatus, LockName};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Row written to the run history for every coordinated invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobRun {
    pub id: String,
    pub lock_name: LockName,
    pub status: JobStatus,
    pub attempts: u32,
    pub error: Option<String>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl JobRun {
    pub fn from_outcome<T>(outcome: &JobOutcome<T>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            lock_name: outcome.lock_name,
            status: outcome.status,
            attempts: outcome.attempts,
            error: outcome.error.clone(),
            started_at: outcome.started_at,
            finished_at: outcome.finished_at,
        }
    }

    pub fn duration_ms(&self) -> i64 {
        (self.finished_at - self.started_at).num_milliseconds()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_outcome_copies_fields() {
        let finished_at = Utc::now();
        let started_at = finished_at - chrono::Duration::milliseconds(250);
        let outcome: JobOutcome<u32> = JobOutcome::failed(
            LockName::SyncShiphero,
            "timeout".to_string(),
            3,
            started_at,
            finished_at,
        );

        let run = JobRun::from_outcome(&outcome);

        assert_eq!(run.lock_name, LockName::SyncShiphero);
        assert_eq!(run.status, JobStatus::Failed);
        assert_eq!(run.attempts, 3);
        assert_eq!(run.error.as_deref(), Some("timeout"));
        assert_eq!(run.duration_ms(), 250);
        assert!(Uuid::parse_str(&run.id).is_ok());
    }
}
