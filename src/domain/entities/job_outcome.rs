use super::{Acquisition, LockName};
use crate::domain::errors::{LockError, LockResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Result type most job bodies return.
pub type JobResult<T> = anyhow::Result<T>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Succeeded,
    Failed,
    Busy,
    Unavailable,
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JobStatus::Succeeded => write!(f, "succeeded"),
            JobStatus::Failed => write!(f, "failed"),
            JobStatus::Busy => write!(f, "busy"),
            JobStatus::Unavailable => write!(f, "unavailable"),
        }
    }
}

impl From<String> for JobStatus {
    fn from(s: String) -> Self {
        match s.as_str() {
            "succeeded" => JobStatus::Succeeded,
            "busy" => JobStatus::Busy,
            "unavailable" => JobStatus::Unavailable,
            _ => JobStatus::Failed,
        }
    }
}

/// Result of one coordinated invocation.
///
/// `ran` is true whenever the body was invoked, `success` only when it
/// also completed without error.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobOutcome<T> {
    pub lock_name: LockName,
    pub status: JobStatus,
    pub ran: bool,
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<String>,
    pub attempts: u32,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl<T> JobOutcome<T> {
    pub fn succeeded(
        lock_name: LockName,
        data: T,
        attempts: u32,
        started_at: DateTime<Utc>,
        finished_at: DateTime<Utc>,
    ) -> Self {
        Self {
            lock_name,
            status: JobStatus::Succeeded,
            ran: true,
            success: true,
            data: Some(data),
            error: None,
            attempts,
            started_at,
            finished_at,
        }
    }

    pub fn failed(
        lock_name: LockName,
        error: String,
        attempts: u32,
        started_at: DateTime<Utc>,
        finished_at: DateTime<Utc>,
    ) -> Self {
        Self {
            lock_name,
            status: JobStatus::Failed,
            ran: true,
            success: false,
            data: None,
            error: Some(error),
            attempts,
            started_at,
            finished_at,
        }
    }

    /// Outcome for a run that never got the lock.
    pub fn skipped(
        lock_name: LockName,
        acquisition: &Acquisition,
        started_at: DateTime<Utc>,
        finished_at: DateTime<Utc>,
    ) -> Self {
        let (status, error) = match acquisition {
            Acquisition::Unavailable(reason) => (
                JobStatus::Unavailable,
                format!("lock {} unavailable: {}", lock_name, reason),
            ),
            _ => (
                JobStatus::Busy,
                format!("lock {} is held by another run", lock_name),
            ),
        };

        Self {
            lock_name,
            status,
            ran: false,
            success: false,
            data: None,
            error: Some(error),
            attempts: 0,
            started_at,
            finished_at,
        }
    }

    pub fn skipped_busy(&self) -> bool {
        self.status == JobStatus::Busy
    }

    pub fn elapsed(&self) -> chrono::Duration {
        self.finished_at - self.started_at
    }

    /// Collapses the outcome for callers that want a plain `Result`.
    ///
    /// A run that never got the lock, busy or unreachable, is an
    /// `AcquireFailed`; a body that ran and failed is a `BodyFailed`.
    pub fn into_result(self) -> LockResult<T> {
        let message = self.error.unwrap_or_default();
        match (self.status, self.data) {
            (JobStatus::Succeeded, Some(data)) => Ok(data),
            (JobStatus::Busy | JobStatus::Unavailable, _) => Err(LockError::AcquireFailed(message)),
            _ => Err(LockError::BodyFailed(message)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_skipped_busy_outcome() {
        let now = Utc::now();
        let outcome: JobOutcome<()> =
            JobOutcome::skipped(LockName::SyncInventory, &Acquisition::Busy, now, now);

        assert!(!outcome.ran);
        assert!(!outcome.success);
        assert!(outcome.skipped_busy());
        assert_eq!(outcome.attempts, 0);
        assert_eq!(
            outcome.error.as_deref(),
            Some("lock cron_sync_inventory is held by another run")
        );
    }

    #[test]
    fn test_skipped_unavailable_keeps_reason() {
        let outcome: JobOutcome<()> = JobOutcome::skipped(
            LockName::SyncGoogleAds,
            &Acquisition::Unavailable("connection refused".to_string()),
            Utc::now(),
            Utc::now(),
        );

        assert_eq!(outcome.status, JobStatus::Unavailable);
        assert!(!outcome.skipped_busy());
        assert!(outcome.error.unwrap().contains("connection refused"));
    }

    #[test]
    fn test_outcome_serializes_flags() {
        let outcome = JobOutcome::succeeded(
            LockName::SyncInventory,
            serde_json::json!({ "rows": 42 }),
            1,
            Utc::now(),
            Utc::now(),
        );
        let value = serde_json::to_value(&outcome).unwrap();

        assert_eq!(value["success"], true);
        assert_eq!(value["ran"], true);
        assert_eq!(value["status"], "succeeded");
        assert_eq!(value["lock_name"], "cron_sync_inventory");
        assert_eq!(value["data"]["rows"], 42);
        assert!(value["error"].is_null());
    }

    #[test]
    fn test_into_result_tags_body_failure() {
        let now = Utc::now();
        let failed: JobOutcome<()> =
            JobOutcome::failed(LockName::SyncShiphero, "timeout".to_string(), 3, now, now);
        assert_eq!(
            failed.into_result(),
            Err(LockError::BodyFailed("timeout".to_string()))
        );

        let ok = JobOutcome::succeeded(LockName::SyncShiphero, 7, 1, now, now);
        assert_eq!(ok.into_result(), Ok(7));
    }

    #[test]
    fn test_into_result_skipped_runs_are_acquire_failures() {
        let now = Utc::now();

        let busy: JobOutcome<()> =
            JobOutcome::skipped(LockName::SyncInventory, &Acquisition::Busy, now, now);
        assert_eq!(
            busy.into_result(),
            Err(LockError::AcquireFailed(
                "lock cron_sync_inventory is held by another run".to_string()
            ))
        );

        let unavailable: JobOutcome<()> = JobOutcome::skipped(
            LockName::SyncInventory,
            &Acquisition::Unavailable("connection refused".to_string()),
            now,
            now,
        );
        assert!(matches!(
            unavailable.into_result(),
            Err(LockError::AcquireFailed(ref m)) if m.contains("connection refused")
        ));
    }

    #[test]
    fn test_elapsed_uses_given_timestamps() {
        let started_at = Utc::now();
        let finished_at = started_at + chrono::Duration::milliseconds(1500);
        let outcome = JobOutcome::succeeded(LockName::SyncInventory, (), 1, started_at, finished_at);

        assert_eq!(outcome.elapsed().num_milliseconds(), 1500);
    }

    #[test]
    fn test_status_from_string() {
        assert_eq!(JobStatus::from("busy".to_string()), JobStatus::Busy);
        assert_eq!(JobStatus::from(JobStatus::Unavailable.to_string()), JobStatus::Unavailable);
        assert_eq!(JobStatus::from("garbage".to_string()), JobStatus::Failed);
    }
}
