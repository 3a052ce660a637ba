use crate::domain::entities::{JobRun, JobStatus, LockName};
use crate::domain::errors::LockResult;
use crate::domain::ports::run_log::RunLog;
use crate::infrastructure::persistence::Database;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::Row;

/// Run history kept in the `sync_log` table.
#[derive(Clone)]
pub struct PgRunLog {
    db: Database,
}

impl PgRunLog {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Latest runs for one lock, newest first.
    pub async fn recent_runs(&self, lock_name: LockName, limit: i64) -> LockResult<Vec<JobRun>> {
        let rows = sqlx::query(
            "SELECT id, lock_name, status, attempts, error, started_at, finished_at
             FROM sync_log
             WHERE lock_name = $1
             ORDER BY started_at DESC
             LIMIT $2",
        )
        .bind(lock_name.as_str())
        .bind(limit)
        .fetch_all(self.db.pool())
        .await?;

        rows.iter()
            .map(|row| -> LockResult<JobRun> {
                let lock_name: String = row.try_get("lock_name")?;
                let status: String = row.try_get("status")?;
                let attempts: i32 = row.try_get("attempts")?;
                let started_at: DateTime<Utc> = row.try_get("started_at")?;
                let finished_at: DateTime<Utc> = row.try_get("finished_at")?;

                Ok(JobRun {
                    id: row.try_get("id")?,
                    lock_name: lock_name.parse()?,
                    status: JobStatus::from(status),
                    attempts: attempts.max(0) as u32,
                    error: row.try_get("error")?,
                    started_at,
                    finished_at,
                })
            })
            .collect()
    }
}

#[async_trait]
impl RunLog for PgRunLog {
    async fn record(&self, run: &JobRun) -> LockResult<()> {
        sqlx::query(
            "INSERT INTO sync_log (id, lock_name, status, attempts, error, started_at, finished_at, duration_ms)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
        )
        .bind(&run.id)
        .bind(run.lock_name.as_str())
        .bind(run.status.to_string())
        .bind(run.attempts as i32)
        .bind(&run.error)
        .bind(run.started_at)
        .bind(run.finished_at)
        .bind(run.duration_ms())
        .execute(self.db.pool())
        .await?;

        Ok(())
    }
}
