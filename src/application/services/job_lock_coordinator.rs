use futures::FutureExt;
use std::any::Any;
use std::fmt::Display;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use crate::domain::entities::{Acquisition, JobOutcome, JobRun, LockName, RetryPolicy};
use crate::domain::ports::lock_store::LockStore;
use crate::domain::ports::run_log::RunLog;
use crate::domain::ports::time_service::TimeService;

/// Runs scheduled job bodies under a named lock held in an external store.
///
/// Concurrent invocations sharing a lock name run at most one at a time.
/// The losers get a skipped outcome and never touch the body. Lock
/// management errors are logged and turned into outcome fields; nothing
/// here returns `Err` or re-raises a body failure.
#[derive(Clone)]
pub struct JobLockCoordinator {
    store: Arc<dyn LockStore>,
    run_log: Option<Arc<dyn RunLog>>,
    time_service: Arc<dyn TimeService>,
}

impl JobLockCoordinator {
    pub fn new(store: Arc<dyn LockStore>, time_service: Arc<dyn TimeService>) -> Self {
        Self {
            store,
            run_log: None,
            time_service,
        }
    }

    /// Record every invocation, skipped ones included, into `run_log`.
    pub fn with_run_log(mut self, run_log: Arc<dyn RunLog>) -> Self {
        self.run_log = Some(run_log);
        self
    }

    /// Try to take the lock. A store error counts as not acquired.
    pub async fn acquire(&self, lock_name: LockName) -> Acquisition {
        let acquisition = match self.store.try_acquire(lock_name.as_str()).await {
            Ok(true) => {
                info!(lock = %lock_name, "Acquired job lock");
                Acquisition::Acquired
            }
            Ok(false) => {
                debug!(lock = %lock_name, "Job lock is held by another run");
                Acquisition::Busy
            }
            Err(e) => {
                error!(lock = %lock_name, "Could not acquire job lock: {}", e);
                Acquisition::Unavailable(e.to_string())
            }
        };

        metrics::counter!(
            "cron_lock_acquire_total",
            "lock" => lock_name.as_str(),
            "outcome" => acquisition.outcome()
        )
        .increment(1);

        acquisition
    }

    /// Best-effort release. Failures are logged and swallowed.
    pub async fn release(&self, lock_name: LockName) {
        match self.store.release(lock_name.as_str()).await {
            Ok(()) => debug!(lock = %lock_name, "Released job lock"),
            Err(e) => {
                // A stuck lock is left for external monitoring to notice
                error!(lock = %lock_name, "Failed to release job lock: {}", e);
                metrics::counter!("cron_lock_release_failures_total", "lock" => lock_name.as_str())
                    .increment(1);
            }
        }
    }

    /// Run `body` once if the lock can be taken.
    ///
    /// The lock is released before returning whether the body succeeds,
    /// fails or panics.
    pub async fn with_lock<T, E, F, Fut>(&self, lock_name: LockName, body: F) -> JobOutcome<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Display,
    {
        self.guarded(lock_name, async move { (run_body(body).await, 1) })
            .await
    }

    /// Like [`with_lock`](Self::with_lock) but retries a failing body while
    /// the lock stays held, waiting `policy.delay_for(attempt)` between tries.
    pub async fn with_lock_retrying<T, E, F, Fut>(
        &self,
        lock_name: LockName,
        policy: RetryPolicy,
        mut body: F,
    ) -> JobOutcome<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Display,
    {
        let time_service = self.time_service.clone();

        self.guarded(lock_name, async move {
            let mut attempt = 0;
            loop {
                attempt += 1;
                match run_body(&mut body).await {
                    Ok(data) => return (Ok(data), attempt),
                    Err(e) if policy.should_retry(attempt) => {
                        let delay = policy.delay_for(attempt);
                        warn!(
                            lock = %lock_name,
                            "Attempt {}/{} failed: {}. Retrying in {}ms",
                            attempt,
                            policy.max_attempts,
                            e,
                            delay.as_millis()
                        );
                        time_service.sleep(delay).await;
                    }
                    Err(e) => return (Err(e), attempt),
                }
            }
        })
        .await
    }

    async fn guarded<T, Fut>(&self, lock_name: LockName, run: Fut) -> JobOutcome<T>
    where
        Fut: Future<Output = (Result<T, String>, u32)>,
    {
        let started_at = self.time_service.now();

        let acquisition = self.acquire(lock_name).await;
        if !acquisition.acquired() {
            let outcome =
                JobOutcome::skipped(lock_name, &acquisition, started_at, self.time_service.now());
            info!(lock = %lock_name, "Skipping job: {}", acquisition);
            self.record(&outcome).await;
            return outcome;
        }

        let (result, attempts) = run.await;
        self.release(lock_name).await;

        let finished_at = self.time_service.now();
        let outcome = match result {
            Ok(data) => JobOutcome::succeeded(lock_name, data, attempts, started_at, finished_at),
            Err(e) => JobOutcome::failed(lock_name, e, attempts, started_at, finished_at),
        };

        if outcome.success {
            info!(
                lock = %lock_name,
                "Job completed in {}ms after {} attempt(s)",
                outcome.elapsed().num_milliseconds(),
                attempts
            );
        } else {
            error!(
                lock = %lock_name,
                "Job failed after {} attempt(s): {}",
                attempts,
                outcome.error.as_deref().unwrap_or_default()
            );
        }

        self.record(&outcome).await;
        outcome
    }

    async fn record<T>(&self, outcome: &JobOutcome<T>) {
        if let Some(run_log) = &self.run_log {
            let run = JobRun::from_outcome(outcome);
            if let Err(e) = run_log.record(&run).await {
                warn!(lock = %outcome.lock_name, "Failed to record job run {}: {}", run.id, e);
            }
        }
    }
}

/// Invoke the body, flattening its error and any panic into a message.
async fn run_body<T, E, F, Fut>(body: F) -> Result<T, String>
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Display,
{
    match AssertUnwindSafe(async move { body().await })
        .catch_unwind()
        .await
    {
        Ok(Ok(data)) => Ok(data),
        Ok(Err(e)) => Err(e.to_string()),
        Err(panic) => Err(format!("job panicked: {}", panic_message(panic.as_ref()))),
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(msg) = panic.downcast_ref::<&str>() {
        msg.to_string()
    } else if let Some(msg) = panic.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
