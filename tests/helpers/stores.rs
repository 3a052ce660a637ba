use async_trait::async_trait;
use cron_lock::domain::ports::lock_store::LockStore;
use cron_lock::domain::ports::time_service::TimeService;
use cron_lock::infrastructure::persistence::InMemoryLockStore;
use cron_lock::infrastructure::runtime::tokio::TokioTimeService;
use cron_lock::{JobLockCoordinator, LockError, LockResult};
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;

/// In-memory store that counts calls and can be switched to fail.
#[derive(Default)]
pub struct ControlledStore {
    pub inner: InMemoryLockStore,
    pub acquire_calls: AtomicU32,
    pub release_calls: AtomicU32,
    pub fail_acquire: AtomicBool,
    pub fail_release: AtomicBool,
}

impl ControlledStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn releases(&self) -> u32 {
        self.release_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LockStore for ControlledStore {
    async fn try_acquire(&self, lock_name: &str) -> LockResult<bool> {
        self.acquire_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_acquire.load(Ordering::SeqCst) {
            return Err(LockError::AcquireFailed("connection refused".to_string()));
        }
        self.inner.try_acquire(lock_name).await
    }

    async fn release(&self, lock_name: &str) -> LockResult<()> {
        self.release_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_release.load(Ordering::SeqCst) {
            return Err(LockError::ReleaseFailed("connection reset".to_string()));
        }
        self.inner.release(lock_name).await
    }
}

pub fn coordinator_with(store: Arc<dyn LockStore>) -> JobLockCoordinator {
    JobLockCoordinator::new(store, Arc::new(TokioTimeService::new()) as Arc<dyn TimeService>)
}
