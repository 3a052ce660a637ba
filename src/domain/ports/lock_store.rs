use crate::domain::errors::LockResult;
use async_trait::async_trait;

/// Collaborating store that owns the lock primitive.
#[async_trait]
pub trait LockStore: Send + Sync {
    /// Atomically take the named lock.
    /// Returns true only if this call moved the lock from free to held.
    async fn try_acquire(&self, lock_name: &str) -> LockResult<bool>;

    /// Release the named lock. Releasing a free lock is not an error.
    async fn release(&self, lock_name: &str) -> LockResult<()>;
}
