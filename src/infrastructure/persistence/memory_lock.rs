use crate::domain::errors::LockResult;
use crate::domain::ports::lock_store::LockStore;
use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::Mutex;

/// Process-local lock store for tests and single-process runs.
#[derive(Default)]
pub struct InMemoryLockStore {
    held: Mutex<HashSet<String>>,
}

impl InMemoryLockStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_held(&self, lock_name: &str) -> bool {
        self.held
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .contains(lock_name)
    }

    pub fn held_count(&self) -> usize {
        self.held
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }
}

#[async_trait]
impl LockStore for InMemoryLockStore {
    async fn try_acquire(&self, lock_name: &str) -> LockResult<bool> {
        let mut held = self
            .held
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        Ok(held.insert(lock_name.to_string()))
    }

    async fn release(&self, lock_name: &str) -> LockResult<()> {
        self.held
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .remove(lock_name);
        Ok(())
    }
}
