use crate::domain::errors::{LockError, LockResult};
use crate::domain::ports::lock_store::LockStore;
use async_trait::async_trait;
use sha2::{Digest, Sha256};
use sqlx::pool::PoolConnection;
use sqlx::{Connection, PgPool, Postgres};
use std::collections::HashMap;
use std::sync::Mutex;

/// Lock store backed by Postgres session advisory locks.
///
/// A session lock belongs to the connection that took it, so the pooled
/// connection is kept out of the pool until the lock is released.
pub struct PgAdvisoryLockStore {
    pool: PgPool,
    namespace: String,
    held: Mutex<HashMap<String, PoolConnection<Postgres>>>,
}

impl PgAdvisoryLockStore {
    pub fn new(pool: PgPool, namespace: impl Into<String>) -> Self {
        Self {
            pool,
            namespace: namespace.into(),
            held: Mutex::new(HashMap::new()),
        }
    }

    pub fn key_for(&self, lock_name: &str) -> i64 {
        advisory_key(&self.namespace, lock_name)
    }

    fn held_locally(&self, lock_name: &str) -> bool {
        self.held
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .contains_key(lock_name)
    }

    fn take_connection(&self, lock_name: &str) -> Option<PoolConnection<Postgres>> {
        self.held
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .remove(lock_name)
    }
}

/// Stable 64-bit key: first 8 bytes of SHA-256("<namespace>:<lock_name>").
pub fn advisory_key(namespace: &str, lock_name: &str) -> i64 {
    let digest = Sha256::digest(format!("{}:{}", namespace, lock_name).as_bytes());
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&digest[..8]);
    i64::from_be_bytes(bytes)
}

#[async_trait]
impl LockStore for PgAdvisoryLockStore {
    async fn try_acquire(&self, lock_name: &str) -> LockResult<bool> {
        // Another task in this process already holds it on its own session
        if self.held_locally(lock_name) {
            return Ok(false);
        }

        let mut conn = self
            .pool
            .acquire()
            .await
            .map_err(|e| LockError::from(e).during_acquire())?;

        let acquired: bool = sqlx::query_scalar("SELECT pg_try_advisory_lock($1)")
            .bind(self.key_for(lock_name))
            .fetch_one(&mut *conn)
            .await
            .map_err(|e| LockError::from(e).during_acquire())?;

        if acquired {
            self.held
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner())
                .insert(lock_name.to_string(), conn);
        }

        Ok(acquired)
    }

    async fn release(&self, lock_name: &str) -> LockResult<()> {
        let Some(mut conn) = self.take_connection(lock_name) else {
            tracing::debug!("Advisory lock {} is not held here, nothing to release", lock_name);
            return Ok(());
        };

        let result: Result<bool, sqlx::Error> =
            sqlx::query_scalar("SELECT pg_advisory_unlock($1)")
                .bind(self.key_for(lock_name))
                .fetch_one(&mut *conn)
                .await;

        match result {
            Ok(true) => Ok(()),
            Ok(false) => {
                tracing::warn!(
                    "Session did not hold advisory lock {} at release time",
                    lock_name
                );
                Ok(())
            }
            Err(e) => {
                // Ending the session drops every advisory lock it holds
                if let Err(close_err) = conn.detach().close().await {
                    tracing::warn!(
                        "Failed to close session for advisory lock {}: {}",
                        lock_name,
                        close_err
                    );
                }
                Err(LockError::from(e).during_release())
            }
        }
    }
}
