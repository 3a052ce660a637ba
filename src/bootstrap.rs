use crate::application::services::JobLockCoordinator;
use crate::config::{Config, ConfigError, LockBackend};
use crate::domain::entities::RetryPolicy;
use crate::domain::errors::LockError;
use crate::domain::ports::lock_store::LockStore;
use crate::domain::ports::time_service::TimeService;
use crate::infrastructure::persistence::{
    Database, InMemoryLockStore, PgAdvisoryLockStore, PgRunLog, SupabaseRpcLockStore,
};
use crate::infrastructure::runtime::tokio::TokioTimeService;
use std::sync::Arc;

#[derive(Debug, thiserror::Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Database connection failed: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Database migration failed: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error(transparent)]
    Lock(#[from] LockError),
}

/// Wire a coordinator for the configured lock backend, along with the retry
/// policy jobs should pass to `with_lock_retrying`.
///
/// With the Postgres backend and run recording on, the `sync_log`
/// migration is applied and every invocation is recorded there.
pub async fn build_coordinator(
    config: &Config,
) -> Result<(JobLockCoordinator, RetryPolicy), BootstrapError> {
    let time_service = Arc::new(TokioTimeService::new()) as Arc<dyn TimeService>;

    let coordinator = match config.lock_backend {
        LockBackend::Postgres => {
            let database_url = config
                .database_url
                .as_deref()
                .ok_or(ConfigError::MissingDatabaseUrl)?;
            let db = Database::connect(database_url, config.database_max_connections).await?;

            let store = Arc::new(PgAdvisoryLockStore::new(
                db.pool().clone(),
                config.lock_namespace.clone(),
            )) as Arc<dyn LockStore>;
            let coordinator = JobLockCoordinator::new(store, time_service);

            if config.record_runs {
                db.run_migrations().await?;
                tracing::info!("Run history enabled (sync_log)");
                coordinator.with_run_log(Arc::new(PgRunLog::new(db)))
            } else {
                coordinator
            }
        }
        LockBackend::Supabase => {
            let url = config
                .supabase_url
                .as_deref()
                .ok_or(ConfigError::MissingSupabaseUrl)?;
            let key = config
                .supabase_service_key
                .as_deref()
                .ok_or(ConfigError::MissingSupabaseKey)?;

            let store = SupabaseRpcLockStore::new(url, key)?
                .with_functions(&config.supabase_acquire_fn, &config.supabase_release_fn);

            if config.record_runs {
                tracing::warn!("Run history needs the postgres backend; runs will not be recorded");
            }
            JobLockCoordinator::new(Arc::new(store), time_service)
        }
        LockBackend::Memory => {
            tracing::warn!("Using in-memory job locks; runs in other processes are not excluded");
            JobLockCoordinator::new(Arc::new(InMemoryLockStore::new()), time_service)
        }
    };

    let retry_policy = config.retry_policy();
    tracing::info!(
        "Job lock coordinator ready (backend={}, max_attempts={})",
        config.lock_backend,
        retry_policy.max_attempts
    );
    Ok((coordinator, retry_policy))
}
