use crate::domain::entities::JobRun;
use crate::domain::errors::LockResult;
use async_trait::async_trait;

#[async_trait]
pub trait RunLog: Send + Sync {
    async fn record(&self, run: &JobRun) -> LockResult<()>;
}
