use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::time::Duration;

/// Clock and sleep used between job retries.
#[async_trait]
pub trait TimeService: Send + Sync {
    async fn sleep(&self, duration: Duration);

    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}
