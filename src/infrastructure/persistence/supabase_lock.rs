use crate::domain::errors::{LockError, LockResult};
use crate::domain::ports::lock_store::LockStore;
use async_trait::async_trait;
use reqwest::{Client, Response};
use serde_json::json;
use std::time::Duration;

pub const DEFAULT_ACQUIRE_FN: &str = "try_acquire_cron_lock";
pub const DEFAULT_RELEASE_FN: &str = "release_cron_lock";

/// Lock store that calls two Postgres functions through the Supabase
/// REST gateway (`POST /rest/v1/rpc/<fn>`).
///
/// The acquire function must answer a JSON boolean. The release function
/// must be a no-op for a free lock.
pub struct SupabaseRpcLockStore {
    http_client: Client,
    base_url: String,
    service_key: String,
    acquire_fn: String,
    release_fn: String,
}

impl SupabaseRpcLockStore {
    pub fn new(base_url: &str, service_key: &str) -> LockResult<Self> {
        let http_client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;

        Ok(Self {
            http_client,
            base_url: base_url.trim_end_matches('/').to_string(),
            service_key: service_key.to_string(),
            acquire_fn: DEFAULT_ACQUIRE_FN.to_string(),
            release_fn: DEFAULT_RELEASE_FN.to_string(),
        })
    }

    pub fn with_functions(mut self, acquire_fn: &str, release_fn: &str) -> Self {
        self.acquire_fn = acquire_fn.to_string();
        self.release_fn = release_fn.to_string();
        self
    }

    fn rpc_url(&self, function: &str) -> String {
        format!("{}/rest/v1/rpc/{}", self.base_url, function)
    }

    async fn call(&self, function: &str, lock_name: &str) -> LockResult<Response> {
        let response = self
            .http_client
            .post(self.rpc_url(function))
            .header("apikey", &self.service_key)
            .bearer_auth(&self.service_key)
            .json(&json!({ "lock_name": lock_name }))
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let error_msg = match response.text().await {
            Ok(body) if body.len() > 500 => {
                let cut = (0..=500).rev().find(|&i| body.is_char_boundary(i)).unwrap_or(0);
                format!("HTTP {} from {}: {}", status.as_u16(), function, &body[..cut])
            }
            Ok(body) => format!("HTTP {} from {}: {}", status.as_u16(), function, body),
            Err(_) => format!("HTTP {} from {}", status.as_u16(), function),
        };
        Err(LockError::Store(error_msg))
    }
}

#[async_trait]
impl LockStore for SupabaseRpcLockStore {
    async fn try_acquire(&self, lock_name: &str) -> LockResult<bool> {
        let response = self
            .call(&self.acquire_fn, lock_name)
            .await
            .map_err(LockError::during_acquire)?;

        response
            .json::<bool>()
            .await
            .map_err(|e| LockError::AcquireFailed(format!("Unexpected RPC response: {}", e)))
    }

    async fn release(&self, lock_name: &str) -> LockResult<()> {
        self.call(&self.release_fn, lock_name)
            .await
            .map_err(LockError::during_release)?;
        Ok(())
    }
}
