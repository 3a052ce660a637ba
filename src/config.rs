use crate::domain::entities::RetryPolicy;
use crate::infrastructure::persistence::supabase_lock::{DEFAULT_ACQUIRE_FN, DEFAULT_RELEASE_FN};
use std::env;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LockBackend {
    Postgres,
    Supabase,
    Memory,
}

impl FromStr for LockBackend {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "postgres" | "postgresql" => Ok(LockBackend::Postgres),
            "supabase" => Ok(LockBackend::Supabase),
            "memory" => Ok(LockBackend::Memory),
            other => Err(ConfigError::InvalidBackend(other.to_string())),
        }
    }
}

impl fmt::Display for LockBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LockBackend::Postgres => write!(f, "postgres"),
            LockBackend::Supabase => write!(f, "supabase"),
            LockBackend::Memory => write!(f, "memory"),
        }
    }
}

#[derive(Clone, Debug)]
pub struct Config {
    pub lock_backend: LockBackend,
    pub database_url: Option<String>,
    pub database_max_connections: u32,
    pub lock_namespace: String,
    pub supabase_url: Option<String>,
    pub supabase_service_key: Option<String>,
    pub supabase_acquire_fn: String,
    pub supabase_release_fn: String,
    pub job_max_attempts: u32,
    pub job_retry_delay_ms: u64,
    pub record_runs: bool,
    pub otel_exporter_endpoint: Option<String>,
    pub service_name: String,
    pub metrics_port: Option<u16>,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if it exists
        dotenvy::dotenv().ok();

        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from any key lookup; `from_env` passes the process environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let lock_backend = lookup("LOCK_BACKEND")
            .map(|v| v.parse::<LockBackend>())
            .transpose()?
            .unwrap_or(LockBackend::Postgres);

        let database_url = lookup("DATABASE_URL").filter(|v| !v.is_empty());
        let supabase_url = lookup("SUPABASE_URL").filter(|v| !v.is_empty());
        let supabase_service_key = lookup("SUPABASE_SERVICE_KEY").filter(|v| !v.is_empty());

        match lock_backend {
            LockBackend::Postgres if database_url.is_none() => {
                return Err(ConfigError::MissingDatabaseUrl)
            }
            LockBackend::Supabase if supabase_url.is_none() => {
                return Err(ConfigError::MissingSupabaseUrl)
            }
            LockBackend::Supabase if supabase_service_key.is_none() => {
                return Err(ConfigError::MissingSupabaseKey)
            }
            _ => {}
        }

        let database_max_connections = parse_or(&lookup, "DATABASE_MAX_CONNECTIONS", 5)?;
        let job_max_attempts = parse_or(&lookup, "JOB_MAX_ATTEMPTS", 3)?;
        let job_retry_delay_ms = parse_or(&lookup, "JOB_RETRY_DELAY_MS", 5000)?;
        let record_runs = parse_or(&lookup, "RECORD_RUNS", true)?;

        let metrics_port = match lookup("METRICS_PORT") {
            Some(v) => Some(v.parse().map_err(|_| ConfigError::InvalidPort)?),
            None => None,
        };

        Ok(Config {
            lock_backend,
            database_url,
            database_max_connections,
            lock_namespace: lookup("LOCK_NAMESPACE").unwrap_or_else(|| "cron".to_string()),
            supabase_url,
            supabase_service_key,
            supabase_acquire_fn: lookup("SUPABASE_ACQUIRE_FN")
                .unwrap_or_else(|| DEFAULT_ACQUIRE_FN.to_string()),
            supabase_release_fn: lookup("SUPABASE_RELEASE_FN")
                .unwrap_or_else(|| DEFAULT_RELEASE_FN.to_string()),
            job_max_attempts,
            job_retry_delay_ms,
            record_runs,
            otel_exporter_endpoint: lookup("OTEL_EXPORTER_OTLP_ENDPOINT"),
            service_name: lookup("SERVICE_NAME").unwrap_or_else(|| "cron-lock".to_string()),
            metrics_port,
        })
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(
            self.job_max_attempts,
            Duration::from_millis(self.job_retry_delay_ms),
        )
    }
}

fn parse_or<F, T>(lookup: &F, key: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(key) {
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidNumber(key, value)),
        None => Ok(default),
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("DATABASE_URL environment variable not set")]
    MissingDatabaseUrl,

    #[error("SUPABASE_URL environment variable not set")]
    MissingSupabaseUrl,

    #[error("SUPABASE_SERVICE_KEY environment variable not set")]
    MissingSupabaseKey,

    #[error("Unknown lock backend: {0}")]
    InvalidBackend(String),

    #[error("Invalid value for {0}: {1}")]
    InvalidNumber(&'static str, String),

    #[error("Invalid port number")]
    InvalidPort,
}
